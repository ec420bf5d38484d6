//! Role-gated routing.
//!
//! [`RouteTable::evaluate`] is a pure decision over the current auth state,
//! the target route's access declaration, and the signed-in role. It runs
//! on every navigation; nothing here is cached.

use crate::session::{AuthState, Role};

/// Which pages exist. Rendering lives in `pages`; this enum links a matched
/// route to its renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageId {
    Home,
    Login,
    Register,
    ForgotPassword,
    PendingApproval,
    ClientDashboard,
    MyDocuments,
    MyProfile,
    MyProjects,
    NeedsAssessment,
    ProjectCommandCenter,
    AgentDashboard,
    AgentClients,
    AgentProjects,
    AgentProfile,
    ProposalBuilder,
    AgentProjectManagement,
    AdminDashboard,
    AdminApprovals,
    AdminAgents,
    AdminRequests,
    AdminSettings,
}

/// Access declaration for a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guard {
    /// No authentication required.
    Public,
    /// Any signed-in role may enter (an empty allowed-roles set).
    AnyRole,
    /// Only the listed roles may enter.
    Roles(&'static [Role]),
}

#[derive(Debug, Clone)]
pub struct RouteDef {
    pub pattern: &'static str,
    pub title: &'static str,
    pub page: PageId,
    pub guard: Guard,
}

/// A route that will render: the page, its title, the concrete path, and
/// any `:param` segments captured from it.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteMatch {
    pub page: PageId,
    pub title: &'static str,
    pub path: String,
    pub params: Vec<(String, String)>,
}

impl RouteMatch {
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RouteDecision {
    /// Auth state is still `Initializing`: render nothing, redirect nowhere.
    Pending,
    Render(RouteMatch),
    /// Not signed in; `from` is the destination to return to after login.
    RedirectToLogin { from: String },
    /// Signed in, but this page belongs to another role - send the user to
    /// their own dashboard, not to login.
    RedirectToDashboard(Role),
    /// Unknown path; the portal sends these to the home page.
    RedirectHome,
}

pub struct RouteTable {
    routes: Vec<RouteDef>,
}

const CLIENT_ONLY: &[Role] = &[Role::Client];
const AGENT_ONLY: &[Role] = &[Role::Agent];
const ADMIN_ONLY: &[Role] = &[Role::Admin];

impl RouteTable {
    pub fn new(routes: Vec<RouteDef>) -> Self {
        Self { routes }
    }

    /// The portal's full route surface.
    pub fn portal() -> Self {
        use Guard::{Public, Roles};
        use PageId::*;

        let route = |pattern, title, page, guard| RouteDef {
            pattern,
            title,
            page,
            guard,
        };

        Self::new(vec![
            // Public
            route("/", "Home", Home, Public),
            route("/login", "Sign In", Login, Public),
            route("/register", "Create Account", Register, Public),
            route("/forgot-password", "Reset Password", ForgotPassword, Public),
            route("/pending-approval", "Pending Approval", PendingApproval, Public),
            // Client
            route("/client-dashboard", "Client Dashboard", ClientDashboard, Roles(CLIENT_ONLY)),
            route("/my-documents", "My Documents", MyDocuments, Roles(CLIENT_ONLY)),
            route("/my-profile", "My Profile", MyProfile, Roles(CLIENT_ONLY)),
            route("/my-projects", "My Projects", MyProjects, Roles(CLIENT_ONLY)),
            route("/needs-assessment", "Needs Assessment", NeedsAssessment, Roles(CLIENT_ONLY)),
            route("/project/:id", "Project Command Center", ProjectCommandCenter, Roles(CLIENT_ONLY)),
            // Agent
            route("/agent/dashboard", "Agent Dashboard", AgentDashboard, Roles(AGENT_ONLY)),
            route("/agent/clients", "My Clients", AgentClients, Roles(AGENT_ONLY)),
            route("/agent/projects", "Agent Projects", AgentProjects, Roles(AGENT_ONLY)),
            route("/agent/profile", "Agent Profile", AgentProfile, Roles(AGENT_ONLY)),
            route("/agent/proposal-builder", "Proposal Builder", ProposalBuilder, Roles(AGENT_ONLY)),
            route("/agent/project-management/:id", "Project Management", AgentProjectManagement, Roles(AGENT_ONLY)),
            // Admin
            route("/admin/dashboard", "Admin Dashboard", AdminDashboard, Roles(ADMIN_ONLY)),
            route("/admin/approvals", "Account Approvals", AdminApprovals, Roles(ADMIN_ONLY)),
            route("/admin/agents", "Manage Agents", AdminAgents, Roles(ADMIN_ONLY)),
            route("/admin/requests", "Service Requests", AdminRequests, Roles(ADMIN_ONLY)),
            route("/admin/settings", "Portal Settings", AdminSettings, Roles(ADMIN_ONLY)),
        ])
    }

    pub fn routes(&self) -> &[RouteDef] {
        &self.routes
    }

    /// Decide render-vs-redirect for a navigation to `path`.
    pub fn evaluate(&self, auth: &AuthState, path: &str) -> RouteDecision {
        let Some((route, params)) = self.find(path) else {
            return RouteDecision::RedirectHome;
        };

        // Public pages render regardless of auth state.
        if matches!(route.guard, Guard::Public) {
            return RouteDecision::Render(route_match(route, path, params));
        }

        match auth {
            AuthState::Initializing => RouteDecision::Pending,
            AuthState::Unauthenticated => RouteDecision::RedirectToLogin {
                from: path.to_string(),
            },
            AuthState::Authenticated(identity) => {
                let allowed = match route.guard {
                    Guard::Public | Guard::AnyRole => true,
                    Guard::Roles(roles) => roles.contains(&identity.role),
                };
                if allowed {
                    RouteDecision::Render(route_match(route, path, params))
                } else {
                    RouteDecision::RedirectToDashboard(identity.role)
                }
            }
        }
    }

    /// Match a concrete path against the table, capturing `:param` segments.
    pub fn find(&self, path: &str) -> Option<(&RouteDef, Vec<(String, String)>)> {
        let segments = split_path(path);
        'routes: for route in &self.routes {
            let pattern = split_path(route.pattern);
            if pattern.len() != segments.len() {
                continue;
            }
            let mut params = Vec::new();
            for (pat, seg) in pattern.iter().zip(&segments) {
                if let Some(name) = pat.strip_prefix(':') {
                    if seg.is_empty() {
                        continue 'routes;
                    }
                    params.push((name.to_string(), seg.to_string()));
                } else if pat != seg {
                    continue 'routes;
                }
            }
            return Some((route, params));
        }
        None
    }
}

fn route_match(route: &RouteDef, path: &str, params: Vec<(String, String)>) -> RouteMatch {
    RouteMatch {
        page: route.page,
        title: route.title,
        path: path.to_string(),
        params,
    }
}

/// Split a path into segments, ignoring any query string and trailing slash.
fn split_path(path: &str) -> Vec<&str> {
    let path = path.split('?').next().unwrap_or(path);
    let trimmed = path.trim_start_matches('/').trim_end_matches('/');
    if trimmed.is_empty() {
        Vec::new()
    } else {
        trimmed.split('/').collect()
    }
}
