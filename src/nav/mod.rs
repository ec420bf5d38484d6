//! Route paths and the in-app navigator.
//!
//! Every route string in the portal is defined here once; the router, the
//! pages, and the CLI refer to these instead of repeating literals.

use parking_lot::Mutex;

pub mod paths {
    pub const HOME: &str = "/";
    pub const LOGIN: &str = "/login";
    pub const REGISTER: &str = "/register";
    pub const FORGOT_PASSWORD: &str = "/forgot-password";
    pub const PENDING_APPROVAL: &str = "/pending-approval";

    pub const CLIENT_DASHBOARD: &str = "/client-dashboard";
    pub const MY_DOCUMENTS: &str = "/my-documents";
    pub const MY_PROFILE: &str = "/my-profile";
    pub const MY_PROJECTS: &str = "/my-projects";
    pub const NEEDS_ASSESSMENT: &str = "/needs-assessment";

    pub const AGENT_DASHBOARD: &str = "/agent/dashboard";
    pub const AGENT_CLIENTS: &str = "/agent/clients";
    pub const AGENT_PROJECTS: &str = "/agent/projects";
    pub const AGENT_PROFILE: &str = "/agent/profile";
    pub const PROPOSAL_BUILDER: &str = "/agent/proposal-builder";

    pub const ADMIN_DASHBOARD: &str = "/admin/dashboard";
    pub const ADMIN_APPROVALS: &str = "/admin/approvals";
    pub const ADMIN_AGENTS: &str = "/admin/agents";
    pub const ADMIN_REQUESTS: &str = "/admin/requests";
    pub const ADMIN_SETTINGS: &str = "/admin/settings";

    /// Command-center view of a client's project.
    pub fn project(id: &str) -> String {
        format!("/project/{}", id)
    }

    /// Agent-side management view of a project.
    pub fn agent_project_management(id: &str) -> String {
        format!("/agent/project-management/{}", id)
    }
}

#[derive(Debug)]
struct NavInner {
    current: String,
    back: Vec<String>,
    forward: Vec<String>,
    return_to: Option<String>,
}

/// Process-wide navigation state: current location, history, and the
/// intended destination remembered when an unauthenticated visit bounces to
/// the login page.
///
/// Interior-mutable so the shell, the auth session, and the adapter's 401
/// handler can share one instance.
#[derive(Debug)]
pub struct Navigator {
    inner: Mutex<NavInner>,
}

impl Navigator {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(NavInner {
                current: paths::HOME.to_string(),
                back: Vec::new(),
                forward: Vec::new(),
                return_to: None,
            }),
        }
    }

    pub fn current(&self) -> String {
        self.inner.lock().current.clone()
    }

    /// Move to `path`, pushing the current location onto the back history
    /// and discarding any forward history.
    pub fn navigate(&self, path: &str) {
        let mut inner = self.inner.lock();
        let previous = std::mem::replace(&mut inner.current, path.to_string());
        inner.back.push(previous);
        inner.forward.clear();
    }

    /// Swap the current location without touching history (redirects).
    pub fn replace(&self, path: &str) {
        self.inner.lock().current = path.to_string();
    }

    /// Step back through history; returns the new location if there was one.
    pub fn back(&self) -> Option<String> {
        let mut inner = self.inner.lock();
        let target = inner.back.pop()?;
        let current = std::mem::replace(&mut inner.current, target.clone());
        inner.forward.push(current);
        Some(target)
    }

    /// Undo the most recent `back`; returns the new location if there was one.
    pub fn forward(&self) -> Option<String> {
        let mut inner = self.inner.lock();
        let target = inner.forward.pop()?;
        let current = std::mem::replace(&mut inner.current, target.clone());
        inner.back.push(current);
        Some(target)
    }

    /// Remember where an unauthenticated visit was headed.
    pub fn set_return_to(&self, path: &str) {
        self.inner.lock().return_to = Some(path.to_string());
    }

    /// One-shot read of the remembered destination; reading it clears it.
    pub fn take_return_to(&self) -> Option<String> {
        self.inner.lock().return_to.take()
    }
}

impl Default for Navigator {
    fn default() -> Self {
        Self::new()
    }
}
