//! Terminal renderings of the portal pages.
//!
//! The portal is form-driven: public pages prompt for input and call into
//! the auth session; protected pages identify themselves and the viewer.
//! The record content behind the protected pages (requests, proposals,
//! project boards) lives in the backend and is not reproduced here.

use anyhow::{Context, Result};
use std::io::{self, BufRead, Write};
use tracing::debug;

use crate::nav::paths;
use crate::router::{PageId, RouteDecision, RouteMatch};
use crate::session::Registration;
use crate::Portal;

/// Drive a navigation request through the role-gated router and render the
/// page it settles on, following redirects on the way. Pages can themselves
/// navigate (a successful login lands on a dashboard); those follow-ups are
/// driven to completion too.
pub async fn visit(portal: &Portal, requested: &str) -> Result<()> {
    portal.nav.navigate(requested);
    render_current(portal).await
}

/// Re-evaluate and render whatever the navigator currently points at.
pub async fn render_current(portal: &Portal) -> Result<()> {
    loop {
        let Some(matched) = resolve(portal) else {
            return Ok(());
        };
        match render(portal, &matched).await? {
            Some(next) => portal.nav.navigate(&next),
            None => return Ok(()),
        }
    }
}

/// Run the router until a page renders, applying redirects via `replace`
/// (redirects do not grow the history). `None` while auth state is still
/// initializing.
fn resolve(portal: &Portal) -> Option<RouteMatch> {
    loop {
        let current = portal.nav.current();
        match portal.routes.evaluate(&portal.auth.state(), &current) {
            RouteDecision::Pending => {
                debug!(path = %current, "auth state still initializing, rendering nothing");
                return None;
            }
            RouteDecision::RedirectHome => portal.nav.replace(paths::HOME),
            RouteDecision::RedirectToLogin { from } => {
                portal.nav.set_return_to(&from);
                portal.nav.replace(paths::LOGIN);
            }
            RouteDecision::RedirectToDashboard(role) => {
                portal.nav.replace(role.dashboard_path());
            }
            RouteDecision::Render(matched) => return Some(matched),
        }
    }
}

/// Render one page. A returned path is a navigation the page itself
/// requested.
async fn render(portal: &Portal, matched: &RouteMatch) -> Result<Option<String>> {
    match matched.page {
        PageId::Home => {
            page_home(portal);
            Ok(None)
        }
        PageId::Login => page_login(portal).await,
        PageId::Register => page_register(portal).await,
        PageId::ForgotPassword => {
            page_forgot_password(portal).await;
            Ok(None)
        }
        PageId::PendingApproval => {
            page_pending_approval();
            Ok(None)
        }
        PageId::ClientDashboard | PageId::AgentDashboard | PageId::AdminDashboard => {
            page_dashboard(portal, matched);
            Ok(None)
        }
        PageId::MyProfile | PageId::AgentProfile => {
            page_profile(portal, matched);
            Ok(None)
        }
        _ => {
            page_generic(portal, matched);
            Ok(None)
        }
    }
}

fn page_home(portal: &Portal) {
    banner("BizHire");
    println!("Your business hub for needs assessment, proposals and delivery.");
    println!();
    match portal.auth.identity() {
        Some(identity) => {
            println!(
                "Signed in as {} ({}). Your dashboard: {}",
                identity.display_name(),
                identity.role,
                identity.role.dashboard_path()
            );
        }
        None => {
            println!("Sign in at {} or create an account at {}.", paths::LOGIN, paths::REGISTER);
        }
    }
}

async fn page_login(portal: &Portal) -> Result<Option<String>> {
    banner("Sign In");
    println!("Enter your credentials to continue (empty email cancels).");

    let email = prompt("Email")?;
    if email.is_empty() {
        return Ok(None);
    }
    let password = rpassword::prompt_password("Password: ").context("Failed to read password")?;

    match portal.auth.login(&email, &password).await {
        Ok(identity) => {
            println!("Welcome back, {}.", identity.display_name());
            let destination = portal
                .nav
                .take_return_to()
                .unwrap_or_else(|| identity.role.dashboard_path().to_string());
            Ok(Some(destination))
        }
        Err(err) if err.is_pending_approval() => {
            println!("Account under review: your account is currently pending administrator approval.");
            Ok(None)
        }
        Err(err) => {
            println!("Login failed: {}", err);
            Ok(None)
        }
    }
}

async fn page_register(portal: &Portal) -> Result<Option<String>> {
    banner("Create Account");
    println!("Fill in your details below. Your account will require admin approval.");
    println!("(empty full name cancels)");

    let full_name = prompt("Full name")?;
    if full_name.is_empty() {
        return Ok(None);
    }
    let email = prompt("Email")?;
    let mobile = prompt("Mobile")?;
    let company_name = prompt("Company")?;
    let password = rpassword::prompt_password("Password: ").context("Failed to read password")?;

    let registration = Registration {
        full_name,
        email,
        password,
        mobile,
        company_name,
    };

    match portal.auth.register(&registration).await {
        Ok(()) => {
            println!("Account created. An administrator must approve it before you can sign in.");
            Ok(Some(paths::PENDING_APPROVAL.to_string()))
        }
        Err(err) => {
            println!("Registration failed: {}", err);
            Ok(None)
        }
    }
}

async fn page_forgot_password(portal: &Portal) {
    banner("Reset Password");
    let email = match prompt("Email") {
        Ok(email) if !email.is_empty() => email,
        _ => return,
    };
    match portal.auth.forgot_password(&email).await {
        Ok(notice) => println!("{}", notice),
        Err(err) => println!("Request failed: {}", err),
    }
}

fn page_pending_approval() {
    banner("Pending Approval");
    println!("Your account is awaiting administrator approval.");
    println!("You will be able to sign in once it has been reviewed.");
}

fn page_dashboard(portal: &Portal, matched: &RouteMatch) {
    banner(matched.title);
    let Some(identity) = portal.auth.identity() else {
        return;
    };
    println!("Welcome back, {}.", identity.display_name());
    println!();
    match matched.page {
        PageId::ClientDashboard => {
            println!("  {:<28} start a new service request", paths::NEEDS_ASSESSMENT);
            println!("  {:<28} your active projects", paths::MY_PROJECTS);
            println!("  {:<28} contracts and deliverables", paths::MY_DOCUMENTS);
            println!("  {:<28} your account details", paths::MY_PROFILE);
        }
        PageId::AgentDashboard => {
            println!("  {:<28} clients assigned to you", paths::AGENT_CLIENTS);
            println!("  {:<28} projects you are delivering", paths::AGENT_PROJECTS);
            println!("  {:<28} draft a proposal", paths::PROPOSAL_BUILDER);
            println!("  {:<28} your account details", paths::AGENT_PROFILE);
        }
        _ => {
            println!("  {:<28} accounts waiting for review", paths::ADMIN_APPROVALS);
            println!("  {:<28} incoming service requests", paths::ADMIN_REQUESTS);
            println!("  {:<28} agent roster", paths::ADMIN_AGENTS);
            println!("  {:<28} portal settings", paths::ADMIN_SETTINGS);
        }
    }
}

fn page_profile(portal: &Portal, matched: &RouteMatch) {
    banner(matched.title);
    let Some(identity) = portal.auth.identity() else {
        return;
    };
    println!("Name:    {}", identity.name);
    println!("Email:   {}", identity.email);
    println!("Role:    {}", identity.role);
    if let Some(company) = &identity.company {
        println!("Company: {}", company);
    }
    println!();
    println!("Use 'bizhire profile update' to change these details.");
}

fn page_generic(portal: &Portal, matched: &RouteMatch) {
    banner(matched.title);
    if let Some(identity) = portal.auth.identity() {
        println!("Viewing as {} ({})", identity.display_name(), identity.role);
    }
    if let Some(id) = matched.param("id") {
        println!("Project: {}", id);
    }
}

fn banner(title: &str) {
    println!();
    println!("=== {} ===", title);
    println!();
}

fn prompt(label: &str) -> io::Result<String> {
    print!("{}: ", label);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn portal(dir: &std::path::Path) -> Portal {
        let mut config = Config::default();
        config.backend.base_url = "http://localhost:3000/api/v1".to_string();
        config.session.dir = dir.join("session");
        Portal::new(config).unwrap()
    }

    #[test]
    fn test_unauthenticated_visit_lands_on_login_and_remembers_origin() {
        let dir = tempfile::tempdir().unwrap();
        let portal = portal(dir.path());
        portal.restore();

        portal.nav.navigate("/my-projects");
        let matched = resolve(&portal).unwrap();

        assert_eq!(matched.page, PageId::Login);
        assert_eq!(portal.nav.current(), paths::LOGIN);
        assert_eq!(portal.nav.take_return_to().as_deref(), Some("/my-projects"));
    }

    #[test]
    fn test_unknown_path_resolves_to_home() {
        let dir = tempfile::tempdir().unwrap();
        let portal = portal(dir.path());
        portal.restore();

        portal.nav.navigate("/totally/unknown");
        let matched = resolve(&portal).unwrap();

        assert_eq!(matched.page, PageId::Home);
        assert_eq!(portal.nav.current(), paths::HOME);
    }

    #[test]
    fn test_nothing_resolves_while_initializing() {
        let dir = tempfile::tempdir().unwrap();
        // No restore(): auth state is still Initializing.
        let portal = portal(dir.path());

        portal.nav.navigate("/my-projects");
        assert!(resolve(&portal).is_none());
        // No premature redirect either.
        assert_eq!(portal.nav.current(), "/my-projects");
    }
}
