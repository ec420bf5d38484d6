//! CLI module for the BizHire command-line interface.
//!
//! Provides one-shot subcommands for the common portal actions:
//! - `login <email>` / `logout` / `whoami` - manage the signed-in session
//! - `register` - submit an account for admin approval
//! - `open <path>` - render a portal page through the role-gated router
//! - `profile show` / `profile update` - view or edit the signed-in profile
//! - `config check` - validate the configuration file
//!
//! Running without a subcommand opens the interactive portal shell.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::nav::paths;
use crate::pages;
use crate::session::{IdentityUpdate, Registration};
use crate::Portal;

/// CLI arguments structure
#[derive(Parser, Debug)]
#[command(name = "bizhire")]
#[command(author, version, about = "Terminal client for the BizHire agency portal", long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "bizhire.toml")]
    pub config: PathBuf,

    /// Override log level
    #[arg(short, long)]
    pub log_level: Option<String>,

    /// Backend API URL (overrides the configuration file)
    #[arg(long, env = "BIZHIRE_API_URL")]
    pub api_url: Option<String>,

    /// Subcommand to run (if none, opens the portal shell)
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sign in and persist the session
    Login {
        /// Email address of the portal account
        email: String,

        /// Page to open after signing in (defaults to the role's dashboard)
        #[arg(long)]
        goto: Option<String>,
    },

    /// Submit a registration (admin approval is required before first login)
    Register {
        /// Full name
        #[arg(long)]
        name: String,

        /// Email address
        #[arg(long)]
        email: String,

        /// Mobile number
        #[arg(long)]
        mobile: String,

        /// Company name
        #[arg(long, default_value = "")]
        company: String,
    },

    /// Sign out and clear the persisted session
    Logout,

    /// Show the signed-in account
    Whoami,

    /// Open a portal page by path
    Open {
        /// Route path, e.g. /my-projects or /agent/dashboard
        path: String,
    },

    /// Request a password-reset email
    ForgotPassword {
        /// Email address of the portal account
        email: String,
    },

    /// Profile commands
    #[command(subcommand)]
    Profile(ProfileCommands),

    /// Configuration management commands
    #[command(subcommand)]
    Config(ConfigCommands),
}

/// Profile subcommands
#[derive(Subcommand, Debug)]
pub enum ProfileCommands {
    /// Show the signed-in profile
    Show,
    /// Update profile fields and re-persist the session
    Update {
        /// New display name
        #[arg(long)]
        name: Option<String>,

        /// New email address
        #[arg(long)]
        email: Option<String>,

        /// New company name (empty string clears it)
        #[arg(long)]
        company: Option<String>,
    },
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Validate configuration file
    Check,
}

/// Run a CLI command
pub async fn run_command(cli: &Cli, portal: &Portal) -> Result<()> {
    match &cli.command {
        Some(Commands::Login { email, goto }) => cmd_login(portal, email, goto.as_deref()).await,
        Some(Commands::Register {
            name,
            email,
            mobile,
            company,
        }) => cmd_register(portal, name, email, mobile, company).await,
        Some(Commands::Logout) => cmd_logout(portal),
        Some(Commands::Whoami) => cmd_whoami(portal),
        Some(Commands::Open { path }) => pages::visit(portal, path).await,
        Some(Commands::ForgotPassword { email }) => cmd_forgot_password(portal, email).await,
        Some(Commands::Profile(ProfileCommands::Show)) => cmd_profile_show(portal),
        Some(Commands::Profile(ProfileCommands::Update {
            name,
            email,
            company,
        })) => cmd_profile_update(portal, name.clone(), email.clone(), company.clone()),
        Some(Commands::Config(ConfigCommands::Check)) => cmd_config_check(cli),
        None => {
            // No subcommand means the portal shell - handled in main.rs
            Ok(())
        }
    }
}

/// Sign in, persist the session, and open the landing page
async fn cmd_login(portal: &Portal, email: &str, goto: Option<&str>) -> Result<()> {
    // The one-shot command behaves like the login page: the 401 interceptor
    // stays quiet while we are "on" it.
    portal.nav.replace(paths::LOGIN);
    if let Some(path) = goto {
        portal.nav.set_return_to(path);
    }

    let password = rpassword::prompt_password("Password: ").context("Failed to read password")?;

    match portal.auth.login(email, &password).await {
        Ok(identity) => {
            println!("[OK] Signed in as {} ({})", identity.email, identity.role);
            let destination = portal
                .nav
                .take_return_to()
                .unwrap_or_else(|| identity.role.dashboard_path().to_string());
            pages::visit(portal, &destination).await
        }
        Err(err) if err.is_pending_approval() => {
            println!("[!!] Your account is still pending administrator approval.");
            pages::visit(portal, paths::PENDING_APPROVAL).await
        }
        Err(err) => anyhow::bail!("Login failed: {}", err),
    }
}

/// Submit a registration for admin approval
async fn cmd_register(
    portal: &Portal,
    name: &str,
    email: &str,
    mobile: &str,
    company: &str,
) -> Result<()> {
    let password = rpassword::prompt_password("Password: ").context("Failed to read password")?;
    let confirm =
        rpassword::prompt_password("Confirm password: ").context("Failed to read password")?;
    if password != confirm {
        anyhow::bail!("Passwords do not match");
    }

    let registration = Registration {
        full_name: name.to_string(),
        email: email.to_string(),
        password,
        mobile: mobile.to_string(),
        company_name: company.to_string(),
    };

    portal
        .auth
        .register(&registration)
        .await
        .map_err(|err| anyhow::anyhow!("Registration failed: {}", err))?;

    println!("[OK] Account created. An administrator must approve it before you can sign in.");
    pages::visit(portal, paths::PENDING_APPROVAL).await
}

/// Sign out and clear the persisted session
fn cmd_logout(portal: &Portal) -> Result<()> {
    portal.auth.logout();
    println!("[OK] Signed out.");
    Ok(())
}

/// Show the signed-in account
fn cmd_whoami(portal: &Portal) -> Result<()> {
    match portal.auth.identity() {
        Some(identity) => {
            println!(
                "{} <{}> ({})",
                identity.display_name(),
                identity.email,
                identity.role
            );
            Ok(())
        }
        None => {
            println!("Not signed in.");
            Ok(())
        }
    }
}

/// Request a password-reset email
async fn cmd_forgot_password(portal: &Portal, email: &str) -> Result<()> {
    let notice = portal
        .auth
        .forgot_password(email)
        .await
        .map_err(|err| anyhow::anyhow!("Request failed: {}", err))?;
    println!("{}", notice);
    Ok(())
}

/// Show the signed-in profile
fn cmd_profile_show(portal: &Portal) -> Result<()> {
    let Some(identity) = portal.auth.identity() else {
        anyhow::bail!("Not signed in. Use 'bizhire login <email>' first.");
    };

    println!();
    println!("=== Profile ===");
    println!();
    println!("Name:    {}", identity.name);
    println!("Email:   {}", identity.email);
    println!("Role:    {}", identity.role);
    if let Some(company) = &identity.company {
        println!("Company: {}", company);
    }
    println!();
    Ok(())
}

/// Update profile fields and re-persist the session
fn cmd_profile_update(
    portal: &Portal,
    name: Option<String>,
    email: Option<String>,
    company: Option<String>,
) -> Result<()> {
    if name.is_none() && email.is_none() && company.is_none() {
        anyhow::bail!("Nothing to update. Pass --name, --email or --company.");
    }

    let updates = IdentityUpdate {
        name,
        email,
        company,
    };

    match portal.auth.update_user(updates) {
        Some(identity) => {
            println!("[OK] Profile updated.");
            println!();
            println!("Name:    {}", identity.name);
            println!("Email:   {}", identity.email);
            if let Some(company) = &identity.company {
                println!("Company: {}", company);
            }
            Ok(())
        }
        None => anyhow::bail!("Not signed in. Use 'bizhire login <email>' first."),
    }
}

/// Validate configuration file
fn cmd_config_check(cli: &Cli) -> Result<()> {
    use crate::config::Config;

    let config_path = &cli.config;

    println!("Checking configuration file: {}", config_path.display());
    println!();

    if !config_path.exists() {
        println!(
            "[!!] Configuration file not found: {}",
            config_path.display()
        );
        println!();
        println!("Default configuration will be used.");
        println!("To create a custom configuration, copy bizhire.example.toml to bizhire.toml");
        return Ok(());
    }

    match Config::load(config_path) {
        Ok(config) => {
            println!("[OK] Configuration file is valid!");
            println!();
            println!("=== Configuration Summary ===");
            println!();
            println!("Backend:");
            println!("  Base URL:    {}", config.backend.base_url);
            println!("  Timeout:     {}s", config.backend.timeout_secs);
            println!();
            println!("Session:");
            println!("  Directory:   {}", config.session.dir.display());
            println!();
            println!("Logging:");
            println!("  Level:       {}", config.logging.level);
            println!();

            if config.backend.base_url.starts_with("http://") {
                println!("Warnings:");
                println!("  [!] Backend URL is not HTTPS - the bearer token travels in cleartext");
                println!();
            }

            Ok(())
        }
        Err(e) => {
            println!("[!!] Configuration file is invalid!");
            println!();
            println!("Error: {}", e);
            println!();
            println!("Please check the configuration file syntax and try again.");
            anyhow::bail!("Invalid configuration file");
        }
    }
}
