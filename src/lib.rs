pub mod cli;
pub mod client;
pub mod config;
pub mod nav;
pub mod pages;
pub mod router;
pub mod session;
pub mod shell;

pub use client::{ApiClient, ApiError};
pub use session::{AuthError, AuthSession, AuthState, Identity, Role};

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;

use config::Config;
use nav::Navigator;
use router::RouteTable;
use session::SessionStore;

/// Shared application state: one instance constructed at process start and
/// passed by reference to every page, command, and the shell. Holds the
/// single HTTP adapter, the auth session that owns the persisted state, the
/// navigator, and the route table.
pub struct Portal {
    pub config: Config,
    pub client: Arc<ApiClient>,
    pub auth: AuthSession,
    pub nav: Arc<Navigator>,
    pub routes: RouteTable,
}

impl Portal {
    pub fn new(config: Config) -> Result<Self> {
        let client = Arc::new(ApiClient::new(
            &config.backend.base_url,
            Duration::from_secs(config.backend.timeout_secs),
        )?);
        let nav = Arc::new(Navigator::new());
        let store = SessionStore::new(&config.session.dir);

        let auth = AuthSession::new(client.clone(), store, nav.clone());
        auth.install_unauthorized_handler();

        Ok(Self {
            config,
            client,
            auth,
            nav,
            routes: RouteTable::portal(),
        })
    }

    /// Read any persisted session. Call once at startup, before routing.
    pub fn restore(&self) {
        self.auth.restore();
    }
}
