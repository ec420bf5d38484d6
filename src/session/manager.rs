//! Auth session state machine.
//!
//! Owns "am I logged in, and as whom". All Session Store writes funnel
//! through this type, and backend role strings are normalized here and
//! nowhere else. The lifecycle is `Initializing` until [`AuthSession::restore`]
//! has read the store, then `Unauthenticated` or `Authenticated`; login,
//! logout, and the adapter's 401 interceptor move between the two.

use parking_lot::RwLock;
use serde::Deserialize;
use serde_json::json;
use std::io;
use std::sync::{Arc, Weak};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::identity::{BackendUser, Identity, IdentityUpdate};
use super::store::SessionStore;
use crate::client::{ApiClient, ApiError, UnauthorizedHandler};
use crate::nav::{paths, Navigator};

/// Authentication lifecycle. Protected routes render nothing while
/// `Initializing` holds.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthState {
    Initializing,
    Unauthenticated,
    Authenticated(Identity),
}

#[derive(Debug, Error)]
pub enum AuthError {
    /// Login rejected; carries the backend's reason verbatim.
    #[error("{0}")]
    Authentication(String),

    /// Registration rejected; carries the backend's reason verbatim.
    #[error("{0}")]
    Registration(String),

    /// The backend accepted the call but answered with a shape we cannot use.
    #[error("unexpected response from backend: {0}")]
    Protocol(String),

    /// The call itself failed (transport failure, or a non-auth rejection).
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The session could not be persisted.
    #[error("failed to persist session: {0}")]
    Store(#[from] io::Error),
}

impl AuthError {
    /// The backend signals a registered-but-not-yet-approved account through
    /// its message text; there is no structured code for it.
    pub fn is_pending_approval(&self) -> bool {
        matches!(self, AuthError::Authentication(message) if message.contains("Pending Approval"))
    }
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    token: String,
    user: BackendUser,
}

/// Registration form data. Sent to the backend under its own field names
/// (`fullName`, `mobile`, `companyName`); the account stays locked until an
/// administrator approves it, so registering never signs the caller in.
#[derive(Debug, Clone)]
pub struct Registration {
    pub full_name: String,
    pub email: String,
    pub password: String,
    pub mobile: String,
    pub company_name: String,
}

pub struct AuthSession {
    client: Arc<ApiClient>,
    store: SessionStore,
    nav: Arc<Navigator>,
    state: Arc<RwLock<AuthState>>,
}

impl AuthSession {
    pub fn new(client: Arc<ApiClient>, store: SessionStore, nav: Arc<Navigator>) -> Self {
        Self {
            client,
            store,
            nav,
            state: Arc::new(RwLock::new(AuthState::Initializing)),
        }
    }

    /// Wire the adapter's 401 side effect: any unauthorized response clears
    /// the session and moves the user to the login page - unless the app is
    /// already there, so a failed login does not loop.
    pub fn install_unauthorized_handler(&self) {
        let handler = ForcedLogout {
            client: Arc::downgrade(&self.client),
            store: self.store.clone(),
            nav: self.nav.clone(),
            state: self.state.clone(),
        };
        self.client.set_unauthorized_handler(Arc::new(handler));
    }

    /// Read any persisted session. Runs once at process start; until it has,
    /// the state is `Initializing` and the router holds protected pages.
    pub fn restore(&self) {
        let next = match self.store.load() {
            Some((token, identity)) => {
                debug!(email = %identity.email, role = %identity.role, "restored session");
                self.client.set_token(Some(token));
                AuthState::Authenticated(identity)
            }
            None => AuthState::Unauthenticated,
        };
        *self.state.write() = next;
    }

    pub fn state(&self) -> AuthState {
        self.state.read().clone()
    }

    pub fn identity(&self) -> Option<Identity> {
        match &*self.state.read() {
            AuthState::Authenticated(identity) => Some(identity.clone()),
            _ => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(&*self.state.read(), AuthState::Authenticated(_))
    }

    /// Sign in against the backend and persist the session.
    ///
    /// Rejections keep the backend's message verbatim - callers tell an
    /// unapproved account apart via [`AuthError::is_pending_approval`].
    pub async fn login(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        let body = json!({ "email": email, "password": password });
        let payload = self
            .client
            .post("/auth/login", &body)
            .await
            .map_err(|err| match err {
                ApiError::Status { message, .. } => AuthError::Authentication(message),
                other => AuthError::Api(other),
            })?;

        let response: LoginResponse = match payload {
            Some(value) => serde_json::from_value(value)
                .map_err(|err| AuthError::Protocol(err.to_string()))?,
            None => return Err(AuthError::Protocol("login response had no body".to_string())),
        };

        let identity = self.complete_login(response.token, response.user, email)?;
        info!(email = %identity.email, role = %identity.role, "signed in");
        Ok(identity)
    }

    /// Persist the token and normalized identity, then enter `Authenticated`.
    fn complete_login(
        &self,
        token: String,
        user: BackendUser,
        fallback_email: &str,
    ) -> Result<Identity, AuthError> {
        let identity = user.into_identity(fallback_email);
        self.store.save(&token, &identity)?;
        self.client.set_token(Some(token));
        *self.state.write() = AuthState::Authenticated(identity.clone());
        Ok(identity)
    }

    /// Submit a registration. Succeeding changes nothing locally - the
    /// account needs admin approval before its first login.
    pub async fn register(&self, data: &Registration) -> Result<(), AuthError> {
        let body = json!({
            "fullName": data.full_name,
            "email": data.email,
            "password": data.password,
            "mobile": data.mobile,
            "companyName": data.company_name,
            "role": "Client",
        });
        match self.client.post("/auth/register", &body).await {
            Ok(_) => {
                info!(email = %data.email, "registration submitted");
                Ok(())
            }
            Err(ApiError::Status { message, .. }) => Err(AuthError::Registration(message)),
            Err(other) => Err(AuthError::Api(other)),
        }
    }

    /// Ask the backend to send a password-reset email. Returns the notice to
    /// show the user.
    pub async fn forgot_password(&self, email: &str) -> Result<String, AuthError> {
        let body = json!({ "email": email });
        let payload = self.client.post("/auth/forgot-password", &body).await?;
        Ok(payload
            .as_ref()
            .and_then(|value| value.get("message"))
            .and_then(|message| message.as_str())
            .unwrap_or("If that address is registered, a reset link is on its way.")
            .to_string())
    }

    /// Drop the session everywhere and land on the login page. Safe to call
    /// when already signed out.
    pub fn logout(&self) {
        self.store.clear();
        self.client.set_token(None);
        *self.state.write() = AuthState::Unauthenticated;
        self.nav.replace(paths::LOGIN);
        info!("signed out");
    }

    /// Merge profile changes into the current identity and re-persist it.
    /// The token is left as issued; signed-out sessions ignore the call.
    pub fn update_user(&self, updates: IdentityUpdate) -> Option<Identity> {
        let mut state = self.state.write();
        let AuthState::Authenticated(identity) = &mut *state else {
            return None;
        };
        identity.apply(updates);
        if let Err(err) = self.store.update_identity(identity) {
            warn!(error = %err, "failed to persist profile update");
        }
        Some(identity.clone())
    }
}

/// The adapter's 401 interceptor: same terminal state as [`AuthSession::logout`],
/// skipped when the user is already on the login page.
struct ForcedLogout {
    client: Weak<ApiClient>,
    store: SessionStore,
    nav: Arc<Navigator>,
    state: Arc<RwLock<AuthState>>,
}

impl UnauthorizedHandler for ForcedLogout {
    fn on_unauthorized(&self) {
        if self.nav.current() == paths::LOGIN {
            return;
        }
        warn!("backend rejected the session, signing out");
        self.store.clear();
        if let Some(client) = self.client.upgrade() {
            client.set_token(None);
        }
        *self.state.write() = AuthState::Unauthenticated;
        self.nav.replace(paths::LOGIN);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::{RouteDecision, RouteTable};
    use crate::session::Role;
    use std::time::Duration;

    fn session(dir: &std::path::Path) -> (AuthSession, Arc<ApiClient>, Arc<Navigator>) {
        let client = Arc::new(
            ApiClient::new("http://localhost:3000/api/v1", Duration::from_secs(5)).unwrap(),
        );
        let nav = Arc::new(Navigator::new());
        let auth = AuthSession::new(client.clone(), SessionStore::new(dir), nav.clone());
        auth.install_unauthorized_handler();
        (auth, client, nav)
    }

    fn agent_payload() -> BackendUser {
        serde_json::from_value(serde_json::json!({
            "id": "u7",
            "email": "amal@example.com",
            "fullName": "Amal Haddad",
            "role": "Agent",
            "companyName": "BizTech"
        }))
        .unwrap()
    }

    #[test]
    fn test_starts_initializing() {
        let dir = tempfile::tempdir().unwrap();
        let (auth, _, _) = session(dir.path());
        assert_eq!(auth.state(), AuthState::Initializing);
        assert!(!auth.is_authenticated());
    }

    #[test]
    fn test_restore_without_session() {
        let dir = tempfile::tempdir().unwrap();
        let (auth, client, _) = session(dir.path());
        auth.restore();
        assert_eq!(auth.state(), AuthState::Unauthenticated);
        assert!(!client.has_token());
    }

    #[test]
    fn test_restore_with_persisted_session() {
        let dir = tempfile::tempdir().unwrap();
        {
            let (auth, _, _) = session(dir.path());
            auth.complete_login("tok-123".to_string(), agent_payload(), "amal@example.com")
                .unwrap();
        }

        let (auth, client, _) = session(dir.path());
        auth.restore();
        let identity = auth.identity().unwrap();
        assert_eq!(identity.role, Role::Agent);
        assert_eq!(identity.email, "amal@example.com");
        assert!(client.has_token());
    }

    #[test]
    fn test_login_normalizes_role_and_gates_routes() {
        let dir = tempfile::tempdir().unwrap();
        let (auth, client, _) = session(dir.path());
        auth.restore();

        let identity = auth
            .complete_login("tok-123".to_string(), agent_payload(), "amal@example.com")
            .unwrap();
        assert_eq!(identity.role, Role::Agent);
        assert!(client.has_token());

        // The persisted pair is non-empty and normalized.
        let (token, stored) = SessionStore::new(dir.path()).load().unwrap();
        assert!(!token.is_empty());
        assert_eq!(stored.role, Role::Agent);

        // The agent's own dashboard renders; the admin dashboard bounces
        // back to the agent dashboard, not to login.
        let routes = RouteTable::portal();
        match routes.evaluate(&auth.state(), "/agent/dashboard") {
            RouteDecision::Render(matched) => assert_eq!(matched.path, "/agent/dashboard"),
            other => panic!("expected render, got {:?}", other),
        }
        assert_eq!(
            routes.evaluate(&auth.state(), "/admin/dashboard"),
            RouteDecision::RedirectToDashboard(Role::Agent)
        );
    }

    #[test]
    fn test_logout_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let (auth, client, nav) = session(dir.path());
        auth.restore();
        auth.complete_login("tok-123".to_string(), agent_payload(), "amal@example.com")
            .unwrap();

        auth.logout();
        auth.logout();

        assert_eq!(auth.state(), AuthState::Unauthenticated);
        assert!(!client.has_token());
        assert!(SessionStore::new(dir.path()).load().is_none());
        assert_eq!(nav.current(), paths::LOGIN);
    }

    #[test]
    fn test_update_user_merges_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let (auth, _, _) = session(dir.path());
        auth.restore();
        auth.complete_login("tok-123".to_string(), agent_payload(), "amal@example.com")
            .unwrap();

        let updated = auth
            .update_user(IdentityUpdate {
                name: Some("Amal H.".to_string()),
                ..IdentityUpdate::default()
            })
            .unwrap();
        assert_eq!(updated.name, "Amal H.");
        assert_eq!(updated.role, Role::Agent);

        let (token, stored) = SessionStore::new(dir.path()).load().unwrap();
        assert_eq!(token, "tok-123");
        assert_eq!(stored.name, "Amal H.");
    }

    #[test]
    fn test_update_user_ignored_when_signed_out() {
        let dir = tempfile::tempdir().unwrap();
        let (auth, _, _) = session(dir.path());
        auth.restore();
        assert!(auth
            .update_user(IdentityUpdate {
                name: Some("ghost".to_string()),
                ..IdentityUpdate::default()
            })
            .is_none());
        assert!(SessionStore::new(dir.path()).load().is_none());
    }

    #[test]
    fn test_forced_logout_clears_session_and_redirects() {
        let dir = tempfile::tempdir().unwrap();
        let (auth, client, nav) = session(dir.path());
        auth.restore();
        auth.complete_login("tok-123".to_string(), agent_payload(), "amal@example.com")
            .unwrap();
        nav.navigate("/agent/projects");

        client.notify_unauthorized();

        assert_eq!(auth.state(), AuthState::Unauthenticated);
        assert!(!client.has_token());
        assert!(SessionStore::new(dir.path()).load().is_none());
        assert_eq!(nav.current(), paths::LOGIN);
    }

    #[test]
    fn test_forced_logout_skipped_on_login_page() {
        let dir = tempfile::tempdir().unwrap();
        let (auth, client, nav) = session(dir.path());
        auth.restore();
        auth.complete_login("tok-123".to_string(), agent_payload(), "amal@example.com")
            .unwrap();
        nav.replace(paths::LOGIN);

        client.notify_unauthorized();

        // Nothing is torn down while the login page is active.
        assert!(auth.is_authenticated());
        assert!(client.has_token());
        assert!(SessionStore::new(dir.path()).load().is_some());
    }

    #[test]
    fn test_pending_approval_detection() {
        let err = AuthError::Authentication("Account is Pending Approval".to_string());
        assert!(err.is_pending_approval());
        let err = AuthError::Authentication("Invalid credentials".to_string());
        assert!(!err.is_pending_approval());
        let err = AuthError::Registration("Account is Pending Approval".to_string());
        assert!(!err.is_pending_approval());
    }
}
