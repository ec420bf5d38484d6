//! The normalized identity of the signed-in user.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::nav::paths;

/// Portal roles. The backend is inconsistent about casing ("Client" vs
/// "client"); every inbound role string is folded to lowercase here, and
/// anything unrecognized lands on `Client` instead of leaking a raw string
/// downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Client,
    Agent,
    Admin,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Client, Role::Agent, Role::Admin];

    /// Fold a backend role string onto the closed enum.
    pub fn normalize(raw: &str) -> Self {
        match raw.to_lowercase().as_str() {
            "admin" => Role::Admin,
            "agent" => Role::Agent,
            _ => Role::Client,
        }
    }

    /// Landing page for this role, used after login and when a route turns
    /// the user away.
    pub fn dashboard_path(&self) -> &'static str {
        match self {
            Role::Client => paths::CLIENT_DASHBOARD,
            Role::Agent => paths::AGENT_DASHBOARD,
            Role::Admin => paths::ADMIN_DASHBOARD,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Client => "client",
            Role::Agent => "agent",
            Role::Admin => "admin",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The authenticated principal as the rest of the application sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
}

impl Identity {
    /// Merge a partial update; `None` fields keep their value.
    pub fn apply(&mut self, updates: IdentityUpdate) {
        if let Some(name) = updates.name {
            self.name = name;
        }
        if let Some(email) = updates.email {
            self.email = email;
        }
        if let Some(company) = updates.company {
            self.company = if company.is_empty() { None } else { Some(company) };
        }
    }

    /// Name to greet the user with; falls back to the email address for
    /// accounts registered without one.
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.email
        } else {
            &self.name
        }
    }
}

/// Partial identity for profile updates.
#[derive(Debug, Clone, Default)]
pub struct IdentityUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    /// An empty string clears the company.
    pub company: Option<String>,
}

/// User payload as the backend sends it. Field names vary between endpoints
/// (`fullName` vs `name`, `companyName` vs `company`, string vs numeric
/// ids); [`BackendUser::into_identity`] is the single place that irons this
/// out.
#[derive(Debug, Clone, Deserialize)]
pub struct BackendUser {
    #[serde(default, deserialize_with = "opaque_id")]
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, rename = "fullName")]
    pub full_name: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default, rename = "companyName")]
    pub company_name: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
}

impl BackendUser {
    /// Normalize the backend shape into the internal model. `fallback_email`
    /// is the address the user signed in with, used when the payload omits
    /// its own.
    pub fn into_identity(self, fallback_email: &str) -> Identity {
        Identity {
            id: self.id,
            email: self
                .email
                .filter(|email| !email.is_empty())
                .unwrap_or_else(|| fallback_email.to_string()),
            name: self.full_name.or(self.name).unwrap_or_default(),
            role: Role::normalize(self.role.as_deref().unwrap_or("client")),
            company: self
                .company_name
                .or(self.company)
                .filter(|company| !company.is_empty()),
        }
    }
}

/// Backend ids arrive as strings or numbers depending on the endpoint.
fn opaque_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn backend_user(value: serde_json::Value) -> BackendUser {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_role_normalize_case_folds() {
        assert_eq!(Role::normalize("Client"), Role::Client);
        assert_eq!(Role::normalize("AGENT"), Role::Agent);
        assert_eq!(Role::normalize("Admin"), Role::Admin);
        assert_eq!(Role::normalize("admin"), Role::Admin);
    }

    #[test]
    fn test_role_normalize_unknown_defaults_to_client() {
        assert_eq!(Role::normalize("superuser"), Role::Client);
        assert_eq!(Role::normalize(""), Role::Client);
    }

    #[test]
    fn test_role_serde_uses_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Agent).unwrap(), "\"agent\"");
        let role: Role = serde_json::from_str("\"admin\"").unwrap();
        assert_eq!(role, Role::Admin);
    }

    #[test]
    fn test_dashboard_paths() {
        assert_eq!(Role::Client.dashboard_path(), "/client-dashboard");
        assert_eq!(Role::Agent.dashboard_path(), "/agent/dashboard");
        assert_eq!(Role::Admin.dashboard_path(), "/admin/dashboard");
    }

    #[test]
    fn test_full_name_is_preferred_over_name() {
        let user = backend_user(json!({
            "id": "u1",
            "email": "jo@example.com",
            "fullName": "Jo Farah",
            "name": "jo",
            "role": "Client"
        }));
        assert_eq!(user.into_identity("jo@example.com").name, "Jo Farah");
    }

    #[test]
    fn test_name_fallback() {
        let user = backend_user(json!({ "id": "u1", "name": "jo", "role": "client" }));
        assert_eq!(user.into_identity("jo@example.com").name, "jo");
    }

    #[test]
    fn test_company_name_is_preferred_over_company() {
        let user = backend_user(json!({
            "id": "u1",
            "role": "client",
            "companyName": "Acme LLC",
            "company": "old"
        }));
        assert_eq!(
            user.into_identity("jo@example.com").company.as_deref(),
            Some("Acme LLC")
        );
    }

    #[test]
    fn test_missing_company_stays_absent() {
        let user = backend_user(json!({ "id": "u1", "role": "client", "companyName": "" }));
        assert_eq!(user.into_identity("jo@example.com").company, None);
    }

    #[test]
    fn test_email_falls_back_to_login_address() {
        let user = backend_user(json!({ "id": "u1", "role": "client" }));
        assert_eq!(user.into_identity("jo@example.com").email, "jo@example.com");
    }

    #[test]
    fn test_numeric_id_becomes_opaque_string() {
        let user = backend_user(json!({ "id": 42, "role": "Client" }));
        assert_eq!(user.into_identity("jo@example.com").id, "42");
    }

    #[test]
    fn test_unrecognized_role_defaults_to_client() {
        let user = backend_user(json!({ "id": "u1", "role": "Superuser" }));
        assert_eq!(user.into_identity("jo@example.com").role, Role::Client);
    }

    #[test]
    fn test_apply_merges_only_given_fields() {
        let mut identity = Identity {
            id: "u1".to_string(),
            email: "jo@example.com".to_string(),
            name: "Jo Farah".to_string(),
            role: Role::Client,
            company: Some("Acme LLC".to_string()),
        };
        identity.apply(IdentityUpdate {
            name: Some("Jo F.".to_string()),
            ..IdentityUpdate::default()
        });
        assert_eq!(identity.name, "Jo F.");
        assert_eq!(identity.email, "jo@example.com");
        assert_eq!(identity.company.as_deref(), Some("Acme LLC"));

        identity.apply(IdentityUpdate {
            company: Some(String::new()),
            ..IdentityUpdate::default()
        });
        assert_eq!(identity.company, None);
    }

    #[test]
    fn test_display_name_falls_back_to_email() {
        let identity = Identity {
            id: "u1".to_string(),
            email: "jo@example.com".to_string(),
            name: String::new(),
            role: Role::Client,
            company: None,
        };
        assert_eq!(identity.display_name(), "jo@example.com");
    }
}
