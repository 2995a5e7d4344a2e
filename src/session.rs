use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Explicit session context replacing the web client's ad-hoc browser-storage
/// lookups (token, role, user, organization). Created at login, held by the
/// app state, cleared at logout or when the backend reports a 401.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionContext {
    pub token: String,
    pub role: String,
    pub user_id: i64,
    pub user_name: Option<String>,
    pub org_id: String,
    pub issued_at: DateTime<Utc>,
}

impl SessionContext {
    /// `token` is the backend-issued bearer token when the caller already has
    /// one; otherwise a fresh opaque token is minted. The organization
    /// defaults to "1" like the web client's multi-tenancy header.
    pub fn login(
        role: &str,
        user_id: i64,
        user_name: Option<String>,
        org_id: Option<String>,
        token: Option<String>,
    ) -> Self {
        Self {
            token: token.unwrap_or_else(|| Uuid::new_v4().to_string()),
            role: role.to_ascii_lowercase(),
            user_id,
            user_name,
            org_id: org_id.unwrap_or_else(|| "1".to_string()),
            issued_at: Utc::now(),
        }
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.role.eq_ignore_ascii_case(role)
    }
}
