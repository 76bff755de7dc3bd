use serde::{Deserialize, Serialize};

/// Email and password submitted for registration or login
#[derive(Clone, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// User identity kept in the session after a successful login
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthenticatedUser {
    pub id: String,
    pub email: Option<String>,
    #[serde(default)]
    pub user_metadata: serde_json::Value,
}

/// Result of a sign-up call
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SignUpOutcome {
    pub user_id: Option<String>,
    /// Whether the provider expects the user to confirm their email first
    pub confirmation_required: bool,
}
