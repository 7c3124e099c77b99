use serde::{Deserialize, Serialize};

/// Opaque bearer token (collection "auth_tokens"), one per user
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct AuthToken {
    #[serde(rename = "_id")]
    pub key: String,
    pub user_id: i64,
    pub created: i64,
}

impl AuthToken {
    pub fn generate(user_id: i64) -> Self {
        AuthToken {
            key: uuid::Uuid::new_v4().simple().to_string(),
            user_id,
            created: chrono::Utc::now().timestamp(),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct AuthTokenRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}
