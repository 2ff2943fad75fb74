use serde::{Deserialize, Serialize};

use crate::domain::claims::Claims;

pub const ME_MESSAGE: &str = "Hello from a protected endpoint! You are authenticated.";

/// Body of `GET /api/me`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiMeResponse {
    pub message: String,
    pub user_id: String,
    pub payload: Claims,
}

impl From<Claims> for ApiMeResponse {
    fn from(claims: Claims) -> Self {
        Self {
            message: ME_MESSAGE.to_string(),
            user_id: claims.subject().unwrap_or_default().to_string(),
            payload: claims,
        }
    }
}
