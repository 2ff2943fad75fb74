use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};

/// 401 outcomes of the bearer middleware; bodies are plain text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    MissingBearer,
    InvalidToken,
}

impl AuthError {
    pub fn body(self) -> &'static str {
        match self {
            AuthError::MissingBearer => "Unauthorized",
            AuthError::InvalidToken => "Invalid token",
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        (
            StatusCode::UNAUTHORIZED,
            [(header::WWW_AUTHENTICATE, "Bearer")],
            self.body(),
        )
            .into_response()
    }
}
