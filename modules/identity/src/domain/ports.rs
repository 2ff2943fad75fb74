use async_trait::async_trait;

use crate::domain::claims::Claims;
use crate::domain::error::VerifyError;

/// Input port of the bearer middleware.
#[async_trait]
pub trait TokenVerifier: Send + Sync + 'static {
    async fn verify(&self, token: &str) -> Result<Claims, VerifyError>;
}
