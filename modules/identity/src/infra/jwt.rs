use std::sync::Arc;

use async_trait::async_trait;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};

use crate::config::{ConfigError, IdentityConfig};
use crate::domain::claims::Claims;
use crate::domain::error::VerifyError;
use crate::domain::ports::TokenVerifier;
use crate::infra::jwks::KeySource;

/// Verifies RS/ES/PS-signed access tokens against keys from a [`KeySource`].
pub struct JwtVerifier {
    keys: Arc<dyn KeySource>,
    issuer: String,
    audience: String,
    algorithms: Vec<Algorithm>,
    leeway_secs: u64,
}

impl JwtVerifier {
    pub fn new(keys: Arc<dyn KeySource>, cfg: &IdentityConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            keys,
            issuer: cfg.issuer(),
            audience: cfg.audience.trim().to_string(),
            algorithms: cfg.parsed_algorithms()?,
            leeway_secs: cfg.leeway_secs,
        })
    }

    fn validation(&self, alg: Algorithm) -> Validation {
        let mut validation = Validation::new(alg);
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.audience]);
        validation.set_required_spec_claims(&["exp", "iss", "aud"]);
        validation.validate_nbf = true;
        validation.leeway = self.leeway_secs;
        validation
    }
}

#[async_trait]
impl TokenVerifier for JwtVerifier {
    async fn verify(&self, token: &str) -> Result<Claims, VerifyError> {
        let header = decode_header(token).map_err(|e| VerifyError::Malformed(e.to_string()))?;

        // Rejected before any key lookup.
        if !self.algorithms.contains(&header.alg) {
            return Err(VerifyError::AlgorithmNotAllowed(format!("{:?}", header.alg)));
        }

        let jwk = self.keys.key_for(header.kid.as_deref()).await?;
        let key = DecodingKey::from_jwk(&jwk).map_err(|e| VerifyError::UnusableKey(e.to_string()))?;

        let data = decode::<Claims>(token, &key, &self.validation(header.alg)).map_err(map_jwt_error)?;
        Ok(data.claims)
    }
}

fn map_jwt_error(e: jsonwebtoken::errors::Error) -> VerifyError {
    match e.kind() {
        ErrorKind::InvalidSignature => VerifyError::InvalidSignature,
        ErrorKind::ExpiredSignature => VerifyError::Expired,
        ErrorKind::ImmatureSignature => VerifyError::NotYetValid,
        ErrorKind::InvalidIssuer => VerifyError::InvalidIssuer,
        ErrorKind::InvalidAudience => VerifyError::InvalidAudience,
        ErrorKind::MissingRequiredClaim(claim) => VerifyError::MissingClaim(claim.clone()),
        ErrorKind::InvalidAlgorithm => VerifyError::AlgorithmNotAllowed(e.to_string()),
        _ => VerifyError::Rejected(e.to_string()),
    }
}
