use thiserror::Error;

/// Why a bearer token was rejected. Clients only ever see `Invalid token`.
#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("malformed token: {0}")]
    Malformed(String),

    #[error("algorithm {0} is not allowed")]
    AlgorithmNotAllowed(String),

    #[error("no usable signing key: {0}")]
    UnknownKey(String),

    #[error("signing keys unavailable: {0}")]
    KeysUnavailable(String),

    #[error("signing key cannot be used: {0}")]
    UnusableKey(String),

    #[error("signature verification failed")]
    InvalidSignature,

    #[error("token expired")]
    Expired,

    #[error("token not yet valid")]
    NotYetValid,

    #[error("issuer mismatch")]
    InvalidIssuer,

    #[error("audience mismatch")]
    InvalidAudience,

    #[error("missing required claim '{0}'")]
    MissingClaim(String),

    #[error("token rejected: {0}")]
    Rejected(String),
}
