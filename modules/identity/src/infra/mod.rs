pub mod jwks;
pub mod jwt;

pub use jwks::{JwksCache, JwksError, KeySource};
pub use jwt::JwtVerifier;
