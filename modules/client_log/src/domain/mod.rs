pub mod error;
pub mod event;
pub mod ports;
pub mod redact;
pub mod schema;
pub mod service;
pub mod severity;
