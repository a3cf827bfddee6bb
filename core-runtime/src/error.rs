use thiserror::Error;

/// Errors raised while setting up the runtime.
#[derive(Error, Debug)]
pub enum Error {
    /// A [`CatalogConfig`](crate::config::CatalogConfig) value was rejected
    #[error("Invalid catalog configuration: {0}")]
    Config(String),

    /// A bridge the requested setup depends on was not provided
    #[error("Capability missing: {capability} - {message}")]
    CapabilityMissing { capability: String, message: String },

    #[error("Logging setup failed: {0}")]
    Logging(String),
}

pub type Result<T> = std::result::Result<T, Error>;
