//! Error types for IronLicensing.
//!
//! Remote outcomes (rejected keys, server errors, network failures) are
//! reported through [`crate::LicenseResult`] and [`crate::CheckoutResult`].
//! This enum is reserved for caller misuse and for adapter internals.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    // Caller misuse
    #[error("Feature '{feature}' requires a valid license")]
    FeatureNotLicensed { feature: String },

    #[error("IronLicensing not initialized. Call registry::init() first.")]
    NotInitialized,

    #[error("Missing configuration: {0}")]
    MissingConfig(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // Infrastructure errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// The feature key carried by a [`Error::FeatureNotLicensed`] error.
    pub fn feature(&self) -> Option<&str> {
        match self {
            Error::FeatureNotLicensed { feature } => Some(feature),
            _ => None,
        }
    }

    /// Whether this error signals a programming error by the caller.
    pub fn is_caller_misuse(&self) -> bool {
        matches!(
            self,
            Error::FeatureNotLicensed { .. }
                | Error::NotInitialized
                | Error::MissingConfig(_)
                | Error::InvalidConfig(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}
