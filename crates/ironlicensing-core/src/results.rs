//! Outcomes of remote license and checkout calls.

use crate::license::{Activation, License, null_as_default};
use serde::{Deserialize, Serialize};

/// Outcome of a validate, activate or trial call.
///
/// When `valid` is true the `license` is meaningful; when it is false the
/// `error` is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LicenseResult {
    #[serde(deserialize_with = "null_as_default")]
    pub valid: bool,
    pub license: Option<License>,
    pub activations: Option<Vec<Activation>>,
    pub error: Option<String>,
    /// Whether the result was served from a local cache.
    #[serde(deserialize_with = "null_as_default")]
    pub cached: bool,
}

impl LicenseResult {
    pub fn success(license: License) -> Self {
        Self {
            valid: true,
            license: Some(license),
            ..Default::default()
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            valid: false,
            error: Some(error.into()),
            ..Default::default()
        }
    }

    /// The license, if this result should replace the held state.
    pub fn accepted_license(&self) -> Option<&License> {
        if self.valid { self.license.as_ref() } else { None }
    }
}

/// Outcome of a purchase-intent call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CheckoutResult {
    #[serde(deserialize_with = "null_as_default")]
    pub success: bool,
    pub checkout_url: Option<String>,
    pub session_id: Option<String>,
    pub error: Option<String>,
}

impl CheckoutResult {
    pub fn success(checkout_url: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self {
            success: true,
            checkout_url: Some(checkout_url.into()),
            session_id: Some(session_id.into()),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            ..Default::default()
        }
    }
}
