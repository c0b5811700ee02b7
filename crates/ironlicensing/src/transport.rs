//! HTTP transport for the IronLicensing API.

use crate::machine::{self, MachineIdStore};
use crate::options::LicenseOptions;
use async_trait::async_trait;
use ironlicensing_core::{
    CheckoutResult, Error, LicenseResult, LicenseTransport, ProductTier, Result, TierList,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

const API_PREFIX: &str = "/api/v1";
const REQUEST_FAILED: &str = "Request failed";
const CHECKOUT_FAILED: &str = "Checkout failed";

/// reqwest-backed [`LicenseTransport`].
pub struct HttpTransport {
    base_url: String,
    public_key: String,
    product_slug: String,
    debug: bool,
    client: reqwest::Client,
    machine_id: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct KeyRequest<'a> {
    license_key: &'a str,
    machine_id: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ActivateRequest<'a> {
    license_key: &'a str,
    machine_id: &'a str,
    machine_name: &'a str,
    platform: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TrialRequest<'a> {
    email: &'a str,
    machine_id: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CheckoutRequest<'a> {
    tier_id: &'a str,
    email: &'a str,
}

/// A request that reached the server and got a response body back.
struct Reply {
    status: reqwest::StatusCode,
    body: String,
}

impl HttpTransport {
    /// Create a transport from validated options.
    ///
    /// The machine identifier is loaded (or created) here, once.
    pub fn new(options: &LicenseOptions) -> Result<Self> {
        let store = match &options.machine_id_path {
            Some(path) => MachineIdStore::at(path),
            None => MachineIdStore::user_default(),
        };
        Self::with_machine_id(options, store.load_or_create())
    }

    /// Create a transport with a known machine identifier.
    pub fn with_machine_id(options: &LicenseOptions, machine_id: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(options.http_timeout)
            .build()
            .map_err(|e| Error::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: options.api_base_url.trim_end_matches('/').to_string(),
            public_key: options.public_key.clone(),
            product_slug: options.product_slug.clone(),
            debug: options.debug,
            client,
            machine_id: machine_id.into(),
        })
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}{}", self.base_url, API_PREFIX, path);
        self.client
            .request(method, &url)
            .header("Content-Type", "application/json")
            .header("X-Public-Key", &self.public_key)
            .header("X-Product-Slug", &self.product_slug)
    }

    async fn send(&self, builder: reqwest::RequestBuilder) -> std::result::Result<Reply, String> {
        let response = builder.send().await.map_err(|e| e.to_string())?;
        let status = response.status();
        let body = response.text().await.map_err(|e| e.to_string())?;
        Ok(Reply { status, body })
    }

    async fn post_license<T: Serialize + Sync>(&self, path: &str, body: &T) -> LicenseResult {
        let builder = self.request(reqwest::Method::POST, path).json(body);
        match self.send(builder).await {
            Ok(reply) if reply.status.is_success() => {
                decode_body(&reply.body).unwrap_or_else(|e| {
                    warn!(path, error = %e, "Undecodable license response");
                    LicenseResult::failure(e)
                })
            }
            Ok(reply) => {
                let error = server_error(&reply.body, REQUEST_FAILED);
                warn!(path, status = %reply.status, error = %error, "License request rejected");
                LicenseResult::failure(error)
            }
            Err(e) => {
                warn!(path, error = %e, "License request failed");
                LicenseResult::failure(e)
            }
        }
    }
}

#[async_trait]
impl LicenseTransport for HttpTransport {
    async fn validate(&self, license_key: &str) -> LicenseResult {
        if self.debug {
            debug!(key_prefix = key_prefix(license_key), "Validating license");
        }
        let body = KeyRequest {
            license_key,
            machine_id: &self.machine_id,
        };
        self.post_license("/validate", &body).await
    }

    async fn activate(&self, license_key: &str, machine_name: Option<&str>) -> LicenseResult {
        if self.debug {
            debug!(key_prefix = key_prefix(license_key), "Activating license");
        }
        let hostname;
        let machine_name = match machine_name.filter(|n| !n.is_empty()) {
            Some(name) => name,
            None => {
                hostname = machine::hostname();
                &hostname
            }
        };
        let body = ActivateRequest {
            license_key,
            machine_id: &self.machine_id,
            machine_name,
            platform: machine::platform(),
        };
        self.post_license("/activate", &body).await
    }

    async fn deactivate(&self, license_key: &str) -> bool {
        if self.debug {
            debug!("Deactivating license");
        }
        let body = KeyRequest {
            license_key,
            machine_id: &self.machine_id,
        };
        let builder = self.request(reqwest::Method::POST, "/deactivate").json(&body);
        match builder.send().await {
            Ok(response) if response.status().is_success() => true,
            Ok(response) => {
                warn!(status = %response.status(), "Deactivation rejected");
                false
            }
            Err(e) => {
                warn!(error = %e, "Deactivation failed");
                false
            }
        }
    }

    async fn start_trial(&self, email: &str) -> LicenseResult {
        if self.debug {
            debug!(email, "Starting trial");
        }
        let body = TrialRequest {
            email,
            machine_id: &self.machine_id,
        };
        self.post_license("/trial", &body).await
    }

    async fn tiers(&self) -> Vec<ProductTier> {
        if self.debug {
            debug!("Fetching product tiers");
        }
        let builder = self.request(reqwest::Method::GET, "/tiers");
        match self.send(builder).await {
            Ok(reply) if reply.status.is_success() => {
                match decode_body::<TierList>(&reply.body) {
                    Ok(list) => list.tiers,
                    Err(e) => {
                        warn!(error = %e, "Undecodable tier list");
                        Vec::new()
                    }
                }
            }
            Ok(reply) => {
                warn!(status = %reply.status, "Failed to fetch tiers");
                Vec::new()
            }
            Err(e) => {
                warn!(error = %e, "Failed to fetch tiers");
                Vec::new()
            }
        }
    }

    async fn start_checkout(&self, tier_id: &str, email: &str) -> CheckoutResult {
        if self.debug {
            debug!(tier_id, "Starting checkout");
        }
        let body = CheckoutRequest { tier_id, email };
        let builder = self.request(reqwest::Method::POST, "/checkout").json(&body);
        match self.send(builder).await {
            Ok(reply) if reply.status.is_success() => {
                match decode_body::<CheckoutResult>(&reply.body) {
                    Ok(mut result) => {
                        result.success = true;
                        result
                    }
                    Err(e) => CheckoutResult::failure(e),
                }
            }
            Ok(reply) => {
                let error = server_error(&reply.body, CHECKOUT_FAILED);
                warn!(status = %reply.status, error = %error, "Checkout rejected");
                CheckoutResult::failure(error)
            }
            Err(e) => {
                warn!(error = %e, "Checkout failed");
                CheckoutResult::failure(e)
            }
        }
    }

    fn machine_id(&self) -> &str {
        &self.machine_id
    }
}

/// Decode a 2xx body; an empty body reads as `{}`.
fn decode_body<T: DeserializeOwned>(body: &str) -> std::result::Result<T, String> {
    let body = if body.trim().is_empty() { "{}" } else { body };
    serde_json::from_str(body).map_err(|e| Error::from(e).to_string())
}

/// The `error` field of a non-2xx body, or `fallback`.
fn server_error(body: &str, fallback: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.error)
        .filter(|e| !e.is_empty())
        .unwrap_or_else(|| fallback.to_string())
}

/// At most the first 10 characters of a key, for logs.
fn key_prefix(key: &str) -> &str {
    match key.char_indices().nth(10) {
        Some((idx, _)) => &key[..idx],
        None => key,
    }
}
