//! Client configuration.

use ironlicensing_core::{Error, Result};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_BASE_URL: &str = "https://api.ironlicensing.com";
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_CACHE_VALIDATION_MINUTES: u32 = 60;
pub const DEFAULT_OFFLINE_GRACE_DAYS: u32 = 7;

/// Configuration for a [`crate::LicenseClient`].
///
/// `enable_offline_cache`, `cache_validation_minutes` and
/// `offline_grace_days` are accepted and exposed, but this version performs
/// no offline validation and does not enforce them.
#[derive(Debug, Clone)]
pub struct LicenseOptions {
    /// Public key identifying the product to the API.
    pub public_key: String,
    /// Product slug.
    pub product_slug: String,
    /// API base URL, without trailing slash.
    pub api_base_url: String,
    /// Emit request-level debug logs.
    pub debug: bool,
    /// Offline cache switch (not enforced).
    pub enable_offline_cache: bool,
    /// Revalidation interval for cached results (not enforced).
    pub cache_validation_minutes: u32,
    /// Offline grace period (not enforced).
    pub offline_grace_days: u32,
    /// Timeout applied to every HTTP request.
    pub http_timeout: Duration,
    /// Where the machine identifier is persisted.
    /// `None` uses `~/.ironlicensing/machine_id`.
    pub machine_id_path: Option<PathBuf>,
}

impl Default for LicenseOptions {
    fn default() -> Self {
        Self {
            public_key: String::new(),
            product_slug: String::new(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            debug: false,
            enable_offline_cache: true,
            cache_validation_minutes: DEFAULT_CACHE_VALIDATION_MINUTES,
            offline_grace_days: DEFAULT_OFFLINE_GRACE_DAYS,
            http_timeout: DEFAULT_HTTP_TIMEOUT,
            machine_id_path: None,
        }
    }
}

impl LicenseOptions {
    /// Create options for a product. Nothing is checked until
    /// [`LicenseOptions::validate`] runs.
    pub fn new(public_key: impl Into<String>, product_slug: impl Into<String>) -> Self {
        Self {
            public_key: public_key.into(),
            product_slug: product_slug.into(),
            ..Default::default()
        }
    }

    /// Start a builder that validates on [`LicenseOptionsBuilder::build`].
    pub fn builder(
        public_key: impl Into<String>,
        product_slug: impl Into<String>,
    ) -> LicenseOptionsBuilder {
        LicenseOptionsBuilder {
            options: Self::new(public_key, product_slug),
        }
    }

    /// Set the API base URL.
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Enable or disable request-level debug logging.
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_offline_cache(mut self, enable: bool) -> Self {
        self.enable_offline_cache = enable;
        self
    }

    pub fn with_cache_validation_minutes(mut self, minutes: u32) -> Self {
        self.cache_validation_minutes = minutes;
        self
    }

    pub fn with_offline_grace_days(mut self, days: u32) -> Self {
        self.offline_grace_days = days;
        self
    }

    /// Set the HTTP timeout.
    pub fn with_http_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout = timeout;
        self
    }

    /// Persist the machine identifier at a custom path.
    pub fn with_machine_id_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.machine_id_path = Some(path.into());
        self
    }

    /// Check required fields and the base URL.
    pub fn validate(&self) -> Result<()> {
        if self.public_key.trim().is_empty() {
            return Err(Error::MissingConfig("public key is required".to_string()));
        }
        if self.product_slug.trim().is_empty() {
            return Err(Error::MissingConfig("product slug is required".to_string()));
        }

        let url = url::Url::parse(&self.api_base_url).map_err(|e| {
            Error::InvalidConfig(format!("api base url '{}': {}", self.api_base_url, e))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::InvalidConfig(format!(
                "api base url must be http or https, got '{}'",
                url.scheme()
            )));
        }

        if self.http_timeout.is_zero() {
            return Err(Error::InvalidConfig(
                "http timeout must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}

/// Builder for [`LicenseOptions`].
#[derive(Debug, Clone)]
pub struct LicenseOptionsBuilder {
    options: LicenseOptions,
}

impl LicenseOptionsBuilder {
    pub fn api_base_url(mut self, url: impl Into<String>) -> Self {
        self.options = self.options.with_api_base_url(url);
        self
    }

    pub fn debug(mut self, debug: bool) -> Self {
        self.options.debug = debug;
        self
    }

    pub fn enable_offline_cache(mut self, enable: bool) -> Self {
        self.options.enable_offline_cache = enable;
        self
    }

    pub fn cache_validation_minutes(mut self, minutes: u32) -> Self {
        self.options.cache_validation_minutes = minutes;
        self
    }

    pub fn offline_grace_days(mut self, days: u32) -> Self {
        self.options.offline_grace_days = days;
        self
    }

    pub fn http_timeout(mut self, timeout: Duration) -> Self {
        self.options.http_timeout = timeout;
        self
    }

    pub fn machine_id_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.options.machine_id_path = Some(path.into());
        self
    }

    /// Validate and return the options.
    pub fn build(self) -> Result<LicenseOptions> {
        self.options.validate()?;
        Ok(self.options)
    }
}
