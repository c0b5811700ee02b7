//! CLI configuration management.

use ironlicensing::LicenseOptions;
use ironlicensing::options::DEFAULT_API_BASE_URL;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// CLI configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CliConfig {
    /// License API base URL.
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Product public key.
    pub public_key: Option<String>,
    /// Product identifier.
    pub product_slug: Option<String>,
    /// Verbose SDK logging.
    #[serde(default)]
    pub debug: bool,
    /// HTTP request timeout in seconds.
    pub http_timeout_secs: Option<u64>,
    /// Key from the last successful activation or trial.
    pub license_key: Option<String>,
    /// Machine identifier file, when not the per-user default.
    pub machine_id_path: Option<PathBuf>,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            public_key: None,
            product_slug: None,
            debug: false,
            http_timeout_secs: None,
            license_key: None,
            machine_id_path: None,
        }
    }
}

fn default_api_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

impl CliConfig {
    /// Load configuration from the user config file.
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            Ok(serde_yaml::from_str(&content)?)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to the user config file.
    pub fn save(&self) -> Result<(), Box<dyn std::error::Error>> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the configuration file path.
    pub fn config_path() -> Result<PathBuf, Box<dyn std::error::Error>> {
        let dirs = directories::ProjectDirs::from("com", "ironlicensing", "ironlicense")
            .ok_or("Could not determine config directory")?;
        Ok(dirs.config_dir().join("config.yaml"))
    }

    /// Set a configuration value.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), String> {
        match key {
            "api_url" => self.api_url = value.trim_end_matches('/').to_string(),
            "public_key" => self.public_key = Some(value.to_string()),
            "product_slug" => self.product_slug = Some(value.to_string()),
            "debug" => {
                self.debug = match value {
                    "true" | "1" | "yes" | "on" => true,
                    "false" | "0" | "no" | "off" => false,
                    _ => return Err(format!("Invalid boolean: {}", value)),
                };
            }
            "http_timeout_secs" => {
                let secs: u64 = value
                    .parse()
                    .map_err(|_| format!("Invalid timeout: {}", value))?;
                if secs == 0 {
                    return Err("Timeout must be at least 1 second".to_string());
                }
                self.http_timeout_secs = Some(secs);
            }
            "license_key" => self.license_key = Some(value.to_string()).filter(|v| !v.is_empty()),
            "machine_id_path" if value.is_empty() => self.machine_id_path = None,
            "machine_id_path" => {
                let path = PathBuf::from(value);
                if !path.is_absolute() {
                    return Err(format!("machine_id_path must be absolute: {}", value));
                }
                self.machine_id_path = Some(path);
            }
            _ => return Err(format!("Unknown config key: {}", key)),
        }
        Ok(())
    }

    /// SDK options from this configuration.
    pub fn license_options(&self) -> Result<LicenseOptions, Box<dyn std::error::Error>> {
        let public_key = self
            .public_key
            .as_deref()
            .ok_or("public_key not set. Run `ironlicense config set public_key <KEY>`")?;
        let product_slug = self
            .product_slug
            .as_deref()
            .ok_or("product_slug not set. Run `ironlicense config set product_slug <SLUG>`")?;

        let mut options = LicenseOptions::new(public_key, product_slug)
            .with_api_base_url(&self.api_url)
            .with_debug(self.debug);
        if let Some(secs) = self.http_timeout_secs {
            options = options.with_http_timeout(Duration::from_secs(secs));
        }
        if let Some(path) = &self.machine_id_path {
            options = options.with_machine_id_path(path.clone());
        }
        options.validate()?;
        Ok(options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CliConfig::default();
        assert_eq!(config.api_url, DEFAULT_API_BASE_URL);
        assert!(config.license_key.is_none());
        assert!(!config.debug);
    }

    #[test]
    fn test_set_known_keys() {
        let mut config = CliConfig::default();
        config.set("api_url", "https://licensing.example.com/").unwrap();
        config.set("public_key", "pk_live_1").unwrap();
        config.set("product_slug", "my-app").unwrap();
        config.set("debug", "on").unwrap();
        config.set("http_timeout_secs", "10").unwrap();
        config.set("license_key", "KEY-1").unwrap();

        assert_eq!(config.api_url, "https://licensing.example.com");
        assert_eq!(config.public_key.as_deref(), Some("pk_live_1"));
        assert!(config.debug);
        assert_eq!(config.http_timeout_secs, Some(10));
        assert_eq!(config.license_key.as_deref(), Some("KEY-1"));

        config.set("license_key", "").unwrap();
        assert!(config.license_key.is_none());
    }

    #[test]
    fn test_set_rejects_bad_values() {
        let mut config = CliConfig::default();
        assert!(config.set("debug", "maybe").is_err());
        assert!(config.set("http_timeout_secs", "soon").is_err());
        assert!(config.set("http_timeout_secs", "0").is_err());
        assert!(config.set("token", "x").is_err());
        assert!(config.set("machine_id_path", "relative/id").is_err());
        assert!(config.machine_id_path.is_none());
    }

    #[test]
    fn test_license_options_requires_credentials() {
        let mut config = CliConfig::default();
        assert!(config.license_options().is_err());

        config.public_key = Some("pk_test".to_string());
        config.product_slug = Some("app".to_string());
        config.http_timeout_secs = Some(5);
        let options = config.license_options().unwrap();
        assert_eq!(options.public_key, "pk_test");
        assert_eq!(options.http_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.yaml");

        assert_eq!(CliConfig::load_from(&path).unwrap(), CliConfig::default());

        let mut config = CliConfig::default();
        config.set("product_slug", "my-app").unwrap();
        config.set("license_key", "KEY-1").unwrap();
        config.save_to(&path).unwrap();

        assert_eq!(CliConfig::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "product_slug: my-app\n").unwrap();

        let config = CliConfig::load_from(&path).unwrap();
        assert_eq!(config.api_url, DEFAULT_API_BASE_URL);
        assert_eq!(config.product_slug.as_deref(), Some("my-app"));
    }
}
