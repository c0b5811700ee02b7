//! License and entitlement types.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::fmt;

/// License information as returned by the License API.
///
/// Every field is server-authoritative. The client never mutates a license;
/// a fresh value replaces the old one after each successful call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct License {
    /// License ID.
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    /// License key.
    #[serde(deserialize_with = "null_as_default")]
    pub key: String,
    /// Server-assigned status.
    #[serde(deserialize_with = "null_as_default")]
    pub status: LicenseStatus,
    /// License type.
    #[serde(rename = "type", deserialize_with = "null_as_default")]
    pub license_type: LicenseType,
    /// Owner email.
    pub email: Option<String>,
    /// Owner name.
    pub name: Option<String>,
    /// Owner company.
    pub company: Option<String>,
    /// Licensed features, in server order.
    #[serde(deserialize_with = "null_as_default")]
    pub features: Vec<Feature>,
    /// Maximum number of machine activations. The server may send a
    /// negative value.
    #[serde(deserialize_with = "null_as_default")]
    pub max_activations: i64,
    /// Activations currently in use.
    #[serde(deserialize_with = "null_as_default")]
    pub current_activations: i64,
    /// Expiration date.
    #[serde(deserialize_with = "lenient_timestamp")]
    pub expires_at: Option<DateTime<Utc>>,
    /// Created date.
    #[serde(deserialize_with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    /// Last server-side validation.
    #[serde(deserialize_with = "lenient_timestamp")]
    pub last_validated_at: Option<DateTime<Utc>>,
    /// Opaque metadata.
    #[serde(deserialize_with = "null_as_default")]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl License {
    /// Whether the license carries an enabled feature with exactly this key.
    pub fn has_feature(&self, key: &str) -> bool {
        self.features.iter().any(|f| f.key == key && f.enabled)
    }

    /// The first feature with exactly this key, enabled or not.
    pub fn feature(&self, key: &str) -> Option<&Feature> {
        self.features.iter().find(|f| f.key == key)
    }

    /// Keys of all enabled features, in server order.
    pub fn enabled_features(&self) -> impl Iterator<Item = &str> {
        self.features
            .iter()
            .filter(|f| f.enabled)
            .map(|f| f.key.as_str())
    }

    /// Activations left before `max_activations` is reached, never negative.
    ///
    /// Informational only: the server enforces the limit and may report
    /// more current activations than the maximum.
    pub fn remaining_activations(&self) -> i64 {
        self.max_activations
            .saturating_sub(self.current_activations)
            .max(0)
    }
}

/// License status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LicenseStatus {
    Valid,
    Expired,
    Suspended,
    Revoked,
    Invalid,
    Trial,
    TrialExpired,
    /// No license is held. Never assigned by the server.
    NotActivated,
    #[default]
    #[serde(other)]
    Unknown,
}

impl LicenseStatus {
    pub const ALL: [LicenseStatus; 9] = [
        LicenseStatus::Valid,
        LicenseStatus::Expired,
        LicenseStatus::Suspended,
        LicenseStatus::Revoked,
        LicenseStatus::Invalid,
        LicenseStatus::Trial,
        LicenseStatus::TrialExpired,
        LicenseStatus::NotActivated,
        LicenseStatus::Unknown,
    ];

    /// Wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            LicenseStatus::Valid => "valid",
            LicenseStatus::Expired => "expired",
            LicenseStatus::Suspended => "suspended",
            LicenseStatus::Revoked => "revoked",
            LicenseStatus::Invalid => "invalid",
            LicenseStatus::Trial => "trial",
            LicenseStatus::TrialExpired => "trial_expired",
            LicenseStatus::NotActivated => "not_activated",
            LicenseStatus::Unknown => "unknown",
        }
    }

    /// Only `Valid` and `Trial` grant access.
    pub fn is_licensed(&self) -> bool {
        matches!(self, LicenseStatus::Valid | LicenseStatus::Trial)
    }
}

impl fmt::Display for LicenseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// License type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LicenseType {
    Subscription,
    Trial,
    #[default]
    #[serde(other)]
    Perpetual,
}

impl LicenseType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LicenseType::Perpetual => "perpetual",
            LicenseType::Subscription => "subscription",
            LicenseType::Trial => "trial",
        }
    }
}

impl fmt::Display for LicenseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A capability flag carried by a license or a product tier.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Feature {
    /// Feature key, unique within a license.
    #[serde(deserialize_with = "null_as_default")]
    pub key: String,
    /// Display name.
    pub name: Option<String>,
    /// Whether the license grants this feature.
    #[serde(deserialize_with = "null_as_default")]
    pub enabled: bool,
    /// Human-readable description.
    pub description: Option<String>,
    /// Opaque metadata.
    #[serde(deserialize_with = "null_as_default")]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl Feature {
    pub fn new(key: impl Into<String>, name: impl Into<String>, enabled: bool) -> Self {
        Self {
            key: key.into(),
            name: Some(name.into()),
            enabled,
            ..Default::default()
        }
    }
}

/// A binding of a license to one machine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Activation {
    /// Activation ID.
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    /// Identifier of the activated machine.
    #[serde(deserialize_with = "null_as_default")]
    pub machine_id: String,
    /// Name the machine was registered under.
    pub machine_name: Option<String>,
    /// Operating system reported at activation.
    pub platform: Option<String>,
    /// When the activation was created.
    #[serde(deserialize_with = "lenient_timestamp")]
    pub activated_at: Option<DateTime<Utc>>,
    /// Last time the server saw this machine.
    #[serde(deserialize_with = "lenient_timestamp")]
    pub last_seen_at: Option<DateTime<Utc>>,
}

/// Decode an explicit JSON `null` as the type's default value.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Decode a timestamp leniently. Unparseable values, numbers and `null`
/// decode as `None`.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw
        .as_ref()
        .and_then(serde_json::Value::as_str)
        .and_then(parse_timestamp))
}

/// Parse an RFC 3339 timestamp, or a date-time or date without offset read
/// as UTC.
fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    const NAIVE_FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
    ];

    let value = value.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Some(naive) = NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
    {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn license_with(features: Vec<Feature>) -> License {
        License {
            key: "KEY-1".to_string(),
            status: LicenseStatus::Valid,
            features,
            ..Default::default()
        }
    }

    #[test]
    fn test_has_feature_requires_enabled() {
        let license = license_with(vec![
            Feature::new("pro", "Pro", true),
            Feature::new("beta", "Beta", false),
        ]);
        assert!(license.has_feature("pro"));
        assert!(!license.has_feature("beta"));
        assert!(!license.has_feature("missing"));
    }

    #[test]
    fn test_feature_lookup_is_case_sensitive() {
        let license = license_with(vec![Feature::new("Pro", "Pro", true)]);
        assert!(license.feature("Pro").is_some());
        assert!(license.feature("pro").is_none());
        assert!(!license.has_feature("PRO"));
    }

    #[test]
    fn test_feature_returns_disabled_feature() {
        let license = license_with(vec![Feature::new("beta", "Beta", false)]);
        let feature = license.feature("beta").unwrap();
        assert!(!feature.enabled);
    }

    #[test]
    fn test_remaining_activations_saturates() {
        let mut license = license_with(vec![]);
        license.max_activations = 3;
        license.current_activations = 1;
        assert_eq!(license.remaining_activations(), 2);

        license.current_activations = 5;
        assert_eq!(license.remaining_activations(), 0);

        license.max_activations = -1;
        assert_eq!(license.remaining_activations(), 0);
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let midnight = parse_timestamp("2025-01-01T00:00:00Z").unwrap();
        assert_eq!(parse_timestamp("2025-01-01T00:00:00"), Some(midnight));
        assert_eq!(parse_timestamp("2025-01-01T02:00:00+02:00"), Some(midnight));
        assert_eq!(parse_timestamp("2025-01-01 00:00:00"), Some(midnight));
        assert_eq!(parse_timestamp("2025-01-01"), Some(midnight));
        assert!(parse_timestamp("2025-01-01T00:00:00.250").is_some());
        assert!(parse_timestamp("next tuesday").is_none());
        assert!(parse_timestamp("").is_none());
    }

    #[test]
    fn test_enabled_features_in_order() {
        let license = license_with(vec![
            Feature::new("b", "B", true),
            Feature::new("x", "X", false),
            Feature::new("a", "A", true),
        ]);
        assert_eq!(license.enabled_features().collect::<Vec<_>>(), vec!["b", "a"]);
    }

    #[test]
    fn test_status_wire_values() {
        for status in LicenseStatus::ALL {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
            let decoded: LicenseStatus = serde_json::from_str(&json).unwrap();
            assert_eq!(decoded, status);
        }
    }

    #[test]
    fn test_unrecognised_status_is_unknown() {
        let status: LicenseStatus = serde_json::from_str("\"grace\"").unwrap();
        assert_eq!(status, LicenseStatus::Unknown);
        let status: LicenseStatus = serde_json::from_str("\"VALID\"").unwrap();
        assert_eq!(status, LicenseStatus::Unknown);
    }

    #[test]
    fn test_unrecognised_type_is_perpetual() {
        let license_type: LicenseType = serde_json::from_str("\"lifetime\"").unwrap();
        assert_eq!(license_type, LicenseType::Perpetual);
    }

    #[test]
    fn test_only_valid_and_trial_are_licensed() {
        let licensed: Vec<_> = LicenseStatus::ALL
            .into_iter()
            .filter(LicenseStatus::is_licensed)
            .collect();
        assert_eq!(licensed, vec![LicenseStatus::Valid, LicenseStatus::Trial]);
    }
}
