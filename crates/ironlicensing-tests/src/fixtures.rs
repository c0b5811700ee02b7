//! Test fixtures for creating sample licenses and API payloads.

use chrono::{Duration, Utc};
use ironlicensing_core::{
    CheckoutResult, Feature, License, LicenseResult, LicenseStatus, LicenseType, ProductTier,
};
use serde_json::{Value, json};

/// Factory for creating test licenses.
pub struct LicenseFixture;

impl LicenseFixture {
    /// An active perpetual license with the `pro` and `export` features.
    pub fn valid(key: &str) -> License {
        License {
            id: format!("lic_{}", key.to_lowercase()),
            key: key.to_string(),
            status: LicenseStatus::Valid,
            license_type: LicenseType::Perpetual,
            email: Some("user@example.com".to_string()),
            name: Some("Test User".to_string()),
            features: vec![
                Feature::new("pro", "Pro", true),
                Feature::new("export", "Export", true),
                Feature::new("sso", "Single sign-on", false),
            ],
            max_activations: 3,
            current_activations: 1,
            created_at: Some(Utc::now() - Duration::days(30)),
            last_validated_at: Some(Utc::now()),
            ..Default::default()
        }
    }

    /// A trial license created for `email`.
    pub fn trial(key: &str, email: &str) -> License {
        License {
            id: format!("trial_{}", key.to_lowercase()),
            key: key.to_string(),
            status: LicenseStatus::Trial,
            license_type: LicenseType::Trial,
            email: Some(email.to_string()),
            features: vec![Feature::new("pro", "Pro", true)],
            max_activations: 1,
            current_activations: 1,
            expires_at: Some(Utc::now() + Duration::days(14)),
            ..Default::default()
        }
    }

    /// A license with the given status and no features.
    pub fn with_status(key: &str, status: LicenseStatus) -> License {
        License {
            id: format!("lic_{}", key.to_lowercase()),
            key: key.to_string(),
            status,
            ..Default::default()
        }
    }

    /// A valid license carrying exactly the given `(key, enabled)` features.
    pub fn with_features(key: &str, features: &[(&str, bool)]) -> License {
        License {
            features: features
                .iter()
                .map(|(k, enabled)| Feature::new(*k, k.to_uppercase(), *enabled))
                .collect(),
            ..Self::valid(key)
        }
    }
}

/// Factory for transport results.
pub struct ResultFixture;

impl ResultFixture {
    pub fn valid(license: License) -> LicenseResult {
        LicenseResult::success(license)
    }

    pub fn rejected(error: &str) -> LicenseResult {
        LicenseResult::failure(error)
    }

    /// `valid: true` but no license attached.
    pub fn valid_without_license() -> LicenseResult {
        LicenseResult {
            valid: true,
            ..Default::default()
        }
    }

    pub fn checkout(session: &str) -> CheckoutResult {
        CheckoutResult::success(format!("https://checkout.example.com/{}", session), session)
    }
}

/// Factory for product tiers.
pub struct TierFixture;

impl TierFixture {
    pub fn standard() -> Vec<ProductTier> {
        vec![
            ProductTier {
                id: "tier_basic".to_string(),
                slug: "basic".to_string(),
                name: "Basic".to_string(),
                price: 19.0,
                currency: "USD".to_string(),
                billing_period: Some("monthly".to_string()),
                features: vec![Feature::new("export", "Export", true)],
                ..Default::default()
            },
            ProductTier {
                id: "tier_pro".to_string(),
                slug: "pro".to_string(),
                name: "Pro".to_string(),
                price: 49.0,
                currency: "USD".to_string(),
                billing_period: Some("monthly".to_string()),
                features: vec![
                    Feature::new("export", "Export", true),
                    Feature::new("pro", "Pro", true),
                ],
                ..Default::default()
            },
        ]
    }
}

/// Raw JSON shapes as the License API sends them.
pub struct ApiJson;

impl ApiJson {
    pub fn license(key: &str, status: &str, license_type: &str, features: &[(&str, bool)]) -> Value {
        json!({
            "id": format!("lic_{}", key.to_lowercase()),
            "key": key,
            "status": status,
            "type": license_type,
            "email": "user@example.com",
            "features": features
                .iter()
                .map(|(k, enabled)| json!({ "key": k, "name": k.to_uppercase(), "enabled": enabled }))
                .collect::<Vec<_>>(),
            "maxActivations": 3,
            "currentActivations": 1,
            "expiresAt": null,
            "createdAt": "2026-01-01T00:00:00Z",
        })
    }

    pub fn valid_result(license: Value) -> Value {
        json!({ "valid": true, "license": license })
    }

    pub fn error(message: &str) -> Value {
        json!({ "error": message })
    }
}
