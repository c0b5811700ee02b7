//! Purchasable product plans.

use crate::license::{Feature, null_as_default};
use serde::{Deserialize, Serialize};

/// A product tier available for purchase.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProductTier {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub slug: String,
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    pub description: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub price: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub currency: String,
    /// e.g. `monthly`, `yearly`, `one_time`.
    pub billing_period: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub features: Vec<Feature>,
}

/// Envelope of `GET /api/v1/tiers`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TierList {
    #[serde(deserialize_with = "null_as_default")]
    pub tiers: Vec<ProductTier>,
}

impl ProductTier {
    /// Price formatted with its currency, e.g. `49.00 USD`.
    pub fn display_price(&self) -> String {
        format!("{:.2} {}", self.price, self.currency)
    }
}
