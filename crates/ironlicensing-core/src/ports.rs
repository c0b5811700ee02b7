//! Port traits (hexagonal architecture).
//!
//! The license client reaches the License API only through
//! [`LicenseTransport`]. Adapters convert every network or server failure
//! into a result value, so none of these methods return errors.

use crate::results::{CheckoutResult, LicenseResult};
use crate::tier::ProductTier;
use async_trait::async_trait;

/// Transport to the remote License API.
#[async_trait]
pub trait LicenseTransport: Send + Sync {
    /// Validate a license key for this machine.
    async fn validate(&self, license_key: &str) -> LicenseResult;

    /// Activate a license key on this machine.
    ///
    /// An absent or empty `machine_name` is resolved to the local hostname.
    async fn activate(&self, license_key: &str, machine_name: Option<&str>) -> LicenseResult;

    /// Release this machine's activation. Returns true on success.
    async fn deactivate(&self, license_key: &str) -> bool;

    /// Start a trial for the given email.
    async fn start_trial(&self, email: &str) -> LicenseResult;

    /// List purchasable tiers. Empty on any failure.
    async fn tiers(&self) -> Vec<ProductTier>;

    /// Start a checkout session for a tier.
    async fn start_checkout(&self, tier_id: &str, email: &str) -> CheckoutResult;

    /// Durable identifier of this installation.
    fn machine_id(&self) -> &str;
}
