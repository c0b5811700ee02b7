//! Optional process-wide client registry.
//!
//! Prefer passing a [`LicenseClient`] explicitly. For call sites that cannot,
//! this module holds one client with an explicit lifecycle: [`init`] (or
//! [`install`]) before use, [`reset`] to drop it. Every accessor fails with
//! [`Error::NotInitialized`] while no client is installed.

use crate::client::LicenseClient;
use crate::options::LicenseOptions;
use ironlicensing_core::{
    CheckoutResult, Error, Feature, License, LicenseResult, LicenseStatus, ProductTier, Result,
};
use std::sync::{PoisonError, RwLock};
use tracing::info;

static GLOBAL: RwLock<Option<LicenseClient>> = RwLock::new(None);

/// Build a client from options and install it, replacing any previous one.
pub fn init(options: LicenseOptions) -> Result<LicenseClient> {
    let client = LicenseClient::new(options)?;
    install(client.clone());
    Ok(client)
}

/// Install an existing client. Returns the client it replaced.
pub fn install(client: LicenseClient) -> Option<LicenseClient> {
    info!(product = %client.options().product_slug, "Installing global license client");
    GLOBAL
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .replace(client)
}

/// Remove the installed client. Returns it, if any.
pub fn reset() -> Option<LicenseClient> {
    GLOBAL.write().unwrap_or_else(PoisonError::into_inner).take()
}

pub fn is_initialized() -> bool {
    GLOBAL
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .is_some()
}

/// The installed client.
pub fn global() -> Result<LicenseClient> {
    GLOBAL
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
        .ok_or(Error::NotInitialized)
}

pub async fn validate(license_key: &str) -> Result<LicenseResult> {
    Ok(global()?.validate(license_key).await)
}

pub async fn activate(license_key: &str, machine_name: Option<&str>) -> Result<LicenseResult> {
    Ok(global()?.activate(license_key, machine_name).await)
}

pub async fn deactivate() -> Result<bool> {
    Ok(global()?.deactivate().await)
}

pub async fn start_trial(email: &str) -> Result<LicenseResult> {
    Ok(global()?.start_trial(email).await)
}

pub fn has_feature(feature_key: &str) -> Result<bool> {
    Ok(global()?.has_feature(feature_key))
}

pub fn require_feature(feature_key: &str) -> Result<()> {
    global()?.require_feature(feature_key)
}

pub fn feature(feature_key: &str) -> Result<Option<Feature>> {
    Ok(global()?.feature(feature_key))
}

pub fn license() -> Result<Option<License>> {
    Ok(global()?.license())
}

pub fn status() -> Result<LicenseStatus> {
    Ok(global()?.status())
}

pub fn is_licensed() -> Result<bool> {
    Ok(global()?.is_licensed())
}

pub fn is_trial() -> Result<bool> {
    Ok(global()?.is_trial())
}

pub async fn tiers() -> Result<Vec<ProductTier>> {
    Ok(global()?.tiers().await)
}

pub async fn start_purchase(tier_id: &str, email: &str) -> Result<CheckoutResult> {
    Ok(global()?.start_purchase(tier_id, email).await)
}

pub fn set_on_license_changed<F>(listener: F) -> Result<()>
where
    F: Fn(Option<&License>) + Send + Sync + 'static,
{
    global()?.set_on_license_changed(listener);
    Ok(())
}
