//! License state manager.
//!
//! [`LicenseClient`] is the single in-process holder of the current license
//! and the key it was obtained with. Remote calls go through a
//! [`LicenseTransport`]; successful results replace the held pair
//! wholesale, successful deactivation clears it, and failures leave it
//! untouched.
//!
//! The pair sits behind one `RwLock`. The lock is never held across an
//! `.await` or while the change listener runs, so a listener may call back
//! into any read method and will observe the state it was notified about.
//!
//! Concurrent validate/activate calls race and the last one to commit wins.
//! Callers that need a deterministic winner must serialize those calls.

use crate::options::LicenseOptions;
use crate::transport::HttpTransport;
use ironlicensing_core::{
    CheckoutResult, Error, Feature, License, LicenseResult, LicenseStatus, LicenseTransport,
    LicenseType, ProductTier, Result,
};
use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Callback invoked after every license transition with the new license.
pub type LicenseListener = Arc<dyn Fn(Option<&License>) + Send + Sync>;

/// The held license and key, read together.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LicenseSnapshot {
    pub license: Option<License>,
    pub license_key: Option<String>,
}

#[derive(Default)]
struct LicenseState {
    license: Option<License>,
    key: Option<String>,
}

struct Inner {
    options: LicenseOptions,
    transport: Arc<dyn LicenseTransport>,
    state: RwLock<LicenseState>,
    listener: Mutex<Option<LicenseListener>>,
    changes: watch::Sender<Option<License>>,
}

/// Thread-safe license client. Clones share the same state.
#[derive(Clone)]
pub struct LicenseClient {
    inner: Arc<Inner>,
}

impl LicenseClient {
    /// Create a client talking to the License API over HTTP.
    ///
    /// Fails only when the options are incomplete or malformed.
    pub fn new(options: LicenseOptions) -> Result<Self> {
        options.validate()?;
        let transport = HttpTransport::new(&options)?;
        let client = Self::with_transport(options, Arc::new(transport));
        if client.inner.options.debug {
            debug!(
                product = %client.inner.options.product_slug,
                machine_id = %client.machine_id(),
                "Client initialized"
            );
        }
        Ok(client)
    }

    /// Create a client over any transport. The options are stored as given.
    pub fn with_transport(options: LicenseOptions, transport: Arc<dyn LicenseTransport>) -> Self {
        let (changes, _) = watch::channel(None);
        Self {
            inner: Arc::new(Inner {
                options,
                transport,
                state: RwLock::new(LicenseState::default()),
                listener: Mutex::new(None),
                changes,
            }),
        }
    }

    pub fn options(&self) -> &LicenseOptions {
        &self.inner.options
    }

    /// Validate a license key. A valid result becomes the held license.
    pub async fn validate(&self, license_key: &str) -> LicenseResult {
        let result = self.inner.transport.validate(license_key).await;
        if let Some(license) = result.accepted_license() {
            self.commit(Some((license_key.to_string(), license.clone())));
        }
        result
    }

    /// Activate a license key on this machine. A valid result becomes the
    /// held license.
    pub async fn activate(&self, license_key: &str, machine_name: Option<&str>) -> LicenseResult {
        let result = self.inner.transport.activate(license_key, machine_name).await;
        if let Some(license) = result.accepted_license() {
            self.commit(Some((license_key.to_string(), license.clone())));
        }
        result
    }

    /// Release this machine's activation of the held license.
    ///
    /// Returns false without contacting the server when no license is held.
    pub async fn deactivate(&self) -> bool {
        let Some(key) = self.license_key().filter(|k| !k.is_empty()) else {
            debug!("No license held; nothing to deactivate");
            return false;
        };

        if self.inner.transport.deactivate(&key).await {
            self.commit(None);
            true
        } else {
            false
        }
    }

    /// Start a trial. The held key becomes the key of the trial license the
    /// server created.
    pub async fn start_trial(&self, email: &str) -> LicenseResult {
        let result = self.inner.transport.start_trial(email).await;
        if let Some(license) = result.accepted_license() {
            self.commit(Some((license.key.clone(), license.clone())));
        }
        result
    }

    /// Whether the held license has this feature enabled.
    pub fn has_feature(&self, feature_key: &str) -> bool {
        self.read_state()
            .license
            .as_ref()
            .is_some_and(|l| l.has_feature(feature_key))
    }

    /// Fail with [`Error::FeatureNotLicensed`] unless the feature is enabled.
    pub fn require_feature(&self, feature_key: &str) -> Result<()> {
        if self.has_feature(feature_key) {
            Ok(())
        } else {
            Err(Error::FeatureNotLicensed {
                feature: feature_key.to_string(),
            })
        }
    }

    /// The held license's feature with this key, enabled or not.
    pub fn feature(&self, feature_key: &str) -> Option<Feature> {
        self.read_state()
            .license
            .as_ref()
            .and_then(|l| l.feature(feature_key).cloned())
    }

    pub fn license(&self) -> Option<License> {
        self.read_state().license.clone()
    }

    pub fn license_key(&self) -> Option<String> {
        self.read_state().key.clone()
    }

    /// License and key from a single read.
    pub fn snapshot(&self) -> LicenseSnapshot {
        let state = self.read_state();
        LicenseSnapshot {
            license: state.license.clone(),
            license_key: state.key.clone(),
        }
    }

    /// Status of the held license, or `NotActivated` when none is held.
    pub fn status(&self) -> LicenseStatus {
        self.read_state()
            .license
            .as_ref()
            .map_or(LicenseStatus::NotActivated, |l| l.status)
    }

    /// True only for a held license with status `Valid` or `Trial`.
    pub fn is_licensed(&self) -> bool {
        self.read_state()
            .license
            .as_ref()
            .is_some_and(|l| l.status.is_licensed())
    }

    /// True when the held license's status or its type says trial.
    pub fn is_trial(&self) -> bool {
        self.read_state().license.as_ref().is_some_and(|l| {
            l.status == LicenseStatus::Trial || l.license_type == LicenseType::Trial
        })
    }

    pub async fn tiers(&self) -> Vec<ProductTier> {
        self.inner.transport.tiers().await
    }

    /// Start a checkout session for a tier.
    pub async fn start_purchase(&self, tier_id: &str, email: &str) -> CheckoutResult {
        self.inner.transport.start_checkout(tier_id, email).await
    }

    pub fn machine_id(&self) -> &str {
        self.inner.transport.machine_id()
    }

    /// Register the change listener, replacing any previous one.
    ///
    /// The listener runs synchronously on the task that committed the
    /// change, after the change is visible and with no lock held. A panic in
    /// the listener is logged and swallowed.
    pub fn set_on_license_changed<F>(&self, listener: F)
    where
        F: Fn(Option<&License>) + Send + Sync + 'static,
    {
        *self.lock_listener() = Some(Arc::new(listener));
    }

    pub fn clear_on_license_changed(&self) {
        *self.lock_listener() = None;
    }

    /// Watch the held license. The receiver always sees the committed value.
    pub fn subscribe(&self) -> watch::Receiver<Option<License>> {
        self.inner.changes.subscribe()
    }

    /// [`LicenseClient::validate`] on a runtime task.
    pub fn spawn_validate(&self, license_key: impl Into<String>) -> JoinHandle<LicenseResult> {
        let client = self.clone();
        let license_key = license_key.into();
        tokio::spawn(async move { client.validate(&license_key).await })
    }

    /// [`LicenseClient::activate`] on a runtime task.
    pub fn spawn_activate(
        &self,
        license_key: impl Into<String>,
        machine_name: Option<String>,
    ) -> JoinHandle<LicenseResult> {
        let client = self.clone();
        let license_key = license_key.into();
        tokio::spawn(async move { client.activate(&license_key, machine_name.as_deref()).await })
    }

    /// [`LicenseClient::deactivate`] on a runtime task.
    pub fn spawn_deactivate(&self) -> JoinHandle<bool> {
        let client = self.clone();
        tokio::spawn(async move { client.deactivate().await })
    }

    /// [`LicenseClient::start_trial`] on a runtime task.
    pub fn spawn_start_trial(&self, email: impl Into<String>) -> JoinHandle<LicenseResult> {
        let client = self.clone();
        let email = email.into();
        tokio::spawn(async move { client.start_trial(&email).await })
    }

    /// [`LicenseClient::tiers`] on a runtime task.
    pub fn spawn_tiers(&self) -> JoinHandle<Vec<ProductTier>> {
        let client = self.clone();
        tokio::spawn(async move { client.tiers().await })
    }

    /// [`LicenseClient::start_purchase`] on a runtime task.
    pub fn spawn_start_purchase(
        &self,
        tier_id: impl Into<String>,
        email: impl Into<String>,
    ) -> JoinHandle<CheckoutResult> {
        let client = self.clone();
        let (tier_id, email) = (tier_id.into(), email.into());
        tokio::spawn(async move { client.start_purchase(&tier_id, &email).await })
    }

    /// Replace (`Some`) or clear (`None`) the held pair, then notify.
    fn commit(&self, next: Option<(String, License)>) {
        let license = next.as_ref().map(|(_, l)| l.clone());
        {
            let mut state = self.write_state();
            *state = match next {
                Some((key, license)) => LicenseState {
                    license: Some(license),
                    key: Some(key),
                },
                None => LicenseState::default(),
            };
            self.inner.changes.send_replace(license.clone());
        }

        match &license {
            Some(l) => info!(license_id = %l.id, status = %l.status, "License updated"),
            None => info!("License cleared"),
        }
        self.notify(license.as_ref());
    }

    fn notify(&self, license: Option<&License>) {
        let Some(listener) = self.lock_listener().clone() else {
            return;
        };
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| listener(license))) {
            warn!(
                error = %panic_message(payload.as_ref()),
                "License change listener panicked"
            );
        }
    }

    fn read_state(&self) -> RwLockReadGuard<'_, LicenseState> {
        self.inner.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, LicenseState> {
        self.inner.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_listener(&self) -> std::sync::MutexGuard<'_, Option<LicenseListener>> {
        self.inner.listener.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for LicenseClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LicenseClient")
            .field("product_slug", &self.inner.options.product_slug)
            .field("api_base_url", &self.inner.options.api_base_url)
            .field("status", &self.status())
            .finish_non_exhaustive()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
