//! Test helper transports and servers.

use async_trait::async_trait;
use ironlicensing::{HttpTransport, LicenseClient, LicenseOptions};
use ironlicensing_core::{
    CheckoutResult, License, LicenseResult, LicenseStatus, LicenseTransport, ProductTier,
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use wiremock::MockServer;

pub const TEST_PUBLIC_KEY: &str = "pk_test_123";
pub const TEST_PRODUCT_SLUG: &str = "test-app";
pub const TEST_MACHINE_ID: &str = "machine-test-0001";

/// How many times each remote operation was invoked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub validate: usize,
    pub activate: usize,
    pub deactivate: usize,
    pub start_trial: usize,
    pub tiers: usize,
    pub start_checkout: usize,
}

impl CallCounts {
    pub fn total(&self) -> usize {
        self.validate
            + self.activate
            + self.deactivate
            + self.start_trial
            + self.tiers
            + self.start_checkout
    }
}

#[derive(Default)]
struct Counters {
    validate: AtomicUsize,
    activate: AtomicUsize,
    deactivate: AtomicUsize,
    start_trial: AtomicUsize,
    tiers: AtomicUsize,
    start_checkout: AtomicUsize,
}

/// Scriptable in-memory transport that records every call.
///
/// Every operation returns its scripted answer. Unscripted operations fail.
/// In echo mode, validate and activate succeed with a license whose key is
/// the requested key, yielding to the scheduler first.
pub struct StubTransport {
    validate: Mutex<LicenseResult>,
    activate: Mutex<LicenseResult>,
    start_trial: Mutex<LicenseResult>,
    deactivate: AtomicBool,
    tiers: Mutex<Vec<ProductTier>>,
    checkout: Mutex<CheckoutResult>,
    echo: bool,
    counters: Counters,
    machine_names: Mutex<Vec<Option<String>>>,
}

impl Default for StubTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl StubTransport {
    pub fn new() -> Self {
        Self {
            validate: Mutex::new(LicenseResult::failure("validate not scripted")),
            activate: Mutex::new(LicenseResult::failure("activate not scripted")),
            start_trial: Mutex::new(LicenseResult::failure("trial not scripted")),
            deactivate: AtomicBool::new(false),
            tiers: Mutex::new(Vec::new()),
            checkout: Mutex::new(CheckoutResult::failure("checkout not scripted")),
            echo: false,
            counters: Counters::default(),
            machine_names: Mutex::new(Vec::new()),
        }
    }

    /// A transport that accepts any key for validate and activate.
    pub fn echoing() -> Self {
        Self {
            echo: true,
            deactivate: AtomicBool::new(true),
            ..Self::new()
        }
    }

    pub fn with_validate(self, result: LicenseResult) -> Self {
        self.script_validate(result);
        self
    }

    pub fn with_activate(self, result: LicenseResult) -> Self {
        self.script_activate(result);
        self
    }

    pub fn with_trial(self, result: LicenseResult) -> Self {
        *lock(&self.start_trial) = result;
        self
    }

    pub fn with_deactivate(self, ok: bool) -> Self {
        self.deactivate.store(ok, Ordering::SeqCst);
        self
    }

    pub fn with_tiers(self, tiers: Vec<ProductTier>) -> Self {
        *lock(&self.tiers) = tiers;
        self
    }

    pub fn with_checkout(self, result: CheckoutResult) -> Self {
        *lock(&self.checkout) = result;
        self
    }

    /// Replace the validate answer after construction.
    pub fn script_validate(&self, result: LicenseResult) {
        *lock(&self.validate) = result;
    }

    /// Replace the activate answer after construction.
    pub fn script_activate(&self, result: LicenseResult) {
        *lock(&self.activate) = result;
    }

    pub fn script_deactivate(&self, ok: bool) {
        self.deactivate.store(ok, Ordering::SeqCst);
    }

    pub fn calls(&self) -> CallCounts {
        let c = &self.counters;
        CallCounts {
            validate: c.validate.load(Ordering::SeqCst),
            activate: c.activate.load(Ordering::SeqCst),
            deactivate: c.deactivate.load(Ordering::SeqCst),
            start_trial: c.start_trial.load(Ordering::SeqCst),
            tiers: c.tiers.load(Ordering::SeqCst),
            start_checkout: c.start_checkout.load(Ordering::SeqCst),
        }
    }

    /// Machine names passed to `activate`, in call order.
    pub fn machine_names(&self) -> Vec<Option<String>> {
        lock(&self.machine_names).clone()
    }

    /// Wrap this transport in a client with test options.
    pub fn into_client(self) -> (LicenseClient, Arc<StubTransport>) {
        let stub = Arc::new(self);
        let client = LicenseClient::with_transport(
            LicenseOptions::new(TEST_PUBLIC_KEY, TEST_PRODUCT_SLUG),
            stub.clone(),
        );
        (client, stub)
    }

    async fn echo(&self, license_key: &str) -> LicenseResult {
        tokio::task::yield_now().await;
        LicenseResult::success(License {
            id: format!("lic_{}", license_key),
            key: license_key.to_string(),
            status: LicenseStatus::Valid,
            ..Default::default()
        })
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

#[async_trait]
impl LicenseTransport for StubTransport {
    async fn validate(&self, license_key: &str) -> LicenseResult {
        self.counters.validate.fetch_add(1, Ordering::SeqCst);
        if self.echo {
            return self.echo(license_key).await;
        }
        lock(&self.validate).clone()
    }

    async fn activate(&self, license_key: &str, machine_name: Option<&str>) -> LicenseResult {
        self.counters.activate.fetch_add(1, Ordering::SeqCst);
        lock(&self.machine_names).push(machine_name.map(str::to_string));
        if self.echo {
            return self.echo(license_key).await;
        }
        lock(&self.activate).clone()
    }

    async fn deactivate(&self, _license_key: &str) -> bool {
        self.counters.deactivate.fetch_add(1, Ordering::SeqCst);
        if self.echo {
            tokio::task::yield_now().await;
        }
        self.deactivate.load(Ordering::SeqCst)
    }

    async fn start_trial(&self, _email: &str) -> LicenseResult {
        self.counters.start_trial.fetch_add(1, Ordering::SeqCst);
        lock(&self.start_trial).clone()
    }

    async fn tiers(&self) -> Vec<ProductTier> {
        self.counters.tiers.fetch_add(1, Ordering::SeqCst);
        lock(&self.tiers).clone()
    }

    async fn start_checkout(&self, _tier_id: &str, _email: &str) -> CheckoutResult {
        self.counters.start_checkout.fetch_add(1, Ordering::SeqCst);
        lock(&self.checkout).clone()
    }

    fn machine_id(&self) -> &str {
        TEST_MACHINE_ID
    }
}

/// A wiremock server standing in for the License API.
///
/// Holds a temporary directory for the machine identifier so tests never
/// touch the real home directory.
pub struct MockLicenseApi {
    pub server: MockServer,
    dir: TempDir,
}

impl MockLicenseApi {
    pub async fn start() -> anyhow::Result<Self> {
        Ok(Self {
            server: MockServer::start().await,
            dir: tempfile::tempdir()?,
        })
    }

    /// Options pointing at this server.
    pub fn options(&self) -> LicenseOptions {
        LicenseOptions::new(TEST_PUBLIC_KEY, TEST_PRODUCT_SLUG)
            .with_api_base_url(self.server.uri())
            .with_http_timeout(Duration::from_secs(5))
            .with_machine_id_path(self.machine_id_path())
    }

    pub fn machine_id_path(&self) -> std::path::PathBuf {
        self.dir.path().join("machine_id")
    }

    pub fn transport(&self) -> anyhow::Result<HttpTransport> {
        Ok(HttpTransport::with_machine_id(&self.options(), TEST_MACHINE_ID)?)
    }

    pub fn client(&self) -> anyhow::Result<LicenseClient> {
        Ok(LicenseClient::with_transport(
            self.options(),
            Arc::new(self.transport()?),
        ))
    }

    /// JSON bodies of every request the server received, in order.
    pub async fn received_bodies(&self) -> Vec<serde_json::Value> {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter_map(|r| serde_json::from_slice(&r.body).ok())
            .collect()
    }
}
