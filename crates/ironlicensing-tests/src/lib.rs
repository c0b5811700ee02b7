//! Test infrastructure for the IronLicensing SDK.
//!
//! Provides license fixtures, a scriptable call-counting transport, and a
//! wiremock-backed stand-in for the License API.
//!
//! # Usage
//!
//! ```ignore
//! use ironlicensing_tests::{LicenseFixture, ResultFixture, StubTransport};
//!
//! #[tokio::test]
//! async fn test_something() {
//!     let (client, stub) = StubTransport::new()
//!         .with_validate(ResultFixture::valid(LicenseFixture::valid("KEY-1")))
//!         .into_client();
//!     client.validate("KEY-1").await;
//!     assert_eq!(stub.calls().validate, 1);
//! }
//! ```

pub mod fixtures;
pub mod helpers;

pub use fixtures::*;
pub use helpers::*;

/// Initialize test logging (safe to call from every test).
pub fn init_test_logging() {
    use tracing_subscriber::{EnvFilter, fmt};

    let _ = fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn,ironlicensing=debug")),
        )
        .with_test_writer()
        .try_init();
}
