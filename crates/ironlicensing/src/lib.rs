//! IronLicensing client SDK.
//!
//! Validate, activate and deactivate license keys against the IronLicensing
//! API, track feature entitlements, and start trials and purchases.
//!
//! ```no_run
//! use ironlicensing::{LicenseClient, LicenseOptions};
//!
//! # async fn run() -> ironlicensing::Result<()> {
//! let client = LicenseClient::new(LicenseOptions::new("pk_live_xxx", "my-app"))?;
//! let result = client.activate("XXXX-XXXX-XXXX", None).await;
//! if !result.valid {
//!     eprintln!("activation failed: {:?}", result.error);
//! }
//! client.require_feature("export")?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod machine;
pub mod options;
pub mod registry;
pub mod transport;

pub use client::{LicenseClient, LicenseListener, LicenseSnapshot};
pub use ironlicensing_core::*;
pub use machine::MachineIdStore;
pub use options::{LicenseOptions, LicenseOptionsBuilder};
pub use transport::HttpTransport;
