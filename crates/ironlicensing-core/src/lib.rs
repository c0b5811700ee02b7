//! IronLicensing Core
//!
//! License, entitlement and purchase types shared by every IronLicensing
//! crate, together with the error taxonomy and the transport port the
//! license client talks through. This crate performs no I/O.

pub mod error;
pub mod license;
pub mod ports;
pub mod results;
pub mod tier;

pub use error::{Error, Result};
pub use license::{Activation, Feature, License, LicenseStatus, LicenseType};
pub use ports::LicenseTransport;
pub use results::{CheckoutResult, LicenseResult};
pub use tier::{ProductTier, TierList};
