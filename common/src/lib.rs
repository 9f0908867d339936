//! Provides types and functions shared by the operator and its tooling.
#![deny(missing_docs)]
pub mod env;
#[cfg(feature = "telemetry")]
pub mod telemetry;
