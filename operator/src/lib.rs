//! Provides the identity of every resource the operator emits: kind stamping and
//! ownership metadata.
#![warn(missing_docs)]

/// App module for the custom resource owning generated resources.
pub mod app;
/// Definitions module for resource kinds and default metadata.
pub mod definitions;
/// Labels module for managing resource labels.
pub mod labels;

/// Identity of the operator as recorded on managed resources.
const CONTROLLER_NAME: &str = "Kogito Operator";
