//! # Control executable library.
//!
//! This library allows other crates in the workspace (and the integration
//! tests) to access items defined inside the control executable crate.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Global data store for the executable
pub mod data_store;

/// Motion control module - turns pose and path snapshots into velocity demands
pub mod motion_ctrl;

/// Telemetry server - publishes the per-cycle telemetry packet
pub mod tm_server;
