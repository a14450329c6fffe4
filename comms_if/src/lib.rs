//! # Communications interface crate
//!
//! This crate defines the messages exchanged between the motion-control
//! executable and its external collaborators (localisation, path planner,
//! obstacle avoider, operator input device), along with a thin latest-value
//! publish/subscribe layer over ZMQ.
//!
//! No control semantics live here. The control core treats every input as a
//! snapshot with latest-value semantics, so the transport is free to drop
//! stale messages.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Control messages - velocity demands, reference paths, obstacle data
pub mod ctrl;

/// Localisation messages - the planar pose estimate
pub mod loc;

/// Network layer - latest-value pub/sub over ZMQ
pub mod net;

/// Operator input messages - decoded pad axes and buttons
pub mod op;
