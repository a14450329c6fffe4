//! # Motion control module
//!
//! Motion control is responsible for turning the latest pose, path, operator
//! and obstacle snapshots into exactly one velocity demand per control cycle.
//!
//! The module is split into:
//! - a path buffer holding the waypoints of the commanded reference path,
//!   consumed strictly from the front;
//! - a pure pursuit target selector which pops consumed waypoints and picks
//!   the next steering target at the lookahead offset;
//! - two interchangeable feedback controllers (PID and LQR) converting the
//!   pose/target pair into a global-frame velocity;
//! - a frame transformer rotating that velocity into the robot-local frame;
//! - a mode/safety state machine arbitrating between path tracking,
//!   teleoperation and the externally supplied obstacle-avoidance velocity,
//!   and saturating whatever is finally selected.
//!
//! Whenever the module cannot produce a meaningful command (no path, paused,
//! locked) it falls back to zero velocity rather than raising an error.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod controllers;
mod frame;
mod mode;
mod params;
mod path_buffer;
mod pursuit;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use controllers::*;
pub use frame::*;
pub use mode::*;
pub use params::*;
pub use path_buffer::*;
pub use pursuit::*;
pub use state::*;
