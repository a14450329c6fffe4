//! # Control messages
//!
//! Messages flowing into and out of the motion-control core: the reference
//! path, the obstacle-avoidance inputs, the goal request and the velocity
//! demand sent to the actuator layer.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use crate::loc::Pose;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A three axis velocity.
///
/// The frame (global or robot-local) is given by the context in which the
/// value is used. Linear axes are in cm/s, the angular axis follows the
/// right hand rule about Z+.
#[derive(Debug, Default, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Velocity {
    pub x: f64,

    pub y: f64,

    pub theta: f64,
}

/// A reference path for the robot to follow.
///
/// Waypoints are ordered front-to-back in traversal order. Receipt of a new
/// `RefPath` replaces any previously commanded path wholesale.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct RefPath {
    pub poses: Vec<Pose>,
}

/// Obstacle detection flag from the external obstacle-avoidance subsystem.
#[derive(Debug, Default, Copy, Clone, Serialize, Deserialize)]
pub struct ObstacleStatus {
    pub detected: bool,
}

/// The per-cycle velocity demand output by the control core.
///
/// `vel` is expressed in the robot-local frame and is already saturated to
/// the configured per-axis bound.
#[derive(Debug, Default, Copy, Clone, Serialize, Deserialize)]
pub struct VelDemand {
    pub vel: Velocity,

    /// Mirrors the run/lock toggle so the actuator layer can distinguish a
    /// commanded stop from a lock-out.
    pub run_status: bool,
}

/// A request for the external planner to produce a path to the given pose.
#[derive(Debug, Default, Copy, Clone, Serialize, Deserialize)]
pub struct GoalRequest {
    pub pose: Pose,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Velocity {
    pub fn new(x: f64, y: f64, theta: f64) -> Self {
        Self { x, y, theta }
    }

    /// The all-zero velocity, the universal safe default.
    pub fn zero() -> Self {
        Self::default()
    }
}
