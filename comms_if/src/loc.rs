//! # Localisation messages

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A planar pose in the global (map) frame.
///
/// Represents either the robot's estimated pose or a single waypoint of a
/// reference path. The heading is the angle to the global +X axis, and is
/// normalised into `(-pi, pi]` by the producer.
///
/// Each new estimate replaces the previous one wholesale, there is no
/// incremental update.
#[derive(Debug, Default, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    /// Position along the global X axis in meters.
    pub x_m: f64,

    /// Position along the global Y axis in meters.
    pub y_m: f64,

    /// Heading in radians, normalised to `(-pi, pi]`.
    pub theta_rad: f64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Pose {
    pub fn new(x_m: f64, y_m: f64, theta_rad: f64) -> Self {
        Self {
            x_m,
            y_m,
            theta_rad,
        }
    }

    /// Euclidean distance between this pose's position and another's.
    pub fn distance_to(&self, other: &Pose) -> f64 {
        (other.x_m - self.x_m).hypot(other.y_m - self.y_m)
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_distance() {
        let a = Pose::new(0.0, 0.0, 0.0);
        let b = Pose::new(3.0, 4.0, 1.0);
        assert_eq!(a.distance_to(&b), 5.0);
        assert_eq!(b.distance_to(&a), 5.0);
    }
}
