//! # Frame transforms
//!
//! Pure functions rotating velocities between the global (map) frame and the
//! robot-local frame, plus the two auxiliary quarter-turn channels.
//!
//! The sign conventions here match the downstream actuator mapping, where
//! forward is the local y axis. They must not be "simplified" into a
//! standard rotation matrix.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use std::f64::consts::FRAC_PI_2;

// Internal
use comms_if::ctrl::Velocity;

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Rotate a global-frame velocity into the robot-local frame for the given
/// heading.
pub fn global_to_local(theta_rad: f64, global_vel: &Velocity) -> Velocity {
    Velocity {
        x: global_vel.x * theta_rad.sin() - global_vel.y * theta_rad.cos(),
        y: global_vel.x * theta_rad.cos() + global_vel.y * theta_rad.sin(),
        theta: global_vel.theta,
    }
}

/// Quarter-turn rotation producing the desired-local-velocity telemetry
/// channel.
///
/// This is a separately-maintained transform used only for the auxiliary
/// output, not for the actuator demand.
pub fn desired_local_channel(local_vel: &Velocity) -> Velocity {
    Velocity {
        x: local_vel.x * FRAC_PI_2.cos() + local_vel.y * FRAC_PI_2.sin(),
        y: -1.0 * local_vel.x * FRAC_PI_2.sin() + local_vel.y * FRAC_PI_2.cos(),
        theta: local_vel.theta,
    }
}

/// Quarter-turn rotation bringing the externally supplied obstacle-avoidance
/// velocity into the actuator frame convention.
///
/// Independently signed from [`desired_local_channel`].
pub fn avoidance_to_local(avoidance_vel: &Velocity) -> Velocity {
    Velocity {
        x: avoidance_vel.x * FRAC_PI_2.cos() - avoidance_vel.y * FRAC_PI_2.sin(),
        y: avoidance_vel.x * FRAC_PI_2.sin() + avoidance_vel.y * FRAC_PI_2.cos(),
        theta: avoidance_vel.theta,
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use std::f64::consts::PI;

    fn assert_vel_eq(a: &Velocity, b: &Velocity) {
        assert!((a.x - b.x).abs() < 1e-12, "x: {} != {}", a.x, b.x);
        assert!((a.y - b.y).abs() < 1e-12, "y: {} != {}", a.y, b.y);
        assert!((a.theta - b.theta).abs() < 1e-12);
    }

    #[test]
    fn test_global_to_local() {
        let global = Velocity::new(1.0, 2.0, 0.5);

        // At zero heading: local x = -vy, local y = vx
        assert_vel_eq(
            &global_to_local(0.0, &global),
            &Velocity::new(-2.0, 1.0, 0.5),
        );

        // Facing +Y: local x = vx, local y = vy
        assert_vel_eq(
            &global_to_local(PI / 2.0, &global),
            &Velocity::new(1.0, 2.0, 0.5),
        );

        // Angular rate passes through untouched
        let spin = Velocity::new(0.0, 0.0, -3.0);
        assert_vel_eq(&global_to_local(1.234, &spin), &spin);
    }

    #[test]
    fn test_quarter_turn_channels_are_independent() {
        let v = Velocity::new(1.0, 2.0, 0.5);

        // Telemetry channel: (x, y) -> (y, -x)
        assert_vel_eq(&desired_local_channel(&v), &Velocity::new(2.0, -1.0, 0.5));

        // Avoidance channel: (x, y) -> (-y, x)
        assert_vel_eq(&avoidance_to_local(&v), &Velocity::new(-2.0, 1.0, 0.5));
    }
}
