//! # Pure pursuit target selector
//!
//! Given the current pose and the path buffer, the selector pops consumed
//! waypoints from the front of the buffer and returns the next steering
//! target. Two policies exist:
//!
//! - **normal tracking**: waypoints closer than the lookahead offset are
//!   consumed until one at or beyond the offset is found;
//! - **obstacle avoidance**: the offset is scaled up and waypoints behind
//!   the robot (negative heading dot product) are consumed as well, so the
//!   external avoider gets a target well clear of the obstruction.
//!
//! When a single waypoint remains it is treated as the terminal waypoint:
//! once both the position and wrapped heading errors are inside the arrival
//! thresholds it is popped, the returned target snaps to the current pose
//! and the arrival flag is raised.
//!
//! The selector must not be invoked with an empty buffer. The caller checks
//! emptiness first and forces zero velocity instead.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::info;

// Internal
use super::{Params, PathBuffer, PathBufferError};
use comms_if::loc::Pose;
use util::maths::wrap_to_pi;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The outcome of a target-selection pass.
#[derive(Debug, Copy, Clone)]
pub struct Target {
    /// The pose to steer towards. Equal to the current pose when `arrived`
    /// is set.
    pub pose: Pose,

    /// True if the terminal waypoint was consumed this pass.
    pub arrived: bool,
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Select the next steering target, consuming passed waypoints.
///
/// `obstacle` switches between the normal and obstacle-avoidance lookahead
/// policies.
pub fn select_target(
    robot: &Pose,
    path: &mut PathBuffer,
    params: &Params,
    obstacle: bool,
) -> Result<Target, PathBufferError> {
    if obstacle {
        select_avoidance(robot, path, params)
    } else {
        select_normal(robot, path, params)
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Normal tracking policy.
fn select_normal(
    robot: &Pose,
    path: &mut PathBuffer,
    params: &Params,
) -> Result<Target, PathBufferError> {
    let mut target = *path.front()?;

    if path.len() > 1 {
        // Consume waypoints inside the lookahead offset. The scan stops as
        // soon as only one waypoint remains, that one is handled as the
        // terminal waypoint on a later pass.
        let mut distance = robot.distance_to(&target);

        while distance < params.lookahead_m {
            path.pop_front();
            target = *path.front()?;

            if path.len() <= 1 {
                break;
            }

            distance = robot.distance_to(&target);
        }

        Ok(Target {
            pose: target,
            arrived: false,
        })
    } else {
        Ok(check_terminal(robot, path, target, params)?)
    }
}

/// Obstacle-avoidance policy.
///
/// The lookahead offset is scaled up, and waypoints behind the robot are
/// consumed without being considered valid targets.
fn select_avoidance(
    robot: &Pose,
    path: &mut PathBuffer,
    params: &Params,
) -> Result<Target, PathBufferError> {
    let offset = params.lookahead_m * params.obstacle_lookahead_scale;

    while path.len() > 1 {
        let target = *path.front()?;
        let distance = robot.distance_to(&target);

        // A waypoint is behind the robot if the vector to it opposes the
        // heading direction
        let dx = target.x_m - robot.x_m;
        let dy = target.y_m - robot.y_m;
        let dot_product = dx * robot.theta_rad.cos() + dy * robot.theta_rad.sin();

        if distance >= offset && dot_product > 0.0 {
            return Ok(Target {
                pose: target,
                arrived: false,
            });
        }

        path.pop_front();
    }

    let target = *path.front()?;
    Ok(check_terminal(robot, path, target, params)?)
}

/// Arrival check for the terminal waypoint.
///
/// If both errors are inside the thresholds the waypoint is popped, the
/// target snaps to the current pose and the arrival flag is raised.
fn check_terminal(
    robot: &Pose,
    path: &mut PathBuffer,
    target: Pose,
    params: &Params,
) -> Result<Target, PathBufferError> {
    let distance = robot.distance_to(&target);
    let theta_error = wrap_to_pi(target.theta_rad - robot.theta_rad);

    if distance <= params.arrival_pos_threshold_m
        && theta_error.abs() <= params.arrival_head_threshold_rad
    {
        path.pop_front();
        info!("Path finished");

        Ok(Target {
            pose: *robot,
            arrived: true,
        })
    } else {
        Ok(Target {
            pose: target,
            arrived: false,
        })
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    fn straight_line_path() -> PathBuffer {
        // 5 collinear waypoints spaced 1 m apart along +X
        let mut path = PathBuffer::default();
        path.replace(&[
            Pose::new(0.0, 0.0, 0.0),
            Pose::new(1.0, 0.0, 0.0),
            Pose::new(2.0, 0.0, 0.0),
            Pose::new(3.0, 0.0, 0.0),
            Pose::new(4.0, 0.0, 0.0),
        ]);
        path
    }

    #[test]
    fn test_normal_advance() {
        let params = Params::default();
        let mut path = straight_line_path();
        let robot = Pose::new(0.0, 0.0, 0.0);

        // Robot sits on the first waypoint with a 0.1 m lookahead: the first
        // waypoint is consumed and the second returned.
        let target = select_target(&robot, &mut path, &params, false).unwrap();
        assert!(!target.arrived);
        assert_eq!(target.pose.x_m, 1.0);
        assert_eq!(path.len(), 4);

        // Just short of the next waypoint: it is inside the offset and gets
        // consumed, the one after becomes the target
        let robot = Pose::new(0.95, 0.0, 0.0);
        let target = select_target(&robot, &mut path, &params, false).unwrap();
        assert!(!target.arrived);
        assert_eq!(target.pose.x_m, 2.0);
        assert_eq!(path.len(), 3);
    }

    #[test]
    fn test_arrival_detection() {
        let params = Params::default();
        let mut path = PathBuffer::default();
        path.replace(&[Pose::new(0.0, 0.0, 0.0)]);

        // Inside both thresholds: arrival, snap to pose, path left empty
        let robot = Pose::new(0.01, 0.01, 0.0);
        let target = select_target(&robot, &mut path, &params, false).unwrap();
        assert!(target.arrived);
        assert_eq!(target.pose, robot);
        assert!(path.is_empty());
    }

    #[test]
    fn test_no_arrival_outside_thresholds() {
        let params = Params::default();
        let mut path = PathBuffer::default();
        path.replace(&[Pose::new(0.0, 0.0, 0.0)]);

        // Position fine but heading error too large
        let robot = Pose::new(0.01, 0.01, 0.5);
        let target = select_target(&robot, &mut path, &params, false).unwrap();
        assert!(!target.arrived);
        assert_eq!(path.len(), 1);
        assert_eq!(target.pose.x_m, 0.0);
    }

    #[test]
    fn test_avoidance_rejects_points_behind() {
        let params = Params::default();
        let mut path = PathBuffer::default();

        // First two waypoints behind the robot (facing +X at x=0), third
        // ahead and beyond the scaled offset (0.1 * 10 = 1.0)
        path.replace(&[
            Pose::new(-2.0, 0.0, 0.0),
            Pose::new(-1.5, 0.0, 0.0),
            Pose::new(2.0, 0.0, 0.0),
            Pose::new(3.0, 0.0, 0.0),
        ]);
        let robot = Pose::new(0.0, 0.0, 0.0);

        let target = select_target(&robot, &mut path, &params, true).unwrap();
        assert!(!target.arrived);
        assert_eq!(target.pose.x_m, 2.0);
        assert_eq!(path.len(), 2);
    }

    #[test]
    fn test_avoidance_scaled_offset() {
        let params = Params::default();
        let mut path = PathBuffer::default();

        // Waypoint ahead but inside the scaled offset gets consumed even
        // though it would be a valid normal-mode target
        path.replace(&[Pose::new(0.5, 0.0, 0.0), Pose::new(5.0, 0.0, 0.0)]);
        let robot = Pose::new(0.0, 0.0, 0.0);

        let target = select_target(&robot, &mut path, &params, true).unwrap();
        assert_eq!(target.pose.x_m, 5.0);
        assert_eq!(path.len(), 1);
    }
}
