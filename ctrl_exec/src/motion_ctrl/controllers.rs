//! # Feedback controllers
//!
//! This module provides the two interchangeable feedback control strategies
//! used by motion control. Both share the same contract: given the current
//! pose and the steering target, produce a global-frame velocity, saturated
//! per axis before it is returned.
//!
//! - [`PidController`] runs a discrete PID on the per-axis position and
//!   heading errors. Its integral and previous-error state persists across
//!   cycles for disturbance rejection, the reset policy is configurable.
//! - [`LqrController`] treats the error as a trivially drivable linear
//!   system and solves the discrete algebraic Riccati equation by fixed
//!   point iteration. The weight matrices are fixed at load time, so the
//!   gain matrix is computed once at construction using the same iterative
//!   solve that would run per cycle if the weights were dynamic.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, warn};
use nalgebra::{Matrix3, Vector3};

// Internal
use super::{Params, PerAxis};
use comms_if::{ctrl::Velocity, loc::Pose};
use util::maths::{clamp, wrap_to_pi};

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// A feedback control strategy.
///
/// The active strategy is chosen at configuration time via
/// [`super::StrategyKind`].
pub trait VelocityController {
    /// Compute the global-frame velocity driving the robot from `pose`
    /// towards `target`.
    fn compute(&mut self, pose: &Pose, target: &Pose) -> Velocity;

    /// Discard any accumulated controller state.
    fn reset(&mut self);
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Discrete PID controller on per-axis pose error.
#[derive(Debug, Clone)]
pub struct PidController {
    /// Proportional gains
    k_p: PerAxis,

    /// Integral gains
    k_i: PerAxis,

    /// Derivative gains
    k_d: PerAxis,

    /// Factor applied to the summed terms
    output_scale: f64,

    /// Heading error magnitude above which x/y outputs are zeroed
    heading_gate_rad: f64,

    /// Per-axis output magnitude bound
    max_speed: f64,

    /// Accumulated integral per axis, persists across cycles
    integral: PerAxis,

    /// Error of the previous invocation per axis
    prev_error: PerAxis,
}

/// Discrete-time LQR controller.
///
/// Holds no per-cycle state, only the precomputed gain matrix.
#[derive(Debug, Clone)]
pub struct LqrController {
    /// The gain matrix K
    gain: Matrix3<f64>,

    /// Per-axis output magnitude bound
    max_speed: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl PidController {
    /// Create a new controller from the parameters.
    pub fn new(params: &Params) -> Self {
        Self {
            k_p: params.pid_k_p,
            k_i: params.pid_k_i,
            k_d: params.pid_k_d,
            output_scale: params.pid_output_scale,
            heading_gate_rad: params.pid_heading_gate_rad,
            max_speed: params.max_speed,
            integral: PerAxis::default(),
            prev_error: PerAxis::default(),
        }
    }
}

impl VelocityController for PidController {
    fn compute(&mut self, pose: &Pose, target: &Pose) -> Velocity {
        let error = PerAxis {
            x: target.x_m - pose.x_m,
            y: target.y_m - pose.y_m,
            theta: wrap_to_pi(target.theta_rad - pose.theta_rad),
        };

        self.integral.x += error.x;
        self.integral.y += error.y;
        self.integral.theta += error.theta;

        let mut output = PerAxis {
            x: self.k_p.x * error.x
                + self.k_i.x * self.integral.x
                + self.k_d.x * (error.x - self.prev_error.x),
            y: self.k_p.y * error.y
                + self.k_i.y * self.integral.y
                + self.k_d.y * (error.y - self.prev_error.y),
            theta: self.k_p.theta * error.theta
                + self.k_i.theta * self.integral.theta
                + self.k_d.theta * (error.theta - self.prev_error.theta),
        };

        self.prev_error = error;

        // Turn in place first: translation demands are dropped while the
        // heading error is large
        if error.theta.abs() >= self.heading_gate_rad {
            output.x = 0.0;
            output.y = 0.0;
        }

        Velocity {
            x: clamp(&(output.x * self.output_scale), &-self.max_speed, &self.max_speed),
            y: clamp(&(output.y * self.output_scale), &-self.max_speed, &self.max_speed),
            theta: clamp(
                &(output.theta * self.output_scale),
                &-self.max_speed,
                &self.max_speed,
            ),
        }
    }

    fn reset(&mut self) {
        self.integral = PerAxis::default();
        self.prev_error = PerAxis::default();
    }
}

impl LqrController {
    /// Create a new controller from the parameters.
    ///
    /// The Riccati solve runs here. A, B, Q and R are constant for the life
    /// of the process, so the converged gain is cached rather than
    /// recomputed every cycle.
    pub fn new(params: &Params) -> Self {
        // Error dynamics: identity state matrix, the control input drives
        // each error axis directly with no coupling
        let a = Matrix3::<f64>::identity();
        let b = Matrix3::<f64>::identity() * -params.lqr_dt_s;

        let q = Matrix3::from_diagonal(&Vector3::new(
            params.lqr_q_diag.x,
            params.lqr_q_diag.y,
            params.lqr_q_diag.theta,
        ));
        let r = Matrix3::from_diagonal(&Vector3::new(
            params.lqr_r_diag.x,
            params.lqr_r_diag.y,
            params.lqr_r_diag.theta,
        ));

        let p = solve_dare(
            &a,
            &b,
            &q,
            &r,
            params.lqr_max_iterations,
            params.lqr_convergence_threshold,
        );

        // K = R^-1 B^T P. R is diagonal and positive definite for a valid
        // tuning, a zero entry in lqr_r_diag breaks that.
        let r_inv = match r.try_inverse() {
            Some(inv) => inv,
            None => {
                warn!("R is singular, check the lqr_r_diag tuning, substituting identity");
                Matrix3::identity()
            }
        };
        let gain = r_inv * b.transpose() * p;

        Self {
            gain,
            max_speed: params.max_speed,
        }
    }

    /// The cached gain matrix, exposed for telemetry and tests.
    pub fn gain(&self) -> &Matrix3<f64> {
        &self.gain
    }
}

impl VelocityController for LqrController {
    fn compute(&mut self, pose: &Pose, target: &Pose) -> Velocity {
        let error = Vector3::new(
            target.x_m - pose.x_m,
            target.y_m - pose.y_m,
            wrap_to_pi(target.theta_rad - pose.theta_rad),
        );

        let u = -self.gain * error;

        Velocity {
            x: clamp(&u[0], &-self.max_speed, &self.max_speed),
            y: clamp(&u[1], &-self.max_speed, &self.max_speed),
            theta: clamp(&u[2], &-self.max_speed, &self.max_speed),
        }
    }

    fn reset(&mut self) {}
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Build the controller selected by the parameters.
pub fn controller_from_params(params: &Params) -> Box<dyn VelocityController + Send> {
    match params.strategy {
        super::StrategyKind::Pid => Box::new(PidController::new(params)),
        super::StrategyKind::Lqr => Box::new(LqrController::new(params)),
    }
}

/// Solve the discrete algebraic Riccati equation by fixed-point iteration.
///
/// Starting from `P = Q`, iterates
/// `P <- A^T P A - A^T P B (R + B^T P B)^-1 B^T P A + Q`
/// until the Frobenius norm of the change drops below `threshold` or
/// `max_iterations` is reached. Exhausting the iteration cap is not fatal:
/// the best available P is returned, a bounded-but-imperfect gain is safer
/// than no gain at all.
pub fn solve_dare(
    a: &Matrix3<f64>,
    b: &Matrix3<f64>,
    q: &Matrix3<f64>,
    r: &Matrix3<f64>,
    max_iterations: usize,
    threshold: f64,
) -> Matrix3<f64> {
    let mut p = *q;

    for i in 0..max_iterations {
        let p_prev = p;

        let gain_term = match (r + b.transpose() * p * b).try_inverse() {
            Some(inv) => a.transpose() * p * b * inv * b.transpose() * p * a,
            None => {
                // R + B^T P B is positive definite for valid weights, so
                // this only happens on malformed parameters
                warn!("Riccati iterate produced a singular term, using previous P");
                break;
            }
        };

        p = a.transpose() * p * a - gain_term + q;

        let norm_diff = (p - p_prev).norm();
        if norm_diff < threshold {
            debug!("Riccati recursion converged after {} iterations", i + 1);
            return p;
        }
    }

    debug!(
        "Riccati recursion hit the iteration cap ({}), using best available P",
        max_iterations
    );
    p
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_pid_accumulates_state() {
        let params = Params::default();
        let mut pid = PidController::new(&params);

        let pose = Pose::new(0.0, 0.0, 0.0);
        let target = Pose::new(0.1, 0.0, 0.0);

        // First call: P + D terms both act on the full error (prev error
        // starts at zero)
        let v1 = pid.compute(&pose, &target);
        let expected_first: f64 = (2.3 * 0.1 + 1.8 * 0.1) * 100.0;
        assert!((v1.x - expected_first.min(30.0)).abs() < 1e-9);

        // Second call with the same error: the derivative term vanishes
        let v2 = pid.compute(&pose, &target);
        let expected_second = 2.3 * 0.1 * 100.0;
        assert!((v2.x - expected_second).abs() < 1e-9);

        // Reset restores the first-call behavior
        pid.reset();
        let v3 = pid.compute(&pose, &target);
        assert!((v3.x - v1.x).abs() < 1e-9);
    }

    #[test]
    fn test_pid_integral_term() {
        // The stock tuning zeroes k_i, use a nonzero one so the accumulator
        // is observable
        let mut params = Params::default();
        params.pid_k_i = PerAxis {
            x: 0.5,
            y: 0.5,
            theta: 0.0,
        };
        let mut pid = PidController::new(&params);

        let pose = Pose::new(0.0, 0.0, 0.0);
        let target = Pose::new(0.05, 0.0, 0.0);

        // First call: P, I and D all act on the full error
        let v1 = pid.compute(&pose, &target);
        assert!((v1.x - (2.3 + 0.5 + 1.8) * 0.05 * 100.0).abs() < 1e-9);

        // With the error held the derivative vanishes while the integral
        // keeps growing, adding k_i * error * scale per call
        let v2 = pid.compute(&pose, &target);
        assert!((v2.x - (2.3 * 0.05 + 0.5 * 0.10) * 100.0).abs() < 1e-9);

        let v3 = pid.compute(&pose, &target);
        assert!((v3.x - v2.x - 0.5 * 0.05 * 100.0).abs() < 1e-9);

        let v4 = pid.compute(&pose, &target);
        assert!((v4.x - v3.x - 0.5 * 0.05 * 100.0).abs() < 1e-9);

        // Reset empties the accumulator
        pid.reset();
        let v5 = pid.compute(&pose, &target);
        assert!((v5.x - v1.x).abs() < 1e-9);
    }

    #[test]
    fn test_pid_heading_gate() {
        let params = Params::default();
        let mut pid = PidController::new(&params);

        // Heading error of pi/2 is well beyond the pi/6 gate: translation
        // outputs must be zeroed
        let pose = Pose::new(0.0, 0.0, 0.0);
        let target = Pose::new(1.0, 1.0, PI / 2.0);

        let v = pid.compute(&pose, &target);
        assert_eq!(v.x, 0.0);
        assert_eq!(v.y, 0.0);
        assert!(v.theta > 0.0);
    }

    #[test]
    fn test_lqr_determinism() {
        let params = Params::default();
        let mut lqr_a = LqrController::new(&params);
        let mut lqr_b = LqrController::new(&params);

        assert_eq!(lqr_a.gain(), lqr_b.gain());

        let pose = Pose::new(0.3, -0.7, 0.2);
        let target = Pose::new(1.0, 1.0, -0.4);

        let u1 = lqr_a.compute(&pose, &target);
        let u2 = lqr_a.compute(&pose, &target);
        let u3 = lqr_b.compute(&pose, &target);

        assert_eq!(u1, u2);
        assert_eq!(u1, u3);
    }

    #[test]
    fn test_lqr_drives_error_down() {
        let params = Params::default();
        let mut lqr = LqrController::new(&params);

        // Target ahead on +X: the commanded x velocity must be positive
        // (B = -I flips the sign of the gain, u = -K e ends up aligned with
        // the error)
        let pose = Pose::new(0.0, 0.0, 0.0);
        let target = Pose::new(0.05, 0.0, 0.0);
        let u = lqr.compute(&pose, &target);
        assert!(u.x > 0.0);
        assert_eq!(u.theta, 0.0);

        // And the output is saturated for large errors
        let far_target = Pose::new(100.0, -100.0, 0.0);
        let u = lqr.compute(&pose, &far_target);
        assert_eq!(u.x, 30.0);
        assert_eq!(u.y, -30.0);
    }

    #[test]
    fn test_dare_converges_for_fixed_weights() {
        let a = Matrix3::identity();
        let b = Matrix3::identity() * -1.0;
        let q = Matrix3::from_diagonal(&Vector3::new(225.0, 225.0, 50.0));
        let r = Matrix3::identity();

        let p = solve_dare(&a, &b, &q, &r, 100, 1e-6);

        // One more iterate must not move the solution
        let p_next = a.transpose() * p * a
            - a.transpose() * p * b * (r + b.transpose() * p * b).try_inverse().unwrap()
                * b.transpose()
                * p
                * a
            + q;
        assert!((p_next - p).norm() < 1e-5);
    }
}
