//! Motion control parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Deserialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A per-axis set of values, one for each controlled axis.
///
/// Named fields rather than an indexed array so that position axes and the
/// angle axis can't be silently mixed up.
#[derive(Deserialize, Debug, Default, Copy, Clone, PartialEq)]
pub struct PerAxis {
    /// Value for the global X axis (meters or derived units)
    pub x: f64,

    /// Value for the global Y axis (meters or derived units)
    pub y: f64,

    /// Value for the heading axis (radians or derived units)
    pub theta: f64,
}

/// Parameters for motion control
#[derive(Deserialize, Debug, Clone)]
pub struct Params {
    /// Which feedback controller strategy to run
    pub strategy: StrategyKind,

    /// Pure pursuit lookahead offset in meters
    pub lookahead_m: f64,

    /// Factor applied to the lookahead offset while the obstacle flag is set
    pub obstacle_lookahead_scale: f64,

    /// Position error below which the terminal waypoint counts as reached
    pub arrival_pos_threshold_m: f64,

    /// Heading error magnitude below which the terminal waypoint counts as
    /// reached
    pub arrival_head_threshold_rad: f64,

    /// PID proportional gains
    pub pid_k_p: PerAxis,

    /// PID integral gains
    pub pid_k_i: PerAxis,

    /// PID derivative gains
    pub pid_k_d: PerAxis,

    /// Factor applied to the summed PID terms to produce the output velocity
    pub pid_output_scale: f64,

    /// Heading error magnitude above which the PID zeroes its x/y outputs,
    /// preventing translation while grossly misoriented
    pub pid_heading_gate_rad: f64,

    /// If true the PID integral and previous-error state is reset whenever a
    /// new reference path is installed, if false it persists for the life of
    /// the process
    pub pid_reset_per_path: bool,

    /// LQR state-error cost, the diagonal of Q
    pub lqr_q_diag: PerAxis,

    /// LQR control-effort cost, the diagonal of R
    pub lqr_r_diag: PerAxis,

    /// Timestep used in the LQR input matrix
    pub lqr_dt_s: f64,

    /// Iteration cap for the Riccati fixed-point solve
    pub lqr_max_iterations: usize,

    /// Matrix-norm change below which the Riccati solve is converged
    pub lqr_convergence_threshold: f64,

    /// Per-axis magnitude bound applied to every output velocity
    pub max_speed: f64,

    /// Gains applied to the operator axes in manual run mode
    pub manual_axis_gains: PerAxis,
}

impl Default for Params {
    /// Default tuning, matching the shipped `motion_ctrl.toml`.
    fn default() -> Self {
        Self {
            strategy: StrategyKind::Lqr,
            lookahead_m: 0.1,
            obstacle_lookahead_scale: 10.0,
            arrival_pos_threshold_m: 0.033,
            arrival_head_threshold_rad: std::f64::consts::PI / 36.0,
            pid_k_p: PerAxis {
                x: 2.3,
                y: 2.3,
                theta: 0.2,
            },
            pid_k_i: PerAxis {
                x: 0.0,
                y: 0.0,
                theta: 0.0,
            },
            pid_k_d: PerAxis {
                x: 1.8,
                y: 1.8,
                theta: 0.13,
            },
            pid_output_scale: 100.0,
            pid_heading_gate_rad: std::f64::consts::PI / 6.0,
            pid_reset_per_path: false,
            lqr_q_diag: PerAxis {
                x: 225.0,
                y: 225.0,
                theta: 50.0,
            },
            lqr_r_diag: PerAxis {
                x: 1.0,
                y: 1.0,
                theta: 1.0,
            },
            lqr_dt_s: 1.0,
            lqr_max_iterations: 100,
            lqr_convergence_threshold: 1e-6,
            max_speed: 30.0,
            manual_axis_gains: PerAxis {
                x: -45.0,
                y: 45.0,
                theta: 20.0,
            },
        }
    }
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Selects which feedback controller strategy the module runs.
///
/// Chosen at configuration time, not per cycle.
#[derive(Deserialize, Debug, Copy, Clone, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    Pid,
    Lqr,
}

impl Default for StrategyKind {
    fn default() -> Self {
        StrategyKind::Lqr
    }
}
