//! # Data Store

use comms_if::{ctrl::Velocity, loc::Pose, op::OpInput};

use crate::motion_ctrl;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Global data store for the executable.
///
/// Holds the cycle counters and the latest-value input snapshots, which are
/// retained between cycles so a quiet topic keeps its last known value.
#[derive(Default)]
pub struct DataStore {
    // Cycle management
    /// Number of cycles already executed
    pub num_cycles: u128,

    /// True if this cycle falls on a 1Hz boundary
    pub is_1_hz_cycle: bool,

    /// Elapsed session time at the start of this cycle
    pub elapsed_time_s: f64,

    // Input snapshots
    /// Latest pose estimate, `None` until the first estimate arrives
    pub robot_pose: Option<Pose>,

    /// Latest operator input
    pub op_input: OpInput,

    /// Latest obstacle-detected flag
    pub obstacle_detected: bool,

    /// Latest obstacle-avoidance velocity
    pub obstacle_vel: Velocity,

    // MotionCtrl
    pub motion_ctrl: motion_ctrl::MotionCtrl,
    pub motion_ctrl_input: motion_ctrl::InputData,
    pub motion_ctrl_output: motion_ctrl::OutputData,
    pub motion_ctrl_status_rpt: motion_ctrl::StatusReport,

    // Monitoring counters
    /// Number of consecutive cycle overruns
    pub num_consec_cycle_overruns: u64,
}

// ---------------------------------------------------------------------------
// IMPLS
// ---------------------------------------------------------------------------

impl DataStore {
    /// Perform actions required at the start of a cycle.
    ///
    /// Clears the per-cycle module data and sets the 1Hz cycle flag. The
    /// input snapshots are deliberately not cleared.
    pub fn cycle_start(&mut self, cycle_frequency_hz: f64) {
        self.is_1_hz_cycle = self.num_cycles % (cycle_frequency_hz as u128) == 0;

        self.motion_ctrl_input = motion_ctrl::InputData::default();
        self.motion_ctrl_output = motion_ctrl::OutputData::default();
        self.motion_ctrl_status_rpt = motion_ctrl::StatusReport::default();

        self.elapsed_time_s = util::session::get_elapsed_seconds();
    }
}
