//! Motion control module state

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{trace, warn};
use serde::Serialize;

// Internal
use super::{
    controller_from_params, frame, pursuit, Mode, ModeSwitches, Params, PathBuffer,
    PathBufferError, VelocityController,
};
use comms_if::{
    ctrl::{GoalRequest, RefPath, VelDemand, Velocity},
    loc::Pose,
    op::OpInput,
};
use util::{maths::clamp, module::State, params, session::Session};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Motion control module state.
#[derive(Default)]
pub struct MotionCtrl {
    pub(crate) params: Params,

    /// Edge-detected operator switches
    switches: ModeSwitches,

    /// The reference path, owned by the module between replacement events
    path: PathBuffer,

    /// The active feedback control strategy, built at init
    controller: Option<Box<dyn VelocityController + Send>>,

    /// Latched arrival signal, cleared when a new path is installed
    path_finished: bool,
}

/// Input snapshots for one motion control cycle.
#[derive(Debug, Default, Clone)]
pub struct InputData {
    /// Latest pose estimate, `None` until the first estimate arrives
    pub pose: Option<Pose>,

    /// A new reference path, `Some` only on cycles where one arrived
    pub new_path: Option<RefPath>,

    /// Latest operator input levels
    pub op: OpInput,

    /// Latest obstacle-detected flag
    pub obstacle_detected: bool,

    /// Latest externally computed obstacle-avoidance velocity
    pub obstacle_vel: Velocity,
}

/// Output of one motion control cycle.
#[derive(Debug, Default, Copy, Clone, Serialize)]
pub struct OutputData {
    /// The saturated local-frame velocity demand
    pub vel_demand: VelDemand,

    /// Auxiliary desired-local-velocity telemetry channel
    pub desired_local_vel: Velocity,

    /// Goal request for the external planner, `Some` only on the cycle a
    /// return-to-origin command fires
    pub goal_request: Option<GoalRequest>,
}

/// Status report for motion control processing.
#[derive(Debug, Default, Copy, Clone, Serialize)]
pub struct StatusReport {
    /// The operating mode this cycle
    pub mode: Mode,

    /// The pure pursuit target, `None` outside active tracking
    pub target: Option<Pose>,

    /// True on the cycle the terminal waypoint is consumed
    pub path_finished: bool,

    /// Waypoints left in the buffer after this cycle
    pub points_remaining: usize,

    /// True if the obstacle-avoidance velocity replaced the tracking result
    pub obstacle_override: bool,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Potential errors that can occur during processing of the module.
#[derive(Debug, thiserror::Error)]
pub enum MotionCtrlError {
    /// Target selection was run against an empty path buffer. The emptiness
    /// guard in `proc` makes this unreachable in nominal operation.
    #[error("Target selection failed: {0}")]
    TargetSelection(#[from] PathBufferError),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl State for MotionCtrl {
    type InitData = &'static str;
    type InitError = params::LoadError;

    type InputData = InputData;
    type OutputData = OutputData;
    type StatusReport = StatusReport;
    type ProcError = MotionCtrlError;

    /// Initialise the motion control module.
    ///
    /// Expected init data is the path to the parameter file.
    fn init(&mut self, init_data: Self::InitData, _session: &Session) -> Result<(), Self::InitError> {
        let params: Params = params::load(init_data)?;
        *self = Self::from_params(params);
        Ok(())
    }

    /// Perform one cycle of motion control.
    ///
    /// Consumes the latest input snapshots and produces exactly one velocity
    /// demand, saturated to the configured per-axis bound.
    fn proc(
        &mut self,
        input_data: &Self::InputData,
    ) -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError> {
        let mut report = StatusReport::default();

        // ---- COMMAND EDGES ----

        let events = self.switches.update(&input_data.op);

        if events.clear_path {
            self.path.clear();
        }

        let mut goal_request = None;
        if events.return_to_origin {
            // Drop the current path and ask the planner for a route back to
            // the origin pose. The new path arrives through the normal path
            // input.
            self.path.clear();
            goal_request = Some(GoalRequest {
                pose: Pose::default(),
            });
        }

        // ---- PATH REPLACEMENT ----

        // Replacement is applied here, before the target-selection scan, so
        // the two mutation sources never interleave within a cycle
        if let Some(ref new_path) = input_data.new_path {
            self.path.replace(&new_path.poses);
            self.path_finished = false;

            if self.params.pid_reset_per_path {
                if let Some(ref mut controller) = self.controller {
                    controller.reset();
                }
            }
        }

        // ---- MODE ARBITRATION ----

        let mode = self.switches.mode();
        report.mode = mode;

        let mut vel = Velocity::zero();
        let mut desired_local = Velocity::zero();

        match mode {
            Mode::GuidedActive => {
                if self.path.is_empty() {
                    // Never attempt tracking with no reference
                } else if let Some(ref pose) = input_data.pose {
                    let target = pursuit::select_target(
                        pose,
                        &mut self.path,
                        &self.params,
                        input_data.obstacle_detected,
                    )?;

                    report.target = Some(target.pose);

                    if target.arrived {
                        self.path_finished = true;
                        report.path_finished = true;
                    }

                    if let Some(ref mut controller) = self.controller {
                        let global_vel = controller.compute(pose, &target.pose);
                        let local_vel = frame::global_to_local(pose.theta_rad, &global_vel);

                        vel = local_vel;
                        desired_local = frame::desired_local_channel(&local_vel);
                    } else {
                        warn!("No controller strategy configured, demanding zero velocity");
                    }

                    // The external avoidance velocity replaces the tracking
                    // result wholesale for this cycle, the path state above
                    // has still been advanced
                    if input_data.obstacle_detected {
                        vel = frame::avoidance_to_local(&input_data.obstacle_vel);
                        report.obstacle_override = true;
                    }
                }
            }

            // Paused and locked force zero regardless of anything computed
            // upstream
            Mode::GuidedPaused | Mode::ManualLock => (),

            Mode::ManualRun => {
                let gains = self.params.manual_axis_gains;
                vel = Velocity {
                    x: gains.x * input_data.op.axes[0],
                    y: gains.y * input_data.op.axes[1],
                    theta: gains.theta * input_data.op.axes[2],
                };
            }
        }

        // ---- SAFETY CLAMP ----

        let vel = saturate(&vel, self.params.max_speed);

        report.points_remaining = self.path.len();

        trace!(
            "MotionCtrl output: mode {:?}, vel ({:.3}, {:.3}, {:.3})",
            mode,
            vel.x,
            vel.y,
            vel.theta
        );

        Ok((
            OutputData {
                vel_demand: VelDemand {
                    vel,
                    run_status: self.switches.run_status(),
                },
                desired_local_vel: desired_local,
                goal_request,
            },
            report,
        ))
    }
}

impl MotionCtrl {
    /// Build the module directly from a parameter set.
    pub fn from_params(params: Params) -> Self {
        let controller = Some(controller_from_params(&params));

        Self {
            params,
            switches: ModeSwitches::default(),
            path: PathBuffer::default(),
            controller,
            path_finished: false,
        }
    }

    /// The latched arrival signal. Raised when the terminal waypoint is
    /// consumed, cleared when a new path is installed.
    pub fn path_finished(&self) -> bool {
        self.path_finished
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Saturate each axis of a velocity to the given magnitude bound.
///
/// Values beyond the bound are saturated, not rejected. Idempotent.
pub fn saturate(vel: &Velocity, bound: f64) -> Velocity {
    Velocity {
        x: clamp(&vel.x, &-bound, &bound),
        y: clamp(&vel.y, &-bound, &bound),
        theta: clamp(&vel.theta, &-bound, &bound),
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use util::module::State;

    /// Drive the module through a press-release pulse of the given button.
    fn pulse_button(ctrl: &mut MotionCtrl, set: fn(&mut OpInput, bool)) {
        let mut op = OpInput::default();
        set(&mut op, true);
        ctrl.proc(&InputData {
            op,
            ..Default::default()
        })
        .unwrap();

        let mut op = OpInput::default();
        set(&mut op, false);
        ctrl.proc(&InputData {
            op,
            ..Default::default()
        })
        .unwrap();
    }

    fn guided_active(ctrl: &mut MotionCtrl) {
        pulse_button(ctrl, |op, v| op.guided_btn = v);
        pulse_button(ctrl, |op, v| op.run_btn = v);
    }

    fn line_path() -> RefPath {
        RefPath {
            poses: vec![
                Pose::new(1.0, 0.0, 0.0),
                Pose::new(2.0, 0.0, 0.0),
                Pose::new(3.0, 0.0, 0.0),
            ],
        }
    }

    #[test]
    fn test_saturate_idempotent() {
        let vels = [
            Velocity::new(100.0, -100.0, 31.0),
            Velocity::new(12.0, -7.0, 0.0),
            Velocity::new(-30.0, 30.0, 29.999),
        ];

        for vel in vels.iter() {
            let once = saturate(vel, 30.0);
            let twice = saturate(&once, 30.0);
            assert_eq!(once, twice);
            assert!(once.x.abs() <= 30.0);
            assert!(once.y.abs() <= 30.0);
            assert!(once.theta.abs() <= 30.0);
        }
    }

    #[test]
    fn test_locked_forces_zero() {
        let mut ctrl = MotionCtrl::from_params(Params::default());

        // Manual lock (power-on state) with the sticks hard over still
        // demands zero
        let mut op = OpInput::default();
        op.axes = [1.0, 1.0, 1.0];
        let (output, report) = ctrl
            .proc(&InputData {
                op,
                ..Default::default()
            })
            .unwrap();

        assert_eq!(report.mode, Mode::ManualLock);
        assert_eq!(output.vel_demand.vel, Velocity::zero());
        assert!(!output.vel_demand.run_status);
    }

    #[test]
    fn test_manual_run_scales_axes() {
        let mut ctrl = MotionCtrl::from_params(Params::default());
        pulse_button(&mut ctrl, |op, v| op.run_btn = v);

        let mut op = OpInput::default();
        op.axes = [0.5, 0.5, 0.5];
        let (output, report) = ctrl
            .proc(&InputData {
                op,
                ..Default::default()
            })
            .unwrap();

        assert_eq!(report.mode, Mode::ManualRun);
        // Gains (-45, 45, 20) scaled by half then saturated at 30
        assert_eq!(output.vel_demand.vel, Velocity::new(-22.5, 22.5, 10.0));
        assert!(output.vel_demand.run_status);

        // Full stick deflection saturates the linear axes
        let mut op = OpInput::default();
        op.axes = [1.0, 1.0, 1.0];
        let (output, _) = ctrl
            .proc(&InputData {
                op,
                ..Default::default()
            })
            .unwrap();
        assert_eq!(output.vel_demand.vel, Velocity::new(-30.0, 30.0, 20.0));
    }

    #[test]
    fn test_guided_empty_path_forces_zero() {
        let mut ctrl = MotionCtrl::from_params(Params::default());
        guided_active(&mut ctrl);

        let (output, report) = ctrl
            .proc(&InputData {
                pose: Some(Pose::default()),
                ..Default::default()
            })
            .unwrap();

        assert_eq!(report.mode, Mode::GuidedActive);
        assert_eq!(output.vel_demand.vel, Velocity::zero());
        assert!(report.target.is_none());
    }

    #[test]
    fn test_guided_tracks_path() {
        let mut ctrl = MotionCtrl::from_params(Params::default());
        guided_active(&mut ctrl);

        let (output, report) = ctrl
            .proc(&InputData {
                pose: Some(Pose::default()),
                new_path: Some(line_path()),
                ..Default::default()
            })
            .unwrap();

        assert_eq!(report.mode, Mode::GuidedActive);
        assert_eq!(report.target.unwrap().x_m, 1.0);
        assert_ne!(output.vel_demand.vel, Velocity::zero());
        assert!(!report.path_finished);
    }

    #[test]
    fn test_paused_forces_zero_with_path_loaded() {
        let mut ctrl = MotionCtrl::from_params(Params::default());
        guided_active(&mut ctrl);

        // Load a path while active, then pause
        ctrl.proc(&InputData {
            pose: Some(Pose::default()),
            new_path: Some(line_path()),
            ..Default::default()
        })
        .unwrap();
        pulse_button(&mut ctrl, |op, v| op.run_btn = v);

        let (output, report) = ctrl
            .proc(&InputData {
                pose: Some(Pose::default()),
                ..Default::default()
            })
            .unwrap();

        assert_eq!(report.mode, Mode::GuidedPaused);
        assert_eq!(output.vel_demand.vel, Velocity::zero());
        assert_eq!(output.desired_local_vel, Velocity::zero());
    }

    #[test]
    fn test_obstacle_override() {
        let mut ctrl = MotionCtrl::from_params(Params::default());
        guided_active(&mut ctrl);

        // First cycle installs a path whose first waypoint is inside the
        // scaled obstacle offset (0.1 * 10 = 1.0) but outside the normal one
        ctrl.proc(&InputData {
            pose: Some(Pose::default()),
            new_path: Some(RefPath {
                poses: vec![
                    Pose::new(0.5, 0.0, 0.0),
                    Pose::new(2.0, 0.0, 0.0),
                    Pose::new(3.0, 0.0, 0.0),
                ],
            }),
            ..Default::default()
        })
        .unwrap();
        let points_before = {
            let (_, report) = ctrl
                .proc(&InputData {
                    pose: Some(Pose::default()),
                    ..Default::default()
                })
                .unwrap();
            report.points_remaining
        };

        // Obstacle flagged: the demand must equal the rotated external
        // vector, and the path must still have been advanced by the scan
        let avoidance = Velocity::new(5.0, 3.0, 1.0);
        let (output, report) = ctrl
            .proc(&InputData {
                pose: Some(Pose::default()),
                obstacle_detected: true,
                obstacle_vel: avoidance,
                ..Default::default()
            })
            .unwrap();

        assert!(report.obstacle_override);
        let expected = saturate(&frame::avoidance_to_local(&avoidance), 30.0);
        assert_eq!(output.vel_demand.vel, expected);

        // The obstacle scan consumes waypoints inside the scaled offset
        assert!(report.points_remaining < points_before);
    }

    #[test]
    fn test_arrival_and_clear_on_replacement() {
        let mut ctrl = MotionCtrl::from_params(Params::default());
        guided_active(&mut ctrl);

        // Single terminal waypoint, robot already inside both thresholds
        let (_, report) = ctrl
            .proc(&InputData {
                pose: Some(Pose::new(0.01, 0.01, 0.0)),
                new_path: Some(RefPath {
                    poses: vec![Pose::new(0.0, 0.0, 0.0)],
                }),
                ..Default::default()
            })
            .unwrap();

        assert!(report.path_finished);
        assert_eq!(report.points_remaining, 0);
        assert!(ctrl.path_finished());

        // Raised once only
        let (_, report) = ctrl
            .proc(&InputData {
                pose: Some(Pose::new(0.01, 0.01, 0.0)),
                ..Default::default()
            })
            .unwrap();
        assert!(!report.path_finished);
        assert!(ctrl.path_finished());

        // Installing a new path clears the latched signal
        let (_, _) = ctrl
            .proc(&InputData {
                pose: Some(Pose::new(0.01, 0.01, 0.0)),
                new_path: Some(line_path()),
                ..Default::default()
            })
            .unwrap();
        assert!(!ctrl.path_finished());
    }

    #[test]
    fn test_pid_reset_on_path_replacement() {
        use super::super::{PerAxis, StrategyKind};

        let mut params = Params::default();
        params.strategy = StrategyKind::Pid;
        params.pid_reset_per_path = true;
        params.pid_k_i = PerAxis {
            x: 0.5,
            y: 0.5,
            theta: 0.0,
        };

        let mut ctrl = MotionCtrl::from_params(params.clone());
        guided_active(&mut ctrl);

        let pose = Pose::new(0.0, 0.0, 0.0);
        // Single waypoint outside the arrival threshold so it is never
        // consumed and the error stays constant
        let path = RefPath {
            poses: vec![Pose::new(0.05, 0.0, 0.0)],
        };

        // Install the path and let the integral and prev-error state build
        // up over two cycles
        let (o1, _) = ctrl
            .proc(&InputData {
                pose: Some(pose),
                new_path: Some(path.clone()),
                ..Default::default()
            })
            .unwrap();
        let (o2, _) = ctrl
            .proc(&InputData {
                pose: Some(pose),
                ..Default::default()
            })
            .unwrap();
        assert_ne!(o2.vel_demand.vel, o1.vel_demand.vel);

        // Replacing the path resets the controller before it runs, so the
        // replacement cycle's output matches the very first one
        let (o3, _) = ctrl
            .proc(&InputData {
                pose: Some(pose),
                new_path: Some(path.clone()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(o3.vel_demand.vel, o1.vel_demand.vel);

        // With the policy off the accumulated state survives replacement
        params.pid_reset_per_path = false;
        let mut ctrl = MotionCtrl::from_params(params);
        guided_active(&mut ctrl);

        let (p1, _) = ctrl
            .proc(&InputData {
                pose: Some(pose),
                new_path: Some(path.clone()),
                ..Default::default()
            })
            .unwrap();
        ctrl.proc(&InputData {
            pose: Some(pose),
            ..Default::default()
        })
        .unwrap();
        let (p3, _) = ctrl
            .proc(&InputData {
                pose: Some(pose),
                new_path: Some(path),
                ..Default::default()
            })
            .unwrap();
        assert_ne!(p3.vel_demand.vel, p1.vel_demand.vel);
    }

    #[test]
    fn test_clear_path_command() {
        let mut ctrl = MotionCtrl::from_params(Params::default());
        guided_active(&mut ctrl);

        ctrl.proc(&InputData {
            pose: Some(Pose::default()),
            new_path: Some(line_path()),
            ..Default::default()
        })
        .unwrap();

        // Pulse the clear button: path emptied, tracking stops
        pulse_button(&mut ctrl, |op, v| op.clear_path_btn = v);

        let (output, report) = ctrl
            .proc(&InputData {
                pose: Some(Pose::default()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(report.points_remaining, 0);
        assert_eq!(output.vel_demand.vel, Velocity::zero());
    }

    #[test]
    fn test_return_to_origin_requests_goal() {
        let mut ctrl = MotionCtrl::from_params(Params::default());

        let mut op = OpInput::default();
        op.return_to_origin_btn = true;
        let (output, _) = ctrl
            .proc(&InputData {
                op,
                ..Default::default()
            })
            .unwrap();

        let goal = output.goal_request.unwrap();
        assert_eq!(goal.pose, Pose::default());
    }
}
