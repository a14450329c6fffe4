//! Control executable entry point.
//!
//! # Architecture
//!
//! The executable runs a single-threaded fixed-cadence control loop:
//!
//!     - Initialise the session, logger, parameters, modules and network
//!     - Main loop (200 Hz):
//!         - Drain the input subscribers into the data store snapshots
//!         - MotionCtrl processing
//!         - Publish the velocity demand and any goal request
//!         - Publish telemetry
//!         - Sleep out the remainder of the cycle period
//!
//! Inputs arrive over conflated subscriber sockets, so a read always yields
//! the most recent message on a topic or nothing. A quiet topic keeps its
//! last snapshot in the data store. Processing errors are logged and the
//! loop continues with a zero demand, only initialisation failures abort.

// ---------------------------------------------------------------------------
// USE MODULES FROM LIBRARY
// ---------------------------------------------------------------------------

use ctrl_lib::{data_store::DataStore, motion_ctrl, tm_server::TmServer};

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{eyre::WrapErr, Report};
use log::{debug, info, warn};
use std::thread;
use std::time::{Duration, Instant};

// Internal
use comms_if::{
    ctrl::{GoalRequest, ObstacleStatus, RefPath, VelDemand, Velocity},
    loc::Pose,
    net::{zmq, NetParams, Publisher, Subscriber},
    op::OpInput,
};
use util::{
    host,
    logger::{logger_init, LevelFilter},
    module::State,
    session::Session,
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Target period of one cycle.
const CYCLE_PERIOD_S: f64 = 0.005;

/// Number of cycles per second
const CYCLE_FREQUENCY_HZ: f64 = 1.0 / CYCLE_PERIOD_S;

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new("ctrl_exec", "sessions").wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(LevelFilter::Trace, &session).wrap_err("Failed to initialise logging")?;

    // Log information on this execution
    info!("Ground Robot Control Executable\n");
    info!(
        "Running on: {:#?}",
        host::get_uname().wrap_err("Failed to get host information")?
    );
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let net_params: NetParams =
        util::params::load("net.toml").wrap_err("Could not load net params")?;

    info!("Exec parameters loaded");

    // ---- INITIALISE DATASTORE ----

    info!("Initialising modules...");

    let mut ds = DataStore::default();

    // ---- INITIALISE MODULES ----

    ds.motion_ctrl
        .init("motion_ctrl.toml", &session)
        .wrap_err("Failed to initialise MotionCtrl")?;
    info!("MotionCtrl init complete");

    info!("Module initialisation complete\n");

    // ---- INITIALISE NETWORK ----

    info!("Initialising network");

    let zmq_ctx = zmq::Context::new();

    let pose_sub: Subscriber<Pose> = Subscriber::new(&zmq_ctx, &net_params.pose_endpoint)
        .wrap_err("Failed to initialise the pose subscriber")?;
    let path_sub: Subscriber<RefPath> = Subscriber::new(&zmq_ctx, &net_params.path_endpoint)
        .wrap_err("Failed to initialise the path subscriber")?;
    let op_sub: Subscriber<OpInput> = Subscriber::new(&zmq_ctx, &net_params.op_endpoint)
        .wrap_err("Failed to initialise the operator input subscriber")?;
    let obstacle_status_sub: Subscriber<ObstacleStatus> =
        Subscriber::new(&zmq_ctx, &net_params.obstacle_status_endpoint)
            .wrap_err("Failed to initialise the obstacle status subscriber")?;
    let obstacle_vel_sub: Subscriber<Velocity> =
        Subscriber::new(&zmq_ctx, &net_params.obstacle_vel_endpoint)
            .wrap_err("Failed to initialise the obstacle velocity subscriber")?;

    let vel_demand_pub: Publisher<VelDemand> =
        Publisher::new(&zmq_ctx, &net_params.vel_demand_endpoint)
            .wrap_err("Failed to initialise the velocity demand publisher")?;
    let goal_pub: Publisher<GoalRequest> = Publisher::new(&zmq_ctx, &net_params.goal_endpoint)
        .wrap_err("Failed to initialise the goal publisher")?;

    let tm_server = TmServer::new(&zmq_ctx, &net_params).wrap_err("Failed to initialise TmServer")?;

    info!("Network initialisation complete");

    // ---- MAIN LOOP ----

    info!("Begining main loop\n");

    loop {
        // Get cycle start time
        let cycle_start_instant = Instant::now();

        // Clear items that need wiping at the start of the cycle
        ds.cycle_start(CYCLE_FREQUENCY_HZ);

        // ---- DATA INPUT ----

        // Drain the subscribers into the snapshots. A topic with nothing new
        // keeps its previous value, a receive error is logged and the stale
        // snapshot reused.
        match pose_sub.latest() {
            Ok(Some(pose)) => ds.robot_pose = Some(pose),
            Ok(None) => (),
            Err(e) => warn!("Could not read the pose topic: {}", e),
        }

        // The path is the exception: it is handed to MotionCtrl only on the
        // cycle it arrives, receipt replaces the buffered path wholesale
        let mut new_path = None;
        match path_sub.latest() {
            Ok(Some(path)) => {
                info!("New path received ({} poses)", path.poses.len());
                new_path = Some(path);
            }
            Ok(None) => (),
            Err(e) => warn!("Could not read the path topic: {}", e),
        }

        match op_sub.latest() {
            Ok(Some(op)) => ds.op_input = op,
            Ok(None) => (),
            Err(e) => warn!("Could not read the operator input topic: {}", e),
        }

        match obstacle_status_sub.latest() {
            Ok(Some(status)) => ds.obstacle_detected = status.detected,
            Ok(None) => (),
            Err(e) => warn!("Could not read the obstacle status topic: {}", e),
        }

        match obstacle_vel_sub.latest() {
            Ok(Some(vel)) => ds.obstacle_vel = vel,
            Ok(None) => (),
            Err(e) => warn!("Could not read the obstacle velocity topic: {}", e),
        }

        // ---- CONTROL ALGORITHM PROCESSING ----

        ds.motion_ctrl_input = motion_ctrl::InputData {
            pose: ds.robot_pose,
            new_path,
            op: ds.op_input,
            obstacle_detected: ds.obstacle_detected,
            obstacle_vel: ds.obstacle_vel,
        };

        match ds.motion_ctrl.proc(&ds.motion_ctrl_input) {
            Ok((o, r)) => {
                ds.motion_ctrl_output = o;
                ds.motion_ctrl_status_rpt = r;
            }
            Err(e) => {
                // MotionCtrl errors are recoverable, the default (zero)
                // output stands for this cycle
                warn!("Error during MotionCtrl processing: {}", e)
            }
        };

        // ---- DATA OUTPUT ----

        match vel_demand_pub.send(&ds.motion_ctrl_output.vel_demand) {
            Ok(_) => (),
            Err(e) => warn!("Could not publish the velocity demand: {}", e),
        }

        if let Some(ref goal) = ds.motion_ctrl_output.goal_request {
            info!(
                "Requesting path to ({:.2}, {:.2})",
                goal.pose.x_m, goal.pose.y_m
            );
            match goal_pub.send(goal) {
                Ok(_) => (),
                Err(e) => warn!("Could not publish the goal request: {}", e),
            }
        }

        // ---- TELEMETRY ----

        match tm_server.send(&ds) {
            Ok(_) => (),
            Err(e) => warn!("TmServer error: {}", e),
        };

        if ds.is_1_hz_cycle {
            debug!(
                "Mode {:?}, {} points remaining",
                ds.motion_ctrl_status_rpt.mode, ds.motion_ctrl_status_rpt.points_remaining
            );
        }

        // ---- CYCLE MANAGEMENT ----

        let cycle_dur = Instant::now() - cycle_start_instant;

        // Get sleep duration
        match Duration::from_secs_f64(CYCLE_PERIOD_S).checked_sub(cycle_dur) {
            Some(d) => {
                ds.num_consec_cycle_overruns = 0;
                thread::sleep(d);
            }
            None => {
                warn!(
                    "Cycle overran by {:.06} s",
                    cycle_dur.as_secs_f64() - CYCLE_PERIOD_S
                );
                ds.num_consec_cycle_overruns += 1;
            }
        }

        // Increment cycle counter
        ds.num_cycles += 1;
    }
}
