//! # TM Server

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::Serialize;

use comms_if::{
    ctrl::{VelDemand, Velocity},
    net::{zmq, NetError, NetParams, Publisher},
};

use crate::data_store::DataStore;
use crate::motion_ctrl;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Telemetry server
pub struct TmServer {
    publisher: Publisher<TmPacket>,
}

/// Telemetry packet that is output by the server once per cycle.
#[derive(Debug, Serialize)]
pub struct TmPacket {
    pub elapsed_time_s: f64,

    pub motion_ctrl_status_rpt: motion_ctrl::StatusReport,

    pub vel_demand: VelDemand,

    pub desired_local_vel: Velocity,

    pub num_consec_cycle_overruns: u64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl TmServer {
    /// Create a new instance of the TM Server, bound to the TM endpoint.
    pub fn new(ctx: &zmq::Context, params: &NetParams) -> Result<Self, NetError> {
        let publisher = Publisher::new(ctx, &params.tm_endpoint)?;

        Ok(Self { publisher })
    }

    /// Publish the telemetry packet for this cycle.
    pub fn send(&self, ds: &DataStore) -> Result<(), NetError> {
        self.publisher.send(&TmPacket::from_datastore(ds))
    }
}

impl TmPacket {
    pub fn from_datastore(ds: &DataStore) -> Self {
        Self {
            elapsed_time_s: ds.elapsed_time_s,
            motion_ctrl_status_rpt: ds.motion_ctrl_status_rpt,
            vel_demand: ds.motion_ctrl_output.vel_demand,
            desired_local_vel: ds.motion_ctrl_output.desired_local_vel,
            num_consec_cycle_overruns: ds.num_consec_cycle_overruns,
        }
    }
}
