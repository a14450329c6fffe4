//! # Network Module
//!
//! This module provides a thin latest-value publish/subscribe layer over
//! ZMQ, the networking library chosen for the software.
//!
//! Messages are JSON-serialised. Subscribers are conflated, so a slow cycle
//! only ever sees the most recent message on a topic. This implements the
//! latest-snapshot semantics the control loop relies on: a read never
//! blocks, and a stale snapshot is reused if no new message has arrived.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::marker::PhantomData;

use log::warn;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

// Export zmq
pub use zmq;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Network endpoint parameters, loaded from `net.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct NetParams {
    /// Endpoint publishing the robot's pose estimate.
    pub pose_endpoint: String,

    /// Endpoint publishing reference paths from the planner.
    pub path_endpoint: String,

    /// Endpoint publishing decoded operator input.
    pub op_endpoint: String,

    /// Endpoint publishing the obstacle-detected flag.
    pub obstacle_status_endpoint: String,

    /// Endpoint publishing the obstacle-avoidance velocity.
    pub obstacle_vel_endpoint: String,

    /// Endpoint on which the velocity demand is published.
    pub vel_demand_endpoint: String,

    /// Endpoint on which goal requests are published.
    pub goal_endpoint: String,

    /// Endpoint on which telemetry is published.
    pub tm_endpoint: String,
}

/// A publishing socket for a single message type.
///
/// The publisher binds its endpoint, subscribers connect to it.
pub struct Publisher<T> {
    socket: zmq::Socket,

    _marker: PhantomData<T>,
}

/// A subscribing socket for a single message type.
///
/// The socket is conflated: only the most recent unread message is kept by
/// zmq, older ones are dropped. `latest()` never blocks.
pub struct Subscriber<T> {
    socket: zmq::Socket,

    _marker: PhantomData<T>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum NetError {
    #[error("Error creating the socket: {0}")]
    CreateSocketError(zmq::Error),

    #[error("Could not set the {0} socket option: {1}")]
    SocketOptionError(&'static str, zmq::Error),

    #[error("Could not bind or connect the socket: {0}")]
    EndpointError(zmq::Error),

    #[error("Could not send the message: {0}")]
    SendError(zmq::Error),

    #[error("Could not receive the message: {0}")]
    RecvError(zmq::Error),

    #[error("Could not serialise the message: {0}")]
    SerialiseError(serde_json::Error),

    #[error("Could not deserialise the message: {0}")]
    DeserialiseError(serde_json::Error),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl<T: Serialize> Publisher<T> {
    /// Create a new publisher bound to the given endpoint.
    pub fn new(ctx: &zmq::Context, endpoint: &str) -> Result<Self, NetError> {
        let socket = ctx.socket(zmq::PUB).map_err(NetError::CreateSocketError)?;

        socket
            .set_linger(1)
            .map_err(|e| NetError::SocketOptionError("linger", e))?;

        socket.bind(endpoint).map_err(NetError::EndpointError)?;

        Ok(Self {
            socket,
            _marker: PhantomData,
        })
    }

    /// Publish a message.
    pub fn send(&self, msg: &T) -> Result<(), NetError> {
        let json = serde_json::to_string(msg).map_err(NetError::SerialiseError)?;

        self.socket
            .send(json.as_str(), zmq::DONTWAIT)
            .map_err(NetError::SendError)
    }
}

impl<T: DeserializeOwned> Subscriber<T> {
    /// Create a new subscriber connected to the given endpoint.
    pub fn new(ctx: &zmq::Context, endpoint: &str) -> Result<Self, NetError> {
        let socket = ctx.socket(zmq::SUB).map_err(NetError::CreateSocketError)?;

        // Conflate must be set before connecting for it to apply to the
        // incoming pipe
        socket
            .set_conflate(true)
            .map_err(|e| NetError::SocketOptionError("conflate", e))?;
        socket
            .set_linger(1)
            .map_err(|e| NetError::SocketOptionError("linger", e))?;

        socket.connect(endpoint).map_err(NetError::EndpointError)?;

        socket
            .set_subscribe(b"")
            .map_err(|e| NetError::SocketOptionError("subscribe", e))?;

        Ok(Self {
            socket,
            _marker: PhantomData,
        })
    }

    /// Get the latest message on this topic, or `None` if nothing new has
    /// arrived since the last call.
    ///
    /// Never blocks.
    pub fn latest(&self) -> Result<Option<T>, NetError> {
        match self.socket.recv_string(zmq::DONTWAIT) {
            Ok(Ok(json)) => serde_json::from_str(&json)
                .map(Some)
                .map_err(NetError::DeserialiseError),
            Ok(Err(_)) => {
                // Non-utf8 message, nothing sensible to do but drop it
                warn!("Dropping a non-utf8 message");
                Ok(None)
            }
            Err(zmq::Error::EAGAIN) => Ok(None),
            Err(e) => Err(NetError::RecvError(e)),
        }
    }
}
