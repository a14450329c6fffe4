//! # Path buffer
//!
//! The path buffer holds the waypoints of the commanded reference path,
//! front-to-back in traversal order. Between path-replacement events the
//! control core owns the buffer exclusively: the only mutations are the
//! consuming pops performed by target selection, and wholesale replacement
//! when a new reference path arrives. These never interleave within a cycle.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use std::collections::VecDeque;

// Internal
use comms_if::loc::Pose;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Ordered queue of waypoints, consumed strictly from the front.
#[derive(Debug, Default, Clone)]
pub struct PathBuffer {
    points: VecDeque<Pose>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Potential errors raised by the path buffer.
#[derive(Debug, thiserror::Error)]
pub enum PathBufferError {
    /// A waypoint was requested from an empty buffer. Callers must check
    /// emptiness before starting a target-selection scan.
    #[error("Waypoint requested from an empty path")]
    EmptyPath,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl PathBuffer {
    /// Discard the current contents and install the given waypoint sequence.
    pub fn replace(&mut self, points: &[Pose]) {
        self.points.clear();
        self.points.extend(points.iter().copied());
    }

    /// Empty the buffer.
    pub fn clear(&mut self) {
        self.points.clear();
    }

    /// Return the earliest unconsumed waypoint without removing it.
    pub fn front(&self) -> Result<&Pose, PathBufferError> {
        self.points.front().ok_or(PathBufferError::EmptyPath)
    }

    /// Remove and return the earliest waypoint, or `None` if the buffer is
    /// empty.
    pub fn pop_front(&mut self) -> Option<Pose> {
        self.points.pop_front()
    }

    /// Number of unconsumed waypoints.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
