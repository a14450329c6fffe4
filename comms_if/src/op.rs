//! # Operator input messages

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Decoded operator input.
///
/// The input device mapping (which stick or button maps to which field)
/// belongs to the external teleoperation layer. The control core only sees
/// axis values and button levels, and performs its own edge detection on the
/// levels.
#[derive(Debug, Default, Copy, Clone, Serialize, Deserialize)]
pub struct OpInput {
    /// Teleoperation axes in the order (x, y, theta), each in [-1, 1].
    pub axes: [f64; 3],

    /// Level of the run/lock toggle button.
    pub run_btn: bool,

    /// Level of the guided/manual toggle button.
    pub guided_btn: bool,

    /// Level of the clear-path button.
    pub clear_path_btn: bool,

    /// Level of the return-to-origin button.
    pub return_to_origin_btn: bool,
}
