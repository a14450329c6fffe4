//! # Operating mode state machine
//!
//! The operating mode is a projection of two independent booleans, the
//! guided/manual switch and the run/lock switch. Each flips on a
//! press-release edge of its source button, never on level, so holding a
//! button has no effect beyond the single transition.
//!
//! The edge detection happens here, in the core, on the button levels
//! delivered with the operator input snapshot. The same mechanism also
//! fires the clear-path and return-to-origin commands.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Serialize;

// Internal
use comms_if::op::OpInput;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// The operating mode of the control core.
///
/// Derived each cycle from the two toggles, not itself stored.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub enum Mode {
    /// Teleoperation, axes drive the robot directly
    ManualRun,

    /// Teleoperation selected but locked, output forced to zero
    ManualLock,

    /// Autonomous path tracking
    GuidedActive,

    /// Autonomous mode selected but paused, output forced to zero
    GuidedPaused,
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Edge-detected state of the operator switches.
#[derive(Debug, Default, Clone)]
pub struct ModeSwitches {
    /// Guided (true) vs manual (false)
    guided: bool,

    /// Run (true) vs lock/pause (false)
    run: bool,

    prev_guided_btn: bool,
    prev_run_btn: bool,
    prev_clear_btn: bool,
    prev_origin_btn: bool,
}

/// One-shot commands fired by this cycle's button edges.
#[derive(Debug, Default, Copy, Clone)]
pub struct ModeEvents {
    /// Clear the current path buffer
    pub clear_path: bool,

    /// Clear the path and request a path back to the origin
    pub return_to_origin: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Mode {
    fn default() -> Self {
        // Both toggles start false: locked manual, the safe power-on state
        Mode::ManualLock
    }
}

impl ModeSwitches {
    /// Process this cycle's button levels, flipping toggles and firing
    /// command events on edges.
    pub fn update(&mut self, op: &OpInput) -> ModeEvents {
        let mut events = ModeEvents::default();

        // Toggles and clear fire on release (press-release edge), the
        // return-to-origin command fires on press, matching the pad mapping
        if !op.guided_btn && self.prev_guided_btn {
            self.guided = !self.guided;
        }
        self.prev_guided_btn = op.guided_btn;

        if !op.run_btn && self.prev_run_btn {
            self.run = !self.run;
        }
        self.prev_run_btn = op.run_btn;

        if !op.clear_path_btn && self.prev_clear_btn {
            events.clear_path = true;
        }
        self.prev_clear_btn = op.clear_path_btn;

        if op.return_to_origin_btn && !self.prev_origin_btn {
            events.return_to_origin = true;
        }
        self.prev_origin_btn = op.return_to_origin_btn;

        events
    }

    /// Project the toggle pair onto the operating mode.
    pub fn mode(&self) -> Mode {
        match (self.guided, self.run) {
            (true, true) => Mode::GuidedActive,
            (true, false) => Mode::GuidedPaused,
            (false, true) => Mode::ManualRun,
            (false, false) => Mode::ManualLock,
        }
    }

    /// The run/lock toggle level, mirrored into the velocity demand.
    pub fn run_status(&self) -> bool {
        self.run
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    /// Press and release a button through two update calls.
    fn pulse(switches: &mut ModeSwitches, mut op: OpInput, set: fn(&mut OpInput, bool)) -> ModeEvents {
        set(&mut op, true);
        switches.update(&op);
        set(&mut op, false);
        switches.update(&op)
    }

    #[test]
    fn test_toggle_transitions() {
        let mut switches = ModeSwitches::default();
        assert_eq!(switches.mode(), Mode::ManualLock);

        // Run toggle: ManualLock -> ManualRun
        pulse(&mut switches, OpInput::default(), |op, v| op.run_btn = v);
        assert_eq!(switches.mode(), Mode::ManualRun);

        // Guided toggle: ManualRun -> GuidedActive
        pulse(&mut switches, OpInput::default(), |op, v| op.guided_btn = v);
        assert_eq!(switches.mode(), Mode::GuidedActive);

        // Run toggle again: GuidedActive -> GuidedPaused
        pulse(&mut switches, OpInput::default(), |op, v| op.run_btn = v);
        assert_eq!(switches.mode(), Mode::GuidedPaused);

        // Guided toggle again: GuidedPaused -> ManualLock
        pulse(&mut switches, OpInput::default(), |op, v| op.guided_btn = v);
        assert_eq!(switches.mode(), Mode::ManualLock);
    }

    #[test]
    fn test_level_does_not_toggle() {
        let mut switches = ModeSwitches::default();

        // Holding the button across many cycles must not flip the toggle
        let mut op = OpInput::default();
        op.run_btn = true;
        for _ in 0..10 {
            switches.update(&op);
        }
        assert_eq!(switches.mode(), Mode::ManualLock);

        // Only the release flips it, exactly once
        op.run_btn = false;
        switches.update(&op);
        assert_eq!(switches.mode(), Mode::ManualRun);
        switches.update(&op);
        assert_eq!(switches.mode(), Mode::ManualRun);
    }

    #[test]
    fn test_command_events() {
        let mut switches = ModeSwitches::default();

        // Clear fires on release
        let events = pulse(&mut switches, OpInput::default(), |op, v| {
            op.clear_path_btn = v
        });
        assert!(events.clear_path);
        assert!(!events.return_to_origin);

        // Return-to-origin fires on press
        let mut op = OpInput::default();
        op.return_to_origin_btn = true;
        let events = switches.update(&op);
        assert!(events.return_to_origin);

        // And not again while held
        let events = switches.update(&op);
        assert!(!events.return_to_origin);
    }
}
