//! Modifier state
//!
//! The only mutable state shared by the dispatcher and the feedback side.
//! Callers go through [`ModifierState`] so another modifier layout can be
//! swapped in without touching them.

use tracing::debug;

/// Read/write access to the session modifiers
pub trait ModifierState: Send {
    /// Whether shift is currently held
    fn shift_held(&self) -> bool;

    /// Record a press or release edge of the shift button
    fn on_shift_edge(&mut self, is_press: bool);
}

/// Plain shift flag driven by the last seen edge
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShiftState {
    shift_held: bool,
}

impl ShiftState {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ModifierState for ShiftState {
    fn shift_held(&self) -> bool {
        self.shift_held
    }

    fn on_shift_edge(&mut self, is_press: bool) {
        if self.shift_held != is_press {
            debug!("Shift {}", if is_press { "held" } else { "released" });
        }
        self.shift_held = is_press;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shift_follows_last_edge() {
        let mut state = ShiftState::new();
        assert!(!state.shift_held());

        state.on_shift_edge(true);
        assert!(state.shift_held());

        // Repeated press keeps it held
        state.on_shift_edge(true);
        assert!(state.shift_held());

        state.on_shift_edge(false);
        assert!(!state.shift_held());
    }
}
