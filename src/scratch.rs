//! Jog wheel scratch control
//!
//! Touching the platter switches the deck into relative-motion tracking;
//! releasing it switches back. Wheel ticks only reach the host while tracking.

use crate::codec::CHANNEL_COUNT;
use crate::host::{HostParams, ScratchParams};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// Wheel value that means "no movement"
pub const JOG_CENTER: u8 = 0x40;

/// Scratch tuning, overridable from the config file
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ScratchProfile {
    pub resolution: u32,
    pub rpm: f64,
    /// Platter speed while shift is held (fast search)
    pub shift_rpm: f64,
    pub alpha: f64,
    /// beta = alpha / beta_divisor
    pub beta_divisor: f64,
    pub ramped: bool,
}

impl Default for ScratchProfile {
    fn default() -> Self {
        Self {
            resolution: 128,
            rpm: 150.0,
            shift_rpm: 30.0,
            alpha: 1.0 / 8.0,
            beta_divisor: 32.0,
            ramped: true,
        }
    }
}

impl ScratchProfile {
    /// Host parameters for a touch, with or without shift
    pub fn params(&self, shift_held: bool) -> ScratchParams {
        ScratchParams {
            resolution: self.resolution,
            rpm: if shift_held { self.shift_rpm } else { self.rpm },
            alpha: self.alpha,
            beta: self.alpha / self.beta_divisor,
            ramped: self.ramped,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum JogState {
    #[default]
    Idle,
    Tracking,
}

/// Per-deck jog state machine
#[derive(Debug, Clone)]
pub struct JogController {
    profile: ScratchProfile,
    decks: [JogState; CHANNEL_COUNT as usize],
}

impl JogController {
    pub fn new(profile: ScratchProfile) -> Self {
        Self {
            profile,
            decks: [JogState::Idle; CHANNEL_COUNT as usize],
        }
    }

    fn slot(deck: u8) -> Option<usize> {
        (1..=CHANNEL_COUNT)
            .contains(&deck)
            .then(|| usize::from(deck - 1))
    }

    pub fn state(&self, deck: u8) -> JogState {
        Self::slot(deck)
            .map(|i| self.decks[i])
            .unwrap_or_default()
    }

    /// Platter touched (`is_press`) or let go
    pub fn touch(&mut self, host: &mut dyn HostParams, deck: u8, is_press: bool, shift_held: bool) {
        let Some(slot) = Self::slot(deck) else {
            return;
        };

        if is_press {
            host.scratch_enable(deck, &self.profile.params(shift_held));
            self.decks[slot] = JogState::Tracking;
            debug!("Deck {} jog: tracking (shift={})", deck, shift_held);
        } else {
            host.scratch_disable(deck);
            self.decks[slot] = JogState::Idle;
            debug!("Deck {} jog: idle", deck);
        }
    }

    /// Wheel moved; returns the delta forwarded to the host, if any
    pub fn turn(&mut self, host: &mut dyn HostParams, deck: u8, value: u8) -> Option<i32> {
        if self.state(deck) != JogState::Tracking || !host.is_scratch_active(deck) {
            trace!("Deck {} jog tick dropped (not tracking)", deck);
            return None;
        }

        let delta = i32::from(value) - i32::from(JOG_CENTER);
        host.scratch_tick(deck, delta);
        Some(delta)
    }

    /// Stop tracking on every deck
    pub fn release_all(&mut self, host: &mut dyn HostParams) {
        for deck in 1..=CHANNEL_COUNT {
            if self.state(deck) == JogState::Tracking {
                self.touch(host, deck, false, false);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::ConsoleHost;

    #[test]
    fn test_profile_params() {
        let profile = ScratchProfile::default();

        let normal = profile.params(false);
        assert_eq!(normal.resolution, 128);
        assert_eq!(normal.rpm, 150.0);
        assert_eq!(normal.alpha, 0.125);
        assert_eq!(normal.beta, 0.125 / 32.0);
        assert!(normal.ramped);

        assert_eq!(profile.params(true).rpm, 30.0);
    }

    #[test]
    fn test_ticks_only_while_tracking() {
        let mut host = ConsoleHost::new();
        let mut jog = JogController::new(ScratchProfile::default());

        assert_eq!(jog.turn(&mut host, 1, 0x42), None);

        jog.touch(&mut host, 1, true, false);
        assert_eq!(jog.state(1), JogState::Tracking);
        assert_eq!(jog.turn(&mut host, 1, 0x42), Some(2));
        assert_eq!(jog.turn(&mut host, 1, 0x3D), Some(-3));
        assert_eq!(jog.turn(&mut host, 1, JOG_CENTER), Some(0));
        // Other deck is still idle
        assert_eq!(jog.turn(&mut host, 2, 0x42), None);

        jog.touch(&mut host, 1, false, false);
        assert_eq!(jog.state(1), JogState::Idle);
        assert_eq!(jog.turn(&mut host, 1, 0x42), None);

        assert_eq!(host.ticks(), &[(1, 2), (1, -3), (1, 0)]);
    }

    #[test]
    fn test_out_of_range_deck_is_ignored() {
        let mut host = ConsoleHost::new();
        let mut jog = JogController::new(ScratchProfile::default());

        jog.touch(&mut host, 3, true, false);
        assert!(!host.is_scratch_active(3));
        assert_eq!(jog.state(3), JogState::Idle);
    }

    #[test]
    fn test_release_all() {
        let mut host = ConsoleHost::new();
        let mut jog = JogController::new(ScratchProfile::default());

        jog.touch(&mut host, 1, true, false);
        jog.touch(&mut host, 2, true, true);
        jog.release_all(&mut host);

        assert!(!host.is_scratch_active(1));
        assert!(!host.is_scratch_active(2));
        assert_eq!(jog.state(2), JogState::Idle);
    }
}
