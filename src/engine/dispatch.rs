//! Action dispatcher: decoded controls to host parameter writes

use super::Engine;
use crate::addressing::{
    beats_to_samples, deck_group, hotcue_key, sampler_group, SAMPLER_COUNT, UNSET_POSITION,
};
use crate::codec::{is_active, ControlEvent, Edge};
use crate::control_mapping::Control;
use crate::host::HostParams;
use tracing::{debug, trace};

/// Sampler volume change per knob detent while shift is held
pub const SAMPLER_VOLUME_STEP: f64 = 1.0 / 16.0;

/// Relative encoder value meaning "forward"
const KNOB_FORWARD: u8 = 0x01;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Up,
    Down,
}

impl<H: HostParams> Engine<H> {
    pub(super) fn dispatch(&mut self, event: ControlEvent) {
        let shift = self.modifiers.shift_held();
        let group = resolve_group(event.control, event.channel);
        let host: &mut dyn HostParams = &mut self.host;

        debug!(
            "{} ch{} {:?} (shift={})",
            event.control, event.channel, event.edge, shift
        );

        match event.control {
            Control::Shift => {
                if event.edge == Edge::Value {
                    return;
                }
                self.modifiers.on_shift_edge(event.is_press());
                self.refresh_modifier_feedback();
            },
            Control::Hotcue(cue) => hotcue(host, shift, &event, &group, cue),
            Control::BendUp => bend_or_seek(host, shift, &event, &group, Direction::Up),
            Control::BendDown => bend_or_seek(host, shift, &event, &group, Direction::Down),
            Control::Sampler(_) => sampler_trigger(host, shift, &event, &group),
            Control::JogTouch => {
                if event.edge != Edge::Value {
                    self.jog
                        .touch(&mut self.host, event.channel, event.is_press(), shift);
                }
            },
            Control::JogTurn => {
                self.jog.turn(&mut self.host, event.channel, event.value);
            },
            Control::SelectKnob => select_knob(host, &event, &group),
            Control::BeatsKnob => beats_knob(host, shift, &event, &group),
            Control::Play => toggle(host, &event, &group, "play"),
            Control::Keylock => toggle(host, &event, &group, "keylock"),
            Control::Pfl => toggle(host, &event, &group, "pfl"),
            Control::Cue => momentary(host, &event, &group, "cue_default"),
            Control::LoopIn => momentary(host, &event, &group, "loop_in"),
            Control::LoopOut => momentary(host, &event, &group, "loop_out"),
            Control::Sync => trigger(host, &event, &group, "beatsync"),
            Control::Reloop => trigger(host, &event, &group, "reloop_exit"),
            Control::BeatLoop(beats) => {
                trigger(host, &event, &group, &format!("beatloop_{}_toggle", beats))
            },
        }
    }
}

/// Host group a control acts on
fn resolve_group(control: Control, channel: u8) -> String {
    match control {
        Control::Sampler(n) => sampler_group(n),
        Control::SelectKnob => "[Playlist]".to_string(),
        Control::Shift => "[Master]".to_string(),
        _ => deck_group(channel),
    }
}

/// Press: activate the cue, or clear it under shift. Release always
/// deactivates so the activate flag can never stay stuck.
fn hotcue(host: &mut dyn HostParams, shift: bool, event: &ControlEvent, group: &str, cue: u8) {
    match event.edge {
        Edge::Press if shift => host.set_value(group, &hotcue_key(cue, "clear"), 1.0),
        Edge::Press => host.set_value(group, &hotcue_key(cue, "activate"), 1.0),
        Edge::Release => host.set_value(group, &hotcue_key(cue, "activate"), 0.0),
        Edge::Value => {},
    }
}

/// Held: temporary pitch bend, or fast seek under shift. Release clears
/// both, whichever one the press started.
fn bend_or_seek(
    host: &mut dyn HostParams,
    shift: bool,
    event: &ControlEvent,
    group: &str,
    direction: Direction,
) {
    let (bend, seek) = match direction {
        Direction::Up => ("rate_temp_up", "fwd"),
        Direction::Down => ("rate_temp_down", "back"),
    };

    match event.edge {
        Edge::Press if shift => host.set_value(group, seek, 1.0),
        Edge::Press => host.set_value(group, bend, 1.0),
        Edge::Release => {
            host.set_value(group, seek, 0.0);
            host.set_value(group, bend, 0.0);
        },
        Edge::Value => {},
    }
}

/// Press: play the sample from its start, or stop it under shift
fn sampler_trigger(host: &mut dyn HostParams, shift: bool, event: &ControlEvent, group: &str) {
    if event.edge != Edge::Press {
        return;
    }

    let key = if shift { "start_stop" } else { "start_play" };
    host.set_value(group, key, 1.0);
}

fn select_knob(host: &mut dyn HostParams, event: &ControlEvent, group: &str) {
    if event.value == KNOB_FORWARD {
        host.set_value(group, "SelectNextTrack", 1.0);
    } else {
        host.set_value(group, "SelectPrevTrack", 1.0);
    }
}

/// Turn: jump one beat, or step every sampler volume under shift
fn beats_knob(host: &mut dyn HostParams, shift: bool, event: &ControlEvent, group: &str) {
    let forward = event.value == KNOB_FORWARD;

    if shift {
        for sampler in 1..=SAMPLER_COUNT {
            step_sampler_volume(host, sampler, forward, SAMPLER_VOLUME_STEP);
        }
    } else {
        beat_jump(host, group, 1.0, forward);
    }
}

/// Move the play position by a number of beats
///
/// Skipped when bpm, sample rate, track length or the current position are
/// unusable. Returns the new position when a jump happened.
pub fn beat_jump(host: &mut dyn HostParams, group: &str, beats: f64, forward: bool) -> Option<f64> {
    let position = host.get_value(group, "playposition");
    let track_samples = host.get_value(group, "track_samples");
    let bpm = host.get_value(group, "bpm");
    let sample_rate = host.get_value(group, "track_samplerate");

    let usable = |v: f64| v.is_finite() && v > 0.0;
    if !usable(bpm) || !usable(track_samples) || !usable(sample_rate) {
        trace!("{} beat jump skipped (bpm={}, samples={})", group, bpm, track_samples);
        return None;
    }
    if !position.is_finite() || position == UNSET_POSITION {
        trace!("{} beat jump skipped (no position)", group);
        return None;
    }

    let offset = beats_to_samples(beats, bpm, sample_rate) / track_samples;
    let target = if forward {
        position + offset
    } else {
        position - offset
    };
    let target = target.clamp(0.0, 1.0);

    host.set_value(group, "playposition", target);
    Some(target)
}

/// Step a sampler's volume, clamped to 0.0..=1.0
pub fn step_sampler_volume(host: &mut dyn HostParams, sampler: u8, forward: bool, step: f64) -> f64 {
    let group = sampler_group(sampler);
    let current = host.get_value(&group, "volume");
    let target = if forward {
        current + step
    } else {
        current - step
    };
    let target = target.clamp(0.0, 1.0);

    host.set_value(&group, "volume", target);
    target
}

fn toggle(host: &mut dyn HostParams, event: &ControlEvent, group: &str, key: &str) {
    if event.edge != Edge::Press {
        return;
    }
    let next = if is_active(host.get_value(group, key)) {
        0.0
    } else {
        1.0
    };
    host.set_value(group, key, next);
}

fn momentary(host: &mut dyn HostParams, event: &ControlEvent, group: &str, key: &str) {
    match event.edge {
        Edge::Press => host.set_value(group, key, 1.0),
        Edge::Release => host.set_value(group, key, 0.0),
        Edge::Value => {},
    }
}

fn trigger(host: &mut dyn HostParams, event: &ControlEvent, group: &str, key: &str) {
    if event.edge == Edge::Press {
        host.set_value(group, key, 1.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::ConsoleHost;

    fn loaded_deck(host: &mut ConsoleHost, position: f64) {
        host.set_value("[Channel1]", "playposition", position);
        host.set_value("[Channel1]", "track_samples", 44100.0 * 200.0);
        host.set_value("[Channel1]", "track_samplerate", 44100.0);
        host.set_value("[Channel1]", "bpm", 120.0);
    }

    #[test]
    fn test_beat_jump_forward_and_back() {
        let mut host = ConsoleHost::new();
        loaded_deck(&mut host, 0.25);

        let offset = (60.0 / 120.0) * 44100.0 * 2.0 / (44100.0 * 200.0);

        assert_eq!(beat_jump(&mut host, "[Channel1]", 1.0, true), Some(0.25 + offset));
        assert_eq!(host.get_value("[Channel1]", "playposition"), 0.25 + offset);

        beat_jump(&mut host, "[Channel1]", 1.0, false);
        let back = host.get_value("[Channel1]", "playposition");
        assert!((back - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_beat_jump_guards() {
        let mut host = ConsoleHost::new();
        loaded_deck(&mut host, 0.5);

        host.set_value("[Channel1]", "bpm", 0.0);
        assert_eq!(beat_jump(&mut host, "[Channel1]", 1.0, true), None);
        assert_eq!(host.get_value("[Channel1]", "playposition"), 0.5);

        host.set_value("[Channel1]", "bpm", 120.0);
        host.set_value("[Channel1]", "track_samples", 0.0);
        assert_eq!(beat_jump(&mut host, "[Channel1]", 1.0, true), None);

        host.set_value("[Channel1]", "track_samples", 44100.0 * 200.0);
        host.set_value("[Channel1]", "playposition", UNSET_POSITION);
        assert_eq!(beat_jump(&mut host, "[Channel1]", 1.0, true), None);
        assert_eq!(host.get_value("[Channel1]", "playposition"), UNSET_POSITION);

        // Nothing loaded on deck 2 at all
        assert_eq!(beat_jump(&mut host, "[Channel2]", 1.0, false), None);
    }

    #[test]
    fn test_beat_jump_clamps_at_track_start() {
        let mut host = ConsoleHost::new();
        loaded_deck(&mut host, 0.0);

        assert_eq!(beat_jump(&mut host, "[Channel1]", 1.0, false), Some(0.0));
    }

    #[test]
    fn test_sampler_volume_clamps() {
        let mut host = ConsoleHost::new();

        host.set_value("[Sampler1]", "volume", 0.95);
        assert_eq!(step_sampler_volume(&mut host, 1, true, SAMPLER_VOLUME_STEP), 1.0);

        host.set_value("[Sampler2]", "volume", 0.03);
        assert_eq!(step_sampler_volume(&mut host, 2, false, SAMPLER_VOLUME_STEP), 0.0);

        host.set_value("[Sampler3]", "volume", 0.5);
        assert_eq!(
            step_sampler_volume(&mut host, 3, true, SAMPLER_VOLUME_STEP),
            0.5625
        );
    }

    #[test]
    fn test_resolve_group() {
        assert_eq!(resolve_group(Control::Hotcue(1), 2), "[Channel2]");
        assert_eq!(resolve_group(Control::Sampler(3), 1), "[Sampler3]");
        assert_eq!(resolve_group(Control::SelectKnob, 1), "[Playlist]");
    }
}
