//! Feedback synchronizer: host parameter changes to LED commands

use super::Engine;
use crate::addressing::{
    deck_group, group_to_deck, hotcue_key, loop_length_to_slot, sampler_group,
    sampler_index_from_group, HOTCUE_COUNT, SAMPLER_COUNT, UNSET_POSITION,
};
use crate::codec::{is_active, LedCommand, LedState, CHANNEL_COUNT};
use crate::host::{HostParams, ParamKey};
use crate::leds::monitor_cue_name;
use tracing::{debug, error};

/// Effect-slot LEDs only exist in the first channel's address space
const EFFECT_LED_CHANNEL: u8 = 1;

/// All four sample pads sit on the left deck
const SAMPLER_LED_CHANNEL: u8 = 1;

/// Beat loop lengths with a button and an LED
const BEAT_LOOP_LENGTHS: [u32; 3] = [2, 4, 8];

/// How a subscribed host parameter is shown on the surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackRule {
    Keylock { deck: u8 },
    BeatActive { deck: u8 },
    Hotcue { deck: u8, cue: u8 },
    CueDefault { deck: u8 },
    Play { deck: u8 },
    LoopStart { deck: u8 },
    LoopEnd { deck: u8 },
    LoopEnabled { deck: u8 },
    BeatLoop { deck: u8, length: u32 },
    Pfl { deck: u8 },
    SamplerPlay { sampler: u8 },
}

impl FeedbackRule {
    /// Rule for a host parameter, `None` for anything the surface can't show
    pub fn for_key(key: &ParamKey) -> Option<Self> {
        if let Some(sampler) = sampler_index_from_group(&key.group) {
            return (key.name == "play").then_some(FeedbackRule::SamplerPlay { sampler });
        }

        let deck = group_to_deck(&key.group).filter(|d| (1..=CHANNEL_COUNT).contains(d))?;
        let name = key.name.as_str();

        let rule = match name {
            "keylock" => FeedbackRule::Keylock { deck },
            "beat_active" => FeedbackRule::BeatActive { deck },
            "cue_default" => FeedbackRule::CueDefault { deck },
            "play" => FeedbackRule::Play { deck },
            "loop_start_position" => FeedbackRule::LoopStart { deck },
            "loop_end_position" => FeedbackRule::LoopEnd { deck },
            "loop_enabled" => FeedbackRule::LoopEnabled { deck },
            "pfl" => FeedbackRule::Pfl { deck },
            _ => {
                if let Some(cue) = indexed_name(name, "hotcue_", "_enabled") {
                    let cue = u8::try_from(cue).ok().filter(|c| (1..=HOTCUE_COUNT).contains(c))?;
                    FeedbackRule::Hotcue { deck, cue }
                } else {
                    let length = indexed_name(name, "beatloop_", "_enabled")?;
                    loop_length_to_slot(length)?;
                    FeedbackRule::BeatLoop { deck, length }
                }
            },
        };

        Some(rule)
    }
}

fn indexed_name(name: &str, prefix: &str, suffix: &str) -> Option<u32> {
    name.strip_prefix(prefix)?.strip_suffix(suffix)?.parse().ok()
}

/// Every host parameter the surface mirrors, in registration order
pub fn feedback_keys() -> Vec<ParamKey> {
    let mut keys = Vec::new();

    for deck in 1..=CHANNEL_COUNT {
        let group = deck_group(deck);
        keys.push(ParamKey::new(&group, "keylock"));
        keys.push(ParamKey::new(&group, "beat_active"));
        for cue in 1..=HOTCUE_COUNT {
            keys.push(ParamKey::new(&group, hotcue_key(cue, "enabled")));
        }
        keys.push(ParamKey::new(&group, "cue_default"));
        keys.push(ParamKey::new(&group, "play"));
        keys.push(ParamKey::new(&group, "loop_start_position"));
        keys.push(ParamKey::new(&group, "loop_end_position"));
        keys.push(ParamKey::new(&group, "loop_enabled"));
        for length in BEAT_LOOP_LENGTHS {
            keys.push(ParamKey::new(&group, format!("beatloop_{}_enabled", length)));
        }
        keys.push(ParamKey::new(&group, "pfl"));
    }

    for sampler in 1..=SAMPLER_COUNT {
        keys.push(ParamKey::new(sampler_group(sampler), "play"));
    }

    keys
}

/// Active flags blink under shift to offer delete/stop
fn shift_aware_state(value: f64, shift_held: bool) -> LedState {
    match (is_active(value), shift_held) {
        (true, true) => LedState::Blink,
        (true, false) => LedState::On,
        (false, _) => LedState::Off,
    }
}

fn position_state(value: f64) -> LedState {
    if value == UNSET_POSITION || value.is_nan() {
        LedState::Off
    } else {
        LedState::On
    }
}

impl<H: HostParams> Engine<H> {
    /// LED command for a rule and the parameter's new value
    pub(super) fn render(&self, rule: FeedbackRule, value: f64) -> Option<LedCommand> {
        let shift = self.modifiers.shift_held();

        let result = match rule {
            FeedbackRule::Keylock { deck } => {
                self.leds.indicator(deck, "keylock", LedState::from_value(value))
            },
            FeedbackRule::BeatActive { deck } => {
                self.leds.indicator(deck, "sync", LedState::from_value(value))
            },
            FeedbackRule::Hotcue { deck, cue } => self.leds.indicator(
                deck,
                &format!("cue{}", cue),
                shift_aware_state(value, shift),
            ),
            FeedbackRule::CueDefault { deck } => {
                self.leds.indicator(deck, "cue", LedState::from_value(value))
            },
            FeedbackRule::Play { deck } => {
                self.leds.indicator(deck, "play", LedState::from_value(value))
            },
            FeedbackRule::LoopStart { deck } => {
                self.leds.indicator(deck, "loopin", position_state(value))
            },
            FeedbackRule::LoopEnd { deck } => {
                self.leds.indicator(deck, "loopout", position_state(value))
            },
            FeedbackRule::LoopEnabled { deck } => {
                self.leds.indicator(deck, "autoloop", LedState::from_value(value))
            },
            FeedbackRule::BeatLoop { deck, length } => {
                let slot = loop_length_to_slot(length)?;
                self.leds.indicator(
                    EFFECT_LED_CHANNEL,
                    &format!("fx{}_{}", deck, slot),
                    LedState::from_value(value),
                )
            },
            FeedbackRule::Pfl { deck } => {
                self.leds.monitor(deck, monitor_cue_name(deck), is_active(value))
            },
            FeedbackRule::SamplerPlay { sampler } => self.leds.indicator(
                SAMPLER_LED_CHANNEL,
                &format!("samp{}_l", sampler),
                shift_aware_state(value, shift),
            ),
        };

        match result {
            Ok(command) => Some(command),
            Err(e) => {
                error!("No LED for {:?}: {}", rule, e);
                None
            },
        }
    }

    /// Re-render every LED whose look depends on shift
    ///
    /// Reads current values from the host and emits all sampler and hotcue
    /// commands, changed or not.
    pub(super) fn refresh_modifier_feedback(&mut self) {
        let mut rules = Vec::with_capacity(usize::from(SAMPLER_COUNT + CHANNEL_COUNT * HOTCUE_COUNT));

        for sampler in 1..=SAMPLER_COUNT {
            rules.push((
                FeedbackRule::SamplerPlay { sampler },
                ParamKey::new(sampler_group(sampler), "play"),
            ));
        }
        for deck in 1..=CHANNEL_COUNT {
            for cue in 1..=HOTCUE_COUNT {
                rules.push((
                    FeedbackRule::Hotcue { deck, cue },
                    ParamKey::new(deck_group(deck), hotcue_key(cue, "enabled")),
                ));
            }
        }

        for (rule, key) in rules {
            let value = self.host.get_value(&key.group, &key.name);
            if let Some(command) = self.render(rule, value) {
                self.outgoing.push(command);
            }
        }

        debug!("Shift refresh done (shift={})", self.modifiers.shift_held());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rules_for_keys() {
        assert_eq!(
            FeedbackRule::for_key(&ParamKey::new("[Channel2]", "hotcue_3_enabled")),
            Some(FeedbackRule::Hotcue { deck: 2, cue: 3 })
        );
        assert_eq!(
            FeedbackRule::for_key(&ParamKey::new("[Channel1]", "beatloop_4_enabled")),
            Some(FeedbackRule::BeatLoop { deck: 1, length: 4 })
        );
        assert_eq!(
            FeedbackRule::for_key(&ParamKey::new("[Sampler2]", "play")),
            Some(FeedbackRule::SamplerPlay { sampler: 2 })
        );
        assert_eq!(
            FeedbackRule::for_key(&ParamKey::new("[Channel1]", "loop_end_position")),
            Some(FeedbackRule::LoopEnd { deck: 1 })
        );
    }

    #[test]
    fn test_unmapped_keys() {
        for (group, name) in [
            ("[Channel3]", "play"),
            ("Channel1", "play"),
            ("[Channel1]", "hotcue_5_enabled"),
            ("[Channel1]", "beatloop_3_enabled"),
            ("[Channel1]", "rate"),
            ("[Sampler1]", "volume"),
        ] {
            assert_eq!(FeedbackRule::for_key(&ParamKey::new(group, name)), None);
        }
    }

    #[test]
    fn test_feedback_keys_all_have_rules() {
        let keys = feedback_keys();

        // 15 per deck plus one per sampler
        assert_eq!(keys.len(), 2 * 15 + 4);
        assert!(keys.iter().all(|k| FeedbackRule::for_key(k).is_some()));
    }

    #[test]
    fn test_shift_aware_state() {
        assert_eq!(shift_aware_state(1.0, false), LedState::On);
        assert_eq!(shift_aware_state(1.0, true), LedState::Blink);
        assert_eq!(shift_aware_state(0.0, true), LedState::Off);
    }

    #[test]
    fn test_position_state() {
        assert_eq!(position_state(UNSET_POSITION), LedState::Off);
        assert_eq!(position_state(0.0), LedState::On);
        assert_eq!(position_state(123456.0), LedState::On);
    }
}
