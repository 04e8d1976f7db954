//! LED registry
//!
//! Symbolic LED names and their MC2000 addresses. Addresses are shared by both
//! channels; the channel only shows up in the status byte.

use crate::codec::{LedCommand, LedState, CHANNEL_COUNT};
use crate::error::MappingError;
use std::collections::HashMap;

/// LED table from the MC2000 MIDI implementation chart, in chart order
pub const LED_TABLE: &[(&str, u8)] = &[
    ("shiftlock", 2),
    ("vinylmode", 6),
    ("keylock", 8),
    ("sync", 9),
    ("cue1", 17),
    ("cue2", 19),
    ("cue3", 21),
    ("cue4", 23),
    ("samp1_l", 25),
    ("samp2_l", 27),
    ("samp3_l", 29),
    ("samp4_l", 32),
    ("samples_l", 35),
    ("samp1_r", 65),
    ("samp2_r", 67),
    ("samp3_r", 69),
    ("samp4_r", 71),
    ("samples_r", 73),
    ("cue", 38),
    // The chart lists a wrong value for play; 39 is what the unit accepts
    ("play", 39),
    ("loopin", 36),
    ("loopout", 64),
    ("autoloop", 43),
    ("fx1_1", 92),
    ("fx1_2", 93),
    ("fx1_3", 94),
    ("fx2_1", 96),
    ("fx2_2", 97),
    ("fx2_3", 98),
    ("monitorcue_l", 69),
    ("monitorcue_r", 81),
];

/// Names the feedback handlers can produce
pub fn required_names() -> impl Iterator<Item = String> {
    let fixed = [
        "vinylmode",
        "keylock",
        "sync",
        "cue",
        "play",
        "loopin",
        "loopout",
        "autoloop",
        "monitorcue_l",
        "monitorcue_r",
    ]
    .into_iter()
    .map(String::from);

    let hotcues = (1..=4).map(|n| format!("cue{}", n));
    let samplers = (1..=4).map(|n| format!("samp{}_l", n));
    let effects = (1..=2).flat_map(|unit| (1..=3).map(move |slot| format!("fx{}_{}", unit, slot)));

    fixed.chain(hotcues).chain(samplers).chain(effects)
}

/// Monitor-cue LED name for a deck
pub fn monitor_cue_name(deck: u8) -> &'static str {
    if deck == 1 {
        "monitorcue_l"
    } else {
        "monitorcue_r"
    }
}

/// Name to address lookup over [`LED_TABLE`]
#[derive(Debug, Clone)]
pub struct LedRegistry {
    addresses: HashMap<&'static str, u8>,
}

impl LedRegistry {
    /// Build the registry and check every name a handler may ask for
    pub fn new() -> Result<Self, MappingError> {
        let registry = Self {
            addresses: LED_TABLE.iter().copied().collect(),
        };

        for name in required_names() {
            registry.resolve(&name)?;
        }

        Ok(registry)
    }

    /// Protocol address for a symbolic name
    pub fn resolve(&self, name: &str) -> Result<u8, MappingError> {
        self.addresses
            .get(name)
            .copied()
            .ok_or_else(|| MappingError::UnknownLed(name.to_string()))
    }

    /// Three-state command for a named LED on a channel
    pub fn indicator(
        &self,
        channel: u8,
        name: &str,
        state: LedState,
    ) -> Result<LedCommand, MappingError> {
        Ok(LedCommand::Indicator {
            channel,
            address: self.resolve(name)?,
            state,
        })
    }

    /// Two-state monitor-cue command for a named LED on a channel
    pub fn monitor(&self, channel: u8, name: &str, lit: bool) -> Result<LedCommand, MappingError> {
        Ok(LedCommand::Monitor {
            channel,
            address: self.resolve(name)?,
            lit,
        })
    }

    /// Power-on/power-off LED pattern
    ///
    /// Every table entry goes Off on both channels, the monitor-cue LEDs go
    /// Off through the two-state codes, then vinyl mode comes back On.
    pub fn default_pattern(&self) -> Vec<LedCommand> {
        let mut commands = Vec::with_capacity(LED_TABLE.len() * 2 + 4);

        for &(_, address) in LED_TABLE {
            for channel in 1..=CHANNEL_COUNT {
                commands.push(LedCommand::Indicator {
                    channel,
                    address,
                    state: LedState::Off,
                });
            }
        }

        for deck in 1..=CHANNEL_COUNT {
            let address = self.addresses[monitor_cue_name(deck)];
            commands.push(LedCommand::Monitor {
                channel: deck,
                address,
                lit: false,
            });
        }

        let vinyl = self.addresses["vinylmode"];
        for channel in 1..=CHANNEL_COUNT {
            commands.push(LedCommand::Indicator {
                channel,
                address: vinyl,
                state: LedState::On,
            });
        }

        commands
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_resolves_every_required_name() {
        let registry = LedRegistry::new().unwrap();

        assert_eq!(registry.resolve("play"), Ok(39));
        assert_eq!(registry.resolve("cue4"), Ok(23));
        assert_eq!(registry.resolve("fx2_3"), Ok(98));
        assert_eq!(registry.resolve("monitorcue_r"), Ok(81));
        assert_eq!(
            registry.resolve("fx1_4"),
            Err(MappingError::UnknownLed("fx1_4".to_string()))
        );
    }

    #[test]
    fn test_indicator_is_channel_independent() {
        let registry = LedRegistry::new().unwrap();

        let left = registry.indicator(1, "sync", LedState::On).unwrap();
        let right = registry.indicator(2, "sync", LedState::On).unwrap();
        assert_eq!(left.address(), right.address());
        assert_ne!(left.channel(), right.channel());
    }

    #[test]
    fn test_default_pattern() {
        let registry = LedRegistry::new().unwrap();
        let pattern = registry.default_pattern();

        assert_eq!(pattern.len(), LED_TABLE.len() * 2 + 4);

        // Last word for each LED decides what the surface shows
        let mut last = HashMap::new();
        for command in &pattern {
            last.insert((command.channel(), command.address()), *command);
        }

        for channel in 1..=2u8 {
            assert_eq!(
                last[&(channel, 6)],
                LedCommand::Indicator {
                    channel,
                    address: 6,
                    state: LedState::On
                }
            );
            assert_eq!(
                last[&(channel, 39)],
                LedCommand::Indicator {
                    channel,
                    address: 39,
                    state: LedState::Off
                }
            );
        }

        assert!(pattern.contains(&LedCommand::Monitor {
            channel: 1,
            address: 69,
            lit: false
        }));
        assert!(pattern.contains(&LedCommand::Monitor {
            channel: 2,
            address: 81,
            lit: false
        }));
    }

    #[test]
    fn test_default_pattern_is_stable() {
        let registry = LedRegistry::new().unwrap();
        assert_eq!(registry.default_pattern(), registry.default_pattern());
    }
}
