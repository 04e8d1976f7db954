//! Protocol codec
//!
//! Turns raw MC2000 frames into [`ControlEvent`]s and [`LedCommand`]s into raw
//! frames. No business logic lives here.

use crate::control_mapping::{Control, ControlMap, MidiSpec};
use crate::midi::MidiMessage;

/// Number of addressable channels on the surface
pub const CHANNEL_COUNT: u8 = 2;

/// Status byte base for LED feedback; the low nibble carries the channel
pub const LED_STATUS: u8 = 0xB0;

const LED_ON: u8 = 0x4A;
const LED_OFF: u8 = 0x4B;
const LED_BLINK: u8 = 0x4C;

const MONITOR_ON: u8 = 0x50;
const MONITOR_OFF: u8 = 0x51;

/// Which edge of a control produced the event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    /// Button went down (note on)
    Press,
    /// Button came up (note off)
    Release,
    /// Continuous control moved (CC)
    Value,
}

/// A decoded inbound control message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlEvent {
    /// Surface channel, 1-based
    pub channel: u8,
    pub control: Control,
    /// Raw data-1 byte
    pub control_id: u8,
    /// Raw data-2 byte
    pub value: u8,
    pub edge: Edge,
}

impl ControlEvent {
    pub fn is_press(&self) -> bool {
        self.edge == Edge::Press
    }
}

/// Visual state of a three-state LED
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LedState {
    Off,
    On,
    Blink,
}

impl LedState {
    /// Plain on/off rendering of a host value
    pub fn from_value(value: f64) -> Self {
        if is_active(value) {
            LedState::On
        } else {
            LedState::Off
        }
    }

    fn code(self) -> u8 {
        match self {
            LedState::Off => LED_OFF,
            LedState::On => LED_ON,
            LedState::Blink => LED_BLINK,
        }
    }

    fn from_code(code: u8) -> Option<Self> {
        match code {
            LED_OFF => Some(LedState::Off),
            LED_ON => Some(LedState::On),
            LED_BLINK => Some(LedState::Blink),
            _ => None,
        }
    }
}

/// Whether a host value counts as "active"
pub fn is_active(value: f64) -> bool {
    value != 0.0 && !value.is_nan()
}

/// Outbound feedback command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LedCommand {
    /// Off/On/Blink LED driven through the 0x4A-0x4C command codes
    Indicator {
        channel: u8,
        address: u8,
        state: LedState,
    },
    /// Two-state monitor-cue LED driven through the 0x50/0x51 command codes
    Monitor { channel: u8, address: u8, lit: bool },
}

impl LedCommand {
    pub fn channel(&self) -> u8 {
        match *self {
            LedCommand::Indicator { channel, .. } | LedCommand::Monitor { channel, .. } => {
                channel
            },
        }
    }

    pub fn address(&self) -> u8 {
        match *self {
            LedCommand::Indicator { address, .. } | LedCommand::Monitor { address, .. } => {
                address
            },
        }
    }
}

/// Decode an inbound frame against the control table
///
/// Unknown controls, channels outside 1-2 and non-note/CC frames all yield
/// `None`.
pub fn decode(map: &ControlMap, raw: &[u8]) -> Option<ControlEvent> {
    let message = MidiMessage::parse(raw)?;

    let channel = message.channel() + 1;
    if !(1..=CHANNEL_COUNT).contains(&channel) {
        return None;
    }

    let (spec, control_id, value, edge) = match message {
        MidiMessage::NoteOn { note, velocity, .. } => {
            (MidiSpec::Note { note }, note, velocity, Edge::Press)
        },
        MidiMessage::NoteOff { note, velocity, .. } => {
            (MidiSpec::Note { note }, note, velocity, Edge::Release)
        },
        MidiMessage::ControlChange { cc, value, .. } => {
            (MidiSpec::ControlChange { cc }, cc, value, Edge::Value)
        },
    };

    let control = map.find(&spec)?;

    Some(ControlEvent {
        channel,
        control,
        control_id,
        value,
        edge,
    })
}

/// Encode a feedback command as a raw frame
pub fn encode(command: &LedCommand) -> [u8; 3] {
    let (channel, code, address) = match *command {
        LedCommand::Indicator {
            channel,
            address,
            state,
        } => (channel, state.code(), address),
        LedCommand::Monitor {
            channel,
            address,
            lit,
        } => (
            channel,
            if lit { MONITOR_ON } else { MONITOR_OFF },
            address,
        ),
    };

    [
        LED_STATUS + (channel.saturating_sub(1) & 0x0F),
        code,
        address & 0x7F,
    ]
}

/// Decode an outbound feedback frame, for logging and tests
pub fn decode_led(raw: &[u8]) -> Option<LedCommand> {
    let &[status, code, address] = raw else {
        return None;
    };
    if status & 0xF0 != LED_STATUS {
        return None;
    }
    let channel = (status & 0x0F) + 1;

    match code {
        MONITOR_ON | MONITOR_OFF => Some(LedCommand::Monitor {
            channel,
            address,
            lit: code == MONITOR_ON,
        }),
        _ => LedState::from_code(code).map(|state| LedCommand::Indicator {
            channel,
            address,
            state,
        }),
    }
}
