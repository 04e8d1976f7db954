//! Inbound control table for the MC2000
//!
//! Parses `docs/mc2000-controls.csv` (or an override file with the same
//! columns) into typed [`Control`] identifiers keyed by their MIDI address.

use crate::error::MappingError;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::OnceLock;
use tracing::info;

/// Every logical control the mapping knows how to handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Control {
    Shift,
    /// Hotcue pad 1-4
    Hotcue(u8),
    BendUp,
    BendDown,
    /// Sample pad 1-4
    Sampler(u8),
    JogTouch,
    JogTurn,
    SelectKnob,
    BeatsKnob,
    Play,
    Cue,
    Sync,
    Keylock,
    Pfl,
    LoopIn,
    LoopOut,
    Reloop,
    /// Fixed-length beat loop (2, 4 or 8 beats)
    BeatLoop(u8),
}

impl FromStr for Control {
    type Err = MappingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unknown = || MappingError::UnknownControl(s.to_string());
        let indexed = |suffix: &str, valid: &[u8]| -> Result<u8, MappingError> {
            suffix
                .parse::<u8>()
                .ok()
                .filter(|n| valid.contains(n))
                .ok_or_else(unknown)
        };

        if let Some(n) = s.strip_prefix("hotcue_") {
            return Ok(Control::Hotcue(indexed(n, &[1, 2, 3, 4])?));
        }
        if let Some(n) = s.strip_prefix("sampler_") {
            return Ok(Control::Sampler(indexed(n, &[1, 2, 3, 4])?));
        }
        if let Some(n) = s.strip_prefix("beatloop_") {
            return Ok(Control::BeatLoop(indexed(n, &[2, 4, 8])?));
        }

        match s {
            "shift" => Ok(Control::Shift),
            "bend_up" => Ok(Control::BendUp),
            "bend_down" => Ok(Control::BendDown),
            "jog_touch" => Ok(Control::JogTouch),
            "jog_turn" => Ok(Control::JogTurn),
            "select_knob" => Ok(Control::SelectKnob),
            "beats_knob" => Ok(Control::BeatsKnob),
            "play" => Ok(Control::Play),
            "cue" => Ok(Control::Cue),
            "sync" => Ok(Control::Sync),
            "keylock" => Ok(Control::Keylock),
            "pfl" => Ok(Control::Pfl),
            "loop_in" => Ok(Control::LoopIn),
            "loop_out" => Ok(Control::LoopOut),
            "reloop" => Ok(Control::Reloop),
            _ => Err(unknown()),
        }
    }
}

impl fmt::Display for Control {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Control::Shift => write!(f, "shift"),
            Control::Hotcue(n) => write!(f, "hotcue_{}", n),
            Control::BendUp => write!(f, "bend_up"),
            Control::BendDown => write!(f, "bend_down"),
            Control::Sampler(n) => write!(f, "sampler_{}", n),
            Control::JogTouch => write!(f, "jog_touch"),
            Control::JogTurn => write!(f, "jog_turn"),
            Control::SelectKnob => write!(f, "select_knob"),
            Control::BeatsKnob => write!(f, "beats_knob"),
            Control::Play => write!(f, "play"),
            Control::Cue => write!(f, "cue"),
            Control::Sync => write!(f, "sync"),
            Control::Keylock => write!(f, "keylock"),
            Control::Pfl => write!(f, "pfl"),
            Control::LoopIn => write!(f, "loop_in"),
            Control::LoopOut => write!(f, "loop_out"),
            Control::Reloop => write!(f, "reloop"),
            Control::BeatLoop(n) => write!(f, "beatloop_{}", n),
        }
    }
}

/// Control mapping entry from CSV
#[derive(Debug, Clone, Deserialize)]
pub struct ControlMapping {
    pub control_id: String,
    pub group: String,
    pub message: String,
}

/// Parsed MIDI address of a control
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MidiSpec {
    /// Button: note=number
    Note { note: u8 },
    /// Knob or wheel: cc=number
    ControlChange { cc: u8 },
}

impl MidiSpec {
    /// Parse a MIDI spec string like "note=23" or "cc=81"
    pub fn parse(spec: &str) -> Option<Self> {
        let spec = spec.trim();

        if let Some(note) = spec.strip_prefix("note=") {
            note.parse::<u8>()
                .ok()
                .filter(|n| *n < 0x80)
                .map(|note| MidiSpec::Note { note })
        } else if let Some(cc) = spec.strip_prefix("cc=") {
            cc.parse::<u8>()
                .ok()
                .filter(|n| *n < 0x80)
                .map(|cc| MidiSpec::ControlChange { cc })
        } else {
            None
        }
    }
}

impl fmt::Display for MidiSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MidiSpec::Note { note } => write!(f, "note={}", note),
            MidiSpec::ControlChange { cc } => write!(f, "cc={}", cc),
        }
    }
}

/// Control table, keyed by MIDI address
#[derive(Debug, Clone)]
pub struct ControlMap {
    by_midi: HashMap<MidiSpec, Control>,
    mappings: Vec<ControlMapping>,
}

impl ControlMap {
    /// Load from CSV content
    pub fn load_from_string(csv_content: &str) -> Result<Self> {
        let mut reader = csv::Reader::from_reader(csv_content.as_bytes());
        let mut by_midi: HashMap<MidiSpec, Control> = HashMap::new();
        let mut mappings = Vec::new();

        for result in reader.deserialize() {
            let mapping: ControlMapping = result.context("Failed to parse CSV row")?;

            let control: Control = mapping.control_id.parse()?;
            let spec = MidiSpec::parse(&mapping.message).ok_or_else(|| {
                MappingError::InvalidMidiSpec {
                    control: mapping.control_id.clone(),
                    spec: mapping.message.clone(),
                }
            })?;

            if let Some(existing) = by_midi.insert(spec, control) {
                return Err(MappingError::DuplicateAddress {
                    first: existing.to_string(),
                    second: mapping.control_id,
                }
                .into());
            }

            mappings.push(mapping);
        }

        info!("Loaded {} control mappings", mappings.len());

        Ok(Self { by_midi, mappings })
    }

    /// Load from a CSV file on disk
    pub async fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let csv_content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read CSV file: {}", path.display()))?;

        Self::load_from_string(&csv_content)
            .with_context(|| format!("Invalid control table: {}", path.display()))
    }

    /// Reverse lookup from a MIDI address
    pub fn find(&self, spec: &MidiSpec) -> Option<Control> {
        self.by_midi.get(spec).copied()
    }

    /// Rows in file order
    pub fn mappings(&self) -> &[ControlMapping] {
        &self.mappings
    }

    pub fn len(&self) -> usize {
        self.by_midi.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_midi.is_empty()
    }
}

/// Default embedded CSV content
pub const DEFAULT_CSV: &str = include_str!("../docs/mc2000-controls.csv");

static DEFAULT_MAP: OnceLock<ControlMap> = OnceLock::new();

/// Load the embedded control table (cached after first parse)
pub fn load_default_controls() -> Result<ControlMap> {
    if let Some(map) = DEFAULT_MAP.get() {
        return Ok(map.clone());
    }

    let map = ControlMap::load_from_string(DEFAULT_CSV)?;
    let _ = DEFAULT_MAP.set(map.clone());
    Ok(map)
}
