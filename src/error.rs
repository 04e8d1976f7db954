//! Errors raised while building the static mapping tables

use thiserror::Error;

/// A defect in one of the immutable tables
///
/// These only surface while the engine is being set up. Once the tables are
/// validated, lookups against them cannot fail.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MappingError {
    #[error("LED '{0}' is not in the LED table")]
    UnknownLed(String),

    #[error("unknown control id '{0}'")]
    UnknownControl(String),

    #[error("invalid MIDI spec '{spec}' for control '{control}'")]
    InvalidMidiSpec { control: String, spec: String },

    #[error("controls '{first}' and '{second}' share the same MIDI address")]
    DuplicateAddress { first: String, second: String },
}
