//! MC2000 Map - Denon MC2000 controller mapping
//!
//! Bidirectional mapping between the MC2000 control surface and a DJ host's
//! named parameters: button and knob events become host parameter writes,
//! host parameter changes become LED feedback.

pub mod addressing;
pub mod codec;
pub mod config;
pub mod control_mapping;
pub mod device;
pub mod engine;
pub mod error;
pub mod host;
pub mod leds;
pub mod midi;
pub mod modifier;
pub mod scratch;

pub use codec::{ControlEvent, Edge, LedCommand, LedState};
pub use control_mapping::{Control, ControlMap};
pub use engine::{Engine, EngineSettings};
pub use error::MappingError;
pub use host::{ConsoleHost, HostParams, ParamChange, ParamKey, Subscription};
pub use modifier::{ModifierState, ShiftState};
