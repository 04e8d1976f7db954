//! Mapping engine - the single owner of all mapping state
//!
//! The engine ties the pieces together:
//! - Inbound frames are decoded and dispatched to control handlers
//! - Host notifications are rendered into LED commands
//! - The shift modifier is read by both sides and re-renders on change
//! - Device open/close put every LED back to the default pattern
//!
//! Everything runs on the caller's thread. Each call finishes its work,
//! including queueing all LED commands it causes, before returning.

mod dispatch;
mod feedback;


pub use feedback::{feedback_keys, FeedbackRule};

use crate::codec::{self, LedCommand};
use crate::control_mapping::ControlMap;
use crate::error::MappingError;
use crate::host::{HostParams, ParamChange, ParamKey, Subscription};
use crate::leds::LedRegistry;
use crate::midi::format_hex;
use crate::modifier::{ModifierState, ShiftState};
use crate::scratch::{JogController, ScratchProfile};
use std::collections::HashMap;
use tracing::{debug, info, trace};

/// Tunables the engine takes from the config file
#[derive(Debug, Clone, Default)]
pub struct EngineSettings {
    pub scratch: ScratchProfile,
}

/// A live host subscription and the feedback it drives
struct Binding {
    subscription: Subscription,
    rule: FeedbackRule,
}

/// Bidirectional mapping between the MC2000 and a host
pub struct Engine<H: HostParams> {
    host: H,
    modifiers: Box<dyn ModifierState>,
    controls: ControlMap,
    leds: LedRegistry,
    jog: JogController,
    bindings: Vec<Binding>,
    rules: HashMap<ParamKey, FeedbackRule>,
    outgoing: Vec<LedCommand>,
}

impl<H: HostParams> Engine<H> {
    /// Build an engine; fails if the LED table misses a name a handler uses
    pub fn new(host: H, controls: ControlMap, settings: EngineSettings) -> Result<Self, MappingError> {
        let leds = LedRegistry::new()?;

        Ok(Self {
            host,
            modifiers: Box::new(ShiftState::new()),
            controls,
            leds,
            jog: JogController::new(settings.scratch),
            bindings: Vec::new(),
            rules: HashMap::new(),
            outgoing: Vec::new(),
        })
    }

    /// Replace the modifier state implementation
    pub fn with_modifiers(mut self, modifiers: Box<dyn ModifierState>) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Device opened: subscribe to host feedback and reset every LED
    pub fn open(&mut self) {
        if self.bindings.is_empty() {
            for key in feedback_keys() {
                let Some(rule) = FeedbackRule::for_key(&key) else {
                    continue;
                };
                let subscription = self.host.subscribe(&key.group, &key.name);
                self.rules.insert(key, rule);
                self.bindings.push(Binding { subscription, rule });
            }
        }

        self.queue_default_pattern();
        info!(
            "✅ MC2000 mapping open ({} feedback bindings)",
            self.bindings.len()
        );
    }

    /// Device closing: reset every LED and release all host resources
    pub fn close(&mut self) {
        self.jog.release_all(&mut self.host);
        self.queue_default_pattern();

        let count = self.bindings.len();
        for binding in self.bindings.drain(..) {
            trace!("Releasing {:?} binding", binding.rule);
            self.host.unsubscribe(binding.subscription);
        }
        self.rules.clear();

        info!("🛑 MC2000 mapping closed ({} bindings released)", count);
    }

    /// Handle one inbound frame from the controller
    pub fn on_midi(&mut self, raw: &[u8]) {
        match codec::decode(&self.controls, raw) {
            Some(event) => {
                trace!("← {} => {:?}", format_hex(raw), event);
                self.dispatch(event);
            },
            None => trace!("← {} (not mapped)", format_hex(raw)),
        }
    }

    /// Handle a host notification for a subscribed parameter
    pub fn on_parameter_change(&mut self, change: &ParamChange) {
        let Some(rule) = self.rules.get(&change.key).copied() else {
            trace!("Ignoring change of unbound {}", change.key);
            return;
        };

        if let Some(command) = self.render(rule, change.value) {
            self.outgoing.push(command);
        }
    }

    /// Deliver every notification the host has queued
    pub fn pump_notifications(&mut self) {
        while let Some(change) = self.host.poll_change() {
            self.on_parameter_change(&change);
        }
    }

    /// Handle a frame and every host notification it caused
    pub fn handle_frame(&mut self, raw: &[u8]) {
        self.on_midi(raw);
        self.pump_notifications();
    }

    /// Take queued LED commands, leaving the queue empty
    pub fn take_outgoing(&mut self) -> Vec<LedCommand> {
        std::mem::take(&mut self.outgoing)
    }

    pub fn shift_held(&self) -> bool {
        self.modifiers.shift_held()
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn controls(&self) -> &ControlMap {
        &self.controls
    }

    fn queue_default_pattern(&mut self) {
        let pattern = self.leds.default_pattern();
        debug!("Queueing default LED pattern ({} commands)", pattern.len());
        self.outgoing.extend(pattern);
    }
}
