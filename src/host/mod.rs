//! Host application interface
//!
//! The mapping never owns DJ state. Everything it reads or writes goes through
//! [`HostParams`], and everything it learns about host-side changes arrives as
//! a [`ParamChange`] for a key it subscribed to.

pub mod console;

pub use console::ConsoleHost;

use std::fmt;

/// A host parameter address: `group` like `[Channel1]`, `name` like `play`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParamKey {
    pub group: String,
    pub name: String,
}

impl ParamKey {
    pub fn new(group: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for ParamKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.group, self.name)
    }
}

/// Notification that a subscribed parameter changed
#[derive(Debug, Clone, PartialEq)]
pub struct ParamChange {
    pub key: ParamKey,
    pub value: f64,
}

/// Handle for one registered parameter subscription
///
/// Not `Clone`: it is handed back to [`HostParams::unsubscribe`] exactly once.
#[derive(Debug, PartialEq, Eq)]
#[must_use = "a subscription must be released through HostParams::unsubscribe"]
pub struct Subscription {
    id: u64,
    key: ParamKey,
}

impl Subscription {
    pub fn new(id: u64, key: ParamKey) -> Self {
        Self { id, key }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn key(&self) -> &ParamKey {
        &self.key
    }
}

/// Relative-motion profile passed to [`HostParams::scratch_enable`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScratchParams {
    /// Ticks per wheel revolution
    pub resolution: u32,
    /// Virtual platter speed
    pub rpm: f64,
    pub alpha: f64,
    pub beta: f64,
    /// Ramp speed in and out instead of jumping
    pub ramped: bool,
}

/// Parameter store and scratch primitives of the host application
pub trait HostParams: Send {
    /// Current value; unknown parameters read as 0
    fn get_value(&self, group: &str, name: &str) -> f64;

    fn set_value(&mut self, group: &str, name: &str, value: f64);

    /// Start receiving changes of `group`/`name`
    fn subscribe(&mut self, group: &str, name: &str) -> Subscription;

    fn unsubscribe(&mut self, subscription: Subscription);

    /// Next pending change notification, if the host queues them
    fn poll_change(&mut self) -> Option<ParamChange> {
        None
    }

    fn scratch_enable(&mut self, deck: u8, params: &ScratchParams);

    fn scratch_tick(&mut self, deck: u8, delta: i32);

    fn scratch_disable(&mut self, deck: u8);

    fn is_scratch_active(&self, deck: u8) -> bool;
}
