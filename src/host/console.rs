//! Console host - an in-memory parameter store that logs every write
//!
//! Used by the binary when no DJ application is attached, and by the tests to
//! observe exactly what the mapping asked the host to do.

use super::{HostParams, ParamChange, ParamKey, ScratchParams, Subscription};
use crate::addressing::{deck_group, sampler_group, SAMPLER_COUNT, UNSET_POSITION};
use crate::codec::CHANNEL_COUNT;
use std::collections::{HashMap, VecDeque};
use tracing::{debug, info, trace};

/// Number of recent scratch ticks kept for inspection
pub const TICK_HISTORY: usize = 64;

pub struct ConsoleHost {
    values: HashMap<ParamKey, f64>,
    subscriptions: HashMap<u64, ParamKey>,
    next_subscription: u64,
    pending: VecDeque<ParamChange>,
    scratching: HashMap<u8, ScratchParams>,
    ticks: Vec<(u8, i32)>,
    tick_count: u64,
    write_count: u64,
}

impl ConsoleHost {
    /// Empty host with the loop markers unset and sampler volumes at full
    pub fn new() -> Self {
        let mut values = HashMap::new();
        for deck in 1..=CHANNEL_COUNT {
            let group = deck_group(deck);
            values.insert(ParamKey::new(&group, "loop_start_position"), UNSET_POSITION);
            values.insert(ParamKey::new(&group, "loop_end_position"), UNSET_POSITION);
        }
        for sampler in 1..=SAMPLER_COUNT {
            values.insert(ParamKey::new(sampler_group(sampler), "volume"), 1.0);
        }

        Self {
            values,
            subscriptions: HashMap::new(),
            next_subscription: 1,
            pending: VecDeque::new(),
            scratching: HashMap::new(),
            ticks: Vec::with_capacity(TICK_HISTORY),
            tick_count: 0,
            write_count: 0,
        }
    }

    /// Number of live subscriptions
    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn is_subscribed(&self, group: &str, name: &str) -> bool {
        let key = ParamKey::new(group, name);
        self.subscriptions.values().any(|k| *k == key)
    }

    /// Profile of the active scratch on a deck
    pub fn scratch_params(&self, deck: u8) -> Option<&ScratchParams> {
        self.scratching.get(&deck)
    }

    /// Most recent forwarded ticks as (deck, delta), oldest first
    pub fn ticks(&self) -> &[(u8, i32)] {
        &self.ticks
    }

    /// Total ticks forwarded since creation
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn write_count(&self) -> u64 {
        self.write_count
    }
}

impl Default for ConsoleHost {
    fn default() -> Self {
        Self::new()
    }
}

impl HostParams for ConsoleHost {
    fn get_value(&self, group: &str, name: &str) -> f64 {
        self.values
            .get(&ParamKey::new(group, name))
            .copied()
            .unwrap_or(0.0)
    }

    fn set_value(&mut self, group: &str, name: &str, value: f64) {
        let key = ParamKey::new(group, name);
        self.write_count += 1;

        info!("🎛️  {} = {}", key, value);

        let previous = self.values.insert(key.clone(), value);
        if previous == Some(value) {
            return;
        }

        if self.subscriptions.values().any(|k| *k == key) {
            trace!("Queueing change notification for {}", key);
            self.pending.push_back(ParamChange { key, value });
        }
    }

    fn subscribe(&mut self, group: &str, name: &str) -> Subscription {
        let id = self.next_subscription;
        self.next_subscription += 1;

        let key = ParamKey::new(group, name);
        debug!("Subscribed #{} to {}", id, key);
        self.subscriptions.insert(id, key.clone());
        Subscription::new(id, key)
    }

    fn unsubscribe(&mut self, subscription: Subscription) {
        if self.subscriptions.remove(&subscription.id()).is_some() {
            debug!("Released #{} ({})", subscription.id(), subscription.key());
        }
    }

    fn poll_change(&mut self) -> Option<ParamChange> {
        self.pending.pop_front()
    }

    fn scratch_enable(&mut self, deck: u8, params: &ScratchParams) {
        info!(
            "💿 Scratch on deck {} (resolution={}, rpm={}, alpha={}, beta={}, ramped={})",
            deck, params.resolution, params.rpm, params.alpha, params.beta, params.ramped
        );
        self.scratching.insert(deck, *params);
    }

    fn scratch_tick(&mut self, deck: u8, delta: i32) {
        trace!("Scratch tick deck {}: {:+}", deck, delta);
        if self.ticks.len() == TICK_HISTORY {
            self.ticks.remove(0);
        }
        self.ticks.push((deck, delta));
        self.tick_count += 1;
    }

    fn scratch_disable(&mut self, deck: u8) {
        if self.scratching.remove(&deck).is_some() {
            info!("💿 Scratch off on deck {}", deck);
        }
    }

    fn is_scratch_active(&self, deck: u8) -> bool {
        self.scratching.contains_key(&deck)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let host = ConsoleHost::new();

        assert_eq!(host.get_value("[Channel1]", "loop_start_position"), -1.0);
        assert_eq!(host.get_value("[Sampler4]", "volume"), 1.0);
        assert_eq!(host.get_value("[Channel2]", "bpm"), 0.0);
    }

    #[test]
    fn test_notifies_only_subscribed_changes() {
        let mut host = ConsoleHost::new();
        let sub = host.subscribe("[Channel1]", "play");

        host.set_value("[Channel1]", "play", 1.0);
        host.set_value("[Channel1]", "play", 1.0); // unchanged
        host.set_value("[Channel1]", "keylock", 1.0); // not subscribed

        assert_eq!(
            host.poll_change(),
            Some(ParamChange {
                key: ParamKey::new("[Channel1]", "play"),
                value: 1.0
            })
        );
        assert_eq!(host.poll_change(), None);
        assert_eq!(host.write_count(), 3);

        host.unsubscribe(sub);
        assert_eq!(host.subscription_count(), 0);

        host.set_value("[Channel1]", "play", 0.0);
        assert_eq!(host.poll_change(), None);
    }

    #[test]
    fn test_scratch_lifecycle() {
        let mut host = ConsoleHost::new();
        let params = ScratchParams {
            resolution: 128,
            rpm: 150.0,
            alpha: 0.125,
            beta: 0.125 / 32.0,
            ramped: true,
        };

        host.scratch_enable(2, &params);
        assert!(host.is_scratch_active(2));
        assert!(!host.is_scratch_active(1));
        assert_eq!(host.scratch_params(2), Some(&params));

        host.scratch_tick(2, -3);
        host.scratch_disable(2);
        assert!(!host.is_scratch_active(2));
        assert_eq!(host.ticks(), &[(2, -3)]);
    }

    #[test]
    fn test_tick_history_is_bounded() {
        let mut host = ConsoleHost::new();
        let params = ScratchParams {
            resolution: 128,
            rpm: 150.0,
            alpha: 0.125,
            beta: 0.125 / 32.0,
            ramped: true,
        };

        host.scratch_enable(1, &params);
        for i in 0..200_000 {
            host.scratch_tick(1, i % 7);
        }
        host.scratch_disable(1);

        assert_eq!(host.tick_count(), 200_000);
        assert_eq!(host.ticks().len(), TICK_HISTORY);
        assert_eq!(host.ticks().last(), Some(&(1, 199_999 % 7)));
    }
}
