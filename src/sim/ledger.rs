//! Per-entity cooldown ledger
//!
//! Each entity gets its own clock: the first sighting starts it, and an effect
//! may be applied again once `interval` has passed since the last application.
//! A ledger belongs to exactly one owner and is dropped with it; entities that
//! vanish simply stop being looked up.

use std::collections::HashMap;

use super::host::EntityId;
use crate::consts::TIME_EPSILON;

#[derive(Debug, Clone, Default)]
pub struct CooldownLedger {
    last_applied: HashMap<EntityId, f32>,
}

impl CooldownLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start an entity's clock at `now` if it has none yet.
    /// Returns true on the first sighting.
    pub fn track(&mut self, entity: EntityId, now: f32) -> bool {
        if self.last_applied.contains_key(&entity) {
            return false;
        }
        self.last_applied.insert(entity, now);
        true
    }

    /// Whether `interval` has elapsed since the entity's last application.
    /// Untracked entities never qualify.
    pub fn should_apply(&self, entity: EntityId, now: f32, interval: f32) -> bool {
        match self.last_applied.get(&entity) {
            Some(&last) => now - last + TIME_EPSILON >= interval,
            None => false,
        }
    }

    /// Whether the entity is untracked or its cooldown has run out
    pub fn is_ready(&self, entity: EntityId, now: f32, interval: f32) -> bool {
        !self.last_applied.contains_key(&entity) || self.should_apply(entity, now, interval)
    }

    /// Record an application at `now`
    pub fn record(&mut self, entity: EntityId, now: f32) {
        self.last_applied.insert(entity, now);
    }

    pub fn last_applied(&self, entity: EntityId) -> Option<f32> {
        self.last_applied.get(&entity).copied()
    }

    pub fn len(&self) -> usize {
        self.last_applied.len()
    }

    pub fn is_empty(&self) -> bool {
        self.last_applied.is_empty()
    }

    pub fn clear(&mut self) {
        self.last_applied.clear();
    }

    /// Drop entries older than `max_age` (for long-lived ledgers)
    pub fn prune(&mut self, now: f32, max_age: f32) {
        self.last_applied.retain(|_, last| now - *last < max_age);
    }
}

/// Simulation-wide guard against relocating the same entity repeatedly
///
/// Keyed on host time, so overlapping wormholes that detonate within
/// `cooldown` seconds of each other move an entity only once.
#[derive(Debug, Clone, Default)]
pub struct RelocationGuard {
    ledger: CooldownLedger,
    pub cooldown: f32,
}

impl RelocationGuard {
    pub fn new(cooldown: f32) -> Self {
        Self {
            ledger: CooldownLedger::new(),
            cooldown: cooldown.max(0.0),
        }
    }

    pub fn can_relocate(&self, entity: EntityId, now: f32) -> bool {
        self.ledger.is_ready(entity, now, self.cooldown)
    }

    pub fn record(&mut self, entity: EntityId, now: f32) {
        self.ledger.record(entity, now);
        self.ledger.prune(now, self.cooldown.max(TIME_EPSILON));
    }

    pub fn clear(&mut self) {
        self.ledger.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_sighting_starts_clock() {
        let mut ledger = CooldownLedger::new();
        let a = EntityId(1);
        assert!(!ledger.should_apply(a, 10.0, 0.5));
        assert!(ledger.track(a, 1.0));
        assert!(!ledger.track(a, 2.0));
        assert_eq!(ledger.last_applied(a), Some(1.0));
        assert!(!ledger.should_apply(a, 1.4, 0.5));
        assert!(ledger.should_apply(a, 1.5, 0.5));
    }

    #[test]
    fn test_independent_clocks() {
        let mut ledger = CooldownLedger::new();
        let (a, b) = (EntityId(1), EntityId(2));
        ledger.track(a, 0.0);
        ledger.track(b, 0.3);

        assert!(ledger.should_apply(a, 0.5, 0.5));
        assert!(!ledger.should_apply(b, 0.5, 0.5));
        ledger.record(a, 0.5);

        assert!(ledger.should_apply(b, 0.8, 0.5));
        assert!(!ledger.should_apply(a, 0.8, 0.5));
    }

    #[test]
    fn test_is_ready_for_unknown_entity() {
        let mut ledger = CooldownLedger::new();
        let a = EntityId(7);
        assert!(ledger.is_ready(a, 0.0, 3.0));
        ledger.record(a, 0.0);
        assert!(!ledger.is_ready(a, 1.0, 3.0));
        assert!(ledger.is_ready(a, 3.0, 3.0));
    }

    #[test]
    fn test_prune_and_clear() {
        let mut ledger = CooldownLedger::new();
        ledger.record(EntityId(1), 0.0);
        ledger.record(EntityId(2), 5.0);
        ledger.prune(6.0, 3.0);
        assert_eq!(ledger.len(), 1);
        assert!(ledger.last_applied(EntityId(1)).is_none());
        ledger.clear();
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_relocation_guard() {
        let mut guard = RelocationGuard::new(1.0);
        let a = EntityId(3);
        assert!(guard.can_relocate(a, 0.0));
        guard.record(a, 0.0);
        assert!(!guard.can_relocate(a, 0.5));
        assert!(guard.can_relocate(a, 1.0));
        assert!(guard.can_relocate(EntityId(4), 0.5));
    }
}
