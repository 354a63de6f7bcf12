//! Area query & effect engine
//!
//! An [`AreaEffectInstance`] is spawned where a projectile detonates and then
//! lives on its own: the projectile may be despawned while the effect keeps
//! running. Each tick it queries the sphere around its fixed center and pulls
//! and/or damages everything that qualifies. Teleport and burst effects do
//! their work once at activation and end immediately.

use glam::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::events::{EffectId, ProjectileId, SimEvent};
use super::host::{EntityId, Host};
use super::ledger::{CooldownLedger, RelocationGuard};
use super::placement::{self, PlacementQuery};
use crate::consts::*;

/// What the effect does to entities in range
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum EffectKind {
    /// Drag entities toward the center
    Pull { force: f32 },
    /// Relocate every entity in range once, to a random valid point
    TeleportRandom {
        min_distance: f32,
        max_distance: f32,
        #[serde(default = "default_attempts")]
        attempts: u32,
    },
    /// Damage only (burst if `duration` is zero, lingering otherwise)
    DamageOnly,
}

fn default_attempts() -> u32 {
    PLACEMENT_ATTEMPTS
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum DamageRate {
    /// Scaled by the tick interval
    PerSecond(f32),
    /// Flat amount per application
    PerTick(f32),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DamageSpec {
    pub rate: DamageRate,
    /// Minimum seconds between applications to the same entity
    pub interval: f32,
    /// Damage doubles within this distance of the center
    #[serde(default)]
    pub core_radius: f32,
}

impl DamageSpec {
    /// Amount dealt by one application outside the core
    pub fn amount_per_application(&self) -> f32 {
        match self.rate {
            DamageRate::PerSecond(dps) => dps * self.interval,
            DamageRate::PerTick(amount) => amount,
        }
    }

    /// Amount dealt to an entity at `distance` from the center
    pub fn amount_at(&self, distance: f32) -> f32 {
        let base = self.amount_per_application();
        if distance <= self.core_radius {
            base * 2.0
        } else {
            base
        }
    }
}

/// Parameters for the effect a projectile produces when it activates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EffectSpec {
    pub kind: EffectKind,
    pub radius: f32,
    /// Seconds the effect lasts (ignored by teleport)
    #[serde(default)]
    pub duration: f32,
    #[serde(default)]
    pub damage: Option<DamageSpec>,
    #[serde(default)]
    pub can_affect_owner: bool,
}

impl EffectSpec {
    /// True if the effect does all its work at activation
    pub fn is_instantaneous(&self) -> bool {
        matches!(self.kind, EffectKind::TeleportRandom { .. }) || self.duration <= 0.0
    }

    pub fn pull_force(&self) -> f32 {
        match self.kind {
            EffectKind::Pull { force } => force.max(0.0),
            _ => 0.0,
        }
    }
}

/// Pull strength at `distance` from the center
///
/// Falls off linearly toward the edge but never below
/// [`PULL_FLOOR_FRACTION`] of `force`.
pub fn pull_strength(force: f32, radius: f32, distance: f32) -> f32 {
    let falloff = if radius > 0.0 {
        1.0 - distance / radius
    } else {
        0.0
    };
    (force * falloff).max(force * PULL_FLOOR_FRACTION)
}

/// How far to move an entity this tick; never past the center
pub fn pull_step(force: f32, radius: f32, distance: f32, dt: f32) -> f32 {
    if distance < PULL_MIN_DISTANCE {
        return 0.0;
    }
    (pull_strength(force, radius, distance) * dt).min(distance)
}

/// A live area effect, detached from the projectile that spawned it
#[derive(Debug, Clone)]
pub struct AreaEffectInstance {
    id: EffectId,
    source: Option<ProjectileId>,
    center: Vec3,
    spec: EffectSpec,
    owner: Option<EntityId>,
    /// Seconds since activation; the ledger's clock
    elapsed: f32,
    remaining: f32,
    ledger: CooldownLedger,
    finished: bool,
}

impl AreaEffectInstance {
    pub fn new(
        id: EffectId,
        center: Vec3,
        spec: EffectSpec,
        owner: Option<EntityId>,
        source: Option<ProjectileId>,
    ) -> Self {
        Self {
            id,
            source,
            center,
            spec,
            owner,
            elapsed: 0.0,
            remaining: spec.duration.max(0.0),
            ledger: CooldownLedger::new(),
            finished: false,
        }
    }

    pub fn id(&self) -> EffectId {
        self.id
    }

    pub fn source(&self) -> Option<ProjectileId> {
        self.source
    }

    pub fn center(&self) -> Vec3 {
        self.center
    }

    pub fn spec(&self) -> &EffectSpec {
        &self.spec
    }

    pub fn remaining(&self) -> f32 {
        self.remaining
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Entities currently tracked by the cooldown ledger
    pub fn tracked_entities(&self) -> usize {
        self.ledger.len()
    }

    /// The owner is only excluded while it is the entity being considered;
    /// an owner that no longer exists never matches a queried entity.
    fn qualifies(&self, entity: EntityId) -> bool {
        self.spec.can_affect_owner || self.owner != Some(entity)
    }

    fn damage_source<H: Host + ?Sized>(&self, host: &H) -> Option<EntityId> {
        self.owner.filter(|owner| host.entity_exists(*owner))
    }

    /// Run the activation-time work. Instantaneous effects finish here.
    pub fn activate<H, R>(
        &mut self,
        host: &mut H,
        rng: &mut R,
        guard: &mut RelocationGuard,
        events: &mut Vec<SimEvent>,
    ) where
        H: Host + ?Sized,
        R: Rng + ?Sized,
    {
        if self.finished {
            return;
        }
        match self.spec.kind {
            EffectKind::TeleportRandom {
                min_distance,
                max_distance,
                attempts,
            } => {
                let query = PlacementQuery::new(self.center, min_distance, max_distance)
                    .with_attempts(attempts);
                self.relocate_all(host, rng, guard, &query, events);
                self.teardown(events);
            }
            _ if self.spec.is_instantaneous() => {
                self.burst(host, events);
                self.teardown(events);
            }
            _ => {
                // Entities already in range at detonation start their clocks at zero
                for nearby in host.query_entities_in_sphere(self.center, self.spec.radius) {
                    if self.qualifies(nearby.id) {
                        self.ledger.track(nearby.id, 0.0);
                    }
                }
                log::debug!(
                    "Effect {:?} primed with {} entities in range",
                    self.id,
                    self.ledger.len()
                );
            }
        }
    }

    /// Advance a duration-based effect by one frame
    pub fn tick<H>(&mut self, host: &mut H, dt: f32, events: &mut Vec<SimEvent>)
    where
        H: Host + ?Sized,
    {
        if self.finished || dt.is_nan() || dt <= 0.0 {
            return;
        }

        self.elapsed += dt;
        self.remaining = (self.remaining - dt).max(0.0);
        let now = self.elapsed;
        let force = self.spec.pull_force();
        let source = self.damage_source(&*host);

        for nearby in host.query_entities_in_sphere(self.center, self.spec.radius) {
            if !self.qualifies(nearby.id) {
                continue;
            }
            let offset = self.center - nearby.position;
            let distance = offset.length();

            if force > 0.0 {
                let step = pull_step(force, self.spec.radius, distance, dt);
                if step > 0.0 && !host.move_entity_towards(nearby.id, offset / distance, step) {
                    continue;
                }
            }

            if let Some(damage) = self.spec.damage {
                self.ledger.track(nearby.id, now);
                if self.ledger.should_apply(nearby.id, now, damage.interval) {
                    let amount = damage.amount_at(distance);
                    if host.apply_damage(nearby.id, amount, source) {
                        self.ledger.record(nearby.id, now);
                        events.push(SimEvent::Damaged {
                            effect: self.id,
                            entity: nearby.id,
                            amount,
                        });
                    }
                }
            }
        }

        if self.remaining <= TIME_EPSILON {
            self.teardown(events);
        }
    }

    /// Hard-stop the effect (scene unload)
    pub fn cancel(&mut self, events: &mut Vec<SimEvent>) {
        if !self.finished {
            log::info!("Effect {:?} cancelled with {:.2}s left", self.id, self.remaining);
            self.teardown(events);
        }
    }

    fn teardown(&mut self, events: &mut Vec<SimEvent>) {
        self.finished = true;
        self.remaining = 0.0;
        self.ledger.clear();
        events.push(SimEvent::EffectEnded { effect: self.id });
        log::debug!("Effect {:?} ended after {:.2}s", self.id, self.elapsed);
    }

    fn burst<H>(&mut self, host: &mut H, events: &mut Vec<SimEvent>)
    where
        H: Host + ?Sized,
    {
        let Some(damage) = self.spec.damage else {
            log::warn!("Burst effect {:?} has no damage configured", self.id);
            return;
        };
        let source = self.damage_source(&*host);
        for nearby in host.query_entities_in_sphere(self.center, self.spec.radius) {
            if !self.qualifies(nearby.id) {
                continue;
            }
            let amount = damage.amount_at(self.center.distance(nearby.position));
            if host.apply_damage(nearby.id, amount, source) {
                events.push(SimEvent::Damaged {
                    effect: self.id,
                    entity: nearby.id,
                    amount,
                });
            }
        }
    }

    fn relocate_all<H, R>(
        &mut self,
        host: &mut H,
        rng: &mut R,
        guard: &mut RelocationGuard,
        query: &PlacementQuery,
        events: &mut Vec<SimEvent>,
    ) where
        H: Host + ?Sized,
        R: Rng + ?Sized,
    {
        let now = host.now();
        let targets = host.query_entities_in_sphere(self.center, self.spec.radius);
        let mut moved = 0;

        for nearby in targets {
            if !self.qualifies(nearby.id) {
                continue;
            }
            if !guard.can_relocate(nearby.id, now) {
                log::debug!("Entity {:?} relocated too recently, skipping", nearby.id);
                continue;
            }

            let destination = placement::place(&*host, rng, query).point;
            let offset = destination - nearby.position;
            if host.move_entity_towards(nearby.id, offset.normalize_or_zero(), offset.length()) {
                guard.record(nearby.id, now);
                moved += 1;
                events.push(SimEvent::Relocated {
                    effect: self.id,
                    entity: nearby.id,
                    from: nearby.position,
                    to: destination,
                });
            }
        }

        log::info!("Effect {:?} relocated {} entities", self.id, moved);
    }
}
