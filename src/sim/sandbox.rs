//! In-memory host world
//!
//! A flat ground plane with optional pits, cylindrical pillars, trigger zones
//! and unwalkable regions, plus a list of actors with health. Used by the
//! headless driver and by tests; a real game implements [`Host`] over its own
//! physics and entity storage instead.

use glam::Vec3;

use super::host::{EntityId, Host, Nearby, SurfaceHit};
use crate::horizontal_distance;

/// Circular XZ region (pits, trigger volumes, unwalkable patches)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Zone {
    pub center: Vec3,
    pub radius: f32,
    /// Height of the zone's upper surface (trigger volumes only)
    pub top: f32,
}

impl Zone {
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self {
            center,
            radius,
            top: center.y,
        }
    }

    pub fn with_top(mut self, top: f32) -> Self {
        self.top = top;
        self
    }

    #[inline]
    pub fn contains(&self, point: Vec3) -> bool {
        horizontal_distance(self.center, point) < self.radius
    }
}

/// Solid vertical cylinder standing on `base`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pillar {
    pub base: Vec3,
    pub radius: f32,
    pub height: f32,
}

impl Pillar {
    pub fn new(base: Vec3, radius: f32, height: f32) -> Self {
        Self {
            base,
            radius,
            height,
        }
    }

    #[inline]
    pub fn top(&self) -> f32 {
        self.base.y + self.height
    }
}

#[derive(Debug, Clone)]
pub struct Actor {
    pub id: EntityId,
    pub position: Vec3,
    pub health: f32,
    pub alive: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DamageRecord {
    pub entity: EntityId,
    pub amount: f32,
    pub source: Option<EntityId>,
    pub time: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoveRecord {
    pub entity: EntityId,
    pub from: Vec3,
    pub to: Vec3,
    pub time: f32,
}

/// Simple world implementing [`Host`]
#[derive(Debug, Clone, Default)]
pub struct Sandbox {
    time: f32,
    /// Height of the ground plane (None = bottomless void)
    pub ground: Option<f32>,
    pub pits: Vec<Zone>,
    pub pillars: Vec<Pillar>,
    pub triggers: Vec<Zone>,
    pub unwalkable: Vec<Zone>,
    /// Force every walkability check to this answer
    pub walkable_override: Option<bool>,
    pub actors: Vec<Actor>,
    pub damage_log: Vec<DamageRecord>,
    pub move_log: Vec<MoveRecord>,
    next_id: u32,
}

impl Sandbox {
    /// Ground plane at y = 0, nothing else
    pub fn flat() -> Self {
        Self {
            ground: Some(0.0),
            next_id: 1,
            ..Default::default()
        }
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    /// Advance the host clock
    pub fn advance(&mut self, dt: f32) {
        self.time += dt;
    }

    pub fn spawn_actor(&mut self, position: Vec3, health: f32) -> EntityId {
        let id = EntityId(self.next_id.max(1));
        self.next_id = id.0 + 1;
        self.actors.push(Actor {
            id,
            position,
            health,
            alive: true,
        });
        id
    }

    /// Remove an actor as if it were destroyed by the host
    pub fn despawn(&mut self, id: EntityId) {
        self.actors.retain(|a| a.id != id);
    }

    pub fn actor(&self, id: EntityId) -> Option<&Actor> {
        self.actors.iter().find(|a| a.id == id)
    }

    fn actor_mut(&mut self, id: EntityId) -> Option<&mut Actor> {
        self.actors.iter_mut().find(|a| a.id == id && a.alive)
    }

    /// Total damage dealt to one entity
    pub fn damage_taken(&self, id: EntityId) -> f32 {
        self.damage_log
            .iter()
            .filter(|d| d.entity == id)
            .map(|d| d.amount)
            .sum()
    }

    pub fn moves_of(&self, id: EntityId) -> impl Iterator<Item = &MoveRecord> {
        self.move_log.iter().filter(move |m| m.entity == id)
    }

    /// Ground height under a point, if the ground exists there
    pub fn ground_at(&self, point: Vec3) -> Option<f32> {
        let ground = self.ground?;
        if self.pits.iter().any(|pit| pit.contains(point)) {
            return None;
        }
        Some(ground)
    }
}

impl Host for Sandbox {
    fn query_entities_in_sphere(&self, center: Vec3, radius: f32) -> Vec<Nearby> {
        let mut found: Vec<Nearby> = self
            .actors
            .iter()
            .filter(|a| a.alive && a.position.distance(center) <= radius)
            .map(|a| Nearby {
                id: a.id,
                position: a.position,
            })
            .collect();
        found.sort_by_key(|n| n.id);
        found
    }

    fn apply_damage(&mut self, entity: EntityId, amount: f32, source: Option<EntityId>) -> bool {
        let time = self.time;
        let Some(actor) = self.actor_mut(entity) else {
            return false;
        };
        actor.health -= amount;
        if actor.health <= 0.0 {
            actor.alive = false;
            log::info!("Actor {:?} died", entity);
        }
        self.damage_log.push(DamageRecord {
            entity,
            amount,
            source,
            time,
        });
        true
    }

    fn move_entity_towards(&mut self, entity: EntityId, direction: Vec3, distance: f32) -> bool {
        let time = self.time;
        let Some(actor) = self.actor_mut(entity) else {
            return false;
        };
        let from = actor.position;
        actor.position += direction.normalize_or_zero() * distance;
        let to = actor.position;
        self.move_log.push(MoveRecord {
            entity,
            from,
            to,
            time,
        });
        true
    }

    fn raycast_down(&self, point: Vec3, max_distance: f32) -> Option<SurfaceHit> {
        let mut best: Option<(f32, bool)> = None;
        let mut consider = |surface_y: f32, is_trigger: bool| {
            let distance = point.y - surface_y;
            if (0.0..=max_distance).contains(&distance)
                && best.is_none_or(|(y, _)| surface_y > y)
            {
                best = Some((surface_y, is_trigger));
            }
        };

        if let Some(ground) = self.ground_at(point) {
            consider(ground, false);
        }
        for pillar in &self.pillars {
            if horizontal_distance(pillar.base, point) <= pillar.radius {
                consider(pillar.top(), false);
            }
        }
        for trigger in &self.triggers {
            if trigger.contains(point) {
                consider(trigger.top, true);
            }
        }

        best.map(|(y, is_trigger)| SurfaceHit {
            point: Vec3::new(point.x, y, point.z),
            normal: Vec3::Y,
            distance: point.y - y,
            is_trigger,
        })
    }

    fn is_walkable(&self, point: Vec3) -> bool {
        if let Some(walkable) = self.walkable_override {
            return walkable;
        }
        self.ground_at(point).is_some() && !self.unwalkable.iter().any(|z| z.contains(point))
    }

    fn now(&self) -> f32 {
        self.time
    }

    fn entity_exists(&self, entity: EntityId) -> bool {
        self.actors.iter().any(|a| a.id == entity && a.alive)
    }

    fn sweep(&self, from: Vec3, to: Vec3, radius: f32) -> Option<SurfaceHit> {
        let seg = to - from;
        let len = seg.length();
        if len < 1e-6 {
            return None;
        }

        let mut best: Option<(f32, Vec3)> = None;
        let mut consider = |t: f32, normal: Vec3| {
            if (0.0..=1.0).contains(&t) && best.is_none_or(|(bt, _)| t < bt) {
                best = Some((t, normal));
            }
        };

        // Crossing a horizontal plane at `rest` (sphere center height on contact)
        let plane_t = |rest: f32| -> Option<f32> {
            (from.y >= rest && to.y < rest).then(|| (from.y - rest) / (from.y - to.y))
        };

        if let Some(ground) = self.ground
            && let Some(t) = plane_t(ground + radius)
            && self.ground_at(from + seg * t).is_some()
        {
            consider(t, Vec3::Y);
        }

        for pillar in &self.pillars {
            if let Some(t) = plane_t(pillar.top() + radius)
                && horizontal_distance(pillar.base, from + seg * t) <= pillar.radius
            {
                consider(t, Vec3::Y);
            }

            // Side: 2D ray vs circle inflated by the sphere radius
            let r = pillar.radius + radius;
            let ox = from.x - pillar.base.x;
            let oz = from.z - pillar.base.z;
            let a = seg.x * seg.x + seg.z * seg.z;
            let c = ox * ox + oz * oz - r * r;
            if a > 1e-9 && c > 0.0 {
                let b = 2.0 * (ox * seg.x + oz * seg.z);
                let disc = b * b - 4.0 * a * c;
                if disc >= 0.0 {
                    let t = (-b - disc.sqrt()) / (2.0 * a);
                    let p = from + seg * t;
                    if p.y >= pillar.base.y - radius && p.y <= pillar.top() {
                        let normal = Vec3::new(p.x - pillar.base.x, 0.0, p.z - pillar.base.z)
                            .normalize_or(Vec3::X);
                        consider(t, normal);
                    }
                }
            }
        }

        best.map(|(t, normal)| SurfaceHit {
            point: from + seg * t,
            normal,
            distance: len * t,
            is_trigger: false,
        })
    }

    fn is_sphere_blocked(&self, center: Vec3, radius: f32) -> bool {
        if let Some(ground) = self.ground_at(center)
            && center.y - radius < ground - 1e-3
        {
            return true;
        }
        self.pillars.iter().any(|p| {
            horizontal_distance(p.base, center) < p.radius + radius
                && center.y + radius > p.base.y
                && center.y - radius < p.top()
        })
    }
}
