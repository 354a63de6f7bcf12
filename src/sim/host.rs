//! Host capability surface
//!
//! The simulation never touches engine objects directly. Everything it needs
//! from the game world goes through [`Host`], which the embedding game (or the
//! in-memory [`super::sandbox::Sandbox`]) implements.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Opaque identity of a host entity (actor, enemy, player)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u32);

/// An entity returned by a sphere query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Nearby {
    pub id: EntityId,
    pub position: Vec3,
}

/// Result of a ray or sweep against world geometry
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceHit {
    /// Contact point
    pub point: Vec3,
    /// Surface normal at the contact (unit length)
    pub normal: Vec3,
    /// Distance travelled along the ray before the hit
    pub distance: f32,
    /// Hit a trigger volume rather than solid geometry
    pub is_trigger: bool,
}

/// Capabilities the host world must expose to the simulation
///
/// Implementations report vanished entities by returning `false` from the
/// mutating calls; the simulation treats that as a skip.
pub trait Host {
    /// All entities whose position lies within `radius` of `center`
    fn query_entities_in_sphere(&self, center: Vec3, radius: f32) -> Vec<Nearby>;

    /// Apply damage to an entity. Returns false if the entity no longer exists.
    fn apply_damage(&mut self, entity: EntityId, amount: f32, source: Option<EntityId>) -> bool;

    /// Displace an entity along `direction` by `distance` (teleport or nudge).
    /// Returns false if the entity no longer exists.
    fn move_entity_towards(&mut self, entity: EntityId, direction: Vec3, distance: f32) -> bool;

    /// Cast straight down from `point` up to `max_distance`
    fn raycast_down(&self, point: Vec3, max_distance: f32) -> Option<SurfaceHit>;

    /// Navigation validity of a ground point
    fn is_walkable(&self, point: Vec3) -> bool;

    /// Monotonic simulation clock in seconds
    fn now(&self) -> f32;

    /// Whether an entity is still alive in the host world
    fn entity_exists(&self, entity: EntityId) -> bool;

    /// Sweep a sphere of `radius` from `from` to `to` against solid geometry.
    /// The hit point is the sphere center at first contact; triggers are ignored.
    fn sweep(&self, from: Vec3, to: Vec3, radius: f32) -> Option<SurfaceHit>;

    /// True if solid geometry overlaps the sphere
    fn is_sphere_blocked(&self, center: Vec3, radius: f32) -> bool;
}
