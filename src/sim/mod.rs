//! Deterministic simulation module
//!
//! All grenade logic lives here. This module must be pure and deterministic:
//! - Caller-driven frame steps only
//! - Seeded RNG only
//! - Stable iteration order (by id)
//! - No engine dependencies; the world is reached through [`Host`]

pub mod ballistic;
pub mod effect;
pub mod events;
pub mod fuse;
pub mod host;
pub mod ledger;
pub mod placement;
pub mod projectile;
pub mod sandbox;
pub mod world;

pub use ballistic::{BallisticSolution, position_at, solve, solve_lob, solve_with_time, trajectory_points};
pub use effect::{AreaEffectInstance, DamageRate, DamageSpec, EffectKind, EffectSpec, pull_strength};
pub use events::{EffectId, ProjectileId, SimEvent};
pub use fuse::{Fuse, FuseState};
pub use host::{EntityId, Host, Nearby, SurfaceHit};
pub use ledger::{CooldownLedger, RelocationGuard};
pub use placement::{Placement, PlacementQuery, PlacementSource, find_position, place};
pub use projectile::{Detonation, Projectile, ProjectileConfig};
pub use sandbox::{Pillar, Sandbox, Zone};
pub use world::Simulation;
