//! Thrown projectile: flight, bounces and fuse
//!
//! A projectile integrates under gravity while Flying or Armed, sweeps its
//! collision sphere against host geometry each tick, and bounces with
//! restitution. When its fuse runs out it detonates exactly once, stops
//! moving and hands a [`Detonation`] to the caller.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::ballistic;
use super::effect::EffectSpec;
use super::events::{EffectId, ProjectileId, SimEvent};
use super::fuse::{Fuse, FuseState};
use super::host::{EntityId, Host};
use crate::consts::GRAVITY;

/// Below this speed a projectile lying on a floor comes to rest
const REST_SPEED: f32 = 0.3;
/// Contacts with normals steeper than this count as floors
const FLOOR_NORMAL_Y: f32 = 0.7;

/// Physical and fuse parameters of a thrown item
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectileConfig {
    /// Seconds from arming to activation
    pub fuse_duration: f32,
    /// Fuse only starts on first contact
    pub arm_on_collision: bool,
    /// Arm anyway after this long airborne (arm-on-collision only)
    pub arm_timeout: Option<f32>,
    /// Collision sphere radius
    pub radius: f32,
    /// Fraction of normal speed kept after a bounce
    pub bounciness: f32,
    /// Fraction of tangential speed lost on a bounce
    pub friction: f32,
    pub gravity: f32,
}

impl Default for ProjectileConfig {
    fn default() -> Self {
        Self {
            fuse_duration: 2.0,
            arm_on_collision: false,
            arm_timeout: None,
            radius: 0.15,
            bounciness: 0.4,
            friction: 0.3,
            gravity: GRAVITY,
        }
    }
}

/// What a projectile produces at the moment it activates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detonation {
    pub projectile: ProjectileId,
    pub center: Vec3,
    pub spec: EffectSpec,
    pub thrower: Option<EntityId>,
}

#[derive(Debug, Clone)]
pub struct Projectile {
    id: ProjectileId,
    pub position: Vec3,
    pub velocity: Vec3,
    fuse: Fuse,
    thrower: Option<EntityId>,
    effect: EffectSpec,
    config: ProjectileConfig,
    /// Lying still on a floor; no more integration
    resting: bool,
    /// Area effect spawned by this projectile, while it runs
    spawned_effect: Option<EffectId>,
}

impl Projectile {
    /// Create a projectile whose launch velocity lands it on `target`
    pub fn launch(
        id: ProjectileId,
        start: Vec3,
        target: Vec3,
        launch_speed: f32,
        thrower: Option<EntityId>,
        config: ProjectileConfig,
        effect: EffectSpec,
    ) -> Self {
        let velocity = ballistic::solve(start, target, launch_speed, config.gravity);
        log::debug!(
            "Projectile {:?} launched from {:?} toward {:?} (v = {:?})",
            id,
            start,
            target,
            velocity
        );
        Self::with_velocity(id, start, velocity, thrower, config, effect)
    }

    /// Create a projectile with an explicit velocity (dropped or fired items)
    pub fn with_velocity(
        id: ProjectileId,
        start: Vec3,
        velocity: Vec3,
        thrower: Option<EntityId>,
        config: ProjectileConfig,
        effect: EffectSpec,
    ) -> Self {
        Self {
            id,
            position: start,
            velocity,
            fuse: Fuse::new(config.fuse_duration, config.arm_on_collision)
                .with_arm_timeout(config.arm_timeout),
            thrower,
            effect,
            config,
            resting: false,
            spawned_effect: None,
        }
    }

    pub fn id(&self) -> ProjectileId {
        self.id
    }

    pub fn state(&self) -> FuseState {
        self.fuse.state()
    }

    pub fn fuse(&self) -> &Fuse {
        &self.fuse
    }

    pub fn thrower(&self) -> Option<EntityId> {
        self.thrower
    }

    pub fn effect(&self) -> &EffectSpec {
        &self.effect
    }

    pub fn is_resting(&self) -> bool {
        self.resting
    }

    pub fn spawned_effect(&self) -> Option<EffectId> {
        self.spawned_effect
    }

    pub fn is_expired(&self) -> bool {
        self.fuse.state() == FuseState::Expired
    }

    /// Advance one frame. Returns the detonation on the tick the fuse runs out.
    pub fn tick<H>(&mut self, host: &H, dt: f32, events: &mut Vec<SimEvent>) -> Option<Detonation>
    where
        H: Host + ?Sized,
    {
        if dt.is_nan() || dt <= 0.0 {
            return None;
        }
        if matches!(self.fuse.state(), FuseState::Activated | FuseState::Expired) {
            return None;
        }

        if !self.resting {
            self.integrate(host, dt, events);
        }

        let was_flying = self.fuse.state() == FuseState::Flying;
        let due = self.fuse.tick(dt);
        if was_flying && self.fuse.state() == FuseState::Armed {
            events.push(SimEvent::Armed {
                projectile: self.id,
            });
        }

        if due { self.detonate() } else { None }
    }

    /// Activate now (fuse ran out or host-forced). Only the first call
    /// returns a detonation.
    pub fn detonate(&mut self) -> Option<Detonation> {
        if !self.fuse.activate() {
            log::debug!("Projectile {:?} already activated", self.id);
            return None;
        }
        self.velocity = Vec3::ZERO;
        self.resting = true;
        log::info!("Projectile {:?} activated at {:?}", self.id, self.position);
        Some(Detonation {
            projectile: self.id,
            center: self.position,
            spec: self.effect,
            thrower: self.thrower,
        })
    }

    /// Link the area effect this projectile spawned
    pub fn attach_effect(&mut self, effect: EffectId) {
        self.spawned_effect = Some(effect);
    }

    /// Mark the projectile done. Returns false if it already was.
    pub fn finish(&mut self, events: &mut Vec<SimEvent>) -> bool {
        if !self.fuse.expire() {
            return false;
        }
        self.spawned_effect = None;
        events.push(SimEvent::Expired {
            projectile: self.id,
        });
        true
    }

    fn integrate<H>(&mut self, host: &H, dt: f32, events: &mut Vec<SimEvent>)
    where
        H: Host + ?Sized,
    {
        self.velocity.y -= self.config.gravity * dt;
        let next = self.position + self.velocity * dt;

        let Some(hit) = host.sweep(self.position, next, self.config.radius) else {
            self.position = next;
            return;
        };

        self.position = hit.point;
        let normal_speed = self.velocity.dot(hit.normal);
        let normal_part = hit.normal * normal_speed;
        let tangent_part = self.velocity - normal_part;
        let bounced = tangent_part * (1.0 - self.config.friction).max(0.0)
            - normal_part * self.config.bounciness.max(0.0);
        self.velocity = bounced;

        let speed = bounced.length();
        events.push(SimEvent::Bounced {
            projectile: self.id,
            point: hit.point,
            speed,
        });
        if self.fuse.on_collision() {
            log::debug!("Projectile {:?} armed on contact", self.id);
            events.push(SimEvent::Armed {
                projectile: self.id,
            });
        }

        if hit.normal.y > FLOOR_NORMAL_Y && speed < REST_SPEED {
            self.velocity = Vec3::ZERO;
            self.resting = true;
        }
    }
}
