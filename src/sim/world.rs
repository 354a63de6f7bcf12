//! Simulation root
//!
//! Owns every live projectile and area effect, the seeded RNG and the
//! relocation guard. The host calls [`Simulation::tick`] once per frame and
//! drains [`SimEvent`]s afterwards to drive its visuals.

use glam::Vec3;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::effect::{AreaEffectInstance, EffectSpec};
use super::events::{EffectId, ProjectileId, SimEvent};
use super::host::{EntityId, Host};
use super::ledger::RelocationGuard;
use super::projectile::{Detonation, Projectile, ProjectileConfig};
use crate::consts::RELOCATION_COOLDOWN;
use crate::tuning::{GrenadePreset, Tuning};

pub struct Simulation {
    seed: u64,
    rng: Pcg32,
    /// Live projectiles (sorted by id for determinism)
    projectiles: Vec<Projectile>,
    /// Running area effects (sorted by id for determinism)
    effects: Vec<AreaEffectInstance>,
    relocation_guard: RelocationGuard,
    events: Vec<SimEvent>,
    /// Frames simulated
    ticks: u64,
    next_id: u32,
}

impl Simulation {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            projectiles: Vec::new(),
            effects: Vec::new(),
            relocation_guard: RelocationGuard::new(RELOCATION_COOLDOWN),
            events: Vec::new(),
            ticks: 0,
            next_id: 1,
        }
    }

    /// Create a simulation using the world-level settings from `tuning`
    pub fn from_tuning(seed: u64, tuning: &Tuning) -> Self {
        let mut sim = Self::new(seed);
        sim.relocation_guard = RelocationGuard::new(tuning.relocation_cooldown);
        sim
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    fn next_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Throw a projectile at `target`
    pub fn launch(
        &mut self,
        start: Vec3,
        target: Vec3,
        launch_speed: f32,
        thrower: Option<EntityId>,
        config: ProjectileConfig,
        effect: EffectSpec,
    ) -> ProjectileId {
        let id = ProjectileId(self.next_id());
        let projectile =
            Projectile::launch(id, start, target, launch_speed, thrower, config, effect);
        self.projectiles.push(projectile);
        id
    }

    /// Throw a configured item
    pub fn launch_preset(
        &mut self,
        start: Vec3,
        target: Vec3,
        thrower: Option<EntityId>,
        preset: &GrenadePreset,
    ) -> ProjectileId {
        self.launch(
            start,
            target,
            preset.launch_speed,
            thrower,
            preset.projectile,
            preset.effect,
        )
    }

    /// Spawn an effect directly, without a projectile (badge-style abilities)
    pub fn spawn_effect<H>(
        &mut self,
        host: &mut H,
        center: Vec3,
        spec: EffectSpec,
        owner: Option<EntityId>,
    ) -> EffectId
    where
        H: Host + ?Sized,
    {
        let id = EffectId(self.next_id());
        let mut effect = AreaEffectInstance::new(id, center, spec, owner, None);
        effect.activate(host, &mut self.rng, &mut self.relocation_guard, &mut self.events);
        if !effect.is_finished() {
            self.effects.push(effect);
        }
        id
    }

    /// Advance everything by one frame
    pub fn tick<H>(&mut self, host: &mut H, dt: f32)
    where
        H: Host + ?Sized,
    {
        if dt.is_nan() || dt <= 0.0 {
            return;
        }
        self.ticks += 1;

        // Effects spawned this frame get their first tick next frame
        for effect in &mut self.effects {
            effect.tick(host, dt, &mut self.events);
        }
        self.retire_finished_effects();

        let mut detonations = Vec::new();
        for projectile in &mut self.projectiles {
            if let Some(detonation) = projectile.tick(&*host, dt, &mut self.events) {
                detonations.push(detonation);
            }
        }
        for detonation in detonations {
            self.resolve_detonation(host, detonation);
        }

        self.projectiles.retain(|p| !p.is_expired());
    }

    /// Force a projectile to activate now. Repeated calls do nothing.
    pub fn detonate<H>(&mut self, host: &mut H, id: ProjectileId) -> Option<EffectId>
    where
        H: Host + ?Sized,
    {
        let detonation = self.projectiles.iter_mut().find(|p| p.id() == id)?.detonate()?;
        let effect = self.resolve_detonation(host, detonation);
        self.projectiles.retain(|p| !p.is_expired());
        effect
    }

    fn resolve_detonation<H>(&mut self, host: &mut H, detonation: Detonation) -> Option<EffectId>
    where
        H: Host + ?Sized,
    {
        let id = EffectId(self.next_id());
        let mut effect = AreaEffectInstance::new(
            id,
            detonation.center,
            detonation.spec,
            detonation.thrower,
            Some(detonation.projectile),
        );

        // Activated precedes anything the effect itself emits
        self.events.push(SimEvent::Activated {
            projectile: detonation.projectile,
            center: detonation.center,
            effect: (!detonation.spec.is_instantaneous()).then_some(id),
        });
        effect.activate(host, &mut self.rng, &mut self.relocation_guard, &mut self.events);
        let finished = effect.is_finished();

        let projectile = self
            .projectiles
            .iter_mut()
            .find(|p| p.id() == detonation.projectile);
        if finished {
            if let Some(projectile) = projectile {
                projectile.finish(&mut self.events);
            }
            None
        } else {
            if let Some(projectile) = projectile {
                projectile.attach_effect(id);
            }
            self.effects.push(effect);
            Some(id)
        }
    }

    fn retire_finished_effects(&mut self) {
        let (finished, running): (Vec<_>, Vec<_>) =
            self.effects.drain(..).partition(|e| e.is_finished());
        self.effects = running;

        for effect in finished {
            let Some(source) = effect.source() else {
                continue;
            };
            if let Some(projectile) = self.projectiles.iter_mut().find(|p| p.id() == source) {
                projectile.finish(&mut self.events);
            }
        }
    }

    /// The host destroyed a projectile object. A running effect it spawned
    /// keeps going on its own.
    pub fn remove_projectile(&mut self, id: ProjectileId) -> bool {
        let before = self.projectiles.len();
        self.projectiles.retain(|p| p.id() != id);
        self.projectiles.len() != before
    }

    /// Scene unload: hard-stop every effect, expire and drop every projectile
    pub fn unload(&mut self) {
        log::info!(
            "Unloading simulation: {} projectiles, {} effects",
            self.projectiles.len(),
            self.effects.len()
        );
        for effect in &mut self.effects {
            effect.cancel(&mut self.events);
        }
        for projectile in &mut self.projectiles {
            projectile.finish(&mut self.events);
        }
        self.effects.clear();
        self.projectiles.clear();
        self.relocation_guard.clear();
    }

    /// True once the projectile has finished (or is no longer tracked)
    pub fn is_expired(&self, id: ProjectileId) -> bool {
        self.projectile(id).is_none_or(|p| p.is_expired())
    }

    pub fn projectile(&self, id: ProjectileId) -> Option<&Projectile> {
        self.projectiles.iter().find(|p| p.id() == id)
    }

    pub fn effect(&self, id: EffectId) -> Option<&AreaEffectInstance> {
        self.effects.iter().find(|e| e.id() == id)
    }

    pub fn projectiles(&self) -> &[Projectile] {
        &self.projectiles
    }

    pub fn effects(&self) -> &[AreaEffectInstance] {
        &self.effects
    }

    /// Nothing in flight and no effect running
    pub fn is_idle(&self) -> bool {
        self.projectiles.is_empty() && self.effects.is_empty()
    }

    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::effect::{DamageRate, DamageSpec, EffectKind};
    use crate::sim::fuse::FuseState;
    use crate::sim::sandbox::Sandbox;

    const DT: f32 = 1.0 / 60.0;

    fn step(sim: &mut Simulation, host: &mut Sandbox, seconds: f32) {
        let steps = (seconds / DT).round() as usize;
        for _ in 0..steps {
            host.advance(DT);
            sim.tick(host, DT);
        }
    }

    fn quick_fuse() -> ProjectileConfig {
        ProjectileConfig {
            fuse_duration: 0.0,
            ..Default::default()
        }
    }

    fn wormhole() -> EffectSpec {
        EffectSpec {
            kind: EffectKind::TeleportRandom {
                min_distance: 8.0,
                max_distance: 15.0,
                attempts: 50,
            },
            radius: 4.0,
            duration: 0.0,
            damage: None,
            can_affect_owner: false,
        }
    }

    fn black_hole() -> EffectSpec {
        EffectSpec {
            kind: EffectKind::Pull { force: 3.0 },
            radius: 5.0,
            duration: 1.0,
            damage: Some(DamageSpec {
                rate: DamageRate::PerSecond(20.0),
                interval: 0.5,
                core_radius: 1.0,
            }),
            can_affect_owner: false,
        }
    }

    #[test]
    fn test_teleport_scenario_three_entities() {
        let mut host = Sandbox::flat();
        let thrower = host.spawn_actor(Vec3::new(-20.0, 0.0, 0.0), 100.0);
        let ids: Vec<_> = [(1.0, 0.0), (-1.0, 1.0), (0.0, -1.5)]
            .iter()
            .map(|&(x, z)| host.spawn_actor(Vec3::new(x, 0.0, z), 100.0))
            .collect();

        let mut sim = Simulation::new(7);
        let start = Vec3::new(0.0, 1.0, 0.0);
        let id = sim.launch(start, start, 1.0, Some(thrower), quick_fuse(), wormhole());
        step(&mut sim, &mut host, 1.0);

        for entity in &ids {
            assert_eq!(host.moves_of(*entity).count(), 1);
        }
        assert_eq!(host.moves_of(thrower).count(), 0);
        assert!(sim.is_expired(id));
        assert!(sim.is_idle());

        let events = sim.drain_events();
        assert!(events.iter().any(|e| matches!(
            e,
            SimEvent::Activated { effect: None, .. }
        )));
        assert!(events.iter().any(|e| matches!(e, SimEvent::Expired { projectile } if *projectile == id)));
    }

    #[test]
    fn test_double_activation_spawns_one_effect() {
        let mut host = Sandbox::flat();
        let mut sim = Simulation::new(1);
        let config = ProjectileConfig {
            fuse_duration: 10.0,
            ..Default::default()
        };
        let id = sim.launch(Vec3::Y, Vec3::new(5.0, 0.0, 0.0), 4.0, None, config, black_hole());

        let first = sim.detonate(&mut host, id);
        let second = sim.detonate(&mut host, id);
        step(&mut sim, &mut host, 0.1);

        assert!(first.is_some());
        assert!(second.is_none());
        assert_eq!(sim.effects().len(), 1);
        let activations = sim
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, SimEvent::Activated { .. }))
            .count();
        assert_eq!(activations, 1);
    }

    #[test]
    fn test_effect_outlives_removed_projectile() {
        let mut host = Sandbox::flat();
        let victim = host.spawn_actor(Vec3::new(2.0, 0.0, 0.0), 1000.0);
        let mut sim = Simulation::new(1);
        let id = sim.launch(Vec3::ZERO, Vec3::ZERO, 1.0, None, quick_fuse(), black_hole());

        step(&mut sim, &mut host, 0.1);
        let effect = sim.projectile(id).and_then(|p| p.spawned_effect());
        assert!(effect.is_some());
        assert!(!sim.is_expired(id));

        assert!(sim.remove_projectile(id));
        step(&mut sim, &mut host, 0.6);
        assert!(host.damage_taken(victim) > 0.0);
        assert_eq!(sim.effects().len(), 1);

        step(&mut sim, &mut host, 1.0);
        assert!(sim.is_idle());
    }

    #[test]
    fn test_projectile_expires_when_effect_finishes() {
        let mut host = Sandbox::flat();
        let mut sim = Simulation::new(1);
        let id = sim.launch(Vec3::ZERO, Vec3::ZERO, 1.0, None, quick_fuse(), black_hole());

        step(&mut sim, &mut host, 0.5);
        assert_eq!(sim.projectile(id).map(|p| p.state()), Some(FuseState::Activated));

        step(&mut sim, &mut host, 1.0);
        assert!(sim.is_expired(id));
        let events = sim.drain_events();
        let ended = events.iter().position(|e| matches!(e, SimEvent::EffectEnded { .. }));
        let expired = events.iter().position(|e| matches!(e, SimEvent::Expired { .. }));
        assert!(ended.unwrap() < expired.unwrap());
    }

    #[test]
    fn test_relocation_guard_blocks_back_to_back_wormholes() {
        let mut host = Sandbox::flat();
        let target = host.spawn_actor(Vec3::ZERO, 100.0);
        let tuning = Tuning {
            relocation_cooldown: 5.0,
            ..Default::default()
        };
        let mut sim = Simulation::from_tuning(3, &tuning);

        sim.spawn_effect(&mut host, Vec3::ZERO, wormhole(), None);
        let landed = host.actor(target).unwrap().position;
        sim.spawn_effect(&mut host, landed, wormhole(), None);
        assert_eq!(host.moves_of(target).count(), 1);

        host.advance(5.0);
        sim.spawn_effect(&mut host, landed, wormhole(), None);
        assert_eq!(host.moves_of(target).count(), 2);
    }

    #[test]
    fn test_unload_cancels_running_effects() {
        let mut host = Sandbox::flat();
        let mut sim = Simulation::new(1);
        sim.launch(Vec3::ZERO, Vec3::ZERO, 1.0, None, quick_fuse(), black_hole());
        sim.launch(Vec3::new(0.0, 30.0, 0.0), Vec3::ZERO, 1.0, None, ProjectileConfig::default(), black_hole());
        step(&mut sim, &mut host, 0.1);
        assert_eq!(sim.effects().len(), 1);

        sim.drain_events();
        sim.unload();
        assert!(sim.is_idle());
        let events = sim.drain_events();
        assert_eq!(events.len(), 3);
        assert!(matches!(events[0], SimEvent::EffectEnded { .. }));
        let expired = events
            .iter()
            .filter(|e| matches!(e, SimEvent::Expired { .. }))
            .count();
        assert_eq!(expired, 2);
    }

    #[test]
    fn test_default_guard_blocks_same_instant_wormholes() {
        let mut host = Sandbox::flat();
        let target = host.spawn_actor(Vec3::ZERO, 100.0);
        let mut sim = Simulation::new(3);

        sim.spawn_effect(&mut host, Vec3::ZERO, wormhole(), None);
        let landed = host.actor(target).unwrap().position;
        sim.spawn_effect(&mut host, landed, wormhole(), None);
        assert_eq!(host.moves_of(target).count(), 1);

        host.advance(RELOCATION_COOLDOWN);
        sim.spawn_effect(&mut host, landed, wormhole(), None);
        assert_eq!(host.moves_of(target).count(), 2);
    }

    #[test]
    fn test_activated_precedes_effect_events() {
        let mut host = Sandbox::flat();
        host.spawn_actor(Vec3::new(1.0, 0.0, 0.0), 100.0);
        let mut sim = Simulation::new(5);
        let start = Vec3::new(0.0, 1.0, 0.0);
        sim.launch(start, start, 1.0, None, quick_fuse(), wormhole());
        step(&mut sim, &mut host, 0.1);

        let events = sim.drain_events();
        let position = |pred: fn(&SimEvent) -> bool| events.iter().position(pred).unwrap();
        let activated = position(|e| matches!(e, SimEvent::Activated { .. }));
        let relocated = position(|e| matches!(e, SimEvent::Relocated { .. }));
        let ended = position(|e| matches!(e, SimEvent::EffectEnded { .. }));
        let expired = position(|e| matches!(e, SimEvent::Expired { .. }));
        assert!(activated < relocated);
        assert!(relocated < ended);
        assert!(ended < expired);
    }

    #[test]
    fn test_same_seed_same_outcome() {
        let run = |seed| {
            let mut host = Sandbox::flat();
            let ids: Vec<_> = (0..4)
                .map(|i| host.spawn_actor(Vec3::new(i as f32 * 0.5, 0.0, 0.0), 100.0))
                .collect();
            let mut sim = Simulation::new(seed);
            sim.launch(Vec3::Y, Vec3::ZERO, 1.0, None, quick_fuse(), wormhole());
            step(&mut sim, &mut host, 0.2);
            ids.iter()
                .map(|id| host.actor(*id).unwrap().position)
                .collect::<Vec<_>>()
        };
        assert_eq!(run(11), run(11));
    }
}
