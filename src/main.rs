//! Rift Ordnance headless demo
//!
//! Throws each configured item into a sandbox arena and runs the simulation
//! on a fixed timestep, logging every event. Use `RUST_LOG=debug` for
//! per-tick detail.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use glam::Vec3;

use rift_ordnance::Tuning;
use rift_ordnance::consts::{MAX_SUBSTEPS, SIM_DT};
use rift_ordnance::sim::{EntityId, Pillar, Sandbox, SimEvent, Simulation, Zone};

/// Headless run of the thrown area-effect items
#[derive(Parser, Debug)]
#[command(name = "rift-ordnance")]
#[command(about = "Headless run of the thrown area-effect items")]
#[command(version)]
struct Args {
    /// JSON tuning file (defaults are used when omitted)
    #[arg(long, value_name = "TUNING_FILE")]
    tuning: Option<PathBuf>,

    /// RNG seed (overrides the tuning file)
    #[arg(long)]
    seed: Option<u64>,

    /// Seconds of simulated time to run
    #[arg(long, default_value = "8")]
    duration: f32,

    /// Simulated render frame time in seconds, fed through the fixed-step accumulator
    #[arg(long, default_value = "0.033")]
    frame_time: f32,
}

/// A thrower plus three clusters of targets, with some obstacles in between
fn build_arena() -> (Sandbox, EntityId) {
    let mut host = Sandbox::flat();
    host.pillars.push(Pillar::new(Vec3::new(5.0, 0.0, 3.0), 0.8, 4.0));
    host.pillars.push(Pillar::new(Vec3::new(-4.0, 0.0, -6.0), 1.2, 2.5));
    host.pits.push(Zone::new(Vec3::new(14.0, 0.0, -4.0), 3.0));
    host.unwalkable.push(Zone::new(Vec3::new(-12.0, 0.0, 8.0), 2.5));

    let thrower = host.spawn_actor(Vec3::ZERO, 100.0);
    for site in [
        Vec3::new(10.0, 0.0, 0.0),
        Vec3::new(0.0, 0.0, 10.0),
        Vec3::new(-10.0, 0.0, 0.0),
    ] {
        for offset in [Vec3::ZERO, Vec3::new(1.0, 0.0, 0.5), Vec3::new(-0.8, 0.0, 1.2)] {
            host.spawn_actor(site + offset, 100.0);
        }
    }
    (host, thrower)
}

fn log_event(event: &SimEvent) {
    match event {
        SimEvent::Armed { projectile } => log::info!("{:?} armed", projectile),
        SimEvent::Bounced {
            projectile,
            point,
            speed,
        } => log::debug!("{:?} bounced at {:?} ({:.2} m/s)", projectile, point, speed),
        SimEvent::Activated {
            projectile,
            center,
            effect,
        } => log::info!("{:?} activated at {:?} -> {:?}", projectile, center, effect),
        SimEvent::Damaged {
            effect,
            entity,
            amount,
        } => log::info!("{:?} hit {:?} for {:.1}", effect, entity, amount),
        SimEvent::Relocated {
            effect,
            entity,
            from,
            to,
        } => log::info!("{:?} moved {:?} from {:?} to {:?}", effect, entity, from, to),
        SimEvent::EffectEnded { effect } => log::info!("{:?} ended", effect),
        SimEvent::Expired { projectile } => log::info!("{:?} expired", projectile),
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let tuning = match &args.tuning {
        Some(path) => match Tuning::load_from_file(path) {
            Ok(tuning) => tuning,
            Err(e) => {
                log::error!("{}", e);
                return ExitCode::FAILURE;
            }
        },
        None => Tuning::default(),
    };
    let seed = args.seed.or(tuning.seed).unwrap_or(0x5EED);
    log::info!("Rift Ordnance starting (seed: {})", seed);

    let (mut host, thrower) = build_arena();
    let mut sim = Simulation::from_tuning(seed, &tuning);

    let hand = Vec3::new(0.0, 1.5, 0.0);
    let throws = [
        ("wormhole", Vec3::new(10.0, 0.15, 0.0)),
        ("black_hole", Vec3::new(0.0, 0.15, 10.0)),
        ("frag", Vec3::new(-10.0, 0.15, 0.0)),
    ];
    for (name, target) in throws {
        let Some(preset) = tuning.preset(name) else {
            continue;
        };
        let id = sim.launch_preset(hand, target, Some(thrower), preset);
        log::info!("Threw {} as {:?} toward {:?}", name, id, target);
    }

    // Fixed timestep with accumulator, as a frame-driven host would run it
    let frame_time = if args.frame_time.is_finite() && args.frame_time > 0.0 {
        args.frame_time
    } else {
        SIM_DT
    };
    let mut accumulator = 0.0;
    let mut simulated = 0.0;
    while simulated < args.duration {
        accumulator += frame_time.min(0.1);

        let mut substeps = 0;
        while accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            host.advance(SIM_DT);
            sim.tick(&mut host, SIM_DT);
            accumulator -= SIM_DT;
            simulated += SIM_DT;
            substeps += 1;
        }

        for event in sim.drain_events() {
            log_event(&event);
        }
        if sim.is_idle() {
            log::info!("All items resolved after {:.2}s", simulated);
            break;
        }
    }

    if !sim.is_idle() {
        sim.unload();
        for event in sim.drain_events() {
            log_event(&event);
        }
    }

    for actor in &host.actors {
        log::info!(
            "{:?}: health {:.1}, at {:?}, {} moves{}",
            actor.id,
            actor.health,
            actor.position,
            host.moves_of(actor.id).count(),
            if actor.alive { "" } else { " (dead)" }
        );
    }
    log::info!("Simulated {} ticks", sim.ticks());
    ExitCode::SUCCESS
}
