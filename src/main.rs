//! Crossover headless driver
//!
//! Generates an arena, then runs it through a variable-rate frame loop with
//! scripted input. Usage: `crossover [seconds] [seed] [config.json]`

use std::process::ExitCode;

use glam::Vec2;
use serde::Serialize;

use crossover::ArenaConfig;
use crossover::sim::{ArenaLayout, FrameClock, Handle, TickInput, World, WorldEvent};

/// Frame times cycled by the fake display (seconds)
const FRAME_PATTERN: [f32; 4] = [1.0 / 144.0, 1.0 / 60.0, 1.0 / 30.0, 1.0 / 90.0];

#[derive(Debug, Default, Serialize)]
struct RunSummary {
    seed: u64,
    frames: u64,
    ticks: u64,
    shots: u32,
    hits: u32,
    deaths: u32,
    dudes_left: usize,
    bullets_in_flight: usize,
    player_position: Option<(f32, f32)>,
}

struct Args {
    seconds: f32,
    seed: u64,
    config_path: Option<String>,
}

fn parse_args() -> Result<Args, String> {
    let mut args = std::env::args().skip(1);
    let seconds = match args.next() {
        Some(s) => s.parse().map_err(|_| format!("bad seconds: {s}"))?,
        None => 10.0,
    };
    let seed = match args.next() {
        Some(s) => s.parse().map_err(|_| format!("bad seed: {s}"))?,
        None => 1,
    };
    Ok(Args {
        seconds,
        seed,
        config_path: args.next(),
    })
}

fn load_config(path: Option<&str>) -> Result<ArenaConfig, String> {
    let Some(path) = path else {
        return Ok(ArenaConfig::default());
    };
    let json = std::fs::read_to_string(path).map_err(|e| format!("{path}: {e}"))?;
    ArenaConfig::from_json(&json).map_err(|e| format!("{path}: {e}"))
}

/// Aim at the nearest other dude and fire; strafe while doing so
fn scripted_input(world: &World, player: Handle, frame: u64) -> TickInput {
    let Some(me) = world.dude(player) else {
        return TickInput::default();
    };
    let target = world
        .dudes()
        .iter()
        .filter(|(h, _)| *h != player)
        .map(|(_, d)| d.position)
        .min_by(|a, b| {
            a.distance_squared(me.position)
                .partial_cmp(&b.distance_squared(me.position))
                .unwrap_or(std::cmp::Ordering::Equal)
        });

    let strafe_up = (frame / 120) % 2 == 0;
    TickInput {
        up: strafe_up,
        down: !strafe_up,
        pointer: target.map(|t| world.camera.world_to_screen(t)),
        trigger: target.is_some(),
        ..Default::default()
    }
}

fn run(args: &Args) -> Result<RunSummary, String> {
    let config = load_config(args.config_path.as_deref())?;
    let mut world = World::with_config(config).map_err(|e| e.to_string())?;
    let placed = ArenaLayout::with_seed(args.seed)
        .populate(&mut world)
        .map_err(|e| e.to_string())?;
    let player = placed.player.ok_or("no player spawned")?;

    let mut clock = FrameClock::new(world.timestep());
    let mut summary = RunSummary {
        seed: args.seed,
        ..Default::default()
    };
    let mut elapsed = 0.0;

    while elapsed < args.seconds {
        let frame_dt = FRAME_PATTERN[(summary.frames % FRAME_PATTERN.len() as u64) as usize];
        let input = scripted_input(&world, player, summary.frames);
        world
            .advance(frame_dt, &mut clock, &input)
            .map_err(|e| e.to_string())?;

        for event in world.drain_events() {
            match event {
                WorldEvent::ShotFired { .. } => summary.shots += 1,
                WorldEvent::BulletHitDude { dude, damage, .. } => {
                    summary.hits += 1;
                    log::debug!("Dude {:?} took {} damage", dude, damage);
                }
                WorldEvent::DudeDied { dude } => {
                    summary.deaths += 1;
                    log::info!("Dude {:?} died at t={:.2}", dude, world.time());
                }
                _ => {}
            }
        }

        elapsed += frame_dt;
        summary.frames += 1;
    }

    summary.ticks = world.ticks();
    summary.dudes_left = world.dudes().len();
    summary.bullets_in_flight = world.bullets().len();
    summary.player_position = world.dude(player).map(|d| {
        let Vec2 { x, y } = d.position;
        (x, y)
    });
    Ok(summary)
}

fn main() -> ExitCode {
    env_logger::init();
    log::info!("Crossover (headless) starting...");

    let args = match parse_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{e}\nusage: crossover [seconds] [seed] [config.json]");
            return ExitCode::FAILURE;
        }
    };

    match run(&args) {
        Ok(summary) => {
            match serde_json::to_string_pretty(&summary) {
                Ok(json) => println!("{json}"),
                Err(e) => log::error!("Failed to encode summary: {}", e),
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("{}", e);
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
