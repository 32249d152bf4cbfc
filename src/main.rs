//! Tap Ski headless host
//!
//! Drives one seeded session: a skier descending at constant speed with a
//! camera following a few units below. Useful for eyeballing pool sizing.
//!
//! Usage: `tapski [seed] [frames] [density|settings.json]`

use glam::Vec2;

use tapski::sim::{Camera, PrefabCatalog, TickInput, WorldEvent, WorldGenerator};
use tapski::{DensityPreset, GeneratorSettings, SessionContext};

/// Units per frame at 60 fps
const SKIER_SPEED: f32 = 0.2;
/// Camera sits this far below the skier
const CAMERA_LEAD: f32 = 5.0;
const CAMERA_HALF_HEIGHT: f32 = 10.0;
const CAMERA_ASPECT: f32 = 9.0 / 16.0;

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let seed = args.first().and_then(|s| s.parse().ok()).unwrap_or(12345u64);
    let frames = args.get(1).and_then(|s| s.parse().ok()).unwrap_or(3600usize);

    let settings = match load_settings(args.get(2).map(String::as_str)) {
        Ok(settings) => settings,
        Err(e) => {
            log::error!("{e}");
            std::process::exit(2);
        }
    };

    if let Err(e) = run(settings, seed, frames) {
        log::error!("Session failed: {e}");
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {}

#[cfg(not(target_arch = "wasm32"))]
fn load_settings(arg: Option<&str>) -> tapski::Result<GeneratorSettings> {
    match arg {
        None => Ok(GeneratorSettings::default()),
        Some(name) => match DensityPreset::from_str(name) {
            Some(preset) => Ok(GeneratorSettings::from_preset(preset)),
            None => {
                let json = std::fs::read_to_string(name).map_err(|e| {
                    tapski::WorldError::InvalidSetting {
                        name: "settings path",
                        reason: format!("{name}: {e}"),
                    }
                })?;
                GeneratorSettings::from_json(&json)
            }
        },
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn run(settings: GeneratorSettings, seed: u64, frames: usize) -> tapski::Result<()> {
    log::info!(
        "Tap Ski (headless) seed {} for {} frames, density {}",
        seed,
        frames,
        settings.density.as_str()
    );

    let mut session = SessionContext::new(false);
    let mut world = WorldGenerator::new(settings, PrefabCatalog::sequential(), seed)?;

    let mut player = Vec2::ZERO;
    world.start_new_game(&mut session, player, &camera_for(player))?;

    let mut checkpoints = 0u32;
    for _ in 0..frames {
        player.y -= SKIER_SPEED;
        player.x = world.ring().clamp_to_corridor(player.x, player.y);
        world.tick(&TickInput {
            player,
            camera: camera_for(player),
        })?;

        for event in world.drain_events() {
            if let WorldEvent::ObstaclePlaced { kind, position, .. } = event {
                log::debug!("{:?} at ({:.1}, {:.1})", kind, position.x, position.y);
                if kind == tapski::sim::ObstacleKind::Checkpoint {
                    checkpoints += 1;
                }
            }
        }
        session.session_score = (-player.y).max(0.0) as u64;
    }

    session.record_score();
    let stats = world.end_game();

    println!("distance        {:.1}", -player.y);
    println!("rows generated  {}", stats.rows_generated);
    println!("rows recentered {}", stats.rows_recentered);
    println!("rows skipped    {}", stats.rows_skipped);
    println!("trees placed    {}", stats.trees_placed);
    println!("obstacles       {} ({} checkpoints)", stats.obstacles_placed, checkpoints);
    println!("retired         {}", stats.retired);
    println!(
        "starved         trees {} / obstacles {}",
        stats.trees_starved, stats.obstacles_starved
    );
    println!("high score      {}", session.device_high_score);
    Ok(())
}

#[cfg(not(target_arch = "wasm32"))]
fn camera_for(player: Vec2) -> Camera {
    Camera::new(
        Vec2::new(player.x, player.y - CAMERA_LEAD),
        CAMERA_HALF_HEIGHT,
        CAMERA_ASPECT,
    )
}
