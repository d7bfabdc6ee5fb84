/// Entry point and game loop.

mod config;
mod domain;
mod sim;
mod ui;

use std::fs::File;
use std::path::Path;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use config::GameConfig;
use sim::event::GameEvent;
use sim::level;
use sim::step;
use sim::world::WorldState;
use ui::input::{Command, InputState};
use ui::renderer::{Renderer, Screen};

const FRAME_SLEEP: Duration = Duration::from_millis(5);

/// Longest frame handed to the simulation, in seconds. `step::advance`
/// slices it into fixed-size steps.
const MAX_DT: f32 = 0.1;

fn main() {
    let config = GameConfig::load();
    init_tracing(&config.general.log_file);
    info!("=== Canyon Run startup ===");
    info!(
        tick_rate_ms = config.general.tick_rate_ms,
        level = ?config.general.level,
        "config ready"
    );

    let source = match level::load_source(&config) {
        Ok(source) => {
            info!(level = %source.name, width = source.width(), height = source.height(), "level source ready");
            source
        }
        Err(e) => {
            error!(error = %e, "level load failed");
            eprintln!("Could not load level: {e}");
            std::process::exit(1);
        }
    };

    let mut world = match WorldState::new(config, source) {
        Ok(world) => world,
        Err(e) => {
            error!(error = %e, "level decode failed");
            eprintln!("Could not build level: {e}");
            std::process::exit(1);
        }
    };

    let lvl = &world.level;
    if !lvl.warnings.is_empty() || lvl.discarded_spawns > 0 || lvl.discarded_goals > 0 {
        warn!(
            unknown_cells = lvl.warnings.len(),
            extra_spawns = lvl.discarded_spawns,
            extra_goals = lvl.discarded_goals,
            "level decoded with problems"
        );
    }

    let mut renderer = Renderer::new();
    let mut kb = InputState::new();

    match renderer.init() {
        Ok(enhanced) => kb.honor_release = enhanced,
        Err(e) => {
            eprintln!("Terminal init failed: {e}");
            return;
        }
    }

    let result = game_loop(&mut world, &mut renderer, &mut kb);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }

    if let Err(e) = result {
        error!(error = %e, "game loop aborted");
        eprintln!("Game error: {e}");
    }

    info!(score = world.session.score, game_over = world.is_over(), "shutdown");
    println!();
    println!("Thanks for playing Canyon Run!");
    println!("Final Score: {}", world.session.score);
}

/// Log to a file: the terminal belongs to the renderer.
fn init_tracing(path: &Path) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match File::create(path) {
        Ok(file) => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(false)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .compact()
                .init();
        }
        Err(e) => eprintln!("Warning: could not open log file {}: {e}", path.display()),
    }
}

fn game_loop(
    world: &mut WorldState,
    renderer: &mut Renderer,
    kb: &mut InputState,
) -> Result<(), Box<dyn std::error::Error>> {
    let tick_rate = Duration::from_millis(world.config.general.tick_rate_ms);
    let mut screen = Screen::Menu;
    let mut last_tick = Instant::now();

    loop {
        kb.drain_events();

        match kb.command() {
            Some(Command::Quit) => break,
            Some(Command::ReturnToMenu) if screen == Screen::Game => {
                info!("back to menu");
                screen = Screen::Menu;
            }
            Some(Command::Reset) if screen == Screen::Game => {
                world.restart()?;
                info!("world reset");
            }
            Some(Command::PanLeft) => renderer.camera.pan(-1.0),
            Some(Command::PanRight) => renderer.camera.pan(1.0),
            Some(Command::ZoomIn) => renderer.camera.zoom(1.0),
            Some(Command::ZoomOut) => renderer.camera.zoom(-1.0),
            Some(Command::CameraReset) => renderer.camera.reset(),
            Some(Command::Confirm) if screen == Screen::Menu => {
                world.restart()?;
                info!(level = %world.source.name, "new game");
                screen = Screen::Game;
                last_tick = Instant::now();
            }
            _ => {}
        }

        if screen == Screen::Game && last_tick.elapsed() >= tick_rate {
            let dt = last_tick.elapsed().as_secs_f32().min(MAX_DT);
            last_tick = Instant::now();

            let events = step::advance(world, kb.frame_input(), dt);
            for event in &events {
                log_event(event, world.tick);
            }
            if events.contains(&GameEvent::ReturnToMenu) {
                screen = Screen::Menu;
            }
        }

        renderer.render(world, screen)?;
        std::thread::sleep(FRAME_SLEEP);
    }

    Ok(())
}

fn log_event(event: &GameEvent, tick: u64) {
    match event {
        GameEvent::CoinCollected { index, score } => debug!(tick, index, score, "coin collected"),
        GameEvent::FeatherCollected { index, score } => debug!(tick, index, score, "feather collected"),
        GameEvent::LifeLost { lives_left } => debug!(tick, lives_left, "life lost"),
        other => debug!(tick, event = ?other, "event"),
    }
}
