//! Darling Dodge headless driver
//!
//! Runs a session at a fixed frame rate with a simple autopilot steering the
//! bicycle, printing ASCII frames and the final result. Useful for soak runs
//! and for eyeballing spawn tuning without a renderer.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;

use darling_dodge::config::{Difficulty, SimConfig};
use darling_dodge::sim::{
    GameEvent, GamePhase, GameState, Obstacle, TickInput, obstacle_hits, tick,
};

/// Driver frame rate
const FRAME_DT: f32 = 1.0 / 60.0;

#[derive(Parser, Debug)]
#[command(name = "darling-dodge")]
#[command(about = "Headless bicycle-dodging simulation")]
struct Args {
    /// Run seed (defaults to the current time)
    #[arg(long)]
    seed: Option<u64>,

    /// Frames to simulate at 60 Hz
    #[arg(long, default_value_t = 3600)]
    frames: u32,

    /// JSON config file (built-in tuning when omitted)
    #[arg(long)]
    config: Option<PathBuf>,

    /// easy, normal or hard
    #[arg(long)]
    difficulty: Option<String>,

    /// Print an ASCII frame every N frames (0 = only the last one)
    #[arg(long, default_value_t = 0)]
    show_every: u32,

    /// Restart automatically after a crash, up to this many runs
    #[arg(long, default_value_t = 1)]
    runs: u32,

    /// Print the built-in config as JSON and exit
    #[arg(long, default_value_t = false)]
    dump_config: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => SimConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => SimConfig::default(),
    };

    if args.dump_config {
        println!("{}", config.to_json_pretty()?);
        return Ok(());
    }

    if let Some(name) = &args.difficulty {
        let Some(difficulty) = Difficulty::parse(name) else {
            bail!("unknown difficulty {name:?} (expected easy, normal or hard)");
        };
        config.difficulty = difficulty;
    }

    let seed = args.seed.unwrap_or_else(|| {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    });
    log::info!("Darling Dodge (headless) starting with seed {seed}");

    let mut state = GameState::new(config, seed).context("building session")?;
    let mut runs = 1;
    let mut best = 0;

    for frame in 0..args.frames {
        let input = if state.is_running() {
            autopilot(&state)
        } else if runs < args.runs {
            runs += 1;
            TickInput {
                restart: true,
                ..Default::default()
            }
        } else {
            break;
        };

        tick(&mut state, &input, FRAME_DT).context("simulation tick")?;

        for event in state.drain_events() {
            if let GameEvent::GameOver { kind, .. } = event {
                println!("Run {runs}: hit by a {kind} at score {}", state.score);
                best = best.max(state.score);
            }
        }

        if args.show_every > 0 && frame % args.show_every == 0 {
            println!("{}", render_frame(&state)?);
        }
    }

    best = best.max(state.score);
    println!("{}", render_frame(&state)?);
    match state.phase {
        GamePhase::Running => println!("Survived with score {}", state.score),
        GamePhase::GameOver { kind, .. } => println!("Game over ({kind})"),
        GamePhase::Stopped => println!("Stopped"),
    }
    println!("Best score over {runs} run(s): {best}");
    Ok(())
}

/// Steer toward whichever neighbouring column stays clear after the next step
fn autopilot(state: &GameState) -> TickInput {
    let art = &state.config().art;
    let max_column = state.max_bicycle_column();
    let ahead: Vec<Obstacle> = state
        .spawner
        .active()
        .iter()
        .map(|o| {
            let mut next = o.clone();
            next.step();
            next.advance_door();
            next
        })
        .collect();

    let danger = |column: i32| -> usize {
        let mut bike = state.bicycle.clone();
        bike.column = column;
        ahead
            .iter()
            .chain(state.spawner.active().iter())
            .filter(|o| obstacle_hits(&bike, o, art).unwrap_or(true))
            .count()
    };

    let here = state.bicycle.column;
    if danger(here) == 0 {
        return TickInput::default();
    }
    let left = if here > 0 { danger(here - 1) } else { usize::MAX };
    let right = if here < max_column {
        danger(here + 1)
    } else {
        usize::MAX
    };
    TickInput {
        left: left <= right && left != usize::MAX,
        right: right < left,
        ..Default::default()
    }
}

/// Draw the street as plain text
fn render_frame(state: &GameState) -> Result<String> {
    let config = state.config();
    let width = config.field.width as usize;
    let height = config.field.height as usize;
    let mut grid = vec![vec![' '; width]; height];

    let mut plot = |x: i32, y: i32, ch: char| {
        if x >= 0 && y >= 0 && (x as usize) < width && (y as usize) < height {
            grid[y as usize][x as usize] = ch;
        }
    };

    let divider = config.lanes.divider as i32;
    for y in 0..height as i32 {
        plot(divider, y, '|');
        plot(divider + 1, y, '|');
    }

    for obstacle in state.spawner.active().iter() {
        let glyph = config.art.glyph(obstacle.kind, obstacle.frame())?;
        let origin = obstacle.pos.floor().as_ivec2();
        for (row, line) in glyph.rows.iter().enumerate() {
            for (col, ch) in line.chars().enumerate() {
                if ch != ' ' {
                    plot(origin.x + col as i32, origin.y + row as i32, ch);
                }
            }
        }
    }

    let bike_origin = state.bicycle.origin().floor().as_ivec2();
    let bike_ch = if state.bicycle.alive { None } else { Some('X') };
    for (row, line) in config.art.bicycle().rows.iter().enumerate() {
        for (col, ch) in line.chars().enumerate() {
            if ch != ' ' {
                plot(
                    bike_origin.x + col as i32,
                    bike_origin.y + row as i32,
                    bike_ch.unwrap_or(ch),
                );
            }
        }
    }

    let mut out = format!("Score: {}\n", state.score);
    for line in grid {
        out.extend(line);
        out.push('\n');
    }
    Ok(out)
}
