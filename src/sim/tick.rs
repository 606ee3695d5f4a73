//! Fixed timestep simulation tick
//!
//! Spawning and movement run on their own cadences (`timing.spawn_interval`
//! and `timing.movement_interval`). Each tick feeds both accumulators and
//! drains whole steps: spawn steps first, then movement steps, then a cull.

use super::rng::RandomSource;
use super::state::{GameState, Steer};
use crate::art::ArtError;
use crate::consts::MAX_SUBSTEPS;

/// Input commands for a single tick
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Left steering key held
    pub left: bool,
    /// Right steering key held
    pub right: bool,
    /// Start a fresh run (only honoured after game over or stop)
    pub restart: bool,
    /// Freeze the session
    pub stop: bool,
}

impl TickInput {
    fn steer(&self) -> Steer {
        Steer {
            left: self.left,
            right: self.right,
        }
    }
}

/// Take whole steps out of an accumulator, capped at `MAX_SUBSTEPS`
fn drain_steps(accumulator: &mut f32, interval: f32) -> u32 {
    let mut steps = 0;
    while *accumulator >= interval && steps < MAX_SUBSTEPS {
        *accumulator -= interval;
        steps += 1;
    }
    // Drop the backlog past the cap rather than replaying it next tick
    if steps == MAX_SUBSTEPS {
        *accumulator = accumulator.min(interval);
    }
    steps
}

/// Advance the session by `dt` seconds
pub fn tick<R: RandomSource>(
    state: &mut GameState<R>,
    input: &TickInput,
    dt: f32,
) -> Result<(), ArtError> {
    if input.restart && !state.is_running() {
        state.restart();
        return Ok(());
    }
    if input.stop {
        state.stop();
    }

    // Frozen sessions still cull; nothing moves, so this is a no-op in practice
    if !state.is_running() {
        state.retire();
        return Ok(());
    }

    state.time += f64::from(dt);
    state.time_ticks += 1;

    state.steer(input.steer());
    if state.check_collision()?.is_some() {
        return Ok(());
    }

    let timing = state.config().timing.clone();
    state.spawn_accumulator += dt;
    state.movement_accumulator += dt;
    let spawn_steps = drain_steps(&mut state.spawn_accumulator, timing.spawn_interval);
    let movement_steps = drain_steps(&mut state.movement_accumulator, timing.movement_interval);

    for _ in 0..spawn_steps {
        state.spawn_step()?;
    }
    for _ in 0..movement_steps {
        state.movement_step()?;
        if !state.is_running() {
            break;
        }
    }
    state.retire();
    Ok(())
}
