//! Game session state
//!
//! A session owns the spawn manager, the bicycle, the score, the clock and
//! the random source. Everything a renderer needs is readable here after a
//! tick returns.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::{Collision, find_collision};
use super::geometry::BoundingBox;
use super::obstacle::ObstacleKind;
use super::rng::{RandomSource, SimRng};
use super::spawn::{SpawnManager, SpawnOutcome};
use crate::art::{ArtError, GlyphBlock};
use crate::config::{ConfigError, SimConfig};

/// Current phase of the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Street scrolling, bicycle steerable
    Running,
    /// Bicycle hit a darling; frozen until restart
    GameOver { kind: ObstacleKind, obstacle_id: u32 },
    /// Driver asked the session to stop; frozen until restart
    Stopped,
}

/// Notifications for the driver (UI, sound, messaging)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    Spawned { kind: ObstacleKind, id: u32 },
    Retired { kind: ObstacleKind, id: u32 },
    GameOver { kind: ObstacleKind, obstacle_id: u32 },
    Stopped,
    Restarted,
}

/// Which steering keys are held
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Steer {
    pub left: bool,
    pub right: bool,
}

/// The player's bicycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bicycle {
    /// Column of the art's left edge
    pub column: i32,
    /// Row of the art's top edge
    pub row: f32,
    pub alive: bool,
    /// Session time before which a held left key may not repeat
    #[serde(default)]
    left_ready_at: Option<f64>,
    #[serde(default)]
    right_ready_at: Option<f64>,
}

impl Bicycle {
    pub fn new(column: i32, row: f32) -> Self {
        Self {
            column,
            row,
            alive: true,
            left_ready_at: None,
            right_ready_at: None,
        }
    }

    pub fn origin(&self) -> Vec2 {
        Vec2::new(self.column as f32, self.row)
    }

    /// Full art extent (no inset)
    pub fn bounds(&self, art: &GlyphBlock) -> BoundingBox {
        BoundingBox::new(self.origin(), art.size())
    }

    /// Apply held keys with a repeat delay
    ///
    /// A freshly pressed key moves at once; holding it repeats every
    /// `repeat_delay` seconds. Releasing a key clears its timer.
    pub fn steer(&mut self, keys: Steer, now: f64, repeat_delay: f32, max_column: i32) {
        if !self.alive {
            return;
        }
        let delay = f64::from(repeat_delay);

        if keys.left {
            if self.left_ready_at.is_none_or(|t| now >= t) {
                self.left_ready_at = Some(now + delay);
                if self.column > 0 {
                    self.column -= 1;
                }
            }
        } else {
            self.left_ready_at = None;
        }

        if keys.right {
            if self.right_ready_at.is_none_or(|t| now >= t) {
                self.right_ready_at = Some(now + delay);
                if self.column < max_column {
                    self.column += 1;
                }
            }
        } else {
            self.right_ready_at = None;
        }
    }
}

/// Complete session state
#[derive(Debug, Clone)]
pub struct GameState<R = SimRng> {
    pub spawner: SpawnManager,
    pub bicycle: Bicycle,
    pub score: u64,
    /// Session clock (seconds)
    pub time: f64,
    /// Ticks processed while running
    pub time_ticks: u64,
    pub phase: GamePhase,
    /// Pending notifications, oldest first
    ///
    /// Nothing trims this queue; drivers call `drain_events` every tick.
    pub events: Vec<GameEvent>,
    pub(crate) spawn_accumulator: f32,
    pub(crate) movement_accumulator: f32,
    rng: R,
}

impl GameState<SimRng> {
    /// New session with a seeded generator
    pub fn new(config: SimConfig, seed: u64) -> Result<Self, ConfigError> {
        Self::with_rng(config, SimRng::new(seed))
    }
}

impl<R: RandomSource> GameState<R> {
    /// New session with an injected random source
    pub fn with_rng(config: SimConfig, rng: R) -> Result<Self, ConfigError> {
        let spawner = SpawnManager::new(config)?;
        let bicycle = Self::start_bicycle(spawner.config());
        let mut state = Self {
            spawner,
            bicycle,
            score: 0,
            time: 0.0,
            time_ticks: 0,
            phase: GamePhase::Running,
            events: Vec::new(),
            spawn_accumulator: 0.0,
            movement_accumulator: 0.0,
            rng,
        };
        state.seed_street()?;
        log::info!(
            "Session started ({} darlings on the street, difficulty {})",
            state.spawner.active().len(),
            state.spawner.config().difficulty.as_str()
        );
        Ok(state)
    }

    fn start_bicycle(config: &SimConfig) -> Bicycle {
        let column = config.lanes.column(config.bicycle.start_lane).round() as i32;
        Bicycle::new(column, config.bicycle.row)
    }

    /// Place the configured initial layout
    fn seed_street(&mut self) -> Result<(), ConfigError> {
        let initial = self.spawner.config().initial_spawns.clone();
        for spawn in initial {
            if let Some(id) = self.spawner.place(spawn.kind, spawn.y, &mut self.rng)? {
                self.events.push(GameEvent::Spawned {
                    kind: spawn.kind,
                    id,
                });
            } else {
                return Err(ConfigError::UnconfiguredKind(spawn.kind));
            }
        }
        Ok(())
    }

    pub fn config(&self) -> &SimConfig {
        self.spawner.config()
    }

    pub fn is_running(&self) -> bool {
        self.phase == GamePhase::Running
    }

    pub fn is_game_over(&self) -> bool {
        matches!(self.phase, GamePhase::GameOver { .. })
    }

    /// Rightmost column the bicycle may occupy
    pub fn max_bicycle_column(&self) -> i32 {
        let config = self.spawner.config();
        (config.field.width - config.art.bicycle().size().x).floor() as i32
    }

    /// Take every pending event
    ///
    /// Call once per tick. Events survive restarts, so a `GameOver` queued
    /// just before a restart is still delivered ahead of `Restarted`.
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Apply held steering keys at the current clock
    pub fn steer(&mut self, keys: Steer) {
        let delay = self.spawner.config().timing.steer_repeat_delay;
        let max_column = self.max_bicycle_column();
        self.bicycle.steer(keys, self.time, delay, max_column);
    }

    /// One spawn-cadence step: every kind gets one attempt, score ticks up
    pub fn spawn_step(&mut self) -> Result<(), ArtError> {
        if !self.is_running() {
            return Ok(());
        }
        let outcomes = self.spawner.spawn_pass(self.time, &mut self.rng)?;
        for outcome in outcomes {
            if let SpawnOutcome::Committed { kind, id } = outcome {
                self.events.push(GameEvent::Spawned { kind, id });
            }
        }
        self.score += 1;
        Ok(())
    }

    /// One movement-cadence step: advance, cull, then test for a hit
    pub fn movement_step(&mut self) -> Result<(), ArtError> {
        if !self.is_running() {
            return Ok(());
        }
        self.spawner.advance(&mut self.rng);
        self.retire();
        self.check_collision()?;
        Ok(())
    }

    /// Cull the street and queue retire events
    pub fn retire(&mut self) {
        for obstacle in self.spawner.cull() {
            self.events.push(GameEvent::Retired {
                kind: obstacle.kind,
                id: obstacle.id,
            });
        }
    }

    /// Test the bicycle against the street; a hit ends the run
    pub fn check_collision(&mut self) -> Result<Option<Collision>, ArtError> {
        if !self.is_running() {
            return Ok(None);
        }
        let hit = find_collision(
            &self.bicycle,
            self.spawner.active(),
            &self.spawner.config().art,
        )?;
        if let Some(collision) = hit {
            self.game_over(collision);
        }
        Ok(hit)
    }

    fn game_over(&mut self, collision: Collision) {
        let Collision { obstacle_id, kind } = collision;
        self.phase = GamePhase::GameOver { kind, obstacle_id };
        self.bicycle.alive = false;
        self.spawner.halt();
        self.events.push(GameEvent::GameOver { kind, obstacle_id });
        log::info!("Game over: hit by {kind} #{obstacle_id} (score {})", self.score);
    }

    /// Freeze the session until restart
    pub fn stop(&mut self) {
        if self.is_running() {
            self.phase = GamePhase::Stopped;
            self.spawner.halt();
            self.events.push(GameEvent::Stopped);
            log::info!("Session stopped (score {})", self.score);
        }
    }

    /// Clear the street and start a fresh run
    pub fn restart(&mut self) {
        self.spawner.reset();
        self.bicycle = Self::start_bicycle(self.spawner.config());
        self.score = 0;
        self.time = 0.0;
        self.time_ticks = 0;
        self.spawn_accumulator = 0.0;
        self.movement_accumulator = 0.0;
        self.phase = GamePhase::Running;
        self.events.push(GameEvent::Restarted);
        log::info!("Session restarted");
    }
}
