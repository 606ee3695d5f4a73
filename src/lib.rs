//! Darling Dodge - an ASCII bicycle-dodging street game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (spawning, movement, collisions, session state)
//! - `config`: Data-driven tuning (lanes, spawn tables, timing, difficulty)
//! - `art`: Glyph blocks for every darling, used for hit cells and rendering

pub mod art;
pub mod config;
pub mod sim;

pub use art::{ArtError, ArtTable, GlyphBlock};
pub use config::{ConfigError, Difficulty, Lane, SimConfig, SpawnConfig};

/// Game configuration constants
pub mod consts {
    /// Visible street width in grid columns
    pub const FIELD_WIDTH: f32 = 41.0;
    /// Visible street height in grid rows
    pub const FIELD_HEIGHT: f32 = 30.0;
    /// Rows past either edge before an obstacle is retired
    pub const OFFSCREEN_BUFFER: f32 = 5.0;

    /// Spawn checks per second
    pub const GAME_SPEED: f32 = 4.0;
    /// Seconds between spawn checks
    pub const SPAWN_INTERVAL: f32 = 1.0 / GAME_SPEED;
    /// Seconds between obstacle movement steps
    pub const MOVEMENT_INTERVAL: f32 = 1.0 / GAME_SPEED;
    /// Maximum spawn/movement steps drained per tick to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Bicycle row (fixed, the street scrolls past it)
    pub const CYCLIST_ROW: f32 = 12.0;
    /// Seconds a held steering key waits before repeating
    pub const STEER_REPEAT_DELAY: f32 = 0.2;

    /// Horizontal hitbox inset per side for obstacles (grid units)
    pub const HITBOX_INSET: f32 = 0.3;
    /// Chance per movement step that a closed parked-car door starts opening
    pub const DOOR_OPEN_CHANCE: f32 = 0.05;
}
