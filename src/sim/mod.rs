//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Injected RNG only
//! - Stable iteration order (kind order, then spawn order)
//! - No rendering or platform dependencies

pub mod collision;
pub mod geometry;
pub mod obstacle;
pub mod rng;
pub mod spawn;
pub mod state;
pub mod tick;

pub use collision::{Collision, cells_coincide, find_collision, glyph_cells, obstacle_hits};
pub use geometry::{BoundingBox, nearest_distance, overlap_distance};
pub use obstacle::{Direction, DoorState, Obstacle, ObstacleKind};
pub use rng::{FixedRandom, RandomSource, ScriptedRandom, SimRng};
pub use spawn::{ActiveSet, SkipReason, SpawnManager, SpawnOutcome, SpawnRecord, UpdateReport};
pub use state::{Bicycle, GameEvent, GamePhase, GameState, Steer};
pub use tick::{TickInput, tick};
