//! Simulation configuration
//!
//! Loaded once per session (JSON or built-in defaults), validated up front,
//! then handed to the spawn manager as an immutable value.

use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::art::{ArtError, ArtTable};
use crate::consts::*;
use crate::sim::obstacle::{Direction, ObstacleKind};

/// Discrete travel corridors across the street
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Lane {
    Oncoming,
    Tracks,
    Bike,
    Parked,
    Sidewalk,
    Buildings,
}

/// Column of each lane's left edge
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaneTable {
    pub oncoming: f32,
    /// Painted centre line (scenery only)
    pub divider: f32,
    pub tracks: f32,
    pub bike: f32,
    pub parked: f32,
    pub sidewalk: f32,
    pub buildings: f32,
}

impl Default for LaneTable {
    fn default() -> Self {
        Self {
            oncoming: 1.0,
            divider: 7.0,
            tracks: 10.0,
            bike: 17.0,
            parked: 20.0,
            sidewalk: 28.0,
            buildings: 31.0,
        }
    }
}

impl LaneTable {
    pub fn column(&self, lane: Lane) -> f32 {
        match lane {
            Lane::Oncoming => self.oncoming,
            Lane::Tracks => self.tracks,
            Lane::Bike => self.bike,
            Lane::Parked => self.parked,
            Lane::Sidewalk => self.sidewalk,
            Lane::Buildings => self.buildings,
        }
    }
}

/// Visible street extent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldConfig {
    pub width: f32,
    pub height: f32,
    /// Rows past either edge before obstacles are retired
    pub offscreen_buffer: f32,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            width: FIELD_WIDTH,
            height: FIELD_HEIGHT,
            offscreen_buffer: OFFSCREEN_BUFFER,
        }
    }
}

/// Periodic callback cadence (seconds)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingConfig {
    pub spawn_interval: f32,
    pub movement_interval: f32,
    pub steer_repeat_delay: f32,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            spawn_interval: SPAWN_INTERVAL,
            movement_interval: MOVEMENT_INTERVAL,
            steer_repeat_delay: STEER_REPEAT_DELAY,
        }
    }
}

/// Bicycle start position
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BicycleConfig {
    pub start_lane: Lane,
    pub row: f32,
}

impl Default for BicycleConfig {
    fn default() -> Self {
        Self {
            start_lane: Lane::Bike,
            row: CYCLIST_ROW,
        }
    }
}

/// Difficulty levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    #[default]
    Normal,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Normal => "Normal",
            Difficulty::Hard => "Hard",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "easy" => Some(Difficulty::Easy),
            "normal" => Some(Difficulty::Normal),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }

    /// Scales every darling's speed
    pub fn speed_multiplier(&self) -> f32 {
        match self {
            Difficulty::Easy => 0.8,
            Difficulty::Normal => 1.0,
            Difficulty::Hard => 1.2,
        }
    }

    /// Scales every spawn acceptance probability
    pub fn spawn_rate_multiplier(&self) -> f32 {
        match self {
            Difficulty::Easy => 0.7,
            Difficulty::Normal => 1.0,
            Difficulty::Hard => 1.3,
        }
    }
}

/// Inclusive range of extra spacing drawn per spawn (grid units)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpacingRange {
    pub min: u32,
    pub max: u32,
}

impl SpacingRange {
    pub fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    /// Number of distinct values in the range
    pub fn span(&self) -> usize {
        (self.max - self.min) as usize + 1
    }
}

/// Spawn table entry for one darling kind
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpawnConfig {
    pub kind: ObstacleKind,
    /// Fixed part of the required gap to the nearest neighbour
    pub base_spacing: f32,
    /// Random part of the gap, drawn per spawn
    pub random_spacing_range: SpacingRange,
    pub allowed_lanes: Vec<Lane>,
    /// Columns added to the lane column (art anchoring)
    #[serde(default)]
    pub lane_offset: f32,
    /// Row where new spawns appear, off-screen opposite to travel
    pub spawn_y: f32,
    pub direction: Direction,
    /// Grid units per movement step
    pub speed: f32,
    /// Chance a spacing-valid spawn is accepted
    pub probability: f32,
}

/// Obstacle placed when a session starts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitialSpawn {
    pub kind: ObstacleKind,
    pub y: f32,
}

/// Complete, read-only simulation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimConfig {
    #[serde(default)]
    pub field: FieldConfig,
    #[serde(default)]
    pub lanes: LaneTable,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub bicycle: BicycleConfig,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default = "default_door_open_chance")]
    pub door_open_chance: f32,
    pub spawns: Vec<SpawnConfig>,
    #[serde(default)]
    pub initial_spawns: Vec<InitialSpawn>,
    #[serde(default)]
    pub art: ArtTable,
}

fn default_door_open_chance() -> f32 {
    DOOR_OPEN_CHANCE
}

/// Configuration rejected at load time
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(serde_json::Error),
    EmptyLanes(ObstacleKind),
    DuplicateKind(ObstacleKind),
    InvalidRange { kind: ObstacleKind, min: u32, max: u32 },
    InvalidProbability { kind: ObstacleKind, value: f32 },
    InvalidSpeed { kind: ObstacleKind, value: f32 },
    /// Spawn row is visible or on the wrong side for the travel direction
    SpawnOnScreen { kind: ObstacleKind, spawn_y: f32 },
    /// A size or interval that must be positive
    NonPositive(&'static str),
    /// A chance outside `0..=1`
    OutOfRange(&'static str),
    /// Initial layout names a kind with no spawn entry
    UnconfiguredKind(ObstacleKind),
    Art(ArtError),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "failed to read config: {e}"),
            ConfigError::Parse(e) => write!(f, "invalid config JSON: {e}"),
            ConfigError::EmptyLanes(kind) => write!(f, "{kind} has no allowed lanes"),
            ConfigError::DuplicateKind(kind) => write!(f, "{kind} is configured twice"),
            ConfigError::InvalidRange { kind, min, max } => {
                write!(f, "{kind} spacing range {min}..={max} is empty")
            }
            ConfigError::InvalidProbability { kind, value } => {
                write!(f, "{kind} spawn probability {value} is outside 0..=1")
            }
            ConfigError::InvalidSpeed { kind, value } => {
                write!(f, "{kind} speed {value} must be positive")
            }
            ConfigError::SpawnOnScreen { kind, spawn_y } => {
                write!(f, "{kind} spawn row {spawn_y} is not off-screen behind its travel")
            }
            ConfigError::NonPositive(name) => write!(f, "{name} must be positive"),
            ConfigError::OutOfRange(name) => write!(f, "{name} must be within 0..=1"),
            ConfigError::UnconfiguredKind(kind) => {
                write!(f, "initial layout places {kind} but it has no spawn entry")
            }
            ConfigError::Art(e) => write!(f, "invalid art table: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Parse(e) => Some(e),
            ConfigError::Art(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ArtError> for ConfigError {
    fn from(e: ArtError) -> Self {
        ConfigError::Art(e)
    }
}

impl SimConfig {
    /// Parse and validate a JSON config
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: SimConfig = serde_json::from_str(json).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON config file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        let config = Self::from_json_str(&json)?;
        log::info!(
            "Loaded config from {} ({} spawn entries)",
            path.display(),
            config.spawns.len()
        );
        Ok(config)
    }

    pub fn to_json_pretty(&self) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(self).map_err(ConfigError::Parse)
    }

    /// Check every load-time invariant
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.field.width <= 0.0 {
            return Err(ConfigError::NonPositive("field.width"));
        }
        if self.field.height <= 0.0 {
            return Err(ConfigError::NonPositive("field.height"));
        }
        if self.timing.spawn_interval <= 0.0 {
            return Err(ConfigError::NonPositive("timing.spawn_interval"));
        }
        if self.timing.movement_interval <= 0.0 {
            return Err(ConfigError::NonPositive("timing.movement_interval"));
        }
        if !(0.0..=1.0).contains(&self.door_open_chance) {
            return Err(ConfigError::OutOfRange("door_open_chance"));
        }

        let mut seen = BTreeSet::new();
        for spawn in &self.spawns {
            let kind = spawn.kind;
            if !seen.insert(kind) {
                return Err(ConfigError::DuplicateKind(kind));
            }
            if spawn.allowed_lanes.is_empty() {
                return Err(ConfigError::EmptyLanes(kind));
            }
            let range = spawn.random_spacing_range;
            if range.min > range.max {
                return Err(ConfigError::InvalidRange {
                    kind,
                    min: range.min,
                    max: range.max,
                });
            }
            if !(0.0..=1.0).contains(&spawn.probability) {
                return Err(ConfigError::InvalidProbability {
                    kind,
                    value: spawn.probability,
                });
            }
            if spawn.speed.is_nan() || spawn.speed <= 0.0 {
                return Err(ConfigError::InvalidSpeed {
                    kind,
                    value: spawn.speed,
                });
            }
            let off_screen = match spawn.direction {
                Direction::Down => spawn.spawn_y <= 0.0,
                Direction::Up => spawn.spawn_y >= self.field.height,
            };
            if !off_screen {
                return Err(ConfigError::SpawnOnScreen {
                    kind,
                    spawn_y: spawn.spawn_y,
                });
            }
        }

        if let Some(initial) = self.initial_spawns.iter().find(|s| !seen.contains(&s.kind)) {
            return Err(ConfigError::UnconfiguredKind(initial.kind));
        }

        self.art.validate()?;
        Ok(())
    }

    pub fn spawn_config(&self, kind: ObstacleKind) -> Option<&SpawnConfig> {
        self.spawns.iter().find(|s| s.kind == kind)
    }

    /// Signed displacement per movement step, difficulty applied
    pub fn velocity(&self, spawn: &SpawnConfig) -> f32 {
        spawn.direction.sign() * spawn.speed * self.difficulty.speed_multiplier()
    }

    /// Spawn acceptance chance, difficulty applied
    pub fn acceptance(&self, spawn: &SpawnConfig) -> f32 {
        (spawn.probability * self.difficulty.spawn_rate_multiplier()).clamp(0.0, 1.0)
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        let field = FieldConfig::default();
        let below = field.height;

        let spawns = vec![
            SpawnConfig {
                kind: ObstacleKind::Streetcar,
                base_spacing: 5.0,
                random_spacing_range: SpacingRange::new(0, 3),
                allowed_lanes: vec![Lane::Tracks],
                lane_offset: 0.0,
                spawn_y: below,
                direction: Direction::Up,
                speed: 2.0,
                probability: 0.4,
            },
            SpawnConfig {
                kind: ObstacleKind::LaneDeathMachine,
                base_spacing: 5.0,
                random_spacing_range: SpacingRange::new(0, 3),
                allowed_lanes: vec![Lane::Tracks],
                lane_offset: 1.0,
                spawn_y: below,
                direction: Direction::Up,
                speed: 2.0,
                probability: 0.6,
            },
            SpawnConfig {
                kind: ObstacleKind::OncomingDeathMachine,
                base_spacing: 1.0,
                random_spacing_range: SpacingRange::new(0, 7),
                allowed_lanes: vec![Lane::Oncoming],
                lane_offset: 0.0,
                spawn_y: -5.0,
                direction: Direction::Down,
                speed: 2.5,
                probability: 0.8,
            },
            SpawnConfig {
                kind: ObstacleKind::ParkedDeathMachine,
                base_spacing: 0.0,
                random_spacing_range: SpacingRange::new(0, 3),
                allowed_lanes: vec![Lane::Parked],
                lane_offset: -3.0,
                spawn_y: -8.0,
                direction: Direction::Down,
                speed: 2.0,
                probability: 0.6,
            },
            SpawnConfig {
                kind: ObstacleKind::Wanderer,
                base_spacing: 0.0,
                random_spacing_range: SpacingRange::new(0, 0),
                allowed_lanes: vec![Lane::Sidewalk],
                lane_offset: 0.2,
                spawn_y: -1.0,
                direction: Direction::Down,
                speed: 0.5,
                probability: 0.5,
            },
            SpawnConfig {
                kind: ObstacleKind::Building,
                base_spacing: 0.0,
                random_spacing_range: SpacingRange::new(0, 0),
                allowed_lanes: vec![Lane::Buildings],
                lane_offset: 0.0,
                spawn_y: -12.0,
                direction: Direction::Down,
                speed: 2.0,
                probability: 0.8,
            },
        ];

        let initial_spawns = [
            (ObstacleKind::ParkedDeathMachine, 0.0),
            (ObstacleKind::ParkedDeathMachine, 12.0),
            (ObstacleKind::ParkedDeathMachine, 22.0),
            (ObstacleKind::Streetcar, 9.0),
            (ObstacleKind::Building, 0.0),
            (ObstacleKind::Building, 8.0),
            (ObstacleKind::Building, 16.0),
            (ObstacleKind::Building, 24.0),
            (ObstacleKind::OncomingDeathMachine, 2.0),
            (ObstacleKind::OncomingDeathMachine, 12.0),
            (ObstacleKind::OncomingDeathMachine, 24.0),
        ]
        .into_iter()
        .map(|(kind, y)| InitialSpawn { kind, y })
        .collect();

        Self {
            field,
            lanes: LaneTable::default(),
            timing: TimingConfig::default(),
            bicycle: BicycleConfig::default(),
            difficulty: Difficulty::Normal,
            door_open_chance: DOOR_OPEN_CHANCE,
            spawns,
            initial_spawns,
            art: ArtTable::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = SimConfig::default();
        assert!(config.validate().is_ok());
        for kind in ObstacleKind::ALL {
            assert!(config.spawn_config(kind).is_some(), "{kind} missing");
        }
    }

    #[test]
    fn test_empty_lanes_rejected_at_load() {
        let mut config = SimConfig::default();
        config.spawns[2].allowed_lanes.clear();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::EmptyLanes(ObstacleKind::OncomingDeathMachine))
        ));
    }

    #[test]
    fn test_spawn_must_be_behind_travel() {
        let mut config = SimConfig::default();
        // Streetcars travel up, so they must appear below the field
        config.spawns[0].spawn_y = 3.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::SpawnOnScreen {
                kind: ObstacleKind::Streetcar,
                ..
            })
        ));
    }

    #[test]
    fn test_bad_probability_and_range() {
        let mut config = SimConfig::default();
        config.spawns[1].probability = 1.5;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidProbability { .. })
        ));

        let mut config = SimConfig::default();
        config.spawns[1].random_spacing_range = SpacingRange::new(4, 2);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidRange { min: 4, max: 2, .. })
        ));
    }

    #[test]
    fn test_duplicate_kind_rejected() {
        let mut config = SimConfig::default();
        let dup = config.spawns[0].clone();
        config.spawns.push(dup);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::DuplicateKind(ObstacleKind::Streetcar))
        ));
    }

    #[test]
    fn test_json_round_trip_keeps_tuning() {
        let config = SimConfig::default();
        let json = config.to_json_pretty().unwrap();
        let loaded = SimConfig::from_json_str(&json).unwrap();
        assert_eq!(loaded.spawns.len(), config.spawns.len());
        assert_eq!(loaded.art, config.art);
        assert_eq!(loaded.lanes.column(Lane::Parked), 20.0);
    }

    #[test]
    fn test_minimal_json_uses_defaults() {
        let json = r#"{
            "spawns": [{
                "kind": "Wanderer",
                "base_spacing": 0.0,
                "random_spacing_range": { "min": 0, "max": 1 },
                "allowed_lanes": ["Sidewalk"],
                "spawn_y": -1.0,
                "direction": "Down",
                "speed": 0.5,
                "probability": 0.5
            }]
        }"#;
        let config = SimConfig::from_json_str(json).unwrap();
        assert_eq!(config.field.height, FIELD_HEIGHT);
        assert_eq!(config.difficulty, Difficulty::Normal);
        assert!(config.spawn_config(ObstacleKind::Streetcar).is_none());
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        assert!(matches!(
            SimConfig::from_json_str("{ not json"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_difficulty_scaling() {
        let mut config = SimConfig::default();
        config.difficulty = Difficulty::Hard;
        let oncoming = config.spawn_config(ObstacleKind::OncomingDeathMachine).unwrap();
        assert!((config.velocity(oncoming) - 3.0).abs() < 1e-5);
        assert_eq!(config.acceptance(oncoming), 1.0);
        assert_eq!(Difficulty::parse("EASY"), Some(Difficulty::Easy));
    }
}
