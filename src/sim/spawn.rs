//! Spawn manager
//!
//! Decides what appears on the street each spawn step, moves everything on
//! each movement step, and retires obstacles that leave the field.
//!
//! A spawn attempt is transactional: the obstacle is built provisionally,
//! checked against every active obstacle, damped by a probability roll and
//! only then committed. A rejected provisional never enters the active set.

use std::collections::BTreeMap;

use glam::Vec2;

use super::geometry::{BoundingBox, nearest_distance};
use super::obstacle::{DoorState, Obstacle, ObstacleKind};
use super::rng::RandomSource;
use crate::art::ArtError;
use crate::config::{ConfigError, SimConfig, SpawnConfig};

/// Live obstacles grouped by kind, each group in spawn order
#[derive(Debug, Clone, Default)]
pub struct ActiveSet {
    by_kind: BTreeMap<ObstacleKind, Vec<Obstacle>>,
}

impl ActiveSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// All obstacles: kinds in evaluation order, then spawn order
    pub fn iter(&self) -> impl Iterator<Item = &Obstacle> {
        self.by_kind.values().flatten()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Obstacle> {
        self.by_kind.values_mut().flatten()
    }

    pub fn of_kind(&self, kind: ObstacleKind) -> &[Obstacle] {
        self.by_kind.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn get(&self, id: u32) -> Option<&Obstacle> {
        self.iter().find(|o| o.id == id)
    }

    pub fn len(&self) -> usize {
        self.by_kind.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Smallest lane gap from `obstacle` to any other active obstacle
    pub fn nearest_distance(&self, obstacle: &Obstacle) -> f32 {
        let others: Vec<BoundingBox> = self
            .iter()
            .filter(|other| other.id != obstacle.id)
            .map(Obstacle::bounds)
            .collect();
        nearest_distance(&obstacle.bounds(), &others)
    }

    pub(crate) fn push(&mut self, obstacle: Obstacle) {
        self.by_kind.entry(obstacle.kind).or_default().push(obstacle);
    }

    /// Remove obstacles matching `is_gone`, returning them in scan order
    pub(crate) fn extract_if<F>(&mut self, mut is_gone: F) -> Vec<Obstacle>
    where
        F: FnMut(&Obstacle) -> bool,
    {
        let mut removed = Vec::new();
        for obstacles in self.by_kind.values_mut() {
            let (gone, kept): (Vec<_>, Vec<_>) =
                obstacles.drain(..).partition(|o| is_gone(o));
            *obstacles = kept;
            removed.extend(gone);
        }
        removed
    }

    pub(crate) fn clear(&mut self) {
        self.by_kind.clear();
    }
}

/// Why a spawn attempt did not commit (all expected, none are errors)
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SkipReason {
    /// Spawning halted by game over or stop
    Halted,
    /// Kind has no spawn table entry
    Unconfigured,
    /// Previous spawn of this kind has not cleared its own spacing yet
    Cooldown,
    /// Provisional spawn landed inside its required gap
    TooClose { distance: f32, required: f32 },
    /// Spacing allowed it but the probability roll failed
    Damped,
}

/// Result of one spawn attempt
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SpawnOutcome {
    Committed { kind: ObstacleKind, id: u32 },
    Skipped { kind: ObstacleKind, reason: SkipReason },
}

impl SpawnOutcome {
    pub fn kind(&self) -> ObstacleKind {
        match self {
            SpawnOutcome::Committed { kind, .. } | SpawnOutcome::Skipped { kind, .. } => *kind,
        }
    }

    pub fn is_committed(&self) -> bool {
        matches!(self, SpawnOutcome::Committed { .. })
    }
}

/// Last committed spawn of a kind
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnRecord {
    /// Session time of the commit (seconds)
    pub at: f64,
    /// Spacing drawn for that spawn
    pub min_spacing: f32,
}

/// What one full update did
#[derive(Debug, Clone, Default)]
pub struct UpdateReport {
    pub outcomes: Vec<SpawnOutcome>,
    pub culled: Vec<Obstacle>,
}

/// Owns the active set and every spawn decision
#[derive(Debug, Clone)]
pub struct SpawnManager {
    config: SimConfig,
    active: ActiveSet,
    records: BTreeMap<ObstacleKind, SpawnRecord>,
    halted: bool,
    next_id: u32,
}

impl SpawnManager {
    /// Validate `config` and take ownership of it
    pub fn new(config: SimConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            active: ActiveSet::new(),
            records: BTreeMap::new(),
            halted: false,
            next_id: 1,
        })
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn active(&self) -> &ActiveSet {
        &self.active
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// Stop spawning and movement until `reset`
    pub fn halt(&mut self) {
        self.halted = true;
    }

    pub fn last_spawn(&self, kind: ObstacleKind) -> Option<SpawnRecord> {
        self.records.get(&kind).copied()
    }

    /// Seconds for a spawn with `min_spacing` to travel its own gap
    pub fn cooldown(&self, spawn: &SpawnConfig, min_spacing: f32) -> f64 {
        let per_second = self.config.velocity(spawn).abs() / self.config.timing.movement_interval;
        f64::from(min_spacing / per_second)
    }

    /// Whether `kind` may attempt a spawn at `now`
    pub fn is_eligible(&self, kind: ObstacleKind, now: f64) -> bool {
        let Some(spawn) = self.config.spawn_config(kind) else {
            return false;
        };
        match self.records.get(&kind) {
            None => true,
            Some(record) => now - record.at >= self.cooldown(spawn, record.min_spacing),
        }
    }

    /// One spawn attempt for `kind`
    pub fn try_spawn<R: RandomSource>(
        &mut self,
        kind: ObstacleKind,
        now: f64,
        rng: &mut R,
    ) -> Result<SpawnOutcome, ArtError> {
        let skip = |reason| Ok(SpawnOutcome::Skipped { kind, reason });

        if self.halted {
            return skip(SkipReason::Halted);
        }
        let Some(spawn) = self.config.spawn_config(kind) else {
            return skip(SkipReason::Unconfigured);
        };
        if !self.is_eligible(kind, now) {
            return skip(SkipReason::Cooldown);
        }

        let provisional = self.provisional(spawn, rng)?;
        let acceptance = self.config.acceptance(spawn);

        let distance = self.active.nearest_distance(&provisional);
        let required = provisional.min_spacing + 1.0;
        if distance < required {
            log::trace!("{kind} too close ({distance} < {required}), discarded");
            return skip(SkipReason::TooClose { distance, required });
        }

        if !rng.chance(acceptance) {
            log::trace!("{kind} damped");
            return skip(SkipReason::Damped);
        }

        let min_spacing = provisional.min_spacing;
        let id = self.commit(provisional);
        self.records.insert(kind, SpawnRecord { at: now, min_spacing });
        Ok(SpawnOutcome::Committed { kind, id })
    }

    /// Attempt every configured kind once, in evaluation order
    pub fn spawn_pass<R: RandomSource>(
        &mut self,
        now: f64,
        rng: &mut R,
    ) -> Result<Vec<SpawnOutcome>, ArtError> {
        let mut outcomes = Vec::with_capacity(ObstacleKind::ALL.len());
        for kind in ObstacleKind::ALL {
            if self.config.spawn_config(kind).is_none() {
                continue;
            }
            outcomes.push(self.try_spawn(kind, now, rng)?);
        }
        Ok(outcomes)
    }

    /// Move every obstacle one step and run the door state machines
    pub fn advance<R: RandomSource>(&mut self, rng: &mut R) {
        if self.halted {
            return;
        }
        let door_chance = self.config.door_open_chance;
        for obstacle in self.active.iter_mut() {
            obstacle.step();
            if obstacle.door.is_some() && (obstacle.door_triggered() || rng.chance(door_chance)) {
                obstacle.advance_door();
            }
        }
    }

    /// Retire everything past its off-screen bound
    pub fn cull(&mut self) -> Vec<Obstacle> {
        let field = &self.config.field;
        let culled = self.active.extract_if(|o| o.is_past(field));
        for obstacle in &culled {
            log::debug!("Retired {} #{}", obstacle.kind, obstacle.id);
        }
        culled
    }

    /// Spawn pass, then advance, then cull
    pub fn update<R: RandomSource>(
        &mut self,
        now: f64,
        rng: &mut R,
    ) -> Result<UpdateReport, ArtError> {
        let outcomes = self.spawn_pass(now, rng)?;
        self.advance(rng);
        let culled = self.cull();
        Ok(UpdateReport { outcomes, culled })
    }

    /// Insert an obstacle at row `y` with no spacing, cooldown or probability check
    ///
    /// Returns `None` when the kind has no spawn table entry.
    pub fn place<R: RandomSource>(
        &mut self,
        kind: ObstacleKind,
        y: f32,
        rng: &mut R,
    ) -> Result<Option<u32>, ArtError> {
        let Some(spawn) = self.config.spawn_config(kind) else {
            return Ok(None);
        };
        let mut obstacle = self.provisional(spawn, rng)?;
        obstacle.start_at(y);
        Ok(Some(self.commit(obstacle)))
    }

    /// Clear the street and every spawn record, lift the halt
    pub fn reset(&mut self) {
        self.active.clear();
        self.records.clear();
        self.halted = false;
    }

    /// Build an obstacle at the kind's spawn point; id is assigned on commit
    fn provisional<R: RandomSource>(
        &self,
        spawn: &SpawnConfig,
        rng: &mut R,
    ) -> Result<Obstacle, ArtError> {
        let kind = spawn.kind;
        let art = &self.config.art;
        let frames = art.frame_count(kind)?;
        let size = art.frame_size(kind)?;

        let lane = spawn.allowed_lanes[rng.index(spawn.allowed_lanes.len())];
        let (variant, door) = if kind.has_door() {
            (0, Some(DoorState::Closed))
        } else {
            (rng.index(frames), None)
        };
        let range = spawn.random_spacing_range;
        let extra = range.min + rng.index(range.span()) as u32;

        Ok(Obstacle {
            id: 0,
            kind,
            pos: Vec2::new(
                self.config.lanes.column(lane) + spawn.lane_offset,
                spawn.spawn_y,
            ),
            size,
            direction: spawn.direction,
            velocity: self.config.velocity(spawn),
            lane,
            min_spacing: spawn.base_spacing + extra as f32,
            variant,
            door,
            origin_y: spawn.spawn_y,
            steps: 0,
        })
    }

    fn commit(&mut self, mut obstacle: Obstacle) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        obstacle.id = id;
        log::debug!(
            "Spawned {} #{} at ({}, {})",
            obstacle.kind,
            id,
            obstacle.pos.x,
            obstacle.pos.y
        );
        self.active.push(obstacle);
        id
    }
}
