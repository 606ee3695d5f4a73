//! Darling entities
//!
//! Every obstacle is the same struct tagged with an `ObstacleKind`. Per-kind
//! behaviour (lane, speed, spacing) comes from the spawn table, the only
//! kind-specific state is the parked car's door.

use std::fmt;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::geometry::BoundingBox;
use crate::config::{FieldConfig, Lane};
use crate::consts::HITBOX_INSET;

/// Darling types, in spawn evaluation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ObstacleKind {
    /// TTC streetcar on the tracks
    Streetcar,
    /// Car sharing the streetcar lane
    LaneDeathMachine,
    /// Traffic in the opposite lane
    OncomingDeathMachine,
    /// Parked car whose door swings into the bike lane
    ParkedDeathMachine,
    /// Pedestrian on the sidewalk
    Wanderer,
    Building,
}

impl ObstacleKind {
    /// Fixed evaluation order for spawn passes and scans
    pub const ALL: [ObstacleKind; 6] = [
        ObstacleKind::Streetcar,
        ObstacleKind::LaneDeathMachine,
        ObstacleKind::OncomingDeathMachine,
        ObstacleKind::ParkedDeathMachine,
        ObstacleKind::Wanderer,
        ObstacleKind::Building,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ObstacleKind::Streetcar => "streetcar",
            ObstacleKind::LaneDeathMachine => "lane death-machine",
            ObstacleKind::OncomingDeathMachine => "oncoming death-machine",
            ObstacleKind::ParkedDeathMachine => "parked death-machine",
            ObstacleKind::Wanderer => "wanderer",
            ObstacleKind::Building => "building",
        }
    }

    /// Whether this kind carries a door state machine
    pub fn has_door(&self) -> bool {
        *self == ObstacleKind::ParkedDeathMachine
    }
}

impl fmt::Display for ObstacleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Vertical travel direction (y grows toward the bottom of the street)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Down,
    Up,
}

impl Direction {
    #[inline]
    pub fn sign(&self) -> f32 {
        match self {
            Direction::Down => 1.0,
            Direction::Up => -1.0,
        }
    }
}

/// Parked car door animation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DoorState {
    #[default]
    Closed,
    Opening1,
    Opening2,
    Opening3,
    FullyOpen,
}

impl DoorState {
    pub const ALL: [DoorState; 5] = [
        DoorState::Closed,
        DoorState::Opening1,
        DoorState::Opening2,
        DoorState::Opening3,
        DoorState::FullyOpen,
    ];
    /// Number of door frames a parked car's art must provide
    pub const COUNT: usize = Self::ALL.len();

    /// The following state; `FullyOpen` wraps to `Closed`
    pub fn next(self) -> Self {
        match self {
            DoorState::Closed => DoorState::Opening1,
            DoorState::Opening1 => DoorState::Opening2,
            DoorState::Opening2 => DoorState::Opening3,
            DoorState::Opening3 => DoorState::FullyOpen,
            DoorState::FullyOpen => DoorState::Closed,
        }
    }

    /// Art frame index
    pub fn index(self) -> usize {
        self as usize
    }

    /// Once a door leaves `Closed` it keeps moving every step
    pub fn is_triggered(self) -> bool {
        self != DoorState::Closed
    }
}

/// A spawned darling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub id: u32,
    pub kind: ObstacleKind,
    /// Top-left corner of the art (grid units)
    pub pos: Vec2,
    /// Extent of the largest art frame
    pub size: Vec2,
    pub direction: Direction,
    /// Signed displacement per movement step
    pub velocity: f32,
    pub lane: Lane,
    /// Required clear gap to the nearest neighbour at spawn time
    pub min_spacing: f32,
    /// Art frame for kinds without a door
    pub variant: usize,
    #[serde(default)]
    pub door: Option<DoorState>,
    /// Row the obstacle entered the street at
    pub origin_y: f32,
    /// Movement steps taken since `origin_y`
    #[serde(default)]
    pub steps: u32,
}

impl Obstacle {
    /// Collision/spacing box, inset horizontally like the art's physics body
    pub fn bounds(&self) -> BoundingBox {
        BoundingBox::new(
            Vec2::new(self.pos.x + HITBOX_INSET, self.pos.y),
            Vec2::new((self.size.x - 2.0 * HITBOX_INSET).max(0.0), self.size.y),
        )
    }

    /// Art frame currently shown
    pub fn frame(&self) -> usize {
        match self.door {
            Some(door) => door.index(),
            None => self.variant,
        }
    }

    /// Put the obstacle at row `y` with no steps taken
    pub fn start_at(&mut self, y: f32) {
        self.origin_y = y;
        self.steps = 0;
        self.pos.y = y;
    }

    /// Move one step along the travel direction
    ///
    /// The row is recomputed from the origin so repeated steps never
    /// accumulate rounding error.
    pub fn step(&mut self) {
        self.steps += 1;
        self.pos.y = self.origin_y + self.velocity * self.steps as f32;
    }

    /// Advance the door by exactly one state (no-op without a door)
    pub fn advance_door(&mut self) {
        if let Some(door) = self.door.as_mut() {
            *door = door.next();
        }
    }

    /// True once the door has been triggered and is mid-cycle
    pub fn door_triggered(&self) -> bool {
        self.door.is_some_and(DoorState::is_triggered)
    }

    /// Past the off-screen bound in the direction of travel
    pub fn is_past(&self, field: &FieldConfig) -> bool {
        match self.direction {
            Direction::Down => self.pos.y > field.height + field.offscreen_buffer,
            Direction::Up => self.pos.y + self.size.y < -field.offscreen_buffer,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn parked(y: f32) -> Obstacle {
        Obstacle {
            id: 1,
            kind: ObstacleKind::ParkedDeathMachine,
            pos: Vec2::new(17.0, y),
            size: Vec2::new(7.0, 4.0),
            direction: Direction::Down,
            velocity: 2.0,
            lane: Lane::Parked,
            min_spacing: 1.0,
            variant: 0,
            door: Some(DoorState::Closed),
            origin_y: y,
            steps: 0,
        }
    }

    #[test]
    fn test_door_cycle_order() {
        let mut door = DoorState::Closed;
        let mut seen = Vec::new();
        for _ in 0..DoorState::COUNT {
            door = door.next();
            seen.push(door);
        }
        assert_eq!(
            seen,
            vec![
                DoorState::Opening1,
                DoorState::Opening2,
                DoorState::Opening3,
                DoorState::FullyOpen,
                DoorState::Closed,
            ]
        );
    }

    #[test]
    fn test_advance_door_moves_frame() {
        let mut car = parked(0.0);
        assert_eq!(car.frame(), 0);
        assert!(!car.door_triggered());
        car.advance_door();
        assert_eq!(car.door, Some(DoorState::Opening1));
        assert_eq!(car.frame(), 1);
        assert!(car.door_triggered());
    }

    #[test]
    fn test_bounds_inset() {
        let car = parked(3.0);
        let b = car.bounds();
        assert!((b.pos.x - 17.3).abs() < 1e-5);
        assert!((b.size.x - 6.4).abs() < 1e-5);
        assert_eq!(b.pos.y, 3.0);
        assert_eq!(b.size.y, 4.0);
    }

    #[test]
    fn test_is_past_by_direction() {
        let field = FieldConfig::default();
        let mut car = parked(field.height + field.offscreen_buffer);
        assert!(!car.is_past(&field));
        car.step();
        assert!(car.is_past(&field));

        let mut up = parked(-field.offscreen_buffer - 4.0);
        up.direction = Direction::Up;
        assert!(!up.is_past(&field));
        up.pos.y -= 0.5;
        assert!(up.is_past(&field));
    }

    #[test]
    fn test_steps_do_not_drift() {
        let mut car = parked(0.0);
        car.velocity = 0.3;
        for _ in 0..1000 {
            car.step();
        }
        assert_eq!(car.steps, 1000);
        assert_eq!(car.pos.y, 0.3 * 1000.0);

        car.start_at(-8.0);
        assert_eq!(car.steps, 0);
        car.step();
        assert_eq!(car.pos.y, -8.0 + 0.3);
    }

    proptest! {
        #[test]
        fn door_never_skips(start in 0usize..DoorState::COUNT) {
            let door = DoorState::ALL[start];
            let next = door.next();
            prop_assert_eq!(next.index(), (door.index() + 1) % DoorState::COUNT);
        }
    }
}
