//! ASCII art for every darling
//!
//! The simulation only cares about which cells of a glyph block are
//! non-space: those are the cells that can hit the bicycle. Everything else
//! about the art belongs to the renderer.

use std::collections::BTreeMap;
use std::fmt;

use glam::{IVec2, Vec2};
use serde::{Deserialize, Serialize};

use crate::sim::obstacle::{DoorState, ObstacleKind};

/// Art lookup failure. Always a configuration/spawn-table mismatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtError {
    /// No frames registered for this kind
    UnknownKind(ObstacleKind),
    /// Frame index past the end of the kind's frame list
    MissingFrame { kind: ObstacleKind, frame: usize },
    /// Frame with no visible cell
    EmptyGlyph { kind: ObstacleKind, frame: usize },
    EmptyBicycle,
}

impl fmt::Display for ArtError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtError::UnknownKind(kind) => write!(f, "no art registered for {kind}"),
            ArtError::MissingFrame { kind, frame } => {
                write!(f, "{kind} has no art frame {frame}")
            }
            ArtError::EmptyGlyph { kind, frame } => {
                write!(f, "{kind} art frame {frame} has no visible cells")
            }
            ArtError::EmptyBicycle => f.write_str("bicycle art has no visible cells"),
        }
    }
}

impl std::error::Error for ArtError {}

/// A block of text rows; spaces are transparent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GlyphBlock {
    pub rows: Vec<String>,
}

impl GlyphBlock {
    pub fn new<S: AsRef<str>>(rows: &[S]) -> Self {
        Self {
            rows: rows.iter().map(|r| r.as_ref().to_string()).collect(),
        }
    }

    /// Widest row, in columns
    pub fn width(&self) -> usize {
        self.rows.iter().map(|r| r.chars().count()).max().unwrap_or(0)
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width() as f32, self.height() as f32)
    }

    /// Offsets (column, row) of every non-space character
    pub fn cells(&self) -> impl Iterator<Item = IVec2> + '_ {
        self.rows.iter().enumerate().flat_map(|(row, line)| {
            line.chars()
                .enumerate()
                .filter(|(_, ch)| !ch.is_whitespace())
                .map(move |(col, _)| IVec2::new(col as i32, row as i32))
        })
    }

    pub fn is_blank(&self) -> bool {
        self.cells().next().is_none()
    }
}

/// Frames per darling kind plus the bicycle
///
/// Parked death-machines are indexed by door state; other kinds by the
/// variant drawn at spawn time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtTable {
    pub frames: BTreeMap<ObstacleKind, Vec<GlyphBlock>>,
    pub bicycle: GlyphBlock,
}

impl ArtTable {
    pub fn glyph(&self, kind: ObstacleKind, frame: usize) -> Result<&GlyphBlock, ArtError> {
        self.frames_for(kind)?
            .get(frame)
            .ok_or(ArtError::MissingFrame { kind, frame })
    }

    pub fn frame_count(&self, kind: ObstacleKind) -> Result<usize, ArtError> {
        Ok(self.frames_for(kind)?.len())
    }

    /// Extent covering every frame of `kind`
    pub fn frame_size(&self, kind: ObstacleKind) -> Result<Vec2, ArtError> {
        Ok(self
            .frames_for(kind)?
            .iter()
            .map(GlyphBlock::size)
            .fold(Vec2::ZERO, Vec2::max))
    }

    pub fn bicycle(&self) -> &GlyphBlock {
        &self.bicycle
    }

    /// Check every kind has usable art; parked cars need one frame per door state
    pub fn validate(&self) -> Result<(), ArtError> {
        for kind in ObstacleKind::ALL {
            let frames = self.frames_for(kind)?;
            let required = if kind.has_door() { DoorState::COUNT } else { 1 };
            if frames.len() < required {
                return Err(ArtError::MissingFrame {
                    kind,
                    frame: frames.len(),
                });
            }
            if let Some(frame) = frames.iter().position(GlyphBlock::is_blank) {
                return Err(ArtError::EmptyGlyph { kind, frame });
            }
        }
        if self.bicycle.is_blank() {
            return Err(ArtError::EmptyBicycle);
        }
        Ok(())
    }

    fn frames_for(&self, kind: ObstacleKind) -> Result<&[GlyphBlock], ArtError> {
        match self.frames.get(&kind) {
            Some(frames) if !frames.is_empty() => Ok(frames),
            _ => Err(ArtError::UnknownKind(kind)),
        }
    }
}

impl Default for ArtTable {
    fn default() -> Self {
        let vehicle = |roof: &str| {
            GlyphBlock::new(&[".--.", roof, "|  |", "|##|", "'--'"])
        };

        // Door swings left out of the body, toward the bike lane
        let parked = |door: &str| {
            GlyphBlock::new(&["   .--.", "   |##|", door, "   |##|", "   '--'"])
        };

        let mut frames = BTreeMap::new();
        frames.insert(
            ObstacleKind::Streetcar,
            vec![GlyphBlock::new(&[
                ".----.", "|TTC |", "|[]  |", "|  []|", "|[]  |", "|  []|", "|[]  |", "|  []|",
                "|    |", "'----'",
            ])],
        );
        frames.insert(
            ObstacleKind::LaneDeathMachine,
            vec![vehicle("|##|"), vehicle("|==|")],
        );
        frames.insert(
            ObstacleKind::OncomingDeathMachine,
            vec![vehicle("|##|"), vehicle("|==|")],
        );
        frames.insert(
            ObstacleKind::ParkedDeathMachine,
            vec![
                parked("   |  |"),
                parked("  \\|  |"),
                parked(" _\\|  |"),
                parked("__-|  |"),
                parked("___|  |"),
            ],
        );
        frames.insert(
            ObstacleKind::Wanderer,
            vec![GlyphBlock::new(&["o", "^"]), GlyphBlock::new(&["o", "A"])],
        );
        frames.insert(
            ObstacleKind::Building,
            vec![
                GlyphBlock::new(&[" _____ ", "|[] []|", "|[] []|", "|[] []|", "|_____|"]),
                GlyphBlock::new(&["  /\\  ", " /  \\ ", "|[]  |", "|  []|", "|[]  |", "|____|"]),
                GlyphBlock::new(&[" | ", " | ", "(O)", " | ", " | ", "/_\\"]),
            ],
        );

        Self {
            frames,
            bicycle: GlyphBlock::new(&[" |", "-o-", " |"]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table_is_valid() {
        let art = ArtTable::default();
        assert!(art.validate().is_ok());
        assert_eq!(
            art.frame_count(ObstacleKind::ParkedDeathMachine).unwrap(),
            DoorState::COUNT
        );
    }

    #[test]
    fn test_glyph_cells_skip_spaces() {
        let bike = GlyphBlock::new(&[" |", "-o-", " |"]);
        let cells: Vec<IVec2> = bike.cells().collect();
        assert_eq!(
            cells,
            vec![
                IVec2::new(1, 0),
                IVec2::new(0, 1),
                IVec2::new(1, 1),
                IVec2::new(2, 1),
                IVec2::new(1, 2),
            ]
        );
        assert_eq!(bike.size(), Vec2::new(3.0, 3.0));
    }

    #[test]
    fn test_missing_kind_fails_loudly() {
        let mut art = ArtTable::default();
        art.frames.remove(&ObstacleKind::Wanderer);
        assert_eq!(
            art.glyph(ObstacleKind::Wanderer, 0),
            Err(ArtError::UnknownKind(ObstacleKind::Wanderer))
        );
        assert_eq!(
            art.validate(),
            Err(ArtError::UnknownKind(ObstacleKind::Wanderer))
        );
    }

    #[test]
    fn test_parked_needs_every_door_frame() {
        let mut art = ArtTable::default();
        if let Some(frames) = art.frames.get_mut(&ObstacleKind::ParkedDeathMachine) {
            frames.truncate(3);
        }
        assert_eq!(
            art.validate(),
            Err(ArtError::MissingFrame {
                kind: ObstacleKind::ParkedDeathMachine,
                frame: 3
            })
        );
        assert!(art.glyph(ObstacleKind::ParkedDeathMachine, 4).is_err());
    }

    #[test]
    fn test_frame_size_covers_all_frames() {
        let art = ArtTable::default();
        let size = art.frame_size(ObstacleKind::Building).unwrap();
        assert_eq!(size, Vec2::new(7.0, 6.0));
    }
}
