//! Bicycle vs darling collision detection
//!
//! Most darlings kill on any bounding-box contact. A parked car's box also
//! covers the empty space its door swings through, so for parked cars the
//! actual glyph cells must touch: the door only becomes deadly once its
//! characters reach the bicycle's cells.

use std::collections::HashSet;

use glam::{IVec2, Vec2};

use super::geometry::overlap_distance;
use super::obstacle::{Obstacle, ObstacleKind};
use super::spawn::ActiveSet;
use super::state::Bicycle;
use crate::art::{ArtError, ArtTable, GlyphBlock};

/// A confirmed hit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Collision {
    pub obstacle_id: u32,
    pub kind: ObstacleKind,
}

/// Grid cells covered by the non-space characters of `glyph` drawn at `origin`
pub fn glyph_cells(glyph: &GlyphBlock, origin: Vec2) -> impl Iterator<Item = IVec2> + '_ {
    let base = origin.floor().as_ivec2();
    glyph.cells().map(move |cell| base + cell)
}

/// Whether two glyph blocks share at least one occupied cell
pub fn cells_coincide(a: &GlyphBlock, a_origin: Vec2, b: &GlyphBlock, b_origin: Vec2) -> bool {
    let occupied: HashSet<IVec2> = glyph_cells(a, a_origin).collect();
    glyph_cells(b, b_origin).any(|cell| occupied.contains(&cell))
}

/// Hit test for one obstacle
pub fn obstacle_hits(
    bicycle: &Bicycle,
    obstacle: &Obstacle,
    art: &ArtTable,
) -> Result<bool, ArtError> {
    let bike_art = art.bicycle();
    if overlap_distance(&bicycle.bounds(bike_art), &obstacle.bounds()) > 0.0 {
        return Ok(false);
    }
    if obstacle.kind != ObstacleKind::ParkedDeathMachine {
        return Ok(true);
    }
    let car_art = art.glyph(obstacle.kind, obstacle.frame())?;
    Ok(cells_coincide(
        bike_art,
        bicycle.origin(),
        car_art,
        obstacle.pos,
    ))
}

/// First obstacle, in active-set order, that hits the bicycle
pub fn find_collision(
    bicycle: &Bicycle,
    active: &ActiveSet,
    art: &ArtTable,
) -> Result<Option<Collision>, ArtError> {
    for obstacle in active.iter() {
        if obstacle_hits(bicycle, obstacle, art)? {
            return Ok(Some(Collision {
                obstacle_id: obstacle.id,
                kind: obstacle.kind,
            }));
        }
    }
    Ok(None)
}
