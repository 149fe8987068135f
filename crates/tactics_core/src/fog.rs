//! Fog of war: a per-cell visibility grid over the whole map.
//!
//! Each cell is one of three states. Cells start hidden, become visible
//! while a living friendly unit can see them, and decay to explored when
//! sight moves away. Explored cells never return to hidden.

use serde::{Deserialize, Serialize};

use crate::map::MAP_SIZE;
use crate::math::{Fixed, Vec2Fixed};

/// Side length of one fog cell in world units.
pub const FOG_CELL_SIZE: i32 = 96;

/// Number of fog cells along each axis.
pub const FOG_GRID: usize = (MAP_SIZE / FOG_CELL_SIZE) as usize;

/// Radius around a living friendly unit within which fog cells are
/// revealed. Slightly wider than combat sight so the player sees a
/// threat before their units react to it.
pub const FOG_REVEAL_RADIUS: i32 = 450;

/// Visibility state of one fog cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FogState {
    /// Never seen. Fully opaque.
    Hidden,
    /// Seen before but not currently in sight. Terrain shows, units don't.
    Explored,
    /// Currently in sight of a living friendly unit.
    Visible,
}

impl FogState {
    /// Numeric code used by the save file format.
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            FogState::Hidden => 0,
            FogState::Explored => 1,
            FogState::Visible => 2,
        }
    }

    /// Decode a numeric save-file code.
    #[must_use]
    pub const fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(FogState::Hidden),
            1 => Some(FogState::Explored),
            2 => Some(FogState::Visible),
            _ => None,
        }
    }
}

/// The full fog grid, column-major to match the save file layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FogGrid {
    cells: Vec<FogState>,
}

impl Default for FogGrid {
    fn default() -> Self {
        Self::new()
    }
}

impl FogGrid {
    /// A fully hidden grid, the state at the start of a fresh level.
    #[must_use]
    pub fn new() -> Self {
        Self {
            cells: vec![FogState::Hidden; FOG_GRID * FOG_GRID],
        }
    }

    /// State of the cell at grid coordinates `(x, y)`. Out-of-range
    /// coordinates read as hidden.
    #[must_use]
    pub fn cell(&self, x: usize, y: usize) -> FogState {
        if x >= FOG_GRID || y >= FOG_GRID {
            return FogState::Hidden;
        }
        self.cells[x * FOG_GRID + y]
    }

    /// Set the cell at grid coordinates `(x, y)`. Out-of-range writes are
    /// ignored.
    pub fn set_cell(&mut self, x: usize, y: usize, state: FogState) {
        if x < FOG_GRID && y < FOG_GRID {
            self.cells[x * FOG_GRID + y] = state;
        }
    }

    /// State of the cell covering the world-space point, for fog-gated
    /// queries like enemy targeting. Points off the map read as hidden.
    #[must_use]
    pub fn at_world(&self, point: Vec2Fixed) -> FogState {
        let x: i32 = point.x.to_num();
        let y: i32 = point.y.to_num();
        if x < 0 || y < 0 {
            return FogState::Hidden;
        }
        self.cell((x / FOG_CELL_SIZE) as usize, (y / FOG_CELL_SIZE) as usize)
    }

    /// Advance the fog one tick: every visible cell decays to explored,
    /// then every cell whose center lies within [`FOG_REVEAL_RADIUS`] of a
    /// living friendly unit's center becomes visible.
    ///
    /// `viewer_centers` holds the centers of living friendly units only.
    pub fn update(&mut self, viewer_centers: &[Vec2Fixed]) {
        let radius = Fixed::from_num(FOG_REVEAL_RADIUS);
        let radius_sq = radius * radius;

        for x in 0..FOG_GRID {
            for y in 0..FOG_GRID {
                let idx = x * FOG_GRID + y;
                if self.cells[idx] == FogState::Visible {
                    self.cells[idx] = FogState::Explored;
                }

                let cell_center = Vec2Fixed::from_ints(
                    x as i32 * FOG_CELL_SIZE + FOG_CELL_SIZE / 2,
                    y as i32 * FOG_CELL_SIZE + FOG_CELL_SIZE / 2,
                );
                for center in viewer_centers {
                    if center.distance_squared(cell_center) < radius_sq {
                        self.cells[idx] = FogState::Visible;
                        break;
                    }
                }
            }
        }
    }

    /// Iterate cells in save-file order: outer loop x, inner loop y.
    pub fn iter_codes(&self) -> impl Iterator<Item = i32> + '_ {
        self.cells.iter().map(|state| state.code())
    }

    /// Rebuild a grid from save-file codes in the same order
    /// [`iter_codes`](Self::iter_codes) produces them.
    ///
    /// Returns `None` if the slice has the wrong length or holds an
    /// unknown code.
    #[must_use]
    pub fn from_codes(codes: &[i32]) -> Option<Self> {
        if codes.len() != FOG_GRID * FOG_GRID {
            return None;
        }
        let cells = codes
            .iter()
            .map(|&code| FogState::from_code(code))
            .collect::<Option<Vec<_>>>()?;
        Some(Self { cells })
    }
}
