//! Static map geometry: obstacles and passable terrain.
//!
//! The map layer supplies obstacle footprints to the collision resolver.
//! Road tiles are part of the map data but generate no collision events at
//! all, so they never enter the obstruction set.

use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};
use crate::level::LineReader;
use crate::math::Vec2Fixed;

/// Side length of the square map in world units.
pub const MAP_SIZE: i32 = 3072;

/// Maximum number of obstacles a map may declare.
pub const MAX_OBSTACLES: usize = 600;

/// Kinds of static map objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObstacleKind {
    /// Single tree.
    Tree,
    /// Low bush.
    Bush,
    /// Small pond.
    Pond,
    /// Large lake.
    Lake,
    /// North-south road segment (passable).
    PathNorth,
    /// East-west road segment (passable).
    PathEast,
    /// North-south wall segment.
    WallNorth,
    /// Wall end cap.
    WallCap,
}

impl ObstacleKind {
    /// Numeric code used by the map file format.
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            ObstacleKind::Tree => 1,
            ObstacleKind::Bush => 2,
            ObstacleKind::Pond => 3,
            ObstacleKind::Lake => 4,
            ObstacleKind::PathNorth => 5,
            ObstacleKind::PathEast => 6,
            ObstacleKind::WallNorth => 7,
            ObstacleKind::WallCap => 8,
        }
    }

    /// Decode a numeric map-file code.
    #[must_use]
    pub const fn from_code(code: i32) -> Option<Self> {
        match code {
            1 => Some(ObstacleKind::Tree),
            2 => Some(ObstacleKind::Bush),
            3 => Some(ObstacleKind::Pond),
            4 => Some(ObstacleKind::Lake),
            5 => Some(ObstacleKind::PathNorth),
            6 => Some(ObstacleKind::PathEast),
            7 => Some(ObstacleKind::WallNorth),
            8 => Some(ObstacleKind::WallCap),
            _ => None,
        }
    }

    /// Footprint size `(width, height)` in world units.
    #[must_use]
    pub const fn footprint(self) -> (i32, i32) {
        match self {
            ObstacleKind::Tree => (96, 96),
            ObstacleKind::Bush => (64, 64),
            ObstacleKind::Pond => (192, 128),
            ObstacleKind::Lake => (288, 192),
            ObstacleKind::PathNorth => (96, 96),
            ObstacleKind::PathEast => (96, 96),
            ObstacleKind::WallNorth => (48, 96),
            ObstacleKind::WallCap => (48, 48),
        }
    }

    /// Roads don't obstruct unit movement.
    #[must_use]
    pub const fn is_passable(self) -> bool {
        matches!(self, ObstacleKind::PathNorth | ObstacleKind::PathEast)
    }
}

/// A static map object with a fixed position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    /// What kind of object this is.
    pub kind: ObstacleKind,
    /// Top-left corner in world coordinates.
    pub position: Vec2Fixed,
}

impl Obstacle {
    /// Footprint width in world units.
    #[must_use]
    pub fn width(&self) -> i32 {
        self.kind.footprint().0
    }

    /// Footprint height in world units.
    #[must_use]
    pub fn height(&self) -> i32 {
        self.kind.footprint().1
    }
}

/// All static geometry for one level.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Map {
    obstacles: Vec<Obstacle>,
}

impl Map {
    /// Build a map from a list of obstacles.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::RosterFull`] if the list exceeds
    /// [`MAX_OBSTACLES`].
    pub fn new(obstacles: Vec<Obstacle>) -> Result<Self> {
        if obstacles.len() > MAX_OBSTACLES {
            return Err(GameError::RosterFull {
                what: "obstacles",
                requested: obstacles.len(),
                capacity: MAX_OBSTACLES,
            });
        }
        Ok(Self { obstacles })
    }

    /// Parse the map text format:
    /// object count, then per object a `[Object]` header, kind code, x, y.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::MalformedRecord`] for unparsable lines or
    /// unknown kind codes, and [`GameError::CountMismatch`] when the file
    /// ends before the declared count is satisfied.
    pub fn parse(text: &str) -> Result<Self> {
        let mut reader = LineReader::new(text);
        let count = reader.read_usize("object count")?;

        if count > MAX_OBSTACLES {
            return Err(GameError::CountMismatch {
                what: "obstacles",
                declared: count,
                found: MAX_OBSTACLES,
            });
        }

        let mut obstacles = Vec::with_capacity(count);
        for _ in 0..count {
            reader.expect_header("[Object]", "obstacles", count, obstacles.len())?;
            let code = reader.read_i32("object kind")?;
            let kind = ObstacleKind::from_code(code).ok_or(GameError::MalformedRecord {
                line: reader.line(),
                message: format!("unknown object kind {code}"),
            })?;
            let x = reader.read_i32("object x")?;
            let y = reader.read_i32("object y")?;
            obstacles.push(Obstacle {
                kind,
                position: Vec2Fixed::from_ints(x, y),
            });
        }

        Ok(Self { obstacles })
    }

    /// Write the map back out in the same text format.
    #[must_use]
    pub fn write(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("{}\n", self.obstacles.len()));
        for obstacle in &self.obstacles {
            out.push_str("[Object]\n");
            out.push_str(&format!("{}\n", obstacle.kind.code()));
            out.push_str(&format!("{}\n", obstacle.position.x.to_num::<i32>()));
            out.push_str(&format!("{}\n", obstacle.position.y.to_num::<i32>()));
        }
        out
    }

    /// All objects, roads included.
    #[must_use]
    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    /// Objects that obstruct movement (roads filtered out).
    pub fn obstructions(&self) -> impl Iterator<Item = &Obstacle> {
        self.obstacles.iter().filter(|o| !o.kind.is_passable())
    }
}
