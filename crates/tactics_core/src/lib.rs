//! # Tactics Core
//!
//! Deterministic combat simulation core for a squad-scale tactics game.
//!
//! This crate contains **only** deterministic logic:
//! - No rendering
//! - No IO (parsers take strings, writers return them)
//! - No system randomness
//! - No floating-point math (uses fixed-point)
//!
//! This separation enables:
//! - Headless batch runs
//! - Replay systems
//! - Determinism testing
//!
//! ## Crate Structure
//!
//! - [`unit`] - Unit stats, orders, and the behavior state machine
//! - [`combat`] - Damage formula and cheat modifiers
//! - [`projectile`] - Homing projectiles and ability payloads
//! - [`collision`] - Deflection pathing and powerup pickup
//! - [`fog`] - Fog of war grid
//! - [`map`] - Static map geometry and the map file format
//! - [`level`] - Level/save file format
//! - [`simulation`] - The match orchestrator
//! - [`math`] - Fixed-point math utilities

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod collision;
pub mod combat;
pub mod error;
pub mod fog;
pub mod level;
pub mod map;
pub mod math;
pub mod powerup;
pub mod projectile;
pub mod roster;
pub mod simulation;
pub mod unit;
pub mod view;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::combat::{calc_damage, Cheats};
    pub use crate::error::{GameError, Result};
    pub use crate::fog::{FogGrid, FogState};
    pub use crate::level::{Difficulty, LevelData};
    pub use crate::map::{Map, Obstacle, ObstacleKind, MAP_SIZE};
    pub use crate::math::{Fixed, Vec2Fixed};
    pub use crate::powerup::{Powerup, PowerupKind};
    pub use crate::roster::{Allegiance, Roster, UnitHandle};
    pub use crate::simulation::{Camera, Command, MatchStatus, Simulation};
    pub use crate::unit::{Facing, Unit, UnitKind, UnitState, UNIT_SIZE};
}
