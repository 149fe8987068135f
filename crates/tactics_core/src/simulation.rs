//! The match orchestrator: owns all entities and drives the tick loop.
//!
//! Tick order is fixed and load-bearing: units update sequentially
//! (friendly roster first, enemy roster second), each unit reading a fresh
//! world snapshot so it observes the settled results of units updated
//! before it in the same tick. Collisions resolve after all movement, fog
//! updates after collisions, and the victory check runs last, so a kill
//! landed this tick counts this tick.

use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use tracing::{debug, info, warn};

use crate::collision::CollisionContext;
use crate::combat::Cheats;
use crate::error::{GameError, Result};
use crate::fog::{FogGrid, FogState};
use crate::level::{Difficulty, LevelData, PowerupRecord, UnitRecord};
use crate::map::{Map, MAP_SIZE};
use crate::math::{Fixed, Vec2Fixed};
use crate::powerup::Powerup;
use crate::roster::{Allegiance, Roster, UnitHandle};
use crate::unit::{SpecialKind, Unit, UNIT_SIZE};
use crate::view::{UnitSnapshot, WorldView};

/// Maximum units per roster.
pub const MAX_UNITS: usize = 50;

/// Maximum powerups per level.
pub const MAX_POWERUPS: usize = 10;

/// Maximum units in one selection.
pub const MAX_SELECTED: usize = 8;

/// Campaign level with the commander victory rule.
pub const FINAL_LEVEL: u32 = 3;

/// Horizontal spacing between formation slots.
pub const FORMATION_SPACING: i32 = 100;

/// Formation slots per row.
pub const FORMATION_ROW: usize = 4;

/// Camera viewport width in world units.
pub const VIEWPORT_WIDTH: i32 = 1024;

/// Camera viewport height in world units.
pub const VIEWPORT_HEIGHT: i32 = 624;

/// Match outcome state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchStatus {
    /// The match is running.
    Playing,
    /// All victory conditions met. Terminal.
    Victory,
    /// All player units lost. Terminal.
    Defeat,
}

/// Scroll camera over the map, clamped so the viewport never leaves it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Camera {
    /// Left edge of the viewport in world coordinates.
    pub x: i32,
    /// Top edge of the viewport in world coordinates.
    pub y: i32,
}

impl Camera {
    /// Starting camera position for a campaign level.
    #[must_use]
    pub const fn start_for_level(level: u32) -> Self {
        match level {
            2 => Self { x: 1200, y: 1800 },
            3 => Self { x: 0, y: 900 },
            _ => Self { x: 1050, y: 2300 },
        }
    }

    /// Pan by a delta, clamped to the map edges.
    pub fn pan(&mut self, dx: i32, dy: i32) {
        self.move_to(self.x + dx, self.y + dy);
    }

    /// Jump to a position, clamped to the map edges.
    pub fn move_to(&mut self, x: i32, y: i32) {
        self.x = x.clamp(0, MAP_SIZE - VIEWPORT_WIDTH);
        self.y = y.clamp(0, MAP_SIZE - VIEWPORT_HEIGHT);
    }
}

/// A player command applied to the current selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Move the selection to a destination in formation.
    Move {
        /// Formation anchor (top-left corner of the first slot).
        destination: Vec2Fixed,
    },
    /// Attack a specific enemy unit.
    Attack {
        /// The enemy to attack.
        target: UnitHandle,
    },
    /// Advance in formation, engaging anything sighted on the way.
    AttackMove {
        /// Formation anchor.
        destination: Vec2Fixed,
    },
    /// Stop in place.
    Stop,
    /// Hold position.
    StandGround,
    /// Cast heal on a friendly unit. Only clerics off cooldown respond.
    Heal {
        /// The friendly unit to heal.
        target: UnitHandle,
    },
    /// Cast lightning on an enemy unit. Only wizards off cooldown respond.
    Lightning {
        /// The enemy to strike.
        target: UnitHandle,
    },
}

/// One full match: rosters, geometry, fog, camera, and outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Simulation {
    friendly: Roster<Unit>,
    enemies: Roster<Unit>,
    powerups: Roster<Powerup>,
    map: Map,
    map_file: String,
    fog: FogGrid,
    camera: Camera,
    level: u32,
    difficulty: Difficulty,
    status: MatchStatus,
    cheats: Cheats,
    paused: bool,
    tick_count: u64,
}

impl Simulation {
    /// Build a match from parsed level data and its map.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::RosterFull`] if the level declares more
    /// entities than a roster holds, and [`GameError::InvalidState`] if a
    /// unit record sits in the wrong roster for its kind.
    pub fn load(data: LevelData, map: Map) -> Result<Self> {
        let mut friendly = Roster::new("friendly units", MAX_UNITS);
        for (index, record) in data.friendly.iter().enumerate() {
            let unit = Self::build_unit(
                record,
                UnitHandle::friendly(index),
                Allegiance::Friendly,
                data.difficulty,
            )?;
            friendly.push(unit)?;
        }

        let mut enemies = Roster::new("enemy units", MAX_UNITS);
        for (index, record) in data.enemies.iter().enumerate() {
            let unit = Self::build_unit(
                record,
                UnitHandle::enemy(index),
                Allegiance::Enemy,
                data.difficulty,
            )?;
            enemies.push(unit)?;
        }

        let mut powerups = Roster::new("powerups", MAX_POWERUPS);
        for &PowerupRecord { kind, position } in &data.powerups {
            powerups.push(Powerup::new(kind, position))?;
        }

        if data.level == FINAL_LEVEL
            && !matches!(
                enemies.get(0).map(Unit::kind),
                Some(crate::unit::UnitKind::Commander)
            )
        {
            // Victory on this level keys off the first enemy slot.
            warn!("final level loaded without a commander in the first enemy slot");
        }

        info!(
            level = data.level,
            friendly = friendly.len(),
            enemies = enemies.len(),
            powerups = powerups.len(),
            "level loaded"
        );

        Ok(Self {
            friendly,
            enemies,
            powerups,
            map,
            map_file: data.map_file,
            fog: data.fog,
            camera: Camera::start_for_level(data.level),
            level: data.level,
            difficulty: data.difficulty,
            status: MatchStatus::Playing,
            cheats: Cheats::NONE,
            paused: false,
            tick_count: 0,
        })
    }

    fn build_unit(
        record: &UnitRecord,
        handle: UnitHandle,
        expected: Allegiance,
        difficulty: Difficulty,
    ) -> Result<Unit> {
        if record.kind.allegiance() != expected {
            return Err(GameError::InvalidState(format!(
                "{:?} record holds a {:?} unit",
                expected, record.kind
            )));
        }
        // A living unit always has positive HP.
        if record.hp < 1 {
            return Err(GameError::InvalidState(format!(
                "{:?} record with non-positive hp {}",
                record.kind, record.hp
            )));
        }
        let mut unit = Unit::new(record.kind, handle, record.position, difficulty);
        unit.set_hp(record.hp);
        Ok(unit)
    }

    /// Advance the match by one tick of `elapsed_ms` simulated time.
    /// Does nothing while paused or after the match is decided.
    pub fn tick(&mut self, elapsed_ms: u32) {
        if self.paused || self.status != MatchStatus::Playing {
            return;
        }

        self.update_roster(Allegiance::Friendly, elapsed_ms);
        self.update_roster(Allegiance::Enemy, elapsed_ms);

        let mut collisions = CollisionContext {
            friendly: &mut self.friendly,
            enemies: &mut self.enemies,
            powerups: &mut self.powerups,
            map: &self.map,
            cheats: self.cheats,
        };
        collisions.resolve();

        let viewers: Vec<Vec2Fixed> = self
            .friendly
            .iter()
            .filter(|u| u.is_alive())
            .map(Unit::center)
            .collect();
        self.fog.update(&viewers);

        self.update_status();
        self.tick_count += 1;
    }

    fn update_roster(&mut self, side: Allegiance, elapsed_ms: u32) {
        let count = match side {
            Allegiance::Friendly => self.friendly.len(),
            Allegiance::Enemy => self.enemies.len(),
        };
        for index in 0..count {
            // Fresh snapshot per unit: damage applied by earlier units
            // this tick is already visible.
            let view = self.world_view();
            let handle = UnitHandle {
                allegiance: side,
                index,
            };
            let events = match self.unit_mut(handle) {
                Some(unit) => unit.update(elapsed_ms, &view),
                None => continue,
            };
            for event in events {
                let crate::unit::UnitEvent::Damage { target, delta } = event;
                self.apply_damage(target, delta);
            }
        }
    }

    fn apply_damage(&mut self, target: UnitHandle, delta: i32) {
        let cheats = self.cheats;
        if let Some(unit) = self.unit_mut(target) {
            if unit.reduce_hp(delta, cheats) {
                debug!(?target, "unit died");
            }
        }
    }

    /// Immutable snapshot of every unit on the field.
    #[must_use]
    pub fn world_view(&self) -> WorldView {
        let snapshots = self
            .friendly
            .iter()
            .chain(self.enemies.iter())
            .map(|unit| UnitSnapshot {
                handle: unit.handle(),
                position: unit.position(),
                alive: unit.is_alive(),
                armor: unit.armor(),
            })
            .collect();
        WorldView::new(snapshots)
    }

    fn update_status(&mut self) {
        let victory = if self.level == FINAL_LEVEL {
            // The campaign ends when the commander falls, whatever else
            // is still standing.
            !self.enemies.get(0).is_some_and(Unit::is_alive)
        } else {
            !self.enemies.iter().any(Unit::is_alive)
        };
        if victory {
            if self.status != MatchStatus::Victory {
                info!(level = self.level, "victory");
            }
            self.status = MatchStatus::Victory;
            return;
        }

        if !self.friendly.iter().any(Unit::is_alive) {
            if self.status != MatchStatus::Defeat {
                info!(level = self.level, "defeat");
            }
            self.status = MatchStatus::Defeat;
        }
    }

    // ------------------------------------------------------------------
    // Commands and selection
    // ------------------------------------------------------------------

    /// Apply a command to every selected living unit. Formation commands
    /// spread the selection over rows of four, spaced horizontally.
    pub fn issue_command(&mut self, command: Command) {
        if self.paused || self.status != MatchStatus::Playing {
            return;
        }
        debug!(?command, "command issued");

        let attack_position = match command {
            Command::Attack { target } | Command::Lightning { target } => {
                self.unit(target).map(Unit::position)
            }
            Command::Heal { target } => self.unit(target).map(Unit::position),
            _ => None,
        };

        let mut slot = 0usize;
        for index in 0..self.friendly.len() {
            let Some(unit) = self.friendly.get_mut(index) else {
                continue;
            };
            if !unit.is_selected() || !unit.is_alive() {
                continue;
            }
            unit.reset();

            match command {
                Command::Move { destination } => {
                    unit.order_move(Self::formation_slot(destination, slot));
                }
                Command::AttackMove { destination } => {
                    unit.order_attack_move(Self::formation_slot(destination, slot));
                }
                Command::Attack { target } => {
                    if let Some(position) = attack_position {
                        unit.order_attack(target, position);
                    }
                }
                Command::Stop => unit.order_stop(),
                Command::StandGround => unit.order_stand_ground(),
                Command::Heal { target } => {
                    if unit.kind().special() == Some(SpecialKind::Heal)
                        && unit.special_cooldown() == 0
                    {
                        if let Some(position) = attack_position {
                            unit.order_heal(target, position);
                        }
                    }
                }
                Command::Lightning { target } => {
                    if unit.kind().special() == Some(SpecialKind::Lightning)
                        && unit.special_cooldown() == 0
                    {
                        if let Some(position) = attack_position {
                            unit.order_lightning(target, position);
                        }
                    }
                }
            }
            slot += 1;
        }
    }

    fn formation_slot(anchor: Vec2Fixed, slot: usize) -> Vec2Fixed {
        let column = (slot % FORMATION_ROW) as i32;
        let row = (slot / FORMATION_ROW) as i32;
        Vec2Fixed::new(
            anchor.x + Fixed::from_num(column * FORMATION_SPACING),
            anchor.y + Fixed::from_num(row * FORMATION_SPACING),
        )
    }

    /// Select living friendly units whose centers fall inside the world
    /// rectangle, up to the selection cap. Units outside are deselected.
    /// Returns the number selected.
    pub fn select_in_rect(&mut self, min: Vec2Fixed, max: Vec2Fixed) -> usize {
        let mut selected = 0usize;
        for unit in self.friendly.iter_mut() {
            if !unit.is_alive() {
                unit.unselect();
                continue;
            }
            let center = unit.center();
            let inside = center.x >= min.x
                && center.x <= max.x
                && center.y >= min.y
                && center.y <= max.y;
            if inside && selected < MAX_SELECTED {
                unit.select();
                selected += 1;
            } else if !inside {
                unit.unselect();
            }
        }
        selected
    }

    /// Select the living friendly unit whose footprint contains the world
    /// point, deselecting all others. Returns the selected handle.
    pub fn select_at(&mut self, point: Vec2Fixed) -> Option<UnitHandle> {
        let mut picked = None;
        for unit in self.friendly.iter_mut() {
            let hit = picked.is_none()
                && unit.is_alive()
                && Self::footprint_contains(unit.position(), point);
            if hit {
                unit.select();
                picked = Some(unit.handle());
            } else {
                unit.unselect();
            }
        }
        picked
    }

    fn footprint_contains(position: Vec2Fixed, point: Vec2Fixed) -> bool {
        let size = Fixed::from_num(UNIT_SIZE);
        point.x >= position.x
            && point.x <= position.x + size
            && point.y >= position.y
            && point.y <= position.y + size
    }

    /// The living enemy at a world point, if its fog cell is currently
    /// visible. Hidden enemies cannot be targeted.
    #[must_use]
    pub fn targeted_enemy_at(&self, point: Vec2Fixed) -> Option<UnitHandle> {
        self.enemies
            .iter()
            .find(|unit| {
                unit.is_alive()
                    && Self::footprint_contains(unit.position(), point)
                    && self.fog.at_world(unit.center()) == FogState::Visible
            })
            .map(Unit::handle)
    }

    /// The living friendly unit at a world point, for heal targeting.
    #[must_use]
    pub fn targeted_friendly_at(&self, point: Vec2Fixed) -> Option<UnitHandle> {
        self.friendly
            .iter()
            .find(|unit| unit.is_alive() && Self::footprint_contains(unit.position(), point))
            .map(Unit::handle)
    }

    // ------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------

    /// Capture the match as level data. Only living entities are written,
    /// so a reload drops corpses and consumed powerups.
    #[must_use]
    pub fn save(&self) -> LevelData {
        LevelData {
            map_file: self.map_file.clone(),
            level: self.level,
            difficulty: self.difficulty,
            powerups: self
                .powerups
                .iter()
                .filter(|p| p.is_alive())
                .map(|p| PowerupRecord {
                    kind: p.kind(),
                    position: p.position(),
                })
                .collect(),
            friendly: Self::save_units(&self.friendly),
            enemies: Self::save_units(&self.enemies),
            fog: self.fog.clone(),
        }
    }

    fn save_units(roster: &Roster<Unit>) -> Vec<UnitRecord> {
        roster
            .iter()
            .filter(|u| u.is_alive())
            .map(|u| UnitRecord {
                kind: u.kind(),
                hp: u.hp(),
                position: u.position(),
            })
            .collect()
    }

    /// Serialize the full match state to bytes.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::Snapshot`] on encode failure.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    /// Restore a match from [`to_bytes`](Self::to_bytes) output.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::Snapshot`] on decode failure.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(bincode::deserialize(bytes)?)
    }

    /// Hash of the full serialized state, for determinism checks.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        if let Ok(bytes) = bincode::serialize(self) {
            bytes.hash(&mut hasher);
        }
        hasher.finish()
    }

    // ------------------------------------------------------------------
    // Queries and toggles
    // ------------------------------------------------------------------

    /// Current score: 100 per dead enemy plus 50 per living friendly.
    #[must_use]
    pub fn calc_score(&self) -> i32 {
        let dead_enemies = self.enemies.iter().filter(|u| !u.is_alive()).count() as i32;
        let living_friendly = self.friendly.iter().filter(|u| u.is_alive()).count() as i32;
        dead_enemies * 100 + living_friendly * 50
    }

    /// Number of living friendly units.
    #[must_use]
    pub fn remaining_friendly(&self) -> usize {
        self.friendly.iter().filter(|u| u.is_alive()).count()
    }

    /// Number of living enemy units.
    #[must_use]
    pub fn remaining_enemies(&self) -> usize {
        self.enemies.iter().filter(|u| u.is_alive()).count()
    }

    /// Number of unconsumed powerups.
    #[must_use]
    pub fn remaining_powerups(&self) -> usize {
        self.powerups.iter().filter(|p| p.is_alive()).count()
    }

    /// Look up a unit by handle.
    #[must_use]
    pub fn unit(&self, handle: UnitHandle) -> Option<&Unit> {
        match handle.allegiance {
            Allegiance::Friendly => self.friendly.get(handle.index),
            Allegiance::Enemy => self.enemies.get(handle.index),
        }
    }

    fn unit_mut(&mut self, handle: UnitHandle) -> Option<&mut Unit> {
        match handle.allegiance {
            Allegiance::Friendly => self.friendly.get_mut(handle.index),
            Allegiance::Enemy => self.enemies.get_mut(handle.index),
        }
    }

    /// The friendly roster, in slot order.
    pub fn friendly_units(&self) -> impl Iterator<Item = &Unit> {
        self.friendly.iter()
    }

    /// The enemy roster, in slot order.
    pub fn enemy_units(&self) -> impl Iterator<Item = &Unit> {
        self.enemies.iter()
    }

    /// Powerups, consumed ones included.
    pub fn powerups(&self) -> impl Iterator<Item = &Powerup> {
        self.powerups.iter()
    }

    /// Match outcome so far.
    #[must_use]
    pub const fn status(&self) -> MatchStatus {
        self.status
    }

    /// Campaign level number.
    #[must_use]
    pub const fn level(&self) -> u32 {
        self.level
    }

    /// Difficulty the level was loaded with.
    #[must_use]
    pub const fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    /// Static map geometry.
    #[must_use]
    pub const fn map(&self) -> &Map {
        &self.map
    }

    /// Fog of war grid.
    #[must_use]
    pub const fn fog(&self) -> &FogGrid {
        &self.fog
    }

    /// Scroll camera.
    #[must_use]
    pub const fn camera(&self) -> Camera {
        self.camera
    }

    /// Mutable camera access for panning.
    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    /// Ticks simulated so far.
    #[must_use]
    pub const fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Active cheat toggles.
    #[must_use]
    pub const fn cheats(&self) -> Cheats {
        self.cheats
    }

    /// Replace the active cheat toggles.
    pub fn set_cheats(&mut self, cheats: Cheats) {
        self.cheats = cheats;
    }

    /// Pause or resume the simulation.
    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    /// Whether the simulation is paused.
    #[must_use]
    pub const fn is_paused(&self) -> bool {
        self.paused
    }
}
