//! Units: stats, orders, and the per-tick behavior state machine.
//!
//! A unit is a self-contained actor. Each tick it reads the rest of the
//! world through an immutable [`WorldView`] snapshot, mutates only itself,
//! and reports anything it did to another unit as [`UnitEvent`]s for the
//! orchestrator to apply. That keeps the borrow story simple while
//! preserving strict sequential update order within a tick.

use serde::{Deserialize, Serialize};

use crate::combat::{calc_damage, Cheats, ONE_HIT_KILL_DAMAGE};
use crate::level::Difficulty;
use crate::map::MAP_SIZE;
use crate::math::{move_toward, Fixed, Vec2Fixed};
use crate::projectile::{Projectile, ProjectileKind};
use crate::roster::{Allegiance, UnitHandle};
use crate::view::WorldView;

/// Side length of a unit's footprint in world units.
pub const UNIT_SIZE: i32 = 96;

/// Distance at which a unit notices and auto-engages an enemy.
pub const SIGHT_RADIUS: i32 = 350;

/// Slack added to a unit's attack range when deciding engagement. Keeps
/// melee units from oscillating at the exact range boundary.
pub const ENGAGE_SLACK: i32 = 64;

/// Range of the heal and lightning special abilities.
pub const SPECIAL_RANGE: i32 = 200;

/// Ticks a special ability stays on cooldown after use.
pub const SPECIAL_COOLDOWN_TICKS: u32 = 450;

/// Duration of one attack swing in milliseconds. The hit (or projectile
/// launch) lands when the swing completes.
pub const SWING_DURATION_MS: u32 = 1200;

/// Special ability a unit kind carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpecialKind {
    /// Fires a heal projectile at a friendly target.
    Heal,
    /// Fires an armor-ignoring lightning bolt at an enemy target.
    Lightning,
}

/// All unit kinds, both sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitKind {
    /// Durable melee line unit.
    Knight,
    /// Fragile ranged caster with the lightning special.
    Wizard,
    /// Weak melee support with the heal special.
    Cleric,
    /// Long-range skirmisher.
    Archer,
    /// Fast-swinging melee unit.
    Ninja,
    /// Enemy melee line unit.
    Skeleton,
    /// Enemy long-range skirmisher.
    SkeletonArcher,
    /// High-HP, low-damage enemy bruiser.
    Orc,
    /// Enemy melee unit with a quick swing cycle.
    Pirate,
    /// The final-level boss. Killing it ends the campaign.
    Commander,
}

impl UnitKind {
    /// Numeric code used by the save file format. Positive codes are
    /// player kinds, negative codes are enemy kinds.
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            UnitKind::Knight => 1,
            UnitKind::Wizard => 2,
            UnitKind::Cleric => 3,
            UnitKind::Archer => 4,
            UnitKind::Ninja => 5,
            UnitKind::Skeleton => -1,
            UnitKind::SkeletonArcher => -2,
            UnitKind::Orc => -3,
            UnitKind::Pirate => -4,
            UnitKind::Commander => -5,
        }
    }

    /// Decode a numeric save-file code.
    #[must_use]
    pub const fn from_code(code: i32) -> Option<Self> {
        match code {
            1 => Some(UnitKind::Knight),
            2 => Some(UnitKind::Wizard),
            3 => Some(UnitKind::Cleric),
            4 => Some(UnitKind::Archer),
            5 => Some(UnitKind::Ninja),
            -1 => Some(UnitKind::Skeleton),
            -2 => Some(UnitKind::SkeletonArcher),
            -3 => Some(UnitKind::Orc),
            -4 => Some(UnitKind::Pirate),
            -5 => Some(UnitKind::Commander),
            _ => None,
        }
    }

    /// Side this kind fights for.
    #[must_use]
    pub const fn allegiance(self) -> Allegiance {
        if self.code() > 0 {
            Allegiance::Friendly
        } else {
            Allegiance::Enemy
        }
    }

    /// Base maximum HP before any difficulty bonus.
    #[must_use]
    pub const fn base_hp(self) -> i32 {
        match self {
            UnitKind::Knight => 240,
            UnitKind::Wizard => 95,
            UnitKind::Cleric => 70,
            UnitKind::Archer => 125,
            UnitKind::Ninja => 170,
            UnitKind::Skeleton => 185,
            UnitKind::SkeletonArcher => 145,
            UnitKind::Orc => 340,
            UnitKind::Pirate => 200,
            UnitKind::Commander => 1840,
        }
    }

    /// Attack range in world units, before engagement slack.
    #[must_use]
    pub const fn attack_range(self) -> i32 {
        match self {
            UnitKind::Wizard => 185,
            UnitKind::Archer => 270,
            UnitKind::SkeletonArcher => 300,
            _ => 40,
        }
    }

    /// Ticks between the end of one swing and the start of the next.
    #[must_use]
    pub const fn attack_delay(self) -> i32 {
        match self {
            UnitKind::Wizard => 95,
            UnitKind::Archer | UnitKind::SkeletonArcher => 65,
            UnitKind::Ninja => 50,
            UnitKind::Pirate => 70,
            UnitKind::Commander => 120,
            _ => 80,
        }
    }

    /// Base attack power.
    #[must_use]
    pub const fn power(self) -> i32 {
        match self {
            UnitKind::Knight | UnitKind::Ninja => 20,
            UnitKind::Wizard => 45,
            UnitKind::Cleric => 10,
            UnitKind::Archer => 15,
            UnitKind::Skeleton => 25,
            UnitKind::SkeletonArcher => 13,
            UnitKind::Orc => 5,
            UnitKind::Pirate => 18,
            UnitKind::Commander => 85,
        }
    }

    /// Armor as a percentage damage reduction.
    #[must_use]
    pub const fn armor(self) -> i32 {
        match self {
            UnitKind::Knight => 10,
            UnitKind::Wizard | UnitKind::Archer | UnitKind::SkeletonArcher => 2,
            UnitKind::Cleric => 3,
            UnitKind::Ninja => 4,
            UnitKind::Skeleton => 8,
            UnitKind::Orc => 6,
            UnitKind::Pirate => 8,
            UnitKind::Commander => 36,
        }
    }

    /// Projectile kind for ranged basic attacks, if any.
    #[must_use]
    pub const fn projectile(self) -> Option<ProjectileKind> {
        match self {
            UnitKind::Wizard => Some(ProjectileKind::Fireball),
            UnitKind::Archer | UnitKind::SkeletonArcher => Some(ProjectileKind::Arrow),
            _ => None,
        }
    }

    /// Special ability, if any.
    #[must_use]
    pub const fn special(self) -> Option<SpecialKind> {
        match self {
            UnitKind::Wizard => Some(SpecialKind::Lightning),
            UnitKind::Cleric => Some(SpecialKind::Heal),
            _ => None,
        }
    }

    /// Movement speed in world units per millisecond.
    #[must_use]
    pub fn speed(self) -> Fixed {
        Fixed::from_num(1) / Fixed::from_num(10)
    }
}

/// Eight-way facing, used for formation-free movement presentation and
/// kept in simulation state so replays render identically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Facing {
    /// Facing up.
    North,
    /// Facing up-right.
    Northeast,
    /// Facing right.
    East,
    /// Facing down-right.
    Southeast,
    /// Facing down.
    South,
    /// Facing down-left.
    Southwest,
    /// Facing left.
    West,
    /// Facing up-left.
    Northwest,
}

impl Facing {
    /// Facing for a movement delta, classified by the ratio |dx|/|dy|.
    /// Ratios under 0.4 snap to vertical and over 1.6 snap to horizontal;
    /// the southeast wedge alone opens at 0.5 instead of 0.4, so southeast
    /// movement reads as south slightly more often than the other
    /// diagonals read as vertical. A zero delta keeps the current facing.
    #[must_use]
    pub fn toward(current: Facing, dx: Fixed, dy: Fixed) -> Facing {
        use Facing::{East, North, Northeast, Northwest, South, Southeast, Southwest, West};

        if dx == Fixed::ZERO {
            return if dy < Fixed::ZERO {
                North
            } else if dy > Fixed::ZERO {
                South
            } else {
                current
            };
        }
        if dy == Fixed::ZERO {
            return if dx < Fixed::ZERO { West } else { East };
        }

        let ratio = dx.abs() / dy.abs();
        let vertical = Fixed::from_num(4) / Fixed::from_num(10);
        let horizontal = Fixed::from_num(16) / Fixed::from_num(10);

        match (dx < Fixed::ZERO, dy < Fixed::ZERO) {
            (true, true) => {
                if ratio < vertical {
                    North
                } else if ratio > horizontal {
                    West
                } else {
                    Northwest
                }
            }
            (true, false) => {
                if ratio < vertical {
                    South
                } else if ratio > horizontal {
                    West
                } else {
                    Southwest
                }
            }
            (false, true) => {
                if ratio < vertical {
                    North
                } else if ratio > horizontal {
                    East
                } else {
                    Northeast
                }
            }
            (false, false) => {
                let vertical_se = Fixed::from_num(5) / Fixed::from_num(10);
                if ratio < vertical_se {
                    South
                } else if ratio > horizontal {
                    East
                } else {
                    Southeast
                }
            }
        }
    }
}

/// Internal behavior the state machine is executing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
enum Behavior {
    Stop,
    Move,
    Attack,
    Heal,
    Lightning,
    Dead,
}

/// Externally visible unit state, for UI and status queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitState {
    /// Idle, scanning for nearby enemies.
    Stopped,
    /// Moving to a destination.
    Moving,
    /// Engaging a specific target.
    Attacking,
    /// Casting the heal special.
    Healing,
    /// Casting the lightning special.
    CastingLightning,
    /// Holding position; will fight but not chase.
    StandingGround,
    /// Moving, but will engage anything sighted on the way.
    AttackMoving,
    /// Dead. Terminal.
    Dead,
}

/// Something a unit did to another unit this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitEvent {
    /// Apply an HP delta to a unit. Positive damages, negative heals.
    Damage {
        /// Unit the delta applies to.
        target: UnitHandle,
        /// HP change before cheat modifiers.
        delta: i32,
    },
}

/// One combatant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    kind: UnitKind,
    handle: UnitHandle,
    position: Vec2Fixed,
    previous_position: Vec2Fixed,
    behavior: Behavior,
    previous_behavior: Behavior,
    destination: Vec2Fixed,
    original_destination: Vec2Fixed,
    attack_destination: Vec2Fixed,
    target: Option<UnitHandle>,
    facing: Facing,
    selected: bool,
    alive: bool,
    swinging: bool,
    swing_elapsed_ms: u32,
    pathing: bool,
    dont_path: bool,
    attack_move: bool,
    stand_ground: bool,
    delay: i32,
    special_cooldown: u32,
    max_hp: i32,
    hp: i32,
    power: i32,
    projectile: Option<Projectile>,
    special: Option<Projectile>,
}

impl Unit {
    /// Create a unit at full HP. Enemy units get the difficulty HP bonus
    /// baked into their maximum.
    #[must_use]
    pub fn new(
        kind: UnitKind,
        handle: UnitHandle,
        position: Vec2Fixed,
        difficulty: Difficulty,
    ) -> Self {
        let base = kind.base_hp();
        let max_hp = match kind.allegiance() {
            Allegiance::Friendly => base,
            Allegiance::Enemy => base + difficulty.enemy_hp_bonus(base),
        };
        Self {
            kind,
            handle,
            position,
            previous_position: position,
            behavior: Behavior::Stop,
            previous_behavior: Behavior::Stop,
            destination: position,
            original_destination: position,
            attack_destination: position,
            target: None,
            facing: Facing::South,
            selected: false,
            alive: true,
            swinging: false,
            swing_elapsed_ms: 0,
            pathing: false,
            dont_path: false,
            attack_move: false,
            stand_ground: false,
            delay: 0,
            special_cooldown: 0,
            max_hp,
            hp: max_hp,
            power: kind.power(),
            projectile: kind.projectile().map(Projectile::new),
            special: kind.special().map(|s| {
                Projectile::new(match s {
                    SpecialKind::Heal => ProjectileKind::Heal,
                    SpecialKind::Lightning => ProjectileKind::Lightning,
                })
            }),
        }
    }

    // ------------------------------------------------------------------
    // Orders
    // ------------------------------------------------------------------

    /// Order a move to `destination` (top-left corner). Ignored while
    /// standing ground. Cancels any swing in progress.
    pub fn order_move(&mut self, destination: Vec2Fixed) {
        if self.stand_ground {
            return;
        }
        self.behavior = Behavior::Move;
        self.destination = destination;
        self.swinging = false;
        self.facing = Facing::toward(
            self.facing,
            destination.x - self.position.x,
            destination.y - self.position.y,
        );
    }

    /// Order an attack on a specific target currently at
    /// `target_position`. A swing in progress keeps going.
    pub fn order_attack(&mut self, target: UnitHandle, target_position: Vec2Fixed) {
        self.target = Some(target);
        if !self.swinging {
            self.order_move(target_position);
        }
        self.behavior = Behavior::Attack;
    }

    /// Order an attack-move: advance to `destination` but engage anything
    /// sighted on the way, resuming the advance afterwards.
    pub fn order_attack_move(&mut self, destination: Vec2Fixed) {
        self.attack_destination = destination;
        self.attack_move = true;
        self.order_move(destination);
    }

    /// Order a stop. Cancels any swing in progress.
    pub fn order_stop(&mut self) {
        self.behavior = Behavior::Stop;
        self.swinging = false;
    }

    /// Order the unit to hold position. A moving unit stops; an engaged
    /// unit keeps fighting but will no longer chase.
    pub fn order_stand_ground(&mut self) {
        self.stand_ground = true;
        if self.behavior == Behavior::Move {
            self.order_stop();
        }
    }

    /// Order the heal special on a friendly target at `target_position`.
    /// The caller is responsible for cooldown and ability gating.
    pub fn order_heal(&mut self, target: UnitHandle, target_position: Vec2Fixed) {
        self.target = Some(target);
        self.swinging = false;
        self.order_move(target_position);
        self.behavior = Behavior::Heal;
    }

    /// Order the lightning special on an enemy target at
    /// `target_position`. The caller is responsible for cooldown and
    /// ability gating.
    pub fn order_lightning(&mut self, target: UnitHandle, target_position: Vec2Fixed) {
        self.target = Some(target);
        self.swinging = false;
        self.order_move(target_position);
        self.behavior = Behavior::Lightning;
    }

    /// Divert to a waypoint, remembering the current activity so it
    /// resumes once the waypoint is reached. Nested diversions keep the
    /// original activity, not the intermediate one.
    pub fn path(&mut self, waypoint: Vec2Fixed) {
        if !self.pathing {
            self.pathing = true;
            self.previous_behavior = self.behavior;
            self.original_destination = self.destination;
        }
        self.order_move(waypoint);
    }

    /// Whether collision resolution may divert this unit right now.
    #[must_use]
    pub const fn should_path(&self) -> bool {
        !self.dont_path
    }

    /// Clear movement modifiers so a fresh command starts clean.
    pub fn reset(&mut self) {
        self.pathing = false;
        self.attack_move = false;
        self.stand_ground = false;
    }

    /// Mark the unit as selected.
    pub fn select(&mut self) {
        self.selected = true;
    }

    /// Clear the selection mark.
    pub fn unselect(&mut self) {
        self.selected = false;
    }

    // ------------------------------------------------------------------
    // HP and stats
    // ------------------------------------------------------------------

    /// Set HP directly, clamped to `0..=max_hp`. Used by loading; does
    /// not trigger death handling.
    pub fn set_hp(&mut self, hp: i32) {
        self.hp = hp.clamp(0, self.max_hp);
    }

    /// Apply an HP delta (positive damages, negative heals) under the
    /// active cheats. Returns `true` if the unit died from this delta.
    ///
    /// Dead units are inert: no delta, heal or harm, affects a corpse.
    pub fn reduce_hp(&mut self, delta: i32, cheats: Cheats) -> bool {
        if !self.alive {
            return false;
        }
        if cheats.god_mode && self.allegiance() == Allegiance::Friendly && delta > 0 {
            return false;
        }
        if cheats.one_hit_kills && self.allegiance() == Allegiance::Enemy {
            self.hp -= ONE_HIT_KILL_DAMAGE;
        }

        self.hp -= delta;
        if self.hp <= 0 {
            self.hp = 0;
            self.alive = false;
            self.selected = false;
            self.behavior = Behavior::Dead;
            return true;
        }
        if self.hp > self.max_hp {
            self.hp = self.max_hp;
        }
        false
    }

    /// Permanently double attack power. Stacks.
    pub fn double_power(&mut self) {
        self.power *= 2;
    }

    // ------------------------------------------------------------------
    // Tick update
    // ------------------------------------------------------------------

    /// Advance the unit by `elapsed_ms`, reading the rest of the world
    /// through `view`. Returns the HP deltas this unit dealt out.
    pub fn update(&mut self, elapsed_ms: u32, view: &WorldView) -> Vec<UnitEvent> {
        let mut events = Vec::new();
        self.previous_position = self.position;
        self.clamp_to_map();

        match self.behavior {
            Behavior::Move => self.update_move(elapsed_ms, view),
            Behavior::Attack => self.update_attack(elapsed_ms, view, &mut events),
            Behavior::Heal | Behavior::Lightning => self.update_special(elapsed_ms, view),
            Behavior::Stop => self.update_stop(view),
            Behavior::Dead => {}
        }

        if self.special_cooldown > 0 {
            self.special_cooldown -= 1;
        }
        if self.delay < self.kind.attack_delay() {
            self.delay += 1;
        }

        let power = self.power;
        if let Some(projectile) = &mut self.projectile {
            if let Some(impact) = projectile.update(elapsed_ms, power, view) {
                events.push(UnitEvent::Damage {
                    target: impact.target,
                    delta: impact.delta,
                });
            }
        }
        if let Some(special) = &mut self.special {
            if let Some(impact) = special.update(elapsed_ms, power, view) {
                events.push(UnitEvent::Damage {
                    target: impact.target,
                    delta: impact.delta,
                });
            }
        }

        events
    }

    fn clamp_to_map(&mut self) {
        let min = Fixed::ZERO;
        let max = Fixed::from_num(MAP_SIZE - UNIT_SIZE);
        if self.position.x < min {
            self.position.x = min;
        }
        if self.position.y < min {
            self.position.y = min;
        }
        if self.position.x > max {
            self.position.x = max;
        }
        if self.position.y > max {
            self.position.y = max;
        }
    }

    fn step(&self, elapsed_ms: u32) -> Fixed {
        self.kind.speed() * Fixed::from_num(elapsed_ms)
    }

    fn update_move(&mut self, elapsed_ms: u32, view: &WorldView) {
        // A moving unit always yields to other units.
        self.dont_path = false;

        if self.attack_move && !self.pathing && self.engage_proximity_enemy(view) {
            return;
        }

        let (position, arrived) = move_toward(self.position, self.destination, self.step(elapsed_ms));
        self.position = position;
        if !arrived {
            return;
        }

        if self.pathing {
            // Waypoint reached: resume whatever the diversion interrupted.
            self.pathing = false;
            self.behavior = self.previous_behavior;
            match self.previous_behavior {
                Behavior::Move => {
                    let dest = self.original_destination;
                    self.order_move(dest);
                }
                Behavior::Attack => {
                    if let Some(target) = self.target {
                        let target_position = view
                            .get(target)
                            .map_or(self.position, |snap| snap.position);
                        self.order_attack(target, target_position);
                    }
                }
                _ => {}
            }
        } else {
            self.order_stop();
            if self.attack_move
                && self.destination == self.attack_destination
            {
                self.attack_move = false;
            }
        }
    }

    fn update_attack(&mut self, elapsed_ms: u32, view: &WorldView, events: &mut Vec<UnitEvent>) {
        let Some(target) = self.target else {
            self.order_stop();
            return;
        };
        let Some(snapshot) = view.get(target).copied() else {
            self.order_stop();
            return;
        };
        if !snapshot.alive {
            self.order_stop();
            return;
        }

        let dist = self.center().distance(snapshot.center());
        let engage_range = Fixed::from_num(self.kind.attack_range() + ENGAGE_SLACK);

        // In range: refuse to be pathed out of the fight.
        self.dont_path = dist <= engage_range;

        if self.swinging {
            self.swing_elapsed_ms += elapsed_ms;
            if self.swing_elapsed_ms >= SWING_DURATION_MS {
                if let Some(projectile) = &mut self.projectile {
                    projectile.spawn(self.position, target);
                } else {
                    events.push(UnitEvent::Damage {
                        target,
                        delta: calc_damage(self.power, snapshot.armor),
                    });
                }

                if self.stand_ground {
                    self.order_stop();
                } else {
                    // Step after the target's new position, staying engaged.
                    self.order_move(snapshot.position);
                    self.behavior = Behavior::Attack;
                }
            }
        }

        if !self.swinging {
            if dist <= engage_range {
                if self.delay >= self.kind.attack_delay() {
                    self.delay = 0;
                    self.swinging = true;
                    self.swing_elapsed_ms = 0;
                }
            } else if self.stand_ground {
                self.order_stop();
            } else {
                // Chase without disturbing the stored destination.
                let (position, _) =
                    move_toward(self.position, snapshot.position, self.step(elapsed_ms));
                self.position = position;
            }
        }
    }

    fn update_special(&mut self, elapsed_ms: u32, view: &WorldView) {
        let Some(target) = self.target else {
            self.order_stop();
            return;
        };
        let Some(snapshot) = view.get(target).copied() else {
            self.order_stop();
            return;
        };
        if !snapshot.alive {
            self.order_stop();
            return;
        }

        let dist = self.center().distance(snapshot.center());
        let range = Fixed::from_num(SPECIAL_RANGE);
        self.dont_path = dist <= range;

        if self.swinging {
            self.swing_elapsed_ms += elapsed_ms;
            if self.swing_elapsed_ms >= SWING_DURATION_MS {
                if let Some(special) = &mut self.special {
                    special.spawn(self.position, target);
                }
                self.order_stop();
            }
        } else if dist <= range {
            self.special_cooldown = SPECIAL_COOLDOWN_TICKS;
            self.swinging = true;
            self.swing_elapsed_ms = 0;
        } else if self.stand_ground {
            self.order_stop();
        } else {
            let (position, _) = move_toward(self.position, snapshot.position, self.step(elapsed_ms));
            self.position = position;
        }
    }

    fn update_stop(&mut self, view: &WorldView) {
        // An interrupted attack-move resumes its advance.
        if self.attack_move {
            let dest = self.attack_destination;
            self.order_move(dest);
        }
        self.engage_proximity_enemy(view);
    }

    /// Engage the nearest living opponent if one is inside sight radius.
    fn engage_proximity_enemy(&mut self, view: &WorldView) -> bool {
        let opponents = self.allegiance().opponent();
        let Some((handle, dist)) = view.nearest_living(opponents, self.center()) else {
            return false;
        };
        if dist >= Fixed::from_num(SIGHT_RADIUS) {
            return false;
        }
        let target_position = view.get(handle).map_or(self.position, |s| s.position);
        self.order_attack(handle, target_position);
        true
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// Unit kind.
    #[must_use]
    pub const fn kind(&self) -> UnitKind {
        self.kind
    }

    /// This unit's own handle.
    #[must_use]
    pub const fn handle(&self) -> UnitHandle {
        self.handle
    }

    /// Side the unit fights for.
    #[must_use]
    pub const fn allegiance(&self) -> Allegiance {
        self.kind.allegiance()
    }

    /// Top-left corner in world coordinates.
    #[must_use]
    pub const fn position(&self) -> Vec2Fixed {
        self.position
    }

    /// Position at the start of the current tick, before any movement.
    #[must_use]
    pub const fn previous_position(&self) -> Vec2Fixed {
        self.previous_position
    }

    /// Move the unit directly. Collision resolution uses this to deflect.
    pub fn set_position(&mut self, position: Vec2Fixed) {
        self.position = position;
    }

    /// Center of the unit's footprint.
    #[must_use]
    pub fn center(&self) -> Vec2Fixed {
        let half = Fixed::from_num(UNIT_SIZE / 2);
        Vec2Fixed::new(self.position.x + half, self.position.y + half)
    }

    /// Current HP.
    #[must_use]
    pub const fn hp(&self) -> i32 {
        self.hp
    }

    /// Maximum HP, difficulty bonus included.
    #[must_use]
    pub const fn max_hp(&self) -> i32 {
        self.max_hp
    }

    /// Current attack power, powerup doublings included.
    #[must_use]
    pub const fn power(&self) -> i32 {
        self.power
    }

    /// Armor percentage.
    #[must_use]
    pub const fn armor(&self) -> i32 {
        self.kind.armor()
    }

    /// Whether the unit is alive.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.alive
    }

    /// Whether the unit is currently selected.
    #[must_use]
    pub const fn is_selected(&self) -> bool {
        self.selected
    }

    /// Whether an attack swing is in progress.
    #[must_use]
    pub const fn is_swinging(&self) -> bool {
        self.swinging
    }

    /// Whether the unit is diverted around another unit or obstacle.
    #[must_use]
    pub const fn is_pathing(&self) -> bool {
        self.pathing
    }

    /// Whether the unit is holding still: stopped or standing ground.
    /// Holding units never get diverted by collisions.
    #[must_use]
    pub const fn is_holding(&self) -> bool {
        matches!(self.behavior, Behavior::Stop) || self.stand_ground
    }

    /// Remaining special ability cooldown in ticks.
    #[must_use]
    pub const fn special_cooldown(&self) -> u32 {
        self.special_cooldown
    }

    /// Current movement destination (top-left corner).
    #[must_use]
    pub const fn destination(&self) -> Vec2Fixed {
        self.destination
    }

    /// Current target, if any.
    #[must_use]
    pub const fn target(&self) -> Option<UnitHandle> {
        self.target
    }

    /// Current facing.
    #[must_use]
    pub const fn facing(&self) -> Facing {
        self.facing
    }

    /// Externally visible state.
    #[must_use]
    pub fn state(&self) -> UnitState {
        if !self.alive {
            return UnitState::Dead;
        }
        if self.stand_ground {
            return UnitState::StandingGround;
        }
        if self.attack_move {
            return UnitState::AttackMoving;
        }
        match self.behavior {
            Behavior::Stop => UnitState::Stopped,
            Behavior::Move => UnitState::Moving,
            Behavior::Attack => UnitState::Attacking,
            Behavior::Heal => UnitState::Healing,
            Behavior::Lightning => UnitState::CastingLightning,
            Behavior::Dead => UnitState::Dead,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::UnitSnapshot;

    fn friendly_knight(x: i32, y: i32) -> Unit {
        Unit::new(
            UnitKind::Knight,
            UnitHandle::friendly(0),
            Vec2Fixed::from_ints(x, y),
            Difficulty::Easy,
        )
    }

    fn view_of(units: &[&Unit]) -> WorldView {
        WorldView::new(
            units
                .iter()
                .map(|u| UnitSnapshot {
                    handle: u.handle(),
                    position: u.position(),
                    alive: u.is_alive(),
                    armor: u.armor(),
                })
                .collect(),
        )
    }

    #[test]
    fn test_difficulty_scales_enemy_hp_only() {
        let knight = Unit::new(
            UnitKind::Knight,
            UnitHandle::friendly(0),
            Vec2Fixed::ZERO,
            Difficulty::Hard,
        );
        assert_eq!(knight.max_hp(), 240);

        let orc = Unit::new(
            UnitKind::Orc,
            UnitHandle::enemy(0),
            Vec2Fixed::ZERO,
            Difficulty::Hard,
        );
        assert_eq!(orc.max_hp(), 340 + 102);
    }

    #[test]
    fn test_move_reaches_destination_and_stops() {
        let mut unit = friendly_knight(0, 0);
        unit.order_move(Vec2Fixed::from_ints(50, 0));
        let view = view_of(&[]);

        // Speed is 0.1/ms, so a 100ms tick covers 10 units.
        for _ in 0..10 {
            unit.update(100, &view);
        }
        assert_eq!(unit.position(), Vec2Fixed::from_ints(50, 0));
        assert_eq!(unit.state(), UnitState::Stopped);
    }

    #[test]
    fn test_stand_ground_blocks_move_orders() {
        let mut unit = friendly_knight(0, 0);
        unit.order_stand_ground();
        unit.order_move(Vec2Fixed::from_ints(500, 0));
        assert_eq!(unit.state(), UnitState::StandingGround);

        let view = view_of(&[]);
        unit.update(100, &view);
        assert_eq!(unit.position(), Vec2Fixed::from_ints(0, 0));
    }

    #[test]
    fn test_stopped_unit_engages_enemy_in_sight() {
        let mut unit = friendly_knight(0, 0);
        let enemy = Unit::new(
            UnitKind::Skeleton,
            UnitHandle::enemy(0),
            Vec2Fixed::from_ints(200, 0),
            Difficulty::Easy,
        );
        let view = view_of(&[&enemy]);

        unit.update(100, &view);
        assert_eq!(unit.state(), UnitState::Attacking);
        assert_eq!(unit.target(), Some(UnitHandle::enemy(0)));
    }

    #[test]
    fn test_stopped_unit_ignores_enemy_beyond_sight() {
        let mut unit = friendly_knight(0, 0);
        let enemy = Unit::new(
            UnitKind::Skeleton,
            UnitHandle::enemy(0),
            Vec2Fixed::from_ints(1000, 0),
            Difficulty::Easy,
        );
        let view = view_of(&[&enemy]);

        unit.update(100, &view);
        assert_eq!(unit.state(), UnitState::Stopped);
    }

    #[test]
    fn test_melee_swing_lands_damage_after_delay() {
        let mut unit = friendly_knight(0, 0);
        let enemy = Unit::new(
            UnitKind::Skeleton,
            UnitHandle::enemy(0),
            Vec2Fixed::from_ints(60, 0),
            Difficulty::Easy,
        );
        let view = view_of(&[&enemy]);
        unit.order_attack(UnitHandle::enemy(0), enemy.position());

        let mut hits = Vec::new();
        // Delay is 80 ticks, swing is 12 ticks of 100ms.
        for _ in 0..100 {
            hits.extend(unit.update(100, &view));
        }
        assert_eq!(hits.len(), 1);
        let UnitEvent::Damage { target, delta } = hits[0];
        assert_eq!(target, UnitHandle::enemy(0));
        // Knight power 20 vs skeleton armor 8.
        assert_eq!(delta, calc_damage(20, 8));
    }

    #[test]
    fn test_attack_chases_distant_target() {
        let mut unit = friendly_knight(0, 0);
        let enemy = Unit::new(
            UnitKind::Skeleton,
            UnitHandle::enemy(0),
            Vec2Fixed::from_ints(600, 0),
            Difficulty::Easy,
        );
        let view = view_of(&[&enemy]);
        unit.order_attack(UnitHandle::enemy(0), enemy.position());

        unit.update(100, &view);
        assert!(unit.position().x > Fixed::ZERO);
        assert_eq!(unit.state(), UnitState::Attacking);
    }

    #[test]
    fn test_attack_stops_when_target_dies() {
        let mut unit = friendly_knight(0, 0);
        let mut enemy = Unit::new(
            UnitKind::Skeleton,
            UnitHandle::enemy(0),
            Vec2Fixed::from_ints(2000, 2000),
            Difficulty::Easy,
        );
        enemy.reduce_hp(9999, Cheats::NONE);
        let view = view_of(&[&enemy]);

        unit.order_attack(UnitHandle::enemy(0), enemy.position());
        unit.update(100, &view);
        // Target far away and dead: the unit gives up rather than chase.
        assert_ne!(unit.state(), UnitState::Attacking);
    }

    #[test]
    fn test_pathing_resumes_original_move() {
        let mut unit = friendly_knight(0, 0);
        unit.order_move(Vec2Fixed::from_ints(200, 0));
        unit.path(Vec2Fixed::from_ints(0, 30));
        assert!(unit.is_pathing());

        let view = view_of(&[]);
        for _ in 0..40 {
            unit.update(100, &view);
        }
        assert!(!unit.is_pathing());
        assert_eq!(unit.position(), Vec2Fixed::from_ints(200, 0));
        assert_eq!(unit.state(), UnitState::Stopped);
    }

    #[test]
    fn test_pathing_resumes_original_attack() {
        let mut unit = friendly_knight(0, 0);
        let enemy = Unit::new(
            UnitKind::Skeleton,
            UnitHandle::enemy(0),
            Vec2Fixed::from_ints(600, 0),
            Difficulty::Easy,
        );
        let view = view_of(&[&enemy]);
        unit.order_attack(UnitHandle::enemy(0), enemy.position());
        unit.path(Vec2Fixed::from_ints(0, 30));
        assert!(unit.is_pathing());
        assert_eq!(unit.state(), UnitState::Moving);

        // Three ticks reach the waypoint; the attack picks back up.
        for _ in 0..5 {
            unit.update(100, &view);
        }
        assert!(!unit.is_pathing());
        assert_eq!(unit.state(), UnitState::Attacking);
        assert_eq!(unit.target(), Some(UnitHandle::enemy(0)));
    }

    #[test]
    fn test_god_mode_blocks_damage_not_heals() {
        let cheats = Cheats {
            god_mode: true,
            one_hit_kills: false,
        };
        let mut unit = friendly_knight(0, 0);
        unit.set_hp(100);

        assert!(!unit.reduce_hp(50, cheats));
        assert_eq!(unit.hp(), 100);

        assert!(!unit.reduce_hp(-50, cheats));
        assert_eq!(unit.hp(), 150);
    }

    #[test]
    fn test_one_hit_kills_fells_enemy_from_any_hit() {
        let cheats = Cheats {
            god_mode: false,
            one_hit_kills: true,
        };
        let mut enemy = Unit::new(
            UnitKind::Commander,
            UnitHandle::enemy(0),
            Vec2Fixed::ZERO,
            Difficulty::Hard,
        );
        assert!(enemy.reduce_hp(1, cheats));
        assert!(!enemy.is_alive());
        assert_eq!(enemy.hp(), 0);
    }

    #[test]
    fn test_heal_clamps_to_max_hp() {
        let mut unit = friendly_knight(0, 0);
        unit.set_hp(200);
        unit.reduce_hp(-500, Cheats::NONE);
        assert_eq!(unit.hp(), 240);
    }

    #[test]
    fn test_dead_units_are_inert() {
        let mut unit = friendly_knight(0, 0);
        assert!(unit.reduce_hp(9999, Cheats::NONE));
        assert!(!unit.is_alive());

        // Neither heals nor further damage touch a corpse.
        assert!(!unit.reduce_hp(-500, Cheats::NONE));
        assert_eq!(unit.hp(), 0);
        assert_eq!(unit.state(), UnitState::Dead);
    }

    #[test]
    fn test_boundary_clamp() {
        let mut unit = friendly_knight(0, 0);
        unit.set_position(Vec2Fixed::from_ints(-50, 4000));
        let view = view_of(&[]);
        unit.update(100, &view);
        assert_eq!(unit.position().x, Fixed::ZERO);
        assert_eq!(unit.position().y, Fixed::from_num(MAP_SIZE - UNIT_SIZE));
    }

    #[test]
    fn test_facing_thresholds() {
        let f = |dx: i32, dy: i32| {
            Facing::toward(Facing::South, Fixed::from_num(dx), Fixed::from_num(dy))
        };
        assert_eq!(f(0, -10), Facing::North);
        assert_eq!(f(10, 0), Facing::East);
        assert_eq!(f(-10, 10), Facing::Southwest);
        // |dx|/|dy| below 0.4 reads as vertical.
        assert_eq!(f(3, -10), Facing::North);
        // Above 1.6 reads as horizontal.
        assert_eq!(f(-17, -10), Facing::West);
        // Zero delta keeps the current facing.
        assert_eq!(f(0, 0), Facing::South);
    }

    #[test]
    fn test_facing_southeast_wider_south_band() {
        let f = |dx: i32, dy: i32| {
            Facing::toward(Facing::North, Fixed::from_num(dx), Fixed::from_num(dy))
        };
        // Ratio 0.45 is a diagonal everywhere except the southeast wedge,
        // where anything under 0.5 still reads as south.
        assert_eq!(f(45, 100), Facing::South);
        assert_eq!(f(45, -100), Facing::Northeast);
        assert_eq!(f(-45, 100), Facing::Southwest);
        assert_eq!(f(-45, -100), Facing::Northwest);
    }

    #[test]
    fn test_cleric_heal_cast_spawns_after_swing() {
        let mut cleric = Unit::new(
            UnitKind::Cleric,
            UnitHandle::friendly(0),
            Vec2Fixed::ZERO,
            Difficulty::Easy,
        );
        let mut wounded = friendly_knight(100, 0);
        wounded.set_hp(50);
        let view = view_of(&[&wounded]);

        cleric.order_heal(wounded.handle(), wounded.position());
        assert_eq!(cleric.state(), UnitState::Healing);

        let mut events = Vec::new();
        for _ in 0..30 {
            events.extend(cleric.update(100, &view));
        }
        // Cast finishes, projectile flies, heal lands exactly once.
        assert_eq!(events.len(), 1);
        let UnitEvent::Damage { target, delta } = events[0];
        assert_eq!(target, wounded.handle());
        assert_eq!(delta, crate::projectile::HEAL_DELTA);
        // Cooldown armed at cast start.
        assert!(cleric.special_cooldown() > 0);
        assert_eq!(cleric.state(), UnitState::Stopped);
    }

    #[test]
    fn test_attack_move_engages_then_resumes() {
        let mut unit = friendly_knight(0, 0);
        let enemy = Unit::new(
            UnitKind::Skeleton,
            UnitHandle::enemy(0),
            Vec2Fixed::from_ints(150, 0),
            Difficulty::Easy,
        );
        let view = view_of(&[&enemy]);

        unit.order_attack_move(Vec2Fixed::from_ints(2000, 0));
        unit.update(100, &view);
        // Enemy in sight: the advance turns into an engagement.
        assert_eq!(unit.target(), Some(UnitHandle::enemy(0)));

        // Enemy gone: stopping re-issues the advance.
        let empty = view_of(&[]);
        unit.order_stop();
        unit.update(100, &empty);
        assert_eq!(unit.state(), UnitState::AttackMoving);
        assert_eq!(unit.destination(), Vec2Fixed::from_ints(2000, 0));
    }

    #[test]
    fn test_power_doubling_stacks() {
        let mut unit = friendly_knight(0, 0);
        assert_eq!(unit.power(), 20);
        unit.double_power();
        assert_eq!(unit.power(), 40);
        unit.double_power();
        assert_eq!(unit.power(), 80);
    }
}
