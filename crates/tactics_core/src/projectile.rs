//! Homing projectiles and special-ability payloads.
//!
//! A projectile belongs to the unit that fires it. Once spawned it chases
//! its target's center every tick and applies its HP delta exactly once on
//! arrival, even if the target died mid-flight. Each unit owns at most one
//! projectile per kind, so a new shot cannot start until the last one
//! landed.

use serde::{Deserialize, Serialize};

use crate::combat::calc_damage;
use crate::math::{move_toward, Fixed, Vec2Fixed};
use crate::roster::UnitHandle;
use crate::view::WorldView;

/// World units traveled per millisecond.
pub const PROJECTILE_SPEED_NUM: i32 = 3;
/// Denominator for [`PROJECTILE_SPEED_NUM`]: speed is 3/10 per ms.
pub const PROJECTILE_SPEED_DEN: i32 = 10;

/// Offset from the owner's top-left corner to the spawn point.
pub const SPAWN_OFFSET: (i32, i32) = (32, 20);

/// HP delta a heal projectile applies on arrival (negative heals).
pub const HEAL_DELTA: i32 = -50;

/// HP delta a lightning bolt applies on arrival, ignoring armor.
pub const LIGHTNING_DAMAGE: i32 = 60;

/// What a projectile does when it lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProjectileKind {
    /// Archer shot: armor-reduced damage from the owner's power.
    Arrow,
    /// Wizard basic attack: armor-reduced damage from the owner's power.
    Fireball,
    /// Cleric special: fixed heal.
    Heal,
    /// Wizard special: fixed armor-ignoring damage.
    Lightning,
}

/// The HP delta a landing projectile applies to its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Impact {
    /// Unit the delta applies to.
    pub target: UnitHandle,
    /// Positive damages, negative heals.
    pub delta: i32,
}

/// A single in-flight (or idle) projectile slot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Projectile {
    kind: ProjectileKind,
    alive: bool,
    position: Vec2Fixed,
    target: Option<UnitHandle>,
}

impl Projectile {
    /// An idle projectile slot of the given kind.
    #[must_use]
    pub const fn new(kind: ProjectileKind) -> Self {
        Self {
            kind,
            alive: false,
            position: Vec2Fixed::ZERO,
            target: None,
        }
    }

    /// Whether the projectile is currently in flight.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.alive
    }

    /// Current position, meaningful only while in flight.
    #[must_use]
    pub const fn position(&self) -> Vec2Fixed {
        self.position
    }

    /// Launch at `target` from the owner standing at `owner_position`
    /// (top-left corner). Restarts the flight if one was in progress.
    pub fn spawn(&mut self, owner_position: Vec2Fixed, target: UnitHandle) {
        self.alive = true;
        self.target = Some(target);
        self.position = Vec2Fixed::new(
            owner_position.x + Fixed::from_num(SPAWN_OFFSET.0),
            owner_position.y + Fixed::from_num(SPAWN_OFFSET.1),
        );
    }

    /// Advance the flight by `elapsed_ms`, homing on the target's current
    /// center. Returns the impact to apply when the projectile arrives
    /// this tick; the slot goes idle at that moment.
    pub fn update(
        &mut self,
        elapsed_ms: u32,
        owner_power: i32,
        view: &WorldView,
    ) -> Option<Impact> {
        if !self.alive {
            return None;
        }
        let target = self.target?;
        let Some(snapshot) = view.get(target) else {
            self.alive = false;
            return None;
        };

        let step = Fixed::from_num(elapsed_ms) * Fixed::from_num(PROJECTILE_SPEED_NUM)
            / Fixed::from_num(PROJECTILE_SPEED_DEN);
        let (position, arrived) = move_toward(self.position, snapshot.center(), step);
        self.position = position;

        if arrived {
            self.alive = false;
            let delta = match self.kind {
                ProjectileKind::Heal => HEAL_DELTA,
                ProjectileKind::Lightning => LIGHTNING_DAMAGE,
                ProjectileKind::Arrow | ProjectileKind::Fireball => {
                    calc_damage(owner_power, snapshot.armor)
                }
            };
            return Some(Impact { target, delta });
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::UnitSnapshot;

    fn view_with_target(x: i32, y: i32, armor: i32) -> (WorldView, UnitHandle) {
        let handle = UnitHandle::enemy(0);
        let view = WorldView::new(vec![UnitSnapshot {
            handle,
            position: Vec2Fixed::from_ints(x, y),
            alive: true,
            armor,
        }]);
        (view, handle)
    }

    #[test]
    fn test_arrow_lands_once() {
        let (view, target) = view_with_target(100, 100, 0);
        let mut arrow = Projectile::new(ProjectileKind::Arrow);
        arrow.spawn(Vec2Fixed::from_ints(100, 100), target);

        // Spawn point is (132, 120); target center is (148, 148).
        // One long tick covers the whole distance.
        let impact = arrow.update(1000, 15, &view).unwrap();
        assert_eq!(impact.target, target);
        assert_eq!(impact.delta, 15);
        assert!(!arrow.is_alive());

        // Landed projectiles never fire twice.
        assert!(arrow.update(1000, 15, &view).is_none());
    }

    #[test]
    fn test_fireball_damage_reduced_by_armor() {
        let (view, target) = view_with_target(100, 100, 36);
        let mut fireball = Projectile::new(ProjectileKind::Fireball);
        fireball.spawn(Vec2Fixed::from_ints(100, 100), target);

        let impact = fireball.update(1000, 85, &view).unwrap();
        assert_eq!(impact.delta, 55);
    }

    #[test]
    fn test_heal_and_lightning_fixed_deltas() {
        let (view, target) = view_with_target(0, 0, 50);
        let mut heal = Projectile::new(ProjectileKind::Heal);
        heal.spawn(Vec2Fixed::from_ints(0, 0), target);
        assert_eq!(heal.update(1000, 10, &view).unwrap().delta, HEAL_DELTA);

        let mut bolt = Projectile::new(ProjectileKind::Lightning);
        bolt.spawn(Vec2Fixed::from_ints(0, 0), target);
        assert_eq!(bolt.update(1000, 45, &view).unwrap().delta, LIGHTNING_DAMAGE);
    }

    #[test]
    fn test_homing_advances_toward_target() {
        let (view, target) = view_with_target(1000, 100, 0);
        let mut arrow = Projectile::new(ProjectileKind::Arrow);
        arrow.spawn(Vec2Fixed::from_ints(100, 100), target);
        let start = arrow.position();

        assert!(arrow.update(100, 15, &view).is_none());
        assert!(arrow.is_alive());
        let after = arrow.position();
        assert!(after.x > start.x);

        // Speed is 0.3 per ms, so a 100ms tick covers 30 world units,
        // within fixed-point sqrt precision.
        let moved = start.distance(after);
        let epsilon = Fixed::from_num(1) / Fixed::from_num(100);
        assert!((moved - Fixed::from_num(30)).abs() < epsilon);
    }
}
