//! Collision resolution: unit deflection and powerup pickup.
//!
//! Runs after all units have moved for the tick. Three passes in fixed
//! order: unit against unit, unit against obstacle, unit against powerup.
//! Movement collisions never apply damage; a blocked unit is reverted to
//! its pre-move position and diverted around the blocker with a waypoint,
//! resuming its original activity afterwards.
//!
//! Unit collision boxes are inset from the sprite footprint so units can
//! visually brush past each other; powerup pickup uses the full boxes.

use crate::combat::{Cheats, FULL_HEAL_DELTA};
use crate::map::Map;
use crate::math::{Fixed, Vec2Fixed};
use crate::powerup::{Powerup, PowerupKind, POWERUP_SIZE};
use crate::roster::{Roster, UnitHandle};
use crate::unit::{Unit, UNIT_SIZE};

/// Inset between a unit's sprite footprint and its collision box, applied
/// on every side.
pub const COLLISION_BUFFER: i32 = 24;

/// Axis-aligned box in world coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Rect {
    x: Fixed,
    y: Fixed,
    w: Fixed,
    h: Fixed,
}

impl Rect {
    fn new(x: Fixed, y: Fixed, w: i32, h: i32) -> Self {
        Self {
            x,
            y,
            w: Fixed::from_num(w),
            h: Fixed::from_num(h),
        }
    }

    /// Collision box for a unit at `position`: the footprint inset by the
    /// buffer on all sides.
    fn unit_box(position: Vec2Fixed) -> Self {
        let buffer = Fixed::from_num(COLLISION_BUFFER);
        Self {
            x: position.x + buffer,
            y: position.y + buffer,
            w: Fixed::from_num(UNIT_SIZE - 2 * COLLISION_BUFFER),
            h: Fixed::from_num(UNIT_SIZE - 2 * COLLISION_BUFFER),
        }
    }

    fn right(&self) -> Fixed {
        self.x + self.w
    }

    fn bottom(&self) -> Fixed {
        self.y + self.h
    }

    fn intersects(&self, other: &Rect) -> bool {
        self.x < other.right()
            && self.right() > other.x
            && self.y < other.bottom()
            && self.bottom() > other.y
    }
}

/// Which way the mover was heading when it hit the blocker, judged from
/// its pre-move collision box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Heading {
    West,
    East,
    North,
    South,
}

impl Heading {
    /// Classify from the mover's pre-move box against the blocker's box.
    /// Returns `None` when the boxes already overlapped before the move,
    /// in which case there is no meaningful impact side.
    fn classify(previous: &Rect, blocker: &Rect) -> Option<Self> {
        if previous.x >= blocker.right() {
            Some(Heading::West)
        } else if previous.right() <= blocker.x {
            Some(Heading::East)
        } else if previous.y >= blocker.bottom() {
            Some(Heading::North)
        } else if previous.bottom() <= blocker.y {
            Some(Heading::South)
        } else {
            None
        }
    }
}

/// One collision resolution pass over the whole field.
///
/// Borrows everything the three passes need so the call site stays a
/// single `resolve()` rather than threading rosters through free
/// functions.
pub struct CollisionContext<'a> {
    /// Player roster.
    pub friendly: &'a mut Roster<Unit>,
    /// Enemy roster.
    pub enemies: &'a mut Roster<Unit>,
    /// Powerups on the field.
    pub powerups: &'a mut Roster<Powerup>,
    /// Static geometry.
    pub map: &'a Map,
    /// Active cheats, forwarded into powerup HP deltas.
    pub cheats: Cheats,
}

impl CollisionContext<'_> {
    /// Run all three passes in order.
    pub fn resolve(&mut self) {
        self.resolve_units();
        self.resolve_obstacles();
        self.resolve_powerups();
    }

    fn handles(&self) -> Vec<UnitHandle> {
        let friendly = (0..self.friendly.len()).map(UnitHandle::friendly);
        let enemies = (0..self.enemies.len()).map(UnitHandle::enemy);
        friendly.chain(enemies).collect()
    }

    fn unit(&self, handle: UnitHandle) -> Option<&Unit> {
        match handle.allegiance {
            crate::roster::Allegiance::Friendly => self.friendly.get(handle.index),
            crate::roster::Allegiance::Enemy => self.enemies.get(handle.index),
        }
    }

    fn unit_mut(&mut self, handle: UnitHandle) -> Option<&mut Unit> {
        match handle.allegiance {
            crate::roster::Allegiance::Friendly => self.friendly.get_mut(handle.index),
            crate::roster::Allegiance::Enemy => self.enemies.get_mut(handle.index),
        }
    }

    /// Whether a unit can be diverted by a collision right now.
    fn can_deflect(unit: &Unit) -> bool {
        unit.is_alive() && unit.should_path() && !unit.is_holding()
    }

    fn resolve_units(&mut self) {
        let handles = self.handles();
        for &mover_handle in &handles {
            for &blocker_handle in &handles {
                if mover_handle == blocker_handle {
                    continue;
                }

                let Some(mover) = self.unit(mover_handle) else {
                    continue;
                };
                let Some(blocker) = self.unit(blocker_handle) else {
                    continue;
                };
                if !blocker.is_alive() || !Self::can_deflect(mover) {
                    continue;
                }

                let mover_box = Rect::unit_box(mover.position());
                let blocker_box = Rect::unit_box(blocker.position());
                if !mover_box.intersects(&blocker_box) {
                    continue;
                }

                let previous = mover.previous_position();
                let blocker_position = blocker.position();
                let Some(heading) =
                    Heading::classify(&Rect::unit_box(previous), &blocker_box)
                else {
                    continue;
                };

                let Some(mover) = self.unit_mut(mover_handle) else {
                    continue;
                };
                mover.set_position(previous);
                Self::deflect_around_unit(mover, heading, blocker_position);
            }
        }
    }

    /// Divert `mover` around another unit: westward and eastward impacts
    /// dodge vertically, northward and southward impacts dodge
    /// horizontally, each just far enough to clear the blocker's box.
    fn deflect_around_unit(mover: &mut Unit, heading: Heading, blocker: Vec2Fixed) {
        let position = mover.position();
        let size = Fixed::from_num(UNIT_SIZE);
        let buffer = Fixed::from_num(COLLISION_BUFFER);

        let waypoint = match heading {
            Heading::West => {
                let clearance = (position.y - (blocker.y + size - buffer)).abs();
                Vec2Fixed::new(position.x, position.y + clearance)
            }
            Heading::East => {
                let clearance = (position.y - (blocker.y - size + buffer)).abs();
                Vec2Fixed::new(position.x, position.y - clearance)
            }
            Heading::North => {
                let clearance = (position.x - (blocker.x - size + buffer)).abs();
                Vec2Fixed::new(position.x - clearance, position.y)
            }
            Heading::South => {
                let clearance = (position.x - (blocker.x + size - buffer)).abs();
                Vec2Fixed::new(position.x + clearance, position.y)
            }
        };
        mover.path(waypoint);
    }

    fn resolve_obstacles(&mut self) {
        let handles = self.handles();
        for &handle in &handles {
            let Some(mover) = self.unit(handle) else {
                continue;
            };
            if !Self::can_deflect(mover) {
                continue;
            }

            let mover_box = Rect::unit_box(mover.position());
            let previous = mover.previous_position();
            let destination = mover.destination();
            let size = Fixed::from_num(UNIT_SIZE);

            // First obstruction hit wins; one divert per unit per pass.
            let mut action: Option<ObstacleAction> = None;
            for obstacle in self.map.obstructions() {
                let obstacle_box = Rect::new(
                    obstacle.position.x + Fixed::from_num(COLLISION_BUFFER),
                    obstacle.position.y + Fixed::from_num(COLLISION_BUFFER),
                    obstacle.width() - 2 * COLLISION_BUFFER,
                    obstacle.height() - 2 * COLLISION_BUFFER,
                );
                if !mover_box.intersects(&obstacle_box) {
                    continue;
                }

                let full = Rect::new(
                    obstacle.position.x,
                    obstacle.position.y,
                    obstacle.width(),
                    obstacle.height(),
                );

                // A destination inside (or flush against) the obstruction
                // is unreachable; pathing would orbit forever.
                if destination.x >= full.x - size
                    && destination.x <= full.right()
                    && destination.y >= full.y - size
                    && destination.y <= full.bottom()
                {
                    action = Some(ObstacleAction::Stop);
                    break;
                }

                let Some(heading) =
                    Heading::classify(&Rect::unit_box(previous), &obstacle_box)
                else {
                    continue;
                };
                action = Some(ObstacleAction::Deflect { heading, full });
                break;
            }

            let Some(action) = action else { continue };
            let Some(mover) = self.unit_mut(handle) else {
                continue;
            };
            mover.set_position(previous);
            match action {
                ObstacleAction::Stop => mover.order_stop(),
                ObstacleAction::Deflect { heading, full } => {
                    Self::deflect_around_obstacle(mover, heading, &full);
                }
            }
        }
    }

    /// Divert around static geometry. The dodge axis follows the impact
    /// side, but the dodge direction follows the destination, so units
    /// round the corner nearest to where they are going.
    fn deflect_around_obstacle(mover: &mut Unit, heading: Heading, obstacle: &Rect) {
        let position = mover.position();
        let destination = mover.destination();
        let size = Fixed::from_num(UNIT_SIZE);

        let waypoint = match heading {
            Heading::West | Heading::East => {
                let up = (position.y - (obstacle.y - size)).abs();
                let down = (position.y - obstacle.bottom()).abs();
                if destination.y > position.y {
                    Vec2Fixed::new(position.x, position.y + down)
                } else {
                    Vec2Fixed::new(position.x, position.y - up)
                }
            }
            Heading::North | Heading::South => {
                let left = (position.x - (obstacle.x - size)).abs();
                let right = (position.x - obstacle.right()).abs();
                if destination.x > position.x {
                    Vec2Fixed::new(position.x + right, position.y)
                } else {
                    Vec2Fixed::new(position.x - left, position.y)
                }
            }
        };
        mover.path(waypoint);
    }

    fn resolve_powerups(&mut self) {
        let handles = self.handles();
        for &handle in &handles {
            let Some(unit) = self.unit(handle) else {
                continue;
            };
            if !unit.is_alive() {
                continue;
            }
            let unit_box = Rect::new(
                unit.position().x,
                unit.position().y,
                UNIT_SIZE,
                UNIT_SIZE,
            );

            let mut pickup: Option<(usize, PowerupKind)> = None;
            for (index, powerup) in self.powerups.iter().enumerate() {
                if !powerup.is_alive() {
                    continue;
                }
                let powerup_box = Rect::new(
                    powerup.position().x,
                    powerup.position().y,
                    POWERUP_SIZE,
                    POWERUP_SIZE,
                );
                if unit_box.intersects(&powerup_box) {
                    pickup = Some((index, powerup.kind()));
                    break;
                }
            }

            let Some((index, kind)) = pickup else { continue };
            if let Some(powerup) = self.powerups.get_mut(index) {
                powerup.kill();
            }
            let cheats = self.cheats;
            if let Some(unit) = self.unit_mut(handle) {
                match kind {
                    PowerupKind::Health => {
                        unit.reduce_hp(FULL_HEAL_DELTA, cheats);
                    }
                    PowerupKind::Power => unit.double_power(),
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum ObstacleAction {
    Stop,
    Deflect { heading: Heading, full: Rect },
}
