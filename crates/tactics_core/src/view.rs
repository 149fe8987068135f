//! Read-only unit snapshots for cross-entity decisions.
//!
//! A unit deciding what to do this tick needs the positions and liveness of
//! every other unit, but mutates only itself. The orchestrator rebuilds a
//! [`WorldView`] before each unit's update, so each unit observes the
//! already-settled results of the units updated earlier in the same tick.

use crate::math::{Fixed, Vec2Fixed};
use crate::roster::{Allegiance, UnitHandle};
use crate::unit::UNIT_SIZE;

/// Immutable per-unit facts captured at snapshot time.
#[derive(Debug, Clone, Copy)]
pub struct UnitSnapshot {
    /// Handle of the unit this snapshot describes.
    pub handle: UnitHandle,
    /// Top-left corner in world coordinates.
    pub position: Vec2Fixed,
    /// Whether the unit was alive at snapshot time.
    pub alive: bool,
    /// Armor percentage, needed for projectile impact damage.
    pub armor: i32,
}

impl UnitSnapshot {
    /// Center of the unit's footprint.
    #[must_use]
    pub fn center(&self) -> Vec2Fixed {
        let half = Fixed::from_num(UNIT_SIZE / 2);
        Vec2Fixed::new(self.position.x + half, self.position.y + half)
    }
}

/// Snapshot of every unit on the field, both rosters.
#[derive(Debug, Clone, Default)]
pub struct WorldView {
    units: Vec<UnitSnapshot>,
}

impl WorldView {
    /// Build a view from per-unit snapshots.
    #[must_use]
    pub fn new(units: Vec<UnitSnapshot>) -> Self {
        Self { units }
    }

    /// Look up a unit by handle. Returns `None` for out-of-bounds handles.
    #[must_use]
    pub fn get(&self, handle: UnitHandle) -> Option<&UnitSnapshot> {
        self.units.iter().find(|snap| snap.handle == handle)
    }

    /// Nearest living unit of the given side, by center-to-center distance.
    #[must_use]
    pub fn nearest_living(
        &self,
        side: Allegiance,
        from_center: Vec2Fixed,
    ) -> Option<(UnitHandle, Fixed)> {
        let mut best: Option<(UnitHandle, Fixed)> = None;
        for snap in &self.units {
            if snap.handle.allegiance != side || !snap.alive {
                continue;
            }
            let dist = from_center.distance(snap.center());
            match best {
                Some((_, closest)) if dist >= closest => {}
                _ => best = Some((snap.handle, dist)),
            }
        }
        best
    }
}
