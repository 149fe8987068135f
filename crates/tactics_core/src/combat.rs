//! Combat primitives: the damage formula and cheat modifiers.
//!
//! Armor is a percentage damage-reduction factor, not a flat subtraction.
//! All combat math is plain integer arithmetic with truncation, so results
//! are identical on every platform.

use serde::{Deserialize, Serialize};

/// Flat HP delta used by the one-hit-kill cheat. Large enough to exceed any
/// unit's maximum HP.
pub const ONE_HIT_KILL_DAMAGE: i32 = 9999;

/// HP delta used by a health powerup: heals past any maximum so the clamp
/// restores the unit to full.
pub const FULL_HEAL_DELTA: i32 = -999;

/// Calculate the damage a unit with `power` deals to a target with
/// `target_armor`.
///
/// Formula: `power - power * armor / 100`, truncated toward zero.
/// Armor 0 passes damage through unchanged; armor 100 reduces it to zero.
#[must_use]
pub fn calc_damage(power: i32, target_armor: i32) -> i32 {
    power - power * target_armor / 100
}

/// Active cheat toggles, threaded into every HP delta.
///
/// God mode shields friendly units from damage (positive deltas) while
/// still letting heals through. One-hit-kills stacks a huge extra hit onto
/// any delta applied to a non-friendly unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cheats {
    /// Friendly units ignore damage.
    pub god_mode: bool,
    /// Enemy units die to any damage.
    pub one_hit_kills: bool,
}

impl Cheats {
    /// No cheats active.
    pub const NONE: Self = Self {
        god_mode: false,
        one_hit_kills: false,
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calc_damage_percentage_reduction() {
        // 20 - 20*10/100 = 18
        assert_eq!(calc_damage(20, 10), 18);
        // 45 - 45*2/100 = 45 (integer truncation of 0.9)
        assert_eq!(calc_damage(45, 2), 45);
        // 85 - 85*36/100 = 85 - 30 = 55
        assert_eq!(calc_damage(85, 36), 55);
    }

    #[test]
    fn test_calc_damage_extremes() {
        assert_eq!(calc_damage(20, 0), 20);
        assert_eq!(calc_damage(20, 100), 0);
    }

    #[test]
    fn test_calc_damage_deterministic() {
        for _ in 0..100 {
            assert_eq!(calc_damage(77, 33), calc_damage(77, 33));
        }
    }
}
