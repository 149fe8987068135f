//! Powerups: static pickups consumed on first contact.

use serde::{Deserialize, Serialize};

use crate::math::Vec2Fixed;

/// Side length of a powerup's pickup box in world units.
pub const POWERUP_SIZE: i32 = 64;

/// What a powerup does when picked up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PowerupKind {
    /// Fully restores the collector's HP.
    Health,
    /// Permanently doubles the collector's power.
    Power,
}

impl PowerupKind {
    /// Numeric code used by the save file format.
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            PowerupKind::Health => 0,
            PowerupKind::Power => 1,
        }
    }

    /// Decode a numeric save-file code.
    #[must_use]
    pub const fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(PowerupKind::Health),
            1 => Some(PowerupKind::Power),
            _ => None,
        }
    }
}

/// A static pickup with a use-once effect.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Powerup {
    kind: PowerupKind,
    position: Vec2Fixed,
    alive: bool,
}

impl Powerup {
    /// Create a live powerup at the given position.
    #[must_use]
    pub const fn new(kind: PowerupKind, position: Vec2Fixed) -> Self {
        Self {
            kind,
            position,
            alive: true,
        }
    }

    /// Consume the powerup. Idempotent: a consumed powerup stays consumed.
    pub fn kill(&mut self) {
        self.alive = false;
    }

    /// Whether the powerup is still available for pickup.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.alive
    }

    /// Effect kind.
    #[must_use]
    pub const fn kind(&self) -> PowerupKind {
        self.kind
    }

    /// Top-left corner in world coordinates.
    #[must_use]
    pub const fn position(&self) -> Vec2Fixed {
        self.position
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kill_is_idempotent() {
        let mut p = Powerup::new(PowerupKind::Health, Vec2Fixed::from_ints(100, 100));
        assert!(p.is_alive());
        p.kill();
        assert!(!p.is_alive());
        p.kill();
        assert!(!p.is_alive());
    }

    #[test]
    fn test_kind_codes() {
        assert_eq!(PowerupKind::from_code(0), Some(PowerupKind::Health));
        assert_eq!(PowerupKind::from_code(1), Some(PowerupKind::Power));
        assert_eq!(PowerupKind::from_code(2), None);
    }
}
