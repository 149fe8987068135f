//! Fixed-point math utilities for deterministic simulation.
//!
//! All game simulation uses fixed-point arithmetic to ensure
//! deterministic behavior across platforms. Floating-point
//! operations can produce different results on different CPUs.

use fixed::types::I32F32;
use serde::{Deserialize, Serialize};

/// Fixed-point number type for all simulation math.
///
/// Uses 32 bits for integer part and 32 bits for fractional part.
pub type Fixed = I32F32;

/// Fixed-point 2D vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Vec2Fixed {
    /// X coordinate.
    #[serde(with = "fixed_serde")]
    pub x: Fixed,
    /// Y coordinate.
    #[serde(with = "fixed_serde")]
    pub y: Fixed,
}

/// Serde support for fixed-point numbers.
///
/// Serializes fixed-point numbers as their raw bit representation (i64)
/// to preserve exact precision across serialization boundaries.
pub mod fixed_serde {
    use super::Fixed;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a fixed-point number as its raw bit representation.
    pub fn serialize<S>(value: &Fixed, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        value.to_bits().serialize(serializer)
    }

    /// Deserialize a fixed-point number from its raw bit representation.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Fixed, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bits = i64::deserialize(deserializer)?;
        Ok(Fixed::from_bits(bits))
    }
}

impl Vec2Fixed {
    /// Create a new fixed-point vector.
    #[must_use]
    pub const fn new(x: Fixed, y: Fixed) -> Self {
        Self { x, y }
    }

    /// Convenience constructor from integer coordinates.
    #[must_use]
    pub fn from_ints(x: i32, y: i32) -> Self {
        Self {
            x: Fixed::from_num(x),
            y: Fixed::from_num(y),
        }
    }

    /// Zero vector.
    pub const ZERO: Self = Self {
        x: Fixed::ZERO,
        y: Fixed::ZERO,
    };

    /// Calculate squared distance (avoids sqrt for comparisons).
    #[must_use]
    pub fn distance_squared(self, other: Self) -> Fixed {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    /// Calculate euclidean distance.
    #[must_use]
    pub fn distance(self, other: Self) -> Fixed {
        fixed_sqrt(self.distance_squared(other))
    }

    /// Normalize vector using fixed-point math.
    #[must_use]
    pub fn normalize(self) -> Self {
        let len_sq = self.x * self.x + self.y * self.y;

        if len_sq == Fixed::ZERO {
            return Self::ZERO;
        }

        let len = fixed_sqrt(len_sq);
        if len == Fixed::ZERO {
            return Self::ZERO;
        }

        Self::new(self.x / len, self.y / len)
    }
}

/// Computes the square root of a fixed-point number using binary search.
pub fn fixed_sqrt(value: Fixed) -> Fixed {
    if value <= Fixed::ZERO {
        return Fixed::ZERO;
    }

    let mut low = Fixed::ZERO;
    let mut high = if value > Fixed::from_num(1) {
        value
    } else {
        Fixed::from_num(1)
    };

    for _ in 0..32 {
        let mid = (low + high) / Fixed::from_num(2);
        let mid_sq = mid.saturating_mul(mid);

        if mid_sq <= value {
            low = mid;
        } else {
            high = mid;
        }
    }

    low
}

/// Step a position toward a destination by `step` units.
///
/// Returns the new position and whether the destination was reached this
/// step. Arrival snaps exactly onto the destination so repeated calls are
/// stable.
#[must_use]
pub fn move_toward(position: Vec2Fixed, destination: Vec2Fixed, step: Fixed) -> (Vec2Fixed, bool) {
    if step <= Fixed::ZERO {
        return (position, position == destination);
    }

    let diff = Vec2Fixed::new(destination.x - position.x, destination.y - position.y);
    let dist_sq = position.distance_squared(destination);

    if dist_sq <= step * step {
        return (destination, true);
    }

    let direction = diff.normalize();
    (
        Vec2Fixed::new(
            position.x + direction.x * step,
            position.y + direction.y * step,
        ),
        false,
    )
}

impl std::ops::Add for Vec2Fixed {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
        }
    }
}

impl std::ops::Sub for Vec2Fixed {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec2_distance() {
        let a = Vec2Fixed::from_ints(3, 0);
        let b = Vec2Fixed::from_ints(0, 4);
        assert_eq!(a.distance_squared(b), Fixed::from_num(25));

        // sqrt(25) = 5, within binary-search precision
        let epsilon = Fixed::from_num(1) / Fixed::from_num(10000);
        assert!((a.distance(b) - Fixed::from_num(5)).abs() < epsilon);
    }

    #[test]
    fn test_fixed_determinism() {
        let a = Fixed::from_num(1) / Fixed::from_num(3);
        let b = Fixed::from_num(1) / Fixed::from_num(3);
        assert_eq!(a, b);
        assert_eq!(a * Fixed::from_num(7), b * Fixed::from_num(7));
    }

    #[test]
    fn test_move_toward_steps_and_arrives() {
        let start = Vec2Fixed::ZERO;
        let dest = Vec2Fixed::from_ints(10, 0);

        let (mid, arrived) = move_toward(start, dest, Fixed::from_num(4));
        assert!(!arrived);
        assert!(mid.x > Fixed::from_num(3) && mid.x < Fixed::from_num(5));
        assert_eq!(mid.y, Fixed::ZERO);

        // A step at least as long as the remaining distance snaps to the
        // destination exactly.
        let (end, arrived) = move_toward(mid, dest, Fixed::from_num(100));
        assert!(arrived);
        assert_eq!(end, dest);
    }

    #[test]
    fn test_move_toward_zero_step() {
        let start = Vec2Fixed::from_ints(5, 5);
        let (pos, arrived) = move_toward(start, Vec2Fixed::from_ints(9, 9), Fixed::ZERO);
        assert_eq!(pos, start);
        assert!(!arrived);
    }

    #[test]
    fn test_normalize_preserves_direction() {
        let v = Vec2Fixed::from_ints(3, 4);
        let norm = v.normalize();
        let len_sq = norm.x * norm.x + norm.y * norm.y;
        let one = Fixed::from_num(1);
        let epsilon = one / Fixed::from_num(10000);
        assert!((len_sq - one).abs() < epsilon);
        let ratio_diff = (norm.x * Fixed::from_num(4)) - (norm.y * Fixed::from_num(3));
        assert!(ratio_diff.abs() < epsilon);
    }
}
