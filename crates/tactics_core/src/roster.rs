//! Rosters and tagged entity handles.
//!
//! Every combatant lives in exactly one roster slot for the duration of a
//! level. Slots are append-only during load and are never reclaimed: a dead
//! unit stays in place (it still renders and still counts toward score) but
//! is excluded from simulation and command targeting.
//!
//! Cross-entity references are [`UnitHandle`]s: an allegiance tag plus a
//! roster index, re-validated against the roster on every use. A handle
//! never owns the unit it points at.

use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};

/// Which side a unit fights for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Allegiance {
    /// Player-controlled units.
    Friendly,
    /// AI-controlled opposition.
    Enemy,
}

impl Allegiance {
    /// The side this side fights against.
    #[must_use]
    pub const fn opponent(self) -> Self {
        match self {
            Allegiance::Friendly => Allegiance::Enemy,
            Allegiance::Enemy => Allegiance::Friendly,
        }
    }
}

/// Weak reference to a unit: allegiance tag plus roster index.
///
/// Replaces the sign-encoded sprite id of older engines (positive for
/// friendly index, `-(index+1)` for enemy) with an explicit tag, so no
/// arithmetic tricks are needed to decode ownership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UnitHandle {
    /// Which roster the unit lives in.
    pub allegiance: Allegiance,
    /// Slot index within that roster.
    pub index: usize,
}

impl UnitHandle {
    /// Create a handle for a friendly roster slot.
    #[must_use]
    pub const fn friendly(index: usize) -> Self {
        Self {
            allegiance: Allegiance::Friendly,
            index,
        }
    }

    /// Create a handle for an enemy roster slot.
    #[must_use]
    pub const fn enemy(index: usize) -> Self {
        Self {
            allegiance: Allegiance::Enemy,
            index,
        }
    }
}

/// Fixed-capacity, append-only collection of entities of one kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Roster<T> {
    items: Vec<T>,
    capacity: usize,
    // Label for error messages only; not part of persisted state.
    #[serde(skip)]
    what: &'static str,
}

impl<T> Roster<T> {
    /// Create an empty roster with the given fixed capacity.
    #[must_use]
    pub fn new(what: &'static str, capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
            capacity,
            what,
        }
    }

    /// Append an entity, returning its slot index.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::RosterFull`] if the roster is at capacity.
    pub fn push(&mut self, item: T) -> Result<usize> {
        if self.items.len() >= self.capacity {
            return Err(GameError::RosterFull {
                what: self.what,
                requested: self.items.len() + 1,
                capacity: self.capacity,
            });
        }
        self.items.push(item);
        Ok(self.items.len() - 1)
    }

    /// Get an entity by slot index.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    /// Get a mutable reference to an entity by slot index.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.items.get_mut(index)
    }

    /// Number of occupied slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the roster holds no entities.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterate over occupied slots in index order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }

    /// Iterate mutably over occupied slots in index order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.items.iter_mut()
    }
}
