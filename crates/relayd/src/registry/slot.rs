//! Slot identifiers and slot state.

use std::fmt;

/// Stable identifier of a registry slot.
///
/// Independent of the host's descriptor numbering; valid until the slot is
/// released.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotId(usize);

impl SlotId {
    /// Creates a slot identifier from a slot position.
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    /// The slot position in the registry.
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "slot-{}", self.0)
    }
}

/// A registry entry.
#[derive(Debug)]
pub(crate) enum Slot<C> {
    Empty,
    Active(C),
}

impl<C> Slot<C> {
    pub(crate) fn is_empty(&self) -> bool {
        matches!(self, Slot::Empty)
    }

    pub(crate) fn as_active(&self) -> Option<&C> {
        match self {
            Slot::Active(c) => Some(c),
            Slot::Empty => None,
        }
    }

    pub(crate) fn as_active_mut(&mut self) -> Option<&mut C> {
        match self {
            Slot::Active(c) => Some(c),
            Slot::Empty => None,
        }
    }

    /// Moves the connection out, leaving the slot empty.
    pub(crate) fn take(&mut self) -> Option<C> {
        match std::mem::replace(self, Slot::Empty) {
            Slot::Active(c) => Some(c),
            Slot::Empty => None,
        }
    }
}
