//! Fixed-capacity connection registry.
//!
//! The registry is the single owner of every live server-side connection.
//! Connections live in an arena of slots; a [`SlotId`] is the slot's
//! position and stays valid for as long as the connection is registered.
//! Freed slots are reused by later registrations.
//!
//! # Ownership
//!
//! Only the event loop holds the registry, and it runs on a single task, so
//! no locking is involved. The registry is generic over the connection type
//! so the slot bookkeeping can be exercised without sockets.
//!
//! # Panic-Free Guarantees
//!
//! All operations in this module follow the panic-free policy:
//! - No `.unwrap()` or `.expect()` in production code
//! - Slot access goes through `get()`, never `[i]`
//! - Unknown or already-empty slots are reported as `None`, never a panic

mod slot;

pub use slot::SlotId;

use slot::Slot;

/// Outcome of [`ConnectionRegistry::register`].
#[derive(Debug)]
pub enum Registration<C> {
    /// The connection now occupies the returned slot.
    Registered(SlotId),

    /// Every slot is taken; the connection is handed back untouched.
    Full(C),
}

/// Fixed-capacity table of active connections keyed by [`SlotId`].
#[derive(Debug)]
pub struct ConnectionRegistry<C> {
    slots: Vec<Slot<C>>,
    active: usize,
}

impl<C> ConnectionRegistry<C> {
    /// Creates a registry able to hold `capacity` connections at once.
    pub fn new(capacity: usize) -> Self {
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || Slot::Empty);
        Self { slots, active: 0 }
    }

    /// Maximum number of simultaneously active connections.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of active connections.
    pub fn len(&self) -> usize {
        self.active
    }

    /// Returns true if no connection is registered.
    pub fn is_empty(&self) -> bool {
        self.active == 0
    }

    /// Places `connection` in the first empty slot.
    ///
    /// Scans from the lowest slot, so freed slots are reused first.
    pub fn register(&mut self, connection: C) -> Registration<C> {
        let free = self
            .slots
            .iter_mut()
            .enumerate()
            .find(|(_, slot)| slot.is_empty());

        match free {
            Some((index, slot)) => {
                *slot = Slot::Active(connection);
                self.active = self.active.saturating_add(1);
                Registration::Registered(SlotId::new(index))
            }
            None => Registration::Full(connection),
        }
    }

    /// Releases a slot and returns its connection.
    ///
    /// Idempotent: releasing an empty or unknown slot returns `None`.
    pub fn unregister(&mut self, id: SlotId) -> Option<C> {
        let connection = self.slots.get_mut(id.index())?.take()?;
        self.active = self.active.saturating_sub(1);
        Some(connection)
    }

    /// Returns the connection in `id`, if the slot is active.
    pub fn get(&self, id: SlotId) -> Option<&C> {
        self.slots.get(id.index())?.as_active()
    }

    /// Iterates over active connections in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (SlotId, &C)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_active().map(|c| (SlotId::new(index), c)))
    }

    /// Iterates mutably over active connections in slot order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (SlotId, &mut C)> {
        self.slots
            .iter_mut()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_active_mut().map(|c| (SlotId::new(index), c)))
    }

    /// Releases every active slot, returning the connections in slot order.
    pub fn drain(&mut self) -> Vec<(SlotId, C)> {
        let drained: Vec<(SlotId, C)> = self
            .slots
            .iter_mut()
            .enumerate()
            .filter_map(|(index, slot)| slot.take().map(|c| (SlotId::new(index), c)))
            .collect();
        self.active = 0;
        drained
    }
}
