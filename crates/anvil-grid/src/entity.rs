//! Object handles and the arena that stores the objects themselves.
//!
//! Every object on the grid sits in one [`ObjectArena`] slot. A slot keeps a
//! generation counter next to its occupant, and an [`ObjectId`] names both.
//! Taking an object off the grid bumps the slot's generation, so an action
//! still holding the old handle finds nothing there and completes as a
//! no-op, even after a fresh ore or goblin has moved into the slot.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::object::GameObject;

/// Handle to an object on the grid: arena slot plus the slot generation it
/// was issued under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObjectId {
    slot: u32,
    generation: u32,
}

impl ObjectId {
    pub fn new(slot: u32, generation: u32) -> Self {
        Self { slot, generation }
    }

    pub fn slot(self) -> u32 {
        self.slot
    }

    pub fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}.{}", self.slot, self.generation)
    }
}

// ---------------------------------------------------------------------------
// ObjectArena
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
struct Slot {
    generation: u32,
    object: Option<GameObject>,
}

/// Owner of every [`GameObject`] on a grid.
///
/// Vacated slots are reused most-recent-first. The generation bump on
/// removal is what keeps old handles from reaching the new occupant.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ObjectArena {
    slots: Vec<Slot>,
    vacant: Vec<u32>,
    live: usize,
}

impl ObjectArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the object built by `make`, which receives the id it will live
    /// under.
    pub fn insert_with(&mut self, make: impl FnOnce(ObjectId) -> GameObject) -> ObjectId {
        let slot = match self.vacant.pop() {
            Some(slot) => slot,
            None => {
                self.slots.push(Slot::default());
                (self.slots.len() - 1) as u32
            }
        };
        let entry = &mut self.slots[slot as usize];
        let id = ObjectId::new(slot, entry.generation);
        entry.object = Some(make(id));
        self.live += 1;
        id
    }

    /// Take the object out of its slot. `None` for a stale handle.
    pub fn remove(&mut self, id: ObjectId) -> Option<GameObject> {
        let entry = self.slots.get_mut(id.slot as usize)?;
        if entry.generation != id.generation {
            return None;
        }
        let object = entry.object.take()?;
        entry.generation = entry.generation.wrapping_add(1);
        self.vacant.push(id.slot);
        self.live -= 1;
        Some(object)
    }

    pub fn get(&self, id: ObjectId) -> Option<&GameObject> {
        let entry = self.slots.get(id.slot as usize)?;
        (entry.generation == id.generation)
            .then_some(entry.object.as_ref())
            .flatten()
    }

    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut GameObject> {
        let entry = self.slots.get_mut(id.slot as usize)?;
        if entry.generation != id.generation {
            return None;
        }
        entry.object.as_mut()
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.get(id).is_some()
    }

    /// Live objects in slot order.
    pub fn iter(&self) -> impl Iterator<Item = &GameObject> {
        self.slots.iter().filter_map(|s| s.object.as_ref())
    }

    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::{Blueprint, ObjectKind};

    fn place(arena: &mut ObjectArena, kind: ObjectKind) -> ObjectId {
        arena.insert_with(|id| GameObject::from_blueprint(id, Blueprint::from(kind), 0, 0))
    }

    #[test]
    fn objects_know_their_own_handle() {
        let mut arena = ObjectArena::new();
        let furnace = place(&mut arena, ObjectKind::Furnace);
        let anvil = place(&mut arena, ObjectKind::Anvil);
        assert_ne!(furnace, anvil);
        assert_eq!(arena.get(anvil).unwrap().id(), anvil);
        assert_eq!(arena.len(), 2);
    }

    #[test]
    fn removed_goblin_handle_does_not_reach_the_next_occupant() {
        let mut arena = ObjectArena::new();
        let goblin = place(&mut arena, ObjectKind::Goblin);
        assert_eq!(arena.remove(goblin).unwrap().kind, ObjectKind::Goblin);
        assert!(arena.remove(goblin).is_none());

        let bucket = place(&mut arena, ObjectKind::Bucket);
        assert_eq!(bucket.slot(), goblin.slot());
        assert_eq!(bucket.generation(), goblin.generation() + 1);
        assert!(arena.get(goblin).is_none());
        assert!(arena.get_mut(goblin).is_none());
        assert_eq!(arena.get(bucket).unwrap().kind, ObjectKind::Bucket);
        assert_eq!(arena.len(), 1);
    }

    #[test]
    fn unknown_slots_are_not_found() {
        let arena = ObjectArena::new();
        assert!(!arena.contains(ObjectId::new(7, 0)));
        assert!(arena.is_empty());
        assert_eq!(format!("{}", ObjectId::new(3, 2)), "#3.2");
    }
}
