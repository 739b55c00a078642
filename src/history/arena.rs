//! Slab of history records addressed by generation-checked handles
//!
//! Freed slots go onto a free list and are reused by the next allocation.
//! Every reuse bumps the slot's generation, so a handle kept past the
//! record's release resolves to `None` instead of aliasing a new record.

use crate::input::InputSlice;

/// Stable reference to a record slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecordHandle {
    index: u32,
    generation: u32,
}

impl RecordHandle {
    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }
}

/// One `(timestamp, input)` entry of the history chain
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Record {
    pub timestamp: u64,
    pub input: InputSlice,
    /// Newer neighbour, `None` at the tail
    pub next: Option<RecordHandle>,
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    record: Option<Record>,
}

#[derive(Debug, Default)]
pub struct RecordArena {
    slots: Vec<Slot>,
    free_list: Vec<u32>,
}

impl RecordArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free_list: Vec::new(),
        }
    }

    /// Store `record`, reusing a freed slot when one exists
    pub fn alloc(&mut self, record: Record) -> RecordHandle {
        if let Some(index) = self.free_list.pop() {
            let slot = &mut self.slots[index as usize];
            slot.generation = slot.generation.wrapping_add(1);
            slot.record = Some(record);
            return RecordHandle {
                index,
                generation: slot.generation,
            };
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            record: Some(record),
        });
        RecordHandle {
            index,
            generation: 0,
        }
    }

    /// Release the record behind `handle`, returning it. Stale handles are ignored.
    pub fn free(&mut self, handle: RecordHandle) -> Option<Record> {
        let slot = self.slots.get_mut(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        let record = slot.record.take()?;
        self.free_list.push(handle.index);
        Some(record)
    }

    pub fn get(&self, handle: RecordHandle) -> Option<&Record> {
        self.slots
            .get(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.record.as_ref())
    }

    pub fn get_mut(&mut self, handle: RecordHandle) -> Option<&mut Record> {
        self.slots
            .get_mut(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.record.as_mut())
    }

    /// Live records
    pub fn live(&self) -> usize {
        self.slots.len() - self.free_list.len()
    }

    /// Slots held in the free list, ready for reuse
    pub fn pooled(&self) -> usize {
        self.free_list.len()
    }

    /// Total slots ever allocated
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(timestamp: u64) -> Record {
        Record {
            timestamp,
            input: InputSlice::NEUTRAL,
            next: None,
        }
    }

    #[test]
    fn freed_slots_are_reused() {
        let mut arena = RecordArena::new();
        let a = arena.alloc(record(1));
        let _b = arena.alloc(record(2));
        assert_eq!(arena.free(a).map(|r| r.timestamp), Some(1));
        assert_eq!(arena.pooled(), 1);

        let c = arena.alloc(record(3));
        assert_eq!(c.index(), a.index());
        assert_ne!(c.generation(), a.generation());
        assert_eq!(arena.slot_count(), 2);
        assert_eq!(arena.live(), 2);
    }

    #[test]
    fn stale_handles_resolve_to_none() {
        let mut arena = RecordArena::new();
        let a = arena.alloc(record(1));
        arena.free(a);
        let _reused = arena.alloc(record(2));
        assert!(arena.get(a).is_none());
        assert!(arena.get_mut(a).is_none());
        assert!(arena.free(a).is_none());
    }

    #[test]
    fn double_free_is_harmless() {
        let mut arena = RecordArena::new();
        let a = arena.alloc(record(1));
        assert!(arena.free(a).is_some());
        assert!(arena.free(a).is_none());
        assert_eq!(arena.pooled(), 1);
    }
}
