//! Per-character input history: prediction and rollback reconciliation
//!
//! The history is a chain of `(timestamp, input)` records from `head`
//! (oldest retained) to `tail` (latest appended). Timestamps increase by
//! exactly one per appended tick and are strictly increasing along the chain
//! after any sequence of operations.

mod arena;

pub use arena::{Record, RecordArena, RecordHandle};

use tracing::{debug, info, trace};

use crate::character::{Character, CharacterStateSummary, SimEvents};
use crate::input::{InputContext, InputSlice};

/// Default number of records kept per character
pub const DEFAULT_HISTORY_CAPACITY: usize = 1024;

#[derive(Debug)]
pub struct InputHistory {
    arena: RecordArena,
    head: RecordHandle,
    tail: RecordHandle,
    latest_timestamp: u64,
    latest_input: InputSlice,
    count: usize,
    capacity: usize,
    dt: f32,
}

impl InputHistory {
    /// Empty history anchored at timestamp 0 with neutral input
    pub fn new(capacity: usize, dt: f32) -> Self {
        let capacity = capacity.max(1);
        let mut arena = RecordArena::with_capacity(capacity + 1);
        let root = arena.alloc(Record {
            timestamp: 0,
            input: InputSlice::NEUTRAL,
            next: None,
        });
        Self {
            arena,
            head: root,
            tail: root,
            latest_timestamp: 0,
            latest_input: InputSlice::NEUTRAL,
            count: 1,
            capacity,
            dt,
        }
    }

    pub fn latest_timestamp(&self) -> u64 {
        self.latest_timestamp
    }

    pub fn latest_input(&self) -> InputSlice {
        self.latest_input
    }

    pub fn oldest_timestamp(&self) -> u64 {
        self.arena
            .get(self.head)
            .map(|r| r.timestamp)
            .unwrap_or(self.latest_timestamp)
    }

    /// Retained records, anchor included
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn dt(&self) -> f32 {
        self.dt
    }

    /// Freed records waiting for reuse
    pub fn pooled(&self) -> usize {
        self.arena.pooled()
    }

    /// Records from oldest to latest
    pub fn iter(&self) -> Records<'_> {
        Records {
            arena: &self.arena,
            cursor: Some(self.head),
        }
    }

    pub fn input_at(&self, timestamp: u64) -> Option<InputSlice> {
        self.iter()
            .find(|r| r.timestamp == timestamp)
            .map(|r| r.input)
    }

    /// Append `input` as the next tick and simulate it from `summary`
    pub fn advance(
        &mut self,
        character: &mut Character,
        input: InputSlice,
        summary: &CharacterStateSummary,
        events: &mut SimEvents,
    ) -> CharacterStateSummary {
        let input = input.sanitized();
        let timestamp = self.latest_timestamp + 1;
        let handle = self.arena.alloc(Record {
            timestamp,
            input,
            next: None,
        });
        if let Some(tail) = self.arena.get_mut(self.tail) {
            tail.next = Some(handle);
        }

        let context = InputContext::new(&self.latest_input, &input);
        let next = character.advance(summary, self.dt, &context, events);

        self.tail = handle;
        self.latest_timestamp = timestamp;
        self.latest_input = input;
        self.count += 1;
        self.evict_overflow();

        trace!(timestamp, "Advanced history");
        next
    }

    /// Correct the chain with an authoritative `summary` at `timestamp`.
    ///
    /// Records at or before `timestamp` are released, a synthetic anchor
    /// carrying `last_input` (or the last released input) is spliced in, and
    /// every remaining record is replayed from `summary`. Intermediate ticks
    /// replay with a muted event queue; `apply_state` runs once at the end.
    ///
    /// An update older than every retained record drops the whole chain and
    /// returns `summary` unchanged.
    pub fn reconcile_state(
        &mut self,
        character: &mut Character,
        timestamp: u64,
        summary: &CharacterStateSummary,
        last_input: Option<InputSlice>,
        events: &mut SimEvents,
    ) -> CharacterStateSummary {
        let last_input = last_input.map(|i| i.sanitized());

        let oldest = self.oldest_timestamp();
        if timestamp < oldest {
            info!(
                timestamp,
                oldest,
                dropped = self.count,
                "Authoritative update predates history, snapping"
            );
            self.rebase(timestamp, last_input.unwrap_or(InputSlice::NEUTRAL));
            character.apply_state(summary, events);
            return *summary;
        }

        let mut released_input = None;
        let mut cursor = Some(self.head);
        while let Some(handle) = cursor {
            let Some(record) = self.arena.get(handle).copied() else {
                break;
            };
            if record.timestamp > timestamp {
                break;
            }
            self.arena.free(handle);
            released_input = Some(record.input);
            cursor = record.next;
        }

        let anchor_input = last_input
            .or(released_input)
            .unwrap_or(InputSlice::NEUTRAL);
        let anchor = self.arena.alloc(Record {
            timestamp,
            input: anchor_input,
            next: cursor,
        });
        self.head = anchor;
        if cursor.is_none() {
            self.tail = anchor;
            self.latest_timestamp = timestamp;
            self.latest_input = anchor_input;
        }

        let mut replayed = *summary;
        let mut previous = anchor_input;
        let mut muted = SimEvents::muted();
        let mut count = 1;
        while let Some(handle) = cursor {
            let Some(record) = self.arena.get(handle).copied() else {
                break;
            };
            let context = InputContext::new(&previous, &record.input);
            replayed = character.simulate(&replayed, self.dt, &context, &mut muted);
            previous = record.input;
            cursor = record.next;
            count += 1;
        }
        self.count = count;

        character.apply_state(&replayed, events);
        debug!(timestamp, replayed = count - 1, "Reconciled history");
        replayed
    }

    /// Overwrite the input of every record after `after`.
    ///
    /// Observers use this to retarget dead-reckoned input once the real
    /// input of the authoritative tick is known.
    pub fn rewrite_pending(&mut self, after: u64, input: InputSlice) {
        let input = input.sanitized();
        let mut cursor = Some(self.head);
        while let Some(handle) = cursor {
            let Some(record) = self.arena.get_mut(handle) else {
                break;
            };
            if record.timestamp > after {
                record.input = input;
            }
            cursor = record.next;
        }
        if self.latest_timestamp > after {
            self.latest_input = input;
        }
    }

    /// Drop every record and restart the chain at `timestamp`
    pub fn rebase(&mut self, timestamp: u64, input: InputSlice) {
        let mut cursor = Some(self.head);
        while let Some(handle) = cursor {
            cursor = self.arena.free(handle).and_then(|r| r.next);
        }
        let anchor = self.arena.alloc(Record {
            timestamp,
            input,
            next: None,
        });
        self.head = anchor;
        self.tail = anchor;
        self.latest_timestamp = timestamp;
        self.latest_input = input;
        self.count = 1;
    }

    fn evict_overflow(&mut self) {
        while self.count > self.capacity {
            let Some(oldest) = self.arena.free(self.head) else {
                break;
            };
            let Some(next) = oldest.next else {
                break;
            };
            self.head = next;
            self.count -= 1;
            debug!(timestamp = oldest.timestamp, "Evicted oldest history record");
        }
    }
}

/// Iterator over retained records in timestamp order
pub struct Records<'a> {
    arena: &'a RecordArena,
    cursor: Option<RecordHandle>,
}

impl<'a> Iterator for Records<'a> {
    type Item = &'a Record;

    fn next(&mut self) -> Option<Self::Item> {
        let record = self.arena.get(self.cursor?)?;
        self.cursor = record.next;
        Some(record)
    }
}
