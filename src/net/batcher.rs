//! Client-side input batching

use tracing::debug;

use crate::input::InputSlice;

use super::protocol::{ClientInputBatch, INPUT_BATCH_SIZE};

/// Buffers consecutive inputs until a full batch is ready
#[derive(Debug, Default)]
pub struct InputBatcher {
    start_timestamp: u64,
    inputs: [InputSlice; INPUT_BATCH_SIZE],
    len: usize,
}

impl InputBatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inputs buffered towards the next batch
    pub fn pending(&self) -> usize {
        self.len
    }

    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// Buffer `input` for `timestamp`, returning a batch once it is full.
    ///
    /// A timestamp that does not follow the buffered ones discards them and
    /// starts a new batch.
    pub fn push(&mut self, timestamp: u64, input: InputSlice) -> Option<ClientInputBatch> {
        if self.len > 0 && timestamp != self.start_timestamp + self.len as u64 {
            debug!(
                expected = self.start_timestamp + self.len as u64,
                timestamp,
                dropped = self.len,
                "Input timestamp gap, restarting batch"
            );
            self.len = 0;
        }
        if self.len == 0 {
            self.start_timestamp = timestamp;
        }
        self.inputs[self.len] = input;
        self.len += 1;

        if self.len < INPUT_BATCH_SIZE {
            return None;
        }
        self.len = 0;
        Some(ClientInputBatch {
            start_timestamp: self.start_timestamp,
            inputs: self.inputs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jump() -> InputSlice {
        InputSlice {
            jump: true,
            ..InputSlice::NEUTRAL
        }
    }

    #[test]
    fn emits_one_batch_per_three_inputs() {
        let mut batcher = InputBatcher::new();
        let mut batches = Vec::new();
        for t in 1..=9 {
            batches.extend(batcher.push(t, InputSlice::NEUTRAL));
        }
        let starts: Vec<_> = batches.iter().map(|b| b.start_timestamp).collect();
        assert_eq!(starts, vec![1, 4, 7]);
        assert_eq!(batcher.pending(), 0);
    }

    #[test]
    fn batch_preserves_order() {
        let mut batcher = InputBatcher::new();
        assert!(batcher.push(5, InputSlice::NEUTRAL).is_none());
        assert!(batcher.push(6, jump()).is_none());
        let batch = batcher.push(7, InputSlice::NEUTRAL).unwrap();
        assert_eq!(batch.inputs[1], jump());
        assert_eq!(batch.start_timestamp, 5);
    }

    #[test]
    fn gap_restarts_the_batch() {
        let mut batcher = InputBatcher::new();
        batcher.push(1, InputSlice::NEUTRAL);
        batcher.push(2, InputSlice::NEUTRAL);
        assert!(batcher.push(10, jump()).is_none());
        assert_eq!(batcher.pending(), 1);
        batcher.push(11, InputSlice::NEUTRAL);
        let batch = batcher.push(12, InputSlice::NEUTRAL).unwrap();
        assert_eq!(batch.start_timestamp, 10);
        assert_eq!(batch.inputs[0], jump());
    }
}
