//! Snowflake ID Generator
//!
//! Time-ordered 63-bit user ids: 41 bits of milliseconds since the
//! configured epoch, 10 bits of machine id, 12 bits of sequence.

use std::time::{SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;

use crate::config::SnowflakeSettings;

const MACHINE_BITS: u64 = 10;
const SEQUENCE_BITS: u64 = 12;
const MAX_MACHINE_ID: u64 = (1 << MACHINE_BITS) - 1;
const SEQUENCE_MASK: u64 = (1 << SEQUENCE_BITS) - 1;

#[derive(Debug, Default)]
struct State {
    last_timestamp: u64,
    sequence: u64,
}

/// Snowflake ID generator
#[derive(Debug)]
pub struct SnowflakeGenerator {
    epoch: u64,
    machine_id: u64,
    state: Mutex<State>,
}

impl SnowflakeGenerator {
    /// Create a generator; `machine_id` is truncated to 10 bits.
    pub fn new(epoch: u64, machine_id: u16) -> Self {
        Self {
            epoch,
            machine_id: u64::from(machine_id) & MAX_MACHINE_ID,
            state: Mutex::new(State::default()),
        }
    }

    pub fn from_settings(settings: &SnowflakeSettings) -> Self {
        Self::new(settings.epoch, settings.machine_id)
    }

    /// Generate a new snowflake ID
    pub fn generate(&self) -> i64 {
        let mut state = self.state.lock();
        let mut timestamp = self.current_timestamp().max(state.last_timestamp);

        if timestamp == state.last_timestamp {
            state.sequence = (state.sequence + 1) & SEQUENCE_MASK;
            if state.sequence == 0 {
                // Sequence exhausted for this millisecond; borrow the next one
                timestamp += 1;
            }
        } else {
            state.sequence = 0;
        }
        state.last_timestamp = timestamp;

        let id = ((timestamp - self.epoch) << (MACHINE_BITS + SEQUENCE_BITS))
            | (self.machine_id << SEQUENCE_BITS)
            | state.sequence;

        id as i64
    }

    /// Milliseconds since the epoch embedded in `id`, as a Unix timestamp.
    pub fn timestamp_of(&self, id: i64) -> u64 {
        ((id as u64) >> (MACHINE_BITS + SEQUENCE_BITS)) + self.epoch
    }

    fn current_timestamp(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(self.epoch)
            .max(self.epoch)
    }
}
