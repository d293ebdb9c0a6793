//! Snowflake-style 64-bit identifier generation.
//!
//! Layout (most significant bit is always zero so ids stay positive `i64`s):
//!
//! ```text
//! | 41 bits: ms since epoch | 10 bits: node id | 12 bits: sequence |
//! ```
//!
//! One generator instance is created per process (or per logical node id) and
//! shared by reference with every caller that needs identifiers. The
//! last-timestamp/sequence pair is only ever touched under a single mutex.

use std::sync::{Arc, Mutex};

use thiserror::Error;

pub const TIMESTAMP_BITS: u32 = 41;
pub const NODE_ID_BITS: u32 = 10;
pub const SEQUENCE_BITS: u32 = 12;

pub const MAX_NODE_ID: u16 = (1 << NODE_ID_BITS) - 1;
pub const MAX_SEQUENCE: u16 = (1 << SEQUENCE_BITS) - 1;
const MAX_ELAPSED_MS: i64 = (1 << TIMESTAMP_BITS) - 1;

const NODE_ID_SHIFT: u32 = SEQUENCE_BITS;
const TIMESTAMP_SHIFT: u32 = NODE_ID_BITS + SEQUENCE_BITS;

/// 2024-01-01T00:00:00Z in unix milliseconds.
pub const DEFAULT_EPOCH_MS: i64 = 1_704_067_200_000;

/// Failures while producing an identifier.
///
/// None of these are retryable from the caller's point of view: the generator
/// refuses to hand out an id that could collide with one it already issued.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdGenerationError {
    #[error("clock moved backwards: last issued at {last_ms}ms, clock now reads {now_ms}ms")]
    ClockMovedBackwards { last_ms: i64, now_ms: i64 },

    #[error("clock reads {now_ms}ms which is before the generator epoch {epoch_ms}ms")]
    ClockBeforeEpoch { now_ms: i64, epoch_ms: i64 },

    #[error("timestamp space exhausted ({elapsed_ms}ms since epoch)")]
    TimestampOverflow { elapsed_ms: i64 },

    #[error("node id {0} exceeds maximum {MAX_NODE_ID}")]
    InvalidNodeId(u16),

    #[error("generator state lock poisoned")]
    Poisoned,
}

impl IdGenerationError {
    pub fn code(&self) -> &'static str {
        match self {
            IdGenerationError::ClockMovedBackwards { .. } => "clock_moved_backwards",
            IdGenerationError::ClockBeforeEpoch { .. } => "clock_before_epoch",
            IdGenerationError::TimestampOverflow { .. } => "timestamp_overflow",
            IdGenerationError::InvalidNodeId(_) => "invalid_node_id",
            IdGenerationError::Poisoned => "generator_poisoned",
        }
    }
}

/// Port for anything that hands out unique 64-bit identifiers.
pub trait IdGenerator: Send + Sync {
    fn generate_id(&self) -> Result<i64, IdGenerationError>;
}

impl<G> IdGenerator for Arc<G>
where
    G: IdGenerator + ?Sized,
{
    fn generate_id(&self) -> Result<i64, IdGenerationError> {
        (**self).generate_id()
    }
}

/// Source of wall-clock milliseconds.
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> i64;
}

/// Wall clock backed by `chrono::Utc::now()`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

impl<C> Clock for Arc<C>
where
    C: Clock + ?Sized,
{
    fn now_millis(&self) -> i64 {
        (**self).now_millis()
    }
}

/// Components of a decoded identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnowflakeParts {
    /// Absolute unix milliseconds.
    pub timestamp_ms: i64,
    pub node_id: u16,
    pub sequence: u16,
}

#[derive(Debug)]
struct GeneratorState {
    last_timestamp: i64,
    sequence: u16,
}

/// Snowflake identifier generator.
#[derive(Debug)]
pub struct SnowflakeIdGenerator<C = SystemClock> {
    node_id: u16,
    epoch_ms: i64,
    clock: C,
    state: Mutex<GeneratorState>,
}

impl SnowflakeIdGenerator<SystemClock> {
    /// Generator on the system clock with the default epoch.
    pub fn new(node_id: u16) -> Result<Self, IdGenerationError> {
        Self::with_clock(node_id, DEFAULT_EPOCH_MS, SystemClock)
    }
}

impl<C: Clock> SnowflakeIdGenerator<C> {
    pub fn with_clock(node_id: u16, epoch_ms: i64, clock: C) -> Result<Self, IdGenerationError> {
        if node_id > MAX_NODE_ID {
            return Err(IdGenerationError::InvalidNodeId(node_id));
        }
        Ok(Self {
            node_id,
            epoch_ms,
            clock,
            state: Mutex::new(GeneratorState {
                last_timestamp: i64::MIN,
                sequence: 0,
            }),
        })
    }

    pub fn node_id(&self) -> u16 {
        self.node_id
    }

    pub fn epoch_ms(&self) -> i64 {
        self.epoch_ms
    }

    /// Produce the next identifier.
    ///
    /// Within one millisecond up to 4096 ids are issued; the 4097th call spins
    /// until the clock reaches the next millisecond.
    pub fn next_id(&self) -> Result<i64, IdGenerationError> {
        let mut state = self.state.lock().map_err(|_| IdGenerationError::Poisoned)?;

        let mut now = self.clock.now_millis();
        if now < state.last_timestamp {
            tracing::error!(
                last_ms = state.last_timestamp,
                now_ms = now,
                node_id = self.node_id,
                "clock moved backwards; refusing to generate id"
            );
            return Err(IdGenerationError::ClockMovedBackwards {
                last_ms: state.last_timestamp,
                now_ms: now,
            });
        }

        let sequence = if now == state.last_timestamp {
            let next = (state.sequence + 1) & MAX_SEQUENCE;
            if next == 0 {
                now = self.wait_next_millis(state.last_timestamp)?;
            }
            next
        } else {
            0
        };

        let elapsed = now - self.epoch_ms;
        if elapsed < 0 {
            return Err(IdGenerationError::ClockBeforeEpoch {
                now_ms: now,
                epoch_ms: self.epoch_ms,
            });
        }
        if elapsed > MAX_ELAPSED_MS {
            return Err(IdGenerationError::TimestampOverflow { elapsed_ms: elapsed });
        }

        state.last_timestamp = now;
        state.sequence = sequence;

        Ok((elapsed << TIMESTAMP_SHIFT)
            | (i64::from(self.node_id) << NODE_ID_SHIFT)
            | i64::from(sequence))
    }

    /// Split an id produced by this generator back into its components.
    pub fn decompose(&self, id: i64) -> SnowflakeParts {
        SnowflakeParts {
            timestamp_ms: (id >> TIMESTAMP_SHIFT) + self.epoch_ms,
            node_id: ((id >> NODE_ID_SHIFT) & i64::from(MAX_NODE_ID)) as u16,
            sequence: (id & i64::from(MAX_SEQUENCE)) as u16,
        }
    }

    fn wait_next_millis(&self, last: i64) -> Result<i64, IdGenerationError> {
        loop {
            let now = self.clock.now_millis();
            if now > last {
                return Ok(now);
            }
            if now < last {
                return Err(IdGenerationError::ClockMovedBackwards {
                    last_ms: last,
                    now_ms: now,
                });
            }
            std::hint::spin_loop();
        }
    }
}

impl<C: Clock> IdGenerator for SnowflakeIdGenerator<C> {
    fn generate_id(&self) -> Result<i64, IdGenerationError> {
        self.next_id()
    }
}
