//! Scaled-proceeds log (`spec.md` §3, §4.2/C2).
//!
//! Persisted entries only exist at OBI boundaries and LTO expiries; the
//! EVO engine keeps a running accumulator for the blocks between those and
//! only calls [`ScaledProceedsLog::append`] when it crosses one.

use std::collections::BTreeMap;

use crate::error::{PoolError, PoolResult};

/// Per-direction cumulative scaled-proceeds checkpoints, keyed by block
/// height. Entries are monotone non-decreasing in both key and value
/// (`spec.md` §3 invariant 4).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScaledProceedsLog {
    entries: BTreeMap<u64, u128>,
}

impl ScaledProceedsLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the cumulative scaled-proceeds accumulator at `block`.
    /// `block` must be >= the last stored block, per `spec.md` §4.2.
    pub fn append(&mut self, block: u64, scaled_accum: u128) -> PoolResult<()> {
        if let Some((&last_block, &last_value)) = self.entries.iter().next_back() {
            if block < last_block {
                return Err(PoolError::MathUnderflow);
            }
            if scaled_accum < last_value {
                // The accumulator the EVO engine hands us must itself be
                // monotone; a decrease here means a caller bug upstream.
                return Err(PoolError::MathUnderflow);
            }
        }
        self.entries.insert(block, scaled_accum);
        Ok(())
    }

    /// The last stored value at or before `block`, or 0 if none exists.
    pub fn read(&self, block: u64) -> u128 {
        self.entries
            .range(..=block)
            .next_back()
            .map(|(_, &value)| value)
            .unwrap_or(0)
    }

    /// The highest block with a stored entry, if any.
    pub fn last_block(&self) -> Option<u64> {
        self.entries.keys().next_back().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_before_any_entry_is_zero() {
        let log = ScaledProceedsLog::new();
        assert_eq!(log.read(1_000), 0);
    }

    #[test]
    fn read_returns_last_entry_at_or_before_block() {
        let mut log = ScaledProceedsLog::new();
        log.append(100, 50).unwrap();
        log.append(200, 120).unwrap();
        assert_eq!(log.read(50), 0);
        assert_eq!(log.read(100), 50);
        assert_eq!(log.read(150), 50);
        assert_eq!(log.read(200), 120);
        assert_eq!(log.read(1_000), 120);
    }

    #[test]
    fn append_out_of_order_block_errs() {
        let mut log = ScaledProceedsLog::new();
        log.append(200, 10).unwrap();
        assert!(log.append(100, 20).is_err());
    }

    #[test]
    fn append_decreasing_value_errs() {
        let mut log = ScaledProceedsLog::new();
        log.append(100, 50).unwrap();
        assert!(log.append(200, 10).is_err());
    }

    #[test]
    fn overwriting_same_block_is_allowed() {
        let mut log = ScaledProceedsLog::new();
        log.append(100, 50).unwrap();
        log.append(100, 60).unwrap();
        assert_eq!(log.read(100), 60);
    }
}
