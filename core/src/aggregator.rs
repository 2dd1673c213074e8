//! Sales-rate aggregator (`spec.md` §4.4/C4).
//!
//! Tracks the pool-wide active sales rate per direction. Long-term orders
//! add their per-block sales rate on `issue`/`resume` and subtract it on
//! `pause`/`cancel`/expiry; the EVO engine reads it to drive each segment.

use crate::direction::Direction;
use crate::error::{PoolError, PoolResult};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SalesRateAggregator {
    rate0: u128,
    rate1: u128,
}

impl SalesRateAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rate(&self, direction: Direction) -> u128 {
        match direction {
            Direction::Token0 => self.rate0,
            Direction::Token1 => self.rate1,
        }
    }

    pub fn add(&mut self, direction: Direction, amount: u128) -> PoolResult<()> {
        let slot = match direction {
            Direction::Token0 => &mut self.rate0,
            Direction::Token1 => &mut self.rate1,
        };
        *slot = slot.checked_add(amount).ok_or(PoolError::MathOverflow)?;
        Ok(())
    }

    pub fn sub(&mut self, direction: Direction, amount: u128) -> PoolResult<()> {
        let slot = match direction {
            Direction::Token0 => &mut self.rate0,
            Direction::Token1 => &mut self.rate1,
        };
        *slot = slot.checked_sub(amount).ok_or(PoolError::MathUnderflow)?;
        Ok(())
    }
}
