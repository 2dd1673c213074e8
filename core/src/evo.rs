//! Execute-Virtual-Orders engine (`spec.md` §4.4/C5).
//!
//! Advances the pool from `lvob` to a target block by replaying every
//! constant-sales-rate segment in between, cut at OBI boundaries and at
//! long-term-order expiries, and folding each segment's proceeds into the
//! scaled-proceeds log at the boundary that closes it.

use std::collections::BTreeSet;

use tracing::{debug, instrument};

use twamm_math::{mul_div_floor, one_sided_sells_token0, one_sided_sells_token1, two_sided_segment};

use crate::aggregator::SalesRateAggregator;
use crate::direction::Direction;
use crate::error::{PoolError, PoolResult};
use crate::proceeds_log::ScaledProceedsLog;
use crate::registry::OrderRegistry;

/// The slice of pool state EVO reads and mutates. `Pool` (C-the-rest)
/// borrows its own fields into this view rather than EVO depending on the
/// full `Pool` type, so the engine stays testable in isolation.
pub struct EvoState<'a> {
    pub reserve0: &'a mut u128,
    pub reserve1: &'a mut u128,
    pub orders0: &'a mut u128,
    pub orders1: &'a mut u128,
    pub proceeds0: &'a mut u128,
    pub proceeds1: &'a mut u128,
    pub lvob: &'a mut u64,
    pub aggregator: &'a mut SalesRateAggregator,
    pub registry: &'a mut OrderRegistry,
    pub log0: &'a mut ScaledProceedsLog,
    pub log1: &'a mut ScaledProceedsLog,
    pub obi: u64,
    pub scale0: u128,
    pub scale1: u128,
}

/// Running, not-yet-persisted scaled-proceeds accumulators for the
/// segment(s) since the last boundary (`spec.md` §4.2: "intermediate
/// segments update a running accumulator but only store at boundaries").
#[derive(Debug, Clone, Copy, Default)]
struct RunningAccumulator {
    scaled0: u128,
    scaled1: u128,
}

impl<'a> EvoState<'a> {
    /// Advance the pool to `target`. No-op if `target == lvob`; fails with
    /// [`PoolError::MathDomain`] if `target < lvob` (`spec.md` §6:
    /// `executeVirtualOrdersToBlock` is a "no-op if `block <= lvob`", and
    /// §4.7 lists `T < lvob` as a failure — this implementation takes
    /// strictly-less as the failing case and equality as the no-op, per
    /// the "no-op if `block <= lvob`" wording in §6 taking precedence for
    /// the boundary itself).
    #[instrument(skip(self), fields(from = *self.lvob, to = target))]
    pub fn execute_to(&mut self, target: u64) -> PoolResult<()> {
        let start = *self.lvob;
        if target < start {
            return Err(PoolError::MathUnderflow);
        }
        if target == start {
            return Ok(());
        }

        let mut cursor = start;
        // Seed from the log's existing cumulative value at `start` rather
        // than zero: the scaled-proceeds log is a running total since pool
        // genesis, and `execute_to` is called once per mutating entry
        // point rather than once per pool lifetime, so a fresh call must
        // resume the accumulator where the last call's boundary left it.
        let mut running = RunningAccumulator {
            scaled0: self.log0.read(start),
            scaled1: self.log1.read(start),
        };
        let boundaries = self.boundaries_in(start, target);

        for boundary in boundaries {
            self.advance_segment(&mut cursor, boundary, &mut running)?;
            self.persist_boundary(boundary, &mut running)?;
            self.apply_expiries_at(boundary)?;
            cursor = boundary;
        }

        debug_assert_eq!(cursor, target);
        *self.lvob = target;
        debug!(target, "evo advanced to target block");
        Ok(())
    }

    /// Every OBI boundary and LTO expiry strictly after `start` and at or
    /// before `target`, in increasing order, with `target` itself appended
    /// if it is not already one (so the final partial segment always closes
    /// at a recorded boundary and `lvob` lands exactly on `target`).
    fn boundaries_in(&self, start: u64, target: u64) -> Vec<u64> {
        let mut set = BTreeSet::new();

        let first_obi = (start / self.obi + 1) * self.obi;
        let mut obi_block = first_obi;
        while obi_block <= target {
            set.insert(obi_block);
            obi_block += self.obi;
        }

        for block in self.registry.expiry_blocks_in(start, target) {
            set.insert(block);
        }

        set.insert(target);
        set.into_iter().collect()
    }

    /// Move reserves/proceeds/running-accumulator forward over one segment
    /// of constant sales rates, `(cursor, boundary]`.
    fn advance_segment(
        &mut self,
        cursor: &mut u64,
        boundary: u64,
        running: &mut RunningAccumulator,
    ) -> PoolResult<()> {
        let delta_blocks = boundary - *cursor;
        if delta_blocks == 0 {
            return Ok(());
        }

        let rate0 = self.aggregator.rate(Direction::Token0);
        let rate1 = self.aggregator.rate(Direction::Token1);

        let outcome = if rate0 == 0 && rate1 == 0 {
            twamm_math::SegmentOutcome {
                reserve0: *self.reserve0,
                reserve1: *self.reserve1,
                proceeds0: 0,
                proceeds1: 0,
            }
        } else if rate1 == 0 {
            one_sided_sells_token0(*self.reserve0, *self.reserve1, rate0, delta_blocks)?
        } else if rate0 == 0 {
            one_sided_sells_token1(*self.reserve0, *self.reserve1, rate1, delta_blocks)?
        } else {
            two_sided_segment(*self.reserve0, *self.reserve1, rate0, rate1, delta_blocks)?
        };

        *self.reserve0 = outcome.reserve0;
        *self.reserve1 = outcome.reserve1;
        *self.proceeds0 = self
            .proceeds0
            .checked_add(outcome.proceeds0)
            .ok_or(PoolError::MathOverflow)?;
        *self.proceeds1 = self
            .proceeds1
            .checked_add(outcome.proceeds1)
            .ok_or(PoolError::MathOverflow)?;

        // orders_d decreases by s_d * delta_blocks over this segment
        // (spec.md §4.4 postconditions); expiry-specific adjustments are
        // applied separately in apply_expiries_at.
        if rate0 > 0 {
            let consumed = rate0
                .checked_mul(delta_blocks as u128)
                .ok_or(PoolError::MathOverflow)?;
            *self.orders0 = self.orders0.checked_sub(consumed).ok_or(PoolError::MathUnderflow)?;
        }
        if rate1 > 0 {
            let consumed = rate1
                .checked_mul(delta_blocks as u128)
                .ok_or(PoolError::MathOverflow)?;
            *self.orders1 = self.orders1.checked_sub(consumed).ok_or(PoolError::MathUnderflow)?;
        }

        // scaled0 += proc0 * SCALE_0 / s1 (proc0 is paid out of token-1
        // sellers' sales, hence divisor s1); symmetrically for scaled1.
        if rate1 > 0 {
            running.scaled0 = running
                .scaled0
                .checked_add(mul_div_floor(outcome.proceeds0, self.scale0, rate1)?)
                .ok_or(PoolError::MathOverflow)?;
        }
        if rate0 > 0 {
            running.scaled1 = running
                .scaled1
                .checked_add(mul_div_floor(outcome.proceeds1, self.scale1, rate0)?)
                .ok_or(PoolError::MathOverflow)?;
        }

        debug!(
            delta_blocks,
            reserve0 = *self.reserve0,
            reserve1 = *self.reserve1,
            "evo segment advanced"
        );
        Ok(())
    }

    fn persist_boundary(&mut self, boundary: u64, running: &mut RunningAccumulator) -> PoolResult<()> {
        self.log0.append(boundary, running.scaled0)?;
        self.log1.append(boundary, running.scaled1)?;
        Ok(())
    }

    /// At an expiry boundary, subtract the expiring orders' sales rate from
    /// the aggregator (`spec.md` §4.4: "after persisting, subtract the
    /// expiring LTO's salesRate from the aggregator"). `orders_sellToken`
    /// was already decremented by `salesRate * (expiry - lvob_prev_segment)`
    /// in `advance_segment`'s preceding segment, since every expiry is cut
    /// as its own segment boundary.
    ///
    /// A paused order's rate was already removed from the aggregator at
    /// `pause` time, so a paused order reaching its expiry here must not
    /// be subtracted again — its record merely becomes eligible for
    /// finalization, which the lifecycle API handles on the next
    /// `withdraw`/`cancel`.
    fn apply_expiries_at(&mut self, boundary: u64) -> PoolResult<()> {
        for id in self.registry.expiring_at(boundary) {
            let order = *self.registry.get(id)?;
            if order.paused {
                continue;
            }
            self.aggregator.sub(order.sell_token, order.sales_rate)?;
            debug!(order_id = id, block = boundary, "order expired");
        }
        Ok(())
    }
}
