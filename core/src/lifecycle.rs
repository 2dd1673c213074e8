//! Order lifecycle API (`spec.md` §4.5/C6): issue, extend, pause, resume,
//! withdraw, cancel.

use tracing::instrument;

use twamm_math::mul_div_floor;

use crate::direction::Direction;
use crate::error::{LifecycleExpectation, PoolError, PoolResult};
use crate::identity::Identity;
use crate::pool::Pool;
use crate::registry::LongTermOrder;
use crate::vault::Vault;

impl Pool {
    fn require_authorized(order: &LongTermOrder, caller: Identity) -> PoolResult<()> {
        if caller == order.owner || caller == order.delegate {
            Ok(())
        } else {
            Err(PoolError::NotAuthorized)
        }
    }

    /// `issue(sellToken, salesRate, intervals, owner, delegate) -> order_id`.
    #[instrument(skip(self, vault, owner, delegate))]
    pub fn issue<V: Vault>(
        &mut self,
        current_block: u64,
        sell_token: Direction,
        sales_rate: u128,
        intervals: u32,
        owner: Identity,
        delegate: Identity,
        vault: &mut V,
    ) -> PoolResult<u64> {
        self.guarded(move |pool| {
            pool.advance_evo(current_block)?;

            if intervals == 0 || intervals > pool.config.max_order_intervals {
                return Err(PoolError::OrderTooLong);
            }
            if sales_rate == 0 {
                return Err(PoolError::InvalidConfig("sales_rate must be nonzero"));
            }

            // tradeBlocks aligns the expiry to the next OBI boundary past
            // the requested window (spec.md Open Question #2's
            // authoritative contract behavior, not the calendar-aligned
            // prose reading).
            let obi = pool.config.obi;
            let trade_blocks = (intervals as u64)
                .checked_mul(obi)
                .and_then(|v| v.checked_sub(current_block % obi))
                .ok_or(PoolError::MathOverflow)?;

            let order_start = current_block;
            let order_expiry = order_start
                .checked_add(trade_blocks)
                .ok_or(PoolError::MathOverflow)?;

            let capital = sales_rate
                .checked_mul(trade_blocks as u128)
                .ok_or(PoolError::MathOverflow)?;
            vault.transfer_in(sell_token, owner, capital)?;

            let opposite_log_value = pool.read_log(sell_token.opposite(), order_start);

            pool.aggregator.add(sell_token, sales_rate)?;
            pool.add_orders(sell_token, capital)?;

            let id = pool.registry.insert(|id| LongTermOrder {
                id,
                owner,
                delegate,
                sell_token,
                sales_rate,
                order_start,
                order_expiry,
                scaled_proceeds_at_last_settlement: opposite_log_value,
                paused: false,
                deposit: 0,
                proceeds: 0,
            });

            Ok(id)
        })
    }

    /// `extend(order_id, extra_intervals, extra_capital)`. `extra_capital`
    /// is the amount the host declares it is prepared to supply; the core
    /// validates it against the actual requirement and rejects the call
    /// with `InsufficientCapital` rather than silently pulling whatever it
    /// needs (`spec.md` §4.7 "insufficient sellToken supplied for
    /// extend"). Deliberately does not invoke EVO (`spec.md` §4.5: "this is
    /// deliberate so extend is cheap and does not move `lvob`").
    #[instrument(skip(self, vault, caller))]
    pub fn extend<V: Vault>(
        &mut self,
        current_block: u64,
        order_id: u64,
        extra_intervals: u32,
        extra_capital: u128,
        caller: Identity,
        vault: &mut V,
    ) -> PoolResult<()> {
        self.guarded(move |pool| {
            let order = *pool.registry.get(order_id)?;
            Self::require_authorized(&order, caller)?;
            if current_block >= order.order_expiry {
                return Err(PoolError::WrongLifecycleState(
                    LifecycleExpectation::ExpectedNotExpired,
                ));
            }

            let obi = pool.config.obi;
            let extra_blocks = (extra_intervals as u64)
                .checked_mul(obi)
                .ok_or(PoolError::MathOverflow)?;
            let new_expiry = order
                .order_expiry
                .checked_add(extra_blocks)
                .ok_or(PoolError::MathOverflow)?;
            let max_span = (pool.config.max_order_intervals as u64)
                .checked_mul(obi)
                .ok_or(PoolError::MathOverflow)?;
            if new_expiry - order.order_start > max_span {
                return Err(PoolError::OrderTooLong);
            }

            let extra_rate_blocks = order
                .sales_rate
                .checked_mul(extra_blocks as u128)
                .ok_or(PoolError::MathOverflow)?;
            let deposit_consumed = order.deposit.min(extra_rate_blocks);
            let required_capital = extra_rate_blocks - deposit_consumed;
            if extra_capital < required_capital {
                return Err(PoolError::InsufficientCapital);
            }
            if required_capital > 0 {
                vault.transfer_in(order.sell_token, caller, required_capital)?;
            }

            let paused = order.paused;
            if !paused {
                pool.add_orders(order.sell_token, extra_rate_blocks)?;
            }

            let order_mut = pool.registry.get_mut(order_id)?;
            order_mut.order_expiry = new_expiry;
            order_mut.deposit -= deposit_consumed;
            if paused {
                // Extension while paused stores in deposit rather than
                // re-activating the order (spec.md §4.5).
                order_mut.deposit += extra_rate_blocks;
            }

            Ok(())
        })
    }

    /// `pause(order_id)`.
    #[instrument(skip(self, caller))]
    pub fn pause(&mut self, current_block: u64, order_id: u64, caller: Identity) -> PoolResult<()> {
        self.guarded(move |pool| {
            pool.advance_evo(current_block)?;

            let order = *pool.registry.get(order_id)?;
            Self::require_authorized(&order, caller)?;
            if order.paused {
                return Err(PoolError::WrongLifecycleState(
                    LifecycleExpectation::ExpectedUnpaused,
                ));
            }
            if current_block >= order.order_expiry {
                return Err(PoolError::WrongLifecycleState(
                    LifecycleExpectation::ExpectedNotExpired,
                ));
            }

            let opposite = order.sell_token.opposite();
            let scaled_now = pool.read_log(opposite, current_block);
            let proceeds_gain = pool.settlement_gain(&order, scaled_now)?;
            pool.credit_order_proceeds(opposite, order_id, proceeds_gain)?;

            let remaining_blocks = order.order_expiry - current_block;
            let moved = order
                .sales_rate
                .checked_mul(remaining_blocks as u128)
                .ok_or(PoolError::MathOverflow)?;
            pool.sub_orders(order.sell_token, moved)?;
            pool.aggregator.sub(order.sell_token, order.sales_rate)?;

            let order_mut = pool.registry.get_mut(order_id)?;
            order_mut.deposit += moved;
            order_mut.paused = true;
            order_mut.scaled_proceeds_at_last_settlement = scaled_now;

            Ok(())
        })
    }

    /// `resume(order_id)`.
    #[instrument(skip(self, caller))]
    pub fn resume(&mut self, current_block: u64, order_id: u64, caller: Identity) -> PoolResult<()> {
        self.guarded(move |pool| {
            pool.advance_evo(current_block)?;

            let order = *pool.registry.get(order_id)?;
            Self::require_authorized(&order, caller)?;
            if !order.paused {
                return Err(PoolError::WrongLifecycleState(
                    LifecycleExpectation::ExpectedPaused,
                ));
            }
            if current_block >= order.order_expiry {
                return Err(PoolError::WrongLifecycleState(
                    LifecycleExpectation::ExpectedNotExpired,
                ));
            }

            let remaining_blocks = order.order_expiry - current_block;
            let moved = order
                .sales_rate
                .checked_mul(remaining_blocks as u128)
                .ok_or(PoolError::MathOverflow)?;
            if moved > order.deposit {
                return Err(PoolError::InsufficientCapital);
            }
            pool.add_orders(order.sell_token, moved)?;
            pool.aggregator.add(order.sell_token, order.sales_rate)?;

            let scaled_now = pool.read_log(order.sell_token.opposite(), current_block);
            let order_mut = pool.registry.get_mut(order_id)?;
            order_mut.deposit -= moved;
            order_mut.paused = false;
            order_mut.scaled_proceeds_at_last_settlement = scaled_now;

            Ok(())
        })
    }

    /// `withdraw(order_id)`, transferring proceeds and any leftover deposit
    /// to `to`. Finalizes (deletes) the record if the order has expired.
    #[instrument(skip(self, vault, caller, to))]
    pub fn withdraw<V: Vault>(
        &mut self,
        current_block: u64,
        order_id: u64,
        caller: Identity,
        to: Identity,
        vault: &mut V,
    ) -> PoolResult<()> {
        self.guarded(move |pool| {
            pool.advance_evo(current_block)?;

            let order = *pool.registry.get(order_id)?;
            Self::require_authorized(&order, caller)?;

            let opposite = order.sell_token.opposite();
            let scaled_now = pool.read_log(opposite, current_block);
            let proceeds_gain = pool.settlement_gain(&order, scaled_now)?;
            pool.credit_order_proceeds(opposite, order_id, proceeds_gain)?;

            let order = *pool.registry.get(order_id)?;
            let total_proceeds = order.proceeds;
            if total_proceeds > 0 {
                vault.transfer_out(opposite, to, total_proceeds)?;
            }
            if order.deposit > 0 {
                vault.transfer_out(order.sell_token, to, order.deposit)?;
            }

            let order_mut = pool.registry.get_mut(order_id)?;
            order_mut.proceeds = 0;
            order_mut.deposit = 0;
            order_mut.scaled_proceeds_at_last_settlement = scaled_now;
            let order_expiry = order_mut.order_expiry;

            if current_block >= order_expiry {
                pool.registry.remove(order_id)?;
            }

            Ok(())
        })
    }

    /// `cancel(order_id)`: settles proceeds as `withdraw` does, additionally
    /// refunds any remaining active capital, and unconditionally finalizes
    /// the record.
    #[instrument(skip(self, vault, caller, to))]
    pub fn cancel<V: Vault>(
        &mut self,
        current_block: u64,
        order_id: u64,
        caller: Identity,
        to: Identity,
        vault: &mut V,
    ) -> PoolResult<()> {
        self.guarded(move |pool| {
            pool.advance_evo(current_block)?;

            let order = *pool.registry.get(order_id)?;
            Self::require_authorized(&order, caller)?;

            let opposite = order.sell_token.opposite();
            let scaled_now = pool.read_log(opposite, current_block);
            let proceeds_gain = pool.settlement_gain(&order, scaled_now)?;
            pool.credit_order_proceeds(opposite, order_id, proceeds_gain)?;

            let order = *pool.registry.get(order_id)?;
            let mut sell_token_refund = order.deposit;

            if !order.paused {
                let remaining = order.order_expiry.saturating_sub(current_block);
                let refund = order
                    .sales_rate
                    .checked_mul(remaining as u128)
                    .ok_or(PoolError::MathOverflow)?;
                pool.sub_orders(order.sell_token, refund)?;
                pool.aggregator.sub(order.sell_token, order.sales_rate)?;
                sell_token_refund = sell_token_refund
                    .checked_add(refund)
                    .ok_or(PoolError::MathOverflow)?;
            }

            if order.proceeds > 0 {
                vault.transfer_out(opposite, to, order.proceeds)?;
            }
            if sell_token_refund > 0 {
                vault.transfer_out(order.sell_token, to, sell_token_refund)?;
            }

            pool.registry.remove(order_id)?;
            Ok(())
        })
    }

    fn read_log(&self, direction: Direction, block: u64) -> u128 {
        match direction {
            Direction::Token0 => self.log0.read(block),
            Direction::Token1 => self.log1.read(block),
        }
    }

    /// `proceeds_gain = (scaled_now - scaledProceedsAtLastSettlement) *
    /// salesRate / SCALE_{1-sellToken}` (`spec.md` §4.5 `pause`/`withdraw`).
    fn settlement_gain(&self, order: &LongTermOrder, scaled_now: u128) -> PoolResult<u128> {
        let delta = scaled_now.saturating_sub(order.scaled_proceeds_at_last_settlement);
        if delta == 0 {
            return Ok(0);
        }
        let scale = self.config.scale(order.sell_token.opposite());
        Ok(mul_div_floor(delta, order.sales_rate, scale)?)
    }

    fn credit_order_proceeds(
        &mut self,
        opposite: Direction,
        order_id: u64,
        proceeds_gain: u128,
    ) -> PoolResult<()> {
        if proceeds_gain == 0 {
            return Ok(());
        }
        match opposite {
            Direction::Token0 => {
                self.proceeds0 = self
                    .proceeds0
                    .checked_sub(proceeds_gain)
                    .ok_or(PoolError::MathUnderflow)?;
            }
            Direction::Token1 => {
                self.proceeds1 = self
                    .proceeds1
                    .checked_sub(proceeds_gain)
                    .ok_or(PoolError::MathUnderflow)?;
            }
        }
        let order = self.registry.get_mut(order_id)?;
        order.proceeds = order
            .proceeds
            .checked_add(proceeds_gain)
            .ok_or(PoolError::MathOverflow)?;
        Ok(())
    }

    fn add_orders(&mut self, direction: Direction, amount: u128) -> PoolResult<()> {
        let slot = match direction {
            Direction::Token0 => &mut self.orders0,
            Direction::Token1 => &mut self.orders1,
        };
        *slot = slot.checked_add(amount).ok_or(PoolError::MathOverflow)?;
        Ok(())
    }

    fn sub_orders(&mut self, direction: Direction, amount: u128) -> PoolResult<()> {
        let slot = match direction {
            Direction::Token0 => &mut self.orders0,
            Direction::Token1 => &mut self.orders1,
        };
        *slot = slot.checked_sub(amount).ok_or(PoolError::MathUnderflow)?;
        Ok(())
    }
}
