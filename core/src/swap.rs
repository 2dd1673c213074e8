//! Short-term swap and liquidity (`spec.md` §4.6/C7).
//!
//! Both operations run EVO first, then settle against `reserve0`/`reserve1`
//! only — orders and proceeds are long-term-order state and untouched by
//! instantaneous swaps or liquidity moves.

use tracing::instrument;

use twamm_math::mul_div_floor;

use crate::config::BPS_DENOMINATOR;
use crate::direction::Direction;
use crate::error::PoolError;
use crate::error::PoolResult;
use crate::identity::Identity;
use crate::pool::Pool;
use crate::vault::Vault;

impl Pool {
    /// `swap(direction, amount_in, min_out, deadline)`. `deadline` is a
    /// block height the host must not submit the swap past; the core
    /// treats an expired deadline as an immediate failure before touching
    /// any state (`spec.md` §5 "host-side deadlines... surface as
    /// immediate failures").
    #[instrument(skip(self, vault, trader))]
    pub fn swap<V: Vault>(
        &mut self,
        current_block: u64,
        direction: Direction,
        amount_in: u128,
        min_out: u128,
        deadline_block: u64,
        trader: Identity,
        vault: &mut V,
    ) -> PoolResult<u128> {
        if current_block > deadline_block {
            return Err(PoolError::DeadlineExceeded);
        }
        self.guarded(move |pool| {
            pool.advance_evo(current_block)?;

            // Short-term fee first (off the input), then partner fee off
            // the post-short-term-fee input; long-term fee never applies
            // to a short-term swap (spec.md Open Question #3's resolution).
            // The fee differential (amount_in - net_in) stays in the pool's
            // reserve rather than vanishing: it is excluded from the
            // constant-product curve (net_in is what the price impact is
            // computed against) but still added to reserve_d in full, so
            // every token pulled from the trader through the vault is
            // accounted for in reserve_d + orders_d + proceeds_d
            // (spec.md §3 invariant 1).
            let after_short = net_fee(amount_in, pool.config.short_term_fee_bps)?;
            let net_in = net_fee(after_short, pool.config.partner_fee_bps)?;

            let (reserve_in, reserve_out) = match direction {
                Direction::Token0 => (pool.reserve0, pool.reserve1),
                Direction::Token1 => (pool.reserve1, pool.reserve0),
            };

            let curve_reserve_in = reserve_in
                .checked_add(net_in)
                .ok_or(PoolError::MathOverflow)?;
            let new_reserve_out = mul_div_floor(reserve_in, reserve_out, curve_reserve_in)?;
            let amount_out = reserve_out
                .checked_sub(new_reserve_out)
                .ok_or(PoolError::MathUnderflow)?;

            if amount_out < min_out {
                return Err(PoolError::SlippageExceeded);
            }

            let new_reserve_in = reserve_in
                .checked_add(amount_in)
                .ok_or(PoolError::MathOverflow)?;

            vault.transfer_in(direction, trader, amount_in)?;
            vault.transfer_out(direction.opposite(), trader, amount_out)?;

            match direction {
                Direction::Token0 => {
                    pool.reserve0 = new_reserve_in;
                    pool.reserve1 = new_reserve_out;
                }
                Direction::Token1 => {
                    pool.reserve1 = new_reserve_in;
                    pool.reserve0 = new_reserve_out;
                }
            }

            Ok(amount_out)
        })
    }

    /// `joinPool(amounts)`: proportional deposit against `reserve0`,
    /// `reserve1` only, EVO first.
    #[instrument(skip(self, vault, from))]
    pub fn join<V: Vault>(
        &mut self,
        current_block: u64,
        amount0: u128,
        amount1: u128,
        from: Identity,
        vault: &mut V,
    ) -> PoolResult<()> {
        self.guarded(move |pool| {
            pool.advance_evo(current_block)?;
            vault.join(from, amount0, amount1)?;
            pool.reserve0 = pool
                .reserve0
                .checked_add(amount0)
                .ok_or(PoolError::MathOverflow)?;
            pool.reserve1 = pool
                .reserve1
                .checked_add(amount1)
                .ok_or(PoolError::MathOverflow)?;
            Ok(())
        })
    }

    /// `exitPool(bpt_in)`: proportional withdrawal against `reserve0`,
    /// `reserve1` only, EVO first. `bpt_in`/total-supply accounting is left
    /// to the host (`spec.md` §4.6: "LP tokens are not modeled in detail
    /// here"); the caller supplies the already-computed proportional
    /// amounts.
    #[instrument(skip(self, vault, to))]
    pub fn exit<V: Vault>(
        &mut self,
        current_block: u64,
        amount0: u128,
        amount1: u128,
        to: Identity,
        vault: &mut V,
    ) -> PoolResult<()> {
        self.guarded(move |pool| {
            pool.advance_evo(current_block)?;
            pool.reserve0 = pool
                .reserve0
                .checked_sub(amount0)
                .ok_or(PoolError::MathUnderflow)?;
            pool.reserve1 = pool
                .reserve1
                .checked_sub(amount1)
                .ok_or(PoolError::MathUnderflow)?;
            vault.exit(to, amount0, amount1)?;
            Ok(())
        })
    }
}

fn net_fee(amount: u128, fee_bps: u16) -> PoolResult<u128> {
    if fee_bps == 0 {
        return Ok(amount);
    }
    let retained_bps = BPS_DENOMINATOR
        .checked_sub(fee_bps)
        .ok_or(PoolError::InvalidConfig("fee exceeds denominator"))?;
    Ok(mul_div_floor(amount, retained_bps as u128, BPS_DENOMINATOR as u128)?)
}
