//! The pool singleton (`spec.md` §3 "Pool state").
//!
//! `Pool` owns every piece of state named in §3: reserves, the aggregate
//! undelivered order/proceeds totals, the sales-rate aggregator, the order
//! registry, the two scaled-proceeds logs, and the reentrancy latch. The
//! expiry index `spec.md` §3 describes as a separate ordered set is derived
//! on demand from the registry instead of kept as a parallel structure —
//! see `DESIGN.md` for why that's equivalent and avoids a second place two
//! pieces of state could drift out of sync.

use crate::aggregator::SalesRateAggregator;
use crate::config::PoolConfig;
use crate::direction::Direction;
use crate::error::PoolResult;
use crate::evo::EvoState;
use crate::proceeds_log::ScaledProceedsLog;
use crate::reentrancy::{ReentrancyGuard, ReentrancyStatus};
use crate::registry::{LongTermOrder, OrderRegistry};

/// A read-only bundle of every `spec.md` §6 read operation's result,
/// gathered in one call for test assertions and host-side caching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolSnapshot {
    pub reserve0: u128,
    pub reserve1: u128,
    pub orders0: u128,
    pub orders1: u128,
    pub proceeds0: u128,
    pub proceeds1: u128,
    pub sales_rate0: u128,
    pub sales_rate1: u128,
    pub lvob: u64,
}

#[derive(Debug, Clone)]
pub struct Pool {
    pub(crate) reserve0: u128,
    pub(crate) reserve1: u128,
    pub(crate) orders0: u128,
    pub(crate) orders1: u128,
    pub(crate) proceeds0: u128,
    pub(crate) proceeds1: u128,
    pub(crate) lvob: u64,
    pub(crate) config: PoolConfig,
    pub(crate) aggregator: SalesRateAggregator,
    pub(crate) registry: OrderRegistry,
    pub(crate) log0: ScaledProceedsLog,
    pub(crate) log1: ScaledProceedsLog,
    pub(crate) reentrancy: ReentrancyStatus,
}

impl Pool {
    /// Construct an empty pool seeded with initial liquidity. Joining and
    /// exiting beyond this point goes through [`crate::swap`]'s `join`/`exit`.
    pub fn new(config: PoolConfig, reserve0: u128, reserve1: u128) -> Self {
        Self {
            reserve0,
            reserve1,
            orders0: 0,
            orders1: 0,
            proceeds0: 0,
            proceeds1: 0,
            lvob: 0,
            config,
            aggregator: SalesRateAggregator::new(),
            registry: OrderRegistry::new(),
            log0: ScaledProceedsLog::new(),
            log1: ScaledProceedsLog::new(),
            reentrancy: ReentrancyStatus::Unlocked,
        }
    }

    /// `executeVirtualOrdersToBlock` (`spec.md` §6): advance the pool's
    /// state to `block`. No-op if `block <= lvob`.
    pub fn execute_virtual_orders_to_block(&mut self, block: u64) -> PoolResult<()> {
        self.guarded(|pool| pool.advance_evo(block))
    }

    /// Un-guarded EVO advance, for lifecycle/swap entry points that are
    /// already running inside their own [`Pool::guarded`] call — calling
    /// the public, guarded `execute_virtual_orders_to_block` from there
    /// would try to acquire an already-held latch and fail spuriously.
    pub(crate) fn advance_evo(&mut self, block: u64) -> PoolResult<()> {
        if block <= self.lvob {
            return Ok(());
        }
        self.evo_state().execute_to(block)
    }

    /// Acquire the reentrancy latch (`spec.md` §5), run `body`, then
    /// release it — release happens whether `body` returns `Ok` or `Err`,
    /// matching the "a ?-propagated error still releases the latch"
    /// guarantee the corpus's `ScopedReentrancyGuard` gives for a bare
    /// status value. A literal RAII guard can't be held across `body`
    /// here because `body` itself needs `&mut self` (the whole struct, to
    /// reach reserves/registry/logs), which would alias the guard's borrow
    /// of `self.reentrancy`; acquiring and releasing around the call gives
    /// the same fail-safe release with a method that takes `&mut Pool`.
    pub(crate) fn guarded<T>(
        &mut self,
        body: impl FnOnce(&mut Self) -> PoolResult<T>,
    ) -> PoolResult<T> {
        ReentrancyGuard::acquire(&mut self.reentrancy)?;
        let result = body(self);
        ReentrancyGuard::release(&mut self.reentrancy);
        result
    }

    pub(crate) fn evo_state(&mut self) -> EvoState<'_> {
        EvoState {
            reserve0: &mut self.reserve0,
            reserve1: &mut self.reserve1,
            orders0: &mut self.orders0,
            orders1: &mut self.orders1,
            proceeds0: &mut self.proceeds0,
            proceeds1: &mut self.proceeds1,
            lvob: &mut self.lvob,
            aggregator: &mut self.aggregator,
            registry: &mut self.registry,
            log0: &mut self.log0,
            log1: &mut self.log1,
            obi: self.config.obi,
            scale0: self.config.scale0(),
            scale1: self.config.scale1(),
        }
    }

    // ---- spec.md §6 read operations ----

    pub fn get_order_interval(&self) -> u64 {
        self.config.obi
    }

    pub fn get_max_order_intervals(&self) -> u32 {
        self.config.max_order_intervals
    }

    pub fn get_short_term_fee_points(&self) -> u16 {
        self.config.short_term_fee_bps
    }

    pub fn get_partner_fee_points(&self) -> u16 {
        self.config.partner_fee_bps
    }

    pub fn get_long_term_fee_points(&self) -> u16 {
        self.config.long_term_fee_bps
    }

    pub fn get_order_amounts(&self) -> (u128, u128) {
        (self.orders0, self.orders1)
    }

    pub fn get_proceed_amounts(&self) -> (u128, u128) {
        (self.proceeds0, self.proceeds1)
    }

    pub fn get_sales_rates(&self) -> (u128, u128) {
        (
            self.aggregator.rate(Direction::Token0),
            self.aggregator.rate(Direction::Token1),
        )
    }

    pub fn get_order(&self, id: u64) -> PoolResult<LongTermOrder> {
        self.registry.get(id).copied()
    }

    pub fn get_scaled_proceeds_at_block(&self, block: u64) -> (u128, u128) {
        (self.log0.read(block), self.log1.read(block))
    }

    /// `getVaultPoolReserves` (`spec.md` §6): the host-side token balances
    /// actually held in custody for this pool, as reported by the `Vault`.
    /// A thin passthrough — the core does not cache or second-guess it.
    pub fn get_vault_pool_reserves<V: crate::vault::Vault>(&self, vault: &V) -> (u128, u128) {
        vault.pool_reserves()
    }

    pub fn lvob(&self) -> u64 {
        self.lvob
    }

    pub fn config(&self) -> PoolConfig {
        self.config
    }

    pub fn snapshot(&self) -> PoolSnapshot {
        let (sales_rate0, sales_rate1) = self.get_sales_rates();
        PoolSnapshot {
            reserve0: self.reserve0,
            reserve1: self.reserve1,
            orders0: self.orders0,
            orders1: self.orders1,
            proceeds0: self.proceeds0,
            proceeds1: self.proceeds1,
            sales_rate0,
            sales_rate1,
            lvob: self.lvob,
        }
    }

    pub fn iter_active_orders(&self, direction: Direction, as_of_block: u64) -> Vec<u64> {
        self.registry.iter_active(direction, as_of_block)
    }
}
