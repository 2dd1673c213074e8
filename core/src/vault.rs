//! The host-supplied token-custody interface (`spec.md` §1, §4.6).
//!
//! Value transfer and token accounting are explicitly out of scope for this
//! core (`spec.md` §1); the host implements `Vault` over whatever ledger it
//! runs on and the core only ever calls these four methods.

use crate::direction::Direction;
use crate::error::PoolResult;
use crate::identity::Identity;

/// Callbacks into the host's token ledger. The core never inspects token
/// balances directly — every reserve and order-capital figure it tracks is
/// internal accounting that must stay consistent with what actually moved
/// through this trait (`spec.md` §3 invariant 1).
pub trait Vault {
    /// Pull `amount` of the token for `direction` from `from` into the pool.
    fn transfer_in(&mut self, direction: Direction, from: Identity, amount: u128)
        -> PoolResult<()>;

    /// Push `amount` of the token for `direction` from the pool to `to`.
    fn transfer_out(&mut self, direction: Direction, to: Identity, amount: u128)
        -> PoolResult<()>;

    /// Pull proportional liquidity amounts for a `joinPool` call.
    fn join(&mut self, from: Identity, amount0: u128, amount1: u128) -> PoolResult<()>;

    /// Push proportional liquidity amounts for an `exitPool` call.
    fn exit(&mut self, to: Identity, amount0: u128, amount1: u128) -> PoolResult<()>;

    /// Host-side token balances actually held in custody for this pool
    /// (`spec.md` §6 `getVaultPoolReserves`). Used by callers that want to
    /// cross-check the core's own `reserve_d + orders_d + proceeds_d`
    /// bookkeeping against what the ledger really holds.
    fn pool_reserves(&self) -> (u128, u128);
}
