//! Long-term order registry (`spec.md` §3 "Long-term order record", §4.3/C3).

use std::collections::BTreeMap;

use crate::direction::Direction;
use crate::error::{PoolError, PoolResult};
use crate::identity::Identity;

/// A single long-term order's persistent record, exactly as `spec.md` §3
/// lists it (with `id` kept on the struct as well as the registry's key,
/// per `spec.md` §3's note that either shape is acceptable).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LongTermOrder {
    pub id: u64,
    pub owner: Identity,
    pub delegate: Identity,
    pub sell_token: Direction,
    pub sales_rate: u128,
    pub order_start: u64,
    pub order_expiry: u64,
    /// Snapshot of `L_{1-sell_token}` at the last block this order's
    /// proceeds were materialized.
    pub scaled_proceeds_at_last_settlement: u128,
    pub paused: bool,
    /// Refundable capital accumulated while paused.
    pub deposit: u128,
    /// Materialized but not-yet-transferred proceeds.
    pub proceeds: u128,
}

impl LongTermOrder {
    /// An order is "active" for aggregator/registry purposes when it is
    /// neither paused nor expired as of `as_of_block` (the supplemented
    /// `iter_active` feature in `spec.md` §2 of this document's expansion).
    pub fn is_active(&self, as_of_block: u64) -> bool {
        !self.paused && as_of_block < self.order_expiry
    }
}

/// Persistent storage for long-term orders, keyed by a monotone id that is
/// never reused once an order is finalized and removed.
#[derive(Debug, Clone, Default)]
pub struct OrderRegistry {
    orders: BTreeMap<u64, LongTermOrder>,
    next_id: u64,
}

impl OrderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a newly issued order, assigning it the next monotone id.
    pub fn insert(&mut self, build: impl FnOnce(u64) -> LongTermOrder) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        let order = build(id);
        self.orders.insert(id, order);
        id
    }

    pub fn get(&self, id: u64) -> PoolResult<&LongTermOrder> {
        self.orders.get(&id).ok_or(PoolError::OrderNotFound)
    }

    pub fn get_mut(&mut self, id: u64) -> PoolResult<&mut LongTermOrder> {
        self.orders.get_mut(&id).ok_or(PoolError::OrderNotFound)
    }

    /// Finalize and remove an order's record. `id` is never reused because
    /// `next_id` only ever increases.
    pub fn remove(&mut self, id: u64) -> PoolResult<LongTermOrder> {
        self.orders.remove(&id).ok_or(PoolError::OrderNotFound)
    }

    /// Ids of orders active (unpaused, unexpired) as of `as_of_block`
    /// selling `direction`.
    pub fn iter_active(&self, direction: Direction, as_of_block: u64) -> Vec<u64> {
        self.orders
            .values()
            .filter(|order| order.sell_token == direction && order.is_active(as_of_block))
            .map(|order| order.id)
            .collect()
    }

    /// Ids of every live order (present in the registry) expiring exactly
    /// at `block`, used by EVO to build its expiry index.
    pub fn expiring_at(&self, block: u64) -> Vec<u64> {
        self.orders
            .values()
            .filter(|order| order.order_expiry == block)
            .map(|order| order.id)
            .collect()
    }

    /// Every distinct block in `(start, target]` at which some live order
    /// expires, used by EVO to build its segmentation boundary set.
    pub fn expiry_blocks_in(&self, start: u64, target: u64) -> Vec<u64> {
        let mut blocks: Vec<u64> = self
            .orders
            .values()
            .map(|order| order.order_expiry)
            .filter(|&expiry| expiry > start && expiry <= target)
            .collect();
        blocks.sort_unstable();
        blocks.dedup();
        blocks
    }
}
