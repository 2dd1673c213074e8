//! Concrete scenarios from `spec.md` §8, same constants the spec gives:
//! OBI=7200, decimals=18, initial reserves 10^9 * 10^18 each, sales rate
//! 10 * 10^18 tokens/block, zero fees.
//!
//! Where the spec's own prose names a log by the sold direction
//! (`scaledProceeds0` for a token-0-selling order) but `spec.md` §4.2's
//! per-segment formula accumulates a one-sided segment's proceeds into the
//! *opposite* direction's log (`scaled1 += proc1 * SCALE_1 / s0` when only
//! token0 is selling), these tests check the log that actually carries the
//! order's proceeds in this implementation — see `DESIGN.md`'s Open
//! Question notes.

mod common;

use approx::assert_relative_eq;
use common::{owner, TestVault};
use twamm_core::{Direction, Pool, PoolConfig, PoolError, PoolType};
use twamm_math::mul_div_floor;

const OBI: u64 = 7_200;
const DECIMALS: u8 = 18;
const RESERVE: u128 = 1_000_000_000 * 1_000_000_000_000_000_000u128;
const SALES_RATE: u128 = 10 * 1_000_000_000_000_000_000u128;
const SCALE: u128 = 10_000_000_000_000_000_000u128; // 10^19

fn config(max_intervals: u32) -> PoolConfig {
    PoolConfig::new(OBI, max_intervals, 0, 0, 0, PoolType::ConstantProduct, DECIMALS, DECIMALS)
        .unwrap()
}

/// [OBI-T-002] 3-interval 0->1 LTO, EVO at `orderStart + 2*OBI + 1`.
#[test]
fn obi_t_002_three_interval_zero_to_one_lto() {
    let mut pool = Pool::new(config(10), RESERVE, RESERVE);
    let mut vault = TestVault::new(RESERVE, RESERVE);
    let id = pool
        .issue(0, Direction::Token0, SALES_RATE, 3, owner(1), owner(1), &mut vault)
        .unwrap();
    let order = pool.get_order(id).unwrap();

    let first_interval = OBI;
    let second_interval = 2 * OBI;
    let target = second_interval + 1;
    pool.execute_virtual_orders_to_block(target).unwrap();

    // Exact one-sided closed form for the first completed segment.
    let new_reserve0_i1 = RESERVE + SALES_RATE * first_interval as u128;
    let new_reserve1_i1 = mul_div_floor(RESERVE, RESERVE, new_reserve0_i1).unwrap();
    let proc_i1 = RESERVE - new_reserve1_i1;
    let expected_scaled_at_first = mul_div_floor(proc_i1, SCALE, SALES_RATE).unwrap();
    let (_, scaled1_at_first) = pool.get_scaled_proceeds_at_block(first_interval);
    assert_eq!(scaled1_at_first, expected_scaled_at_first);

    let (orders0, _) = pool.get_order_amounts();
    assert_eq!(orders0, SALES_RATE * (order.order_expiry - target) as u128);

    let (proceeds0, proceeds1) = pool.get_proceed_amounts();
    assert_eq!(proceeds0, 0);

    let new_reserve0_full = RESERVE + SALES_RATE * target as u128;
    let new_reserve1_full = mul_div_floor(RESERVE, RESERVE, new_reserve0_full).unwrap();
    let expected_proceeds1 = RESERVE - new_reserve1_full;
    let diff = expected_proceeds1.abs_diff(proceeds1);
    assert!(
        diff <= 3,
        "proceeds1 {proceeds1} vs expected {expected_proceeds1} (diff {diff})"
    );
}

/// [OBI-T-003] Mirror of OBI-T-002 with the tokens swapped.
#[test]
fn obi_t_003_three_interval_one_to_zero_lto() {
    let mut pool = Pool::new(config(10), RESERVE, RESERVE);
    let mut vault = TestVault::new(RESERVE, RESERVE);
    let id = pool
        .issue(0, Direction::Token1, SALES_RATE, 3, owner(1), owner(1), &mut vault)
        .unwrap();
    let order = pool.get_order(id).unwrap();

    let first_interval = OBI;
    let second_interval = 2 * OBI;
    let target = second_interval + 1;
    pool.execute_virtual_orders_to_block(target).unwrap();

    let new_reserve1_i1 = RESERVE + SALES_RATE * first_interval as u128;
    let new_reserve0_i1 = mul_div_floor(RESERVE, RESERVE, new_reserve1_i1).unwrap();
    let proc_i1 = RESERVE - new_reserve0_i1;
    let expected_scaled_at_first = mul_div_floor(proc_i1, SCALE, SALES_RATE).unwrap();
    let (scaled0_at_first, _) = pool.get_scaled_proceeds_at_block(first_interval);
    assert_eq!(scaled0_at_first, expected_scaled_at_first);

    let (_, orders1) = pool.get_order_amounts();
    assert_eq!(orders1, SALES_RATE * (order.order_expiry - target) as u128);

    let (proceeds0, proceeds1) = pool.get_proceed_amounts();
    assert_eq!(proceeds1, 0);

    let new_reserve1_full = RESERVE + SALES_RATE * target as u128;
    let new_reserve0_full = mul_div_floor(RESERVE, RESERVE, new_reserve1_full).unwrap();
    let expected_proceeds0 = RESERVE - new_reserve0_full;
    let diff = expected_proceeds0.abs_diff(proceeds0);
    assert!(
        diff <= 3,
        "proceeds0 {proceeds0} vs expected {expected_proceeds0} (diff {diff})"
    );
}

/// [OBI-T-004] Extend a 0->1 LTO by one interval immediately before expiry;
/// extend performs no EVO, so proceeds must not move.
#[test]
fn obi_t_004_extend_one_interval_before_expiry() {
    let mut pool = Pool::new(config(10), RESERVE, RESERVE);
    let mut vault = TestVault::new(RESERVE, RESERVE);
    let id = pool
        .issue(0, Direction::Token0, SALES_RATE, 1, owner(1), owner(1), &mut vault)
        .unwrap();
    let order_before = pool.get_order(id).unwrap();
    let proceeds_before = pool.get_proceed_amounts();
    let (orders0_before, _) = pool.get_order_amounts();

    pool.extend(order_before.order_expiry - 1, id, 1, u128::MAX, owner(1), &mut vault)
        .unwrap();

    let order_after = pool.get_order(id).unwrap();
    assert_eq!(order_after.order_expiry, order_before.order_expiry + OBI);

    let (orders0_after, _) = pool.get_order_amounts();
    assert_eq!(orders0_after - orders0_before, SALES_RATE * OBI as u128);

    assert_eq!(pool.get_proceed_amounts(), proceeds_before);
    assert_eq!(pool.lvob(), 0, "extend never advances lvob");
}

/// [OBI-T-005] Pause at block 100, resume at `100 + OBI/2`, then extend by
/// one interval; the deposit accrued between pause and resume is consumed
/// exactly by the extend.
#[test]
fn obi_t_005_pause_resume_extend_consumes_deposit_exactly() {
    let mut pool = Pool::new(config(10), RESERVE, RESERVE);
    let mut vault = TestVault::new(RESERVE, RESERVE);
    let id = pool
        .issue(0, Direction::Token0, SALES_RATE, 3, owner(1), owner(1), &mut vault)
        .unwrap();
    let order_expiry = pool.get_order(id).unwrap().order_expiry;

    pool.pause(100, id, owner(1)).unwrap();
    assert_eq!(
        pool.get_order(id).unwrap().deposit,
        SALES_RATE * (order_expiry - 100) as u128
    );

    let resume_block = 100 + OBI / 2;
    pool.resume(resume_block, id, owner(1)).unwrap();
    let deposit_at_resume = pool.get_order(id).unwrap().deposit;
    assert_eq!(deposit_at_resume, SALES_RATE * (OBI / 2) as u128);

    pool.extend(resume_block, id, 1, u128::MAX, owner(1), &mut vault)
        .unwrap();
    let order_after = pool.get_order(id).unwrap();
    assert_eq!(order_after.deposit, 0, "deposit fully consumed by the extend");

    let (orders0, _) = pool.get_order_amounts();
    assert_eq!(
        orders0,
        SALES_RATE * (order_after.order_expiry - resume_block) as u128
    );

    let (_, proceeds1) = pool.get_proceed_amounts();
    let expected_proceeds1 = SALES_RATE * 100;
    assert_relative_eq!(proceeds1 as f64, expected_proceeds1 as f64, max_relative = 1e-6);
}

/// [OBI-T-008] Issuing an LTO with `intervals = maxOrderIntervals + 1`
/// fails with `OrderTooLong`.
#[test]
fn obi_t_008_too_many_intervals_fails() {
    let mut pool = Pool::new(config(5), RESERVE, RESERVE);
    let mut vault = TestVault::new(RESERVE, RESERVE);
    let err = pool
        .issue(0, Direction::Token0, SALES_RATE, 6, owner(1), owner(1), &mut vault)
        .unwrap_err();
    assert_eq!(err, PoolError::OrderTooLong);
    // Failure must leave the pool untouched.
    assert_eq!(pool.get_sales_rates(), (0, 0));
    assert_eq!(vault.balance(Direction::Token0), RESERVE);
}

/// [PR-AT-001]-style scenario: two opposing LTOs of equal size run to
/// completion and are both withdrawn; the pool ends with zero outstanding
/// orders/proceeds/sales-rate and total value conserved within a tight
/// tolerance (the two-sided EVO closed form carries `spec.md` §4.4's
/// O(1e-6) relative-error budget).
#[test]
fn two_opposing_ltos_settle_with_conserved_value() {
    let mut pool = Pool::new(config(10), RESERVE, RESERVE);
    let mut vault = TestVault::new(RESERVE, RESERVE);

    let id0 = pool
        .issue(0, Direction::Token0, SALES_RATE, 2, owner(1), owner(1), &mut vault)
        .unwrap();
    let id1 = pool
        .issue(0, Direction::Token1, SALES_RATE, 2, owner(2), owner(2), &mut vault)
        .unwrap();

    let expiry = pool.get_order(id0).unwrap().order_expiry;
    assert_eq!(expiry, pool.get_order(id1).unwrap().order_expiry);

    pool.withdraw(expiry, id0, owner(1), owner(1), &mut vault)
        .unwrap();
    pool.withdraw(expiry, id1, owner(2), owner(2), &mut vault)
        .unwrap();

    let (orders0, orders1) = pool.get_order_amounts();
    assert_eq!(orders0, 0);
    assert_eq!(orders1, 0);
    let (proceeds0, proceeds1) = pool.get_proceed_amounts();
    assert_eq!(proceeds0, 0);
    assert_eq!(proceeds1, 0);
    assert_eq!(pool.get_sales_rates(), (0, 0));
    assert!(pool.get_order(id0).is_err());
    assert!(pool.get_order(id1).is_err());

    let snapshot = pool.snapshot();
    let total = snapshot.reserve0 + snapshot.reserve1;
    assert_relative_eq!(total as f64, (2 * RESERVE) as f64, max_relative = 1e-6);

    // The two-sided EVO closed form floors `reserve` and `proceeds`
    // independently each segment (spec.md §9: "tolerance budgets... reflect
    // achievable precision"), so conservation holds within the same
    // relative budget rather than bit-exactly.
    let vault_total = vault.balance(Direction::Token0) + vault.balance(Direction::Token1);
    assert_relative_eq!(
        vault_total as f64,
        (snapshot.reserve0 + snapshot.reserve1) as f64,
        max_relative = 1e-6
    );
}

/// [PRE-AT-002] Eight symmetric LTOs (4 per direction, equal rate and
/// interval count) run through a pause/resume/extend/withdraw/cancel
/// sequence that exactly balances each order against its mirror on the
/// opposite side. At the final block every order is gone and the pool's
/// outstanding orders/proceeds/sales-rate are all zero, with `reserve_d`
/// back at the initial liquidity because the two directions' flows cancel
/// exactly.
#[test]
fn pre_at_002_eight_symmetric_ltos_balance_to_zero() {
    let mut pool = Pool::new(config(10), RESERVE, RESERVE);
    let mut vault = TestVault::new(RESERVE, RESERVE);
    let intervals = 2u32;

    // Four orders per direction, all equal rate/intervals, so every
    // token0-selling order has an exact token1-selling mirror and the
    // two-sided EVO segments net to the same reserves they started at.
    let mut token0_ids = Vec::new();
    let mut token1_ids = Vec::new();
    for i in 0..4u8 {
        token0_ids.push(
            pool.issue(0, Direction::Token0, SALES_RATE, intervals, owner(10 + i), owner(10 + i), &mut vault)
                .unwrap(),
        );
        token1_ids.push(
            pool.issue(0, Direction::Token1, SALES_RATE, intervals, owner(20 + i), owner(20 + i), &mut vault)
                .unwrap(),
        );
    }

    let expiry = pool.get_order(token0_ids[0]).unwrap().order_expiry;
    let quarter = expiry / 4;

    // Pause then resume the first pair at the same block (a no-op on the
    // aggregate), extend the second pair by one interval then immediately
    // cancel them back out, and leave the remaining two pairs to run and
    // withdraw at expiry — every path nets the same order back to zero.
    pool.pause(quarter, token0_ids[0], owner(10)).unwrap();
    pool.resume(quarter, token0_ids[0], owner(10)).unwrap();
    pool.pause(quarter, token1_ids[0], owner(20)).unwrap();
    pool.resume(quarter, token1_ids[0], owner(20)).unwrap();

    pool.extend(quarter, token0_ids[1], 1, u128::MAX, owner(11), &mut vault).unwrap();
    pool.cancel(quarter, token0_ids[1], owner(11), owner(11), &mut vault).unwrap();
    pool.extend(quarter, token1_ids[1], 1, u128::MAX, owner(21), &mut vault).unwrap();
    pool.cancel(quarter, token1_ids[1], owner(21), owner(21), &mut vault).unwrap();

    for &id in token0_ids[2..].iter().chain(token1_ids[2..].iter()) {
        let order = pool.get_order(id).unwrap();
        let owner_id = order.owner;
        pool.withdraw(expiry, id, owner_id, owner_id, &mut vault).unwrap();
    }
    for &id in [token0_ids[0], token1_ids[0]].iter() {
        let order = pool.get_order(id).unwrap();
        let owner_id = order.owner;
        pool.withdraw(expiry, id, owner_id, owner_id, &mut vault).unwrap();
    }

    assert_eq!(pool.get_order_amounts(), (0, 0));
    assert_eq!(pool.get_proceed_amounts(), (0, 0));
    assert_eq!(pool.get_sales_rates(), (0, 0));
    for &id in token0_ids.iter().chain(token1_ids.iter()) {
        assert!(pool.get_order(id).is_err());
    }

    let snapshot = pool.snapshot();
    assert_relative_eq!(snapshot.reserve0 as f64, RESERVE as f64, max_relative = 1e-6);
    assert_relative_eq!(snapshot.reserve1 as f64, RESERVE as f64, max_relative = 1e-6);
}
