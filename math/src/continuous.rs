//! Closed-form solver for the EVO engine's constant-sales-rate segments.
//!
//! `spec.md` §4.4 gives the one-sided cases (A, B) as exact integer
//! arithmetic and the two-sided case (C) as a continuous-domain ODE
//! solution involving `sqrt` and `exp`. Following the same layering the
//! rest of this codebase uses for continuous math (tick-to-price
//! conversion does its `ln`/`sqrt` work in `f64` and only returns to exact
//! integer arithmetic at the token-amount boundary), Case C is solved in
//! `f64` and the reserves/proceeds are floored back to `u128` at the end.
//! `spec.md` §8 accepts O(1e-6) relative error for this segment, which an
//! `f64` solve comfortably satisfies.

use crate::error::{MathError, MathResult};
use crate::mul_div::mul_div_floor;

/// Reserve and proceeds outcome of advancing one EVO segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentOutcome {
    pub reserve0: u128,
    pub reserve1: u128,
    /// Token-0 delivered to token-1 sellers during the segment.
    pub proceeds0: u128,
    /// Token-1 delivered to token-0 sellers during the segment.
    pub proceeds1: u128,
}

/// Case A of `spec.md` §4.4: only token0 is being sold (`sales_rate1 == 0`).
pub fn one_sided_sells_token0(
    reserve0: u128,
    reserve1: u128,
    sales_rate0: u128,
    delta_blocks: u64,
) -> MathResult<SegmentOutcome> {
    if delta_blocks == 0 || sales_rate0 == 0 {
        return Ok(SegmentOutcome {
            reserve0,
            reserve1,
            proceeds0: 0,
            proceeds1: 0,
        });
    }
    let delta_in = sales_rate0
        .checked_mul(delta_blocks as u128)
        .ok_or(MathError::Overflow)?;
    let new_reserve0 = reserve0.checked_add(delta_in).ok_or(MathError::Overflow)?;
    // k / new_reserve0 == reserve0 * reserve1 / new_reserve0
    let new_reserve1 = mul_div_floor(reserve0, reserve1, new_reserve0)?;
    let proceeds1 = reserve1
        .checked_sub(new_reserve1)
        .ok_or(MathError::Underflow)?;
    Ok(SegmentOutcome {
        reserve0: new_reserve0,
        reserve1: new_reserve1,
        proceeds0: 0,
        proceeds1,
    })
}

/// Case B of `spec.md` §4.4: only token1 is being sold (`sales_rate0 == 0`).
/// The mirror image of [`one_sided_sells_token0`] with 0 and 1 swapped.
pub fn one_sided_sells_token1(
    reserve0: u128,
    reserve1: u128,
    sales_rate1: u128,
    delta_blocks: u64,
) -> MathResult<SegmentOutcome> {
    let mirrored = one_sided_sells_token0(reserve1, reserve0, sales_rate1, delta_blocks)?;
    Ok(SegmentOutcome {
        reserve0: mirrored.reserve1,
        reserve1: mirrored.reserve0,
        proceeds0: mirrored.proceeds1,
        proceeds1: mirrored.proceeds0,
    })
}

/// Case C of `spec.md` §4.4: both directions are selling simultaneously.
/// Solves the paired-flow ODE's closed form for the segment's end reserves.
pub fn two_sided_segment(
    reserve0: u128,
    reserve1: u128,
    sales_rate0: u128,
    sales_rate1: u128,
    delta_blocks: u64,
) -> MathResult<SegmentOutcome> {
    if sales_rate0 == 0 || sales_rate1 == 0 {
        // Callers route zero-rate directions to the one-sided cases; a
        // zero here means the segmentation logic picked the wrong solver.
        return Err(MathError::SqrtDomain);
    }
    if delta_blocks == 0 {
        return Ok(SegmentOutcome {
            reserve0,
            reserve1,
            proceeds0: 0,
            proceeds1: 0,
        });
    }

    let r0 = reserve0 as f64;
    let r1 = reserve1 as f64;
    let s0 = sales_rate0 as f64;
    let s1 = sales_rate1 as f64;
    let db = delta_blocks as f64;

    let k = r0 * r1;
    if !(k.is_finite()) || k <= 0.0 {
        return Err(MathError::SqrtDomain);
    }

    let sqrt_s0r1 = (s0 * r1).sqrt();
    let sqrt_s1r0 = (s1 * r0).sqrt();
    let c = sqrt_s0r1 - sqrt_s1r0;
    let d = sqrt_s0r1 + sqrt_s1r0;
    let sqrt_k = k.sqrt();
    let exponent = 2.0 * db * (s0 * s1).sqrt() / sqrt_k;
    let e = exponent.exp();
    let ed = e * d;

    if !(ed - c).is_finite() || !(ed + c).is_finite() || (ed - c).abs() < f64::EPSILON {
        return Err(MathError::SqrtDomain);
    }

    let reserve0_new_f = (k * s0 / s1).sqrt() * (ed + c) / (ed - c);
    let reserve1_new_f = (k * s1 / s0).sqrt() * (ed - c) / (ed + c);

    if !reserve0_new_f.is_finite() || !reserve1_new_f.is_finite()
        || reserve0_new_f < 0.0
        || reserve1_new_f < 0.0
    {
        return Err(MathError::SqrtDomain);
    }

    let gross0 = s0 * db;
    let gross1 = s1 * db;
    let proceeds0_f = (r0 + gross0 - reserve0_new_f).max(0.0);
    let proceeds1_f = (r1 + gross1 - reserve1_new_f).max(0.0);

    Ok(SegmentOutcome {
        reserve0: floor_to_u128(reserve0_new_f)?,
        reserve1: floor_to_u128(reserve1_new_f)?,
        proceeds0: floor_to_u128(proceeds0_f)?,
        proceeds1: floor_to_u128(proceeds1_f)?,
    })
}

fn floor_to_u128(value: f64) -> MathResult<u128> {
    if !value.is_finite() || value < 0.0 || value > u128::MAX as f64 {
        return Err(MathError::Overflow);
    }
    Ok(value.floor() as u128)
}
