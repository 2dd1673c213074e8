//! `(a * b) / denominator` with an explicit, directional rounding mode.
//!
//! Token accounting only ever rounds down (§4.1 of the pool spec: floor is
//! the sole rounding rule the core applies, so debts to users never exceed
//! what the reserve actually holds). [`Rounding::Up`] is kept alongside it
//! because the underlying wide-integer division naturally produces both and
//! a one-sided primitive would be a strange thing to ship, but no call site
//! in `twamm-core` reaches for it — see `DESIGN.md`.

use crate::error::{MathError, MathResult};
use crate::wide::Wide256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rounding {
    Down,
    Up,
}

/// `(a * b) / denominator`, rounded per `rounding`. Fails with
/// [`MathError::DivisionByZero`] if `denominator == 0` and
/// [`MathError::MulDivOverflow`] if the quotient does not fit in `u128`.
pub fn mul_div(a: u128, b: u128, denominator: u128, rounding: Rounding) -> MathResult<u128> {
    if denominator == 0 {
        return Err(MathError::DivisionByZero);
    }
    let product = Wide256::from_u128(a).full_mul(&Wide256::from_u128(b));
    let (quotient, remainder) = product.div_rem(&Wide256::from_u128(denominator))?;
    let mut quotient = quotient.to_wide256().ok_or(MathError::MulDivOverflow)?;
    if rounding == Rounding::Up && !remainder.is_zero() {
        quotient = quotient
            .checked_add(&Wide256::ONE)
            .ok_or(MathError::MulDivOverflow)?;
    }
    quotient.to_u128().ok_or(MathError::MulDivOverflow)
}

/// Floor variant of [`mul_div`] — the only rounding direction the pool core
/// uses for proceeds, refunds, and deposit accounting.
pub fn mul_div_floor(a: u128, b: u128, denominator: u128) -> MathResult<u128> {
    mul_div(a, b, denominator, Rounding::Down)
}

/// Ceiling variant of [`mul_div`], kept for API parity and tested below;
/// `twamm-core` never calls it.
pub fn mul_div_ceil(a: u128, b: u128, denominator: u128) -> MathResult<u128> {
    mul_div(a, b, denominator, Rounding::Up)
}
