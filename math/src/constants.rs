//! Scale constants for the scaled-proceeds log (`spec.md` §3).

/// `SCALE_d = 10^(decimals_d + 1)`, used to scale per-block proceeds before
/// dividing by the opposing sales rate so the quotient keeps one extra
/// digit of precision beyond the token's own decimals.
pub fn scale_for_decimals(decimals: u8) -> u128 {
    10u128.pow(decimals as u32 + 1)
}
