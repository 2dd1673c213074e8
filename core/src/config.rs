//! Pool configuration (`spec.md` §3, §4.8/C8).

use crate::error::{PoolError, PoolResult};

/// Denominator for all basis-point fee fields (1e-4 units, `spec.md` §6).
pub const BPS_DENOMINATOR: u16 = 10_000;

/// The pricing curve family a pool implements. `spec.md` describes only a
/// constant-product reserve; `Stable` is recorded here because the wider
/// Feels-protocol family of pools this core descends from distinguishes
/// pool types, but this core implements only `ConstantProduct` and rejects
/// anything else at construction time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolType {
    ConstantProduct,
    Stable,
}

/// Immutable per-pool configuration (`spec.md` §3 "config", §6 getters).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolConfig {
    /// Order Block Interval: blocks per checkpoint/expiry granularity.
    pub obi: u64,
    /// Maximum number of OBIs a single long-term order may span.
    pub max_order_intervals: u32,
    /// Short-term swap fee, in basis points (1e-4).
    pub short_term_fee_bps: u16,
    /// Partner fee, in basis points (1e-4).
    pub partner_fee_bps: u16,
    /// Long-term order fee, in basis points (1e-4).
    pub long_term_fee_bps: u16,
    pub pool_type: PoolType,
    /// Token0 decimals, used to derive `SCALE_0` for the proceeds log.
    pub decimals0: u8,
    /// Token1 decimals, used to derive `SCALE_1` for the proceeds log.
    pub decimals1: u8,
}

impl PoolConfig {
    /// Construct a validated configuration. Mirrors the constructor-time
    /// validation convention the rest of this codebase uses for its own
    /// pool parameters rather than trusting the host to pass sane values.
    pub fn new(
        obi: u64,
        max_order_intervals: u32,
        short_term_fee_bps: u16,
        partner_fee_bps: u16,
        long_term_fee_bps: u16,
        pool_type: PoolType,
        decimals0: u8,
        decimals1: u8,
    ) -> PoolResult<Self> {
        if obi == 0 {
            return Err(PoolError::InvalidConfig("obi must be nonzero"));
        }
        if max_order_intervals == 0 {
            return Err(PoolError::InvalidConfig(
                "max_order_intervals must be nonzero",
            ));
        }
        if short_term_fee_bps > BPS_DENOMINATOR
            || partner_fee_bps > BPS_DENOMINATOR
            || long_term_fee_bps > BPS_DENOMINATOR
        {
            return Err(PoolError::InvalidConfig("fee points must be <= 10_000"));
        }
        if !matches!(pool_type, PoolType::ConstantProduct) {
            return Err(PoolError::UnsupportedPoolType);
        }
        Ok(Self {
            obi,
            max_order_intervals,
            short_term_fee_bps,
            partner_fee_bps,
            long_term_fee_bps,
            pool_type,
            decimals0,
            decimals1,
        })
    }

    pub fn scale0(&self) -> u128 {
        twamm_math::scale_for_decimals(self.decimals0)
    }

    pub fn scale1(&self) -> u128 {
        twamm_math::scale_for_decimals(self.decimals1)
    }

    pub fn scale(&self, direction: crate::direction::Direction) -> u128 {
        match direction {
            crate::direction::Direction::Token0 => self.scale0(),
            crate::direction::Direction::Token1 => self.scale1(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_obi() {
        assert_eq!(
            PoolConfig::new(0, 10, 0, 0, 0, PoolType::ConstantProduct, 18, 18).unwrap_err(),
            PoolError::InvalidConfig("obi must be nonzero")
        );
    }

    #[test]
    fn rejects_excessive_fees() {
        assert_eq!(
            PoolConfig::new(7200, 10, 10_001, 0, 0, PoolType::ConstantProduct, 18, 18)
                .unwrap_err(),
            PoolError::InvalidConfig("fee points must be <= 10_000")
        );
    }

    #[test]
    fn rejects_unsupported_pool_type() {
        assert_eq!(
            PoolConfig::new(7200, 10, 0, 0, 0, PoolType::Stable, 18, 18).unwrap_err(),
            PoolError::UnsupportedPoolType
        );
    }

    #[test]
    fn accepts_valid_config() {
        let config =
            PoolConfig::new(7200, 500, 30, 10, 0, PoolType::ConstantProduct, 18, 18).unwrap();
        assert_eq!(config.scale0(), 10u128.pow(19));
    }
}
