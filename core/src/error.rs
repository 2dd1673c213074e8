//! # Pool Error Types
//!
//! The failure taxonomy from `spec.md` §7. Every mutating entry point
//! returns `Result<_, PoolError>`; a failure leaves pool state untouched —
//! no entry point partially applies a mutation before returning `Err`.

use thiserror::Error;
use twamm_math::MathError;

/// What lifecycle state an operation expected the order to be in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleExpectation {
    /// Operation needs the order unpaused (e.g. `pause`, `withdraw` proceeds).
    ExpectedUnpaused,
    /// Operation needs the order paused (e.g. `resume`).
    ExpectedPaused,
    /// Operation needs the order not yet expired.
    ExpectedNotExpired,
}

/// Core protocol errors (`spec.md` §7).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    #[error("order length exceeds the pool's maximum order intervals")]
    OrderTooLong,

    #[error("order id not found in the registry")]
    OrderNotFound,

    #[error("caller is neither the order's owner nor its delegate")]
    NotAuthorized,

    #[error("order is in the wrong lifecycle state: {0:?}")]
    WrongLifecycleState(LifecycleExpectation),

    #[error("host did not supply enough capital for this operation")]
    InsufficientCapital,

    #[error("math domain error: {0}")]
    MathDomain(MathError),

    #[error("arithmetic overflow")]
    MathOverflow,

    #[error("arithmetic underflow")]
    MathUnderflow,

    #[error("reentrant call into the pool core")]
    Reentrancy,

    #[error("swap deadline has passed")]
    DeadlineExceeded,

    #[error("swap output below the caller's minimum")]
    SlippageExceeded,

    #[error("pool type is not implemented by this core")]
    UnsupportedPoolType,

    #[error("invalid pool configuration: {0}")]
    InvalidConfig(&'static str),
}

pub type PoolResult<T> = Result<T, PoolError>;

impl From<MathError> for PoolError {
    fn from(err: MathError) -> Self {
        match err {
            MathError::Overflow | MathError::MulDivOverflow => PoolError::MathOverflow,
            MathError::Underflow => PoolError::MathUnderflow,
            MathError::DivisionByZero | MathError::SqrtDomain => PoolError::MathDomain(err),
        }
    }
}
