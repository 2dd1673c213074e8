//! Error taxonomy for wide-integer and fixed-point operations.

use thiserror::Error;

/// Failure kinds produced by this crate's arithmetic.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MathError {
    #[error("arithmetic overflow")]
    Overflow,

    #[error("arithmetic underflow")]
    Underflow,

    #[error("division by zero")]
    DivisionByZero,

    #[error("mul-div result does not fit the target width")]
    MulDivOverflow,

    #[error("square root input or result out of range")]
    SqrtDomain,
}

pub type MathResult<T> = Result<T, MathError>;
