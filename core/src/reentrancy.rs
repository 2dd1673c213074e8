//! Reentrancy latch (`spec.md` §5: "the core must gate entry with a
//! reentrancy latch and fail reentrant calls").
//!
//! Every public mutating `Pool` method acquires a [`ScopedReentrancyGuard`]
//! before doing anything else; the guard releases on drop, including when
//! a `?` unwinds the call early, so a failed operation never leaves the
//! pool permanently locked.

use crate::error::PoolError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReentrancyStatus {
    #[default]
    Unlocked,
    Locked,
}

pub struct ReentrancyGuard;

impl ReentrancyGuard {
    pub fn acquire(status: &mut ReentrancyStatus) -> Result<(), PoolError> {
        match *status {
            ReentrancyStatus::Unlocked => {
                *status = ReentrancyStatus::Locked;
                Ok(())
            }
            ReentrancyStatus::Locked => Err(PoolError::Reentrancy),
        }
    }

    pub fn release(status: &mut ReentrancyStatus) {
        *status = ReentrancyStatus::Unlocked;
    }

    pub fn is_locked(status: &ReentrancyStatus) -> bool {
        *status == ReentrancyStatus::Locked
    }
}

/// RAII guard that releases the latch on drop.
pub struct ScopedReentrancyGuard<'a> {
    status: &'a mut ReentrancyStatus,
}

impl<'a> ScopedReentrancyGuard<'a> {
    pub fn new(status: &'a mut ReentrancyStatus) -> Result<Self, PoolError> {
        ReentrancyGuard::acquire(status)?;
        Ok(Self { status })
    }
}

impl<'a> Drop for ScopedReentrancyGuard<'a> {
    fn drop(&mut self) {
        ReentrancyGuard::release(self.status);
    }
}
