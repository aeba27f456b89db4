//! Reentrancy protection for the factory and the settlement engine.
//! Each instance owns its own status flag; a second entry while the flag is
//! set is rejected before any state is touched.

use crate::errors::{CoreResult, MemeCoreError};
use anchor_lang::prelude::*;

// ============================================================================
// Reentrancy Status Types
// ============================================================================

/// Reentrancy guard status flags
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, AnchorSerialize, AnchorDeserialize)]
pub enum ReentrancyStatus {
    /// Ready for a new entry point
    #[default]
    Unlocked,
    /// An entry point is running
    Locked,
    /// The domain launch-campaign hook is running
    HookExecuting,
}

// ============================================================================
// Reentrancy Guard Manager
// ============================================================================

/// Reentrancy guard manager
pub struct ReentrancyGuard;

impl ReentrancyGuard {
    /// Acquire the lock for an entry point
    pub fn acquire(status: &mut ReentrancyStatus) -> CoreResult<()> {
        match *status {
            ReentrancyStatus::Unlocked => {
                *status = ReentrancyStatus::Locked;
                Ok(())
            }
            _ => Err(MemeCoreError::ReentrancyDetected),
        }
    }

    /// Move a held lock into the hook phase
    pub fn acquire_for_hooks(status: &mut ReentrancyStatus) -> CoreResult<()> {
        match *status {
            ReentrancyStatus::Locked => {
                *status = ReentrancyStatus::HookExecuting;
                Ok(())
            }
            _ => Err(MemeCoreError::ReentrancyDetected),
        }
    }

    /// Return from the hook phase to the plain lock
    pub fn exit_hooks(status: &mut ReentrancyStatus) {
        if *status == ReentrancyStatus::HookExecuting {
            *status = ReentrancyStatus::Locked;
        }
    }

    /// Release the lock after the entry point completes, on success or failure
    pub fn release(status: &mut ReentrancyStatus) {
        if *status == ReentrancyStatus::Unlocked {
            log::warn!("Releasing an already unlocked reentrancy guard");
        }
        *status = ReentrancyStatus::Unlocked;
    }

    /// Check if an entry point is currently running
    pub fn is_locked(status: &ReentrancyStatus) -> bool {
        *status != ReentrancyStatus::Unlocked
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reentrancy_guard_lifecycle() {
        let mut status = ReentrancyStatus::Unlocked;

        assert!(ReentrancyGuard::acquire(&mut status).is_ok());
        assert_eq!(status, ReentrancyStatus::Locked);

        // Second entry is rejected
        assert_eq!(
            ReentrancyGuard::acquire(&mut status),
            Err(MemeCoreError::ReentrancyDetected)
        );

        assert!(ReentrancyGuard::acquire_for_hooks(&mut status).is_ok());
        assert_eq!(status, ReentrancyStatus::HookExecuting);
        assert!(ReentrancyGuard::acquire(&mut status).is_err());

        ReentrancyGuard::exit_hooks(&mut status);
        assert_eq!(status, ReentrancyStatus::Locked);

        ReentrancyGuard::release(&mut status);
        assert!(!ReentrancyGuard::is_locked(&status));
    }

    #[test]
    fn test_hooks_require_lock() {
        let mut status = ReentrancyStatus::Unlocked;
        assert!(ReentrancyGuard::acquire_for_hooks(&mut status).is_err());
        assert_eq!(status, ReentrancyStatus::Unlocked);
    }
}
