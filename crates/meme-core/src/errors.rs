//! # Core Error Types
//!
//! Every rejection the protocol can produce. Variants are grouped by the
//! taxonomy used for propagation: precondition violations, invariant
//! protection, external-dependency failures and transport failures.

use thiserror::Error;

/// Protocol errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MemeCoreError {
    // ========================================================================
    // Math Errors
    // ========================================================================
    #[error("Math overflow")]
    MathOverflow,

    #[error("Math underflow")]
    MathUnderflow,

    #[error("Division by zero")]
    DivisionByZero,

    // ========================================================================
    // Precondition Violations
    // ========================================================================
    #[error("Deposit {deposit} is below the minimum of {minimum}")]
    DepositBelowMinimum { deposit: u64, minimum: u64 },

    #[error("Total supply {0} is outside the supported range")]
    SupplyOutOfRange(u64),

    #[error("Invalid token name")]
    InvalidName,

    #[error("Invalid token symbol")]
    InvalidSymbol,

    #[error("Amount must be greater than zero")]
    ZeroAmount,

    #[error("Launch {0} does not exist")]
    LaunchNotFound(u64),

    #[error("Launch {0} is already unleashed")]
    AlreadyUnleashed(u64),

    #[error("Launch {launch_id} cannot be unleashed before {available_at}")]
    UnleashTooEarly { launch_id: u64, available_at: i64 },

    #[error("Launch {0} is not unleashed yet")]
    NotUnleashed(u64),

    #[error("Collect window of launch {0} is closed")]
    CollectWindowClosed(u64),

    #[error("Collect window of launch {0} is still open")]
    CollectWindowOpen(u64),

    #[error("Nothing to collect")]
    NothingToCollect,

    #[error("Allocation rounds down to zero")]
    ZeroAllocation,

    #[error("No launches given")]
    EmptyLaunchList,

    #[error("Nothing is scheduled for retirement")]
    NothingScheduled,

    #[error("Pending amount {pending} is below the bridging minimum of {minimum}")]
    BelowBridgeMinimum { pending: u64, minimum: u64 },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(&'static str),

    #[error("Insufficient balance")]
    InsufficientBalance,

    #[error("Insufficient allowance")]
    InsufficientAllowance,

    #[error("Rejected by the launch campaign: {0}")]
    CampaignRejected(&'static str),

    // ========================================================================
    // Invariant Protection
    // ========================================================================
    #[error("Reentrancy detected")]
    ReentrancyDetected,

    #[error("Nothing left to purge")]
    NothingToPurge,

    // ========================================================================
    // External Dependency Failures
    // ========================================================================
    #[error("Token does not exist")]
    TokenNotFound,

    #[error("Pool does not exist")]
    PoolNotFound,

    #[error("Position does not exist")]
    PositionNotFound,

    #[error("Token transfer rejected by the ledger")]
    TransferRejected,

    #[error("Insufficient observation history")]
    InsufficientObservationHistory,

    #[error("Price deviation too high")]
    PriceDeviationTooHigh,

    #[error("Oracle price validation failed before the swap")]
    PriceValidationBeforeSwap,

    #[error("Oracle price validation failed after the swap")]
    PriceValidationAfterSwap,

    #[error("Swap output {amount_out} is below the minimum of {minimum_out}")]
    SlippageExceeded { amount_out: u64, minimum_out: u64 },

    #[error("Insufficient liquidity")]
    InsufficientLiquidity,

    #[error("Invalid price")]
    InvalidPrice,

    #[error("Tick out of range")]
    TickOutOfRange,

    // ========================================================================
    // Transport Failures
    // ========================================================================
    #[error("Bridge rejected the transfer: {0}")]
    BridgeRejected(&'static str),

    #[error("Attached fee {attached} does not cover the bridge fee of {required}")]
    InsufficientBridgeFee { attached: u64, required: u64 },
}

/// Result type using core errors
pub type CoreResult<T> = Result<T, MemeCoreError>;

/// Taxonomy bucket of an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Math,
    Precondition,
    Invariant,
    External,
    Transport,
}

impl MemeCoreError {
    /// Classify the error for diagnostics
    pub fn category(&self) -> ErrorCategory {
        use MemeCoreError::*;
        match self {
            MathOverflow | MathUnderflow | DivisionByZero => ErrorCategory::Math,
            ReentrancyDetected | NothingToPurge | AlreadyUnleashed(_) => {
                ErrorCategory::Invariant
            }
            TokenNotFound
            | PoolNotFound
            | PositionNotFound
            | TransferRejected
            | InsufficientObservationHistory
            | PriceDeviationTooHigh
            | PriceValidationBeforeSwap
            | PriceValidationAfterSwap
            | SlippageExceeded { .. }
            | InsufficientLiquidity
            | InvalidPrice
            | TickOutOfRange => ErrorCategory::External,
            BridgeRejected(_) | InsufficientBridgeFee { .. } => ErrorCategory::Transport,
            _ => ErrorCategory::Precondition,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MemeCoreError::DepositBelowMinimum { deposit: 5, minimum: 10 };
        assert_eq!(format!("{}", err), "Deposit 5 is below the minimum of 10");

        let err = MemeCoreError::UnleashTooEarly { launch_id: 3, available_at: 86_400 };
        assert!(format!("{}", err).contains("86400"));
    }

    #[test]
    fn test_error_categories() {
        assert_eq!(MemeCoreError::ReentrancyDetected.category(), ErrorCategory::Invariant);
        assert_eq!(MemeCoreError::NothingToPurge.category(), ErrorCategory::Invariant);
        assert_eq!(MemeCoreError::AlreadyUnleashed(1).category(), ErrorCategory::Invariant);
        assert_eq!(MemeCoreError::ZeroAllocation.category(), ErrorCategory::Precondition);
        assert_eq!(
            MemeCoreError::InsufficientObservationHistory.category(),
            ErrorCategory::External
        );
        assert_eq!(
            MemeCoreError::BridgeRejected("paused").category(),
            ErrorCategory::Transport
        );
    }
}
