use bondfi_types::{AccountId, Amount};
use thiserror::Error;

/// Settlement faults. Surfaced unchanged by the market.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaymentError {
    #[error("insufficient value attached: needed {needed}, remaining {supplied}")]
    InsufficientValue { needed: Amount, supplied: Amount },

    #[error("insufficient allowance: needed {needed}, approved {allowance}")]
    InsufficientAllowance { needed: Amount, allowance: Amount },

    #[error("insufficient balance for {account}: needed {needed}, available {available}")]
    InsufficientBalance {
        account: AccountId,
        needed: Amount,
        available: Amount,
    },

    #[error("this payment rail does not accept attached value ({0})")]
    UnexpectedValue(Amount),

    #[error("payment arithmetic overflow")]
    Overflow,
}

pub type Result<T> = std::result::Result<T, PaymentError>;
