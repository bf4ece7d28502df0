use bondfi_types::{AccountId, Amount, PositionId, TopicId};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("unknown topic: {0}")]
    UnknownTopic(TopicId),

    #[error("topic already exists: {0}")]
    TopicAlreadyExists(TopicId),

    #[error("insufficient {topic} balance for {holder}: needed {needed}, available {available}")]
    InsufficientBalance {
        topic: TopicId,
        holder: AccountId,
        needed: Amount,
        available: Amount,
    },

    #[error("insufficient {topic} supply: needed {needed}, available {available}")]
    InsufficientSupply {
        topic: TopicId,
        needed: Amount,
        available: Amount,
    },

    #[error("position {0} does not exist")]
    PositionNotFound(PositionId),

    #[error("position amount must be positive")]
    EmptyPosition,

    #[error("ledger arithmetic overflow")]
    Overflow,
}

pub type Result<T> = std::result::Result<T, LedgerError>;
