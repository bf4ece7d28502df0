use bondfi_curve::CurveError;
use bondfi_fees::FeeError;
use bondfi_ledger::LedgerError;
use bondfi_payments::PaymentError;
use bondfi_types::{AccountId, Amount, AppConfigError, AppId, NftSplitError, PositionId, TopicId};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MarketError {
    #[error("unknown topic: {0}")]
    UnknownTopic(TopicId),

    #[error("topic already registered: {0}")]
    TopicAlreadyExists(TopicId),

    #[error("app {0} is not registered")]
    AppNotFound(AppId),

    #[error("app {0} is already registered")]
    AppAlreadyRegistered(AppId),

    #[error("{field} of app {app_id} cannot change after registration")]
    ImmutableAppField { app_id: AppId, field: &'static str },

    #[error("amount must be positive")]
    ZeroAmount,

    #[error("insufficient {topic} balance: needed {needed}, available {available}")]
    InsufficientBalance {
        topic: TopicId,
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

    #[error("{caller} does not own position {id}")]
    NotPositionOwner { id: PositionId, caller: AccountId },

    #[error("split amount {amount} must be positive and below position amount {position_amount}")]
    InvalidSplitAmount {
        amount: Amount,
        position_amount: Amount,
    },

    #[error("redeem amount {amount} exceeds position amount {position_amount}")]
    RedeemExceedsPosition {
        amount: Amount,
        position_amount: Amount,
    },

    #[error("invalid recipient {0}")]
    InvalidRecipient(AccountId),

    #[error("invalid app configuration: {0}")]
    InvalidConfig(#[from] AppConfigError),

    #[error("invalid NFT owner split: {0}")]
    InvalidNftSplit(#[from] NftSplitError),

    #[error("curve fault: {0}")]
    Curve(#[from] CurveError),

    #[error("fee fault: {0}")]
    Fee(#[from] FeeError),

    #[error("payment fault: {0}")]
    Payment(#[from] PaymentError),

    #[error("ledger fault: {0}")]
    Ledger(#[from] LedgerError),
}

pub type Result<T> = std::result::Result<T, MarketError>;
