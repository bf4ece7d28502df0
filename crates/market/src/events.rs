//! Typed record of committed market operations.
//!
//! Events are appended inside the same working copy as the state change, so a
//! rolled-back call leaves no trace. The host collects them with
//! `Market::drain_events`.

use bondfi_fees::{FeeOperation, FeeRole};
use bondfi_types::{AccountId, Amount, PositionId, TopicId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketEvent {
    TopicCreated {
        topic: TopicId,
    },
    Bought {
        topic: TopicId,
        buyer: AccountId,
        amount: Amount,
        cost: Amount,
        paid: Amount,
    },
    Sold {
        topic: TopicId,
        seller: AccountId,
        amount: Amount,
        refund: Amount,
        received: Amount,
    },
    MortgageOpened {
        position_id: PositionId,
        owner: AccountId,
        topic: TopicId,
        amount: Amount,
        payout: Amount,
    },
    MortgageIncreased {
        position_id: PositionId,
        owner: AccountId,
        topic: TopicId,
        added: Amount,
        new_amount: Amount,
        payout: Amount,
    },
    Redeemed {
        position_id: PositionId,
        owner: AccountId,
        topic: TopicId,
        amount: Amount,
        paid: Amount,
        closed: bool,
    },
    PositionSplit {
        source_id: PositionId,
        new_id: PositionId,
        owner: AccountId,
        topic: TopicId,
        amount: Amount,
        cost: Amount,
    },
    TokensTransferred {
        topic: TopicId,
        from: AccountId,
        to: AccountId,
        amount: Amount,
    },
    PositionTransferred {
        position_id: PositionId,
        from: AccountId,
        to: AccountId,
    },
    FeePaid {
        topic: TopicId,
        operation: FeeOperation,
        recipient: AccountId,
        role: FeeRole,
        amount: Amount,
    },
    Refunded {
        account: AccountId,
        amount: Amount,
    },
}

impl MarketEvent {
    /// Topic the event belongs to, if any.
    pub fn topic(&self) -> Option<&TopicId> {
        match self {
            MarketEvent::TopicCreated { topic }
            | MarketEvent::Bought { topic, .. }
            | MarketEvent::Sold { topic, .. }
            | MarketEvent::MortgageOpened { topic, .. }
            | MarketEvent::MortgageIncreased { topic, .. }
            | MarketEvent::Redeemed { topic, .. }
            | MarketEvent::PositionSplit { topic, .. }
            | MarketEvent::TokensTransferred { topic, .. }
            | MarketEvent::FeePaid { topic, .. } => Some(topic),
            MarketEvent::PositionTransferred { .. } | MarketEvent::Refunded { .. } => None,
        }
    }
}
