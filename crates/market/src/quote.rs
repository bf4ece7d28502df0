//! Quotes and receipts returned by market operations.

use crate::errors::*;
use bondfi_fees::{FeeBreakdown, FeeCut};
use bondfi_types::{Amount, PositionId, TopicId};
use serde::{Deserialize, Serialize};

/// Priced operation: the curve amount, the fee cuts taken on it, and what
/// the caller settles.
///
/// `settled` is paid by the caller on buy, redeem and split, and received by
/// the caller on sell and mortgage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub curve_amount: Amount,
    pub fees: Vec<FeeCut>,
    pub total_fees: Amount,
    pub settled: Amount,
}

impl Quote {
    pub(crate) fn from_breakdown(breakdown: FeeBreakdown) -> Result<Self> {
        let settled = breakdown.settled_amount()?;
        Ok(Self {
            curve_amount: breakdown.curve_amount,
            total_fees: breakdown.total_fees(),
            fees: breakdown.cuts,
            settled,
        })
    }

    pub(crate) fn without_fees(curve_amount: Amount) -> Self {
        Self {
            curve_amount,
            fees: Vec::new(),
            total_fees: 0,
            settled: curve_amount,
        }
    }
}

/// Outcome of opening or adding to a mortgage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MortgageReceipt {
    pub position_id: PositionId,
    pub topic: TopicId,
    /// Tokens locked by this call
    pub added: Amount,
    /// Position amount after the call
    pub position_amount: Amount,
    pub quote: Quote,
}

impl MortgageReceipt {
    /// Pay amount sent to the borrower.
    pub fn payout(&self) -> Amount {
        self.quote.settled
    }
}

/// Outcome of splitting a position
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitReceipt {
    pub source_id: PositionId,
    pub new_id: PositionId,
    /// Amount left in the source position
    pub remaining: Amount,
    /// Amount moved into the new position
    pub amount: Amount,
    pub cost: Amount,
}
