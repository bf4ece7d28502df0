//! Fee waterfall for Bondfi topic markets
//!
//! Every buy, sell and mortgage payout splits its curve amount among up to
//! three kinds of recipient:
//! - the platform (mortgage only)
//! - the app owner
//! - the topic's NFT owners, sharing one NFT pool by their percentages
//!
//! Each cut is `⌊curve_amount * bps / 100_000⌋`, computed independently from
//! the curve amount. NFT owners are paid in two stages: the pool
//! `⌊curve_amount * nft_bps / 100_000⌋`, then `⌊pool * percent / 100_000⌋`
//! per owner. Recipients are always ordered platform, app owner, NFT owners in
//! list order. Remainders of either stage are never collected: a buyer is not
//! charged them, and a seller or borrower keeps them.
//!
//! Cuts that round to zero are dropped, so no zero-value transfer is ever
//! attempted.

use bondfi_types::{apply_bps, AccountId, Amount, FeeRates, NftOwnerSplit};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

// =============================================================================
// ERRORS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeeError {
    #[error("fee arithmetic overflow")]
    Overflow,

    #[error("fees {fees} exceed curve amount {amount}")]
    FeesExceedAmount { amount: Amount, fees: Amount },
}

pub type Result<T> = std::result::Result<T, FeeError>;

// =============================================================================
// OPERATIONS AND ROLES
// =============================================================================

/// Market operation a fee is charged on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeeOperation {
    Buy,
    Sell,
    Mortgage,
}

/// Which side of the curve amount fees land on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeeDirection {
    /// Added on top of the curve amount (the payer settles more)
    OnTop,
    /// Deducted from the curve amount (the receiver gets less)
    Deducted,
}

impl FeeOperation {
    pub fn direction(self) -> FeeDirection {
        match self {
            FeeOperation::Buy => FeeDirection::OnTop,
            FeeOperation::Sell | FeeOperation::Mortgage => FeeDirection::Deducted,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeeRole {
    Platform,
    AppOwner,
    NftOwner,
}

/// One recipient's rate on a curve amount
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeShare {
    pub recipient: AccountId,
    pub role: FeeRole,
    pub bps: u32,
}

/// One recipient's cut of a concrete curve amount
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeCut {
    pub recipient: AccountId,
    pub role: FeeRole,
    pub amount: Amount,
}

// =============================================================================
// WATERFALL
// =============================================================================

/// Pure split of an amount over an ordered list of shares.
pub struct FeeWaterfall;

impl FeeWaterfall {
    /// Cut `amount` for each share in order. Zero cuts are skipped.
    pub fn apply(amount: Amount, shares: &[FeeShare]) -> Result<Vec<FeeCut>> {
        let mut cuts = Vec::with_capacity(shares.len());
        for share in shares {
            if share.bps == 0 {
                continue;
            }
            let cut = apply_bps(amount, share.bps).ok_or(FeeError::Overflow)?;
            if cut == 0 {
                continue;
            }
            cuts.push(FeeCut {
                recipient: share.recipient,
                role: share.role,
                amount: cut,
            });
        }
        Ok(cuts)
    }
}

/// Fees charged on one curve amount
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeBreakdown {
    pub operation: FeeOperation,
    pub curve_amount: Amount,
    pub cuts: Vec<FeeCut>,
}

impl FeeBreakdown {
    pub fn total_fees(&self) -> Amount {
        self.cuts.iter().map(|c| c.amount).sum()
    }

    /// What the user settles: curve amount plus fees on a buy, curve amount
    /// minus fees on a sell or mortgage payout.
    pub fn settled_amount(&self) -> Result<Amount> {
        let fees = self.total_fees();
        match self.operation.direction() {
            FeeDirection::OnTop => self
                .curve_amount
                .checked_add(fees)
                .ok_or(FeeError::Overflow),
            FeeDirection::Deducted => {
                self.curve_amount
                    .checked_sub(fees)
                    .ok_or(FeeError::FeesExceedAmount {
                        amount: self.curve_amount,
                        fees,
                    })
            }
        }
    }

    pub fn total_for_role(&self, role: FeeRole) -> Amount {
        self.cuts
            .iter()
            .filter(|c| c.role == role)
            .map(|c| c.amount)
            .sum()
    }

    pub fn paid_to(&self, recipient: &AccountId) -> Amount {
        self.cuts
            .iter()
            .filter(|c| &c.recipient == recipient)
            .map(|c| c.amount)
            .sum()
    }
}

// =============================================================================
// SCHEDULE
// =============================================================================

/// Fee recipients and rates for one operation on one topic.
#[derive(Debug, Clone)]
pub struct FeeSchedule {
    operation: FeeOperation,
    direct: Vec<FeeShare>,
    nft_bps: u32,
    nft_split: NftOwnerSplit,
}

impl FeeSchedule {
    pub fn new(
        operation: FeeOperation,
        rates: &FeeRates,
        app_owner: AccountId,
        platform: AccountId,
        nft_split: &NftOwnerSplit,
    ) -> Self {
        let (platform_bps, app_owner_bps, nft_bps) = match operation {
            FeeOperation::Buy => (0, rates.buy_app_owner_bps, rates.buy_nft_bps),
            FeeOperation::Sell => (0, rates.sell_app_owner_bps, rates.sell_nft_bps),
            FeeOperation::Mortgage => (
                rates.mortgage_platform_bps,
                rates.mortgage_app_owner_bps,
                rates.mortgage_nft_bps,
            ),
        };

        let direct = vec![
            FeeShare {
                recipient: platform,
                role: FeeRole::Platform,
                bps: platform_bps,
            },
            FeeShare {
                recipient: app_owner,
                role: FeeRole::AppOwner,
                bps: app_owner_bps,
            },
        ];

        Self {
            operation,
            direct,
            nft_bps,
            nft_split: nft_split.clone(),
        }
    }

    pub fn operation(&self) -> FeeOperation {
        self.operation
    }

    /// Split `curve_amount` into platform, app owner and NFT owner cuts.
    pub fn breakdown(&self, curve_amount: Amount) -> Result<FeeBreakdown> {
        let mut cuts = FeeWaterfall::apply(curve_amount, &self.direct)?;

        if self.nft_bps > 0 {
            let pool = apply_bps(curve_amount, self.nft_bps).ok_or(FeeError::Overflow)?;
            let (owner_cuts, remainder) = self.nft_split.split_pool(pool);
            cuts.extend(
                owner_cuts
                    .into_iter()
                    .filter(|(_, amount)| *amount > 0)
                    .map(|(recipient, amount)| FeeCut {
                        recipient,
                        role: FeeRole::NftOwner,
                        amount,
                    }),
            );
            if remainder > 0 {
                debug!(
                    target: "fees",
                    "NFT pool remainder of {} left with the paying side",
                    remainder
                );
            }
        }

        let breakdown = FeeBreakdown {
            operation: self.operation,
            curve_amount,
            cuts,
        };

        debug!(
            target: "fees",
            "{:?} fees on {}: {} across {} recipients",
            self.operation,
            curve_amount,
            breakdown.total_fees(),
            breakdown.cuts.len()
        );

        Ok(breakdown)
    }
}

// -----------------------------------------------------------------------------
// ✅ Unit Tests
// -----------------------------------------------------------------------------
#[cfg(test)]
mod tests {
    use super::*;

    fn account(label: &str) -> AccountId {
        AccountId::from_label(label)
    }

    #[test]
    fn test_waterfall_floors_each_cut() {
        let shares = [
            FeeShare {
                recipient: account("a"),
                role: FeeRole::AppOwner,
                bps: 1_000,
            },
            FeeShare {
                recipient: account("b"),
                role: FeeRole::Platform,
                bps: 333,
            },
        ];
        let cuts = FeeWaterfall::apply(123_456, &shares).unwrap();
        assert_eq!(cuts[0].amount, 1_234);
        assert_eq!(cuts[1].amount, 411);
    }

    #[test]
    fn test_zero_bps_is_a_no_op() {
        let shares = [FeeShare {
            recipient: account("a"),
            role: FeeRole::AppOwner,
            bps: 0,
        }];
        assert!(FeeWaterfall::apply(1_000_000, &shares).unwrap().is_empty());
    }

    #[test]
    fn test_cut_rounding_to_zero_is_dropped() {
        let shares = [FeeShare {
            recipient: account("a"),
            role: FeeRole::AppOwner,
            bps: 1,
        }];
        assert!(FeeWaterfall::apply(99_999, &shares).unwrap().is_empty());
        assert_eq!(FeeWaterfall::apply(100_000, &shares).unwrap()[0].amount, 1);
    }

    #[test]
    fn test_buy_schedule_adds_fees_on_top() {
        let rates = FeeRates::default();
        let nft = NftOwnerSplit::single(account("nft"));
        let schedule = FeeSchedule::new(
            FeeOperation::Buy,
            &rates,
            account("owner"),
            account("platform"),
            &nft,
        );

        let breakdown = schedule.breakdown(1_000_000).unwrap();
        assert_eq!(breakdown.total_for_role(FeeRole::Platform), 0);
        assert_eq!(breakdown.total_for_role(FeeRole::AppOwner), 5_000);
        assert_eq!(breakdown.total_for_role(FeeRole::NftOwner), 10_000);
        assert_eq!(breakdown.settled_amount().unwrap(), 1_015_000);
    }

    #[test]
    fn test_mortgage_schedule_orders_platform_first() {
        let rates = FeeRates::default();
        let nft = NftOwnerSplit::new(vec![(account("n1"), 95_000), (account("n2"), 5_000)])
            .unwrap();
        let schedule = FeeSchedule::new(
            FeeOperation::Mortgage,
            &rates,
            account("owner"),
            account("platform"),
            &nft,
        );

        let breakdown = schedule.breakdown(1_000_000).unwrap();
        let roles: Vec<FeeRole> = breakdown.cuts.iter().map(|c| c.role).collect();
        assert_eq!(
            roles,
            vec![
                FeeRole::Platform,
                FeeRole::AppOwner,
                FeeRole::NftOwner,
                FeeRole::NftOwner
            ]
        );
        assert_eq!(breakdown.paid_to(&account("platform")), 2_000);
        assert_eq!(breakdown.paid_to(&account("n1")), 9_500);
        assert_eq!(breakdown.paid_to(&account("n2")), 500);
        assert_eq!(breakdown.settled_amount().unwrap(), 1_000_000 - 17_000);
    }

    #[test]
    fn test_sell_remainder_stays_with_seller() {
        let mut rates = FeeRates::zero();
        rates.sell_nft_bps = 1_000;
        let nft = NftOwnerSplit::new(vec![(account("n1"), 50_000), (account("n2"), 50_000)])
            .unwrap();
        let schedule = FeeSchedule::new(
            FeeOperation::Sell,
            &rates,
            account("owner"),
            account("platform"),
            &nft,
        );

        // pool = 31, each owner gets 15, one unit not deducted
        let breakdown = schedule.breakdown(3_100).unwrap();
        assert_eq!(breakdown.paid_to(&account("n1")), 15);
        assert_eq!(breakdown.paid_to(&account("n2")), 15);
        assert_eq!(breakdown.total_fees(), 30);
        assert_eq!(breakdown.settled_amount().unwrap(), 3_070);
    }

    #[test]
    fn test_deducted_fees_cannot_exceed_amount() {
        let breakdown = FeeBreakdown {
            operation: FeeOperation::Sell,
            curve_amount: 10,
            cuts: vec![FeeCut {
                recipient: account("a"),
                role: FeeRole::AppOwner,
                amount: 11,
            }],
        };
        assert_eq!(
            breakdown.settled_amount(),
            Err(FeeError::FeesExceedAmount { amount: 10, fees: 11 })
        );
    }
}
