//! Per-topic NFT owner split used for fee distribution.

use crate::ids::AccountId;
use crate::units::{apply_bps, Amount, BPS_DENOMINATOR};
use serde::{Deserialize, Serialize};

/// A single NFT owner and its share of the topic's NFT fee pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NftOwnerShare {
    pub owner: AccountId,
    /// Share out of 100,000
    pub percent_bps: u32,
}

/// Ordered list of NFT owners for a topic.
///
/// Never consulted for supply accounting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NftOwnerSplit {
    pub owners: Vec<NftOwnerShare>,
}

impl NftOwnerSplit {
    /// Maximum number of owners per topic
    pub const MAX_OWNERS: usize = 16;

    /// Single owner receiving the whole pool
    pub fn single(owner: AccountId) -> Self {
        Self {
            owners: vec![NftOwnerShare {
                owner,
                percent_bps: BPS_DENOMINATOR,
            }],
        }
    }

    pub fn new(owners: Vec<(AccountId, u32)>) -> Result<Self, NftSplitError> {
        let split = Self {
            owners: owners
                .into_iter()
                .map(|(owner, percent_bps)| NftOwnerShare { owner, percent_bps })
                .collect(),
        };
        split.validate()?;
        Ok(split)
    }

    pub fn validate(&self) -> Result<(), NftSplitError> {
        if self.owners.is_empty() {
            return Err(NftSplitError::NoOwners);
        }
        if self.owners.len() > Self::MAX_OWNERS {
            return Err(NftSplitError::TooManyOwners {
                count: self.owners.len(),
            });
        }

        let total: u64 = self.owners.iter().map(|o| o.percent_bps as u64).sum();
        if total != BPS_DENOMINATOR as u64 {
            return Err(NftSplitError::PercentagesSumInvalid { sum: total });
        }

        Ok(())
    }

    /// Split a pool among owners in list order.
    /// Returns (cuts, remainder) where remainder is due to integer division.
    pub fn split_pool(&self, pool: Amount) -> (Vec<(AccountId, Amount)>, Amount) {
        let mut cuts = Vec::with_capacity(self.owners.len());
        let mut distributed: Amount = 0;

        for share in &self.owners {
            let cut = apply_bps(pool, share.percent_bps).unwrap_or(0);
            cuts.push((share.owner, cut));
            distributed = distributed.saturating_add(cut);
        }

        (cuts, pool.saturating_sub(distributed))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NftSplitError {
    #[error("NFT owner split must have at least one owner")]
    NoOwners,

    #[error("Too many NFT owners: {count} > max {}", NftOwnerSplit::MAX_OWNERS)]
    TooManyOwners { count: usize },

    #[error("NFT owner percentages must sum to 100000, got {sum}")]
    PercentagesSumInvalid { sum: u64 },
}
