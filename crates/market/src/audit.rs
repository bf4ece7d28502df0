//! Supply audits and state export.

use bondfi_ledger::Position;
use bondfi_types::{AccountId, Amount, AppId, TopicId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditViolation {
    /// Σ balances differs from total supply
    SupplyMismatch {
        total_supply: Amount,
        holders_total: Amount,
    },
    /// Positions claim more collateral than the market holds
    CollateralShortfall {
        market_held: Amount,
        locked_in_positions: Amount,
    },
    /// Market holds more than the whole supply
    CollateralExceedsSupply {
        market_held: Amount,
        total_supply: Amount,
    },
}

/// Recomputed supply figures for one topic
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplyAudit {
    pub topic: TopicId,
    pub total_supply: Amount,
    pub holders_total: Amount,
    pub market_held: Amount,
    pub locked_in_positions: Amount,
    pub open_positions: usize,
    pub violations: Vec<AuditViolation>,
}

impl SupplyAudit {
    pub(crate) fn evaluate(
        topic: TopicId,
        total_supply: Amount,
        holders_total: Amount,
        market_held: Amount,
        locked_in_positions: Amount,
        open_positions: usize,
    ) -> Self {
        let mut violations = Vec::new();
        if holders_total != total_supply {
            violations.push(AuditViolation::SupplyMismatch {
                total_supply,
                holders_total,
            });
        }
        if locked_in_positions > market_held {
            violations.push(AuditViolation::CollateralShortfall {
                market_held,
                locked_in_positions,
            });
        }
        if market_held > total_supply {
            violations.push(AuditViolation::CollateralExceedsSupply {
                market_held,
                total_supply,
            });
        }

        Self {
            topic,
            total_supply,
            holders_total,
            market_held,
            locked_in_positions,
            open_positions,
            violations,
        }
    }

    pub fn is_consistent(&self) -> bool {
        self.violations.is_empty()
    }
}

/// Balances and supply of one topic at snapshot time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicSnapshot {
    pub topic: TopicId,
    pub total_supply: Amount,
    pub balances: BTreeMap<AccountId, Amount>,
}

/// Exportable view of a market's state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub app_id: AppId,
    pub market_account: AccountId,
    /// Pay asset held by the market account
    pub reserves: Amount,
    pub topics: Vec<TopicSnapshot>,
    pub positions: Vec<Position>,
}

impl MarketSnapshot {
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
