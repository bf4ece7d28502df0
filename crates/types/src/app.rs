//! Per-application configuration consumed read-only by the market core.
//!
//! An app fixes the curve shape, the payment rail, and the fee rates applied
//! to every topic it hosts. Apps are created by an external factory; the core
//! only validates and reads them.

use crate::ids::{AccountId, AppId};
use crate::units::{amount_str, Amount, BPS_DENOMINATOR, TOKEN_UNIT};
use serde::{Deserialize, Serialize};

// =============================================================================
// CURVE SELECTION
// =============================================================================

/// Curve strategy selected per app.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CurveConfig {
    /// Inverse-square floor curve: marginal price `K / (B - s)^2`.
    Floor {
        #[serde(with = "amount_str")]
        numerator: Amount,
        #[serde(with = "amount_str")]
        asymptote: Amount,
    },
    /// Constant-product curve over virtual reserves.
    ConstantProduct {
        #[serde(with = "amount_str")]
        virtual_token_reserve: Amount,
        #[serde(with = "amount_str")]
        virtual_pay_reserve: Amount,
    },
}

impl Default for CurveConfig {
    fn default() -> Self {
        CurveConfig::Floor {
            numerator: 10u128.pow(36),
            asymptote: 21_000_000 * TOKEN_UNIT,
        }
    }
}

// =============================================================================
// PAYMENT RAIL SELECTION
// =============================================================================

/// Settlement asset selected per app.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RailKind {
    /// Native currency attached to the call
    #[default]
    Native,
    /// Fungible asset pulled through a pre-approved allowance
    Fungible { asset: String },
}

// =============================================================================
// FEE RATES
// =============================================================================

/// Fee rates in basis points out of 100,000.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeeRates {
    /// NFT owner pool on buys (added on top of the curve cost)
    pub buy_nft_bps: u32,
    /// NFT owner pool on sells (deducted from proceeds)
    pub sell_nft_bps: u32,
    /// NFT owner pool on mortgage payouts
    pub mortgage_nft_bps: u32,
    pub buy_app_owner_bps: u32,
    pub sell_app_owner_bps: u32,
    pub mortgage_app_owner_bps: u32,
    /// Platform fee, charged on mortgage payouts only
    pub mortgage_platform_bps: u32,
}

impl Default for FeeRates {
    fn default() -> Self {
        Self {
            // 1% to NFT owners on every path
            buy_nft_bps: 1_000,
            sell_nft_bps: 1_000,
            mortgage_nft_bps: 1_000,
            // 0.5% to the app owner
            buy_app_owner_bps: 500,
            sell_app_owner_bps: 500,
            mortgage_app_owner_bps: 500,
            // 0.2% platform
            mortgage_platform_bps: 200,
        }
    }
}

impl FeeRates {
    /// All rates set to zero
    pub const fn zero() -> Self {
        Self {
            buy_nft_bps: 0,
            sell_nft_bps: 0,
            mortgage_nft_bps: 0,
            buy_app_owner_bps: 0,
            sell_app_owner_bps: 0,
            mortgage_app_owner_bps: 0,
            mortgage_platform_bps: 0,
        }
    }

    pub fn validate(&self) -> Result<(), AppConfigError> {
        let named = [
            ("buy_nft_bps", self.buy_nft_bps),
            ("sell_nft_bps", self.sell_nft_bps),
            ("mortgage_nft_bps", self.mortgage_nft_bps),
            ("buy_app_owner_bps", self.buy_app_owner_bps),
            ("sell_app_owner_bps", self.sell_app_owner_bps),
            ("mortgage_app_owner_bps", self.mortgage_app_owner_bps),
            ("mortgage_platform_bps", self.mortgage_platform_bps),
        ];
        for (field, bps) in named {
            if bps > BPS_DENOMINATOR {
                return Err(AppConfigError::FeeRateTooHigh { field, bps });
            }
        }

        let sell = self.sell_nft_bps + self.sell_app_owner_bps;
        if sell > BPS_DENOMINATOR {
            return Err(AppConfigError::DeductedFeesTooHigh {
                operation: "sell",
                total_bps: sell,
            });
        }

        let mortgage =
            self.mortgage_nft_bps + self.mortgage_app_owner_bps + self.mortgage_platform_bps;
        if mortgage > BPS_DENOMINATOR {
            return Err(AppConfigError::DeductedFeesTooHigh {
                operation: "mortgage",
                total_bps: mortgage,
            });
        }

        Ok(())
    }
}

// =============================================================================
// APP CONFIG
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    pub app_id: AppId,
    pub name: String,
    /// App owner, recipient of the app-owner fee
    pub owner: AccountId,
    /// Recipient of the platform mortgage fee
    pub platform_recipient: AccountId,
    #[serde(default)]
    pub fees: FeeRates,
    #[serde(default)]
    pub curve: CurveConfig,
    #[serde(default)]
    pub payment: RailKind,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            app_id: 1,
            name: "default".to_string(),
            owner: AccountId::from_label("app-owner"),
            platform_recipient: AccountId::from_label("platform"),
            fees: FeeRates::default(),
            curve: CurveConfig::default(),
            payment: RailKind::Native,
        }
    }
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), AppConfigError> {
        if self.name.trim().is_empty() {
            return Err(AppConfigError::EmptyName);
        }
        if let RailKind::Fungible { asset } = &self.payment {
            if asset.trim().is_empty() {
                return Err(AppConfigError::EmptyAsset);
            }
        }
        self.fees.validate()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AppConfigError {
    #[error("app name must not be empty")]
    EmptyName,

    #[error("fungible payment rail requires an asset identifier")]
    EmptyAsset,

    #[error("fee rate {field} = {bps} exceeds 100000")]
    FeeRateTooHigh { field: &'static str, bps: u32 },

    #[error("{operation} fees total {total_bps} bps, more than the whole curve amount")]
    DeductedFeesTooHigh {
        operation: &'static str,
        total_bps: u32,
    },
}

// =============================================================================
// CALL CONTEXT
// =============================================================================

/// Authenticated caller of one market operation, plus the native value
/// attached to the call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallContext {
    pub caller: AccountId,
    pub value: Amount,
}

impl CallContext {
    pub fn new(caller: AccountId) -> Self {
        Self { caller, value: 0 }
    }

    pub fn with_value(mut self, value: Amount) -> Self {
        self.value = value;
        self
    }
}
