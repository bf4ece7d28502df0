//! Bondfi payment rails
//!
//! A rail settles market calls in the app's pay asset. One call goes through
//! `open_call`, any number of `pull`s (user pays market) and `push`es (market
//! pays a recipient), then `close_call`. Two rails ship:
//!
//! - [`NativeRail`]: value is attached to the call, escrowed up front, and any
//!   unused part refunded at `close_call`.
//! - [`FungibleRail`]: each pull moves exactly the needed amount through the
//!   payer's allowance to the market. Attached value is refused.

pub mod errors;
pub mod fungible;
pub mod ledger;
pub mod native;

pub use errors::*;
pub use fungible::FungibleRail;
pub use ledger::PayLedger;
pub use native::NativeRail;

use bondfi_types::{AccountId, Amount, CallContext, RailKind};
use std::fmt;
use std::sync::Arc;

/// Settlement state of one call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallBudget {
    pub payer: AccountId,
    /// Value attached to the call (native rail only)
    pub attached: Amount,
    /// Attached value not yet consumed by pulls
    pub remaining: Amount,
    /// Total pulled from the payer during the call
    pub pulled: Amount,
}

impl CallBudget {
    pub fn new(payer: AccountId, attached: Amount) -> Self {
        Self {
            payer,
            attached,
            remaining: attached,
            pulled: 0,
        }
    }
}

pub trait PaymentRail: fmt::Debug + Send + Sync {
    fn kind(&self) -> RailKind;

    /// Start settling a call.
    fn open_call(
        &self,
        bank: &mut PayLedger,
        market: &AccountId,
        call: &CallContext,
    ) -> Result<CallBudget>;

    /// Collect exactly `amount` from the payer into the market.
    fn pull(
        &self,
        bank: &mut PayLedger,
        market: &AccountId,
        budget: &mut CallBudget,
        amount: Amount,
    ) -> Result<()>;

    /// Pay `amount` from the market to `to`.
    fn push(
        &self,
        bank: &mut PayLedger,
        market: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> Result<()> {
        if amount == 0 {
            return Ok(());
        }
        bank.transfer(market, to, amount)?;
        tracing::debug!(target: "payments", "Paid {} to {}", amount, to);
        Ok(())
    }

    /// Finish settling a call. Returns the amount refunded to the payer.
    fn close_call(
        &self,
        bank: &mut PayLedger,
        market: &AccountId,
        budget: CallBudget,
    ) -> Result<Amount>;
}

/// Build the rail an app selected.
pub fn build_rail(kind: &RailKind) -> Arc<dyn PaymentRail> {
    match kind {
        RailKind::Native => Arc::new(NativeRail),
        RailKind::Fungible { asset } => Arc::new(FungibleRail::new(asset.clone())),
    }
}
