//! Fungible-asset rail

use crate::errors::*;
use crate::{CallBudget, PaymentRail, PayLedger};
use bondfi_types::{AccountId, Amount, CallContext, RailKind};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct FungibleRail {
    asset: String,
}

impl FungibleRail {
    pub fn new(asset: impl Into<String>) -> Self {
        Self {
            asset: asset.into(),
        }
    }

    pub fn asset(&self) -> &str {
        &self.asset
    }
}

impl PaymentRail for FungibleRail {
    fn kind(&self) -> RailKind {
        RailKind::Fungible {
            asset: self.asset.clone(),
        }
    }

    fn open_call(
        &self,
        _bank: &mut PayLedger,
        _market: &AccountId,
        call: &CallContext,
    ) -> Result<CallBudget> {
        if call.value > 0 {
            return Err(PaymentError::UnexpectedValue(call.value));
        }
        Ok(CallBudget::new(call.caller, 0))
    }

    fn pull(
        &self,
        bank: &mut PayLedger,
        market: &AccountId,
        budget: &mut CallBudget,
        amount: Amount,
    ) -> Result<()> {
        if amount == 0 {
            return Ok(());
        }
        // check both before touching either, so a failure never half-applies
        let allowance = bank.allowance(&budget.payer, market);
        if allowance < amount {
            return Err(PaymentError::InsufficientAllowance {
                needed: amount,
                allowance,
            });
        }
        let available = bank.balance_of(&budget.payer);
        if available < amount {
            return Err(PaymentError::InsufficientBalance {
                account: budget.payer,
                needed: amount,
                available,
            });
        }

        bank.spend_allowance(&budget.payer, market, amount)?;
        bank.transfer(&budget.payer, market, amount)?;
        budget.pulled = budget.pulled.checked_add(amount).ok_or(PaymentError::Overflow)?;
        debug!(
            target: "payments",
            "Pulled {} {} from {}",
            amount,
            self.asset,
            budget.payer
        );
        Ok(())
    }

    fn close_call(
        &self,
        _bank: &mut PayLedger,
        _market: &AccountId,
        _budget: CallBudget,
    ) -> Result<Amount> {
        Ok(0)
    }
}
