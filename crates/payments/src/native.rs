//! Native-currency rail

use crate::errors::*;
use crate::{CallBudget, PaymentRail, PayLedger};
use bondfi_types::{AccountId, Amount, CallContext, RailKind};
use tracing::debug;

#[derive(Debug, Clone, Copy, Default)]
pub struct NativeRail;

impl PaymentRail for NativeRail {
    fn kind(&self) -> RailKind {
        RailKind::Native
    }

    fn open_call(
        &self,
        bank: &mut PayLedger,
        market: &AccountId,
        call: &CallContext,
    ) -> Result<CallBudget> {
        // attached value moves into the market before anything else runs
        bank.transfer(&call.caller, market, call.value)?;
        Ok(CallBudget::new(call.caller, call.value))
    }

    fn pull(
        &self,
        _bank: &mut PayLedger,
        _market: &AccountId,
        budget: &mut CallBudget,
        amount: Amount,
    ) -> Result<()> {
        if budget.remaining < amount {
            return Err(PaymentError::InsufficientValue {
                needed: amount,
                supplied: budget.remaining,
            });
        }
        budget.remaining -= amount;
        budget.pulled = budget.pulled.checked_add(amount).ok_or(PaymentError::Overflow)?;
        Ok(())
    }

    fn close_call(
        &self,
        bank: &mut PayLedger,
        market: &AccountId,
        budget: CallBudget,
    ) -> Result<Amount> {
        if budget.remaining > 0 {
            bank.transfer(market, &budget.payer, budget.remaining)?;
            debug!(
                target: "payments",
                "Refunded {} of {} attached to {}",
                budget.remaining,
                budget.attached,
                budget.payer
            );
        }
        Ok(budget.remaining)
    }
}
