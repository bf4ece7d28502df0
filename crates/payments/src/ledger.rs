//! Pay-asset ledger
//!
//! Balances and allowances of the asset an app settles in. For a native rail
//! this stands in for the host's currency; for a fungible rail it is the
//! asset's own balance sheet. Writes between `begin` and `commit` are
//! journaled so a failed call can be rolled back.

use crate::errors::*;
use bondfi_types::{AccountId, Amount};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
enum PayUndo {
    Balance {
        account: AccountId,
        prev: Amount,
    },
    Allowance {
        owner: AccountId,
        spender: AccountId,
        prev: Option<Amount>,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayLedger {
    balances: HashMap<AccountId, Amount>,
    /// owner → spender → remaining allowance
    allowances: HashMap<AccountId, HashMap<AccountId, Amount>>,
    #[serde(skip)]
    journal: Option<Vec<PayUndo>>,
}

impl PayLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn balance_of(&self, account: &AccountId) -> Amount {
        self.balances.get(account).copied().unwrap_or(0)
    }

    pub fn allowance(&self, owner: &AccountId, spender: &AccountId) -> Amount {
        self.allowances
            .get(owner)
            .and_then(|spenders| spenders.get(spender))
            .copied()
            .unwrap_or(0)
    }

    /// Sum of all balances
    pub fn total_balances(&self) -> Amount {
        self.balances.values().sum()
    }

    /// Start journaling writes, rolling back any journal still open.
    pub fn begin(&mut self) {
        self.rollback();
        self.journal = Some(Vec::new());
    }

    pub fn commit(&mut self) {
        self.journal = None;
    }

    /// Undo every write since `begin`, newest first.
    pub fn rollback(&mut self) {
        let Some(journal) = self.journal.take() else {
            return;
        };
        let undone = journal.len();
        for entry in journal.into_iter().rev() {
            match entry {
                PayUndo::Balance { account, prev: 0 } => {
                    self.balances.remove(&account);
                }
                PayUndo::Balance { account, prev } => {
                    self.balances.insert(account, prev);
                }
                PayUndo::Allowance {
                    owner,
                    spender,
                    prev: Some(prev),
                } => {
                    self.allowances.entry(owner).or_default().insert(spender, prev);
                }
                PayUndo::Allowance {
                    owner,
                    spender,
                    prev: None,
                } => {
                    if let Some(spenders) = self.allowances.get_mut(&owner) {
                        spenders.remove(&spender);
                        if spenders.is_empty() {
                            self.allowances.remove(&owner);
                        }
                    }
                }
            }
        }
        debug!(target: "payments", "Rolled back {} pay ledger writes", undone);
    }

    fn record_balance(&mut self, account: &AccountId) {
        let prev = self.balance_of(account);
        if let Some(journal) = self.journal.as_mut() {
            journal.push(PayUndo::Balance {
                account: *account,
                prev,
            });
        }
    }

    pub fn credit(&mut self, account: &AccountId, amount: Amount) -> Result<()> {
        self.record_balance(account);
        let balance = self.balances.entry(*account).or_insert(0);
        *balance = balance.checked_add(amount).ok_or(PaymentError::Overflow)?;
        Ok(())
    }

    pub fn debit(&mut self, account: &AccountId, amount: Amount) -> Result<()> {
        let available = self.balance_of(account);
        if available < amount {
            return Err(PaymentError::InsufficientBalance {
                account: *account,
                needed: amount,
                available,
            });
        }
        self.record_balance(account);
        let remaining = available - amount;
        if remaining == 0 {
            self.balances.remove(account);
        } else {
            self.balances.insert(*account, remaining);
        }
        Ok(())
    }

    pub fn transfer(&mut self, from: &AccountId, to: &AccountId, amount: Amount) -> Result<()> {
        if amount == 0 || from == to {
            return Ok(());
        }
        self.debit(from, amount)?;
        self.credit(to, amount)
    }

    pub fn approve(&mut self, owner: &AccountId, spender: &AccountId, amount: Amount) {
        if let Some(journal) = self.journal.as_mut() {
            let prev = self
                .allowances
                .get(owner)
                .and_then(|spenders| spenders.get(spender))
                .copied();
            journal.push(PayUndo::Allowance {
                owner: *owner,
                spender: *spender,
                prev,
            });
        }
        self.allowances
            .entry(*owner)
            .or_default()
            .insert(*spender, amount);
    }

    /// Spend `amount` of `owner`'s allowance to `spender`, all or nothing.
    pub fn spend_allowance(
        &mut self,
        owner: &AccountId,
        spender: &AccountId,
        amount: Amount,
    ) -> Result<()> {
        let allowance = self.allowance(owner, spender);
        if allowance < amount {
            return Err(PaymentError::InsufficientAllowance {
                needed: amount,
                allowance,
            });
        }
        self.approve(owner, spender, allowance - amount);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credit_debit() {
        let mut ledger = PayLedger::new();
        let alice = AccountId::from_label("alice");

        ledger.credit(&alice, 1000).unwrap();
        ledger.debit(&alice, 300).unwrap();
        assert_eq!(ledger.balance_of(&alice), 700);

        let err = ledger.debit(&alice, 701).unwrap_err();
        assert_eq!(
            err,
            PaymentError::InsufficientBalance {
                account: alice,
                needed: 701,
                available: 700
            }
        );
        assert_eq!(ledger.balance_of(&alice), 700);
    }

    #[test]
    fn test_allowance_is_all_or_nothing() {
        let mut ledger = PayLedger::new();
        let alice = AccountId::from_label("alice");
        let market = AccountId::from_label("market");

        ledger.approve(&alice, &market, 500);
        assert!(ledger.spend_allowance(&alice, &market, 501).is_err());
        assert_eq!(ledger.allowance(&alice, &market), 500);

        ledger.spend_allowance(&alice, &market, 200).unwrap();
        assert_eq!(ledger.allowance(&alice, &market), 300);
    }

    #[test]
    fn test_rollback_restores_balances_and_allowances() {
        let mut ledger = PayLedger::new();
        let alice = AccountId::from_label("alice");
        let market = AccountId::from_label("market");
        ledger.credit(&alice, 1_000).unwrap();
        ledger.approve(&alice, &market, 600);
        let before = ledger.clone();

        ledger.begin();
        ledger.spend_allowance(&alice, &market, 600).unwrap();
        ledger.transfer(&alice, &market, 600).unwrap();
        ledger.approve(&market, &alice, 1);
        ledger.rollback();

        assert_eq!(ledger, before);
        assert_eq!(ledger.balance_of(&market), 0);
        assert_eq!(ledger.allowance(&alice, &market), 600);
    }

    #[test]
    fn test_ledger_serializes_with_hex_keys() {
        let mut ledger = PayLedger::new();
        let alice = AccountId::from_label("alice");
        ledger.credit(&alice, 5).unwrap();

        let json = serde_json::to_string(&ledger).unwrap();
        assert!(json.contains(&alice.to_hex()));
        let back: PayLedger = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ledger);
    }
}
