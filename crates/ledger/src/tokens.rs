//! Per-topic token ledger
//!
//! Keeps one book per topic. Each book maintains the invariant
//! `sum(balances) == total_supply`; only `mint` and `burn` change supply.
//!
//! Between `begin` and `commit` every write records the value it replaces,
//! so `rollback` restores the pre-`begin` books touching only those entries.

use crate::errors::*;
use bondfi_types::{AccountId, Amount, TopicId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// Interface for topic token operations.
pub trait TokenLedger: Send + Sync {
    /// Mint new tokens to a holder, increasing supply.
    fn mint(&mut self, to: &AccountId, topic: &TopicId, amount: Amount) -> Result<()>;

    /// Burn tokens from a holder, decreasing supply.
    fn burn(&mut self, from: &AccountId, topic: &TopicId, amount: Amount) -> Result<()>;

    /// Move tokens between holders. Supply is unchanged.
    fn transfer(
        &mut self,
        from: &AccountId,
        to: &AccountId,
        topic: &TopicId,
        amount: Amount,
    ) -> Result<()>;

    /// Holder balance; zero for unknown holders or topics.
    fn balance_of(&self, topic: &TopicId, holder: &AccountId) -> Amount;

    /// Total supply of a topic.
    fn total_supply(&self, topic: &TopicId) -> Result<Amount>;
}

/// Balances and supply of one topic
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicBook {
    pub total_supply: Amount,
    pub balances: HashMap<AccountId, Amount>,
}

impl TopicBook {
    pub fn balance_of(&self, holder: &AccountId) -> Amount {
        self.balances.get(holder).copied().unwrap_or(0)
    }

    /// Sum over every holder, market account included.
    pub fn holders_total(&self) -> Amount {
        self.balances.values().sum()
    }

    fn credit(&mut self, holder: &AccountId, amount: Amount) -> Result<()> {
        let balance = self.balances.entry(*holder).or_insert(0);
        *balance = balance.checked_add(amount).ok_or(LedgerError::Overflow)?;
        Ok(())
    }

    fn debit(&mut self, topic: &TopicId, holder: &AccountId, amount: Amount) -> Result<()> {
        let available = self.balance_of(holder);
        if available < amount {
            return Err(LedgerError::InsufficientBalance {
                topic: topic.clone(),
                holder: *holder,
                needed: amount,
                available,
            });
        }
        let remaining = available - amount;
        if remaining == 0 {
            self.balances.remove(holder);
        } else {
            self.balances.insert(*holder, remaining);
        }
        Ok(())
    }
}

/// Value replaced by a journaled write
#[derive(Debug, Clone, PartialEq, Eq)]
enum TokenUndo {
    Balance {
        topic: TopicId,
        holder: AccountId,
        prev: Amount,
    },
    Supply {
        topic: TopicId,
        prev: Amount,
    },
    Book(TopicId),
}

// -----------------------------------------------------------------------------
// In-memory implementation
// -----------------------------------------------------------------------------
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InMemoryTokenLedger {
    books: BTreeMap<TopicId, TopicBook>,
    #[serde(skip)]
    journal: Option<Vec<TokenUndo>>,
}

impl InMemoryTokenLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty book (supply 0) for a new topic.
    pub fn create_topic(&mut self, topic: &TopicId) -> Result<()> {
        if self.books.contains_key(topic) {
            return Err(LedgerError::TopicAlreadyExists(topic.clone()));
        }
        self.books.insert(topic.clone(), TopicBook::default());
        self.record(TokenUndo::Book(topic.clone()));
        debug!(target: "ledger", "Created token book for topic {}", topic);
        Ok(())
    }

    pub fn contains_topic(&self, topic: &TopicId) -> bool {
        self.books.contains_key(topic)
    }

    pub fn book(&self, topic: &TopicId) -> Result<&TopicBook> {
        self.books
            .get(topic)
            .ok_or_else(|| LedgerError::UnknownTopic(topic.clone()))
    }

    pub fn books(&self) -> impl Iterator<Item = (&TopicId, &TopicBook)> {
        self.books.iter()
    }

    /// Start journaling writes. A journal left open by an unwound call is
    /// rolled back first.
    pub fn begin(&mut self) {
        self.rollback();
        self.journal = Some(Vec::new());
    }

    /// Keep every write since `begin`.
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
                TokenUndo::Balance {
                    topic,
                    holder,
                    prev,
                } => {
                    if let Some(book) = self.books.get_mut(&topic) {
                        if prev == 0 {
                            book.balances.remove(&holder);
                        } else {
                            book.balances.insert(holder, prev);
                        }
                    }
                }
                TokenUndo::Supply { topic, prev } => {
                    if let Some(book) = self.books.get_mut(&topic) {
                        book.total_supply = prev;
                    }
                }
                TokenUndo::Book(topic) => {
                    self.books.remove(&topic);
                }
            }
        }
        debug!(target: "ledger", "Rolled back {} token writes", undone);
    }

    fn record(&mut self, entry: TokenUndo) {
        if let Some(journal) = self.journal.as_mut() {
            journal.push(entry);
        }
    }

    fn record_balance(&mut self, topic: &TopicId, holder: &AccountId) {
        if self.journal.is_some() {
            let prev = self.balance_of(topic, holder);
            self.record(TokenUndo::Balance {
                topic: topic.clone(),
                holder: *holder,
                prev,
            });
        }
    }

    fn record_supply(&mut self, topic: &TopicId) {
        if let Some(book) = self.books.get(topic) {
            let prev = book.total_supply;
            self.record(TokenUndo::Supply {
                topic: topic.clone(),
                prev,
            });
        }
    }

    fn book_mut(&mut self, topic: &TopicId) -> Result<&mut TopicBook> {
        self.books
            .get_mut(topic)
            .ok_or_else(|| LedgerError::UnknownTopic(topic.clone()))
    }
}

impl TokenLedger for InMemoryTokenLedger {
    fn mint(&mut self, to: &AccountId, topic: &TopicId, amount: Amount) -> Result<()> {
        self.record_supply(topic);
        self.record_balance(topic, to);
        let book = self.book_mut(topic)?;
        let new_supply = book
            .total_supply
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)?;
        book.credit(to, amount)?;
        book.total_supply = new_supply;
        Ok(())
    }

    fn burn(&mut self, from: &AccountId, topic: &TopicId, amount: Amount) -> Result<()> {
        self.record_supply(topic);
        self.record_balance(topic, from);
        let book = self.book_mut(topic)?;
        if book.total_supply < amount {
            return Err(LedgerError::InsufficientSupply {
                topic: topic.clone(),
                needed: amount,
                available: book.total_supply,
            });
        }
        book.debit(topic, from, amount)?;
        book.total_supply -= amount;
        Ok(())
    }

    fn transfer(
        &mut self,
        from: &AccountId,
        to: &AccountId,
        topic: &TopicId,
        amount: Amount,
    ) -> Result<()> {
        if amount == 0 || from == to {
            self.book(topic)?;
            return Ok(());
        }
        self.record_balance(topic, from);
        self.record_balance(topic, to);
        let book = self.book_mut(topic)?;
        book.debit(topic, from, amount)?;
        book.credit(to, amount)
    }

    fn balance_of(&self, topic: &TopicId, holder: &AccountId) -> Amount {
        self.books
            .get(topic)
            .map(|book| book.balance_of(holder))
            .unwrap_or(0)
    }

    fn total_supply(&self, topic: &TopicId) -> Result<Amount> {
        Ok(self.book(topic)?.total_supply)
    }
}
