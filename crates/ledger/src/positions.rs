//! Collateral position registry
//!
//! Positions are non-fungible records `{ id, owner, topic, amount }`. Ids are
//! allocated sequentially from 1 and never reused; a closed id is invalid for
//! good. Ownership lives in an explicit `id → owner` field, indexed by owner.
//! Writes between `begin` and `commit` are journaled like the token books.

use crate::errors::*;
use bondfi_types::{AccountId, Amount, PositionId, TopicId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub id: PositionId,
    pub owner: AccountId,
    pub topic: TopicId,
    pub amount: Amount,
}

/// Public view of a position
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionInfo {
    pub topic: TopicId,
    pub amount: Amount,
}

/// Interface for position storage.
pub trait PositionStore: Send + Sync {
    /// Create a position and return its id.
    fn open(&mut self, owner: &AccountId, topic: &TopicId, amount: Amount) -> Result<PositionId>;

    /// Delete a position; its id becomes invalid.
    fn close(&mut self, id: PositionId) -> Result<Position>;

    /// Replace the locked amount. Use `close` to bring a position to zero.
    fn set_amount(&mut self, id: PositionId, amount: Amount) -> Result<()>;

    fn owner_of(&self, id: PositionId) -> Result<AccountId>;

    fn info(&self, id: PositionId) -> Result<PositionInfo>;

    /// Reassign ownership.
    fn transfer(&mut self, id: PositionId, to: &AccountId) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum PositionUndo {
    /// Record held under `id` before the write; `None` if it did not exist.
    Slot {
        id: PositionId,
        prev: Option<Position>,
    },
    NextId(PositionId),
}

// -----------------------------------------------------------------------------
// In-memory implementation
// -----------------------------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InMemoryPositionRegistry {
    positions: BTreeMap<PositionId, Position>,
    /// Owner → ids
    owner_index: HashMap<AccountId, BTreeSet<PositionId>>,
    next_id: PositionId,
    #[serde(skip)]
    journal: Option<Vec<PositionUndo>>,
}

impl Default for InMemoryPositionRegistry {
    fn default() -> Self {
        Self {
            positions: BTreeMap::new(),
            owner_index: HashMap::new(),
            next_id: 1,
            journal: None,
        }
    }
}

impl InMemoryPositionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: PositionId) -> Result<&Position> {
        self.positions
            .get(&id)
            .ok_or(LedgerError::PositionNotFound(id))
    }

    /// Ids owned by `owner`, ascending.
    pub fn positions_of(&self, owner: &AccountId) -> Vec<PositionId> {
        self.owner_index
            .get(owner)
            .map(|ids| ids.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Ids owned by `owner` on `topic`, ascending.
    pub fn ids_for(&self, owner: &AccountId, topic: &TopicId) -> Vec<PositionId> {
        self.positions_of(owner)
            .into_iter()
            .filter(|id| {
                self.positions
                    .get(id)
                    .map(|p| &p.topic == topic)
                    .unwrap_or(false)
            })
            .collect()
    }

    /// Sum of amounts locked in open positions on `topic`.
    pub fn total_locked(&self, topic: &TopicId) -> Amount {
        self.positions
            .values()
            .filter(|p| &p.topic == topic)
            .map(|p| p.amount)
            .sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Position> {
        self.positions.values()
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
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
        for entry in journal.into_iter().rev() {
            match entry {
                PositionUndo::Slot { id, prev } => {
                    if let Some(current) = self.positions.remove(&id) {
                        self.unindex(&current.owner, id);
                    }
                    if let Some(position) = prev {
                        self.owner_index.entry(position.owner).or_default().insert(id);
                        self.positions.insert(id, position);
                    }
                }
                PositionUndo::NextId(next_id) => self.next_id = next_id,
            }
        }
    }

    fn record_slot(&mut self, id: PositionId) {
        if let Some(journal) = self.journal.as_mut() {
            journal.push(PositionUndo::Slot {
                id,
                prev: self.positions.get(&id).cloned(),
            });
        }
    }

    fn unindex(&mut self, owner: &AccountId, id: PositionId) {
        if let Some(ids) = self.owner_index.get_mut(owner) {
            ids.remove(&id);
            if ids.is_empty() {
                self.owner_index.remove(owner);
            }
        }
    }
}

impl PositionStore for InMemoryPositionRegistry {
    fn open(&mut self, owner: &AccountId, topic: &TopicId, amount: Amount) -> Result<PositionId> {
        if amount == 0 {
            return Err(LedgerError::EmptyPosition);
        }
        let id = self.next_id;
        let next_id = self.next_id.checked_add(1).ok_or(LedgerError::Overflow)?;
        if let Some(journal) = self.journal.as_mut() {
            journal.push(PositionUndo::NextId(id));
        }
        self.record_slot(id);
        self.next_id = next_id;

        self.positions.insert(
            id,
            Position {
                id,
                owner: *owner,
                topic: topic.clone(),
                amount,
            },
        );
        self.owner_index.entry(*owner).or_default().insert(id);

        debug!(target: "ledger", "Opened position {} on {} for {}", id, topic, owner);
        Ok(id)
    }

    fn close(&mut self, id: PositionId) -> Result<Position> {
        self.record_slot(id);
        let position = self
            .positions
            .remove(&id)
            .ok_or(LedgerError::PositionNotFound(id))?;
        self.unindex(&position.owner, id);
        debug!(target: "ledger", "Closed position {}", id);
        Ok(position)
    }

    fn set_amount(&mut self, id: PositionId, amount: Amount) -> Result<()> {
        if amount == 0 {
            return Err(LedgerError::EmptyPosition);
        }
        self.record_slot(id);
        let position = self
            .positions
            .get_mut(&id)
            .ok_or(LedgerError::PositionNotFound(id))?;
        position.amount = amount;
        Ok(())
    }

    fn owner_of(&self, id: PositionId) -> Result<AccountId> {
        Ok(self.get(id)?.owner)
    }

    fn info(&self, id: PositionId) -> Result<PositionInfo> {
        let position = self.get(id)?;
        Ok(PositionInfo {
            topic: position.topic.clone(),
            amount: position.amount,
        })
    }

    fn transfer(&mut self, id: PositionId, to: &AccountId) -> Result<()> {
        self.record_slot(id);
        let position = self
            .positions
            .get_mut(&id)
            .ok_or(LedgerError::PositionNotFound(id))?;
        let from = position.owner;
        if from == *to {
            return Ok(());
        }
        position.owner = *to;
        self.unindex(&from, id);
        self.owner_index.entry(*to).or_default().insert(id);
        Ok(())
    }
}
