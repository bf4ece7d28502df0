//! Topic market and mortgage engine for one app.
//!
//! Every mutating call takes the market's write lock and journals its writes
//! to the token books, positions and pay ledger. The journal is committed
//! only if the whole call succeeds and rolled back otherwise, so a call costs
//! what it touches. Inside a call the order is checks, then effects on
//! supply, balances and positions, then payment interactions (pulls, fee
//! pushes, payouts, refund). Events are buffered per call and appended to the
//! log on commit.

use crate::audit::{MarketSnapshot, SupplyAudit, TopicSnapshot};
use crate::errors::*;
use crate::events::MarketEvent;
use crate::quote::{MortgageReceipt, Quote, SplitReceipt};
use crate::registry::{AppRegistry, TopicConfig};
use bondfi_curve::{build_curve, Curve};
use bondfi_fees::{FeeOperation, FeeSchedule};
use bondfi_ledger::{
    InMemoryPositionRegistry, InMemoryTokenLedger, LedgerError, Position, PositionInfo,
    PositionStore, TokenLedger,
};
use bondfi_payments::{build_rail, CallBudget, PayLedger, PaymentRail};
use bondfi_types::{
    market_account_id, AccountId, Amount, AppConfig, AppId, CallContext, NftOwnerSplit,
    PositionId, TopicId,
};
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use tracing::{debug, info, warn};

// =============================================================================
// STATE
// =============================================================================

#[derive(Debug, Default)]
struct MarketState {
    tokens: InMemoryTokenLedger,
    positions: InMemoryPositionRegistry,
    bank: PayLedger,
    /// Events of the call in progress
    pending: Vec<MarketEvent>,
}

impl MarketState {
    fn begin(&mut self) {
        self.tokens.begin();
        self.positions.begin();
        self.bank.begin();
        self.pending.clear();
    }

    fn commit(&mut self) -> Vec<MarketEvent> {
        self.tokens.commit();
        self.positions.commit();
        self.bank.commit();
        std::mem::take(&mut self.pending)
    }

    fn rollback(&mut self) {
        self.tokens.rollback();
        self.positions.rollback();
        self.bank.rollback();
        self.pending.clear();
    }

    fn ensure_book(&mut self, topic: &TopicId) -> Result<()> {
        if !self.tokens.contains_topic(topic) {
            self.tokens.create_topic(topic)?;
        }
        Ok(())
    }

    /// Supply of a registered topic; a topic without a book yet has none.
    fn supply(&self, topic: &TopicId) -> Amount {
        self.tokens.total_supply(topic).unwrap_or(0)
    }

    fn position(&self, id: PositionId) -> Result<&Position> {
        self.positions.get(id).map_err(|err| match err {
            LedgerError::PositionNotFound(id) => MarketError::PositionNotFound(id),
            other => MarketError::Ledger(other),
        })
    }
}

fn ensure_positive(amount: Amount) -> Result<()> {
    if amount == 0 {
        return Err(MarketError::ZeroAmount);
    }
    Ok(())
}

// =============================================================================
// MARKET
// =============================================================================

#[derive(Debug)]
pub struct Market {
    app_id: AppId,
    account: AccountId,
    registry: Arc<AppRegistry>,
    curve: Arc<dyn Curve>,
    rail: Arc<dyn PaymentRail>,
    state: RwLock<MarketState>,
    /// Committed events not yet drained
    events: Mutex<Vec<MarketEvent>>,
}

impl Market {
    /// Build the market of a registered app. Curve and payment rail are
    /// fixed here; fee rates, recipients and topics are read from the
    /// registry on every call.
    pub fn new(registry: Arc<AppRegistry>, app_id: AppId) -> Result<Self> {
        let app = registry
            .app(app_id)
            .ok_or(MarketError::AppNotFound(app_id))?;
        let curve = build_curve(&app.curve)?;
        let rail = build_rail(&app.payment);

        let mut state = MarketState::default();
        for topic in registry.topics_of(app_id) {
            state.tokens.create_topic(&topic)?;
        }

        let account = market_account_id(app_id);
        info!(
            target: "market",
            "Market for app {} ({}) on {} curve, {:?} rail, account {}",
            app_id,
            app.name,
            curve.name(),
            rail.kind(),
            account
        );

        Ok(Self {
            app_id,
            account,
            registry,
            curve,
            rail,
            state: RwLock::new(state),
            events: Mutex::new(Vec::new()),
        })
    }

    pub fn app_id(&self) -> AppId {
        self.app_id
    }

    /// Account holding the pay reserve and mortgage collateral.
    pub fn market_account(&self) -> AccountId {
        self.account
    }

    pub fn curve(&self) -> &dyn Curve {
        self.curve.as_ref()
    }

    /// Register a topic for this app and open its book with zero supply.
    pub fn create_topic(&self, topic: &TopicId, nft_owners: NftOwnerSplit) -> Result<()> {
        self.registry
            .register_topic(self.app_id, topic.clone(), nft_owners)?;
        self.transact("create_topic", |s| {
            s.ensure_book(topic)?;
            s.pending.push(MarketEvent::TopicCreated {
                topic: topic.clone(),
            });
            Ok(())
        })
    }

    // -------------------------------------------------------------------------
    // Buy / sell
    // -------------------------------------------------------------------------

    /// Mint `amount` to the caller. Returns the amount paid, curve cost plus
    /// fees.
    pub fn buy(&self, call: &CallContext, topic: &TopicId, amount: Amount) -> Result<Amount> {
        self.transact("buy", |s| {
            let topic_config = self.topic_config(topic)?;
            ensure_positive(amount)?;
            let quote = self.price_buy(s, &topic_config, amount)?;

            s.ensure_book(topic)?;
            s.tokens.mint(&call.caller, topic, amount)?;
            s.pending.push(MarketEvent::Bought {
                topic: topic.clone(),
                buyer: call.caller,
                amount,
                cost: quote.curve_amount,
                paid: quote.settled,
            });

            let mut budget = self.open_call(s, call)?;
            self.rail
                .pull(&mut s.bank, &self.account, &mut budget, quote.settled)?;
            self.pay_fees(s, topic, FeeOperation::Buy, &quote)?;
            self.close_call(s, budget)?;

            info!(
                target: "market",
                "{} bought {} {} for {} (fees {})",
                call.caller,
                amount,
                topic,
                quote.settled,
                quote.total_fees
            );
            Ok(quote.settled)
        })
    }

    /// Burn `amount` from the caller. Returns the amount received, curve
    /// refund minus fees.
    pub fn sell(&self, call: &CallContext, topic: &TopicId, amount: Amount) -> Result<Amount> {
        self.transact("sell", |s| {
            let topic_config = self.topic_config(topic)?;
            ensure_positive(amount)?;
            self.ensure_holds(s, topic, &call.caller, amount)?;
            let quote = self.price_sell(s, &topic_config, amount)?;

            s.tokens.burn(&call.caller, topic, amount)?;
            s.pending.push(MarketEvent::Sold {
                topic: topic.clone(),
                seller: call.caller,
                amount,
                refund: quote.curve_amount,
                received: quote.settled,
            });

            self.pay_out(s, call, topic, FeeOperation::Sell, &quote)?;

            info!(
                target: "market",
                "{} sold {} {} for {} (fees {})",
                call.caller,
                amount,
                topic,
                quote.settled,
                quote.total_fees
            );
            Ok(quote.settled)
        })
    }

    // -------------------------------------------------------------------------
    // Mortgage engine
    // -------------------------------------------------------------------------

    /// Lock `amount` of the caller's tokens in a new position and pay out
    /// their floor valuation minus mortgage fees.
    pub fn mortgage_new(
        &self,
        call: &CallContext,
        topic: &TopicId,
        amount: Amount,
    ) -> Result<MortgageReceipt> {
        self.transact("mortgage_new", |s| self.open_mortgage(s, call, topic, amount))
    }

    /// Add to the caller's lowest-id position on `topic`, or open one.
    pub fn mortgage(
        &self,
        call: &CallContext,
        topic: &TopicId,
        amount: Amount,
    ) -> Result<MortgageReceipt> {
        self.transact("mortgage", |s| {
            self.topic_config(topic)?;
            match s.positions.ids_for(&call.caller, topic).first() {
                Some(&id) => self.add_to_mortgage(s, call, id, amount),
                None => self.open_mortgage(s, call, topic, amount),
            }
        })
    }

    /// Lock more tokens in an existing position. The payout is priced from
    /// the position's current amount.
    pub fn mortgage_add(
        &self,
        call: &CallContext,
        id: PositionId,
        amount: Amount,
    ) -> Result<MortgageReceipt> {
        self.transact("mortgage_add", |s| self.add_to_mortgage(s, call, id, amount))
    }

    /// Buy back `amount` of collateral. Returns the amount paid. The
    /// position closes, and its id becomes invalid, when nothing is left.
    pub fn redeem(&self, call: &CallContext, id: PositionId, amount: Amount) -> Result<Amount> {
        self.transact("redeem", |s| {
            let position = self.owned_position(s, id, &call.caller)?;
            ensure_positive(amount)?;
            let quote = self.price_redeem(&position, amount)?;
            let remaining = position.amount - amount;

            s.tokens
                .transfer(&self.account, &call.caller, &position.topic, amount)?;
            let closed = remaining == 0;
            if closed {
                s.positions.close(id)?;
            } else {
                s.positions.set_amount(id, remaining)?;
            }
            s.pending.push(MarketEvent::Redeemed {
                position_id: id,
                owner: call.caller,
                topic: position.topic.clone(),
                amount,
                paid: quote.settled,
                closed,
            });

            let mut budget = self.open_call(s, call)?;
            self.rail
                .pull(&mut s.bank, &self.account, &mut budget, quote.settled)?;
            self.close_call(s, budget)?;

            info!(
                target: "market",
                "{} redeemed {} {} from position {} for {}{}",
                call.caller,
                amount,
                position.topic,
                id,
                quote.settled,
                if closed { " (closed)" } else { "" }
            );
            Ok(quote.settled)
        })
    }

    /// Move `amount` out of a position into a new one owned by the caller.
    pub fn split(&self, call: &CallContext, id: PositionId, amount: Amount) -> Result<SplitReceipt> {
        self.transact("split", |s| {
            let position = self.owned_position(s, id, &call.caller)?;
            let quote = self.price_split(&position, amount)?;
            let remaining = position.amount - amount;

            s.positions.set_amount(id, remaining)?;
            let new_id = s.positions.open(&call.caller, &position.topic, amount)?;
            s.pending.push(MarketEvent::PositionSplit {
                source_id: id,
                new_id,
                owner: call.caller,
                topic: position.topic.clone(),
                amount,
                cost: quote.settled,
            });

            let mut budget = self.open_call(s, call)?;
            self.rail
                .pull(&mut s.bank, &self.account, &mut budget, quote.settled)?;
            self.close_call(s, budget)?;

            info!(
                target: "market",
                "{} split {} from position {} into {} for {}",
                call.caller,
                amount,
                id,
                new_id,
                quote.settled
            );
            Ok(SplitReceipt {
                source_id: id,
                new_id,
                remaining,
                amount,
                cost: quote.settled,
            })
        })
    }

    // -------------------------------------------------------------------------
    // Transfers
    // -------------------------------------------------------------------------

    /// Move topic tokens between holders. The market account cannot receive.
    pub fn transfer(
        &self,
        call: &CallContext,
        topic: &TopicId,
        to: &AccountId,
        amount: Amount,
    ) -> Result<()> {
        self.transact("transfer", |s| {
            self.topic_config(topic)?;
            ensure_positive(amount)?;
            if *to == self.account {
                return Err(MarketError::InvalidRecipient(*to));
            }
            self.ensure_holds(s, topic, &call.caller, amount)?;

            s.tokens.transfer(&call.caller, to, topic, amount)?;
            s.pending.push(MarketEvent::TokensTransferred {
                topic: topic.clone(),
                from: call.caller,
                to: *to,
                amount,
            });

            let budget = self.open_call(s, call)?;
            self.close_call(s, budget)?;

            info!(
                target: "market",
                "{} transferred {} {} to {}",
                call.caller,
                amount,
                topic,
                to
            );
            Ok(())
        })
    }

    /// Hand a position to another owner.
    pub fn transfer_position(&self, call: &CallContext, id: PositionId, to: &AccountId) -> Result<()> {
        self.transact("transfer_position", |s| {
            self.owned_position(s, id, &call.caller)?;
            if *to == self.account {
                return Err(MarketError::InvalidRecipient(*to));
            }

            s.positions.transfer(id, to)?;
            s.pending.push(MarketEvent::PositionTransferred {
                position_id: id,
                from: call.caller,
                to: *to,
            });

            let budget = self.open_call(s, call)?;
            self.close_call(s, budget)?;

            info!(target: "market", "Position {} moved from {} to {}", id, call.caller, to);
            Ok(())
        })
    }

    // -------------------------------------------------------------------------
    // Quotes
    // -------------------------------------------------------------------------

    pub fn quote_buy(&self, topic: &TopicId, amount: Amount) -> Result<Quote> {
        let topic_config = self.topic_config(topic)?;
        ensure_positive(amount)?;
        self.price_buy(&self.state.read(), &topic_config, amount)
    }

    pub fn quote_sell(&self, topic: &TopicId, amount: Amount) -> Result<Quote> {
        let topic_config = self.topic_config(topic)?;
        ensure_positive(amount)?;
        self.price_sell(&self.state.read(), &topic_config, amount)
    }

    /// Payout for locking `amount` in a new position.
    pub fn quote_mortgage(&self, topic: &TopicId, amount: Amount) -> Result<Quote> {
        let topic_config = self.topic_config(topic)?;
        ensure_positive(amount)?;
        self.price_mortgage(&topic_config, 0, amount)
    }

    pub fn quote_mortgage_add(&self, id: PositionId, amount: Amount) -> Result<Quote> {
        ensure_positive(amount)?;
        let position = self.position(id)?;
        let topic_config = self.topic_config(&position.topic)?;
        self.price_mortgage(&topic_config, position.amount, amount)
    }

    pub fn quote_redeem(&self, id: PositionId, amount: Amount) -> Result<Quote> {
        ensure_positive(amount)?;
        let position = self.position(id)?;
        self.price_redeem(&position, amount)
    }

    pub fn quote_split(&self, id: PositionId, amount: Amount) -> Result<Quote> {
        let position = self.position(id)?;
        self.price_split(&position, amount)
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    pub fn balance_of(&self, topic: &TopicId, holder: &AccountId) -> Amount {
        self.state.read().tokens.balance_of(topic, holder)
    }

    pub fn total_supply(&self, topic: &TopicId) -> Result<Amount> {
        self.topic_config(topic)?;
        Ok(self.state.read().supply(topic))
    }

    pub fn position(&self, id: PositionId) -> Result<Position> {
        self.state.read().position(id).cloned()
    }

    pub fn position_info(&self, id: PositionId) -> Result<PositionInfo> {
        let position = self.position(id)?;
        Ok(PositionInfo {
            topic: position.topic,
            amount: position.amount,
        })
    }

    pub fn positions_of(&self, owner: &AccountId) -> Vec<PositionId> {
        self.state.read().positions.positions_of(owner)
    }

    pub fn position_ids_for(&self, owner: &AccountId, topic: &TopicId) -> Vec<PositionId> {
        self.state.read().positions.ids_for(owner, topic)
    }

    /// Pay asset held by the market account.
    pub fn reserves(&self) -> Amount {
        self.state.read().bank.balance_of(&self.account)
    }

    /// Take every event committed since the last drain.
    pub fn drain_events(&self) -> Vec<MarketEvent> {
        std::mem::take(&mut *self.events.lock())
    }

    /// Recompute supply, balances and collateral for a topic.
    pub fn audit_topic(&self, topic: &TopicId) -> Result<SupplyAudit> {
        self.topic_config(topic)?;
        let state = self.state.read();

        let (total_supply, holders_total, market_held) = match state.tokens.book(topic) {
            Ok(book) => (
                book.total_supply,
                book.holders_total(),
                book.balance_of(&self.account),
            ),
            Err(_) => (0, 0, 0),
        };
        let open_positions = state.positions.iter().filter(|p| &p.topic == topic).count();
        let audit = SupplyAudit::evaluate(
            topic.clone(),
            total_supply,
            holders_total,
            market_held,
            state.positions.total_locked(topic),
            open_positions,
        );

        if !audit.is_consistent() {
            warn!(target: "market", "Audit of {} failed: {:?}", topic, audit.violations);
        }
        Ok(audit)
    }

    pub fn snapshot(&self) -> MarketSnapshot {
        let state = self.state.read();
        let topics = state
            .tokens
            .books()
            .map(|(topic, book)| TopicSnapshot {
                topic: topic.clone(),
                total_supply: book.total_supply,
                balances: book.balances.iter().map(|(k, v)| (*k, *v)).collect(),
            })
            .collect();

        MarketSnapshot {
            app_id: self.app_id,
            market_account: self.account,
            reserves: state.bank.balance_of(&self.account),
            topics,
            positions: state.positions.iter().cloned().collect(),
        }
    }

    // -------------------------------------------------------------------------
    // Host pay-asset ledger
    // -------------------------------------------------------------------------

    /// Fund an account with the pay asset.
    pub fn credit_pay_asset(&self, account: &AccountId, amount: Amount) -> Result<()> {
        self.state.write().bank.credit(account, amount)?;
        Ok(())
    }

    /// Let the market pull up to `amount` from `owner` (fungible rail).
    pub fn approve_pay_asset(&self, owner: &AccountId, amount: Amount) {
        self.state.write().bank.approve(owner, &self.account, amount);
    }

    pub fn pay_balance_of(&self, account: &AccountId) -> Amount {
        self.state.read().bank.balance_of(account)
    }

    pub fn pay_allowance_of(&self, owner: &AccountId) -> Amount {
        self.state.read().bank.allowance(owner, &self.account)
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn transact<T>(
        &self,
        operation: &'static str,
        f: impl FnOnce(&mut MarketState) -> Result<T>,
    ) -> Result<T> {
        let mut state = self.state.write();
        state.begin();
        match f(&mut *state) {
            Ok(out) => {
                let mut committed = state.commit();
                self.events.lock().append(&mut committed);
                Ok(out)
            }
            Err(err) => {
                state.rollback();
                warn!(target: "market", "{} rejected, state unchanged: {}", operation, err);
                Err(err)
            }
        }
    }

    fn app_config(&self) -> Result<AppConfig> {
        self.registry
            .app(self.app_id)
            .ok_or(MarketError::AppNotFound(self.app_id))
    }

    fn topic_config(&self, topic: &TopicId) -> Result<TopicConfig> {
        self.registry
            .topic(self.app_id, topic)
            .ok_or_else(|| MarketError::UnknownTopic(topic.clone()))
    }

    fn owned_position(
        &self,
        s: &MarketState,
        id: PositionId,
        caller: &AccountId,
    ) -> Result<Position> {
        let position = s.position(id)?;
        if position.owner != *caller {
            return Err(MarketError::NotPositionOwner {
                id,
                caller: *caller,
            });
        }
        Ok(position.clone())
    }

    fn ensure_holds(
        &self,
        s: &MarketState,
        topic: &TopicId,
        holder: &AccountId,
        amount: Amount,
    ) -> Result<()> {
        let available = s.tokens.balance_of(topic, holder);
        if available < amount {
            return Err(MarketError::InsufficientBalance {
                topic: topic.clone(),
                needed: amount,
                available,
            });
        }
        Ok(())
    }

    fn with_fees(
        &self,
        operation: FeeOperation,
        topic: &TopicConfig,
        curve_amount: Amount,
    ) -> Result<Quote> {
        let app = self.app_config()?;
        let schedule = FeeSchedule::new(
            operation,
            &app.fees,
            app.owner,
            app.platform_recipient,
            &topic.nft_owners,
        );
        let quote = Quote::from_breakdown(schedule.breakdown(curve_amount)?)?;
        debug!(
            target: "market",
            "{:?} quote on {}: curve {}, fees {}, settled {}",
            operation,
            topic.topic,
            quote.curve_amount,
            quote.total_fees,
            quote.settled
        );
        Ok(quote)
    }

    fn price_buy(&self, s: &MarketState, topic: &TopicConfig, amount: Amount) -> Result<Quote> {
        let cost = self.curve.price(s.supply(&topic.topic), amount)?;
        self.with_fees(FeeOperation::Buy, topic, cost)
    }

    fn price_sell(&self, s: &MarketState, topic: &TopicConfig, amount: Amount) -> Result<Quote> {
        let supply = s.supply(&topic.topic);
        if supply < amount {
            return Err(MarketError::InsufficientSupply {
                topic: topic.topic.clone(),
                needed: amount,
                available: supply,
            });
        }
        let refund = self.curve.price(supply - amount, amount)?;
        self.with_fees(FeeOperation::Sell, topic, refund)
    }

    /// Value of `amount` collateral stacked on `base` already locked.
    fn price_mortgage(&self, topic: &TopicConfig, base: Amount, amount: Amount) -> Result<Quote> {
        let valuation = self.curve.price(base, amount)?;
        self.with_fees(FeeOperation::Mortgage, topic, valuation)
    }

    fn price_redeem(&self, position: &Position, amount: Amount) -> Result<Quote> {
        if amount > position.amount {
            return Err(MarketError::RedeemExceedsPosition {
                amount,
                position_amount: position.amount,
            });
        }
        let cost = self.curve.price(position.amount - amount, amount)?;
        Ok(Quote::without_fees(cost))
    }

    /// Moving `amount` to a fresh position re-prices it from the floor; the
    /// caller pays the valuation it loses, never less than zero.
    fn price_split(&self, position: &Position, amount: Amount) -> Result<Quote> {
        if amount == 0 || amount >= position.amount {
            return Err(MarketError::InvalidSplitAmount {
                amount,
                position_amount: position.amount,
            });
        }
        let remaining = position.amount - amount;
        let stacked = self.curve.price(remaining, amount)?;
        let floor = self.curve.price(0, amount)?;
        Ok(Quote::without_fees(stacked.saturating_sub(floor)))
    }

    fn open_mortgage(
        &self,
        s: &mut MarketState,
        call: &CallContext,
        topic: &TopicId,
        amount: Amount,
    ) -> Result<MortgageReceipt> {
        let topic_config = self.topic_config(topic)?;
        ensure_positive(amount)?;
        self.ensure_holds(s, topic, &call.caller, amount)?;
        let quote = self.price_mortgage(&topic_config, 0, amount)?;

        s.tokens.transfer(&call.caller, &self.account, topic, amount)?;
        let id = s.positions.open(&call.caller, topic, amount)?;
        s.pending.push(MarketEvent::MortgageOpened {
            position_id: id,
            owner: call.caller,
            topic: topic.clone(),
            amount,
            payout: quote.settled,
        });

        self.pay_out(s, call, topic, FeeOperation::Mortgage, &quote)?;

        info!(
            target: "market",
            "{} opened position {} with {} {} for {} (fees {})",
            call.caller,
            id,
            amount,
            topic,
            quote.settled,
            quote.total_fees
        );
        Ok(MortgageReceipt {
            position_id: id,
            topic: topic.clone(),
            added: amount,
            position_amount: amount,
            quote,
        })
    }

    fn add_to_mortgage(
        &self,
        s: &mut MarketState,
        call: &CallContext,
        id: PositionId,
        amount: Amount,
    ) -> Result<MortgageReceipt> {
        let position = self.owned_position(s, id, &call.caller)?;
        ensure_positive(amount)?;
        let topic = &position.topic;
        self.ensure_holds(s, topic, &call.caller, amount)?;
        let topic_config = self.topic_config(topic)?;
        let quote = self.price_mortgage(&topic_config, position.amount, amount)?;
        let new_amount = position
            .amount
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)?;

        s.tokens.transfer(&call.caller, &self.account, topic, amount)?;
        s.positions.set_amount(id, new_amount)?;
        s.pending.push(MarketEvent::MortgageIncreased {
            position_id: id,
            owner: call.caller,
            topic: topic.clone(),
            added: amount,
            new_amount,
            payout: quote.settled,
        });

        self.pay_out(s, call, topic, FeeOperation::Mortgage, &quote)?;

        info!(
            target: "market",
            "{} added {} {} to position {} for {} (fees {})",
            call.caller,
            amount,
            topic,
            id,
            quote.settled,
            quote.total_fees
        );
        Ok(MortgageReceipt {
            position_id: id,
            topic: topic.clone(),
            added: amount,
            position_amount: new_amount,
            quote,
        })
    }

    fn open_call(&self, s: &mut MarketState, call: &CallContext) -> Result<CallBudget> {
        Ok(self.rail.open_call(&mut s.bank, &self.account, call)?)
    }

    fn close_call(&self, s: &mut MarketState, budget: CallBudget) -> Result<()> {
        let payer = budget.payer;
        let refunded = self.rail.close_call(&mut s.bank, &self.account, budget)?;
        if refunded > 0 {
            s.pending.push(MarketEvent::Refunded {
                account: payer,
                amount: refunded,
            });
        }
        Ok(())
    }

    /// Push every fee cut from the market account, in schedule order.
    fn pay_fees(
        &self,
        s: &mut MarketState,
        topic: &TopicId,
        operation: FeeOperation,
        quote: &Quote,
    ) -> Result<()> {
        for cut in &quote.fees {
            self.rail
                .push(&mut s.bank, &self.account, &cut.recipient, cut.amount)?;
            s.pending.push(MarketEvent::FeePaid {
                topic: topic.clone(),
                operation,
                recipient: cut.recipient,
                role: cut.role,
                amount: cut.amount,
            });
            debug!(
                target: "market",
                "{:?} fee {} to {:?} {}",
                operation,
                cut.amount,
                cut.role,
                cut.recipient
            );
        }
        Ok(())
    }

    /// Settle a payout call: fees first, then the caller's share.
    fn pay_out(
        &self,
        s: &mut MarketState,
        call: &CallContext,
        topic: &TopicId,
        operation: FeeOperation,
        quote: &Quote,
    ) -> Result<()> {
        let budget = self.open_call(s, call)?;
        self.pay_fees(s, topic, operation, quote)?;
        self.rail
            .push(&mut s.bank, &self.account, &call.caller, quote.settled)?;
        self.close_call(s, budget)
    }
}
