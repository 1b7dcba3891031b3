// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 The points-ledger authors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Transaction processing engine.
//!
//! The [`Engine`] validates and commits the five transaction kinds against
//! the ledger, delegating purchase pricing to the promotion catalog and the
//! redemption lifecycle to a pending → processed conditional update.
//!
//! # Transaction Processing
//!
//! - **Purchase**: cashier records a currency spend; points accrue at the
//!   earn rate, shaped by promotions.
//! - **Redemption**: member reserves points for a reward; a cashier later
//!   processes the request, which is when the debit lands.
//! - **Transfer**: member moves points to another member; committed as a
//!   linked debit/credit pair, atomically.
//! - **Adjustment**: manager or cashier corrects an earlier transaction by
//!   a signed delta.
//! - **Event**: organizer or manager awards points to an event guest.
//!
//! # Thread Safety
//!
//! Accounts live in a [`DashMap`]; each account's balance state sits behind
//! its own mutex, held for the full validate-then-commit sequence. Transfers
//! lock both accounts in ascending account-id order, so opposing transfers
//! between the same pair cannot deadlock. The engine has no threads of its
//! own; it is driven by concurrent request handlers.

use crate::account::Account;
use crate::base::{AccountId, Principal, Role, TransactionId};
use crate::ledger::LedgerStore;
use crate::policy::EnginePolicy;
use crate::promotion::PromotionCatalog;
use crate::roster::EventRoster;
use crate::transaction::{
    CommittedTransaction, RedemptionStatus, TransactionKind, TransactionRequest, TransferDirection,
};
use crate::TransactionError;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Read-path projection of one account's state.
///
/// `available` is what a member can actually spend: the cached balance
/// minus points reserved by pending redemptions. Collaborators presenting
/// balances must show encumbrances, not pre-subtract them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceSummary {
    pub account: AccountId,
    pub role: Role,
    pub balance: i64,
    pub available: i64,
    pub encumbered: i64,
    pub suspicious: bool,
}

/// Points ledger and transaction processing engine.
///
/// # Invariants
///
/// - An account's cached balance equals the signed sum of applied ledger
///   amounts for that account (pending redemptions apply nothing until
///   processed).
/// - A transfer commits both legs or neither.
/// - A one-time promotion is consumed at most once per account.
/// - A redemption's status moves `pending → processed` exactly once.
pub struct Engine {
    accounts: DashMap<AccountId, Arc<Account>>,
    ledger: LedgerStore,
    catalog: PromotionCatalog,
    roster: EventRoster,
    policy: EnginePolicy,
    next_id: AtomicU64,
}

impl Engine {
    /// Creates an engine with default policy and no accounts.
    pub fn new() -> Self {
        Self::with_policy(EnginePolicy::default())
    }

    pub fn with_policy(policy: EnginePolicy) -> Self {
        Engine {
            accounts: DashMap::new(),
            ledger: LedgerStore::new(),
            catalog: PromotionCatalog::new(),
            roster: EventRoster::new(),
            policy,
            next_id: AtomicU64::new(1),
        }
    }

    pub fn policy(&self) -> EnginePolicy {
        self.policy
    }

    /// The promotion catalog this engine prices purchases against.
    /// Mutated by the external manager surface.
    pub fn catalog(&self) -> &PromotionCatalog {
        &self.catalog
    }

    /// Event organizers and guest lists.
    pub fn roster(&self) -> &EventRoster {
        &self.roster
    }

    /// The committed transaction log.
    pub fn ledger(&self) -> &LedgerStore {
        &self.ledger
    }

    /// Registers an account with zero balance.
    ///
    /// # Errors
    ///
    /// [`TransactionError::DuplicateAccount`] if the id is taken.
    pub fn register(&self, id: AccountId, role: Role) -> Result<(), TransactionError> {
        match self.accounts.entry(id) {
            Entry::Occupied(_) => Err(TransactionError::DuplicateAccount),
            Entry::Vacant(entry) => {
                entry.insert(Arc::new(Account::new(id, role)));
                Ok(())
            }
        }
    }

    /// Retrieves an account by id.
    pub fn get_account(&self, id: AccountId) -> Option<Arc<Account>> {
        self.accounts.get(&id).map(|account| Arc::clone(&account))
    }

    /// Flags or clears an account for fraud review. Manager-only; the
    /// review workflow itself is an external collaborator.
    pub fn set_suspicious(
        &self,
        id: AccountId,
        flag: bool,
        principal: Principal,
    ) -> Result<(), TransactionError> {
        if !principal.role.at_least(Role::Manager) {
            return Err(TransactionError::Unauthorized);
        }
        let account = self
            .get_account(id)
            .ok_or(TransactionError::UnknownAccount)?;
        account.set_suspicious(flag);
        Ok(())
    }

    /// Consistent snapshot of one account's balance state.
    pub fn balance(&self, id: AccountId) -> Result<BalanceSummary, TransactionError> {
        let account = self
            .get_account(id)
            .ok_or(TransactionError::UnknownAccount)?;
        let data = account.lock();
        Ok(BalanceSummary {
            account: id,
            role: account.role(),
            balance: data.balance,
            available: data.available(),
            encumbered: data.encumbered,
            suspicious: data.suspicious,
        })
    }

    /// Balance snapshots for every account, in ascending account-id order.
    pub fn balances(&self) -> Vec<BalanceSummary> {
        let mut ids: Vec<AccountId> = self.accounts.iter().map(|entry| *entry.key()).collect();
        ids.sort();
        ids.into_iter()
            .filter_map(|id| self.balance(id).ok())
            .collect()
    }

    /// An account's transactions, in commit order.
    pub fn history(&self, id: AccountId) -> Result<Vec<CommittedTransaction>, TransactionError> {
        if !self.accounts.contains_key(&id) {
            return Err(TransactionError::UnknownAccount);
        }
        Ok(self.ledger.history(id))
    }

    /// Validates and commits a transaction request.
    ///
    /// Validation order: principal authorization, then structural checks,
    /// then balance checks under the account's exclusive hold. Nothing is
    /// written to any store before all checks pass.
    ///
    /// # Errors
    ///
    /// - [`TransactionError::Unauthorized`] - Wrong role, or acting on
    ///   another member's behalf where the type forbids it.
    /// - [`TransactionError::InvalidAmount`] - Non-positive amount/spend,
    ///   or zero adjustment delta.
    /// - [`TransactionError::InsufficientBalance`] - Debit exceeds the
    ///   available balance.
    /// - [`TransactionError::UnknownAccount`] /
    ///   [`TransactionError::UnknownCounterpart`] - Missing party.
    /// - Promotion errors from evaluation and consumption (see
    ///   [`PromotionCatalog::evaluate`]).
    /// - [`TransactionError::UnknownEvent`] / [`TransactionError::NotAGuest`]
    ///   for event awards.
    pub fn submit(
        &self,
        request: TransactionRequest,
        principal: Principal,
    ) -> Result<CommittedTransaction, TransactionError> {
        let now = Utc::now();
        match request {
            TransactionRequest::Purchase {
                account,
                spend,
                promotion_ids,
                remark,
            } => self.commit_purchase(account, spend, promotion_ids, remark, principal, now),
            TransactionRequest::Redemption {
                account,
                amount,
                remark,
            } => self.commit_redemption(account, amount, remark, principal, now),
            TransactionRequest::Transfer {
                sender,
                recipient,
                amount,
                remark,
            } => self.commit_transfer(sender, recipient, amount, remark, principal, now),
            TransactionRequest::Adjustment {
                account,
                related,
                delta,
                remark,
            } => self.commit_adjustment(account, related, delta, remark, principal, now),
            TransactionRequest::Event {
                account,
                event,
                amount,
                remark,
            } => self.commit_event(account, event, amount, remark, principal, now),
        }
    }

    /// Processes a pending redemption: debits the requester, stamps the
    /// cashier and timestamp, flips the status.
    ///
    /// # Errors
    ///
    /// - [`TransactionError::Unauthorized`] - Principal is not a cashier
    ///   or manager.
    /// - [`TransactionError::UnknownTransaction`] - No such transaction.
    /// - [`TransactionError::NotARedemption`] - Id names another kind.
    /// - [`TransactionError::AlreadyProcessed`] - Lost the race to another
    ///   cashier; exactly one concurrent call succeeds.
    pub fn process_redemption(
        &self,
        id: TransactionId,
        principal: Principal,
    ) -> Result<CommittedTransaction, TransactionError> {
        if !is_register_staff(principal.role) {
            return Err(TransactionError::Unauthorized);
        }
        let entry = self
            .ledger
            .get(id)
            .ok_or(TransactionError::UnknownTransaction)?;
        if !matches!(entry.kind, TransactionKind::Redemption { .. }) {
            return Err(TransactionError::NotARedemption);
        }
        let account = self
            .get_account(entry.account)
            .ok_or(TransactionError::UnknownAccount)?;

        // Account lock first, then the ledger entry hold: the same order
        // every commit path uses.
        let mut data = account.lock();
        let requested = self.ledger.mark_processed(id, principal.account, Utc::now())?;
        data.settle(requested)?;
        drop(data);

        self.ledger.get(id).ok_or(TransactionError::UnknownTransaction)
    }

    // === Per-type handlers ===

    fn commit_purchase(
        &self,
        account_id: AccountId,
        spend: Decimal,
        promotion_ids: Vec<crate::base::PromotionId>,
        remark: String,
        principal: Principal,
        now: DateTime<Utc>,
    ) -> Result<CommittedTransaction, TransactionError> {
        if !is_register_staff(principal.role) {
            return Err(TransactionError::Unauthorized);
        }
        if spend <= Decimal::ZERO {
            return Err(TransactionError::InvalidAmount);
        }
        let account = self
            .get_account(account_id)
            .ok_or(TransactionError::UnknownAccount)?;

        let outcome = self.catalog.evaluate(
            account_id,
            spend,
            &promotion_ids,
            now,
            self.policy.earn_rate,
        )?;

        // Consumption and commit happen under one hold so a losing
        // concurrent purchase fails before anything is written.
        let mut data = account.lock();
        self.catalog.consume(account_id, &outcome.consumed, now)?;
        if outcome.awarded_points > 0 {
            data.credit(outcome.awarded_points)?;
        }
        let entry = CommittedTransaction {
            id: self.allocate_id(),
            account: account_id,
            amount: outcome.awarded_points,
            kind: TransactionKind::Purchase {
                spend: outcome.final_spend,
                promotion_ids,
                cashier: principal.account,
            },
            created_at: now,
            remark,
        };
        self.ledger.append(entry.clone());
        Ok(entry)
    }

    fn commit_redemption(
        &self,
        account_id: AccountId,
        amount: i64,
        remark: String,
        principal: Principal,
        now: DateTime<Utc>,
    ) -> Result<CommittedTransaction, TransactionError> {
        // Members request redemptions for themselves only.
        if principal.account != account_id {
            return Err(TransactionError::Unauthorized);
        }
        if amount <= 0 {
            return Err(TransactionError::InvalidAmount);
        }
        let account = self
            .get_account(account_id)
            .ok_or(TransactionError::UnknownAccount)?;

        let mut data = account.lock();
        data.encumber(amount)?;
        let entry = CommittedTransaction {
            id: self.allocate_id(),
            account: account_id,
            amount: -amount,
            kind: TransactionKind::Redemption {
                requested: amount,
                status: RedemptionStatus::Pending,
                processed_by: None,
                processed_at: None,
            },
            created_at: now,
            remark,
        };
        self.ledger.append(entry.clone());
        Ok(entry)
    }

    fn commit_transfer(
        &self,
        sender_id: AccountId,
        recipient_id: AccountId,
        amount: i64,
        remark: String,
        principal: Principal,
        now: DateTime<Utc>,
    ) -> Result<CommittedTransaction, TransactionError> {
        // Members send from their own account only.
        if principal.account != sender_id {
            return Err(TransactionError::Unauthorized);
        }
        if amount <= 0 {
            return Err(TransactionError::InvalidAmount);
        }
        if sender_id == recipient_id {
            return Err(TransactionError::SelfTransfer);
        }
        let sender = self
            .get_account(sender_id)
            .ok_or(TransactionError::UnknownAccount)?;
        let recipient = self
            .get_account(recipient_id)
            .ok_or(TransactionError::UnknownCounterpart)?;

        // Fixed global lock order: ascending account id, regardless of
        // which side is sending.
        let (mut sender_data, mut recipient_data) = if sender_id < recipient_id {
            let s = sender.lock();
            let r = recipient.lock();
            (s, r)
        } else {
            let r = recipient.lock();
            let s = sender.lock();
            (s, r)
        };

        sender_data.debit(amount)?;
        recipient_data.credit(amount)?;

        let debit_id = self.allocate_id();
        let credit_id = self.allocate_id();
        let debit_entry = CommittedTransaction {
            id: debit_id,
            account: sender_id,
            amount: -amount,
            kind: TransactionKind::Transfer {
                counterpart: recipient_id,
                paired_with: credit_id,
                direction: TransferDirection::Sent,
            },
            created_at: now,
            remark: remark.clone(),
        };
        let credit_entry = CommittedTransaction {
            id: credit_id,
            account: recipient_id,
            amount,
            kind: TransactionKind::Transfer {
                counterpart: sender_id,
                paired_with: debit_id,
                direction: TransferDirection::Received,
            },
            created_at: now,
            remark,
        };
        self.ledger.append(debit_entry.clone());
        self.ledger.append(credit_entry);
        Ok(debit_entry)
    }

    fn commit_adjustment(
        &self,
        account_id: AccountId,
        related: TransactionId,
        delta: i64,
        remark: String,
        principal: Principal,
        now: DateTime<Utc>,
    ) -> Result<CommittedTransaction, TransactionError> {
        if !is_register_staff(principal.role) {
            return Err(TransactionError::Unauthorized);
        }
        if delta == 0 {
            return Err(TransactionError::InvalidAmount);
        }
        // Audit trail: the correction must point at a real transaction.
        if !self.ledger.contains(related) {
            return Err(TransactionError::UnknownTransaction);
        }
        let account = self
            .get_account(account_id)
            .ok_or(TransactionError::UnknownAccount)?;

        let mut data = account.lock();
        data.adjust(delta, self.policy.allow_negative_adjustment)?;
        let entry = CommittedTransaction {
            id: self.allocate_id(),
            account: account_id,
            amount: delta,
            kind: TransactionKind::Adjustment {
                related,
                authorized_by: principal.account,
            },
            created_at: now,
            remark,
        };
        self.ledger.append(entry.clone());
        Ok(entry)
    }

    fn commit_event(
        &self,
        account_id: AccountId,
        event: crate::base::EventId,
        amount: i64,
        remark: String,
        principal: Principal,
        now: DateTime<Utc>,
    ) -> Result<CommittedTransaction, TransactionError> {
        if amount <= 0 {
            return Err(TransactionError::InvalidAmount);
        }
        // Managers may award for any event; anyone else must be one of
        // this event's organizers.
        if !principal.role.at_least(Role::Manager)
            && !self.roster.is_organizer(event, principal.account)?
        {
            return Err(TransactionError::Unauthorized);
        }
        let account = self
            .get_account(account_id)
            .ok_or(TransactionError::UnknownAccount)?;
        if !self.roster.is_eligible_guest(
            event,
            account_id,
            self.policy.require_confirmed_attendance,
        )? {
            return Err(TransactionError::NotAGuest);
        }

        let mut data = account.lock();
        data.credit(amount)?;
        let entry = CommittedTransaction {
            id: self.allocate_id(),
            account: account_id,
            amount,
            kind: TransactionKind::Event {
                event,
                awarded_by: principal.account,
            },
            created_at: now,
            remark,
        };
        self.ledger.append(entry.clone());
        Ok(entry)
    }

    fn allocate_id(&self) -> TransactionId {
        TransactionId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

/// Roles allowed to run the register: create purchases and adjustments,
/// and process redemptions.
fn is_register_staff(role: Role) -> bool {
    matches!(role, Role::Cashier | Role::Manager | Role::Superuser)
}
