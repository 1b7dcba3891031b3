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

//! Append-mostly ledger of committed transactions.
//!
//! Entries are immutable once committed, with one exception: a redemption's
//! status may flip `pending → processed`, exactly once, through
//! [`LedgerStore::mark_processed`]. The flip is a conditional update under
//! an exclusive hold on the entry, so concurrent processing attempts
//! resolve to one winner.

use crate::TransactionError;
use crate::base::{AccountId, TransactionId};
use crate::transaction::{CommittedTransaction, RedemptionStatus, TransactionKind};
use chrono::{DateTime, Utc};
use crossbeam::queue::SegQueue;
use dashmap::DashMap;

/// Thread-safe transaction log with per-account history.
///
/// A [`DashMap`] provides O(1) lookup by id; a [`SegQueue`] records global
/// commit order; a per-account index serves the history read path in
/// commit order.
#[derive(Debug)]
pub struct LedgerStore {
    /// Committed entries indexed by transaction id.
    entries: DashMap<TransactionId, CommittedTransaction>,

    /// Global commit order (append-only).
    commit_order: SegQueue<TransactionId>,

    /// Entry ids per account, in commit order.
    by_account: DashMap<AccountId, Vec<TransactionId>>,
}

impl LedgerStore {
    /// Creates an empty ledger.
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            commit_order: SegQueue::new(),
            by_account: DashMap::new(),
        }
    }

    /// Appends a committed entry.
    ///
    /// Ids are engine-assigned from a monotonic counter, so a collision
    /// here is a programming error, not a runtime condition.
    pub(crate) fn append(&self, entry: CommittedTransaction) {
        let id = entry.id;
        let account = entry.account;
        let previous = self.entries.insert(id, entry);
        debug_assert!(previous.is_none(), "duplicate transaction id {id}");
        self.commit_order.push(id);
        self.by_account.entry(account).or_default().push(id);
    }

    /// Looks up a committed entry by id.
    pub fn get(&self, id: TransactionId) -> Option<CommittedTransaction> {
        self.entries.get(&id).map(|entry| entry.clone())
    }

    /// Whether an entry with this id has been committed.
    pub fn contains(&self, id: TransactionId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Number of committed entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries for an account, in commit order.
    pub fn history(&self, account: AccountId) -> Vec<CommittedTransaction> {
        match self.by_account.get(&account) {
            Some(ids) => ids
                .iter()
                .filter_map(|id| self.entries.get(id).map(|entry| entry.clone()))
                .collect(),
            None => Vec::new(),
        }
    }

    /// Flips a pending redemption to processed, stamping the cashier.
    ///
    /// Returns the requested point amount so the caller can settle the
    /// account's encumbrance.
    ///
    /// # Errors
    ///
    /// - [`TransactionError::UnknownTransaction`] — no entry with this id.
    /// - [`TransactionError::NotARedemption`] — entry is another kind.
    /// - [`TransactionError::AlreadyProcessed`] — status already flipped.
    pub(crate) fn mark_processed(
        &self,
        id: TransactionId,
        cashier: AccountId,
        at: DateTime<Utc>,
    ) -> Result<i64, TransactionError> {
        let mut entry = self
            .entries
            .get_mut(&id)
            .ok_or(TransactionError::UnknownTransaction)?;

        match &mut entry.kind {
            TransactionKind::Redemption {
                requested,
                status,
                processed_by,
                processed_at,
            } => {
                if *status == RedemptionStatus::Processed {
                    return Err(TransactionError::AlreadyProcessed);
                }
                *status = RedemptionStatus::Processed;
                *processed_by = Some(cashier);
                *processed_at = Some(at);
                Ok(*requested)
            }
            _ => Err(TransactionError::NotARedemption),
        }
    }
}

impl Default for LedgerStore {
    fn default() -> Self {
        Self::new()
    }
}
