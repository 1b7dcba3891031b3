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

//! Account state and balance primitives.
//!
//! The cached balance is mutated only by the engine, under this account's
//! mutex, so it always equals the signed sum of applied ledger amounts.
//! Pending redemptions are tracked as an encumbrance: not yet debited, but
//! excluded from the available balance every debit validates against.
//!
//! # Example
//!
//! ```
//! use points_ledger::{Account, AccountId, Role};
//!
//! let account = Account::new(AccountId(1), Role::Member);
//! assert_eq!(account.balance(), 0);
//! assert_eq!(account.available(), 0);
//! ```

use crate::TransactionError;
use crate::base::{AccountId, Role};
use parking_lot::{Mutex, MutexGuard};

#[derive(Debug)]
pub(crate) struct AccountData {
    pub(crate) balance: i64,
    /// Total points tied up in pending redemption requests.
    pub(crate) encumbered: i64,
    pub(crate) suspicious: bool,
}

impl AccountData {
    fn new() -> Self {
        Self {
            balance: 0,
            encumbered: 0,
            suspicious: false,
        }
    }

    fn assert_invariants(&self) {
        debug_assert!(
            self.encumbered >= 0,
            "Invariant violated: encumbered total went negative: {}",
            self.encumbered
        );
    }

    /// Points not tied up in pending redemptions.
    pub(crate) fn available(&self) -> i64 {
        self.balance - self.encumbered
    }

    /// Increases the balance.
    pub(crate) fn credit(&mut self, amount: i64) -> Result<(), TransactionError> {
        if amount <= 0 {
            return Err(TransactionError::InvalidAmount);
        }
        self.balance += amount;
        self.assert_invariants();
        Ok(())
    }

    /// Decreases the balance, validated against the available balance.
    pub(crate) fn debit(&mut self, amount: i64) -> Result<(), TransactionError> {
        if amount <= 0 {
            return Err(TransactionError::InvalidAmount);
        }
        if self.available() < amount {
            return Err(TransactionError::InsufficientBalance);
        }
        self.balance -= amount;
        self.assert_invariants();
        Ok(())
    }

    /// Reserves points for a pending redemption without debiting them.
    pub(crate) fn encumber(&mut self, amount: i64) -> Result<(), TransactionError> {
        if amount <= 0 {
            return Err(TransactionError::InvalidAmount);
        }
        if self.available() < amount {
            return Err(TransactionError::InsufficientBalance);
        }
        self.encumbered += amount;
        self.assert_invariants();
        Ok(())
    }

    /// Converts a reservation into an actual debit (redemption processing).
    pub(crate) fn settle(&mut self, amount: i64) -> Result<(), TransactionError> {
        if amount <= 0 {
            return Err(TransactionError::InvalidAmount);
        }
        if self.encumbered < amount {
            return Err(TransactionError::InsufficientBalance);
        }
        self.encumbered -= amount;
        self.balance -= amount;
        self.assert_invariants();
        Ok(())
    }

    /// Applies a signed correction delta.
    ///
    /// A negative delta that would push the balance under the encumbered
    /// total is rejected unless `allow_negative` is set.
    pub(crate) fn adjust(
        &mut self,
        delta: i64,
        allow_negative: bool,
    ) -> Result<(), TransactionError> {
        if delta == 0 {
            return Err(TransactionError::InvalidAmount);
        }
        if !allow_negative && self.balance + delta < self.encumbered {
            return Err(TransactionError::InsufficientBalance);
        }
        self.balance += delta;
        self.assert_invariants();
        Ok(())
    }
}

/// A point-holding account.
#[derive(Debug)]
pub struct Account {
    id: AccountId,
    role: Role,
    inner: Mutex<AccountData>,
}

impl Account {
    pub fn new(id: AccountId, role: Role) -> Self {
        Self {
            id,
            role,
            inner: Mutex::new(AccountData::new()),
        }
    }

    pub fn id(&self) -> AccountId {
        self.id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// Cached point balance (pending redemptions not yet subtracted).
    pub fn balance(&self) -> i64 {
        self.inner.lock().balance
    }

    /// Balance minus pending redemption encumbrances.
    pub fn available(&self) -> i64 {
        self.inner.lock().available()
    }

    /// Total points reserved by pending redemptions.
    pub fn encumbered(&self) -> i64 {
        self.inner.lock().encumbered
    }

    pub fn suspicious(&self) -> bool {
        self.inner.lock().suspicious
    }

    pub(crate) fn set_suspicious(&self, flag: bool) {
        self.inner.lock().suspicious = flag;
    }

    /// Exclusive hold on the balance state for validate-then-commit
    /// sequences. Callers locking two accounts must lock in ascending
    /// account-id order.
    pub(crate) fn lock(&self) -> MutexGuard<'_, AccountData> {
        self.inner.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credit_and_debit_move_balance() {
        let mut data = AccountData::new();
        data.credit(100).unwrap();
        data.debit(30).unwrap();
        assert_eq!(data.balance, 70);
        assert_eq!(data.available(), 70);
    }

    #[test]
    fn debit_validates_against_available_not_balance() {
        let mut data = AccountData::new();
        data.credit(100).unwrap();
        data.encumber(80).unwrap();
        // Balance is 100, but 80 is spoken for.
        assert_eq!(data.available(), 20);
        assert_eq!(data.debit(50), Err(TransactionError::InsufficientBalance));
        data.debit(20).unwrap();
        assert_eq!(data.balance, 80);
    }

    #[test]
    fn encumber_rejects_over_available() {
        let mut data = AccountData::new();
        data.credit(300).unwrap();
        assert_eq!(data.encumber(500), Err(TransactionError::InsufficientBalance));
        assert_eq!(data.encumbered, 0);
    }

    #[test]
    fn settle_debits_and_releases() {
        let mut data = AccountData::new();
        data.credit(100).unwrap();
        data.encumber(60).unwrap();
        data.settle(60).unwrap();
        assert_eq!(data.balance, 40);
        assert_eq!(data.encumbered, 0);
        assert_eq!(data.available(), 40);
    }

    #[test]
    fn settle_more_than_encumbered_fails() {
        let mut data = AccountData::new();
        data.credit(100).unwrap();
        data.encumber(30).unwrap();
        assert_eq!(data.settle(50), Err(TransactionError::InsufficientBalance));
    }

    #[test]
    fn adjust_respects_negative_policy() {
        let mut data = AccountData::new();
        data.credit(50).unwrap();
        assert_eq!(
            data.adjust(-80, false),
            Err(TransactionError::InsufficientBalance)
        );
        assert_eq!(data.balance, 50);
        data.adjust(-80, true).unwrap();
        assert_eq!(data.balance, -30);
    }

    #[test]
    fn adjust_cannot_undercut_encumbrance() {
        let mut data = AccountData::new();
        data.credit(100).unwrap();
        data.encumber(90).unwrap();
        // Balance would stay positive but drop below what is reserved.
        assert_eq!(
            data.adjust(-20, false),
            Err(TransactionError::InsufficientBalance)
        );
    }

    #[test]
    fn zero_and_negative_amounts_rejected() {
        let mut data = AccountData::new();
        assert_eq!(data.credit(0), Err(TransactionError::InvalidAmount));
        assert_eq!(data.debit(-5), Err(TransactionError::InvalidAmount));
        assert_eq!(data.encumber(0), Err(TransactionError::InvalidAmount));
        assert_eq!(data.adjust(0, true), Err(TransactionError::InvalidAmount));
    }

    #[test]
    fn account_exposes_role_and_flag() {
        let account = Account::new(AccountId(9), Role::Cashier);
        assert_eq!(account.id(), AccountId(9));
        assert_eq!(account.role(), Role::Cashier);
        assert!(!account.suspicious());
        account.set_suspicious(true);
        assert!(account.suspicious());
    }
}
