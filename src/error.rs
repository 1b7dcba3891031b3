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

//! Error types for transaction processing.
//!
//! Authorization and validation errors are raised before any store write;
//! conflict errors are raised atomically, with no partial write observable.
//! All failures are deterministic — callers must not retry them.

use crate::base::PromotionId;
use thiserror::Error;

/// Transaction processing errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransactionError {
    /// Acting principal's role does not permit this transaction type,
    /// or the principal is acting on an account it may not act for
    #[error("principal not authorized for this transaction")]
    Unauthorized,

    /// Amount is zero or negative where a positive amount is required
    #[error("invalid amount (must be positive)")]
    InvalidAmount,

    /// Debit exceeds the available balance (balance minus encumbrances)
    #[error("insufficient available balance")]
    InsufficientBalance,

    /// Primary account does not exist
    #[error("account not found")]
    UnknownAccount,

    /// Account id already registered
    #[error("account already registered")]
    DuplicateAccount,

    /// Transfer counterpart does not exist
    #[error("transfer counterpart not found")]
    UnknownCounterpart,

    /// Transfer sender and recipient are the same account
    #[error("cannot transfer points to the same account")]
    SelfTransfer,

    /// Referenced transaction id does not exist
    #[error("transaction not found")]
    UnknownTransaction,

    /// Referenced transaction is not a redemption
    #[error("transaction is not a redemption")]
    NotARedemption,

    /// Redemption has already been processed
    #[error("redemption already processed")]
    AlreadyProcessed,

    /// Requested promotion id does not exist
    #[error("promotion {0} not found")]
    UnknownPromotion(PromotionId),

    /// Promotion exists but the purchase does not qualify
    /// (outside validity window or under the minimum spend)
    #[error("purchase not eligible for promotion {0}")]
    PromotionIneligible(PromotionId),

    /// One-time promotion already consumed by this account
    #[error("one-time promotion {0} already used by this account")]
    DuplicateOneTimePromotionUse(PromotionId),

    /// Referenced event does not exist
    #[error("event not found")]
    UnknownEvent,

    /// Award recipient is not on the event's guest list
    #[error("recipient is not a guest of this event")]
    NotAGuest,
}

#[cfg(test)]
mod tests {
    use super::TransactionError;
    use crate::base::PromotionId;

    #[test]
    fn error_display_messages() {
        assert_eq!(
            TransactionError::Unauthorized.to_string(),
            "principal not authorized for this transaction"
        );
        assert_eq!(
            TransactionError::InvalidAmount.to_string(),
            "invalid amount (must be positive)"
        );
        assert_eq!(
            TransactionError::InsufficientBalance.to_string(),
            "insufficient available balance"
        );
        assert_eq!(TransactionError::UnknownAccount.to_string(), "account not found");
        assert_eq!(
            TransactionError::DuplicateAccount.to_string(),
            "account already registered"
        );
        assert_eq!(
            TransactionError::UnknownCounterpart.to_string(),
            "transfer counterpart not found"
        );
        assert_eq!(
            TransactionError::SelfTransfer.to_string(),
            "cannot transfer points to the same account"
        );
        assert_eq!(TransactionError::UnknownTransaction.to_string(), "transaction not found");
        assert_eq!(
            TransactionError::NotARedemption.to_string(),
            "transaction is not a redemption"
        );
        assert_eq!(
            TransactionError::AlreadyProcessed.to_string(),
            "redemption already processed"
        );
        assert_eq!(
            TransactionError::UnknownPromotion(PromotionId(5)).to_string(),
            "promotion 5 not found"
        );
        assert_eq!(
            TransactionError::PromotionIneligible(PromotionId(5)).to_string(),
            "purchase not eligible for promotion 5"
        );
        assert_eq!(
            TransactionError::DuplicateOneTimePromotionUse(PromotionId(5)).to_string(),
            "one-time promotion 5 already used by this account"
        );
        assert_eq!(TransactionError::UnknownEvent.to_string(), "event not found");
        assert_eq!(
            TransactionError::NotAGuest.to_string(),
            "recipient is not a guest of this event"
        );
    }

    #[test]
    fn errors_are_cloneable() {
        let error = TransactionError::InsufficientBalance;
        let cloned = error.clone();
        assert_eq!(error, cloned);
    }
}
