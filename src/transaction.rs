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

//! Transaction requests and committed ledger entries.
//!
//! Each transaction kind is its own variant carrying only the fields that
//! kind needs. A committed entry is immutable except for the redemption
//! status, which moves one way:
//! - [`RedemptionStatus::Pending`] → [`RedemptionStatus::Processed`]

use crate::base::{AccountId, EventId, PromotionId, TransactionId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A transaction submitted for validation and commit.
///
/// Requests carry no transaction id; the engine assigns one at commit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TransactionRequest {
    /// A purchase at the register: currency spend earns points, optionally
    /// shaped by promotions.
    Purchase {
        account: AccountId,
        spend: Decimal,
        promotion_ids: Vec<PromotionId>,
        remark: String,
    },
    /// A member's request to convert points into a reward; debited only
    /// when a cashier processes it.
    Redemption {
        account: AccountId,
        amount: i64,
        remark: String,
    },
    /// Point transfer between two members, committed as a linked
    /// debit/credit pair.
    Transfer {
        sender: AccountId,
        recipient: AccountId,
        amount: i64,
        remark: String,
    },
    /// Manual correction referencing an earlier transaction.
    Adjustment {
        account: AccountId,
        related: TransactionId,
        delta: i64,
        remark: String,
    },
    /// Point award for attending an event.
    Event {
        account: AccountId,
        event: EventId,
        amount: i64,
        remark: String,
    },
}

impl TransactionRequest {
    /// The primary account the request acts on (the sender, for transfers).
    pub fn account(&self) -> AccountId {
        match self {
            Self::Purchase { account, .. } => *account,
            Self::Redemption { account, .. } => *account,
            Self::Transfer { sender, .. } => *sender,
            Self::Adjustment { account, .. } => *account,
            Self::Event { account, .. } => *account,
        }
    }
}

/// Processing state of a redemption entry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RedemptionStatus {
    Pending,
    Processed,
}

/// Direction of one leg of a transfer pair.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TransferDirection {
    Sent,
    Received,
}

/// Kind-specific payload of a committed entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TransactionKind {
    Purchase {
        /// Spend after promotion discounts.
        spend: Decimal,
        promotion_ids: Vec<PromotionId>,
        cashier: AccountId,
    },
    Redemption {
        requested: i64,
        status: RedemptionStatus,
        processed_by: Option<AccountId>,
        processed_at: Option<DateTime<Utc>>,
    },
    Transfer {
        counterpart: AccountId,
        /// The other leg of the pair; both legs commit together.
        paired_with: TransactionId,
        direction: TransferDirection,
    },
    Adjustment {
        related: TransactionId,
        authorized_by: AccountId,
    },
    Event {
        event: EventId,
        awarded_by: AccountId,
    },
}

/// An entry in the ledger.
///
/// `amount` is the signed point delta this entry applies to `account` —
/// except for redemptions, where the debit is applied only at processing
/// (the entry carries `-requested` from the start, but a pending entry
/// contributes nothing to the balance until its status flips).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CommittedTransaction {
    pub id: TransactionId,
    pub account: AccountId,
    pub amount: i64,
    pub kind: TransactionKind,
    pub created_at: DateTime<Utc>,
    pub remark: String,
}

impl CommittedTransaction {
    /// The point delta this entry has actually applied to its account's
    /// balance: zero while a redemption is still pending.
    pub fn applied_amount(&self) -> i64 {
        match &self.kind {
            TransactionKind::Redemption {
                status: RedemptionStatus::Pending,
                ..
            } => 0,
            _ => self.amount,
        }
    }

    /// Whether this entry is a redemption awaiting processing.
    pub fn is_pending_redemption(&self) -> bool {
        matches!(
            self.kind,
            TransactionKind::Redemption {
                status: RedemptionStatus::Pending,
                ..
            }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn redemption(status: RedemptionStatus) -> CommittedTransaction {
        CommittedTransaction {
            id: TransactionId(1),
            account: AccountId(1),
            amount: -100,
            kind: TransactionKind::Redemption {
                requested: 100,
                status,
                processed_by: None,
                processed_at: None,
            },
            created_at: Utc::now(),
            remark: String::new(),
        }
    }

    #[test]
    fn pending_redemption_applies_nothing() {
        let entry = redemption(RedemptionStatus::Pending);
        assert!(entry.is_pending_redemption());
        assert_eq!(entry.applied_amount(), 0);
    }

    #[test]
    fn processed_redemption_applies_debit() {
        let entry = redemption(RedemptionStatus::Processed);
        assert!(!entry.is_pending_redemption());
        assert_eq!(entry.applied_amount(), -100);
    }

    #[test]
    fn request_reports_primary_account() {
        let request = TransactionRequest::Transfer {
            sender: AccountId(3),
            recipient: AccountId(4),
            amount: 10,
            remark: String::new(),
        };
        assert_eq!(request.account(), AccountId(3));
    }
}
