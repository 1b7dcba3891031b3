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

//! # Points Ledger
//!
//! A points ledger and transaction processing engine for a loyalty-rewards
//! program: members accrue and spend points through purchases, transfers,
//! redemptions, manual adjustments, and event attendance awards.
//!
//! ## Core Components
//!
//! - [`Engine`]: Central transaction processor; validates and commits the
//!   five transaction kinds and runs the redemption lifecycle
//! - [`Account`]: Point-holding account with a cached balance and pending
//!   redemption encumbrances
//! - [`PromotionCatalog`]: Promotion definitions, purchase pricing, and
//!   one-time consumption records
//! - [`LedgerStore`]: Append-mostly log of committed transactions
//! - [`TransactionRequest`] / [`CommittedTransaction`]: Typed transaction
//!   variants, one per kind
//! - [`TransactionError`]: Failure taxonomy for validation, authorization,
//!   and conflicts
//!
//! ## Example
//!
//! ```
//! use points_ledger::{
//!     AccountId, Engine, Principal, Role, TransactionRequest,
//! };
//! use rust_decimal_macros::dec;
//!
//! let engine = Engine::new();
//! engine.register(AccountId(1), Role::Member).unwrap();
//! engine.register(AccountId(2), Role::Cashier).unwrap();
//!
//! // A cashier rings up a 100-unit purchase; the member earns 100 points
//! // at the default earn rate.
//! let cashier = Principal::new(AccountId(2), Role::Cashier);
//! engine
//!     .submit(
//!         TransactionRequest::Purchase {
//!             account: AccountId(1),
//!             spend: dec!(100),
//!             promotion_ids: vec![],
//!             remark: String::new(),
//!         },
//!         cashier,
//!     )
//!     .unwrap();
//!
//! assert_eq!(engine.balance(AccountId(1)).unwrap().balance, 100);
//! ```
//!
//! ## Thread Safety
//!
//! The engine is driven by concurrent request handlers. Per-account mutexes
//! cover each validate-then-commit sequence; transfers lock both parties in
//! ascending account-id order; one-time promotion consumption and redemption
//! processing are conditional updates that admit exactly one winner.

pub mod account;
mod base;
mod engine;
pub mod error;
mod ledger;
mod policy;
mod promotion;
mod roster;
mod transaction;

pub use account::Account;
pub use base::{AccountId, EventId, Principal, PromotionId, Role, TransactionId};
pub use engine::{BalanceSummary, Engine};
pub use error::TransactionError;
pub use ledger::LedgerStore;
pub use policy::EnginePolicy;
pub use promotion::{Promotion, PromotionCatalog, PromotionKind, PromotionOutcome, RewardRule};
pub use roster::EventRoster;
pub use transaction::{
    CommittedTransaction, RedemptionStatus, TransactionKind, TransactionRequest, TransferDirection,
};
