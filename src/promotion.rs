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

//! Promotion definitions, eligibility, and one-time consumption.
//!
//! Stacking policy: rate discounts compound multiplicatively over the
//! spend, then flat bonuses add after the earn-rate computation. The
//! policy lives here, centrally, so every caller prices a purchase the
//! same way.

use crate::TransactionError;
use crate::base::{AccountId, PromotionId};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

/// Whether a promotion is reusable or single-use per account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromotionKind {
    Automatic,
    OneTime,
}

/// How a promotion rewards a qualifying purchase. The two forms are
/// mutually exclusive by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RewardRule {
    /// Percentage discount on the spend: `discount = spend × rate / 100`.
    Rate(Decimal),
    /// Fixed point bonus added after the earn-rate computation.
    FlatPoints(i64),
}

/// A manager-defined promotion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Promotion {
    pub id: PromotionId,
    pub name: String,
    pub kind: PromotionKind,
    pub rule: RewardRule,
    /// Purchases under this spend do not qualify.
    pub min_spending: Option<Decimal>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
}

impl Promotion {
    /// Whether the validity window contains `now` (inclusive bounds).
    pub fn active_at(&self, now: DateTime<Utc>) -> bool {
        self.starts_at <= now && now <= self.ends_at
    }
}

/// Result of pricing a purchase against a set of promotions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromotionOutcome {
    /// Spend after rate discounts.
    pub final_spend: Decimal,
    /// Points the purchase earns, never negative.
    pub awarded_points: i64,
    /// One-time promotions this purchase will consume on commit.
    pub consumed: Vec<PromotionId>,
}

/// Durable store of promotion definitions and per-account consumption.
///
/// The `(account, promotion)` uses map is the authoritative "already
/// used" record; its entry API is the uniqueness constraint that makes
/// concurrent double-consumption impossible.
#[derive(Debug, Default)]
pub struct PromotionCatalog {
    promotions: DashMap<PromotionId, Promotion>,
    uses: DashMap<(AccountId, PromotionId), DateTime<Utc>>,
}

impl PromotionCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a promotion definition.
    pub fn define(&self, promotion: Promotion) {
        self.promotions.insert(promotion.id, promotion);
    }

    /// Replaces an existing definition.
    pub fn update(&self, promotion: Promotion) -> Result<(), TransactionError> {
        match self.promotions.entry(promotion.id) {
            Entry::Occupied(mut entry) => {
                entry.insert(promotion);
                Ok(())
            }
            Entry::Vacant(_) => Err(TransactionError::UnknownPromotion(promotion.id)),
        }
    }

    /// Deletes a definition. Consumption records are kept for audit.
    pub fn remove(&self, id: PromotionId) -> Result<(), TransactionError> {
        self.promotions
            .remove(&id)
            .map(|_| ())
            .ok_or(TransactionError::UnknownPromotion(id))
    }

    pub fn get(&self, id: PromotionId) -> Option<Promotion> {
        self.promotions.get(&id).map(|p| p.clone())
    }

    /// When `account` consumed one-time promotion `id`, if ever.
    pub fn used_at(&self, account: AccountId, id: PromotionId) -> Option<DateTime<Utc>> {
        self.uses.get(&(account, id)).map(|at| *at)
    }

    /// Prices a prospective purchase against the requested promotions.
    ///
    /// Every requested promotion must qualify; an unknown, expired, or
    /// under-minimum promotion fails the whole evaluation rather than
    /// silently dropping out.
    ///
    /// # Errors
    ///
    /// - [`TransactionError::InvalidAmount`] — spend is zero or negative.
    /// - [`TransactionError::UnknownPromotion`] — id not in the catalog.
    /// - [`TransactionError::PromotionIneligible`] — outside the validity
    ///   window, under the minimum spend, or listed twice.
    /// - [`TransactionError::DuplicateOneTimePromotionUse`] — one-time
    ///   promotion already consumed by this account.
    pub fn evaluate(
        &self,
        account: AccountId,
        spend: Decimal,
        promotion_ids: &[PromotionId],
        now: DateTime<Utc>,
        earn_rate: Decimal,
    ) -> Result<PromotionOutcome, TransactionError> {
        if spend <= Decimal::ZERO {
            return Err(TransactionError::InvalidAmount);
        }

        let mut rates: Vec<Decimal> = Vec::new();
        let mut flat_bonus: i64 = 0;
        let mut consumed: Vec<PromotionId> = Vec::new();
        let mut seen: Vec<PromotionId> = Vec::new();

        for &id in promotion_ids {
            if seen.contains(&id) {
                return Err(TransactionError::PromotionIneligible(id));
            }
            seen.push(id);

            let promotion = self
                .promotions
                .get(&id)
                .ok_or(TransactionError::UnknownPromotion(id))?;

            if !promotion.active_at(now) {
                return Err(TransactionError::PromotionIneligible(id));
            }
            if let Some(min) = promotion.min_spending {
                if spend < min {
                    return Err(TransactionError::PromotionIneligible(id));
                }
            }
            if promotion.kind == PromotionKind::OneTime {
                if self.uses.contains_key(&(account, id)) {
                    return Err(TransactionError::DuplicateOneTimePromotionUse(id));
                }
                consumed.push(id);
            }

            match promotion.rule {
                RewardRule::Rate(rate) => rates.push(rate),
                RewardRule::FlatPoints(points) => flat_bonus += points,
            }
        }

        // Rate discounts compound in request order; flat bonuses land after
        // the earn-rate computation.
        let mut final_spend = spend;
        for rate in rates {
            final_spend -= final_spend * rate / Decimal::ONE_HUNDRED;
        }
        if final_spend < Decimal::ZERO {
            final_spend = Decimal::ZERO;
        }

        let earned = (final_spend * earn_rate)
            .floor()
            .to_i64()
            .ok_or(TransactionError::InvalidAmount)?;
        let awarded_points = (earned + flat_bonus).max(0);

        Ok(PromotionOutcome {
            final_spend,
            awarded_points,
            consumed,
        })
    }

    /// Records consumption of one-time promotions, all or nothing.
    ///
    /// Insertion goes through the entry API, so of two concurrent calls
    /// for the same `(account, promotion)` exactly one wins; the loser's
    /// partial inserts are rolled back before the error is returned.
    pub(crate) fn consume(
        &self,
        account: AccountId,
        ids: &[PromotionId],
        at: DateTime<Utc>,
    ) -> Result<(), TransactionError> {
        let mut inserted: Vec<PromotionId> = Vec::new();
        for &id in ids {
            // The entry guard holds a shard lock; it must drop before any
            // rollback touches the map again.
            let won = match self.uses.entry((account, id)) {
                Entry::Occupied(_) => false,
                Entry::Vacant(entry) => {
                    entry.insert(at);
                    true
                }
            };
            if !won {
                for done in inserted {
                    self.uses.remove(&(account, done));
                }
                return Err(TransactionError::DuplicateOneTimePromotionUse(id));
            }
            inserted.push(id);
        }
        Ok(())
    }
}
