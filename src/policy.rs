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

//! Engine policy knobs.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Behavior left configurable as product policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnginePolicy {
    /// Points earned per currency unit on an undiscounted purchase.
    pub earn_rate: Decimal,
    /// Whether a negative adjustment may drive a balance below its
    /// encumbered floor (and below zero).
    pub allow_negative_adjustment: bool,
    /// Whether event awards require confirmed attendance, or guest-list
    /// membership alone.
    pub require_confirmed_attendance: bool,
}

impl Default for EnginePolicy {
    fn default() -> Self {
        Self {
            earn_rate: Decimal::ONE,
            allow_negative_adjustment: false,
            require_confirmed_attendance: false,
        }
    }
}
