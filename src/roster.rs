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

//! Event rosters: organizers and guest lists.
//!
//! RSVP bookkeeping lives with an external collaborator; this is only the
//! slice the event transaction needs — who organizes an event, who is on
//! its guest list, and whether attendance was confirmed.

use crate::TransactionError;
use crate::base::{AccountId, EventId};
use dashmap::DashMap;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Default)]
struct EventRecord {
    organizers: HashSet<AccountId>,
    /// Guest → attendance confirmed.
    guests: HashMap<AccountId, bool>,
}

/// Per-event organizer and guest-list store.
#[derive(Debug, Default)]
pub struct EventRoster {
    events: DashMap<EventId, EventRecord>,
}

impl EventRoster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an event with an initial organizer.
    pub fn create_event(&self, event: EventId, organizer: AccountId) {
        let mut record = self.events.entry(event).or_default();
        record.organizers.insert(organizer);
    }

    pub fn add_organizer(&self, event: EventId, organizer: AccountId) -> Result<(), TransactionError> {
        let mut record = self
            .events
            .get_mut(&event)
            .ok_or(TransactionError::UnknownEvent)?;
        record.organizers.insert(organizer);
        Ok(())
    }

    /// Adds a guest with unconfirmed attendance.
    pub fn add_guest(&self, event: EventId, guest: AccountId) -> Result<(), TransactionError> {
        let mut record = self
            .events
            .get_mut(&event)
            .ok_or(TransactionError::UnknownEvent)?;
        record.guests.entry(guest).or_insert(false);
        Ok(())
    }

    /// Marks a guest's attendance confirmed.
    pub fn confirm_attendance(
        &self,
        event: EventId,
        guest: AccountId,
    ) -> Result<(), TransactionError> {
        let mut record = self
            .events
            .get_mut(&event)
            .ok_or(TransactionError::UnknownEvent)?;
        match record.guests.get_mut(&guest) {
            Some(confirmed) => {
                *confirmed = true;
                Ok(())
            }
            None => Err(TransactionError::NotAGuest),
        }
    }

    pub fn is_organizer(&self, event: EventId, account: AccountId) -> Result<bool, TransactionError> {
        let record = self
            .events
            .get(&event)
            .ok_or(TransactionError::UnknownEvent)?;
        Ok(record.organizers.contains(&account))
    }

    /// Whether `account` may receive an award for `event`.
    ///
    /// With `require_confirmed` set, guest-list membership alone is not
    /// enough; attendance must have been confirmed.
    pub fn is_eligible_guest(
        &self,
        event: EventId,
        account: AccountId,
        require_confirmed: bool,
    ) -> Result<bool, TransactionError> {
        let record = self
            .events
            .get(&event)
            .ok_or(TransactionError::UnknownEvent)?;
        Ok(match record.guests.get(&account) {
            Some(confirmed) => !require_confirmed || *confirmed,
            None => false,
        })
    }
}
