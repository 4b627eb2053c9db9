use gramalisis_types::{Entry, PendingEntry, TimelineEntry, UserProfile};
use serde::Serialize;

use crate::action::Action;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AppState {
    /// Newest first. Pending entries sit ahead of confirmed ones.
    pub entries: Vec<TimelineEntry>,
    pub current_user: Option<UserProfile>,
}

impl AppState {
    /// Count used for progression: everything the user currently sees.
    pub fn entries_count(&self) -> usize {
        self.entries.len()
    }

    /// Entries the backend has acknowledged.
    pub fn confirmed_count(&self) -> usize {
        self.entries.iter().filter(|e| !e.is_pending()).count()
    }

    pub fn pending(&self) -> impl Iterator<Item = &PendingEntry> {
        self.entries.iter().filter_map(TimelineEntry::as_pending)
    }

    pub fn is_signed_in(&self) -> bool {
        self.current_user.is_some()
    }
}

/// Apply one action in place.
///
/// `SetEntries` replaces the confirmed list wholesale and keeps only the
/// pending entries that no confirmed entry accounts for, so applying the same
/// snapshot twice leaves the state as it was after the first.
pub fn reduce(state: &mut AppState, action: Action, match_window: chrono::Duration) {
    match action {
        Action::SetEntries(snapshot) => {
            let pending: Vec<TimelineEntry> = state
                .pending()
                .filter(|p| !is_confirmed(p, &snapshot, match_window))
                .cloned()
                .map(TimelineEntry::Pending)
                .collect();

            state.entries = pending
                .into_iter()
                .chain(snapshot.into_iter().map(TimelineEntry::Confirmed))
                .collect();
        }
        Action::AddEntry(entry) => {
            state.entries.insert(0, entry);
        }
        Action::SetUser(profile) => {
            state.current_user = profile;
        }
        Action::DiscardPending(temp_id) => {
            state
                .entries
                .retain(|e| !(e.is_pending() && e.id() == temp_id));
        }
        Action::Reset => {
            *state = AppState::default();
        }
    }
}

fn is_confirmed(pending: &PendingEntry, snapshot: &[Entry], window: chrono::Duration) -> bool {
    snapshot.iter().any(|entry| pending.is_confirmed_by(entry, window))
}
