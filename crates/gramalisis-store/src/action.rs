use gramalisis_types::{Entry, TimelineEntry, UserProfile};
use uuid::Uuid;

/// The closed set of state transitions.
#[derive(Debug, Clone)]
pub enum Action {
    /// Authoritative snapshot from the entry stream, newest first
    SetEntries(Vec<Entry>),
    /// Prepend one entry, usually a pending optimistic insert
    AddEntry(TimelineEntry),
    /// Replace the profile; `None` means signed out
    SetUser(Option<UserProfile>),
    /// Drop a pending entry whose create call failed
    DiscardPending(Uuid),
    /// Back to the initial empty state
    Reset,
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Self::SetEntries(_) => "SET_ENTRIES",
            Self::AddEntry(_) => "ADD_ENTRY",
            Self::SetUser(_) => "SET_USER",
            Self::DiscardPending(_) => "DISCARD_PENDING",
            Self::Reset => "RESET",
        }
    }
}
