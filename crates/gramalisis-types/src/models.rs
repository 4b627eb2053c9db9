use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::text::build_full_name;

/// An entry acknowledged by the document store.
///
/// `created_at` is assigned by the store and stays `None` until the write has
/// been acknowledged. Entries are never mutated once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub id: Uuid,
    pub uid: Uuid,
    pub text: String,
    pub summary: String,
    pub created_at: Option<DateTime<Utc>>,
}

/// A locally inserted entry that the store has not confirmed yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingEntry {
    pub temp_id: Uuid,
    pub uid: Uuid,
    pub text: String,
    pub summary: String,
    pub submitted_at: DateTime<Utc>,
}

impl PendingEntry {
    pub fn new(uid: Uuid, text: String, summary: String) -> Self {
        Self {
            temp_id: Uuid::new_v4(),
            uid,
            text,
            summary,
            submitted_at: Utc::now(),
        }
    }

    /// Whether `entry` is the confirmed copy of this pending write.
    ///
    /// An entry without a server timestamp matches on author and text alone.
    pub fn is_confirmed_by(&self, entry: &Entry, window: chrono::Duration) -> bool {
        if entry.uid != self.uid || entry.text != self.text {
            return false;
        }
        match entry.created_at {
            Some(created_at) => (created_at - self.submitted_at).abs() <= window,
            None => true,
        }
    }
}

/// One row of the visible entry timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "entry", rename_all = "snake_case")]
pub enum TimelineEntry {
    Confirmed(Entry),
    Pending(PendingEntry),
}

impl TimelineEntry {
    /// Backend id for confirmed entries, temporary id for pending ones.
    pub fn id(&self) -> Uuid {
        match self {
            Self::Confirmed(e) => e.id,
            Self::Pending(p) => p.temp_id,
        }
    }

    pub fn uid(&self) -> Uuid {
        match self {
            Self::Confirmed(e) => e.uid,
            Self::Pending(p) => p.uid,
        }
    }

    pub fn text(&self) -> &str {
        match self {
            Self::Confirmed(e) => &e.text,
            Self::Pending(p) => &p.text,
        }
    }

    pub fn summary(&self) -> &str {
        match self {
            Self::Confirmed(e) => &e.summary,
            Self::Pending(p) => &p.summary,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending(_))
    }

    pub fn as_pending(&self) -> Option<&PendingEntry> {
        match self {
            Self::Pending(p) => Some(p),
            Self::Confirmed(_) => None,
        }
    }
}

impl From<Entry> for TimelineEntry {
    fn from(entry: Entry) -> Self {
        Self::Confirmed(entry)
    }
}

impl From<PendingEntry> for TimelineEntry {
    fn from(entry: PendingEntry) -> Self {
        Self::Pending(entry)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub uid: Uuid,
    pub first_name: String,
    pub last_name: String,
    /// The sign-in email; kept under its historical name.
    pub username: String,
    pub job: String,
    pub photo_url: String,
    /// Stored level. Acts as a floor for the effective level.
    pub level: u32,
}

impl UserProfile {
    pub fn full_name(&self) -> String {
        build_full_name(&self.first_name, &self.last_name)
    }

    /// Merge an edit into the profile. The level is never touched here.
    pub fn apply(&mut self, update: ProfileUpdate) {
        if let Some(first_name) = update.first_name {
            self.first_name = first_name;
        }
        if let Some(last_name) = update.last_name {
            self.last_name = last_name;
        }
        if let Some(username) = update.username {
            self.username = username;
        }
        if let Some(job) = update.job {
            self.job = job;
        }
        if let Some(photo_url) = update.photo_url {
            self.photo_url = photo_url;
        }
    }
}

/// A partial profile edit; absent fields are left as they are.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProfileUpdate {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub job: Option<String>,
    #[serde(default)]
    pub photo_url: Option<String>,
}
