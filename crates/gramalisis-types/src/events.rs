use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::Entry;

/// Sign-in / sign-out transitions emitted by the auth collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum AuthEvent {
    SignedIn { uid: Uuid, email: String },
    SignedOut,
}

impl AuthEvent {
    pub fn uid(&self) -> Option<Uuid> {
        match self {
            Self::SignedIn { uid, .. } => Some(*uid),
            Self::SignedOut => None,
        }
    }
}

/// Events sent over the entry stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum FeedEvent {
    /// The caller's full entry list, newest first
    Snapshot { entries: Vec<Entry> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    Success,
    Error,
    Info,
}

impl NoticeKind {
    /// Default title shown with the notice.
    pub fn title(self) -> &'static str {
        match self {
            Self::Success => "Listo",
            Self::Error => "Ups!",
            Self::Info => "Aviso",
        }
    }
}

/// A transient message for the user. Presentation is up to the consumer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub title: String,
    pub message: String,
}

impl Notice {
    pub fn new(kind: NoticeKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            title: kind.title().to_string(),
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(NoticeKind::Success, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(NoticeKind::Error, message)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(NoticeKind::Info, message)
    }
}
