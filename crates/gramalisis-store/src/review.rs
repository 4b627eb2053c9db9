use gramalisis_types::TimelineEntry;

/// Cursor for stepping through saved entries one card at a time.
///
/// The cursor only keeps an index; the entries are read from the current
/// [`AppState`](crate::AppState) on every call, so a snapshot that grows or
/// shrinks the timeline never leaves it out of range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EntryReview {
    index: usize,
}

/// The entry on screen and its place in the round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReviewCard<'a> {
    /// 1-based
    pub position: usize,
    pub total: usize,
    pub entry: &'a TimelineEntry,
}

impl ReviewCard<'_> {
    pub fn label(&self) -> String {
        format!("Texto #{} de {}", self.position, self.total)
    }
}

impl EntryReview {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current<'a>(&self, entries: &'a [TimelineEntry]) -> Option<ReviewCard<'a>> {
        if entries.is_empty() {
            return None;
        }
        let position = self.index % entries.len();
        Some(ReviewCard {
            position: position + 1,
            total: entries.len(),
            entry: &entries[position],
        })
    }

    /// Advance to the following entry, wrapping after the last one.
    /// Does nothing when there are no entries.
    pub fn next<'a>(&mut self, entries: &'a [TimelineEntry]) -> Option<ReviewCard<'a>> {
        if entries.is_empty() {
            return None;
        }
        self.index = (self.index + 1) % entries.len();
        self.current(entries)
    }
}
