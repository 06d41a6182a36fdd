//! # Event Log Store
//!
//! Bounded, newest-first, append-only. Arrival order is the only order:
//! timestamps are never consulted, and nothing is deduplicated.
//!
//! The read side (filters, search, export) is a set of pure projections
//! over the current sequence.

use std::collections::VecDeque;

use serde::Serialize;
use time::OffsetDateTime;

use meebot_shared::{CanonicalEvent, ResourceKind, MAX_EVENTS};

/// The bounded record sequence.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventLog {
    records: VecDeque<CanonicalEvent>,
    capacity: usize,
}

impl Default for EventLog {
    fn default() -> Self {
        Self::with_capacity(MAX_EVENTS)
    }
}

impl EventLog {
    /// Creates an empty log that keeps at most `capacity` records (min 1).
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            records: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    /// Inserts at the front, then drops whatever falls past the cap.
    pub fn append(&mut self, record: CanonicalEvent) {
        self.records.push_front(record);
        self.records.truncate(self.capacity);
    }

    /// Maximum length.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of records held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the log is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records, newest first.
    pub fn iter(&self) -> impl Iterator<Item = &CanonicalEvent> {
        self.records.iter()
    }

    /// Most recent record.
    #[must_use]
    pub fn latest(&self) -> Option<&CanonicalEvent> {
        self.records.front()
    }

    /// Removes everything.
    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Event names in first-seen order (scanning newest first).
    #[must_use]
    pub fn distinct_event_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for record in &self.records {
            if !names.iter().any(|n| *n == record.event_name) {
                names.push(record.event_name.clone());
            }
        }
        names
    }

    /// Records matching `query`, newest first.
    #[must_use]
    pub fn query(&self, query: &EventQuery) -> Vec<&CanonicalEvent> {
        self.records.iter().filter(|r| query.matches(r)).collect()
    }
}

/// Read-side filter. Empty fields match everything.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EventQuery {
    /// Only this resource.
    pub resource: Option<ResourceKind>,
    /// Only this exact event name.
    pub event_name: Option<String>,
    /// Case-insensitive substring over name, resource, transaction and args.
    pub text: Option<String>,
}

impl EventQuery {
    /// Matches everything.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Restricts to one resource.
    #[must_use]
    pub fn resource(mut self, kind: ResourceKind) -> Self {
        self.resource = Some(kind);
        self
    }

    /// Restricts to one event name.
    #[must_use]
    pub fn event_name(mut self, name: impl Into<String>) -> Self {
        self.event_name = Some(name.into());
        self
    }

    /// Adds a free-text term.
    #[must_use]
    pub fn text(mut self, term: impl Into<String>) -> Self {
        self.text = Some(term.into());
        self
    }

    /// Whether `record` passes every set criterion.
    #[must_use]
    pub fn matches(&self, record: &CanonicalEvent) -> bool {
        if self.resource.is_some_and(|kind| kind != record.resource) {
            return false;
        }
        if self.event_name.as_deref().is_some_and(|name| name != record.event_name) {
            return false;
        }
        match self.text.as_deref().map(str::trim) {
            Some(term) if !term.is_empty() => {
                record.searchable_text().contains(&term.to_lowercase())
            }
            _ => true,
        }
    }
}

/// Pretty JSON array of `records`. Integers stay decimal strings.
pub fn export_json<'a, I>(records: I) -> serde_json::Result<String>
where
    I: IntoIterator<Item = &'a CanonicalEvent>,
{
    #[derive(Serialize)]
    #[serde(transparent)]
    struct Export<'a>(Vec<&'a CanonicalEvent>);

    serde_json::to_string_pretty(&Export(records.into_iter().collect()))
}

/// `meebot_events_YYYYMMDD_HHMMSS.json` for `at`.
#[must_use]
pub fn export_file_name(at: OffsetDateTime) -> String {
    format!(
        "meebot_events_{:04}{:02}{:02}_{:02}{:02}{:02}.json",
        at.year(),
        u8::from(at.month()),
        at.day(),
        at.hour(),
        at.minute(),
        at.second()
    )
}
