//! Event vocabulary shared by every source and subscriber.

use std::fmt;

/// Discriminant of a [`DataEvent`], for filtering and logging.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    ReferenceAdded,
    ReferenceRemoved,
    ReferenceSelected,
    Populating,
    Populated,
    Flushed,
    Changed,
    HighlightChanged,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::ReferenceAdded => "reference-added",
            EventKind::ReferenceRemoved => "reference-removed",
            EventKind::ReferenceSelected => "reference-selected",
            EventKind::Populating => "populating",
            EventKind::Populated => "populated",
            EventKind::Flushed => "flushed",
            EventKind::Changed => "changed",
            EventKind::HighlightChanged => "highlight-changed",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An announcement posted by a source to its subscribers.
///
/// Registry events carry the name of the reference concerned; dataset events
/// concern the posting source itself.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DataEvent {
    ReferenceAdded(String),
    ReferenceRemoved(String),
    ReferenceSelected(String),
    Populating,
    Populated,
    Flushed,
    Changed,
    HighlightChanged,
}

impl DataEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            DataEvent::ReferenceAdded(_) => EventKind::ReferenceAdded,
            DataEvent::ReferenceRemoved(_) => EventKind::ReferenceRemoved,
            DataEvent::ReferenceSelected(_) => EventKind::ReferenceSelected,
            DataEvent::Populating => EventKind::Populating,
            DataEvent::Populated => EventKind::Populated,
            DataEvent::Flushed => EventKind::Flushed,
            DataEvent::Changed => EventKind::Changed,
            DataEvent::HighlightChanged => EventKind::HighlightChanged,
        }
    }

    /// Reference name carried by registry events.
    pub fn reference_name(&self) -> Option<&str> {
        match self {
            DataEvent::ReferenceAdded(name)
            | DataEvent::ReferenceRemoved(name)
            | DataEvent::ReferenceSelected(name) => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for DataEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.reference_name() {
            Some(name) => write!(f, "{} ({})", self.kind(), name),
            None => write!(f, "{}", self.kind()),
        }
    }
}
