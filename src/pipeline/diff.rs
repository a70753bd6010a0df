//! Change detection against the registry.
//!
//! Decides, record by record, whether a freshly extracted PDF is new, an
//! update of a known one, or already notified.

use crate::models::{PdfRecord, PublishDate, UpdatePolicy};
use crate::storage::Registry;

/// How a record relates to the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    /// Name not in the registry
    New,
    /// Known name whose publish date moved strictly forward
    Updated { previous: Option<PublishDate> },
    /// Already notified
    Unchanged,
}

impl Change {
    pub fn should_notify(&self) -> bool {
        !matches!(self, Change::Unchanged)
    }
}

/// Classifier for extracted records.
#[derive(Debug, Clone, Copy)]
pub struct ChangeDetector {
    /// Whether a known name can be notified again when its date advances
    detect_updates: bool,
}

impl ChangeDetector {
    /// Create a detector that reports both new and updated PDFs.
    pub fn new() -> Self {
        Self {
            detect_updates: true,
        }
    }

    /// Create a detector that only reports names never seen before.
    pub fn additions_only() -> Self {
        Self {
            detect_updates: false,
        }
    }

    pub fn from_policy(policy: UpdatePolicy) -> Self {
        match policy {
            UpdatePolicy::DateAdvance => Self::new(),
            UpdatePolicy::FirstSight => Self::additions_only(),
        }
    }

    /// Classify `record` against `registry`.
    ///
    /// Missing or unparsable dates compare as earlier than any real date,
    /// so a record whose date could not be read never counts as an update.
    pub fn detect(&self, registry: &Registry, record: &PdfRecord) -> Change {
        let Some(entry) = registry.get(&record.name) else {
            return Change::New;
        };
        if !self.detect_updates {
            return Change::Unchanged;
        }

        let previous = entry.publish_date();
        if record.publish_date > previous {
            Change::Updated { previous }
        } else {
            Change::Unchanged
        }
    }
}

impl Default for ChangeDetector {
    fn default() -> Self {
        Self::new()
    }
}
