//! Mock logging facility for testing.

use crate::application::ports::Facility;
use crate::domain::entry::{Entry, Fields};
use std::sync::{Arc, Mutex};
use tracing::level_filters::LevelFilter;
use tracing::Level;

/// An entry written by a `RecordingFacility`, with the fields attached to
/// the facility that wrote it.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct RecordedEntry {
    pub entry: Entry,
    pub fields: Fields,
}

/// Facility that records every entry it is asked to check.
///
/// Clones and facilities derived through `with` share one record list and
/// one level threshold, so a test can hold a handle and inspect what any
/// sampler in the tree forwarded.
#[derive(Debug, Clone)]
pub struct RecordingFacility {
    max_level: Arc<Mutex<LevelFilter>>,
    fields: Fields,
    records: Arc<Mutex<Vec<RecordedEntry>>>,
}

impl RecordingFacility {
    /// Create a facility with every level enabled.
    pub fn new() -> Self {
        Self {
            max_level: Arc::new(Mutex::new(LevelFilter::TRACE)),
            fields: Fields::new(),
            records: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Change the most verbose level written, for this facility and all
    /// facilities sharing its state.
    pub fn set_max_level(&self, level: impl Into<LevelFilter>) {
        *self
            .max_level
            .lock()
            .expect("RecordingFacility mutex poisoned - a test thread panicked while holding the lock") =
            level.into();
    }

    /// Fields attached to this facility.
    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    /// All entries written so far.
    pub fn records(&self) -> Vec<RecordedEntry> {
        self.lock_records().clone()
    }

    /// Messages of all entries written so far, in order.
    pub fn messages(&self) -> Vec<String> {
        self.lock_records()
            .iter()
            .map(|r| r.entry.message.to_string())
            .collect()
    }

    /// Number of entries written so far.
    pub fn count(&self) -> usize {
        self.lock_records().len()
    }

    /// Forget all written entries.
    pub fn clear(&self) {
        self.lock_records().clear();
    }

    fn lock_records(&self) -> std::sync::MutexGuard<'_, Vec<RecordedEntry>> {
        self.records
            .lock()
            .expect("RecordingFacility mutex poisoned - a test thread panicked while holding the lock")
    }
}

impl Default for RecordingFacility {
    fn default() -> Self {
        Self::new()
    }
}

impl Facility for RecordingFacility {
    type Checked = Vec<RecordedEntry>;

    fn enabled(&self, level: Level) -> bool {
        let max = *self
            .max_level
            .lock()
            .expect("RecordingFacility mutex poisoned - a test thread panicked while holding the lock");
        LevelFilter::from_level(level) <= max
    }

    fn check(&self, entry: &Entry, mut checked: Self::Checked) -> Self::Checked {
        let record = RecordedEntry {
            entry: entry.clone(),
            fields: self.fields.clone(),
        };
        self.lock_records().push(record.clone());
        checked.push(record);
        checked
    }

    fn with(&self, fields: &Fields) -> Self {
        let mut merged = self.fields.clone();
        merged.extend(fields.iter().map(|(k, v)| (k.clone(), v.clone())));
        Self {
            max_level: Arc::clone(&self.max_level),
            fields: merged,
            records: Arc::clone(&self.records),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::borrow::Cow;

    #[test]
    fn test_records_checked_entries() {
        let facility = RecordingFacility::new();
        let checked = facility.check(&Entry::new(Level::INFO, "hello"), Vec::new());

        assert_eq!(checked.len(), 1);
        assert_eq!(facility.count(), 1);
        assert_eq!(facility.messages(), vec!["hello"]);

        facility.clear();
        assert_eq!(facility.count(), 0);
    }

    #[test]
    fn test_level_threshold() {
        let facility = RecordingFacility::new();
        assert!(facility.enabled(Level::TRACE));

        facility.set_max_level(Level::WARN);
        assert!(facility.enabled(Level::ERROR));
        assert!(facility.enabled(Level::WARN));
        assert!(!facility.enabled(Level::INFO));

        facility.set_max_level(LevelFilter::OFF);
        assert!(!facility.enabled(Level::ERROR));
    }

    #[test]
    fn test_with_merges_fields_and_shares_records() {
        let parent = RecordingFacility::new();
        let mut fields = Fields::new();
        fields.insert(Cow::Borrowed("shard"), Cow::Borrowed("7"));

        let child = parent.with(&fields);
        child.check(&Entry::new(Level::INFO, "from child"), Vec::new());

        let records = parent.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].fields.get("shard").map(|v| v.as_ref()), Some("7"));
        assert!(parent.fields().is_empty());

        parent.set_max_level(Level::ERROR);
        assert!(!child.enabled(Level::INFO));
    }
}
