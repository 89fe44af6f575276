//! Shared data structures for the application state
//!
//! These structs represent the data model that flows between
//! the HALO query layer, the workflows and the UI layer.

use std::collections::{BTreeMap, BTreeSet};

/// Represents a single image record in the HALO database
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRecord {
    /// Opaque HALO image ID
    pub id: String,
    /// Full path to the image file as stored in the database
    pub location: String,
    /// Owning study hierarchy, e.g. "/Lab/StudyA"
    pub study: String,
}

/// Result of the most recent search, keyed by image ID.
///
/// Ordered by ID so that transfers walk the records deterministically.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchSet {
    images: BTreeMap<String, ImageRecord>,
}

impl MatchSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, record: ImageRecord) {
        self.images.insert(record.id.clone(), record);
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    #[cfg(test)]
    pub fn get(&self, id: &str) -> Option<&ImageRecord> {
        self.images.get(id)
    }

    pub fn records(&self) -> impl Iterator<Item = &ImageRecord> {
        self.images.values()
    }

    /// Distinct, non-empty study names among the records
    pub fn studies(&self) -> BTreeSet<&str> {
        self.images
            .values()
            .map(|record| record.study.as_str())
            .filter(|study| !study.is_empty())
            .collect()
    }

    /// Point a record at its new location after a successful transfer.
    /// Unknown IDs are ignored.
    pub fn relocate(&mut self, id: &str, location: &str) {
        if let Some(record) = self.images.get_mut(id) {
            record.location = location.to_string();
        }
    }
}

impl FromIterator<ImageRecord> for MatchSet {
    fn from_iter<I: IntoIterator<Item = ImageRecord>>(iter: I) -> Self {
        let mut set = MatchSet::new();
        for record in iter {
            set.insert(record);
        }
        set
    }
}
