//! In-memory note store
//!
//! Notes live for the lifetime of the server process and are exposed to
//! clients as `note://internal/<name>` resources.

use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};

/// URI scheme and authority for note resources
pub const NOTE_URI_PREFIX: &str = "note://internal/";

/// Resource URI for a note name
pub fn note_uri(name: &str) -> String {
    format!("{}{}", NOTE_URI_PREFIX, name)
}

/// Note name from a resource URI, if the URI is a note URI
pub fn note_name(uri: &str) -> Option<&str> {
    uri.strip_prefix(NOTE_URI_PREFIX)
}

/// Named notes, ordered by name
#[derive(Debug, Default)]
pub struct NoteStore {
    notes: RwLock<BTreeMap<String, String>>,
}

impl NoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a note; returns the previous content
    pub fn add(&self, name: impl Into<String>, content: impl Into<String>) -> Option<String> {
        let mut notes = self.notes.write().unwrap_or_else(PoisonError::into_inner);
        notes.insert(name.into(), content.into())
    }

    pub fn get(&self, name: &str) -> Option<String> {
        let notes = self.notes.read().unwrap_or_else(PoisonError::into_inner);
        notes.get(name).cloned()
    }

    /// Snapshot of all notes as (name, content) pairs
    pub fn list(&self) -> Vec<(String, String)> {
        let notes = self.notes.read().unwrap_or_else(PoisonError::into_inner);
        notes
            .iter()
            .map(|(name, content)| (name.clone(), content.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.notes.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
