use std::sync::Arc;

use super::types::GenerationRecord;
use super::checked_position;
use crate::error::AppResult;
use crate::persistence::KeyValueStore;

pub const GALLERY_KEY: &str = "gallery";

/// Append-only history of generations, mirrored to durable storage on every mutation.
pub struct GalleryStore {
    store: Arc<dyn KeyValueStore>,
    records: Vec<GenerationRecord>,
}

impl GalleryStore {
    /// Never fails: absent, unreadable or malformed data is an empty gallery.
    pub fn load(store: Arc<dyn KeyValueStore>) -> Self {
        let records = read_records(store.as_ref());
        tracing::debug!("Loaded {} gallery records", records.len());
        Self { store, records }
    }

    pub fn records(&self) -> &[GenerationRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, position: i64) -> AppResult<&GenerationRecord> {
        let index = checked_position(position, self.records.len())?;
        Ok(&self.records[index])
    }

    pub fn append(&mut self, record: GenerationRecord) -> AppResult<&[GenerationRecord]> {
        let mut next = self.records.clone();
        next.push(record);
        self.commit(next)
    }

    pub fn remove_at(&mut self, position: i64) -> AppResult<&[GenerationRecord]> {
        let index = checked_position(position, self.records.len())?;
        let mut next = self.records.clone();
        next.remove(index);
        self.commit(next)
    }

    // Memory only moves forward once the durable write succeeded.
    fn commit(&mut self, next: Vec<GenerationRecord>) -> AppResult<&[GenerationRecord]> {
        let serialized = serde_json::to_string(&next)?;
        self.store.set(GALLERY_KEY, &serialized)?;
        self.records = next;
        Ok(&self.records)
    }
}

fn read_records(store: &dyn KeyValueStore) -> Vec<GenerationRecord> {
    let raw = match store.get(GALLERY_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return Vec::new(),
        Err(e) => {
            tracing::warn!("Failed to read gallery, starting empty: {}", e);
            return Vec::new();
        }
    };

    match serde_json::from_str::<Option<Vec<GenerationRecord>>>(&raw) {
        Ok(records) => records.unwrap_or_default(),
        Err(e) => {
            tracing::warn!("Stored gallery is malformed, starting empty: {}", e);
            Vec::new()
        }
    }
}
