//! Transient gallery UI state. Nothing here is persisted; a fresh process starts closed.
//!
//! Full prompts are shown in a separate detail view rather than expanded in place:
//! the list always renders a truncated preview.

use super::types::GenerationRecord;
use super::checked_position;
use crate::error::AppResult;

pub const PROMPT_PREVIEW_CHARS: usize = 50;

pub fn prompt_preview(prompt: &str) -> String {
    if prompt.chars().count() <= PROMPT_PREVIEW_CHARS {
        prompt.to_string()
    } else {
        let head: String = prompt.chars().take(PROMPT_PREVIEW_CHARS).collect();
        format!("{}...", head)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailView {
    pub position: usize,
    pub prompt: String,
    pub image_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GalleryEntry<'a> {
    pub position: usize,
    pub preview: String,
    pub record: &'a GenerationRecord,
}

/// Newest first, each entry keeping its storage position.
pub fn newest_first(records: &[GenerationRecord]) -> Vec<GalleryEntry<'_>> {
    records
        .iter()
        .enumerate()
        .rev()
        .map(|(position, record)| GalleryEntry {
            position,
            preview: prompt_preview(&record.prompt),
            record,
        })
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewSelection {
    detail: Option<DetailView>,
    settings_open: bool,
}

impl ViewSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open_detail(
        &mut self,
        records: &[GenerationRecord],
        position: i64,
    ) -> AppResult<&DetailView> {
        let index = checked_position(position, records.len())?;
        let record = &records[index];
        Ok(self.detail.insert(DetailView {
            position: index,
            prompt: record.prompt.clone(),
            image_url: record.url.clone(),
        }))
    }

    pub fn close_detail(&mut self) {
        self.detail = None;
    }

    pub fn detail(&self) -> Option<&DetailView> {
        self.detail.as_ref()
    }

    pub fn open_settings(&mut self) {
        self.settings_open = true;
    }

    pub fn close_settings(&mut self) {
        self.settings_open = false;
    }

    pub fn toggle_settings(&mut self) {
        self.settings_open = !self.settings_open;
    }

    pub fn settings_open(&self) -> bool {
        self.settings_open
    }

    /// Keeps the detail view pointed at the same record after a deletion shifted positions.
    pub fn on_record_removed(&mut self, removed: usize) {
        let Some(detail) = self.detail.as_mut() else {
            return;
        };
        if detail.position == removed {
            self.detail = None;
        } else if detail.position > removed {
            detail.position -= 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;

    fn records() -> Vec<GenerationRecord> {
        vec![
            GenerationRecord::new("a red fox", "img://1"),
            GenerationRecord::new("a blue owl", "img://2"),
            GenerationRecord::new("a green frog", "img://3"),
        ]
    }

    #[test]
    fn test_prompt_preview() {
        assert_eq!(prompt_preview("short"), "short");
        let exact = "y".repeat(PROMPT_PREVIEW_CHARS);
        assert_eq!(prompt_preview(&exact), exact);
        let long = "x".repeat(PROMPT_PREVIEW_CHARS + 10);
        assert_eq!(prompt_preview(&long), format!("{}...", "x".repeat(PROMPT_PREVIEW_CHARS)));
    }

    #[test]
    fn test_newest_first_keeps_positions() {
        let records = records();
        let entries = newest_first(&records);
        let positions: Vec<usize> = entries.iter().map(|e| e.position).collect();
        assert_eq!(positions, vec![2, 1, 0]);
        assert_eq!(entries[0].record.url, "img://3");
    }

    #[test]
    fn test_open_and_close_detail() {
        let records = records();
        let mut view = ViewSelection::new();
        let detail = view.open_detail(&records, 1).unwrap();
        assert_eq!(detail.prompt, "a blue owl");
        assert_eq!(detail.image_url, "img://2");

        view.close_detail();
        assert!(view.detail().is_none());
    }

    #[test]
    fn test_open_detail_invalid_position() {
        let records = records();
        let mut view = ViewSelection::new();
        assert!(matches!(
            view.open_detail(&records, 3),
            Err(AppError::InvalidPosition { position: 3, len: 3 })
        ));
        assert!(view.detail().is_none());
    }

    #[test]
    fn test_detail_follows_deletions() {
        let records = records();
        let mut view = ViewSelection::new();
        view.open_detail(&records, 2).unwrap();

        view.on_record_removed(0);
        assert_eq!(view.detail().unwrap().position, 1);

        view.on_record_removed(1);
        assert!(view.detail().is_none());
    }

    #[test]
    fn test_detail_untouched_by_later_deletion() {
        let records = records();
        let mut view = ViewSelection::new();
        view.open_detail(&records, 0).unwrap();
        view.on_record_removed(2);
        assert_eq!(view.detail().unwrap().position, 0);
    }

    #[test]
    fn test_settings_toggle() {
        let mut view = ViewSelection::new();
        assert!(!view.settings_open());
        view.toggle_settings();
        assert!(view.settings_open());
        view.close_settings();
        assert!(!view.settings_open());
        view.open_settings();
        assert!(view.settings_open());
    }
}
