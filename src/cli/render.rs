use std::fmt::Write;

use crate::gallery::view::newest_first;
use crate::gallery::{DetailView, GenerationRecord};

pub const API_TOKENS_URL: &str = "https://replicate.com/account/api-tokens";

pub fn render_gallery(records: &[GenerationRecord]) -> String {
    if records.is_empty() {
        return "No images generated yet.".to_string();
    }

    let mut out = String::from("Generated Images\n");
    for entry in newest_first(records) {
        let _ = writeln!(out, "[{}] {}", entry.position, entry.preview);
        let _ = writeln!(out, "    {}", entry.record.url);
    }
    out
}

pub fn render_detail(detail: &DetailView) -> String {
    format!(
        "Full Prompt [{}]\n\n{}\n\n{}",
        detail.position, detail.prompt, detail.image_url
    )
}

pub fn render_generated(record: &GenerationRecord) -> String {
    format!("Generated image for \"{}\"\n{}", record.prompt, record.url)
}

pub fn render_settings(masked_key: &str) -> String {
    let key = if masked_key.is_empty() {
        "(not set)"
    } else {
        masked_key
    };
    format!(
        "Settings\n  API key: {}\n  You can get your API key from {}",
        key, API_TOKENS_URL
    )
}
