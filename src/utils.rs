use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

pub const SERVICE: &str = "pixelprompt";

pub fn default_data_dir() -> Result<PathBuf, String> {
    let base = dirs::data_dir().ok_or_else(|| "Failed to resolve data directory".to_string())?;
    Ok(base.join(SERVICE))
}

pub fn ensure_dir(dir: &Path) -> Result<PathBuf, String> {
    fs::create_dir_all(dir).map_err(|e| err_msg(module_path!(), line!(), e.to_string()))?;
    Ok(dir.to_path_buf())
}

pub fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

pub fn err_msg(module: &str, line: u32, msg: impl Into<String>) -> String {
    format!("[{}:{}] {}", module, line, msg.into())
}

pub fn truncate_for_log(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let truncated: String = text.chars().take(max).collect();
        format!("{}…", truncated)
    }
}

/// Masks values for header names that carry secrets.
pub fn sanitize_header_value(key: &str, value: &str) -> String {
    let lowered = key.to_ascii_lowercase();
    if lowered.contains("authorization")
        || lowered.contains("api-key")
        || lowered.contains("apikey")
        || lowered.contains("secret")
        || lowered.contains("token")
    {
        "***".into()
    } else {
        truncate_for_log(value, 64)
    }
}
