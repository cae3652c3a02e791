use std::sync::Arc;

use crate::error::AppResult;
use crate::persistence::KeyValueStore;

pub const CREDENTIAL_KEY: &str = "replicate_api_key";
const MASK_VISIBLE_CHARS: usize = 4;

/// Holds the provider API key. A user-set value always wins over the startup default.
pub struct CredentialStore {
    store: Arc<dyn KeyValueStore>,
    current: String,
}

impl CredentialStore {
    pub fn load(store: Arc<dyn KeyValueStore>, default: Option<String>) -> Self {
        let stored = match store.get(CREDENTIAL_KEY) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("Failed to read stored credential: {}", e);
                None
            }
        };
        let current = stored.or(default).unwrap_or_default();
        Self { store, current }
    }

    pub fn get(&self) -> &str {
        &self.current
    }

    /// Writes through to durable storage before updating the in-memory value.
    pub fn set(&mut self, value: &str) -> AppResult<()> {
        self.store.set(CREDENTIAL_KEY, value)?;
        self.current = value.to_string();
        tracing::info!("Credential updated");
        Ok(())
    }

    pub fn is_set(&self) -> bool {
        !self.current.trim().is_empty()
    }

    /// Keeps the last four characters visible.
    pub fn masked(&self) -> String {
        let chars: Vec<char> = self.current.chars().collect();
        if chars.is_empty() {
            return String::new();
        }
        // Keys this short would be fully revealed by the tail
        if chars.len() <= MASK_VISIBLE_CHARS {
            return "*".repeat(chars.len());
        }
        let hidden = chars.len() - MASK_VISIBLE_CHARS;
        let tail: String = chars[hidden..].iter().collect();
        format!("{}{}", "*".repeat(hidden), tail)
    }
}
