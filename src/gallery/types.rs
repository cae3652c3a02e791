use serde::{Deserialize, Serialize};

/// One prompt/image pair. Identified by its position in the gallery, not by an id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRecord {
    pub prompt: String,
    pub url: String,
}

impl GenerationRecord {
    pub fn new(prompt: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            url: url.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialized_shape() {
        let record = GenerationRecord::new("a red fox", "img://1");
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json, serde_json::json!({"prompt": "a red fox", "url": "img://1"}));
    }
}
