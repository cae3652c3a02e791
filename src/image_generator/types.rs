use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const GO_FAST: bool = true;
pub const NUM_OUTPUTS: u32 = 1;
pub const ASPECT_RATIO: &str = "1:1";
pub const OUTPUT_FORMAT: &str = "webp";
pub const OUTPUT_QUALITY: u32 = 80;

/// Model input sent with every generation. Only the prompt varies per call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationInput<'a> {
    pub prompt: &'a str,
    pub go_fast: bool,
    pub num_outputs: u32,
    pub aspect_ratio: &'static str,
    pub output_format: &'static str,
    pub output_quality: u32,
}

impl<'a> GenerationInput<'a> {
    pub fn for_prompt(prompt: &'a str) -> Self {
        Self {
            prompt,
            go_fast: GO_FAST,
            num_outputs: NUM_OUTPUTS,
            aspect_ratio: ASPECT_RATIO,
            output_format: OUTPUT_FORMAT,
            output_quality: OUTPUT_QUALITY,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PredictionStatus {
    Starting,
    Processing,
    Succeeded,
    Failed,
    Canceled,
}

impl PredictionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Canceled)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PredictionUrls {
    #[serde(default)]
    pub get: Option<String>,
}

/// A provider-side inference job as returned by create and poll calls.
#[derive(Debug, Clone, Deserialize)]
pub struct Prediction {
    #[serde(default)]
    pub id: Option<String>,
    pub status: PredictionStatus,
    #[serde(default)]
    pub output: Option<Value>,
    #[serde(default)]
    pub error: Option<Value>,
    #[serde(default)]
    pub urls: Option<PredictionUrls>,
}

impl Prediction {
    pub fn poll_url(&self) -> Option<&str> {
        self.urls.as_ref().and_then(|u| u.get.as_deref())
    }

    /// The first output locator; the provider may return a list or a single string.
    pub fn first_output(&self) -> Option<String> {
        let url = match self.output.as_ref()? {
            Value::String(url) => Some(url.clone()),
            Value::Array(items) => items.first().and_then(Value::as_str).map(str::to_string),
            _ => None,
        };
        url.filter(|url| !url.is_empty())
    }

    pub fn error_message(&self) -> String {
        match self.error.as_ref() {
            Some(Value::String(s)) if !s.is_empty() => s.clone(),
            Some(Value::Null) | None => "unknown provider error".to_string(),
            Some(other) => other.to_string(),
        }
    }
}
