use serde::Serialize;
use serde_json::{json, Value};
use std::collections::HashMap;

use super::ImageProviderAdapter;
use crate::image_generator::types::{GenerationInput, Prediction};

pub struct ReplicateAdapter;

#[derive(Serialize)]
struct PredictionRequest<'a> {
    input: &'a GenerationInput<'a>,
}

impl ImageProviderAdapter for ReplicateAdapter {
    fn endpoint(&self, base_url: &str, model: &str) -> String {
        let trimmed = base_url.trim_end_matches('/');
        let model = model.trim_matches('/');
        if trimmed.ends_with("/v1") {
            format!("{}/models/{}/predictions", trimmed, model)
        } else {
            format!("{}/v1/models/{}/predictions", trimmed, model)
        }
    }

    fn headers(&self, api_key: &str) -> HashMap<String, String> {
        let mut headers = HashMap::new();
        headers.insert("Authorization".into(), format!("Bearer {}", api_key));
        headers.insert("Content-Type".into(), "application/json".into());
        // Hold the connection open until the prediction finishes when the provider allows it
        headers.insert("Prefer".into(), "wait".into());
        headers
    }

    fn body(&self, input: &GenerationInput<'_>) -> Value {
        serde_json::to_value(PredictionRequest { input }).unwrap_or_else(|_| json!({}))
    }

    fn parse_prediction(&self, response: Value) -> Result<Prediction, String> {
        serde_json::from_value(response).map_err(|e| format!("Failed to parse prediction: {}", e))
    }
}
