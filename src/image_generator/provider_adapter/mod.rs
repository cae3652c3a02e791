use serde_json::Value;
use std::collections::HashMap;

use super::types::{GenerationInput, Prediction};

pub mod replicate;

pub trait ImageProviderAdapter: Send + Sync {
    fn endpoint(&self, base_url: &str, model: &str) -> String;
    fn headers(&self, api_key: &str) -> HashMap<String, String>;
    fn body(&self, input: &GenerationInput<'_>) -> Value;
    fn parse_prediction(&self, response: Value) -> Result<Prediction, String>;
}

pub fn get_adapter(provider_id: &str) -> Result<Box<dyn ImageProviderAdapter>, String> {
    match provider_id {
        "replicate" => Ok(Box::new(replicate::ReplicateAdapter)),
        _ => Err(format!(
            "Provider {} does not support image generation",
            provider_id
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_adapter() {
        assert!(get_adapter("replicate").is_ok());
        assert!(get_adapter("openai").is_err());
    }
}
