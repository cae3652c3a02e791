pub mod client;
pub mod provider_adapter;
pub mod storage;
pub mod types;

pub use client::{InferenceClient, ReplicateClient};
pub use storage::ImageDownloader;
