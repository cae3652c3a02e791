pub mod cli;
pub mod config;
pub mod error;
pub mod gallery;
pub mod image_generator;
pub mod logger;
pub mod persistence;
pub mod utils;
pub mod workflow;

pub use error::{AppError, AppResult};
