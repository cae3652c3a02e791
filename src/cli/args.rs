use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Generate images from text prompts and keep a local gallery of the results
#[derive(Parser, Debug)]
#[command(name = "pixelprompt", version, about, long_about = None)]
pub struct Cli {
    /// Directory for the gallery database, config and logs
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Generate an image and add it to the gallery
    Generate {
        #[arg(required = true, num_args = 1..)]
        prompt: Vec<String>,
    },

    /// List the gallery, newest first
    List,

    /// Show the full prompt and image URL of one record
    Show {
        #[arg(allow_negative_numbers = true)]
        position: i64,
    },

    /// Delete one record from the gallery
    Delete {
        #[arg(allow_negative_numbers = true)]
        position: i64,
    },

    /// Save a record's image to a local file
    Download {
        #[arg(allow_negative_numbers = true)]
        position: i64,

        /// Destination file (defaults to the configured download file name)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show settings, or update the API key
    Settings {
        #[arg(long)]
        api_key: Option<String>,
    },

    /// Keep one session open and run actions against it
    Interactive,
}
