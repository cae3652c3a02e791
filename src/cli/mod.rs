pub mod args;
pub mod interactive;
pub mod render;

pub use args::{Cli, Commands};

use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::info;

use crate::config::{Config, DataPaths};
use crate::gallery::ViewSelection;
use crate::image_generator::{ImageDownloader, InferenceClient, ReplicateClient};
use crate::logger::init_tracing;
use crate::utils::ensure_dir;
use crate::workflow::{AppContext, GenerationController, SubmitOutcome};
use render::{render_detail, render_gallery, render_generated, render_settings};

/// Loads the config, writing defaults on first run so they can be edited.
pub fn load_or_init_config(paths: &DataPaths) -> Result<Config> {
    let path = paths.config_file();
    let config = Config::load(&path)?;
    if !path.exists() {
        config.save(&path)?;
        info!("Wrote default config to {}", path.display());
    }
    Ok(config)
}

pub async fn run(cli: Cli) -> Result<()> {
    let paths = DataPaths::resolve(cli.data_dir.clone())?;
    ensure_dir(&paths.root).map_err(anyhow::Error::msg)?;
    init_tracing(Some(&paths.log_dir()), cli.verbose).context("Failed to initialize logging")?;
    info!("Using data directory {}", paths.root.display());

    let config = load_or_init_config(&paths)?;
    let ctx = AppContext::open(&paths).context("Failed to open gallery database")?;
    let client = ReplicateClient::new(&config)?;
    let downloader = ImageDownloader::new(client.http_client());
    let controller = GenerationController::initialize(&ctx, client).with_downloader(downloader);

    dispatch(&controller, &config, cli.command).await
}

pub async fn dispatch<C: InferenceClient>(
    controller: &GenerationController<C>,
    config: &Config,
    command: Commands,
) -> Result<()> {
    match command {
        Commands::Generate { prompt } => match controller.submit(&prompt.join(" ")).await? {
            SubmitOutcome::Generated(record) => println!("{}", render_generated(&record)),
            SubmitOutcome::Ignored => println!("A generation is already running."),
        },
        Commands::List => println!("{}", render_gallery(&controller.gallery()?)),
        Commands::Show { position } => {
            let records = controller.gallery()?;
            let mut view = ViewSelection::new();
            println!("{}", render_detail(view.open_detail(&records, position)?));
        }
        Commands::Delete { position } => {
            let records = controller.delete_record(position)?;
            println!("{}", render_gallery(&records));
        }
        Commands::Download { position, output } => {
            let dest = output.unwrap_or_else(|| PathBuf::from(&config.download_file_name));
            let saved = controller.download_record(position, &dest).await?;
            println!("Saved image to {}", saved.display());
        }
        Commands::Settings { api_key } => {
            if let Some(value) = api_key {
                controller.set_credential(&value)?;
            }
            println!("{}", render_settings(&controller.masked_credential()?));
        }
        Commands::Interactive => {
            let dest = PathBuf::from(&config.download_file_name);
            interactive::run_session(controller, dest).await?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_or_init_config_writes_defaults_once() {
        let dir = tempfile::tempdir().unwrap();
        let paths = DataPaths {
            root: dir.path().to_path_buf(),
        };

        let config = load_or_init_config(&paths).unwrap();
        assert_eq!(config, Config::default());
        assert!(paths.config_file().exists());

        let edited = Config {
            poll_interval_ms: 2000,
            ..Config::default()
        };
        edited.save(&paths.config_file()).unwrap();
        assert_eq!(load_or_init_config(&paths).unwrap(), edited);
    }
}
