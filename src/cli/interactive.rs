use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, warn};

use super::render::{render_detail, render_gallery, render_generated, render_settings};
use crate::error::AppResult;
use crate::gallery::view::ViewSelection;
use crate::image_generator::InferenceClient;
use crate::workflow::{GenerationController, SubmitOutcome};

pub const HELP: &str = "\
Commands:
  generate <prompt>          generate an image (alias: g)
  list                       show the gallery, newest first
  show <n>                   open the full prompt for record n
  close                      close the open detail or settings view
  delete <n>                 delete record n
  download <n> [file]        save record n's image to a file
  settings                   toggle the settings view
  key <value>                set the API key
  help                       show this help
  quit                       leave the session";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    Generate(String),
    List,
    Show(i64),
    Close,
    Delete(i64),
    Download(i64, Option<PathBuf>),
    Settings,
    SetKey(String),
    Help,
    Quit,
}

fn parse_position(arg: &str) -> Result<i64, String> {
    arg.trim()
        .parse::<i64>()
        .map_err(|_| format!("Not a record number: '{}'", arg.trim()))
}

/// Parses one session line. Prompts are passed through untrimmed past the command word.
pub fn parse_line(line: &str) -> Result<Option<SessionCommand>, String> {
    let line = line.trim_end_matches(['\r', '\n']);
    let trimmed = line.trim_start();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let (word, rest) = match trimmed.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest),
        None => (trimmed, ""),
    };

    let command = match word.to_ascii_lowercase().as_str() {
        "generate" | "g" => SessionCommand::Generate(rest.to_string()),
        "list" | "ls" => SessionCommand::List,
        "show" => SessionCommand::Show(parse_position(rest)?),
        "close" => SessionCommand::Close,
        "delete" | "rm" => SessionCommand::Delete(parse_position(rest)?),
        "download" => {
            let rest = rest.trim();
            let (position, dest) = match rest.split_once(char::is_whitespace) {
                Some((position, dest)) => (position, dest.trim()),
                None => (rest, ""),
            };
            let dest = (!dest.is_empty()).then(|| PathBuf::from(dest));
            SessionCommand::Download(parse_position(position)?, dest)
        }
        "settings" => SessionCommand::Settings,
        "key" => SessionCommand::SetKey(rest.trim().to_string()),
        "help" | "?" => SessionCommand::Help,
        "quit" | "exit" | "q" => SessionCommand::Quit,
        other => return Err(format!("Unknown command '{}'. Type 'help'.", other)),
    };
    Ok(Some(command))
}

pub struct Session<'a, C> {
    controller: &'a GenerationController<C>,
    view: ViewSelection,
    default_download: PathBuf,
}

impl<'a, C: InferenceClient> Session<'a, C> {
    pub fn new(controller: &'a GenerationController<C>, default_download: PathBuf) -> Self {
        Self {
            controller,
            view: ViewSelection::new(),
            default_download,
        }
    }

    pub fn view(&self) -> &ViewSelection {
        &self.view
    }

    /// Runs one command and returns the text to show. `Ok(None)` ends the session.
    pub async fn execute(&mut self, command: SessionCommand) -> AppResult<Option<String>> {
        let output = match command {
            SessionCommand::Generate(prompt) => match self.controller.submit(&prompt).await? {
                SubmitOutcome::Generated(record) => render_generated(&record),
                SubmitOutcome::Ignored => "A generation is already running.".to_string(),
            },
            SessionCommand::List => render_gallery(&self.controller.gallery()?),
            SessionCommand::Show(position) => {
                let records = self.controller.gallery()?;
                render_detail(self.view.open_detail(&records, position)?)
            }
            SessionCommand::Close => {
                if self.view.detail().is_some() {
                    self.view.close_detail();
                    "Closed detail view.".to_string()
                } else if self.view.settings_open() {
                    self.view.close_settings();
                    "Closed settings.".to_string()
                } else {
                    "Nothing to close.".to_string()
                }
            }
            SessionCommand::Delete(position) => {
                let records = self.controller.delete_record(position)?;
                // delete_record already validated the position
                self.view.on_record_removed(position as usize);
                render_gallery(&records)
            }
            SessionCommand::Download(position, dest) => {
                let dest = dest.unwrap_or_else(|| self.default_download.clone());
                let saved = self.controller.download_record(position, &dest).await?;
                format!("Saved image to {}", saved.display())
            }
            SessionCommand::Settings => {
                self.view.toggle_settings();
                if self.view.settings_open() {
                    render_settings(&self.controller.masked_credential()?)
                } else {
                    "Closed settings.".to_string()
                }
            }
            SessionCommand::SetKey(value) => {
                self.controller.set_credential(&value)?;
                if value.trim().is_empty() {
                    "API key cleared.".to_string()
                } else {
                    "API key saved.".to_string()
                }
            }
            SessionCommand::Help => HELP.to_string(),
            SessionCommand::Quit => return Ok(None),
        };
        Ok(Some(output))
    }
}

/// Reads commands from stdin until `quit` or end of input.
pub async fn run_session<C: InferenceClient>(
    controller: &GenerationController<C>,
    default_download: PathBuf,
) -> AppResult<()> {
    let mut session = Session::new(controller, default_download);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("{}", render_gallery(&controller.gallery()?));
    println!("Type 'help' for commands.");

    while let Some(line) = lines.next_line().await? {
        let command = match parse_line(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(message) => {
                println!("{}", message);
                continue;
            }
        };
        debug!("Session command: {:?}", command);

        match session.execute(command).await {
            Ok(Some(output)) => println!("{}", output),
            Ok(None) => break,
            Err(e) if e.is_user_facing() => println!("{}", e),
            Err(e) => {
                warn!("Session command failed: {}", e);
                println!("Error: {}", e);
            }
        }
    }
    Ok(())
}
