use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

struct OpenLog {
    date: String,
    file: File,
}

/// Appends log lines to one file per day (`app-YYYY-MM-DD.txt`).
pub struct LogManager {
    file: Mutex<Option<OpenLog>>,
    log_dir: PathBuf,
}

impl LogManager {
    pub fn new(log_dir: &Path) -> io::Result<Self> {
        fs::create_dir_all(log_dir)?;

        Ok(Self {
            file: Mutex::new(None),
            log_dir: log_dir.to_path_buf(),
        })
    }

    fn today() -> String {
        chrono::Local::now().format("%Y-%m-%d").to_string()
    }

    pub fn current_log_file_path(&self) -> PathBuf {
        self.log_file_path(&Self::today())
    }

    fn log_file_path(&self, date: &str) -> PathBuf {
        self.log_dir.join(Self::file_name(date))
    }

    fn write_bytes(&self, buf: &[u8]) -> io::Result<()> {
        let today = Self::today();
        let mut guard = self
            .file
            .lock()
            .map_err(|e| io::Error::new(io::ErrorKind::Other, format!("Lock error: {}", e)))?;

        // Rotate when the date changed or the file was removed underneath us
        let needs_new_file = match guard.as_ref() {
            Some(open) => open.date != today || !self.log_file_path(&open.date).exists(),
            None => true,
        };

        if needs_new_file {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(self.log_file_path(&today))?;
            *guard = Some(OpenLog { date: today, file });
        }

        if let Some(open) = guard.as_mut() {
            open.file.write_all(buf)?;
            open.file.flush()?;
        }

        Ok(())
    }

    fn file_name(date: &str) -> String {
        format!("app-{}.txt", date)
    }
}

pub struct LogWriter<'a> {
    manager: &'a LogManager,
}

impl Write for LogWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.manager.write_bytes(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogManager {
    type Writer = LogWriter<'a>;

    fn make_writer(&'a self) -> Self::Writer {
        LogWriter { manager: self }
    }
}

/// Installs the global subscriber: stderr always, plus the daily file when a log dir is given.
/// Stderr only shows warnings unless `verbose` is set; the file gets everything the filter lets through.
pub fn init_tracing(log_dir: Option<&Path>, verbose: bool) -> io::Result<()> {
    let level = if verbose { "debug" } else { "info" };
    let stderr_level = if verbose {
        LevelFilter::TRACE
    } else {
        LevelFilter::WARN
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let manager = log_dir.map(LogManager::new).transpose()?;
    let log_file = manager.as_ref().map(LogManager::current_log_file_path);
    let file_layer = manager.map(|manager| {
        tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_target(true)
            .with_writer(manager)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_filter(stderr_level),
        )
        .with(file_layer)
        .try_init()
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;

    if let Some(path) = log_file {
        tracing::debug!("Writing logs to {}", path.display());
    }
    Ok(())
}
