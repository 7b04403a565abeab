//! Rolling Logger
//!
//! Installs a global `tracing` subscriber that writes to stderr and to a
//! daily log file `<dir>/<app>-YYYY-MM-DD.log`. Only the newest
//! `max_files` files are kept. The last formatted lines are also kept in a
//! circular buffer so a running process can show them without reading disk.
//!
//! Records emitted through the `log` crate are bridged into the same
//! subscriber.

use std::collections::VecDeque;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};

use chrono::{Local, NaiveDate};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

pub const DEFAULT_MAX_FILES: usize = 7;
pub const DEFAULT_RECENT_LINES: usize = 500;

static RECENT: OnceLock<Mutex<VecDeque<String>>> = OnceLock::new();
static RECENT_CAPACITY: OnceLock<usize> = OnceLock::new();
static INITIALIZED: OnceLock<()> = OnceLock::new();

/// Initialize logging with default retention.
///
/// `RUST_LOG` selects levels (default `info`). Fails if a global subscriber
/// is already installed or the directory cannot be created.
pub fn init_logger(log_dir: impl AsRef<Path>, app_name: &str) -> io::Result<()> {
    init_logger_with(log_dir, app_name, DEFAULT_MAX_FILES, DEFAULT_RECENT_LINES)
}

pub fn init_logger_with(
    log_dir: impl AsRef<Path>,
    app_name: &str,
    max_files: usize,
    recent_lines: usize,
) -> io::Result<()> {
    let _ = RECENT_CAPACITY.set(recent_lines.max(1));
    let file = RollingFile::new(log_dir.as_ref(), app_name, max_files)?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(io::stderr))
        .with(fmt::layer().with_ansi(false).with_writer(file))
        .try_init()
        .map_err(io::Error::other)?;

    let _ = INITIALIZED.set(());
    tracing::info!(dir = %log_dir.as_ref().display(), app = app_name, "logger initialized");
    Ok(())
}

fn not_initialized() -> io::Error {
    io::Error::new(io::ErrorKind::NotFound, "logger not initialized")
}

/// Log a plain message at info level
pub fn info(msg: &str) -> io::Result<()> {
    INITIALIZED.get().ok_or_else(not_initialized)?;
    log::info!("{}", msg);
    Ok(())
}

/// Log a plain message at error level
pub fn error(msg: &str) -> io::Result<()> {
    INITIALIZED.get().ok_or_else(not_initialized)?;
    log::error!("{}", msg);
    Ok(())
}

/// Most recent formatted lines, oldest first
pub fn recent_lines() -> Vec<String> {
    match RECENT.get() {
        Some(buffer) => buffer
            .lock()
            .map(|b| b.iter().cloned().collect())
            .unwrap_or_default(),
        None => Vec::new(),
    }
}

fn remember(bytes: &[u8]) {
    let capacity = *RECENT_CAPACITY.get_or_init(|| DEFAULT_RECENT_LINES);
    let buffer = RECENT.get_or_init(|| Mutex::new(VecDeque::with_capacity(capacity)));
    let Ok(mut buffer) = buffer.lock() else {
        return;
    };

    for line in String::from_utf8_lossy(bytes).lines() {
        if line.is_empty() {
            continue;
        }
        if buffer.len() == capacity {
            buffer.pop_front();
        }
        buffer.push_back(line.to_string());
    }
}

struct CurrentFile {
    date: NaiveDate,
    file: File,
}

/// Daily log file writer for `tracing_subscriber::fmt`
pub struct RollingFile {
    dir: PathBuf,
    prefix: String,
    max_files: usize,
    current: Mutex<CurrentFile>,
}

impl RollingFile {
    pub fn new(dir: &Path, prefix: &str, max_files: usize) -> io::Result<Self> {
        fs::create_dir_all(dir)?;
        let date = Local::now().date_naive();
        let file = Self::open(dir, prefix, date)?;

        let rolling = Self {
            dir: dir.to_path_buf(),
            prefix: prefix.to_string(),
            max_files: max_files.max(1),
            current: Mutex::new(CurrentFile { date, file }),
        };
        rolling.prune()?;
        Ok(rolling)
    }

    pub fn file_name(prefix: &str, date: NaiveDate) -> String {
        format!("{}-{}.log", prefix, date.format("%Y-%m-%d"))
    }

    fn open(dir: &Path, prefix: &str, date: NaiveDate) -> io::Result<File> {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(dir.join(Self::file_name(prefix, date)))
    }

    /// Log files of this prefix, oldest first
    pub fn log_files(&self) -> io::Result<Vec<PathBuf>> {
        let head = format!("{}-", self.prefix);
        let mut files: Vec<PathBuf> = fs::read_dir(&self.dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.file_name()
                    .and_then(|n| n.to_str())
                    .map(|n| n.starts_with(&head) && n.ends_with(".log"))
                    .unwrap_or(false)
            })
            .collect();
        // date suffix sorts lexicographically
        files.sort();
        Ok(files)
    }

    fn prune(&self) -> io::Result<()> {
        let files = self.log_files()?;
        if files.len() > self.max_files {
            for old in &files[..files.len() - self.max_files] {
                fs::remove_file(old)?;
            }
        }
        Ok(())
    }

    /// Switch to the file for `date` if it differs from the open one
    pub fn roll_to(&self, date: NaiveDate) -> io::Result<()> {
        let mut current = self.current.lock().map_err(|_| io::Error::other("log file lock poisoned"))?;
        if current.date == date {
            return Ok(());
        }
        current.file = Self::open(&self.dir, &self.prefix, date)?;
        current.date = date;
        drop(current);
        self.prune()
    }

    fn write_line(&self, buf: &[u8]) -> io::Result<usize> {
        self.roll_to(Local::now().date_naive())?;
        let mut current = self.current.lock().map_err(|_| io::Error::other("log file lock poisoned"))?;
        current.file.write_all(buf)?;
        remember(buf);
        Ok(buf.len())
    }
}

/// Writer handed out per event
pub struct RollingWriter<'a> {
    target: &'a RollingFile,
}

impl Write for RollingWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.target.write_line(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut current = self
            .target
            .current
            .lock()
            .map_err(|_| io::Error::other("log file lock poisoned"))?;
        current.file.flush()
    }
}

impl<'a> MakeWriter<'a> for RollingFile {
    type Writer = RollingWriter<'a>;

    fn make_writer(&'a self) -> Self::Writer {
        RollingWriter { target: self }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    #[test]
    fn test_file_name_format() {
        assert_eq!(RollingFile::file_name("RecipeBox", day(5)), "RecipeBox-2024-03-05.log");
    }

    #[test]
    fn test_writes_through_subscriber() {
        let dir = TempDir::new().unwrap();
        let file = RollingFile::new(dir.path(), "Test", 3).unwrap();
        let subscriber = tracing_subscriber::registry()
            .with(fmt::layer().with_ansi(false).with_writer(file));

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(recipe_id = 7, "saved recipe");
        });

        let name = RollingFile::file_name("Test", Local::now().date_naive());
        let text = fs::read_to_string(dir.path().join(name)).unwrap();
        assert!(text.contains("saved recipe"));
        assert!(text.contains("recipe_id=7"));
        assert!(recent_lines().iter().any(|l| l.contains("saved recipe")));
    }

    #[test]
    fn test_roll_and_prune() {
        let dir = TempDir::new().unwrap();
        let file = RollingFile::new(dir.path(), "App", 2).unwrap();

        for d in 1..=4 {
            file.roll_to(day(d)).unwrap();
        }

        let names: Vec<String> = file
            .log_files()
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        // today's file sorts after the rolled ones and survives
        let today = RollingFile::file_name("App", Local::now().date_naive());
        assert_eq!(names, vec!["App-2024-03-04.log".to_string(), today]);
    }

    #[test]
    fn test_prune_ignores_other_prefixes() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("Other-2020-01-01.log"), "x").unwrap();
        fs::write(dir.path().join("notes.txt"), "x").unwrap();

        let file = RollingFile::new(dir.path(), "App", 1).unwrap();
        file.roll_to(day(1)).unwrap();

        assert!(dir.path().join("Other-2020-01-01.log").exists());
        assert!(dir.path().join("notes.txt").exists());
        assert_eq!(file.log_files().unwrap().len(), 1);
    }

    #[test]
    fn test_recent_lines_split_multiline_writes() {
        remember(b"first unique-line-a\nsecond unique-line-b\n");
        let lines = recent_lines();
        assert!(lines.iter().any(|l| l == "first unique-line-a"));
        assert!(lines.iter().any(|l| l == "second unique-line-b"));
    }
}
