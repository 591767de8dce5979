//! Logging init: stderr, optionally teed into an append-only log file.

use std::fs;
use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

/// Writer that is either the log file or stderr (used when file clone fails).
enum FileOrStderr {
    File(fs::File),
    Stderr,
}

impl io::Write for FileOrStderr {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            FileOrStderr::File(f) => f.write(buf),
            FileOrStderr::Stderr => io::stderr().lock().write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            FileOrStderr::File(f) => f.flush(),
            FileOrStderr::Stderr => io::stderr().lock().flush(),
        }
    }
}

struct FileMakeWriter(fs::File);

impl<'a> MakeWriter<'a> for FileMakeWriter {
    type Writer = FileOrStderr;

    fn make_writer(&'a self) -> Self::Writer {
        self.0
            .try_clone()
            .map(FileOrStderr::File)
            .unwrap_or(FileOrStderr::Stderr)
    }
}

fn env_filter(verbose: bool) -> EnvFilter {
    let default = if verbose { "info,ytfetch=debug" } else { "info" };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

fn open_log_file(path: &Path) -> Result<fs::File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating log directory {}", parent.display()))?;
    }
    fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening log file {}", path.display()))
}

/// Install the global subscriber. With a log file, events go to both stderr
/// and the file; if the file cannot be opened we log to stderr and warn.
pub fn init_logging(verbose: bool, log_file: Option<&Path>) {
    let file = log_file.map(|path| (path, open_log_file(path)));

    match file {
        Some((path, Ok(file))) => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter(verbose))
                .with_writer(io::stderr.and(FileMakeWriter(file)))
                .with_ansi(false)
                .init();
            tracing::debug!(path = %path.display(), "logging to file");
        }
        Some((_, Err(e))) => {
            init_logging_stderr(verbose);
            tracing::warn!("file logging unavailable, using stderr only: {:#}", e);
        }
        None => init_logging_stderr(verbose),
    }
}

/// Initialize logging to stderr only.
pub fn init_logging_stderr(verbose: bool) {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(verbose))
        .with_writer(io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn log_file_is_created_with_parents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs/ytfetch.log");
        let file = open_log_file(&path).unwrap();

        let mut writer = FileMakeWriter(file).make_writer();
        writer.write_all(b"hello\n").unwrap();
        writer.flush().unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "hello\n");
    }

    #[test]
    fn unopenable_log_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        // a directory cannot be opened for append
        assert!(open_log_file(dir.path()).is_err());
    }
}
