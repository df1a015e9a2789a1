use std::fs::{self, File, OpenOptions};
use std::path::PathBuf;

use env_logger::{Builder, Target};
use log::LevelFilter;

/// Where log records go. The TUI owns the terminal, so it logs to a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTarget {
    Stderr,
    File,
}

pub fn log_file_path() -> Option<PathBuf> {
    dirs::cache_dir().map(|d| d.join("pagegen").join("pagegen.log"))
}

fn open_log_file() -> Option<(File, PathBuf)> {
    let path = log_file_path()?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).ok()?;
    }
    let file = OpenOptions::new().create(true).append(true).open(&path).ok()?;
    Some((file, path))
}

/// Initialize `env_logger`. Records are opt-in through `RUST_LOG`;
/// without it only warnings and errors are written.
pub fn init(target: LogTarget) -> Option<PathBuf> {
    let mut builder = Builder::from_default_env();
    if std::env::var("RUST_LOG").is_err() {
        builder.filter_level(LevelFilter::Warn);
    }

    let path = match target {
        LogTarget::Stderr => {
            builder.target(Target::Stderr);
            None
        }
        LogTarget::File => match open_log_file() {
            Some((file, path)) => {
                builder.target(Target::Pipe(Box::new(file)));
                Some(path)
            }
            // Writing to stderr would corrupt the alternate screen
            None => {
                builder.filter_level(LevelFilter::Off);
                None
            }
        },
    };

    let _ = builder.try_init();
    path
}
