use std::io::{self, Write};
use std::process::{Command, Stdio};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClipboardError {
    #[error("no clipboard tool found (install wl-clipboard, xclip or xsel)")]
    NoBackend,

    #[error("failed to start {tool}: {source}")]
    Spawn {
        tool: &'static str,
        #[source]
        source: io::Error,
    },

    #[error("failed to write to {tool}: {source}")]
    Write {
        tool: &'static str,
        #[source]
        source: io::Error,
    },

    #[error("{tool} exited with {status}")]
    Exit { tool: &'static str, status: String },
}

pub trait Clipboard: Send {
    fn set_text(&mut self, text: &str) -> Result<(), ClipboardError>;
}

/// Copies by piping into the platform's clipboard command.
#[derive(Debug, Default)]
pub struct SystemClipboard;

#[cfg(target_os = "macos")]
const CANDIDATES: &[(&str, &[&str])] = &[("pbcopy", &[])];

#[cfg(target_os = "windows")]
const CANDIDATES: &[(&str, &[&str])] = &[("clip", &[])];

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
const CANDIDATES: &[(&str, &[&str])] = &[
    ("wl-copy", &[]),
    ("xclip", &["-selection", "clipboard"]),
    ("xsel", &["--clipboard", "--input"]),
];

fn pipe_to(tool: &'static str, args: &[&str], text: &str) -> Result<(), ClipboardError> {
    let mut child = Command::new(tool)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|source| ClipboardError::Spawn { tool, source })?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin
            .write_all(text.as_bytes())
            .map_err(|source| ClipboardError::Write { tool, source })?;
    }

    let status = child
        .wait()
        .map_err(|source| ClipboardError::Write { tool, source })?;
    if !status.success() {
        return Err(ClipboardError::Exit { tool, status: status.to_string() });
    }
    Ok(())
}

impl Clipboard for SystemClipboard {
    fn set_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        for &(tool, args) in CANDIDATES {
            match pipe_to(tool, args, text) {
                Err(ClipboardError::Spawn { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
                    log::debug!("{} not available, trying next clipboard tool", tool);
                    continue;
                }
                result => return result,
            }
        }
        Err(ClipboardError::NoBackend)
    }
}
