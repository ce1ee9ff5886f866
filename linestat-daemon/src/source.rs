//! Line source: stdin, a file, or a followed file.
//!
//! Lines are read as raw bytes and decoded lossily, so a stray invalid
//! UTF-8 sequence never stops the stream. Trailing `\n` and `\r\n` are
//! stripped before the line is handed to the callback.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};

/// Default interval between size checks while following a file.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Where lines come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineInput {
    /// Standard input until EOF.
    Stdin,
    /// A file, read once to EOF or followed as it grows.
    File { path: PathBuf, follow: bool },
}

impl LineInput {
    /// Build the input from the `--file` and `--follow` flags.
    pub fn from_args(file: Option<PathBuf>, follow: bool) -> Self {
        match file {
            Some(path) => Self::File { path, follow },
            None => Self::Stdin,
        }
    }
}

/// Feed every line of `input` to `on_line` and return the number of lines read.
///
/// Returns at EOF for stdin and non-followed files. A followed file only
/// returns on I/O errors; callers stop it by dropping the future.
pub async fn pump<F>(input: &LineInput, poll_interval: Duration, on_line: F) -> Result<u64>
where
    F: FnMut(&str),
{
    match input {
        LineInput::Stdin => read_to_eof(BufReader::new(tokio::io::stdin()), on_line).await,
        LineInput::File {
            path,
            follow: false,
        } => {
            let file = open(path).await?;
            read_to_eof(BufReader::new(file), on_line).await
        }
        LineInput::File { path, follow: true } => follow(path, poll_interval, on_line).await,
    }
}

async fn open(path: &Path) -> Result<File> {
    File::open(path)
        .await
        .with_context(|| format!("failed to open input file {}", path.display()))
}

async fn read_to_eof<R, F>(mut reader: BufReader<R>, mut on_line: F) -> Result<u64>
where
    R: AsyncRead + Unpin,
    F: FnMut(&str),
{
    let mut buf = Vec::with_capacity(1024);
    let mut count = 0u64;
    loop {
        buf.clear();
        let n = reader
            .read_until(b'\n', &mut buf)
            .await
            .context("failed to read input")?;
        if n == 0 {
            return Ok(count);
        }
        on_line(&decode(&buf));
        count += 1;
    }
}

async fn follow<F>(path: &Path, poll_interval: Duration, mut on_line: F) -> Result<u64>
where
    F: FnMut(&str),
{
    let mut reader = BufReader::new(open(path).await?);
    let mut position = 0u64;
    let mut pending: Vec<u8> = Vec::with_capacity(1024);
    let mut count = 0u64;

    loop {
        let n = reader
            .read_until(b'\n', &mut pending)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?;
        position += n as u64;

        if n > 0 {
            // a partial line waits for the rest of it
            if pending.last() == Some(&b'\n') {
                on_line(&decode(&pending));
                pending.clear();
                count += 1;
            }
            continue;
        }

        tokio::time::sleep(poll_interval).await;

        let len = match tokio::fs::metadata(path).await {
            Ok(meta) => meta.len(),
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "input file unavailable, retrying");
                continue;
            }
        };
        if len < position {
            tracing::info!(
                path = %path.display(),
                previous_size = position,
                size = len,
                "input file truncated, reopening"
            );
            reader = BufReader::new(open(path).await?);
            position = 0;
            pending.clear();
        }
    }
}

fn decode(raw: &[u8]) -> std::borrow::Cow<'_, str> {
    let mut end = raw.len();
    if end > 0 && raw[end - 1] == b'\n' {
        end -= 1;
        if end > 0 && raw[end - 1] == b'\r' {
            end -= 1;
        }
    }
    String::from_utf8_lossy(&raw[..end])
}
