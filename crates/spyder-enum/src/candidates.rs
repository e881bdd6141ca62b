//! Candidate label sources for brute forcing.

use spyder_core::{normalize_name, Result, SpyderError};
use std::path::PathBuf;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader, Lines};
use tracing::warn;

/// Where brute-force labels come from
#[derive(Debug, Clone)]
pub enum CandidateSource {
    /// Line-oriented wordlist on disk
    File(PathBuf),
    /// In-memory lines, same format as a wordlist
    Lines(Vec<String>),
}

impl CandidateSource {
    /// Wordlist file source
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::File(path.into())
    }

    /// In-memory source
    pub fn lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Lines(lines.into_iter().map(Into::into).collect())
    }

    /// Open the source for reading.
    pub async fn open(&self) -> Result<CandidateReader> {
        let inner = match self {
            Self::File(path) => {
                let file = File::open(path).await.map_err(|source| {
                    SpyderError::CandidateSourceOpenFailed {
                        path: path.clone(),
                        source,
                    }
                })?;
                Inner::File(BufReader::new(file).lines())
            }
            Self::Lines(lines) => Inner::Memory(lines.clone().into_iter()),
        };
        Ok(CandidateReader { inner })
    }
}

enum Inner {
    File(Lines<BufReader<File>>),
    Memory(std::vec::IntoIter<String>),
}

/// Opened candidate source yielding cleaned labels
pub struct CandidateReader {
    inner: Inner,
}

impl CandidateReader {
    /// Next usable label, or `None` at end of input.
    ///
    /// A read error mid-file ends the input early; it is logged, not returned.
    pub async fn next_candidate(&mut self) -> Option<String> {
        loop {
            let line = match &mut self.inner {
                Inner::Memory(lines) => lines.next()?,
                Inner::File(lines) => match lines.next_line().await {
                    Ok(line) => line?,
                    Err(e) => {
                        warn!(error = %e, "wordlist read failed, stopping early");
                        return None;
                    }
                },
            };
            if let Some(label) = parse_candidate(&line) {
                return Some(label);
            }
        }
    }
}

impl std::fmt::Debug for CandidateReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self.inner {
            Inner::File(_) => "file",
            Inner::Memory(_) => "memory",
        };
        f.debug_struct("CandidateReader").field("kind", &kind).finish()
    }
}

/// Clean one wordlist line; blank and `#` comment lines yield `None`.
pub fn parse_candidate(line: &str) -> Option<String> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return None;
    }
    let label = normalize_name(trimmed);
    (!label.is_empty()).then_some(label)
}
