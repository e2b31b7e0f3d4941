//! Transcript and takeaway artifacts.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use tracing::info;

use crate::engine::RunId;
use crate::error::{ParleyError, Result};

const MIN_PREFIX_LEN: usize = 5;
const MAX_PREFIX_LEN: usize = 30;
const FALLBACK_PREFIX: &str = "conversation";

/// Destination for run artifacts.
pub trait OutputSink: Send + Sync {
    /// Persist `contents` under `file_name`, returning where it landed.
    fn write_artifact(&self, file_name: &str, contents: &str) -> Result<PathBuf>;
}

/// Writes artifacts into a directory on disk.
#[derive(Debug, Clone)]
pub struct FileOutputSink {
    dir: PathBuf,
}

impl FileOutputSink {
    /// Create the sink, creating `dir` (and parents) if missing.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|source| ParleyError::Output {
            path: dir.clone(),
            source,
        })?;
        Ok(Self { dir })
    }
}

impl OutputSink for FileOutputSink {
    fn write_artifact(&self, file_name: &str, contents: &str) -> Result<PathBuf> {
        let path = self.dir.join(file_name);
        std::fs::write(&path, contents).map_err(|source| ParleyError::Output {
            path: path.clone(),
            source,
        })?;
        info!(path = %path.display(), bytes = contents.len(), "Wrote artifact");
        Ok(path)
    }
}

/// `<goal-prefix>_<YYYYmmdd_HHMMSS>_<run-id-prefix>.txt`
pub fn transcript_file_name(goal: &str, run_id: RunId, at: DateTime<Utc>) -> String {
    let id = run_id.simple().to_string();
    format!(
        "{}_{}_{}.txt",
        goal_prefix(goal),
        at.format("%Y%m%d_%H%M%S"),
        &id[..8]
    )
}

/// `<transcript-stem>_takeaways.txt`
pub fn takeaways_file_name(transcript_file_name: &str) -> String {
    let stem = transcript_file_name
        .strip_suffix(".txt")
        .unwrap_or(transcript_file_name);
    format!("{stem}_takeaways.txt")
}

/// Takeaways file body, headed by the transcript it was drawn from.
pub fn takeaways_document(transcript_file_name: &str, takeaways: &str) -> String {
    format!("# Takeaways from: {transcript_file_name}\n\n{takeaways}\n")
}

fn goal_prefix(goal: &str) -> String {
    let prefix: String = goal
        .chars()
        .take(MAX_PREFIX_LEN)
        .flat_map(char::to_lowercase)
        .map(|c| if c == ' ' { '_' } else { c })
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .collect();
    if prefix.len() < MIN_PREFIX_LEN {
        FALLBACK_PREFIX.to_string()
    } else {
        prefix
    }
}
