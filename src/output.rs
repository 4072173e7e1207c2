//! Output document writing and teams file loading.
//!
//! The output is one pretty-printed JSON array of [`OutputRecord`]s, written
//! once per run. It goes to a temporary file beside the target first and is
//! renamed into place, so a crash never leaves a truncated document behind.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::graph::Team;
use crate::graph::model::GraphCollection;
use crate::record::OutputRecord;

/// Suffix of the temporary file written before the final rename.
const PARTIAL_SUFFIX: &str = ".part";

/// Errors produced while writing the output document.
#[derive(Debug, Error)]
pub enum OutputError {
    /// I/O error creating directories or writing the file.
    #[error("I/O error writing {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// JSON serialization error (shouldn't occur for well-formed records).
    #[error("JSON serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl OutputError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Errors produced while loading a teams file.
#[derive(Debug, Error)]
pub enum TeamsFileError {
    /// The file does not exist.
    #[error("teams file not found: {0}")]
    NotFound(PathBuf),
    /// The file could not be read.
    #[error("cannot read teams file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The file is neither a team array nor a `{ "value": [...] }` mapping.
    #[error("invalid teams file {path}: {source}\n  Expected a JSON array of teams or an object with a \"value\" array")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Accepted layouts of a teams file.
#[derive(Deserialize)]
#[serde(untagged)]
enum TeamsDocument {
    List(Vec<Team>),
    Collection(GraphCollection<Team>),
}

/// Serializes `records` as a pretty-printed JSON array at `path`.
///
/// Parent directories are created as needed. An empty slice produces `[]`.
///
/// # Errors
///
/// Returns [`OutputError`] on serialization or I/O failure.
#[instrument(skip(records), fields(path = %path.display(), count = records.len()))]
pub async fn write_document(path: &Path, records: &[OutputRecord]) -> Result<(), OutputError> {
    let body = serde_json::to_vec_pretty(records)?;

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| OutputError::io(parent, e))?;
    }

    let partial = partial_path(path);
    if let Err(err) = tokio::fs::write(&partial, &body).await {
        let _ = tokio::fs::remove_file(&partial).await;
        return Err(OutputError::io(&partial, err));
    }
    if let Err(err) = tokio::fs::rename(&partial, path).await {
        let _ = tokio::fs::remove_file(&partial).await;
        return Err(OutputError::io(path, err));
    }

    debug!(bytes = body.len(), "output document written");
    Ok(())
}

/// Loads a pre-fetched team list.
///
/// # Errors
///
/// Returns [`TeamsFileError`] when the file is missing, unreadable, or not
/// one of the accepted layouts.
#[instrument(fields(path = %path.display()))]
pub async fn load_teams_file(path: &Path) -> Result<Vec<Team>, TeamsFileError> {
    let content = match tokio::fs::read(path).await {
        Ok(content) => content,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            return Err(TeamsFileError::NotFound(path.to_path_buf()));
        }
        Err(source) => {
            return Err(TeamsFileError::Io {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    let document: TeamsDocument =
        serde_json::from_slice(&content).map_err(|source| TeamsFileError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
    let teams = match document {
        TeamsDocument::List(teams) => teams,
        TeamsDocument::Collection(collection) => collection.value,
    };
    debug!(count = teams.len(), "loaded teams file");
    Ok(teams)
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(PARTIAL_SUFFIX);
    path.with_file_name(name)
}
