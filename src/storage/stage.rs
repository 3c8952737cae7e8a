//! Stage storage trait and shared types

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::svg::AcceptedSvg;

/// Failures reported by a stage store
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("stage {stage} could not be created: {source}")]
    StageCreate {
        stage: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("stage manifest is corrupt: {reason}")]
    Manifest { reason: String },

    #[error("invalid object name: {name}")]
    InvalidObjectName { name: String },

    #[error("stage unavailable: {reason}")]
    Unavailable { reason: String },
}

impl StorageError {
    /// Whether the same store might succeed later. A corrupt manifest or a
    /// bad object name fails the same way every time.
    pub fn is_transient(&self) -> bool {
        match self {
            StorageError::StageCreate { .. }
            | StorageError::Write { .. }
            | StorageError::Read { .. }
            | StorageError::Unavailable { .. } => true,
            StorageError::Manifest { .. } | StorageError::InvalidObjectName { .. } => false,
        }
    }
}

/// Receipt for a stored file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredFile {
    /// Qualified stage name
    pub stage: String,
    /// Object name within the stage
    pub name: String,
    pub size_bytes: u64,
    /// Hex SHA-256 of the stored content
    pub sha256: String,
    pub stored_at: DateTime<Utc>,
}

/// One entry of a stage listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageFile {
    pub name: String,
    pub size_bytes: u64,
    pub last_modified: DateTime<Utc>,
}

/// Where accepted SVG documents are persisted.
///
/// `store` takes an [`AcceptedSvg`], which only the validator can produce,
/// so unvalidated markup cannot reach a stage.
pub trait StageStore: Send + Sync {
    /// Qualified stage name
    fn location(&self) -> &str;

    /// Write `svg` as `object_name`, replacing any existing file
    fn store(&self, object_name: &str, svg: &AcceptedSvg) -> Result<StoredFile, StorageError>;

    /// Files currently in the stage, sorted by name
    fn list(&self) -> Result<Vec<StageFile>, StorageError>;
}

/// Reject names that could escape the stage or hide files
pub fn check_object_name(name: &str) -> Result<(), StorageError> {
    let bad = name.is_empty()
        || name.starts_with('.')
        || name.contains(['/', '\\', '\0'])
        || name.contains("..");
    if bad {
        return Err(StorageError::InvalidObjectName {
            name: name.to_string(),
        });
    }
    Ok(())
}

/// SQL a user can run to fetch a stored file back out of the stage
pub fn retrieval_instructions(stage: &str, object_name: &str) -> String {
    format!(
        "-- Download the file from the stage\n\
         GET @{stage}/{object} file://path/to/local/directory/;\n\
         \n\
         -- Or copy it into a table for further processing\n\
         CREATE OR REPLACE TABLE svg_files (filename STRING, content STRING);\n\
         \n\
         COPY INTO svg_files\n\
         FROM (SELECT '{object}' AS filename, $1 AS content FROM @{stage}/{object})\n\
         FILE_FORMAT = (TYPE = 'CSV' FIELD_DELIMITER = NONE RECORD_DELIMITER = NONE);\n\
         \n\
         SELECT * FROM svg_files WHERE filename = '{object}';\n",
        stage = stage,
        object = object_name
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_names() {
        assert!(check_object_name("logo.svg").is_ok());
        for bad in ["", ".hidden.svg", "../x.svg", "a/b.svg", "a\\b.svg"] {
            assert!(check_object_name(bad).is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn test_retrieval_instructions() {
        let sql = retrieval_instructions("ART.PUBLIC.SVG_STAGE", "logo.svg");
        assert!(sql.contains("GET @ART.PUBLIC.SVG_STAGE/logo.svg file://"));
        assert!(sql.contains("WHERE filename = 'logo.svg'"));
    }
}
