//! Directory-backed stage
//!
//! Each stage is a directory under the configured root, named after the
//! qualified stage name. A `manifest.json` beside the files records size,
//! checksum and creation time for each upload.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use walkdir::WalkDir;

use super::stage::{check_object_name, StageFile, StageStore, StorageError, StoredFile};
use crate::config::StageConfig;
use crate::svg::AcceptedSvg;

const MANIFEST_FILE: &str = "manifest.json";
const TEMP_SUFFIX: &str = ".partial";

/// Metadata for a single stored file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub size_bytes: u64,
    pub sha256: String,
    pub created_at: DateTime<Utc>,
}

/// Manifest tracking every file in a stage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageManifest {
    pub files: BTreeMap<String, ManifestEntry>,
}

/// A stage stored in a local directory.
pub struct LocalStage {
    name: String,
    dir: PathBuf,
}

impl LocalStage {
    /// Create a handle; the directory is created on first write.
    pub fn new(config: &StageConfig) -> Self {
        let name = config.qualified_name();
        let dir = config.root.join(&name);
        Self { name, dir }
    }

    /// Get the stage directory path.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn manifest_path(&self) -> PathBuf {
        self.dir.join(MANIFEST_FILE)
    }

    /// Create the stage directory if it does not exist yet.
    pub fn ensure_stage(&self) -> Result<(), StorageError> {
        if !self.dir.exists() {
            fs::create_dir_all(&self.dir).map_err(|e| StorageError::StageCreate {
                stage: self.name.clone(),
                source: e,
            })?;
            tracing::info!(stage = %self.name, dir = %self.dir.display(), "created stage");
        }
        Ok(())
    }

    /// Load the manifest from disk.
    pub fn load_manifest(&self) -> Result<StageManifest, StorageError> {
        let path = self.manifest_path();
        if !path.exists() {
            return Ok(StageManifest::default());
        }

        let content = fs::read_to_string(&path).map_err(|e| StorageError::Read {
            path: path.clone(),
            source: e,
        })?;
        serde_json::from_str(&content).map_err(|e| StorageError::Manifest {
            reason: e.to_string(),
        })
    }

    fn save_manifest(&self, manifest: &StageManifest) -> Result<(), StorageError> {
        let content =
            serde_json::to_string_pretty(manifest).map_err(|e| StorageError::Manifest {
                reason: e.to_string(),
            })?;
        write_atomic(&self.manifest_path(), content.as_bytes())
    }
}

impl StageStore for LocalStage {
    fn location(&self) -> &str {
        &self.name
    }

    fn store(&self, object_name: &str, svg: &AcceptedSvg) -> Result<StoredFile, StorageError> {
        check_object_name(object_name)?;
        if object_name == MANIFEST_FILE || object_name.ends_with(TEMP_SUFFIX) {
            return Err(StorageError::InvalidObjectName {
                name: object_name.to_string(),
            });
        }
        self.ensure_stage()?;

        // A manifest that cannot be read must not leave an untracked file
        let previous = self.load_manifest()?;

        let bytes = svg.markup().as_bytes();
        let target = self.dir.join(object_name);
        let temp = temp_path(&target);
        write_file(&temp, bytes)?;

        let entry = ManifestEntry {
            size_bytes: bytes.len() as u64,
            sha256: format!("{:x}", Sha256::digest(bytes)),
            created_at: Utc::now(),
        };

        let mut manifest = previous.clone();
        manifest
            .files
            .insert(object_name.to_string(), entry.clone());
        if let Err(e) = self.save_manifest(&manifest) {
            let _ = fs::remove_file(&temp);
            return Err(e);
        }

        if let Err(e) = commit(&temp, &target) {
            if let Err(restore) = self.save_manifest(&previous) {
                tracing::warn!(stage = %self.name, error = %restore, "could not restore manifest");
            }
            return Err(e);
        }

        tracing::info!(
            stage = %self.name,
            object = object_name,
            bytes = entry.size_bytes,
            "stored file"
        );

        Ok(StoredFile {
            stage: self.name.clone(),
            name: object_name.to_string(),
            size_bytes: entry.size_bytes,
            sha256: entry.sha256,
            stored_at: entry.created_at,
        })
    }

    fn list(&self) -> Result<Vec<StageFile>, StorageError> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(&self.dir).min_depth(1).max_depth(1) {
            let entry = entry.map_err(|e| StorageError::Read {
                path: self.dir.clone(),
                source: e.into(),
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            if name == MANIFEST_FILE || name.ends_with(TEMP_SUFFIX) {
                continue;
            }

            let metadata = entry.metadata().map_err(|e| StorageError::Read {
                path: entry.path().to_path_buf(),
                source: e.into(),
            })?;
            let last_modified = metadata
                .modified()
                .map(DateTime::<Utc>::from)
                .unwrap_or_else(|_| Utc::now());

            files.push(StageFile {
                name,
                size_bytes: metadata.len(),
                last_modified,
            });
        }

        files.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(files)
    }
}

/// Sibling path a file is written to before it is moved into place
fn temp_path(path: &Path) -> PathBuf {
    let mut temp = path.as_os_str().to_owned();
    temp.push(TEMP_SUFFIX);
    PathBuf::from(temp)
}

/// Write through a temporary sibling so readers never see half a file
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), StorageError> {
    let temp = temp_path(path);
    write_file(&temp, bytes)?;
    commit(&temp, path)
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<(), StorageError> {
    fs::write(path, bytes).map_err(|e| StorageError::Write {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Move a finished temporary file over `path`, removing it on failure
fn commit(temp: &Path, path: &Path) -> Result<(), StorageError> {
    fs::rename(temp, path).map_err(|e| {
        let _ = fs::remove_file(temp);
        StorageError::Write {
            path: path.to_path_buf(),
            source: e,
        }
    })
}
