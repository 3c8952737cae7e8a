//! In-process stage for tests and dry runs

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

use super::stage::{check_object_name, StageFile, StageStore, StorageError, StoredFile};
use crate::svg::AcceptedSvg;

/// Stage held in memory
pub struct MemoryStage {
    name: String,
    files: Mutex<BTreeMap<String, (String, DateTime<Utc>)>>,
    outage: Option<String>,
}

impl MemoryStage {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            files: Mutex::new(BTreeMap::new()),
            outage: None,
        }
    }

    /// A stage whose every operation fails with `reason`
    pub fn unavailable(name: &str, reason: &str) -> Self {
        Self {
            outage: Some(reason.to_string()),
            ..Self::new(name)
        }
    }

    /// Content of a stored object
    pub fn get(&self, object_name: &str) -> Option<String> {
        self.files()
            .get(object_name)
            .map(|(content, _)| content.clone())
    }

    pub fn len(&self) -> usize {
        self.files().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_outage(&self) -> Result<(), StorageError> {
        match &self.outage {
            Some(reason) => Err(StorageError::Unavailable {
                reason: reason.clone(),
            }),
            None => Ok(()),
        }
    }

    /// The map is only ever mutated by single inserts, so a panic while
    /// the lock was held cannot leave it half-updated.
    fn files(&self) -> MutexGuard<'_, BTreeMap<String, (String, DateTime<Utc>)>> {
        self.files.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl StageStore for MemoryStage {
    fn location(&self) -> &str {
        &self.name
    }

    fn store(&self, object_name: &str, svg: &AcceptedSvg) -> Result<StoredFile, StorageError> {
        self.check_outage()?;
        check_object_name(object_name)?;

        let now = Utc::now();
        let mut files = self.files();
        files.insert(object_name.to_string(), (svg.markup().to_string(), now));

        Ok(StoredFile {
            stage: self.name.clone(),
            name: object_name.to_string(),
            size_bytes: svg.byte_length() as u64,
            sha256: format!("{:x}", Sha256::digest(svg.markup().as_bytes())),
            stored_at: now,
        })
    }

    fn list(&self) -> Result<Vec<StageFile>, StorageError> {
        self.check_outage()?;
        let files = self.files();
        Ok(files
            .iter()
            .map(|(name, (content, at))| StageFile {
                name: name.clone(),
                size_bytes: content.len() as u64,
                last_modified: *at,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::svg::{ExtractedSvg, SvgValidator};

    #[test]
    fn test_store_and_list() {
        let stage = MemoryStage::new("MEM");
        let svg = SvgValidator::default()
            .validate(&ExtractedSvg::new(r#"<svg viewBox="0 0 1 1"></svg>"#))
            .into_result()
            .unwrap();

        let stored = stage.store("x.svg", &svg).unwrap();
        assert_eq!(stored.stage, "MEM");
        assert_eq!(stage.get("x.svg").as_deref(), Some(svg.markup()));
        assert_eq!(stage.list().unwrap()[0].size_bytes, stored.size_bytes);
    }

    #[test]
    fn test_unavailable_stage() {
        let stage = MemoryStage::unavailable("MEM", "permission denied");
        assert!(matches!(stage.list(), Err(StorageError::Unavailable { .. })));
        assert!(stage.is_empty());
    }

    #[test]
    fn test_survives_panic_while_locked() {
        let stage = MemoryStage::new("MEM");
        let svg = SvgValidator::default()
            .validate(&ExtractedSvg::new(r#"<svg viewBox="0 0 1 1"></svg>"#))
            .into_result()
            .unwrap();
        stage.store("before.svg", &svg).unwrap();

        let panicked = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = stage.files.lock().unwrap();
            panic!("writer crashed");
        }));
        assert!(panicked.is_err());
        assert!(stage.files.is_poisoned());

        assert_eq!(stage.len(), 1);
        assert_eq!(stage.get("before.svg").as_deref(), Some(svg.markup()));
        stage.store("after.svg", &svg).unwrap();
        assert_eq!(stage.list().unwrap().len(), 2);
    }
}
