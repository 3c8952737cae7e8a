//! Stage storage
//!
//! Persists accepted SVG documents and lists what a stage holds.

mod local;
mod memory;
mod stage;

pub use local::{LocalStage, ManifestEntry, StageManifest};
pub use memory::MemoryStage;
pub use stage::{
    check_object_name, retrieval_instructions, StageFile, StageStore, StorageError, StoredFile,
};
