//! Svgen - Prompt-to-SVG Generation Pipeline
//!
//! Svgen turns a natural-language description into an SVG file stored in a
//! warehouse stage:
//! 1. Build an instruction from the description
//! 2. Ask a hosted language model for SVG markup
//! 3. Pull the SVG out of the model's free-form reply
//! 4. Validate it against size, structure and safety rules
//! 5. Store accepted markup in a named stage
//!
//! # Architecture
//!
//! Model replies are untrusted. The only way to obtain an [`AcceptedSvg`]
//! is through [`SvgValidator`], and stages only accept that type, so no
//! unvalidated text can be persisted.

pub mod cli;
pub mod config;
pub mod error;
pub mod model;
pub mod pipeline;
pub mod prompt;
pub mod request;
pub mod storage;
pub mod svg;

pub use config::{AppConfig, ConnectionConfig, ValidatorConfig};
pub use error::{ErrorKind, Result, SvgenError};
pub use model::{CortexInvoker, InvocationError, MockInvoker, ModelInvoker, ModelRegistry};
pub use pipeline::{GenerationOutcome, Pipeline};
pub use prompt::build_instruction;
pub use request::{GenerationRequest, ModelId};
pub use storage::{LocalStage, MemoryStage, StageStore, StorageError, StoredFile};
pub use svg::{
    extract_svg, AcceptedSvg, ExtractedSvg, FragmentPolicy, Rejection, SvgExtractor,
    SvgValidator, ValidationResult,
};
