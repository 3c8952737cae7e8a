//! Generation pipeline
//!
//! build prompt -> invoke model -> extract -> validate -> store
//!
//! Each stage either yields a new value or ends the request with a typed
//! error. Nothing is written unless validation accepted the markup.

use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use crate::config::ValidatorConfig;
use crate::error::{Result, SvgenError};
use crate::model::ModelInvoker;
use crate::prompt::build_instruction;
use crate::request::{GenerationRequest, ModelId};
use crate::storage::{StageStore, StoredFile};
use crate::svg::{AcceptedSvg, ExtractedSvg, SvgExtractor, SvgValidator, ValidationResult};

/// Result of a successful generation
#[derive(Debug, Clone, Serialize)]
pub struct GenerationOutcome {
    pub request_id: Uuid,
    pub model: ModelId,
    pub object_name: String,
    pub markup: String,
    pub byte_length: usize,
    pub stored: StoredFile,
}

/// The generation pipeline and its collaborators
pub struct Pipeline {
    extractor: SvgExtractor,
    validator: SvgValidator,
    invoker: Arc<dyn ModelInvoker>,
    store: Arc<dyn StageStore>,
}

impl Pipeline {
    pub fn new(
        config: &ValidatorConfig,
        invoker: Arc<dyn ModelInvoker>,
        store: Arc<dyn StageStore>,
    ) -> Self {
        Self {
            extractor: SvgExtractor::new(config.fragment_policy),
            validator: SvgValidator::new(config),
            invoker,
            store,
        }
    }

    pub fn store(&self) -> &dyn StageStore {
        self.store.as_ref()
    }

    pub fn invoker(&self) -> &dyn ModelInvoker {
        self.invoker.as_ref()
    }

    /// Run one request end to end
    pub fn run(&self, request: &GenerationRequest) -> Result<GenerationOutcome> {
        let span = tracing::info_span!(
            "generate",
            request_id = %request.request_id(),
            model = %request.model()
        );
        let _enter = span.enter();

        let instruction = build_instruction(request);
        tracing::debug!(chars = instruction.len(), backend = self.invoker.name(), "invoking model");

        let raw = self
            .invoker
            .invoke(&instruction, request.model())
            .map_err(|e| {
                tracing::warn!(error = %e, "model invocation failed");
                SvgenError::from(e)
            })?;
        tracing::debug!(bytes = raw.len(), "model responded");

        let accepted = self.preview(&raw)?;

        let object_name = request.object_name();
        let stored = self.store.store(&object_name, &accepted).map_err(|e| {
            tracing::warn!(error = %e, stage = self.store.location(), "upload failed");
            SvgenError::from(e)
        })?;

        tracing::info!(
            object = %object_name,
            stage = self.store.location(),
            bytes = accepted.byte_length(),
            "svg stored"
        );

        Ok(GenerationOutcome {
            request_id: request.request_id(),
            model: request.model(),
            object_name,
            byte_length: accepted.byte_length(),
            markup: accepted.into_markup(),
            stored,
        })
    }

    /// Extract and validate a raw model response without storing it
    pub fn preview(&self, raw: &str) -> Result<AcceptedSvg> {
        let extracted = self.extractor.extract(raw).map_err(|e| {
            tracing::warn!(bytes = raw.len(), "no svg in model response");
            e
        })?;
        tracing::debug!(bytes = extracted.byte_length(), "extracted svg");

        self.validate(&extracted).into_result().map_err(|rejection| {
            tracing::warn!(kind = ?rejection.kind(), detail = %rejection, "svg rejected");
            SvgenError::from(rejection)
        })
    }

    /// Validate markup that is already isolated
    pub fn validate(&self, svg: &ExtractedSvg) -> ValidationResult {
        self.validator.validate(svg)
    }
}
