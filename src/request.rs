//! Generation requests
//!
//! A request is validated once, when it is built from user input, and is
//! immutable afterwards.

use std::fmt;

use chrono::{DateTime, Local};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::ModelsConfig;
use crate::error::{Result, SvgenError};

/// Shortest accepted description, in characters
pub const MIN_PROMPT_CHARS: usize = 10;

/// Longest accepted description, in characters
pub const MAX_PROMPT_CHARS: usize = 1000;

static FILENAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]{1,128}$").expect("static regex"));

/// Hosted models that can generate SVG
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelId {
    #[serde(rename = "openai-gpt-4.1")]
    OpenAiGpt41,
    #[serde(rename = "claude-4-sonnet")]
    Claude4Sonnet,
    #[serde(rename = "claude-3-7-sonnet")]
    Claude37Sonnet,
    #[serde(rename = "claude-3-5-sonnet")]
    Claude35Sonnet,
}

impl ModelId {
    pub const ALL: [ModelId; 4] = [
        ModelId::OpenAiGpt41,
        ModelId::Claude4Sonnet,
        ModelId::Claude37Sonnet,
        ModelId::Claude35Sonnet,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAiGpt41 => "openai-gpt-4.1",
            Self::Claude4Sonnet => "claude-4-sonnet",
            Self::Claude37Sonnet => "claude-3-7-sonnet",
            Self::Claude35Sonnet => "claude-3-5-sonnet",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim().to_lowercase();
        Self::ALL.into_iter().find(|m| m.as_str() == s)
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::OpenAiGpt41 => "OpenAI flagship GPT model, version 4.1",
            Self::Claude4Sonnet => "Anthropic flagship model, version 4",
            Self::Claude37Sonnet => "Anthropic Sonnet model, version 3.7",
            Self::Claude35Sonnet => "Anthropic Sonnet model, version 3.5",
        }
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One user submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationRequest {
    request_id: Uuid,
    prompt_text: String,
    model: ModelId,
    target_filename: String,
}

impl GenerationRequest {
    /// Validate user input and build a request.
    ///
    /// `target_filename` may carry a trailing `.svg`, which is dropped.
    pub fn new(
        prompt_text: &str,
        model: &str,
        target_filename: &str,
        models: &ModelsConfig,
    ) -> Result<Self> {
        let prompt_text = prompt_text.trim();
        let chars = prompt_text.chars().count();
        if chars < MIN_PROMPT_CHARS {
            return Err(SvgenError::InvalidRequest {
                field: "prompt",
                reason: format!(
                    "description must be at least {} characters (got {})",
                    MIN_PROMPT_CHARS, chars
                ),
            });
        }
        if chars > MAX_PROMPT_CHARS {
            return Err(SvgenError::InvalidRequest {
                field: "prompt",
                reason: format!(
                    "description must be at most {} characters (got {})",
                    MAX_PROMPT_CHARS, chars
                ),
            });
        }

        let model = ModelId::parse(model).ok_or_else(|| SvgenError::UnknownModel {
            model: model.to_string(),
        })?;
        if !models.is_allowed(model) {
            return Err(SvgenError::ModelNotAllowed {
                model: model.to_string(),
            });
        }

        let target_filename = normalize_filename(target_filename)?;

        Ok(Self {
            request_id: Uuid::new_v4(),
            prompt_text: prompt_text.to_string(),
            model,
            target_filename,
        })
    }

    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    pub fn prompt_text(&self) -> &str {
        &self.prompt_text
    }

    pub fn model(&self) -> ModelId {
        self.model
    }

    pub fn target_filename(&self) -> &str {
        &self.target_filename
    }

    /// Name of the file written to the stage
    pub fn object_name(&self) -> String {
        format!("{}.svg", self.target_filename)
    }
}

/// Check a user-supplied filename, dropping an optional `.svg` suffix
pub fn normalize_filename(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    let stem = trimmed
        .strip_suffix(".svg")
        .or_else(|| trimmed.strip_suffix(".SVG"))
        .unwrap_or(trimmed);

    if !FILENAME.is_match(stem) {
        return Err(SvgenError::InvalidRequest {
            field: "filename",
            reason: format!(
                "'{}' must be 1-128 letters, digits, '-' or '_' (without extension)",
                raw
            ),
        });
    }
    Ok(stem.to_string())
}

/// Suggested filename for a submission made at `now`
pub fn default_filename(now: DateTime<Local>) -> String {
    format!("generated_svg_{}", now.format("%Y%m%d_%H%M%S"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn models() -> ModelsConfig {
        ModelsConfig::default()
    }

    #[test]
    fn test_model_round_trip_names() {
        for model in ModelId::ALL {
            assert_eq!(ModelId::parse(model.as_str()), Some(model));
        }
        assert_eq!(ModelId::parse(" Claude-4-Sonnet "), Some(ModelId::Claude4Sonnet));
        assert_eq!(ModelId::parse("snowflake-arctic"), None);
    }

    #[test]
    fn test_model_serde_names() {
        let json = serde_json::to_string(&ModelId::Claude37Sonnet).unwrap();
        assert_eq!(json, "\"claude-3-7-sonnet\"");
    }

    #[test]
    fn test_valid_request() {
        let req = GenerationRequest::new(
            "  a blue circle with white text  ",
            "claude-3-5-sonnet",
            "logo.svg",
            &models(),
        )
        .unwrap();
        assert_eq!(req.prompt_text(), "a blue circle with white text");
        assert_eq!(req.model(), ModelId::Claude35Sonnet);
        assert_eq!(req.target_filename(), "logo");
        assert_eq!(req.object_name(), "logo.svg");
    }

    #[test]
    fn test_prompt_length_bounds() {
        let short = GenerationRequest::new("too short", "openai-gpt-4.1", "a", &models());
        assert!(matches!(short, Err(SvgenError::InvalidRequest { field: "prompt", .. })));

        let exact = "x".repeat(MIN_PROMPT_CHARS);
        assert!(GenerationRequest::new(&exact, "openai-gpt-4.1", "a", &models()).is_ok());

        let max = "é".repeat(MAX_PROMPT_CHARS);
        assert!(GenerationRequest::new(&max, "openai-gpt-4.1", "a", &models()).is_ok());

        let long = "x".repeat(MAX_PROMPT_CHARS + 1);
        assert!(GenerationRequest::new(&long, "openai-gpt-4.1", "a", &models()).is_err());
    }

    #[test]
    fn test_model_checks() {
        let unknown = GenerationRequest::new("a red square please", "gpt-2", "a", &models());
        assert!(matches!(unknown, Err(SvgenError::UnknownModel { .. })));

        let restricted = ModelsConfig {
            allowed: vec![ModelId::Claude4Sonnet],
            default: ModelId::Claude4Sonnet,
        };
        let disallowed =
            GenerationRequest::new("a red square please", "openai-gpt-4.1", "a", &restricted);
        assert!(matches!(disallowed, Err(SvgenError::ModelNotAllowed { .. })));
    }

    #[test]
    fn test_filename_rules() {
        assert!(normalize_filename("my_logo-2").is_ok());
        for bad in ["", "../etc/passwd", "a b", "logo.png", "x.svg.svg", "@stage"] {
            assert!(normalize_filename(bad).is_err(), "{bad:?} should be rejected");
        }
        assert!(normalize_filename(&"a".repeat(129)).is_err());
    }

    #[test]
    fn test_default_filename_format() {
        let now = Local.with_ymd_and_hms(2025, 3, 9, 14, 5, 7).unwrap();
        assert_eq!(default_filename(now), "generated_svg_20250309_140507");
    }

    #[test]
    fn test_requests_get_distinct_ids() {
        let a = GenerationRequest::new("a red square please", "openai-gpt-4.1", "a", &models()).unwrap();
        let b = GenerationRequest::new("a red square please", "openai-gpt-4.1", "a", &models()).unwrap();
        assert_ne!(a.request_id(), b.request_id());
    }
}
