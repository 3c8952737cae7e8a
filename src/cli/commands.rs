//! CLI Command Implementations
//!
//! Implements the actual logic for each CLI command.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use chrono::Local;
use log::{info, warn};
use serde::Serialize;

use crate::config::{AppConfig, ConnectionConfig};
use crate::error::{Result, SvgenError};
use crate::model::{CortexInvoker, MockInvoker, ModelInvoker, ModelRegistry};
use crate::pipeline::Pipeline;
use crate::prompt::instruction_for;
use crate::request::{default_filename, GenerationRequest};
use crate::storage::{retrieval_instructions, LocalStage, StageStore};
use crate::svg::{ExtractedSvg, SvgExtractor, SvgValidator, ValidationResult};

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn read_input(path: &Path) -> Result<String> {
    info!("Reading: {}", path.display());
    Ok(fs::read_to_string(path)?)
}

/// Generate an SVG from a description and store it in the stage.
pub fn generate(
    config: &AppConfig,
    prompt: &str,
    model: Option<&str>,
    filename: Option<&str>,
    mock: bool,
    json: bool,
) -> Result<()> {
    let model = model.unwrap_or(config.models.default.as_str());
    let filename = filename
        .map(str::to_string)
        .unwrap_or_else(|| default_filename(Local::now()));
    let request = GenerationRequest::new(prompt, model, &filename, &config.models)?;

    info!(
        "Generating {} with {} (request {})",
        request.object_name(),
        request.model(),
        request.request_id()
    );

    let invoker: Arc<dyn ModelInvoker> = if mock {
        Arc::new(MockInvoker::new())
    } else {
        let connection = ConnectionConfig::from_env()?;
        Arc::new(CortexInvoker::new(&connection, &config.cortex))
    };
    if !invoker.is_available() {
        warn!("Model backend '{}' reports itself unavailable", invoker.name());
    }

    let store = Arc::new(LocalStage::new(&config.stage));
    let pipeline = Pipeline::new(&config.validator, invoker, store);
    let outcome = pipeline.run(&request)?;

    if json {
        return print_json(&outcome);
    }

    println!("=== SVG Generated ===");
    println!("Model: {}", outcome.model);
    println!("Stored: @{}/{}", outcome.stored.stage, outcome.object_name);
    println!("Size: {} bytes", outcome.byte_length);
    println!("SHA-256: {}", outcome.stored.sha256);
    println!();
    println!("{}", outcome.markup);
    println!();
    println!("To retrieve this file:");
    println!(
        "{}",
        retrieval_instructions(&outcome.stored.stage, &outcome.object_name)
    );

    Ok(())
}

/// Extract and validate SVG from a saved raw model response.
pub fn extract(config: &AppConfig, path: &Path, json: bool) -> Result<()> {
    let raw = read_input(path)?;

    let extracted = SvgExtractor::new(config.validator.fragment_policy).extract(&raw)?;
    info!("Extracted {} bytes of SVG", extracted.byte_length());

    let accepted = SvgValidator::new(&config.validator)
        .validate(&extracted)
        .into_result()?;

    if json {
        return print_json(&accepted);
    }
    println!("{}", accepted.markup());
    Ok(())
}

/// Validate an SVG file without extraction.
pub fn validate(config: &AppConfig, path: &Path, json: bool) -> Result<()> {
    let markup = read_input(path)?;
    let svg = ExtractedSvg::new(markup);
    let result = SvgValidator::new(&config.validator).validate(&svg);

    if json {
        print_json(&serde_json::json!({
            "path": path.display().to_string(),
            "byte_length": svg.byte_length(),
            "accepted": result.is_accepted(),
            "rejection": result.rejection(),
        }))?;
    }

    match result {
        ValidationResult::Accepted(accepted) => {
            if !json {
                println!("OK: {} ({} bytes)", path.display(), accepted.byte_length());
            }
            Ok(())
        }
        ValidationResult::Rejected(rejection) => {
            warn!("{} rejected: {}", path.display(), rejection);
            Err(SvgenError::Rejected(rejection))
        }
    }
}

/// List the files in the configured stage.
pub fn list(config: &AppConfig, json: bool) -> Result<()> {
    let stage = LocalStage::new(&config.stage);
    info!("Listing stage: {}", stage.location());

    let files = stage.list()?;
    if json {
        return print_json(&files);
    }

    if files.is_empty() {
        println!("Stage @{} is empty.", stage.location());
        return Ok(());
    }

    println!("Stage @{}:", stage.location());
    println!("{:-<60}", "");
    for file in &files {
        println!(
            "{:<36} {:>8} B  {}",
            file.name,
            file.size_bytes,
            file.last_modified.format("%Y-%m-%d %H:%M:%S")
        );
    }
    println!("{:-<60}", "");
    println!("{} file(s)", files.len());

    Ok(())
}

/// Show the models users can pick from.
pub fn models(config: &AppConfig, json: bool) -> Result<()> {
    let registry = ModelRegistry::with_defaults();
    let models = registry.list_allowed(&config.models);

    if json {
        return print_json(&models);
    }

    println!("Available models:");
    for info in models {
        let marker = if info.id == config.models.default {
            " (default)"
        } else {
            ""
        };
        println!("  {}{} - {}", info.id, marker, info.name);
        println!("      {}", info.description);
        for note in &info.notes {
            println!("      {}", note);
        }
    }

    Ok(())
}

/// Print the instruction the model would receive.
pub fn show_prompt(prompt: &str) -> Result<()> {
    let prompt = prompt.trim();
    if prompt.is_empty() {
        return Err(SvgenError::InvalidRequest {
            field: "prompt",
            reason: "description is empty".to_string(),
        });
    }
    println!("{}", instruction_for(prompt));
    Ok(())
}
