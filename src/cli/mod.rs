//! CLI Module
//!
//! Command-line interface for the svgen generation pipeline.

pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Svgen - generate validated SVG files from text descriptions
#[derive(Parser, Debug)]
#[command(name = "svgen")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file (JSON)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate an SVG from a description and store it
    #[command(name = "generate")]
    Generate {
        /// What the image should show
        #[arg(short, long)]
        prompt: String,

        /// Model to use (see `svgen models`)
        #[arg(short, long)]
        model: Option<String>,

        /// Target filename, without the .svg suffix
        #[arg(short, long)]
        filename: Option<String>,

        /// Use the offline mock model
        #[arg(long)]
        mock: bool,
    },

    /// Extract and validate SVG from a saved model response
    #[command(name = "extract")]
    Extract {
        /// File holding the raw response text
        path: PathBuf,
    },

    /// Validate an SVG file
    #[command(name = "validate")]
    Validate {
        /// Path to the SVG file
        path: PathBuf,
    },

    /// List files in the stage
    #[command(name = "list")]
    List,

    /// Show supported models
    #[command(name = "models")]
    Models,

    /// Print the instruction sent to the model
    #[command(name = "prompt")]
    Prompt {
        /// What the image should show
        #[arg(short, long)]
        prompt: String,
    },
}
