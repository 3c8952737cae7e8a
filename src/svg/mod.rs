//! SVG content handling
//!
//! This module provides:
//! - Extraction of SVG markup from raw model responses
//! - Structural and safety validation of extracted markup
//! - A forgiving tag scanner shared by both

mod extract;
pub mod scan;
mod validate;

pub use extract::{extract_svg, ExtractedSvg, FragmentPolicy, SvgExtractor};
pub use validate::{
    denylist, AcceptedSvg, Rejection, SvgValidator, ValidationResult, ALLOWED_ELEMENTS,
    DEFAULT_MAX_BYTES,
};
