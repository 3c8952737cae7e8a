//! SVG validation
//!
//! Checks run in a fixed order and the first failure wins:
//! 1. size bound
//! 2. root element shape
//! 3. `viewBox` on the root element
//! 4. denylisted constructs (scripts, markup hidden in comments, event
//!    handlers, `javascript:` URIs, external references)
//! 5. element allowlist (strict mode only)
//!
//! The order is part of the contract. Inputs with several problems are
//! always reported by the earliest failing check.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::extract::ExtractedSvg;
use super::scan::{self, Node, OpaqueKind};
use crate::config::ValidatorConfig;
use crate::error::ErrorKind;

/// Default maximum accepted markup size (1 MiB)
pub const DEFAULT_MAX_BYTES: usize = 1024 * 1024;

/// Elements permitted in strict mode
pub const ALLOWED_ELEMENTS: &[&str] = &[
    "svg",
    "g",
    "path",
    "rect",
    "circle",
    "ellipse",
    "line",
    "polyline",
    "polygon",
    "text",
    "defs",
    "style",
    "tspan",
    "linearGradient",
    "radialGradient",
    "stop",
];

/// Denylisted constructs
pub mod denylist {
    use super::*;

    pub(super) static SCRIPT_TAG: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"(?i)<\s*script").expect("static regex"));

    pub(super) static FOREIGN_OBJECT_TAG: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"(?i)<\s*foreignobject").expect("static regex"));

    pub(super) static JAVASCRIPT_URI: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"(?i)javascript\s*:").expect("static regex"));

    /// Element local names that run code or embed foreign documents
    pub const ELEMENTS: &[&str] = &["script", "foreignObject"];

    /// Attribute local name resolved as a resource reference (`href`,
    /// `xlink:href`)
    pub const REFERENCE_ATTRIBUTE: &str = "href";

    /// Reference prefixes that leave the document
    pub const EXTERNAL_PREFIXES: &[&str] = &["http://", "https://", "//"];
}

/// Why a fragment was refused
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Rejection {
    #[error("markup is {byte_length} bytes (limit {max_bytes})")]
    TooLarge { byte_length: usize, max_bytes: usize },

    #[error("malformed root element: {reason}")]
    MalformedRoot { reason: String },

    #[error("root element has no viewBox: {root_tag}")]
    MissingViewBox { root_tag: String },

    #[error("unsafe content: {construct}")]
    UnsafeContent { construct: String },

    #[error("element not allowed: <{element}>")]
    DisallowedElement { element: String },
}

impl Rejection {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Rejection::TooLarge { .. } => ErrorKind::TooLarge,
            Rejection::MalformedRoot { .. } => ErrorKind::MalformedRoot,
            Rejection::MissingViewBox { .. } => ErrorKind::MissingViewBox,
            Rejection::UnsafeContent { .. } => ErrorKind::UnsafeContent,
            Rejection::DisallowedElement { .. } => ErrorKind::DisallowedElement,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Rejection::TooLarge { .. } => "TOO_LARGE",
            Rejection::MalformedRoot { .. } => "MALFORMED_ROOT",
            Rejection::MissingViewBox { .. } => "MISSING_VIEWBOX",
            Rejection::UnsafeContent { .. } => "UNSAFE_CONTENT",
            Rejection::DisallowedElement { .. } => "DISALLOWED_ELEMENT",
        }
    }

    /// Plain-language description for end users
    pub fn describe(&self) -> String {
        match self {
            Rejection::TooLarge {
                byte_length,
                max_bytes,
            } => format!(
                "it is too large ({} bytes, the limit is {})",
                byte_length, max_bytes
            ),
            Rejection::MalformedRoot { .. } => {
                "it is not a single complete <svg> document".to_string()
            }
            Rejection::MissingViewBox { .. } => "it has no viewBox, so it would not scale".to_string(),
            Rejection::UnsafeContent { construct } => {
                format!("it contains unsafe content ({})", construct)
            }
            Rejection::DisallowedElement { element } => {
                format!("it uses the unsupported element <{}>", element)
            }
        }
    }
}

/// Markup that passed every validation check.
///
/// Only the validator can build one, so anything holding an `AcceptedSvg`
/// has been validated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AcceptedSvg {
    markup: String,
}

impl AcceptedSvg {
    pub fn markup(&self) -> &str {
        &self.markup
    }

    pub fn byte_length(&self) -> usize {
        self.markup.len()
    }

    pub fn into_markup(self) -> String {
        self.markup
    }
}

/// Outcome of validating one fragment
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationResult {
    Accepted(AcceptedSvg),
    Rejected(Rejection),
}

impl ValidationResult {
    pub fn is_accepted(&self) -> bool {
        matches!(self, ValidationResult::Accepted(_))
    }

    pub fn accepted(&self) -> Option<&AcceptedSvg> {
        match self {
            ValidationResult::Accepted(svg) => Some(svg),
            ValidationResult::Rejected(_) => None,
        }
    }

    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            ValidationResult::Accepted(_) => None,
            ValidationResult::Rejected(r) => Some(r),
        }
    }

    pub fn into_result(self) -> Result<AcceptedSvg, Rejection> {
        match self {
            ValidationResult::Accepted(svg) => Ok(svg),
            ValidationResult::Rejected(r) => Err(r),
        }
    }
}

/// Structural and safety validator for extracted SVG
#[derive(Debug, Clone)]
pub struct SvgValidator {
    max_bytes: usize,
    strict_elements: bool,
}

impl SvgValidator {
    pub fn new(config: &ValidatorConfig) -> Self {
        Self::with_limits(config.max_bytes, config.strict_elements)
    }

    pub fn with_limits(max_bytes: usize, strict_elements: bool) -> Self {
        Self {
            max_bytes,
            strict_elements,
        }
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    pub fn is_strict(&self) -> bool {
        self.strict_elements
    }

    /// Run all checks in order
    pub fn validate(&self, svg: &ExtractedSvg) -> ValidationResult {
        let outcome = self
            .check_size(svg)
            .and_then(|_| self.check_root(svg.markup()))
            .and_then(|_| self.check_view_box(svg.markup()))
            .and_then(|_| self.check_safety(svg.markup()))
            .and_then(|_| self.check_elements(svg.markup()));

        match outcome {
            Ok(()) => ValidationResult::Accepted(AcceptedSvg {
                markup: svg.markup().to_string(),
            }),
            Err(rejection) => ValidationResult::Rejected(rejection),
        }
    }

    /// Check 1: byte length within the configured bound
    pub fn check_size(&self, svg: &ExtractedSvg) -> Result<(), Rejection> {
        if svg.byte_length() > self.max_bytes {
            return Err(Rejection::TooLarge {
                byte_length: svg.byte_length(),
                max_bytes: self.max_bytes,
            });
        }
        Ok(())
    }

    /// Check 2: starts with an `<svg` element and ends with `</svg>`
    pub fn check_root(&self, markup: &str) -> Result<(), Rejection> {
        let head = markup.trim_start();
        let opens_root = head
            .strip_prefix("<svg")
            .and_then(|rest| rest.chars().next())
            .map_or(false, |c| c.is_ascii_whitespace() || c == '>' || c == '/');
        if !opens_root {
            return Err(Rejection::MalformedRoot {
                reason: format!("does not start with <svg: {}", snippet(head)),
            });
        }

        if !markup.trim_end().ends_with("</svg>") {
            return Err(Rejection::MalformedRoot {
                reason: "does not end with </svg>".to_string(),
            });
        }

        Ok(())
    }

    /// Check 3: the root start tag declares a non-empty `viewBox`
    pub fn check_view_box(&self, markup: &str) -> Result<(), Rejection> {
        let root = scan::first_element(markup.trim_start()).ok().flatten();
        let has_view_box = root
            .as_ref()
            .and_then(|element| element.attribute("viewBox"))
            .map_or(false, |attr| !attr.value.trim().is_empty());

        if !has_view_box {
            return Err(Rejection::MissingViewBox {
                root_tag: root_tag_text(markup),
            });
        }
        Ok(())
    }

    /// Check 4: none of the denylisted constructs appear
    pub fn check_safety(&self, markup: &str) -> Result<(), Rejection> {
        for pattern in [&*denylist::SCRIPT_TAG, &*denylist::FOREIGN_OBJECT_TAG] {
            if let Some(m) = pattern.find(markup) {
                return Err(unsafe_content(m.as_str()));
            }
        }

        let nodes = scan_all(markup)?;
        let elements = || {
            nodes.iter().filter_map(|node| match node {
                Node::Element(element) => Some(element),
                Node::Opaque { .. } => None,
            })
        };

        // Prefixed forms such as <s:script> slip past the text patterns
        for element in elements() {
            let dangerous = denylist::ELEMENTS
                .iter()
                .any(|name| element.local_name.eq_ignore_ascii_case(name));
            if dangerous {
                return Err(unsafe_content(format!("<{}>", element.name)));
            }
        }

        for node in &nodes {
            if let Node::Opaque { kind, raw, .. } = node {
                if hides_markup(*kind, raw) {
                    return Err(unsafe_content(format!("markup inside {}", snippet(raw))));
                }
            }
        }

        for element in elements() {
            for attr in &element.attributes {
                if is_event_handler(&attr.name) || is_event_handler(&attr.local_name) {
                    return Err(unsafe_content(format!("{}=", attr.name)));
                }
            }
        }

        if let Some(m) = denylist::JAVASCRIPT_URI.find(markup) {
            return Err(unsafe_content(m.as_str()));
        }
        for element in elements() {
            for attr in &element.attributes {
                if normalize_url(&attr.value).contains("javascript:") {
                    return Err(unsafe_content(format!(
                        "{}=\"{}\"",
                        attr.name,
                        snippet(&attr.value)
                    )));
                }
            }
        }

        for element in elements() {
            for attr in &element.attributes {
                if !attr
                    .local_name
                    .eq_ignore_ascii_case(denylist::REFERENCE_ATTRIBUTE)
                {
                    continue;
                }
                let url = normalize_url(&attr.value);
                if denylist::EXTERNAL_PREFIXES
                    .iter()
                    .any(|prefix| url.starts_with(prefix))
                {
                    return Err(unsafe_content(format!(
                        "{}=\"{}\"",
                        attr.name,
                        snippet(&attr.value)
                    )));
                }
            }
        }

        Ok(())
    }

    /// Check 5: every element is allowlisted (no-op unless strict)
    pub fn check_elements(&self, markup: &str) -> Result<(), Rejection> {
        if !self.strict_elements {
            return Ok(());
        }

        for node in scan_all(markup)? {
            if let Node::Element(element) = node {
                if !ALLOWED_ELEMENTS.contains(&element.name.as_str()) {
                    return Err(Rejection::DisallowedElement {
                        element: element.name,
                    });
                }
            }
        }
        Ok(())
    }
}

impl Default for SvgValidator {
    fn default() -> Self {
        Self::with_limits(DEFAULT_MAX_BYTES, true)
    }
}

fn unsafe_content(construct: impl Into<String>) -> Rejection {
    Rejection::UnsafeContent {
        construct: construct.into(),
    }
}

/// Every node, or a rejection if the reader cannot tokenize the markup
fn scan_all(markup: &str) -> Result<Vec<Node<'_>>, Rejection> {
    scan::nodes(markup)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| unsafe_content(format!("unreadable markup at byte {}: {}", e.offset, e.reason)))
}

/// Whether an HTML parser could end this construct early and read the rest
/// as live markup (`--!>` closes a comment, `<?...>` ends at the first `>`)
fn hides_markup(kind: OpaqueKind, raw: &str) -> bool {
    let inner = raw.get(1..raw.len().saturating_sub(1)).unwrap_or("");
    match kind {
        OpaqueKind::CData => inner.contains('<'),
        OpaqueKind::Comment | OpaqueKind::Instruction | OpaqueKind::DocType => {
            inner.contains(['<', '>'])
        }
    }
}

/// Lowercased URL with whitespace and control characters removed, as URL
/// parsers ignore tabs and newlines inside a scheme
fn normalize_url(value: &str) -> String {
    value
        .chars()
        .filter(|c| !c.is_ascii_whitespace() && !c.is_ascii_control())
        .collect::<String>()
        .to_ascii_lowercase()
}

/// The root start tag as written, for diagnostics
fn root_tag_text(markup: &str) -> String {
    let head = markup.trim_start();
    let end = head.find('>').map_or(head.len(), |i| i + 1);
    snippet(&head[..end])
}

fn is_event_handler(name: &str) -> bool {
    name.len() > 2 && name.get(..2).map_or(false, |p| p.eq_ignore_ascii_case("on"))
}

/// First 60 characters, for diagnostics
fn snippet(s: &str) -> String {
    const MAX_CHARS: usize = 60;
    match s.char_indices().nth(MAX_CHARS) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}
