//! SVG extraction from raw model responses
//!
//! Models wrap their markup in explanations, markdown fences and apologies.
//! The extractor isolates the `<svg>...</svg>` span and nothing else.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SvgenError};

const OPEN_TAG: &str = "<svg";
const CLOSE_TAG: &str = "</svg>";
const FENCE: &str = "```";

/// How to choose a span when a response holds more than one top-level
/// `<svg>` fragment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FragmentPolicy {
    /// First opening tag through last closing tag. Nested `<svg>` inside
    /// `<defs>`/`<symbol>` stays intact; sibling fragments get merged.
    #[default]
    Outermost,
    /// The first balanced top-level fragment. Falls back to `Outermost`
    /// when the tags never balance.
    First,
}

/// SVG markup isolated from a model response, not yet validated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedSvg {
    markup: String,
    byte_length: usize,
}

impl ExtractedSvg {
    pub fn new(markup: impl Into<String>) -> Self {
        let markup = markup.into();
        let byte_length = markup.len();
        Self {
            markup,
            byte_length,
        }
    }

    pub fn markup(&self) -> &str {
        &self.markup
    }

    pub fn byte_length(&self) -> usize {
        self.byte_length
    }

    pub fn into_markup(self) -> String {
        self.markup
    }
}

/// Locates SVG markup inside arbitrary text
#[derive(Debug, Clone, Copy, Default)]
pub struct SvgExtractor {
    policy: FragmentPolicy,
}

impl SvgExtractor {
    pub fn new(policy: FragmentPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> FragmentPolicy {
        self.policy
    }

    /// Extract the SVG span from `text`.
    ///
    /// A response wrapped entirely in a code fence is unwrapped before the
    /// first attempt. If no tag pair is found, fence markers are stripped
    /// from the whole text and the search runs exactly once more.
    pub fn extract(&self, text: &str) -> Result<ExtractedSvg> {
        let trimmed = text.trim();

        let first_attempt = if is_fenced(trimmed) {
            self.locate(unwrap_fence(trimmed))
        } else {
            self.locate(text)
        };

        if let Some(markup) = first_attempt {
            return Ok(ExtractedSvg::new(markup));
        }

        let stripped = text.replace(FENCE, "");
        self.locate(&stripped)
            .map(ExtractedSvg::new)
            .ok_or(SvgenError::NoSvgFound)
    }

    fn locate<'a>(&self, text: &'a str) -> Option<&'a str> {
        // ASCII lowercasing keeps byte offsets aligned with `text`
        let lower = text.to_ascii_lowercase();
        let open = lower.find(OPEN_TAG)?;
        let close = lower.rfind(CLOSE_TAG)?;
        if open >= close {
            return None;
        }
        let outer_end = close + CLOSE_TAG.len();

        let end = match self.policy {
            FragmentPolicy::Outermost => outer_end,
            FragmentPolicy::First => first_balanced_end(&lower, open).unwrap_or(outer_end),
        };

        Some(&text[open..end])
    }
}

/// Extract with the default policy
pub fn extract_svg(text: &str) -> Result<ExtractedSvg> {
    SvgExtractor::default().extract(text)
}

/// End offset of the fragment whose opening tag sits at `open`, counting
/// nested `<svg>` elements. `lower` must already be ASCII-lowercased.
fn first_balanced_end(lower: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut pos = open;

    loop {
        let next_open = lower[pos..].find(OPEN_TAG).map(|i| pos + i);
        let next_close = lower[pos..].find(CLOSE_TAG).map(|i| pos + i);

        match (next_open, next_close) {
            (Some(o), Some(c)) if o < c => {
                let tag_end = lower[o..].find('>').map(|i| o + i)?;
                if !lower[..tag_end].ends_with('/') {
                    depth += 1;
                }
                pos = tag_end + 1;
            }
            (Some(o), None) => {
                let tag_end = lower[o..].find('>').map(|i| o + i)?;
                if !lower[..tag_end].ends_with('/') {
                    depth += 1;
                }
                pos = tag_end + 1;
            }
            (_, Some(c)) => {
                depth = depth.checked_sub(1)?;
                pos = c + CLOSE_TAG.len();
                if depth == 0 {
                    return Some(pos);
                }
            }
            (None, None) => return None,
        }
    }
}

fn is_fenced(trimmed: &str) -> bool {
    trimmed.len() >= 2 * FENCE.len() && trimmed.starts_with(FENCE) && trimmed.ends_with(FENCE)
}

/// Strip the fence markers. The first line is dropped only when it is a
/// bare language tag (```` ```svg ````), so markup that starts on the fence
/// line is kept whole.
fn unwrap_fence(trimmed: &str) -> &str {
    let inner = &trimmed[FENCE.len()..trimmed.len() - FENCE.len()];
    match inner.split_once('\n') {
        Some((first_line, rest)) if is_language_tag(first_line.trim()) => rest,
        _ => inner,
    }
}

/// Empty or a single word such as `svg`, `xml` or `image/svg+xml`
fn is_language_tag(line: &str) -> bool {
    line.chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '+' | '-' | '.' | '/'))
}
