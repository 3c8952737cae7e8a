//! Mock model invokers for testing and offline runs
//!
//! `MockInvoker` fakes a chatty model: it draws simple shapes picked by
//! keywords in the description and wraps them in prose and a code fence,
//! the way real models tend to answer. `ScriptedInvoker` replays a fixed
//! reply for tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use super::invoker::{InvocationError, ModelInvoker};
use crate::request::ModelId;

const DESCRIPTION_MARKER: &str = "based on this description: ";

const COLORS: &[&str] = &[
    "red", "orange", "yellow", "green", "blue", "purple", "pink", "black", "white", "gray",
    "brown",
];

/// Keyword-driven fake model
#[derive(Debug, Default)]
pub struct MockInvoker;

impl MockInvoker {
    pub fn new() -> Self {
        Self
    }

    /// The SVG this mock draws for `description`
    pub fn render(description: &str) -> String {
        let lower = description.to_lowercase();
        let mut colors = COLORS.iter().filter(|c| lower.contains(*c)).copied();
        let primary = colors.next().unwrap_or("steelblue");
        let secondary = colors.next().unwrap_or("white");

        let mut body = Vec::new();
        if lower.contains("square") || lower.contains("rect") || lower.contains("background") {
            body.push(format!(
                r#"  <rect x="0" y="0" width="100" height="100" fill="{}"/>"#,
                secondary
            ));
        }
        if lower.contains("star") {
            body.push(format!(
                r#"  <polygon points="50,5 61,38 95,38 67,58 78,92 50,72 22,92 33,58 5,38 39,38" fill="{}"/>"#,
                primary
            ));
        }
        if lower.contains("circle") || body.is_empty() {
            body.push(format!(
                r#"  <circle cx="50" cy="50" r="40" fill="{}"/>"#,
                primary
            ));
        }
        if let Some(label) = quoted_text(description) {
            body.push(format!(
                r#"  <text x="50" y="55" text-anchor="middle" font-family="sans-serif" font-size="12" fill="{}">{}</text>"#,
                secondary,
                escape_text(label)
            ));
        }

        format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" viewBox=\"0 0 100 100\" width=\"100\" height=\"100\">\n{}\n</svg>",
            body.join("\n")
        )
    }
}

impl ModelInvoker for MockInvoker {
    fn name(&self) -> &str {
        "mock"
    }

    fn invoke(&self, instruction: &str, model: ModelId) -> Result<String, InvocationError> {
        let description = instruction
            .split_once(DESCRIPTION_MARKER)
            .map(|(_, rest)| rest.split("\n\n").next().unwrap_or(rest))
            .unwrap_or(instruction);

        tracing::debug!(model = %model, "mock model rendering description");

        Ok(format!(
            "Sure! Here's an SVG for your request:\n\n```svg\n{}\n```\n\nLet me know if you'd like any changes.",
            Self::render(description)
        ))
    }
}

/// Replays a fixed reply and counts calls
#[derive(Debug)]
pub struct ScriptedInvoker {
    reply: Result<String, InvocationError>,
    calls: AtomicUsize,
    last_instruction: Mutex<Option<String>>,
}

impl ScriptedInvoker {
    pub fn replying(text: impl Into<String>) -> Self {
        Self::with_result(Ok(text.into()))
    }

    pub fn failing(error: InvocationError) -> Self {
        Self::with_result(Err(error))
    }

    fn with_result(reply: Result<String, InvocationError>) -> Self {
        Self {
            reply,
            calls: AtomicUsize::new(0),
            last_instruction: Mutex::new(None),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_instruction(&self) -> Option<String> {
        self.last_instruction
            .lock()
            .ok()
            .and_then(|guard| guard.clone())
    }
}

impl ModelInvoker for ScriptedInvoker {
    fn name(&self) -> &str {
        "scripted"
    }

    fn invoke(&self, instruction: &str, _model: ModelId) -> Result<String, InvocationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.last_instruction.lock() {
            *last = Some(instruction.to_string());
        }
        self.reply.clone()
    }
}

/// Text between the first pair of single or double quotes
fn quoted_text(s: &str) -> Option<&str> {
    for quote in ['\'', '"'] {
        if let Some(start) = s.find(quote) {
            let rest = &s[start + 1..];
            if let Some(len) = rest.find(quote) {
                if len > 0 {
                    return Some(&rest[..len]);
                }
            }
        }
    }
    None
}

fn escape_text(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::instruction_for;

    #[test]
    fn test_mock_reply_is_wrapped_in_prose() {
        let reply = MockInvoker::new()
            .invoke(&instruction_for("a red circle"), ModelId::OpenAiGpt41)
            .unwrap();
        assert!(reply.starts_with("Sure!"));
        assert!(reply.contains("```svg"));
        assert!(reply.contains(r#"fill="red""#));
    }

    #[test]
    fn test_mock_uses_only_description() {
        // No fallback circle when another shape was asked for
        let svg = MockInvoker::render("a yellow star");
        assert!(svg.contains("<polygon"));
        assert!(!svg.contains("<circle"));
    }

    #[test]
    fn test_mock_text_label_is_escaped() {
        let svg = MockInvoker::render("a blue circle with the text 'R&D <lab>'");
        assert!(svg.contains("R&amp;D &lt;lab&gt;"));
    }

    #[test]
    fn test_scripted_counts_calls() {
        let invoker = ScriptedInvoker::replying("hello");
        assert_eq!(invoker.calls(), 0);
        assert_eq!(invoker.invoke("x", ModelId::Claude4Sonnet).unwrap(), "hello");
        assert_eq!(invoker.calls(), 1);
        assert_eq!(invoker.last_instruction().as_deref(), Some("x"));
    }
}
