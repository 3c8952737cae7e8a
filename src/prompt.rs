//! Prompt construction
//!
//! Turns a user's description into the instruction sent to the model.

use crate::request::GenerationRequest;

/// Formatting directives appended after the user's description
pub const FORMAT_DIRECTIVES: &str = "\
Return only the SVG code, starting with <svg and ending with </svg>.
The SVG must be a complete, self-contained document with an explicit viewBox attribute on the root <svg> element.
Do not reference external resources: no http or https links, no external images, fonts or stylesheets.
Do not include scripts, event handler attributes or foreignObject elements.
Do not include any explanatory text, just the SVG code.";

/// Build the model instruction for a request
pub fn build_instruction(request: &GenerationRequest) -> String {
    instruction_for(request.prompt_text())
}

/// Build the model instruction for a raw description
pub fn instruction_for(description: &str) -> String {
    format!(
        "Generate a complete, valid SVG file based on this description: {}\n\n{}",
        description, FORMAT_DIRECTIVES
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ModelsConfig;

    #[test]
    fn test_description_embedded_verbatim() {
        let description = "A \"retro\" sun with $$ rays & <stripes>";
        let instruction = instruction_for(description);
        assert!(instruction.contains(description));
    }

    #[test]
    fn test_directives_present() {
        let request = GenerationRequest::new(
            "a house with a red roof",
            "claude-4-sonnet",
            "house",
            &ModelsConfig::default(),
        )
        .unwrap();
        let instruction = build_instruction(&request);
        assert!(instruction.starts_with("Generate a complete, valid SVG"));
        assert!(instruction.contains("a house with a red roof"));
        assert!(instruction.contains("viewBox"));
        assert!(instruction.contains("external resources"));
        assert!(instruction.ends_with("just the SVG code."));
    }

    #[test]
    fn test_deterministic() {
        assert_eq!(instruction_for("same input"), instruction_for("same input"));
    }
}
