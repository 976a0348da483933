//! Prompt templates built from the note store

use crate::notes::NoteStore;
use crate::protocol::{Content, GetPromptResult, MCPError, PromptArgument, PromptDefinition, PromptMessage};
use std::collections::HashMap;

/// Name of the note summary prompt
pub const SUMMARIZE_NOTES: &str = "summarize-notes";

/// Prompts offered by prompts/list
pub fn definitions() -> Vec<PromptDefinition> {
    vec![PromptDefinition {
        name: SUMMARIZE_NOTES.to_string(),
        description: "Creates a summary of all notes".to_string(),
        arguments: vec![PromptArgument {
            name: "style".to_string(),
            description: "Style of the summary (brief/detailed)".to_string(),
            required: false,
        }],
    }]
}

/// Render a prompt by name
pub fn render(
    name: &str,
    arguments: Option<&HashMap<String, String>>,
    notes: &NoteStore,
) -> Result<GetPromptResult, MCPError> {
    if name != SUMMARIZE_NOTES {
        return Err(MCPError::invalid_params(format!("Unknown prompt: {}", name)));
    }

    let style = arguments
        .and_then(|args| args.get("style"))
        .map(String::as_str)
        .unwrap_or("brief");
    let detail = if style == "detailed" {
        " Give extensive details."
    } else {
        ""
    };

    let listing = notes
        .list()
        .into_iter()
        .map(|(name, content)| format!("- {}: {}", name, content))
        .collect::<Vec<_>>()
        .join("\n");

    Ok(GetPromptResult {
        description: "Summarize the current notes".to_string(),
        messages: vec![PromptMessage {
            role: "user".to_string(),
            content: Content::text(format!(
                "Here are the current notes to summarize:{}\n\n{}",
                detail, listing
            )),
        }],
    })
}
