use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tera::{Context, Error as TeraError, Tera};

use crate::models::tool::Tool;

/// Always the first paragraph of the system instruction, whichever template renders the rest
pub const PLAN_INSTRUCTION: &str = concat!(
    "Explain your plan before acting. When a tool would help, describe what you are going ",
    "to do and why, then propose the tool call. Nothing runs until the user confirms."
);

const SYSTEM_TEMPLATE: &str = include_str!("prompts/system.md");

pub fn load_prompt<T: Serialize>(template: &str, context_data: &T) -> Result<String, TeraError> {
    let mut tera = Tera::default();
    tera.add_raw_template("inline_template", template)?;
    let context = Context::from_serialize(context_data)?;
    let rendered = tera.render("inline_template", &context)?;
    Ok(rendered)
}

pub fn load_prompt_file<T: Serialize>(
    template_file: impl AsRef<Path>,
    context_data: &T,
) -> Result<String, TeraError> {
    let template_content = fs::read_to_string(template_file.as_ref())
        .map_err(|e| TeraError::chain("Failed to read template file", e))?;
    load_prompt(&template_content, context_data)
}

/// Render the system instruction that seeds every run. A custom template file can
/// replace the built-in body; it is rendered with the same `tools` context and
/// always follows [`PLAN_INSTRUCTION`].
pub fn system_prompt(tools: &[Tool], template_file: Option<&Path>) -> Result<String, TeraError> {
    let mut context = HashMap::new();
    context.insert("tools", tools);
    let body = match template_file {
        Some(path) => load_prompt_file(path, &context)?,
        None => load_prompt(SYSTEM_TEMPLATE, &context)?,
    };
    Ok(format!("{}\n\n{}", PLAN_INSTRUCTION, body))
}
