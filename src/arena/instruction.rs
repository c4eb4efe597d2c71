use crate::{arena::models::SupportedModel, model::structures::category::Category};

pub const DEFAULT_SUMMARIZE_INSTRUCTION: &str = "Summarize the following text, maintaining the language of the text.";
pub const DEFAULT_TRANSLATE_INSTRUCTION: &str = "Translate the following text from {source_lang} to {target_lang}.";

/// System instruction sent to `model` for a task. A model's own instruction
/// overrides the default. `{source_lang}` and `{target_lang}` are filled in
/// for translations.
pub fn instruction_for(
    model: &SupportedModel,
    category: Category,
    source_language: &str,
    target_language: &str
) -> String {
    match category {
        Category::Summarization => model
            .config
            .summarize_instruction
            .clone()
            .unwrap_or_else(|| DEFAULT_SUMMARIZE_INSTRUCTION.to_string()),
        Category::Translation => model
            .config
            .translate_instruction
            .as_deref()
            .unwrap_or(DEFAULT_TRANSLATE_INSTRUCTION)
            .replace("{source_lang}", source_language)
            .replace("{target_lang}", target_language)
    }
}
