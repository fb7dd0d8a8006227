pub const KNOWLEDGE_BEGIN: &str = "=== KNOWLEDGE BASE ===";
pub const KNOWLEDGE_END: &str = "=== END KNOWLEDGE BASE ===";
pub const KNOWLEDGE_INSTRUCTION: &str =
    "Use this information to answer questions. If the answer isn't here, say so.";
pub const FALLBACK_SYSTEM_MESSAGE: &str = "You are a helpful assistant.";

/// Effective system message: the trimmed prompt, then the delimited
/// knowledge block, joined by a blank line. Either part is omitted when blank.
pub fn build_system_message(system_prompt: &str, knowledge_context: &str) -> String {
    let mut parts = Vec::with_capacity(2);

    let prompt = system_prompt.trim();
    if !prompt.is_empty() {
        parts.push(prompt.to_string());
    }

    let knowledge = knowledge_context.trim();
    if !knowledge.is_empty() {
        parts.push(format!(
            "{KNOWLEDGE_BEGIN}\n{KNOWLEDGE_INSTRUCTION}\n\n{knowledge}\n{KNOWLEDGE_END}"
        ));
    }

    if parts.is_empty() {
        FALLBACK_SYSTEM_MESSAGE.to_string()
    } else {
        parts.join("\n\n")
    }
}
