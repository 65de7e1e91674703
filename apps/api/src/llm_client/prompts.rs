// Prompt fragments shared by every completion request.
// The resume prompt itself lives in generation::prompts.

/// System message that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You are a CV writing assistant. \
    You MUST respond with a single valid JSON object only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";
