use errors::PromptError;
use tracing::debug;
use unicode_normalization::UnicodeNormalization;
use yc_core::PromptCleaner;

/// Emoji, their modifiers and joiners.
const PICTOGRAPHS: &str = r"[\p{Extended_Pictographic}\p{Emoji_Modifier}\u{200D}\u{FE0E}\u{FE0F}]";
/// Combining marks split off by canonical decomposition.
const COMBINING_MARKS: &str = r"\p{Mn}";
const FORBIDDEN: &str = r"[^\w\s.,!?-]";
const WHITESPACE: &str = r"\s+";

/// Strips a prompt down to word characters, whitespace and `. , ! ? -`.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultPromptCleaner;

impl DefaultPromptCleaner {
    pub fn new() -> Self {
        Self
    }
}

impl PromptCleaner for DefaultPromptCleaner {
    fn clean(&self, prompt: &str) -> Result<String, PromptError> {
        let mut out = replace(prompt, PICTOGRAPHS, "");
        out = out.nfd().collect();
        out = replace(&out, COMBINING_MARKS, "");
        out = replace(&out, FORBIDDEN, "");
        out = replace(&out, WHITESPACE, " ");

        let cleaned = out.trim();
        if cleaned.is_empty() {
            return Err(PromptError::EmptyInput);
        }

        debug!(
            original_len = prompt.chars().count(),
            cleaned_len = cleaned.chars().count(),
            "Prompt cleaned"
        );
        Ok(cleaned.to_string())
    }
}

fn replace(input: &str, pattern: &str, replacement: &str) -> String {
    match regex::Regex::new(pattern) {
        Ok(re) => re.replace_all(input, replacement).into_owned(),
        Err(_) => input.to_string()
    }
}
