//! Generation backends.
//!
//! - [`OpenAiGenerationClient`]: OpenAI-compatible chat completions over HTTP
//! - [`ScriptedGenerationClient`]: deterministic replies for tests and offline use

mod http_client;
pub mod openai;
pub mod scripted;

pub use openai::OpenAiGenerationClient;
pub use scripted::{ScriptStep, ScriptedGenerationClient};

/// Rough token estimate for a reply: one token per four characters.
pub fn estimate_tokens(reply: &str) -> u32 {
    let chars = reply.chars().count() / 4;
    u32::try_from(chars).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimate_tokens_floors() {
        assert_eq!(estimate_tokens(""), 0);
        assert_eq!(estimate_tokens("abc"), 0);
        assert_eq!(estimate_tokens("abcd"), 1);
        assert_eq!(estimate_tokens("abcdefghi"), 2);
        // counts characters, not bytes
        assert_eq!(estimate_tokens("éééé"), 1);
    }
}
