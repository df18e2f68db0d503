//! Context window and prompt assembly.
//!
//! The window is message-count based: the last `window_size` completed
//! messages, oldest first, rendered as `role: content` lines. There is no
//! token budgeting.

use parley_traits::Message;

/// Bounded slice of prior messages, oldest first.
///
/// Messages with empty content never reach the window.
pub fn context_window<'a, I>(messages: I, window_size: usize) -> Vec<&'a Message>
where
    I: IntoIterator<Item = &'a Message>,
{
    let completed: Vec<&Message> = messages
        .into_iter()
        .filter(|message| !message.content.is_empty())
        .collect();

    if completed.len() <= window_size {
        completed
    } else {
        let start = completed.len() - window_size;
        completed[start..].to_vec()
    }
}

/// Render a window as newline-joined `role: content` lines.
pub fn render_context(window: &[&Message]) -> String {
    window
        .iter()
        .map(|message| format!("{}: {}", message.role, message.content))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Window the messages and render the result in one step.
pub fn build_context_block<'a, I>(messages: I, window_size: usize) -> String
where
    I: IntoIterator<Item = &'a Message>,
{
    render_context(&context_window(messages, window_size))
}

/// Fixed text wrapped around the context block and the new utterance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    preamble: String,
    closing_instruction: String,
}

impl PromptTemplate {
    pub fn new(preamble: impl Into<String>, closing_instruction: impl Into<String>) -> Self {
        Self {
            preamble: preamble.into(),
            closing_instruction: closing_instruction.into(),
        }
    }

    /// Preamble, context block and utterance, in that order, separated by
    /// blank lines. The closing instruction is appended when non-empty.
    pub fn assemble(&self, context_block: &str, utterance: &str) -> String {
        let mut prompt = format!(
            "{}\n\nPrevious conversation:\n{}\n\nUser: {}",
            self.preamble, context_block, utterance
        );
        if !self.closing_instruction.is_empty() {
            prompt.push_str("\n\n");
            prompt.push_str(&self.closing_instruction);
        }
        prompt
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_traits::Role;

    fn message(index: usize, role: Role, content: &str) -> Message {
        Message {
            id: format!("m{index}"),
            conversation_id: "conv".to_string(),
            role,
            content: content.to_string(),
            created_at: index as i64,
            tokens_used: None,
        }
    }

    fn numbered(count: usize) -> Vec<Message> {
        (0..count)
            .map(|i| {
                let role = if i % 2 == 0 { Role::User } else { Role::Assistant };
                message(i, role, &format!("line {i}"))
            })
            .collect()
    }

    #[test]
    fn test_window_is_bounded_and_ordered() {
        for length in [0usize, 1, 5, 10, 11, 25] {
            let messages = numbered(length);
            let window = context_window(&messages, 10);
            let expected = length.min(10);
            assert_eq!(window.len(), expected, "length {length}");

            let tail: Vec<&str> = messages[length - expected..]
                .iter()
                .map(|m| m.id.as_str())
                .collect();
            let got: Vec<&str> = window.iter().map(|m| m.id.as_str()).collect();
            assert_eq!(got, tail);
        }
    }

    #[test]
    fn test_twelve_messages_keep_last_ten() {
        let messages = numbered(12);
        let window = context_window(&messages, 10);
        assert_eq!(window.first().unwrap().id, "m2");
        assert_eq!(window.last().unwrap().id, "m11");
    }

    #[test]
    fn test_empty_sequence_gives_empty_block() {
        let messages: Vec<Message> = Vec::new();
        assert_eq!(build_context_block(&messages, 10), "");
    }

    #[test]
    fn test_single_message_block() {
        let messages = vec![message(1, Role::User, "Hi")];
        assert_eq!(build_context_block(&messages, 10), "user: Hi");
    }

    #[test]
    fn test_empty_content_excluded_before_windowing() {
        let mut messages = numbered(3);
        messages.push(message(3, Role::Assistant, ""));
        let window = context_window(&messages, 3);
        let ids: Vec<&str> = window.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["m0", "m1", "m2"]);
    }

    #[test]
    fn test_block_joins_lines() {
        let messages = vec![
            message(0, Role::User, "Hi"),
            message(1, Role::Assistant, "Hello!"),
        ];
        assert_eq!(
            build_context_block(&messages, 10),
            "user: Hi\nassistant: Hello!"
        );
    }

    #[test]
    fn test_prompt_layout() {
        let template = PromptTemplate::new("Preamble.", "Closing.");
        let prompt = template.assemble("user: Hi", "How are you?");
        assert_eq!(
            prompt,
            "Preamble.\n\nPrevious conversation:\nuser: Hi\n\nUser: How are you?\n\nClosing."
        );
    }

    #[test]
    fn test_prompt_without_closing() {
        let template = PromptTemplate::new("Preamble.", "");
        let prompt = template.assemble("", "Hello");
        assert!(prompt.ends_with("User: Hello"));
        assert!(prompt.starts_with("Preamble.\n\n"));
    }
}
