use chrono::{DateTime, Local, TimeZone};
use colored::Colorize;
use parley_core::history::format_clock;
use parley_core::models::{Message, Role};

/// Characters of a conversation id shown in tables (`conv_` plus eight).
const SHORT_ID_LEN: usize = 13;

pub fn format_timestamp(timestamp: Option<i64>) -> String {
    let Some(ts) = timestamp else {
        return "-".to_string();
    };

    let datetime: DateTime<Local> = match Local.timestamp_millis_opt(ts).single() {
        Some(dt) => dt,
        None => return "-".to_string(),
    };

    datetime.format("%Y-%m-%d %H:%M:%S").to_string()
}

pub fn short_id(id: &str) -> String {
    id.chars().take(SHORT_ID_LEN).collect()
}

pub fn speaker(role: Role) -> &'static str {
    match role {
        Role::User => "You",
        Role::Assistant => "Assistant",
    }
}

/// `[HH:MM] Speaker: content`, with the token count on replies that have one.
pub fn message_line(message: &Message) -> String {
    let label = match message.role {
        Role::User => speaker(message.role).cyan().bold(),
        Role::Assistant => speaker(message.role).green().bold(),
    };
    let mut line = format!(
        "{} {}: {}",
        format!("[{}]", format_clock(message.created_at)).dimmed(),
        label,
        message.content
    );
    if let Some(tokens) = message.tokens_used {
        line.push_str(&format!(" {}", format!("({tokens} tokens)").dimmed()));
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(role: Role, tokens_used: Option<u32>) -> Message {
        Message {
            id: "m1".to_string(),
            conversation_id: "c".to_string(),
            role,
            content: "hello".to_string(),
            created_at: Local::now().timestamp_millis(),
            tokens_used,
        }
    }

    #[test]
    fn test_short_id() {
        assert_eq!(short_id("conv_0123456789abcdef"), "conv_01234567");
        assert_eq!(short_id("default"), "default");
    }

    #[test]
    fn test_format_timestamp_missing() {
        assert_eq!(format_timestamp(None), "-");
    }

    #[test]
    fn test_message_line_includes_tokens_for_replies() {
        colored::control::set_override(false);
        let reply = message_line(&message(Role::Assistant, Some(3)));
        assert!(reply.contains("Assistant: hello"));
        assert!(reply.ends_with("(3 tokens)"));

        let user = message_line(&message(Role::User, None));
        assert!(user.contains("You: hello"));
        assert!(!user.contains("tokens"));
    }
}
