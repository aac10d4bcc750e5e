//! Chat message construction shared by all provider adapters

use serde::{Deserialize, Serialize};

/// One turn of a chat conversation in the common wire format
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Build the message list sent to a backend
///
/// A system prompt becomes a leading system turn. When retrieved context is
/// present, the user turn embeds it in a fixed reference template ahead of
/// the question; otherwise the user turn is the raw prompt.
pub fn build_messages(
    prompt: &str,
    context: Option<&str>,
    system_prompt: Option<&str>,
) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(2);

    if let Some(system) = system_prompt {
        messages.push(ChatMessage::system(system));
    }

    let user_content = match context {
        Some(context) => format!(
            "Answer the question using the reference information below.\n\n\
             [Reference Information]\n{context}\n\n[Question]\n{prompt}"
        ),
        None => prompt.to_string(),
    };
    messages.push(ChatMessage::user(user_content));

    messages
}

/// Flatten a message list into a single text block for backends without
/// role-separated turns (Gemini)
pub fn flatten_messages(messages: &[ChatMessage]) -> String {
    messages
        .iter()
        .map(|m| m.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_message_construction() {
        let messages = build_messages("Q", Some("C"), Some("S"));
        assert_eq!(messages.len(), 2);

        assert_eq!(messages[0].role, "system");
        assert_eq!(messages[0].content, "S");

        assert_eq!(messages[1].role, "user");
        let user = &messages[1].content;
        // Context block comes before the question in the fixed template
        let context_pos = user.find("C").expect("context missing");
        let question_pos = user.rfind("Q").expect("question missing");
        assert!(user.contains("[Reference Information]"));
        assert!(user.contains("[Question]"));
        assert!(context_pos < question_pos);
    }

    #[test]
    fn test_bare_prompt_is_single_user_turn() {
        let messages = build_messages("Q", None, None);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, "user");
        assert_eq!(messages[0].content, "Q");
    }

    #[test]
    fn test_context_without_system_prompt() {
        let messages = build_messages("where?", Some("somewhere"), None);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, "user");
        assert!(messages[0].content.contains("somewhere"));
        assert!(messages[0].content.contains("where?"));
    }

    #[test]
    fn test_flatten_joins_turns() {
        let messages = build_messages("Q", None, Some("S"));
        assert_eq!(flatten_messages(&messages), "S\n\nQ");
    }
}
