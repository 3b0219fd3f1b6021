//! Session data model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Who authored a message. Always supplied by the caller, never inferred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Assistant => write!(f, "assistant"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "assistant" => Ok(Self::Assistant),
            _ => Err(format!("Unknown role: {}", s)),
        }
    }
}

/// One entry in a session transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self::at(role, content, Utc::now())
    }

    pub fn at(role: Role, content: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp,
        }
    }
}

/// A conversation with one configured agent.
///
/// `messages` is append-only; insertion order is chronological order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub agent_id: String,
    pub title: String,
    pub messages: Vec<Message>,
}

impl Session {
    pub fn new(agent_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            agent_id: agent_id.into(),
            title: title.into(),
            messages: Vec::new(),
        }
    }

    /// Seed with a first user message.
    pub fn with_first_message(mut self, message: Message) -> Self {
        self.messages.push(message);
        self
    }

    /// Most recently appended assistant message, if any.
    pub fn latest_assistant_message(&self) -> Option<&Message> {
        self.messages.iter().rev().find(|m| m.role == Role::Assistant)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_display_and_fromstr() {
        assert_eq!(Role::Assistant.to_string(), "assistant");
        assert_eq!("user".parse::<Role>().unwrap(), Role::User);
        assert!("system".parse::<Role>().is_err());
    }

    #[test]
    fn latest_assistant_skips_trailing_user_messages() {
        let mut session = Session::new("gpt5", "GPT-5 Thinking");
        session.messages.push(Message::new(Role::User, "q1"));
        session.messages.push(Message::new(Role::Assistant, "a1"));
        session.messages.push(Message::new(Role::Assistant, "a2"));
        session.messages.push(Message::new(Role::User, "q2"));
        assert_eq!(session.latest_assistant_message().unwrap().content, "a2");
    }

    #[test]
    fn latest_assistant_none_without_replies() {
        let session = Session::new("gpt5", "GPT-5 Thinking")
            .with_first_message(Message::new(Role::User, "hello"));
        assert!(session.latest_assistant_message().is_none());
    }

    #[test]
    fn message_serializes_snake_case_role() {
        let msg = Message::new(Role::Assistant, "hi");
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"role\":\"assistant\""));
    }
}
