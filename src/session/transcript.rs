//! Conversation transcript
//!
//! The transcript is the ordered list of all messages in the visible
//! conversation. Messages are owned exclusively by the transcript and
//! mutated in place by the streaming ingestion loop; they are never
//! deleted individually, only cleared en masse on session reset.

use crate::gateway::TokenUsage;

/// Who produced a message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Model,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Model => write!(f, "model"),
        }
    }
}

/// One message of the conversation
#[derive(Debug, Clone)]
pub struct Message {
    /// Unique monotonic identifier
    pub id: u64,
    /// Message author
    pub role: Role,
    /// Message text; model messages grow in place while streaming
    pub text: String,
    /// Token accounting, filled in as counts arrive
    pub token_counts: Option<TokenUsage>,
}

/// Ordered sequence of messages, insertion order = conversation order
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    messages: Vec<Message>,
    next_id: u64,
}

impl Transcript {
    /// Create an empty transcript
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, role: Role, text: String) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.messages.push(Message {
            id,
            role,
            text,
            token_counts: None,
        });
        id
    }

    /// Append a user message, returning its id
    pub fn push_user(&mut self, text: impl Into<String>) -> u64 {
        self.push(Role::User, text.into())
    }

    /// Append a model message, returning its id
    ///
    /// An empty model message is the placeholder mutated by streaming.
    pub fn push_model(&mut self, text: impl Into<String>) -> u64 {
        self.push(Role::Model, text.into())
    }

    fn message_mut(&mut self, id: u64) -> Option<&mut Message> {
        self.messages.iter_mut().find(|message| message.id == id)
    }

    /// Append text to a message in place
    ///
    /// Message text only ever grows; there is no operation that shortens
    /// it.
    pub fn append_to(&mut self, id: u64, delta: &str) {
        if let Some(message) = self.message_mut(id) {
            message.text.push_str(delta);
        }
    }

    /// Record an input-token estimate, unless an authoritative count from
    /// the response stream already filled it
    pub fn set_input_tokens(&mut self, id: u64, input: u64) {
        if let Some(message) = self.message_mut(id) {
            let counts = message.token_counts.get_or_insert_with(TokenUsage::default);
            if counts.input == 0 {
                counts.input = input;
            }
        }
    }

    /// Merge cumulative usage counts reported by the response stream
    ///
    /// Stream counts are cumulative, so nonzero fields replace rather
    /// than add.
    pub fn merge_usage(&mut self, id: u64, usage: TokenUsage) {
        if let Some(message) = self.message_mut(id) {
            let counts = message.token_counts.get_or_insert_with(TokenUsage::default);
            if usage.input > 0 {
                counts.input = usage.input;
            }
            if usage.output > 0 {
                counts.output = usage.output;
            }
            if usage.total > 0 {
                counts.total = usage.total;
            }
        }
    }

    /// Text of a message, if it exists
    pub fn text_of(&self, id: u64) -> Option<&str> {
        self.messages
            .iter()
            .find(|message| message.id == id)
            .map(|message| message.text.as_str())
    }

    /// All messages in conversation order
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// The most recent message
    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Number of messages
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// True if the transcript holds no messages
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Remove all messages
    ///
    /// Ids keep counting upward so they stay unique for the process
    /// lifetime.
    pub fn clear(&mut self) {
        self.messages.clear();
    }
}
