//! Wire and domain types for the remote model gateway
//!
//! Request types serialize to the remote API's casing; response types
//! tolerate missing fields, since streamed chunks carry different subsets
//! (text, finish reason, usage) at different points in the stream.

use serde::{Deserialize, Serialize};

/// One message of conversation content: a role plus ordered parts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content {
    pub role: String,
    pub parts: Vec<Part>,
}

impl Content {
    /// User content from pre-built parts
    pub fn user(parts: Vec<Part>) -> Self {
        Self {
            role: "user".to_string(),
            parts,
        }
    }

    /// User content holding a single text part
    pub fn user_text(text: impl Into<String>) -> Self {
        Self::user(vec![Part::text(text)])
    }

    /// Model content holding a single text part
    pub fn model_text(text: impl Into<String>) -> Self {
        Self {
            role: "model".to_string(),
            parts: vec![Part::text(text)],
        }
    }

    /// System-instruction content (role is ignored by the remote API)
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            parts: vec![Part::text(text)],
        }
    }
}

/// A unit of outgoing or incoming message payload
///
/// Either inline text or a reference to a previously uploaded file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Part {
    Text {
        text: String,
    },
    FileData {
        #[serde(rename = "fileData")]
        file_data: FileRef,
    },
}

impl Part {
    /// Inline text part
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// Reference to an uploaded file
    pub fn file_ref(mime_type: impl Into<String>, file_uri: impl Into<String>) -> Self {
        Self::FileData {
            file_data: FileRef {
                mime_type: mime_type.into(),
                file_uri: file_uri.into(),
            },
        }
    }

    /// The inline text, if this is a text part
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text { text } => Some(text),
            Self::FileData { .. } => None,
        }
    }
}

/// Reference to a file stored by the upload protocol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRef {
    #[serde(rename = "mimeType")]
    pub mime_type: String,
    #[serde(rename = "fileUri")]
    pub file_uri: String,
}

/// Per-category safety threshold
#[derive(Debug, Clone, Serialize)]
pub struct SafetySetting {
    pub category: String,
    pub threshold: String,
}

/// The fixed safety configuration: no blocking on any harm category
pub fn permissive_safety_settings() -> Vec<SafetySetting> {
    [
        "HARM_CATEGORY_HARASSMENT",
        "HARM_CATEGORY_HATE_SPEECH",
        "HARM_CATEGORY_SEXUALLY_EXPLICIT",
        "HARM_CATEGORY_DANGEROUS_CONTENT",
    ]
    .iter()
    .map(|category| SafetySetting {
        category: category.to_string(),
        threshold: "BLOCK_NONE".to_string(),
    })
    .collect()
}

/// Generation parameters sent with every chat turn
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f32,
    pub max_output_tokens: u32,
}

/// Body of a streaming chat turn request
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    pub system_instruction: Content,
    pub safety_settings: Vec<SafetySetting>,
    pub generation_config: GenerationConfig,
}

/// Body of a token-count request
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CountTokensRequest {
    pub contents: Vec<Content>,
    pub system_instruction: Content,
}

/// Response of a token-count request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountTokensResponse {
    pub total_tokens: u64,
}

/// One decoded chunk of the streamed chat response
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamChunk {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub usage_metadata: Option<UsageMetadata>,
}

/// A response candidate inside a stream chunk
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub content: Option<Content>,
    pub finish_reason: Option<String>,
}

/// Cumulative token usage reported by the remote model
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetadata {
    #[serde(default)]
    pub prompt_token_count: u64,
    #[serde(default)]
    pub candidates_token_count: u64,
    #[serde(default)]
    pub total_token_count: u64,
}

/// Token accounting for one message: input, output, total
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub input: u64,
    pub output: u64,
    pub total: u64,
}

/// Why the stream terminated
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinishReason {
    /// Normal end of response
    Stop,
    /// Output blocked by a safety filter
    Safety,
    /// Maximum output length reached
    MaxTokens,
    /// Any other reason reported by the remote model
    Other(String),
}

impl FinishReason {
    /// Map the remote API's finish-reason string
    pub fn from_wire(raw: &str) -> Self {
        match raw {
            "STOP" => Self::Stop,
            "SAFETY" => Self::Safety,
            "MAX_TOKENS" => Self::MaxTokens,
            other => Self::Other(other.to_string()),
        }
    }

    /// True for a normal stop; everything else is annotated inline
    pub fn is_normal(&self) -> bool {
        matches!(self, Self::Stop)
    }

    /// Human-readable description used for inline annotations
    pub fn describe(&self) -> String {
        match self {
            Self::Stop => "response complete".to_string(),
            Self::Safety => "response stopped: content blocked by safety filters".to_string(),
            Self::MaxTokens => "response stopped: maximum output length reached".to_string(),
            Self::Other(reason) => format!("response stopped: {}", reason),
        }
    }
}

/// One incremental event of the streamed response
#[derive(Debug, Clone, PartialEq)]
pub struct TurnDelta {
    /// Text to append to the running response (may be empty)
    pub text: String,
    /// Terminal-reason signal, when the chunk carries one
    pub finish_reason: Option<FinishReason>,
    /// Cumulative usage counts, when the chunk carries them
    pub usage: Option<TokenUsage>,
}

impl From<StreamChunk> for TurnDelta {
    fn from(chunk: StreamChunk) -> Self {
        let mut text = String::new();
        let mut finish_reason = None;
        if let Some(candidate) = chunk.candidates.into_iter().next() {
            if let Some(content) = candidate.content {
                for part in content.parts {
                    if let Part::Text { text: piece } = part {
                        text.push_str(&piece);
                    }
                }
            }
            finish_reason = candidate.finish_reason.as_deref().map(FinishReason::from_wire);
        }
        let usage = chunk.usage_metadata.map(|usage| TokenUsage {
            input: usage.prompt_token_count,
            output: usage.candidates_token_count,
            total: usage.total_token_count,
        });
        Self {
            text,
            finish_reason,
            usage,
        }
    }
}

/// Stored-file description returned by the upload protocol
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StoredFile {
    pub uri: String,
    #[serde(rename = "mimeType")]
    pub mime_type: String,
}

/// Envelope of the upload finalize response
#[derive(Debug, Deserialize)]
pub(crate) struct UploadResponse {
    pub file: StoredFile,
}
