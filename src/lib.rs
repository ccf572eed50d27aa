//! Docuchat - document analysis chat library
//!
//! This library provides the core functionality for the Docuchat client:
//! the session orchestrator and streaming-response pipeline, the remote
//! model gateway (file upload + chat turns), the attachment queue, and
//! the prompt library.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `session`: transcript and the orchestrator state machine
//! - `gateway`: upload protocol, streaming chat protocol, token counting
//! - `attachments`: pending file queue with type validation
//! - `prompts`: built-in prompt prefixes and the system instruction
//! - `render`: the renderer contract and terminal implementation
//! - `credentials`: keyring-backed credential storage
//! - `config`: configuration management and validation
//! - `error`: error types and result aliases
//! - `cli`: command-line interface definition
//!
//! # Example
//!
//! ```no_run
//! use docuchat::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.yaml")?;
//!     config.validate()?;
//!
//!     // Orchestrator usage would go here
//!     Ok(())
//! }
//! ```

pub mod attachments;
pub mod cli;
pub mod commands;
pub mod config;
pub mod credentials;
pub mod error;
pub mod gateway;
pub mod prompts;
pub mod render;
pub mod session;

// Re-export commonly used types
pub use attachments::{Attachment, AttachmentQueue};
pub use config::Config;
pub use error::{DocuchatError, Result};
pub use gateway::ModelGateway;
pub use render::Renderer;
pub use session::SessionOrchestrator;
