//! Clients for the external AI services.
//!
//! This crate provides:
//! - [`AnalysisService`]: uploads a video, reports its processing state and
//!   generates text about it (implemented by [`GeminiClient`])
//! - [`ReasoningService`]: chat-style JSON completions (implemented by
//!   [`GroqClient`])
//! - [`PollPolicy`]: bounded waiting for an uploaded video to become usable

pub mod error;
pub mod gemini;
pub mod groq;
pub mod poll;
pub mod service;

pub use error::{MlError, MlResult};
pub use gemini::{GeminiClient, GeminiConfig};
pub use groq::{GroqClient, GroqConfig};
pub use poll::{wait_until_ready, PollPolicy};
pub use service::{AnalysisService, ReasoningService, RemoteVideo};
