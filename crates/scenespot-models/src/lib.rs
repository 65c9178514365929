//! Shared data models for the SceneSpot backend.
//!
//! This crate provides Serde-serializable types for:
//! - Scene events that make up a stored video index
//! - Query answers produced by the reasoning model
//! - Artifact identifiers and the cache key policy
//! - Analysis job states reported by the video model

pub mod analysis;
pub mod answer;
pub mod identifier;
pub mod scene;

// Re-export common types
pub use analysis::AnalysisState;
pub use answer::{QueryAnswer, INDEX_NOT_FOUND_ANSWER};
pub use identifier::{CacheKeyPolicy, Identifier, IdentifierError, IdentifierResult};
pub use scene::{parse_scene_events, SceneEvent};
