//! Scene event models.

use serde::{Deserialize, Serialize};

/// One timed segment of a video index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneEvent {
    /// Window start (seconds)
    pub start: u64,

    /// Window end (seconds)
    pub end: u64,

    /// What is said during the window, subtitle style
    pub audio_description: String,

    /// What is visible during the window
    pub video_description: String,
}

impl SceneEvent {
    /// Create a new scene event.
    pub fn new(
        start: u64,
        end: u64,
        audio_description: impl Into<String>,
        video_description: impl Into<String>,
    ) -> Self {
        Self {
            start,
            end,
            audio_description: audio_description.into(),
            video_description: video_description.into(),
        }
    }
}

/// Parse a stored artifact into scene events.
///
/// Artifacts are kept verbatim as the model returned them, so this is only
/// used for inspection; callers must not reject an artifact because of it.
pub fn parse_scene_events(raw: &[u8]) -> Result<Vec<SceneEvent>, serde_json::Error> {
    serde_json::from_slice(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_scene_events() {
        let raw = br#"[
            {"start": 0, "end": 5, "audio_description": "Hello", "video_description": "A man waves"},
            {"start": 5, "end": 10, "audio_description": "", "video_description": "Empty street"}
        ]"#;
        let events = parse_scene_events(raw).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].start, 5);
        assert_eq!(events[0], SceneEvent::new(0, 5, "Hello", "A man waves"));
    }

    #[test]
    fn test_parse_rejects_non_array() {
        assert!(parse_scene_events(br#"{"start": 0}"#).is_err());
        assert!(parse_scene_events(b"not json").is_err());
    }
}
