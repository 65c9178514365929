//! Prompt text sent to the AI services.

/// Instruction for building a scene index from a ready video.
pub const SCENE_INDEX_PROMPT: &str = r#"Analyze this video. Create a JSON list of events.
For each 5 second interval, provide:
1. start (integer seconds)
2. end (integer seconds)
3. audio_description (describe clearly what is said without changing the meaning, written like actual subtitles)
4. video_description (clearly describe what is happening, e.g. a person (name if you know) in a white dress holding a blue object, they look scared and a fight is happening)
JSON Format: [{"start": 0, "end": 5, "audio_description": "...", "video_description": "..."}]"#;

/// System message for the reasoning service.
pub const QUERY_SYSTEM_INSTRUCTION: &str = "You are a video assistant. Output ONLY valid JSON.";

/// Build the user message for a query against a stored index.
///
/// The index is embedded verbatim.
pub fn query_prompt(video_log: &str, query: &str) -> String {
    format!(
        "Video Log: {video_log}\n\
         User Query: \"{query}\"\n\
         Task: Find the BEST single scene.\n\
         Return JSON ONLY: {{ \"found\": true, \"start\": 10, \"end\": 20, \"answer\": \"...\" }}"
    )
}
