//! Scene indexer.
//!
//! Turns an uploaded video into a stored scene index. Identical identifiers
//! are served from the artifact store without contacting the analysis
//! service.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use scenespot_ml_client::{wait_until_ready, AnalysisService, PollPolicy};
use scenespot_models::{parse_scene_events, CacheKeyPolicy, Identifier};
use scenespot_storage::{remove_scratch_file, scratch_upload_path, ArtifactStore};
use tracing::{info, warn};

use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::services::notifier::Notifier;
use crate::services::prompts::SCENE_INDEX_PROMPT;

/// Result of indexing one upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexOutcome {
    pub identifier: Identifier,
    /// True when the index already existed and no analysis ran
    pub cached: bool,
}

pub struct SceneIndexer {
    store: ArtifactStore,
    analysis: Arc<dyn AnalysisService>,
    notifier: Notifier,
    poll: PollPolicy,
    scratch_dir: PathBuf,
    key_policy: CacheKeyPolicy,
}

impl SceneIndexer {
    pub fn new(
        store: ArtifactStore,
        analysis: Arc<dyn AnalysisService>,
        notifier: Notifier,
        poll: PollPolicy,
        scratch_dir: impl Into<PathBuf>,
        key_policy: CacheKeyPolicy,
    ) -> Self {
        Self {
            store,
            analysis,
            notifier,
            poll,
            scratch_dir: scratch_dir.into(),
            key_policy,
        }
    }

    /// Index an uploaded video, reusing a stored index when one exists.
    pub async fn index(&self, upload_name: &str, content: &[u8]) -> ApiResult<IndexOutcome> {
        let identifier = Identifier::for_upload(upload_name, content, self.key_policy)
            .map_err(|e| ApiError::bad_request(e.to_string()))?;

        if self.store.exists(&identifier).await {
            info!(identifier = %identifier, "CACHE HIT: index exists, skipping analysis");
            metrics::record_index_cache_hit();
            return Ok(IndexOutcome {
                identifier,
                cached: true,
            });
        }
        metrics::record_index_cache_miss();

        info!(
            identifier = %identifier,
            size = content.len(),
            "Indexing new video"
        );

        let started = Instant::now();
        let result = self.analyze(&identifier, content).await;
        metrics::record_analysis_duration(
            if result.is_ok() { "success" } else { "error" },
            started.elapsed().as_secs_f64(),
        );
        let raw = result?;

        match parse_scene_events(raw.as_bytes()) {
            Ok(events) => info!(identifier = %identifier, events = events.len(), "Scene index generated"),
            Err(e) => warn!(
                identifier = %identifier,
                error = %e,
                "Scene index is not a list of scene events, storing it as returned"
            ),
        }

        let path = self.store.write(&identifier, raw.as_bytes()).await?;
        self.notifier.notify(&path);

        Ok(IndexOutcome {
            identifier,
            cached: false,
        })
    }

    /// Upload, wait for processing, and request the scene breakdown.
    ///
    /// The scratch copy of the upload is removed on every path out of here.
    async fn analyze(&self, identifier: &Identifier, content: &[u8]) -> ApiResult<String> {
        tokio::fs::create_dir_all(&self.scratch_dir).await?;

        let scratch = scopeguard::guard(
            scratch_upload_path(&self.scratch_dir, identifier),
            |path: PathBuf| {
                remove_scratch_file(&path);
            },
        );
        let scratch_path: &Path = &scratch;

        tokio::fs::write(scratch_path, content).await?;

        let uploaded = self
            .analysis
            .upload_video(scratch_path, identifier.as_str())
            .await?;
        info!(identifier = %identifier, video = %uploaded.name, "Video uploaded, waiting for processing");

        let ready = wait_until_ready(self.analysis.as_ref(), uploaded, &self.poll).await?;
        let text = self.analysis.generate(&ready, SCENE_INDEX_PROMPT).await?;

        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::{FailingMailer, StubAnalysis};
    use std::time::Duration;

    const EVENTS: &str = r#"[{"start":0,"end":5,"audio_description":"Hello","video_description":"A woman in a red coat waves"}]"#;

    fn fast_poll() -> PollPolicy {
        PollPolicy::new(Duration::from_millis(1), Duration::from_secs(5))
    }

    fn indexer(dir: &Path, analysis: Arc<StubAnalysis>, policy: CacheKeyPolicy) -> SceneIndexer {
        SceneIndexer::new(
            ArtifactStore::new(dir.join("indices")),
            analysis,
            Notifier::disabled(),
            fast_poll(),
            dir.join("scratch"),
            policy,
        )
    }

    fn scratch_is_empty(dir: &Path) -> bool {
        match std::fs::read_dir(dir.join("scratch")) {
            Ok(mut entries) => entries.next().is_none(),
            Err(_) => true,
        }
    }

    #[tokio::test]
    async fn test_demo_clip_indexed_then_cached() {
        let dir = tempfile::tempdir().unwrap();
        let analysis = Arc::new(StubAnalysis::returning(EVENTS));
        let indexer = indexer(dir.path(), analysis.clone(), CacheKeyPolicy::Filename);

        let first = indexer.index("demo clip.mp4", b"video").await.unwrap();
        assert_eq!(first.identifier.as_str(), "demo_clip.mp4");
        assert!(!first.cached);

        let stored = std::fs::read_to_string(dir.path().join("indices/demo_clip.mp4.json")).unwrap();
        assert_eq!(stored, EVENTS);

        let second = indexer.index("demo clip.mp4", b"video").await.unwrap();
        assert!(second.cached);
        assert_eq!(analysis.upload_count(), 1);
    }

    #[tokio::test]
    async fn test_scratch_file_removed_after_success() {
        let dir = tempfile::tempdir().unwrap();
        let analysis = Arc::new(StubAnalysis::returning(EVENTS));
        let indexer = indexer(dir.path(), analysis.clone(), CacheKeyPolicy::Filename);

        indexer.index("a.mp4", b"video").await.unwrap();

        let paths = analysis.scratch_paths();
        assert_eq!(paths.len(), 1);
        let (path, existed_during_upload) = &paths[0];
        assert!(existed_during_upload);
        assert!(!path.exists());
        assert!(path
            .file_name()
            .unwrap()
            .to_string_lossy()
            .ends_with("_a.mp4"));
    }

    #[tokio::test]
    async fn test_failed_analysis_removes_scratch_and_stores_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let analysis = Arc::new(StubAnalysis::failing_analysis());
        let indexer = indexer(dir.path(), analysis.clone(), CacheKeyPolicy::Filename);

        let err = indexer.index("a.mp4", b"video").await.unwrap_err();
        assert!(matches!(err, ApiError::AnalysisFailed(_)));
        assert!(scratch_is_empty(dir.path()));
        assert!(!dir.path().join("indices/a.mp4.json").exists());
        assert_eq!(analysis.generations.load(std::sync::atomic::Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_upload_error_removes_scratch() {
        let dir = tempfile::tempdir().unwrap();
        let analysis = Arc::new(StubAnalysis::failing_upload());
        let indexer = indexer(dir.path(), analysis.clone(), CacheKeyPolicy::Filename);

        let err = indexer.index("a.mp4", b"video").await.unwrap_err();
        assert!(matches!(err, ApiError::Upstream(_)));

        let (path, existed) = &analysis.scratch_paths()[0];
        assert!(existed);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_non_event_response_is_stored_as_returned() {
        let dir = tempfile::tempdir().unwrap();
        let analysis = Arc::new(StubAnalysis::returning(r#"{"events":"later"}"#));
        let indexer = indexer(dir.path(), analysis, CacheKeyPolicy::Filename);

        indexer.index("odd.mp4", b"video").await.unwrap();
        let stored = std::fs::read_to_string(dir.path().join("indices/odd.mp4.json")).unwrap();
        assert_eq!(stored, r#"{"events":"later"}"#);
    }

    #[tokio::test]
    async fn test_invalid_name_is_bad_request() {
        let dir = tempfile::tempdir().unwrap();
        let analysis = Arc::new(StubAnalysis::returning(EVENTS));
        let indexer = indexer(dir.path(), analysis.clone(), CacheKeyPolicy::Filename);

        let err = indexer.index("", b"video").await.unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
        assert_eq!(analysis.upload_count(), 0);
    }

    #[tokio::test]
    async fn test_content_hash_policy_separates_same_name() {
        let dir = tempfile::tempdir().unwrap();
        let analysis = Arc::new(StubAnalysis::returning(EVENTS));
        let indexer = indexer(dir.path(), analysis.clone(), CacheKeyPolicy::ContentHash);

        let a = indexer.index("clip.mp4", b"first cut").await.unwrap();
        let b = indexer.index("clip.mp4", b"second cut").await.unwrap();
        let again = indexer.index("clip.mp4", b"first cut").await.unwrap();

        assert_ne!(a.identifier, b.identifier);
        assert!(!b.cached);
        assert!(again.cached);
        assert_eq!(analysis.upload_count(), 2);
    }

    #[tokio::test]
    async fn test_distinct_non_ascii_names_get_separate_indexes() {
        let dir = tempfile::tempdir().unwrap();
        let analysis = Arc::new(StubAnalysis::returning(EVENTS));
        let indexer = indexer(dir.path(), analysis.clone(), CacheKeyPolicy::Filename);

        let a = indexer.index("кошка.mp4", b"cat video").await.unwrap();
        let b = indexer.index("видео.mp4", b"other video").await.unwrap();

        assert_ne!(a.identifier, b.identifier);
        assert!(!b.cached);
        assert_eq!(analysis.upload_count(), 2);

        let again = indexer.index("кошка.mp4", b"cat video").await.unwrap();
        assert!(again.cached);
        assert_eq!(again.identifier, a.identifier);
    }

    #[tokio::test]
    async fn test_upload_succeeds_when_mail_fails() {
        let dir = tempfile::tempdir().unwrap();
        let analysis = Arc::new(StubAnalysis::returning(EVENTS));
        let mailer = Arc::new(FailingMailer::default());
        let indexer = SceneIndexer::new(
            ArtifactStore::new(dir.path().join("indices")),
            analysis,
            Notifier::spawn(mailer.clone(), 4),
            fast_poll(),
            dir.path().join("scratch"),
            CacheKeyPolicy::Filename,
        );

        let outcome = indexer.index("demo clip.mp4", b"video").await.unwrap();
        assert!(!outcome.cached);
        assert!(dir.path().join("indices/demo_clip.mp4.json").exists());

        for _ in 0..200 {
            if mailer.attempt_count() > 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(mailer.attempt_count(), 1);

        // The indexer keeps working after the failed delivery
        let second = indexer.index("other.mp4", b"video").await.unwrap();
        assert!(!second.cached);
    }
}
