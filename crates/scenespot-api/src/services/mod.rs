//! Business logic behind the HTTP handlers.

pub mod answerer;
pub mod indexer;
pub mod notifier;
pub mod prompts;

pub use answerer::QueryAnswerer;
pub use indexer::{IndexOutcome, SceneIndexer};
pub use notifier::{MailConfig, MailError, Mailer, Notifier, SmtpMailer};

#[cfg(test)]
pub(crate) mod testing {
    //! Stub AI services that count calls.

    use std::path::{Path, PathBuf};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use scenespot_ml_client::{AnalysisService, MlError, MlResult, ReasoningService, RemoteVideo};
    use scenespot_models::AnalysisState;

    use super::notifier::{ArtifactMail, MailError, Mailer};

    pub struct StubAnalysis {
        pub uploads: AtomicUsize,
        pub generations: AtomicUsize,
        /// Scratch path handed to each upload and whether it existed then
        pub uploaded_paths: Mutex<Vec<(PathBuf, bool)>>,
        pub final_state: AnalysisState,
        pub fail_upload: bool,
        pub response: String,
    }

    impl StubAnalysis {
        pub fn returning(response: &str) -> Self {
            Self {
                uploads: AtomicUsize::new(0),
                generations: AtomicUsize::new(0),
                uploaded_paths: Mutex::new(Vec::new()),
                final_state: AnalysisState::Succeeded,
                fail_upload: false,
                response: response.to_string(),
            }
        }

        pub fn failing_analysis() -> Self {
            Self {
                final_state: AnalysisState::Failed,
                ..Self::returning("[]")
            }
        }

        pub fn failing_upload() -> Self {
            Self {
                fail_upload: true,
                ..Self::returning("[]")
            }
        }

        pub fn upload_count(&self) -> usize {
            self.uploads.load(Ordering::SeqCst)
        }

        pub fn scratch_paths(&self) -> Vec<(PathBuf, bool)> {
            self.uploaded_paths.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl AnalysisService for StubAnalysis {
        async fn upload_video(&self, path: &Path, _display_name: &str) -> MlResult<RemoteVideo> {
            self.uploads.fetch_add(1, Ordering::SeqCst);
            self.uploaded_paths
                .lock()
                .unwrap()
                .push((path.to_path_buf(), path.exists()));

            if self.fail_upload {
                return Err(MlError::request_failed("upload refused"));
            }

            Ok(RemoteVideo {
                name: "files/stub".to_string(),
                uri: "https://stub.invalid/files/stub".to_string(),
                mime_type: "video/mp4".to_string(),
                state: AnalysisState::Processing,
            })
        }

        async fn get_video(&self, name: &str) -> MlResult<RemoteVideo> {
            Ok(RemoteVideo {
                name: name.to_string(),
                uri: "https://stub.invalid/files/stub".to_string(),
                mime_type: "video/mp4".to_string(),
                state: self.final_state,
            })
        }

        async fn generate(&self, _video: &RemoteVideo, _prompt: &str) -> MlResult<String> {
            self.generations.fetch_add(1, Ordering::SeqCst);
            Ok(self.response.clone())
        }
    }

    pub struct StubReasoning {
        pub calls: AtomicUsize,
        pub last_user_message: Mutex<Option<String>>,
        pub response: String,
    }

    impl StubReasoning {
        pub fn returning(response: &str) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                last_user_message: Mutex::new(None),
                response: response.to_string(),
            }
        }

        pub fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ReasoningService for StubReasoning {
        async fn complete_json(&self, _system: &str, user: &str) -> MlResult<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_user_message.lock().unwrap() = Some(user.to_string());
            Ok(self.response.clone())
        }
    }

    /// Mailer that refuses every message.
    #[derive(Default)]
    pub struct FailingMailer {
        pub attempts: AtomicUsize,
    }

    impl FailingMailer {
        pub fn attempt_count(&self) -> usize {
            self.attempts.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Mailer for FailingMailer {
        async fn send_artifact(&self, _mail: ArtifactMail) -> Result<(), MailError> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            Err(MailError::ContentType("relay refused".into()))
        }
    }
}
