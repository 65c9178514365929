//! Artifact mail notifications.
//!
//! After a new index is saved, a copy is mailed to a fixed recipient. Sending
//! happens on a background task fed by a bounded queue, so the upload request
//! never waits on SMTP and a mail failure never fails the upload.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, info, warn};

use crate::metrics;

/// Subject line of every artifact mail.
pub const MAIL_SUBJECT: &str = "SceneSpot AI 🚨 JSON Data Export";

/// Plain-text body of every artifact mail.
pub const MAIL_BODY: &str = "Attached is the requested JSON index file for your review.";

#[derive(Debug, Error)]
pub enum MailError {
    #[error("Invalid mail address: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("Invalid attachment content type: {0}")]
    ContentType(String),

    #[error("Failed to build message: {0}")]
    Build(#[from] lettre::error::Error),

    #[error("SMTP error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    #[error("Failed to read attachment: {0}")]
    Attachment(#[from] std::io::Error),
}

/// SMTP settings for artifact mail.
#[derive(Debug, Clone)]
pub struct MailConfig {
    pub sender: String,
    pub recipient: String,
    pub password: String,
    pub smtp_host: String,
    pub smtp_port: u16,
    /// Pending notifications beyond this are dropped
    pub queue_size: usize,
}

impl MailConfig {
    /// Load from environment. Returns `None` (mail disabled) unless sender,
    /// recipient and password are all set.
    pub fn from_env() -> Option<Self> {
        let sender = non_empty_env("SENDER_EMAIL")?;
        let recipient = non_empty_env("RECEIVER_EMAIL")?;
        let password = non_empty_env("PASSWORD")?;

        Some(Self {
            sender,
            recipient,
            password,
            smtp_host: std::env::var("SMTP_HOST").unwrap_or_else(|_| "smtp.gmail.com".to_string()),
            smtp_port: std::env::var("SMTP_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(587),
            queue_size: std::env::var("NOTIFY_QUEUE_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or(16),
        })
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// One artifact ready to be mailed.
#[derive(Debug, Clone)]
pub struct ArtifactMail {
    pub file_name: String,
    pub content: Vec<u8>,
}

/// Delivers artifact mail.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_artifact(&self, mail: ArtifactMail) -> Result<(), MailError>;
}

/// SMTP mailer using STARTTLS with password auth.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Mailbox,
}

impl SmtpMailer {
    pub fn new(config: &MailConfig) -> Result<Self, MailError> {
        let from: Mailbox = config.sender.parse()?;
        let to: Mailbox = config.recipient.parse()?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(Credentials::new(
                config.sender.clone(),
                config.password.clone(),
            ))
            .build();

        info!(
            host = %config.smtp_host,
            port = config.smtp_port,
            "Mail notifier initialized (SMTP with STARTTLS)"
        );

        Ok(Self { transport, from, to })
    }

    fn build_message(&self, mail: ArtifactMail) -> Result<Message, MailError> {
        build_message(self.from.clone(), self.to.clone(), mail)
    }
}

fn build_message(from: Mailbox, to: Mailbox, mail: ArtifactMail) -> Result<Message, MailError> {
    let json = ContentType::parse("application/json")
        .map_err(|e| MailError::ContentType(e.to_string()))?;

    let message = Message::builder()
        .from(from)
        .to(to)
        .subject(MAIL_SUBJECT)
        .multipart(
            MultiPart::mixed()
                .singlepart(SinglePart::plain(MAIL_BODY.to_string()))
                .singlepart(Attachment::new(mail.file_name).body(mail.content, json)),
        )?;

    Ok(message)
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send_artifact(&self, mail: ArtifactMail) -> Result<(), MailError> {
        let message = self.build_message(mail)?;
        self.transport.send(message).await?;
        Ok(())
    }
}

/// Handle for queueing artifact notifications.
#[derive(Clone)]
pub struct Notifier {
    tx: Option<mpsc::Sender<PathBuf>>,
}

impl Notifier {
    /// A notifier that drops every request.
    pub fn disabled() -> Self {
        Self { tx: None }
    }

    /// Start the delivery task. Must be called inside a tokio runtime.
    pub fn spawn(mailer: Arc<dyn Mailer>, queue_size: usize) -> Self {
        let (tx, mut rx) = mpsc::channel::<PathBuf>(queue_size.max(1));

        tokio::spawn(async move {
            while let Some(path) = rx.recv().await {
                match deliver(mailer.as_ref(), &path).await {
                    Ok(()) => {
                        metrics::record_notification("sent");
                        info!(path = %path.display(), "Artifact mail sent");
                    }
                    Err(e) => {
                        metrics::record_notification("failed");
                        warn!(path = %path.display(), error = %e, "Artifact mail failed");
                    }
                }
            }
            debug!("Notifier queue closed");
        });

        Self { tx: Some(tx) }
    }

    pub fn is_enabled(&self) -> bool {
        self.tx.is_some()
    }

    /// Queue the artifact at `path` for mailing. Never blocks.
    pub fn notify(&self, path: &Path) {
        let Some(tx) = &self.tx else {
            debug!(path = %path.display(), "Mail disabled, skipping notification");
            return;
        };

        match tx.try_send(path.to_path_buf()) {
            Ok(()) => debug!(path = %path.display(), "Artifact mail queued"),
            Err(TrySendError::Full(_)) => {
                metrics::record_notification("dropped");
                warn!(path = %path.display(), "Notification queue full, dropping artifact mail");
            }
            Err(TrySendError::Closed(_)) => {
                metrics::record_notification("dropped");
                warn!(path = %path.display(), "Notifier stopped, dropping artifact mail");
            }
        }
    }
}

/// Read the artifact and hand it to the mailer. The attachment keeps the
/// artifact's file name.
pub async fn deliver(mailer: &dyn Mailer, path: &Path) -> Result<(), MailError> {
    let content = tokio::fs::read(path).await?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "index.json".to_string());

    mailer.send_artifact(ArtifactMail { file_name, content }).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct RecordingMailer {
        sent: Mutex<Vec<ArtifactMail>>,
        fail: bool,
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send_artifact(&self, mail: ArtifactMail) -> Result<(), MailError> {
            self.sent.lock().unwrap().push(mail);
            if self.fail {
                return Err(MailError::ContentType("refused".into()));
            }
            Ok(())
        }
    }

    async fn wait_for_sends(mailer: &RecordingMailer, count: usize) {
        for _ in 0..200 {
            if mailer.sent.lock().unwrap().len() >= count {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("mailer never received {} messages", count);
    }

    #[tokio::test]
    async fn test_deliver_attaches_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("demo_clip.mp4.json");
        std::fs::write(&path, b"[]").unwrap();

        let mailer = RecordingMailer::default();
        deliver(&mailer, &path).await.unwrap();

        let sent = mailer.sent.lock().unwrap();
        assert_eq!(sent[0].file_name, "demo_clip.mp4.json");
        assert_eq!(sent[0].content, b"[]");
    }

    #[tokio::test]
    async fn test_deliver_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let mailer = RecordingMailer::default();
        let err = deliver(&mailer, &dir.path().join("gone.json")).await.unwrap_err();
        assert!(matches!(err, MailError::Attachment(_)));
        assert!(mailer.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_notify_delivers_in_background() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.mp4.json");
        std::fs::write(&path, b"[1]").unwrap();

        let mailer = Arc::new(RecordingMailer::default());
        let notifier = Notifier::spawn(mailer.clone(), 4);
        notifier.notify(&path);

        wait_for_sends(&mailer, 1).await;
        assert_eq!(mailer.sent.lock().unwrap()[0].content, b"[1]");
    }

    #[tokio::test]
    async fn test_failed_send_keeps_worker_alive() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.mp4.json");
        std::fs::write(&path, b"[]").unwrap();

        let mailer = Arc::new(RecordingMailer {
            fail: true,
            ..Default::default()
        });
        let notifier = Notifier::spawn(mailer.clone(), 4);
        notifier.notify(&path);
        notifier.notify(&path);

        wait_for_sends(&mailer, 2).await;
    }

    #[test]
    fn test_disabled_notifier_is_noop() {
        let notifier = Notifier::disabled();
        assert!(!notifier.is_enabled());
        notifier.notify(Path::new("/nonexistent.json"));
    }

    #[test]
    fn test_build_message_has_subject_and_attachment() {
        let mail = ArtifactMail {
            file_name: "demo_clip.mp4.json".into(),
            content: b"[]".to_vec(),
        };
        let message = build_message(
            "sender@example.com".parse().unwrap(),
            "ops@example.com".parse().unwrap(),
            mail,
        )
        .unwrap();

        let raw = String::from_utf8(message.formatted()).unwrap();
        assert!(raw.contains("demo_clip.mp4.json"));
        assert!(raw.contains("application/json"));
        assert!(raw.contains(MAIL_BODY));
    }

    #[tokio::test]
    async fn test_smtp_mailer_builds_starttls_transport() {
        let config = MailConfig {
            sender: "sender@example.com".to_string(),
            recipient: "ops@example.com".to_string(),
            password: "secret".to_string(),
            smtp_host: "smtp.example.com".to_string(),
            smtp_port: 587,
            queue_size: 4,
        };

        let mailer = SmtpMailer::new(&config).unwrap();
        assert_eq!(mailer.to, "ops@example.com".parse::<Mailbox>().unwrap());

        let bad_sender = MailConfig {
            sender: "not an address".to_string(),
            ..config
        };
        assert!(matches!(
            SmtpMailer::new(&bad_sender),
            Err(MailError::Address(_))
        ));
    }
}
