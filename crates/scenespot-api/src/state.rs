//! Application state.

use std::sync::Arc;

use scenespot_ml_client::{
    AnalysisService, GeminiClient, GeminiConfig, GroqClient, GroqConfig, ReasoningService,
};
use scenespot_storage::ArtifactStore;
use tracing::{info, warn};

use crate::config::{mask_secret, ApiConfig};
use crate::services::{MailConfig, Notifier, QueryAnswerer, SceneIndexer, SmtpMailer};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub store: ArtifactStore,
    pub indexer: Arc<SceneIndexer>,
    pub answerer: Arc<QueryAnswerer>,
}

impl AppState {
    /// Create application state with the production AI clients and mailer.
    pub async fn new(
        config: ApiConfig,
        gemini: GeminiConfig,
        groq: GroqConfig,
        mail: Option<MailConfig>,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let gemini_key = mask_secret(&gemini.api_key);
        let groq_key = mask_secret(&groq.api_key);

        let analysis = Arc::new(GeminiClient::new(gemini)?);
        let reasoning = Arc::new(GroqClient::new(groq)?);
        info!("Gemini: model={}, key={}", analysis.model(), gemini_key);
        info!("Groq: model={}, key={}", reasoning.model(), groq_key);

        let notifier = match mail {
            Some(mail) => match SmtpMailer::new(&mail) {
                Ok(mailer) => Notifier::spawn(Arc::new(mailer), mail.queue_size),
                Err(e) => {
                    warn!("Invalid mail settings, artifact mail disabled: {}", e);
                    Notifier::disabled()
                }
            },
            None => {
                info!("Mail credentials not set, artifact mail disabled");
                Notifier::disabled()
            }
        };

        Self::with_services(config, analysis, reasoning, notifier).await
    }

    /// Create application state around the given services.
    pub async fn with_services(
        config: ApiConfig,
        analysis: Arc<dyn AnalysisService>,
        reasoning: Arc<dyn ReasoningService>,
        notifier: Notifier,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let store = ArtifactStore::new(&config.artifact_dir);
        store.ensure_dir().await?;

        let indexer = SceneIndexer::new(
            store.clone(),
            analysis,
            notifier,
            config.poll_policy(),
            config.upload_temp_dir.clone(),
            config.cache_key_policy,
        );
        let answerer = QueryAnswerer::new(store.clone(), reasoning);

        Ok(Self {
            config,
            store,
            indexer: Arc::new(indexer),
            answerer: Arc::new(answerer),
        })
    }
}
