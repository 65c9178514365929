//! Bounded polling for uploaded videos.
//!
//! The analysis service processes uploads asynchronously. The caller checks
//! back at a fixed interval until the video is ready or has failed, and gives
//! up after a configurable deadline.

use std::time::{Duration, Instant};

use scenespot_models::AnalysisState;
use tracing::{debug, info};

use crate::error::{MlError, MlResult};
use crate::service::{AnalysisService, RemoteVideo};

/// Polling behavior while waiting for an upload to finish processing.
#[derive(Debug, Clone)]
pub struct PollPolicy {
    /// Delay between state checks.
    pub interval: Duration,
    /// Total time to wait before giving up.
    pub timeout: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            timeout: Duration::from_secs(600),
        }
    }
}

impl PollPolicy {
    pub fn new(interval: Duration, timeout: Duration) -> Self {
        Self { interval, timeout }
    }
}

/// Wait until `video` reaches a terminal state.
///
/// Returns the ready video, [`MlError::AnalysisFailed`] if the service
/// reports failure, or [`MlError::Timeout`] once `policy.timeout` elapses.
pub async fn wait_until_ready(
    service: &dyn AnalysisService,
    video: RemoteVideo,
    policy: &PollPolicy,
) -> MlResult<RemoteVideo> {
    let started = Instant::now();
    let mut current = video;
    let mut checks = 0u32;

    loop {
        match current.state {
            AnalysisState::Succeeded => {
                info!(
                    video = %current.name,
                    checks,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Video ready for analysis"
                );
                return Ok(current);
            }
            AnalysisState::Failed => {
                return Err(MlError::analysis_failed(format!(
                    "service reported FAILED for {}",
                    current.name
                )));
            }
            AnalysisState::Processing => {}
        }

        if started.elapsed() >= policy.timeout {
            return Err(MlError::Timeout(policy.timeout));
        }

        tokio::time::sleep(policy.interval).await;
        checks += 1;
        current = service.get_video(&current.name).await?;
        debug!(video = %current.name, state = %current.state, checks, "Polled video state");
    }
}
