//! Long-running operation workflow for video generation
//!
//! A video job goes through three gateway phases: one initiate call that
//! returns an operation handle, repeated status checks until the operation
//! reports `done`, and one download of the finished file. Any failed call ends
//! the workflow where it stands.

use crate::config::Config;
use crate::gateway::{OperationResponse, VideoBackend};
use crate::models::VideoRequest;
use crate::{Error, Result};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Timing limits for the status loop.
///
/// With both caps unset the loop only ends when the operation reports `done`
/// or a call fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    /// Maximum number of status checks.
    pub max_polls: Option<u32>,
    /// Maximum time spent polling, measured from the first status check.
    pub deadline: Option<Duration>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(crate::config::DEFAULT_POLL_INTERVAL_SECS),
            max_polls: None,
            deadline: None,
        }
    }
}

impl PollPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            interval: config.poll_interval,
            max_polls: config.max_polls,
            deadline: config.poll_timeout,
        }
    }
}

/// Maps the gateway-origin result URI onto the client's download endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UriRewrite {
    from: String,
    to: String,
}

impl UriRewrite {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.download_source_prefix.clone(),
            config.gateway.download_prefix(),
        )
    }

    /// URIs that do not start with the source prefix are returned unchanged.
    pub fn apply(&self, uri: &str) -> String {
        match uri.strip_prefix(&self.from) {
            Some(rest) => format!("{}{}", self.to, rest),
            None => uri.to_string(),
        }
    }
}

/// Client-side view of an in-flight gateway operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LongRunningOperation {
    name: String,
    done: bool,
    result_uri: Option<String>,
    error: Option<String>,
}

impl LongRunningOperation {
    /// Builds the operation from the initiate reply; a reply without a handle is an error.
    pub fn start(initial: OperationResponse) -> Result<Self> {
        let name = initial
            .name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .ok_or_else(|| {
                Error::Initiation("Could not get operation name from the initial response".into())
            })?
            .to_string();

        let mut operation = Self {
            name,
            done: false,
            result_uri: None,
            error: None,
        };
        operation.refresh(&initial);
        Ok(operation)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn result_uri(&self) -> Option<&str> {
        self.result_uri.as_deref()
    }

    fn refresh(&mut self, status: &OperationResponse) {
        self.done = status.done.unwrap_or(false);
        self.result_uri = status.result_uri().map(str::to_string);
        self.error = status.error.as_ref().map(|e| {
            e.message
                .clone()
                .unwrap_or_else(|| format!("operation error code {:?}", e.code))
        });
    }

    fn completed_uri(&self) -> Result<&str> {
        if let Some(uri) = self.result_uri() {
            return Ok(uri);
        }
        Err(Error::MalformedResult(match &self.error {
            Some(message) => format!("operation {} finished with error: {}", self.name, message),
            None => format!("could not find download URI in operation {}", self.name),
        }))
    }
}

/// Bytes of a finished video plus how much polling it took.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedVideo {
    pub bytes: Vec<u8>,
    pub status_checks: u32,
    pub wait_cycles: u32,
}

/// Drives initiate → poll → download against a [`VideoBackend`].
pub struct VideoPoller<'a> {
    backend: &'a dyn VideoBackend,
    policy: PollPolicy,
    rewrite: UriRewrite,
}

impl<'a> VideoPoller<'a> {
    pub fn new(backend: &'a dyn VideoBackend, policy: PollPolicy, rewrite: UriRewrite) -> Self {
        Self {
            backend,
            policy,
            rewrite,
        }
    }

    pub async fn run(&self, request: &VideoRequest) -> Result<CompletedVideo> {
        info!("Step 1: Initiating video generation (model: {})", request.model);
        let initial = self.backend.initiate(request).await?;
        let mut operation = LongRunningOperation::start(initial)?;
        info!("Successfully initiated. Operation name: {}", operation.name());

        let started = Instant::now();
        let mut status_checks = 0u32;
        let mut wait_cycles = 0u32;

        while !operation.is_done() {
            if let Some(max) = self.policy.max_polls {
                if status_checks >= max {
                    warn!("Operation {} still running after {} checks", operation.name(), max);
                    return Err(Error::PollLimit(max));
                }
            }

            if status_checks > 0 {
                if let Some(deadline) = self.policy.deadline {
                    if started.elapsed() >= deadline {
                        warn!("Operation {} still running after {:?}", operation.name(), deadline);
                        return Err(Error::PollTimeout(deadline));
                    }
                }
                info!(
                    "Generation in progress, waiting {}s...",
                    self.policy.interval.as_secs_f32()
                );
                tokio::time::sleep(self.policy.interval).await;
                wait_cycles += 1;
            }

            info!("Step 2: Checking generation status...");
            let status = self.backend.fetch_status(operation.name()).await?;
            status_checks += 1;
            operation.refresh(&status);
            debug!(
                operation = %operation.name(),
                done = operation.is_done(),
                status_checks,
                "status fetched"
            );
        }

        let uri = operation.completed_uri()?;
        info!("Generation complete!");

        let url = self.rewrite.apply(uri);
        if !(url.starts_with("https://") || url.starts_with("http://")) {
            return Err(Error::Download(format!(
                "result URI is not downloadable over HTTP: {}",
                url
            )));
        }

        info!("Step 3: Downloading video from {}", url);
        let bytes = self.backend.download(&url).await?;
        if bytes.is_empty() {
            return Err(Error::Download(format!("empty body from {}", url)));
        }
        info!("Download successful ({} bytes)", bytes.len());

        Ok(CompletedVideo {
            bytes,
            status_checks,
            wait_cycles,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::mock::{
        completed_operation, failed_operation, pending_operation, GatewayCall, MockGateway, Phase,
    };
    use pretty_assertions::assert_eq;

    const OP: &str = "models/veo-3.0-generate-001/operations/op123";
    const GOOGLE_URI: &str = "https://generativelanguage.googleapis.com/v1beta/files/xyz";
    const GATEWAY_URL: &str = "https://api.thucchien.ai/gemini/download/v1beta/files/xyz";

    fn fast_policy() -> PollPolicy {
        PollPolicy {
            interval: Duration::from_millis(1),
            max_polls: None,
            deadline: None,
        }
    }

    fn rewrite() -> UriRewrite {
        UriRewrite::new(
            "https://generativelanguage.googleapis.com/",
            "https://api.thucchien.ai/gemini/download/",
        )
    }

    async fn run(gateway: &MockGateway, policy: PollPolicy) -> Result<CompletedVideo> {
        VideoPoller::new(gateway, policy, rewrite())
            .run(&VideoRequest::new("a cowboy"))
            .await
    }

    #[test]
    fn test_uri_rewrite() {
        assert_eq!(rewrite().apply(GOOGLE_URI), GATEWAY_URL);
        assert_eq!(
            rewrite().apply("https://cdn.example.com/video.mp4"),
            "https://cdn.example.com/video.mp4"
        );
    }

    #[test]
    fn test_start_rejects_blank_name() {
        let mut initial = pending_operation(OP);
        initial.name = Some("   ".to_string());
        assert!(matches!(
            LongRunningOperation::start(initial),
            Err(Error::Initiation(_))
        ));
    }

    #[tokio::test]
    async fn test_two_waits_then_one_download() {
        let gateway = MockGateway::new()
            .with_initiate_response(pending_operation(OP))
            .with_status_response(pending_operation(OP))
            .with_status_response(pending_operation(OP))
            .with_status_response(completed_operation(OP, GOOGLE_URI))
            .with_download_response(vec![1, 2, 3]);

        let video = run(&gateway, fast_policy()).await.unwrap();

        assert_eq!(video.bytes, vec![1, 2, 3]);
        assert_eq!(video.status_checks, 3);
        assert_eq!(video.wait_cycles, 2);
        assert_eq!(
            gateway.calls(),
            vec![
                GatewayCall::Initiate("a cowboy".to_string()),
                GatewayCall::Status(OP.to_string()),
                GatewayCall::Status(OP.to_string()),
                GatewayCall::Status(OP.to_string()),
                GatewayCall::Download(GATEWAY_URL.to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_missing_operation_name_is_initiation_failure() {
        let gateway = MockGateway::new().with_initiate_response(OperationResponse::default());

        let err = run(&gateway, fast_policy()).await.unwrap_err();

        assert!(matches!(err, Error::Initiation(_)));
        assert_eq!(gateway.count(Phase::Status), 0);
        assert_eq!(gateway.count(Phase::Download), 0);
    }

    #[tokio::test]
    async fn test_done_without_uri_is_malformed_result() {
        let mut done = pending_operation(OP);
        done.done = Some(true);
        let gateway = MockGateway::new().with_status_response(done);

        let err = run(&gateway, fast_policy()).await.unwrap_err();

        assert!(matches!(err, Error::MalformedResult(_)));
        assert_eq!(gateway.count(Phase::Status), 1);
        assert_eq!(gateway.count(Phase::Download), 0);
    }

    #[tokio::test]
    async fn test_done_with_error_payload_stops_polling() {
        let gateway = MockGateway::new()
            .with_status_response(pending_operation(OP))
            .with_status_response(failed_operation(OP, "prompt blocked"));

        let err = run(&gateway, fast_policy()).await.unwrap_err();

        match err {
            Error::MalformedResult(message) => assert!(message.contains("prompt blocked")),
            other => panic!("expected malformed result, got {:?}", other),
        }
        assert_eq!(gateway.count(Phase::Status), 2);
        assert_eq!(gateway.count(Phase::Download), 0);
    }

    #[tokio::test]
    async fn test_initiate_http_error_halts_workflow() {
        let gateway = MockGateway::new().failing(Phase::Initiate, 400);

        let err = run(&gateway, fast_policy()).await.unwrap_err();

        assert!(err.is_transport());
        assert_eq!(gateway.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_status_http_error_halts_workflow() {
        let gateway = MockGateway::new().failing(Phase::Status, 500);

        let err = run(&gateway, fast_policy()).await.unwrap_err();

        assert!(matches!(err, Error::Transport { status: 500, .. }));
        assert_eq!(gateway.count(Phase::Status), 1);
        assert_eq!(gateway.count(Phase::Download), 0);
    }

    #[tokio::test]
    async fn test_download_http_error_is_transport() {
        let gateway = MockGateway::new().failing(Phase::Download, 403);

        let err = run(&gateway, fast_policy()).await.unwrap_err();

        assert!(matches!(err, Error::Transport { status: 403, .. }));
        assert_eq!(gateway.count(Phase::Download), 1);
    }

    #[tokio::test]
    async fn test_empty_download_is_download_failure() {
        let gateway = MockGateway::new().with_download_response(Vec::new());

        let err = run(&gateway, fast_policy()).await.unwrap_err();
        assert!(matches!(err, Error::Download(_)));
    }

    #[tokio::test]
    async fn test_gcs_uri_is_download_failure_without_request() {
        let gateway = MockGateway::new()
            .with_status_response(completed_operation(OP, "gs://bucket/video.mp4"));

        let err = run(&gateway, fast_policy()).await.unwrap_err();

        assert!(matches!(err, Error::Download(_)));
        assert_eq!(gateway.count(Phase::Download), 0);
    }

    #[tokio::test]
    async fn test_max_polls_caps_status_checks() {
        let gateway = MockGateway::new().with_status_response(pending_operation(OP));
        let policy = PollPolicy {
            max_polls: Some(4),
            ..fast_policy()
        };

        let err = run(&gateway, policy).await.unwrap_err();

        assert!(matches!(err, Error::PollLimit(4)));
        assert_eq!(gateway.count(Phase::Status), 4);
        assert_eq!(gateway.count(Phase::Download), 0);
    }

    #[tokio::test]
    async fn test_deadline_stops_polling() {
        let gateway = MockGateway::new().with_status_response(pending_operation(OP));
        let policy = PollPolicy {
            interval: Duration::from_millis(5),
            max_polls: None,
            deadline: Some(Duration::from_millis(20)),
        };

        let err = run(&gateway, policy).await.unwrap_err();

        assert!(matches!(err, Error::PollTimeout(_)));
        assert!(gateway.count(Phase::Status) >= 1);
        assert_eq!(gateway.count(Phase::Download), 0);
    }

    #[tokio::test]
    async fn test_operation_done_at_initiation_skips_polling() {
        let gateway = MockGateway::new()
            .with_initiate_response(completed_operation(OP, GOOGLE_URI));

        let video = run(&gateway, fast_policy()).await.unwrap();

        assert_eq!(video.status_checks, 0);
        assert_eq!(video.wait_cycles, 0);
        assert_eq!(gateway.count(Phase::Status), 0);
        assert_eq!(gateway.count(Phase::Download), 1);
    }
}
