use super::types::{
    GenerateVideoResponse, GeneratedSample, OperationError, OperationResponse, OperationResult,
    VideoFile,
};
use super::{ImageService, SpeechService, TextService, VideoBackend};
use crate::models::{ImageRequest, SpeechRequest, TextRequest, VideoRequest};
use crate::{Error, Result};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

pub const MOCK_OPERATION_NAME: &str = "models/mock-video/operations/mock-op";
pub const MOCK_VIDEO_URI: &str = "https://generativelanguage.googleapis.com/v1beta/files/mock-video";

/// One call received by [`MockGateway`], in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayCall {
    Text(String),
    Image(String),
    Speech(String),
    Initiate(String),
    Status(String),
    Download(String),
}

/// Which gateway call a scripted failure applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Text,
    Image,
    Speech,
    Initiate,
    Status,
    Download,
}

pub fn pending_operation(name: &str) -> OperationResponse {
    OperationResponse {
        name: Some(name.to_string()),
        done: Some(false),
        ..Default::default()
    }
}

pub fn completed_operation(name: &str, uri: &str) -> OperationResponse {
    OperationResponse {
        name: Some(name.to_string()),
        done: Some(true),
        response: Some(OperationResult {
            generate_video_response: Some(GenerateVideoResponse {
                generated_samples: Some(vec![GeneratedSample {
                    video: Some(VideoFile {
                        uri: Some(uri.to_string()),
                    }),
                }]),
            }),
        }),
        error: None,
    }
}

pub fn failed_operation(name: &str, message: &str) -> OperationResponse {
    OperationResponse {
        name: Some(name.to_string()),
        done: Some(true),
        response: None,
        error: Some(OperationError {
            code: Some(3),
            message: Some(message.to_string()),
        }),
    }
}

/// Scripted in-memory gateway that records every call it receives.
///
/// Clones share state, so a clone kept by a test can inspect calls made
/// through the copy handed to the code under test.
#[derive(Clone, Default)]
pub struct MockGateway {
    text_response: Arc<Mutex<Option<String>>>,
    image_response: Arc<Mutex<Option<String>>>,
    speech_response: Arc<Mutex<Option<String>>>,
    initiate_response: Arc<Mutex<Option<OperationResponse>>>,
    status_responses: Arc<Mutex<VecDeque<OperationResponse>>>,
    download_response: Arc<Mutex<Option<Vec<u8>>>>,
    failures: Arc<Mutex<HashMap<Phase, u16>>>,
    calls: Arc<Mutex<Vec<GatewayCall>>>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text_response(self, text: impl Into<String>) -> Self {
        *self.text_response.lock().unwrap() = Some(text.into());
        self
    }

    pub fn with_image_response(self, b64: impl Into<String>) -> Self {
        *self.image_response.lock().unwrap() = Some(b64.into());
        self
    }

    pub fn with_speech_response(self, b64: impl Into<String>) -> Self {
        *self.speech_response.lock().unwrap() = Some(b64.into());
        self
    }

    pub fn with_initiate_response(self, operation: OperationResponse) -> Self {
        *self.initiate_response.lock().unwrap() = Some(operation);
        self
    }

    /// Queue a status reply. The last queued reply repeats once the queue drains.
    pub fn with_status_response(self, operation: OperationResponse) -> Self {
        self.status_responses.lock().unwrap().push_back(operation);
        self
    }

    pub fn with_download_response(self, bytes: Vec<u8>) -> Self {
        *self.download_response.lock().unwrap() = Some(bytes);
        self
    }

    /// Make every call of `phase` fail with a non-2xx status.
    pub fn failing(self, phase: Phase, status: u16) -> Self {
        self.failures.lock().unwrap().insert(phase, status);
        self
    }

    pub fn calls(&self) -> Vec<GatewayCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, phase: Phase) -> usize {
        self.calls()
            .iter()
            .filter(|call| {
                matches!(
                    (phase, call),
                    (Phase::Text, GatewayCall::Text(_))
                        | (Phase::Image, GatewayCall::Image(_))
                        | (Phase::Speech, GatewayCall::Speech(_))
                        | (Phase::Initiate, GatewayCall::Initiate(_))
                        | (Phase::Status, GatewayCall::Status(_))
                        | (Phase::Download, GatewayCall::Download(_))
                )
            })
            .count()
    }

    fn record(&self, phase: Phase, call: GatewayCall) -> Result<()> {
        self.calls.lock().unwrap().push(call);
        match self.failures.lock().unwrap().get(&phase) {
            Some(status) => Err(Error::Transport {
                status: *status,
                body: format!("mock {:?} failure", phase),
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl TextService for MockGateway {
    async fn generate_text(&self, request: &TextRequest) -> Result<String> {
        self.record(Phase::Text, GatewayCall::Text(request.prompt.clone()))?;
        Ok(self
            .text_response
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| format!("Mock response to: {}", request.prompt)))
    }
}

#[async_trait]
impl ImageService for MockGateway {
    async fn generate_image(&self, request: &ImageRequest) -> Result<String> {
        self.record(Phase::Image, GatewayCall::Image(request.prompt.clone()))?;
        // Default: base64 of the 8-byte PNG signature.
        Ok(self
            .image_response
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| "iVBORw0KGgo=".to_string()))
    }
}

#[async_trait]
impl SpeechService for MockGateway {
    async fn generate_speech(&self, request: &SpeechRequest) -> Result<String> {
        self.record(Phase::Speech, GatewayCall::Speech(request.text.clone()))?;
        Ok(self
            .speech_response
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| "UklGRg==".to_string()))
    }
}

#[async_trait]
impl VideoBackend for MockGateway {
    async fn initiate(&self, request: &VideoRequest) -> Result<OperationResponse> {
        self.record(Phase::Initiate, GatewayCall::Initiate(request.prompt.clone()))?;
        Ok(self
            .initiate_response
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| pending_operation(MOCK_OPERATION_NAME)))
    }

    async fn fetch_status(&self, operation_name: &str) -> Result<OperationResponse> {
        self.record(Phase::Status, GatewayCall::Status(operation_name.to_string()))?;
        let mut queue = self.status_responses.lock().unwrap();
        let next = if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        };
        Ok(next.unwrap_or_else(|| completed_operation(operation_name, MOCK_VIDEO_URI)))
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>> {
        self.record(Phase::Download, GatewayCall::Download(url.to_string()))?;
        Ok(self
            .download_response
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| vec![0x00, 0x00, 0x00, 0x18, 0x66, 0x74, 0x79, 0x70]))
    }
}
