//! Gateway integration for text, image, speech and video generation
//!
//! Each content kind has a thin client that builds one typed payload, sends it
//! through [`GatewayHttpClient`], and pulls the expected field out of the reply.
//! Video only exposes the raw phases; the poll loop lives in [`crate::operation`].

pub mod client;
pub mod image;
pub mod mock;
pub mod speech;
pub mod text;
pub mod types;
pub mod video;

pub use client::{Auth, GatewayHttpClient};
pub use image::ImageClient;
pub use mock::MockGateway;
pub use speech::SpeechClient;
pub use text::TextClient;
pub use types::OperationResponse;
pub use video::VideoClient;

use crate::models::{ImageRequest, SpeechRequest, TextRequest, VideoRequest};
use crate::Result;
use async_trait::async_trait;

/// Path prefix of the Gemini-compatible endpoints on the gateway.
pub const GEMINI_PREFIX: &str = "/gemini/v1beta";

#[async_trait]
pub trait TextService: Send + Sync {
    async fn generate_text(&self, request: &TextRequest) -> Result<String>;
}

/// Returns the base64 payload of the first generated image.
#[async_trait]
pub trait ImageService: Send + Sync {
    async fn generate_image(&self, request: &ImageRequest) -> Result<String>;
}

/// Returns the base64 inline audio of the first candidate.
#[async_trait]
pub trait SpeechService: Send + Sync {
    async fn generate_speech(&self, request: &SpeechRequest) -> Result<String>;
}

/// The three gateway calls behind a video generation.
#[async_trait]
pub trait VideoBackend: Send + Sync {
    async fn initiate(&self, request: &VideoRequest) -> Result<OperationResponse>;
    async fn fetch_status(&self, operation_name: &str) -> Result<OperationResponse>;
    async fn download(&self, url: &str) -> Result<Vec<u8>>;
}

/// Bare model id without a `models/` prefix.
pub(crate) fn model_id(model: &str) -> &str {
    model.strip_prefix("models/").unwrap_or(model)
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::config::GatewayConfig;
    use wiremock::MockServer;

    pub fn config_for(server: &MockServer, api_key: &str) -> GatewayConfig {
        GatewayConfig::new(api_key).with_base_url(server.uri())
    }
}
