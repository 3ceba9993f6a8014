use super::client::{Auth, GatewayHttpClient};
use super::types::{ImageGenerationRequest, ImageGenerationResponse};
use super::ImageService;
use crate::config::GatewayConfig;
use crate::models::ImageRequest;
use crate::{Error, Result};
use async_trait::async_trait;

pub struct ImageClient {
    http: GatewayHttpClient,
}

impl ImageClient {
    pub fn new(config: &GatewayConfig) -> Result<Self> {
        Self::new_with_client(config, reqwest::Client::new())
    }

    pub fn new_with_client(config: &GatewayConfig, client: reqwest::Client) -> Result<Self> {
        Ok(Self {
            http: GatewayHttpClient::new_with_client(config, client)?,
        })
    }
}

#[async_trait]
impl ImageService for ImageClient {
    async fn generate_image(&self, request: &ImageRequest) -> Result<String> {
        let body = ImageGenerationRequest {
            prompt: request.prompt.clone(),
            model: request.model.clone(),
            n: request.count,
            aspect_ratio: request.aspect_ratio.clone(),
        };

        let response: ImageGenerationResponse = self
            .http
            .post_json("/images/generations", Auth::Bearer, &body)
            .await?;

        response
            .data
            .unwrap_or_default()
            .into_iter()
            .next()
            .and_then(|image| image.b64_json)
            .ok_or_else(|| Error::EmptyResponse("No image data in response".to_string()))
    }
}
