use super::client::{Auth, GatewayHttpClient};
use super::types::{
    Content, GenerateContentResponse, Part, SpeechConfig, SpeechGenerationConfig,
    SpeechRequestBody,
};
use super::{model_id, SpeechService, GEMINI_PREFIX};
use crate::config::GatewayConfig;
use crate::models::SpeechRequest;
use crate::{Error, Result};
use async_trait::async_trait;

pub struct SpeechClient {
    http: GatewayHttpClient,
}

impl SpeechClient {
    pub fn new(config: &GatewayConfig) -> Result<Self> {
        Self::new_with_client(config, reqwest::Client::new())
    }

    pub fn new_with_client(config: &GatewayConfig, client: reqwest::Client) -> Result<Self> {
        Ok(Self {
            http: GatewayHttpClient::new_with_client(config, client)?,
        })
    }

    fn build_body(request: &SpeechRequest) -> SpeechRequestBody {
        SpeechRequestBody {
            contents: vec![Content {
                role: None,
                parts: vec![Part::Text {
                    text: request.text.clone(),
                }],
            }],
            generation_config: SpeechGenerationConfig {
                response_modalities: vec!["AUDIO".to_string()],
                speech_config: SpeechConfig::from(&request.voices),
            },
        }
    }
}

#[async_trait]
impl SpeechService for SpeechClient {
    async fn generate_speech(&self, request: &SpeechRequest) -> Result<String> {
        let path = format!(
            "{}/models/{}:generateContent",
            GEMINI_PREFIX,
            model_id(&request.model)
        );

        let response: GenerateContentResponse = self
            .http
            .post_json(&path, Auth::ApiKeyHeader, &Self::build_body(request))
            .await?;

        let candidate = response
            .candidates
            .unwrap_or_default()
            .into_iter()
            .next()
            .ok_or_else(|| Error::EmptyResponse("No candidates in speech response".to_string()))?;

        let (mime_type, data) = candidate
            .content
            .and_then(|content| {
                content.parts.into_iter().find_map(|part| match part {
                    Part::InlineData { inline_data } => inline_data
                        .data
                        .filter(|data| !data.is_empty())
                        .map(|data| (inline_data.mime_type, data)),
                    Part::Text { .. } => None,
                })
            })
            .ok_or_else(|| Error::EmptyResponse("No inline audio in speech response".to_string()))?;

        tracing::debug!("Speech returned audio with mime_type: {}", mime_type);
        Ok(data)
    }
}
