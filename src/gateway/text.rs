use super::client::{Auth, GatewayHttpClient};
use super::types::{ChatCompletionRequest, ChatCompletionResponse, ChatMessage};
use super::TextService;
use crate::config::GatewayConfig;
use crate::models::TextRequest;
use crate::{Error, Result};
use async_trait::async_trait;

pub struct TextClient {
    http: GatewayHttpClient,
}

impl TextClient {
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
impl TextService for TextClient {
    async fn generate_text(&self, request: &TextRequest) -> Result<String> {
        let body = ChatCompletionRequest {
            model: request.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: request.system_prompt.clone(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: request.prompt.clone(),
                },
            ],
        };

        let response: ChatCompletionResponse = self
            .http
            .post_json("/chat/completions", Auth::Bearer, &body)
            .await?;

        response
            .choices
            .unwrap_or_default()
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .ok_or_else(|| Error::EmptyResponse("No choices in chat completion response".to_string()))
    }
}
