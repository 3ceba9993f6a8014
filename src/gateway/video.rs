use super::client::{Auth, GatewayHttpClient};
use super::types::{OperationResponse, PredictLongRunningRequest, VideoInstance, VideoParameters};
use super::{model_id, VideoBackend, GEMINI_PREFIX};
use crate::config::GatewayConfig;
use crate::models::VideoRequest;
use crate::Result;
use async_trait::async_trait;

/// Raw `predictLongRunning` / operation status / download calls.
pub struct VideoClient {
    http: GatewayHttpClient,
}

impl VideoClient {
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
impl VideoBackend for VideoClient {
    async fn initiate(&self, request: &VideoRequest) -> Result<OperationResponse> {
        let path = format!(
            "{}/models/{}:predictLongRunning",
            GEMINI_PREFIX,
            model_id(&request.model)
        );
        let body = PredictLongRunningRequest {
            instances: vec![VideoInstance {
                prompt: request.prompt.clone(),
                image: request.reference_image.clone(),
            }],
            parameters: VideoParameters {
                negative_prompt: request.negative_prompt.clone(),
                aspect_ratio: request.aspect_ratio.clone(),
                resolution: request.resolution.clone(),
                person_generation: request.person_generation.clone(),
            },
        };

        self.http.post_json(&path, Auth::ApiKeyHeader, &body).await
    }

    async fn fetch_status(&self, operation_name: &str) -> Result<OperationResponse> {
        let path = format!("{}/{}", GEMINI_PREFIX, operation_name.trim_start_matches('/'));
        self.http.get_json(&path, Auth::ApiKeyHeader).await
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>> {
        self.http.get_bytes(url, Auth::ApiKeyHeader).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::test_support::config_for;
    use crate::models::ReferenceImage;
    use crate::Error;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_initiate_sends_instances_and_parameters() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/gemini/v1beta/models/veo-3.0-generate-001:predictLongRunning"))
            .and(header("x-goog-api-key", "key"))
            .and(body_json(serde_json::json!({
                "instances": [{
                    "prompt": "Make this tiny cowboy even smaller.",
                    "image": { "bytesBase64Encoded": "AQID", "mimeType": "image/png" }
                }],
                "parameters": {
                    "negativePrompt": "",
                    "aspectRatio": "16:9",
                    "resolution": "720p",
                    "personGeneration": "allow_all"
                }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "name": "models/veo-3.0-generate-001/operations/op123"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = VideoClient::new(&config_for(&server, "key")).unwrap();
        let request = VideoRequest::new("Make this tiny cowboy even smaller.")
            .with_reference_image(ReferenceImage::from_bytes(&[1, 2, 3], "image/png"));

        let operation = client.initiate(&request).await.unwrap();
        assert_eq!(
            operation.name.as_deref(),
            Some("models/veo-3.0-generate-001/operations/op123")
        );
    }

    #[tokio::test]
    async fn test_fetch_status_uses_operation_name_path() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/gemini/v1beta/models/veo/operations/op123"))
            .and(header("x-goog-api-key", "key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "name": "models/veo/operations/op123",
                "done": false
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = VideoClient::new(&config_for(&server, "key")).unwrap();
        let status = client
            .fetch_status("models/veo/operations/op123")
            .await
            .unwrap();
        assert_eq!(status.done, Some(false));
    }

    #[tokio::test]
    async fn test_download_returns_raw_bytes() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/gemini/download/v1beta/files/xyz"))
            .and(header("x-goog-api-key", "key"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0x00, 0x00, 0x00, 0x18]))
            .expect(1)
            .mount(&server)
            .await;

        let client = VideoClient::new(&config_for(&server, "key")).unwrap();
        let url = format!("{}/gemini/download/v1beta/files/xyz", server.uri());
        let bytes = client.download(&url).await.unwrap();
        assert_eq!(bytes, vec![0x00, 0x00, 0x00, 0x18]);
    }

    #[tokio::test]
    async fn test_download_error_is_transport() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/gemini/download/v1beta/files/xyz"))
            .respond_with(ResponseTemplate::new(404).set_body_string("file not found"))
            .mount(&server)
            .await;

        let client = VideoClient::new(&config_for(&server, "key")).unwrap();
        let url = format!("{}/gemini/download/v1beta/files/xyz", server.uri());
        let err = client.download(&url).await.unwrap_err();
        assert!(matches!(err, Error::Transport { status: 404, .. }));
    }
}
