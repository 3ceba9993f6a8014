use crate::config::GatewayConfig;
use crate::{Error, Result};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

/// How the API key is attached to a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Auth {
    /// `Authorization: Bearer <key>` (chat and image endpoints).
    Bearer,
    /// Key in the configured header (Gemini-style endpoints).
    ApiKeyHeader,
}

/// Authenticated REST client shared by the text, image, speech and video modules.
#[derive(Clone)]
pub struct GatewayHttpClient {
    client: Client,
    api_key: String,
    api_key_header: String,
    base_url: String,
    timeout: Duration,
}

impl GatewayHttpClient {
    pub fn new(config: &GatewayConfig) -> Result<Self> {
        Self::new_with_client(config, Client::new())
    }

    /// Fails with [`Error::Configuration`] when the key is missing, before any request is made.
    pub fn new_with_client(config: &GatewayConfig, client: Client) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            api_key_header: config.api_key_header.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout: config.timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, builder: RequestBuilder, auth: Auth) -> RequestBuilder {
        match auth {
            Auth::Bearer => builder.bearer_auth(&self.api_key),
            Auth::ApiKeyHeader => builder.header(self.api_key_header.as_str(), &self.api_key),
        }
    }

    async fn send(&self, builder: RequestBuilder, auth: Auth) -> Result<Response> {
        let response = self
            .authorize(builder, auth)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to send request to gateway: {}", e);
                e
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!("Gateway error (status {}): {}", status, body);
            return Err(Error::Transport {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response)
    }

    async fn parse<Resp: DeserializeOwned>(response: Response) -> Result<Resp> {
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            tracing::error!("Failed to parse gateway response: {}\nBody: {}", e, body);
            Error::Serialization(e)
        })
    }

    pub async fn post_json<Req: Serialize, Resp: DeserializeOwned>(
        &self,
        path: &str,
        auth: Auth,
        request: &Req,
    ) -> Result<Resp> {
        let url = self.url(path);
        tracing::debug!("POST {}", url);
        let builder = self.client.post(&url).json(request);
        let response = self.send(builder, auth).await?;
        Self::parse(response).await
    }

    pub async fn get_json<Resp: DeserializeOwned>(&self, path: &str, auth: Auth) -> Result<Resp> {
        let url = self.url(path);
        tracing::debug!("GET {}", url);
        let response = self.send(self.client.get(&url), auth).await?;
        Self::parse(response).await
    }

    /// Fetches raw bytes from an absolute URL.
    pub async fn get_bytes(&self, url: &str, auth: Auth) -> Result<Vec<u8>> {
        tracing::debug!("GET {}", url);
        let response = self.send(self.client.get(url), auth).await?;
        Ok(response.bytes().await?.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn make_client(server: &MockServer, api_key: &str) -> GatewayHttpClient {
        let config = GatewayConfig::new(api_key).with_base_url(server.uri());
        GatewayHttpClient::new(&config).unwrap()
    }

    #[test]
    fn test_empty_api_key_is_rejected() {
        let err = GatewayHttpClient::new(&GatewayConfig::new("")).err().unwrap();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[tokio::test]
    async fn test_bearer_auth_header() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/echo"))
            .and(header("Authorization", "Bearer test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
            .expect(1)
            .mount(&server)
            .await;

        let client = make_client(&server, "test-key");
        let body: Value = client
            .post_json("/echo", Auth::Bearer, &serde_json::json!({}))
            .await
            .unwrap();
        assert_eq!(body["ok"], true);
    }

    #[tokio::test]
    async fn test_api_key_header_auth() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/status"))
            .and(header("x-goog-api-key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"done": false})))
            .expect(1)
            .mount(&server)
            .await;

        let client = make_client(&server, "test-key");
        let body: Value = client.get_json("/status", Auth::ApiKeyHeader).await.unwrap();
        assert_eq!(body["done"], false);
    }

    #[tokio::test]
    async fn test_non_success_status_carries_body() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/status"))
            .respond_with(ResponseTemplate::new(503).set_body_string("backend unavailable"))
            .mount(&server)
            .await;

        let client = make_client(&server, "key");
        let err = client
            .get_json::<Value>("/status", Auth::ApiKeyHeader)
            .await
            .unwrap_err();

        match err {
            Error::Transport { status, body } => {
                assert_eq!(status, 503);
                assert_eq!(body, "backend unavailable");
            }
            other => panic!("expected transport error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_invalid_json_is_serialization_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/status"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let client = make_client(&server, "key");
        let err = client
            .get_json::<Value>("/status", Auth::ApiKeyHeader)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Serialization(_)));
    }
}
