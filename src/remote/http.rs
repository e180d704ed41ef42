//! FOI REST 服务的 HTTP 客户端
//!
//! - POST /new/<teacher>/<user>/<agent>   { "content": <systemPrompt> }
//! - POST /query/<user>/<agent>           { "prompt": <userPrompt> }
//! - POST /delete/<user>/<agent>
//!
//! 路径段经过百分号编码；响应为 { "status": "success" | 其它, "message"?, "response"? } 信封。

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, ClientBuilder};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::core::RemoteError;
use crate::remote::{Owner, RemoteAgent};

/// 响应信封
#[derive(Debug, Deserialize)]
struct Envelope {
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    response: Option<String>,
}

impl Envelope {
    fn is_success(&self) -> bool {
        self.status == "success"
    }
}

pub struct HttpAgentClient {
    client: Client,
    base_url: String,
}

impl HttpAgentClient {
    /// 构建失败时返回错误，不退回到没有超时的客户端
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self, RemoteError> {
        Self::from_builder(base_url, Client::builder().timeout(Duration::from_secs(timeout_secs)))
    }

    fn from_builder(base_url: &str, builder: ClientBuilder) -> Result<Self, RemoteError> {
        let client = builder
            .build()
            .map_err(|e| RemoteError::Network(format!("HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, route: &str, segments: &[&str]) -> String {
        let encoded: Vec<String> = segments
            .iter()
            .map(|s| urlencoding::encode(s).into_owned())
            .collect();
        format!("{}/{}/{}", self.base_url, route, encoded.join("/"))
    }

    async fn post(&self, url: &str, body: Option<Value>) -> Result<Envelope, RemoteError> {
        let mut request = self.client.post(url);
        if let Some(body) = body {
            request = request.json(&body);
        }
        let resp = request
            .send()
            .await
            .map_err(|e| RemoteError::Network(format!("Request failed: {}", e)))?;
        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| RemoteError::Network(format!("Read body: {}", e)))?;

        if !status.is_success() {
            // 服务端出错时通常仍带信封，尽量保留其中的说明
            let detail = serde_json::from_str::<Envelope>(&text)
                .ok()
                .and_then(|env| env.message.or(env.response))
                .unwrap_or(text);
            return Err(RemoteError::Network(format!("HTTP {}: {}", status, detail)));
        }

        serde_json::from_str(&text)
            .map_err(|e| RemoteError::Network(format!("Invalid envelope: {}: {}", e, text)))
    }
}

#[async_trait]
impl RemoteAgent for HttpAgentClient {
    async fn create(&self, owner: &Owner, agent: &str, system_prompt: &str) -> Result<(), RemoteError> {
        let url = self.url("new", &[&owner.teacher, &owner.user, agent]);
        let env = self
            .post(&url, Some(json!({ "content": system_prompt })))
            .await?;
        if !env.is_success() {
            return Err(RemoteError::Protocol(
                env.message.unwrap_or_else(|| "Agent creation failed".to_string()),
            ));
        }
        tracing::info!(agent = %agent, user = %owner.user, teacher = %owner.teacher, "created agent");
        Ok(())
    }

    async fn ask(&self, owner: &Owner, agent: &str, prompt: &str) -> Result<String, RemoteError> {
        let url = self.url("query", &[&owner.user, agent]);
        let env = self.post(&url, Some(json!({ "prompt": prompt }))).await?;
        if !env.is_success() {
            return Err(RemoteError::Protocol(
                env.response
                    .or(env.message)
                    .unwrap_or_else(|| "Query error".to_string()),
            ));
        }
        env.response
            .ok_or_else(|| RemoteError::Network("Envelope has no response field".to_string()))
    }

    async fn delete(&self, owner: &Owner, agent: &str) -> Result<(), RemoteError> {
        let url = self.url("delete", &[&owner.user, agent]);
        let env = self.post(&url, None).await?;
        if !env.is_success() {
            return Err(RemoteError::Protocol(
                env.message.unwrap_or_else(|| "Agent deletion failed".to_string()),
            ));
        }
        tracing::info!(agent = %agent, user = %owner.user, "deleted agent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn owner() -> Owner {
        Owner::new("prof x", "ana/b")
    }

    #[test]
    fn test_builder_failure_is_reported() {
        let builder = Client::builder().user_agent("bad\nagent");
        let err = HttpAgentClient::from_builder("http://localhost:5000", builder)
            .err()
            .unwrap();
        assert!(matches!(err, RemoteError::Network(ref m) if m.starts_with("HTTP client")));
    }

    #[test]
    fn test_url_encodes_segments() {
        let client = HttpAgentClient::new("http://localhost:5000/", 5).unwrap();
        assert_eq!(
            client.url("new", &["prof x", "ana/b", "Tutor?"]),
            "http://localhost:5000/new/prof%20x/ana%2Fb/Tutor%3F"
        );
    }

    #[tokio::test]
    async fn test_ask_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/query/ana%2Fb/Tutor"))
            .and(body_json(json!({ "prompt": "2+2?" })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "status": "success", "response": "4" })),
            )
            .mount(&server)
            .await;

        let client = HttpAgentClient::new(&server.uri(), 5).unwrap();
        assert_eq!(client.ask(&owner(), "Tutor", "2+2?").await.unwrap(), "4");
    }

    #[tokio::test]
    async fn test_ask_status_error_is_protocol() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "status": "error", "response": "No such agent" })),
            )
            .mount(&server)
            .await;

        let client = HttpAgentClient::new(&server.uri(), 5).unwrap();
        let err = client.ask(&owner(), "Ghost", "hi").await.unwrap_err();
        assert_eq!(err, RemoteError::Protocol("No such agent".to_string()));
    }

    #[tokio::test]
    async fn test_non_2xx_is_network() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(404)
                    .set_body_json(json!({ "status": "error", "message": "No such agent 'Ghost'" })),
            )
            .mount(&server)
            .await;

        let client = HttpAgentClient::new(&server.uri(), 5).unwrap();
        match client.delete(&owner(), "Ghost").await.unwrap_err() {
            RemoteError::Network(msg) => {
                assert!(msg.contains("404"));
                assert!(msg.contains("No such agent"));
            }
            other => panic!("Expected Network, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unparsable_envelope_is_network() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let client = HttpAgentClient::new(&server.uri(), 5).unwrap();
        let err = client.ask(&owner(), "Tutor", "hi").await.unwrap_err();
        assert!(matches!(err, RemoteError::Network(_)));
    }

    #[tokio::test]
    async fn test_create_sends_content_to_teacher_path() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/new/prof%20x/ana%2Fb/Tutor"))
            .and(body_json(json!({ "content": "You are a tutor." })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "status": "success", "message": "created" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = HttpAgentClient::new(&server.uri(), 5).unwrap();
        client
            .create(&owner(), "Tutor", "You are a tutor.")
            .await
            .unwrap();
    }
}
