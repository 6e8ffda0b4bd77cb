//! Slack Web API client.
//!
//! Thin wrapper over the handful of Web API methods the bot needs. Methods
//! that take arguments in the body are called with JSON; read methods that
//! only accept form/query arguments (`reactions.get`,
//! `conversations.history`) are called with GET.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;
use triage_core::{HistoryApi, HistoryMessage, MarkerApi, MessageRef, TriageResult};

use crate::commands::DelayedResponse;
use crate::config::SlackConfig;
use crate::error::{SlackApiError, SlackError, SlackResult};
use crate::messages::HomeView;

/// Client for the Slack Web API, authenticated with the bot token.
#[derive(Clone)]
pub struct SlackWebClient {
    config: SlackConfig,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct AuthTestResponse {
    user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Reaction {
    name: String,
}

#[derive(Debug, Default, Deserialize)]
struct ReactedMessage {
    #[serde(default)]
    reactions: Vec<Reaction>,
}

#[derive(Debug, Deserialize)]
struct ReactionsGetResponse {
    #[serde(default)]
    message: ReactedMessage,
}

#[derive(Debug, Deserialize)]
struct HistoryResponse {
    #[serde(default)]
    messages: Vec<HistoryMessage>,
}

#[derive(Debug, Deserialize)]
struct ConnectionsOpenResponse {
    url: Option<String>,
}

impl SlackWebClient {
    /// Create a client with the given request timeout.
    pub fn new(config: SlackConfig, timeout: Duration) -> SlackResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SlackError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/{}", self.config.api_base_url(), method)
    }

    /// Call `auth.test` and return the bot's user ID.
    pub async fn auth_test(&self) -> SlackResult<String> {
        let response: AuthTestResponse = self
            .call_json("auth.test", &serde_json::json!({}))
            .await
            .map_err(|e| match e {
                SlackError::Api(msg) => SlackError::Auth(format!("auth.test failed: {}", msg)),
                other => other,
            })?;

        response
            .user_id
            .ok_or_else(|| SlackError::Auth("auth.test returned no user_id".to_string()))
    }

    /// Request a Socket Mode WebSocket URL using the app-level token.
    pub async fn open_socket_url(&self) -> SlackResult<String> {
        let response = self
            .client
            .post(self.method_url("apps.connections.open"))
            .bearer_auth(self.config.app_token())
            .header("Content-Type", "application/x-www-form-urlencoded")
            .send()
            .await?;

        let json = Self::read_body(response).await?;
        let json = Self::check_ok("apps.connections.open", json)?;
        let opened: ConnectionsOpenResponse = serde_json::from_value(json)?;

        opened
            .url
            .ok_or_else(|| SlackError::Api("Missing url in response".to_string()))
    }

    /// Add a reaction to a message.
    pub async fn add_reaction(&self, channel: &str, ts: &str, name: &str) -> SlackResult<()> {
        let payload = serde_json::json!({
            "channel": channel,
            "timestamp": ts,
            "name": name,
        });
        let _: serde_json::Value = self.call_json("reactions.add", &payload).await?;
        debug!(channel, ts, name, "Added reaction");
        Ok(())
    }

    /// Remove the bot's reaction from a message.
    pub async fn remove_reaction(&self, channel: &str, ts: &str, name: &str) -> SlackResult<()> {
        let payload = serde_json::json!({
            "channel": channel,
            "timestamp": ts,
            "name": name,
        });
        let _: serde_json::Value = self.call_json("reactions.remove", &payload).await?;
        debug!(channel, ts, name, "Removed reaction");
        Ok(())
    }

    /// Names of all reactions on a message.
    pub async fn get_reactions(&self, channel: &str, ts: &str) -> SlackResult<Vec<String>> {
        let response: ReactionsGetResponse = self
            .call_get(
                "reactions.get",
                &[("channel", channel), ("timestamp", ts), ("full", "true")],
            )
            .await?;

        Ok(response
            .message
            .reactions
            .into_iter()
            .map(|r| r.name)
            .collect())
    }

    /// Most recent messages in a channel, newest first.
    pub async fn conversations_history(
        &self,
        channel: &str,
        limit: usize,
    ) -> SlackResult<Vec<HistoryMessage>> {
        let limit = limit.to_string();
        let response: HistoryResponse = self
            .call_get(
                "conversations.history",
                &[("channel", channel), ("limit", limit.as_str())],
            )
            .await?;
        Ok(response.messages)
    }

    /// Publish a view to a user's App Home.
    pub async fn publish_home(&self, user_id: &str, view: &HomeView) -> SlackResult<()> {
        let payload = serde_json::json!({
            "user_id": user_id,
            "view": view,
        });
        let _: serde_json::Value = self.call_json("views.publish", &payload).await?;
        Ok(())
    }

    /// Send a reply to an interaction's `response_url`.
    pub async fn send_response(
        &self,
        response_url: &str,
        response: &DelayedResponse,
    ) -> SlackResult<()> {
        debug!("Sending delayed response to: {}", response_url);

        let resp = self.client.post(response_url).json(response).send().await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(SlackError::Api(format!(
                "Failed to send delayed response: {} - {}",
                status, body
            )));
        }

        Ok(())
    }

    /// POST a JSON body to a Web API method and decode the `ok` response.
    async fn call_json<T: serde::de::DeserializeOwned>(
        &self,
        method: &str,
        payload: &serde_json::Value,
    ) -> SlackResult<T> {
        let response = self
            .client
            .post(self.method_url(method))
            .bearer_auth(self.config.bot_token())
            .header("Content-Type", "application/json; charset=utf-8")
            .json(payload)
            .send()
            .await?;

        let json = Self::read_body(response).await?;
        let json = Self::check_ok(method, json)?;
        Ok(serde_json::from_value(json)?)
    }

    /// GET a Web API method with query arguments and decode the `ok` response.
    async fn call_get<T: serde::de::DeserializeOwned>(
        &self,
        method: &str,
        query: &[(&str, &str)],
    ) -> SlackResult<T> {
        let response = self
            .client
            .get(self.method_url(method))
            .bearer_auth(self.config.bot_token())
            .query(query)
            .send()
            .await?;

        let json = Self::read_body(response).await?;
        let json = Self::check_ok(method, json)?;
        Ok(serde_json::from_value(json)?)
    }

    async fn read_body(response: reqwest::Response) -> SlackResult<serde_json::Value> {
        // Check for rate limiting
        if response.status() == 429 {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(30);
            return Err(SlackError::RateLimited {
                retry_after_secs: retry_after,
            });
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SlackError::Api(format!("{}: {}", status, body)));
        }

        Ok(response.json().await?)
    }

    fn check_ok(method: &str, json: serde_json::Value) -> SlackResult<serde_json::Value> {
        if json.get("ok").and_then(|v| v.as_bool()) == Some(true) {
            return Ok(json);
        }

        let code = json
            .get("error")
            .and_then(|e| e.as_str())
            .unwrap_or("unknown");
        Err(SlackApiError::new(code, format!("{} failed: {}", method, code)).into())
    }
}

#[async_trait]
impl MarkerApi for SlackWebClient {
    async fn add_marker(&self, target: &MessageRef, marker: &str) -> TriageResult<()> {
        Ok(self.add_reaction(&target.channel, &target.ts, marker).await?)
    }

    async fn remove_marker(&self, target: &MessageRef, marker: &str) -> TriageResult<()> {
        Ok(self
            .remove_reaction(&target.channel, &target.ts, marker)
            .await?)
    }

    async fn list_markers(&self, target: &MessageRef) -> TriageResult<Vec<String>> {
        Ok(self.get_reactions(&target.channel, &target.ts).await?)
    }
}

#[async_trait]
impl HistoryApi for SlackWebClient {
    async fn recent_messages(
        &self,
        channel: &str,
        limit: usize,
    ) -> TriageResult<Vec<HistoryMessage>> {
        Ok(self.conversations_history(channel, limit).await?)
    }
}

#[cfg(test)]
mod tests {
    use triage_core::TriageError;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn client_for(server: &MockServer) -> SlackWebClient {
        let config = SlackConfig::new("xoxb-test", "xapp-test", "secret")
            .with_api_base_url(server.uri());
        SlackWebClient::new(config, Duration::from_secs(5)).unwrap()
    }

    fn ok(body: serde_json::Value) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(body)
    }

    #[tokio::test]
    async fn test_auth_test_returns_user_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth.test"))
            .and(header("Authorization", "Bearer xoxb-test"))
            .respond_with(ok(serde_json::json!({"ok": true, "user_id": "UBOT"})))
            .mount(&server)
            .await;

        let user_id = client_for(&server).auth_test().await.unwrap();
        assert_eq!(user_id, "UBOT");
    }

    #[tokio::test]
    async fn test_auth_test_invalid_auth() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth.test"))
            .respond_with(ok(serde_json::json!({"ok": false, "error": "invalid_auth"})))
            .mount(&server)
            .await;

        let err = client_for(&server).auth_test().await.unwrap_err();
        assert!(matches!(err, SlackError::Auth(_)));
    }

    #[tokio::test]
    async fn test_open_socket_url_uses_app_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/apps.connections.open"))
            .and(header("Authorization", "Bearer xapp-test"))
            .respond_with(ok(
                serde_json::json!({"ok": true, "url": "wss://wss.slack.test/link"}),
            ))
            .mount(&server)
            .await;

        let url = client_for(&server).open_socket_url().await.unwrap();
        assert_eq!(url, "wss://wss.slack.test/link");
    }

    #[tokio::test]
    async fn test_add_marker_sends_reaction() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/reactions.add"))
            .and(body_json(serde_json::json!({
                "channel": "C1",
                "timestamp": "1.2",
                "name": "red_circle"
            })))
            .respond_with(ok(serde_json::json!({"ok": true})))
            .expect(1)
            .mount(&server)
            .await;

        client_for(&server)
            .add_marker(&MessageRef::new("C1", "1.2"), "red_circle")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_already_reacted_is_marker_conflict() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/reactions.add"))
            .respond_with(ok(serde_json::json!({"ok": false, "error": "already_reacted"})))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .add_marker(&MessageRef::new("C1", "1.2"), "red_circle")
            .await
            .unwrap_err();
        assert_eq!(err, TriageError::MarkerConflict("already_reacted".to_string()));
    }

    #[tokio::test]
    async fn test_no_reaction_is_marker_conflict() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/reactions.remove"))
            .respond_with(ok(serde_json::json!({"ok": false, "error": "no_reaction"})))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .remove_marker(&MessageRef::new("C1", "1.2"), "orange_circle")
            .await
            .unwrap_err();
        assert_eq!(err, TriageError::MarkerConflict("no_reaction".to_string()));
    }

    #[tokio::test]
    async fn test_list_markers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/reactions.get"))
            .and(query_param("channel", "C1"))
            .and(query_param("timestamp", "1.2"))
            .respond_with(ok(serde_json::json!({
                "ok": true,
                "type": "message",
                "channel": "C1",
                "message": {
                    "type": "message",
                    "text": "deadline",
                    "ts": "1.2",
                    "reactions": [
                        {"name": "orange_circle", "users": ["UBOT"], "count": 1},
                        {"name": "eyes", "users": ["U2"], "count": 1}
                    ]
                }
            })))
            .mount(&server)
            .await;

        let markers = client_for(&server)
            .list_markers(&MessageRef::new("C1", "1.2"))
            .await
            .unwrap();
        assert_eq!(markers, vec!["orange_circle", "eyes"]);
    }

    #[tokio::test]
    async fn test_list_markers_without_reactions() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/reactions.get"))
            .respond_with(ok(serde_json::json!({
                "ok": true,
                "message": {"type": "message", "text": "hi", "ts": "1.2"}
            })))
            .mount(&server)
            .await;

        let markers = client_for(&server)
            .list_markers(&MessageRef::new("C1", "1.2"))
            .await
            .unwrap();
        assert!(markers.is_empty());
    }

    #[tokio::test]
    async fn test_recent_messages() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/conversations.history"))
            .and(query_param("channel", "C1"))
            .and(query_param("limit", "10"))
            .respond_with(ok(serde_json::json!({
                "ok": true,
                "messages": [
                    {"type": "message", "user": "U1", "text": "newest", "ts": "3.0"},
                    {"type": "message", "bot_id": "B1", "subtype": "bot_message", "text": "bot", "ts": "2.0"}
                ],
                "has_more": true
            })))
            .mount(&server)
            .await;

        let messages = client_for(&server).recent_messages("C1", 10).await.unwrap();

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].text, "newest");
        assert_eq!(messages[1].bot_id.as_deref(), Some("B1"));
    }

    #[tokio::test]
    async fn test_rate_limited() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/conversations.history"))
            .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "7"))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .conversations_history("C1", 10)
            .await
            .unwrap_err();
        assert!(matches!(err, SlackError::RateLimited { retry_after_secs: 7 }));
    }

    #[tokio::test]
    async fn test_server_error_is_transport() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/reactions.add"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .add_marker(&MessageRef::new("C1", "1.2"), "red_circle")
            .await
            .unwrap_err();
        assert!(matches!(err, TriageError::Transport(_)));
    }

    #[tokio::test]
    async fn test_publish_home() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/views.publish"))
            .respond_with(ok(serde_json::json!({"ok": true, "view": {"id": "V1"}})))
            .expect(1)
            .mount(&server)
            .await;

        client_for(&server)
            .publish_home("U1", &crate::messages::home_view())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_send_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/actions/T1/1/abc"))
            .and(body_json(serde_json::json!({
                "response_type": "ephemeral",
                "replace_original": true,
                "text": "ok"
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let response = DelayedResponse::new()
            .with_text("ok")
            .ephemeral()
            .replace_original();
        client_for(&server)
            .send_response(&format!("{}/actions/T1/1/abc", server.uri()), &response)
            .await
            .unwrap();
    }
}
