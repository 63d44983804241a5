//! Mock Telegram API server for testing
//!
//! Wraps a wiremock server that answers the Bot API methods the bot calls.

use std::time::Duration;
use serde_json::{json, Value};
use teloxide::Bot;
use wiremock::{
    matchers::{body_partial_json, method, path_regex},
    Mock, MockServer, ResponseTemplate,
};

pub const TEST_TOKEN: &str = "123456:TEST-TOKEN";

/// Mock Telegram API server
pub struct TelegramMockServer {
    pub server: MockServer,
}

impl TelegramMockServer {
    pub async fn new() -> Self {
        Self { server: MockServer::start().await }
    }

    /// Bot pointed at the mock server
    pub fn bot(&self) -> Bot {
        let url = url::Url::parse(&self.server.uri()).expect("mock server uri");
        Bot::new(TEST_TOKEN).set_api_url(url)
    }

    fn method_path(name: &str) -> String {
        format!("(?i)/bot.+/{}$", name)
    }

    fn member_body(user_id: i64, status: &str) -> Value {
        json!({
            "ok": true,
            "result": {
                "status": status,
                "user": { "id": user_id, "is_bot": false, "first_name": "Tester" }
            }
        })
    }

    /// getChatMember answers `status` ("member" or "left") for the given chat
    pub async fn mock_chat_member(&self, chat: Value, user_id: i64, status: &str) {
        Mock::given(method("POST"))
            .and(path_regex(Self::method_path("getchatmember")))
            .and(body_partial_json(json!({ "chat_id": chat })))
            .respond_with(ResponseTemplate::new(200).set_body_json(Self::member_body(user_id, status)))
            .mount(&self.server)
            .await;
    }

    /// getChatMember fails for the given chat, as for a chat the bot cannot see
    pub async fn mock_chat_member_error(&self, chat: Value) {
        Mock::given(method("POST"))
            .and(path_regex(Self::method_path("getchatmember")))
            .and(body_partial_json(json!({ "chat_id": chat })))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "ok": false,
                "error_code": 400,
                "description": "Bad Request: chat not found"
            })))
            .mount(&self.server)
            .await;
    }

    /// getChatMember answers only after `delay`
    pub async fn mock_chat_member_slow(&self, delay: Duration) {
        Mock::given(method("POST"))
            .and(path_regex(Self::method_path("getchatmember")))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_delay(delay)
                    .set_body_json(Self::member_body(1, "member")),
            )
            .mount(&self.server)
            .await;
    }

    /// sendMessage succeeds and echoes a private message
    pub async fn mock_send_message(&self) {
        Mock::given(method("POST"))
            .and(path_regex(Self::method_path("sendmessage")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ok": true,
                "result": {
                    "message_id": 100,
                    "date": 1_700_000_000,
                    "chat": { "id": 42, "type": "private", "first_name": "Tester" },
                    "text": "reminder"
                }
            })))
            .mount(&self.server)
            .await;
    }

    /// sendMessage fails, as for a user who blocked the bot
    pub async fn mock_send_message_blocked(&self) {
        Mock::given(method("POST"))
            .and(path_regex(Self::method_path("sendmessage")))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({
                "ok": false,
                "error_code": 403,
                "description": "Forbidden: bot was blocked by the user"
            })))
            .mount(&self.server)
            .await;
    }

    /// JSON bodies of every request to the named method
    pub async fn requests_to(&self, name: &str) -> Vec<Value> {
        let suffix = format!("/{}", name.to_lowercase());
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .into_iter()
            .filter(|r| r.url.path().to_lowercase().ends_with(&suffix))
            .filter_map(|r| serde_json::from_slice(&r.body).ok())
            .collect()
    }
}
