//! Chat platform REST client.
//!
//! [`ChatApi`] is the seam the session talks to; [`HttpChatClient`] is the
//! blocking reqwest implementation.

use crate::config::ChannelConfig;
use crate::error::{GrindError, Result};
use reqwest::blocking::{Client, Response};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, RETRY_AFTER, USER_AGENT};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Author {
    pub id: String,
    #[serde(default)]
    pub username: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub author: Author,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub discriminator: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RateLimitBody {
    retry_after: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

// ---------------------------------------------------------------------------
// SendOutcome
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum SendOutcome {
    Delivered(Message),
    /// HTTP 429. `retry_after` is the server's hint, or the configured
    /// fallback when it gave none.
    RateLimited { retry_after: Duration },
    Rejected { status: u16, detail: String },
}

// ---------------------------------------------------------------------------
// ChatApi
// ---------------------------------------------------------------------------

pub trait ChatApi {
    fn send_message(&self, channel_id: &str, content: &str) -> Result<SendOutcome>;

    /// Messages newer than `after_id`, newest first.
    fn messages_after(&self, channel_id: &str, after_id: &str, limit: u8) -> Result<Vec<Message>>;

    fn current_user(&self) -> Result<User>;

    fn channel(&self, channel_id: &str) -> Result<Channel>;
}

impl<A: ChatApi + ?Sized> ChatApi for &A {
    fn send_message(&self, channel_id: &str, content: &str) -> Result<SendOutcome> {
        (**self).send_message(channel_id, content)
    }

    fn messages_after(&self, channel_id: &str, after_id: &str, limit: u8) -> Result<Vec<Message>> {
        (**self).messages_after(channel_id, after_id, limit)
    }

    fn current_user(&self) -> Result<User> {
        (**self).current_user()
    }

    fn channel(&self, channel_id: &str) -> Result<Channel> {
        (**self).channel(channel_id)
    }
}

// ---------------------------------------------------------------------------
// HttpChatClient
// ---------------------------------------------------------------------------

pub struct HttpChatClient {
    base: String,
    client: Client,
    fallback_retry_after: Duration,
}

impl HttpChatClient {
    pub fn new(base: &str, token: &str, fallback_retry_after: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let auth = HeaderValue::from_str(&format!("Bot {}", token.trim()))
            .map_err(|e| GrindError::InvalidToken(e.to_string()))?;
        headers.insert(AUTHORIZATION, auth);
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("grindbot/", env!("CARGO_PKG_VERSION"))),
        );
        let client = Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            base: base.trim_end_matches('/').to_string(),
            client,
            fallback_retry_after,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    fn retry_after(&self, resp: Response) -> Duration {
        let header = resp
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<f64>().ok());
        let body = resp
            .json::<RateLimitBody>()
            .ok()
            .and_then(|b| b.retry_after);
        body.or(header)
            .filter(|s| s.is_finite() && *s >= 0.0)
            .map(Duration::from_secs_f64)
            .unwrap_or(self.fallback_retry_after)
    }

    fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T> {
        let resp = self.client.get(self.url(path)).send()?;
        let status = resp.status();
        if !status.is_success() {
            return Err(GrindError::Api {
                status: status.as_u16(),
                detail: error_detail(resp),
            });
        }
        Ok(resp.json()?)
    }

    /// Token check followed by a per-channel access check.
    pub fn check_access(&self, channels: &[ChannelConfig]) -> Result<AccessReport> {
        let user = self.current_user()?;
        let channels = channels
            .iter()
            .map(|c| {
                let access = match self.channel(&c.id) {
                    Ok(ch) => ChannelAccess::Ok { name: ch.name },
                    Err(GrindError::Api { status: 403, .. }) => ChannelAccess::Forbidden,
                    Err(GrindError::Api { status: 404, .. }) => ChannelAccess::NotFound,
                    Err(e) => ChannelAccess::Failed {
                        detail: e.to_string(),
                    },
                };
                (c.id.clone(), access)
            })
            .collect();
        Ok(AccessReport { user, channels })
    }
}

fn error_detail(resp: Response) -> String {
    let status = resp.status();
    let text = resp.text().unwrap_or_default();
    serde_json::from_str::<ErrorBody>(&text)
        .ok()
        .and_then(|b| b.message)
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        })
}

impl ChatApi for HttpChatClient {
    fn send_message(&self, channel_id: &str, content: &str) -> Result<SendOutcome> {
        let resp = self
            .client
            .post(self.url(&format!("/channels/{channel_id}/messages")))
            .json(&serde_json::json!({ "content": content }))
            .send()?;
        let status = resp.status();
        if status.is_success() {
            return Ok(SendOutcome::Delivered(resp.json()?));
        }
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Ok(SendOutcome::RateLimited {
                retry_after: self.retry_after(resp),
            });
        }
        Ok(SendOutcome::Rejected {
            status: status.as_u16(),
            detail: error_detail(resp),
        })
    }

    fn messages_after(&self, channel_id: &str, after_id: &str, limit: u8) -> Result<Vec<Message>> {
        self.get_json(&format!(
            "/channels/{channel_id}/messages?after={after_id}&limit={limit}"
        ))
    }

    fn current_user(&self) -> Result<User> {
        self.get_json("/users/@me")
    }

    fn channel(&self, channel_id: &str) -> Result<Channel> {
        self.get_json(&format!("/channels/{channel_id}"))
    }
}

// ---------------------------------------------------------------------------
// Access report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "access", rename_all = "snake_case")]
pub enum ChannelAccess {
    Ok { name: Option<String> },
    Forbidden,
    NotFound,
    Failed { detail: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct AccessReport {
    pub user: User,
    pub channels: Vec<(String, ChannelAccess)>,
}

impl AccessReport {
    pub fn all_ok(&self) -> bool {
        self.channels
            .iter()
            .all(|(_, a)| matches!(a, ChannelAccess::Ok { .. }))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn client(server: &mockito::Server) -> HttpChatClient {
        HttpChatClient::new(&server.url(), "tok", Duration::from_secs(60)).unwrap()
    }

    #[test]
    fn send_posts_content_with_bot_auth() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/channels/42/messages")
            .match_header("authorization", "Bot tok")
            .match_header("user-agent", Matcher::Regex("^grindbot/".to_string()))
            .match_body(Matcher::JsonString(r#"{"content":"owo hunt"}"#.to_string()))
            .with_status(200)
            .with_body(r#"{"id":"9","content":"owo hunt","author":{"id":"1","username":"me"}}"#)
            .create();

        let outcome = client(&server).send_message("42", "owo hunt").unwrap();
        mock.assert();
        match outcome {
            SendOutcome::Delivered(msg) => {
                assert_eq!(msg.id, "9");
                assert_eq!(msg.author.id, "1");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn rate_limit_reads_body_hint() {
        let mut server = mockito::Server::new();
        server
            .mock("POST", "/channels/42/messages")
            .with_status(429)
            .with_header("retry-after", "9")
            .with_body(r#"{"message":"You are being rate limited.","retry_after":2.5}"#)
            .create();

        let outcome = client(&server).send_message("42", "owo hunt").unwrap();
        assert_eq!(
            outcome,
            SendOutcome::RateLimited {
                retry_after: Duration::from_millis(2500)
            }
        );
    }

    #[test]
    fn rate_limit_falls_back_to_header_then_default() {
        let mut server = mockito::Server::new();
        let m = server
            .mock("POST", "/channels/1/messages")
            .with_status(429)
            .with_header("retry-after", "7")
            .create();
        let outcome = client(&server).send_message("1", "x").unwrap();
        assert_eq!(
            outcome,
            SendOutcome::RateLimited {
                retry_after: Duration::from_secs(7)
            }
        );
        m.remove();

        server
            .mock("POST", "/channels/1/messages")
            .with_status(429)
            .create();
        let outcome = client(&server).send_message("1", "x").unwrap();
        assert_eq!(
            outcome,
            SendOutcome::RateLimited {
                retry_after: Duration::from_secs(60)
            }
        );
    }

    #[test]
    fn forbidden_is_rejected_with_api_message() {
        let mut server = mockito::Server::new();
        server
            .mock("POST", "/channels/42/messages")
            .with_status(403)
            .with_body(r#"{"message":"Missing Permissions","code":50013}"#)
            .create();

        let outcome = client(&server).send_message("42", "owo hunt").unwrap();
        assert_eq!(
            outcome,
            SendOutcome::Rejected {
                status: 403,
                detail: "Missing Permissions".to_string()
            }
        );
    }

    #[test]
    fn messages_after_queries_by_id() {
        let mut server = mockito::Server::new();
        server
            .mock("GET", "/channels/42/messages")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("after".into(), "9".into()),
                Matcher::UrlEncoded("limit".into(), "5".into()),
            ]))
            .with_status(200)
            .with_body(r#"[{"id":"10","content":"you found a cat","author":{"id":"408"}}]"#)
            .create();

        let msgs = client(&server).messages_after("42", "9", 5).unwrap();
        assert_eq!(msgs.len(), 1);
        assert_eq!(msgs[0].author.id, "408");
    }

    #[test]
    fn check_access_reports_each_channel() {
        let mut server = mockito::Server::new();
        server
            .mock("GET", "/users/@me")
            .with_status(200)
            .with_body(r#"{"id":"1","username":"farmer"}"#)
            .create();
        server
            .mock("GET", "/channels/10")
            .with_status(200)
            .with_body(r#"{"id":"10","name":"grind"}"#)
            .create();
        server.mock("GET", "/channels/20").with_status(403).create();
        server.mock("GET", "/channels/30").with_status(404).create();

        let channels: Vec<ChannelConfig> = ["10", "20", "30"]
            .iter()
            .map(|id| ChannelConfig {
                id: id.to_string(),
                name: None,
            })
            .collect();
        let report = client(&server).check_access(&channels).unwrap();
        assert_eq!(report.user.username, "farmer");
        assert_eq!(
            report.channels[0].1,
            ChannelAccess::Ok {
                name: Some("grind".to_string())
            }
        );
        assert_eq!(report.channels[1].1, ChannelAccess::Forbidden);
        assert_eq!(report.channels[2].1, ChannelAccess::NotFound);
        assert!(!report.all_ok());
    }

    #[test]
    fn invalid_token_fails_check() {
        let mut server = mockito::Server::new();
        server
            .mock("GET", "/users/@me")
            .with_status(401)
            .with_body(r#"{"message":"401: Unauthorized"}"#)
            .create();
        let err = client(&server).check_access(&[]).unwrap_err();
        match err {
            GrindError::Api { status, detail } => {
                assert_eq!(status, 401);
                assert_eq!(detail, "401: Unauthorized");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
