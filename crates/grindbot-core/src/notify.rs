use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;

pub const COLOR_HALT: u32 = 0xff0000;
pub const COLOR_RARE: u32 = 0xffd700;
pub const COLOR_INFO: u32 = 0x00ff00;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Embed {
    pub title: String,
    pub description: String,
    pub color: u32,
    pub timestamp: DateTime<Utc>,
}

/// Out-of-band alerts. Delivery is best effort: failures are logged, never
/// returned.
pub trait Notifier {
    fn notify(&self, embed: Embed);
}

/// Used when no webhook is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn notify(&self, _embed: Embed) {}
}

#[derive(Serialize)]
struct WebhookBody<'a> {
    embeds: [&'a Embed; 1],
}

pub struct WebhookNotifier {
    url: String,
    client: reqwest::blocking::Client,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_else(|_| reqwest::blocking::Client::new());
        Self {
            url: url.into(),
            client,
        }
    }
}

impl Notifier for WebhookNotifier {
    fn notify(&self, embed: Embed) {
        let body = WebhookBody { embeds: [&embed] };
        match self.client.post(&self.url).json(&body).send() {
            Ok(resp) if resp.status().is_success() => {
                tracing::debug!(title = %embed.title, "webhook delivered");
            }
            Ok(resp) => {
                tracing::warn!(status = resp.status().as_u16(), "webhook rejected");
            }
            Err(e) => {
                tracing::warn!(error = %e, "webhook failed");
            }
        }
    }
}

/// Boxed notifier for the configured URL, or [`NullNotifier`].
pub fn from_url(url: Option<&str>) -> Box<dyn Notifier> {
    match url.map(str::trim).filter(|u| !u.is_empty()) {
        Some(url) => Box::new(WebhookNotifier::new(url)),
        None => Box::new(NullNotifier),
    }
}

impl<N: Notifier + ?Sized> Notifier for Box<N> {
    fn notify(&self, embed: Embed) {
        (**self).notify(embed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn embed() -> Embed {
        Embed {
            title: "Rare catch".to_string(),
            description: "Found: Legendary".to_string(),
            color: COLOR_RARE,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn posts_single_embed() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/hook")
            .match_body(mockito::Matcher::AllOf(vec![
                mockito::Matcher::Regex(r#"^\{"embeds":\[\{"#.to_string()),
                mockito::Matcher::Regex(r#""title":"Rare catch""#.to_string()),
                mockito::Matcher::Regex(r#""color":16766720"#.to_string()),
            ]))
            .with_status(204)
            .create();

        WebhookNotifier::new(format!("{}/hook", server.url())).notify(embed());
        mock.assert();
    }

    #[test]
    fn server_error_is_swallowed() {
        let mut server = mockito::Server::new();
        let mock = server.mock("POST", "/hook").with_status(500).create();
        WebhookNotifier::new(format!("{}/hook", server.url())).notify(embed());
        mock.assert();
    }

    #[test]
    fn blank_url_gives_null_notifier() {
        // must not attempt any request
        from_url(Some("  ")).notify(embed());
        from_url(None).notify(embed());
    }
}
