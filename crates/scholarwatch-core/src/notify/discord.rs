use reqwest::Client;
use serde::Serialize;

use super::Notifier;
use crate::paper::Paper;
use crate::source::http::SCHOLARWATCH_USER_AGENT;
use crate::{Error, Result};

#[derive(Serialize)]
struct WebhookPayload<'a> {
    content: &'a str,
}

/// Posts one message per new paper to a Discord webhook
pub struct DiscordNotifier {
    client: Client,
    webhook_url: String,
}

impl DiscordNotifier {
    pub fn new(client: Client, webhook_url: &str) -> Self {
        Self {
            client,
            webhook_url: webhook_url.to_string(),
        }
    }
}

fn or_fallback<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.trim().is_empty() {
        fallback
    } else {
        value
    }
}

/// Markdown message announcing a paper
pub fn format_message(keyword: &str, paper: &Paper) -> String {
    format!(
        "**New paper found** for **{}**\n**{}** ({})\n*{}*\n{}",
        keyword,
        or_fallback(&paper.title, "Untitled"),
        or_fallback(&paper.year, "Year n/a"),
        or_fallback(&paper.authors, "Unknown authors"),
        paper.url
    )
}

#[async_trait::async_trait]
impl Notifier for DiscordNotifier {
    async fn notify(&self, keyword: &str, paper: &Paper) -> Result<()> {
        let content = format_message(keyword, paper);

        let response = self
            .client
            .post(&self.webhook_url)
            .header(reqwest::header::USER_AGENT, SCHOLARWATCH_USER_AGENT)
            .json(&WebhookPayload { content: &content })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Notify(format!("Discord webhook returned {}: {}", status, body)));
        }

        tracing::debug!("Notified Discord about '{}'", paper.title);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn paper() -> Paper {
        Paper {
            title: "Deep Residual Learning".into(),
            url: "https://arxiv.org/abs/1512.03385".into(),
            authors: "K He, X Zhang".into(),
            year: "2015".into(),
            snippet: None,
        }
    }

    #[test]
    fn test_format_message() {
        assert_eq!(
            format_message("resnet", &paper()),
            "**New paper found** for **resnet**\n**Deep Residual Learning** (2015)\n*K He, X Zhang*\nhttps://arxiv.org/abs/1512.03385"
        );
    }

    #[test]
    fn test_format_message_fallbacks() {
        let message = format_message("resnet", &Paper::default());
        assert_eq!(
            message,
            "**New paper found** for **resnet**\n**Untitled** (Year n/a)\n*Unknown authors*\n"
        );
    }

    #[tokio::test]
    async fn test_notify_posts_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/webhooks/1/abc"))
            .and(body_json(serde_json::json!({ "content": format_message("resnet", &paper()) })))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let notifier = DiscordNotifier::new(Client::new(), &format!("{}/api/webhooks/1/abc", server.uri()));
        notifier.notify("resnet", &paper()).await.unwrap();
    }

    #[tokio::test]
    async fn test_notify_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid webhook token"))
            .mount(&server)
            .await;

        let notifier = DiscordNotifier::new(Client::new(), &server.uri());
        let err = notifier.notify("resnet", &paper()).await.unwrap_err();
        assert!(matches!(err, Error::Notify(_)));
        assert!(err.to_string().contains("invalid webhook token"));
    }
}
