use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::{Client, Proxy, StatusCode};
use std::time::Duration;

use crate::config::SourceConfig;
use crate::{Error, Result};

pub const SCHOLARWATCH_USER_AGENT: &str =
    concat!("scholarwatch/", env!("CARGO_PKG_VERSION"), " (+https://github.com/)");

const MAX_RESPONSE_BYTES: usize = 5 * 1024 * 1024;
const MAX_RETRIES: u32 = 3;
const INITIAL_RETRY_DELAY_MS: u64 = 500;

/// Build the HTTP client shared by sources and notifiers
pub fn build_client(config: &SourceConfig) -> Result<Client> {
    let mut builder = Client::builder()
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .gzip(true)
        .deflate(true)
        .brotli(true)
        .redirect(reqwest::redirect::Policy::limited(10));

    if let Some(ref proxy) = config.proxy_url {
        let proxy =
            Proxy::all(proxy).map_err(|e| Error::Config(format!("Invalid proxy URL: {}", e)))?;
        builder = builder.proxy(proxy);
        tracing::info!("Using HTTP proxy for source requests");
    }

    builder.build().map_err(Error::Http)
}

fn default_headers(accept: &'static str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static(accept));
    headers.insert(USER_AGENT, HeaderValue::from_static(SCHOLARWATCH_USER_AGENT));
    headers
}

/// GET a URL, retrying with exponential backoff on 429/503 and transport errors.
/// Any other non-success status is returned as an error without retrying.
pub async fn get_with_retry(
    client: &Client,
    url: &str,
    query: &[(&str, String)],
    accept: &'static str,
) -> Result<Bytes> {
    let mut last_error = None;
    let mut delay_ms = INITIAL_RETRY_DELAY_MS;

    for attempt in 0..MAX_RETRIES {
        tracing::debug!("Source request attempt {} for {}", attempt + 1, url);

        match client
            .get(url)
            .query(query)
            .headers(default_headers(accept))
            .send()
            .await
        {
            Ok(response) => {
                let status = response.status();

                if status == StatusCode::TOO_MANY_REQUESTS
                    || status == StatusCode::SERVICE_UNAVAILABLE
                {
                    tracing::warn!("Received {} for {}, retrying after {}ms...", status, url, delay_ms);
                    last_error = Some(Error::Source(format!("HTTP {} for URL: {}", status, url)));
                } else if !status.is_success() {
                    return Err(Error::Source(format!("HTTP {} for URL: {}", status, url)));
                } else {
                    match response.bytes().await {
                        Ok(bytes) => {
                            ensure_size(bytes.len(), url)?;
                            return Ok(bytes);
                        }
                        Err(e) => {
                            tracing::warn!("Failed to read response body: {}", e);
                            last_error = Some(Error::Http(e));
                        }
                    }
                }
            }
            Err(e) => {
                tracing::warn!("Request failed for {} (attempt {}): {}", url, attempt + 1, e);
                last_error = Some(Error::Http(e));
            }
        }

        if attempt < MAX_RETRIES - 1 {
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            delay_ms *= 2;
        }
    }

    Err(last_error.unwrap_or_else(|| {
        Error::Source(format!("Failed to fetch URL after {} retries: {}", MAX_RETRIES, url))
    }))
}

fn ensure_size(size: usize, url: &str) -> Result<()> {
    if size > MAX_RESPONSE_BYTES {
        return Err(Error::Source(format!(
            "Response too large ({} bytes) for URL: {}",
            size, url
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_invalid_proxy_is_config_error() {
        let config = SourceConfig {
            proxy_url: Some("not a proxy".into()),
            ..SourceConfig::default()
        };
        assert!(matches!(build_client(&config), Err(Error::Config(_))));
    }

    #[tokio::test]
    async fn test_retries_on_service_unavailable() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/busy"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/busy"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .mount(&server)
            .await;

        let client = build_client(&SourceConfig::default()).unwrap();
        let body = get_with_retry(&client, &format!("{}/busy", server.uri()), &[], "*/*")
            .await
            .unwrap();
        assert_eq!(&body[..], b"ok");
    }

    #[tokio::test]
    async fn test_client_error_is_not_retried() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let client = build_client(&SourceConfig::default()).unwrap();
        let err = get_with_retry(&client, &format!("{}/missing", server.uri()), &[], "*/*")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Source(_)));
    }
}
