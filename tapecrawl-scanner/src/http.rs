use crate::error::{Result, ScanError};
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Builds the client used for every static page fetch.
pub fn build_client(timeout: Duration) -> Result<Client> {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));

    let client = Client::builder()
        .user_agent(USER_AGENT)
        .default_headers(headers)
        .timeout(timeout)
        .connect_timeout(timeout / 2)
        .redirect(reqwest::redirect::Policy::limited(5))
        .build()?;

    Ok(client)
}

/// GET `url` and return the body as HTML text.
///
/// Non-2xx responses become [`ScanError::Status`]. A declared non-HTML
/// content type or an empty body becomes [`ScanError::Parse`].
pub async fn fetch_html(client: &Client, url: &str) -> Result<String> {
    debug!("GET {}", url);

    let response = client.get(url).send().await?;
    let status = response.status();

    if !status.is_success() {
        return Err(ScanError::Status {
            status,
            url: url.to_string(),
        });
    }

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_ascii_lowercase());

    if let Some(ref content_type) = content_type
        && !content_type.contains("html")
    {
        return Err(ScanError::Parse(format!(
            "{} returned non-HTML content ({})",
            url, content_type
        )));
    }

    let body = response.text().await?;

    if body.trim().is_empty() {
        return Err(ScanError::Parse(format!("{} returned an empty body", url)));
    }

    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::{
        matchers::{header_exists, method, path},
        Mock, MockServer, ResponseTemplate,
    };

    #[tokio::test]
    async fn test_fetch_sends_browser_headers() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/page"))
            .and(header_exists("user-agent"))
            .and(header_exists("accept-language"))
            .respond_with(ResponseTemplate::new(200).set_body_raw("<html><body>ok</body></html>", "text/html"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = build_client(DEFAULT_TIMEOUT).unwrap();
        let body = fetch_html(&client, &format!("{}/page", mock_server.uri()))
            .await
            .unwrap();

        assert!(body.contains("ok"));
    }

    #[tokio::test]
    async fn test_non_success_status_is_fetch_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let client = build_client(DEFAULT_TIMEOUT).unwrap();
        let err = fetch_html(&client, &format!("{}/missing", mock_server.uri()))
            .await
            .unwrap_err();

        assert!(err.is_fetch());
        assert!(!err.is_parse());
    }

    #[tokio::test]
    async fn test_non_html_body_is_parse_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_raw("{\"a\":1}", "application/json"))
            .mount(&mock_server)
            .await;

        let client = build_client(DEFAULT_TIMEOUT).unwrap();
        let err = fetch_html(&client, &mock_server.uri()).await.unwrap_err();

        assert!(err.is_parse());
    }

    #[tokio::test]
    async fn test_empty_body_is_parse_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_raw("   \n", "text/html"))
            .mount(&mock_server)
            .await;

        let client = build_client(DEFAULT_TIMEOUT).unwrap();
        let err = fetch_html(&client, &mock_server.uri()).await.unwrap_err();

        assert!(err.is_parse());
    }
}
