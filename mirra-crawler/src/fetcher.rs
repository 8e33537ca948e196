use crate::error::{MirrorError, Result};
use crate::filter::host_key;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use std::time::{Duration, Instant};
use tracing::debug;
use url::Url;

pub const USER_AGENT: &str = concat!("Mozilla/5.0 (compatible; Mirra/", env!("CARGO_PKG_VERSION"), ")");

const MAX_REDIRECTS: usize = 5;

/// A successful (2xx) response, fully buffered
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub url: Url,
    pub status_code: u16,
    pub content_type: String,
    pub body: Vec<u8>,
    pub response_time: Duration,
}

impl FetchedPage {
    pub fn is_html(&self) -> bool {
        is_html(&self.content_type)
    }

    pub fn is_css(&self) -> bool {
        is_css(&self.content_type)
    }
}

pub fn is_html(content_type: &str) -> bool {
    content_type.to_lowercase().contains("text/html")
}

pub fn is_css(content_type: &str) -> bool {
    content_type.to_lowercase().contains("css")
}

/// Shared, pooled HTTP client scoped to one root host.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    pub fn new(root_host: &str, timeout_secs: u64) -> Result<Self> {
        let root_host = root_host.to_string();
        // Redirects are followed only while they stay on the root host
        let redirect_policy = reqwest::redirect::Policy::custom(move |attempt| {
            if attempt.previous().len() >= MAX_REDIRECTS {
                attempt.error("too many redirects")
            } else if host_key(attempt.url()).as_deref() == Some(root_host.as_str()) {
                attempt.follow()
            } else {
                attempt.stop()
            }
        });

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(timeout_secs.div_ceil(2)))
            .pool_max_idle_per_host(50)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .redirect(redirect_policy)
            .build()?;

        Ok(Self { client })
    }

    /// GET `url`; transport errors and non-2xx statuses are both failures.
    pub async fn fetch(&self, url: &Url) -> Result<FetchedPage> {
        debug!("Fetching {}", url);

        let start = Instant::now();
        let response = self.client.get(url.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(MirrorError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let final_url = response.url().clone();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();

        let body = response.bytes().await?.to_vec();

        Ok(FetchedPage {
            url: final_url,
            status_code: status.as_u16(),
            content_type,
            body,
            response_time: start.elapsed(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{header, method, path},
    };

    fn fetcher_for(server: &MockServer) -> Fetcher {
        let url = Url::parse(&server.uri()).unwrap();
        Fetcher::new(&host_key(&url).unwrap(), 5).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_success_sends_user_agent() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/style.css"))
            .and(header("user-agent", USER_AGENT))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/css")
                    .set_body_bytes(b"body { color: red; }"),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let url = Url::parse(&format!("{}/style.css", mock_server.uri())).unwrap();
        let page = fetcher_for(&mock_server).fetch(&url).await.unwrap();

        assert_eq!(page.status_code, 200);
        assert!(page.is_css());
        assert!(!page.is_html());
        assert_eq!(page.body, b"body { color: red; }");
    }

    #[tokio::test]
    async fn test_non_success_status_is_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let url = Url::parse(&format!("{}/missing", mock_server.uri())).unwrap();
        let err = fetcher_for(&mock_server).fetch(&url).await.unwrap_err();

        assert!(matches!(err, MirrorError::Status { status: 404, .. }));
    }

    #[tokio::test]
    async fn test_same_host_redirect_is_followed() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/old"))
            .respond_with(
                ResponseTemplate::new(301).insert_header("location", format!("{}/new", mock_server.uri())),
            )
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path("/new"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/html")
                    .set_body_bytes(b"<html></html>"),
            )
            .mount(&mock_server)
            .await;

        let url = Url::parse(&format!("{}/old", mock_server.uri())).unwrap();
        let page = fetcher_for(&mock_server).fetch(&url).await.unwrap();

        assert_eq!(page.url.path(), "/new");
        assert!(page.is_html());
    }

    #[tokio::test]
    async fn test_off_host_redirect_is_not_followed() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/away"))
            .respond_with(
                ResponseTemplate::new(302).insert_header("location", "http://other.invalid/landing"),
            )
            .mount(&mock_server)
            .await;

        let url = Url::parse(&format!("{}/away", mock_server.uri())).unwrap();
        let err = fetcher_for(&mock_server).fetch(&url).await.unwrap_err();

        assert!(matches!(err, MirrorError::Status { status: 302, .. }));
    }
}
