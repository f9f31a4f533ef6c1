use anyhow::Result;
use async_trait::async_trait;
use reqwest::{Client, ClientBuilder, StatusCode};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, warn};

use crate::config::Config;
use crate::error::FetchError;
use crate::scrapers::PageFetcher;

pub fn create_client(config: &Config) -> Result<Client> {
    let client = ClientBuilder::new()
        .user_agent(&config.user_agent)
        .timeout(Duration::from_secs(config.request_timeout_seconds))
        .pool_max_idle_per_host(6)
        .build()?;

    Ok(client)
}

/// Upper bound on the wait between two attempts.
pub const MAX_RETRY_DELAY: Duration = Duration::from_secs(60);

/// Wait before the attempt following attempt number `attempt` (1-based):
/// the base delay doubled per failed attempt, capped at [`MAX_RETRY_DELAY`].
pub fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
    base.saturating_mul(factor).min(MAX_RETRY_DELAY)
}

/// Fetches listing pages over HTTP, classifying 404/410 as not-found and
/// retrying everything else that looks transient.
pub struct HttpPageFetcher {
    client: Client,
    /// Total tries per page, the first request included.
    max_attempts: u32,
    retry_base_delay: Duration,
}

impl HttpPageFetcher {
    pub fn new(client: Client, max_attempts: u32, retry_base_delay: Duration) -> Self {
        Self {
            client,
            max_attempts: max_attempts.max(1),
            retry_base_delay,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(
            create_client(config)?,
            config.max_attempts,
            Duration::from_millis(config.retry_base_delay_ms),
        ))
    }

    async fn fetch_once(&self, url: &str) -> Result<String, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| FetchError::Transport {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND || status == StatusCode::GONE {
            return Err(FetchError::NotFound {
                url: url.to_string(),
            });
        }
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            });
        }

        response.text().await.map_err(|source| FetchError::Transport {
            url: url.to_string(),
            source,
        })
    }
}

fn is_retryable(error: &FetchError) -> bool {
    match error {
        FetchError::NotFound { .. } | FetchError::InvalidUrl { .. } => false,
        FetchError::Status { status, .. } => {
            status.is_server_error() || *status == StatusCode::TOO_MANY_REQUESTS
        }
        FetchError::Transport { .. } => true,
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let mut attempts = 0;

        loop {
            attempts += 1;
            debug!("Fetching {} (attempt {}/{})", url, attempts, self.max_attempts);

            match self.fetch_once(url).await {
                Ok(body) => return Ok(body),
                Err(e) if attempts < self.max_attempts && is_retryable(&e) => {
                    let delay = backoff_delay(self.retry_base_delay, attempts);
                    warn!("{}; retrying in {:?} (attempt {}/{})", e, delay, attempts + 1, self.max_attempts);
                    sleep(delay).await;
                }
                Err(e) => {
                    if !e.is_not_found() {
                        error!("Giving up on {} after {} attempts: {}", url, attempts, e);
                    }
                    return Err(e);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fetcher(max_attempts: u32) -> HttpPageFetcher {
        HttpPageFetcher::new(Client::new(), max_attempts, Duration::from_millis(1))
    }

    #[test]
    fn backoff_doubles_and_saturates_at_the_cap() {
        let base = Duration::from_millis(100);
        assert_eq!(backoff_delay(base, 1), Duration::from_millis(100));
        assert_eq!(backoff_delay(base, 2), Duration::from_millis(200));
        assert_eq!(backoff_delay(base, 4), Duration::from_millis(800));
        assert_eq!(backoff_delay(base, 33), MAX_RETRY_DELAY);
        assert_eq!(backoff_delay(base, u32::MAX), MAX_RETRY_DELAY);
        assert_eq!(backoff_delay(Duration::MAX, 2), MAX_RETRY_DELAY);
        assert_eq!(backoff_delay(Duration::ZERO, 40), Duration::ZERO);
    }

    #[tokio::test]
    async fn many_attempts_against_a_failing_host_end_in_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .expect(40)
            .mount(&server)
            .await;

        let err = HttpPageFetcher::new(Client::new(), 40, Duration::ZERO)
            .fetch(&format!("{}/lacteos/page/1/", server.uri()))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            FetchError::Status { status, .. } if status == StatusCode::INTERNAL_SERVER_ERROR
        ));
    }

    #[tokio::test]
    async fn returns_page_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/lacteos/page/1/"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
            .mount(&server)
            .await;

        let body = fetcher(1)
            .fetch(&format!("{}/lacteos/page/1/", server.uri()))
            .await
            .unwrap();

        assert_eq!(body, "<html>ok</html>");
    }

    #[tokio::test]
    async fn classifies_404_as_not_found_without_retrying() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let err = fetcher(3)
            .fetch(&format!("{}/lacteos/page/9/", server.uri()))
            .await
            .unwrap_err();

        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn server_errors_are_retried_then_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .expect(3)
            .mount(&server)
            .await;

        let err = fetcher(3)
            .fetch(&format!("{}/lacteos/page/1/", server.uri()))
            .await
            .unwrap_err();

        assert!(!err.is_not_found());
        assert!(matches!(
            err,
            FetchError::Status { status, .. } if status == StatusCode::INTERNAL_SERVER_ERROR
        ));
    }

    #[tokio::test]
    async fn client_errors_other_than_not_found_fail_fast() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403))
            .expect(1)
            .mount(&server)
            .await;

        let err = fetcher(3)
            .fetch(&format!("{}/lacteos/page/1/", server.uri()))
            .await
            .unwrap_err();

        assert!(matches!(err, FetchError::Status { status, .. } if status == StatusCode::FORBIDDEN));
    }
}
