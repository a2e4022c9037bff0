use std::time::Duration;

use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt};
use reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, ETAG, IF_MODIFIED_SINCE, IF_NONE_MATCH, LAST_MODIFIED,
};
use reqwest::{Client, Response, StatusCode};

use crate::app::{MirrorError, Result};
use crate::domain::ResourceMetadata;
use crate::fetcher::{FetchOutcome, Fetcher};

#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub user_agent: String,
    pub connect_timeout: Duration,
    /// Overall per-request deadline; `None` leaves large downloads unbounded
    pub request_timeout: Option<Duration>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            user_agent: concat!("csv-mirror/", env!("CARGO_PKG_VERSION")).to_string(),
            connect_timeout: Duration::from_secs(30),
            request_timeout: None,
        }
    }
}

pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(options: &ClientOptions) -> Result<Self> {
        let mut builder = Client::builder()
            .connect_timeout(options.connect_timeout)
            .gzip(true)
            .brotli(true)
            .user_agent(options.user_agent.as_str());

        if let Some(timeout) = options.request_timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
        })
    }

    async fn send(&self, url: &str, prior: &ResourceMetadata) -> Result<FetchOutcome> {
        let mut headers = HeaderMap::new();
        let last_modified = prior.last_modified.as_deref();
        insert_precondition(&mut headers, IF_MODIFIED_SINCE, last_modified, url);
        insert_precondition(&mut headers, IF_NONE_MATCH, prior.etag.as_deref(), url);

        let response = self.client.get(url).headers(headers).send().await?;

        match response.status() {
            StatusCode::NOT_MODIFIED => Ok(FetchOutcome::Unchanged),
            StatusCode::OK => {
                let metadata = ResourceMetadata::new(
                    header_string(&response, LAST_MODIFIED),
                    header_string(&response, ETAG),
                );
                let body = response.bytes_stream().map_err(MirrorError::from).boxed();
                Ok(FetchOutcome::Fetched { body, metadata })
            }
            status => Err(MirrorError::UnexpectedStatus {
                url: url.to_string(),
                status,
            }),
        }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str, prior: &ResourceMetadata) -> FetchOutcome {
        self.send(url, prior)
            .await
            .unwrap_or_else(|cause| FetchOutcome::Failed { cause })
    }
}

fn insert_precondition(headers: &mut HeaderMap, name: HeaderName, value: Option<&str>, url: &str) {
    let Some(value) = value else {
        return;
    };

    match HeaderValue::from_str(value) {
        Ok(value) => {
            headers.insert(name, value);
        }
        Err(_) => {
            tracing::warn!(url, header = %name, value, "Skipping invalid stored header value");
        }
    }
}

fn header_string(response: &Response, name: HeaderName) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(String::from)
}

#[cfg(test)]
mod tests {
    use httpmock::prelude::*;

    use super::*;
    use crate::fetcher::BodyStream;

    const LAST_MODIFIED_VALUE: &str = "Mon, 01 Jun 2025 00:00:00 GMT";

    fn fetcher() -> HttpFetcher {
        HttpFetcher::new(&ClientOptions::default()).unwrap()
    }

    async fn collect(body: BodyStream) -> Vec<u8> {
        body.try_fold(Vec::new(), |mut acc, chunk| async move {
            acc.extend_from_slice(&chunk);
            Ok(acc)
        })
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_fetch_without_prior_metadata() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/data.csv")
                .header_missing("if-none-match")
                .header_missing("if-modified-since");
            then.status(200)
                .header("ETag", "\"v1\"")
                .header("Last-Modified", LAST_MODIFIED_VALUE)
                .body("a,b\n1,2\n");
        });

        let outcome = fetcher()
            .fetch(&server.url("/data.csv"), &ResourceMetadata::default())
            .await;

        match outcome {
            FetchOutcome::Fetched { body, metadata } => {
                assert_eq!(metadata.etag.as_deref(), Some("\"v1\""));
                assert_eq!(metadata.last_modified.as_deref(), Some(LAST_MODIFIED_VALUE));
                assert_eq!(collect(body).await, b"a,b\n1,2\n");
            }
            other => panic!("expected Fetched, got {:?}", other),
        }
        mock.assert();
    }

    #[tokio::test]
    async fn test_sends_both_preconditions_and_maps_304() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/data.csv")
                .header("if-none-match", "\"v1\"")
                .header("if-modified-since", LAST_MODIFIED_VALUE);
            then.status(304);
        });

        let prior = ResourceMetadata::new(Some(LAST_MODIFIED_VALUE.into()), Some("\"v1\"".into()));
        let outcome = fetcher().fetch(&server.url("/data.csv"), &prior).await;

        assert!(matches!(outcome, FetchOutcome::Unchanged));
        mock.assert();
    }

    #[tokio::test]
    async fn test_missing_response_headers_clear_metadata() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/data.csv");
            then.status(200).body("x\n");
        });

        let prior = ResourceMetadata::new(Some(LAST_MODIFIED_VALUE.into()), Some("\"v1\"".into()));
        let outcome = fetcher().fetch(&server.url("/data.csv"), &prior).await;

        match outcome {
            FetchOutcome::Fetched { metadata, .. } => {
                assert_eq!(metadata, ResourceMetadata::default());
            }
            other => panic!("expected Fetched, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unexpected_status_is_failure() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(GET).path("/gone.csv");
            then.status(404);
        });

        let outcome = fetcher()
            .fetch(&server.url("/gone.csv"), &ResourceMetadata::default())
            .await;

        match outcome {
            FetchOutcome::Failed {
                cause: MirrorError::UnexpectedStatus { status, .. },
            } => assert_eq!(status, StatusCode::NOT_FOUND),
            other => panic!("expected Failed, got {:?}", other),
        }
        // single attempt, no retry
        mock.assert_calls(1);
    }

    #[tokio::test]
    async fn test_other_success_status_is_failure() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/empty.csv");
            then.status(204);
        });

        let outcome = fetcher()
            .fetch(&server.url("/empty.csv"), &ResourceMetadata::default())
            .await;

        assert!(matches!(outcome, FetchOutcome::Failed { .. }));
    }

    #[tokio::test]
    async fn test_transport_error_is_failure() {
        let outcome = fetcher()
            .fetch("http://127.0.0.1:1/data.csv", &ResourceMetadata::default())
            .await;

        assert!(matches!(
            outcome,
            FetchOutcome::Failed {
                cause: MirrorError::Http(_)
            }
        ));
    }

    #[tokio::test]
    async fn test_invalid_stored_etag_is_skipped() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/data.csv")
                .header_missing("if-none-match");
            then.status(200).body("x\n");
        });

        let prior = ResourceMetadata::new(None, Some("bad\nvalue".into()));
        let outcome = fetcher().fetch(&server.url("/data.csv"), &prior).await;

        assert!(matches!(outcome, FetchOutcome::Fetched { .. }));
        mock.assert();
    }
}
