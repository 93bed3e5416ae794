//! Page planning and retrieval for the paged message endpoint.
//!
//! The fetcher is deliberately split in two: [`PageFetcher`] is synchronous
//! bookkeeping (which pages have been requested, where the cursor sits,
//! what URL a page maps to) owned by the session on the UI task, while
//! [`fetch_page`] is a free async function with no access to shared state,
//! run on a spawned tokio task. All mutation of feed state happens in the
//! caller when the task's completion event arrives.

use serde::Deserialize;
use std::collections::HashSet;
use thiserror::Error;
use url::Url;

/// Path of the paged collection under the API base URL.
const COLLECTION_PATH: &str = "comments";

/// Errors that can occur while fetching a page.
///
/// Aborted fetches have no variant here: an aborted task never reports,
/// and a completion that arrives after an identity switch is rejected by
/// the session's generation check before it can touch state.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// HTTP response with non-2xx status code
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    /// Request exceeded the client-level timeout
    #[error("Request timed out")]
    Timeout,
    /// Response body was not the expected JSON array.
    /// Propagates exactly like a network failure: surfaced, retryable,
    /// never clears loaded entries.
    #[error("Malformed response: {0}")]
    Malformed(String),
}

/// One raw item from the upstream collection.
///
/// The endpoint is treated as opaque: any record with at least an `id` and
/// a `body` qualifies, and unknown keys are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RawItem {
    pub id: i64,
    pub body: String,
}

/// A planned request for one page, ready to execute.
///
/// Created through [`PageFetcher::begin_page`], which records the page in
/// the ledger at planning time — so holding a `PageRequest` means this
/// page index cannot be planned again for the current feed identity.
#[derive(Debug, Clone)]
pub struct PageRequest {
    pub page: usize,
    pub url: Url,
}

/// Plans page requests and tracks which pages were already requested.
///
/// Scoped to one feed identity: [`reset`](Self::reset) wipes the ledger
/// and the cursor when the conversation changes. Page 0 is the most recent
/// slice of history; higher indices reach further back, each covering
/// `[page * page_size, page * page_size + page_size)` items from the live
/// end via `_start`/`_limit` query parameters.
#[derive(Debug)]
pub struct PageFetcher {
    base_url: Url,
    page_size: usize,
    /// Pages requested for the current identity, recorded when the request
    /// is planned — not when it completes — so a slow in-flight page can
    /// never be re-issued by a second trigger.
    requested: HashSet<usize>,
    /// Highest page whose prepend has committed.
    cursor: usize,
}

impl PageFetcher {
    pub fn new(base_url: Url, page_size: usize) -> Self {
        Self {
            base_url,
            page_size,
            requested: HashSet::new(),
            cursor: 0,
        }
    }

    /// Clears the ledger and resets the cursor to page 0 (identity change).
    pub fn reset(&mut self) {
        self.requested.clear();
        self.cursor = 0;
    }

    /// The page an older-load should fetch next.
    pub fn next_older_page(&self) -> usize {
        self.cursor + 1
    }

    /// Moves the cursor forward after a prepend has committed.
    pub fn advance_cursor(&mut self, page: usize) {
        self.cursor = page;
    }

    /// Un-records a page whose request failed. The request is no longer
    /// outstanding and the cursor never advanced, so the next proximity
    /// trigger plans the same page again — that retry is the only path on
    /// which an index may be issued more than once.
    pub fn forget(&mut self, page: usize) {
        self.requested.remove(&page);
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Plans a request for `page`, or returns `None` if that page was
    /// already requested for this identity.
    pub fn begin_page(&mut self, page: usize) -> Option<PageRequest> {
        if !self.requested.insert(page) {
            tracing::debug!(page, "Page already requested, skipping");
            return None;
        }

        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(COLLECTION_PATH);
        }
        url.query_pairs_mut()
            .append_pair("_start", &(page * self.page_size).to_string())
            .append_pair("_limit", &self.page_size.to_string());

        Some(PageRequest { page, url })
    }
}

/// Executes a planned page request.
///
/// Pure network call: no shared state is read or written here. Transport
/// timeout policy lives on the `reqwest::Client` the host built.
///
/// # Errors
///
/// - [`FetchError::Timeout`] — the client-level timeout elapsed
/// - [`FetchError::Network`] — connection, DNS, or TLS failure
/// - [`FetchError::HttpStatus`] — non-2xx response
/// - [`FetchError::Malformed`] — body did not decode as a JSON item array
pub async fn fetch_page(
    client: &reqwest::Client,
    request: &PageRequest,
) -> Result<Vec<RawItem>, FetchError> {
    let response = client
        .get(request.url.clone())
        .send()
        .await
        .map_err(classify)?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::HttpStatus(status.as_u16()));
    }

    let body = response.text().await.map_err(classify)?;
    let items: Vec<RawItem> =
        serde_json::from_str(&body).map_err(|e| FetchError::Malformed(e.to_string()))?;

    tracing::debug!(page = request.page, count = items.len(), "Fetched page");
    Ok(items)
}

fn classify(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout
    } else {
        FetchError::Network(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fetcher_for(server: &MockServer, page_size: usize) -> PageFetcher {
        PageFetcher::new(Url::parse(&server.uri()).unwrap(), page_size)
    }

    fn items_json(ids: std::ops::Range<i64>) -> serde_json::Value {
        serde_json::Value::Array(
            ids.map(|id| {
                serde_json::json!({
                    "id": id,
                    "name": "quidem molestiae",
                    "email": "someone@example.org",
                    "body": format!("body {id}")
                })
            })
            .collect(),
        )
    }

    #[test]
    fn begin_page_builds_offset_and_limit() {
        let mut fetcher = PageFetcher::new(Url::parse("https://api.example.com").unwrap(), 30);
        let request = fetcher.begin_page(2).unwrap();
        assert_eq!(request.page, 2);
        assert_eq!(
            request.url.as_str(),
            "https://api.example.com/comments?_start=60&_limit=30"
        );
    }

    #[test]
    fn ledger_blocks_duplicate_pages_until_reset() {
        let mut fetcher = PageFetcher::new(Url::parse("https://api.example.com").unwrap(), 30);
        assert!(fetcher.begin_page(0).is_some());
        assert!(fetcher.begin_page(0).is_none());
        assert!(fetcher.begin_page(1).is_some());

        fetcher.reset();
        assert!(fetcher.begin_page(0).is_some());
    }

    #[test]
    fn forgetting_a_failed_page_allows_a_retry() {
        let mut fetcher = PageFetcher::new(Url::parse("https://api.example.com").unwrap(), 30);
        assert!(fetcher.begin_page(1).is_some());
        assert!(fetcher.begin_page(1).is_none());

        fetcher.forget(1);
        assert!(fetcher.begin_page(1).is_some());
    }

    #[test]
    fn cursor_tracks_committed_pages() {
        let mut fetcher = PageFetcher::new(Url::parse("https://api.example.com").unwrap(), 30);
        assert_eq!(fetcher.next_older_page(), 1);
        fetcher.advance_cursor(1);
        assert_eq!(fetcher.next_older_page(), 2);
        fetcher.reset();
        assert_eq!(fetcher.next_older_page(), 1);
    }

    #[tokio::test]
    async fn fetch_decodes_items_and_ignores_extra_fields() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/comments"))
            .and(query_param("_start", "0"))
            .and(query_param("_limit", "5"))
            .respond_with(ResponseTemplate::new(200).set_body_json(items_json(1..6)))
            .mount(&server)
            .await;

        let mut fetcher = fetcher_for(&server, 5);
        let request = fetcher.begin_page(0).unwrap();
        let items = fetch_page(&reqwest::Client::new(), &request).await.unwrap();

        assert_eq!(items.len(), 5);
        assert_eq!(items[0], RawItem { id: 1, body: "body 1".to_string() });
    }

    #[tokio::test]
    async fn fetch_empty_array_is_ok_and_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .mount(&server)
            .await;

        let mut fetcher = fetcher_for(&server, 30);
        let request = fetcher.begin_page(3).unwrap();
        let items = fetch_page(&reqwest::Client::new(), &request).await.unwrap();
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn fetch_http_error_maps_to_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let mut fetcher = fetcher_for(&server, 30);
        let request = fetcher.begin_page(0).unwrap();
        let err = fetch_page(&reqwest::Client::new(), &request)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::HttpStatus(500)));
    }

    #[tokio::test]
    async fn fetch_non_json_body_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
            .mount(&server)
            .await;

        let mut fetcher = fetcher_for(&server, 30);
        let request = fetcher.begin_page(0).unwrap();
        let err = fetch_page(&reqwest::Client::new(), &request)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Malformed(_)));
    }
}
