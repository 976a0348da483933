//! Bounded remote fetch
//!
//! Retrieves a URL that passed the guard, enforcing the download ceiling on
//! both the declared and the actual body size, and classifies the bytes
//! with the shared policy.
//!
//! The transport sits behind [`HttpSource`] so the size and classification
//! logic can run against an in-memory source. [`ReqwestSource`] is the real
//! transport: it follows redirects itself, re-validating every hop, and pins
//! each connection to addresses that were resolved and checked first.

use crate::classify::{guess_content_type, summarize, UNKNOWN_CONTENT_TYPE};
use crate::config::AnalyzerConfig;
use crate::guard;
use crate::types::AnalysisResult;
use crate::{Error, Result};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE, LOCATION};
use reqwest::redirect::Policy;
use reqwest::StatusCode;
use std::net::SocketAddr;
use std::time::Duration;
use url::{Host, Url};

/// Result message for URLs rejected by the guard
pub const BLOCKED_MESSAGE: &str = "URL not allowed for security reasons.";

/// Prefix for transport failures
pub const FETCH_FAILED_PREFIX: &str = "Failed to fetch or analyze URL: ";

const USER_AGENT: &str = concat!("fileurl/", env!("CARGO_PKG_VERSION"));

/// A response whose body is read incrementally
#[async_trait]
pub trait RemoteBody: Send {
    /// Declared body size from the Content-Length header
    fn content_length(&self) -> Option<u64>;

    /// Declared Content-Type header
    fn content_type(&self) -> Option<String>;

    /// Next chunk of the body, `None` at the end
    async fn next_chunk(&mut self) -> Result<Option<Bytes>>;
}

/// Issues the GET request for a validated URL
#[async_trait]
pub trait HttpSource: Send + Sync {
    async fn get(&self, url: &Url) -> Result<Box<dyn RemoteBody>>;
}

/// Bounded fetcher over an [`HttpSource`]
pub struct Fetcher<S = ReqwestSource> {
    source: S,
    timeout: Duration,
}

impl Fetcher<ReqwestSource> {
    /// Create a fetcher using the real HTTP transport
    pub fn new(config: &AnalyzerConfig) -> Self {
        Self {
            source: ReqwestSource::new(config.fetch_timeout, config.max_redirects),
            timeout: config.fetch_timeout,
        }
    }
}

impl<S: HttpSource> Fetcher<S> {
    /// Create a fetcher over a custom source
    pub fn with_source(source: S, timeout: Duration) -> Self {
        Self { source, timeout }
    }

    /// Fetch `url` and summarize its body, never reading more than
    /// `max_bytes` plus one chunk
    ///
    /// Every failure is returned as an [`AnalysisResult::Error`]. A URL that
    /// fails [`guard::is_safe`] is rejected before the source is touched.
    pub async fn fetch_and_classify(&self, url: &str, max_bytes: u64) -> AnalysisResult {
        let parsed = match guard::check_url(url) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!("Rejected URL {}: {}", url, e);
                return AnalysisResult::error(BLOCKED_MESSAGE);
            }
        };

        tracing::info!("Fetching {}", parsed);

        match tokio::time::timeout(self.timeout, self.fetch_bounded(&parsed, max_bytes)).await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) if e.is_too_large() => {
                tracing::warn!("{}: {}", parsed, e);
                AnalysisResult::error(e.to_string())
            }
            Ok(Err(e)) => {
                tracing::warn!("Fetch failed for {}: {}", parsed, e);
                AnalysisResult::error(format!("{}{}", FETCH_FAILED_PREFIX, e))
            }
            Err(_) => {
                tracing::warn!("Fetch timed out for {}", parsed);
                AnalysisResult::error(format!(
                    "{}{}",
                    FETCH_FAILED_PREFIX,
                    Error::Timeout(self.timeout)
                ))
            }
        }
    }

    async fn fetch_bounded(&self, url: &Url, max_bytes: u64) -> Result<AnalysisResult> {
        let mut body = self.source.get(url).await?;

        if let Some(declared) = body.content_length() {
            if declared > max_bytes {
                return Err(Error::too_large("Remote file", max_bytes));
            }
        }

        let content_type = body
            .content_type()
            .or_else(|| guess_content_type(url.path()).map(str::to_string))
            .unwrap_or_else(|| UNKNOWN_CONTENT_TYPE.to_string());

        // Content-Length may be absent or wrong, so count what arrives
        let mut buf: Vec<u8> = Vec::new();
        while let Some(chunk) = body.next_chunk().await? {
            if (buf.len() + chunk.len()) as u64 > max_bytes {
                return Err(Error::too_large("Downloaded file", max_bytes));
            }
            buf.extend_from_slice(&chunk);
        }

        Ok(summarize(&content_type, &buf))
    }
}

/// HTTP transport built on reqwest
#[derive(Debug, Clone)]
pub struct ReqwestSource {
    timeout: Duration,
    max_redirects: usize,
}

impl ReqwestSource {
    pub fn new(timeout: Duration, max_redirects: usize) -> Self {
        Self {
            timeout,
            max_redirects,
        }
    }

    /// Build a client whose DNS for `url`'s host is pinned to checked addresses
    async fn client_for(&self, url: &Url) -> Result<reqwest::Client> {
        let mut builder = reqwest::Client::builder()
            .redirect(Policy::none())
            .no_proxy()
            .timeout(self.timeout)
            .user_agent(USER_AGENT);

        if let Some(Host::Domain(domain)) = url.host() {
            let port = url.port_or_known_default().unwrap_or(80);
            let addrs = resolve_checked(domain, port).await?;
            builder = builder.resolve_to_addrs(domain, &addrs);
        }

        Ok(builder.build()?)
    }
}

#[async_trait]
impl HttpSource for ReqwestSource {
    async fn get(&self, url: &Url) -> Result<Box<dyn RemoteBody>> {
        let mut current = url.clone();

        for _ in 0..=self.max_redirects {
            guard::check_parsed(&current)?;

            let client = self.client_for(&current).await?;
            let response = client.get(current.clone()).send().await?;

            let location = response
                .headers()
                .get(LOCATION)
                .and_then(|v| v.to_str().ok());
            match redirect_target(&current, response.status(), location)? {
                Some(next) => {
                    tracing::debug!("Redirect {} -> {}", current, next);
                    current = next;
                }
                None => {
                    if !response.status().is_success() {
                        tracing::warn!("{} answered {}", current, response.status());
                    }
                    return Ok(Box::new(ReqwestBody { response }));
                }
            }
        }

        Err(Error::RedirectLimit(self.max_redirects))
    }
}

struct ReqwestBody {
    response: reqwest::Response,
}

#[async_trait]
impl RemoteBody for ReqwestBody {
    fn content_length(&self) -> Option<u64> {
        self.response
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse().ok())
    }

    fn content_type(&self) -> Option<String> {
        self.response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    }

    async fn next_chunk(&mut self) -> Result<Option<Bytes>> {
        Ok(self.response.chunk().await?)
    }
}

/// Next URL to request, or `None` when `status` is not a followable redirect
fn redirect_target(current: &Url, status: StatusCode, location: Option<&str>) -> Result<Option<Url>> {
    if !matches!(status.as_u16(), 301 | 302 | 303 | 307 | 308) {
        return Ok(None);
    }

    let location = location
        .filter(|l| !l.is_empty())
        .ok_or_else(|| Error::invalid_url(format!("redirect from {} without Location", current)))?;

    current
        .join(location)
        .map(Some)
        .map_err(|e| Error::invalid_url(format!("redirect Location '{}': {}", location, e)))
}

/// Resolve `domain` and reject it if any address is not public
///
/// # Security
/// The returned addresses are handed to the client as a DNS override, so
/// the connection goes to exactly what was checked here.
async fn resolve_checked(domain: &str, port: u16) -> Result<Vec<SocketAddr>> {
    let addrs: Vec<SocketAddr> = tokio::net::lookup_host((domain, port))
        .await
        .map_err(|e| Error::NotFound(format!("{}: {}", domain, e)))?
        .collect();

    if addrs.is_empty() {
        return Err(Error::NotFound(domain.to_string()));
    }

    if let Some(bad) = addrs.iter().find(|a| guard::is_blocked_ip(a.ip())) {
        return Err(Error::blocked(format!(
            "{} resolves to non-public address {}",
            domain,
            bad.ip()
        )));
    }

    Ok(addrs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_MAX_SIZE;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// In-memory source: serves `body` in `chunk_size` pieces
    struct MockSource {
        calls: Arc<AtomicUsize>,
        pulled: Arc<AtomicUsize>,
        content_length: Option<u64>,
        content_type: Option<String>,
        body: Vec<u8>,
        chunk_size: usize,
        fail: Option<fn() -> Error>,
        delay: Option<Duration>,
    }

    impl MockSource {
        fn new(content_type: Option<&str>, body: &[u8]) -> Self {
            Self {
                calls: Arc::new(AtomicUsize::new(0)),
                pulled: Arc::new(AtomicUsize::new(0)),
                content_length: Some(body.len() as u64),
                content_type: content_type.map(str::to_string),
                body: body.to_vec(),
                chunk_size: 64 * 1024,
                fail: None,
                delay: None,
            }
        }
    }

    struct MockBody {
        pulled: Arc<AtomicUsize>,
        content_length: Option<u64>,
        content_type: Option<String>,
        chunks: std::collections::VecDeque<Bytes>,
    }

    #[async_trait]
    impl RemoteBody for MockBody {
        fn content_length(&self) -> Option<u64> {
            self.content_length
        }

        fn content_type(&self) -> Option<String> {
            self.content_type.clone()
        }

        async fn next_chunk(&mut self) -> Result<Option<Bytes>> {
            let chunk = self.chunks.pop_front();
            if let Some(c) = &chunk {
                self.pulled.fetch_add(c.len(), Ordering::SeqCst);
            }
            Ok(chunk)
        }
    }

    #[async_trait]
    impl HttpSource for MockSource {
        async fn get(&self, _url: &Url) -> Result<Box<dyn RemoteBody>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if let Some(fail) = self.fail {
                return Err(fail());
            }
            Ok(Box::new(MockBody {
                pulled: self.pulled.clone(),
                content_length: self.content_length,
                content_type: self.content_type.clone(),
                chunks: self
                    .body
                    .chunks(self.chunk_size)
                    .map(Bytes::copy_from_slice)
                    .collect(),
            }))
        }
    }

    fn fetcher(source: MockSource) -> Fetcher<MockSource> {
        Fetcher::with_source(source, Duration::from_secs(10))
    }

    #[tokio::test]
    async fn test_blocked_url_never_reaches_source() {
        let source = MockSource::new(Some("text/plain"), b"secret");
        let calls = source.calls.clone();
        let fetcher = fetcher(source);

        for url in ["http://localhost", "http://10.0.0.1/", "http://[::1]/", "not-a-url"] {
            let result = fetcher.fetch_and_classify(url, DEFAULT_MAX_SIZE).await;
            assert_eq!(result.error_message(), Some(BLOCKED_MESSAGE));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_text_response() {
        let fetcher = fetcher(MockSource::new(Some("text/plain"), b"hello world"));
        let result = fetcher
            .fetch_and_classify("http://example.com/file.txt", DEFAULT_MAX_SIZE)
            .await;

        match result {
            AnalysisResult::Text(t) => {
                assert_eq!(t.content_type, "text/plain");
                assert_eq!(t.byte_size, 11);
                assert_eq!(t.preview, "hello world");
                assert_eq!(t.line_count, 1);
                assert_eq!(t.word_count, 2);
            }
            other => panic!("Expected text, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_long_text_preview_is_truncated() {
        let body = "a".repeat(2000);
        let fetcher = fetcher(MockSource::new(Some("text/plain"), body.as_bytes()));
        let result = fetcher
            .fetch_and_classify("https://example.com/long", DEFAULT_MAX_SIZE)
            .await;

        match result {
            AnalysisResult::Text(t) => {
                assert_eq!(t.byte_size, 2000);
                assert_eq!(t.preview, "a".repeat(500));
            }
            other => panic!("Expected text, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_binary_response() {
        let fetcher = fetcher(MockSource::new(
            Some("application/octet-stream"),
            &[0x00, 0x01, 0x02, 0x03],
        ));
        let result = fetcher
            .fetch_and_classify("http://example.com/file.bin", DEFAULT_MAX_SIZE)
            .await;

        match result {
            AnalysisResult::Binary(b) => {
                assert_eq!(b.byte_size, 4);
                assert_eq!(b.preview_bytes, "00010203");
            }
            other => panic!("Expected binary, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_content_type_falls_back_to_extension() {
        let fetcher = fetcher(MockSource::new(None, b"plain words"));
        let result = fetcher
            .fetch_and_classify("http://example.com/readme.txt", DEFAULT_MAX_SIZE)
            .await;
        assert_eq!(result.kind(), "text");

        let fetcher = self::fetcher(MockSource::new(None, b"??"));
        let result = fetcher
            .fetch_and_classify("http://example.com/blob", DEFAULT_MAX_SIZE)
            .await;
        match result {
            AnalysisResult::Binary(b) => assert_eq!(b.content_type, "unknown"),
            other => panic!("Expected binary, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_declared_size_too_large() {
        let mut source = MockSource::new(Some("text/plain"), b"small");
        source.content_length = Some(6 * 1024 * 1024);
        let pulled = source.pulled.clone();

        let result = fetcher(source)
            .fetch_and_classify("http://example.com/huge.txt", DEFAULT_MAX_SIZE)
            .await;

        assert_eq!(result.error_message(), Some("Remote file too large (>5 MB)"));
        assert_eq!(pulled.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_actual_size_too_large_stops_early() {
        let body = vec![b'a'; 6 * 1024 * 1024];
        let mut source = MockSource::new(Some("text/plain"), &body);
        source.content_length = None;
        let chunk_size = source.chunk_size;
        let pulled = source.pulled.clone();

        let result = fetcher(source)
            .fetch_and_classify("http://example.com/huge.txt", DEFAULT_MAX_SIZE)
            .await;

        let message = result.error_message().unwrap();
        assert!(message.contains("too large"));
        assert!(pulled.load(Ordering::SeqCst) <= DEFAULT_MAX_SIZE as usize + chunk_size);
    }

    #[tokio::test]
    async fn test_understated_content_length_still_bounded() {
        let body = vec![0u8; 2048];
        let mut source = MockSource::new(Some("application/octet-stream"), &body);
        source.content_length = Some(10);
        source.chunk_size = 256;

        let result = fetcher(source)
            .fetch_and_classify("http://example.com/x", 1024)
            .await;
        assert_eq!(result.error_message(), Some("Downloaded file too large (>0 MB)"));
    }

    #[tokio::test]
    async fn test_body_at_exact_ceiling() {
        let mut source = MockSource::new(Some("application/octet-stream"), &[7u8; 1024]);
        source.content_length = None;
        source.chunk_size = 100;
        let result = fetcher(source)
            .fetch_and_classify("http://example.com/edge", 1024)
            .await;
        assert_eq!(result.byte_size(), Some(1024));

        let mut source = MockSource::new(Some("application/octet-stream"), &[7u8; 1025]);
        source.content_length = None;
        source.chunk_size = 100;
        let result = fetcher(source)
            .fetch_and_classify("http://example.com/edge", 1024)
            .await;
        assert!(result.error_message().unwrap().starts_with("Downloaded file too large"));
    }

    #[tokio::test]
    async fn test_transport_error_is_reported() {
        let mut source = MockSource::new(None, b"");
        source.fail = Some(|| Error::Timeout(Duration::from_secs(10)));

        let result = fetcher(source)
            .fetch_and_classify("http://example.com/slow", DEFAULT_MAX_SIZE)
            .await;

        let message = result.error_message().unwrap();
        assert!(message.starts_with(FETCH_FAILED_PREFIX));
        assert!(message.contains("timed out"));
    }

    #[tokio::test]
    async fn test_deadline_cancels_fetch() {
        let mut source = MockSource::new(Some("text/plain"), b"late");
        source.delay = Some(Duration::from_secs(5));

        let fetcher = Fetcher::with_source(source, Duration::from_millis(50));
        let result = fetcher
            .fetch_and_classify("http://example.com/slow", DEFAULT_MAX_SIZE)
            .await;

        let message = result.error_message().unwrap();
        assert!(message.starts_with(FETCH_FAILED_PREFIX));
        assert!(message.contains("timed out"));
    }

    #[tokio::test]
    async fn test_repeated_fetch_is_identical() {
        let fetcher = fetcher(MockSource::new(Some("text/plain"), b"same bytes\n"));
        let first = fetcher
            .fetch_and_classify("http://example.com/a.txt", DEFAULT_MAX_SIZE)
            .await;
        let second = fetcher
            .fetch_and_classify("http://example.com/a.txt", DEFAULT_MAX_SIZE)
            .await;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_reqwest_source_rejects_blocked_target() {
        // Rejected by the guard before any socket is opened
        let source = ReqwestSource::new(Duration::from_secs(1), 3);
        let url = Url::parse("http://127.0.0.1:9/").unwrap();
        let err = source.get(&url).await.err().unwrap();
        assert!(matches!(err, Error::Blocked(_)));
    }

    #[test]
    fn test_redirect_target() {
        let base = Url::parse("https://example.com/dir/page").unwrap();

        let next = redirect_target(&base, StatusCode::FOUND, Some("/other")).unwrap();
        assert_eq!(next.unwrap().as_str(), "https://example.com/other");

        let next = redirect_target(&base, StatusCode::MOVED_PERMANENTLY, Some("http://10.0.0.1/")).unwrap();
        let next = next.unwrap();
        assert!(guard::check_parsed(&next).is_err());

        assert!(redirect_target(&base, StatusCode::OK, None).unwrap().is_none());
        assert!(redirect_target(&base, StatusCode::NOT_MODIFIED, None).unwrap().is_none());
        assert!(redirect_target(&base, StatusCode::FOUND, None).is_err());
    }

    #[tokio::test]
    async fn test_resolve_checked_rejects_loopback_name() {
        // "localhost" resolves locally without network access
        let err = resolve_checked("localhost", 80).await.unwrap_err();
        assert!(matches!(err, Error::Blocked(_) | Error::NotFound(_)));
    }
}
