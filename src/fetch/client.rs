#[cfg(test)]
use std::collections::VecDeque;
#[cfg(test)]
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client as HttpClient, StatusCode};

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_MIN_DELAY: f64 = 1.0;
const DEFAULT_MAX_DELAY: f64 = 3.0;

const RATE_LIMIT_MARKERS: [&str; 2] = ["rate limit", "too many requests"];

#[derive(Clone, Debug, PartialEq)]
pub struct FetchConfig {
    pub user_agent: String,
    pub timeout: Duration,
    pub max_retries: u32,
    /// Seconds of uniform jitter before every request.
    pub min_delay: f64,
    pub max_delay: f64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_retries: DEFAULT_MAX_RETRIES,
            min_delay: DEFAULT_MIN_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
        }
    }
}

impl FetchConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by `MMA_*` variables; unparsable values are ignored.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut cfg = Self::default();
        if let Some(ua) = lookup("MMA_USER_AGENT").filter(|v| !v.trim().is_empty()) {
            cfg.user_agent = ua;
        }
        if let Some(secs) = lookup("MMA_TIMEOUT_SECS").and_then(|v| v.parse::<u64>().ok()) {
            cfg.timeout = Duration::from_secs(secs);
        }
        if let Some(n) = lookup("MMA_MAX_RETRIES").and_then(|v| v.parse::<u32>().ok()) {
            cfg.max_retries = n;
        }
        if let Some(d) = lookup("MMA_MIN_DELAY").and_then(|v| v.parse::<f64>().ok()) {
            cfg.min_delay = d;
        }
        if let Some(d) = lookup("MMA_MAX_DELAY").and_then(|v| v.parse::<f64>().ok()) {
            cfg.max_delay = d;
        }
        cfg
    }

    /// CLI flags win over the environment.
    pub fn with_delays(mut self, min_delay: Option<f64>, max_delay: Option<f64>) -> Self {
        if let Some(d) = min_delay { self.min_delay = d; }
        if let Some(d) = max_delay { self.max_delay = d; }
        if self.max_delay < self.min_delay { self.max_delay = self.min_delay; }
        self
    }
}

#[async_trait]
pub trait PageSource: Send + Sync {
    /// Body of the page at `url`, or why it could not be read.
    async fn get(&self, url: &str) -> Result<String, FetchError>;
}

#[derive(Clone)]
pub struct HttpFetcher {
    http: HttpClient,
}

impl HttpFetcher {
    pub fn new(cfg: &FetchConfig) -> Result<Self, FetchError> {
        let http = HttpClient::builder()
            .user_agent(cfg.user_agent.clone())
            .timeout(cfg.timeout)
            .build()
            .map_err(FetchError::from_reqwest)?;
        Ok(Self { http })
    }
}

#[async_trait]
impl PageSource for HttpFetcher {
    async fn get(&self, url: &str) -> Result<String, FetchError> {
        let response = self.http.get(url).send().await.map_err(FetchError::from_reqwest)?;
        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(FetchError::RateLimited);
        }
        let body = response.text().await.map_err(FetchError::from_reqwest)?;
        if !status.is_success() {
            if mentions_rate_limit(&body) {
                return Err(FetchError::RateLimited);
            }
            return Err(FetchError::Status { status });
        }
        Ok(body)
    }
}

fn mentions_rate_limit(body: &str) -> bool {
    let lower = body.to_lowercase();
    RATE_LIMIT_MARKERS.iter().any(|m| lower.contains(m))
}

#[derive(Debug)]
pub enum FetchError {
    Http(reqwest::Error),
    Timeout,
    Status { status: StatusCode },
    RateLimited,
    MockQueueEmpty,
}

impl FetchError {
    fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else {
            FetchError::Http(err)
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, FetchError::RateLimited)
    }

    /// Client errors other than rate limiting will not change on a second try.
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Timeout | FetchError::Http(_) | FetchError::RateLimited => true,
            FetchError::Status { status } => status.is_server_error(),
            FetchError::MockQueueEmpty => false,
        }
    }
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchError::Http(err) => write!(f, "http error: {err}"),
            FetchError::Timeout => write!(f, "request timed out"),
            FetchError::Status { status } => write!(f, "unexpected status {status}"),
            FetchError::RateLimited => write!(f, "rate limited (429 Too Many Requests)"),
            FetchError::MockQueueEmpty => write!(f, "mock source response queue is empty"),
        }
    }
}

impl std::error::Error for FetchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FetchError::Http(err) => Some(err),
            _ => None,
        }
    }
}

/// Serves queued bodies or errors in order and records every requested URL.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MockSource {
    responses: Mutex<VecDeque<Result<String, FetchError>>>,
    calls: Mutex<Vec<String>>,
}

#[cfg(test)]
impl MockSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_page(&self, body: impl Into<String>) {
        self.responses.lock().unwrap().push_back(Ok(body.into()));
    }

    pub fn push_error(&self, err: FetchError) {
        self.responses.lock().unwrap().push_back(Err(err));
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[cfg(test)]
#[async_trait]
impl PageSource for MockSource {
    async fn get(&self, url: &str) -> Result<String, FetchError> {
        self.calls.lock().unwrap().push(url.to_string());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(FetchError::MockQueueEmpty))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn env_overrides_apply_and_junk_is_ignored() {
        let vars: HashMap<&str, &str> = [
            ("MMA_TIMEOUT_SECS", "45"),
            ("MMA_MAX_RETRIES", "five"),
            ("MMA_MIN_DELAY", "0.5"),
        ]
        .into_iter()
        .collect();
        let cfg = FetchConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string()));
        assert_eq!(cfg.timeout, Duration::from_secs(45));
        assert_eq!(cfg.max_retries, DEFAULT_MAX_RETRIES);
        assert_eq!(cfg.min_delay, 0.5);
        assert_eq!(cfg.max_delay, DEFAULT_MAX_DELAY);
        assert_eq!(cfg.user_agent, DEFAULT_USER_AGENT);
    }

    #[test]
    fn cli_delays_keep_range_ordered() {
        let cfg = FetchConfig::default().with_delays(Some(4.0), None);
        assert_eq!((cfg.min_delay, cfg.max_delay), (4.0, 4.0));
    }

    #[test]
    fn retryability() {
        assert!(FetchError::Timeout.is_retryable());
        assert!(FetchError::RateLimited.is_retryable());
        assert!(FetchError::Status { status: StatusCode::BAD_GATEWAY }.is_retryable());
        assert!(!FetchError::Status { status: StatusCode::NOT_FOUND }.is_retryable());
        assert!(!FetchError::MockQueueEmpty.is_retryable());
        assert_eq!(
            format!("{}", FetchError::Status { status: StatusCode::NOT_FOUND }),
            "unexpected status 404 Not Found"
        );
    }

    #[test]
    fn rate_limit_text_detection() {
        assert!(mentions_rate_limit("<h1>Too Many Requests</h1>"));
        assert!(mentions_rate_limit("You hit our Rate Limit"));
        assert!(!mentions_rate_limit("<h1>Not Found</h1>"));
    }

    #[tokio::test]
    async fn mock_serves_in_order_then_reports_empty() {
        let mock = MockSource::new();
        mock.push_page("<html>one</html>");
        mock.push_error(FetchError::Timeout);

        assert_eq!(mock.get("a").await.unwrap(), "<html>one</html>");
        assert!(matches!(mock.get("b").await, Err(FetchError::Timeout)));
        assert!(matches!(mock.get("c").await, Err(FetchError::MockQueueEmpty)));
        assert_eq!(mock.calls(), ["a", "b", "c"]);
    }
}
