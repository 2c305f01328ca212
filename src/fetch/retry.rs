use std::time::Duration;

use rand::Rng;
use tracing::{debug, error, info, warn};

use super::client::{FetchConfig, PageSource};

const LONG_BREAK_CHANCE: f64 = 0.05;
const LONG_BREAK_SECS: (f64, f64) = (10.0, 20.0);
const RATE_LIMIT_WAIT_SECS: (f64, f64) = (60.0, 120.0);

/// How long to wait between and around requests.
#[derive(Clone, Debug, PartialEq)]
pub struct Politeness {
    /// Uniform jitter before every attempt, seconds.
    pub delay: (f64, f64),
    pub long_break_chance: f64,
    pub long_break: (f64, f64),
    /// Multiplier on `2^attempt + U(0,1)` seconds after a retryable failure.
    pub backoff_scale: f64,
    pub rate_limit_wait: (f64, f64),
    pub max_retries: u32,
}

impl Politeness {
    pub fn from_config(cfg: &FetchConfig) -> Self {
        Self {
            delay: (cfg.min_delay, cfg.max_delay),
            long_break_chance: LONG_BREAK_CHANCE,
            long_break: LONG_BREAK_SECS,
            backoff_scale: 1.0,
            rate_limit_wait: RATE_LIMIT_WAIT_SECS,
            max_retries: cfg.max_retries,
        }
    }

    /// No waiting at all, same retry bound.
    #[cfg(test)]
    pub fn immediate(max_retries: u32) -> Self {
        Self {
            delay: (0.0, 0.0),
            long_break_chance: 0.0,
            long_break: (0.0, 0.0),
            backoff_scale: 0.0,
            rate_limit_wait: (0.0, 0.0),
            max_retries,
        }
    }

    fn jitter(&self) -> f64 {
        let mut rng = rand::thread_rng();
        if self.long_break_chance > 0.0 && rng.gen_bool(self.long_break_chance.min(1.0)) {
            let secs = uniform(&mut rng, self.long_break);
            info!(secs, "taking a longer break");
            return secs;
        }
        uniform(&mut rng, self.delay)
    }

    fn backoff(&self, attempt: u32) -> f64 {
        let mut rng = rand::thread_rng();
        self.backoff_scale * (2f64.powi(attempt as i32) + uniform(&mut rng, (0.0, 1.0)))
    }

    fn rate_limit(&self) -> f64 {
        uniform(&mut rand::thread_rng(), self.rate_limit_wait)
    }
}

fn uniform(rng: &mut impl Rng, (lo, hi): (f64, f64)) -> f64 {
    if hi > lo { rng.gen_range(lo..hi) } else { lo.max(0.0) }
}

async fn sleep_secs(secs: f64) {
    if secs > 0.0 {
        tokio::time::sleep(Duration::from_secs_f64(secs)).await;
    }
}

/// Fetch `url` with jitter, bounded retries, exponential backoff and a long wait
/// when rate limited. `None` once every attempt is spent or the failure is permanent.
pub async fn fetch_document<S>(source: &S, url: &str, polite: &Politeness) -> Option<String>
where
    S: PageSource + ?Sized,
{
    let attempts = polite.max_retries.max(1);
    for attempt in 0..attempts {
        sleep_secs(polite.jitter()).await;
        debug!(url, attempt = attempt + 1, "fetching");

        let err = match source.get(url).await {
            Ok(body) => return Some(body),
            Err(err) => err,
        };

        if err.is_rate_limited() {
            let wait = polite.rate_limit();
            warn!(url, wait_secs = wait, "rate limit detected; backing off");
            sleep_secs(wait).await;
            continue;
        }
        if !err.is_retryable() || attempt + 1 == attempts {
            error!(url, attempts = attempt + 1, error = %err, "fetch failed");
            return None;
        }
        let wait = polite.backoff(attempt);
        warn!(url, attempt = attempt + 1, error = %err, wait_secs = wait, "fetch attempt failed; retrying");
        sleep_secs(wait).await;
    }
    error!(url, attempts, "fetch gave up after rate limiting");
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::{FetchError, MockSource};
    use reqwest::StatusCode;

    #[tokio::test]
    async fn first_success_returns_body() {
        let mock = MockSource::new();
        mock.push_page("ok");
        assert_eq!(fetch_document(&mock, "u", &Politeness::immediate(3)).await.as_deref(), Some("ok"));
        assert_eq!(mock.calls().len(), 1);
    }

    #[tokio::test]
    async fn transient_failures_are_retried() {
        let mock = MockSource::new();
        mock.push_error(FetchError::Timeout);
        mock.push_error(FetchError::Status { status: StatusCode::SERVICE_UNAVAILABLE });
        mock.push_page("third time");
        let got = fetch_document(&mock, "u", &Politeness::immediate(3)).await;
        assert_eq!(got.as_deref(), Some("third time"));
        assert_eq!(mock.calls().len(), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_retries() {
        let mock = MockSource::new();
        for _ in 0..5 {
            mock.push_error(FetchError::Timeout);
        }
        assert!(fetch_document(&mock, "u", &Politeness::immediate(3)).await.is_none());
        assert_eq!(mock.calls().len(), 3);
    }

    #[tokio::test]
    async fn permanent_failure_stops_immediately() {
        let mock = MockSource::new();
        mock.push_error(FetchError::Status { status: StatusCode::NOT_FOUND });
        mock.push_page("never reached");
        assert!(fetch_document(&mock, "u", &Politeness::immediate(3)).await.is_none());
        assert_eq!(mock.calls().len(), 1);
    }

    #[tokio::test]
    async fn rate_limit_spends_an_attempt() {
        let mock = MockSource::new();
        mock.push_error(FetchError::RateLimited);
        mock.push_error(FetchError::RateLimited);
        mock.push_page("late");
        assert!(fetch_document(&mock, "u", &Politeness::immediate(2)).await.is_none());
        assert_eq!(mock.calls().len(), 2);
    }

    #[test]
    fn backoff_grows_exponentially() {
        let p = Politeness::from_config(&FetchConfig::default());
        let b0 = p.backoff(0);
        let b2 = p.backoff(2);
        assert!((1.0..2.0).contains(&b0));
        assert!((4.0..5.0).contains(&b2));
    }

    #[test]
    fn jitter_stays_in_range_without_long_breaks() {
        let p = Politeness { long_break_chance: 0.0, ..Politeness::from_config(&FetchConfig::default()) };
        for _ in 0..50 {
            let j = p.jitter();
            assert!((1.0..3.0).contains(&j));
        }
    }
}
