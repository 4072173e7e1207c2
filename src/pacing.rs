//! Pacing between teams.
//!
//! The walk issues its requests one after another; the [`Pacer`] inserts a
//! pause before every team (or exported plan) after the first so a run stays
//! under the Graph throttling limits. A `Retry-After` value observed on a throttled response
//! stretches the next pause to at least that long.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use teams_inventory_core::pacing::Pacer;
//!
//! # async fn example() {
//! let pacer = Pacer::new(Duration::from_secs(1));
//! pacer.record_retry_after(Duration::from_secs(3));
//! pacer.pause().await; // waits 3 seconds
//! pacer.pause().await; // back to 1 second
//! assert_eq!(pacer.pauses(), 2);
//! # }
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tracing::{debug, instrument, warn};

/// Default pause between teams.
pub const DEFAULT_TEAM_DELAY: Duration = Duration::from_millis(1000);

/// Warning threshold for cumulative pause time in one run (30 seconds).
const CUMULATIVE_DELAY_WARNING_THRESHOLD: Duration = Duration::from_secs(30);

/// Maximum Retry-After value (1 hour) to prevent excessive delays.
const MAX_RETRY_AFTER: Duration = Duration::from_secs(3600);

/// Between-team pause policy.
///
/// `Send + Sync` so it can be borrowed across awaits by the walker.
#[derive(Debug)]
pub struct Pacer {
    /// Fixed pause applied before each team after the first.
    delay: Duration,

    /// Whether pausing is disabled (for `--team-delay-ms 0`).
    disabled: bool,

    /// Largest Retry-After seen since the last pause, in milliseconds.
    pending_retry_after_ms: AtomicU64,

    /// Number of pause points reached.
    pauses: AtomicU64,

    /// Total time spent pausing, in milliseconds.
    cumulative_delay_ms: AtomicU64,
}

impl Pacer {
    /// Creates a pacer with the given fixed pause.
    #[must_use]
    #[instrument(skip_all, fields(delay_ms = delay.as_millis()))]
    pub fn new(delay: Duration) -> Self {
        debug!("creating team pacer");
        Self {
            delay,
            disabled: false,
            pending_retry_after_ms: AtomicU64::new(0),
            pauses: AtomicU64::new(0),
            cumulative_delay_ms: AtomicU64::new(0),
        }
    }

    /// Creates a pacer that never sleeps.
    ///
    /// Pause points are still counted; Retry-After values are ignored.
    #[must_use]
    pub fn disabled() -> Self {
        debug!("creating disabled team pacer");
        Self {
            delay: Duration::ZERO,
            disabled: true,
            pending_retry_after_ms: AtomicU64::new(0),
            pauses: AtomicU64::new(0),
            cumulative_delay_ms: AtomicU64::new(0),
        }
    }

    /// Returns whether pausing is disabled.
    #[must_use]
    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    /// Number of pause points reached so far.
    #[must_use]
    pub fn pauses(&self) -> u64 {
        self.pauses.load(Ordering::SeqCst)
    }

    /// Total time spent pausing so far.
    #[must_use]
    pub fn cumulative_delay(&self) -> Duration {
        Duration::from_millis(self.cumulative_delay_ms.load(Ordering::SeqCst))
    }

    /// Records a server-mandated delay from a throttled response.
    ///
    /// The next [`pause`](Self::pause) waits at least this long.
    #[allow(clippy::cast_possible_truncation)]
    pub fn record_retry_after(&self, delay: Duration) {
        if self.disabled {
            return;
        }
        let delay = delay.min(MAX_RETRY_AFTER);
        let delay_ms = delay.as_millis() as u64;
        self.pending_retry_after_ms
            .fetch_max(delay_ms, Ordering::SeqCst);
        debug!(delay_ms, "recorded server rate limit");
    }

    /// Pauses before moving on to the next team.
    #[allow(clippy::cast_possible_truncation)]
    pub async fn pause(&self) {
        self.pauses.fetch_add(1, Ordering::SeqCst);
        if self.disabled {
            return;
        }

        let pending = Duration::from_millis(self.pending_retry_after_ms.swap(0, Ordering::SeqCst));
        let delay = self.delay.max(pending);
        if delay.is_zero() {
            return;
        }

        let cumulative_ms = self
            .cumulative_delay_ms
            .fetch_add(delay.as_millis() as u64, Ordering::SeqCst)
            + delay.as_millis() as u64;
        let cumulative = Duration::from_millis(cumulative_ms);

        debug!(
            delay_ms = delay.as_millis(),
            cumulative_ms = cumulative.as_millis(),
            "pausing before next team"
        );
        if pending > self.delay && cumulative >= CUMULATIVE_DELAY_WARNING_THRESHOLD {
            warn!(
                cumulative_delay_secs = cumulative.as_secs(),
                "excessive server rate limiting - consider narrowing the run with --team"
            );
        }

        tokio::time::sleep(delay).await;
    }
}

/// Parses a Retry-After header value into a Duration.
///
/// Supports two formats as per RFC 7231:
/// - Integer seconds: `Retry-After: 120`
/// - HTTP-date: `Retry-After: Wed, 21 Oct 2025 07:28:00 GMT`
///
/// Returns `None` if the value cannot be parsed. Caps excessive values at 1 hour.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use teams_inventory_core::pacing::parse_retry_after;
///
/// assert_eq!(parse_retry_after("120"), Some(Duration::from_secs(120)));
/// assert_eq!(parse_retry_after("0"), Some(Duration::ZERO));
/// assert_eq!(parse_retry_after("invalid"), None);
/// ```
#[must_use]
pub fn parse_retry_after(header_value: &str) -> Option<Duration> {
    let header_value = header_value.trim();

    if let Ok(seconds) = header_value.parse::<i64>() {
        if seconds < 0 {
            debug!(seconds, "negative Retry-After value, ignoring");
            return None;
        }

        #[allow(clippy::cast_sign_loss)]
        let duration = Duration::from_secs(seconds as u64);
        return Some(duration.min(MAX_RETRY_AFTER));
    }

    match httpdate::parse_http_date(header_value) {
        Ok(datetime) => {
            let duration = datetime
                .duration_since(std::time::SystemTime::now())
                .unwrap_or(Duration::ZERO);
            Some(duration.min(MAX_RETRY_AFTER))
        }
        Err(_) => {
            debug!(header_value, "unparseable Retry-After value");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_retry_after_seconds() {
        assert_eq!(parse_retry_after("120"), Some(Duration::from_secs(120)));
        assert_eq!(parse_retry_after(" 5 "), Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_parse_retry_after_negative_and_invalid() {
        assert_eq!(parse_retry_after("-1"), None);
        assert_eq!(parse_retry_after("soon"), None);
        assert_eq!(parse_retry_after(""), None);
    }

    #[test]
    fn test_parse_retry_after_caps_at_one_hour() {
        assert_eq!(parse_retry_after("7200"), Some(MAX_RETRY_AFTER));
    }

    #[test]
    fn test_parse_retry_after_http_date_past() {
        assert_eq!(
            parse_retry_after("Wed, 21 Oct 2015 07:28:00 GMT"),
            Some(Duration::ZERO)
        );
    }

    #[test]
    fn test_parse_retry_after_http_date_future() {
        let future = std::time::SystemTime::now() + Duration::from_secs(120);
        let header = httpdate::fmt_http_date(future);
        let parsed = parse_retry_after(&header).unwrap_or_default();
        assert!(parsed > Duration::from_secs(100), "got {parsed:?}");
        assert!(parsed <= Duration::from_secs(120), "got {parsed:?}");
    }

    #[tokio::test]
    async fn test_zero_delay_pacer_counts_pauses() {
        let pacer = Pacer::new(Duration::ZERO);
        pacer.pause().await;
        pacer.pause().await;
        assert_eq!(pacer.pauses(), 2);
        assert_eq!(pacer.cumulative_delay(), Duration::ZERO);
    }

    #[tokio::test]
    async fn test_disabled_pacer_ignores_retry_after() {
        let pacer = Pacer::disabled();
        assert!(pacer.is_disabled());
        pacer.record_retry_after(Duration::from_secs(60));
        pacer.pause().await;
        assert_eq!(pacer.pauses(), 1);
        assert_eq!(pacer.cumulative_delay(), Duration::ZERO);
    }

    #[tokio::test]
    async fn test_retry_after_extends_only_next_pause() {
        let pacer = Pacer::new(Duration::from_millis(1));
        pacer.record_retry_after(Duration::from_millis(20));
        pacer.record_retry_after(Duration::from_millis(5));
        pacer.pause().await;
        assert_eq!(pacer.cumulative_delay(), Duration::from_millis(20));
        pacer.pause().await;
        assert_eq!(pacer.cumulative_delay(), Duration::from_millis(21));
    }
}
