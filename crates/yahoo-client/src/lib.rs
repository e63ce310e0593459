mod fetcher;

pub use fetcher::{FetchOutcome, PriceFetcher};

use async_trait::async_trait;
use chrono::DateTime;
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use watch_core::{Granularity, Period, PricePoint, PriceSource, WatchError};

const BASE_URL: &str = "https://query1.finance.yahoo.com";
const USER_AGENT: &str = "Mozilla/5.0 (compatible; price-watch/0.1)";

/// Sliding-window rate limiter: at most `max_requests` per `window` duration.
#[derive(Clone)]
struct RateLimiter {
    timestamps: Arc<Mutex<VecDeque<Instant>>>,
    max_requests: usize,
    window: Duration,
}

impl RateLimiter {
    fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            timestamps: Arc::new(Mutex::new(VecDeque::new())),
            max_requests: max_requests.max(1),
            window,
        }
    }

    async fn acquire(&self) {
        loop {
            let mut ts = self.timestamps.lock().await;
            let now = Instant::now();

            // Remove timestamps outside the window
            while let Some(&front) = ts.front() {
                if now.duration_since(front) >= self.window {
                    ts.pop_front();
                } else {
                    break;
                }
            }

            if ts.len() < self.max_requests {
                ts.push_back(now);
                return;
            }

            let Some(&oldest) = ts.front() else {
                continue;
            };
            let sleep_dur = (oldest + self.window).duration_since(now) + Duration::from_millis(50);
            drop(ts);
            tracing::debug!("Rate limiter: waiting {:.1}s for Yahoo slot", sleep_dur.as_secs_f64());
            tokio::time::sleep(sleep_dur).await;
        }
    }
}

/// Yahoo Finance chart client.
#[derive(Clone)]
pub struct YahooClient {
    base_url: String,
    client: Client,
    rate_limiter: RateLimiter,
}

impl Default for YahooClient {
    fn default() -> Self {
        Self::new()
    }
}

impl YahooClient {
    pub fn new() -> Self {
        // Yahoo does not publish limits; 60 req/min stays well clear of 429s.
        let rate_limit: usize = std::env::var("YAHOO_RATE_LIMIT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(60);

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            base_url: BASE_URL.to_string(),
            client,
            rate_limiter: RateLimiter::new(rate_limit, Duration::from_secs(60)),
        }
    }

    /// Point the client at a different host (proxies, local mirrors).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Send a request with rate limiting and automatic 429 retry.
    async fn send_request(&self, builder: reqwest::RequestBuilder) -> Result<reqwest::Response, WatchError> {
        let request = builder.build().map_err(|e| WatchError::Lookup(e.to_string()))?;

        for attempt in 0..3u32 {
            self.rate_limiter.acquire().await;
            let req_clone = request
                .try_clone()
                .ok_or_else(|| WatchError::Lookup("Cannot clone request".to_string()))?;
            let response = self
                .client
                .execute(req_clone)
                .await
                .map_err(|e| WatchError::Lookup(e.to_string()))?;

            if response.status() != StatusCode::TOO_MANY_REQUESTS {
                return Ok(response);
            }

            let wait_secs = 5u64;
            tracing::warn!("Yahoo 429 rate limited, waiting {}s before retry {}/3", wait_secs, attempt + 1);
            tokio::time::sleep(Duration::from_secs(wait_secs)).await;
        }

        Err(WatchError::Lookup("Rate limited by Yahoo after 3 retries".to_string()))
    }

    /// Chart endpoint for `symbol`, with the symbol encoded as a single path segment.
    fn chart_url(&self, symbol: &str) -> Result<Url, WatchError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| WatchError::Lookup(format!("Invalid base URL {}: {}", self.base_url, e)))?;
        url.path_segments_mut()
            .map_err(|_| WatchError::Lookup(format!("Invalid base URL {}", self.base_url)))?
            .pop_if_empty()
            .extend(["v8", "finance", "chart", symbol]);
        Ok(url)
    }

    /// Get the close series for a symbol over `period` at `granularity`.
    pub async fn get_chart(
        &self,
        symbol: &str,
        period: Period,
        granularity: Granularity,
    ) -> Result<Vec<PricePoint>, WatchError> {
        let url = self.chart_url(symbol)?;

        let response = self
            .send_request(self.client.get(url).query(&[
                ("range", period.as_str()),
                ("interval", interval_param(granularity)),
            ]))
            .await?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| WatchError::Lookup(e.to_string()))?;

        // Unknown symbols come back as 404 with a chart error payload.
        if !status.is_success() {
            if let Ok(parsed) = serde_json::from_str::<ChartResponse>(&body) {
                if let Some(error) = parsed.chart.error {
                    return Err(error.into_watch_error(symbol));
                }
            }
            return Err(WatchError::Lookup(format!("HTTP {}: {}", status, body)));
        }

        parse_chart(symbol, &body)
    }
}

#[async_trait]
impl PriceSource for YahooClient {
    async fn recent_prices(
        &self,
        symbol: &str,
        period: Period,
        granularity: Granularity,
    ) -> Result<Vec<PricePoint>, WatchError> {
        self.get_chart(symbol, period, granularity).await
    }
}

fn interval_param(granularity: Granularity) -> &'static str {
    match granularity {
        Granularity::IntraDay => "1m",
        Granularity::Daily => "1d",
    }
}

/// Decode a chart payload into `(timestamp, close)` points, oldest first.
///
/// Minutes without a print carry a `null` close and are dropped.
fn parse_chart(symbol: &str, body: &str) -> Result<Vec<PricePoint>, WatchError> {
    let parsed: ChartResponse =
        serde_json::from_str(body).map_err(|e| WatchError::Lookup(format!("Invalid chart payload: {}", e)))?;

    if let Some(error) = parsed.chart.error {
        return Err(error.into_watch_error(symbol));
    }

    let Some(result) = parsed.chart.result.and_then(|r| r.into_iter().next()) else {
        return Ok(Vec::new());
    };

    let timestamps = result.timestamp.unwrap_or_default();
    let closes = result
        .indicators
        .quote
        .into_iter()
        .next()
        .map(|q| q.close)
        .unwrap_or_default();

    Ok(timestamps
        .into_iter()
        .zip(closes)
        .filter_map(|(ts, close)| {
            let close = close?;
            let timestamp = DateTime::from_timestamp(ts, 0)?;
            Some(PricePoint::new(timestamp, close))
        })
        .collect())
}

// Response structures
#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartEnvelope,
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
    #[serde(default)]
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    timestamp: Option<Vec<i64>>,
    #[serde(default)]
    indicators: ChartIndicators,
}

#[derive(Debug, Default, Deserialize)]
struct ChartIndicators {
    #[serde(default)]
    quote: Vec<ChartQuote>,
}

#[derive(Debug, Deserialize)]
struct ChartQuote {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    #[serde(default)]
    description: Option<String>,
}

impl ChartError {
    fn into_watch_error(self, symbol: &str) -> WatchError {
        let description = self.description.unwrap_or_default();
        WatchError::Lookup(format!("{} ({}): {}", symbol, self.code, description))
    }
}
