//! HTTP fetcher for the shared spreadsheet
//!
//! Two endpoints are supported, mirroring the published sheet:
//! - the public CSV export (`gviz/tq?tqx=out:csv&sheet=<name>`), which needs
//!   no API key and is parsed with the grid scanner
//! - the values API (`/v4/spreadsheets/{id}/values/{range}?key=`), which
//!   returns `{ "values": [[..]] }` and preserves in-cell newlines without
//!   CSV quoting
//!
//! Retries use exponential backoff on retryable statuses. A `base_url`
//! override redirects both endpoints at a mock server in tests.

use crate::parser::parse_csv;
use crate::utils::error::FetchError;
use serde::Deserialize;
use std::time::Duration;
use url::Url;

const CSV_EXPORT_HOST: &str = "https://docs.google.com";
const VALUES_API_HOST: &str = "https://sheets.googleapis.com";

/// Raw grid of cell strings, rows by columns
pub type Grid = Vec<Vec<String>>;

/// Values API response payload
#[derive(Debug, Deserialize)]
struct ValuesResponse {
    #[serde(default)]
    values: Grid,
}

/// Spreadsheet fetcher with retry and endpoint selection
pub struct SheetFetcher {
    client: reqwest::Client,
    spreadsheet_id: String,
    api_key: Option<String>,
    max_retries: u32,
    base_delay_ms: u64,
    /// Overrides both endpoint hosts, for tests against a mock server
    base_url: Option<String>,
}

impl SheetFetcher {
    /// Create a fetcher with default retry settings
    pub fn new(spreadsheet_id: &str, api_key: Option<String>) -> Result<Self, FetchError> {
        Self::with_config(spreadsheet_id, api_key, 3, Duration::from_secs(30))
    }

    /// Create a fetcher with custom retry count and timeout
    pub fn with_config(
        spreadsheet_id: &str,
        api_key: Option<String>,
        max_retries: u32,
        timeout: Duration,
    ) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .gzip(true)
            .build()?;

        Ok(Self {
            client,
            spreadsheet_id: spreadsheet_id.to_string(),
            api_key,
            max_retries,
            base_delay_ms: 500,
            base_url: None,
        })
    }

    /// Redirect both endpoints at `base_url` (mock server in tests)
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = Some(base_url.trim_end_matches('/').to_string());
        self
    }

    fn host(&self, default: &str) -> String {
        self.base_url.clone().unwrap_or_else(|| default.to_string())
    }

    /// Fetch a whole sheet tab as a grid
    ///
    /// Prefers the values API when an API key is configured (it keeps
    /// in-cell newlines out of band), otherwise falls back to the public
    /// CSV export.
    pub async fn fetch_sheet(&self, sheet_name: &str) -> Result<Grid, FetchError> {
        if self.api_key.is_some() {
            self.fetch_range(&format!("{sheet_name}!A1:Z")).await
        } else {
            self.fetch_sheet_csv(sheet_name).await
        }
    }

    /// Fetch a sheet tab through the CSV export endpoint
    pub async fn fetch_sheet_csv(&self, sheet_name: &str) -> Result<Grid, FetchError> {
        let mut url = Url::parse(&self.host(CSV_EXPORT_HOST))
            .and_then(|u| {
                u.join(&format!(
                    "/spreadsheets/d/{}/gviz/tq",
                    self.spreadsheet_id
                ))
            })
            .map_err(|e| FetchError::InvalidUrl(e.to_string()))?;
        url.query_pairs_mut()
            .append_pair("tqx", "out:csv")
            .append_pair("sheet", sheet_name);

        let body = self.get_with_retry(url.as_str()).await?;
        let grid = parse_csv(&body);
        tracing::debug!(sheet = sheet_name, rows = grid.len(), "fetched sheet via csv export");
        Ok(grid)
    }

    /// Fetch an A1-notation range through the values API
    ///
    /// Returns an empty grid with a warning when no API key is configured,
    /// so directory ranges degrade to "nothing parsed" rather than failing
    /// the whole sync.
    pub async fn fetch_range(&self, range: &str) -> Result<Grid, FetchError> {
        let Some(api_key) = &self.api_key else {
            tracing::warn!(range, "values API key not configured, returning empty range");
            return Ok(Grid::new());
        };

        let mut url = Url::parse(&self.host(VALUES_API_HOST))
            .map_err(|e| FetchError::InvalidUrl(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| FetchError::InvalidUrl("base url cannot carry a path".to_string()))?
            .extend(["v4", "spreadsheets", &self.spreadsheet_id, "values", range]);
        url.query_pairs_mut().append_pair("key", api_key);

        let body = self.get_with_retry(url.as_str()).await?;
        let parsed: ValuesResponse = serde_json::from_str(&body)
            .map_err(|e| FetchError::Decode(format!("values payload: {e}")))?;
        tracing::debug!(range, rows = parsed.values.len(), "fetched range via values API");
        Ok(parsed.values)
    }

    /// Cheap reachability check against the export host
    ///
    /// Any HTTP response counts as reachable; only transport failures
    /// (refused connection, DNS, timeout) report unreachable.
    pub async fn probe(&self) -> bool {
        let Ok(url) = Url::parse(&self.host(CSV_EXPORT_HOST)) else {
            return false;
        };
        self.client.head(url).send().await.is_ok()
    }

    /// GET with exponential backoff on retryable statuses
    async fn get_with_retry(&self, url: &str) -> Result<String, FetchError> {
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = self.base_delay_ms * 2_u64.pow(attempt - 1);
                tokio::time::sleep(Duration::from_millis(delay)).await;
            }

            match self.client.get(url).send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return response
                            .text()
                            .await
                            .map_err(|e| FetchError::Decode(e.to_string()));
                    } else if Self::should_retry(status.as_u16()) {
                        last_error = Some(FetchError::ServerError(status.as_u16()));
                        continue;
                    } else {
                        return Err(FetchError::ServerError(status.as_u16()));
                    }
                }
                Err(e) => {
                    if e.is_timeout() {
                        last_error = Some(FetchError::Timeout);
                    } else {
                        last_error = Some(FetchError::Http(e));
                    }
                }
            }
        }

        Err(last_error.unwrap_or(FetchError::MaxRetriesExceeded))
    }

    /// Retry on throttling and transient server errors only
    fn should_retry(status: u16) -> bool {
        matches!(status, 429 | 500 | 502 | 503 | 504)
    }
}
