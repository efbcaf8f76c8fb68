use crate::config::Settings;
use crate::domain::analytics::AnalyticsSnapshot;
use crate::domain::catalog::{PendingChangesResponse, ProductsResponse};
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use std::fmt;
use std::time::Duration;

pub const PRODUCTS_PATH: &str = "/products";
pub const ANALYTICS_PATH: &str = "/analytics";
pub const PENDING_CHANGES_PATH: &str = "/price-changes/pending";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchErrorKind {
    /// Connection, timeout, DNS or non-2xx status.
    Transport,
    /// Body is not JSON or not in the expected shape.
    Shape,
    Unexpected,
}

impl fmt::Display for FetchErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FetchErrorKind::Transport => "transport",
            FetchErrorKind::Shape => "shape",
            FetchErrorKind::Unexpected => "unexpected",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone)]
pub struct FetchError {
    pub endpoint: &'static str,
    pub kind: FetchErrorKind,
    pub detail: String,
}

impl FetchError {
    fn new(endpoint: &'static str, kind: FetchErrorKind, detail: impl Into<String>) -> Self {
        Self {
            endpoint,
            kind,
            detail: detail.into(),
        }
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "fetch error (endpoint={}, kind={}): {}",
            self.endpoint, self.kind, self.detail
        )
    }
}

impl std::error::Error for FetchError {}

/// Classifies any error coming out of a [`DashboardSource`] call.
pub fn classify(err: &anyhow::Error) -> FetchErrorKind {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<FetchError>())
        .map(|e| e.kind)
        .unwrap_or(FetchErrorKind::Unexpected)
}

/// The three read endpoints of the pricing service.
#[async_trait::async_trait]
pub trait DashboardSource: Send + Sync {
    fn source_name(&self) -> &'static str;

    async fn fetch_products(&self) -> Result<ProductsResponse>;

    async fn fetch_analytics(&self) -> Result<AnalyticsSnapshot>;

    async fn fetch_pending_changes(&self) -> Result<PendingChangesResponse>;
}

#[derive(Debug, Clone)]
pub struct HttpDashboardSource {
    http: reqwest::Client,
    base_url: String,
}

impl HttpDashboardSource {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let base_url = settings.require_api_base()?.to_string();

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.http_timeout_secs))
            .build()
            .context("failed to build dashboard http client")?;

        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &'static str) -> Result<T> {
        let url = self.url(path);

        let res = self.http.get(&url).send().await.map_err(|err| {
            FetchError::new(path, FetchErrorKind::Transport, format!("request failed: {err}"))
        })?;

        let status = res.status();
        let text = res.text().await.map_err(|err| {
            FetchError::new(
                path,
                FetchErrorKind::Transport,
                format!("failed to read response body: {err}"),
            )
        })?;

        if !status.is_success() {
            return Err(FetchError::new(
                path,
                FetchErrorKind::Transport,
                format!("HTTP {status}: {text}"),
            )
            .into());
        }

        let raw_json = serde_json::from_str::<serde_json::Value>(&text).map_err(|err| {
            FetchError::new(
                path,
                FetchErrorKind::Shape,
                format!("response is not valid JSON ({err}): {text}"),
            )
        })?;

        let parsed = serde_json::from_value::<T>(raw_json).map_err(|err| {
            FetchError::new(
                path,
                FetchErrorKind::Shape,
                format!(
                    "failed to parse response into {}: {err}",
                    std::any::type_name::<T>()
                ),
            )
        })?;

        tracing::debug!(%url, http_status = %status, "dashboard endpoint fetched");
        Ok(parsed)
    }
}

#[async_trait::async_trait]
impl DashboardSource for HttpDashboardSource {
    fn source_name(&self) -> &'static str {
        "pricing_http_json"
    }

    async fn fetch_products(&self) -> Result<ProductsResponse> {
        self.get_json(PRODUCTS_PATH).await
    }

    async fn fetch_analytics(&self) -> Result<AnalyticsSnapshot> {
        self.get_json(ANALYTICS_PATH).await
    }

    async fn fetch_pending_changes(&self) -> Result<PendingChangesResponse> {
        self.get_json(PENDING_CHANGES_PATH).await
    }
}
