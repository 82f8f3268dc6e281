pub mod quran;
pub mod relevance;
pub mod video;

use std::future::Future;

use reqwest::Url;
use serde_json::Value;
use thiserror::Error;

use crate::model::{Collection, ItemDetail, ItemId};
use crate::state::SortOrder;

pub use quran::QuranSource;
pub use relevance::RelevanceFilter;
pub use video::{VideoQuery, VideoSource};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FetchErrorKind {
    Network,
    Api,
    EmptyResult,
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} answered with HTTP {status}")]
    HttpStatus { url: String, status: u16 },

    #[error("upstream error: {message}")]
    Api { message: String },

    #[error("malformed response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{reason}")]
    EmptyResult { reason: String },

    #[error("no item matches '{id}'")]
    UnknownItem { id: String },
}

impl FetchError {
    pub fn kind(&self) -> FetchErrorKind {
        match self {
            Self::Network { .. } | Self::HttpStatus { .. } => FetchErrorKind::Network,
            Self::Api { .. } | Self::Decode { .. } => FetchErrorKind::Api,
            Self::EmptyResult { .. } | Self::UnknownItem { .. } => FetchErrorKind::EmptyResult,
        }
    }

    pub(crate) fn empty(reason: impl Into<String>) -> Self {
        Self::EmptyResult {
            reason: reason.into(),
        }
    }
}

/// A read-only provider of list collections and item details.
///
/// Implementations return data to the caller and never touch shared state.
pub trait DataSource: Send + Sync + 'static {
    fn label(&self) -> &str;

    /// Canonical ordering the list view should apply on load.
    fn sort_order(&self) -> SortOrder {
        SortOrder::Descending
    }

    fn fetch_collection(&self) -> impl Future<Output = Result<Collection, FetchError>> + Send;

    fn fetch_detail(
        &self,
        id: &ItemId,
    ) -> impl Future<Output = Result<ItemDetail, FetchError>> + Send;
}

/// Either of the built-in sources, picked at runtime from configuration.
#[derive(Clone, Debug)]
pub enum Source {
    Quran(QuranSource),
    Video(VideoSource),
}

impl DataSource for Source {
    fn label(&self) -> &str {
        match self {
            Self::Quran(s) => s.label(),
            Self::Video(s) => s.label(),
        }
    }

    fn sort_order(&self) -> SortOrder {
        match self {
            Self::Quran(s) => s.sort_order(),
            Self::Video(s) => s.sort_order(),
        }
    }

    async fn fetch_collection(&self) -> Result<Collection, FetchError> {
        match self {
            Self::Quran(s) => s.fetch_collection().await,
            Self::Video(s) => s.fetch_collection().await,
        }
    }

    async fn fetch_detail(&self, id: &ItemId) -> Result<ItemDetail, FetchError> {
        match self {
            Self::Quran(s) => s.fetch_detail(id).await,
            Self::Video(s) => s.fetch_detail(id).await,
        }
    }
}

/// Url for logs and errors with credentials masked.
pub(crate) fn redact(url: &Url) -> String {
    if !url.query_pairs().any(|(k, _)| k == "key") {
        return url.to_string();
    }
    let mut out = url.clone();
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            let v = if k == "key" { "***".to_string() } else { v.into_owned() };
            (k.into_owned(), v)
        })
        .collect();
    out.query_pairs_mut().clear().extend_pairs(pairs);
    out.to_string()
}

pub(crate) fn join_url(base: &str, path: &str) -> Result<Url, FetchError> {
    let raw = format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'));
    Url::parse(&raw).map_err(|e| FetchError::Api {
        message: format!("invalid endpoint '{raw}': {e}"),
    })
}

/// GETs `url` and returns the JSON body.
///
/// `error_payload` inspects the parsed body for an explicit upstream error;
/// it wins over the HTTP status so callers see the upstream message.
pub(crate) async fn fetch_json(
    client: &reqwest::Client,
    url: Url,
    error_payload: fn(&Value) -> Option<String>,
) -> Result<Value, FetchError> {
    let shown = redact(&url);
    tracing::debug!(url = %shown, "fetching");

    let resp = client
        .get(url)
        .send()
        .await
        .map_err(|e| FetchError::Network {
            url: shown.clone(),
            source: e.without_url(),
        })?;
    let status = resp.status();
    let text = resp.text().await.map_err(|e| FetchError::Network {
        url: shown.clone(),
        source: e.without_url(),
    })?;

    let parsed = serde_json::from_str::<Value>(&text);
    if let Ok(body) = parsed.as_ref() {
        if let Some(message) = error_payload(body) {
            return Err(FetchError::Api { message });
        }
    }
    if !status.is_success() {
        return Err(FetchError::HttpStatus {
            url: shown,
            status: status.as_u16(),
        });
    }
    parsed.map_err(|e| FetchError::Decode {
        url: shown,
        source: e,
    })
}
