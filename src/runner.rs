use std::time::Duration;

use thiserror::Error;
use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::controller::{
    ControllerError, ControllerOptions, PageController, PageEvent, DEFAULT_DETAIL_PAGE_SIZE,
    DEFAULT_INITIAL_DELAY, DEFAULT_REFRESH_PERIOD,
};
use crate::model::{ItemDetail, ItemId};
use crate::output::{build_page_record, DisplaySurface};
use crate::render::DisplayTree;
use crate::source::quran::DEFAULT_QURAN_BASE_URL;
use crate::source::video::DEFAULT_VIDEO_BASE_URL;
use crate::source::{DataSource, QuranSource, RelevanceFilter, Source, VideoQuery, VideoSource};
use crate::state::{TimeWindow, DEFAULT_PAGE_SIZE};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SourceKind {
    #[default]
    Quran,
    Videos,
}

impl SourceKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "quran" | "alquran" | "surah" => Some(Self::Quran),
            "videos" | "video" | "kajian" | "youtube" => Some(Self::Videos),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Quran => "quran",
            Self::Videos => "videos",
        }
    }
}

#[derive(Clone, Debug)]
pub struct Options {
    pub source: SourceKind,
    pub quran_base_url: String,
    pub video_base_url: String,
    pub api_key: Option<String>,
    pub video_query: VideoQuery,
    pub keywords: Option<Vec<String>>,
    pub search: Option<String>,
    pub window: TimeWindow,
    pub page: Option<usize>,
    pub page_size: usize,
    pub detail_page_size: usize,
    pub open: Option<String>,
    pub ayah: Option<(u32, u32)>,
    pub timeout_seconds: usize,
    pub proxy: Option<String>,
    pub auto_refresh: bool,
    pub refresh_interval: Duration,
    pub initial_delay: Duration,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            source: SourceKind::Quran,
            quran_base_url: DEFAULT_QURAN_BASE_URL.to_string(),
            video_base_url: DEFAULT_VIDEO_BASE_URL.to_string(),
            api_key: None,
            video_query: VideoQuery::default(),
            keywords: None,
            search: None,
            window: TimeWindow::None,
            page: None,
            page_size: DEFAULT_PAGE_SIZE,
            detail_page_size: DEFAULT_DETAIL_PAGE_SIZE,
            open: None,
            ayah: None,
            timeout_seconds: 10,
            proxy: None,
            auto_refresh: false,
            refresh_interval: DEFAULT_REFRESH_PERIOD,
            initial_delay: DEFAULT_INITIAL_DELAY,
        }
    }
}

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("the videos source needs an API key (--api-key or videos.api_key in config)")]
    MissingApiKey,

    #[error("invalid page_size {value}, expected positive integer")]
    InvalidPageSize { value: usize },

    #[error("invalid max_results {value}, expected 1-50")]
    InvalidMaxResults { value: u32 },

    #[error("invalid refresh interval, expected at least one second")]
    InvalidRefreshInterval,

    #[error("use either open or ayah, not both")]
    ConflictingDetailTarget,

    #[error("failed to build HTTP client: {source}")]
    HttpClientBuild {
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to setup proxy: {proxy}: {source}")]
    ProxySetup {
        proxy: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to serialize browse data: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error(transparent)]
    Browse(#[from] ControllerError),
}

/// Result of a one-shot browse: the rendered page plus its data.
#[derive(Clone, Debug)]
pub struct BrowseResult {
    pub label: String,
    pub tree: DisplayTree,
    /// The visible list page, or the open detail, as JSON.
    pub data: serde_json::Value,
    pub detail: Option<ItemDetail>,
    pub total: usize,
    pub matched: usize,
    pub started_at: Instant,
    pub elapsed: Duration,
}

#[derive(Clone, Debug)]
pub struct Runner {
    options: Options,
}

impl Runner {
    pub fn new(options: Options) -> Result<Self, RunnerError> {
        if options.page_size == 0 {
            return Err(RunnerError::InvalidPageSize {
                value: options.page_size,
            });
        }
        if options.detail_page_size == 0 {
            return Err(RunnerError::InvalidPageSize {
                value: options.detail_page_size,
            });
        }
        if !(1..=50).contains(&options.video_query.max_results) {
            return Err(RunnerError::InvalidMaxResults {
                value: options.video_query.max_results,
            });
        }
        if options.refresh_interval < Duration::from_secs(1) {
            return Err(RunnerError::InvalidRefreshInterval);
        }
        if options.open.is_some() && options.ayah.is_some() {
            return Err(RunnerError::ConflictingDetailTarget);
        }
        if options.source == SourceKind::Videos
            && options.api_key.as_deref().unwrap_or_default().trim().is_empty()
        {
            return Err(RunnerError::MissingApiKey);
        }
        Ok(Self { options })
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn source(&self) -> Result<Source, RunnerError> {
        let client = build_client(self.options.proxy.as_deref(), self.options.timeout_seconds)?;
        let source = match self.options.source {
            SourceKind::Quran => Source::Quran(QuranSource::with_base_url(
                client,
                self.options.quran_base_url.as_str(),
            )),
            SourceKind::Videos => {
                let key = self
                    .options
                    .api_key
                    .clone()
                    .ok_or(RunnerError::MissingApiKey)?;
                let relevance = match &self.options.keywords {
                    Some(keywords) => RelevanceFilter::new(keywords.iter()),
                    None => RelevanceFilter::default(),
                };
                Source::Video(
                    VideoSource::new(client, key)
                        .with_base_url(self.options.video_base_url.as_str())
                        .with_query(self.options.video_query.clone())
                        .with_relevance(relevance),
                )
            }
        };
        Ok(source)
    }

    fn controller_options(&self) -> ControllerOptions {
        ControllerOptions {
            page_size: self.options.page_size,
            detail_page_size: self.options.detail_page_size,
            refresh_period: self.options.refresh_interval,
            initial_delay: self.options.initial_delay,
            auto_refresh: self.options.auto_refresh,
        }
    }

    fn detail_target(&self) -> Option<ItemId> {
        if let Some((surah, ayah)) = self.options.ayah {
            return Some(ItemId::Text(format!("{surah}:{ayah}")));
        }
        self.options
            .open
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(ItemId::parse)
    }

    fn apply_filters<S: DataSource>(&self, controller: &mut PageController<S>) {
        if let Some(term) = self.options.search.as_deref() {
            controller.dispatch(PageEvent::SearchChanged(term.to_string()));
        }
        if self.options.window != TimeWindow::None {
            controller.dispatch(PageEvent::WindowSelected(self.options.window));
        }
    }

    /// Fetches once, applies filters and paging, and renders the result.
    pub async fn run(&self) -> Result<BrowseResult, RunnerError> {
        let started_at = Instant::now();
        let source = self.source()?;
        let mut controller = PageController::new(source, self.controller_options());

        controller.refresh();
        controller.settle().await?;
        self.apply_filters(&mut controller);

        let target = self.detail_target();
        if target.is_none() {
            if let Some(page) = self.options.page {
                controller.dispatch(PageEvent::PageSelected(page));
            }
        }
        if let Some(id) = target {
            tracing::info!(%id, "opening detail");
            controller.dispatch(PageEvent::ItemSelected(id));
            controller.settle().await?;
            if let Some(page) = self.options.page {
                controller.dispatch(PageEvent::PageSelected(page));
            }
        }

        let label = controller.label().to_string();
        let detail = controller.detail().cloned();
        let data = match &detail {
            Some(detail) => to_data(detail)?,
            None => to_data(&build_page_record(&label, controller.list()))?,
        };

        Ok(BrowseResult {
            tree: controller.render(),
            data,
            detail,
            total: controller.list().total_len(),
            matched: controller.list().filtered_len(),
            label,
            started_at,
            elapsed: started_at.elapsed(),
        })
    }

    /// Keeps the page live, feeding `events` to the controller until quit.
    pub async fn watch<D: DisplaySurface>(
        &self,
        events: mpsc::Receiver<PageEvent>,
        surface: &mut D,
    ) -> Result<(), RunnerError> {
        let source = self.source()?;
        let mut controller = PageController::new(source, self.controller_options());
        // Every load resets filters, so start-up filters would be wiped by the first fetch.
        if self.options.search.is_some() || self.options.window != TimeWindow::None {
            tracing::info!("initial search and window are ignored in watch mode; use the search and filter commands");
        }
        controller.run(events, surface).await?;
        Ok(())
    }
}

fn to_data<T: serde::Serialize>(value: &T) -> Result<serde_json::Value, RunnerError> {
    Ok(serde_json::to_value(value)?)
}

fn build_client(proxy: Option<&str>, timeout_seconds: usize) -> Result<reqwest::Client, RunnerError> {
    let mut headers = reqwest::header::HeaderMap::new();
    headers.insert(
        reqwest::header::USER_AGENT,
        reqwest::header::HeaderValue::from_static(concat!("ngaji/", env!("CARGO_PKG_VERSION"))),
    );
    headers.insert(
        reqwest::header::ACCEPT,
        reqwest::header::HeaderValue::from_static("application/json"),
    );

    let timeout = Duration::from_secs(timeout_seconds.try_into().unwrap_or(10));
    let mut builder = reqwest::Client::builder()
        .default_headers(headers)
        .redirect(reqwest::redirect::Policy::limited(5))
        .timeout(timeout);

    if let Some(proxy) = proxy.filter(|p| !p.trim().is_empty()) {
        let proxy = reqwest::Proxy::all(proxy).map_err(|e| RunnerError::ProxySetup {
            proxy: proxy.to_string(),
            source: e,
        })?;
        builder = builder.proxy(proxy);
    }

    builder
        .build()
        .map_err(|e| RunnerError::HttpClientBuild { source: e })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_kind_accepts_aliases() {
        assert_eq!(SourceKind::parse("Quran"), Some(SourceKind::Quran));
        assert_eq!(SourceKind::parse(" kajian "), Some(SourceKind::Videos));
        assert_eq!(SourceKind::parse("radio"), None);
    }

    #[test]
    fn videos_without_key_is_rejected() {
        let options = Options {
            source: SourceKind::Videos,
            api_key: Some("  ".to_string()),
            ..Default::default()
        };
        assert!(matches!(Runner::new(options), Err(RunnerError::MissingApiKey)));
    }

    #[test]
    fn zero_page_size_is_rejected() {
        let options = Options {
            page_size: 0,
            ..Default::default()
        };
        assert!(matches!(
            Runner::new(options),
            Err(RunnerError::InvalidPageSize { value: 0 })
        ));
    }

    #[test]
    fn ayah_becomes_text_target() {
        let runner = Runner::new(Options {
            ayah: Some((2, 255)),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(runner.detail_target(), Some(ItemId::Text("2:255".to_string())));

        let runner = Runner::new(Options {
            open: Some(" 36 ".to_string()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(runner.detail_target(), Some(ItemId::Number(36)));
    }

    #[test]
    fn unserializable_data_is_an_error() {
        let mut by_ref = std::collections::HashMap::new();
        by_ref.insert((2u32, 255u32), "ayat kursi");
        let err = to_data(&by_ref).unwrap_err();
        assert!(matches!(err, RunnerError::Serialize(_)));
        assert!(err.to_string().starts_with("failed to serialize browse data"));
    }

    #[test]
    fn bad_proxy_is_reported() {
        let err = build_client(Some("http://127.0.0.1:99999"), 5).unwrap_err();
        assert!(matches!(err, RunnerError::ProxySetup { .. }));
    }
}
