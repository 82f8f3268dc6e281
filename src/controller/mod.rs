pub mod refresh;

use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, Offset, Utc};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinHandle};

use crate::model::{Collection, ItemDetail, ItemId};
use crate::output::{DisplaySurface, SurfaceError};
use crate::render::{
    self, DetailView, DisplayTree, EmptyReason, EmptyView, ListView, StatusLevel, StatusMessage,
    ViewState,
};
use crate::source::{DataSource, FetchError};
use crate::state::{ListState, Pager, TimeWindow, DEFAULT_PAGE_SIZE};

pub use refresh::{AutoRefresh, DEFAULT_REFRESH_PERIOD};

pub const DEFAULT_DETAIL_PAGE_SIZE: usize = 10;
pub const DEFAULT_INITIAL_DELAY: Duration = Duration::from_secs(1);

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PageEvent {
    SearchChanged(String),
    WindowSelected(TimeWindow),
    PageSelected(usize),
    ItemSelected(ItemId),
    Back,
    Retry,
    RefreshRequested,
    AutoRefreshToggled,
    Quit,
}

impl PageEvent {
    /// Parses one line of the interactive command language.
    pub fn parse(line: &str) -> Result<Self, String> {
        let line = line.trim();
        let (cmd, rest) = match line.split_once(char::is_whitespace) {
            Some((cmd, rest)) => (cmd, rest.trim()),
            None => (line, ""),
        };
        match cmd.to_ascii_lowercase().as_str() {
            "search" | "s" | "/" => Ok(Self::SearchChanged(rest.to_string())),
            "filter" | "f" => rest.parse().map(Self::WindowSelected),
            "page" | "p" => rest
                .parse::<usize>()
                .map(Self::PageSelected)
                .map_err(|_| format!("invalid page '{rest}'")),
            "open" | "o" if !rest.is_empty() => Ok(Self::ItemSelected(ItemId::parse(rest))),
            "open" | "o" => Err("open needs an item id".to_string()),
            "back" | "b" => Ok(Self::Back),
            "retry" => Ok(Self::Retry),
            "refresh" | "r" => Ok(Self::RefreshRequested),
            "auto" => Ok(Self::AutoRefreshToggled),
            "quit" | "q" | "exit" => Ok(Self::Quit),
            "" => Err("empty command".to_string()),
            other => Err(format!(
                "unknown command '{other}' (search, filter, page, open, back, retry, refresh, auto, quit)"
            )),
        }
    }
}

#[derive(Debug, Error)]
pub enum ControllerError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("fetch task failed: {0}")]
    Task(#[source] JoinError),

    #[error(transparent)]
    Surface(#[from] SurfaceError),
}

#[derive(Clone, Debug)]
pub struct ControllerOptions {
    pub page_size: usize,
    pub detail_page_size: usize,
    pub refresh_period: Duration,
    pub initial_delay: Duration,
    pub auto_refresh: bool,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            detail_page_size: DEFAULT_DETAIL_PAGE_SIZE,
            refresh_period: DEFAULT_REFRESH_PERIOD,
            initial_delay: DEFAULT_INITIAL_DELAY,
            auto_refresh: false,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Mode {
    List,
    Detail,
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Pending {
    Collection,
    Detail(ItemId),
}

enum FetchOutcome {
    Collection(Result<Collection, FetchError>),
    Detail(Result<ItemDetail, FetchError>),
}

/// Owns the list and detail state of one page and is the only code that
/// mutates them.
///
/// At most one fetch runs at a time; its handle lives in `in_flight` and
/// triggers arriving while it is set are dropped.
pub struct PageController<S: DataSource> {
    source: Arc<S>,
    options: ControllerOptions,
    list: ListState,
    detail: Option<ItemDetail>,
    detail_pager: Pager,
    mode: Mode,
    status: Option<StatusMessage>,
    last_error: Option<String>,
    last_failed: Option<Pending>,
    in_flight: Option<(Pending, JoinHandle<FetchOutcome>)>,
    /// Cleared when the user leaves for the list while a detail loads.
    detail_wanted: bool,
    refresh: AutoRefresh,
}

impl<S: DataSource> PageController<S> {
    pub fn new(source: S, options: ControllerOptions) -> Self {
        let list = ListState::with_order(options.page_size, source.sort_order());
        let refresh = AutoRefresh::new(options.refresh_period);
        let detail_pager = Pager::new(options.detail_page_size);
        Self {
            source: Arc::new(source),
            options,
            list,
            detail: None,
            detail_pager,
            mode: Mode::List,
            status: None,
            last_error: None,
            last_failed: None,
            in_flight: None,
            detail_wanted: false,
            refresh,
        }
    }

    pub fn label(&self) -> &str {
        self.source.label()
    }

    pub fn list(&self) -> &ListState {
        &self.list
    }

    pub fn detail(&self) -> Option<&ItemDetail> {
        match self.mode {
            Mode::Detail => self.detail.as_ref(),
            Mode::List => None,
        }
    }

    pub fn status(&self) -> Option<&StatusMessage> {
        self.status.as_ref()
    }

    pub fn is_fetching(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn auto_refresh_active(&self) -> bool {
        self.refresh.is_active()
    }

    /// The event-dispatch table. Every state change goes through here.
    pub fn dispatch(&mut self, event: PageEvent) -> Flow {
        tracing::debug!(?event, "dispatch");
        match event {
            PageEvent::SearchChanged(term) => {
                self.mode = Mode::List;
                self.detail_wanted = false;
                self.list.set_search_term(&term);
            }
            PageEvent::WindowSelected(window) => {
                self.mode = Mode::List;
                self.detail_wanted = false;
                self.list.set_time_window(window);
            }
            PageEvent::PageSelected(page) => match (self.mode, self.detail.as_ref()) {
                (Mode::Detail, Some(detail)) => {
                    self.detail_pager.select(page, detail.sections.len());
                }
                _ => {
                    self.list.set_page(page);
                }
            },
            PageEvent::ItemSelected(id) => {
                self.start_fetch(Pending::Detail(id));
            }
            PageEvent::Back => {
                self.mode = Mode::List;
                self.detail_wanted = false;
                self.detail = None;
                self.list.set_search_term("");
            }
            PageEvent::Retry => {
                let pending = self.last_failed.clone().unwrap_or(Pending::Collection);
                self.start_fetch(pending);
            }
            PageEvent::RefreshRequested => {
                self.start_fetch(Pending::Collection);
            }
            PageEvent::AutoRefreshToggled => {
                if self.refresh.toggle() {
                    self.start_fetch(Pending::Collection);
                    self.status = Some(StatusMessage::info(format!(
                        "Auto refresh aktif (setiap {} detik)",
                        self.refresh.period().as_secs()
                    )));
                } else {
                    self.status = Some(StatusMessage::info("Auto refresh dimatikan"));
                }
            }
            PageEvent::Quit => return Flow::Quit,
        }
        Flow::Continue
    }

    /// Triggers a collection fetch unless one is already running.
    pub fn refresh(&mut self) -> bool {
        self.start_fetch(Pending::Collection)
    }

    fn start_fetch(&mut self, pending: Pending) -> bool {
        if let Some((running, _)) = &self.in_flight {
            tracing::debug!(?running, ?pending, "fetch already in flight, trigger ignored");
            return false;
        }
        let source = Arc::clone(&self.source);
        let handle = match &pending {
            Pending::Collection => {
                self.status = Some(StatusMessage::info("Memuat data..."));
                tokio::spawn(async move { FetchOutcome::Collection(source.fetch_collection().await) })
            }
            Pending::Detail(id) => {
                self.status = Some(StatusMessage::info(format!("Memuat {id}...")));
                self.detail_wanted = true;
                let id = id.clone();
                tokio::spawn(async move { FetchOutcome::Detail(source.fetch_detail(&id).await) })
            }
        };
        self.in_flight = Some((pending, handle));
        true
    }

    /// Waits for the running fetch, if any, and applies its result.
    pub async fn settle(&mut self) -> Result<(), ControllerError> {
        let Some((pending, handle)) = self.in_flight.as_mut() else {
            return Ok(());
        };
        let joined = handle.await;
        let pending = pending.clone();
        self.in_flight = None;
        self.finish(pending, joined)
    }

    fn finish(
        &mut self,
        pending: Pending,
        joined: Result<FetchOutcome, JoinError>,
    ) -> Result<(), ControllerError> {
        let outcome = match joined {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!(error = %e, "fetch task failed");
                self.record_failure(pending, e.to_string());
                return Err(ControllerError::Task(e));
            }
        };
        match outcome {
            FetchOutcome::Collection(Ok(collection)) => {
                let count = collection.len();
                self.list.load(collection);
                self.last_error = None;
                self.last_failed = None;
                self.status = Some(StatusMessage::success(format!(
                    "Berhasil memuat {count} item"
                )));
                tracing::info!(count, source = self.source.label(), "collection loaded");
                Ok(())
            }
            FetchOutcome::Detail(Ok(_)) if !self.detail_wanted => {
                tracing::debug!(?pending, "detail arrived after leaving it, dropped");
                self.last_failed = None;
                self.status = None;
                Ok(())
            }
            FetchOutcome::Detail(Ok(detail)) => {
                self.detail_wanted = false;
                self.detail_pager = Pager::new(self.options.detail_page_size);
                self.detail = Some(detail);
                self.mode = Mode::Detail;
                self.last_failed = None;
                self.status = None;
                Ok(())
            }
            FetchOutcome::Collection(Err(e)) | FetchOutcome::Detail(Err(e)) => {
                tracing::warn!(error = %e, kind = ?e.kind(), "fetch failed");
                self.record_failure(pending, e.to_string());
                Err(e.into())
            }
        }
    }

    fn record_failure(&mut self, pending: Pending, message: String) {
        self.status = Some(StatusMessage::error(format!("Gagal memuat data: {message}")));
        self.last_error = Some(message);
        self.last_failed = Some(pending);
    }

    pub fn render(&self) -> DisplayTree {
        let zone = Local::now().offset().fix();
        render::render(&self.view(Utc::now(), zone))
    }

    fn view(&self, now: chrono::DateTime<Utc>, zone: chrono::FixedOffset) -> ViewState<'_> {
        let label = self.source.label();
        let status = self.status.as_ref();
        if let (Mode::Detail, Some(detail)) = (self.mode, self.detail.as_ref()) {
            return ViewState::Detail(DetailView {
                label,
                detail,
                pager: &self.detail_pager,
                status,
            });
        }
        if self.list.total_len() == 0 {
            let reason = match &self.last_error {
                Some(message) => EmptyReason::Failed(message.clone()),
                None => EmptyReason::NoData,
            };
            // The failure text already sits in the panel.
            let status = status.filter(|s| s.level != StatusLevel::Error);
            return ViewState::Empty(EmptyView {
                label,
                reason,
                status,
            });
        }
        if self.list.filtered_len() == 0 {
            return ViewState::Empty(EmptyView {
                label,
                reason: EmptyReason::NoMatch,
                status,
            });
        }
        ViewState::List(ListView {
            label,
            state: &self.list,
            status,
            auto_refresh: self.refresh.is_active(),
            now,
            zone,
        })
    }

    /// Drives the page until `Quit` or the event channel closes.
    pub async fn run<D: DisplaySurface>(
        &mut self,
        mut events: mpsc::Receiver<PageEvent>,
        surface: &mut D,
    ) -> Result<(), ControllerError> {
        surface.present(&self.render())?;
        tokio::time::sleep(self.options.initial_delay).await;
        self.start_fetch(Pending::Collection);
        if self.options.auto_refresh {
            self.refresh.start();
        }
        surface.present(&self.render())?;

        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Some(event) => {
                        if self.dispatch(event) == Flow::Quit {
                            break;
                        }
                    }
                    None => break,
                },
                _ = self.refresh.tick() => {
                    tracing::debug!("auto refresh tick");
                    self.start_fetch(Pending::Collection);
                }
                joined = wait_in_flight(&mut self.in_flight) => {
                    if let Some((pending, _)) = self.in_flight.take() {
                        // Failures are shown on the page; the loop keeps going.
                        let _ = self.finish(pending, joined);
                    }
                }
            }
            surface.present(&self.render())?;
        }
        self.refresh.stop();
        Ok(())
    }
}

async fn wait_in_flight(
    slot: &mut Option<(Pending, JoinHandle<FetchOutcome>)>,
) -> Result<FetchOutcome, JoinError> {
    match slot.as_mut() {
        Some((_, handle)) => handle.await,
        None => std::future::pending().await,
    }
}
