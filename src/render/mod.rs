pub mod document;
pub mod markup;

use chrono::{DateTime, FixedOffset, Utc};

use crate::format::{self, Freshness};
use crate::model::{ItemDetail, ItemKind, ListItem, MetricKind};
use crate::state::{ListState, Pager, TimeWindow};

pub use markup::{escape_html, DisplayTree, Element, Node};

pub const PLACEHOLDER_THUMBNAIL: &str = "https://via.placeholder.com/320x180?text=Kajian";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Success,
    Error,
}

impl StatusLevel {
    fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Error => "error",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusMessage {
    pub level: StatusLevel,
    pub text: String,
}

impl StatusMessage {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            level: StatusLevel::Info,
            text: text.into(),
        }
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self {
            level: StatusLevel::Success,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: StatusLevel::Error,
            text: text.into(),
        }
    }
}

/// Why the list has nothing to show.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EmptyReason {
    /// Nothing loaded yet, or the source returned nothing.
    NoData,
    /// Data exists but the active filters exclude all of it.
    NoMatch,
    Failed(String),
}

/// Everything the renderer needs, borrowed from the controller.
#[derive(Clone, Debug)]
pub enum ViewState<'a> {
    List(ListView<'a>),
    Detail(DetailView<'a>),
    Empty(EmptyView<'a>),
}

#[derive(Clone, Debug)]
pub struct ListView<'a> {
    pub label: &'a str,
    pub state: &'a ListState,
    pub status: Option<&'a StatusMessage>,
    pub auto_refresh: bool,
    pub now: DateTime<Utc>,
    /// Zone of the "last update" clock.
    pub zone: FixedOffset,
}

#[derive(Clone, Debug)]
pub struct DetailView<'a> {
    pub label: &'a str,
    pub detail: &'a ItemDetail,
    pub pager: &'a Pager,
    pub status: Option<&'a StatusMessage>,
}

#[derive(Clone, Debug)]
pub struct EmptyView<'a> {
    pub label: &'a str,
    pub reason: EmptyReason,
    pub status: Option<&'a StatusMessage>,
}

/// Projects a view state into a display tree. No I/O, no clock reads.
pub fn render(view: &ViewState<'_>) -> DisplayTree {
    match view {
        ViewState::List(v) => render_list(v),
        ViewState::Detail(v) => render_detail(v),
        ViewState::Empty(v) => render_empty(v),
    }
}

fn page_root(label: &str, mode: &'static str) -> Element {
    Element::new("main")
        .class(format!("page page-{mode}"))
        .attr("data-view", mode)
        .child(Element::new("h1").class("page-title").text(label))
}

fn status_line(status: Option<&StatusMessage>) -> Option<Element> {
    status.map(|s| {
        Element::new("div")
            .class(format!("status status-{}", s.level.as_str()))
            .attr("role", "status")
            .text(s.text.as_str())
    })
}

fn render_list(v: &ListView<'_>) -> DisplayTree {
    let state = v.state;
    let mut root = page_root(v.label, "list");
    if let Some(status) = status_line(v.status) {
        root = root.child(status);
    }

    let timeline = state.has_timestamps();
    if timeline {
        root = root.child(stats_strip(v));
    }
    root = root.child(controls(state, timeline, v.auto_refresh));

    if !state.search_term().is_empty() {
        root = root.child(
            Element::new("p")
                .class("search-result")
                .text(format!(
                    "{} hasil untuk \"{}\"",
                    state.filtered_len(),
                    state.search_term()
                )),
        );
    }

    let cards = state.current_page().into_iter().map(|item| card(item, v.now));
    root = root.child(Element::new("section").class("card-grid").children(cards));

    if let Some(nav) = pagination(state.pager(), state.filtered_len()) {
        root = root.child(nav);
    }
    DisplayTree::new(v.label, root)
}

fn stats_strip(v: &ListView<'_>) -> Element {
    let stats = v.state.stats(v.now);
    let updated = stats
        .updated_at
        .map(|ts| format::format_clock(&ts.with_timezone(&v.zone)))
        .unwrap_or_else(|| "-".to_string());
    let stat = |name: &'static str, label: &str, value: String| {
        Element::new("div")
            .class("stat")
            .attr("data-stat", name)
            .child(Element::new("strong").text(value))
            .child(Element::new("span").text(label))
    };
    Element::new("div")
        .class("stats")
        .child(stat("total", "Total Video", stats.shown.to_string()))
        .child(stat("fresh", "Video Baru", stats.fresh.to_string()))
        .child(stat("week", "Minggu Ini", stats.this_week.to_string()))
        .child(stat("updated", "Update Terakhir", updated))
}

fn controls(state: &ListState, timeline: bool, auto_refresh: bool) -> Element {
    let mut bar = Element::new("div").class("controls").child(
        Element::new("input")
            .attr("type", "search")
            .attr("value", state.search_term())
            .attr("placeholder", "Cari...")
            .event("search-changed"),
    );
    if timeline {
        let buttons = TimeWindow::all().into_iter().map(|w| {
            let class = if w == state.time_window() {
                "filter-btn active"
            } else {
                "filter-btn"
            };
            Element::new("button")
                .class(class)
                .event("window-clicked")
                .attr("data-window", w.as_str())
                .text(w.label())
        });
        bar = bar
            .child(Element::new("div").class("filters").children(buttons))
            .child(
                Element::new("button")
                    .class(if auto_refresh {
                        "refresh-toggle active"
                    } else {
                        "refresh-toggle"
                    })
                    .event("refresh-toggle-clicked")
                    .text(if auto_refresh {
                        "Auto Refresh: ON"
                    } else {
                        "Auto Refresh: OFF"
                    }),
            );
    }
    bar
}

fn card(item: &ListItem, now: DateTime<Utc>) -> Element {
    let base = Element::new("article")
        .event("item-clicked")
        .attr("data-id", item.id.to_string());
    match &item.kind {
        ItemKind::Surah {
            arabic_name,
            revelation,
        } => {
            let verses = item.metric(MetricKind::Verses).unwrap_or(0);
            base.class("card surah-card")
                .child(Element::new("span").class("surah-number").text(item.id.to_string()))
                .child(Element::new("div").class("arabic").attr("dir", "rtl").text(arabic_name.as_str()))
                .child(Element::new("h3").text(item.title.as_str()))
                .child(Element::new("p").class("translation").text(item.subtitle.as_str()))
                .child(
                    Element::new("p")
                        .class("meta")
                        .text(format!("{verses} Ayat • {revelation}")),
                )
        }
        ItemKind::Video {
            description,
            duration,
        } => {
            let freshness = item
                .published_at()
                .map(|ts| Freshness::of(ts, now))
                .unwrap_or(Freshness::Regular);
            let class = match freshness.css_class() {
                "" => "card video-card".to_string(),
                extra => format!("card video-card {extra}"),
            };
            let mut thumb = Element::new("div").class("thumbnail");
            if let Some(badge) = freshness.badge() {
                thumb = thumb.child(Element::new("span").class("badge").text(badge));
            }
            thumb = thumb
                .child(
                    Element::new("img")
                        .attr(
                            "src",
                            item.thumbnail.as_deref().unwrap_or(PLACEHOLDER_THUMBNAIL),
                        )
                        .attr("alt", item.title.as_str())
                        .attr("loading", "lazy"),
                )
                .child(
                    Element::new("span")
                        .class("duration")
                        .text(duration.as_deref().unwrap_or(format::MISSING_DURATION)),
                );
            let views = format::format_count(item.metric(MetricKind::Views).unwrap_or(0));
            let ago = item
                .published_at()
                .map(|ts| format::format_time_ago(ts, now))
                .unwrap_or_default();
            base.class(class)
                .child(thumb)
                .child(Element::new("h3").class("title").text(item.title.as_str()))
                .child(Element::new("p").class("channel").text(item.subtitle.as_str()))
                .child(
                    Element::new("p")
                        .class("meta")
                        .text(format!("{views} views • {ago}")),
                )
                .child(Element::new("p").class("description").text(description.as_str()))
        }
    }
}

/// Prev, the page-number window and Next. `None` for a single page.
fn pagination(pager: &Pager, total: usize) -> Option<Element> {
    let count = pager.page_count(total);
    if count <= 1 {
        return None;
    }
    let page = pager.page();
    let nav_button = |label: &'static str, target: usize, enabled: bool| {
        let el = Element::new("button")
            .class("page-btn")
            .event("page-clicked")
            .attr("data-page", target.to_string())
            .text(label);
        if enabled {
            el
        } else {
            el.attr("disabled", "disabled")
        }
    };
    let numbers = pager.button_window(total).map(|p| {
        Element::new("button")
            .class(if p == page { "page-btn active" } else { "page-btn" })
            .event("page-clicked")
            .attr("data-page", p.to_string())
            .text(p.to_string())
    });
    Some(
        Element::new("nav")
            .class("pagination")
            .child(nav_button("Prev", page.saturating_sub(1).max(1), pager.has_prev()))
            .children(numbers)
            .child(nav_button("Next", (page + 1).min(count), pager.has_next(total))),
    )
}

fn render_detail(v: &DetailView<'_>) -> DisplayTree {
    let detail = v.detail;
    let mut root = page_root(v.label, "detail");
    if let Some(status) = status_line(v.status) {
        root = root.child(status);
    }
    root = root
        .child(
            Element::new("button")
                .class("back-btn")
                .event("back-clicked")
                .text("Kembali"),
        )
        .child(Element::new("h2").class("detail-heading").text(detail.heading.as_str()));

    if let ItemKind::Surah { revelation, .. } = &detail.item.kind {
        root = root.child(Element::new("p").class("meta").text(format!(
            "{} • {} Ayat • {}",
            detail.item.subtitle,
            detail.item.metric(MetricKind::Verses).unwrap_or(0),
            revelation
        )));
    }
    if let Some(link) = &detail.link {
        root = root.child(
            Element::new("a")
                .class("watch-link")
                .attr("href", link.as_str())
                .attr("target", "_blank")
                .attr("rel", "noreferrer")
                .text("Tonton di YouTube"),
        );
    }

    let total = detail.sections.len();
    let sections = detail.sections[v.pager.range(total)].iter().map(|s| {
        let mut el = Element::new("div")
            .class("section")
            .attr("data-number", s.number.to_string())
            .child(Element::new("span").class("section-number").text(s.number.to_string()))
            .child(Element::new("p").class("section-text").text(s.text.as_str()));
        if !s.caption.is_empty() {
            el = el.child(Element::new("p").class("caption").text(s.caption.as_str()));
        }
        el
    });
    root = root.child(Element::new("section").class("sections").children(sections));

    if let Some(nav) = pagination(v.pager, total) {
        root = root.child(nav);
    }
    DisplayTree::new(detail.heading.as_str(), root)
}

fn render_empty(v: &EmptyView<'_>) -> DisplayTree {
    let mut root = page_root(v.label, "empty");
    if let Some(status) = status_line(v.status) {
        root = root.child(status);
    }
    let (message, retry) = match &v.reason {
        EmptyReason::NoData => ("Belum ada data untuk ditampilkan.".to_string(), true),
        EmptyReason::NoMatch => ("Tidak ada hasil yang cocok.".to_string(), false),
        EmptyReason::Failed(err) => (format!("Gagal memuat data: {err}"), true),
    };
    let mut panel = Element::new("div")
        .class("empty-state")
        .child(Element::new("p").text(message));
    if retry {
        panel = panel.child(
            Element::new("button")
                .class("retry-btn")
                .event("retry-clicked")
                .text("Coba Lagi"),
        );
    }
    DisplayTree::new(v.label, root.child(panel))
}
