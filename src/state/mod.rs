pub mod pager;

use std::str::FromStr;

use chrono::{DateTime, Duration, Local, TimeZone, Utc};

use crate::format;
use crate::model::{Collection, ItemId, ListItem};

pub use pager::Pager;

pub const DEFAULT_PAGE_SIZE: usize = 12;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TimeWindow {
    #[default]
    None,
    Today,
    Week,
    Month,
}

impl TimeWindow {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "all",
            Self::Today => "today",
            Self::Week => "week",
            Self::Month => "month",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::None => "Semua",
            Self::Today => "Hari Ini",
            Self::Week => "Minggu Ini",
            Self::Month => "Bulan Ini",
        }
    }

    pub fn all() -> [TimeWindow; 4] {
        [Self::None, Self::Today, Self::Week, Self::Month]
    }

    /// Earliest accepted publish instant, or `None` when the window keeps everything.
    ///
    /// `Today` starts at local midnight of `now`'s zone; `Week` and `Month`
    /// are rolling 7 and 30 day windows.
    pub fn cutoff<Tz: TimeZone>(self, now: &DateTime<Tz>) -> Option<DateTime<Utc>> {
        match self {
            Self::None => None,
            Self::Today => {
                let midnight = now.date_naive().and_hms_opt(0, 0, 0)?;
                let start = now
                    .timezone()
                    .from_local_datetime(&midnight)
                    .earliest()
                    .map(|dt| dt.with_timezone(&Utc))
                    // Midnight can fall in a DST gap; fall back to a day-long window.
                    .unwrap_or_else(|| now.with_timezone(&Utc) - Duration::days(1));
                Some(start)
            }
            Self::Week => Some(now.with_timezone(&Utc) - Duration::days(7)),
            Self::Month => Some(now.with_timezone(&Utc) - Duration::days(30)),
        }
    }
}

impl FromStr for TimeWindow {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "all" | "none" => Ok(Self::None),
            "today" | "day" => Ok(Self::Today),
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            other => Err(format!(
                "unknown time window '{other}', expected all, today, week or month"
            )),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortOrder {
    /// Newest (or highest ordinal) first.
    #[default]
    Descending,
    Ascending,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CollectionStats {
    /// Items passing the active filters.
    pub shown: usize,
    /// Items of the whole collection published within the fresh window.
    pub fresh: usize,
    /// Items of the whole collection published within the last seven days.
    pub this_week: usize,
    pub updated_at: Option<DateTime<Utc>>,
}

/// The fetched collection plus its filtered, paginated projection.
///
/// `filtered` holds indices into `items` and is recomputed from scratch on
/// every filter change.
#[derive(Clone, Debug)]
pub struct ListState {
    items: Vec<ListItem>,
    filtered: Vec<usize>,
    search: String,
    window: TimeWindow,
    cutoff: Option<DateTime<Utc>>,
    pager: Pager,
    order: SortOrder,
    loaded_at: Option<DateTime<Utc>>,
}

impl Default for ListState {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl ListState {
    pub fn new(page_size: usize) -> Self {
        Self::with_order(page_size, SortOrder::Descending)
    }

    pub fn with_order(page_size: usize, order: SortOrder) -> Self {
        Self {
            items: Vec::new(),
            filtered: Vec::new(),
            search: String::new(),
            window: TimeWindow::None,
            cutoff: None,
            pager: Pager::new(page_size),
            order,
            loaded_at: None,
        }
    }

    pub fn load(&mut self, collection: Collection) {
        self.loaded_at = Some(collection.timestamp());
        let mut items = collection.into_items();
        // Vec::sort_by is stable: equal keys keep fetch order.
        let order = self.order;
        items.sort_by(|a, b| match (&a.sort_key, &b.sort_key) {
            (Some(x), Some(y)) => match order {
                SortOrder::Descending => y.cmp(x),
                SortOrder::Ascending => x.cmp(y),
            },
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        });
        self.items = items;
        self.search.clear();
        self.window = TimeWindow::None;
        self.cutoff = None;
        self.pager.reset();
        self.recompute();
    }

    pub fn set_search_term(&mut self, term: &str) {
        self.search = term.trim().to_lowercase();
        self.pager.reset();
        self.recompute();
    }

    pub fn set_time_window(&mut self, window: TimeWindow) {
        self.set_time_window_at(window, &Local::now());
    }

    pub fn set_time_window_at<Tz: TimeZone>(&mut self, window: TimeWindow, now: &DateTime<Tz>) {
        self.window = window;
        self.cutoff = window.cutoff(now);
        self.pager.reset();
        self.recompute();
    }

    pub fn set_page(&mut self, page: usize) -> usize {
        self.pager.select(page, self.filtered.len())
    }

    pub fn set_page_size(&mut self, page_size: usize) {
        self.pager.set_page_size(page_size);
    }

    pub fn current_page(&self) -> Vec<&ListItem> {
        self.filtered[self.pager.range(self.filtered.len())]
            .iter()
            .map(|&idx| &self.items[idx])
            .collect()
    }

    /// Every item passing the active filters, in canonical order.
    pub fn filtered(&self) -> impl Iterator<Item = &ListItem> {
        self.filtered.iter().map(|&idx| &self.items[idx])
    }

    pub fn get(&self, id: &ItemId) -> Option<&ListItem> {
        self.items.iter().find(|item| &item.id == id)
    }

    pub fn page(&self) -> usize {
        self.pager.page()
    }

    pub fn page_size(&self) -> usize {
        self.pager.page_size()
    }

    pub fn page_count(&self) -> usize {
        self.pager.page_count(self.filtered.len())
    }

    pub fn pager(&self) -> &Pager {
        &self.pager
    }

    pub fn filtered_len(&self) -> usize {
        self.filtered.len()
    }

    pub fn total_len(&self) -> usize {
        self.items.len()
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded_at.is_some()
    }

    /// True when any held item carries a publish time; drives the
    /// time-window controls and the stats strip.
    pub fn has_timestamps(&self) -> bool {
        self.items.iter().any(|item| item.published_at().is_some())
    }

    pub fn search_term(&self) -> &str {
        &self.search
    }

    pub fn time_window(&self) -> TimeWindow {
        self.window
    }

    pub fn stats(&self, now: DateTime<Utc>) -> CollectionStats {
        let fresh_cutoff = now - format::fresh_window();
        let week_cutoff = now - Duration::days(7);
        let published = || self.items.iter().filter_map(ListItem::published_at);
        CollectionStats {
            shown: self.filtered.len(),
            fresh: published().filter(|ts| *ts >= fresh_cutoff).count(),
            this_week: published().filter(|ts| *ts >= week_cutoff).count(),
            updated_at: self.loaded_at,
        }
    }

    fn recompute(&mut self) {
        let search = self.search.as_str();
        let cutoff = self.cutoff;
        self.filtered = self
            .items
            .iter()
            .enumerate()
            .filter(|(_, item)| matches_search(item, search) && within_cutoff(item, cutoff))
            .map(|(idx, _)| idx)
            .collect();
    }
}

fn matches_search(item: &ListItem, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    item.title.to_lowercase().contains(needle)
        || item.subtitle.to_lowercase().contains(needle)
        || item.id.to_string().to_lowercase().contains(needle)
}

fn within_cutoff(item: &ListItem, cutoff: Option<DateTime<Utc>>) -> bool {
    match cutoff {
        None => true,
        Some(cutoff) => item.published_at().is_some_and(|ts| ts >= cutoff),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ItemKind, SortKey};
    use chrono::FixedOffset;

    fn video(id: &str, title: &str, ts: DateTime<Utc>) -> ListItem {
        ListItem {
            id: ItemId::from(id),
            title: title.to_string(),
            subtitle: "Channel".to_string(),
            sort_key: Some(SortKey::Timestamp(ts)),
            metrics: vec![],
            thumbnail: None,
            kind: ItemKind::Video {
                description: String::new(),
                duration: None,
            },
        }
    }

    fn base() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn twenty_five() -> Collection {
        let items = (0..25)
            .map(|i| video(&format!("v{i:02}"), &format!("Kajian {i}"), base() + Duration::hours(i)))
            .collect();
        Collection::new(items)
    }

    fn ids(items: &[&ListItem]) -> Vec<String> {
        items.iter().map(|i| i.id.to_string()).collect()
    }

    #[test]
    fn paging_scenario_of_twenty_five_items() {
        let mut state = ListState::new(10);
        state.load(twenty_five());

        let first = state.current_page();
        assert_eq!(first.len(), 10);
        assert_eq!(first[0].id.to_string(), "v24");
        assert_eq!(first[9].id.to_string(), "v15");

        assert_eq!(state.set_page(3), 3);
        let third = ids(&state.current_page());
        assert_eq!(third, vec!["v04", "v03", "v02", "v01", "v00"]);

        assert_eq!(state.set_page(4), 3);
        assert_eq!(ids(&state.current_page()), third);
    }

    #[test]
    fn pages_partition_the_filtered_collection() {
        let mut state = ListState::new(7);
        state.load(twenty_five());
        state.set_search_term("kajian 1");

        let expected: Vec<String> = state.filtered().map(|i| i.id.to_string()).collect();
        let mut seen = Vec::new();
        for page in 1..=state.page_count() {
            state.set_page(page);
            let items = state.current_page();
            assert_eq!(
                items.len(),
                state.page_size().min(state.filtered_len() - (page - 1) * state.page_size())
            );
            seen.extend(ids(&items));
        }
        assert_eq!(seen, expected);
    }

    #[test]
    fn empty_search_restores_loaded_view() {
        let mut state = ListState::new(10);
        state.load(twenty_five());
        let loaded: Vec<String> = state.filtered().map(|i| i.id.to_string()).collect();

        state.set_search_term("kajian 2");
        assert!(state.filtered_len() < 25);
        state.set_search_term("");
        let restored: Vec<String> = state.filtered().map(|i| i.id.to_string()).collect();
        assert_eq!(restored, loaded);
    }

    #[test]
    fn search_is_case_insensitive_and_covers_subtitle_and_id() {
        let mut state = ListState::new(10);
        state.load(twenty_five());
        state.set_search_term("KAJIAN 24");
        assert_eq!(state.filtered_len(), 1);
        state.set_search_term("channel");
        assert_eq!(state.filtered_len(), 25);
        state.set_search_term("v07");
        assert_eq!(state.filtered_len(), 1);
    }

    #[test]
    fn equal_keys_keep_fetch_order_across_loads() {
        let ts = base();
        let items = vec![
            video("a", "first", ts),
            video("b", "second", ts),
            video("c", "newer", ts + Duration::minutes(1)),
            video("d", "third", ts),
        ];
        let mut state = ListState::new(10);
        for _ in 0..3 {
            state.load(Collection::new(items.clone()));
            assert_eq!(ids(&state.current_page()), vec!["c", "a", "b", "d"]);
        }
    }

    #[test]
    fn missing_sort_key_sorts_last_in_both_orders() {
        let mut undated = video("x", "undated", base());
        undated.sort_key = None;
        let items = vec![undated, video("a", "a", base()), video("b", "b", base() + Duration::days(1))];

        let mut desc = ListState::new(10);
        desc.load(Collection::new(items.clone()));
        assert_eq!(ids(&desc.current_page()), vec!["b", "a", "x"]);

        let mut asc = ListState::with_order(10, SortOrder::Ascending);
        asc.load(Collection::new(items));
        assert_eq!(ids(&asc.current_page()), vec!["a", "b", "x"]);
    }

    #[test]
    fn today_window_starts_at_local_midnight() {
        let tz = FixedOffset::east_opt(7 * 3600).unwrap();
        let now = tz.with_ymd_and_hms(2024, 5, 10, 15, 0, 0).unwrap();
        let yesterday = tz.with_ymd_and_hms(2024, 5, 9, 23, 59, 0).unwrap();
        let today = tz.with_ymd_and_hms(2024, 5, 10, 0, 1, 0).unwrap();

        let mut state = ListState::new(10);
        state.load(Collection::new(vec![
            video("old", "late last night", yesterday.with_timezone(&Utc)),
            video("new", "just after midnight", today.with_timezone(&Utc)),
        ]));
        state.set_time_window_at(TimeWindow::Today, &now);
        assert_eq!(ids(&state.current_page()), vec!["new"]);
    }

    #[test]
    fn window_and_search_combine() {
        let now = base() + Duration::days(40);
        let mut state = ListState::new(10);
        state.load(Collection::new(vec![
            video("recent-match", "Tafsir Jumat", now - Duration::days(2)),
            video("recent-other", "Fiqih", now - Duration::days(3)),
            video("old-match", "Tafsir Ahad", now - Duration::days(20)),
        ]));
        state.set_time_window_at(TimeWindow::Week, &now);
        state.set_search_term("tafsir");
        assert_eq!(ids(&state.current_page()), vec!["recent-match"]);

        state.set_time_window_at(TimeWindow::Month, &now);
        assert_eq!(state.filtered_len(), 2);
        state.set_time_window_at(TimeWindow::None, &now);
        assert_eq!(state.filtered_len(), 2);
    }

    #[test]
    fn window_excludes_items_without_timestamp() {
        let mut undated = video("x", "undated", base());
        undated.sort_key = Some(SortKey::Ordinal(3));
        let mut state = ListState::new(10);
        state.load(Collection::new(vec![undated]));
        state.set_time_window_at(TimeWindow::Month, &base());
        assert_eq!(state.filtered_len(), 0);
        assert_eq!(state.page_count(), 1);
        assert!(state.current_page().is_empty());
    }

    #[test]
    fn load_resets_filters_and_page() {
        let mut state = ListState::new(10);
        state.load(twenty_five());
        state.set_search_term("kajian");
        state.set_page(2);
        state.load(twenty_five());
        assert_eq!(state.search_term(), "");
        assert_eq!(state.time_window(), TimeWindow::None);
        assert_eq!(state.page(), 1);
    }

    #[test]
    fn filter_change_resets_page() {
        let mut state = ListState::new(10);
        state.load(twenty_five());
        state.set_page(3);
        state.set_search_term("kajian");
        assert_eq!(state.page(), 1);
    }

    #[test]
    fn stats_count_fresh_and_weekly_items() {
        let now = base() + Duration::days(10);
        let mut state = ListState::new(10);
        state.load(Collection::fetched_at(
            vec![
                video("a", "a", now - Duration::days(1)),
                video("b", "b", now - Duration::days(5)),
                video("c", "c", now - Duration::days(9)),
            ],
            now,
        ));
        let stats = state.stats(now);
        assert_eq!(stats.shown, 3);
        assert_eq!(stats.fresh, 1);
        assert_eq!(stats.this_week, 2);
        assert_eq!(stats.updated_at, Some(now));
    }

    #[test]
    fn time_window_parses_cli_values() {
        assert_eq!("Week".parse::<TimeWindow>(), Ok(TimeWindow::Week));
        assert_eq!("all".parse::<TimeWindow>(), Ok(TimeWindow::None));
        assert!("year".parse::<TimeWindow>().is_err());
    }
}
