use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum ItemId {
    Number(i64),
    Text(String),
}

impl ItemId {
    /// Integer-looking input becomes `Number`, anything else `Text`.
    pub fn parse(value: &str) -> Self {
        let trimmed = value.trim();
        match trimmed.parse::<i64>() {
            Ok(n) => Self::Number(n),
            Err(_) => Self::Text(trimmed.to_string()),
        }
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for ItemId {
    fn from(value: i64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for ItemId {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum SortKey {
    Timestamp(DateTime<Utc>),
    Ordinal(i64),
}

impl PartialOrd for SortKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SortKey {
    // Collections are homogeneous in practice; mixed keys order ordinals first.
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Timestamp(a), Self::Timestamp(b)) => a.cmp(b),
            (Self::Ordinal(a), Self::Ordinal(b)) => a.cmp(b),
            (Self::Ordinal(_), Self::Timestamp(_)) => Ordering::Less,
            (Self::Timestamp(_), Self::Ordinal(_)) => Ordering::Greater,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    Views,
    Verses,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Metric {
    pub kind: MetricKind,
    pub value: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ItemKind {
    Surah {
        arabic_name: String,
        revelation: String,
    },
    Video {
        description: String,
        /// Display form such as `12:04`; `None` when enrichment had no record.
        duration: Option<String>,
    },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ListItem {
    pub id: ItemId,
    pub title: String,
    pub subtitle: String,
    pub sort_key: Option<SortKey>,
    pub metrics: Vec<Metric>,
    pub thumbnail: Option<String>,
    #[serde(flatten)]
    pub kind: ItemKind,
}

impl ListItem {
    pub fn published_at(&self) -> Option<DateTime<Utc>> {
        match self.sort_key {
            Some(SortKey::Timestamp(ts)) => Some(ts),
            _ => None,
        }
    }

    pub fn metric(&self, kind: MetricKind) -> Option<u64> {
        self.metrics.iter().find(|m| m.kind == kind).map(|m| m.value)
    }

    pub fn set_metric(&mut self, kind: MetricKind, value: u64) {
        match self.metrics.iter_mut().find(|m| m.kind == kind) {
            Some(m) => m.value = value,
            None => self.metrics.push(Metric { kind, value }),
        }
    }
}

/// One full fetch result. Replaced wholesale on refresh.
#[derive(Clone, Debug, Serialize)]
pub struct Collection {
    items: Vec<ListItem>,
    fetched_at: DateTime<Utc>,
}

impl Collection {
    pub fn new(items: Vec<ListItem>) -> Self {
        Self::fetched_at(items, Utc::now())
    }

    pub fn fetched_at(items: Vec<ListItem>, fetched_at: DateTime<Utc>) -> Self {
        let mut seen: HashSet<ItemId> = HashSet::new();
        let before = items.len();
        let items: Vec<ListItem> = items
            .into_iter()
            .filter(|item| seen.insert(item.id.clone()))
            .collect();
        if items.len() != before {
            tracing::debug!(
                dropped = before - items.len(),
                "dropped items with duplicate ids"
            );
        }
        Self { items, fetched_at }
    }

    pub fn items(&self) -> &[ListItem] {
        &self.items
    }

    pub fn into_items(self) -> Vec<ListItem> {
        self.items
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.fetched_at
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DetailSection {
    pub number: u32,
    pub text: String,
    pub caption: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ItemDetail {
    pub item: ListItem,
    pub heading: String,
    pub sections: Vec<DetailSection>,
    pub link: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn item(id: i64) -> ListItem {
        ListItem {
            id: ItemId::Number(id),
            title: format!("item {id}"),
            subtitle: String::new(),
            sort_key: Some(SortKey::Ordinal(id)),
            metrics: vec![],
            thumbnail: None,
            kind: ItemKind::Surah {
                arabic_name: String::new(),
                revelation: String::new(),
            },
        }
    }

    #[test]
    fn item_id_parse_prefers_numbers() {
        assert_eq!(ItemId::parse(" 42 "), ItemId::Number(42));
        assert_eq!(ItemId::parse("dQw4w9WgXcQ"), ItemId::from("dQw4w9WgXcQ"));
        assert_eq!(ItemId::parse("2:255").to_string(), "2:255");
    }

    #[test]
    fn collection_keeps_first_of_duplicate_ids() {
        let mut dup = item(1);
        dup.title = "second".to_string();
        let c = Collection::new(vec![item(1), item(2), dup]);
        assert_eq!(c.len(), 2);
        assert_eq!(c.items()[0].title, "item 1");
    }

    #[test]
    fn set_metric_overwrites_existing_value() {
        let mut it = item(3);
        it.set_metric(MetricKind::Views, 5);
        it.set_metric(MetricKind::Views, 9);
        assert_eq!(it.metric(MetricKind::Views), Some(9));
        assert_eq!(it.metrics.len(), 1);
    }

    #[test]
    fn published_at_only_for_timestamps() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();
        let mut it = item(1);
        assert_eq!(it.published_at(), None);
        it.sort_key = Some(SortKey::Timestamp(ts));
        assert_eq!(it.published_at(), Some(ts));
    }
}
