use std::collections::HashMap;

use chrono::{DateTime, Utc};
use itertools::Itertools;
use serde::Deserialize;
use serde_json::Value;

use super::{fetch_json, join_url, DataSource, FetchError, RelevanceFilter};
use crate::format;
use crate::model::{Collection, DetailSection, ItemDetail, ItemId, ItemKind, ListItem, MetricKind, SortKey};

pub const DEFAULT_VIDEO_BASE_URL: &str = "https://www.googleapis.com/youtube/v3";
pub const WATCH_URL: &str = "https://www.youtube.com/watch?v=";

/// Parameters of the primary search request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VideoQuery {
    pub query: String,
    pub max_results: u32,
    pub relevance_language: String,
    pub region_code: String,
}

impl Default for VideoQuery {
    fn default() -> Self {
        Self {
            query: "ustadz mbois".to_string(),
            max_results: 50,
            relevance_language: "id".to_string(),
            region_code: "ID".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchItem {
    #[serde(default)]
    id: SearchId,
    #[serde(default)]
    snippet: Option<Snippet>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchId {
    video_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct Snippet {
    title: String,
    channel_title: String,
    description: String,
    published_at: Option<String>,
    thumbnails: Thumbnails,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Thumbnails {
    medium: Option<Thumbnail>,
    default: Option<Thumbnail>,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    url: String,
}

#[derive(Debug, Deserialize)]
struct VideosResponse {
    #[serde(default)]
    items: Vec<VideoRecord>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoRecord {
    id: String,
    #[serde(default)]
    snippet: Option<Snippet>,
    #[serde(default)]
    content_details: Option<ContentDetails>,
    #[serde(default)]
    statistics: Option<Statistics>,
}

#[derive(Debug, Deserialize)]
struct ContentDetails {
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Statistics {
    // The API sends counters as strings.
    view_count: Option<String>,
}

impl Snippet {
    fn thumbnail(&self) -> Option<String> {
        self.thumbnails
            .medium
            .as_ref()
            .or(self.thumbnails.default.as_ref())
            .map(|t| t.url.clone())
    }

    fn published(&self) -> Option<DateTime<Utc>> {
        let raw = self.published_at.as_deref()?;
        DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
    }

    fn into_item(self, id: String) -> ListItem {
        let sort_key = self.published().map(SortKey::Timestamp);
        let thumbnail = self.thumbnail();
        let mut item = ListItem {
            id: ItemId::Text(id),
            title: self.title,
            subtitle: self.channel_title,
            sort_key,
            metrics: Vec::new(),
            thumbnail,
            kind: ItemKind::Video {
                description: self.description,
                duration: None,
            },
        };
        item.set_metric(MetricKind::Views, 0);
        item
    }
}

impl VideoRecord {
    fn duration(&self) -> Option<String> {
        self.content_details
            .as_ref()
            .and_then(|c| c.duration.as_deref())
            .and_then(format::format_iso8601_duration)
    }

    fn views(&self) -> u64 {
        self.statistics
            .as_ref()
            .and_then(|s| s.view_count.as_deref())
            .and_then(|v| v.parse().ok())
            .unwrap_or(0)
    }

    fn apply_to(&self, item: &mut ListItem) {
        if let ItemKind::Video { duration, .. } = &mut item.kind {
            *duration = self.duration();
        }
        item.set_metric(MetricKind::Views, self.views());
    }
}

/// Recent study-session videos from the YouTube Data API, kept only when
/// they mention one of the relevance keywords.
#[derive(Clone, Debug)]
pub struct VideoSource {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    query: VideoQuery,
    relevance: RelevanceFilter,
}

impl VideoSource {
    pub fn new(client: reqwest::Client, api_key: impl Into<String>) -> Self {
        Self {
            client,
            base_url: DEFAULT_VIDEO_BASE_URL.to_string(),
            api_key: api_key.into(),
            query: VideoQuery::default(),
            relevance: RelevanceFilter::default(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_query(mut self, query: VideoQuery) -> Self {
        self.query = query;
        self
    }

    pub fn with_relevance(mut self, relevance: RelevanceFilter) -> Self {
        self.relevance = relevance;
        self
    }

    pub fn query(&self) -> &VideoQuery {
        &self.query
    }

    async fn search(&self) -> Result<Vec<ListItem>, FetchError> {
        let mut url = join_url(&self.base_url, "search")?;
        url.query_pairs_mut()
            .append_pair("key", &self.api_key)
            .append_pair("q", &self.query.query)
            .append_pair("part", "snippet")
            .append_pair("type", "video")
            .append_pair("order", "date")
            .append_pair("maxResults", &self.query.max_results.to_string())
            .append_pair("relevanceLanguage", &self.query.relevance_language)
            .append_pair("regionCode", &self.query.region_code);

        let body = fetch_json(&self.client, url, api_error).await?;
        let response: SearchResponse = decode(body, "search")?;
        let total = response.items.len();

        let items: Vec<ListItem> = response
            .items
            .into_iter()
            .filter_map(|hit| {
                // Hits without an id or snippet (channels, playlists) are skipped.
                let id = hit.id.video_id?;
                let snippet = hit.snippet?;
                self.relevance
                    .matches(&[
                        snippet.title.as_str(),
                        snippet.channel_title.as_str(),
                        snippet.description.as_str(),
                    ])
                    .then(|| snippet.into_item(id))
            })
            .collect();
        tracing::debug!(total, relevant = items.len(), "search results filtered");
        Ok(items)
    }

    async fn videos(&self, ids: &str, part: &str) -> Result<Vec<VideoRecord>, FetchError> {
        let mut url = join_url(&self.base_url, "videos")?;
        url.query_pairs_mut()
            .append_pair("key", &self.api_key)
            .append_pair("id", ids)
            .append_pair("part", part);
        let body = fetch_json(&self.client, url, api_error).await?;
        let response: VideosResponse = decode(body, "videos")?;
        Ok(response.items)
    }

    /// Fills duration and views from one batched detail request.
    ///
    /// Items without a detail record keep their defaults; a failed request
    /// leaves every item at its defaults.
    async fn enrich(&self, items: &mut [ListItem]) {
        let ids = items.iter().map(|i| i.id.to_string()).join(",");
        let records = match self.videos(&ids, "contentDetails,statistics").await {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!(error = %e, "video details unavailable, keeping defaults");
                return;
            }
        };
        let by_id: HashMap<&str, &VideoRecord> =
            records.iter().map(|r| (r.id.as_str(), r)).collect();
        let mut missing = 0usize;
        for item in items.iter_mut() {
            match by_id.get(item.id.to_string().as_str()) {
                Some(record) => record.apply_to(item),
                None => missing += 1,
            }
        }
        if missing > 0 {
            tracing::debug!(missing, "some videos had no detail record");
        }
    }
}

impl DataSource for VideoSource {
    fn label(&self) -> &str {
        "Kajian Ustadz Mbois"
    }

    async fn fetch_collection(&self) -> Result<Collection, FetchError> {
        let mut items = self.search().await?;
        if items.is_empty() {
            return Err(FetchError::empty("no relevant videos found"));
        }
        self.enrich(&mut items).await;
        tracing::info!(videos = items.len(), "loaded videos");
        Ok(Collection::new(items))
    }

    async fn fetch_detail(&self, id: &ItemId) -> Result<ItemDetail, FetchError> {
        let id = id.to_string();
        let record = self
            .videos(&id, "snippet,contentDetails,statistics")
            .await?
            .into_iter()
            .find(|r| r.id == id)
            .ok_or_else(|| FetchError::empty(format!("video '{id}' not found")))?;
        Ok(detail_from_record(record))
    }
}

fn detail_from_record(mut record: VideoRecord) -> ItemDetail {
    let snippet = record.snippet.take().unwrap_or_default();
    let description = snippet.description.clone();
    let mut item = snippet.into_item(record.id.clone());
    record.apply_to(&mut item);
    let link = format!("{WATCH_URL}{}", record.id);
    let sections = description
        .split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .enumerate()
        .map(|(idx, p)| DetailSection {
            number: idx as u32 + 1,
            text: p.to_string(),
            caption: String::new(),
        })
        .collect();
    ItemDetail {
        heading: item.title.clone(),
        item,
        sections,
        link: Some(link),
    }
}

/// `{"error": {"code", "message"}}` marks an upstream failure.
fn api_error(body: &Value) -> Option<String> {
    let err = body.get("error")?;
    let message = err
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or("unknown error");
    Some(match err.get("code").and_then(Value::as_i64) {
        Some(code) => format!("{code}: {message}"),
        None => message.to_string(),
    })
}

fn decode<T: serde::de::DeserializeOwned>(body: Value, what: &str) -> Result<T, FetchError> {
    serde_json::from_value(body).map_err(|e| FetchError::Decode {
        url: what.to_string(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn hit(id: &str, title: &str, channel: &str) -> Value {
        json!({
            "id": {"kind": "youtube#video", "videoId": id},
            "snippet": {
                "title": title,
                "channelTitle": channel,
                "description": "",
                "publishedAt": "2024-05-01T10:00:00Z",
                "thumbnails": {
                    "default": {"url": format!("https://i.ytimg.com/vi/{id}/default.jpg")},
                    "medium": {"url": format!("https://i.ytimg.com/vi/{id}/mqdefault.jpg")}
                }
            }
        })
    }

    #[test]
    fn snippet_prefers_medium_thumbnail_and_parses_time() {
        let item: SearchItem = serde_json::from_value(hit("abc", "Kajian", "Ustadz Mbois")).unwrap();
        let li = item.snippet.unwrap().into_item("abc".to_string());
        assert_eq!(li.thumbnail.as_deref(), Some("https://i.ytimg.com/vi/abc/mqdefault.jpg"));
        assert_eq!(
            li.published_at().map(|t| t.to_rfc3339()),
            Some("2024-05-01T10:00:00+00:00".to_string())
        );
        assert_eq!(li.metric(MetricKind::Views), Some(0));
    }

    #[test]
    fn thumbnail_falls_back_to_default() {
        let mut raw = hit("abc", "Kajian", "Ustadz Mbois");
        raw["snippet"]["thumbnails"] = json!({"default": {"url": "d.jpg"}});
        let item: SearchItem = serde_json::from_value(raw).unwrap();
        assert_eq!(item.snippet.unwrap().thumbnail().as_deref(), Some("d.jpg"));
    }

    #[test]
    fn record_applies_duration_and_views() {
        let record: VideoRecord = serde_json::from_value(json!({
            "id": "abc",
            "contentDetails": {"duration": "PT1H2M3S"},
            "statistics": {"viewCount": "15340"}
        }))
        .unwrap();
        let item: SearchItem = serde_json::from_value(hit("abc", "t", "c")).unwrap();
        let mut li = item.snippet.unwrap().into_item("abc".to_string());
        record.apply_to(&mut li);
        assert_eq!(li.metric(MetricKind::Views), Some(15_340));
        match li.kind {
            ItemKind::Video { duration, .. } => assert_eq!(duration.as_deref(), Some("1:02:03")),
            _ => panic!("expected video"),
        }
    }

    #[test]
    fn error_payload_is_detected() {
        let body = json!({"error": {"code": 403, "message": "quotaExceeded"}});
        assert_eq!(api_error(&body).as_deref(), Some("403: quotaExceeded"));
        assert!(api_error(&json!({"items": []})).is_none());
    }

    #[test]
    fn detail_links_to_watch_page() {
        let record: VideoRecord = serde_json::from_value(json!({
            "id": "xyz",
            "snippet": {"title": "Tafsir", "channelTitle": "Ustadz Mbois", "description": "Bagian satu\n\nBagian dua"},
            "contentDetails": {"duration": "PT10M"},
            "statistics": {"viewCount": "12"}
        }))
        .unwrap();
        let detail = detail_from_record(record);
        assert_eq!(detail.link.as_deref(), Some("https://www.youtube.com/watch?v=xyz"));
        assert_eq!(detail.heading, "Tafsir");
        assert_eq!(detail.sections.len(), 2);
        assert_eq!(detail.sections[1].text, "Bagian dua");
    }

    #[test]
    fn default_query_matches_site_request() {
        let q = VideoQuery::default();
        assert_eq!(q.query, "ustadz mbois");
        assert_eq!(q.max_results, 50);
        assert_eq!(q.region_code, "ID");
    }
}
