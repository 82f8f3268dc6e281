use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use super::{fetch_json, join_url, DataSource, FetchError};
use crate::model::{Collection, DetailSection, ItemDetail, ItemId, ItemKind, ListItem, Metric, MetricKind, SortKey};
use crate::state::SortOrder;
use crate::utils;

pub const DEFAULT_QURAN_BASE_URL: &str = "https://api.alquran.cloud/v1";

/// Ayat Kursi, offered as a quick-access shortcut.
pub const AYAT_KURSI: (u32, u32) = (2, 255);

const AYAT_KURSI_TRANSLATION: &str = "\"Allah - tidak ada Tuhan selain Dia Yang Hidup kekal lagi terus menerus mengurus (makhluk-Nya); tidak mengantuk dan tidak tidur...\"";

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SurahRecord {
    number: i64,
    name: String,
    english_name: String,
    english_name_translation: String,
    number_of_ayahs: u64,
    revelation_type: String,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AyahRecord {
    number_in_surah: u32,
    text: String,
}

#[derive(Clone, Debug, Deserialize)]
struct SurahWithAyahs {
    #[serde(flatten)]
    surah: SurahRecord,
    #[serde(default)]
    ayahs: Vec<AyahRecord>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AyahWithSurah {
    number_in_surah: u32,
    text: String,
    surah: SurahRecord,
}

impl SurahRecord {
    fn into_item(self) -> ListItem {
        ListItem {
            id: ItemId::Number(self.number),
            title: self.english_name,
            subtitle: self.english_name_translation,
            sort_key: Some(SortKey::Ordinal(self.number)),
            metrics: vec![Metric {
                kind: MetricKind::Verses,
                value: self.number_of_ayahs,
            }],
            thumbnail: None,
            kind: ItemKind::Surah {
                arabic_name: self.name,
                revelation: self.revelation_type,
            },
        }
    }
}

/// Surah list and verse text from the alquran.cloud API.
#[derive(Clone, Debug)]
pub struct QuranSource {
    client: reqwest::Client,
    base_url: String,
}

impl QuranSource {
    pub fn new(client: reqwest::Client) -> Self {
        Self::with_base_url(client, DEFAULT_QURAN_BASE_URL)
    }

    pub fn with_base_url(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    pub async fn fetch_surah(&self, number: i64) -> Result<ItemDetail, FetchError> {
        let url = join_url(&self.base_url, &format!("surah/{number}"))?;
        let body = fetch_json(&self.client, url, api_error).await?;
        parse_surah_detail(body)
    }

    pub async fn fetch_ayah(&self, surah: u32, ayah: u32) -> Result<ItemDetail, FetchError> {
        let url = join_url(&self.base_url, &format!("ayah/{surah}:{ayah}"))?;
        let body = fetch_json(&self.client, url, api_error).await?;
        parse_ayah_detail(body)
    }
}

impl DataSource for QuranSource {
    fn label(&self) -> &str {
        "Al-Quran"
    }

    fn sort_order(&self) -> SortOrder {
        SortOrder::Ascending
    }

    async fn fetch_collection(&self) -> Result<Collection, FetchError> {
        let url = join_url(&self.base_url, "surah")?;
        let body = fetch_json(&self.client, url, api_error).await?;
        let collection = parse_surah_list(body)?;
        tracing::info!(surahs = collection.len(), "loaded surah list");
        Ok(collection)
    }

    /// `Number(n)` opens surah `n`; `Text("s:a")` opens a single ayah.
    async fn fetch_detail(&self, id: &ItemId) -> Result<ItemDetail, FetchError> {
        match id {
            ItemId::Number(n) => self.fetch_surah(*n).await,
            ItemId::Text(raw) => {
                let (surah, ayah) =
                    utils::parse_verse_ref(raw).map_err(|_| FetchError::UnknownItem {
                        id: raw.clone(),
                    })?;
                self.fetch_ayah(surah, ayah).await
            }
        }
    }
}

/// The API wraps every answer in `{code, status, data}`; any code but 200 is an error.
fn api_error(body: &Value) -> Option<String> {
    let code = body.get("code")?.as_i64()?;
    if code == 200 {
        return None;
    }
    let status = body
        .get("status")
        .and_then(Value::as_str)
        .unwrap_or("request failed");
    Some(match body.get("data").and_then(Value::as_str) {
        Some(detail) => format!("{code} {status}: {detail}"),
        None => format!("{code} {status}"),
    })
}

fn envelope_data<T: DeserializeOwned>(mut body: Value, what: &str) -> Result<T, FetchError> {
    let data = match body.get_mut("data") {
        Some(data) if !data.is_null() => data.take(),
        _ => {
            return Err(FetchError::Api {
                message: format!("{what} response carries no data"),
            })
        }
    };
    serde_json::from_value(data).map_err(|e| FetchError::Decode {
        url: what.to_string(),
        source: e,
    })
}

fn parse_surah_list(body: Value) -> Result<Collection, FetchError> {
    let records: Vec<SurahRecord> = envelope_data(body, "surah list")?;
    if records.is_empty() {
        return Err(FetchError::empty("surah list is empty"));
    }
    Ok(Collection::new(
        records.into_iter().map(SurahRecord::into_item).collect(),
    ))
}

fn parse_surah_detail(body: Value) -> Result<ItemDetail, FetchError> {
    let record: SurahWithAyahs = envelope_data(body, "surah")?;
    let heading = format!("{} ({})", record.surah.english_name, record.surah.name);
    let surah_name = record.surah.english_name.clone();
    let sections = record
        .ayahs
        .into_iter()
        .map(|a| DetailSection {
            number: a.number_in_surah,
            caption: format!("Ayat {} dari Surah {}", a.number_in_surah, surah_name),
            text: a.text,
        })
        .collect();
    Ok(ItemDetail {
        item: record.surah.into_item(),
        heading,
        sections,
        link: None,
    })
}

fn parse_ayah_detail(body: Value) -> Result<ItemDetail, FetchError> {
    let record: AyahWithSurah = envelope_data(body, "ayah")?;
    let number = record.number_in_surah;
    let caption = if (record.surah.number, number) == (AYAT_KURSI.0 as i64, AYAT_KURSI.1) {
        AYAT_KURSI_TRANSLATION.to_string()
    } else {
        format!("Ayat {} dari Surah {}", number, record.surah.english_name)
    };
    let heading = format!("{} - Ayat {}", record.surah.english_name, number);
    Ok(ItemDetail {
        item: record.surah.into_item(),
        heading,
        sections: vec![DetailSection {
            number,
            text: record.text,
            caption,
        }],
        link: None,
    })
}
