
use std::time::Duration;

use serde_json::{json, Value};
use tokio::sync::mpsc;

use crate::controller::{ControllerOptions, PageController, PageEvent};
use crate::model::{ItemId, ItemKind, MetricKind};
use crate::output::{DisplaySurface, SurfaceError};
use crate::render::DisplayTree;
use crate::runner::{Options, Runner, SourceKind};
use crate::source::{DataSource, FetchErrorKind, QuranSource, VideoSource};
use stub_server::{Route, StubServer};

fn surah(number: i64, name: &str, translation: &str, ayahs: u64) -> Value {
    json!({
        "number": number,
        "name": "سورة",
        "englishName": name,
        "englishNameTranslation": translation,
        "numberOfAyahs": ayahs,
        "revelationType": if number == 2 { "Medinan" } else { "Meccan" },
    })
}

fn surah_list() -> Value {
    json!({
        "code": 200,
        "status": "OK",
        "data": [
            surah(1, "Al-Faatiha", "The Opening", 7),
            surah(2, "Al-Baqara", "The Cow", 286),
            surah(36, "Yaseen", "Yaseen", 83),
        ],
    })
}

fn quran_routes() -> Vec<Route> {
    let mut baqara = surah(2, "Al-Baqara", "The Cow", 286);
    baqara["ayahs"] = json!([
        {"numberInSurah": 1, "text": "الم"},
        {"numberInSurah": 2, "text": "ذَٰلِكَ الْكِتَابُ"},
        {"numberInSurah": 3, "text": "الَّذِينَ يُؤْمِنُونَ"},
    ]);
    vec![
        Route::json("/v1/surah", surah_list()),
        Route::json("/v1/surah/2", json!({"code": 200, "status": "OK", "data": baqara})),
        Route::json(
            "/v1/ayah/2:255",
            json!({
                "code": 200,
                "status": "OK",
                "data": {
                    "numberInSurah": 255,
                    "text": "اللَّهُ لَا إِلَٰهَ إِلَّا هُوَ",
                    "surah": surah(2, "Al-Baqara", "The Cow", 286),
                },
            }),
        ),
        Route::raw(
            "/v1/surah/999",
            404,
            json!({"code": 404, "status": "NOT FOUND", "data": "Surah not found"}).to_string(),
        ),
    ]
}

fn hit(id: &str, title: &str) -> Value {
    json!({
        "id": {"kind": "youtube#video", "videoId": id},
        "snippet": {
            "title": title,
            "channelTitle": "Majelis",
            "description": "",
            "publishedAt": "2024-03-01T08:00:00Z",
            "thumbnails": {"medium": {"url": format!("https://i.ytimg.com/vi/{id}/mq.jpg")}},
        },
    })
}

fn relevant_search() -> Value {
    json!({"items": [
        hit("v1", "Kajian Ustadz Mbois: Sabar"),
        hit("v2", "Ngaji bareng ustadz"),
        hit("v3", "Mbois tenan"),
        hit("v4", "Resep rendang"),
    ]})
}

fn video_source(server: &StubServer) -> VideoSource {
    VideoSource::new(reqwest::Client::new(), "SECRETKEY").with_base_url(server.url("/yt"))
}

#[tokio::test]
async fn quran_list_and_detail_over_http() {
    let server = StubServer::start(quran_routes()).await;
    let source = QuranSource::with_base_url(reqwest::Client::new(), server.url("/v1"));

    let collection = source.fetch_collection().await.unwrap();
    assert_eq!(collection.len(), 3);
    assert_eq!(collection.items()[1].title, "Al-Baqara");
    assert_eq!(collection.items()[1].metric(MetricKind::Verses), Some(286));

    let detail = source.fetch_detail(&ItemId::Number(2)).await.unwrap();
    assert_eq!(detail.sections.len(), 3);
    assert_eq!(detail.sections[2].caption, "Ayat 3 dari Surah Al-Baqara");
}

#[tokio::test]
async fn quran_ayah_reference_opens_single_verse() {
    let server = StubServer::start(quran_routes()).await;
    let source = QuranSource::with_base_url(reqwest::Client::new(), server.url("/v1"));

    let detail = source
        .fetch_detail(&ItemId::Text("2:255".to_string()))
        .await
        .unwrap();
    assert_eq!(detail.sections.len(), 1);
    assert_eq!(detail.sections[0].number, 255);
    assert!(server.hits().iter().any(|h| h == "/v1/ayah/2:255"));
}

#[tokio::test]
async fn quran_error_envelope_is_api_error() {
    let server = StubServer::start(quran_routes()).await;
    let source = QuranSource::with_base_url(reqwest::Client::new(), server.url("/v1"));

    let err = source.fetch_detail(&ItemId::Number(999)).await.unwrap_err();
    assert_eq!(err.kind(), FetchErrorKind::Api);
    assert!(err.to_string().contains("404"));
}

#[tokio::test]
async fn partial_enrichment_keeps_every_relevant_video() {
    let server = StubServer::start(vec![
        Route::json("/yt/search", relevant_search()),
        Route::json(
            "/yt/videos",
            json!({"items": [{
                "id": "v2",
                "contentDetails": {"duration": "PT1H2M3S"},
                "statistics": {"viewCount": "1500"},
            }]}),
        ),
    ])
    .await;

    let collection = video_source(&server).fetch_collection().await.unwrap();
    let ids: Vec<String> = collection.items().iter().map(|i| i.id.to_string()).collect();
    assert_eq!(ids, vec!["v1", "v2", "v3"]);

    for item in collection.items() {
        let ItemKind::Video { duration, .. } = &item.kind else {
            panic!("expected a video item");
        };
        if item.id.to_string() == "v2" {
            assert_eq!(duration.as_deref(), Some("1:02:03"));
            assert_eq!(item.metric(MetricKind::Views), Some(1500));
        } else {
            assert_eq!(duration, &None);
            assert_eq!(item.metric(MetricKind::Views), Some(0));
        }
    }

    let hits = server.hits();
    assert_eq!(hits.iter().filter(|h| h.starts_with("/yt/videos")).count(), 1);
    assert!(hits[0].contains("maxResults=50"));
}

#[tokio::test]
async fn search_hit_without_snippet_is_skipped() {
    let mut search = relevant_search();
    search["items"]
        .as_array_mut()
        .unwrap()
        .push(json!({"id": {"kind": "youtube#video", "videoId": "bare"}}));
    search["items"]
        .as_array_mut()
        .unwrap()
        .push(json!({"snippet": {"title": "Kajian tanpa id"}}));
    let server = StubServer::start(vec![
        Route::json("/yt/search", search),
        Route::json("/yt/videos", json!({"items": []})),
    ])
    .await;

    let collection = video_source(&server).fetch_collection().await.unwrap();
    let ids: Vec<String> = collection.items().iter().map(|i| i.id.to_string()).collect();
    assert_eq!(ids, vec!["v1", "v2", "v3"]);
}

#[tokio::test]
async fn failed_enrichment_degrades_to_defaults() {
    let server = StubServer::start(vec![
        Route::json("/yt/search", relevant_search()),
        Route::raw("/yt/videos", 500, "upstream exploded"),
    ])
    .await;

    let collection = video_source(&server).fetch_collection().await.unwrap();
    assert_eq!(collection.len(), 3);
    assert!(collection
        .items()
        .iter()
        .all(|i| i.metric(MetricKind::Views) == Some(0)));
}

#[tokio::test]
async fn no_relevant_videos_is_empty_result() {
    let server = StubServer::start(vec![Route::json(
        "/yt/search",
        json!({"items": [hit("x1", "Resep rendang"), hit("x2", "Tutorial gitar")]}),
    )])
    .await;

    let err = video_source(&server).fetch_collection().await.unwrap_err();
    assert_eq!(err.kind(), FetchErrorKind::EmptyResult);
    assert!(!server.hits().iter().any(|h| h.starts_with("/yt/videos")));
}

#[tokio::test]
async fn server_error_is_network_error() {
    let server = StubServer::start(vec![Route::raw("/yt/search", 500, "oops")]).await;

    let err = video_source(&server).fetch_collection().await.unwrap_err();
    assert_eq!(err.kind(), FetchErrorKind::Network);
    assert!(!err.to_string().contains("SECRETKEY"));
}

#[tokio::test]
async fn error_payload_wins_over_status() {
    let server = StubServer::start(vec![Route::raw(
        "/yt/search",
        403,
        json!({"error": {"code": 403, "message": "quotaExceeded"}}).to_string(),
    )])
    .await;

    let err = video_source(&server).fetch_collection().await.unwrap_err();
    assert_eq!(err.kind(), FetchErrorKind::Api);
    assert!(err.to_string().contains("quotaExceeded"));
    assert!(!err.to_string().contains("SECRETKEY"));
}

#[tokio::test]
async fn unreachable_host_is_network_error() {
    let source = QuranSource::with_base_url(reqwest::Client::new(), "http://127.0.0.1:1/v1");
    let err = source.fetch_collection().await.unwrap_err();
    assert_eq!(err.kind(), FetchErrorKind::Network);
}

#[tokio::test]
async fn controller_pages_real_source() {
    let server = StubServer::start(quran_routes()).await;
    let source = QuranSource::with_base_url(reqwest::Client::new(), server.url("/v1"));
    let mut controller = PageController::new(
        source,
        ControllerOptions {
            page_size: 2,
            ..Default::default()
        },
    );

    assert!(controller.refresh());
    controller.settle().await.unwrap();
    assert_eq!(controller.list().page_count(), 2);

    controller.dispatch(PageEvent::PageSelected(2));
    let text = controller.render().to_text();
    assert!(text.contains("Yaseen"));
    assert!(!text.contains("Al-Faatiha"));

    controller.dispatch(PageEvent::ItemSelected(ItemId::Number(2)));
    controller.settle().await.unwrap();
    assert_eq!(controller.detail().map(|d| d.sections.len()), Some(3));
}

fn quran_options(server: &StubServer) -> Options {
    Options {
        source: SourceKind::Quran,
        quran_base_url: server.url("/v1"),
        initial_delay: Duration::ZERO,
        ..Default::default()
    }
}

#[tokio::test]
async fn runner_applies_search_once() {
    let server = StubServer::start(quran_routes()).await;
    let runner = Runner::new(Options {
        search: Some("cow".to_string()),
        ..quran_options(&server)
    })
    .unwrap();

    let result = runner.run().await.unwrap();
    assert_eq!(result.total, 3);
    assert_eq!(result.matched, 1);
    assert_eq!(result.data["items"][0]["title"], "Al-Baqara");
    assert!(result.tree.to_text().contains("1 hasil untuk"));
}

#[tokio::test]
async fn runner_opens_ayah_detail() {
    let server = StubServer::start(quran_routes()).await;
    let runner = Runner::new(Options {
        ayah: Some((2, 255)),
        ..quran_options(&server)
    })
    .unwrap();

    let result = runner.run().await.unwrap();
    let detail = result.detail.unwrap();
    assert_eq!(detail.sections[0].number, 255);
    assert_eq!(result.data["sections"][0]["number"], 255);
    assert!(result.tree.to_text().contains("Kembali"));
}

#[tokio::test]
async fn runner_reports_fetch_failure() {
    let server = StubServer::start(vec![Route::raw("/v1/surah", 500, "down")]).await;
    let runner = Runner::new(quran_options(&server)).unwrap();
    let err = runner.run().await.unwrap_err();
    assert!(err.to_string().contains("HTTP 500"));
}

/// Records frames and quits once the list shows up.
struct QuitWhenLoaded {
    frames: Vec<DisplayTree>,
    events: mpsc::Sender<PageEvent>,
}

impl DisplaySurface for QuitWhenLoaded {
    fn present(&mut self, tree: &DisplayTree) -> Result<(), SurfaceError> {
        if tree.to_text().contains("Yaseen") {
            let _ = self.events.try_send(PageEvent::Quit);
        }
        self.frames.push(tree.clone());
        Ok(())
    }
}

#[tokio::test]
async fn watch_mode_renders_until_quit() {
    let server = StubServer::start(quran_routes()).await;
    let runner = Runner::new(quran_options(&server)).unwrap();
    let (tx, rx) = mpsc::channel(4);
    let mut surface = QuitWhenLoaded {
        frames: Vec::new(),
        events: tx,
    };

    runner.watch(rx, &mut surface).await.unwrap();
    assert!(surface.frames.len() >= 3);
    assert!(surface.frames[0].to_text().contains("Al-Quran"));
    assert!(surface
        .frames
        .last()
        .is_some_and(|f| f.to_text().contains("Yaseen")));
}
