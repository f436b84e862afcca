//! Folder listings and derived-asset delivery.

mod common;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use common::{body_bytes, body_json, pattern, FakeRunner, TestHarness, BASE_URL, PNG, VTT};
use std::time::Duration;

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn test_list_files() {
    let harness = TestHarness::new();
    harness.media_file("b movie.mp4", &pattern(64));
    harness.media_file("a.mkv", &pattern(64));
    harness.media_file("notes.txt", b"not media");
    let (category, folder) = harness.register_media_dir().await;

    let response = harness.send(get(&format!("/files/{}", folder.id))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let files = body_json(response).await;
    let files = files.as_array().unwrap();
    assert_eq!(files.len(), 2);

    let first = &files[0];
    assert_eq!(first["name"], "a.mkv");
    assert_eq!(first["time_length"], 120.5);
    assert_eq!(first["folder_id"], folder.id.get());
    assert_eq!(first["category_id"], category.id.get());
    assert_eq!(
        first["url"],
        format!("{BASE_URL}/stream/{}/a.mkv", folder.id)
    );
    assert_eq!(
        first["thumbnail_url"],
        format!("{BASE_URL}/thumbnails/{}/a.png", folder.id)
    );
    assert_eq!(
        first["subtitles_url"],
        format!("{BASE_URL}/subtitles/{}/a.vtt", folder.id)
    );

    let second = &files[1];
    assert_eq!(second["name"], "b movie.mp4");
    assert_eq!(
        second["url"],
        format!("{BASE_URL}/stream/{}/b%20movie.mp4", folder.id)
    );
    assert_eq!(
        second["thumbnail_url"],
        format!("{BASE_URL}/thumbnails/{}/b%20movie.png", folder.id)
    );

    assert_eq!(
        std::fs::read(harness.derived_path(format!("thumbnails/{}/a.png", folder.id))).unwrap(),
        PNG
    );
    assert_eq!(
        std::fs::read(harness.derived_path(format!("subtitles/{}/a.vtt", folder.id))).unwrap(),
        VTT
    );
}

#[tokio::test]
async fn test_second_listing_reuses_assets() {
    let harness = TestHarness::new();
    harness.media_file("one.mp4", &pattern(16));
    harness.media_file("two.mp4", &pattern(16));
    let (_, folder) = harness.register_media_dir().await;

    harness.ctx.catalog.list_files(folder.id).await.unwrap();
    assert_eq!(harness.runner.ffmpeg_calls(), 4);

    let files = harness.ctx.catalog.list_files(folder.id).await.unwrap();
    assert_eq!(files.len(), 2);
    assert_eq!(harness.runner.ffmpeg_calls(), 4);
    assert!(files.iter().all(|f| !f.thumbnail_url.is_empty()));
}

#[tokio::test]
async fn test_missing_subtitles_and_broken_files() {
    let harness = TestHarness::new();
    harness.media_file("broken.mp4", &pattern(16));
    harness.media_file("nosubs.mp4", &pattern(16));
    harness.media_file("ok.mp4", &pattern(16));
    let (_, folder) = harness.register_media_dir().await;

    let files = harness.ctx.catalog.list_files(folder.id).await.unwrap();
    assert_eq!(files.len(), 3);

    let broken = &files[0];
    assert_eq!(broken.name, "broken.mp4");
    assert_eq!(broken.duration_seconds, 0.0);
    assert!(broken.thumbnail_url.is_empty());
    assert!(broken.subtitles_url.is_empty());
    assert!(!broken.url.is_empty());

    let nosubs = &files[1];
    assert_eq!(nosubs.duration_seconds, 120.5);
    assert!(!nosubs.thumbnail_url.is_empty());
    assert!(nosubs.subtitles_url.is_empty());

    let ok = &files[2];
    assert!(!ok.thumbnail_url.is_empty());
    assert!(!ok.subtitles_url.is_empty());

    // The missing subtitle stream is remembered; no new extraction attempt.
    let calls = harness.runner.ffmpeg_calls();
    let files = harness.ctx.catalog.list_files(folder.id).await.unwrap();
    assert!(files[1].subtitles_url.is_empty());
    // broken.mp4 retries both assets.
    assert_eq!(harness.runner.ffmpeg_calls(), calls + 2);
}

#[tokio::test]
async fn test_concurrent_listings_generate_once() {
    let harness = TestHarness::with_runner(FakeRunner {
        delay: Duration::from_millis(50),
        ..Default::default()
    });
    harness.media_file("movie.mp4", &pattern(16));
    let (_, folder) = harness.register_media_dir().await;

    let catalog = harness.ctx.catalog.clone();
    let listings = (0..5).map(|_| {
        let catalog = catalog.clone();
        tokio::spawn(async move { catalog.list_files(folder.id).await })
    });

    for listing in futures::future::join_all(listings).await {
        let files = listing.unwrap().unwrap();
        assert_eq!(files.len(), 1);
        assert!(!files[0].thumbnail_url.is_empty());
        assert!(!files[0].subtitles_url.is_empty());
    }

    assert_eq!(harness.runner.ffmpeg_calls(), 2);
}

#[tokio::test]
async fn test_listing_missing_directory() {
    let harness = TestHarness::new();
    let category = harness.ctx.library.create_category("Gone").await.unwrap();
    let gone = tempfile::tempdir().unwrap();
    let folder = harness
        .ctx
        .library
        .create_folder(gone.path(), category.id)
        .await
        .unwrap();
    drop(gone);

    let response = harness.send(get(&format!("/files/{}", folder.id))).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_serves_generated_assets() {
    let harness = TestHarness::new();
    harness.media_file("movie.mp4", &pattern(16));
    let (_, folder) = harness.register_media_dir().await;

    // Nothing generated yet.
    let response = harness
        .send(get(&format!("/thumbnails/{}/movie.png", folder.id)))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    harness.ctx.catalog.list_files(folder.id).await.unwrap();

    let response = harness
        .send(get(&format!("/thumbnails/{}/movie.png", folder.id)))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");
    assert_eq!(body_bytes(response).await, PNG);

    let response = harness
        .send(get(&format!("/subtitles/{}/movie.vtt", folder.id)))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "text/vtt; charset=utf-8"
    );
    assert_eq!(body_bytes(response).await, VTT);

    let response = harness
        .send(get(&format!("/subtitles/{}/..%2F..%2Fsecret.vtt", folder.id)))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = harness.send(get("/thumbnails/nope/movie.png")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_deleted_folder_is_gone() {
    let harness = TestHarness::new();
    harness.media_file("movie.mp4", &pattern(16));
    let (_, folder) = harness.register_media_dir().await;
    harness.ctx.catalog.list_files(folder.id).await.unwrap();

    let thumbnails = harness.derived_path(format!("thumbnails/{}", folder.id));
    assert!(thumbnails.join("movie.png").is_file());

    harness.ctx.library.delete_folder(folder.id).await.unwrap();

    assert!(!thumbnails.exists());
    assert!(!harness
        .derived_path(format!("subtitles/{}", folder.id))
        .exists());

    let response = harness.send(get(&format!("/files/{}", folder.id))).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = harness
        .send(get(&format!("/stream/{}/movie.mp4", folder.id)))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // The source media is untouched.
    assert!(harness.media_dir.path().join("movie.mp4").is_file());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_delete_during_listing_leaves_no_asset_dirs() {
    let harness = TestHarness::with_runner(FakeRunner {
        delay: Duration::from_millis(300),
        ..Default::default()
    });
    harness.media_file("movie.mp4", &pattern(16));
    let (_, folder) = harness.register_media_dir().await;

    let listing = {
        let catalog = harness.ctx.catalog.clone();
        tokio::spawn(async move { catalog.list_files(folder.id).await })
    };
    tokio::time::sleep(Duration::from_millis(100)).await;
    harness.ctx.library.delete_folder(folder.id).await.unwrap();

    // Whatever the listing reports, it must not publish into a deleted folder.
    if let Ok(files) = listing.await.unwrap() {
        assert!(files.iter().all(|f| f.thumbnail_url.is_empty()));
        assert!(files.iter().all(|f| f.subtitles_url.is_empty()));
    }

    for kind in ["thumbnails", "subtitles"] {
        assert!(
            !harness.derived_path(format!("{kind}/{}", folder.id)).exists(),
            "{kind} directory was recreated"
        );
    }
    assert_eq!(harness.ctx.assets.in_flight(), 0);
}
