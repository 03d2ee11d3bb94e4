//! Video upload pipeline integration tests.
//!
//! Run with: `cargo test -p clipdock-api --test video_upload_test`

mod helpers;

use axum::http::StatusCode;
use helpers::auth::bearer;
use helpers::fakes::{NormalizeScript, ProbeScript, REMUX_MARKER};
use helpers::fixtures::{file_form, mp4_bytes, png_bytes, video_form};
use helpers::{api_path, unix_now, TestApp, BLOB_BASE_URL, TEST_BUCKET};
use serde_json::Value;
use std::path::Path;
use std::sync::atomic::Ordering;
use std::time::Duration;
use uuid::Uuid;

fn upload_path(id: impl std::fmt::Display) -> String {
    api_path(&format!("/videos/{}/upload", id))
}

/// Count regular files below `dir`, recursively.
fn count_blobs(dir: &Path) -> usize {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return 0;
    };
    entries
        .flatten()
        .map(|entry| {
            let path = entry.path();
            if path.is_dir() {
                count_blobs(&path)
            } else {
                1
            }
        })
        .sum()
}

/// Asserts shared by every failed upload: nothing staged, no blob, record untouched.
fn assert_no_side_effects(app: &TestApp, video_id: Uuid) {
    assert_eq!(app.staging_file_count(), 0, "staging directory not cleaned up");
    assert_eq!(count_blobs(&app.blobs_dir), 0, "unexpected blob stored");
    let video = app.videos.snapshot(video_id).unwrap();
    assert!(video.video_location.is_none(), "record was modified");
}

#[tokio::test]
async fn test_upload_requires_token() {
    let app = TestApp::new().await;
    let video = app.seed_video(Uuid::new_v4());

    let response = app
        .client()
        .post(&upload_path(video.id))
        .multipart(video_form(mp4_bytes(2048)))
        .await;

    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    let body: Value = response.json();
    assert_eq!(body["code"], "UNAUTHORIZED");
    assert_no_side_effects(&app, video.id);
}

#[tokio::test]
async fn test_upload_rejects_malformed_id() {
    let app = TestApp::new().await;
    let user = Uuid::new_v4();

    let response = app
        .client()
        .post(&upload_path("not-a-uuid"))
        .add_header("Authorization", bearer(user))
        .multipart(video_form(mp4_bytes(2048)))
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["code"], "INVALID_INPUT");
    assert_eq!(app.staging_file_count(), 0);
}

#[tokio::test]
async fn test_upload_too_large() {
    let app = TestApp::builder().max_video_size_bytes(1024).build().await;
    let user = Uuid::new_v4();
    let video = app.seed_video(user);

    let response = app
        .client()
        .post(&upload_path(video.id))
        .add_header("Authorization", bearer(user))
        .multipart(video_form(mp4_bytes(4096)))
        .await;

    assert_eq!(response.status_code(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(app.inspector.calls.load(Ordering::SeqCst), 0);
    assert_no_side_effects(&app, video.id);
}

#[tokio::test]
async fn test_upload_rejects_wrong_declared_type() {
    let app = TestApp::new().await;
    let user = Uuid::new_v4();
    let video = app.seed_video(user);

    let response = app
        .client()
        .post(&upload_path(video.id))
        .add_header("Authorization", bearer(user))
        .multipart(file_form("video", mp4_bytes(2048), "clip.mov", "video/quicktime"))
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(app.inspector.calls.load(Ordering::SeqCst), 0);
    assert_no_side_effects(&app, video.id);
}

#[tokio::test]
async fn test_upload_accepts_declared_type_parameters() {
    let app = TestApp::new().await;
    let user = Uuid::new_v4();
    let video = app.seed_video(user);

    let response = app
        .client()
        .post(&upload_path(video.id))
        .add_header("Authorization", bearer(user))
        .multipart(file_form(
            "video",
            mp4_bytes(2048),
            "clip.mp4",
            "Video/MP4; codecs=avc1",
        ))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
}

#[tokio::test]
async fn test_sniff_mismatch_rejected_before_staging() {
    let app = TestApp::new().await;
    let user = Uuid::new_v4();
    let video = app.seed_video(user);

    // Declared as MP4, actually a PNG.
    let response = app
        .client()
        .post(&upload_path(video.id))
        .add_header("Authorization", bearer(user))
        .multipart(file_form("video", png_bytes(), "clip.mp4", "video/mp4"))
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(app.inspector.calls.load(Ordering::SeqCst), 0);
    assert_eq!(app.normalizer.calls.load(Ordering::SeqCst), 0);
    assert_no_side_effects(&app, video.id);
}

#[tokio::test]
async fn test_upload_missing_video_field() {
    let app = TestApp::new().await;
    let user = Uuid::new_v4();
    let video = app.seed_video(user);

    let response = app
        .client()
        .post(&upload_path(video.id))
        .add_header("Authorization", bearer(user))
        .multipart(file_form("file", mp4_bytes(2048), "clip.mp4", "video/mp4"))
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert!(body["error"].as_str().unwrap().contains("video"));
    assert_no_side_effects(&app, video.id);
}

#[tokio::test]
async fn test_upload_unknown_video() {
    let app = TestApp::new().await;
    let user = Uuid::new_v4();

    let response = app
        .client()
        .post(&upload_path(Uuid::new_v4()))
        .add_header("Authorization", bearer(user))
        .multipart(video_form(mp4_bytes(2048)))
        .await;

    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    assert_eq!(app.staging_file_count(), 0);
    assert_eq!(app.inspector.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_upload_by_non_owner_is_forbidden() {
    let app = TestApp::new().await;
    let owner = Uuid::new_v4();
    let intruder = Uuid::new_v4();
    let video = app.seed_video(owner);

    let response = app
        .client()
        .post(&upload_path(video.id))
        .add_header("Authorization", bearer(intruder))
        .multipart(video_form(mp4_bytes(2048)))
        .await;

    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
    let body: Value = response.json();
    assert_eq!(body["code"], "FORBIDDEN");
    assert_eq!(app.videos.update_calls.load(Ordering::SeqCst), 0);
    assert_eq!(app.inspector.calls.load(Ordering::SeqCst), 0);
    assert_no_side_effects(&app, video.id);
}

#[tokio::test]
async fn test_inspection_failure() {
    let app = TestApp::builder().probe(ProbeScript::Fail).build().await;
    let user = Uuid::new_v4();
    let video = app.seed_video(user);

    let response = app
        .client()
        .post(&upload_path(video.id))
        .add_header("Authorization", bearer(user))
        .multipart(video_form(mp4_bytes(2048)))
        .await;

    assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json();
    assert_eq!(body["code"], "MEDIA_PROCESSING_ERROR");
    assert_eq!(app.inspector.calls.load(Ordering::SeqCst), 1);
    assert_eq!(app.normalizer.calls.load(Ordering::SeqCst), 0);
    assert_no_side_effects(&app, video.id);
}

#[tokio::test]
async fn test_probe_without_streams_fails() {
    let app = TestApp::builder().probe(ProbeScript::NoStreams).build().await;
    let user = Uuid::new_v4();
    let video = app.seed_video(user);

    let response = app
        .client()
        .post(&upload_path(video.id))
        .add_header("Authorization", bearer(user))
        .multipart(video_form(mp4_bytes(2048)))
        .await;

    assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(app.normalizer.calls.load(Ordering::SeqCst), 0);
    assert_no_side_effects(&app, video.id);
}

#[tokio::test]
async fn test_normalization_failure() {
    let app = TestApp::builder()
        .normalize(NormalizeScript::Fail)
        .build()
        .await;
    let user = Uuid::new_v4();
    let video = app.seed_video(user);

    let response = app
        .client()
        .post(&upload_path(video.id))
        .add_header("Authorization", bearer(user))
        .multipart(video_form(mp4_bytes(2048)))
        .await;

    assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json();
    assert_eq!(body["code"], "MEDIA_PROCESSING_ERROR");
    assert_no_side_effects(&app, video.id);
}

#[tokio::test]
async fn test_normalizer_empty_output_fails() {
    let app = TestApp::builder()
        .normalize(NormalizeScript::EmptyOutput)
        .build()
        .await;
    let user = Uuid::new_v4();
    let video = app.seed_video(user);

    let response = app
        .client()
        .post(&upload_path(video.id))
        .add_header("Authorization", bearer(user))
        .multipart(video_form(mp4_bytes(2048)))
        .await;

    assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_no_side_effects(&app, video.id);
}

#[tokio::test]
async fn test_blob_upload_failure() {
    let app = TestApp::builder().failing_blobs(None).build().await;
    let user = Uuid::new_v4();
    let video = app.seed_video(user);

    let response = app
        .client()
        .post(&upload_path(video.id))
        .add_header("Authorization", bearer(user))
        .multipart(video_form(mp4_bytes(2048)))
        .await;

    assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json();
    assert_eq!(body["code"], "STORAGE_ERROR");
    let failing = app.failing.as_ref().unwrap();
    assert_eq!(failing.calls.load(Ordering::SeqCst), 1);
    assert_eq!(app.videos.update_calls.load(Ordering::SeqCst), 0);
    assert_no_side_effects(&app, video.id);
}

#[tokio::test]
async fn test_blob_upload_deadline() {
    let app = TestApp::builder()
        .failing_blobs(Some(Duration::from_secs(10)))
        .upload_timeout_secs(1)
        .build()
        .await;
    let user = Uuid::new_v4();
    let video = app.seed_video(user);

    let response = app
        .client()
        .post(&upload_path(video.id))
        .add_header("Authorization", bearer(user))
        .multipart(video_form(mp4_bytes(2048)))
        .await;

    assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json();
    assert_eq!(body["code"], "STORAGE_ERROR");
    assert_no_side_effects(&app, video.id);
}

#[tokio::test]
async fn test_persistence_failure_leaves_blob() {
    let app = TestApp::new().await;
    let user = Uuid::new_v4();
    let video = app.seed_video(user);
    app.videos.fail_updates(true);

    let response = app
        .client()
        .post(&upload_path(video.id))
        .add_header("Authorization", bearer(user))
        .multipart(video_form(mp4_bytes(2048)))
        .await;

    assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(app.staging_file_count(), 0);
    // No compensating delete.
    assert_eq!(count_blobs(&app.blobs_dir), 1);
    let stored = app.videos.snapshot(video.id).unwrap();
    assert!(stored.video_location.is_none());
}

#[tokio::test]
async fn test_upload_end_to_end() {
    let app = TestApp::new().await;
    let user = Uuid::new_v4();
    let video = app.seed_video(user);
    let data = mp4_bytes(8192);

    let response = app
        .client()
        .post(&upload_path(video.id))
        .add_header("Authorization", bearer(user))
        .multipart(video_form(data.clone()))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["videoID"], video.id.to_string());
    assert_eq!(app.staging_file_count(), 0);

    let stored = app.videos.snapshot(video.id).unwrap();
    let location = stored.video_location.expect("location recorded");
    assert_eq!(location.bucket, TEST_BUCKET);
    let random = location
        .key
        .strip_prefix("landscape/")
        .and_then(|k| k.strip_suffix(".mp4"))
        .expect("landscape key");
    assert_eq!(random.len(), 32);
    assert!(random.chars().all(|c| c.is_ascii_hexdigit()));

    // The stored blob is the remuxed file, not the raw upload.
    let blob = std::fs::read(app.blobs_dir.join(&location.bucket).join(&location.key)).unwrap();
    let mut expected = data;
    expected.extend_from_slice(REMUX_MARKER);
    assert_eq!(blob, expected);

    let response = app
        .client()
        .get(&api_path(&format!("/videos/{}", video.id)))
        .add_header("Authorization", bearer(user))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    let url = body["video_url"].as_str().expect("signed url").to_string();
    assert!(url.contains(&location.key));

    let now = unix_now();
    let verified = app.local.verify_url(&url, now).expect("valid before expiry");
    assert_eq!(verified, location);
    assert!(app.local.verify_url(&url, now + 3601).is_err());
}

#[tokio::test]
async fn test_orientation_prefixes() {
    for (width, height, prefix) in [
        (720, 1280, "portrait/"),
        (1920, 1080, "landscape/"),
        (640, 640, "other/"),
    ] {
        let app = TestApp::builder()
            .probe(ProbeScript::Dimensions(width, height))
            .build()
            .await;
        let user = Uuid::new_v4();
        let video = app.seed_video(user);

        let response = app
            .client()
            .post(&upload_path(video.id))
            .add_header("Authorization", bearer(user))
            .multipart(video_form(mp4_bytes(2048)))
            .await;
        assert_eq!(response.status_code(), StatusCode::OK);

        let key = app
            .videos
            .snapshot(video.id)
            .unwrap()
            .video_location
            .unwrap()
            .key;
        assert!(key.starts_with(prefix), "{}x{} gave {}", width, height, key);
    }
}

#[tokio::test]
async fn test_signed_blob_is_served() {
    let app = TestApp::new().await;
    let user = Uuid::new_v4();
    let video = app.seed_video(user);

    app.client()
        .post(&upload_path(video.id))
        .add_header("Authorization", bearer(user))
        .multipart(video_form(mp4_bytes(2048)))
        .await
        .assert_status_ok();

    let body: Value = app
        .client()
        .get(&api_path(&format!("/videos/{}", video.id)))
        .add_header("Authorization", bearer(user))
        .await
        .json();
    let url = body["video_url"].as_str().unwrap().to_string();

    let base = BLOB_BASE_URL.trim_end_matches("/blobs");
    let (path, query) = url
        .strip_prefix(base)
        .and_then(|rest| rest.split_once('?'))
        .expect("local blob url");
    let params: Vec<(&str, &str)> = query.split('&').filter_map(|p| p.split_once('=')).collect();
    let param = |name: &str| {
        params
            .iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v.to_string())
            .unwrap()
    };

    let response = app
        .client()
        .get(path)
        .add_query_param("expires", param("expires"))
        .add_query_param("signature", param("signature"))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert!(response.as_bytes().starts_with(&mp4_bytes(28)));

    let response = app
        .client()
        .get(path)
        .add_query_param("expires", param("expires"))
        .add_query_param("signature", "00".repeat(32))
        .await;
    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);

    let response = app.client().get(path).await;
    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
}
