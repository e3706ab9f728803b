//! HTTP-level integration tests for the voice-talent onboarding wizard.

mod common;

use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use axum::Router;
use common::{
    body_json, build_test_app, delete, get, multipart_file, post_empty, post_json, put_bytes,
    put_json, put_multipart, signup_body, token_for, FailingUpdates, IngestReply, TestAppBuilder,
};
use resonant_core::onboarding::Sample;
use resonant_db::repositories::MemoryAccountStore;
use serde_json::{json, Value};
use uuid::Uuid;

const APPLICATIONS: &str = "/api/v1/voice-talent/applications";
const EMAIL: &str = "voice@example.com";

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn register(app: &Router) {
    let mut body = signup_body(EMAIL);
    body["accountType"] = json!("regular");
    let response = post_json(app, "/api/v1/auth/signup", None, body).await;
    assert_eq!(response.status(), StatusCode::CREATED);
}

fn token() -> String {
    token_for("did:privy:voice", Some(EMAIL))
}

async fn open(app: &Router, token: &str) -> String {
    let response = post_empty(app, APPLICATIONS, Some(token)).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["data"]["state"], "collect_sample");
    json["data"]["id"].as_str().unwrap().to_string()
}

fn url(id: &str, action: &str) -> String {
    format!("{APPLICATIONS}/{id}/{action}")
}

async fn upload(app: &Router, token: &str, id: &str, bytes: &[u8]) -> (StatusCode, Value) {
    let body = multipart_file("file", "take1.mp3", "audio/mpeg", bytes);
    let response = put_multipart(app, &url(id, "sample"), Some(token), body).await;
    let status = response.status();
    (status, body_json(response).await)
}

async fn step(app: &Router, token: &str, id: &str, action: &str) -> (StatusCode, Value) {
    let response = post_empty(app, &url(id, action), Some(token)).await;
    let status = response.status();
    (status, body_json(response).await)
}

async fn fill_profile(app: &Router, token: &str, id: &str) {
    let response = put_json(
        app,
        &url(id, "profile"),
        Some(token),
        json!({ "name": "Vera", "email": EMAIL, "bio": "Narrator", "languages": "en, de" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
}

/// Drive a fresh application to the review step.
async fn to_review(app: &Router, token: &str) -> String {
    let id = open(app, token).await;
    let (status, _) = upload(app, token, &id, b"ID3\x04audio").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(step(app, token, &id, "advance").await.0, StatusCode::OK);
    fill_profile(app, token, &id).await;
    let (status, json) = step(app, token, &id, "advance").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["state"], "review");
    id
}

// ---------------------------------------------------------------------------
// Gate and ownership
// ---------------------------------------------------------------------------

#[tokio::test]
async fn applications_require_a_session() {
    let app = build_test_app();
    let response = post_empty(&app.router, APPLICATIONS, None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn another_identity_cannot_see_the_application() {
    let app = build_test_app();
    let id = open(&app.router, &token()).await;
    let intruder = token_for("did:privy:other", Some("other@example.com"));

    let response = get(&app.router, &format!("{APPLICATIONS}/{id}"), Some(&intruder)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = delete(&app.router, &format!("{APPLICATIONS}/{id}"), Some(&intruder)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(app.onboarding.len().await, 1);
}

#[tokio::test]
async fn open_applications_are_capped_per_identity() {
    let app = TestAppBuilder::new().max_open_applications(1).build();
    let token = token();
    let first = open(&app.router, &token).await;

    let response = post_empty(&app.router, APPLICATIONS, Some(&token)).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["code"], "CONFLICT");

    open(&app.router, &token_for("did:privy:other", None)).await;

    let response = delete(&app.router, &format!("{APPLICATIONS}/{first}"), Some(&token)).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    open(&app.router, &token).await;
}

#[tokio::test]
async fn exit_discards_the_application() {
    let app = build_test_app();
    let token = token();
    let id = open(&app.router, &token).await;

    let response = delete(&app.router, &format!("{APPLICATIONS}/{id}"), Some(&token)).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = get(&app.router, &format!("{APPLICATIONS}/{id}"), Some(&token)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Step 1
// ---------------------------------------------------------------------------

#[tokio::test]
async fn advancing_without_a_sample_stays_on_step_one() {
    let app = build_test_app();
    let token = token();
    let id = open(&app.router, &token).await;

    let (status, json) = step(&app.router, &token, &id, "advance").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "VALIDATION_ERROR");

    let json = body_json(get(&app.router, &format!("{APPLICATIONS}/{id}"), Some(&token)).await).await;
    assert_eq!(json["data"]["state"], "collect_sample");
    assert_eq!(json["data"]["progress"]["step"], 1);
    assert_eq!(json["data"]["progress"]["percent"], 33);
}

#[tokio::test]
async fn upload_then_advance_reaches_profile_step() {
    let app = build_test_app();
    let token = token();
    let id = open(&app.router, &token).await;

    let (status, json) = upload(&app.router, &token, &id, b"ID3\x04audio").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["sample"]["source"], "upload");
    assert_eq!(json["data"]["sample"]["file_name"], "take1.mp3");
    assert_eq!(json["data"]["sample"]["size_bytes"], 9);

    let (status, json) = step(&app.router, &token, &id, "advance").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["state"], "collect_profile");
    assert_eq!(json["data"]["step_label"], "Complete Your Profile");
}

#[tokio::test]
async fn recording_then_advance_reaches_profile_step() {
    let app = build_test_app();
    let token = token();
    let id = open(&app.router, &token).await;

    let (status, json) = step(&app.router, &token, &id, "recording/start").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["recording"], true);

    let response = put_bytes(
        &app.router,
        &url(&id, "recording"),
        Some(&token),
        b"RIFFwav".to_vec(),
        "audio/wav",
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["recording"], false);
    assert_eq!(json["data"]["sample"]["source"], "recording");
    assert_eq!(json["data"]["sample"]["content_type"], "audio/wav");

    assert_eq!(step(&app.router, &token, &id, "advance").await.0, StatusCode::OK);
}

#[tokio::test]
async fn non_audio_upload_is_rejected() {
    let app = build_test_app();
    let token = token();
    let id = open(&app.router, &token).await;

    let body = multipart_file("file", "notes.txt", "text/plain", b"hello");
    let response = put_multipart(&app.router, &url(&id, "sample"), Some(&token), body).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn oversized_upload_is_rejected() {
    // Test config caps samples at 1 KiB.
    let app = build_test_app();
    let token = token();
    let id = open(&app.router, &token).await;

    let (status, _) = upload(&app.router, &token, &id, &vec![0u8; 2048]).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn upload_without_file_field_is_rejected() {
    let app = build_test_app();
    let token = token();
    let id = open(&app.router, &token).await;

    let body = multipart_file("attachment", "take1.mp3", "audio/mpeg", b"ID3");
    let response = put_multipart(&app.router, &url(&id, "sample"), Some(&token), body).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "BAD_REQUEST");
}

// ---------------------------------------------------------------------------
// Steps 2 and 3
// ---------------------------------------------------------------------------

#[tokio::test]
async fn profile_requires_name_and_email() {
    let app = build_test_app();
    let token = token();
    let id = open(&app.router, &token).await;
    upload(&app.router, &token, &id, b"ID3").await;
    step(&app.router, &token, &id, "advance").await;

    let response = put_json(&app.router, &url(&id, "profile"), Some(&token), json!({ "name": "Vera" })).await;
    assert_eq!(response.status(), StatusCode::OK);

    let (status, json) = step(&app.router, &token, &id, "advance").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Profile field 'email' is required");
}

#[tokio::test]
async fn going_back_keeps_sample_and_profile() {
    let app = build_test_app();
    let token = token();
    let id = to_review(&app.router, &token).await;

    let (_, json) = step(&app.router, &token, &id, "back").await;
    assert_eq!(json["data"]["state"], "collect_profile");
    let (_, json) = step(&app.router, &token, &id, "back").await;
    assert_eq!(json["data"]["state"], "collect_sample");
    assert_eq!(json["data"]["sample"]["file_name"], "take1.mp3");
    assert_eq!(json["data"]["profile"]["name"], "Vera");

    let (status, _) = step(&app.router, &token, &id, "back").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn submit_before_review_is_rejected() {
    let app = build_test_app();
    let token = token();
    let id = open(&app.router, &token).await;

    let (status, _) = step(&app.router, &token, &id, "submit").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(app.ingestor.calls().await, 0);
}

// ---------------------------------------------------------------------------
// Submission
// ---------------------------------------------------------------------------

#[tokio::test]
async fn successful_submission_attaches_sample_to_account() {
    let app = build_test_app();
    register(&app.router).await;
    let token = token();
    let id = to_review(&app.router, &token).await;

    let (status, json) = step(&app.router, &token, &id, "submit").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["state"], "done");
    assert_eq!(json["data"]["step_label"], "Application Submitted");
    assert!(json["data"]["progress"].is_null());
    assert_eq!(
        json["data"]["outcome"]["ingestion_payload"]["newlyCreated"]["blobObject"]["blobId"],
        "blob-123"
    );
    assert!(json["data"]["outcome"]["ingestion_error"].is_null());
    assert!(json["data"]["outcome"]["persistence_warning"].is_null());

    let submitted = app.ingestor.submitted.lock().await;
    assert_eq!(submitted.len(), 1);
    assert_eq!(submitted[0].bytes(), b"ID3\x04audio");
    assert_eq!(submitted[0].content_type(), "audio/mpeg");
    drop(submitted);

    let row = &app.accounts.all().await[0];
    assert_eq!(row.voice_sample_id.as_deref(), Some("blob-123"));
    assert_eq!(row.account_type, "voice_talent");
}

#[tokio::test]
async fn submitted_application_releases_audio_but_keeps_summary() {
    let app = build_test_app();
    let token = token();
    let id = to_review(&app.router, &token).await;

    let (status, json) = step(&app.router, &token, &id, "submit").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["sample"]["file_name"], "take1.mp3");
    assert_eq!(json["data"]["sample"]["size_bytes"], 9);

    let application = app
        .onboarding
        .get(id.parse::<Uuid>().unwrap(), "did:privy:voice")
        .await
        .unwrap();
    assert!(application.lock().await.wizard.sample().is_none());
}

#[tokio::test]
async fn submission_finishes_after_the_request_times_out() {
    let app = TestAppBuilder::new()
        .request_timeout_secs(1)
        .ingest_delay(Duration::from_millis(1500))
        .build();
    register(&app.router).await;
    let token = token();
    let id = to_review(&app.router, &token).await;

    let response = post_empty(&app.router, &url(&id, "submit"), Some(&token)).await;
    assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);

    tokio::time::sleep(Duration::from_millis(1500)).await;

    let response = get(&app.router, &format!("{APPLICATIONS}/{id}"), Some(&token)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["state"], "done");
    assert!(json["data"]["outcome"]["ingestion_error"].is_null());

    let (status, json) = step(&app.router, &token, &id, "back").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "The application has already been submitted");

    let row = &app.accounts.all().await[0];
    assert_eq!(row.voice_sample_id.as_deref(), Some("blob-123"));
    assert_eq!(app.ingestor.calls().await, 1);
}

#[tokio::test]
async fn recorded_sample_is_submitted_as_recording() {
    let app = build_test_app();
    let token = token();
    let id = open(&app.router, &token).await;
    step(&app.router, &token, &id, "recording/start").await;
    put_bytes(&app.router, &url(&id, "recording"), Some(&token), b"RIFF".to_vec(), "audio/wav").await;
    step(&app.router, &token, &id, "advance").await;
    fill_profile(&app.router, &token, &id).await;
    step(&app.router, &token, &id, "advance").await;

    let (status, _) = step(&app.router, &token, &id, "submit").await;
    assert_eq!(status, StatusCode::OK);

    let submitted = app.ingestor.submitted.lock().await;
    assert!(matches!(&submitted[0], Sample::Recorded { bytes } if bytes == b"RIFF"));
}

#[tokio::test]
async fn failed_ingestion_reaches_done_without_account_update() {
    let app = TestAppBuilder::new()
        .ingest_reply(IngestReply::Rejected)
        .build();
    register(&app.router).await;
    let token = token();
    let id = to_review(&app.router, &token).await;

    let (status, json) = step(&app.router, &token, &id, "submit").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["state"], "done");
    let error = json["data"]["outcome"]["ingestion_error"].as_str().unwrap();
    assert!(error.contains("500"), "error should carry the status: {error}");
    assert!(json["data"]["outcome"]["ingestion_payload"].is_null());

    let row = &app.accounts.all().await[0];
    assert!(row.voice_sample_id.is_none());
    assert_eq!(row.account_type, "regular");
    assert_eq!(row.created_at, row.updated_at, "no update may be attempted");
}

#[tokio::test]
async fn failed_update_shows_payload_and_warning() {
    let memory = Arc::new(MemoryAccountStore::new());
    let app = TestAppBuilder::new()
        .store(Arc::new(FailingUpdates(memory.clone())))
        .build();
    register(&app.router).await;
    let token = token();
    let id = to_review(&app.router, &token).await;

    let (status, json) = step(&app.router, &token, &id, "submit").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["state"], "done");
    let outcome = &json["data"]["outcome"];
    assert!(outcome["ingestion_error"].is_null());
    assert!(outcome["ingestion_payload"].is_object());
    assert!(outcome["persistence_warning"].is_string());

    assert!(memory.all().await[0].voice_sample_id.is_none());
}

#[tokio::test]
async fn identity_without_account_gets_a_warning() {
    let app = build_test_app();
    let token = token();
    let id = to_review(&app.router, &token).await;

    let (_, json) = step(&app.router, &token, &id, "submit").await;
    assert_eq!(
        json["data"]["outcome"]["persistence_warning"],
        "No account is linked to this identity"
    );
}

#[tokio::test]
async fn missing_content_id_skips_the_update() {
    let app = TestAppBuilder::new()
        .ingest_reply(IngestReply::StoredWithoutId)
        .build();
    register(&app.router).await;
    let token = token();
    let id = to_review(&app.router, &token).await;

    let (_, json) = step(&app.router, &token, &id, "submit").await;
    assert_eq!(json["data"]["outcome"]["ingestion_payload"]["status"], "queued");
    assert!(json["data"]["outcome"]["persistence_warning"].is_null());
    assert!(app.accounts.all().await[0].voice_sample_id.is_none());
}

#[tokio::test]
async fn done_is_terminal() {
    let app = build_test_app();
    let token = token();
    let id = to_review(&app.router, &token).await;
    step(&app.router, &token, &id, "submit").await;

    for action in ["advance", "back", "submit", "recording/start"] {
        let (status, json) = step(&app.router, &token, &id, action).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{action} must be rejected");
        assert_eq!(json["error"], "The application has already been submitted");
    }
    assert_eq!(app.ingestor.calls().await, 1);
}

#[tokio::test]
async fn concurrent_submit_is_rejected() {
    let app = TestAppBuilder::new()
        .ingest_delay(Duration::from_millis(200))
        .build();
    let token = token();
    let id = to_review(&app.router, &token).await;

    let (first, second) = tokio::join!(
        step(&app.router, &token, &id, "submit"),
        step(&app.router, &token, &id, "submit"),
    );

    let mut statuses = [first.0, second.0];
    statuses.sort();
    assert_eq!(statuses, [StatusCode::OK, StatusCode::CONFLICT]);
    assert_eq!(app.ingestor.calls().await, 1);
}
