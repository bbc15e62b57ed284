use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use rust_image_backend::config::AppConfig;
use rust_image_backend::entities::prelude::*;
use rust_image_backend::infrastructure::database::run_migrations;
use rust_image_backend::services::image_service::ImageService;
use rust_image_backend::services::storage::LocalStorage;
use rust_image_backend::{AppState, create_app};
use sea_orm::{ConnectOptions, Database, DatabaseConnection, EntityTrait};
use serde_json::Value;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

const BOUNDARY: &str = "---------------------------123456789012345678901234567";

async fn setup_app() -> (Router, DatabaseConnection, Arc<LocalStorage>, TempDir) {
    // A single connection keeps every query on the same in-memory database.
    let mut opt = ConnectOptions::new("sqlite::memory:");
    opt.max_connections(1);
    let db = Database::connect(opt).await.unwrap();
    run_migrations(&db).await.unwrap();

    let upload_dir = tempfile::tempdir().unwrap();
    let storage = Arc::new(LocalStorage::new(upload_dir.path().to_path_buf()));
    storage.ensure_root().await.unwrap();

    let image_service = Arc::new(ImageService::new(db.clone(), storage.clone()));

    let state = AppState {
        db: db.clone(),
        storage: storage.clone(),
        image_service,
        config: AppConfig {
            port: 0,
            database_url: "sqlite::memory:".to_string(),
            upload_dir: upload_dir.path().to_path_buf(),
            public_base_url: None,
        },
    };

    (create_app(state), db, storage, upload_dir)
}

fn file_part(filename: &str, content_type: &str, content: &[u8]) -> Vec<u8> {
    let mut part = Vec::new();
    part.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"image\"; filename=\"{filename}\"\r\n\
             Content-Type: {content_type}\r\n\r\n"
        )
        .as_bytes(),
    );
    part.extend_from_slice(content);
    part.extend_from_slice(b"\r\n");
    part
}

fn close_body(mut body: Vec<u8>) -> Vec<u8> {
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn upload_request(body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/upload")
        .header("Host", "localhost:5000")
        .header(
            "Content-Type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

fn png_bytes(len: usize) -> Vec<u8> {
    let mut bytes = vec![0u8; len];
    bytes[..4.min(len)].copy_from_slice(&[0x89, 0x50, 0x4E, 0x47][..4.min(len)]);
    bytes
}

#[tokio::test]
async fn test_upload_flow() {
    let (app, db, storage, _upload_dir) = setup_app().await;

    let content = png_bytes(1024);
    let body = close_body(file_part("cat.png", "image/png", &content));

    let response = app.oneshot(upload_request(body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: Value = serde_json::from_slice(&body).unwrap();

    assert_eq!(json["message"], "Upload successful");
    let filename = json["filename"].as_str().unwrap();
    assert!(filename.ends_with(".png"));
    assert_eq!(
        json["url"].as_str().unwrap(),
        format!("http://localhost:5000/uploads/{filename}")
    );

    // Generated name shape: <millis>-<random><ext>
    let stem = filename.strip_suffix(".png").unwrap();
    let (millis, random) = stem.split_once('-').unwrap();
    assert!(millis.parse::<i64>().is_ok());
    assert!(random.parse::<u32>().unwrap() < 1_000_000_000);

    // Exactly one blob on disk, byte-identical to the input
    assert!(storage.exists(filename).await);
    let stored = tokio::fs::read(storage.path_for(filename)).await.unwrap();
    assert_eq!(stored, content);

    // Exactly one metadata row, matching the input
    let rows = Images::find().all(&db).await.unwrap();
    assert_eq!(rows.len(), 1);
    let row = &rows[0];
    assert_eq!(row.filename, filename);
    assert_eq!(row.original_name.as_deref(), Some("cat.png"));
    assert_eq!(row.mimetype.as_deref(), Some("image/png"));
    assert_eq!(row.size, Some(1024));
    assert!(row.created_at.is_some());

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM images")
        .fetch_one(db.get_sqlite_connection_pool())
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn test_upload_rejects_disallowed_mime_type() {
    let (app, db, storage, _upload_dir) = setup_app().await;

    let body = close_body(file_part("notes.txt", "text/plain", b"not an image"));
    let response = app.oneshot(upload_request(body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert!(json["error"].as_str().unwrap().contains("not allowed"));

    // Nothing was written anywhere
    assert_eq!(Images::find().all(&db).await.unwrap().len(), 0);
    assert_eq!(std::fs::read_dir(storage.root()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_upload_rejects_oversized_file() {
    let (app, db, storage, _upload_dir) = setup_app().await;

    let content = png_bytes(2 * 1024 * 1024 + 1);
    let body = close_body(file_part("big.png", "image/png", &content));
    let response = app.oneshot(upload_request(body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    assert_eq!(Images::find().all(&db).await.unwrap().len(), 0);
    assert_eq!(std::fs::read_dir(storage.root()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_upload_accepts_file_at_exact_limit() {
    let (app, db, _storage, _upload_dir) = setup_app().await;

    let content = png_bytes(2 * 1024 * 1024);
    let body = close_body(file_part("limit.png", "image/png", &content));
    let response = app.oneshot(upload_request(body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let rows = Images::find().all(&db).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].size, Some(2 * 1024 * 1024));
}

#[tokio::test]
async fn test_upload_rejects_request_without_file() {
    let (app, db, _storage, _upload_dir) = setup_app().await;

    // A text field under the expected name is not a file
    let mut body = Vec::new();
    body.extend_from_slice(
        format!("--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"image\"\r\n\r\nhello\r\n")
            .as_bytes(),
    );
    let body = close_body(body);

    let response = app.oneshot(upload_request(body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json["error"], "No file uploaded or invalid type");

    assert_eq!(Images::find().all(&db).await.unwrap().len(), 0);
}

#[tokio::test]
async fn test_upload_rejects_multiple_files() {
    let (app, db, storage, _upload_dir) = setup_app().await;

    let mut body = file_part("one.png", "image/png", &png_bytes(16));
    body.extend_from_slice(&file_part("two.png", "image/png", &png_bytes(16)));
    let body = close_body(body);

    let response = app.oneshot(upload_request(body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(Images::find().all(&db).await.unwrap().len(), 0);
    assert_eq!(std::fs::read_dir(storage.root()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_sequential_uploads_get_distinct_filenames() {
    let (app, db, storage, _upload_dir) = setup_app().await;

    let mut filenames = Vec::new();
    for name in ["a.gif", "b.gif"] {
        let body = close_body(file_part(name, "image/gif", b"GIF89a fake"));
        let response = app.clone().oneshot(upload_request(body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json: Value = serde_json::from_slice(&bytes).unwrap();
        filenames.push(json["filename"].as_str().unwrap().to_string());
    }

    assert_ne!(filenames[0], filenames[1]);
    assert!(storage.exists(&filenames[0]).await);
    assert!(storage.exists(&filenames[1]).await);
    assert_eq!(Images::find().all(&db).await.unwrap().len(), 2);
}
