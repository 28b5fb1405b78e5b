//! Drives the router end to end against an in-memory bucket.

use std::{net::SocketAddr, path::Path, sync::Arc};

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{Method, Request, StatusCode},
    Router,
};
use photo_events::{
    config::UploadConfig,
    storage::MemoryStore,
    web::{route, AppState, SiteConfig},
};
use serde_json::Value;
use tower::ServiceExt;

const PHOTO_ID: &str = "3f2b8a4e-1c3d-4b5e-9f60-7a8b9c0d1e2f";

fn photo(id: &str, aspect_ratio: f64, place: &str) -> Value {
    serde_json::json!({
        "id": id,
        "URL": format!("https://images.example.com/{id}.jpg"),
        "thumbnailURL": format!("https://images.example.com/{id}_thumbnail.webp"),
        "description": "",
        "place": place,
        "dateTime": "2023-04-01T03:15:07Z",
        "timezone": "+09:00",
        "aspectRatio": aspect_ratio,
        "exif": { "make": "FUJIFILM", "model": "X-T4", "fNumber": "2.8" }
    })
}

fn write_events(dir: &Path) {
    let spring = serde_json::json!({
        "meta": {
            "title": "Spring walk",
            "description": "Cherry blossoms",
            "start_at": "2023-04-01T00:00:00Z",
            "end_at": "2023-04-02T00:00:00Z"
        },
        "photos": [
            photo(PHOTO_ID, 1.5, "Meguro river"),
            photo("0b9d3c1e-2f4a-4b6c-8d0e-1f2a3b4c5d6e", 0.75, "Naka-Meguro"),
            photo("9e107d9d-3721-4e2a-8f5c-1a2b3c4d5e6f", 0.75, "Ikejiri"),
        ]
    });
    std::fs::write(dir.join("spring.json"), spring.to_string()).unwrap();
    std::fs::write(
        dir.join("winter.yaml"),
        "meta:\n  title: Winter lights\n  description: \"\"\n  start_at: \"2022-12-24T00:00:00Z\"\nphotos: []\n",
    )
    .unwrap();
}

fn app(store: Arc<MemoryStore>, content_dir: &Path) -> Router {
    app_with_upload(
        store,
        content_dir,
        UploadConfig {
            signed_url_minutes: 15,
            max_quantity: 10,
        },
    )
}

fn app_with_upload(store: Arc<MemoryStore>, content_dir: &Path, upload: UploadConfig) -> Router {
    route(AppState {
        store,
        upload,
        site: Arc::new(SiteConfig {
            web_base: "/".to_string(),
            content_dir: content_dir.to_path_buf(),
            columns: 2,
        }),
    })
}

async fn send(app: Router, method: Method, uri: &str) -> (StatusCode, String) {
    let response = app
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .extension(ConnectInfo(SocketAddr::from(([127, 0, 0, 1], 40000))))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let body = hyper::body::to_bytes(response.into_body()).await.unwrap();
    (status, String::from_utf8(body.to_vec()).unwrap())
}

#[tokio::test]
async fn signed_url_defaults_to_one_jpg() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(MemoryStore::new("photos"));
    let (status, body) = send(app(store, dir.path()), Method::GET, "/signed_url").await;
    assert_eq!(status, StatusCode::OK);

    let uploads: Value = serde_json::from_str(&body).unwrap();
    let uploads = uploads.as_array().unwrap();
    assert_eq!(uploads.len(), 1);
    let id = uploads[0]["id"].as_str().unwrap();
    assert_eq!(
        uploads[0]["raw"],
        format!("memory://photos/{id}.jpg?expires_in=900")
    );
    assert!(uploads[0].get("thumbnail").is_none());
}

#[tokio::test]
async fn signed_url_with_thumbnails() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(MemoryStore::new("photos"));
    let (status, body) = send(
        app(store, dir.path()),
        Method::GET,
        "/signed_url?quantity=3&extension=PNG&thumbnail_extensions=webp,AVIF",
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let uploads: Value = serde_json::from_str(&body).unwrap();
    let uploads = uploads.as_array().unwrap();
    assert_eq!(uploads.len(), 3);
    for upload in uploads {
        let id = upload["id"].as_str().unwrap();
        assert!(upload["raw"].as_str().unwrap().contains(&format!("{id}.png")));
        assert!(upload["thumbnail"]["webp"]
            .as_str()
            .unwrap()
            .contains(&format!("{id}_thumbnail.webp")));
        assert!(upload["smallThumbnail"]["avif"]
            .as_str()
            .unwrap()
            .contains(&format!("{id}_small.avif")));
    }
}

#[tokio::test]
async fn signed_url_rejects_unknown_extension() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(MemoryStore::new("photos"));
    let (status, body) = send(
        app(store.clone(), dir.path()),
        Method::GET,
        "/signed_url?extension=gif",
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["message"], "Invalid file extension");

    let (status, _) = send(
        app(store.clone(), dir.path()),
        Method::GET,
        "/signed_url?thumbnail_extensions=webp,tiff",
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(app(store, dir.path()), Method::GET, "/signed_url?quantity=11").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn signed_url_empty_thumbnail_list_means_none() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(MemoryStore::new("photos"));
    let (status, body) = send(
        app(store.clone(), dir.path()),
        Method::GET,
        "/signed_url?thumbnail_extensions=",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let uploads: Value = serde_json::from_str(&body).unwrap();
    assert!(uploads[0].get("thumbnail").is_none());
    assert!(uploads[0].get("smallThumbnail").is_none());

    let (status, body) = send(
        app(store, dir.path()),
        Method::GET,
        "/signed_url?thumbnail_extensions=webp,",
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["message"], "Invalid file extension");
}

#[tokio::test]
async fn signed_url_lifetime_is_capped_at_a_week() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(MemoryStore::new("photos"));
    let upload = UploadConfig {
        signed_url_minutes: u64::MAX,
        max_quantity: 10,
    };
    let (status, body) = send(
        app_with_upload(store, dir.path(), upload),
        Method::GET,
        "/signed_url",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let uploads: Value = serde_json::from_str(&body).unwrap();
    assert!(uploads[0]["raw"]
        .as_str()
        .unwrap()
        .ends_with(&format!("?expires_in={}", 7 * 24 * 3600)));
}

#[tokio::test]
async fn delete_removes_all_objects_for_id() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(MemoryStore::new("photos"));
    store.insert(format!("{PHOTO_ID}.jpg"));
    store.insert(format!("{PHOTO_ID}_thumbnail.webp"));
    store.insert(format!("{PHOTO_ID}_small.webp"));
    store.insert("0b9d3c1e-2f4a-4b6c-8d0e-1f2a3b4c5d6e.jpg");

    let (status, body) = send(
        app(store.clone(), dir.path()),
        Method::DELETE,
        &format!("/r2_contents/{PHOTO_ID}"),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_empty());
    assert_eq!(store.keys(), vec!["0b9d3c1e-2f4a-4b6c-8d0e-1f2a3b4c5d6e.jpg".to_string()]);

    let (status, body) = send(
        app(store, dir.path()),
        Method::DELETE,
        &format!("/r2_contents/{PHOTO_ID}"),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["message"], "Object is not found");
}

#[tokio::test]
async fn delete_rejects_invalid_id() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(MemoryStore::new("photos"));
    let (status, body) = send(app(store, dir.path()), Method::DELETE, "/r2_contents/1234").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["message"], "Invalid id type");
}

#[tokio::test]
async fn delete_reports_storage_refusal() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(MemoryStore::new("photos"));
    store.insert(format!("{PHOTO_ID}.jpg"));
    store.lock_key(format!("{PHOTO_ID}.jpg"));
    let (status, _) = send(
        app(store, dir.path()),
        Method::DELETE,
        &format!("/r2_contents/{PHOTO_ID}"),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn event_index_lists_newest_first() {
    let dir = tempfile::tempdir().unwrap();
    write_events(dir.path());
    let store = Arc::new(MemoryStore::new("photos"));
    let (status, body) = send(app(store, dir.path()), Method::GET, "/").await;
    assert_eq!(status, StatusCode::OK);

    let spring = body.find("Spring walk").unwrap();
    let winter = body.find("Winter lights").unwrap();
    assert!(spring < winter);
    assert!(body.contains("/events/spring"));
    assert!(body.contains("2023/4/1 - 2"));
    assert!(body.contains("2022/12/24"));
}

#[tokio::test]
async fn event_page_renders_masonry() {
    let dir = tempfile::tempdir().unwrap();
    write_events(dir.path());
    let store = Arc::new(MemoryStore::new("photos"));
    let (status, body) = send(app(store, dir.path()), Method::GET, "/events/spring").await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(body.matches("class=\"column\"").count(), 2);
    assert_eq!(body.matches("class=\"photo\"").count(), 3);
    // the tall first photo sits alone, the two wide ones stack in the second column
    let first_column = body.find("Meguro river").unwrap();
    let naka = body.find("Naka-Meguro").unwrap();
    let ikejiri = body.find("Ikejiri").unwrap();
    assert!(first_column < naka && naka < ikejiri);
    assert!(body.contains("2023/4/1 12:15:07"));
    assert!(body.contains("FUJIFILM X-T4 · f/2.8"));
    assert!(body.contains(&format!("https://images.example.com/{PHOTO_ID}_thumbnail.webp")));
}

#[tokio::test]
async fn event_page_missing() {
    let dir = tempfile::tempdir().unwrap();
    write_events(dir.path());
    let store = Arc::new(MemoryStore::new("photos"));
    let (status, _) = send(app(store.clone(), dir.path()), Method::GET, "/events/autumn").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(app(store.clone(), dir.path()), Method::GET, "/events/..").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(app(store.clone(), dir.path()), Method::GET, "/events/a%00b").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let long = "x".repeat(300);
    let (status, _) = send(app(store, dir.path()), Method::GET, &format!("/events/{long}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn health() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(MemoryStore::new("photos"));
    let (status, _) = send(app(store, dir.path()), Method::GET, "/health").await;
    assert_eq!(status, StatusCode::OK);
}
