mod common;

use chirp_http::HttpClient;
use chirp_social::twitter::{ImageDownloader, ResponseHandler};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn photos_land_in_per_user_directories() {
    common::init_test_tracing();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/media/abc.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"jpeg-bytes".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let tmp = tempfile::tempdir().unwrap();
    let downloader = ImageDownloader::with_output(
        HttpClient::new(&server.uri()).unwrap(),
        tmp.path(),
        Vec::new(),
    );
    let media_url = format!("{}/media/abc.jpg", server.uri());

    let body = json!([
        {
            "text": "look",
            "created_at": "Mon Jan 01 00:00:00 +0000 2020",
            "user": {"name": "Alice", "screen_name": "alice"},
            "extended_entities": {
                "media": [{"media_url": media_url, "type": "photo"}]
            }
        },
        {
            "text": "no media",
            "created_at": "Mon Jan 01 00:00:01 +0000 2020",
            "user": {"name": "Bob", "screen_name": "bob"}
        }
    ]);
    downloader.handle(body).await.unwrap();

    let saved = std::fs::read(tmp.path().join("alice").join("abc.jpg")).unwrap();
    assert_eq!(saved, b"jpeg-bytes");
    assert!(tmp.path().join("bob").is_dir());

    let printed = String::from_utf8(downloader.into_inner()).unwrap();
    assert_eq!(printed, format!("{media_url}\n"));
}

#[tokio::test]
async fn failed_download_is_an_error() {
    common::init_test_tracing();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let tmp = tempfile::tempdir().unwrap();
    let downloader = ImageDownloader::new(HttpClient::new(&server.uri()).unwrap(), tmp.path());

    let body = json!({
        "statuses": [{
            "text": "look",
            "created_at": "Mon Jan 01 00:00:00 +0000 2020",
            "user": {"name": "Alice", "screen_name": "alice"},
            "extended_entities": {
                "media": [{"media_url": format!("{}/media/gone.jpg", server.uri())}]
            }
        }]
    });
    let err = downloader.handle(body).await.unwrap_err();

    assert!(err.to_string().contains("403"), "got {err:#}");
    assert!(!tmp.path().join("alice").join("gone.jpg").exists());
}
