use std::net::SocketAddr;
use std::num::NonZeroUsize;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use axum::response::Response;
use http_body_util::BodyExt;
use logtail_core::{Core, CoreOptions, ReadLimits};
use logtail_http::{HttpServer, InsecureHttpServer};
use logtail_reader::{DirResolver, LogReader};
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;

const SAMPLE: &str = "1 aaaaaa\n2 bbbbbbbbbbbbbb\n3 cccccccccccc\n4 ddddddddd\n5 eeeee\n6 fff\n";

fn core_with(limits: ReadLimits) -> (TempDir, Core<InsecureHttpServer, DirResolver>) {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("app.log"), SAMPLE).unwrap();

    let core = Core::new(CoreOptions {
        http_server: InsecureHttpServer::new(SocketAddr::from(([127, 0, 0, 1], 0))),
        reader: LogReader::new(DirResolver::new(dir.path())).with_chunk_size(7),
        limits,
        read_timeout: None,
    });

    (dir, core)
}

fn core() -> (TempDir, Core<InsecureHttpServer, DirResolver>) {
    core_with(ReadLimits::default())
}

async fn send(core: &Core<InsecureHttpServer, DirResolver>, method: Method, uri: &str) -> Response {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    core.router().oneshot(request).await.unwrap()
}

async fn get(core: &Core<InsecureHttpServer, DirResolver>, uri: &str) -> Response {
    send(core, Method::GET, uri).await
}

async fn body_text(response: Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn body_json(response: Response) -> Value {
    serde_json::from_str(&body_text(response).await).unwrap()
}

/// Parses an event-stream body into `(event, data)` pairs, skipping comments.
fn parse_events(body: &str) -> Vec<(String, Value)> {
    body.split("\n\n")
        .filter_map(|block| {
            let mut event = None;
            let mut data = None;
            for line in block.lines() {
                if let Some(value) = line.strip_prefix("event:") {
                    event = Some(value.trim_start().to_string());
                } else if let Some(value) = line.strip_prefix("data:") {
                    data = Some(serde_json::from_str(value.trim_start()).unwrap());
                }
            }
            Some((event?, data?))
        })
        .collect()
}

#[tokio::test]
async fn test_batch_read() {
    let (_dir, core) = core();

    let response = get(&core, "/log/read?file=app.log&limit=2").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({"hasMore": true, "lines": ["6 fff", "5 eeeee"], "cursor": 53})
    );

    let response = get(&core, "/log/read?file=app.log&cursor=61&keyword=ddd&limit=3").await;
    assert_eq!(
        body_json(response).await,
        json!({"hasMore": false, "lines": ["4 ddddddddd"]})
    );
}

#[tokio::test]
async fn test_batch_limit_is_clamped() {
    let limits = ReadLimits {
        batch_default: NonZeroUsize::new(1).unwrap(),
        batch_max: NonZeroUsize::new(2).unwrap(),
        stream_default: NonZeroUsize::new(100).unwrap(),
    };
    let (_dir, core) = core_with(limits);

    let body = body_json(get(&core, "/log/read?file=app.log").await).await;
    assert_eq!(body["lines"], json!(["6 fff"]));

    let body = body_json(get(&core, "/log/read?file=app.log&limit=50").await).await;
    assert_eq!(body["lines"], json!(["6 fff", "5 eeeee"]));
    assert_eq!(body["cursor"], json!(53));
}

#[tokio::test]
async fn test_stream_read() {
    let (_dir, core) = core();

    let response = get(&core, "/log/read?file=app.log&mode=Stream&cursor=61&limit=3").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "text/event-stream");
    assert_eq!(response.headers()[header::CACHE_CONTROL], "no-cache");
    assert_eq!(response.headers()["x-accel-buffering"], "no");

    let events = parse_events(&body_text(response).await);
    assert_eq!(
        events,
        [
            ("log".to_string(), json!({"line": "5 eeeee"})),
            ("log".to_string(), json!({"line": "4 ddddddddd"})),
            ("log".to_string(), json!({"line": "3 cccccccccccc"})),
            ("pagination".to_string(), json!({"hasMore": true, "cursor": 26})),
        ]
    );
}

#[tokio::test]
async fn test_stream_read_exhausted() {
    let (_dir, core) = core();

    let events = parse_events(&body_text(get(&core, "/log/read?file=app.log&mode=stream").await).await);

    assert_eq!(events.len(), 7);
    assert_eq!(events[0], ("log".to_string(), json!({"line": "6 fff"})));
    assert_eq!(events[6], ("pagination".to_string(), json!({"hasMore": false})));
}

#[tokio::test]
async fn test_missing_file() {
    let (_dir, core) = core();

    let response = get(&core, "/log/read?file=nope.log").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await, json!({"msg": "Log file does not exist."}));

    let response = get(&core, "/log/read?file=nope.log&mode=stream").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        parse_events(&body_text(response).await),
        [("error".to_string(), json!({"msg": "Log file does not exist."}))]
    );
}

#[tokio::test]
async fn test_directory_traversal_is_contained() {
    let (dir, core) = core();
    let name = dir.path().file_name().unwrap().to_str().unwrap();

    let uri = format!("/log/read?file=../{name}/app.log&limit=1");
    let body = body_json(get(&core, &uri).await).await;
    assert_eq!(body["lines"], json!(["6 fff"]));

    let response = get(&core, "/log/read?file=..").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_invalid_cursor() {
    let (_dir, core) = core();

    let response = get(&core, "/log/read?file=app.log&cursor=60").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await, json!({"msg": "Invalid cursor."}));
}

#[tokio::test]
async fn test_unsupported_mode() {
    let (_dir, core) = core();

    let response = get(&core, "/log/read?file=app.log&mode=follow").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await, json!({"msg": "Unsupported read mode."}));
}

#[tokio::test]
async fn test_unknown_path_and_method() {
    let (_dir, core) = core();

    let response = get(&core, "/log/write").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await, json!({"msg": "Page not found."}));

    let response = send(&core, Method::POST, "/log/read?file=app.log").await;
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body_json(response).await, json!({"msg": "Unsupported HTTP method."}));
}

#[tokio::test]
async fn test_cors_allows_any_origin() {
    let (_dir, core) = core();

    let request = Request::builder()
        .uri("/log/read?file=app.log&limit=1")
        .header(header::ORIGIN, "http://viewer.example")
        .body(Body::empty())
        .unwrap();
    let response = core.router().oneshot(request).await.unwrap();

    assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
}

#[tokio::test]
async fn test_reads_after_shutdown_return_resumable_cursor() {
    let (_dir, core) = core();
    core.shutdown().await;

    let response = get(&core, "/log/read?file=app.log&cursor=61").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({"hasMore": true, "lines": [], "cursor": 61})
    );
}

#[tokio::test]
async fn test_serves_over_tcp() {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let (_dir, core) = core();
    let handle = core.start().await.unwrap();
    let addr = core.http_server().local_addr().unwrap();

    let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
    stream
        .write_all(b"GET /log/read?file=app.log&limit=1 HTTP/1.1\r\nhost: localhost\r\nconnection: close\r\n\r\n")
        .await
        .unwrap();
    let mut response = String::new();
    stream.read_to_string(&mut response).await.unwrap();

    assert!(response.starts_with("HTTP/1.1 200"), "{response}");
    assert!(response.contains(r#""lines":["6 fff"]"#), "{response}");

    assert!(matches!(core.start().await, Err(logtail_core::Error::AlreadyStarted)));

    core.shutdown().await;
    handle.await.unwrap().unwrap();
}
