//! AI relay tests against a mock AI microservice.

use std::convert::Infallible;
use std::time::{Duration, Instant};

use axum::{
    body::{Body, Bytes},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use futures_util::{stream, StreamExt};
use pantry_proxy::config::ProxyConfig;
use reqwest::multipart::{Form, Part};
use serde_json::{json, Value};

mod common;

use common::{RecordedCall, TestProxy};

async fn unused_docs(_call: RecordedCall) -> Response {
    StatusCode::NOT_FOUND.into_response()
}

async fn start_with_ai<F, Fut>(ai_respond: F) -> (TestProxy, common::Calls)
where
    F: Fn(RecordedCall) -> Fut + Clone + Send + Sync + 'static,
    Fut: std::future::Future<Output = Response> + Send + 'static,
{
    start_with_ai_config(ai_respond, |_| {}).await
}

async fn start_with_ai_config<F, Fut>(
    ai_respond: F,
    configure: impl FnOnce(&mut ProxyConfig),
) -> (TestProxy, common::Calls)
where
    F: Fn(RecordedCall) -> Fut + Clone + Send + Sync + 'static,
    Fut: std::future::Future<Output = Response> + Send + 'static,
{
    let (docs, _) = common::start_upstream(unused_docs).await;
    let (ai, calls) = common::start_upstream(ai_respond).await;
    let mut config = common::test_config(docs, ai);
    configure(&mut config);
    (TestProxy::start(config).await, calls)
}

async fn hung_ai(_call: RecordedCall) -> Response {
    tokio::time::sleep(Duration::from_secs(30)).await;
    Json(json!({"text": APPLE_FENCED})).into_response()
}

fn image_form() -> Form {
    Form::new().part(
        "image",
        Part::bytes(b"PHOTO-OF-AN-APPLE".to_vec())
            .file_name("apple.jpg")
            .mime_str("image/jpeg")
            .unwrap(),
    )
}

const APPLE_FENCED: &str = "```json\n{\"item\":\"Apple\",\"expiration_days\":7,\"notes\":null}\n```";

#[tokio::test]
async fn test_analyze_image_strips_fence_and_parses() {
    let (proxy, calls) = start_with_ai(|_call: RecordedCall| async move {
        Json(json!({"text": APPLE_FENCED})).into_response()
    })
    .await;

    let res = proxy
        .client
        .post(proxy.url("/analyzeImage"))
        .multipart(image_form())
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body, json!({"item": "Apple", "expiration_days": 7, "notes": null}));

    let call = &calls.all()[0];
    assert_eq!(call.method, "POST");
    assert_eq!(call.path, "/chat");
    let sent = call.body_text();
    assert!(sent.contains("name=\"payload\""));
    assert!(sent.contains("\"stream\":false"));
    assert!(sent.contains("\"format\""));
    assert!(sent.contains("\"model\":\"llava\""));
    assert!(sent.contains("\"providerType\":\"ollama\""));
    assert!(sent.contains("name=\"image\""));
    assert!(sent.contains("filename=\"apple.jpg\""));
    assert!(sent.contains("PHOTO-OF-AN-APPLE"));
}

#[tokio::test]
async fn test_analyze_image_invalid_json_is_500() {
    let (proxy, _) = start_with_ai(|_call: RecordedCall| async move {
        Json(json!({"text": "```json\n{\"item\": \"Apple\", \"expiration_days\": \n```"})).into_response()
    })
    .await;

    let res = proxy
        .client
        .post(proxy.url("/analyzeImage"))
        .multipart(image_form())
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 500);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body, json!({"error": "Failed to analyze image"}));
}

#[tokio::test]
async fn test_analyze_image_missing_field_is_500() {
    let (proxy, _) = start_with_ai(|_call: RecordedCall| async move {
        Json(json!({"text": "{\"item\":\"Apple\"}"})).into_response()
    })
    .await;

    let res = proxy
        .client
        .post(proxy.url("/analyzeImage"))
        .multipart(image_form())
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 500);
}

#[tokio::test]
async fn test_analyze_image_upstream_error_not_leaked() {
    let (proxy, _) = start_with_ai(|_call: RecordedCall| async move {
        (StatusCode::SERVICE_UNAVAILABLE, Json(json!({"error": "model llava offline"}))).into_response()
    })
    .await;

    let res = proxy
        .client
        .post(proxy.url("/analyzeImage"))
        .multipart(image_form())
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 500);
    let text = res.text().await.unwrap();
    assert!(text.contains("Failed to analyze image"));
    assert!(!text.contains("offline"));
}

#[tokio::test]
async fn test_analyze_image_requires_image() {
    let (proxy, calls) = start_with_ai(|_call: RecordedCall| async move {
        Json(json!({"text": APPLE_FENCED})).into_response()
    })
    .await;

    let form = Form::new().part("photo", Part::bytes(b"wrong field".to_vec()).file_name("a.jpg"));
    let res = proxy
        .client
        .post(proxy.url("/analyzeImage"))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 400);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body, json!({"error": "No image uploaded"}));
    assert_eq!(calls.len(), 0);
}

const STREAM_CHUNKS: [&str; 4] = ["You could ", "make a ", "milkshake", " \u{1F95B}\n"];

async fn streaming_ai(_call: RecordedCall) -> Response {
    let chunks = stream::iter(STREAM_CHUNKS).then(|chunk| async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        Ok::<_, Infallible>(Bytes::from_static(chunk.as_bytes()))
    });
    (
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        Body::from_stream(chunks),
    )
        .into_response()
}

fn milk_request() -> Value {
    json!({
        "items": [{"Name": "Milk", "Quantity": 1, "Expiration": 1700000000}],
        "message": "What can I make?"
    })
}

#[tokio::test]
async fn test_pantry_chat_streams_bytes_unmodified() {
    let (proxy, calls) = start_with_ai(streaming_ai).await;

    let res = proxy
        .client
        .post(proxy.url("/pantryChat"))
        .json(&milk_request())
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(res.headers()["content-type"], "text/plain; charset=utf-8");

    let mut received = Vec::new();
    let mut body = res.bytes_stream();
    while let Some(chunk) = body.next().await {
        received.extend_from_slice(&chunk.unwrap());
    }
    assert_eq!(received, STREAM_CHUNKS.concat().into_bytes());

    let sent = calls.all()[0].body_text();
    assert!(sent.contains("\"stream\":true"));
    assert!(sent.contains("Milk (x1) expiring on 2023-11-14"));
    assert!(sent.contains("What can I make?"));
    assert!(!sent.contains("name=\"image\""));
}

#[tokio::test]
async fn test_pantry_chat_relays_first_chunk_before_stream_ends() {
    let (proxy, _) = start_with_ai(|_call: RecordedCall| async move {
        let chunks = stream::iter(["first", "second"]).then(|chunk| async move {
            if chunk == "second" {
                tokio::time::sleep(Duration::from_secs(2)).await;
            }
            Ok::<_, Infallible>(Bytes::from_static(chunk.as_bytes()))
        });
        Body::from_stream(chunks).into_response()
    })
    .await;

    let res = proxy
        .client
        .post(proxy.url("/pantryChat"))
        .json(&milk_request())
        .send()
        .await
        .unwrap();
    let mut body = res.bytes_stream();

    let first = tokio::time::timeout(Duration::from_secs(1), body.next())
        .await
        .expect("first chunk was buffered")
        .unwrap()
        .unwrap();
    assert_eq!(&first[..], b"first");
}

#[tokio::test]
async fn test_pantry_chat_requires_items_and_message() {
    let (proxy, calls) = start_with_ai(streaming_ai).await;

    for body in [
        json!({"message": "What can I make?"}),
        json!({"items": []}),
        json!({"items": [], "message": "   "}),
    ] {
        let res = proxy.client.post(proxy.url("/pantryChat")).json(&body).send().await.unwrap();
        assert_eq!(res.status(), 400, "body {body} should be rejected");
        let error: Value = res.json().await.unwrap();
        assert_eq!(error, json!({"error": "items and message are required"}));
    }

    let res = proxy
        .client
        .post(proxy.url("/pantryChat"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 400);

    assert_eq!(calls.len(), 0);
}

#[tokio::test]
async fn test_pantry_chat_upstream_failure_before_stream() {
    let (proxy, _) = start_with_ai(|_call: RecordedCall| async move {
        (StatusCode::BAD_GATEWAY, "provider down").into_response()
    })
    .await;

    let res = proxy
        .client
        .post(proxy.url("/pantryChat"))
        .json(&milk_request())
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 500);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body, json!({"error": "Failed to get chat response"}));
}

#[tokio::test]
async fn test_pantry_chat_unreadable_error_body() {
    let (proxy, _) = start_with_ai(|_call: RecordedCall| async move {
        let broken = stream::iter([
            Ok(Bytes::from_static(b"{\"error\":")),
            Err(std::io::Error::other("connection reset")),
        ]);
        (StatusCode::BAD_GATEWAY, Body::from_stream(broken)).into_response()
    })
    .await;

    let res = proxy
        .client
        .post(proxy.url("/pantryChat"))
        .json(&milk_request())
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 500);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body, json!({"error": "Failed to get chat response"}));
}

#[tokio::test]
async fn test_pantry_chat_mid_stream_failure_ends_connection() {
    let (proxy, _) = start_with_ai(|_call: RecordedCall| async move {
        let chunks = stream::iter([Ok("partial"), Err("upstream died")]).then(|item| async move {
            match item {
                Ok(chunk) => Ok(Bytes::from_static(chunk.as_bytes())),
                Err(reason) => {
                    tokio::time::sleep(Duration::from_millis(300)).await;
                    Err(std::io::Error::other(reason))
                }
            }
        });
        Body::from_stream(chunks).into_response()
    })
    .await;

    let res = proxy
        .client
        .post(proxy.url("/pantryChat"))
        .json(&milk_request())
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);

    let mut received = Vec::new();
    let mut failed = false;
    let mut body = res.bytes_stream();
    while let Some(chunk) = body.next().await {
        match chunk {
            Ok(bytes) => received.extend_from_slice(&bytes),
            Err(_) => {
                failed = true;
                break;
            }
        }
    }

    assert_eq!(received, b"partial");
    assert!(failed, "a broken upstream stream must end the response with an error");
}

#[tokio::test]
async fn test_pantry_chat_hung_ai_times_out() {
    let (proxy, _) = start_with_ai_config(hung_ai, |config| {
        config.timeouts.stream_start_secs = 1;
    })
    .await;

    let start = Instant::now();
    let res = proxy
        .client
        .post(proxy.url("/pantryChat"))
        .json(&milk_request())
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 500);
    assert!(start.elapsed() < Duration::from_secs(10));
    let body: Value = res.json().await.unwrap();
    assert_eq!(body, json!({"error": "Failed to get chat response"}));
}

#[tokio::test]
async fn test_analyze_image_hung_ai_times_out() {
    let (proxy, _) = start_with_ai_config(hung_ai, |config| {
        config.timeouts.upstream_secs = 1;
    })
    .await;

    let start = Instant::now();
    let res = proxy
        .client
        .post(proxy.url("/analyzeImage"))
        .multipart(image_form())
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 500);
    assert!(start.elapsed() < Duration::from_secs(10));
    let body: Value = res.json().await.unwrap();
    assert_eq!(body, json!({"error": "Failed to analyze image"}));
}

#[tokio::test]
async fn test_long_stream_outlives_start_timeout() {
    let (proxy, _) = start_with_ai_config(
        |_call: RecordedCall| async move {
            let chunks = stream::iter(["one ", "two ", "three ", "four"]).then(|chunk| async move {
                if chunk != "one " {
                    tokio::time::sleep(Duration::from_millis(800)).await;
                }
                Ok::<_, Infallible>(Bytes::from_static(chunk.as_bytes()))
            });
            Body::from_stream(chunks).into_response()
        },
        |config| {
            config.timeouts.stream_start_secs = 1;
            config.timeouts.upstream_secs = 1;
        },
    )
    .await;

    let start = Instant::now();
    let res = proxy
        .client
        .post(proxy.url("/pantryChat"))
        .json(&milk_request())
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);

    let mut received = Vec::new();
    let mut body = res.bytes_stream();
    while let Some(chunk) = body.next().await {
        received.extend_from_slice(&chunk.unwrap());
    }
    assert_eq!(received, b"one two three four");
    assert!(start.elapsed() > Duration::from_secs(2));
}
