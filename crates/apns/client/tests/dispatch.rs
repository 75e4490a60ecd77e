//! Dispatcher integration tests against a local mock of the push service.

use std::collections::HashSet;
use std::time::Duration;

use apns_client::{Connection, ErrorKind, PushError};
use apns_core::{Message, Priority};
use axum::Router;
use axum::extract::Path;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse as _, Json};
use axum::routing::post;
use chrono::{TimeZone as _, Utc};
use serde_json::json;
use tokio_stream::StreamExt as _;
use uuid::Uuid;

/// Serve a router on an ephemeral port and return its base URL.
async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

async fn connection_to(app: Router) -> Connection {
    let host = serve(app).await;
    let mut connection = Connection::with_client(reqwest::Client::new());
    connection.set_host(host);
    connection
}

fn message() -> Message {
    Message::builder().title("title").body("body").badge(42).build()
}

#[tokio::test]
async fn test_delivered() {
    let app = Router::new().route(
        "/3/device/{token}",
        post(|Path(token): Path<String>| async move {
            assert_eq!(token, "1234567890");
            StatusCode::OK
        }),
    );
    let connection = connection_to(app).await;

    let mut stream = connection.dispatch(message(), &["1234567890".to_string()]);

    let outcome = stream.next().await.unwrap();
    assert_eq!(outcome.token, "1234567890");
    assert_eq!(outcome.status, Some(reqwest::StatusCode::OK));
    assert!(outcome.error.is_none());
    assert!(outcome.delivered());
    assert!(stream.next().await.is_none());
}

#[tokio::test]
async fn test_unregistered_token() {
    let app = Router::new().route(
        "/3/device/{token}",
        post(|| async {
            (
                StatusCode::GONE,
                Json(json!({"reason": "Unregistered", "timestamp": 1_700_000_000_000_i64})),
            )
        }),
    );
    let connection = connection_to(app).await;

    let mut stream = connection.dispatch(message(), &["12345678912".to_string()]);

    let outcome = stream.next().await.unwrap();
    assert!(!outcome.delivered());
    assert_eq!(outcome.status, Some(reqwest::StatusCode::GONE));
    assert_eq!(outcome.reason.as_deref(), Some("Unregistered"));
    assert_eq!(
        outcome.error.as_ref().and_then(PushError::kind),
        Some(ErrorKind::Unregistered)
    );
    // Milliseconds on the wire, seconds in the outcome.
    assert_eq!(
        outcome.timestamp,
        Some(Utc.timestamp_opt(1_700_000_000, 0).unwrap())
    );
    assert!(stream.next().await.is_none());
}

#[tokio::test]
async fn test_bad_priority() {
    let app = Router::new().route(
        "/3/device/{token}",
        post(|| async { (StatusCode::BAD_REQUEST, Json(json!({"reason": "BadPriority"}))) }),
    );
    let connection = connection_to(app).await;

    let mut stream = connection.dispatch(message(), &["12345678912".to_string()]);

    let outcome = stream.next().await.unwrap();
    assert!(!outcome.delivered());
    assert_eq!(
        outcome.error.as_ref().and_then(PushError::kind),
        Some(ErrorKind::BadPriority)
    );
    assert_eq!(outcome.timestamp, None);
    assert!(stream.next().await.is_none());
}

#[tokio::test]
async fn test_one_outcome_per_token_under_jitter() {
    // Respond with per-token delays so completion order differs from
    // submission order.
    let app = Router::new().route(
        "/3/device/{token}",
        post(|Path(token): Path<String>| async move {
            let delay = match token.as_str() {
                "first" => 40,
                "second" => 5,
                _ => 20,
            };
            tokio::time::sleep(Duration::from_millis(delay)).await;
            StatusCode::OK
        }),
    );
    let connection = connection_to(app).await;

    let tokens: Vec<String> = ["first", "second", "third"]
        .into_iter()
        .map(String::from)
        .collect();
    let mut stream = connection.dispatch(message(), &tokens);

    let mut seen = Vec::new();
    while let Some(outcome) = stream.next().await {
        assert!(outcome.delivered());
        seen.push(outcome.token);
    }

    // Exactly one outcome per token, regardless of completion order.
    assert_eq!(seen.len(), 3);
    let seen: HashSet<_> = seen.into_iter().collect();
    let expected: HashSet<_> = tokens.into_iter().collect();
    assert_eq!(seen, expected);
}

#[tokio::test]
async fn test_empty_token_list_closes_immediately() {
    let connection = Connection::with_client(reqwest::Client::new());

    let mut stream = connection.dispatch(message(), &[]);
    assert!(stream.next().await.is_none());
}

#[tokio::test]
async fn test_default_message_sends_no_optional_headers() {
    let (header_tx, mut header_rx) = tokio::sync::mpsc::channel::<HeaderMap>(1);
    let app = Router::new().route(
        "/3/device/{token}",
        post(move |headers: HeaderMap| {
            let header_tx = header_tx.clone();
            async move {
                header_tx.send(headers).await.unwrap();
                StatusCode::OK
            }
        }),
    );
    let connection = connection_to(app).await;

    let mut stream = connection.dispatch(message(), &["1234567890".to_string()]);
    assert!(stream.next().await.unwrap().delivered());

    let headers = header_rx.recv().await.unwrap();
    assert_eq!(
        headers.get("content-type").unwrap(),
        "application/json; charset=utf-8"
    );
    assert!(headers.get("apns-id").is_none());
    assert!(headers.get("apns-expiration").is_none());
    assert!(headers.get("apns-priority").is_none());
    assert!(headers.get("apns-topic").is_none());
    assert!(headers.get("apns-collapse-id").is_none());
}

#[tokio::test]
async fn test_configured_message_sends_all_headers() {
    let (header_tx, mut header_rx) = tokio::sync::mpsc::channel::<HeaderMap>(1);
    let app = Router::new().route(
        "/3/device/{token}",
        post(move |headers: HeaderMap| {
            let header_tx = header_tx.clone();
            async move {
                header_tx.send(headers).await.unwrap();
                StatusCode::OK
            }
        }),
    );
    let connection = connection_to(app).await;

    let id = Uuid::parse_str("123e4567-e89b-12d3-a456-426655440000").unwrap();
    let expiration = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
    let message = Message::builder()
        .body("body")
        .id(id)
        .expiration(expiration)
        .priority(Priority::Low)
        .topic("com.example.app")
        .collapse_id("score-update")
        .build();

    let mut stream = connection.dispatch(message, &["1234567890".to_string()]);
    assert!(stream.next().await.unwrap().delivered());

    let headers = header_rx.recv().await.unwrap();
    assert_eq!(
        headers.get("apns-id").unwrap(),
        "123e4567-e89b-12d3-a456-426655440000"
    );
    assert_eq!(headers.get("apns-expiration").unwrap(), "1700000000");
    assert_eq!(headers.get("apns-priority").unwrap(), "5");
    assert_eq!(headers.get("apns-topic").unwrap(), "com.example.app");
    assert_eq!(headers.get("apns-collapse-id").unwrap(), "score-update");
}

#[tokio::test]
async fn test_requests_share_one_serialized_body() {
    let (body_tx, mut body_rx) = tokio::sync::mpsc::channel::<axum::body::Bytes>(3);
    let app = Router::new().route(
        "/3/device/{token}",
        post(move |body: axum::body::Bytes| {
            let body_tx = body_tx.clone();
            async move {
                body_tx.send(body).await.unwrap();
                StatusCode::OK
            }
        }),
    );
    let connection = connection_to(app).await;

    let tokens: Vec<String> = ["a", "b", "c"].into_iter().map(String::from).collect();
    let mut stream = connection.dispatch(message(), &tokens);
    while let Some(outcome) = stream.next().await {
        assert!(outcome.delivered());
    }

    let first = body_rx.recv().await.unwrap();
    let parsed: serde_json::Value = serde_json::from_slice(&first).unwrap();
    assert_eq!(parsed["aps"]["alert"]["title"], "title");
    for _ in 0..2 {
        assert_eq!(body_rx.recv().await.unwrap(), first);
    }
}

#[tokio::test]
async fn test_non_json_error_body_is_a_decode_failure() {
    let app = Router::new().route(
        "/3/device/{token}",
        post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "not json") }),
    );
    let connection = connection_to(app).await;

    let mut stream = connection.dispatch(message(), &["1234567890".to_string()]);

    let outcome = stream.next().await.unwrap();
    assert_eq!(outcome.status, Some(reqwest::StatusCode::INTERNAL_SERVER_ERROR));
    assert!(matches!(outcome.error, Some(PushError::Decode(_))));
    assert!(stream.next().await.is_none());
}

#[tokio::test]
async fn test_transport_failure_has_no_status() {
    // Bind and immediately drop a listener to get a port that refuses
    // connections.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let mut connection = Connection::with_client(reqwest::Client::new());
    connection.set_host(format!("http://{addr}"));

    let mut stream = connection.dispatch(message(), &["1234567890".to_string()]);

    let outcome = stream.next().await.unwrap();
    assert_eq!(outcome.status, None);
    assert!(matches!(outcome.error, Some(PushError::Transport(_))));
    assert!(!outcome.delivered());
    assert!(stream.next().await.is_none());
}

#[tokio::test]
async fn test_one_failing_token_does_not_abort_the_batch() {
    let app = Router::new().route(
        "/3/device/{token}",
        post(|Path(token): Path<String>| async move {
            if token == "gone" {
                (
                    StatusCode::GONE,
                    Json(json!({"reason": "Unregistered"})).into_response(),
                )
            } else {
                (StatusCode::OK, ().into_response())
            }
        }),
    );
    let connection = connection_to(app).await;

    let tokens = vec!["good".to_string(), "gone".to_string()];
    let mut stream = connection.dispatch(message(), &tokens);

    let mut delivered = 0;
    let mut failed = 0;
    while let Some(outcome) = stream.next().await {
        if outcome.delivered() {
            assert_eq!(outcome.token, "good");
            delivered += 1;
        } else {
            assert_eq!(outcome.token, "gone");
            assert_eq!(
                outcome.error.as_ref().and_then(PushError::kind),
                Some(ErrorKind::Unregistered)
            );
            failed += 1;
        }
    }
    assert_eq!((delivered, failed), (1, 1));
}

#[tokio::test]
async fn test_unparsable_host_yields_error_outcomes() {
    let mut connection = Connection::with_client(reqwest::Client::new());
    connection.set_host("not a url");

    let mut stream = connection.dispatch(message(), &["1234567890".to_string()]);

    let outcome = stream.next().await.unwrap();
    assert_eq!(outcome.status, None);
    assert!(matches!(outcome.error, Some(PushError::InvalidUrl(_))));
    assert!(stream.next().await.is_none());
}

#[tokio::test]
async fn test_bounded_stream_still_completes() {
    let app = Router::new().route(
        "/3/device/{token}",
        post(|| async { StatusCode::OK }),
    );
    let connection = connection_to(app).await;

    let tokens: Vec<String> = (0..8).map(|i| format!("token-{i}")).collect();
    // Capacity 1: request tasks suspend on the channel until drained.
    let mut stream = connection.dispatch_with_capacity(message(), &tokens, 1);

    let mut count = 0;
    while let Some(outcome) = stream.next().await {
        assert!(outcome.delivered());
        count += 1;
    }
    assert_eq!(count, 8);
}
