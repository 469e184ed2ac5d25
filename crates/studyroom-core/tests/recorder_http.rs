//! HTTP session store against a local mock backend.

use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use mockito::Matcher;
use serde_json::json;

use studyroom_core::{HttpSessionStore, RecordingError, SessionRecorder, SessionStore, StudySession};

fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 4, 26)
        .unwrap()
        .and_hms_opt(h, m, s)
        .unwrap()
}

#[tokio::test]
async fn posts_nested_ids_and_local_timestamps() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/api/sessions")
        .match_header("content-type", "application/json")
        .match_body(Matcher::Json(json!({
            "startTime": "2025-04-26T14:30:00",
            "endTime": "2025-04-26T14:55:00",
            "course": { "id": 3 },
            "topic": { "id": 7 },
            "durationInMinutes": 25
        })))
        .with_status(201)
        .with_header("content-type", "application/json")
        .with_body(r#"{"id":42,"durationInMinutes":25,"course":{"id":3,"name":"Algebra"}}"#)
        .create_async()
        .await;

    let store = HttpSessionStore::new(&server.url()).unwrap();
    let recorder = SessionRecorder::new(Arc::new(store));
    let stored = recorder
        .record(3, 7, at(14, 30, 0), at(14, 55, 0))
        .await
        .unwrap();

    assert_eq!(stored.id, Some(42));
    mock.assert_async().await;
}

#[tokio::test]
async fn partial_minute_is_rounded_up_on_the_wire() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/api/sessions")
        .match_body(Matcher::PartialJson(json!({ "durationInMinutes": 2 })))
        .with_status(200)
        .with_body(r#"{"id":1}"#)
        .create_async()
        .await;

    let store = HttpSessionStore::new(&server.url()).unwrap();
    let session = StudySession::from_interval(1, 2, at(9, 0, 0), at(9, 1, 1)).unwrap();
    store.create_session(&session).await.unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn server_error_is_rejected_with_body() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/api/sessions")
        .with_status(500)
        .with_body("course not found")
        .create_async()
        .await;

    let store = HttpSessionStore::new(&server.url()).unwrap();
    let session = StudySession::from_interval(3, 7, at(9, 0, 0), at(9, 25, 0)).unwrap();
    let err = store.create_session(&session).await.unwrap_err();

    match err {
        RecordingError::Rejected { status, body } => {
            assert_eq!(status, 500);
            assert_eq!(body, "course not found");
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[tokio::test]
async fn garbage_success_body_is_invalid_response() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/api/sessions")
        .with_status(200)
        .with_body("<html>ok</html>")
        .create_async()
        .await;

    let store = HttpSessionStore::new(&server.url()).unwrap();
    let session = StudySession::from_interval(3, 7, at(9, 0, 0), at(9, 25, 0)).unwrap();
    let err = store.create_session(&session).await.unwrap_err();
    assert!(matches!(err, RecordingError::InvalidResponse(_)));
}

#[tokio::test]
async fn unreachable_backend_is_a_network_error() {
    // Nothing listens on port 1.
    let store = HttpSessionStore::new("http://127.0.0.1:1").unwrap();
    let session = StudySession::from_interval(3, 7, at(9, 0, 0), at(9, 25, 0)).unwrap();
    let err = store.create_session(&session).await.unwrap_err();
    assert!(matches!(err, RecordingError::Network(_)));
}

#[tokio::test]
async fn base_path_prefix_is_kept() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/backend/api/sessions")
        .with_status(201)
        .with_body(r#"{"id":5}"#)
        .create_async()
        .await;

    let store = HttpSessionStore::new(&format!("{}/backend", server.url())).unwrap();
    let session = StudySession::from_interval(3, 7, at(9, 0, 0), at(9, 25, 0)).unwrap();
    let stored = store.create_session(&session).await.unwrap();
    assert_eq!(stored.id, Some(5));
    mock.assert_async().await;
}
