//! HTTP surface tests against an in-memory engine with no back-ends.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::{AssetId, RequestId};
use motiongen_engine::{Engine, EngineConfig};
use motiongen_server::router;
use tower::ServiceExt;

fn test_engine(tmp: &std::path::Path) -> Engine {
    Engine::new(EngineConfig {
        output_root: tmp.join("output"),
        model_store_root: tmp.join("model_store"),
        backends: Vec::new(),
    })
    .expect("engine")
}

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json body")
}

#[tokio::test]
async fn alive_responds() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let app = router(test_engine(tmp.path()));

    let response = app
        .oneshot(Request::get("/alive").body(Body::empty()).expect("request"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn upload_then_generate_round_trip() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let app = router(test_engine(tmp.path()));

    let response = app
        .clone()
        .oneshot(
            Request::post("/upload_model")
                .body(Body::from("model bytes"))
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let asset_id: AssetId = body_json(response).await;

    let uri = format!("/generate?motion_description=walk_forward&durs=2.0&model_id={asset_id}");
    let response = app
        .clone()
        .oneshot(Request::get(&uri).body(Body::empty()).expect("request"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let request_id: RequestId = body_json(response).await;

    let response = app
        .oneshot(
            Request::get(&format!("/status/{request_id}"))
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn generate_with_unknown_model_is_bad_request() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let app = router(test_engine(tmp.path()));

    let uri = format!(
        "/generate?motion_description=walk_forward&model_id={}",
        AssetId::new()
    );
    let response = app
        .oneshot(Request::get(&uri).body(Body::empty()).expect("request"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn status_of_unknown_request_is_not_found() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let app = router(test_engine(tmp.path()));

    let response = app
        .oneshot(
            Request::get(&format!("/status/{}", RequestId::new()))
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn download_of_unknown_request_is_not_found() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let app = router(test_engine(tmp.path()));

    let response = app
        .oneshot(
            Request::get(&format!("/download/{}", RequestId::new()))
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn download_of_unfinished_request_is_too_early() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let engine = test_engine(tmp.path());
    let app = router(engine.clone());

    // Sabotaging the output root pins the request in FAILED, which is
    // deterministic and still gated away from download.
    std::fs::remove_dir_all(tmp.path().join("output")).expect("clear output root");
    std::fs::write(tmp.path().join("output"), b"in the way").expect("blocker");

    let request_id = engine.submit("walk forward", vec![], None).expect("submit");
    for _ in 0..100 {
        if engine
            .poll_status(&request_id)
            .is_some_and(|s| s.is_terminal())
        {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }

    let response = app
        .oneshot(
            Request::get(&format!("/download/{request_id}"))
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::TOO_EARLY);
}
