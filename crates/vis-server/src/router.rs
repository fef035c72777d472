use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;
use vis_ledger::LedgerService;

use crate::handler;

/// Shared handler state.
#[derive(Clone, Debug)]
pub struct AppState {
    pub ledger: Arc<LedgerService>,
}

/// Build the axum router with all vis endpoints.
pub fn build_router(ledger: Arc<LedgerService>) -> Router {
    Router::new()
        .route("/api/v1/version", get(handler::badge_handler))
        .route("/api/v1/version/raw", get(handler::raw_handler))
        .route("/api/v1/version/prepare", post(handler::prepare_handler))
        .route("/api/v1/version/commit", post(handler::commit_handler))
        .route("/api/v1/version/rollback", post(handler::rollback_handler))
        .route("/api/v1/repos", get(handler::repos_handler))
        .route("/v1/health", get(handler::health_handler))
        .route("/v1/info", get(handler::info_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { ledger })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Method, Request, StatusCode};
    use axum::response::Response;
    use tower::util::ServiceExt;
    use vis_store::{SqliteLedgerStore, StoreError};
    use vis_types::{MachineIdentity, ObjectIdGenerator, RepoSummary};

    const RELEASE_RAW: &str =
        "/api/v1/version/raw?namespace=acme&repo=widget&version_type=release";
    const NIGHTLY_BADGE: &str = "/api/v1/version?namespace=acme&repo=widget&version_type=nightly";
    const UNKNOWN_TYPE_BADGE: &str =
        "/api/v1/version?namespace=acme&repo=widget&version_type=banana";

    fn ids() -> ObjectIdGenerator {
        ObjectIdGenerator::with_seed(MachineIdentity::from_parts([0x10, 0x20, 0x30], 9), 0)
    }

    fn app() -> Router {
        build_router(Arc::new(LedgerService::in_memory(ids())))
    }

    fn sqlite_app() -> Router {
        let store = SqliteLedgerStore::open_in_memory().unwrap();
        build_router(Arc::new(LedgerService::new(Arc::new(store), Arc::new(ids()))))
    }

    async fn get(app: &Router, uri: &str) -> Response {
        app.clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    async fn post_json(app: &Router, uri: &str, body: serde_json::Value) -> Response {
        app.clone()
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri(uri)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    async fn text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    async fn prepare(app: &Router, version_type: &str, version: &str) -> String {
        let response = post_json(
            app,
            "/api/v1/version/prepare",
            serde_json::json!({
                "namespace": "acme",
                "repo_id": "widget",
                "version_type": version_type,
                "version": version,
            }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        text(response).await
    }

    #[tokio::test]
    async fn prepare_commit_then_raw() {
        for app in [app(), sqlite_app()] {
            let tx = prepare(&app, "release", "1.2.3").await;
            assert_eq!(tx.len(), 24);

            let before = get(&app, RELEASE_RAW).await;
            assert_eq!(text(before).await, "n/a");

            let response =
                post_json(&app, "/api/v1/version/commit", serde_json::json!({ "tx_id": tx })).await;
            assert_eq!(response.status(), StatusCode::OK);
            assert_eq!(text(response).await, "OK");

            let after = get(&app, RELEASE_RAW).await;
            assert_eq!(after.status(), StatusCode::OK);
            assert_eq!(text(after).await, "1.2.3");
        }
    }

    #[tokio::test]
    async fn second_commit_is_404() {
        let app = app();
        let tx = prepare(&app, "patch", "1.0.1").await;
        let body = serde_json::json!({ "tx_id": tx });
        assert_eq!(
            post_json(&app, "/api/v1/version/commit", body.clone()).await.status(),
            StatusCode::OK
        );
        assert_eq!(
            post_json(&app, "/api/v1/version/commit", body).await.status(),
            StatusCode::NOT_FOUND
        );
    }

    #[tokio::test]
    async fn missing_tx_id_is_400() {
        let app = app();
        for body in [serde_json::json!({ "tx_id": "  " }), serde_json::json!({})] {
            let response = post_json(&app, "/api/v1/version/commit", body).await;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        }
    }

    #[tokio::test]
    async fn unknown_tx_id_is_404_whatever_its_shape() {
        let app = app();
        for tx_id in ["nope", "65000000aabbccddee000001", "65000000aabbccddee0000011"] {
            let response =
                post_json(&app, "/api/v1/version/commit", serde_json::json!({ "tx_id": tx_id }))
                    .await;
            assert_eq!(response.status(), StatusCode::NOT_FOUND, "tx_id {tx_id}");
        }
    }

    #[tokio::test]
    async fn unknown_type_on_prepare_is_400() {
        let app = app();
        let response = post_json(
            &app,
            "/api/v1/version/prepare",
            serde_json::json!({
                "namespace": "acme",
                "repo_id": "widget",
                "version_type": "banana",
                "version": "1.0.0",
                "auto_commit": true,
            }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = serde_json::from_str(&text(response).await).unwrap();
        assert_eq!(body["code"], 400);

        let repos = get(&app, "/api/v1/repos").await;
        let repos: Vec<RepoSummary> = serde_json::from_str(&text(repos).await).unwrap();
        assert!(repos.is_empty());
    }

    #[tokio::test]
    async fn badge_has_svg_headers() {
        let app = app();
        let tx = prepare(&app, "nightly", "20240101").await;
        post_json(&app, "/api/v1/version/commit", serde_json::json!({ "tx_id": tx })).await;

        let response = get(&app, NIGHTLY_BADGE).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "image/svg+xml");
        assert_eq!(response.headers()[header::CACHE_CONTROL], "no-cache,max-age=0");
        let svg = text(response).await;
        assert!(svg.contains(">20240101</text>"));
        assert!(svg.contains("#8d4bae"));
    }

    #[tokio::test]
    async fn badge_for_unknown_type_shows_placeholder() {
        let app = app();
        let response = get(&app, UNKNOWN_TYPE_BADGE).await;
        assert_eq!(response.status(), StatusCode::OK);
        let svg = text(response).await;
        assert!(svg.contains(">n/a</text>"));
        assert!(svg.contains(vis_types::DEFAULT_BADGE_COLOR));
    }

    #[tokio::test]
    async fn blank_repo_is_404() {
        let app = app();
        assert_eq!(get(&app, "/api/v1/version").await.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            get(&app, "/api/v1/version/raw?repo=%20").await.status(),
            StatusCode::NOT_FOUND
        );
    }

    #[tokio::test]
    async fn auto_commit_and_default_namespace() {
        let app = app();
        let response = post_json(
            &app,
            "/api/v1/version/prepare",
            serde_json::json!({
                "namespace": "default",
                "repo_id": "widget",
                "version": "0.1.0-dev",
                "auto_commit": true,
            }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let raw = get(&app, "/api/v1/version/raw?repo=widget").await;
        assert_eq!(text(raw).await, "0.1.0-dev");
    }

    #[tokio::test]
    async fn rollback_clears_slot() {
        let app = app();
        let tx = prepare(&app, "release", "9.9.9").await;
        post_json(&app, "/api/v1/version/commit", serde_json::json!({ "tx_id": tx })).await;

        let response = post_json(
            &app,
            "/api/v1/version/rollback",
            serde_json::json!({
                "namespace": "acme",
                "repo_id": "widget",
                "version_type": "release",
            }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body: serde_json::Value = serde_json::from_str(&text(response).await).unwrap();
        assert_eq!(body["removed"], 1);

        let raw = get(&app, RELEASE_RAW).await;
        assert_eq!(text(raw).await, "n/a");
    }

    #[tokio::test]
    async fn repos_lists_summaries() {
        let app = app();
        let tx = prepare(&app, "release", "1.0.0").await;
        post_json(&app, "/api/v1/version/commit", serde_json::json!({ "tx_id": tx })).await;
        prepare(&app, "patch", "staged-only").await;

        let response = get(&app, "/api/v1/repos").await;
        assert_eq!(response.status(), StatusCode::OK);
        let body: serde_json::Value = serde_json::from_str(&text(response).await).unwrap();
        assert_eq!(body[0]["namespace"], "acme");
        assert_eq!(body[0]["cnt_release"], 1);
        assert_eq!(body[0]["cnt_patch"], 0);
        assert_eq!(body[0]["last_value"], "1.0.0");
    }

    #[tokio::test]
    async fn health_body() {
        let body = text(get(&app(), "/v1/health").await).await;
        assert_eq!(body, r#"{"status":"ok"}"#);
    }

    struct FailingStore;

    impl vis_store::LedgerStore for FailingStore {
        fn insert(&self, _: &vis_types::VersionRecord) -> vis_store::StoreResult<()> {
            Err(StoreError::LockPoisoned)
        }
        fn commit_staged(&self, _: &vis_types::ObjectId) -> vis_store::StoreResult<bool> {
            Err(StoreError::LockPoisoned)
        }
        fn get(
            &self,
            _: &vis_types::ObjectId,
        ) -> vis_store::StoreResult<Option<vis_types::VersionRecord>> {
            Err(StoreError::LockPoisoned)
        }
        fn latest_committed(
            &self,
            _: &vis_types::SlotKey,
        ) -> vis_store::StoreResult<Option<vis_types::VersionRecord>> {
            Err(StoreError::LockPoisoned)
        }
        fn delete_slot(&self, _: &vis_types::SlotKey) -> vis_store::StoreResult<u64> {
            Err(StoreError::LockPoisoned)
        }
        fn summaries(&self) -> vis_store::StoreResult<Vec<RepoSummary>> {
            Err(StoreError::LockPoisoned)
        }
    }

    #[tokio::test]
    async fn storage_failure_is_opaque_500() {
        let app = build_router(Arc::new(LedgerService::new(
            Arc::new(FailingStore),
            Arc::new(ids()),
        )));
        let response = get(&app, "/api/v1/version/raw?repo=widget").await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = text(response).await;
        assert!(!body.contains("lock"));
        assert!(body.contains("Internal Server Error"));
    }
}
