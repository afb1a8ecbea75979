//! Axum application setup.

use axum::{extract::DefaultBodyLimit, routing::get, Router};
use tower_http::cors::{Any, CorsLayer};

use super::handlers;
use super::state::AppState;

/// Largest accepted upload.
const MAX_UPLOAD_BYTES: usize = 256 * 1024 * 1024;

/// Create the Axum router with all routes.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new().route(
        "/files",
        get(handlers::list_files)
            .post(handlers::upload_file)
            .patch(handlers::update_file),
    );

    Router::new()
        .nest("/api", api_routes)
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(cors)
        .with_state(state)
}

/// Start the web server and run until Ctrl+C.
pub async fn run_server(
    state: AppState,
    host: &str,
    port: u16,
) -> Result<(), Box<dyn std::error::Error>> {
    let app = create_router(state);
    let listener = tokio::net::TcpListener::bind((host, port)).await?;

    tracing::info!(addr = %listener.local_addr()?, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
        })
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{header, Method, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use typecast::{Engine, MemoryStore, ResultStore};

    use super::*;

    const BOUNDARY: &str = "typecast-test-boundary";

    fn test_state() -> (AppState, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let state = AppState::new(Engine::new(), store.clone());
        (state, store)
    }

    fn multipart_request(field: &str, file_name: &str, content: &str) -> Request<Body> {
        let body = format!(
            "--{BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\n\
             Content-Type: application/octet-stream\r\n\
             \r\n\
             {content}\r\n\
             --{BOUNDARY}--\r\n"
        );
        Request::builder()
            .method(Method::POST)
            .uri("/api/files")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn send(state: AppState, request: Request<Body>) -> (StatusCode, Value) {
        let response = create_router(state).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_upload_runs_job() {
        let (state, store) = test_state();
        let request = multipart_request("file", "people.csv", "age,member\n31,yes\n42,no\n57,yes\n68,no");

        let (status, body) = send(state, request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["dtypes"], json!({"age": "Number", "member": "Boolean"}));
        let id = body["id"].as_u64().unwrap();
        assert!(store.get(id).unwrap().completed);
    }

    #[tokio::test]
    async fn test_upload_without_file_field() {
        let (state, _) = test_state();
        let request = multipart_request("attachment", "people.csv", "age\n31\n");

        let (status, body) = send(state, request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"error": "File not provided"}));
    }

    #[tokio::test]
    async fn test_unsupported_upload_is_recorded_as_failed() {
        let (state, store) = test_state();
        let request = multipart_request("file", "notes.txt", "hello");

        let (status, body) = send(state, request).await;

        assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert_eq!(body["error"], "unsupported_format");
        let listing = store.list().unwrap();
        assert_eq!(listing.len(), 1);
        assert!(!store.get(listing[0].id).unwrap().completed);
    }

    #[tokio::test]
    async fn test_list_and_update() {
        let (state, _) = test_state();
        let upload = multipart_request("file", "people.csv", "age\n31\n42\n57\n68");
        let (_, created) = send(state.clone(), upload).await;
        let id = created["id"].as_u64().unwrap();

        let update = Request::builder()
            .method(Method::PATCH)
            .uri("/api/files")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                json!({"id": id, "dtypes": {"age": "Text"}}).to_string(),
            ))
            .unwrap();
        let (status, body) = send(state.clone(), update).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"message": "Record Updated"}));

        let list = Request::builder()
            .uri("/api/files")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(state, list).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["name"], "people.csv");
        assert_eq!(body[0]["status"], "Success");
        assert_eq!(body[0]["dtypes"]["age"], "Text");
    }

    #[tokio::test]
    async fn test_update_unknown_id() {
        let (state, _) = test_state();
        let update = Request::builder()
            .method(Method::PATCH)
            .uri("/api/files")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json!({"id": 42, "dtypes": {}}).to_string()))
            .unwrap();

        let (status, body) = send(state, update).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "persistence");
    }
}
