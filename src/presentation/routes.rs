// Router assembly
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{
    activate_dataset, dashboard, get_filter, health_check, ingest_sample, list_alarms,
    list_history, login, logout, put_filter, reset_alarms, start_simulation, stop_simulation,
    upload,
};
use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(health_check))
        .route("/session/login", post(login))
        .route("/session/logout", post(logout))
        .route("/history", get(list_history))
        .route("/upload", post(upload))
        .route("/datasets/sample", post(ingest_sample))
        .route("/datasets/:id/activate", post(activate_dataset))
        .route("/filter", get(get_filter).put(put_filter))
        .route("/dashboard", get(dashboard))
        .route("/simulation/start", post(start_simulation))
        .route("/simulation/stop", post(stop_simulation))
        .route("/alarms", get(list_alarms).delete(reset_alarms))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::dataset_source::DatasetSource;
    use crate::application::history_store::HistoryStore;
    use crate::application::session::SessionManager;
    use crate::infrastructure::blob_store::MemoryBlobStore;
    use crate::infrastructure::config::AppConfig;
    use crate::infrastructure::local_source::LocalSource;
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use http_body_util::BodyExt;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    const BOUNDARY: &str = "plantboundary";

    fn app() -> Router {
        let history = HistoryStore::new(Arc::new(MemoryBlobStore::new()), "k", 5);
        let source: Arc<dyn DatasetSource> = Arc::new(LocalSource::new(history));
        let state = Arc::new(AppState {
            sessions: SessionManager::new(source, AppConfig::default()),
        });
        build_router(state)
    }

    async fn call(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn empty_request(method: &str, uri: &str) -> Request<Body> {
        Request::builder().method(method).uri(uri).body(Body::empty()).unwrap()
    }

    fn upload_request(filename: &str, content: &[u8]) -> Request<Body> {
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{f}\"\r\nContent-Type: text/csv\r\n\r\n",
                b = BOUNDARY,
                f = filename
            )
            .as_bytes(),
        );
        body.extend_from_slice(content);
        body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());

        Request::builder()
            .method("POST")
            .uri("/upload")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn logged_in() -> Router {
        let app = app();
        let (status, _) = call(&app, json_request("POST", "/session/login", json!({"username": "operator"}))).await;
        assert_eq!(status, StatusCode::OK);
        app
    }

    #[tokio::test]
    async fn test_requires_session() {
        let app = app();
        let (status, body) = call(&app, empty_request("GET", "/dashboard")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body["error"].as_str().unwrap().contains("log in"));

        let (status, _) = call(&app, json_request("POST", "/session/login", json!({"username": "  "}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_upload_then_filtered_dashboard() {
        let app = logged_in().await;

        let csv = b"Equipment,Type,Flowrate,Pressure,Temperature\nPump A,Pump,450.5,12.4,85.0\nPump B,Pump,480.2,13.1,88.5";
        let (status, entry) = call(&app, upload_request("pumps.csv", csv)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(entry["summary"]["avgFlowrate"], 465.35);
        assert_eq!(entry["summary"]["typeDistribution"]["Pump"], 2);

        let filter = json!({
            "minFlow": 0, "maxFlow": 460, "minPressure": 0, "maxPressure": 100,
            "pressureThreshold": 40, "selectedTypes": []
        });
        let (status, _) = call(&app, json_request("PUT", "/filter", filter)).await;
        assert_eq!(status, StatusCode::OK);

        let (status, view) = call(&app, empty_request("GET", "/dashboard")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(view["datasetId"], entry["id"]);
        assert_eq!(view["records"].as_array().unwrap().len(), 1);
        assert_eq!(view["records"][0]["name"], "Pump A");
        assert_eq!(view["summary"]["totalCount"], 1);

        let (_, history) = call(&app, empty_request("GET", "/history")).await;
        assert_eq!(history["history"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_upload_rejections() {
        let app = logged_in().await;

        let (status, _) = call(&app, upload_request("plant.xlsx", b"a,b")).await;
        assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);

        let (status, body) = call(&app, upload_request("plant.csv", &[0xff, 0xfe, 0xfd])).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["error"].as_str().unwrap().contains("plant.csv"));
    }

    #[tokio::test]
    async fn test_simulation_lifecycle() {
        let app = logged_in().await;

        let (status, _) = call(&app, empty_request("POST", "/simulation/start")).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, sample) = call(&app, empty_request("POST", "/datasets/sample")).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(sample["data"].as_array().unwrap().len(), 8);

        let (status, body) = call(&app, empty_request("POST", "/simulation/start")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["running"], true);

        let (_, view) = call(&app, empty_request("GET", "/dashboard")).await;
        assert_eq!(view["simulating"], true);
        assert_eq!(view["records"][0]["history"]["flow"].as_array().unwrap().len(), 1);

        let (_, body) = call(&app, empty_request("POST", "/simulation/stop")).await;
        assert_eq!(body["running"], false);

        let (status, _) = call(&app, empty_request("DELETE", "/alarms")).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (_, alarms) = call(&app, empty_request("GET", "/alarms")).await;
        assert_eq!(alarms, json!([]));
    }

    #[tokio::test]
    async fn test_activate_and_logout() {
        let app = logged_in().await;

        let (status, _) = call(&app, empty_request("POST", "/datasets/ds-nope/activate")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (_, sample) = call(&app, empty_request("POST", "/datasets/sample")).await;
        let uri = format!("/datasets/{}/activate", sample["id"].as_str().unwrap());
        let (status, _) = call(&app, empty_request("POST", &uri)).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) = call(&app, empty_request("POST", "/session/logout")).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = call(&app, empty_request("GET", "/history")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
