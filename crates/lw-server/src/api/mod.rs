use axum::Router;

mod analytics;
mod filters;
mod live;
mod simulate;
mod stats;
mod upload;
mod vehicles;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(vehicles::router())
        .merge(simulate::router())
        .merge(analytics::router())
        .merge(live::router())
        .merge(filters::router())
        .merge(stats::router())
        .merge(upload::router())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use lw_common::config::ServerConfig;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use crate::db;

    const BOUNDARY: &str = "lanewatch-boundary";

    async fn app() -> (Router, AppState) {
        let state = AppState::new(db::test_pool().await, ServerConfig::default());
        let app = Router::new()
            .nest("/api/v1", router())
            .with_state(state.clone());
        (app, state)
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn upload(field: &str, contents: &[u8]) -> Request<Body> {
        let mut body = format!(
            "--{BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"{field}\"; filename=\"sheet.csv\"\r\n\
             Content-Type: text/csv\r\n\r\n"
        )
        .into_bytes();
        body.extend_from_slice(contents);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method("POST")
            .uri("/api/v1/upload")
            .header("content-type", format!("multipart/form-data; boundary={BOUNDARY}"))
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn record_movement_validates_input() {
        let (app, _) = app().await;

        for body in [json!({}), json!({ "rfid": "RFID001" }), json!({ "rfid": " ", "cpid": "L1_CP1" })] {
            let (status, body) = send(&app, post_json("/api/v1/vehicles", body)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body["error"], "RFID and CPID required");
        }

        let (status, body) =
            send(&app, post_json("/api/v1/vehicles", json!({ "rfid": "GHOST", "cpid": "L1_CP1" }))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Invalid RFID");

        let (status, body) =
            send(&app, post_json("/api/v1/vehicles", json!({ "rfid": "RFID001", "cpid": "L9_CP1" }))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Invalid CPID");
    }

    #[tokio::test]
    async fn record_movement_creates_log() {
        let (app, state) = app().await;

        let (status, body) =
            send(&app, post_json("/api/v1/vehicles", json!({ "rfid": "RFID001", "cpid": "L1_CP3" }))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["success"], true);
        assert_eq!(body["message"], "RFID RFID001 logged at L1_CP3");

        let history = db::logs::history(&state.pool, "RFID001").await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].cpid, "L1_CP3");
    }

    #[tokio::test]
    async fn simulate_requires_rfid() {
        let (app, _) = app().await;

        for body in [json!({}), json!({ "rfid": "  " })] {
            let (status, body) = send(&app, post_json("/api/v1/simulate", body)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body["error"], "Missing RFID");
        }

        let (status, _) = send(&app, post_json("/api/v1/simulate", json!({ "rfid": "GHOST" }))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = send(&app, post_json("/api/v1/simulate", json!({ "rfid": "RFID003" }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "moved");
        assert_eq!(body["current_checkpoint"], 1);
    }

    #[tokio::test]
    async fn upload_rejects_bad_sheets() {
        let (app, _) = app().await;

        let (status, body) = send(&app, upload("note", b"rfid,cpid,timestamp\n")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "No file uploaded");

        let (status, body) = send(&app, upload("file", b"rfid,time\nRFID001,now\n")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Missing columns: cpid, timestamp");

        let (status, body) = send(&app, upload("file", b"rfid,cpid,timestamp\n\xff\xfe,L1_CP1,x\n")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "File must be UTF-8 CSV");
    }

    #[tokio::test]
    async fn upload_ingests_sheet() {
        let (app, state) = app().await;

        let sheet = b"rfid,cpid,timestamp\nRFID001,L1_CP1,2025-03-01 08:30:00\nGHOST,L1_CP1,2025-03-01 08:31:00\n";
        let (status, body) = send(&app, upload("file", sheet)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Upload Complete");
        assert_eq!(body["inserted"], 1);
        assert_eq!(body["skipped"], 1);

        assert_eq!(db::logs::history(&state.pool, "RFID001").await.unwrap().len(), 1);
    }
}
