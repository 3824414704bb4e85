//! HTTP endpoint tests

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use http_body_util::BodyExt;
use sdm_exporter::authn::handoff::{self, AuthorizationCode, AuthorizationReceiver};
use sdm_exporter::sdm::lifecycle::Readiness;
use sdm_exporter::server::serve::router;
use sdm_exporter::server::state::ServerState;
use sdm_exporter::telemetry::metrics::{DeviceLabels, Metrics};
use tower::ServiceExt;
use url::Url;

struct FixedReadiness(bool);

impl Readiness for FixedReadiness {
    fn is_ready(&self) -> bool {
        self.0
    }
}

fn server_state(ready: bool) -> (Arc<ServerState>, AuthorizationReceiver, Arc<Metrics>) {
    let (sender, receiver) = handoff::channel();
    let metrics = Arc::new(Metrics::new().unwrap());
    let state = ServerState::new(
        "project-1".to_string(),
        "client-1.apps.googleusercontent.com".to_string(),
        Arc::new(FixedReadiness(ready)),
        sender,
        metrics.clone(),
    );
    (Arc::new(state), receiver, metrics)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::HOST, "exporter.lan:8080")
        .body(Body::empty())
        .unwrap()
}

async fn body_text(response: Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn test_health() {
    let (state, _receiver, _metrics) = server_state(false);

    let response = router(state).oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("healthy"));
}

#[tokio::test]
async fn test_authstatus_reflects_readiness() {
    let (state, _receiver, _metrics) = server_state(false);
    let response = router(state).oneshot(get("/authstatus")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "not authorized");

    let (state, _receiver, _metrics) = server_state(true);
    let response = router(state).oneshot(get("/authstatus")).await.unwrap();
    assert_eq!(body_text(response).await, "authorized");
}

#[tokio::test]
async fn test_authorize_redirects_to_consent_page() {
    let (state, _receiver, _metrics) = server_state(false);

    let response = router(state).oneshot(get("/authorize")).await.unwrap();
    assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);

    let location = response
        .headers()
        .get(header::LOCATION)
        .unwrap()
        .to_str()
        .unwrap();
    let url = Url::parse(location).unwrap();
    assert_eq!(url.host_str(), Some("nestservices.google.com"));
    assert_eq!(url.path(), "/partnerconnections/project-1/auth");

    let query: Vec<(String, String)> = url.query_pairs().into_owned().collect();
    let param = |key: &str| {
        query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    };
    assert_eq!(param("access_type"), Some("offline"));
    assert_eq!(param("client_id"), Some("client-1.apps.googleusercontent.com"));
    assert_eq!(param("prompt"), Some("consent"));
    assert_eq!(param("redirect_uri"), Some("http://exporter.lan:8080/authorized"));
    assert_eq!(param("response_type"), Some("code"));
    assert_eq!(
        param("scope"),
        Some("https://www.googleapis.com/auth/sdm.service")
    );
}

#[tokio::test]
async fn test_authorized_without_code_fails() {
    let (state, _receiver, _metrics) = server_state(false);

    let response = router(state).oneshot(get("/authorized")).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body_text(response)
        .await
        .starts_with("no authorization code received from partner connection manager"));
}

#[tokio::test]
async fn test_authorized_with_blank_repeated_code_fails() {
    let (state, _receiver, _metrics) = server_state(false);

    let response = router(state)
        .oneshot(get("/authorized?code=&code=%20&state=xyz"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body_text(response)
        .await
        .starts_with("no authorization code received from partner connection manager"));
}

#[tokio::test]
async fn test_authorized_hands_code_to_consumer() {
    let (state, mut receiver, _metrics) = server_state(false);
    let consumer = tokio::spawn(async move { receiver.recv().await });

    let response = router(state)
        .oneshot(get("/authorized?code=4%2F0Adeu5B"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_text(response).await,
        "authorization code received from partner connection manager"
    );

    let received = consumer.await.unwrap();
    assert_eq!(
        received,
        Some(AuthorizationCode {
            code: "4/0Adeu5B".to_string(),
            redirect_uri: "http://exporter.lan:8080/authorized".to_string(),
        })
    );
}

#[tokio::test]
async fn test_authorized_fails_without_consumer() {
    let (state, receiver, _metrics) = server_state(false);
    drop(receiver);

    let response = router(state)
        .oneshot(get("/authorized?code=abc"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_metrics_exposition() {
    let (state, _receiver, metrics) = server_state(false);

    let labels = DeviceLabels {
        custom_name: "Living Room".to_string(),
        name: "enterprises/project-1/devices/t1".to_string(),
        room: "Hallway".to_string(),
        device_type: "sdm.devices.types.THERMOSTAT".to_string(),
    };
    metrics
        .thermostat
        .humidity
        .with_label_values(&labels.values())
        .set(45.0);

    let response = router(state).oneshot(get("/metrics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        prometheus::TEXT_FORMAT
    );

    let body = body_text(response).await;
    assert!(body.contains("# TYPE sdm_thermostat_humidity_ambientHumidityPercent gauge"));
    assert!(body.contains("Name=\"enterprises/project-1/devices/t1\""));
    assert!(body.contains("} 45"));
}
