use super::*;
use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, StatusCode},
    routing::{get, post},
    Json, Router,
};
use shared::{
    error::{INVALID_EMAIL_MESSAGE, MISSING_FIELDS_MESSAGE, RELAY_FAILURE_MESSAGE, RELAY_SUCCESS_MESSAGE},
    protocol::{CONTACT_ROUTE, STATUS_ROUTE},
};
use tokio::{net::TcpListener, sync::Mutex};

use crate::{controller::SERVER_OFFLINE_MESSAGE, form::SENDING_LABEL};

#[derive(Clone)]
struct RelayServerState {
    reply_status: StatusCode,
    reply_body: String,
    posts: Arc<Mutex<Vec<serde_json::Value>>>,
    probes: Arc<Mutex<u32>>,
}

async fn handle_status(State(state): State<RelayServerState>) -> &'static str {
    *state.probes.lock().await += 1;
    "{\"message\":\"up\",\"status\":\"online\"}"
}

async fn handle_contact(
    State(state): State<RelayServerState>,
    Json(body): Json<serde_json::Value>,
) -> (StatusCode, [(header::HeaderName, &'static str); 1], String) {
    state.posts.lock().await.push(body);
    (
        state.reply_status,
        [(header::CONTENT_TYPE, "application/json")],
        state.reply_body.clone(),
    )
}

async fn spawn_relay_server(
    reply_status: StatusCode,
    reply_body: String,
) -> (String, RelayServerState) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let state = RelayServerState {
        reply_status,
        reply_body,
        posts: Arc::new(Mutex::new(Vec::new())),
        probes: Arc::new(Mutex::new(0)),
    };
    let app = Router::new()
        .route(STATUS_ROUTE, get(handle_status))
        .route(CONTACT_ROUTE, post(handle_contact))
        .with_state(state.clone());
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (format!("http://{addr}"), state)
}

fn relay_body(success: bool, message: &str) -> String {
    serde_json::json!({ "success": success, "message": message }).to_string()
}

fn filled_form() -> ContactForm {
    ContactForm {
        name: "  Ana ".into(),
        email: "ana@x.com ".into(),
        phone: String::new(),
        message: "Oi\n".into(),
    }
}

/// Loopback client that ignores any proxy configured in the environment.
fn loopback_client(server_url: &str) -> RelayClient {
    let http = reqwest::Client::builder()
        .no_proxy()
        .build()
        .expect("http client");
    RelayClient::with_http_client(server_url, http).expect("client")
}

fn controller_for(server_url: &str) -> FormController {
    FormController::new(loopback_client(server_url))
}

#[tokio::test]
async fn empty_message_never_issues_a_request() {
    let (server_url, state) =
        spawn_relay_server(StatusCode::OK, relay_body(true, RELAY_SUCCESS_MESSAGE)).await;
    let mut controller = controller_for(&server_url);
    controller.form = ContactForm {
        message: "   ".into(),
        ..filled_form()
    };

    let outcome = controller.submit().await;

    assert_eq!(
        outcome,
        SubmitOutcome::Rejected(shared::error::SubmissionError::MissingRequiredField)
    );
    let banner = controller.feedback.current().expect("banner");
    assert_eq!(banner.kind, BannerKind::Error);
    assert_eq!(banner.text, MISSING_FIELDS_MESSAGE);
    assert!(controller.submit.is_enabled());
    assert!(state.posts.lock().await.is_empty());
    assert_eq!(*state.probes.lock().await, 0);
}

#[tokio::test]
async fn malformed_email_is_rejected_locally() {
    let (server_url, state) =
        spawn_relay_server(StatusCode::OK, relay_body(true, RELAY_SUCCESS_MESSAGE)).await;
    let mut controller = controller_for(&server_url);
    controller.form = ContactForm {
        email: "ana@x".into(),
        ..filled_form()
    };

    let outcome = controller.submit().await;

    assert_eq!(
        outcome,
        SubmitOutcome::Rejected(shared::error::SubmissionError::InvalidEmail)
    );
    assert_eq!(
        controller.feedback.current().expect("banner").text,
        INVALID_EMAIL_MESSAGE
    );
    assert!(state.posts.lock().await.is_empty());
}

#[tokio::test]
async fn success_clears_form_and_restores_submit_control() {
    let (server_url, state) =
        spawn_relay_server(StatusCode::OK, relay_body(true, RELAY_SUCCESS_MESSAGE)).await;
    let mut controller = controller_for(&server_url);
    controller.form = filled_form();

    let outcome = controller.submit().await;

    assert_eq!(outcome, SubmitOutcome::Sent);
    assert_eq!(controller.form, ContactForm::default());
    assert!(controller.submit.is_enabled());
    assert_ne!(controller.submit.label(), SENDING_LABEL);

    let banner = controller.feedback.current().expect("banner");
    assert_eq!(banner.kind, BannerKind::Success);
    assert_eq!(banner.text, RELAY_SUCCESS_MESSAGE);

    let posts = state.posts.lock().await;
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0]["nome"], "Ana");
    assert_eq!(posts[0]["email"], "ana@x.com");
    assert_eq!(posts[0]["telefone"], "");
    assert_eq!(posts[0]["mensagem"], "Oi");
    assert_eq!(*state.probes.lock().await, 1);
}

#[tokio::test]
async fn server_failure_preserves_form_and_shows_server_text() {
    let (server_url, state) = spawn_relay_server(
        StatusCode::INTERNAL_SERVER_ERROR,
        relay_body(false, RELAY_FAILURE_MESSAGE),
    )
    .await;
    let mut controller = controller_for(&server_url).without_probe();
    controller.form = filled_form();

    let outcome = controller.submit().await;

    assert_eq!(outcome, SubmitOutcome::Failed);
    assert_eq!(controller.form, filled_form());
    assert!(controller.submit.is_enabled());
    let banner = controller.feedback.current().expect("banner");
    assert_eq!(banner.kind, BannerKind::Error);
    assert_eq!(banner.text, RELAY_FAILURE_MESSAGE);
    assert_eq!(*state.probes.lock().await, 0);
}

#[tokio::test]
async fn success_status_with_false_flag_is_a_failure() {
    let (server_url, _state) =
        spawn_relay_server(StatusCode::OK, relay_body(false, "recusado")).await;
    let mut controller = controller_for(&server_url);
    controller.form = filled_form();

    assert_eq!(controller.submit().await, SubmitOutcome::Failed);
    assert_eq!(controller.form, filled_form());
    assert_eq!(controller.feedback.current().expect("banner").text, "recusado");
}

#[tokio::test]
async fn non_json_error_falls_back_to_generic_message() {
    let (server_url, _state) =
        spawn_relay_server(StatusCode::BAD_GATEWAY, "<html>bad gateway</html>".into()).await;
    let mut controller = controller_for(&server_url);
    controller.form = filled_form();

    assert_eq!(controller.submit().await, SubmitOutcome::Failed);
    assert_eq!(
        controller.feedback.current().expect("banner").text,
        controller::DEFAULT_FAILURE_MESSAGE
    );
}

async fn closed_server_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);
    format!("http://{addr}")
}

#[tokio::test]
async fn unreachable_backend_reports_server_offline() {
    let server_url = closed_server_url().await;
    let mut controller = controller_for(&server_url);
    controller.form = filled_form();

    assert_eq!(controller.submit().await, SubmitOutcome::Failed);
    assert_eq!(
        controller.feedback.current().expect("banner").text,
        SERVER_OFFLINE_MESSAGE
    );
    assert_eq!(controller.form, filled_form());
    assert!(controller.submit.is_enabled());
}

#[tokio::test]
async fn refused_post_without_probe_is_classified_offline() {
    let server_url = closed_server_url().await;
    let client = loopback_client(&server_url);
    let submission = filled_form().validate().expect("valid");

    let err = client.submit(&submission).await.expect_err("refused");
    assert_eq!(classify_transport_failure(&err.to_string()), SERVER_OFFLINE_MESSAGE);
}

#[test]
fn classification_distinguishes_offline_network_and_other() {
    assert_eq!(
        classify_transport_failure("error sending request: tcp connect error: Connection refused"),
        SERVER_OFFLINE_MESSAGE
    );
    assert!(classify_transport_failure("operation timed out").contains("internet"));
    assert_eq!(
        classify_transport_failure("invalid certificate"),
        "Erro ao conectar com o servidor. invalid certificate"
    );
}

#[test]
fn server_url_keeps_path_prefix() {
    let client = RelayClient::new("https://example.com/relay").expect("client");
    assert_eq!(client.server_url().as_str(), "https://example.com/relay/");
    assert!(RelayClient::new("not a url").is_err());
}
