use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use async_trait::async_trait;
use axum::{
    extract::{FromRequest, Request, State},
    http::{header, HeaderName, Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use server_api::{relay_contact, ApiContext, RelayResult};
use shared::{
    error::{MISSING_FIELDS_MESSAGE, PAYLOAD_TOO_LARGE_MESSAGE},
    protocol::{ContactRequest, RelayResponse, ServiceStatus, CONTACT_ROUTE, HEALTH_ROUTE, STATUS_ROUTE},
};
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod config;
mod smtp;

use config::load_settings;
use smtp::SmtpMailer;

const MAX_BODY_BYTES: usize = 64 * 1024;

#[derive(Clone)]
struct AppState {
    api: ApiContext,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = load_settings();
    let account = settings.mail_account()?;
    let mailer = SmtpMailer::new(&settings, &account).context("failed to configure SMTP transport")?;

    let api = ApiContext {
        mailer: Arc::new(mailer),
        identity: settings.relay_identity(&account),
    };

    match api.mailer.verify().await {
        Ok(()) => info!(
            smtp_host = %settings.smtp_host,
            smtp_port = settings.smtp_port(),
            "mail transport ready"
        ),
        Err(error) => error!(
            smtp_host = %settings.smtp_host,
            %error,
            "mail transport verification failed; sends will still be attempted"
        ),
    }

    let app = build_router(Arc::new(AppState { api }));

    let addr: SocketAddr = settings
        .server_bind
        .parse()
        .with_context(|| format!("invalid bind address '{}'", settings.server_bind))?;
    info!(%addr, status = STATUS_ROUTE, contact = CONTACT_ROUTE, "server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(STATUS_ROUTE, get(status))
        .route(HEALTH_ROUTE, get(healthz))
        .route(CONTACT_ROUTE, post(send_contact))
        .with_state(state)
        .layer(middleware::from_fn(answer_options))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(middleware::from_fn(payload_too_large_as_json))
        .layer(middleware::from_fn(log_request))
        .layer(cors())
}

fn cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::ORIGIN,
            HeaderName::from_static("x-requested-with"),
            header::CONTENT_TYPE,
            header::ACCEPT,
        ])
}

/// Any OPTIONS request is answered directly, preflight or not.
async fn answer_options(request: Request, next: Next) -> Response {
    if request.method() == Method::OPTIONS {
        return StatusCode::OK.into_response();
    }
    next.run(request).await
}

/// Rewrites any 413, whether from the declared length or from reading the
/// body, into the relay's JSON failure shape.
async fn payload_too_large_as_json(request: Request, next: Next) -> Response {
    let response = next.run(request).await;
    if response.status() != StatusCode::PAYLOAD_TOO_LARGE {
        return response;
    }
    warn!(limit = MAX_BODY_BYTES, "rejecting oversized request body");
    (
        StatusCode::PAYLOAD_TOO_LARGE,
        Json(RelayResponse::failed(PAYLOAD_TOO_LARGE_MESSAGE)),
    )
        .into_response()
}

async fn log_request(request: Request, next: Next) -> Response {
    let origin = request
        .headers()
        .get(header::ORIGIN)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("N/A")
        .to_string();
    info!(method = %request.method(), uri = %request.uri(), %origin, "request");
    next.run(request).await
}

async fn status(State(state): State<Arc<AppState>>) -> Json<ServiceStatus> {
    Json(ServiceStatus::online(&state.api.identity.site_name))
}

async fn healthz() -> &'static str {
    "ok"
}

/// Contact form body, accepted as JSON or urlencoded form data.
struct ContactPayload(ContactRequest);

#[async_trait]
impl<S> FromRequest<S> for ContactPayload
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<RelayResponse>);

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_form = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.starts_with("application/x-www-form-urlencoded"));

        let decoded = if is_form {
            Form::<ContactRequest>::from_request(req, state)
                .await
                .map(|Form(body)| body)
                .map_err(|rejection| (rejection.status(), rejection.body_text()))
        } else {
            Json::<ContactRequest>::from_request(req, state)
                .await
                .map(|Json(body)| body)
                .map_err(|rejection| (rejection.status(), rejection.body_text()))
        };

        decoded.map(Self).map_err(|(status, reason)| {
            if status == StatusCode::PAYLOAD_TOO_LARGE {
                return (status, Json(RelayResponse::failed(PAYLOAD_TOO_LARGE_MESSAGE)));
            }
            warn!(%reason, "rejecting undecodable contact body");
            (
                StatusCode::BAD_REQUEST,
                Json(RelayResponse::failed(MISSING_FIELDS_MESSAGE)),
            )
        })
    }
}

async fn send_contact(
    State(state): State<Arc<AppState>>,
    ContactPayload(request): ContactPayload,
) -> (StatusCode, Json<RelayResponse>) {
    let result = relay_contact(&state.api, &request).await;
    let status = match &result {
        RelayResult::Rejected(_) => StatusCode::BAD_REQUEST,
        RelayResult::Dispatched(outcome) if outcome.is_complete() => StatusCode::OK,
        RelayResult::Dispatched(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(result.response()))
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
