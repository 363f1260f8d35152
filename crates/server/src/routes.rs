use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use tracing::{error, info, warn};
use uuid::Uuid;

use taskhub_core::errors::{ApplicationError, InterfaceError};
use taskhub_db::DbPool;
use taskhub_slack::api::SlackApiClient;
use taskhub_slack::blocks::error_message;
use taskhub_slack::commands::{CommandRouter, ServiceError};
use taskhub_slack::payloads::{
    parse_form, EventEnvelope, Interaction, PayloadError, SlashCommandForm,
};
use taskhub_slack::signing::RequestAuthenticator;

use crate::service::StoreTaskService;

const TIMESTAMP_HEADER: &str = "x-slack-request-timestamp";
const SIGNATURE_HEADER: &str = "x-slack-signature";

#[derive(Clone)]
pub struct AppState {
    pub commands: Arc<CommandRouter<StoreTaskService>>,
    pub authenticator: RequestAuthenticator,
    pub notifier: Option<SlackApiClient>,
    pub db_pool: DbPool,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/slack/addtask", post(addtask))
        .route("/slack/showlist", post(showlist))
        .route("/slack/interactive", post(interactive))
        .route("/slack/events", get(events).post(events))
        .route("/slack/home", get(events).post(events))
        .route("/slack/test", get(introspection))
        .with_state(state)
}

/// Signature verification over the raw body bytes, before any parsing. A
/// failure is a hard 401 and never reaches the store.
fn authenticate(
    state: &AppState,
    headers: &HeaderMap,
    body: &[u8],
    correlation_id: &str,
) -> Result<(), Response> {
    let timestamp = headers.get(TIMESTAMP_HEADER).and_then(|value| value.to_str().ok());
    let signature = headers.get(SIGNATURE_HEADER).and_then(|value| value.to_str().ok());

    state
        .authenticator
        .verify(timestamp, signature, body, Utc::now().timestamp())
        .map_err(|rejection| {
            let failure = InterfaceError::AuthenticationFailure {
                message: rejection.to_string(),
                correlation_id: correlation_id.to_owned(),
            };
            warn!(
                event_name = "slack.request.rejected",
                correlation_id,
                reason = %failure,
                "inbound request failed signature verification"
            );
            (StatusCode::UNAUTHORIZED, Json(json!({"error": failure.user_message()})))
                .into_response()
        })
}

/// Malformed payloads on an authenticated request get an ephemeral reply
/// rather than an error status; Slack renders the body either way.
fn payload_rejection(rejection: PayloadError, correlation_id: &str) -> Response {
    warn!(
        event_name = "slack.payload.rejected",
        correlation_id,
        reason = %rejection,
        "authenticated request carried an undecodable payload"
    );
    Json(error_message(&rejection.to_string())).into_response()
}

fn service_failure(failure: ServiceError, correlation_id: &str) -> Response {
    let interface = ApplicationError::Persistence(failure.to_string()).into_interface(correlation_id);
    error!(
        event_name = "slack.request.failed",
        correlation_id,
        reason = %interface,
        "command dispatch failed"
    );
    Json(error_message(interface.user_message())).into_response()
}

fn decode_slash_form(body: &[u8]) -> Result<SlashCommandForm, PayloadError> {
    let pairs = parse_form(body)?;
    SlashCommandForm::from_form(&pairs)
}

async fn addtask(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    let correlation_id = Uuid::new_v4().to_string();
    if let Err(rejection) = authenticate(&state, &headers, &body, &correlation_id) {
        return rejection;
    }

    let form = match decode_slash_form(&body) {
        Ok(form) => form,
        Err(rejection) => return payload_rejection(rejection, &correlation_id),
    };

    info!(
        event_name = "slack.addtask.received",
        correlation_id,
        channel_id = %form.channel_id,
        "addtask command received"
    );
    Json(state.commands.addtask(&form)).into_response()
}

async fn showlist(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    let correlation_id = Uuid::new_v4().to_string();
    if let Err(rejection) = authenticate(&state, &headers, &body, &correlation_id) {
        return rejection;
    }

    let form = match decode_slash_form(&body) {
        Ok(form) => form,
        Err(rejection) => return payload_rejection(rejection, &correlation_id),
    };

    match state.commands.showlist(&form).await {
        Ok(response) => Json(response).into_response(),
        Err(failure) => service_failure(failure, &correlation_id),
    }
}

async fn interactive(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    let correlation_id = Uuid::new_v4().to_string();
    if let Err(rejection) = authenticate(&state, &headers, &body, &correlation_id) {
        return rejection;
    }

    let interaction = match parse_form(&body).and_then(|pairs| Interaction::from_form(&pairs)) {
        Ok(interaction) => interaction,
        Err(rejection) => return payload_rejection(rejection, &correlation_id),
    };

    let outcome = match state.commands.interaction(interaction).await {
        Ok(outcome) => outcome,
        Err(failure) => return service_failure(failure, &correlation_id),
    };

    // The interaction response already confirms the write; a notification
    // failure is logged and otherwise ignored.
    if let (Some(notifier), Some(task)) = (&state.notifier, &outcome.created) {
        let text =
            format!("📋 New task assigned to *{}*: {}", task.assignee, task.description);
        if let Err(failure) = notifier.post_message(&task.channel_id, &text).await {
            warn!(
                event_name = "slack.notify.failed",
                correlation_id,
                task_id = task.id.0,
                reason = %failure,
                "channel notification failed"
            );
        }
    }

    Json(outcome.response).into_response()
}

/// Events API receiver, also mounted on `/slack/home`. The one-time
/// `url_verification` handshake is answered before signature verification;
/// Slack sends it while the app is still being wired up. Everything else
/// must be signed and is acknowledged without further processing.
async fn events(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    let correlation_id = Uuid::new_v4().to_string();

    if let Ok(EventEnvelope::UrlVerification { challenge }) = EventEnvelope::from_json(&body) {
        info!(
            event_name = "slack.events.url_verification",
            correlation_id,
            "answered url verification handshake"
        );
        return Json(json!({"challenge": challenge})).into_response();
    }

    if let Err(rejection) = authenticate(&state, &headers, &body, &correlation_id) {
        return rejection;
    }

    Json(json!({"ok": true})).into_response()
}

async fn introspection(State(state): State<AppState>) -> Response {
    Json(state.commands.capabilities()).into_response()
}

async fn index() -> Response {
    Json(json!({
        "message": "Slack Task Assignment Bot",
        "status": "running",
        "version": env!("CARGO_PKG_VERSION"),
    }))
    .into_response()
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
struct HealthResponse {
    status: &'static str,
    database: &'static str,
    checked_at: String,
}

async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let database_ready =
        sqlx::query_scalar::<_, i64>("SELECT 1").fetch_one(&state.db_pool).await.is_ok();

    let payload = HealthResponse {
        status: if database_ready { "healthy" } else { "degraded" },
        database: if database_ready { "ready" } else { "unreachable" },
        checked_at: Utc::now().to_rfc3339(),
    };
    let status_code =
        if database_ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}
