//! Webhook handler for GitHub push events

use axum::{
    Json,
    body::Bytes,
    extract::State as AxumState,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::SharedState;
use crate::code_engine::collect_bundle;
use crate::error::HookError;
use crate::load_repos_config;
use crate::utils::{find_matching_repo, repo_key, verify_github_signature};
use crate::webhook::{DELIVERY_HEADER, EVENT_HEADER, PushEvent, SIGNATURE_HEADER};

pub async fn root() -> &'static str {
    "OK"
}

/// Handles the GitHub webhook POST request.
pub async fn handle_webhook(
    AxumState(state): AxumState<SharedState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let delivery = headers
        .get(DELIVERY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(String::from)
        .unwrap_or_else(|| Uuid::now_v7().to_string());

    let event_opt = headers.get(EVENT_HEADER).and_then(|v| v.to_str().ok());
    match event_opt {
        Some("ping") => {
            info!("Delivery {} - ping received", delivery);
            return Json(json!({"msg": "Hi!"})).into_response();
        }
        Some("push") => {}
        other => {
            info!("Delivery {} - not a push event; received {:?}", delivery, other);
            return Json(json!({"msg": "wrong event type"})).into_response();
        }
    }

    // Detached so a dropped connection does not cancel running actions or the upload.
    let pipeline = tokio::spawn({
        let delivery = delivery.clone();
        async move { process_push(&state, &headers, &body, &delivery).await }
    });
    let result = pipeline
        .await
        .unwrap_or_else(|e| Err(HookError::PipelineAborted(e.to_string())));

    match result {
        Ok(()) => (StatusCode::OK, "OK").into_response(),
        Err(e) => {
            let status = e.status_code();
            if status.is_server_error() {
                error!("Delivery {} failed: {}", delivery, e);
            } else {
                warn!("Delivery {} rejected: {}", delivery, e);
            }
            (status, Json(json!({"msg": e.to_string()}))).into_response()
        }
    }
}

async fn process_push(
    state: &SharedState,
    headers: &HeaderMap,
    body: &[u8],
    delivery: &str,
) -> Result<(), HookError> {
    let settings = &state.settings;
    let repos = load_repos_config(&settings.repos_json_path).await?;

    let payload: serde_json::Value = serde_json::from_slice(body)
        .map_err(|e| HookError::InvalidPayload(format!("Could not parse JSON body: {}", e)))?;
    if settings.debug {
        debug!("{:#?}", &payload);
    }
    let event = PushEvent::from_payload(&payload)?;

    let (key, repo) = find_matching_repo(&repos, &event.owner, &event.name, event.branch())
        .ok_or_else(|| {
            HookError::RepositoryNotFound(repo_key(&event.owner, &event.name, event.branch()))
        })?;
    info!(
        "Delivery {} - push to '{}' matched configuration '{}'",
        delivery, event.git_ref, key
    );

    if let Some(secret) = repo.secret() {
        let signature = headers
            .get(SIGNATURE_HEADER)
            .ok_or(HookError::MissingSignature)?
            .to_str()
            .map_err(|e| HookError::MalformedSignature(e.to_string()))?;
        verify_github_signature(secret, body, signature)?;
    }

    if !repo.has_actions() {
        debug!("Delivery {} - no actions configured for '{}'", delivery, key);
    }
    let cwd = repo.working_dir();
    for action in &repo.action {
        match state.runner.run(action, cwd).await {
            Ok(outcome) if outcome.is_success() => {
                info!("Delivery {} - action '{}' completed", delivery, action);
            }
            Ok(outcome) => {
                warn!(
                    "Delivery {} - action '{}' did not succeed: {:?}",
                    delivery, action, outcome
                );
                if settings.abort_on_action_failure {
                    return Err(HookError::ActionFailed(format!("'{}': {:?}", action, outcome)));
                }
            }
            Err(e) => {
                error!("Delivery {} - {}", delivery, e);
                if settings.abort_on_action_failure {
                    return Err(e);
                }
            }
        }
    }

    let bundle = collect_bundle(&settings.code_engine_file_path).await?;
    state.code_engine.set_code(&bundle).await?;
    info!(
        "Delivery {} - uploaded {} module(s) to the code engine",
        delivery,
        bundle.len()
    );

    Ok(())
}
