use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use member_map_shared::models::{InputError, Profile, ProfileInput};
use serde_json::{json, Value};
use thiserror::Error;

use crate::session::{self, Session};
use crate::storage::{Storage, StorageError};
use crate::AppState;

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("Unauthorized")]
    Unauthorized,
    #[error(transparent)]
    Input(#[from] InputError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Validate and upsert the caller's profile.
pub fn submit_profile(
    storage: &Storage,
    session: Option<&Session>,
    input: &ProfileInput,
) -> Result<Profile, SubmitError> {
    let session = session.ok_or(SubmitError::Unauthorized)?;
    let valid = input.validate()?;
    let now = chrono::Utc::now().to_rfc3339();
    let profile = storage.upsert_profile(&session.account_id, &valid, &now)?;
    tracing::info!(
        account_id = %session.account_id,
        profile_id = %profile.id,
        "Saved profile"
    );
    Ok(profile)
}

fn error_body(status: StatusCode, message: &str) -> (StatusCode, Json<Value>) {
    (status, Json(json!({ "error": message })))
}

/// `POST /api/profile`
pub async fn submit_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<ProfileInput>, JsonRejection>,
) -> (StatusCode, Json<Value>) {
    let session = session::identify(&state.storage, &headers);
    let Some(session) = session else {
        return error_body(StatusCode::UNAUTHORIZED, "Unauthorized");
    };
    let input = match body {
        Ok(Json(input)) => input,
        Err(rejection) => {
            return error_body(StatusCode::BAD_REQUEST, &rejection.body_text());
        }
    };

    match submit_profile(&state.storage, Some(&session), &input) {
        Ok(profile) => (StatusCode::OK, Json(json!({ "profile": profile }))),
        Err(SubmitError::Unauthorized) => error_body(StatusCode::UNAUTHORIZED, "Unauthorized"),
        Err(SubmitError::Input(e)) => error_body(StatusCode::BAD_REQUEST, &e.to_string()),
        Err(SubmitError::Storage(e)) => {
            tracing::error!(error = %e, "Error saving profile");
            error_body(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
        }
    }
}
