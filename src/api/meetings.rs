use axum::{
    extract::{Path, State},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;

use crate::error::{AppError, Result};
use crate::models::{CreateMeetingRequest, Meeting, SessionResponse, SignInRequest, UserRegistration};
use crate::security;
use crate::state::AppState;

const USERNAME_MAX: usize = 20;
const PASSWORD_MIN: usize = 4;
const PASSWORD_MAX: usize = 20;
const MEETING_ID_LEN: usize = 8;

/// Meeting routes
pub fn meeting_routes() -> Router<AppState> {
    Router::new()
        .route("/api/create-meeting", post(create_meeting))
        .route("/api/sign-in", post(sign_in))
        .route("/meeting/{meeting_id}", get(meeting_shell))
}

fn validate_password(password: &str) -> Result<()> {
    if password.len() < PASSWORD_MIN || password.len() > PASSWORD_MAX {
        return Err(AppError::BadRequest(
            "Password length must be between 4 and 20.".to_string(),
        ));
    }
    Ok(())
}

fn validate_username(username: &str) -> Result<&str> {
    let trimmed = username.trim();
    if trimmed.is_empty() || trimmed.len() > USERNAME_MAX {
        return Err(AppError::BadRequest(
            "Username length must be between 1 and 20 (excluding whitespace)".to_string(),
        ));
    }
    Ok(trimmed)
}

fn validate_meeting_id(meeting: &str) -> Result<&str> {
    let trimmed = meeting.trim();
    if trimmed.len() != MEETING_ID_LEN {
        return Err(AppError::BadRequest(
            "Meeting ID length must be 8 characters.".to_string(),
        ));
    }
    Ok(trimmed)
}

/// POST /api/create-meeting - Create a meeting and register its admin
async fn create_meeting(
    State(state): State<AppState>,
    Json(request): Json<CreateMeetingRequest>,
) -> Result<Json<SessionResponse>> {
    validate_password(&request.password)?;
    let username = validate_username(&request.username)?.to_string();

    let salt = security::generate_salt_hex();
    let password_hash = security::hash_password(&request.password, &salt);
    let meeting = Meeting::new(username.clone(), password_hash, salt);

    state.meeting_repo.create_meeting(&meeting).await?;

    // Admins expire together with the meeting. A failure here leaves the
    // meeting record to age out on its own TTL.
    let registration = UserRegistration::new(
        meeting.meeting_id.clone(),
        username.clone(),
        true,
        meeting.created_at,
    );
    state.meeting_repo.register_user(&registration).await?;

    let jwt = state.auth.issue_token(&meeting.meeting_id, &username, true)?;

    tracing::info!(
        meeting_id = %meeting.meeting_id,
        username = %username,
        "Meeting created"
    );

    Ok(Json(SessionResponse {
        username,
        meeting: meeting.meeting_id,
        admin: true,
        jwt,
    }))
}

/// POST /api/sign-in - Register a guest into an existing meeting
async fn sign_in(
    State(state): State<AppState>,
    Json(request): Json<SignInRequest>,
) -> Result<Json<SessionResponse>> {
    validate_password(&request.password)?;
    let username = validate_username(&request.username)?.to_string();
    let meeting_id = validate_meeting_id(&request.meeting)?.to_string();

    let meeting = state
        .meeting_repo
        .get_meeting(&meeting_id)
        .await?
        .ok_or(AppError::MeetingExpired)?;

    // Best-effort: the authoritative capacity check happens at room entry.
    if state.registry.is_full(&meeting_id) {
        return Err(AppError::MeetingFull);
    }

    if state.meeting_repo.user_exists(&meeting_id, &username).await? {
        return Err(AppError::UsernameTaken);
    }

    let candidate = security::hash_password(&request.password, &meeting.salt);
    if !security::ct_eq_hex(&candidate, &meeting.password_hash) {
        return Err(AppError::IncorrectPassword);
    }

    let registration =
        UserRegistration::new(meeting_id.clone(), username.clone(), false, Utc::now());
    state.meeting_repo.register_user(&registration).await?;

    let jwt = state.auth.issue_token(&meeting_id, &username, false)?;

    tracing::info!(meeting_id = %meeting_id, username = %username, "User signed in");

    Ok(Json(SessionResponse {
        username,
        meeting: meeting_id,
        admin: false,
        jwt,
    }))
}

/// GET /meeting/{meeting_id} - Serve the client shell, or bounce home when
/// the meeting has expired
async fn meeting_shell(
    State(state): State<AppState>,
    Path(meeting_id): Path<String>,
) -> Result<Response> {
    if state.meeting_repo.get_meeting(&meeting_id).await?.is_none() {
        return Ok(Redirect::to("/").into_response());
    }

    let index = std::path::Path::new(&state.config.static_dir).join("index.html");
    let html = tokio::fs::read_to_string(&index)
        .await
        .map_err(|e| AppError::InternalError(format!("Failed to read client shell: {}", e)))?;

    Ok(Html(html).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn message(err: AppError) -> String {
        match err {
            AppError::BadRequest(msg) => msg,
            other => panic!("expected BadRequest, got {:?}", other),
        }
    }

    #[test]
    fn password_bounds() {
        assert!(validate_password("pass").is_ok());
        assert!(validate_password("a".repeat(20).as_str()).is_ok());

        let err = validate_password("abc").unwrap_err();
        assert_eq!(message(err), "Password length must be between 4 and 20.");
        assert!(validate_password("a".repeat(21).as_str()).is_err());
    }

    #[test]
    fn username_is_trimmed_and_bounded() {
        assert_eq!(validate_username("  alice  ").unwrap(), "alice");
        assert!(validate_username("a").is_ok());
        assert!(validate_username("a".repeat(20).as_str()).is_ok());

        let err = validate_username("   ").unwrap_err();
        assert_eq!(
            message(err),
            "Username length must be between 1 and 20 (excluding whitespace)"
        );
        assert!(validate_username("a".repeat(21).as_str()).is_err());
    }

    #[test]
    fn meeting_id_must_be_eight_chars() {
        assert_eq!(validate_meeting_id(" a1b2c3d4 ").unwrap(), "a1b2c3d4");

        let err = validate_meeting_id("a1b2c3").unwrap_err();
        assert_eq!(message(err), "Meeting ID length must be 8 characters.");
        assert!(validate_meeting_id("a1b2c3d4e5").is_err());
        assert!(validate_meeting_id("").is_err());
    }
}
