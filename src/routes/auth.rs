use axum::{extract::State, http::StatusCode, Extension, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_sessions::Session;

use crate::{
    error::{AppError, AppResult},
    middleware::RequestId,
    models::{AuthenticatedUser, Credentials},
    routes::AppState,
    services::validation::{is_valid_email, password_issues},
};

/// Session key holding the signed-in `AuthenticatedUser`
pub const USER_SESSION_KEY: &str = "user";

#[derive(Debug, Deserialize)]
pub struct ResendRequest {
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub message: String,
    pub user_id: Option<String>,
    pub confirmation_required: bool,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Handler for account registration
pub async fn register(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Json(credentials): Json<Credentials>,
) -> AppResult<(StatusCode, Json<RegisterResponse>)> {
    if !is_valid_email(&credentials.email) {
        return Err(AppError::InvalidInput(
            "Invalid email format. Please enter a valid email.".to_string(),
        ));
    }

    let issues = password_issues(&credentials.password);
    if !issues.is_empty() {
        return Err(AppError::Validation {
            message: "Password does not meet the requirements".to_string(),
            issues,
        });
    }

    let identity = state.identity()?;
    let outcome = identity.sign_up(&credentials).await?;

    tracing::info!(
        request_id = %request_id,
        provider = identity.name(),
        confirmation_required = outcome.confirmation_required,
        "Account registered"
    );

    let message = if outcome.confirmation_required {
        "Registration successful! Check your email to verify."
    } else {
        "Registration successful!"
    };

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: message.to_string(),
            user_id: outcome.user_id,
            confirmation_required: outcome.confirmation_required,
        }),
    ))
}

/// Handler for login; stores the user in the session
pub async fn login(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    session: Session,
    Json(credentials): Json<Credentials>,
) -> AppResult<Json<AuthenticatedUser>> {
    if credentials.email.trim().is_empty() || credentials.password.is_empty() {
        return Err(AppError::InvalidInput(
            "Email and password are required".to_string(),
        ));
    }

    let identity = state.identity()?;
    let user = identity.sign_in(&credentials).await?;

    session.cycle_id().await?;
    session.insert(USER_SESSION_KEY, &user).await?;

    tracing::info!(request_id = %request_id, user_id = %user.id, "Login successful");

    Ok(Json(user))
}

/// Handler for logout; drops the whole session
pub async fn logout(session: Session) -> AppResult<Json<MessageResponse>> {
    session.flush().await?;

    Ok(Json(MessageResponse {
        message: "You have been logged out.".to_string(),
    }))
}

/// Handler for resending the signup confirmation email
pub async fn resend_confirmation(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ResendRequest>,
) -> AppResult<Json<MessageResponse>> {
    let email = request.email.trim();
    if email.is_empty() {
        return Err(AppError::InvalidInput("Email is required.".to_string()));
    }

    state.identity()?.resend_confirmation(email).await?;

    Ok(Json(MessageResponse {
        message: "A new confirmation email has been sent. Please check your inbox.".to_string(),
    }))
}

/// Handler returning the signed-in user
pub async fn me(session: Session) -> AppResult<Json<AuthenticatedUser>> {
    session
        .get::<AuthenticatedUser>(USER_SESSION_KEY)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::Unauthorized("You need to log in first.".to_string()))
}
