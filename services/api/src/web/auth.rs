//! services/api/src/web/auth.rs
//!
//! Authentication endpoints: sign-in, registration, federated sign-in with its
//! consent callback, and sign-out. Each one drives the process-wide session.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use go_tany_core::domain::Identity;
use go_tany_core::validation::{PasswordStrength, SignInForm, SignUpForm};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::adapters::FederatedProfile;
use crate::error::{ApiError, ErrorBody};
use crate::web::state::AppState;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl From<LoginRequest> for SignInForm {
    fn from(req: LoginRequest) -> Self {
        SignInForm {
            email: req.email,
            password: req.password,
        }
    }
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub gender: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirm_password: String,
    #[serde(default)]
    pub agree_terms: bool,
}

impl From<RegisterRequest> for SignUpForm {
    fn from(req: RegisterRequest) -> Self {
        SignUpForm {
            first_name: req.first_name,
            last_name: req.last_name,
            username: req.username,
            email: req.email,
            phone: req.phone,
            gender: req.gender,
            password: req.password,
            confirm_password: req.confirm_password,
            agree_terms: req.agree_terms,
        }
    }
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub uid: Uuid,
    pub email: Option<String>,
    pub display_name: Option<String>,
}

impl From<Identity> for AuthResponse {
    fn from(identity: Identity) -> Self {
        AuthResponse {
            uid: identity.uid,
            email: identity.email,
            display_name: identity.display_name,
        }
    }
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /auth/login - Sign in with email and password
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed in", body = AuthResponse),
        (status = 204, description = "Session still resolving"),
        (status = 303, description = "Already signed in; redirect to the landing page"),
        (status = 400, description = "Missing fields", body = ErrorBody),
        (status = 401, description = "Unknown user or wrong password", body = ErrorBody),
        (status = 429, description = "Too many failed attempts", body = ErrorBody)
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let form = SignInForm::from(req);
    form.validate()?;

    let identity = state.session.sign_in(&form.email, &form.password).await?;
    state.settle(Some(identity.uid)).await;
    Ok((StatusCode::OK, Json(AuthResponse::from(identity))))
}

/// POST /auth/register - Create an account and its profile document
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created and signed in", body = AuthResponse),
        (status = 204, description = "Session still resolving"),
        (status = 303, description = "Already signed in; redirect to the landing page"),
        (status = 400, description = "Form validation failed", body = ErrorBody),
        (status = 409, description = "Email already registered", body = ErrorBody)
    )
)]
pub async fn register_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let form = SignUpForm::from(req);
    form.validate()?;

    let identity = state
        .session
        .sign_up(&form.email, &form.password, &form.full_name(), &form.phone)
        .await?;
    state.settle(Some(identity.uid)).await;
    Ok((StatusCode::CREATED, Json(AuthResponse::from(identity))))
}

/// POST /auth/federated - Sign in through the federated provider
///
/// Waits until the pending consent is completed, dismissed or times out.
#[utoipa::path(
    post,
    path = "/auth/federated",
    responses(
        (status = 200, description = "Signed in", body = AuthResponse),
        (status = 204, description = "Session still resolving"),
        (status = 303, description = "Already signed in; redirect to the landing page"),
        (status = 401, description = "Consent dismissed or timed out", body = ErrorBody)
    )
)]
pub async fn federated_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let identity = state.session.sign_in_with_federated_provider().await?;
    state.settle(Some(identity.uid)).await;
    Ok((StatusCode::OK, Json(AuthResponse::from(identity))))
}

/// POST /auth/federated/consent - Complete the pending federated consent
#[utoipa::path(
    post,
    path = "/auth/federated/consent",
    request_body = FederatedProfile,
    responses(
        (status = 202, description = "Consent delivered"),
        (status = 404, description = "No consent is pending", body = ErrorBody)
    )
)]
pub async fn grant_consent_handler(
    State(state): State<Arc<AppState>>,
    Json(profile): Json<FederatedProfile>,
) -> Result<StatusCode, ApiError> {
    if profile.email.trim().is_empty() {
        return Err(ApiError::BadRequest("Email harus diisi".to_string()));
    }
    if !state.consent.complete(profile) {
        return Err(ApiError::NotFound("No consent request is pending".to_string()));
    }
    info!("Federated consent granted.");
    Ok(StatusCode::ACCEPTED)
}

/// DELETE /auth/federated/consent - Dismiss the pending federated consent
#[utoipa::path(
    delete,
    path = "/auth/federated/consent",
    responses(
        (status = 202, description = "Consent dismissed"),
        (status = 404, description = "No consent is pending", body = ErrorBody)
    )
)]
pub async fn dismiss_consent_handler(
    State(state): State<Arc<AppState>>,
) -> Result<StatusCode, ApiError> {
    if !state.consent.dismiss() {
        return Err(ApiError::NotFound("No consent request is pending".to_string()));
    }
    info!("Federated consent dismissed.");
    Ok(StatusCode::ACCEPTED)
}

/// POST /auth/logout - End the session
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses(
        (status = 204, description = "Signed out"),
        (status = 303, description = "Not signed in; redirect to the sign-in page"),
        (status = 503, description = "Session still resolving")
    )
)]
pub async fn logout_handler(State(state): State<Arc<AppState>>) -> Result<StatusCode, ApiError> {
    state.session.sign_out().await?;
    state.settle(None).await;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize, ToSchema)]
pub struct PasswordStrengthRequest {
    pub password: String,
}

#[derive(Serialize, ToSchema)]
pub struct PasswordStrengthResponse {
    /// `weak`, `medium` or `strong`.
    pub strength: String,
    /// Display label: Lemah, Sedang or Kuat.
    pub label: String,
}

/// POST /auth/password-strength - Rate a candidate password for the sign-up form
#[utoipa::path(
    post,
    path = "/auth/password-strength",
    request_body = PasswordStrengthRequest,
    responses(
        (status = 200, description = "Strength rating", body = PasswordStrengthResponse)
    )
)]
pub async fn password_strength_handler(
    Json(req): Json<PasswordStrengthRequest>,
) -> Json<PasswordStrengthResponse> {
    let strength = PasswordStrength::of(&req.password);
    let rating = match strength {
        PasswordStrength::Weak => "weak",
        PasswordStrength::Medium => "medium",
        PasswordStrength::Strong => "strong",
    };
    Json(PasswordStrengthResponse {
        strength: rating.to_string(),
        label: strength.label().to_string(),
    })
}
