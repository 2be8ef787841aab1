use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;
use startup_deals_db::models::{Role, User, VerificationStatus};
use startup_deals_services::{
    auth::AuthError,
    dao::DaoError,
    validation::{LoginInput, RegisterInput, VerificationRequestInput, validated},
};
use tracing::info;

use super::rfc3339;
use crate::{
    error::ApiError,
    extractors::{auth::AuthUser, json::ApiJson},
    response::{Envelope, success, success_with_message},
    state::AppState,
};

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserResponse,
}

#[derive(Debug, Serialize)]
pub struct UserEnvelope {
    pub user: UserResponse,
}

/// Public view of an account. Never carries the password hash.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub is_verified: bool,
    pub company: Option<String>,
    pub website_url: Option<String>,
    pub verification_status: VerificationStatus,
    pub created_at: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id.map(|id| id.to_hex()).unwrap_or_default(),
            name: user.name,
            email: user.email,
            role: user.role,
            is_verified: user.is_verified,
            company: user.company,
            website_url: user.website_url,
            verification_status: user.verification_status,
            created_at: rfc3339(user.created_at),
        }
    }
}

fn email_registered() -> ApiError {
    ApiError::BadRequest("Email already registered".to_string())
}

pub async fn register(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<RegisterInput>,
) -> Result<(StatusCode, Json<Envelope<AuthResponse>>), ApiError> {
    let input = validated(body)?;

    if state.users.email_taken(&input.email).await? {
        return Err(email_registered());
    }

    let password_hash = state.auth.hash_password(&input.password)?;
    let user = match state.users.create(&input, password_hash).await {
        Ok(user) => user,
        // Lost a race with a concurrent registration for the same email.
        Err(DaoError::DuplicateKey(_)) => return Err(email_registered()),
        Err(e) => return Err(e.into()),
    };

    let user_id = user.id.ok_or(DaoError::MissingId)?;
    let token = state.auth.issue_token(user_id)?;
    info!(user = %user_id, "User registered");

    Ok((
        StatusCode::CREATED,
        success_with_message(
            "User registered successfully",
            AuthResponse {
                token,
                user: user.into(),
            },
        ),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<LoginInput>,
) -> Result<Json<Envelope<AuthResponse>>, ApiError> {
    let input = validated(body)
        .map_err(|_| ApiError::BadRequest("Please provide email and password".to_string()))?;

    // Unknown email and wrong password must be indistinguishable.
    let user = match state.users.find_by_email(&input.email).await {
        Ok(user) => user,
        Err(DaoError::NotFound) => return Err(AuthError::InvalidCredentials.into()),
        Err(e) => return Err(e.into()),
    };

    let password_hash = user
        .password_hash
        .as_deref()
        .ok_or(AuthError::InvalidCredentials)?;
    if !state.auth.verify_password(&input.password, password_hash)? {
        return Err(AuthError::InvalidCredentials.into());
    }

    let user_id = user.id.ok_or(DaoError::MissingId)?;
    let token = state.auth.issue_token(user_id)?;

    Ok(success_with_message(
        "Login successful",
        AuthResponse {
            token,
            user: user.into(),
        },
    ))
}

pub async fn me(auth: AuthUser) -> Json<Envelope<UserEnvelope>> {
    success(UserEnvelope {
        user: auth.user.into(),
    })
}

pub async fn request_verification(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(body): ApiJson<VerificationRequestInput>,
) -> Result<Json<Envelope<UserEnvelope>>, ApiError> {
    let input = validated(body)?;

    let user = match state.users.request_verification(auth.user_id, &input).await {
        Ok(user) => user,
        Err(DaoError::NotFound) => return Err(ApiError::NotFound("User not found".to_string())),
        Err(e) => return Err(e.into()),
    };
    info!(user = %auth.user_id, "Verification requested");

    Ok(success_with_message(
        "Verification request submitted successfully",
        UserEnvelope { user: user.into() },
    ))
}
