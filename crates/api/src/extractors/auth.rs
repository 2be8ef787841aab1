use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use bson::oid::ObjectId;
use startup_deals_db::models::User;
use startup_deals_services::dao::DaoError;
use tracing::debug;

use crate::{error::ApiError, state::AppState};

/// The caller behind a valid `Authorization: Bearer <token>` header.
///
/// Missing header, malformed or expired token, bad signature and a user that
/// no longer exists all reject with the same 401.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: ObjectId,
    pub user: User,
}

impl<S> FromRequestParts<S> for AuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);

        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(ApiError::not_authorized)?;

        let user_id = app_state.auth.resolve_token(token).map_err(|e| {
            debug!(error = %e, "Rejected bearer token");
            ApiError::not_authorized()
        })?;

        let user = match app_state.users.base.find_by_id(user_id).await {
            Ok(user) => user,
            Err(DaoError::NotFound) => return Err(ApiError::not_authorized()),
            Err(e) => return Err(e.into()),
        };

        Ok(AuthUser { user_id, user })
    }
}
