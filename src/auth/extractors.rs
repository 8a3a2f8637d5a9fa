use std::marker::PhantomData;

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use tracing::warn;

use crate::auth::jwt::JwtKeys;
use crate::error::ApiError;
use crate::state::AppState;
use crate::store::{Role, User};

/// Resolves the authenticated user for a request: extracts the bearer
/// token, verifies it, and loads the subject from the store. Every failure
/// mode short of a store outage is the same generic 401.
pub struct CurrentUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(ApiError::Unauthorized)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(ApiError::Unauthorized)?;

        let keys = JwtKeys::from_ref(state);
        let claims = keys.verify(token).map_err(|e| {
            warn!(error = %e, "token rejected");
            ApiError::Unauthorized
        })?;

        // A token whose subject no longer exists gets the same 401 as a bad
        // token; the response must not reveal which usernames exist.
        let user = state
            .store
            .find_user(&claims.sub)
            .await?
            .ok_or(ApiError::Unauthorized)?;

        Ok(CurrentUser(user))
    }
}

/// Marker for the role a [`RoleGuard`] requires.
pub trait RequiredRole: Send + Sync + 'static {
    const ROLE: Role;
}

pub struct Admin;

impl RequiredRole for Admin {
    const ROLE: Role = Role::Admin;
}

/// Authorization on top of [`CurrentUser`]: the resolved user's role must
/// equal `R::ROLE` exactly, no hierarchy. A mismatch is 403, distinct from
/// the 401 used for authentication failure.
pub struct RoleGuard<R: RequiredRole> {
    pub user: User,
    _role: PhantomData<R>,
}

#[async_trait]
impl<R: RequiredRole> FromRequestParts<AppState> for RoleGuard<R> {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;
        if user.role != R::ROLE {
            warn!(username = %user.username, role = %user.role, required = %R::ROLE, "role mismatch");
            return Err(ApiError::Forbidden);
        }
        Ok(Self {
            user,
            _role: PhantomData,
        })
    }
}
