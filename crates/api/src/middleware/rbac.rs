//! Role checks layered on [`AuthUser`].

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use herald_core::roles::ROLE_PRODUCER;

use super::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;

/// Requires the `producer` role. Rejects with 403 Forbidden otherwise.
///
/// Only producers may address notifications to a user other than
/// themselves.
pub struct RequireProducer(pub AuthUser);

impl RequireProducer {
    fn check(user: AuthUser) -> Result<Self, AppError> {
        if user.role != ROLE_PRODUCER {
            return Err(AppError::Forbidden("Producer role required".into()));
        }
        Ok(RequireProducer(user))
    }
}

impl FromRequestParts<AppState> for RequireProducer {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        Self::check(user)
    }
}
