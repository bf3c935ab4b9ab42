//! Handlers for the `/notifications` resource.
//!
//! All endpoints require authentication via [`AuthUser`] and act on the
//! authenticated user's own inbox, except `create`, which needs the producer
//! role ([`RequireProducer`]) and may address any recipient.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use herald_core::error::CoreError;
use herald_core::notification::Notification;
use herald_core::preferences::NotificationPreferences;
use herald_core::summary::SummaryBreakdown;
use herald_core::types::DbId;
use herald_db::models::notification::{CreateNotification, UnreadCounts};
use herald_db::models::user::UpdatePreferences;
use herald_db::repositories::{NotificationRepo, UserRepo};
use herald_events::{NotEligibleReason, SummaryOutcome};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireProducer;
use crate::response::{Affected, DataResponse};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Query / response types
// ---------------------------------------------------------------------------

/// Query parameters for `GET /notifications`.
#[derive(Debug, Deserialize)]
pub struct NotificationQuery {
    /// If `true`, return only unread notifications. Defaults to `false`.
    pub unread_only: Option<bool>,
    /// Maximum number of results. Defaults to 50, capped at 100.
    pub limit: Option<i64>,
    /// Number of results to skip. Defaults to 0.
    pub offset: Option<i64>,
}

/// Maximum page size for notification listing.
const MAX_LIMIT: i64 = 100;

/// Default page size for notification listing.
const DEFAULT_LIMIT: i64 = 50;

/// Result of an on-demand summary run.
#[derive(Debug, Serialize)]
pub struct SummaryRunResponse {
    /// `created`, `not_eligible`, `nothing_to_summarize` or `already_running`.
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<NotEligibleReason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification: Option<Notification>,
}

impl From<SummaryOutcome> for SummaryRunResponse {
    fn from(outcome: SummaryOutcome) -> Self {
        let status = outcome.as_str();
        let (reason, notification) = match outcome {
            SummaryOutcome::Created(digest) => (None, Some(digest)),
            SummaryOutcome::NotEligible(reason) => (Some(reason), None),
            SummaryOutcome::NothingToSummarize | SummaryOutcome::AlreadyRunning => (None, None),
        };
        Self {
            status,
            reason,
            notification,
        }
    }
}

// ---------------------------------------------------------------------------
// Notification store
// ---------------------------------------------------------------------------

/// GET /api/v1/notifications
pub async fn list_notifications(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<NotificationQuery>,
) -> AppResult<Json<DataResponse<Vec<Notification>>>> {
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let offset = params.offset.unwrap_or(0).max(0);
    let unread_only = params.unread_only.unwrap_or(false);

    let notifications = NotificationRepo::list_for_recipient(
        &state.pool,
        &auth.username,
        unread_only,
        limit,
        offset,
    )
    .await?;

    Ok(Json(DataResponse {
        data: notifications,
    }))
}

/// POST /api/v1/notifications
///
/// Store an ordinary notification and push it to the recipient.
pub async fn create_notification(
    RequireProducer(auth): RequireProducer,
    State(state): State<AppState>,
    Json(input): Json<CreateNotification>,
) -> AppResult<impl IntoResponse> {
    let new = input.into_new()?;
    if UserRepo::find_by_username(&state.pool, &new.recipient)
        .await?
        .is_none()
    {
        return Err(AppError::NotFound(format!(
            "User {} not found",
            new.recipient
        )));
    }

    let notification = state.notifications.notify(&new).await?;
    tracing::info!(
        producer = %auth.username,
        user = %notification.recipient,
        notification_id = notification.id,
        "Notification created"
    );

    Ok((
        StatusCode::CREATED,
        Json(DataResponse { data: notification }),
    ))
}

/// GET /api/v1/notifications/unread-count
pub async fn unread_count(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<UnreadCounts>>> {
    let counts = NotificationRepo::unread_counts(&state.pool, &auth.username).await?;
    Ok(Json(DataResponse { data: counts }))
}

/// POST /api/v1/notifications/{id}/read
///
/// Returns 204 on success, including when it was already read, or 404 if
/// the notification does not belong to the authenticated user.
pub async fn mark_read(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(notification_id): Path<DbId>,
) -> AppResult<StatusCode> {
    NotificationRepo::mark_read(&state.pool, notification_id, &auth.username)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Notification",
            id: notification_id,
        }))?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/notifications/read-all
pub async fn mark_all_read(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Affected>>> {
    let affected = NotificationRepo::mark_all_read(&state.pool, &auth.username).await?;
    Ok(Json(DataResponse {
        data: Affected { affected },
    }))
}

/// DELETE /api/v1/notifications
pub async fn clear_all(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Affected>>> {
    let affected = NotificationRepo::clear_all(&state.pool, &auth.username).await?;
    tracing::info!(user = %auth.username, affected, "Notifications cleared");
    Ok(Json(DataResponse {
        data: Affected { affected },
    }))
}

// ---------------------------------------------------------------------------
// Summaries
// ---------------------------------------------------------------------------

/// GET /api/v1/notifications/{id}/summary
///
/// Structured detail behind one of the user's digests.
pub async fn summary_breakdown(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(notification_id): Path<DbId>,
) -> AppResult<Json<DataResponse<SummaryBreakdown>>> {
    let breakdown = state
        .aggregator
        .breakdown(&auth.username, notification_id)
        .await?;
    Ok(Json(DataResponse { data: breakdown }))
}

/// POST /api/v1/notifications/summary
///
/// Run the summary aggregator for the authenticated user now and push the
/// digest if one was created.
pub async fn run_summary(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<SummaryRunResponse>>> {
    let outcome = state.aggregator.run(&auth.username, Utc::now()).await?;
    if let SummaryOutcome::Created(digest) = &outcome {
        state.notifications.publish(digest);
    }
    tracing::info!(user = %auth.username, status = outcome.as_str(), "On-demand summary run");
    Ok(Json(DataResponse {
        data: SummaryRunResponse::from(outcome),
    }))
}

// ---------------------------------------------------------------------------
// Preferences
// ---------------------------------------------------------------------------

/// GET /api/v1/notifications/preferences
pub async fn get_preferences(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<NotificationPreferences>>> {
    let profile = UserRepo::find_by_username(&state.pool, &auth.username)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", auth.username)))?;
    Ok(Json(DataResponse {
        data: profile.preferences(),
    }))
}

/// PUT /api/v1/notifications/preferences
///
/// Partial update; absent fields are left unchanged.
pub async fn update_preferences(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<UpdatePreferences>,
) -> AppResult<Json<DataResponse<NotificationPreferences>>> {
    input
        .validate()
        .map_err(|e| AppError::Core(CoreError::Validation(e.to_string())))?;

    let profile = UserRepo::update_preferences(&state.pool, &auth.username, &input)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", auth.username)))?;
    tracing::info!(
        user = %auth.username,
        mode = ?profile.preferences().delivery_mode(),
        "Notification preferences updated"
    );
    Ok(Json(DataResponse {
        data: profile.preferences(),
    }))
}
