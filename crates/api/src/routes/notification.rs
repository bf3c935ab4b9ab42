//! Route definitions for the `/notifications` resource.
//!
//! All endpoints require authentication.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::notification;
use crate::state::AppState;

/// Routes mounted at `/notifications`.
///
/// ```text
/// GET    /                 -> list_notifications
/// POST   /                 -> create_notification
/// DELETE /                 -> clear_all
/// GET    /unread-count     -> unread_count
/// POST   /read-all         -> mark_all_read
/// POST   /{id}/read        -> mark_read
///
/// POST   /summary          -> run_summary
/// GET    /{id}/summary     -> summary_breakdown
///
/// GET    /preferences      -> get_preferences
/// PUT    /preferences      -> update_preferences
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(notification::list_notifications)
                .post(notification::create_notification)
                .delete(notification::clear_all),
        )
        .route("/unread-count", get(notification::unread_count))
        .route("/read-all", post(notification::mark_all_read))
        .route("/{id}/read", post(notification::mark_read))
        // Summaries
        .route("/summary", post(notification::run_summary))
        .route("/{id}/summary", get(notification::summary_breakdown))
        // Preferences
        .route(
            "/preferences",
            get(notification::get_preferences).put(notification::update_preferences),
        )
}
