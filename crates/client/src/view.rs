//! Navigation routes and the view context derived from them.

use herald_core::types::DbId;

/// The part of the location the Delivery Controller cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Route {
    Chat(DbId),
    Question(DbId),
    JobFair(DbId),
    Notifications,
    #[default]
    Other,
}

impl Route {
    /// Parse a location path such as `/chats/12` or `/notifications?tab=all`.
    ///
    /// Unknown paths and malformed ids map to [`Route::Other`].
    pub fn parse(path: &str) -> Self {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        match segments.as_slice() {
            ["notifications"] => Route::Notifications,
            ["chats", id] => id.parse().map(Route::Chat).unwrap_or_default(),
            ["questions", id] => id.parse().map(Route::Question).unwrap_or_default(),
            ["job-fairs", id] => id.parse().map(Route::JobFair).unwrap_or_default(),
            _ => Route::Other,
        }
    }
}

/// Entities the user is currently looking at. At most one of each kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ViewContext {
    pub active_chat: Option<DbId>,
    pub active_question: Option<DbId>,
    pub active_job_fair: Option<DbId>,
    pub on_notifications_page: bool,
}

impl From<Route> for ViewContext {
    fn from(route: Route) -> Self {
        let mut view = ViewContext::default();
        match route {
            Route::Chat(id) => view.active_chat = Some(id),
            Route::Question(id) => view.active_question = Some(id),
            Route::JobFair(id) => view.active_job_fair = Some(id),
            Route::Notifications => view.on_notifications_page = true,
            Route::Other => {}
        }
        view
    }
}
