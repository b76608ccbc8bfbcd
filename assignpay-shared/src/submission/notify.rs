/// Notices and navigation
///
/// Both collaborators are fire-and-forget: the workflow never waits on them
/// and nothing they do can fail a submission.

use serde::Serialize;
use std::fmt;
use std::sync::Mutex;

/// Severity of a user-facing notice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeKind {
    Success,
    Error,
}

/// A short user-facing message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            message: message.into(),
        }
    }
}

/// Destinations the submission flow can send the caller to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Route {
    #[serde(rename = "/auth")]
    Auth,

    #[serde(rename = "/assignment-submission")]
    AssignmentSubmission,
}

impl Route {
    pub fn path(&self) -> &'static str {
        match self {
            Route::Auth => "/auth",
            Route::AssignmentSubmission => "/assignment-submission",
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Receives notices
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Receives navigation requests
pub trait Navigator: Send + Sync {
    fn navigate(&self, route: Route);
}

/// Keeps every notice it receives and logs it
///
/// The HTTP layer uses this to return a request's notices in the response body.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    pub fn notices(&self) -> Vec<Notice> {
        self.notices
            .lock()
            .map(|n| n.clone())
            .unwrap_or_default()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        match notice.kind {
            NoticeKind::Success => tracing::info!(message = %notice.message, "Notice"),
            NoticeKind::Error => tracing::warn!(message = %notice.message, "Notice"),
        }
        if let Ok(mut notices) = self.notices.lock() {
            notices.push(notice);
        }
    }
}

/// Keeps every route it is sent to
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    routes: Mutex<Vec<Route>>,
}

impl RecordingNavigator {
    pub fn routes(&self) -> Vec<Route> {
        self.routes.lock().map(|r| r.clone()).unwrap_or_default()
    }

    /// Most recent navigation, if any
    pub fn last(&self) -> Option<Route> {
        self.routes.lock().ok().and_then(|r| r.last().copied())
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, route: Route) {
        if let Ok(mut routes) = self.routes.lock() {
            routes.push(route);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_paths() {
        assert_eq!(Route::Auth.path(), "/auth");
        assert_eq!(Route::AssignmentSubmission.to_string(), "/assignment-submission");
        assert_eq!(serde_json::to_string(&Route::Auth).unwrap(), "\"/auth\"");
    }

    #[test]
    fn test_notice_serializes_kind_lowercase() {
        let json = serde_json::to_value(Notice::error("nope")).unwrap();
        assert_eq!(json["kind"], "error");
        assert_eq!(json["message"], "nope");
    }

    #[test]
    fn test_recorders_keep_order() {
        let notifier = RecordingNotifier::default();
        notifier.notify(Notice::error("first"));
        notifier.notify(Notice::success("second"));
        assert_eq!(
            notifier.notices(),
            vec![Notice::error("first"), Notice::success("second")]
        );

        let navigator = RecordingNavigator::default();
        assert_eq!(navigator.last(), None);
        navigator.navigate(Route::Auth);
        assert_eq!(navigator.last(), Some(Route::Auth));
    }
}
