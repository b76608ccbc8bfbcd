/// Sessions and the session gate
///
/// A [`Session`] is proof of an authenticated actor. The submission page asks
/// a [`SessionProvider`] for one exactly once when it is activated
/// ([`SessionGate::activate`]) and once more right before writing anything.
///
/// Failing to *fetch* a session is treated the same as not having one: the
/// caller is sent to the login route. There is no retry.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::jwt::Claims;
use crate::models::user::{User, UserType};
use crate::submission::notify::{Navigator, Notice, Notifier, Route};

/// Notice shown when a page that needs a session is opened without one
pub const LOGIN_REQUIRED_MESSAGE: &str = "Please log in to submit an assignment";

/// An authenticated actor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Authenticated user ID
    pub user_id: Uuid,

    /// Account email
    pub email: String,

    /// `full_name` profile attribute
    pub full_name: Option<String>,

    /// Account type
    pub user_type: UserType,
}

impl Session {
    pub fn from_claims(claims: &Claims) -> Self {
        Self {
            user_id: claims.sub,
            email: claims.email.clone(),
            full_name: claims.full_name.clone(),
            user_type: claims.user_type,
        }
    }

    pub fn from_user(user: &User) -> Self {
        Self {
            user_id: user.id,
            email: user.email.clone(),
            full_name: user.full_name.clone(),
            user_type: user.user_type,
        }
    }

    /// Name to pre-fill on the submission form (empty if the profile has none)
    pub fn display_name(&self) -> &str {
        self.full_name.as_deref().unwrap_or("")
    }
}

/// Error raised while looking up a session
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The identity backend could not be reached
    #[error("Session lookup failed: {0}")]
    Unavailable(String),
}

/// Source of the current session
#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// Returns the active session, `Ok(None)` if nobody is signed in
    async fn get_session(&self) -> Result<Option<Session>, SessionError>;
}

/// A provider that always answers with the same value
#[derive(Debug, Clone, Default)]
pub struct FixedSession(pub Option<Session>);

impl FixedSession {
    pub fn signed_in(session: Session) -> Self {
        Self(Some(session))
    }

    pub fn signed_out() -> Self {
        Self(None)
    }
}

#[async_trait]
impl SessionProvider for FixedSession {
    async fn get_session(&self) -> Result<Option<Session>, SessionError> {
        Ok(self.0.clone())
    }
}

/// Asks the provider once, folding lookup failures into "no session"
pub async fn current_session(provider: &dyn SessionProvider) -> Option<Session> {
    match provider.get_session().await {
        Ok(session) => session,
        Err(e) => {
            tracing::warn!(error = %e, "Session lookup failed, treating as signed out");
            None
        }
    }
}

/// Result of activating a page behind the session gate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateOutcome {
    /// Signed in; the page may render
    Ready(Session),

    /// Signed out; the caller has been sent elsewhere
    Redirected(Route),
}

/// Guard run once per page activation
pub struct SessionGate;

impl SessionGate {
    /// Checks for a session, redirecting to the login route when absent
    ///
    /// On absence an error notice is emitted and the navigator is sent to
    /// [`Route::Auth`].
    pub async fn activate(
        provider: &dyn SessionProvider,
        notifier: &dyn Notifier,
        navigator: &dyn Navigator,
    ) -> GateOutcome {
        match current_session(provider).await {
            Some(session) => GateOutcome::Ready(session),
            None => {
                notifier.notify(Notice::error(LOGIN_REQUIRED_MESSAGE));
                navigator.navigate(Route::Auth);
                GateOutcome::Redirected(Route::Auth)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::submission::notify::{RecordingNavigator, RecordingNotifier};

    struct BrokenProvider;

    #[async_trait]
    impl SessionProvider for BrokenProvider {
        async fn get_session(&self) -> Result<Option<Session>, SessionError> {
            Err(SessionError::Unavailable("connection refused".to_string()))
        }
    }

    fn session(full_name: Option<&str>) -> Session {
        Session {
            user_id: Uuid::new_v4(),
            email: "student@example.com".to_string(),
            full_name: full_name.map(str::to_string),
            user_type: UserType::User,
        }
    }

    #[test]
    fn test_display_name_defaults_to_empty() {
        assert_eq!(session(Some("Ada")).display_name(), "Ada");
        assert_eq!(session(None).display_name(), "");
    }

    #[tokio::test]
    async fn test_gate_ready_with_session() {
        let notifier = RecordingNotifier::default();
        let navigator = RecordingNavigator::default();
        let expected = session(Some("Ada"));

        let outcome = SessionGate::activate(
            &FixedSession::signed_in(expected.clone()),
            &notifier,
            &navigator,
        )
        .await;

        assert_eq!(outcome, GateOutcome::Ready(expected));
        assert!(notifier.notices().is_empty());
        assert!(navigator.routes().is_empty());
    }

    #[tokio::test]
    async fn test_gate_redirects_without_session() {
        let notifier = RecordingNotifier::default();
        let navigator = RecordingNavigator::default();

        let outcome =
            SessionGate::activate(&FixedSession::signed_out(), &notifier, &navigator).await;

        assert_eq!(outcome, GateOutcome::Redirected(Route::Auth));
        assert_eq!(notifier.notices(), vec![Notice::error(LOGIN_REQUIRED_MESSAGE)]);
        assert_eq!(navigator.routes(), vec![Route::Auth]);
    }

    #[tokio::test]
    async fn test_gate_treats_lookup_failure_as_signed_out() {
        let notifier = RecordingNotifier::default();
        let navigator = RecordingNavigator::default();

        let outcome = SessionGate::activate(&BrokenProvider, &notifier, &navigator).await;

        assert_eq!(outcome, GateOutcome::Redirected(Route::Auth));
        assert_eq!(navigator.routes(), vec![Route::Auth]);
    }
}
