/// Single-submission guard for the submission endpoint
///
/// A user may have at most one submission in flight. While a `POST
/// /v1/assignment-submission` from a user is being processed, further
/// submissions from the same user are refused with `409 Conflict` instead of
/// racing a second pair of inserts.
///
/// State lives in process memory ([`InFlightRegistry`]), keyed by user ID.
/// A claim is released when the [`SubmissionClaim`] is dropped, so it is
/// released whatever the handler returns.
///
/// # Example
///
/// ```no_run
/// use assignpay_api::middleware::submission_guard::InFlightRegistry;
/// use uuid::Uuid;
///
/// let registry = InFlightRegistry::default();
/// let user = Uuid::new_v4();
///
/// let claim = registry.try_claim(user).expect("first claim succeeds");
/// assert!(registry.try_claim(user).is_none());
/// drop(claim);
/// assert!(registry.try_claim(user).is_some());
/// ```

use crate::app::AppState;
use crate::error::ApiError;
use assignpay_shared::auth::middleware::AuthContext;
use axum::{
    extract::{Extension, Request, State},
    middleware::Next,
    response::Response,
};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// Message returned when a second submission arrives mid-flight
pub const ALREADY_IN_FLIGHT_MESSAGE: &str = "A submission is already in progress";

/// Users with a submission currently being processed
#[derive(Debug, Clone, Default)]
pub struct InFlightRegistry {
    users: Arc<Mutex<HashSet<Uuid>>>,
}

impl InFlightRegistry {
    /// Claims the user's slot, or returns None if it is taken
    pub fn try_claim(&self, user_id: Uuid) -> Option<SubmissionClaim> {
        let mut users = self.users.lock().ok()?;
        if !users.insert(user_id) {
            return None;
        }

        Some(SubmissionClaim {
            registry: self.clone(),
            user_id,
        })
    }

    pub fn is_claimed(&self, user_id: Uuid) -> bool {
        self.users
            .lock()
            .map(|users| users.contains(&user_id))
            .unwrap_or(false)
    }

    fn release(&self, user_id: Uuid) {
        if let Ok(mut users) = self.users.lock() {
            users.remove(&user_id);
        }
    }
}

/// Held for the duration of one submission
#[derive(Debug)]
pub struct SubmissionClaim {
    registry: InFlightRegistry,
    user_id: Uuid,
}

impl Drop for SubmissionClaim {
    fn drop(&mut self) {
        self.registry.release(self.user_id);
    }
}

/// Middleware refusing concurrent submissions from the same user
///
/// Must run after JWT authentication (needs [`AuthContext`]).
pub async fn single_submission_layer(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let _claim = state.in_flight.try_claim(auth.user_id()).ok_or_else(|| {
        tracing::warn!(user_id = %auth.user_id(), "Rejected concurrent submission");
        ApiError::Conflict(ALREADY_IN_FLIGHT_MESSAGE.to_string())
    })?;

    Ok(next.run(req).await)
}
