/// The submission workflow
///
/// [`SubmissionController`] owns one draft, the tri-state status and the
/// in-flight flag. [`SubmissionController::submit`] runs the steps strictly in
/// order:
///
/// 1. validate the draft (no writes on failure)
/// 2. re-confirm the session (redirect to `/auth` when absent)
/// 3. insert the assignment
/// 4. generate a transaction reference
/// 5. insert the payment referencing the assignment
///
/// The two inserts are separate commits. What happens to the assignment when
/// the payment insert fails is governed by [`PartialFailurePolicy`].
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use assignpay_shared::auth::session::FixedSession;
/// use assignpay_shared::store::memory::MemoryStore;
/// use assignpay_shared::submission::notify::{RecordingNavigator, RecordingNotifier};
/// use assignpay_shared::submission::workflow::{SubmissionController, SubmissionOutcome};
///
/// # async fn example() {
/// let mut controller = SubmissionController::new(
///     Arc::new(MemoryStore::new()),
///     Arc::new(FixedSession::signed_out()),
///     Arc::new(RecordingNotifier::default()),
///     Arc::new(RecordingNavigator::default()),
/// );
///
/// if let SubmissionOutcome::Submitted { payment, .. } = controller.submit().await {
///     println!("recorded {}", payment.transaction_id);
/// }
/// # }
/// ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::draft::{DraftUpdate, SubmissionDraft};
use super::notify::{Navigator, Notice, Notifier, Route};
use super::transaction::TransactionId;
use super::validation::{validate, ValidationFailure};
use crate::auth::session::{
    current_session, GateOutcome, Session, SessionGate, SessionProvider, LOGIN_REQUIRED_MESSAGE,
};
use crate::models::assignment::{Assignment, CreateAssignment};
use crate::models::payment::{CreatePayment, Payment, PaymentStatus};
use crate::store::{StoreError, SubmissionStore};

/// Notice shown after both records are written
pub const SUBMISSION_SUCCEEDED_MESSAGE: &str =
    "Assignment submitted and payment processed successfully!";

/// Outcome of the latest submission attempt
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionStatus {
    #[default]
    Idle,
    Success,
    Error,
}

impl SubmissionStatus {
    /// Banner text for the status, none while idle
    pub fn banner(&self) -> Option<&'static str> {
        match self {
            SubmissionStatus::Idle => None,
            SubmissionStatus::Success => Some("Assignment submitted and payment processed!"),
            SubmissionStatus::Error => {
                Some("Please fill in all required fields and payment information.")
            }
        }
    }
}

/// What to do with a committed assignment when its payment insert fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartialFailurePolicy {
    /// Leave the assignment in place
    #[default]
    Retain,

    /// Delete the assignment again
    Compensate,
}

impl fmt::Display for PartialFailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PartialFailurePolicy::Retain => f.write_str("retain"),
            PartialFailurePolicy::Compensate => f.write_str("compensate"),
        }
    }
}

impl FromStr for PartialFailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "retain" => Ok(PartialFailurePolicy::Retain),
            "compensate" => Ok(PartialFailurePolicy::Compensate),
            other => Err(format!("Unknown partial failure policy: {}", other)),
        }
    }
}

/// Shared view of a controller's in-flight flag
///
/// Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct InFlight(Arc<AtomicBool>);

impl InFlight {
    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn begin(&self) -> InFlightGuard {
        self.0.store(true, Ordering::SeqCst);
        InFlightGuard(self.0.clone())
    }
}

/// Clears the flag when dropped
struct InFlightGuard(Arc<AtomicBool>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// A write that failed after validation and session checks passed
#[derive(Debug, Clone, thiserror::Error)]
pub enum SubmissionError {
    #[error("Failed to submit assignment")]
    AssignmentWrite(#[source] StoreError),

    #[error("Failed to process payment")]
    PaymentWrite {
        assignment_id: Uuid,
        #[source]
        source: StoreError,
        /// The assignment was deleted again
        compensated: bool,
    },
}

/// Result of one call to [`SubmissionController::submit`]
#[derive(Debug, Clone)]
pub enum SubmissionOutcome {
    Submitted {
        assignment: Assignment,
        payment: Payment,
    },

    /// The draft failed validation; nothing was written
    Rejected(ValidationFailure),

    /// No session; the caller was sent to the login route
    Redirected(Route),

    Failed(SubmissionError),
}

/// Owner of one submission draft
pub struct SubmissionController {
    draft: SubmissionDraft,
    status: SubmissionStatus,
    in_flight: InFlight,
    policy: PartialFailurePolicy,
    store: Arc<dyn SubmissionStore>,
    sessions: Arc<dyn SessionProvider>,
    notifier: Arc<dyn Notifier>,
    navigator: Arc<dyn Navigator>,
}

impl SubmissionController {
    pub fn new(
        store: Arc<dyn SubmissionStore>,
        sessions: Arc<dyn SessionProvider>,
        notifier: Arc<dyn Notifier>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            draft: SubmissionDraft::default(),
            status: SubmissionStatus::Idle,
            in_flight: InFlight::default(),
            policy: PartialFailurePolicy::default(),
            store,
            sessions,
            notifier,
            navigator,
        }
    }

    pub fn with_policy(mut self, policy: PartialFailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Overrides the initial fee amount
    pub fn with_amount(mut self, amount: Decimal) -> Self {
        self.draft = std::mem::take(&mut self.draft).apply(DraftUpdate::Amount(amount));
        self
    }

    /// Runs the session gate and seeds the submitter name on success
    pub async fn activate(&mut self) -> GateOutcome {
        let outcome = SessionGate::activate(
            self.sessions.as_ref(),
            self.notifier.as_ref(),
            self.navigator.as_ref(),
        )
        .await;

        if let GateOutcome::Ready(session) = &outcome {
            self.update(DraftUpdate::Name(session.display_name().to_string()));
        }
        outcome
    }

    pub fn update(&mut self, update: DraftUpdate) {
        self.draft = std::mem::take(&mut self.draft).apply(update);
    }

    pub fn draft(&self) -> &SubmissionDraft {
        &self.draft
    }

    pub fn status(&self) -> SubmissionStatus {
        self.status
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.is_set()
    }

    /// Handle for observing the in-flight flag from elsewhere
    pub fn in_flight(&self) -> InFlight {
        self.in_flight.clone()
    }

    /// Validates and records the draft
    ///
    /// The draft is left populated whatever the outcome. A redirect leaves the
    /// status unchanged.
    pub async fn submit(&mut self) -> SubmissionOutcome {
        if let Err(failure) = validate(&self.draft) {
            self.status = SubmissionStatus::Error;
            self.notifier.notify(Notice::error(failure.message()));
            return SubmissionOutcome::Rejected(failure);
        }

        let _in_flight = self.in_flight.begin();

        let session = match current_session(self.sessions.as_ref()).await {
            Some(session) => session,
            None => {
                self.notifier.notify(Notice::error(LOGIN_REQUIRED_MESSAGE));
                self.navigator.navigate(Route::Auth);
                return SubmissionOutcome::Redirected(Route::Auth);
            }
        };

        match self.record(&session).await {
            Ok((assignment, payment)) => {
                info!(
                    user_id = %session.user_id,
                    assignment_id = %assignment.id,
                    payment_method = %payment.payment_method,
                    amount = %payment.amount,
                    transaction_id = %payment.transaction_id,
                    "Assignment submitted"
                );
                self.status = SubmissionStatus::Success;
                self.notifier.notify(Notice::success(SUBMISSION_SUCCEEDED_MESSAGE));
                SubmissionOutcome::Submitted {
                    assignment,
                    payment,
                }
            }
            Err(e) => {
                self.status = SubmissionStatus::Error;
                self.notifier.notify(Notice::error(e.to_string()));
                SubmissionOutcome::Failed(e)
            }
        }
    }

    async fn record(&self, session: &Session) -> Result<(Assignment, Payment), SubmissionError> {
        let assignment = self
            .store
            .insert_assignment(CreateAssignment::submitted(
                session.user_id,
                self.draft.title.clone(),
            ))
            .await
            .map_err(|e| {
                error!(user_id = %session.user_id, error = %e, "Assignment insert failed");
                SubmissionError::AssignmentWrite(e)
            })?;

        let method = self.draft.method();
        let transaction_id = TransactionId::generate(method);

        let inserted = self
            .store
            .insert_payment(CreatePayment {
                user_id: session.user_id,
                assignment_id: assignment.id,
                amount: self.draft.amount,
                payment_method: method,
                status: PaymentStatus::Pending,
                transaction_id: transaction_id.into_string(),
            })
            .await;

        match inserted {
            Ok(payment) => Ok((assignment, payment)),
            Err(e) => {
                error!(
                    user_id = %session.user_id,
                    assignment_id = %assignment.id,
                    error = %e,
                    "Payment insert failed"
                );
                let compensated = self.compensate(assignment.id).await;
                Err(SubmissionError::PaymentWrite {
                    assignment_id: assignment.id,
                    source: e,
                    compensated,
                })
            }
        }
    }

    async fn compensate(&self, assignment_id: Uuid) -> bool {
        if self.policy == PartialFailurePolicy::Retain {
            warn!(%assignment_id, "Assignment kept without a payment");
            return false;
        }

        match self.store.delete_assignment(assignment_id).await {
            Ok(deleted) => {
                info!(%assignment_id, deleted, "Compensating delete issued");
                deleted
            }
            Err(e) => {
                error!(%assignment_id, error = %e, "Compensating delete failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_parse() {
        assert_eq!("retain".parse::<PartialFailurePolicy>(), Ok(PartialFailurePolicy::Retain));
        assert_eq!(
            "Compensate".parse::<PartialFailurePolicy>(),
            Ok(PartialFailurePolicy::Compensate)
        );
        assert!("rollback".parse::<PartialFailurePolicy>().is_err());
        assert_eq!(PartialFailurePolicy::default(), PartialFailurePolicy::Retain);
    }

    #[test]
    fn test_in_flight_guard_clears_on_drop() {
        let flag = InFlight::default();
        let observer = flag.clone();
        {
            let _guard = flag.begin();
            assert!(observer.is_set());
        }
        assert!(!observer.is_set());
    }

    #[test]
    fn test_status_banner() {
        assert_eq!(SubmissionStatus::Idle.banner(), None);
        assert!(SubmissionStatus::Error.banner().is_some());
        assert_eq!(
            serde_json::to_string(&SubmissionStatus::Success).unwrap(),
            "\"success\""
        );
    }
}
