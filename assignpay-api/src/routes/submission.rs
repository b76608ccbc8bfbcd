/// Assignment submission endpoints
///
/// Each request builds its own [`SubmissionController`] over the shared
/// store. Notices the workflow emits are collected and returned in the
/// response body; a redirect becomes `401` with `redirect: "/auth"`.
///
/// # Endpoints
///
/// - `GET  /v1/assignment-submission` - Session gate and prefilled draft
/// - `POST /v1/assignment-submission` - Validate and record a submission

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use assignpay_shared::{
    auth::{
        identity::BearerSession, middleware::AuthContext, session::GateOutcome,
        session::LOGIN_REQUIRED_MESSAGE,
    },
    models::payment::PaymentMethod,
    submission::{
        draft::ACCEPTED_EXTENSIONS,
        notify::{Notice, RecordingNavigator, RecordingNotifier, Route},
        DraftUpdate, PaymentDetails, SelectedFile, SubmissionController, SubmissionDraft,
        SubmissionError, SubmissionOutcome, SubmissionStatus,
    },
};
use axum::{extract::State, http::StatusCode, Extension, Json};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

/// A payment method as offered on the form
#[derive(Debug, Serialize)]
pub struct PaymentMethodOption {
    pub method: PaymentMethod,
    pub label: &'static str,
}

/// Prefill response
#[derive(Debug, Serialize)]
pub struct PrefillResponse {
    /// Draft with the submitter name taken from the profile
    pub draft: SubmissionDraft,

    /// Always `idle` for a fresh draft
    pub status: SubmissionStatus,

    pub payment_methods: Vec<PaymentMethodOption>,

    /// File types the picker offers
    pub accepted_extensions: Vec<&'static str>,
}

/// Submit request
///
/// Omitted fields keep their prefilled values: `name` the profile name,
/// `payment` an empty credit card, `amount` the configured default.
#[derive(Debug, Deserialize, Validate)]
pub struct SubmitRequest {
    #[validate(length(max = 255, message = "Name must be at most 255 characters"))]
    pub name: Option<String>,

    #[serde(default)]
    #[validate(length(max = 255, message = "Title must be at most 255 characters"))]
    pub title: String,

    pub file: Option<SelectedFile>,

    pub payment: Option<PaymentDetails>,

    pub amount: Option<Decimal>,
}

impl SubmitRequest {
    fn into_updates(self) -> Vec<DraftUpdate> {
        let mut updates = Vec::with_capacity(5);
        if let Some(name) = self.name {
            updates.push(DraftUpdate::Name(name));
        }
        updates.push(DraftUpdate::Title(self.title));
        updates.push(DraftUpdate::File(self.file));
        if let Some(payment) = self.payment {
            updates.push(DraftUpdate::Payment(payment));
        }
        if let Some(amount) = self.amount {
            updates.push(DraftUpdate::Amount(amount));
        }
        updates
    }
}

/// Submit response
#[derive(Debug, Serialize)]
pub struct SubmissionResponse {
    pub status: SubmissionStatus,

    /// Status banner text, absent while idle
    #[serde(skip_serializing_if = "Option::is_none")]
    pub banner: Option<&'static str>,

    /// Notices emitted while processing, in order
    pub notices: Vec<Notice>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect: Option<Route>,

    /// Whether the selected file has an accepted extension (not enforced)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_type_accepted: Option<bool>,

    /// Fields missing or invalid in a rejected draft
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub missing_fields: Vec<&'static str>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignment_id: Option<Uuid>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_id: Option<Uuid>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<Decimal>,
}

struct Collaborators {
    notifier: Arc<RecordingNotifier>,
    navigator: Arc<RecordingNavigator>,
}

fn controller_for(state: &AppState, auth: &AuthContext) -> (SubmissionController, Collaborators) {
    let collaborators = Collaborators {
        notifier: Arc::new(RecordingNotifier::default()),
        navigator: Arc::new(RecordingNavigator::default()),
    };

    let controller = SubmissionController::new(
        state.submissions.clone(),
        Arc::new(BearerSession::new(state.identity.clone(), auth.token.clone())),
        collaborators.notifier.clone(),
        collaborators.navigator.clone(),
    )
    .with_policy(state.config.submission.partial_failure_policy)
    .with_amount(state.config.submission.default_amount);

    (controller, collaborators)
}

/// Session gate for the submission page
///
/// # Endpoint
///
/// ```text
/// GET /v1/assignment-submission
/// Authorization: Bearer <access token>
/// ```
///
/// # Errors
///
/// - `401 Unauthorized`: No session (body carries `redirect: "/auth"`)
pub async fn prefill(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<PrefillResponse>> {
    let (mut controller, _collaborators) = controller_for(&state, &auth);

    match controller.activate().await {
        GateOutcome::Ready(_) => Ok(Json(PrefillResponse {
            draft: controller.draft().clone(),
            status: controller.status(),
            payment_methods: PaymentMethod::ALL
                .into_iter()
                .map(|method| PaymentMethodOption {
                    method,
                    label: method.label(),
                })
                .collect(),
            accepted_extensions: ACCEPTED_EXTENSIONS.to_vec(),
        })),
        GateOutcome::Redirected(_) => {
            Err(ApiError::Unauthorized(LOGIN_REQUIRED_MESSAGE.to_string()))
        }
    }
}

/// Validate and record a submission
///
/// # Endpoint
///
/// ```text
/// POST /v1/assignment-submission
/// Authorization: Bearer <access token>
/// Content-Type: application/json
///
/// {
///   "title": "Essay 1",
///   "file": { "name": "essay.pdf", "size": 48213 },
///   "payment": { "method": "credit_card", "card_number": "4242...", "expiry": "12/30", "cvc": "123" },
///   "amount": "20"
/// }
/// ```
///
/// # Responses
///
/// - `201 Created`: both records written; body has the IDs and transaction reference
/// - `401 Unauthorized`: session gone; body has `redirect: "/auth"`
/// - `409 Conflict`: another submission from this user is in flight
/// - `422 Unprocessable Entity`: draft rejected (including an amount that is not
///   positive, finer than a cent or too large); body lists `missing_fields`
/// - `500 Internal Server Error`: an insert failed
pub async fn submit(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<SubmitRequest>,
) -> ApiResult<(StatusCode, Json<SubmissionResponse>)> {
    req.validate()?;

    let (mut controller, collaborators) = controller_for(&state, &auth);
    controller.update(DraftUpdate::Name(auth.session.display_name().to_string()));
    for update in req.into_updates() {
        controller.update(update);
    }

    let outcome = controller.submit().await;

    let mut response = SubmissionResponse {
        status: controller.status(),
        banner: controller.status().banner(),
        notices: collaborators.notifier.notices(),
        redirect: collaborators.navigator.last(),
        file_type_accepted: controller
            .draft()
            .file
            .as_ref()
            .map(SelectedFile::has_accepted_extension),
        missing_fields: Vec::new(),
        assignment_id: None,
        payment_id: None,
        transaction_id: None,
        amount: None,
    };

    let status = match outcome {
        SubmissionOutcome::Submitted {
            assignment,
            payment,
        } => {
            response.assignment_id = Some(assignment.id);
            response.payment_id = Some(payment.id);
            response.transaction_id = Some(payment.transaction_id);
            response.amount = Some(payment.amount);
            StatusCode::CREATED
        }
        SubmissionOutcome::Rejected(failure) => {
            response.missing_fields = failure.missing;
            StatusCode::UNPROCESSABLE_ENTITY
        }
        SubmissionOutcome::Redirected(_) => StatusCode::UNAUTHORIZED,
        SubmissionOutcome::Failed(SubmissionError::AssignmentWrite(_)) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
        SubmissionOutcome::Failed(SubmissionError::PaymentWrite { assignment_id, .. }) => {
            response.assignment_id = Some(assignment_id);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    Ok((status, Json(response)))
}
