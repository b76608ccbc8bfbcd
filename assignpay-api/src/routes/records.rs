/// Read-only views of the caller's submissions
///
/// # Endpoints
///
/// - `GET /v1/assignments` - The caller's assignments, newest first
/// - `GET /v1/assignments/:id` - One assignment with its payments
/// - `GET /v1/payments` - The caller's payments, newest first
///
/// Assignments owned by someone else are reported as not found.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use assignpay_shared::{
    auth::middleware::AuthContext,
    models::{assignment::Assignment, payment::Payment},
};
use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::Serialize;
use uuid::Uuid;

/// Assignment list response
#[derive(Debug, Serialize)]
pub struct AssignmentList {
    pub assignments: Vec<Assignment>,
}

/// Assignment detail response
#[derive(Debug, Serialize)]
pub struct AssignmentDetail {
    #[serde(flatten)]
    pub assignment: Assignment,

    /// Payments recorded against this assignment, oldest first
    pub payments: Vec<Payment>,
}

/// Payment list response
#[derive(Debug, Serialize)]
pub struct PaymentList {
    pub payments: Vec<Payment>,
}

pub async fn list_assignments(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<AssignmentList>> {
    let assignments = state.submissions.list_assignments(auth.user_id()).await?;

    Ok(Json(AssignmentList { assignments }))
}

/// Fetch one assignment
///
/// # Errors
///
/// - `404 Not Found`: No such assignment, or it belongs to another user
pub async fn get_assignment(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<AssignmentDetail>> {
    let assignment = state
        .submissions
        .find_assignment(id)
        .await?
        .filter(|a| a.user_id == auth.user_id())
        .ok_or_else(|| ApiError::NotFound(format!("Assignment {} not found", id)))?;

    let payments = state
        .submissions
        .list_payments_for_assignment(assignment.id)
        .await?;

    Ok(Json(AssignmentDetail {
        assignment,
        payments,
    }))
}

pub async fn list_payments(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<PaymentList>> {
    let payments = state.submissions.list_payments(auth.user_id()).await?;

    Ok(Json(PaymentList { payments }))
}
