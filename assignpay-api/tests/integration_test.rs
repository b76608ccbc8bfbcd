/// Integration tests for the AssignPay API
///
/// These drive the full router over an in-memory store:
/// - Account signup, login and token refresh
/// - The session gate in front of the submission page
/// - Submission outcomes (created, rejected, failed, conflicting)
/// - Reading back assignments and payments

mod common;

use assignpay_api::middleware::submission_guard::ALREADY_IN_FLIGHT_MESSAGE;
use assignpay_shared::store::memory::{FailurePlan, StoreOp};
use axum::http::StatusCode;
use common::{complete_submission, TestContext, TEST_PASSWORD};
use serde_json::json;

#[tokio::test]
async fn test_health_reports_memory_storage() {
    let ctx = TestContext::new();

    let (status, body) = ctx.request("GET", "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["storage"], "memory");
    assert_eq!(body["database"], "connected");
}

#[tokio::test]
async fn test_signup_points_at_submission_page() {
    let ctx = TestContext::new();

    let (status, body) = ctx
        .request(
            "POST",
            "/v1/auth/signup",
            None,
            Some(json!({
                "email": "ada@example.com",
                "password": TEST_PASSWORD,
                "full_name": "Ada Lovelace"
            })),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["next"], "/assignment-submission");
    assert_eq!(body["session"]["full_name"], "Ada Lovelace");
    assert!(body["access_token"].is_string());
}

#[tokio::test]
async fn test_duplicate_signup_conflicts() {
    let ctx = TestContext::new();
    let user = ctx.signup("Ada").await;

    let (status, body) = ctx
        .request(
            "POST",
            "/v1/auth/signup",
            None,
            Some(json!({
                "email": user.email.to_uppercase(),
                "password": TEST_PASSWORD
            })),
        )
        .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");
}

#[tokio::test]
async fn test_weak_password_rejected() {
    let ctx = TestContext::new();

    let (status, body) = ctx
        .request(
            "POST",
            "/v1/auth/signup",
            None,
            Some(json!({ "email": "ada@example.com", "password": "onlyletters" })),
        )
        .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["details"][0]["field"], "password");
}

#[tokio::test]
async fn test_login_and_bad_password() {
    let ctx = TestContext::new();
    let user = ctx.signup("Ada").await;

    let (status, body) = ctx
        .request(
            "POST",
            "/v1/auth/login",
            None,
            Some(json!({ "email": user.email, "password": TEST_PASSWORD })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["session"]["user_id"], user.id.to_string());

    let (status, body) = ctx
        .request(
            "POST",
            "/v1/auth/login",
            None,
            Some(json!({ "email": user.email, "password": "wrong-password-1" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid login credentials");
}

#[tokio::test]
async fn test_refresh_issues_usable_access_token() {
    let ctx = TestContext::new();
    let user = ctx.signup("Ada").await;

    let (status, body) = ctx
        .request(
            "POST",
            "/v1/auth/refresh",
            None,
            Some(json!({ "refresh_token": user.refresh_token })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let access = body["access_token"].as_str().unwrap();
    let (status, body) = ctx
        .request(
            "GET",
            "/v1/auth/session",
            Some(&format!("Bearer {}", access)),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], user.email);
}

#[tokio::test]
async fn test_access_token_is_not_a_refresh_token() {
    let ctx = TestContext::new();
    let user = ctx.signup("Ada").await;

    let (status, _) = ctx
        .request(
            "POST",
            "/v1/auth/refresh",
            None,
            Some(json!({ "refresh_token": user.access_token })),
        )
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_submission_page_requires_session() {
    let ctx = TestContext::new();

    let (status, body) = ctx
        .request("GET", "/v1/assignment-submission", None, None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["redirect"], "/auth");

    let (status, body) = ctx
        .request(
            "POST",
            "/v1/assignment-submission",
            Some("Bearer not-a-token"),
            Some(complete_submission("Essay 1")),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["redirect"], "/auth");
    assert!(ctx.store.operations().is_empty());
}

#[tokio::test]
async fn test_prefill_seeds_name_and_defaults() {
    let ctx = TestContext::new();
    let user = ctx.signup("Ada Lovelace").await;

    let (status, body) = ctx
        .request(
            "GET",
            "/v1/assignment-submission",
            Some(&user.auth_header()),
            None,
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["draft"]["name"], "Ada Lovelace");
    assert_eq!(body["draft"]["title"], "");
    assert_eq!(body["draft"]["amount"], "20");
    assert_eq!(body["draft"]["payment"]["method"], "credit_card");
    assert_eq!(body["status"], "idle");
    assert_eq!(body["payment_methods"].as_array().unwrap().len(), 3);
    assert_eq!(body["payment_methods"][1]["label"], "PayPal");
    assert!(body["accepted_extensions"]
        .as_array()
        .unwrap()
        .contains(&json!("pdf")));
}

#[tokio::test]
async fn test_submit_then_read_back() {
    let ctx = TestContext::new();
    let user = ctx.signup("Ada Lovelace").await;

    let (status, body) = ctx
        .request(
            "POST",
            "/v1/assignment-submission",
            Some(&user.auth_header()),
            Some(complete_submission("Essay 1")),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["status"], "success");
    assert_eq!(body["notices"][0]["kind"], "success");
    assert_eq!(body["amount"], "20");
    assert!(body["transaction_id"].as_str().unwrap().starts_with("CC-"));
    assert!(body.get("redirect").is_none());

    let assignment_id = body["assignment_id"].as_str().unwrap().to_string();
    let payment_id = body["payment_id"].as_str().unwrap().to_string();

    let (status, body) = ctx
        .request("GET", "/v1/assignments", Some(&user.auth_header()), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["assignments"].as_array().unwrap().len(), 1);
    assert_eq!(body["assignments"][0]["title"], "Essay 1");
    assert_eq!(body["assignments"][0]["status"], "submitted");

    let (status, body) = ctx
        .request(
            "GET",
            &format!("/v1/assignments/{}", assignment_id),
            Some(&user.auth_header()),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], assignment_id);
    assert_eq!(body["payments"][0]["id"], payment_id);
    assert_eq!(body["payments"][0]["payment_method"], "credit_card");
    assert_eq!(body["payments"][0]["status"], "pending");

    let (status, body) = ctx
        .request("GET", "/v1/payments", Some(&user.auth_header()), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["payments"][0]["assignment_id"], assignment_id);
}

#[tokio::test]
async fn test_submit_with_paypal_and_custom_amount() {
    let ctx = TestContext::new();
    let user = ctx.signup("Ada").await;

    let (status, body) = ctx
        .request(
            "POST",
            "/v1/assignment-submission",
            Some(&user.auth_header()),
            Some(json!({
                "title": "Lab report",
                "file": { "name": "report.docx" },
                "payment": { "method": "paypal", "email": "ada@example.com" },
                "amount": "35.50"
            })),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["amount"], "35.50");
    assert!(body["transaction_id"].as_str().unwrap().starts_with("PP-"));
}

#[tokio::test]
async fn test_missing_fields_rejected_without_writes() {
    let ctx = TestContext::new();
    let user = ctx.signup("Ada").await;

    let (status, body) = ctx
        .request(
            "POST",
            "/v1/assignment-submission",
            Some(&user.auth_header()),
            Some(json!({
                "title": "Essay 1",
                "payment": { "method": "credit_card", "card_number": "4242424242424242" }
            })),
        )
        .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["status"], "error");
    assert_eq!(body["notices"][0]["message"], "Please fill in all required fields");
    assert_eq!(body["missing_fields"], json!(["file"]));
    assert!(ctx.store.operations().is_empty());
}

#[tokio::test]
async fn test_incomplete_bank_details_rejected() {
    let ctx = TestContext::new();
    let user = ctx.signup("Ada").await;

    let (status, body) = ctx
        .request(
            "POST",
            "/v1/assignment-submission",
            Some(&user.auth_header()),
            Some(json!({
                "title": "Essay 1",
                "file": { "name": "essay.pdf" },
                "payment": { "method": "bank_transfer", "bank_name": "First Bank" }
            })),
        )
        .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        body["notices"][0]["message"],
        "Please fill in all bank transfer details"
    );
    assert_eq!(
        body["missing_fields"],
        json!(["account_number", "routing_number"])
    );
}

#[tokio::test]
async fn test_unstorable_amounts_rejected_before_writes() {
    let ctx = TestContext::new();
    let user = ctx.signup("Ada").await;

    for amount in ["0", "-5", "0.001", "100000000"] {
        let mut request = complete_submission("Essay 1");
        request["amount"] = json!(amount);

        let (status, body) = ctx
            .request(
                "POST",
                "/v1/assignment-submission",
                Some(&user.auth_header()),
                Some(request),
            )
            .await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "amount {}", amount);
        assert_eq!(body["missing_fields"], json!(["amount"]));
        assert_eq!(
            body["notices"][0]["message"],
            "Please enter a valid payment amount"
        );
    }

    assert!(ctx.store.operations().is_empty());
}

#[tokio::test]
async fn test_amount_bounds_accepted() {
    let ctx = TestContext::new();
    let user = ctx.signup("Ada").await;

    for amount in ["0.01", "99999999.99", "12.500"] {
        let mut request = complete_submission("Essay 1");
        request["amount"] = json!(amount);

        let (status, body) = ctx
            .request(
                "POST",
                "/v1/assignment-submission",
                Some(&user.auth_header()),
                Some(request),
            )
            .await;

        assert_eq!(status, StatusCode::CREATED, "amount {}: {}", amount, body);
    }

    assert_eq!(ctx.store.payments().len(), 3);
}

#[tokio::test]
async fn test_response_carries_banner_and_file_type() {
    let ctx = TestContext::new();
    let user = ctx.signup("Ada").await;

    let (status, body) = ctx
        .request(
            "POST",
            "/v1/assignment-submission",
            Some(&user.auth_header()),
            Some(complete_submission("Essay 1")),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["banner"], "Assignment submitted and payment processed!");
    assert_eq!(body["file_type_accepted"], true);

    let mut request = complete_submission("Essay 2");
    request["file"] = json!({ "name": "essay.zip" });
    let (status, body) = ctx
        .request(
            "POST",
            "/v1/assignment-submission",
            Some(&user.auth_header()),
            Some(request),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["file_type_accepted"], false);

    let (status, body) = ctx
        .request(
            "POST",
            "/v1/assignment-submission",
            Some(&user.auth_header()),
            Some(json!({ "title": "Essay 3" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        body["banner"],
        "Please fill in all required fields and payment information."
    );
    assert!(body.get("file_type_accepted").is_none());
}

#[tokio::test]
async fn test_payment_failure_keeps_assignment() {
    let ctx = TestContext::new();
    let user = ctx.signup("Ada").await;
    ctx.store.set_failures(FailurePlan {
        fail_payment_insert: true,
        ..FailurePlan::default()
    });

    let (status, body) = ctx
        .request(
            "POST",
            "/v1/assignment-submission",
            Some(&user.auth_header()),
            Some(complete_submission("Essay 1")),
        )
        .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["status"], "error");
    assert_eq!(body["notices"][0]["message"], "Failed to process payment");
    assert!(body["assignment_id"].is_string());

    assert_eq!(ctx.store.assignments().len(), 1);
    assert!(ctx.store.payments().is_empty());
}

#[tokio::test]
async fn test_payment_failure_compensated_when_configured() {
    let ctx = TestContext::with_env(&[("SUBMISSION_PARTIAL_FAILURE_POLICY", "compensate")]);
    let user = ctx.signup("Ada").await;
    ctx.store.set_failures(FailurePlan {
        fail_payment_insert: true,
        ..FailurePlan::default()
    });

    let (status, _) = ctx
        .request(
            "POST",
            "/v1/assignment-submission",
            Some(&user.auth_header()),
            Some(complete_submission("Essay 1")),
        )
        .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(ctx.store.assignments().is_empty());
    assert!(matches!(
        ctx.store.operations().last(),
        Some(StoreOp::DeleteAssignment { .. })
    ));
}

#[tokio::test]
async fn test_assignment_failure_reports_submit_error() {
    let ctx = TestContext::new();
    let user = ctx.signup("Ada").await;
    ctx.store.set_failures(FailurePlan {
        fail_assignment_insert: true,
        ..FailurePlan::default()
    });

    let (status, body) = ctx
        .request(
            "POST",
            "/v1/assignment-submission",
            Some(&user.auth_header()),
            Some(complete_submission("Essay 1")),
        )
        .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["notices"][0]["message"], "Failed to submit assignment");
    assert!(body.get("assignment_id").is_none());
    assert!(ctx.store.payments().is_empty());
}

#[tokio::test]
async fn test_second_submission_in_flight_conflicts() {
    let ctx = TestContext::new();
    let user = ctx.signup("Ada").await;
    let claim = ctx.state.in_flight.try_claim(user.id).unwrap();

    let (status, body) = ctx
        .request(
            "POST",
            "/v1/assignment-submission",
            Some(&user.auth_header()),
            Some(complete_submission("Essay 1")),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], ALREADY_IN_FLIGHT_MESSAGE);
    assert!(ctx.store.operations().is_empty());

    drop(claim);

    let (status, _) = ctx
        .request(
            "POST",
            "/v1/assignment-submission",
            Some(&user.auth_header()),
            Some(complete_submission("Essay 1")),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(!ctx.state.in_flight.is_claimed(user.id));
}

#[tokio::test]
async fn test_other_users_assignment_not_found() {
    let ctx = TestContext::new();
    let owner = ctx.signup("Ada").await;
    let other = ctx.signup("Grace").await;

    let (_, body) = ctx
        .request(
            "POST",
            "/v1/assignment-submission",
            Some(&owner.auth_header()),
            Some(complete_submission("Essay 1")),
        )
        .await;
    let assignment_id = body["assignment_id"].as_str().unwrap().to_string();

    let (status, _) = ctx
        .request(
            "GET",
            &format!("/v1/assignments/{}", assignment_id),
            Some(&other.auth_header()),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = ctx
        .request("GET", "/v1/assignments", Some(&other.auth_header()), None)
        .await;
    assert!(body["assignments"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_security_headers_on_responses() {
    let ctx = TestContext::new();

    let request = axum::http::Request::builder()
        .uri("/health")
        .body(axum::body::Body::empty())
        .unwrap();
    let response = tower::ServiceExt::oneshot(ctx.app.clone(), request)
        .await
        .unwrap();

    assert_eq!(
        response.headers().get("x-content-type-options").unwrap(),
        "nosniff"
    );
    assert_eq!(response.headers().get("cache-control").unwrap(), "no-store");
}
