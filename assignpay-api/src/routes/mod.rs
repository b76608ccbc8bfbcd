/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Account endpoints (signup, login, refresh, session)
/// - `submission`: The assignment submission page (prefill and submit)
/// - `records`: The caller's assignments and payments

pub mod auth;
pub mod health;
pub mod records;
pub mod submission;
