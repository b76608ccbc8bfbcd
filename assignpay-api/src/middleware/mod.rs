/// Middleware modules for the API server
///
/// This module contains custom middleware for:
/// - Security headers
/// - Refusing concurrent submissions from one user

pub mod security;
pub mod submission_guard;
