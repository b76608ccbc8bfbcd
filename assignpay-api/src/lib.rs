//! # AssignPay API Server Library
//!
//! HTTP surface for signing in, submitting an assignment with a simulated
//! payment, and reading back what was recorded.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration from the environment
//! - `error`: Error handling and HTTP response mapping
//! - `middleware`: Security headers and the one-submission-per-user guard
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
