//! # AssignPay Shared Library
//!
//! Domain types and business logic used by the AssignPay API server.
//!
//! ## Module Organization
//!
//! - `auth`: Passwords, tokens, identity and the session gate
//! - `db`: Connection pool and embedded migrations
//! - `models`: Database models (users, assignments, payments)
//! - `store`: Persistence traits with PostgreSQL and in-memory backends
//! - `submission`: Draft, validation and the submission workflow

pub mod auth;
pub mod db;
pub mod models;
pub mod store;
pub mod submission;

/// Current version of the AssignPay shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
