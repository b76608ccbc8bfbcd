/// Persistence collaborators
///
/// The submission workflow and the identity layer never talk to sqlx
/// directly; they go through these traits so the backing store can be swapped.
///
/// # Implementations
///
/// - [`postgres::PgStore`]: PostgreSQL via the models in [`crate::models`]
/// - [`memory::MemoryStore`]: process-local maps, for tests and local runs
///   without a database. Supports injected write failures.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` to live in axum state behind an `Arc`.

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::assignment::{Assignment, CreateAssignment};
use crate::models::payment::{CreatePayment, Payment};
use crate::models::user::{CreateUser, User};

pub mod memory;
pub mod postgres;

/// Errors returned by a store implementation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// A unique constraint rejected the write (e.g. duplicate email)
    #[error("conflict: {0}")]
    Conflict(String),

    /// Any other constraint rejected the write (e.g. dangling foreign key)
    #[error("constraint violation: {0}")]
    Constraint(String),

    /// The referenced row does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// Backend failure (connection, serialization, poisoned lock)
    #[error("storage backend error: {0}")]
    Backend(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StoreError::NotFound("row not found".to_string()),
            sqlx::Error::Database(db_err) => {
                let constraint = db_err.constraint().unwrap_or("unknown").to_string();
                if db_err.is_unique_violation() {
                    StoreError::Conflict(constraint)
                } else if db_err.is_foreign_key_violation() || db_err.is_check_violation() {
                    StoreError::Constraint(constraint)
                } else {
                    StoreError::Backend(db_err.to_string())
                }
            }
            other => StoreError::Backend(other.to_string()),
        }
    }
}

/// Table-oriented persistence for assignments and payments
#[async_trait]
pub trait SubmissionStore: Send + Sync {
    /// Inserts into `assignments` and returns the stored row with its new ID
    async fn insert_assignment(&self, data: CreateAssignment) -> Result<Assignment, StoreError>;

    /// Inserts into `payments`; the referenced assignment must already exist
    async fn insert_payment(&self, data: CreatePayment) -> Result<Payment, StoreError>;

    /// Removes an assignment; only used to compensate a failed payment write
    async fn delete_assignment(&self, id: Uuid) -> Result<bool, StoreError>;

    async fn find_assignment(&self, id: Uuid) -> Result<Option<Assignment>, StoreError>;

    /// The user's assignments, newest first
    async fn list_assignments(&self, user_id: Uuid) -> Result<Vec<Assignment>, StoreError>;

    /// The user's payments, newest first
    async fn list_payments(&self, user_id: Uuid) -> Result<Vec<Payment>, StoreError>;

    /// Payments recorded against one assignment, oldest first
    async fn list_payments_for_assignment(
        &self,
        assignment_id: Uuid,
    ) -> Result<Vec<Payment>, StoreError>;

    /// Cheap reachability check for `/health`
    async fn ping(&self) -> Result<(), StoreError>;
}

/// Account persistence used by the identity layer
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Creates an account; duplicate emails fail with [`StoreError::Conflict`]
    async fn create_user(&self, data: CreateUser) -> Result<User, StoreError>;

    /// Case-insensitive lookup by email
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    /// Stamps `last_login_at`
    async fn touch_last_login(&self, id: Uuid) -> Result<(), StoreError>;
}
