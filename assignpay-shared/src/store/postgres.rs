/// PostgreSQL-backed store
///
/// Thin adapter from the store traits onto the sqlx model functions. Each
/// call is its own statement; nothing here opens a transaction, so the
/// assignment and payment writes of one submission are independent commits.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use super::{StoreError, SubmissionStore, UserStore};
use crate::db::pool::health_check;
use crate::models::assignment::{Assignment, CreateAssignment};
use crate::models::payment::{CreatePayment, Payment};
use crate::models::user::{CreateUser, User};

/// Store backed by a PostgreSQL pool
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl SubmissionStore for PgStore {
    async fn insert_assignment(&self, data: CreateAssignment) -> Result<Assignment, StoreError> {
        let assignment = Assignment::create(&self.pool, data).await?;
        debug!(assignment_id = %assignment.id, "Inserted assignment");
        Ok(assignment)
    }

    async fn insert_payment(&self, data: CreatePayment) -> Result<Payment, StoreError> {
        let payment = Payment::create(&self.pool, data).await?;
        debug!(payment_id = %payment.id, assignment_id = %payment.assignment_id, "Inserted payment");
        Ok(payment)
    }

    async fn delete_assignment(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(Assignment::delete(&self.pool, id).await?)
    }

    async fn find_assignment(&self, id: Uuid) -> Result<Option<Assignment>, StoreError> {
        Ok(Assignment::find_by_id(&self.pool, id).await?)
    }

    async fn list_assignments(&self, user_id: Uuid) -> Result<Vec<Assignment>, StoreError> {
        Ok(Assignment::list_by_user(&self.pool, user_id).await?)
    }

    async fn list_payments(&self, user_id: Uuid) -> Result<Vec<Payment>, StoreError> {
        Ok(Payment::list_by_user(&self.pool, user_id).await?)
    }

    async fn list_payments_for_assignment(
        &self,
        assignment_id: Uuid,
    ) -> Result<Vec<Payment>, StoreError> {
        Ok(Payment::list_by_assignment(&self.pool, assignment_id).await?)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(health_check(&self.pool).await?)
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn create_user(&self, data: CreateUser) -> Result<User, StoreError> {
        Ok(User::create(&self.pool, data).await?)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(User::find_by_email(&self.pool, email).await?)
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(User::find_by_id(&self.pool, id).await?)
    }

    async fn touch_last_login(&self, id: Uuid) -> Result<(), StoreError> {
        User::update_last_login(&self.pool, id).await?;
        Ok(())
    }
}
