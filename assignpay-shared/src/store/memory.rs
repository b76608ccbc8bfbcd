/// In-memory store for tests and database-less local runs
///
/// Mirrors the PostgreSQL constraints that matter to the workflow: unique
/// case-insensitive emails, the payment → assignment foreign key, and the
/// `NUMERIC(10, 2) CHECK (amount > 0)` payment amount (rounded to cents,
/// rejected when not positive or out of range). Writes
/// can be made to fail on demand through [`FailurePlan`], and every write
/// attempt is appended to an operation log so tests can assert ordering.
///
/// # Example
///
/// ```
/// use assignpay_shared::store::memory::{FailurePlan, MemoryStore, StoreOp};
///
/// let store = MemoryStore::new();
/// store.set_failures(FailurePlan {
///     fail_payment_insert: true,
///     ..Default::default()
/// });
/// assert!(store.operations().is_empty());
/// ```

use async_trait::async_trait;
use rust_decimal::{Decimal, RoundingStrategy};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use super::{StoreError, SubmissionStore, UserStore};
use crate::models::assignment::{Assignment, CreateAssignment};
use crate::models::payment::{max_amount, CreatePayment, Payment};
use crate::models::user::{CreateUser, User};

/// Which writes should fail
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FailurePlan {
    pub fail_assignment_insert: bool,
    pub fail_payment_insert: bool,
    pub fail_assignment_delete: bool,
}

/// A write attempt, recorded whether or not it succeeded
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOp {
    InsertAssignment { title: String },
    InsertPayment { assignment_id: Uuid, transaction_id: String },
    DeleteAssignment { id: Uuid },
}

#[derive(Debug, Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    assignments: Vec<Assignment>,
    payments: Vec<Payment>,
    operations: Vec<StoreOp>,
    failures: FailurePlan,
}

/// Process-local store implementing both store traits
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the failure plan for subsequent writes
    pub fn set_failures(&self, plan: FailurePlan) {
        if let Ok(mut tables) = self.tables.lock() {
            tables.failures = plan;
        }
    }

    /// Every write attempted so far, in order
    pub fn operations(&self) -> Vec<StoreOp> {
        self.tables
            .lock()
            .map(|t| t.operations.clone())
            .unwrap_or_default()
    }

    /// Snapshot of the `assignments` table
    pub fn assignments(&self) -> Vec<Assignment> {
        self.tables
            .lock()
            .map(|t| t.assignments.clone())
            .unwrap_or_default()
    }

    /// Snapshot of the `payments` table
    pub fn payments(&self) -> Vec<Payment> {
        self.tables
            .lock()
            .map(|t| t.payments.clone())
            .unwrap_or_default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>, StoreError> {
        self.tables
            .lock()
            .map_err(|_| StoreError::Backend("memory store lock poisoned".to_string()))
    }
}

fn newest_first<T, F>(mut rows: Vec<T>, created_at: F) -> Vec<T>
where
    F: Fn(&T) -> chrono::DateTime<chrono::Utc>,
{
    rows.sort_by(|a, b| created_at(b).cmp(&created_at(a)));
    rows
}

#[async_trait]
impl SubmissionStore for MemoryStore {
    async fn insert_assignment(&self, data: CreateAssignment) -> Result<Assignment, StoreError> {
        let mut tables = self.lock()?;
        tables.operations.push(StoreOp::InsertAssignment {
            title: data.title.clone(),
        });

        if tables.failures.fail_assignment_insert {
            return Err(StoreError::Backend("simulated assignment insert failure".to_string()));
        }
        if data.title.is_empty() {
            return Err(StoreError::Constraint("assignments_title_check".to_string()));
        }

        let assignment = Assignment::from_create(data);
        tables.assignments.push(assignment.clone());
        Ok(assignment)
    }

    async fn insert_payment(&self, mut data: CreatePayment) -> Result<Payment, StoreError> {
        let mut tables = self.lock()?;
        tables.operations.push(StoreOp::InsertPayment {
            assignment_id: data.assignment_id,
            transaction_id: data.transaction_id.clone(),
        });

        if tables.failures.fail_payment_insert {
            return Err(StoreError::Backend("simulated payment insert failure".to_string()));
        }
        if !tables.assignments.iter().any(|a| a.id == data.assignment_id) {
            return Err(StoreError::Constraint(
                "payments_assignment_id_fkey".to_string(),
            ));
        }

        data.amount = data
            .amount
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        if data.amount > max_amount() {
            return Err(StoreError::Backend("numeric field overflow".to_string()));
        }
        if data.amount <= Decimal::ZERO {
            return Err(StoreError::Constraint("payments_amount_check".to_string()));
        }

        let payment = Payment::from_create(data);
        tables.payments.push(payment.clone());
        Ok(payment)
    }

    async fn delete_assignment(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut tables = self.lock()?;
        tables.operations.push(StoreOp::DeleteAssignment { id });

        if tables.failures.fail_assignment_delete {
            return Err(StoreError::Backend("simulated assignment delete failure".to_string()));
        }

        let before = tables.assignments.len();
        tables.assignments.retain(|a| a.id != id);
        // ON DELETE CASCADE
        tables.payments.retain(|p| p.assignment_id != id);
        Ok(tables.assignments.len() < before)
    }

    async fn find_assignment(&self, id: Uuid) -> Result<Option<Assignment>, StoreError> {
        let tables = self.lock()?;
        Ok(tables.assignments.iter().find(|a| a.id == id).cloned())
    }

    async fn list_assignments(&self, user_id: Uuid) -> Result<Vec<Assignment>, StoreError> {
        let tables = self.lock()?;
        let rows = tables
            .assignments
            .iter()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect();
        Ok(newest_first(rows, |a: &Assignment| a.created_at))
    }

    async fn list_payments(&self, user_id: Uuid) -> Result<Vec<Payment>, StoreError> {
        let tables = self.lock()?;
        let rows = tables
            .payments
            .iter()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect();
        Ok(newest_first(rows, |p: &Payment| p.created_at))
    }

    async fn list_payments_for_assignment(
        &self,
        assignment_id: Uuid,
    ) -> Result<Vec<Payment>, StoreError> {
        let tables = self.lock()?;
        Ok(tables
            .payments
            .iter()
            .filter(|p| p.assignment_id == assignment_id)
            .cloned()
            .collect())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.lock().map(|_| ())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_user(&self, data: CreateUser) -> Result<User, StoreError> {
        let mut tables = self.lock()?;

        let taken = tables
            .users
            .values()
            .any(|u| u.email.eq_ignore_ascii_case(&data.email));
        if taken {
            return Err(StoreError::Conflict("users_email_key".to_string()));
        }

        let user = User::from_create(data);
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let tables = self.lock()?;
        Ok(tables
            .users
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let tables = self.lock()?;
        Ok(tables.users.get(&id).cloned())
    }

    async fn touch_last_login(&self, id: Uuid) -> Result<(), StoreError> {
        let mut tables = self.lock()?;
        let user = tables
            .users
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("user {}", id)))?;
        let now = chrono::Utc::now();
        user.last_login_at = Some(now);
        user.updated_at = now;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::payment::{PaymentMethod, PaymentStatus};
    use crate::models::user::UserType;
    use rust_decimal::Decimal;

    fn payment_for(user_id: Uuid, assignment_id: Uuid) -> CreatePayment {
        CreatePayment {
            user_id,
            assignment_id,
            amount: Decimal::new(20, 0),
            payment_method: PaymentMethod::CreditCard,
            status: PaymentStatus::Pending,
            transaction_id: "CC-1-1".to_string(),
        }
    }

    fn new_user(email: &str) -> CreateUser {
        CreateUser {
            email: email.to_string(),
            password_hash: "hash".to_string(),
            full_name: None,
            user_type: UserType::User,
        }
    }

    #[tokio::test]
    async fn test_payment_requires_existing_assignment() {
        let store = MemoryStore::new();
        let result = store
            .insert_payment(payment_for(Uuid::new_v4(), Uuid::new_v4()))
            .await;

        assert!(matches!(result, Err(StoreError::Constraint(_))));
        assert!(store.payments().is_empty());
    }

    #[tokio::test]
    async fn test_payment_amount_constraint() {
        let store = MemoryStore::new();
        let user_id = Uuid::new_v4();
        let assignment = store
            .insert_assignment(CreateAssignment::submitted(user_id, "Essay 1"))
            .await
            .unwrap();

        for (amount, constraint) in [
            (Decimal::ZERO, "payments_amount_check"),
            (Decimal::new(-1, 0), "payments_amount_check"),
            (Decimal::new(1, 3), "payments_amount_check"),
        ] {
            let result = store
                .insert_payment(CreatePayment {
                    amount,
                    ..payment_for(user_id, assignment.id)
                })
                .await;
            assert_eq!(result, Err(StoreError::Constraint(constraint.to_string())));
        }

        let result = store
            .insert_payment(CreatePayment {
                amount: Decimal::new(100_000_000, 0),
                ..payment_for(user_id, assignment.id)
            })
            .await;
        assert!(matches!(result, Err(StoreError::Backend(_))));
        assert!(store.payments().is_empty());

        let stored = store
            .insert_payment(CreatePayment {
                amount: Decimal::new(12345, 3),
                ..payment_for(user_id, assignment.id)
            })
            .await
            .unwrap();
        assert_eq!(stored.amount, Decimal::new(1235, 2));
    }

    #[tokio::test]
    async fn test_delete_cascades_to_payments() {
        let store = MemoryStore::new();
        let user_id = Uuid::new_v4();
        let assignment = store
            .insert_assignment(CreateAssignment::submitted(user_id, "Essay 1"))
            .await
            .unwrap();
        store
            .insert_payment(payment_for(user_id, assignment.id))
            .await
            .unwrap();

        assert!(store.delete_assignment(assignment.id).await.unwrap());
        assert!(store.assignments().is_empty());
        assert!(store.payments().is_empty());
        assert!(!store.delete_assignment(assignment.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_failure_plan_records_attempt() {
        let store = MemoryStore::new();
        store.set_failures(FailurePlan {
            fail_assignment_insert: true,
            ..Default::default()
        });

        let result = store
            .insert_assignment(CreateAssignment::submitted(Uuid::new_v4(), "Essay 1"))
            .await;

        assert!(matches!(result, Err(StoreError::Backend(_))));
        assert_eq!(
            store.operations(),
            vec![StoreOp::InsertAssignment {
                title: "Essay 1".to_string()
            }]
        );
        assert!(store.assignments().is_empty());
    }

    #[tokio::test]
    async fn test_lists_are_scoped_to_owner() {
        let store = MemoryStore::new();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        store
            .insert_assignment(CreateAssignment::submitted(alice, "Essay 1"))
            .await
            .unwrap();
        store
            .insert_assignment(CreateAssignment::submitted(bob, "Lab report"))
            .await
            .unwrap();

        let mine = store.list_assignments(alice).await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].title, "Essay 1");
    }

    #[tokio::test]
    async fn test_duplicate_email_is_case_insensitive() {
        let store = MemoryStore::new();
        store.create_user(new_user("Student@Example.com")).await.unwrap();

        let result = store.create_user(new_user("student@example.com")).await;
        assert!(matches!(result, Err(StoreError::Conflict(_))));

        let found = store.find_user_by_email("STUDENT@example.com").await.unwrap();
        assert!(found.is_some());
    }

    #[tokio::test]
    async fn test_touch_last_login() {
        let store = MemoryStore::new();
        let user = store.create_user(new_user("a@example.com")).await.unwrap();

        store.touch_last_login(user.id).await.unwrap();

        let reloaded = store.find_user_by_id(user.id).await.unwrap().unwrap();
        assert!(reloaded.last_login_at.is_some());
        assert!(store.touch_last_login(Uuid::new_v4()).await.is_err());
    }
}
