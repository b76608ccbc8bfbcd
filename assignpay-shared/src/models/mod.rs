/// Database models for AssignPay
///
/// This module contains the persisted records and their CRUD operations.
///
/// # Models
///
/// - `user`: Accounts that can sign in and submit
/// - `assignment`: Submitted assignments
/// - `payment`: Simulated payments referencing an assignment
///
/// # Example
///
/// ```no_run
/// use assignpay_shared::models::assignment::{Assignment, CreateAssignment};
/// use assignpay_shared::db::pool::{create_pool, DatabaseConfig};
/// use uuid::Uuid;
///
/// # async fn example(user_id: Uuid) -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let assignment = Assignment::create(&pool, CreateAssignment::submitted(user_id, "Essay 1")).await?;
/// println!("Stored assignment {}", assignment.id);
/// # Ok(())
/// # }
/// ```

pub mod assignment;
pub mod payment;
pub mod user;
