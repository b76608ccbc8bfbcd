/// Assignment model and database operations
///
/// An assignment row is written exactly once per successful submission and is
/// never mutated afterwards. The only removal path is the compensating delete
/// issued when a submission is configured to undo a half-finished write.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE assignment_status AS ENUM ('submitted');
///
/// CREATE TABLE assignments (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     title VARCHAR(255) NOT NULL CHECK (length(title) > 0),
///     status assignment_status NOT NULL DEFAULT 'submitted',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Assignment lifecycle status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "assignment_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AssignmentStatus {
    /// Handed in by the student
    #[default]
    Submitted,
}

impl AssignmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssignmentStatus::Submitted => "submitted",
        }
    }
}

/// A submitted assignment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Assignment {
    /// Unique assignment ID
    pub id: Uuid,

    /// Owner (the submitting user)
    pub user_id: Uuid,

    /// Assignment title as typed by the student
    pub title: String,

    /// Lifecycle status
    pub status: AssignmentStatus,

    /// When the assignment was submitted
    pub created_at: DateTime<Utc>,
}

/// Input for inserting an assignment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateAssignment {
    /// Owner of the assignment
    pub user_id: Uuid,

    /// Title (non-empty)
    pub title: String,

    /// Status to write
    pub status: AssignmentStatus,
}

impl CreateAssignment {
    /// Creates insert input with the `submitted` status
    pub fn submitted(user_id: Uuid, title: impl Into<String>) -> Self {
        Self {
            user_id,
            title: title.into(),
            status: AssignmentStatus::Submitted,
        }
    }
}

impl Assignment {
    /// Builds an assignment from insert input without touching a database
    pub fn from_create(data: CreateAssignment) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: data.user_id,
            title: data.title,
            status: data.status,
            created_at: Utc::now(),
        }
    }

    /// Inserts an assignment and returns the stored row (including its ID)
    pub async fn create(pool: &PgPool, data: CreateAssignment) -> Result<Self, sqlx::Error> {
        let assignment = sqlx::query_as::<_, Assignment>(
            r#"
            INSERT INTO assignments (user_id, title, status)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, title, status, created_at
            "#,
        )
        .bind(data.user_id)
        .bind(data.title)
        .bind(data.status)
        .fetch_one(pool)
        .await?;

        Ok(assignment)
    }

    /// Finds an assignment by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let assignment = sqlx::query_as::<_, Assignment>(
            r#"
            SELECT id, user_id, title, status, created_at
            FROM assignments
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(assignment)
    }

    /// Lists a user's assignments, newest first
    pub async fn list_by_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let assignments = sqlx::query_as::<_, Assignment>(
            r#"
            SELECT id, user_id, title, status, created_at
            FROM assignments
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(assignments)
    }

    /// Deletes an assignment by ID
    ///
    /// Returns true if a row was removed.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM assignments WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
