/// Payment model and database operations
///
/// Payments are simulated: the row records the chosen method, the fee and a
/// locally generated transaction reference. No gateway is ever contacted, and
/// payment credentials are never stored.
///
/// A payment always references an assignment that was committed before it.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE payment_method AS ENUM ('credit_card', 'paypal', 'bank_transfer');
/// CREATE TYPE payment_status AS ENUM ('pending');
///
/// CREATE TABLE payments (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     assignment_id UUID NOT NULL REFERENCES assignments(id) ON DELETE CASCADE,
///     amount NUMERIC(10, 2) NOT NULL CHECK (amount > 0),
///     payment_method payment_method NOT NULL,
///     status payment_status NOT NULL DEFAULT 'pending',
///     transaction_id VARCHAR(64) NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Payment method tag
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payment_method", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Card number, expiry and CVC
    #[default]
    CreditCard,

    /// PayPal account email
    Paypal,

    /// Bank name, account number and routing number
    BankTransfer,
}

impl PaymentMethod {
    /// All supported methods, in display order
    pub const ALL: [PaymentMethod; 3] = [
        PaymentMethod::CreditCard,
        PaymentMethod::Paypal,
        PaymentMethod::BankTransfer,
    ];

    /// Gets the method tag as stored in the database
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::CreditCard => "credit_card",
            PaymentMethod::Paypal => "paypal",
            PaymentMethod::BankTransfer => "bank_transfer",
        }
    }

    /// Two-letter prefix used in generated transaction references
    pub fn transaction_prefix(&self) -> &'static str {
        match self {
            PaymentMethod::CreditCard => "CC",
            PaymentMethod::Paypal => "PP",
            PaymentMethod::BankTransfer => "BT",
        }
    }

    /// Human-readable label
    pub fn label(&self) -> &'static str {
        match self {
            PaymentMethod::CreditCard => "Credit Card",
            PaymentMethod::Paypal => "PayPal",
            PaymentMethod::BankTransfer => "Bank Transfer",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "credit_card" => Ok(PaymentMethod::CreditCard),
            "paypal" => Ok(PaymentMethod::Paypal),
            "bank_transfer" => Ok(PaymentMethod::BankTransfer),
            other => Err(format!("Unknown payment method: {}", other)),
        }
    }
}

/// Payment lifecycle status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payment_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    /// Recorded, never settled (no gateway)
    #[default]
    Pending,
}

/// A recorded payment attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Payment {
    /// Unique payment ID
    pub id: Uuid,

    /// Owner (the paying user)
    pub user_id: Uuid,

    /// Assignment this payment is for
    pub assignment_id: Uuid,

    /// Fee amount (positive)
    pub amount: Decimal,

    /// Method selected on the form
    pub payment_method: PaymentMethod,

    /// Lifecycle status (always pending)
    pub status: PaymentStatus,

    /// Locally generated reference, e.g. `CC-1717243200000-42`
    pub transaction_id: String,

    /// When the payment was recorded
    pub created_at: DateTime<Utc>,
}

/// Input for inserting a payment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatePayment {
    pub user_id: Uuid,
    pub assignment_id: Uuid,
    pub amount: Decimal,
    pub payment_method: PaymentMethod,
    pub status: PaymentStatus,
    pub transaction_id: String,
}

/// Largest amount the `NUMERIC(10, 2)` column holds
pub fn max_amount() -> Decimal {
    Decimal::new(99_999_999_99, 2)
}

/// Whether an amount is stored unchanged: positive, whole cents, within range
pub fn is_storable_amount(amount: Decimal) -> bool {
    amount > Decimal::ZERO && amount.normalize().scale() <= 2 && amount <= max_amount()
}

impl Payment {
    /// Builds a payment from insert input without touching a database
    pub fn from_create(data: CreatePayment) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: data.user_id,
            assignment_id: data.assignment_id,
            amount: data.amount,
            payment_method: data.payment_method,
            status: data.status,
            transaction_id: data.transaction_id,
            created_at: Utc::now(),
        }
    }

    /// Inserts a payment and returns the stored row
    ///
    /// # Errors
    ///
    /// Fails with a foreign key violation if `assignment_id` does not exist.
    pub async fn create(pool: &PgPool, data: CreatePayment) -> Result<Self, sqlx::Error> {
        let payment = sqlx::query_as::<_, Payment>(
            r#"
            INSERT INTO payments (user_id, assignment_id, amount, payment_method, status, transaction_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, user_id, assignment_id, amount, payment_method, status,
                      transaction_id, created_at
            "#,
        )
        .bind(data.user_id)
        .bind(data.assignment_id)
        .bind(data.amount)
        .bind(data.payment_method)
        .bind(data.status)
        .bind(data.transaction_id)
        .fetch_one(pool)
        .await?;

        Ok(payment)
    }

    /// Lists a user's payments, newest first
    pub async fn list_by_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let payments = sqlx::query_as::<_, Payment>(
            r#"
            SELECT id, user_id, assignment_id, amount, payment_method, status,
                   transaction_id, created_at
            FROM payments
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(payments)
    }

    /// Lists payments recorded against one assignment
    pub async fn list_by_assignment(
        pool: &PgPool,
        assignment_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let payments = sqlx::query_as::<_, Payment>(
            r#"
            SELECT id, user_id, assignment_id, amount, payment_method, status,
                   transaction_id, created_at
            FROM payments
            WHERE assignment_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(assignment_id)
        .fetch_all(pool)
        .await?;

        Ok(payments)
    }
}
