/// Authentication and session utilities
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and strength checks
/// - [`jwt`]: access/refresh token generation and validation
/// - [`identity`]: sign-up, password sign-in and session lookup
/// - [`session`]: the session value, session providers and the session gate
/// - [`middleware`]: bearer-token extraction for Axum handlers
///
/// # Example
///
/// ```no_run
/// use assignpay_shared::auth::password::{hash_password, verify_password};
/// use assignpay_shared::auth::jwt::{create_token, validate_token, Claims, TokenType};
/// use assignpay_shared::models::user::UserType;
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("user_password1")?;
/// assert!(verify_password("user_password1", &hash)?);
///
/// let claims = Claims::new(Uuid::new_v4(), "student@example.com", None, UserType::User, TokenType::Access);
/// let token = create_token(&claims, "secret-key-at-least-32-bytes-long!!")?;
/// validate_token(&token, "secret-key-at-least-32-bytes-long!!")?;
/// # Ok(())
/// # }
/// ```

pub mod identity;
pub mod jwt;
pub mod middleware;
pub mod password;
pub mod session;
