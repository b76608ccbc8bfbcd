/// Identity collaborator: accounts, password sign-in and session lookup
///
/// [`LocalIdentity`] is the built-in provider. It keeps accounts in a
/// [`UserStore`], hashes passwords with Argon2id and hands out signed
/// access/refresh tokens. Session lookup re-reads the account so a token for a
/// removed user no longer yields a session.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use assignpay_shared::auth::identity::{IdentityProvider, LocalIdentity, SignUpProfile};
/// use assignpay_shared::store::memory::MemoryStore;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let identity = LocalIdentity::new(Arc::new(MemoryStore::new()), "secret-key-at-least-32-bytes-long!!");
///
/// identity
///     .sign_up("student@example.com", "hunter2hunter2", SignUpProfile::default())
///     .await?;
/// let tokens = identity
///     .sign_in_with_password("student@example.com", "hunter2hunter2")
///     .await?;
///
/// let session = identity.get_session(&tokens.access_token).await?;
/// assert!(session.is_some());
/// # Ok(())
/// # }
/// ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

use super::jwt::{self, Claims, JwtError, TokenType};
use super::password::{self, PasswordError};
use super::session::{Session, SessionError, SessionProvider};
use crate::models::user::{CreateUser, User, UserType};
use crate::store::{StoreError, UserStore};

/// Errors surfaced by an identity provider
///
/// Every variant renders a message that can be shown to the user as-is.
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("Invalid login credentials")]
    InvalidCredentials,

    #[error("User already registered")]
    EmailTaken,

    /// Password rejected by the sign-up policy
    #[error("{0}")]
    WeakPassword(String),

    /// Token is malformed, expired or of the wrong type
    #[error("Invalid session: {0}")]
    InvalidToken(String),

    #[error("Identity service unavailable: {0}")]
    Backend(String),
}

impl From<StoreError> for IdentityError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(_) => IdentityError::EmailTaken,
            other => IdentityError::Backend(other.to_string()),
        }
    }
}

impl From<PasswordError> for IdentityError {
    fn from(err: PasswordError) -> Self {
        IdentityError::Backend(err.to_string())
    }
}

impl From<JwtError> for IdentityError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::CreateError(msg) => IdentityError::Backend(msg),
            other => IdentityError::InvalidToken(other.to_string()),
        }
    }
}

/// Profile attributes captured at sign-up
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SignUpProfile {
    pub full_name: Option<String>,

    #[serde(default)]
    pub user_type: UserType,
}

/// Tokens plus the session they describe
#[derive(Debug, Clone, Serialize)]
pub struct SessionTokens {
    pub access_token: String,
    pub refresh_token: String,
    pub session: Session,
}

/// Account and session operations
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Creates an account and signs it in
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        profile: SignUpProfile,
    ) -> Result<SessionTokens, IdentityError>;

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<SessionTokens, IdentityError>;

    /// Resolves an access token to a session
    ///
    /// Unusable tokens and unknown accounts are `Ok(None)`; `Err` means the
    /// lookup itself failed.
    async fn get_session(&self, access_token: &str) -> Result<Option<Session>, IdentityError>;

    /// Exchanges a refresh token for a new access token
    async fn refresh(&self, refresh_token: &str) -> Result<String, IdentityError>;
}

/// Identity provider backed by a [`UserStore`] and HS256 tokens
pub struct LocalIdentity {
    users: Arc<dyn UserStore>,
    secret: String,
}

impl LocalIdentity {
    pub fn new(users: Arc<dyn UserStore>, secret: impl Into<String>) -> Self {
        Self {
            users,
            secret: secret.into(),
        }
    }

    fn issue(&self, user: &User) -> Result<SessionTokens, IdentityError> {
        let access = Claims::new(
            user.id,
            user.email.clone(),
            user.full_name.clone(),
            user.user_type,
            TokenType::Access,
        );

        Ok(SessionTokens {
            access_token: jwt::create_token(&access, &self.secret)?,
            refresh_token: jwt::create_token(&access.reissue(TokenType::Refresh), &self.secret)?,
            session: Session::from_user(user),
        })
    }
}

#[async_trait]
impl IdentityProvider for LocalIdentity {
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        profile: SignUpProfile,
    ) -> Result<SessionTokens, IdentityError> {
        password::validate_password_strength(password).map_err(IdentityError::WeakPassword)?;

        let user = self
            .users
            .create_user(CreateUser {
                email: email.trim().to_string(),
                password_hash: password::hash_password(password)?,
                full_name: profile.full_name,
                user_type: profile.user_type,
            })
            .await?;

        info!(user_id = %user.id, user_type = %user.user_type, "User signed up");
        self.issue(&user)
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<SessionTokens, IdentityError> {
        let user = self
            .users
            .find_user_by_email(email.trim())
            .await?
            .ok_or(IdentityError::InvalidCredentials)?;

        if !password::verify_password(password, &user.password_hash)? {
            debug!(user_id = %user.id, "Password mismatch");
            return Err(IdentityError::InvalidCredentials);
        }

        self.users.touch_last_login(user.id).await?;

        info!(user_id = %user.id, "User signed in");
        self.issue(&user)
    }

    async fn get_session(&self, access_token: &str) -> Result<Option<Session>, IdentityError> {
        let claims = match jwt::validate_access_token(access_token, &self.secret) {
            Ok(claims) => claims,
            Err(e) => {
                debug!(error = %e, "Access token rejected");
                return Ok(None);
            }
        };

        let user = self.users.find_user_by_id(claims.sub).await?;
        Ok(user.as_ref().map(Session::from_user))
    }

    async fn refresh(&self, refresh_token: &str) -> Result<String, IdentityError> {
        let claims = jwt::validate_refresh_token(refresh_token, &self.secret)?;

        let user = self
            .users
            .find_user_by_id(claims.sub)
            .await?
            .ok_or_else(|| IdentityError::InvalidToken("User no longer exists".to_string()))?;

        let access = Claims::new(
            user.id,
            user.email,
            user.full_name,
            user.user_type,
            TokenType::Access,
        );
        Ok(jwt::create_token(&access, &self.secret)?)
    }
}

/// Session source bound to one bearer token
///
/// Lets the workflow re-confirm the caller's session against the identity
/// provider right before it writes.
pub struct BearerSession {
    identity: Arc<dyn IdentityProvider>,
    token: String,
}

impl BearerSession {
    pub fn new(identity: Arc<dyn IdentityProvider>, token: impl Into<String>) -> Self {
        Self {
            identity,
            token: token.into(),
        }
    }
}

#[async_trait]
impl SessionProvider for BearerSession {
    async fn get_session(&self) -> Result<Option<Session>, SessionError> {
        self.identity
            .get_session(&self.token)
            .await
            .map_err(|e| SessionError::Unavailable(e.to_string()))
    }
}
