//! Registration, login and bearer tokens.
//!
//! Passwords are stored as salted bcrypt hashes. Tokens are HS256 JWTs
//! carrying the user id and email.

use std::sync::Arc;
use std::time::Duration;

use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::config::AuthConfig;
use crate::storage::{NewUser, StoreError, User, UserStore};

/// Token payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub id: u64,
    pub email: String,
    pub iat: i64,
    pub exp: i64,
}

/// Body of `POST /api/register`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Body of `POST /api/login`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// User fields that are safe to return to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicUser {
    pub id: u64,
    pub name: String,
    pub email: String,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
        }
    }
}

/// Successful register/login response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSession {
    pub token: String,
    pub user: PublicUser,
}

/// Authentication failures.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("email and password required")]
    MissingField,

    #[error("email already in use")]
    EmailTaken,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("invalid token")]
    InvalidToken,

    #[error("Password hashing failed: {reason}")]
    Hashing { reason: String },

    #[error("Token signing failed: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for AuthError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::Duplicate { .. } => AuthError::EmailTaken,
            other => AuthError::Store(other),
        }
    }
}

impl AuthError {
    /// Whether the error is caused by the client rather than the server.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            AuthError::MissingField
                | AuthError::EmailTaken
                | AuthError::InvalidCredentials
                | AuthError::InvalidToken
        )
    }
}

/// Issues and checks credentials against the user store.
pub struct AuthService {
    store: Arc<UserStore>,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    token_ttl: Duration,
    bcrypt_cost: u32,
}

impl std::fmt::Debug for AuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService")
            .field("store", &self.store.path())
            .field("token_ttl", &self.token_ttl)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .finish_non_exhaustive()
    }
}

impl AuthService {
    /// Creates the service from auth configuration and a shared store.
    pub fn new(config: &AuthConfig, store: Arc<UserStore>) -> Self {
        Self {
            store,
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            token_ttl: config.token_ttl,
            bcrypt_cost: config.bcrypt_cost,
        }
    }

    /// The store this service reads and writes.
    pub fn store(&self) -> &UserStore {
        &self.store
    }

    /// Registers a new user and returns a session token.
    ///
    /// # Errors
    /// - `AuthError::MissingField` - Email or password missing or empty
    /// - `AuthError::EmailTaken` - Email already registered
    /// - `AuthError::Hashing` - bcrypt failed
    /// - `AuthError::Store` - The user file could not be written
    pub async fn register(&self, request: RegisterRequest) -> Result<AuthSession, AuthError> {
        let email = non_empty(request.email).ok_or(AuthError::MissingField)?;
        let password = non_empty(request.password).ok_or(AuthError::MissingField)?;

        // Cheap pre-check; the store re-checks under its write lock.
        if self.store.find_by_email(&email).await.is_some() {
            return Err(AuthError::EmailTaken);
        }

        let password_hash = self.hash_password(password).await?;
        let user = self
            .store
            .insert(NewUser {
                name: request.name.unwrap_or_default(),
                email,
                password_hash,
            })
            .await?;

        tracing::info!(user_id = user.id, "Registered user");
        self.session_for(&user)
    }

    /// Verifies credentials and returns a session token.
    ///
    /// # Errors
    /// - `AuthError::InvalidCredentials` - Unknown email or wrong password
    /// - `AuthError::Token` - Token signing failed
    pub async fn login(&self, request: LoginRequest) -> Result<AuthSession, AuthError> {
        let (Some(email), Some(password)) = (request.email, request.password) else {
            return Err(AuthError::InvalidCredentials);
        };

        let user = self
            .store
            .find_by_email(&email)
            .await
            .ok_or(AuthError::InvalidCredentials)?;

        if !self.verify_password(password, user.password_hash.clone()).await {
            tracing::debug!(user_id = user.id, "Login rejected");
            return Err(AuthError::InvalidCredentials);
        }

        self.session_for(&user)
    }

    /// Signs a token for `user` that expires after the configured lifetime.
    ///
    /// # Errors
    /// - `AuthError::Token` - Encoding failed
    pub fn issue_token(&self, user: &User) -> Result<String, AuthError> {
        let iat = chrono::Utc::now().timestamp();
        let ttl = i64::try_from(self.token_ttl.as_secs()).unwrap_or(i64::MAX);
        let claims = Claims {
            id: user.id,
            email: user.email.clone(),
            iat,
            exp: iat.saturating_add(ttl),
        };
        self.encode_claims(&claims)
    }

    /// Checks signature and expiry and returns the token's claims.
    ///
    /// # Errors
    /// - `AuthError::InvalidToken` - Bad signature, malformed token, or expired
    pub fn verify_token(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(token, &self.decoding_key, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!(error = %e, "Token rejected");
                AuthError::InvalidToken
            })
    }

    fn encode_claims(&self, claims: &Claims) -> Result<String, AuthError> {
        Ok(encode(&Header::default(), claims, &self.encoding_key)?)
    }

    fn session_for(&self, user: &User) -> Result<AuthSession, AuthError> {
        Ok(AuthSession {
            token: self.issue_token(user)?,
            user: PublicUser::from(user),
        })
    }

    async fn hash_password(&self, password: String) -> Result<String, AuthError> {
        let cost = self.bcrypt_cost;
        tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
            .await
            .map_err(|e| AuthError::Hashing {
                reason: e.to_string(),
            })?
            .map_err(|e| AuthError::Hashing {
                reason: e.to_string(),
            })
    }

    async fn verify_password(&self, password: String, hash: String) -> bool {
        match tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash)).await {
            Ok(Ok(matches)) => matches,
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "Stored password hash is unusable");
                false
            }
            Err(e) => {
                tracing::error!(error = %e, "Password verification task failed");
                false
            }
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn service(dir: &TempDir) -> AuthService {
        crate::test_fixtures::test_auth_service(dir)
    }

    fn register_request(email: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            name: Some("Asha".to_string()),
            email: Some(email.to_string()),
            password: Some(password.to_string()),
        }
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let dir = TempDir::new().unwrap();
        let auth = service(&dir);

        let registered = auth
            .register(register_request("asha@example.com", "hunter2"))
            .await
            .unwrap();
        assert_eq!(registered.user.email, "asha@example.com");
        assert_eq!(registered.user.name, "Asha");

        let session = auth
            .login(LoginRequest {
                email: Some("asha@example.com".to_string()),
                password: Some("hunter2".to_string()),
            })
            .await
            .unwrap();
        assert_eq!(session.user, registered.user);
    }

    #[tokio::test]
    async fn test_password_is_stored_hashed() {
        let dir = TempDir::new().unwrap();
        let auth = service(&dir);

        auth.register(register_request("h@example.com", "plain"))
            .await
            .unwrap();

        let stored = auth.store().find_by_email("h@example.com").await.unwrap();
        assert_ne!(stored.password_hash, "plain");
        assert!(stored.password_hash.starts_with("$2"));
    }

    #[tokio::test]
    async fn test_default_config_hashes_at_cost_ten() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(UserStore::new(dir.path().join("users.json")));
        let auth = AuthService::new(&AuthConfig::default(), store);

        auth.register(register_request("cost@example.com", "pw"))
            .await
            .unwrap();

        let stored = auth.store().find_by_email("cost@example.com").await.unwrap();
        assert!(stored.password_hash.starts_with("$2b$10$"));
    }

    #[tokio::test]
    async fn test_register_requires_email_and_password() {
        let dir = TempDir::new().unwrap();
        let auth = service(&dir);

        let missing_password = RegisterRequest {
            email: Some("x@example.com".to_string()),
            ..RegisterRequest::default()
        };
        assert!(matches!(
            auth.register(missing_password).await,
            Err(AuthError::MissingField)
        ));

        let empty_email = register_request("", "pw");
        assert!(matches!(
            auth.register(empty_email).await,
            Err(AuthError::MissingField)
        ));
    }

    #[tokio::test]
    async fn test_duplicate_registration_is_rejected() {
        let dir = TempDir::new().unwrap();
        let auth = service(&dir);

        auth.register(register_request("d@example.com", "pw"))
            .await
            .unwrap();
        let err = auth
            .register(register_request("d@example.com", "other"))
            .await
            .unwrap_err();

        assert!(matches!(err, AuthError::EmailTaken));
        assert!(err.is_client_error());
    }

    #[tokio::test]
    async fn test_wrong_password_and_unknown_email_look_the_same() {
        let dir = TempDir::new().unwrap();
        let auth = service(&dir);
        auth.register(register_request("w@example.com", "right"))
            .await
            .unwrap();

        let wrong = auth
            .login(LoginRequest {
                email: Some("w@example.com".to_string()),
                password: Some("wrong".to_string()),
            })
            .await
            .unwrap_err();
        let unknown = auth
            .login(LoginRequest {
                email: Some("nobody@example.com".to_string()),
                password: Some("right".to_string()),
            })
            .await
            .unwrap_err();

        assert_eq!(wrong.to_string(), unknown.to_string());
        assert!(matches!(wrong, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_token_decodes_to_registered_user() {
        let dir = TempDir::new().unwrap();
        let auth = service(&dir);

        let session = auth
            .register(register_request("t@example.com", "pw"))
            .await
            .unwrap();
        let claims = auth.verify_token(&session.token).unwrap();

        assert_eq!(claims.id, session.user.id);
        assert_eq!(claims.email, "t@example.com");
        assert_eq!(claims.exp - claims.iat, 7 * 24 * 60 * 60);
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let dir = TempDir::new().unwrap();
        let auth = service(&dir);
        let now = chrono::Utc::now().timestamp();

        let token = auth
            .encode_claims(&Claims {
                id: 1,
                email: "old@example.com".to_string(),
                iat: now - 7200,
                exp: now - 3600,
            })
            .unwrap();

        assert!(matches!(
            auth.verify_token(&token),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn test_token_signed_with_other_secret_is_rejected() {
        let dir = TempDir::new().unwrap();
        let auth = service(&dir);
        let other = AuthService::new(
            &AuthConfig {
                jwt_secret: "another-secret".to_string(),
                ..AuthConfig::default()
            },
            Arc::new(UserStore::new(dir.path().join("other.json"))),
        );
        let user = User {
            id: 7,
            name: String::new(),
            email: "x@example.com".to_string(),
            password_hash: String::new(),
        };

        let token = other.issue_token(&user).unwrap();

        assert!(auth.verify_token(&token).is_err());
        assert!(auth.verify_token("not-a-jwt").is_err());
    }
}
