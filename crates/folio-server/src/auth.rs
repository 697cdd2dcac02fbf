// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Authentication and authorization
//!
//! The configured administrator is checked first, then accounts stored in
//! the `users` collection. A successful login yields an HS256 session token
//! that the admin routes expect as `Authorization: Bearer <token>`.

use crate::config::{AdminAccount, AuthConfig, DEV_SESSION_SECRET};
use crate::error::{ServerError, ServerResult};
use crate::services::single_field;
use crate::state::AppState;
use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use chrono::{DateTime, Duration, Utc};
use folio_api_contract::{collections, LoginRequest, LoginResponse, SessionUser, User, UserRole};
use folio_local_db::{Collection, Database};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use tracing::{debug, warn};

/// Id reported for the configured administrator
pub const DEFAULT_ADMIN_ID: &str = "default-admin-id";

const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// JWT claims
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    pub name: String,
    pub role: UserRole,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn user(&self) -> SessionUser {
        SessionUser {
            id: self.sub.clone(),
            email: self.email.clone(),
            name: self.name.clone(),
            role: self.role,
        }
    }

    pub fn issued_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.iat, 0).unwrap_or_default()
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.exp, 0).unwrap_or_default()
    }
}

/// Pick the session signing secret
///
/// A configured secret always wins. Without one, startup fails unless the
/// development secret was explicitly allowed.
pub fn resolve_session_secret(config: &AuthConfig) -> anyhow::Result<String> {
    match config.session_secret.as_deref() {
        Some(secret) if !secret.is_empty() => Ok(secret.to_string()),
        _ if config.allow_dev_secret => {
            warn!("No session secret configured, using the development secret");
            Ok(DEV_SESSION_SECRET.to_string())
        }
        _ => anyhow::bail!(
            "A session secret is required: set FOLIO_SESSION_SECRET or pass --allow-dev-secret"
        ),
    }
}

/// Hash a password into an argon2 PHC string
pub fn hash_password(password: &str) -> ServerResult<String> {
    let salt = SaltString::encode_b64(&rand::random::<[u8; 16]>())
        .map_err(|e| ServerError::Internal(format!("Failed to create salt: {}", e)))?;
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ServerError::Internal(format!("Failed to hash password: {}", e)))
}

/// Check a password against a stored PHC string; malformed hashes never match
pub fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok(),
        Err(e) => {
            warn!(error = %e, "Stored password hash is malformed");
            false
        }
    }
}

/// Compare credentials without an early exit on the first differing byte
fn credentials_match(email: &str, password: &str, admin: &AdminAccount) -> bool {
    let email_eq = email.as_bytes().ct_eq(admin.email.as_bytes());
    let password_eq = password.as_bytes().ct_eq(admin.password.as_bytes());
    (email_eq & password_eq).into()
}

/// Issues and verifies session tokens
pub struct AuthService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    session_ttl: Duration,
    admin: AdminAccount,
    users: Collection<User>,
}

impl std::fmt::Debug for AuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService")
            .field("session_ttl", &self.session_ttl)
            .field("admin", &self.admin)
            .finish_non_exhaustive()
    }
}

impl AuthService {
    pub fn new(secret: &str, config: &AuthConfig, admin: AdminAccount, db: &Database) -> Self {
        let ttl_secs = i64::try_from(config.session_ttl_secs).unwrap_or(i64::MAX);
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            session_ttl: Duration::try_seconds(ttl_secs).unwrap_or(Duration::days(1)),
            admin,
            users: db.typed(collections::USERS),
        }
    }

    /// Check credentials and open a session
    pub async fn login(&self, request: &LoginRequest) -> ServerResult<LoginResponse> {
        let user = self.authenticate(&request.email, &request.password).await?;
        debug!(user_id = %user.id, "Login succeeded");
        self.issue(user)
    }

    async fn authenticate(&self, email: &str, password: &str) -> ServerResult<SessionUser> {
        if credentials_match(email, password, &self.admin) {
            return Ok(SessionUser {
                id: DEFAULT_ADMIN_ID.to_string(),
                email: self.admin.email.clone(),
                name: self.admin.name.clone(),
                role: UserRole::Admin,
            });
        }

        let stored = match self.users.find_one(&single_field("email", email)).await {
            Ok(user) => user,
            Err(e) => {
                warn!(error = %e, "User lookup failed during login");
                None
            }
        };

        match stored {
            Some(user) if verify_password(password, &user.password) => Ok(SessionUser {
                id: user.id,
                email: user.email,
                name: user.full_name,
                role: user.role,
            }),
            _ => Err(ServerError::Auth(INVALID_CREDENTIALS.to_string())),
        }
    }

    /// Sign a session token for `user`
    pub fn issue(&self, user: SessionUser) -> ServerResult<LoginResponse> {
        let issued_at = Utc::now();
        let expires_at = issued_at + self.session_ttl;
        let claims = Claims {
            sub: user.id.clone(),
            email: user.email.clone(),
            name: user.name.clone(),
            role: user.role,
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| ServerError::Internal(format!("Failed to sign session token: {}", e)))?;

        Ok(LoginResponse {
            token,
            token_type: "Bearer".to_string(),
            expires_at: claims.expires_at(),
            user,
        })
    }

    /// Validate a session token
    pub fn verify(&self, token: &str) -> ServerResult<Claims> {
        let validation = Validation::new(Algorithm::HS256);
        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|_| ServerError::Auth("Invalid or expired session token".to_string()))
    }
}

/// Token from an `Authorization: Bearer` header
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Reject requests without a valid session; stores the [`Claims`] as an extension
pub async fn require_admin(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ServerError> {
    let token = bearer_token(req.headers())
        .ok_or_else(|| ServerError::Auth("Authentication required".to_string()))?;
    let claims = state.auth.verify(token)?;
    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use folio_local_db::CollectionOptions;

    fn service(db: &Database) -> AuthService {
        AuthService::new(
            "unit-test-secret",
            &AuthConfig::default(),
            AdminAccount::default(),
            db,
        )
    }

    #[test]
    fn password_hashes_verify() {
        let hash = hash_password("correct horse").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("correct horse", &hash));
        assert!(!verify_password("battery staple", &hash));
        assert!(!verify_password("correct horse", "not-a-hash"));
    }

    #[test]
    fn secret_is_required_unless_dev_allowed() {
        assert!(resolve_session_secret(&AuthConfig::default()).is_err());

        let dev = AuthConfig {
            allow_dev_secret: true,
            ..Default::default()
        };
        assert_eq!(resolve_session_secret(&dev).unwrap(), DEV_SESSION_SECRET);

        let configured = AuthConfig {
            session_secret: Some("abc".into()),
            ..Default::default()
        };
        assert_eq!(resolve_session_secret(&configured).unwrap(), "abc");
    }

    #[test]
    fn bearer_token_parsing() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer tok.en"));
        assert_eq!(bearer_token(&headers), Some("tok.en"));
    }

    #[tokio::test]
    async fn configured_admin_logs_in() {
        let db = Database::open_in_memory(CollectionOptions::default()).unwrap();
        let auth = service(&db);

        let response = auth
            .login(&LoginRequest {
                email: "admin@madebywael.com".into(),
                password: "Admin123!".into(),
            })
            .await
            .unwrap();
        assert_eq!(response.user.id, DEFAULT_ADMIN_ID);
        assert_eq!(response.token_type, "Bearer");

        let claims = auth.verify(&response.token).unwrap();
        assert_eq!(claims.email, "admin@madebywael.com");
        assert_eq!(claims.exp - claims.iat, 86_400);
    }

    #[test]
    fn admin_credentials_must_both_match() {
        let admin = AdminAccount::default();
        assert!(credentials_match("admin@madebywael.com", "Admin123!", &admin));
        assert!(!credentials_match("admin@madebywael.com", "Admin123?", &admin));
        assert!(!credentials_match("admin@madebywael.com", "Admin123!!", &admin));
        assert!(!credentials_match("someone@madebywael.com", "Admin123!", &admin));
        assert!(!credentials_match("", "", &admin));
    }

    #[tokio::test]
    async fn wrong_admin_password_is_rejected() {
        let db = Database::open_in_memory(CollectionOptions::default()).unwrap();
        let err = service(&db)
            .login(&LoginRequest {
                email: "admin@madebywael.com".into(),
                password: "admin123!".into(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.to_problem().detail, INVALID_CREDENTIALS);
    }

    #[tokio::test]
    async fn stored_user_logs_in_with_hashed_password() {
        let db = Database::open_in_memory(CollectionOptions::default()).unwrap();
        let users: Collection<User> = db.typed(collections::USERS);
        users
            .create(&User {
                email: "editor@example.com".into(),
                password: hash_password("pa55word").unwrap(),
                full_name: "Editor".into(),
                ..Default::default()
            })
            .await
            .unwrap();
        let auth = service(&db);

        let ok = auth
            .login(&LoginRequest {
                email: "editor@example.com".into(),
                password: "pa55word".into(),
            })
            .await
            .unwrap();
        assert_eq!(ok.user.name, "Editor");

        let err = auth
            .login(&LoginRequest {
                email: "editor@example.com".into(),
                password: "wrong".into(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.to_problem().detail, INVALID_CREDENTIALS);
    }

    #[test]
    fn tokens_from_other_secrets_are_rejected() {
        let db = Database::open_in_memory(CollectionOptions::default()).unwrap();
        let ours = service(&db);
        let theirs = AuthService::new(
            "another-secret",
            &AuthConfig::default(),
            AdminAccount::default(),
            &db,
        );
        let issued = theirs
            .issue(SessionUser {
                id: "x".into(),
                email: "x@example.com".into(),
                name: "X".into(),
                role: UserRole::Admin,
            })
            .unwrap();
        assert!(ours.verify(&issued.token).is_err());
        assert!(ours.verify("garbage").is_err());
    }
}
