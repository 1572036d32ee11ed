use chrono::Utc;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::password::{self, PasswordError};
use crate::auth::{TokenError, TokenService};
use crate::database::models::User;
use crate::database::store::{Collection, DatabaseError, DocumentStore, Filter};
use crate::database::FieldErrors;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Email already registered")]
    EmailTaken,

    /// Unknown email and wrong password are deliberately the same error.
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Validation failed")]
    Validation(FieldErrors),

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error(transparent)]
    Store(#[from] DatabaseError),

    #[error("Background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Lowercased, trimmed email.
pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Accepts `local@domain.tld` with no whitespace.
fn check_email(email: &str) -> Result<(), String> {
    let Some((local, domain)) = email.split_once('@') else {
        return Err("must be a valid email address".to_string());
    };

    let valid = !local.is_empty()
        && !domain.contains('@')
        && !email.chars().any(char::is_whitespace)
        && domain
            .rsplit_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty());

    if valid {
        Ok(())
    } else {
        Err("must be a valid email address".to_string())
    }
}

/// Account registration, credential checks and user lookup.
#[derive(Clone)]
pub struct UserRegistry {
    store: Arc<dyn DocumentStore>,
    tokens: TokenService,
}

impl UserRegistry {
    pub fn new(store: Arc<dyn DocumentStore>, tokens: TokenService) -> Self {
        Self { store, tokens }
    }

    pub async fn register(
        &self,
        email: &str,
        name: Option<String>,
        password: String,
    ) -> Result<(User, String), AuthError> {
        let email = normalize_email(email);

        let mut errors = FieldErrors::default();
        if let Err(message) = check_email(&email) {
            errors.add("email", message);
        }
        if password.is_empty() {
            errors.add("password", "must not be empty");
        }
        errors.into_result().map_err(AuthError::Validation)?;

        let password_hash = tokio::task::spawn_blocking(move || password::hash(&password)).await??;
        let name = name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty());

        let body = User::new_body(&email, name, password_hash, Utc::now());
        let doc = match self.store.insert(Collection::Users, None, body).await {
            Ok(doc) => doc,
            Err(DatabaseError::Duplicate(_)) => return Err(AuthError::EmailTaken),
            Err(e) => return Err(e.into()),
        };

        let user = User::from_document(doc)?;
        let token = self.tokens.issue(user.id)?;
        info!("Registered user {}", user.id);
        Ok((user, token))
    }

    pub async fn authenticate(&self, email: &str, password: String) -> Result<(User, String), AuthError> {
        let filter = Filter::Field {
            name: "email",
            value: normalize_email(email),
        };

        let Some(doc) = self.store.find_one(Collection::Users, &filter).await? else {
            tokio::task::spawn_blocking(move || password::verify_decoy(&password)).await?;
            warn!("Login rejected for unknown email");
            return Err(AuthError::InvalidCredentials);
        };

        let user = User::from_document(doc)?;
        let stored = user.password_hash.clone();
        let matches = tokio::task::spawn_blocking(move || password::verify(&password, &stored)).await?;
        if !matches {
            warn!("Login rejected for user {}", user.id);
            return Err(AuthError::InvalidCredentials);
        }

        let token = self.tokens.issue(user.id)?;
        info!("User {} logged in", user.id);
        Ok((user, token))
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AuthError> {
        match self.store.find_one(Collection::Users, &Filter::Id(id)).await? {
            Some(doc) => Ok(Some(User::from_document(doc)?)),
            None => Ok(None),
        }
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }
}
