//! The authentication collaborator
//!
//! Task operations are gated behind a signed-in user. This module provides the
//! [`AuthSource`] seam, a [`RestAuth`] implementation against the hosted
//! backend's auth endpoints, and a [`MemoryAuth`] used by tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use thiserror::Error;
use url::Url;
use uuid::Uuid;

use crate::config::Settings;
use crate::task::ValidationError;

/// A shape check only: the backend remains the authority on what addresses it accepts
static EMAIL_SHAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap(/* the pattern is a constant */));

/// Check the e-mail and password before any remote call is made
pub fn validate_credentials(email: &str, password: &str) -> Result<(), ValidationError> {
    if !EMAIL_SHAPE.is_match(email) {
        return Err(ValidationError::MalformedEmail(email.to_string()));
    }
    if password.is_empty() {
        return Err(ValidationError::EmptyPassword);
    }
    Ok(())
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("not signed in")]
    Unauthenticated,
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("the backend rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("unknown e-mail or wrong password")]
    BadCredentials,
}

/// The signed-in identity
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct User {
    id: Uuid,
    email: String,
}

impl User {
    pub fn new(id: Uuid, email: String) -> Self {
        Self { id, email }
    }
    pub fn id(&self) -> &Uuid {
        &self.id
    }
    pub fn email(&self) -> &str {
        &self.email
    }
}

/// What a successful sign-in yields
#[derive(Clone, Debug, Deserialize)]
pub struct Session {
    access_token: String,
    user: User,
}

impl Session {
    pub fn access_token(&self) -> &str {
        &self.access_token
    }
    pub fn user(&self) -> &User {
        &self.user
    }
}

/// A source of user identity
#[async_trait]
pub trait AuthSource {
    /// The currently signed-in user, or [`AuthError::Unauthenticated`]
    async fn current_user(&self) -> Result<User, AuthError>;

    /// Register a new account. Does not sign the user in: the app sends them
    /// to the sign-in screen (with their credentials pre-filled via the
    /// key-value handoff)
    async fn sign_up(&self, email: &str, password: &str) -> Result<(), AuthError>;

    /// Exchange credentials for a session
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError>;

    async fn sign_out(&self) -> Result<(), AuthError>;
}

/// Auth against the hosted backend's GoTrue-style endpoints
pub struct RestAuth {
    base_url: Url,
    api_key: String,
    session: Mutex<Option<Session>>,
    http: reqwest::Client,
}

impl RestAuth {
    pub fn new(settings: &Settings) -> Self {
        Self {
            base_url: settings.base_url().clone(),
            api_key: settings.api_key().to_string(),
            session: Mutex::new(None),
            http: reqwest::Client::new(),
        }
    }

    /// The current session's access token, for wiring into a
    /// [`RestStore`](crate::store::rest::RestStore)
    pub fn access_token(&self) -> Option<String> {
        self.session
            .lock()
            .unwrap()
            .as_ref()
            .map(|s| s.access_token.clone())
    }

    fn auth_url(&self, endpoint: &str, query: &[(&str, &str)]) -> Url {
        let mut url = self.base_url.clone();
        url.set_path(&format!("auth/v1/{}", endpoint));
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query.iter());
        }
        url
    }

    async fn reject(response: reqwest::Response) -> AuthError {
        let status = response.status().as_u16();
        // GoTrue answers 400 with an error body on wrong credentials
        if status == 400 || status == 401 {
            return AuthError::BadCredentials;
        }
        let message = response.text().await.unwrap_or_default();
        AuthError::Rejected { status, message }
    }
}

#[async_trait]
impl AuthSource for RestAuth {
    async fn current_user(&self) -> Result<User, AuthError> {
        match &*self.session.lock().unwrap() {
            Some(session) => Ok(session.user.clone()),
            None => Err(AuthError::Unauthenticated),
        }
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<(), AuthError> {
        validate_credentials(email, password)?;

        let url = self.auth_url("signup", &[]);
        let response = self
            .http
            .post(url.as_str())
            .header("apikey", self.api_key.as_str())
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Self::reject(response).await);
        }
        log::info!("Signed up {}", email);
        Ok(())
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        validate_credentials(email, password)?;

        let url = self.auth_url("token", &[("grant_type", "password")]);
        let response = self
            .http
            .post(url.as_str())
            .header("apikey", self.api_key.as_str())
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Self::reject(response).await);
        }

        let session: Session = response.json().await?;
        *self.session.lock().unwrap() = Some(session.clone());
        log::info!("Signed in {}", session.user.email());
        Ok(session)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        let token = match self.access_token() {
            None => return Ok(()),
            Some(t) => t,
        };

        let url = self.auth_url("logout", &[]);
        let response = self
            .http
            .post(url.as_str())
            .header("apikey", self.api_key.as_str())
            .header("Authorization", format!("Bearer {}", token))
            .send()
            .await?;
        // The local session is gone either way
        *self.session.lock().unwrap() = None;
        if !response.status().is_success() {
            log::warn!("Server-side sign-out failed with {}", response.status());
        }
        Ok(())
    }
}

/// An in-memory account registry for tests
pub struct MemoryAuth {
    accounts: Mutex<HashMap<String, (Uuid, String)>>,
    session: Mutex<Option<Session>>,
}

impl MemoryAuth {
    pub fn new() -> Self {
        Self {
            accounts: Mutex::new(HashMap::new()),
            session: Mutex::new(None),
        }
    }
}

impl Default for MemoryAuth {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuthSource for MemoryAuth {
    async fn current_user(&self) -> Result<User, AuthError> {
        match &*self.session.lock().unwrap() {
            Some(session) => Ok(session.user.clone()),
            None => Err(AuthError::Unauthenticated),
        }
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<(), AuthError> {
        validate_credentials(email, password)?;
        self.accounts
            .lock()
            .unwrap()
            .insert(email.to_string(), (Uuid::new_v4(), password.to_string()));
        Ok(())
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        validate_credentials(email, password)?;
        let accounts = self.accounts.lock().unwrap();
        let (id, stored_password) = accounts.get(email).ok_or(AuthError::BadCredentials)?;
        if stored_password != password {
            return Err(AuthError::BadCredentials);
        }

        let session = Session {
            access_token: Uuid::new_v4().to_hyphenated().to_string(),
            user: User::new(*id, email.to_string()),
        };
        drop(accounts);
        *self.session.lock().unwrap() = Some(session.clone());
        Ok(session)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        *self.session.lock().unwrap() = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_shape_check() {
        assert!(validate_credentials("student@example.com", "hunter2").is_ok());

        for bad in &["", "no-at-sign", "two@at@signs.com ", "@example.com", "a@b", "a b@c.com"] {
            match validate_credentials(bad, "hunter2") {
                Err(ValidationError::MalformedEmail(_)) => {}
                other => panic!("expected MalformedEmail for '{}', got {:?}", bad, other),
            }
        }

        assert_eq!(
            validate_credentials("student@example.com", ""),
            Err(ValidationError::EmptyPassword)
        );
    }

    #[tokio::test]
    async fn memory_auth_round_trip() {
        let auth = MemoryAuth::new();
        assert!(matches!(auth.current_user().await, Err(AuthError::Unauthenticated)));

        auth.sign_up("student@example.com", "hunter2").await.unwrap();
        assert!(matches!(
            auth.sign_in("student@example.com", "wrong").await,
            Err(AuthError::BadCredentials)
        ));

        let session = auth.sign_in("student@example.com", "hunter2").await.unwrap();
        assert_eq!(session.user().email(), "student@example.com");

        let user = auth.current_user().await.unwrap();
        assert_eq!(user.id(), session.user().id());

        auth.sign_out().await.unwrap();
        assert!(matches!(auth.current_user().await, Err(AuthError::Unauthenticated)));
    }

    #[tokio::test]
    async fn sign_up_validates_before_any_remote_call() {
        let auth = MemoryAuth::new();
        assert!(matches!(
            auth.sign_up("not-an-email", "hunter2").await,
            Err(AuthError::Validation(ValidationError::MalformedEmail(_)))
        ));
        assert!(auth.accounts.lock().unwrap().is_empty());
    }
}
