//! Authorization for the spreadsheet backend.
//!
//! A [`Credential`] is configuration; an [`AccessToken`] is the proof that it
//! was checked. Backend clients only accept the latter.

use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum AuthError {
    #[error("no access token configured")]
    Missing,
    #[error("access token expired at {0}")]
    Expired(DateTime<Utc>),
}

#[derive(Clone, Default)]
pub struct Credential {
    token: Option<Arc<str>>,
    expires_at: Option<DateTime<Utc>>,
}

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        let token: String = token.into();
        Credential {
            token: (!token.is_empty()).then(|| Arc::from(token)),
            expires_at: None,
        }
    }

    pub fn absent() -> Self {
        Self::default()
    }

    pub fn with_expiry(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    pub fn is_present(&self) -> bool {
        self.token.is_some()
    }

    pub fn authorize(&self, now: DateTime<Utc>) -> Result<AccessToken, AuthError> {
        let token = self.token.as_ref().ok_or(AuthError::Missing)?;
        match self.expires_at {
            Some(expires_at) if expires_at <= now => Err(AuthError::Expired(expires_at)),
            _ => Ok(AccessToken(token.clone())),
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// A bearer token that passed [`Credential::authorize`].
#[derive(Clone)]
pub struct AccessToken(Arc<str>);

impl AccessToken {
    pub fn secret(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(<redacted>)")
    }
}
