//! Access-token secrets and bearer authentication
//!
//! Secrets are 64 random bytes from the aws-lc-rs RNG, URL-safe base64
//! encoded. The stored [`AccessToken`] object is named by the SHA-256 hex
//! digest of the secret string; the plaintext exists only in the create
//! response.

use std::fmt;
use std::sync::Arc;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::debug;

use trellis_common::crd::AccessToken;
use trellis_common::hashing::sha256_hex;
use trellis_common::store::ObjectStore;
use trellis_common::{Error, Result};

use crate::principal::Principal;

const SECRET_BYTES: usize = 64;

/// Failure to produce a token secret
#[derive(Debug, Error)]
pub enum TokenError {
    /// The cryptographic RNG failed
    #[error("failed to generate cryptographically secure random bytes: RNG unavailable")]
    Generation,
}

impl From<TokenError> for Error {
    fn from(e: TokenError) -> Self {
        Error::internal_with_context("access_token", e.to_string())
    }
}

/// Object name of the AccessToken matching a presented secret
pub fn access_token_name(secret: &str) -> String {
    sha256_hex(secret.as_bytes())
}

/// A freshly minted access-token secret
#[derive(Clone)]
pub struct AccessTokenSecret {
    string: String,
}

impl AccessTokenSecret {
    /// Generate a new random secret
    pub fn generate() -> std::result::Result<Self, TokenError> {
        let mut raw = vec![0u8; SECRET_BYTES];
        aws_lc_rs::rand::fill(&mut raw).map_err(|_| TokenError::Generation)?;
        Ok(Self {
            string: URL_SAFE_NO_PAD.encode(&raw),
        })
    }

    /// The secret as handed to the client
    pub fn as_str(&self) -> &str {
        &self.string
    }

    /// Consume into the plaintext string
    pub fn into_string(self) -> String {
        self.string
    }

    /// Name of the AccessToken object storing this secret's grants
    pub fn object_name(&self) -> String {
        access_token_name(&self.string)
    }
}

impl fmt::Debug for AccessTokenSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessTokenSecret")
            .field("object_name", &self.object_name())
            .finish()
    }
}

/// Resolves bearer secrets to principals via stored AccessTokens
#[derive(Clone)]
pub struct TokenAuthenticator {
    tokens: Arc<dyn ObjectStore<AccessToken>>,
}

impl TokenAuthenticator {
    /// Authenticator backed by the given token store
    pub fn new(tokens: Arc<dyn ObjectStore<AccessToken>>) -> Self {
        Self { tokens }
    }

    /// Resolve a secret to its principal
    pub async fn authenticate(&self, secret: &str) -> Result<Principal> {
        self.authenticate_at(secret, Utc::now()).await
    }

    /// Resolve a secret, judging expiry against `now`
    pub async fn authenticate_at(&self, secret: &str, now: DateTime<Utc>) -> Result<Principal> {
        if secret.is_empty() {
            return Err(Error::unauthenticated("empty access token"));
        }

        let name = access_token_name(secret);
        let token = match self.tokens.get(None, &name).await {
            Ok(token) => token,
            Err(Error::NotFound { .. }) => {
                return Err(Error::unauthenticated("unknown access token"));
            }
            Err(e) => return Err(e),
        };

        if let Some(expired_at) = &token.spec.expired_at {
            let expiry = DateTime::parse_from_rfc3339(expired_at)
                .map_err(|_| Error::unauthenticated("access token has malformed expiry"))?;
            if now >= expiry.with_timezone(&Utc) {
                return Err(Error::unauthenticated("access token expired"));
            }
        }

        let principal = Principal::from_access_token(&token);
        debug!(principal = %principal.name, "authenticated access token");
        Ok(principal)
    }
}
