//! Password hashing and JWT session tokens.
//!
//! Passwords are stored as `salt$digest` where the digest is a salted
//! blake3 hash; comparisons go through [`blake3::Hash`] equality, which is
//! constant-time. Session tokens are HS256 JWTs carrying the user id and
//! role, valid for 24 hours.
//!
//! # Configuration
//!
//! Set `REGISTRAR_JWT_SECRET` with the HMAC signing secret. Without it the
//! server generates an ephemeral key at startup, so issued tokens stop
//! verifying after a restart.

use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::Context;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Actor, Role};

const TOKEN_TTL_SECS: u64 = 24 * 60 * 60;

/// Hash a password with a fresh random salt, producing the stored form.
pub fn hash_password(password: &str) -> String {
    let salt = Uuid::new_v4().simple().to_string();
    let digest = salted_digest(&salt, password);
    format!("{salt}${}", digest.to_hex())
}

/// Check a password attempt against a stored `salt$digest` value.
///
/// Returns false for malformed stored values rather than erroring, so a
/// corrupt credential row behaves like a wrong password.
pub fn verify_password(password: &str, stored: &str) -> bool {
    let Some((salt, digest_hex)) = stored.split_once('$') else {
        return false;
    };
    let Ok(expected) = blake3::Hash::from_hex(digest_hex) else {
        return false;
    };
    salted_digest(salt, password) == expected
}

fn salted_digest(salt: &str, password: &str) -> blake3::Hash {
    let mut hasher = blake3::Hasher::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hasher.finalize()
}

/// Claims carried by a session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user id.
    pub sub: String,
    /// Role at issue time.
    pub role: String,
    /// Issued at (Unix timestamp).
    pub iat: u64,
    /// Expiration (Unix timestamp).
    pub exp: u64,
}

/// Issues and verifies session tokens. Cheap to clone; shared via the
/// router state.
#[derive(Clone)]
pub struct AuthService {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl AuthService {
    pub fn with_secret(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }

    /// Build from `REGISTRAR_JWT_SECRET`, falling back to an ephemeral key.
    pub fn from_env() -> Self {
        match std::env::var("REGISTRAR_JWT_SECRET") {
            Ok(secret) if !secret.is_empty() => Self::with_secret(secret.as_bytes()),
            _ => {
                tracing::warn!(
                    "REGISTRAR_JWT_SECRET not set; using an ephemeral signing key, \
                     tokens will not survive a restart"
                );
                Self::with_secret(Uuid::new_v4().as_bytes())
            }
        }
    }

    /// Issue a signed token for an authenticated user.
    pub fn issue(&self, user_id: Uuid, role: Role) -> anyhow::Result<String> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .context("system clock is before the unix epoch")?
            .as_secs();
        let claims = Claims {
            sub: user_id.to_string(),
            role: role.as_str().to_string(),
            iat: now,
            exp: now + TOKEN_TTL_SECS,
        };
        jsonwebtoken::encode(&Header::default(), &claims, &self.encoding)
            .context("failed to sign session token")
    }

    /// Verify a token and extract the acting identity.
    pub fn verify(&self, token: &str) -> anyhow::Result<Actor> {
        let validation = Validation::new(Algorithm::HS256);
        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding, &validation)
            .context("token verification failed")?;
        let user_id =
            Uuid::parse_str(&data.claims.sub).context("token subject is not a user id")?;
        let role = Role::from_str(&data.claims.role)
            .with_context(|| format!("unknown role in token: {}", data.claims.role))?;
        Ok(Actor { user_id, role })
    }
}
