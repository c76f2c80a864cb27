//! Bearer token validation
//!
//! Tokens are issued by the external identity provider. The gateway only
//! validates them (signature, issuer, audience, expiry) and maps the claims
//! onto an [`Identity`].

use billgate_core::Identity;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, errors::ErrorKind, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// JWT configuration
#[derive(Clone)]
pub struct JwtConfig {
    /// Secret shared with the identity provider
    pub secret: String,

    /// Expected `iss`
    pub issuer: String,

    /// Expected `aud` (the gateway's client id)
    pub audience: String,

    /// Clock skew tolerance in seconds
    pub leeway_seconds: u64,

    /// Expected signing algorithm
    pub algorithm: Algorithm,
}

impl JwtConfig {
    /// Create new JWT configuration
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            issuer: String::new(),
            audience: String::new(),
            leeway_seconds: 30,
            algorithm: Algorithm::HS256,
        }
    }

    /// Set issuer
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = issuer.into();
        self
    }

    /// Set audience
    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = audience.into();
        self
    }

    /// Set clock skew tolerance
    pub fn with_leeway(mut self, seconds: u64) -> Self {
        self.leeway_seconds = seconds;
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), JwtConfigError> {
        if self.secret.is_empty() {
            return Err(JwtConfigError::EmptySecret);
        }

        if self.issuer.is_empty() {
            return Err(JwtConfigError::EmptyIssuer);
        }

        if self.audience.is_empty() {
            return Err(JwtConfigError::EmptyAudience);
        }

        Ok(())
    }
}

impl fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtConfig")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("leeway_seconds", &self.leeway_seconds)
            .field("algorithm", &self.algorithm)
            .finish()
    }
}

/// JWT configuration errors
#[derive(Debug, Error)]
pub enum JwtConfigError {
    #[error("JWT signing secret cannot be empty")]
    EmptySecret,

    #[error("JWT issuer cannot be empty")]
    EmptyIssuer,

    #[error("JWT audience cannot be empty")]
    EmptyAudience,
}

/// Claims issued by the identity provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,

    pub iss: String,

    pub aud: String,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Issued at (Unix timestamp)
    #[serde(default)]
    pub iat: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nbf: Option<i64>,

    #[serde(default)]
    pub jti: String,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub email: String,

    #[serde(default)]
    pub role: String,

    #[serde(default)]
    pub merchant_id: String,

    #[serde(default)]
    pub profile_id: String,
}

impl Claims {
    /// Create new claims expiring after `expiration_seconds`
    pub fn new(
        user_id: impl Into<String>,
        issuer: impl Into<String>,
        audience: impl Into<String>,
        expiration_seconds: i64,
    ) -> Self {
        let now = Utc::now();
        let exp = now + Duration::seconds(expiration_seconds);

        Self {
            sub: user_id.into(),
            iss: issuer.into(),
            aud: audience.into(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
            nbf: None,
            jti: Uuid::new_v4().to_string(),
            name: String::new(),
            email: String::new(),
            role: String::new(),
            merchant_id: String::new(),
            profile_id: String::new(),
        }
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = role.into();
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = email.into();
        self
    }

    pub fn with_merchant(mut self, merchant_id: impl Into<String>) -> Self {
        self.merchant_id = merchant_id.into();
        self
    }

    pub fn with_profile(mut self, profile_id: impl Into<String>) -> Self {
        self.profile_id = profile_id.into();
        self
    }
}

impl From<Claims> for Identity {
    fn from(claims: Claims) -> Self {
        Identity {
            id: claims.sub,
            name: claims.name,
            email: claims.email,
            role: claims.role,
            merchant_id: claims.merchant_id,
            profile_id: claims.profile_id,
        }
    }
}

/// Token errors
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Token has expired")]
    Expired,

    #[error("Token is not yet valid")]
    NotYetValid,

    #[error("Invalid token claims: {0}")]
    InvalidClaims(String),

    #[error("JWT error: {0}")]
    JwtError(jsonwebtoken::errors::Error),

    #[error("Invalid token format")]
    InvalidFormat,
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            ErrorKind::ImmatureSignature => TokenError::NotYetValid,
            ErrorKind::InvalidIssuer => TokenError::InvalidClaims("issuer mismatch".to_string()),
            ErrorKind::InvalidAudience => {
                TokenError::InvalidClaims("audience mismatch".to_string())
            }
            _ => TokenError::JwtError(err),
        }
    }
}

/// JWT token manager
pub struct JwtManager {
    config: JwtConfig,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtManager {
    /// Create a new JWT manager
    pub fn new(config: JwtConfig) -> Result<Self, JwtConfigError> {
        config.validate()?;

        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        let mut validation = Validation::new(config.algorithm);
        validation.set_issuer(&[&config.issuer]);
        validation.set_audience(&[&config.audience]);
        validation.leeway = config.leeway_seconds;
        validation.validate_exp = true;
        validation.validate_nbf = true;

        Ok(Self {
            config,
            decoding_key,
            validation,
        })
    }

    /// Validate and decode a token
    pub fn validate_token(&self, token: &str) -> Result<Claims, TokenError> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &self.validation)?;
        let claims = token_data.claims;

        if claims.sub.is_empty() {
            return Err(TokenError::InvalidClaims(
                "Subject cannot be empty".to_string(),
            ));
        }

        Ok(claims)
    }

    /// Extract token from Authorization header value
    pub fn extract_token_from_header(header_value: &str) -> Result<&str, TokenError> {
        let mut parts = header_value.split_whitespace();

        match (parts.next(), parts.next(), parts.next()) {
            (Some(scheme), Some(token), None) if scheme.eq_ignore_ascii_case("bearer") => {
                Ok(token)
            }
            _ => Err(TokenError::InvalidFormat),
        }
    }
}

impl fmt::Debug for JwtManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtManager")
            .field("issuer", &self.config.issuer)
            .field("audience", &self.config.audience)
            .field("algorithm", &self.config.algorithm)
            .finish()
    }
}

/// Sign `claims` the way the identity provider does
#[cfg(test)]
pub(crate) fn sign(secret: &str, claims: &Claims) -> String {
    jsonwebtoken::encode(
        &jsonwebtoken::Header::new(Algorithm::HS256),
        claims,
        &jsonwebtoken::EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}
