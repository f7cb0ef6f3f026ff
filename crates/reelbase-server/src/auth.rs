use crate::config::AuthConfig;
use anyhow::{Context, Result};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

pub const TOKEN_TYPE_ACCESS: &str = "access";
pub const TOKEN_TYPE_REFRESH: &str = "refresh";

/// JWT claims. Role names and permission codenames are a snapshot taken at
/// issuance; later grant changes do not reach tokens already in the wild.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub username: String,
    pub roles: Vec<String>,
    pub perms: Vec<String>,
    pub token_type: String,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn has_permission(&self, codename: &str) -> bool {
        self.perms.iter().any(|p| p == codename)
    }
}

/// Access/refresh pair returned by register, login and refresh
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Hash a password using argon2id
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))?;
    Ok(hash.to_string())
}

/// Verify a password against a hash
pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| anyhow::anyhow!("Invalid password hash: {}", e))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Create an access/refresh token pair embedding the user's current role
/// names and effective permission codenames.
pub fn create_token_pair(
    user_id: &str,
    username: &str,
    roles: &[String],
    perms: &[String],
    auth: &AuthConfig,
) -> Result<TokenPair> {
    let now = chrono::Utc::now().timestamp();
    let base = Claims {
        sub: user_id.to_string(),
        username: username.to_string(),
        roles: roles.to_vec(),
        perms: perms.to_vec(),
        token_type: TOKEN_TYPE_ACCESS.to_string(),
        iat: now,
        exp: now + auth.access_ttl_secs,
    };
    let access_token = encode_token(&base, &auth.jwt_secret)?;

    let refresh_claims = Claims {
        token_type: TOKEN_TYPE_REFRESH.to_string(),
        exp: now + auth.refresh_ttl_secs,
        ..base
    };
    let refresh_token = encode_token(&refresh_claims, &auth.jwt_secret)?;

    Ok(TokenPair {
        access_token,
        refresh_token,
    })
}

fn encode_token(claims: &Claims, jwt_secret: &str) -> Result<String> {
    jsonwebtoken::encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(jwt_secret.as_bytes()),
    )
    .context("Failed to create token")
}

/// Validate an access token and return its claims
pub fn validate_access_token(token: &str, jwt_secret: &str) -> Result<Claims> {
    validate_token(token, jwt_secret, TOKEN_TYPE_ACCESS)
}

/// Validate a refresh token and return its claims
pub fn validate_refresh_token(token: &str, jwt_secret: &str) -> Result<Claims> {
    validate_token(token, jwt_secret, TOKEN_TYPE_REFRESH)
}

fn validate_token(token: &str, jwt_secret: &str, expected_type: &str) -> Result<Claims> {
    let token_data = jsonwebtoken::decode::<Claims>(
        token,
        &DecodingKey::from_secret(jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .context("Invalid token")?;
    if token_data.claims.token_type != expected_type {
        anyhow::bail!("Expected {} token", expected_type);
    }
    Ok(token_data.claims)
}
