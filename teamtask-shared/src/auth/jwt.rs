/// Bearer token minting and checking
///
/// A token names the acting user in `sub` and nothing else: role and status
/// are looked up in the directory on every request, so an approval or a
/// suspension takes effect without reissuing tokens. Credential checks live
/// in whichever identity provider shares the signing secret.
///
/// Tokens are HS256, carry issuer [`ISSUER`], and come in two kinds: access
/// (24h, accepted by the API) and refresh (30d, only exchangeable for a new
/// access token).
///
/// ```
/// use teamtask_shared::auth::jwt::{create_token, validate_access_token, Claims, TokenType};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let token = create_token(&Claims::new("user-42", TokenType::Access), "signing-secret")?;
/// assert_eq!(validate_access_token(&token, "signing-secret")?.sub, "user-42");
/// # Ok(())
/// # }
/// ```

use chrono::{Duration, Utc};
use jsonwebtoken::{errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Issuer written into and required from every token
pub const ISSUER: &str = "teamtask";

const ALGORITHM: Algorithm = Algorithm::HS256;

#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("Failed to create token: {0}")]
    CreateError(String),

    #[error("Failed to validate token: {0}")]
    ValidationError(String),

    #[error("Token has expired")]
    Expired,

    #[error("Invalid issuer")]
    InvalidIssuer,

    #[error("Expected {expected} token")]
    WrongTokenType { expected: TokenType },
}

/// Kind of token, fixed at mint time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

impl TokenType {
    /// How long a freshly minted token of this kind stays valid
    pub fn lifetime(self) -> Duration {
        match self {
            TokenType::Access => Duration::hours(24),
            TokenType::Refresh => Duration::days(30),
        }
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TokenType::Access => "access",
            TokenType::Refresh => "refresh",
        })
    }
}

/// Registered claims plus the token kind
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id of the actor
    pub sub: String,
    pub iss: String,
    pub iat: i64,
    pub nbf: i64,
    pub exp: i64,
    pub token_type: TokenType,
}

impl Claims {
    pub fn new(user_id: impl Into<String>, token_type: TokenType) -> Self {
        Self::valid_for(user_id, token_type, token_type.lifetime())
    }

    /// Claims valid from now for `ttl`; a negative `ttl` yields an already expired token
    pub fn valid_for(user_id: impl Into<String>, token_type: TokenType, ttl: Duration) -> Self {
        let issued = Utc::now().timestamp();

        Self {
            sub: user_id.into(),
            iss: ISSUER.to_string(),
            iat: issued,
            nbf: issued,
            exp: issued + ttl.num_seconds(),
            token_type,
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }
}

/// Access and refresh token minted together at registration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Signs `claims` with `secret`
pub fn create_token(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    jsonwebtoken::encode(
        &Header::new(ALGORITHM),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| JwtError::CreateError(e.to_string()))
}

/// Checks signature, issuer, `exp` and `nbf`, whatever the token kind
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    let mut validation = Validation::new(ALGORITHM);
    validation.set_issuer(&[ISSUER]);
    validation.validate_nbf = true;

    jsonwebtoken::decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => JwtError::Expired,
            ErrorKind::InvalidIssuer => JwtError::InvalidIssuer,
            _ => JwtError::ValidationError(e.to_string()),
        })
}

fn validate_kind(token: &str, secret: &str, expected: TokenType) -> Result<Claims, JwtError> {
    let claims = validate_token(token, secret)?;
    if claims.token_type != expected {
        return Err(JwtError::WrongTokenType { expected });
    }
    Ok(claims)
}

/// The only check the request middleware applies
pub fn validate_access_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    validate_kind(token, secret, TokenType::Access)
}

pub fn validate_refresh_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    validate_kind(token, secret, TokenType::Refresh)
}

/// Exchanges a refresh token for a new access token naming the same user
pub fn refresh_access_token(refresh_token: &str, secret: &str) -> Result<String, JwtError> {
    let claims = validate_refresh_token(refresh_token, secret)?;
    create_token(&Claims::new(claims.sub, TokenType::Access), secret)
}

pub fn issue_token_pair(user_id: &str, secret: &str) -> Result<TokenPair, JwtError> {
    Ok(TokenPair {
        access_token: create_token(&Claims::new(user_id, TokenType::Access), secret)?,
        refresh_token: create_token(&Claims::new(user_id, TokenType::Refresh), secret)?,
    })
}
