use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use crate::error::{Error, Result};
use crate::middleware::auth::Claims;

pub fn create_access_token(subject: &str, secret: &str, expires_minutes: i64) -> Result<String> {
    let exp = (Utc::now() + Duration::minutes(expires_minutes)).timestamp();
    let claims = Claims {
        sub: subject.to_string(),
        exp: exp.max(0) as usize,
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| Error::Internal(format!("token signing failed: {}", e)))
}

pub fn decode_token(token: &str, secret: &str) -> Result<Claims> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|_| Error::Unauthorized("Token inválido".to_string()))
}
