use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Claims embedded in the bearer token. The payload carries only the
/// username; validity beyond the signature comes from the stored token row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
}

/// Outcome of signature verification. Decode failures never escape as
/// errors; they collapse into `Invalid` with the reason kept for logging.
#[derive(Debug)]
pub enum TokenValidity {
    Valid(Claims),
    Invalid(jsonwebtoken::errors::ErrorKind),
}

impl TokenValidity {
    pub fn is_valid(&self) -> bool {
        matches!(self, TokenValidity::Valid(_))
    }
}

pub fn issue(secret: &str, username: &str) -> Result<String, jsonwebtoken::errors::Error> {
    let claims = Claims {
        sub: username.to_string(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

pub fn verify(secret: &str, token: &str) -> TokenValidity {
    // Tokens carry no exp claim, so expiry validation must be off or every
    // decode would fail on the missing field.
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = false;
    validation.required_spec_claims.clear();

    match decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    ) {
        Ok(data) => TokenValidity::Valid(data.claims),
        Err(err) => TokenValidity::Invalid(err.into_kind()),
    }
}
