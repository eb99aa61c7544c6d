use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterPayload {
    #[validate(length(min = 2, max = 120))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 6, max = 256))]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginPayload {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 256))]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
}

impl TokenResponse {
    pub fn bearer(access_token: String) -> Self {
        Self {
            access_token,
            token_type: "bearer".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_rules() {
        let ok = RegisterPayload {
            name: "Ana".into(),
            email: "ana@example.com".into(),
            password: "segredo".into(),
        };
        assert!(ok.validate().is_ok());

        let short = RegisterPayload {
            name: "A".into(),
            password: "123".into(),
            ..ok.clone()
        };
        let errors = short.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("name"));
        assert!(fields.contains_key("password"));

        let bad_email = RegisterPayload {
            email: "not-an-email".into(),
            ..ok
        };
        assert!(bad_email.validate().is_err());
    }
}
