use sqlx::PgPool;

use crate::dto::auth_dto::{LoginPayload, RegisterPayload};
use crate::error::{Error, Result};
use crate::models::user::User;
use crate::utils::crypto::{hash_password, verify_password};

const USER_COLUMNS: &str = "id, name, email, password_hash, created_at";

#[derive(Clone)]
pub struct UserService {
    pool: PgPool,
}

impl UserService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(normalize_email(email))
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    pub async fn register(&self, payload: &RegisterPayload) -> Result<User> {
        let email = normalize_email(&payload.email);
        if self.find_by_email(&email).await?.is_some() {
            return Err(Error::BadRequest("Email já cadastrado".to_string()));
        }

        let password_hash = hash_password(&payload.password)?;
        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (name, email, password_hash) VALUES ($1, $2, $3) RETURNING {USER_COLUMNS}"
        ))
        .bind(payload.name.trim())
        .bind(&email)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                Error::BadRequest("Email já cadastrado".to_string())
            }
            other => other.into(),
        })?;

        tracing::info!(user_id = %user.id, "user registered");
        Ok(user)
    }

    pub async fn authenticate(&self, payload: &LoginPayload) -> Result<User> {
        let invalid = || Error::Unauthorized("Credenciais inválidas".to_string());
        let user = self.find_by_email(&payload.email).await?.ok_or_else(invalid)?;
        if !verify_password(&payload.password, &user.password_hash) {
            return Err(invalid());
        }
        Ok(user)
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
