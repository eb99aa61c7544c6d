use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Json, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::utils::token::decode_token;
use crate::AppState;

pub const SESSION_COOKIE: &str = "ar_jwt";
pub const LOGIN_PAGE: &str = "/ui";

const PUBLIC_PATHS: &[&str] = &[
    "/ui",
    "/auth/login",
    "/auth/register",
    "/auth/logout",
    "/static",
    "/favicon.ico",
    "/.well-known",
    "/health",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
}

impl Claims {
    pub fn user_id(&self) -> Result<Uuid> {
        Uuid::parse_str(&self.sub).map_err(|_| Error::Unauthorized("Token inválido".to_string()))
    }
}

fn is_public(path: &str) -> bool {
    path == "/" || PUBLIC_PATHS.iter().any(|p| path.starts_with(p))
}

/// Token from `Authorization: Bearer <t>`; the scheme is matched case-insensitively.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

fn session_token(headers: &HeaderMap) -> Option<String> {
    if let Some(token) = bearer_token(headers) {
        return Some(token.to_string());
    }
    CookieJar::from_headers(headers)
        .get(SESSION_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
}

/// Lets public paths through; everything else needs a session token from the
/// bearer header or the session cookie. Missing token redirects to the login
/// page, a bad one is a 401.
pub async fn require_session(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    if is_public(req.uri().path()) {
        return next.run(req).await;
    }

    let Some(token) = session_token(req.headers()) else {
        return Redirect::temporary(LOGIN_PAGE).into_response();
    };

    match decode_token(&token, &state.config.secret_key) {
        Ok(claims) => {
            req.extensions_mut().insert(claims);
            next.run(req).await
        }
        Err(_) => (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error":"invalid_token"})),
        )
            .into_response(),
    }
}
