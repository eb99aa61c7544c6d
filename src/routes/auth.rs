use axum::{extract::State, response::IntoResponse, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde_json::json;
use validator::Validate;

use crate::{
    dto::auth_dto::{LoginPayload, RegisterPayload, TokenResponse},
    error::Result,
    middleware::auth::SESSION_COOKIE,
    models::user::User,
    utils::token::create_access_token,
    AppState,
};

const SESSION_COOKIE_HOURS: i64 = 8;

fn session_cookie(token: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::hours(SESSION_COOKIE_HOURS))
        .build()
}

fn issue_session(state: &AppState, jar: CookieJar, user: &User) -> Result<(CookieJar, Json<TokenResponse>)> {
    let token = create_access_token(
        &user.id.to_string(),
        &state.config.secret_key,
        state.config.access_token_expire_minutes,
    )?;
    let jar = jar.add(session_cookie(token.clone()));
    Ok((jar, Json(TokenResponse::bearer(token))))
}

#[axum::debug_handler]
pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<RegisterPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let user = state.user_service.register(&payload).await?;
    issue_session(&state, jar, &user)
}

#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<LoginPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let user = state.user_service.authenticate(&payload).await?;
    tracing::info!(user_id = %user.id, "user logged in");
    issue_session(&state, jar, &user)
}

#[axum::debug_handler]
pub async fn logout(jar: CookieJar) -> impl IntoResponse {
    let cleared = Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::ZERO)
        .build();
    (jar.add(cleared), Json(json!({ "ok": true })))
}

/// Entry point unauthenticated browsers are redirected to.
#[axum::debug_handler]
pub async fn login_page() -> impl IntoResponse {
    Json(json!({
        "login": "/auth/login",
        "register": "/auth/register",
    }))
}
