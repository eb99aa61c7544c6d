pub mod auth;
pub mod documents;
pub mod health;
pub mod tutor;
pub mod uploads;

use axum::{
    extract::DefaultBodyLimit,
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::middleware::{auth::require_session, rate_limit::rate_limit_middleware};
use crate::AppState;

/// Full application router. The rate limiter runs ahead of the session guard
/// so anonymous and badly-authenticated traffic is still counted.
pub fn app_router(state: AppState) -> Router {
    let body_limit = (state.config.max_upload_mb + 1) * 1024 * 1024;

    let tutor = Router::new()
        .route("/tutor", get(tutor::tutor_home))
        .route("/tutor/upload", post(tutor::tutor_upload))
        .route("/tutor/doc/:id", get(tutor::doc_detail))
        .route(
            "/tutor/doc/:id/study",
            get(tutor::study_get).post(tutor::study_post),
        )
        .route("/tutor/doc/:id/quiz", get(tutor::quiz_menu))
        .route("/tutor/doc/:id/quiz/create", post(tutor::quiz_create))
        .route("/tutor/quiz/:id", get(tutor::quiz_take))
        .route("/tutor/quiz/:id/submit", post(tutor::quiz_submit));

    Router::new()
        .route("/", get(health::root))
        .route("/health", get(health::health))
        .route("/ui", get(auth::login_page))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/documents", post(documents::create_document))
        .route(
            "/documents/:id",
            get(documents::get_document).put(documents::update_document),
        )
        .route("/upload/pdf", post(uploads::upload_pdf))
        .merge(tutor)
        .nest_service("/static", ServeDir::new(&state.config.static_dir))
        .layer(from_fn_with_state(state.clone(), require_session))
        .layer(from_fn_with_state(state.clone(), rate_limit_middleware))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
