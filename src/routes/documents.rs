use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::document_dto::{CreateDocumentPayload, DocumentOut, UpdateDocumentPayload},
    error::Result,
    middleware::auth::Claims,
    AppState,
};

#[axum::debug_handler]
pub async fn create_document(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateDocumentPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let user_id = claims.user_id()?;
    let doc = state
        .document_service
        .create(user_id, &payload.title, &payload.content)
        .await?;
    Ok((StatusCode::CREATED, Json(DocumentOut::from(doc))))
}

#[axum::debug_handler]
pub async fn get_document(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let doc = state.document_service.get_owned(id, claims.user_id()?).await?;
    Ok(Json(DocumentOut::from(doc)))
}

#[axum::debug_handler]
pub async fn update_document(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateDocumentPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let doc = state
        .document_service
        .update(id, claims.user_id()?, &payload)
        .await?;
    Ok(Json(DocumentOut::from(doc)))
}
