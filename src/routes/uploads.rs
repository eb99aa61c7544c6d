use axum::{
    extract::{Multipart, State},
    response::IntoResponse,
    Extension, Json,
};
use std::path::Path;

use crate::{
    dto::document_dto::UploadPdfResponse,
    error::{Error, Result},
    middleware::auth::Claims,
    utils::{pdf::extract_pdf_text, text::truncate_chars},
    AppState,
};

const MAX_TITLE_CHARS: usize = 120;
const PDF_CONTENT_TYPE: &str = "application/pdf";

/// Title for an uploaded file: the file name without extension.
pub fn title_from_filename(filename: &str) -> String {
    let stem = Path::new(filename)
        .file_stem()
        .and_then(|s| s.to_str())
        .map(str::trim)
        .unwrap_or_default();
    if stem.is_empty() {
        crate::services::document_service::UNTITLED.to_string()
    } else {
        truncate_chars(stem, MAX_TITLE_CHARS)
    }
}

#[axum::debug_handler]
pub async fn upload_pdf(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse> {
    let user_id = claims.user_id()?;
    let max_bytes = state.config.max_upload_mb * 1024 * 1024;

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }

        let content_type = field.content_type().unwrap_or_default().to_ascii_lowercase();
        if content_type != PDF_CONTENT_TYPE {
            return Err(Error::BadRequest("Envie um arquivo PDF".to_string()));
        }
        let filename = field.file_name().unwrap_or("documento.pdf").to_string();
        let data = field.bytes().await?;
        if data.len() > max_bytes {
            return Err(Error::PayloadTooLarge(format!(
                "Arquivo maior que {} MB",
                state.config.max_upload_mb
            )));
        }

        let text = extract_pdf_text(&data).await;
        let title = title_from_filename(&filename);
        let doc = state.document_service.create(user_id, &title, &text).await?;

        tracing::info!(document_id = %doc.id, bytes = data.len(), "pdf uploaded");
        return Ok(Json(UploadPdfResponse {
            ok: true,
            document_id: doc.id,
            title: doc.title,
            chars: text.chars().count(),
            text,
        }));
    }

    Err(Error::BadRequest("Campo 'file' ausente".to_string()))
}
