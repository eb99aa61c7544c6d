use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::document::Document;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateDocumentPayload {
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateDocumentPayload {
    #[validate(length(min = 1, max = 255))]
    pub title: Option<String>,
    pub content: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentOut {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub language: String,
}

impl From<Document> for DocumentOut {
    fn from(doc: Document) -> Self {
        Self {
            id: doc.id,
            title: doc.title,
            content: doc.content,
            language: doc.language,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadPdfResponse {
    pub ok: bool,
    pub document_id: Uuid,
    pub title: String,
    pub chars: usize,
    pub text: String,
}
