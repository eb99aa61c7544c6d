use sqlx::PgPool;
use uuid::Uuid;

use crate::dto::document_dto::UpdateDocumentPayload;
use crate::error::{Error, Result};
use crate::models::document::Document;
use crate::models::study_plan::StudyPlan;

const DOCUMENT_COLUMNS: &str = "id, user_id, title, content, language, created_at, updated_at";
pub const DEFAULT_LANGUAGE: &str = "pt-BR";
pub const UNTITLED: &str = "Sem Título";

#[derive(Clone)]
pub struct DocumentService {
    pool: PgPool,
}

impl DocumentService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, user_id: Uuid, title: &str, content: &str) -> Result<Document> {
        let title = match title.trim() {
            "" => UNTITLED,
            t => t,
        };
        let doc = sqlx::query_as::<_, Document>(&format!(
            "INSERT INTO documents (user_id, title, content, language) VALUES ($1, $2, $3, $4) RETURNING {DOCUMENT_COLUMNS}"
        ))
        .bind(user_id)
        .bind(title)
        .bind(content)
        .bind(DEFAULT_LANGUAGE)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(document_id = %doc.id, %user_id, chars = content.len(), "document stored");
        Ok(doc)
    }

    /// Only documents owned by `user_id` are visible.
    pub async fn find_owned(&self, id: Uuid, user_id: Uuid) -> Result<Option<Document>> {
        let doc = sqlx::query_as::<_, Document>(&format!(
            "SELECT {DOCUMENT_COLUMNS} FROM documents WHERE id = $1 AND user_id = $2"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(doc)
    }

    pub async fn get_owned(&self, id: Uuid, user_id: Uuid) -> Result<Document> {
        self.find_owned(id, user_id)
            .await?
            .ok_or_else(|| Error::NotFound("Documento não encontrado".to_string()))
    }

    pub async fn update(&self, id: Uuid, user_id: Uuid, payload: &UpdateDocumentPayload) -> Result<Document> {
        let doc = sqlx::query_as::<_, Document>(&format!(
            r#"
            UPDATE documents
            SET title = COALESCE($3, title),
                content = COALESCE($4, content),
                updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING {DOCUMENT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(user_id)
        .bind(payload.title.as_deref())
        .bind(payload.content.as_deref())
        .fetch_optional(&self.pool)
        .await?;

        doc.ok_or_else(|| Error::NotFound("Documento não encontrado".to_string()))
    }

    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Document>> {
        let docs = sqlx::query_as::<_, Document>(&format!(
            "SELECT {DOCUMENT_COLUMNS} FROM documents WHERE user_id = $1 ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(docs)
    }

    pub async fn save_study_plan(&self, document_id: Uuid, plan_md: &str) -> Result<StudyPlan> {
        let plan = sqlx::query_as::<_, StudyPlan>(
            "INSERT INTO study_plans (document_id, plan_md) VALUES ($1, $2) RETURNING id, document_id, plan_md, created_at",
        )
        .bind(document_id)
        .bind(plan_md)
        .fetch_one(&self.pool)
        .await?;
        Ok(plan)
    }

    pub async fn latest_study_plan(&self, document_id: Uuid) -> Result<Option<StudyPlan>> {
        let plan = sqlx::query_as::<_, StudyPlan>(
            r#"
            SELECT id, document_id, plan_md, created_at
            FROM study_plans
            WHERE document_id = $1
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(document_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(plan)
    }
}
