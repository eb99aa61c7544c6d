use sqlx::PgPool;
use uuid::Uuid;

use crate::error::Result;
use crate::models::answer::Answer;
use crate::models::quiz::{Quiz, QuizItem, QuizRecord, QuizStats, QuizType};
use crate::models::quiz_attempt::{AttemptRow, QuizAttempt, MAX_SCORE};

#[derive(Clone)]
pub struct QuizService {
    pool: PgPool,
}

impl QuizService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create_quiz(
        &self,
        document_id: Uuid,
        quiz_type: QuizType,
        items: &[QuizItem],
    ) -> Result<Quiz> {
        let items_json = serde_json::to_string(items)?;
        let record = sqlx::query_as::<_, QuizRecord>(
            r#"
            INSERT INTO quizzes (document_id, quiz_type, items_json)
            VALUES ($1, $2, $3)
            RETURNING id, document_id, quiz_type, items_json, created_at
            "#,
        )
        .bind(document_id)
        .bind(quiz_type.as_str())
        .bind(items_json)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(quiz_id = %record.id, %document_id, %quiz_type, items = items.len(), "quiz stored");
        Quiz::try_from(record)
    }

    /// The quiz, if it belongs to a document owned by `user_id`.
    pub async fn find_for_user(&self, quiz_id: Uuid, user_id: Uuid) -> Result<Option<Quiz>> {
        let record = sqlx::query_as::<_, QuizRecord>(
            r#"
            SELECT q.id, q.document_id, q.quiz_type, q.items_json, q.created_at
            FROM quizzes q
            JOIN documents d ON d.id = q.document_id
            WHERE q.id = $1 AND d.user_id = $2
            "#,
        )
        .bind(quiz_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        record.map(Quiz::try_from).transpose()
    }

    pub async fn record_attempt(&self, quiz_id: Uuid, answers: &[Answer], score: i32) -> Result<QuizAttempt> {
        let answers_json = serde_json::to_string(answers)?;
        let attempt = sqlx::query_as::<_, QuizAttempt>(
            r#"
            INSERT INTO quiz_attempts (quiz_id, answers_json, score, max_score)
            VALUES ($1, $2, $3, $4)
            RETURNING id, quiz_id, answers_json, score, max_score, created_at
            "#,
        )
        .bind(quiz_id)
        .bind(answers_json)
        .bind(score.clamp(0, MAX_SCORE))
        .bind(MAX_SCORE)
        .fetch_one(&self.pool)
        .await?;
        Ok(attempt)
    }

    pub async fn stats_for_document(&self, document_id: Uuid) -> Result<Vec<QuizStats>> {
        let stats = sqlx::query_as::<_, QuizStats>(
            r#"
            SELECT q.id AS quiz_id,
                   q.quiz_type,
                   q.created_at,
                   COUNT(a.id) AS attempts,
                   COALESCE(AVG(a.score), 0)::FLOAT8 AS avg_score,
                   COALESCE(MAX(a.score), 0) AS best_score
            FROM quizzes q
            LEFT JOIN quiz_attempts a ON a.quiz_id = q.id
            WHERE q.document_id = $1
            GROUP BY q.id
            ORDER BY q.created_at DESC
            "#,
        )
        .bind(document_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(stats)
    }

    pub async fn attempts_for_document(&self, document_id: Uuid) -> Result<Vec<AttemptRow>> {
        let rows = sqlx::query_as::<_, AttemptRow>(
            r#"
            SELECT a.id AS attempt_id,
                   a.created_at AS attempt_at,
                   a.score,
                   a.max_score,
                   q.quiz_type,
                   q.id AS quiz_id
            FROM quiz_attempts a
            JOIN quizzes q ON q.id = a.quiz_id
            WHERE q.document_id = $1
            ORDER BY a.created_at DESC
            "#,
        )
        .bind(document_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
