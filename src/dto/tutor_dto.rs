use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::dto::document_dto::DocumentOut;
use crate::models::answer::Answer;
use crate::models::document::Document;
use crate::models::quiz::{QuizItem, QuizItemView, QuizStats, QuizType};
use crate::models::quiz_attempt::AttemptRow;
use crate::models::study_plan::StudyPlan;
use crate::services::study_service::{DEFAULT_WEEKLY_HOURS, DEFAULT_WEEKS};

pub const DEFAULT_QUIZ_ITEMS: i64 = 10;

fn default_hours() -> u32 {
    DEFAULT_WEEKLY_HOURS
}

fn default_weeks() -> u32 {
    DEFAULT_WEEKS
}

fn default_items() -> i64 {
    DEFAULT_QUIZ_ITEMS
}

#[derive(Debug, Clone, Deserialize)]
pub struct StudyForm {
    #[serde(default = "default_hours")]
    pub horas_semanais: u32,
    #[serde(default = "default_weeks")]
    pub semanas: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QuizCreateForm {
    #[serde(default)]
    pub tipo: String,
    #[serde(default = "default_items")]
    pub n: i64,
}

impl QuizCreateForm {
    /// Unknown types fall back to multiple choice.
    pub fn quiz_type(&self) -> QuizType {
        self.tipo.parse().unwrap_or(QuizType::MultipleChoice)
    }

    pub fn item_count(&self, max_items: usize) -> usize {
        let max = i64::try_from(max_items.max(1)).unwrap_or(i64::MAX);
        self.n.clamp(1, max) as usize
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DocumentListItem {
    pub id: Uuid,
    pub title: String,
    pub chars: usize,
    pub created_at: DateTime<Utc>,
}

impl From<Document> for DocumentListItem {
    fn from(doc: Document) -> Self {
        Self {
            id: doc.id,
            title: doc.title,
            chars: doc.content.chars().count(),
            created_at: doc.created_at,
        }
    }
}

pub fn type_labels() -> BTreeMap<&'static str, &'static str> {
    QuizType::ALL.iter().map(|t| (t.as_str(), t.label())).collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct DocumentDetail {
    pub document: DocumentOut,
    pub summary: Vec<String>,
    pub quiz_stats: Vec<QuizStats>,
    pub attempt_rows: Vec<AttemptRow>,
    pub type_labels: BTreeMap<&'static str, &'static str>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StudyView {
    pub document_id: Uuid,
    pub title: String,
    pub plan: Option<StudyPlan>,
}

#[derive(Debug, Clone, Serialize)]
pub struct QuizTypeOption {
    pub tipo: &'static str,
    pub label: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct QuizMenu {
    pub document_id: Uuid,
    pub title: String,
    pub types: Vec<QuizTypeOption>,
    pub default_n: i64,
    pub max_n: usize,
}

impl QuizMenu {
    pub fn new(doc: &Document, max_n: usize) -> Self {
        Self {
            document_id: doc.id,
            title: doc.title.clone(),
            types: QuizType::ALL
                .iter()
                .map(|t| QuizTypeOption {
                    tipo: t.as_str(),
                    label: t.label(),
                })
                .collect(),
            default_n: DEFAULT_QUIZ_ITEMS,
            max_n,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct QuizTakeView {
    pub quiz_id: Uuid,
    pub document_id: Uuid,
    pub document_title: String,
    pub quiz_type: QuizType,
    pub label: &'static str,
    pub items: Vec<QuizItemView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct QuizResult {
    pub attempt_id: Uuid,
    pub quiz_id: Uuid,
    pub quiz_type: QuizType,
    pub items: Vec<QuizItem>,
    pub answers: Vec<Answer>,
    pub score: i32,
    pub max_score: i32,
    pub correct: usize,
    pub total: usize,
    pub item_scores: Vec<Option<f32>>,
}
