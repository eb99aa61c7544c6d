use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

pub const MAX_OPTIONS: usize = 4;
pub const MAX_RUBRIC_CRITERIA: usize = 5;

/// Item kind shared by every item of a quiz. Wire names are the short tags
/// used by the forms and the stored JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuizType {
    #[serde(rename = "vf")]
    TrueFalse,
    #[serde(rename = "mc")]
    MultipleChoice,
    #[serde(rename = "disc")]
    Discursive,
}

impl QuizType {
    pub const ALL: [QuizType; 3] = [
        QuizType::TrueFalse,
        QuizType::MultipleChoice,
        QuizType::Discursive,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            QuizType::TrueFalse => "vf",
            QuizType::MultipleChoice => "mc",
            QuizType::Discursive => "disc",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            QuizType::TrueFalse => "Verdadeiro/Falso",
            QuizType::MultipleChoice => "Alternativas",
            QuizType::Discursive => "Discursiva",
        }
    }

    pub fn is_objective(&self) -> bool {
        !matches!(self, QuizType::Discursive)
    }
}

impl fmt::Display for QuizType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuizType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "vf" => Ok(QuizType::TrueFalse),
            "mc" => Ok(QuizType::MultipleChoice),
            "disc" => Ok(QuizType::Discursive),
            other => Err(format!("unknown quiz type: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum QuizItem {
    #[serde(rename = "vf")]
    TrueFalse {
        question: String,
        answer: bool,
        #[serde(default, alias = "explain")]
        explanation: String,
    },
    #[serde(rename = "mc")]
    MultipleChoice {
        question: String,
        options: Vec<String>,
        answer: usize,
        #[serde(default, alias = "explain")]
        explanation: String,
    },
    #[serde(rename = "disc")]
    Discursive {
        question: String,
        #[serde(default)]
        rubric: Vec<String>,
    },
}

impl QuizItem {
    pub fn question(&self) -> &str {
        match self {
            QuizItem::TrueFalse { question, .. }
            | QuizItem::MultipleChoice { question, .. }
            | QuizItem::Discursive { question, .. } => question,
        }
    }

    pub fn rubric(&self) -> &[String] {
        match self {
            QuizItem::Discursive { rubric, .. } => rubric,
            _ => &[],
        }
    }
}

/// What a student sees while taking a quiz: no answers, no explanations.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum QuizItemView {
    #[serde(rename = "vf")]
    TrueFalse { field: String, question: String },
    #[serde(rename = "mc")]
    MultipleChoice {
        field: String,
        question: String,
        options: Vec<String>,
    },
    #[serde(rename = "disc")]
    Discursive {
        field: String,
        question: String,
        rubric: Vec<String>,
    },
}

pub fn answer_field(index: usize) -> String {
    format!("q_{}", index)
}

impl QuizItemView {
    pub fn render(index: usize, item: &QuizItem) -> Self {
        let field = answer_field(index);
        match item {
            QuizItem::TrueFalse { question, .. } => QuizItemView::TrueFalse {
                field,
                question: question.clone(),
            },
            QuizItem::MultipleChoice {
                question, options, ..
            } => QuizItemView::MultipleChoice {
                field,
                question: question.clone(),
                options: options.clone(),
            },
            QuizItem::Discursive { question, rubric } => QuizItemView::Discursive {
                field,
                question: question.clone(),
                rubric: rubric.clone(),
            },
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct QuizRecord {
    pub id: Uuid,
    pub document_id: Uuid,
    pub quiz_type: String,
    pub items_json: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Quiz {
    pub id: Uuid,
    pub document_id: Uuid,
    pub quiz_type: QuizType,
    pub items: Vec<QuizItem>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<QuizRecord> for Quiz {
    type Error = crate::error::Error;

    fn try_from(row: QuizRecord) -> Result<Self, Self::Error> {
        let quiz_type = row
            .quiz_type
            .parse::<QuizType>()
            .map_err(crate::error::Error::Internal)?;
        let items: Vec<QuizItem> = serde_json::from_str(&row.items_json)?;
        Ok(Self {
            id: row.id,
            document_id: row.document_id,
            quiz_type,
            items,
            created_at: row.created_at,
        })
    }
}

impl Quiz {
    pub fn view(&self) -> Vec<QuizItemView> {
        self.items
            .iter()
            .enumerate()
            .map(|(idx, item)| QuizItemView::render(idx, item))
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct QuizStats {
    pub quiz_id: Uuid,
    pub quiz_type: String,
    pub created_at: DateTime<Utc>,
    pub attempts: i64,
    pub avg_score: f64,
    pub best_score: i32,
}
