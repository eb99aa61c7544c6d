use serde::Serialize;
use serde_json::{json, Value as JsonValue};
use std::sync::Arc;

use crate::models::answer::Answer;
use crate::models::quiz::{QuizItem, QuizType};
use crate::models::quiz_attempt::MAX_SCORE;
use crate::services::llm_gateway::LlmGateway;
use crate::utils::json_extract::extract_json_where;

const GRADER_SYSTEM_PROMPT: &str = "Você é um corretor criterioso e objetivo. Apenas JSON.";
const PASSING_SCORE: f32 = 0.5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GradeOutcome {
    pub correct: usize,
    pub total: usize,
    pub score: i32,
    pub max_score: i32,
    /// One entry per item. `None` marks an unanswered objective item.
    pub item_scores: Vec<Option<f32>>,
}

impl GradeOutcome {
    fn from_item_scores(item_scores: Vec<Option<f32>>) -> Self {
        let total = item_scores.len();
        let correct = item_scores
            .iter()
            .filter(|s| s.is_some_and(|v| v >= PASSING_SCORE))
            .count();
        Self {
            correct,
            total,
            score: score_out_of_ten(correct, total),
            max_score: MAX_SCORE,
            item_scores,
        }
    }
}

/// `round(correct / total * 10)` with ties to even; an empty quiz scores 0.
pub fn score_out_of_ten(correct: usize, total: usize) -> i32 {
    if total == 0 {
        return 0;
    }
    let ratio = correct.min(total) as f64 / total as f64;
    (ratio * MAX_SCORE as f64).round_ties_even() as i32
}

fn objective_match(item: &QuizItem, answer: &Answer) -> bool {
    match (item, answer) {
        (QuizItem::TrueFalse { answer: expected, .. }, Answer::Bool(given)) => expected == given,
        (QuizItem::MultipleChoice { answer: expected, .. }, Answer::Index(given)) => {
            usize::try_from(*given).is_ok_and(|g| g == *expected)
        }
        _ => false,
    }
}

/// Local equality grading for true/false and multiple-choice items.
pub fn grade_objective(items: &[QuizItem], answers: &[Answer]) -> Vec<Option<f32>> {
    items
        .iter()
        .enumerate()
        .map(|(idx, item)| match answers.get(idx) {
            None | Some(Answer::Unanswered) => None,
            Some(answer) if objective_match(item, answer) => Some(1.0),
            Some(_) => Some(0.0),
        })
        .collect()
}

/// Reads `{"scores": [...]}` and forces it to exactly `expected` entries in `[0, 1]`.
/// Extra scores are cut, missing ones are padded with zero.
fn parse_scores(raw: &str, expected: usize) -> Option<Vec<f32>> {
    let value = extract_json_where(raw, |v| v.get("scores").is_some_and(JsonValue::is_array))?;
    let scores = value.get("scores")?.as_array()?;

    if scores.len() != expected {
        tracing::warn!(
            expected,
            returned = scores.len(),
            "grader returned a score count different from the item count"
        );
    }

    let mut out: Vec<f32> = scores
        .iter()
        .take(expected)
        .map(|s| {
            let v = match s {
                JsonValue::Number(n) => n.as_f64().unwrap_or(0.0),
                JsonValue::String(s) => s.trim().parse::<f64>().unwrap_or(0.0),
                _ => 0.0,
            };
            if v.is_nan() {
                0.0
            } else {
                v.clamp(0.0, 1.0) as f32
            }
        })
        .collect();
    out.resize(expected, 0.0);
    Some(out)
}

#[derive(Clone)]
pub struct GradingService {
    gateway: Arc<dyn LlmGateway>,
}

impl GradingService {
    pub fn new(gateway: Arc<dyn LlmGateway>) -> Self {
        Self { gateway }
    }

    pub async fn grade(
        &self,
        quiz_type: QuizType,
        items: &[QuizItem],
        context: &str,
        answers: &[Answer],
    ) -> GradeOutcome {
        let item_scores = if quiz_type.is_objective() {
            grade_objective(items, answers)
        } else {
            self.grade_discursive_batch(context, items, answers)
                .await
                .into_iter()
                .map(Some)
                .collect()
        };
        GradeOutcome::from_item_scores(item_scores)
    }

    /// One LLM call for the whole batch. Never fails: a provider error or an
    /// unreadable reply yields an all-zero vector of `items.len()`.
    pub async fn grade_discursive_batch(
        &self,
        context: &str,
        items: &[QuizItem],
        answers: &[Answer],
    ) -> Vec<f32> {
        if items.is_empty() {
            return Vec::new();
        }

        let bundle: Vec<JsonValue> = items
            .iter()
            .enumerate()
            .map(|(idx, item)| {
                json!({
                    "question": item.question(),
                    "rubric": item.rubric(),
                    "answer": answers.get(idx).map(Answer::as_text).unwrap_or_default(),
                })
            })
            .collect();
        let bundle = serde_json::to_string_pretty(&bundle).unwrap_or_else(|_| "[]".to_string());

        let prompt = format!(
            r#"Avalie respostas DISCURSIVAS com base na rubrica, devolvendo JSON com um array "scores", cada nota entre 0 e 1.
Se a resposta não estiver suportada pelo CONTEXTO, dê 0.

CONTEÚDO:
{context}

ITENS+RESPOSTAS (JSON):
{bundle}

SAÍDA OBRIGATÓRIA (apenas JSON):
{{"scores":[0.0, 1.0, ...]}}
"#
        );

        let raw = match self.gateway.complete(GRADER_SYSTEM_PROMPT, &prompt, 0.0).await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!("discursive grading call failed, scoring zero: {}", e);
                return vec![0.0; items.len()];
            }
        };

        parse_scores(&raw, items.len()).unwrap_or_else(|| {
            tracing::warn!("discursive grading reply unreadable, scoring zero");
            vec![0.0; items.len()]
        })
    }
}
