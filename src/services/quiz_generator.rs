use serde::Serialize;
use serde_json::Value as JsonValue;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::models::quiz::{QuizItem, QuizType, MAX_OPTIONS, MAX_RUBRIC_CRITERIA};
use crate::services::llm_gateway::LlmGateway;
use crate::utils::json_extract::extract_json_where;

const SYSTEM_PROMPT: &str = "Você elabora avaliações claras e justas. Responda apenas JSON.";
const GENERATION_TEMPERATURE: f32 = 0.4;
const MIN_OPTIONS: usize = 2;

#[derive(Debug, Clone, Serialize)]
pub struct GeneratedQuiz {
    pub quiz_type: QuizType,
    pub items: Vec<QuizItem>,
}

#[derive(Clone)]
pub struct QuizGenerator {
    gateway: Arc<dyn LlmGateway>,
}

impl QuizGenerator {
    pub fn new(gateway: Arc<dyn LlmGateway>) -> Self {
        Self { gateway }
    }

    /// Asks the model for `n` items of one variant and keeps whatever survives
    /// validation. Never returns more than `n` items. Fails only when the
    /// output contains no usable JSON at all; retry policy is the caller's.
    pub async fn generate_quiz(
        &self,
        source_text: &str,
        quiz_type: QuizType,
        n: usize,
    ) -> Result<GeneratedQuiz> {
        if n == 0 {
            return Ok(GeneratedQuiz {
                quiz_type,
                items: Vec::new(),
            });
        }

        let prompt = build_prompt(source_text, quiz_type, n);
        let raw = self
            .gateway
            .complete(SYSTEM_PROMPT, &prompt, GENERATION_TEMPERATURE)
            .await?;
        let items = parse_items(&raw, quiz_type, n)?;

        if items.len() < n {
            tracing::warn!(
                quiz_type = %quiz_type,
                requested = n,
                kept = items.len(),
                "model produced fewer usable items than requested"
            );
        }

        Ok(GeneratedQuiz { quiz_type, items })
    }
}

pub fn build_prompt(source_text: &str, quiz_type: QuizType, n: usize) -> String {
    let (type_desc, schema_hint) = match quiz_type {
        QuizType::TrueFalse => (
            "Questões de Verdadeiro ou Falso",
            r#"[{"type":"vf","question":"...","answer":true,"explanation":"..."}]"#,
        ),
        QuizType::MultipleChoice => (
            "Questões de múltipla escolha com 4 alternativas (apenas uma correta)",
            r#"[{"type":"mc","question":"...","options":["A","B","C","D"],"answer":2,"explanation":"..."}]"#,
        ),
        QuizType::Discursive => (
            "Questões discursivas com rubrica de 3-5 critérios objetivos",
            r#"[{"type":"disc","question":"...","rubric":["critério 1","critério 2"]}]"#,
        ),
    };

    format!(
        r#"Gere {n} itens de prova do tipo: {type_desc}.
Responda SOMENTE JSON válido, no formato do exemplo:

{schema_hint}

Regras:
- Itens não ambíguos e baseados EXCLUSIVAMENTE no CONTEÚDO.
- Não repita enunciados.
- Nas discursivas, forneça "rubric" com critérios factuais.

CONTEÚDO:
{source_text}
"#
    )
}

/// Permissive parse of raw model output into validated items of `quiz_type`.
/// Items that fail coercion are dropped one by one; only a missing JSON
/// structure fails the whole batch.
pub fn parse_items(raw: &str, quiz_type: QuizType, n: usize) -> Result<Vec<QuizItem>> {
    let value = extract_json_where(raw, holds_items)
        .ok_or_else(|| Error::MalformedGeneration("no JSON found in model output".to_string()))?;
    let entries = item_entries(&value).ok_or_else(|| {
        Error::MalformedGeneration("model output is not a list of items".to_string())
    })?;

    let total = entries.len();
    let items: Vec<QuizItem> = entries
        .iter()
        .filter_map(|entry| coerce_item(entry, quiz_type))
        .take(n)
        .collect();

    let dropped = total.saturating_sub(items.len());
    if dropped > 0 {
        tracing::debug!(total, kept = items.len(), "dropped or truncated generated items");
    }
    Ok(items)
}

/// An array or wrapper object with at least one object entry; rules out
/// bracketed prose like `[1]`.
fn holds_items(value: &JsonValue) -> bool {
    item_entries(value).is_some_and(|entries| entries.iter().any(JsonValue::is_object))
}

fn item_entries(value: &JsonValue) -> Option<&[JsonValue]> {
    if let Some(arr) = value.as_array() {
        return Some(arr.as_slice());
    }
    let obj = value.as_object()?;
    for key in ["items", "questions", "itens", "questoes"] {
        if let Some(arr) = obj.get(key).and_then(|v| v.as_array()) {
            return Some(arr.as_slice());
        }
    }
    obj.contains_key("question").then(|| std::slice::from_ref(value))
}

fn parse_tag(tag: &str) -> Option<QuizType> {
    if let Ok(kind) = tag.parse::<QuizType>() {
        return Some(kind);
    }
    match tag.trim().to_ascii_lowercase().replace('-', "_").as_str() {
        "true_false" | "truefalse" | "verdadeiro_falso" => Some(QuizType::TrueFalse),
        "multiple_choice" | "multiplechoice" | "multipla_escolha" => Some(QuizType::MultipleChoice),
        "discursive" | "discursiva" | "open" | "essay" => Some(QuizType::Discursive),
        _ => None,
    }
}

fn coerce_item(v: &JsonValue, quiz_type: QuizType) -> Option<QuizItem> {
    if let Some(tag) = v.get("type").and_then(|t| t.as_str()) {
        if parse_tag(tag) != Some(quiz_type) {
            return None;
        }
    }

    let question = v.get("question").and_then(coerce_string)?;

    match quiz_type {
        QuizType::TrueFalse => Some(QuizItem::TrueFalse {
            question,
            answer: v.get("answer").and_then(coerce_bool)?,
            explanation: explanation(v),
        }),
        QuizType::MultipleChoice => {
            let options: Vec<String> = v
                .get("options")
                .and_then(|o| o.as_array())?
                .iter()
                .filter_map(coerce_string)
                .take(MAX_OPTIONS)
                .collect();
            if options.len() < MIN_OPTIONS {
                return None;
            }
            let answer = v.get("answer").and_then(coerce_index)?;
            if answer >= options.len() {
                return None;
            }
            Some(QuizItem::MultipleChoice {
                question,
                options,
                answer,
                explanation: explanation(v),
            })
        }
        QuizType::Discursive => {
            let rubric = v
                .get("rubric")
                .and_then(|r| r.as_array())
                .map(|arr| {
                    arr.iter()
                        .filter_map(coerce_string)
                        .take(MAX_RUBRIC_CRITERIA)
                        .collect()
                })
                .unwrap_or_default();
            Some(QuizItem::Discursive { question, rubric })
        }
    }
}

fn explanation(v: &JsonValue) -> String {
    v.get("explanation")
        .or_else(|| v.get("explain"))
        .and_then(coerce_string)
        .unwrap_or_default()
}

fn coerce_string(v: &JsonValue) -> Option<String> {
    let s = match v {
        JsonValue::String(s) => s.trim().to_string(),
        JsonValue::Number(n) => n.to_string(),
        JsonValue::Bool(b) => b.to_string(),
        _ => return None,
    };
    (!s.is_empty()).then_some(s)
}

fn coerce_bool(v: &JsonValue) -> Option<bool> {
    match v {
        JsonValue::Bool(b) => Some(*b),
        JsonValue::Number(n) => match n.as_i64() {
            Some(1) => Some(true),
            Some(0) => Some(false),
            _ => None,
        },
        JsonValue::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "verdadeiro" | "v" => Some(true),
            "false" | "falso" | "f" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn coerce_index(v: &JsonValue) -> Option<usize> {
    match v {
        JsonValue::Number(n) => {
            if let Some(i) = n.as_u64() {
                return usize::try_from(i).ok();
            }
            n.as_f64()
                .filter(|f| *f >= 0.0 && f.fract() == 0.0)
                .map(|f| f as usize)
        }
        JsonValue::String(s) => {
            let s = s.trim();
            if let Ok(i) = s.parse::<usize>() {
                return Some(i);
            }
            let mut chars = s.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) if ('a'..='d').contains(&c.to_ascii_lowercase()) => {
                    Some(c.to_ascii_lowercase() as usize - 'a' as usize)
                }
                _ => None,
            }
        }
        _ => None,
    }
}
