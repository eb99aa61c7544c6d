use axum::{
    extract::{Multipart, Path, State},
    response::{IntoResponse, Redirect, Response},
    Extension, Form, Json,
};
use std::collections::HashMap;
use uuid::Uuid;

use crate::{
    dto::document_dto::DocumentOut,
    dto::tutor_dto::{
        type_labels, DocumentDetail, DocumentListItem, QuizCreateForm, QuizMenu, QuizResult,
        QuizTakeView, StudyForm, StudyView,
    },
    error::{Error, Result},
    middleware::auth::Claims,
    models::answer::collect_form_answers,
    models::document::Document,
    utils::{
        pdf::{extract_pdf_text, lossy_decode},
        text::clean_text,
    },
    AppState,
};

const TUTOR_HOME: &str = "/tutor";
const SUMMARY_BULLETS: usize = 5;

fn back_to_tutor() -> Response {
    Redirect::to(TUTOR_HOME).into_response()
}

async fn owned_document(state: &AppState, claims: &Claims, id: Uuid) -> Result<Option<Document>> {
    state.document_service.find_owned(id, claims.user_id()?).await
}

#[axum::debug_handler]
pub async fn tutor_home(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse> {
    let docs = state.document_service.list_for_user(claims.user_id()?).await?;
    let docs: Vec<DocumentListItem> = docs.into_iter().map(DocumentListItem::from).collect();
    Ok(Json(docs))
}

#[axum::debug_handler]
pub async fn tutor_upload(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    mut multipart: Multipart,
) -> Result<Response> {
    let user_id = claims.user_id()?;
    let max_bytes = state.config.max_upload_mb * 1024 * 1024;
    let mut title = String::new();
    let mut content = String::new();

    while let Some(field) = multipart.next_field().await? {
        let field_name = field.name().unwrap_or_default().to_string();
        match field_name.as_str() {
            "title" => title = field.text().await?,
            "text" => content.push_str(&field.text().await?),
            "file" => {
                let filename = field.file_name().unwrap_or_default().to_lowercase();
                let data = field.bytes().await?;
                if filename.is_empty() && data.is_empty() {
                    continue;
                }
                if data.len() > max_bytes {
                    tracing::warn!(bytes = data.len(), "tutor upload over size limit, file ignored");
                    continue;
                }
                let extracted = if filename.ends_with(".pdf") {
                    extract_pdf_text(&data).await
                } else {
                    lossy_decode(&data)
                };
                content.push('\n');
                content.push_str(&extracted);
            }
            _ => {}
        }
    }

    let content = clean_text(&content);
    if content.is_empty() {
        return Ok(back_to_tutor());
    }

    let doc = state.document_service.create(user_id, &title, &content).await?;
    Ok(Redirect::to(&format!("/tutor/doc/{}", doc.id)).into_response())
}

#[axum::debug_handler]
pub async fn doc_detail(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(doc_id): Path<Uuid>,
) -> Result<Response> {
    let Some(doc) = owned_document(&state, &claims, doc_id).await? else {
        return Ok(back_to_tutor());
    };

    let summary = state.study_service.summarize(&doc.content, SUMMARY_BULLETS).await;
    let quiz_stats = state.quiz_service.stats_for_document(doc.id).await?;
    let attempt_rows = state.quiz_service.attempts_for_document(doc.id).await?;

    Ok(Json(DocumentDetail {
        document: DocumentOut::from(doc),
        summary,
        quiz_stats,
        attempt_rows,
        type_labels: type_labels(),
    })
    .into_response())
}

#[axum::debug_handler]
pub async fn study_get(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(doc_id): Path<Uuid>,
) -> Result<Response> {
    let Some(doc) = owned_document(&state, &claims, doc_id).await? else {
        return Ok(back_to_tutor());
    };
    let plan = state.document_service.latest_study_plan(doc.id).await?;
    Ok(Json(StudyView {
        document_id: doc.id,
        title: doc.title,
        plan,
    })
    .into_response())
}

#[axum::debug_handler]
pub async fn study_post(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(doc_id): Path<Uuid>,
    Form(form): Form<StudyForm>,
) -> Result<Response> {
    let Some(doc) = owned_document(&state, &claims, doc_id).await? else {
        return Ok(back_to_tutor());
    };
    let plan_md = state
        .study_service
        .create_study_plan_md(&doc.content, form.horas_semanais, form.semanas)
        .await?;
    state.document_service.save_study_plan(doc.id, &plan_md).await?;
    Ok(Redirect::to(&format!("/tutor/doc/{}/study", doc.id)).into_response())
}

#[axum::debug_handler]
pub async fn quiz_menu(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(doc_id): Path<Uuid>,
) -> Result<Response> {
    let Some(doc) = owned_document(&state, &claims, doc_id).await? else {
        return Ok(back_to_tutor());
    };
    Ok(Json(QuizMenu::new(&doc, state.config.max_quiz_items)).into_response())
}

#[axum::debug_handler]
pub async fn quiz_create(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(doc_id): Path<Uuid>,
    Form(form): Form<QuizCreateForm>,
) -> Result<Response> {
    let Some(doc) = owned_document(&state, &claims, doc_id).await? else {
        return Ok(back_to_tutor());
    };

    let quiz_type = form.quiz_type();
    let n = form.item_count(state.config.max_quiz_items);
    let generated = state
        .quiz_generator
        .generate_quiz(&doc.content, quiz_type, n)
        .await?;
    if generated.items.is_empty() {
        return Err(Error::MalformedGeneration(
            "no usable quiz items in model output".to_string(),
        ));
    }

    let quiz = state
        .quiz_service
        .create_quiz(doc.id, generated.quiz_type, &generated.items)
        .await?;
    Ok(Redirect::to(&format!("/tutor/quiz/{}", quiz.id)).into_response())
}

#[axum::debug_handler]
pub async fn quiz_take(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(quiz_id): Path<Uuid>,
) -> Result<Response> {
    let Some(quiz) = state.quiz_service.find_for_user(quiz_id, claims.user_id()?).await? else {
        return Ok(back_to_tutor());
    };
    let document_title = owned_document(&state, &claims, quiz.document_id)
        .await?
        .map(|d| d.title)
        .unwrap_or_default();

    Ok(Json(QuizTakeView {
        quiz_id: quiz.id,
        document_id: quiz.document_id,
        document_title,
        quiz_type: quiz.quiz_type,
        label: quiz.quiz_type.label(),
        items: quiz.view(),
    })
    .into_response())
}

#[axum::debug_handler]
pub async fn quiz_submit(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(quiz_id): Path<Uuid>,
    Form(form): Form<HashMap<String, String>>,
) -> Result<Response> {
    let Some(quiz) = state.quiz_service.find_for_user(quiz_id, claims.user_id()?).await? else {
        return Ok(back_to_tutor());
    };
    let context = owned_document(&state, &claims, quiz.document_id)
        .await?
        .map(|d| d.content)
        .unwrap_or_default();

    let answers = collect_form_answers(&quiz.items, &form);
    let outcome = state
        .grading_service
        .grade(quiz.quiz_type, &quiz.items, &context, &answers)
        .await;
    let attempt = state
        .quiz_service
        .record_attempt(quiz.id, &answers, outcome.score)
        .await?;

    tracing::info!(
        quiz_id = %quiz.id,
        attempt_id = %attempt.id,
        score = outcome.score,
        correct = outcome.correct,
        total = outcome.total,
        "quiz attempt graded"
    );

    Ok(Json(QuizResult {
        attempt_id: attempt.id,
        quiz_id: quiz.id,
        quiz_type: quiz.quiz_type,
        items: quiz.items,
        answers,
        score: outcome.score,
        max_score: outcome.max_score,
        correct: outcome.correct,
        total: outcome.total,
        item_scores: outcome.item_scores,
    })
    .into_response())
}
