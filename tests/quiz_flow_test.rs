mod common;

use std::collections::HashMap;
use std::sync::Arc;

use common::ScriptedGateway;
use study_tutor_backend::error::Error;
use study_tutor_backend::models::answer::{collect_form_answers, Answer};
use study_tutor_backend::models::quiz::{QuizItem, QuizItemView, QuizType};
use study_tutor_backend::services::grading_service::GradingService;
use study_tutor_backend::services::quiz_generator::QuizGenerator;

const SOURCE: &str = "A mitocôndria produz ATP. O núcleo guarda o DNA. A membrana controla trocas.";

fn form(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[tokio::test]
async fn multiple_choice_round_trip_scores_by_index() {
    let reply = r#"Aqui está:
```json
[
  {"type":"mc","question":"Quem produz ATP?","options":["Núcleo","Membrana","Mitocôndria","Ribossomo"],"answer":2,"explanation":"respiração celular"},
  {"type":"mc","question":"Quem guarda o DNA?","options":["Núcleo","Membrana","Mitocôndria","Ribossomo"],"answer":0}
]
```
Bons estudos!"#;
    let gateway = Arc::new(ScriptedGateway::new([reply]));
    let generator = QuizGenerator::new(gateway.clone());

    let quiz = generator
        .generate_quiz(SOURCE, QuizType::MultipleChoice, 5)
        .await
        .unwrap();
    assert_eq!(quiz.items.len(), 2);
    assert!(gateway.prompts()[0].contains(SOURCE));

    let grader = GradingService::new(gateway);

    let answers = collect_form_answers(&quiz.items, &form(&[("q_0", "2"), ("q_1", "0")]));
    let outcome = grader
        .grade(QuizType::MultipleChoice, &quiz.items, SOURCE, &answers)
        .await;
    assert_eq!((outcome.correct, outcome.total, outcome.score), (2, 2, 10));

    let answers = collect_form_answers(&quiz.items, &form(&[("q_0", "9"), ("q_1", "zero")]));
    assert_eq!(answers, vec![Answer::Index(9), Answer::Unanswered]);
    let outcome = grader
        .grade(QuizType::MultipleChoice, &quiz.items, SOURCE, &answers)
        .await;
    assert_eq!(outcome.correct, 0);
    assert_eq!(outcome.score, 0);
    assert_eq!(outcome.item_scores, vec![Some(0.0), None]);
}

#[tokio::test]
async fn true_false_partial_score_rounds() {
    let reply = r#"{"items":[
        {"type":"vf","question":"A mitocôndria produz ATP?","answer":true},
        {"type":"vf","question":"O núcleo produz ATP?","answer":false},
        {"type":"vf","question":"A membrana guarda o DNA?","answer":"falso"}
    ]}"#;
    let gateway = Arc::new(ScriptedGateway::new([reply]));
    let quiz = QuizGenerator::new(gateway.clone())
        .generate_quiz(SOURCE, QuizType::TrueFalse, 10)
        .await
        .unwrap();
    assert_eq!(quiz.items.len(), 3);

    let answers = collect_form_answers(
        &quiz.items,
        &form(&[("q_0", "true"), ("q_1", "true"), ("q_2", "false")]),
    );
    let outcome = GradingService::new(gateway)
        .grade(QuizType::TrueFalse, &quiz.items, SOURCE, &answers)
        .await;
    assert_eq!(outcome.correct, 2);
    assert_eq!(outcome.score, 7);
}

#[tokio::test]
async fn discursive_quiz_is_graded_by_rubric_batch() {
    let gateway = Arc::new(ScriptedGateway::new([
        r#"[{"type":"disc","question":"Explique a função da mitocôndria.","rubric":["cita ATP","cita respiração"]},
            {"type":"disc","question":"Explique a função do núcleo.","rubric":["cita DNA"]}]"#,
        r#"{"scores":[0.9,0.3]}"#,
    ]));

    let quiz = QuizGenerator::new(gateway.clone())
        .generate_quiz(SOURCE, QuizType::Discursive, 2)
        .await
        .unwrap();

    let views: Vec<QuizItemView> = quiz
        .items
        .iter()
        .enumerate()
        .map(|(i, item)| QuizItemView::render(i, item))
        .collect();
    let rendered = serde_json::to_value(&views).unwrap();
    assert_eq!(rendered[0]["rubric"][0], "cita ATP");

    let answers = collect_form_answers(
        &quiz.items,
        &form(&[("q_0", "Produz ATP pela respiração."), ("q_1", "Não sei.")]),
    );
    let outcome = GradingService::new(gateway.clone())
        .grade(QuizType::Discursive, &quiz.items, SOURCE, &answers)
        .await;

    assert_eq!(outcome.correct, 1);
    assert_eq!(outcome.score, 5);
    let grading_prompt = &gateway.prompts()[1];
    assert!(grading_prompt.contains("Produz ATP pela respiração."));
    assert!(grading_prompt.contains("cita DNA"));
}

#[tokio::test]
async fn discursive_grading_failure_scores_zero() {
    let items = vec![QuizItem::Discursive {
        question: "Explique.".into(),
        rubric: vec![],
    }];
    let grader = GradingService::new(Arc::new(ScriptedGateway::failing()));
    let outcome = grader
        .grade(QuizType::Discursive, &items, SOURCE, &[Answer::Text("algo".into())])
        .await;
    assert_eq!(outcome.item_scores, vec![Some(0.0)]);
    assert_eq!(outcome.score, 0);
}

#[tokio::test]
async fn generation_without_json_is_an_error() {
    let gateway = Arc::new(ScriptedGateway::new(["Desculpe, não consigo gerar a prova."]));
    let err = QuizGenerator::new(gateway)
        .generate_quiz(SOURCE, QuizType::MultipleChoice, 3)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::MalformedGeneration(_)));
}

#[tokio::test]
async fn generation_errors_from_the_gateway_propagate() {
    let err = QuizGenerator::new(Arc::new(ScriptedGateway::failing()))
        .generate_quiz(SOURCE, QuizType::TrueFalse, 3)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Internal(_)));
}
