pub mod answer;
pub mod document;
pub mod quiz;
pub mod quiz_attempt;
pub mod study_plan;
pub mod user;
