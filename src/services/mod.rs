pub mod document_service;
pub mod grading_service;
pub mod llm_gateway;
pub mod quiz_generator;
pub mod quiz_service;
pub mod study_service;
pub mod summary_cache;
pub mod user_service;
