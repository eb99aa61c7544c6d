pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;

use crate::config::Config;
use crate::error::Result;
use crate::middleware::rate_limit::SlidingWindowLimiter;
use crate::services::{
    document_service::DocumentService,
    grading_service::GradingService,
    llm_gateway::{LlmGateway, OpenAiGateway},
    quiz_generator::QuizGenerator,
    quiz_service::QuizService,
    study_service::StudyService,
    summary_cache::SummaryCache,
    user_service::UserService,
};
use reqwest::Client;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<Config>,
    pub gateway: Arc<dyn LlmGateway>,
    pub rate_limiter: SlidingWindowLimiter,
    pub user_service: UserService,
    pub document_service: DocumentService,
    pub quiz_service: QuizService,
    pub quiz_generator: QuizGenerator,
    pub grading_service: GradingService,
    pub study_service: StudyService,
}

impl AppState {
    pub fn new(pool: PgPool, config: Arc<Config>) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.llm_timeout_secs.max(1)))
            .build()?;
        let gateway: Arc<dyn LlmGateway> = Arc::new(OpenAiGateway::new(&config, http_client));
        Ok(Self::with_gateway(pool, config, gateway))
    }

    /// Wires every service around an explicit gateway. Each call gets its own
    /// limiter buckets and summary cache.
    pub fn with_gateway(pool: PgPool, config: Arc<Config>, gateway: Arc<dyn LlmGateway>) -> Self {
        let rate_limiter = SlidingWindowLimiter::new(
            Duration::from_secs(config.rate_limit_window_seconds),
            config.rate_limit_max_calls,
            config.rate_limit_paths.clone(),
        );
        let summary_cache = SummaryCache::new(config.summary_cache_capacity);

        Self {
            user_service: UserService::new(pool.clone()),
            document_service: DocumentService::new(pool.clone()),
            quiz_service: QuizService::new(pool.clone()),
            quiz_generator: QuizGenerator::new(gateway.clone()),
            grading_service: GradingService::new(gateway.clone()),
            study_service: StudyService::new(gateway.clone(), summary_cache),
            rate_limiter,
            gateway,
            config,
            pool,
        }
    }
}
