use std::sync::Arc;

use crate::error::Result;
use crate::services::llm_gateway::{is_placeholder, LlmGateway};
use crate::services::summary_cache::SummaryCache;
use crate::utils::text::first_sentences;

const PLANNER_SYSTEM_PROMPT: &str =
    "Você monta planos de estudo objetivos e acionáveis. Responda em PT-BR.";
const SUMMARY_SYSTEM_PROMPT: &str = "Você resume textos didáticos de forma fiel. Responda em PT-BR.";

pub const DEFAULT_WEEKLY_HOURS: u32 = 6;
pub const DEFAULT_WEEKS: u32 = 4;
pub const MAX_WEEKS: u32 = 52;
pub const MAX_WEEKLY_HOURS: u32 = 80;

#[derive(Clone)]
pub struct StudyService {
    gateway: Arc<dyn LlmGateway>,
    cache: SummaryCache,
}

impl StudyService {
    pub fn new(gateway: Arc<dyn LlmGateway>, cache: SummaryCache) -> Self {
        Self { gateway, cache }
    }

    /// Markdown study plan over `semanas` weeks at roughly `horas_semanais`
    /// hours per week. Provider errors propagate.
    pub async fn create_study_plan_md(
        &self,
        text: &str,
        horas_semanais: u32,
        semanas: u32,
    ) -> Result<String> {
        let horas = horas_semanais.clamp(1, MAX_WEEKLY_HOURS);
        let semanas = semanas.clamp(1, MAX_WEEKS);
        let prompt = study_plan_prompt(text, horas, semanas);

        let plan = self
            .gateway
            .complete(PLANNER_SYSTEM_PROMPT, &prompt, 0.3)
            .await?;
        tracing::info!(semanas, horas, chars = plan.len(), "study plan generated");
        Ok(plan)
    }

    /// Up to `max_bullets` summary bullets. Successful model summaries are
    /// memoized; any failure or unusable reply falls back to the first
    /// sentences of `text` and is not cached.
    pub async fn summarize(&self, text: &str, max_bullets: usize) -> Vec<String> {
        if max_bullets == 0 || text.trim().is_empty() {
            return Vec::new();
        }

        let param = max_bullets.to_string();
        if let Some(hit) = self.cache.get(text, &param) {
            return hit.lines().map(str::to_string).collect();
        }

        let prompt = format!(
            "Resuma o CONTEÚDO abaixo em no máximo {max_bullets} tópicos curtos, um por linha, cada um iniciado por \"- \".\n\nCONTEÚDO:\n{text}\n"
        );

        let bullets = match self.gateway.complete(SUMMARY_SYSTEM_PROMPT, &prompt, 0.2).await {
            Ok(raw) if !is_placeholder(&raw) => parse_bullets(&raw, max_bullets),
            Ok(_) => Vec::new(),
            Err(e) => {
                tracing::warn!("summary call failed, using leading sentences: {}", e);
                Vec::new()
            }
        };

        if bullets.is_empty() {
            return first_sentences(text, max_bullets);
        }

        self.cache.insert(text, &param, bullets.join("\n"));
        bullets
    }
}

pub fn study_plan_prompt(text: &str, horas_semanais: u32, semanas: u32) -> String {
    format!(
        r#"Você é um tutor pedagógico. Com base no CONTEÚDO abaixo,
gere um PLANO DE ESTUDO em Markdown para {semanas} semanas, estimando ~{horas_semanais}h/semana.

Formato obrigatório (apenas Markdown):
# Objetivos de aprendizagem
- ...

# Pré-requisitos
- ...

# Cronograma (Semana 1..{semanas})
## Semana 1
- Tópicos:
- Atividades:
- Entregáveis:

# Materiais de apoio
- ...

# Estratégias de revisão e avaliação
- ...

CONTEÚDO:
{text}
"#
    )
}

/// Lines that look like list entries (`-`, `*`, `•` or `1.`), markers stripped.
fn parse_bullets(raw: &str, max_bullets: usize) -> Vec<String> {
    raw.lines()
        .filter_map(|line| {
            let line = line.trim();
            let rest = if let Some(rest) = line
                .strip_prefix("- ")
                .or_else(|| line.strip_prefix("* "))
                .or_else(|| line.strip_prefix("• "))
            {
                rest
            } else {
                let digits = line.chars().take_while(char::is_ascii_digit).count();
                if digits == 0 {
                    return None;
                }
                line[digits..]
                    .strip_prefix(". ")
                    .or_else(|| line[digits..].strip_prefix(") "))?
            };
            let rest = rest.trim();
            (!rest.is_empty()).then(|| rest.to_string())
        })
        .take(max_bullets)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::services::llm_gateway::MockLlmGateway;

    fn service(gateway: MockLlmGateway) -> StudyService {
        StudyService::new(Arc::new(gateway), SummaryCache::new(8))
    }

    #[test]
    fn bullets_accept_common_list_markers() {
        let raw = "Resumo:\n- Um\n* Dois\n• Três\n4. Quatro\n5) Cinco\n-\nTexto solto";
        assert_eq!(
            parse_bullets(raw, 10),
            vec!["Um", "Dois", "Três", "Quatro", "Cinco"]
        );
        assert_eq!(parse_bullets(raw, 2), vec!["Um", "Dois"]);
    }

    #[test]
    fn plan_prompt_carries_schedule_parameters() {
        let prompt = study_plan_prompt("Células", 8, 3);
        assert!(prompt.contains("para 3 semanas, estimando ~8h/semana"));
        assert!(prompt.contains("# Cronograma (Semana 1..3)"));
    }

    #[tokio::test]
    async fn summaries_are_cached_after_success() {
        let mut gateway = MockLlmGateway::new();
        gateway
            .expect_complete()
            .times(1)
            .returning(|_, _, _| Ok("- Primeiro ponto\n- Segundo ponto".to_string()));

        let study = service(gateway);
        let first = study.summarize("Um texto qualquer.", 5).await;
        let second = study.summarize("Um texto qualquer.", 5).await;
        assert_eq!(first, vec!["Primeiro ponto", "Segundo ponto"]);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn failed_summary_falls_back_and_is_retried_later() {
        let mut gateway = MockLlmGateway::new();
        gateway
            .expect_complete()
            .times(2)
            .returning(|_, _, _| Err(Error::Internal("timeout".into())));

        let study = service(gateway);
        let text = "Frase um. Frase dois. Frase três";
        assert_eq!(
            study.summarize(text, 2).await,
            vec!["Frase um", "Frase dois"]
        );
        assert_eq!(study.summarize(text, 2).await.len(), 2);
    }

    #[tokio::test]
    async fn placeholder_reply_uses_leading_sentences() {
        let mut gateway = MockLlmGateway::new();
        gateway
            .expect_complete()
            .returning(|_, _, _| Ok("[DUMMY-test]\n- Sistema".to_string()));

        let summary = service(gateway).summarize("A. B", 5).await;
        assert_eq!(summary, vec!["A", "B"]);
    }

    #[tokio::test]
    async fn study_plan_clamps_weeks() {
        let mut gateway = MockLlmGateway::new();
        gateway
            .expect_complete()
            .withf(|_, user, temperature| user.contains("para 52 semanas") && *temperature == 0.3)
            .times(1)
            .returning(|_, _, _| Ok("# Objetivos de aprendizagem".to_string()));

        let plan = service(gateway)
            .create_study_plan_md("conteúdo", 6, 500)
            .await
            .unwrap();
        assert!(plan.starts_with("# Objetivos"));
    }
}
