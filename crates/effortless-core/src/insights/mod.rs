//! Insight Assembler
//!
//! Produces the insight bundle for one user: a summary paragraph, 2-3
//! insights and ranked reward recommendations.
//!
//! ## Modes
//!
//! - **Generative** - the `dashboard_insights` prompt is rendered with the
//!   summary and catalog, sent to the configured backend under a timeout, and
//!   the JSON reply is validated
//! - **Fallback** - templated text computed from the summary; used when no
//!   backend is configured or generation errors, times out or returns
//!   something malformed
//!
//! Recommendations come from the same filter/rank step in both modes.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let assembler = InsightAssembler::new(config.insights.clone(), AIClient::from_env())?;
//! let bundle = assembler.assemble(&request).await;
//! ```

pub mod fallback;
pub mod recommend;

pub use fallback::{fallback_insights, format_money, period_phrase};
pub use recommend::{recommend, reward_value, triggered_reward_ids, RankOptions, Recommendations};

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::aggregate::DashboardSummary;
use crate::ai::parsing::parse_generated_insights;
use crate::ai::{AIBackend, AIClient, GenerateRequest, GeneratedInsights};
use crate::config::InsightsConfig;
use crate::error::{Error, Result};
use crate::matching::effective_location;
use crate::models::{Preferences, Reward, Transaction, User};
use crate::prompts::{Prompt, PromptId, PromptLibrary};

/// Which path produced the text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightMode {
    Generative,
    Fallback,
}

impl InsightMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Generative => "generative",
            Self::Fallback => "fallback",
        }
    }
}

/// Insight bundle returned to callers, well-formed in either mode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightBundle {
    pub user_id: i64,
    pub summary_text: String,
    pub top_insights: Vec<String>,
    pub recommended_auto_apply_rewards: Vec<Reward>,
    pub recommended_priceless_experiences: Vec<Reward>,
    /// Recommended experiences the user should be notified about
    pub notify_experience_ids: Vec<i64>,
    pub mode: InsightMode,
    /// Backend model, set in generative mode
    pub model: Option<String>,
    pub generated_at: DateTime<Utc>,
}

/// Everything the assembler needs about one user
pub struct InsightRequest<'a> {
    pub user: &'a User,
    pub preferences: &'a Preferences,
    /// The user's summary, already aggregated over the insight window
    pub summary: &'a DashboardSummary,
    /// The user's transactions (used to skip rewards already triggered)
    pub transactions: &'a [Transaction],
    pub catalog: &'a [Reward],
    pub now: DateTime<Utc>,
}

/// Builds insight bundles
pub struct InsightAssembler {
    ai: Option<AIClient>,
    prompt: Prompt,
    config: InsightsConfig,
}

impl InsightAssembler {
    /// Create an assembler using the default prompt library
    pub fn new(config: InsightsConfig, ai: Option<AIClient>) -> Result<Self> {
        Self::with_prompts(config, ai, &mut PromptLibrary::new())
    }

    /// Create an assembler with prompts from `library`
    pub fn with_prompts(
        config: InsightsConfig,
        ai: Option<AIClient>,
        library: &mut PromptLibrary,
    ) -> Result<Self> {
        let prompt = library.get(PromptId::DashboardInsights)?.clone();
        Ok(Self { ai, prompt, config })
    }

    pub fn config(&self) -> &InsightsConfig {
        &self.config
    }

    pub fn ai(&self) -> Option<&AIClient> {
        self.ai.as_ref()
    }

    /// Assemble the bundle; never fails
    pub async fn assemble(&self, request: &InsightRequest<'_>) -> InsightBundle {
        let location = effective_location(request.user, Some(request.preferences));
        let triggered = triggered_reward_ids(request.user.id, request.transactions);
        let recs = recommend(
            request.catalog,
            location,
            &triggered,
            request.now,
            &RankOptions {
                top_k: self.config.top_k,
                experience_value: self.config.experience_value,
            },
        );

        let notify_experience_ids =
            if recommend::wants_experience_notifications(request.preferences) {
                recs.priceless.iter().map(|r| r.id).collect()
            } else {
                Vec::new()
            };

        let (text, mode, model) = match &self.ai {
            Some(ai) => match self.generate_with_timeout(ai, request, &recs).await {
                Ok(text) => {
                    info!(user_id = request.user.id, model = ai.model(), "Generated insights");
                    (text, InsightMode::Generative, Some(ai.model().to_string()))
                }
                Err(e) => {
                    warn!(user_id = request.user.id, error = %e, "Insight generation failed, using fallback");
                    (self.fallback(request), InsightMode::Fallback, None)
                }
            },
            None => {
                debug!(user_id = request.user.id, "No AI backend configured, using fallback");
                (self.fallback(request), InsightMode::Fallback, None)
            }
        };

        InsightBundle {
            user_id: request.user.id,
            summary_text: text.summary_text,
            top_insights: text.top_insights,
            recommended_auto_apply_rewards: recs.auto_apply,
            recommended_priceless_experiences: recs.priceless,
            notify_experience_ids,
            mode,
            model,
            generated_at: request.now,
        }
    }

    fn fallback(&self, request: &InsightRequest<'_>) -> GeneratedInsights {
        fallback_insights(request.summary, self.config.window_days)
    }

    /// One bounded attempt at generation
    async fn generate_with_timeout(
        &self,
        ai: &AIClient,
        request: &InsightRequest<'_>,
        recs: &Recommendations,
    ) -> Result<GeneratedInsights> {
        let generate = GenerateRequest::new(self.prompt.render_user(&self.prompt_vars(request, recs)))
            .with_temperature(self.prompt.metadata.temperature);
        let generate = match self.prompt.system_section() {
            Some(system) => generate.with_system(system),
            None => generate,
        };

        let reply = tokio::time::timeout(self.config.timeout, ai.generate(&generate))
            .await
            .map_err(|_| Error::Timeout(self.config.timeout))??;

        parse_generated_insights(&reply)
    }

    fn prompt_vars(
        &self,
        request: &InsightRequest<'_>,
        recs: &Recommendations,
    ) -> HashMap<&'static str, String> {
        let summary = request.summary;
        let location = effective_location(request.user, Some(request.preferences))
            .unwrap_or("Unknown");

        let top_categories = if summary.spending_by_category.is_empty() {
            "- none".to_string()
        } else {
            summary
                .spending_by_category
                .iter()
                .take(3)
                .map(|c| format!("- {}: ${} ({} transactions)", c.category, format_money(c.total_spent), c.count))
                .collect::<Vec<_>>()
                .join("\n")
        };

        let rewards_by_category = if summary.rewards_by_category.is_empty() {
            "- none".to_string()
        } else {
            summary
                .rewards_by_category
                .iter()
                .map(|c| format!("- {}: ${} ({} rewards)", c.category, format_money(c.total_savings), c.count))
                .collect::<Vec<_>>()
                .join("\n")
        };

        let available_rewards = recs
            .auto_apply
            .iter()
            .chain(recs.priceless.iter())
            .map(|r| format!("- {} ({})", r.label, r.merchant_name))
            .collect::<Vec<_>>()
            .join("\n");

        let period = period_phrase(self.config.window_days);

        HashMap::from([
            ("user_name", request.user.name.clone()),
            ("location", location.to_string()),
            ("period", period),
            ("total_balance", format_money(summary.total_balance)),
            ("total_transactions", summary.total_transactions.to_string()),
            ("total_savings", format_money(summary.total_savings())),
            ("saved_via_auto_apply", format_money(summary.saved_via_auto_apply)),
            ("saved_via_notifications", format_money(summary.saved_via_notifications)),
            ("rewards_applied", summary.rewards_applied_count().to_string()),
            ("rewards_missed", summary.recent_rewards_missed.len().to_string()),
            ("top_categories", top_categories),
            ("rewards_by_category", rewards_by_category),
            ("available_rewards", available_rewards),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{aggregate, AggregateOptions};
    use crate::ai::MockBackend;
    use crate::models::{GeoScope, RewardType};
    use chrono::{Duration, TimeZone};
    use rust_decimal::Decimal;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    fn config() -> InsightsConfig {
        InsightsConfig {
            timeout: std::time::Duration::from_millis(200),
            top_k: 3,
            recent_limit: 5,
            experience_value: Decimal::new(25, 0),
            window_days: Some(30),
        }
    }

    fn assembler(ai: Option<AIClient>) -> InsightAssembler {
        InsightAssembler::with_prompts(config(), ai, &mut PromptLibrary::embedded_only()).unwrap()
    }

    fn user() -> User {
        User {
            id: 1001,
            name: "Sarah Johnson".into(),
            email: None,
            home_location: Some("San Francisco, CA".into()),
        }
    }

    fn catalog() -> Vec<Reward> {
        let base = Reward {
            id: 1,
            merchant_name: "Starbucks".into(),
            reward_type: RewardType::PercentageCashback,
            label: "5% Cashback at Starbucks".into(),
            description: None,
            category: Some("dining".into()),
            terms: None,
            start_date: now() - Duration::days(30),
            end_date: Some(now() + Duration::days(60)),
            max_savings_amount: None,
            geo_scope: GeoScope::Global,
            geo_country: None,
            geo_city: None,
            is_auto_applicable: true,
            requires_opt_in: false,
            percentage_value: Some(Decimal::new(5, 0)),
            fixed_amount_value: None,
        };
        let wine = Reward {
            id: 5,
            merchant_name: "Exclusive Wine Tasting".into(),
            reward_type: RewardType::Experience,
            label: "Priceless: Wine Tasting Experience".into(),
            category: Some("entertainment".into()),
            geo_scope: GeoScope::City,
            geo_city: Some("San Francisco".into()),
            is_auto_applicable: false,
            requires_opt_in: true,
            percentage_value: None,
            fixed_amount_value: Some(Decimal::new(150, 0)),
            ..base.clone()
        };
        vec![base, wine]
    }

    async fn run(assembler: &InsightAssembler, prefs: &Preferences) -> InsightBundle {
        let user = user();
        let catalog = catalog();
        let summary = aggregate(user.id, &[], &catalog, &AggregateOptions::default());
        let request = InsightRequest {
            user: &user,
            preferences: prefs,
            summary: &summary,
            transactions: &[],
            catalog: &catalog,
            now: now(),
        };
        assembler.assemble(&request).await
    }

    fn assert_well_formed(bundle: &InsightBundle) {
        assert!(!bundle.summary_text.is_empty());
        assert!((2..=3).contains(&bundle.top_insights.len()));
        assert!(bundle.recommended_auto_apply_rewards.len() <= 3);
        assert!(bundle.recommended_priceless_experiences.len() <= 3);
    }

    #[tokio::test]
    async fn test_fallback_without_backend() {
        let prefs = Preferences::defaults_for(&user());
        let bundle = run(&assembler(None), &prefs).await;
        assert_eq!(bundle.mode, InsightMode::Fallback);
        assert!(bundle.model.is_none());
        assert_well_formed(&bundle);
        assert_eq!(bundle.recommended_auto_apply_rewards[0].id, 1);
        assert_eq!(bundle.recommended_priceless_experiences[0].id, 5);
        assert_eq!(bundle.notify_experience_ids, vec![5]);
    }

    #[tokio::test]
    async fn test_generative_with_mock() {
        let prefs = Preferences::defaults_for(&user());
        let bundle = run(&assembler(Some(AIClient::mock())), &prefs).await;
        assert_eq!(bundle.mode, InsightMode::Generative);
        assert_eq!(bundle.model.as_deref(), Some("mock"));
        assert_eq!(bundle.summary_text, "Mock summary of your rewards activity.");
        assert_well_formed(&bundle);
    }

    #[tokio::test]
    async fn test_backend_error_falls_back() {
        let prefs = Preferences::defaults_for(&user());
        let ai = AIClient::Mock(MockBackend::new().failing("connection refused"));
        let bundle = run(&assembler(Some(ai)), &prefs).await;
        assert_eq!(bundle.mode, InsightMode::Fallback);
        assert_well_formed(&bundle);
    }

    #[tokio::test]
    async fn test_malformed_reply_falls_back() {
        let prefs = Preferences::defaults_for(&user());
        let ai = AIClient::Mock(
            MockBackend::new().with_response(r#"{"summary_text": "hi", "top_insights": ["only one"]}"#),
        );
        let bundle = run(&assembler(Some(ai)), &prefs).await;
        assert_eq!(bundle.mode, InsightMode::Fallback);
    }

    #[tokio::test]
    async fn test_slow_backend_times_out() {
        let prefs = Preferences::defaults_for(&user());
        let ai = AIClient::Mock(MockBackend::new().with_delay(std::time::Duration::from_secs(30)));
        let started = std::time::Instant::now();
        let bundle = run(&assembler(Some(ai)), &prefs).await;
        assert_eq!(bundle.mode, InsightMode::Fallback);
        assert!(started.elapsed() < std::time::Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_notifications_disabled_suppresses_notify_ids() {
        let mut prefs = Preferences::defaults_for(&user());
        prefs.priceless_notifications_enabled = false;
        let bundle = run(&assembler(None), &prefs).await;
        assert!(bundle.notify_experience_ids.is_empty());
        assert_eq!(bundle.recommended_priceless_experiences.len(), 1);
    }

    #[test]
    fn test_prompt_vars_cover_template() {
        let assembler = assembler(None);
        let user = user();
        let prefs = Preferences::defaults_for(&user);
        let catalog = catalog();
        let summary = aggregate(user.id, &[], &catalog, &AggregateOptions::default());
        let request = InsightRequest {
            user: &user,
            preferences: &prefs,
            summary: &summary,
            transactions: &[],
            catalog: &catalog,
            now: now(),
        };
        let recs = recommend(
            &catalog,
            Some("San Francisco, CA"),
            &Default::default(),
            now(),
            &RankOptions {
                top_k: 3,
                experience_value: Decimal::new(25, 0),
            },
        );
        let rendered = assembler
            .prompt
            .render_user(&assembler.prompt_vars(&request, &recs));
        assert!(!rendered.contains("{{"), "unrendered placeholder in:\n{}", rendered);
        assert!(rendered.contains("Location: San Francisco, CA"));
        assert!(rendered.contains("Priceless: Wine Tasting Experience"));
    }
}
