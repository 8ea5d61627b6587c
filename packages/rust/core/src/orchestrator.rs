//! Plan generation: prompts in, parsed fields out.
//!
//! Every call is independent. A failure after the retry policy is exhausted
//! becomes [`Generated::Unavailable`] for that one field and generation
//! carries on with the next.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use brandplanner_shared::{
    AppConfig, CallBudget, CampaignConcept, Estimate, GenerationBudgets, Generated, LlmConfig,
    PlanId, PlannerError, RetryPolicy, Selection, TacticMatch, call_with_retry,
};

use crate::llm::{GenerationRequest, TextGenerator};
use crate::parse;
use crate::prompts::{self, PromptContext};

// ---------------------------------------------------------------------------
// Plan types
// ---------------------------------------------------------------------------

/// Generated content for one matched tactic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TacticRecommendation {
    #[serde(flatten)]
    pub tactic: TacticMatch,
    pub description: Generated<String>,
    pub estimate: Generated<Estimate>,
}

/// A complete brand plan for one selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrandPlan {
    pub id: PlanId,
    pub generated_at: DateTime<Utc>,
    pub selection: Selection,
    /// One entry per matched tactic, in match order.
    pub tactics: Vec<TacticRecommendation>,
    /// `None` when there were no tactics to plan around.
    pub messaging: Option<Generated<Vec<String>>>,
    pub concept: Option<Generated<CampaignConcept>>,
}

impl BrandPlan {
    /// No tactics matched the selection.
    pub fn is_empty(&self) -> bool {
        self.tactics.is_empty()
    }

    /// Number of fields that fell back to the unavailable sentinel.
    pub fn unavailable_count(&self) -> usize {
        let per_tactic = self
            .tactics
            .iter()
            .map(|t| usize::from(!t.description.is_ready()) + usize::from(!t.estimate.is_ready()))
            .sum::<usize>();
        let messaging = self.messaging.as_ref().is_some_and(|m| !m.is_ready());
        let concept = self.concept.as_ref().is_some_and(|c| !c.is_ready());
        per_tactic + usize::from(messaging) + usize::from(concept)
    }
}

// ---------------------------------------------------------------------------
// Progress
// ---------------------------------------------------------------------------

/// Progress callback for plan generation.
pub trait PlanProgress: Send + Sync {
    /// Called before a tactic's description and estimate are requested.
    fn tactic_started(&self, tactic: &TacticMatch, current: usize, total: usize);
    /// Called before an aggregate request (messaging, concept).
    fn aggregate_started(&self, name: &str);
    /// Called once the plan is complete.
    fn done(&self, plan: &BrandPlan);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentPlanProgress;

impl PlanProgress for SilentPlanProgress {
    fn tactic_started(&self, _tactic: &TacticMatch, _current: usize, _total: usize) {}
    fn aggregate_started(&self, _name: &str) {}
    fn done(&self, _plan: &BrandPlan) {}
}

// ---------------------------------------------------------------------------
// Generator
// ---------------------------------------------------------------------------

/// Drives a [`TextGenerator`] through the prompts of a brand plan.
pub struct PlanGenerator<G> {
    generator: G,
    model: String,
    fallback_model: Option<String>,
    budgets: GenerationBudgets,
    retry: RetryPolicy,
}

impl<G: TextGenerator> PlanGenerator<G> {
    pub fn new(
        generator: G,
        llm: &LlmConfig,
        budgets: GenerationBudgets,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            generator,
            model: llm.model.clone(),
            fallback_model: llm.fallback_model.clone(),
            budgets,
            retry,
        }
    }

    pub fn from_config(generator: G, config: &AppConfig) -> Self {
        Self::new(
            generator,
            &config.llm,
            config.generation.clone(),
            RetryPolicy::from(&config.retry),
        )
    }

    /// Retries go to the fallback model when one is configured.
    fn model_for(&self, attempt: u32) -> &str {
        match (&self.fallback_model, attempt) {
            (Some(fallback), n) if n > 1 => fallback,
            _ => &self.model,
        }
    }

    async fn call(&self, kind: &'static str, prompt: String, budget: CallBudget) -> Generated<String> {
        let result = call_with_retry(self.retry, |attempt| {
            let request = GenerationRequest::new(self.model_for(attempt), prompt.as_str(), budget);
            async move {
                debug!(kind, attempt, model = %request.model, "generation request");
                self.generator.generate(&request).await
            }
        })
        .await;

        match result {
            Ok(text) => Generated::ready(text),
            Err(failure) => {
                let err = PlannerError::GenerationUnavailable(format!("{kind}: {failure}"));
                warn!(error = %err, "using unavailable sentinel");
                err.into()
            }
        }
    }

    /// 3-4 sentence description of one tactic.
    pub async fn describe(&self, tactic: &TacticMatch, ctx: &PromptContext) -> Generated<String> {
        self.call(
            "description",
            prompts::description(tactic, ctx),
            self.budgets.description,
        )
        .await
        .map(|text| parse::description(&text))
    }

    /// Budget and timing for one tactic.
    pub async fn estimate(&self, tactic: &TacticMatch) -> Generated<Estimate> {
        self.call("estimate", prompts::estimate(tactic), self.budgets.estimate)
            .await
            .map(|text| parse::estimate(&text))
    }

    pub async fn messaging(&self, ctx: &PromptContext) -> Generated<Vec<String>> {
        self.call("messaging", prompts::messaging(ctx), self.budgets.messaging)
            .await
            .map(|text| parse::messaging(&text))
    }

    pub async fn campaign_concept(&self, ctx: &PromptContext) -> Generated<CampaignConcept> {
        self.call(
            "concept",
            prompts::campaign_concept(ctx),
            self.budgets.concept,
        )
        .await
        .map(|text| parse::campaign_concept(&text))
    }

    /// Free-form competitive insights for `drug`, informed by any competitor
    /// names already found.
    #[instrument(skip(self, competitors), fields(known = competitors.len()))]
    pub async fn competitive_insights(&self, drug: &str, competitors: &[String]) -> Generated<String> {
        self.call(
            "competitive_insights",
            prompts::competitive_insights(drug, competitors),
            self.budgets.competitive_insights,
        )
        .await
        .map(|text| parse::competitive_insights(&text))
    }

    /// Generate the full plan for `matches`, one tactic at a time.
    ///
    /// With no matches the plan is empty and no aggregate requests are made.
    #[instrument(skip_all, fields(stage = %selection.stage, tactics = matches.len()))]
    pub async fn build_plan(
        &self,
        selection: &Selection,
        matches: Vec<TacticMatch>,
        progress: &dyn PlanProgress,
    ) -> BrandPlan {
        let ctx = PromptContext::from_selection(selection);
        let total = matches.len();
        let mut tactics = Vec::with_capacity(total);

        for (i, tactic) in matches.into_iter().enumerate() {
            progress.tactic_started(&tactic, i + 1, total);
            let description = self.describe(&tactic, &ctx).await;
            let estimate = self.estimate(&tactic).await;
            tactics.push(TacticRecommendation {
                tactic,
                description,
                estimate,
            });
        }

        let (messaging, concept) = if tactics.is_empty() {
            info!("no tactics matched, skipping messaging and concept");
            (None, None)
        } else {
            progress.aggregate_started("messaging");
            let messaging = self.messaging(&ctx).await;
            progress.aggregate_started("campaign concept");
            let concept = self.campaign_concept(&ctx).await;
            (Some(messaging), Some(concept))
        };

        let plan = BrandPlan {
            id: PlanId::new(),
            generated_at: Utc::now(),
            selection: selection.clone(),
            tactics,
            messaging,
            concept,
        };

        info!(
            plan_id = %plan.id,
            tactics = plan.tactics.len(),
            unavailable = plan.unavailable_count(),
            "plan generated"
        );
        progress.done(&plan);
        plan
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::future::Future;
    use std::sync::Mutex;
    use std::time::Duration;

    use brandplanner_shared::{ImperativeId, ImperativeOption};

    use crate::llm::GenerationFailure;

    type Reply = std::result::Result<String, GenerationFailure>;

    /// Replies in script order and records every request.
    #[derive(Default)]
    struct ScriptedGenerator {
        script: Mutex<VecDeque<Reply>>,
        requests: Mutex<Vec<GenerationRequest>>,
    }

    impl ScriptedGenerator {
        fn new(script: impl IntoIterator<Item = Reply>) -> Self {
            Self {
                script: Mutex::new(script.into_iter().collect()),
                requests: Mutex::default(),
            }
        }

        fn requests(&self) -> Vec<GenerationRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    impl TextGenerator for ScriptedGenerator {
        fn generate(&self, request: &GenerationRequest) -> impl Future<Output = Reply> + Send {
            self.requests.lock().unwrap().push(request.clone());
            let reply = self
                .script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(GenerationFailure::Malformed("script exhausted".into())));
            std::future::ready(reply)
        }
    }

    impl TextGenerator for &ScriptedGenerator {
        fn generate(&self, request: &GenerationRequest) -> impl Future<Output = Reply> + Send {
            (**self).generate(request)
        }
    }

    fn ok(text: &str) -> Reply {
        Ok(text.to_string())
    }

    fn rate_limited() -> Reply {
        Err(GenerationFailure::RateLimited {
            retry_after: Some(Duration::from_secs(30)),
        })
    }

    fn planner<'a>(
        generator: &'a ScriptedGenerator,
        fallback: Option<&str>,
    ) -> PlanGenerator<&'a ScriptedGenerator> {
        let llm = LlmConfig {
            model: "primary".into(),
            fallback_model: fallback.map(String::from),
            ..LlmConfig::default()
        };
        PlanGenerator::new(
            generator,
            &llm,
            GenerationBudgets::default(),
            RetryPolicy::new(2, Duration::ZERO),
        )
    }

    fn selection() -> Selection {
        Selection {
            stage: "Launch".into(),
            imperatives: vec![ImperativeOption {
                id: ImperativeId(2),
                name: "Awareness".into(),
            }],
            differentiator_category: Some("Efficacy".into()),
            differentiators: vec!["Faster onset".into()],
            tones: vec!["Empathetic".into()],
            objectives: vec!["Engagement".into()],
        }
    }

    fn webinar() -> TacticMatch {
        TacticMatch::new("Awareness", "Engagement", "Host a webinar")
    }

    #[tokio::test]
    async fn rate_limit_once_then_success_returns_result() {
        let generator = ScriptedGenerator::new([rate_limited(), ok(" A webinar series. ")]);
        let plan = planner(&generator, Some("fallback"));
        let ctx = PromptContext::from_selection(&selection());

        let description = plan.describe(&webinar(), &ctx).await;
        assert_eq!(description, Generated::ready("A webinar series.".to_string()));

        let models: Vec<_> = generator.requests().into_iter().map(|r| r.model).collect();
        assert_eq!(models, vec!["primary", "fallback"]);
    }

    #[tokio::test]
    async fn retry_reuses_model_without_fallback() {
        let generator = ScriptedGenerator::new([rate_limited(), ok("Timeline: 3 months, Cost: $50K")]);
        let plan = planner(&generator, None);

        let estimate = plan.estimate(&webinar()).await;
        let estimate = estimate.as_ready().unwrap();
        assert_eq!(estimate.timeline, "3 months");
        assert_eq!(estimate.cost, "$50K");

        let models: Vec<_> = generator.requests().into_iter().map(|r| r.model).collect();
        assert_eq!(models, vec!["primary", "primary"]);
    }

    #[tokio::test]
    async fn two_failures_yield_sentinel() {
        let generator = ScriptedGenerator::new([rate_limited(), rate_limited(), ok("unused")]);
        let plan = planner(&generator, None);

        let concept = plan.campaign_concept(&PromptContext::from_selection(&selection())).await;
        assert!(!concept.is_ready());
        assert_eq!(generator.requests().len(), 2);
    }

    #[tokio::test]
    async fn non_rate_limit_failure_is_not_retried() {
        let generator = ScriptedGenerator::new([
            Err(GenerationFailure::Transport("connection reset".into())),
            ok("unused"),
        ]);
        let plan = planner(&generator, None);

        let insights = plan.competitive_insights("Ozempic", &[]).await;
        assert_eq!(
            insights,
            Generated::unavailable(
                "generation unavailable: competitive_insights: transport error: connection reset"
            )
        );
        assert_eq!(generator.requests().len(), 1);
    }

    #[tokio::test]
    async fn one_failing_tactic_does_not_stop_the_rest() {
        let generator = ScriptedGenerator::new([
            Err(GenerationFailure::Api {
                status: 500,
                message: "boom".into(),
            }),
            ok("Timeline: 2 months, Cost: $10K"),
            ok("Samples at every visit."),
            ok("Timeline: 1 month, Cost: $5K"),
            ok("Idea one\nIdea two"),
            ok("Feel the difference\nFaster onset, fewer worries"),
        ]);
        let plan = planner(&generator, None);
        let matches = vec![webinar(), TacticMatch::new("Awareness", "Trial", "Samples")];

        let result = plan.build_plan(&selection(), matches, &SilentPlanProgress).await;

        assert_eq!(result.tactics.len(), 2);
        assert!(!result.tactics[0].description.is_ready());
        assert!(result.tactics[0].estimate.is_ready());
        assert_eq!(
            result.tactics[1].description.as_ready().map(String::as_str),
            Some("Samples at every visit.")
        );
        assert_eq!(
            result.messaging.as_ref().and_then(|m| m.as_ready()).cloned(),
            Some(vec!["Idea one".to_string(), "Idea two".to_string()])
        );
        assert_eq!(
            result.concept.as_ref().and_then(|c| c.as_ready()).map(|c| c.headline.as_str()),
            Some("Feel the difference")
        );
        assert_eq!(result.unavailable_count(), 1);
    }

    #[tokio::test]
    async fn empty_matches_make_no_calls() {
        let generator = ScriptedGenerator::default();
        let plan = planner(&generator, None);

        let result = plan.build_plan(&selection(), Vec::new(), &SilentPlanProgress).await;
        assert!(result.is_empty());
        assert!(result.messaging.is_none());
        assert!(result.concept.is_none());
        assert!(generator.requests().is_empty());
    }

    #[tokio::test]
    async fn requests_use_per_call_budgets() {
        let generator = ScriptedGenerator::new([ok("d"), ok("e"), ok("m"), ok("c")]);
        let plan = planner(&generator, None);

        plan.build_plan(&selection(), vec![webinar()], &SilentPlanProgress)
            .await;

        let budgets: Vec<_> = generator.requests().iter().map(|r| r.max_tokens).collect();
        assert_eq!(budgets, vec![300, 150, 300, 300]);
    }

    #[test]
    fn plan_serializes_sentinels_with_status() {
        let plan = BrandPlan {
            id: PlanId::new(),
            generated_at: Utc::now(),
            selection: selection(),
            tactics: vec![TacticRecommendation {
                tactic: webinar(),
                description: Generated::unavailable("rate limited"),
                estimate: Generated::ready(parse::estimate("Timeline: 1 month, Cost: $5K")),
            }],
            messaging: None,
            concept: None,
        };
        let json = serde_json::to_value(&plan).unwrap();
        assert_eq!(json["tactics"][0]["tactic"], "Host a webinar");
        assert_eq!(json["tactics"][0]["description"]["status"], "unavailable");
        assert_eq!(json["tactics"][0]["estimate"]["value"]["cost"], "$5K");
    }
}
