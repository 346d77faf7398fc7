//! Evaluation framework
//!
//! Pluggable scorers that grade a prompt/response pair on a 0-1 scale.
//! A registry maps string ids to evaluator instances; the tracing layer
//! consumes scores through the `quality_score` field but has no
//! structural dependency on this module.
//!
//! - `llm` - LLM-as-judge scorers (relevance, coherence, helpfulness)
//! - `safety` - fully rule-based content safety scorer
//! - `composite` - weighted combination of other evaluators

mod composite;
mod llm;
mod safety;

pub use composite::CompositeEvaluator;
pub use llm::LlmJudgeEvaluator;
pub use safety::SafetyEvaluator;

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::providers::GenerationClient;
use crate::utils::time::now_millis;

/// Input to one evaluation
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EvaluationRequest {
    pub prompt: String,
    pub response: String,
    pub context: Option<String>,
    pub expected_output: Option<String>,
    pub evaluator_id: String,
    pub metadata: Option<serde_json::Value>,
}

/// Result of one evaluation; `score` is always within [0, 1]
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationResult {
    pub score: f64,
    pub reasoning: String,
    pub metadata: serde_json::Value,
    /// Epoch milliseconds
    pub timestamp: i64,
}

impl EvaluationResult {
    pub fn new(score: f64, reasoning: impl Into<String>, metadata: serde_json::Value) -> Self {
        Self {
            score: score.clamp(0.0, 1.0),
            reasoning: reasoning.into(),
            metadata,
            timestamp: now_millis(),
        }
    }
}

#[derive(Error, Debug)]
pub enum EvalError {
    #[error("Unknown evaluator: {0}")]
    UnknownEvaluator(String),
    #[error("Evaluation failed: {0}")]
    Failed(String),
}

/// Contract implemented by every evaluator
#[async_trait::async_trait]
pub trait Evaluator: Send + Sync {
    /// Registry id, e.g. "relevance"
    fn id(&self) -> &str;

    /// Grade one prompt/response pair
    async fn evaluate(&self, request: &EvaluationRequest) -> Result<EvaluationResult, EvalError>;

    /// Grade a batch concurrently. Default maps `evaluate` over the list.
    async fn batch_evaluate(
        &self,
        requests: &[EvaluationRequest],
    ) -> Vec<Result<EvaluationResult, EvalError>> {
        futures::future::join_all(requests.iter().map(|r| self.evaluate(r))).await
    }
}

/// Registry mapping string ids to evaluator instances
pub struct EvaluatorRegistry {
    evaluators: HashMap<String, Arc<dyn Evaluator>>,
}

impl EvaluatorRegistry {
    pub fn new() -> Self {
        Self {
            evaluators: HashMap::new(),
        }
    }

    /// Build the standard set: three LLM judges, the rule-based safety
    /// scorer, and a weighted composite registered as both `composite`
    /// and `quality`
    pub fn with_defaults(judge: Arc<dyn GenerationClient>, judge_model: &str) -> Self {
        let mut registry = Self::new();

        let relevance: Arc<dyn Evaluator> = Arc::new(LlmJudgeEvaluator::relevance(
            Arc::clone(&judge),
            judge_model,
        ));
        let coherence: Arc<dyn Evaluator> = Arc::new(LlmJudgeEvaluator::coherence(
            Arc::clone(&judge),
            judge_model,
        ));
        let helpfulness: Arc<dyn Evaluator> = Arc::new(LlmJudgeEvaluator::helpfulness(
            Arc::clone(&judge),
            judge_model,
        ));
        let safety: Arc<dyn Evaluator> = Arc::new(SafetyEvaluator::new());

        let composite = Arc::new(CompositeEvaluator::new(
            "composite",
            vec![
                (Arc::clone(&relevance), 0.3),
                (Arc::clone(&coherence), 0.2),
                (Arc::clone(&helpfulness), 0.3),
                (Arc::clone(&safety), 0.2),
            ],
        ));
        let quality = Arc::new(CompositeEvaluator::new(
            "quality",
            vec![
                (Arc::clone(&relevance), 0.3),
                (Arc::clone(&coherence), 0.2),
                (Arc::clone(&helpfulness), 0.3),
                (Arc::clone(&safety), 0.2),
            ],
        ));

        registry.register(relevance);
        registry.register(coherence);
        registry.register(helpfulness);
        registry.register(safety);
        registry.register(composite);
        registry.register(quality);
        registry
    }

    pub fn register(&mut self, evaluator: Arc<dyn Evaluator>) {
        self.evaluators
            .insert(evaluator.id().to_string(), evaluator);
    }

    pub fn get(&self, id: &str) -> Option<Arc<dyn Evaluator>> {
        self.evaluators.get(id).cloned()
    }

    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.evaluators.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Evaluate through the registry by id
    pub async fn evaluate(
        &self,
        request: &EvaluationRequest,
    ) -> Result<EvaluationResult, EvalError> {
        let evaluator = self
            .get(&request.evaluator_id)
            .ok_or_else(|| EvalError::UnknownEvaluator(request.evaluator_id.clone()))?;
        evaluator.evaluate(request).await
    }
}

impl Default for EvaluatorRegistry {
    fn default() -> Self {
        Self::new()
    }
}
