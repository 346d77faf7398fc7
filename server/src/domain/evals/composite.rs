//! Weighted composite evaluator
//!
//! Runs a configurable set of sub-evaluators and combines their scores
//! with weights normalized to sum to 1. Individual sub-evaluator failure
//! is tolerated by renormalizing over the evaluators that succeeded; the
//! composite scores 0 only when every sub-evaluator fails.

use std::sync::Arc;

use serde_json::json;

use super::{EvalError, EvaluationRequest, EvaluationResult, Evaluator};

pub struct CompositeEvaluator {
    id: String,
    components: Vec<(Arc<dyn Evaluator>, f64)>,
}

impl CompositeEvaluator {
    /// Weights are normalized at construction, so any positive values work
    pub fn new(id: &str, components: Vec<(Arc<dyn Evaluator>, f64)>) -> Self {
        let total: f64 = components.iter().map(|(_, w)| w.max(0.0)).sum();
        let components = if total > 0.0 {
            components
                .into_iter()
                .map(|(e, w)| (e, w.max(0.0) / total))
                .collect()
        } else {
            components
        };

        Self {
            id: id.to_string(),
            components,
        }
    }
}

#[async_trait::async_trait]
impl Evaluator for CompositeEvaluator {
    fn id(&self) -> &str {
        &self.id
    }

    async fn evaluate(&self, request: &EvaluationRequest) -> Result<EvaluationResult, EvalError> {
        let results = futures::future::join_all(
            self.components
                .iter()
                .map(|(evaluator, _)| evaluator.evaluate(request)),
        )
        .await;

        // Keep the components that succeeded, with their original weights
        let mut succeeded: Vec<(&str, f64, EvaluationResult)> = Vec::new();
        for ((evaluator, weight), result) in self.components.iter().zip(results) {
            match result {
                Ok(result) => succeeded.push((evaluator.id(), *weight, result)),
                Err(e) => {
                    tracing::warn!(
                        composite = %self.id,
                        component = evaluator.id(),
                        error = %e,
                        "Sub-evaluator failed, renormalizing weights"
                    );
                }
            }
        }

        if succeeded.is_empty() {
            return Ok(EvaluationResult::new(
                0.0,
                "All sub-evaluators failed",
                json!({"evaluator": self.id, "components": []}),
            ));
        }

        // Renormalize over the survivors
        let weight_sum: f64 = succeeded.iter().map(|(_, w, _)| w).sum();
        let score: f64 = succeeded
            .iter()
            .map(|(_, weight, result)| result.score * weight / weight_sum)
            .sum();

        let breakdown: Vec<serde_json::Value> = succeeded
            .iter()
            .map(|(id, weight, result)| {
                json!({
                    "evaluator": id,
                    "weight": weight / weight_sum,
                    "score": result.score,
                    "reasoning": result.reasoning,
                })
            })
            .collect();

        let reasoning = succeeded
            .iter()
            .map(|(id, _, result)| format!("{}: {:.2}", id, result.score))
            .collect::<Vec<_>>()
            .join(", ");

        Ok(EvaluationResult::new(
            score,
            format!("Weighted composite of {}", reasoning),
            json!({"evaluator": self.id, "components": breakdown}),
        ))
    }
}
