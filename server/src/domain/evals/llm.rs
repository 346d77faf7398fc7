//! LLM-as-judge evaluators
//!
//! Relevance, coherence, and helpfulness delegate scoring to a model
//! call with a fixed rubric and expect a JSON `{score, reasoning}`
//! answer. Scores are clamped into [0, 1]; unparseable judge output
//! falls back to 0.5 with an explanatory reasoning string, and a failed
//! call scores 0 rather than erroring.

use std::sync::Arc;

use futures::StreamExt;
use serde::Deserialize;
use serde_json::json;

use super::{EvalError, EvaluationRequest, EvaluationResult, Evaluator};
use crate::core::constants::EVAL_FALLBACK_SCORE;
use crate::domain::providers::{
    GenerationClient, GenerationParams, GenerationRequest, ProviderResponse,
};

/// Judge temperature: scoring should be near-deterministic
const JUDGE_TEMPERATURE: f64 = 0.1;

/// Output budget for the judge's JSON answer
const JUDGE_MAX_TOKENS: i64 = 300;

pub struct LlmJudgeEvaluator {
    id: &'static str,
    rubric: &'static str,
    client: Arc<dyn GenerationClient>,
    model: String,
}

impl LlmJudgeEvaluator {
    pub fn relevance(client: Arc<dyn GenerationClient>, model: &str) -> Self {
        Self {
            id: "relevance",
            rubric: "Rate how relevant the response is to the prompt. A relevant response \
                     addresses what was actually asked without drifting to other topics.",
            client,
            model: model.to_string(),
        }
    }

    pub fn coherence(client: Arc<dyn GenerationClient>, model: &str) -> Self {
        Self {
            id: "coherence",
            rubric: "Rate how coherent the response is. A coherent response is logically \
                     organized, internally consistent, and readable from start to finish.",
            client,
            model: model.to_string(),
        }
    }

    pub fn helpfulness(client: Arc<dyn GenerationClient>, model: &str) -> Self {
        Self {
            id: "helpfulness",
            rubric: "Rate how helpful the response is. A helpful response gives the user \
                     actionable, complete information for their request.",
            client,
            model: model.to_string(),
        }
    }

    fn judge_prompt(&self, request: &EvaluationRequest) -> String {
        let mut prompt = format!(
            "{rubric}\n\nReturn ONLY a JSON object: {{\"score\": <0.0-1.0>, \"reasoning\": \"<one sentence>\"}}\n\n\
             PROMPT:\n{prompt}\n\nRESPONSE:\n{response}\n",
            rubric = self.rubric,
            prompt = request.prompt,
            response = request.response,
        );
        if let Some(ref context) = request.context {
            prompt.push_str(&format!("\nCONTEXT:\n{}\n", context));
        }
        if let Some(ref expected) = request.expected_output {
            prompt.push_str(&format!("\nEXPECTED OUTPUT:\n{}\n", expected));
        }
        prompt
    }

    async fn call_judge(&self, request: &EvaluationRequest) -> Result<String, String> {
        let generation = GenerationRequest {
            prompt: self.judge_prompt(request),
            system_prompt: Some(
                "You are a strict evaluation judge. Answer with JSON only.".to_string(),
            ),
            model: self.model.clone(),
            params: GenerationParams {
                temperature: Some(JUDGE_TEMPERATURE),
                max_tokens: Some(JUDGE_MAX_TOKENS),
                ..GenerationParams::default()
            },
        };

        match self.client.generate(&generation).await {
            Ok(ProviderResponse::Complete { content, .. }) => Ok(content),
            Ok(ProviderResponse::Stream(mut stream)) => {
                let mut content = String::new();
                while let Some(chunk) = stream.next().await {
                    match chunk {
                        Ok(chunk) => content.push_str(&chunk.delta),
                        Err(e) => return Err(e.to_string()),
                    }
                }
                Ok(content)
            }
            Err(e) => Err(e.to_string()),
        }
    }
}

/// Parse the judge's answer, accepting a fenced block around the JSON
fn parse_judge_output(content: &str) -> Option<(f64, String)> {
    #[derive(Deserialize)]
    struct JudgeAnswer {
        score: f64,
        #[serde(default)]
        reasoning: String,
    }

    let trimmed = content.trim();
    let candidate = if trimmed.starts_with('{') {
        trimmed
    } else {
        // Take the first {...} region
        let start = trimmed.find('{')?;
        let end = trimmed.rfind('}')?;
        &trimmed[start..=end]
    };

    serde_json::from_str::<JudgeAnswer>(candidate)
        .ok()
        .map(|a| (a.score, a.reasoning))
}

#[async_trait::async_trait]
impl Evaluator for LlmJudgeEvaluator {
    fn id(&self) -> &str {
        self.id
    }

    async fn evaluate(&self, request: &EvaluationRequest) -> Result<EvaluationResult, EvalError> {
        let content = match self.call_judge(request).await {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!(evaluator = self.id, error = %e, "Judge call failed");
                return Ok(EvaluationResult::new(
                    0.0,
                    format!("Evaluation call failed: {}", e),
                    json!({"evaluator": self.id, "call_failed": true}),
                ));
            }
        };

        match parse_judge_output(&content) {
            Some((score, reasoning)) => Ok(EvaluationResult::new(
                score,
                reasoning,
                json!({"evaluator": self.id, "model": self.model}),
            )),
            None => Ok(EvaluationResult::new(
                EVAL_FALLBACK_SCORE,
                "Judge output was not valid JSON; defaulting to a neutral score",
                json!({"evaluator": self.id, "raw_output": content}),
            )),
        }
    }
}
