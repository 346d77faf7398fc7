//! Evaluation endpoints

use axum::Json;
use axum::extract::State;

use super::ApiState;
use crate::api::types::ApiError;
use crate::domain::evals::{EvalError, EvaluationRequest, EvaluationResult};

/// `GET /evals` - registered evaluator ids
pub async fn list_evaluators(State(state): State<ApiState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({ "evaluators": state.evals.ids() }))
}

/// `POST /evals/evaluate` - grade one prompt/response pair
pub async fn evaluate(
    State(state): State<ApiState>,
    Json(request): Json<EvaluationRequest>,
) -> Result<Json<EvaluationResult>, ApiError> {
    if request.response.is_empty() {
        return Err(ApiError::bad_request(
            "EMPTY_RESPONSE",
            "response must not be empty",
        ));
    }

    let result = state.evals.evaluate(&request).await.map_err(|e| match e {
        EvalError::UnknownEvaluator(id) => {
            ApiError::bad_request("UNKNOWN_EVALUATOR", format!("Unknown evaluator: {}", id))
        }
        EvalError::Failed(message) => ApiError::internal(message),
    })?;

    Ok(Json(result))
}
