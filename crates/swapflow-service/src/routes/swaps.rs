//! Swap ingestion: appends new swaps to the outbox.

use std::str::FromStr;

use axum::extract::State;
use axum::http::StatusCode;
use axum::{Json, Router, routing::post};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use swapflow_core::error::SwapError;
use swapflow_core::swap::{Swap, SwapData, SwapId};
use swapflow_core::token::Token;
use tracing::{info, instrument};

use crate::error::ApiError;
use crate::state::AppState;

/// Request body for POST /api/v1/swaps.
///
/// Amounts may be JSON strings or numbers; strings keep every digit.
#[derive(Debug, Deserialize)]
pub struct CreateSwapRequest {
    pub who: String,
    pub token: String,
    pub amount: Value,
    pub usd: Value,
    pub side: bool,
}

/// Response body for a created swap.
#[derive(Debug, Serialize)]
pub struct CreateSwapResponse {
    pub id: SwapId,
}

fn parse_amount(field: &str, value: &Value) -> Result<Decimal, SwapError> {
    let parsed = match value {
        Value::String(s) => Decimal::from_str(s).or_else(|_| Decimal::from_scientific(s)),
        Value::Number(n) => {
            let s = n.to_string();
            Decimal::from_str(&s).or_else(|_| Decimal::from_scientific(&s))
        }
        other => return Err(SwapError::InvalidAmount(format!("{field}: {other}"))),
    };
    parsed.map_err(|e| SwapError::InvalidAmount(format!("{field}: {e}")))
}

/// POST /api/v1/swaps
#[instrument(skip(state, request), fields(token = %request.token))]
async fn create_swap(
    State(state): State<AppState>,
    Json(request): Json<CreateSwapRequest>,
) -> Result<(StatusCode, Json<CreateSwapResponse>), ApiError> {
    let swap = Swap::new(SwapData {
        token: Token::from_str(&request.token)?,
        amount: parse_amount("amount", &request.amount)?,
        usd: parse_amount("usd", &request.usd)?,
        who: request.who,
        side: request.side,
    })?;

    state.store.append(&swap).await?;

    info!(swap_id = %swap.id(), "swap appended to outbox");

    Ok((StatusCode::CREATED, Json(CreateSwapResponse { id: swap.id() })))
}

/// Returns the swap ingestion router.
pub fn router() -> Router<AppState> {
    Router::new().route("/", post(create_swap))
}
