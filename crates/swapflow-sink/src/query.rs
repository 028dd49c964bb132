//! Range-query building and response decoding.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;
use swapflow_core::error::SinkError;
use swapflow_core::swap::round_amount;
use swapflow_core::token::Token;
use swapflow_core::window::LookbackWindow;

/// Builds a rollup expression such as `sum_over_time(amount{token="BTC"}[5m])`.
#[must_use]
pub fn rollup(function: &str, metric: &str, token: Token, window: LookbackWindow) -> String {
    format!(r#"{function}({metric}{{token="{token}"}}[{window}])"#)
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    status: String,
    #[serde(default)]
    data: Option<QueryData>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct QueryData {
    #[serde(default)]
    result: Vec<Series>,
}

#[derive(Debug, Deserialize)]
struct Series {
    #[serde(default)]
    values: Vec<(Value, Value)>,
}

/// Decodes a `query_range` response body into the last sample value of the
/// first series.
///
/// An absent series or an absent sample is an empty string, not an error.
///
/// # Errors
///
/// Returns `SinkError::Rejected` when the sink reports a non-success status
/// and `SinkError::MalformedResponse` when the body does not match the query
/// schema.
pub fn decode_response(http_status: u16, body: &[u8]) -> Result<String, SinkError> {
    let response: QueryResponse = match serde_json::from_slice(body) {
        Ok(response) => response,
        Err(e) if (200..300).contains(&http_status) => {
            return Err(SinkError::MalformedResponse(format!("json: {e}")));
        }
        Err(_) => {
            return Err(SinkError::Rejected {
                status: http_status,
                message: String::from_utf8_lossy(body).into_owned(),
            });
        }
    };

    if response.status != "success" {
        return Err(SinkError::Rejected {
            status: http_status,
            message: response
                .error
                .unwrap_or_else(|| format!("status {}", response.status)),
        });
    }

    let Some(series) = response.data.and_then(|d| d.result.into_iter().next()) else {
        return Ok(String::new());
    };
    let Some((_, raw)) = series.values.last() else {
        return Ok(String::new());
    };
    let raw = raw
        .as_str()
        .ok_or_else(|| SinkError::MalformedResponse(format!("schema mismatch: {raw}")))?;

    normalize_value(raw)
}

/// Rounds a sample value to six fractional digits and strips trailing zeros,
/// undoing the float noise the sink's storage introduces into sums.
///
/// # Errors
///
/// Returns `SinkError::MalformedResponse` if `raw` is not a decimal number.
pub fn normalize_value(raw: &str) -> Result<String, SinkError> {
    let value = Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .map_err(|e| SinkError::MalformedResponse(format!("sample {raw:?}: {e}")))?;
    Ok(round_amount(value).normalize().to_string())
}
