//! Predictions-API wire format shared by all registered providers.
//!
//! Submit is `POST /v1/predictions` with `{"version": ..., "input": {...}}`;
//! poll is `GET urls.get`; cancel is `POST urls.cancel`. Submit and poll
//! responses carry the same shape with an updated `status`.

use serde::{Deserialize, Serialize};

use lumen_core::{progress, JobStatus, RemoteJobState};

use crate::adapter::AdapterError;

/// Base URL of the hosting service.
pub const API_BASE: &str = "https://api.replicate.com/v1";

/// Submit request body.
#[derive(Debug, Serialize)]
pub struct PredictionRequest<'a> {
    /// Model version hash to run.
    pub version: &'a str,
    /// Provider-specific input object.
    pub input: &'a serde_json::Value,
}

/// Polling/cancellation URLs returned with every prediction.
#[derive(Debug, Clone, Deserialize)]
pub struct PredictionUrls {
    pub get: String,
    pub cancel: String,
}

/// Submit/poll response body. Both endpoints return this shape.
#[derive(Debug, Deserialize)]
pub struct PredictionResponse {
    /// Server-assigned prediction id.
    pub id: String,
    pub status: JobStatus,
    pub urls: PredictionUrls,
    /// Model output: absent while running, then a string or an array of
    /// strings depending on the model.
    #[serde(default)]
    pub output: serde_json::Value,
    /// Provider-supplied error message for failed predictions.
    #[serde(default)]
    pub error: Option<String>,
    /// Accumulated log text.
    #[serde(default)]
    pub logs: Option<String>,
}

/// How a model's `output` field should be folded into output strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputShape {
    /// A URI or an array of URIs, kept as separate entries.
    UriList,
    /// An array of text fragments, joined into one entry.
    JoinedText,
}

/// Decode a prediction response body and fold it into a job state.
pub fn parse_response(bytes: &[u8], shape: OutputShape) -> Result<RemoteJobState, AdapterError> {
    let response: PredictionResponse = serde_json::from_slice(bytes)?;
    let outputs = fold_output(&response.output, shape)?;

    // Progress comes from the log text; a finished job is 100% whatever
    // its logs last said.
    let progress_percent = if response.status == JobStatus::Succeeded {
        Some(100.0)
    } else {
        response
            .logs
            .as_deref()
            .and_then(progress::max_percent)
    };

    Ok(RemoteJobState {
        id: response.id,
        request_id: None,
        status: response.status,
        outputs,
        error_message: response.error,
        progress_percent,
        logs: response.logs,
        poll_uri: response.urls.get,
        cancel_uri: response.urls.cancel,
        last_updated: chrono::Utc::now(),
    })
}

/// Fold the dynamic `output` value into a list of strings.
///
/// Matches every JSON variant explicitly; shapes a model never produces
/// are decode errors, not silent drops.
fn fold_output(
    output: &serde_json::Value,
    shape: OutputShape,
) -> Result<Vec<String>, AdapterError> {
    use serde_json::Value;

    match output {
        // Not produced yet (or model has no output field while running).
        Value::Null => Ok(Vec::new()),

        Value::String(single) => Ok(vec![single.clone()]),

        Value::Array(items) => {
            let mut fragments = Vec::with_capacity(items.len());
            for item in items {
                match item {
                    Value::String(s) => fragments.push(s.clone()),
                    other => {
                        return Err(AdapterError::UnexpectedOutput(format!(
                            "array element is {}",
                            kind_name(other)
                        )))
                    }
                }
            }
            match shape {
                OutputShape::UriList => Ok(fragments),
                OutputShape::JoinedText => {
                    if fragments.is_empty() {
                        Ok(Vec::new())
                    } else {
                        Ok(vec![fragments.concat()])
                    }
                }
            }
        }

        Value::Bool(_) | Value::Number(_) | Value::Object(_) => Err(
            AdapterError::UnexpectedOutput(format!("top-level {}", kind_name(output))),
        ),
    }
}

fn kind_name(value: &serde_json::Value) -> &'static str {
    use serde_json::Value;
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
