//! Adapter for the hosted chat-completion model.
//!
//! The chat model runs behind the same predictions contract as the
//! image models; its `output` is an array of text fragments that are
//! joined into a single completion string.

use lumen_core::{ProviderId, RemoteJobState};

use crate::adapter::{AdapterError, ProviderAdapter};
use crate::wire::{self, OutputShape, PredictionRequest};

/// Llama chat completion.
pub struct LlamaChatAdapter;

const LLAMA_VERSION: &str = "02e509c789964a7ea8736978a43525956ef40397be9033abf9fd2badfe68c9e3";

/// Defaults applied when the caller does not set them.
const DEFAULT_MAX_NEW_TOKENS: u64 = 512;
const DEFAULT_TEMPERATURE: f64 = 0.7;

impl ProviderAdapter for LlamaChatAdapter {
    fn provider(&self) -> ProviderId {
        ProviderId::LlamaChat
    }

    fn submit_url(&self) -> String {
        format!("{}/predictions", wire::API_BASE)
    }

    fn build_submit_body(&self, params: &serde_json::Value) -> Result<Vec<u8>, AdapterError> {
        let obj = params.as_object().ok_or_else(|| {
            AdapterError::InvalidParameters("parameters must be an object".into())
        })?;

        match obj.get("prompt") {
            Some(serde_json::Value::String(p)) if !p.trim().is_empty() => {}
            _ => {
                return Err(AdapterError::InvalidParameters(
                    "prompt must be a non-empty string".into(),
                ))
            }
        }

        let mut input = obj.clone();
        input
            .entry("max_new_tokens")
            .or_insert_with(|| DEFAULT_MAX_NEW_TOKENS.into());
        input
            .entry("temperature")
            .or_insert_with(|| serde_json::json!(DEFAULT_TEMPERATURE));

        let input = serde_json::Value::Object(input);
        let request = PredictionRequest {
            version: LLAMA_VERSION,
            input: &input,
        };
        Ok(serde_json::to_vec(&request)?)
    }

    fn parse_submit_response(&self, bytes: &[u8]) -> Result<RemoteJobState, AdapterError> {
        wire::parse_response(bytes, OutputShape::JoinedText)
    }

    fn parse_poll_response(&self, bytes: &[u8]) -> Result<RemoteJobState, AdapterError> {
        wire::parse_response(bytes, OutputShape::JoinedText)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_applies_defaults() {
        let body = LlamaChatAdapter
            .build_submit_body(&serde_json::json!({"prompt": "hello"}))
            .unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["version"], LLAMA_VERSION);
        assert_eq!(value["input"]["prompt"], "hello");
        assert_eq!(value["input"]["max_new_tokens"], 512);
        assert_eq!(value["input"]["temperature"], 0.7);
    }

    #[test]
    fn caller_overrides_defaults() {
        let body = LlamaChatAdapter
            .build_submit_body(&serde_json::json!({"prompt": "hi", "max_new_tokens": 64}))
            .unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["input"]["max_new_tokens"], 64);
    }

    #[test]
    fn missing_prompt_is_rejected() {
        let err = LlamaChatAdapter
            .build_submit_body(&serde_json::json!({"temperature": 0.2}))
            .unwrap_err();
        assert!(matches!(err, AdapterError::InvalidParameters(_)));
    }

    #[test]
    fn poll_response_joins_token_stream() {
        let body = r#"{
            "id": "pred-chat",
            "status": "succeeded",
            "urls": {"get": "https://x/get", "cancel": "https://x/cancel"},
            "output": ["The", " answer", " is", " 42."]
        }"#;
        let state = LlamaChatAdapter
            .parse_poll_response(body.as_bytes())
            .unwrap();
        assert_eq!(state.outputs, vec!["The answer is 42."]);
    }
}
