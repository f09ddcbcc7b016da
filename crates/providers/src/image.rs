//! Adapters for the hosted image-generation models.

use lumen_core::{ProviderId, RemoteJobState};

use crate::adapter::{AdapterError, ProviderAdapter};
use crate::wire::{self, OutputShape, PredictionRequest};

/// Stable Diffusion XL.
pub struct SdxlAdapter;

/// FLUX.
pub struct FluxAdapter;

/// Playground v2.5.
pub struct PlaygroundAdapter;

const SDXL_VERSION: &str = "39ed52f2a78e934b3ba6e2a89f5b1c712de7dfea535525255b1aa35c5565e08b";
const FLUX_VERSION: &str = "5c7d5dc6dd8bf75c1acaa8565735e7986bc5b66206b55cca93cb72c9bf15ccaa";
const PLAYGROUND_VERSION: &str = "a45f82a1382bed5c7aeb861dac7c7d191b0fdf74d8d57c4a0e6ed7d4d0bf7d24";

/// Validate the shared image-model parameter contract.
///
/// Parameters must be an object with a non-empty string `prompt`; the
/// rest of the payload passes through to the model untouched.
fn require_prompt(params: &serde_json::Value) -> Result<(), AdapterError> {
    let obj = params
        .as_object()
        .ok_or_else(|| AdapterError::InvalidParameters("parameters must be an object".into()))?;
    match obj.get("prompt") {
        Some(serde_json::Value::String(p)) if !p.trim().is_empty() => Ok(()),
        Some(_) => Err(AdapterError::InvalidParameters(
            "prompt must be a non-empty string".into(),
        )),
        None => Err(AdapterError::InvalidParameters("prompt is required".into())),
    }
}

fn build_body(version: &str, params: &serde_json::Value) -> Result<Vec<u8>, AdapterError> {
    require_prompt(params)?;
    let request = PredictionRequest {
        version,
        input: params,
    };
    Ok(serde_json::to_vec(&request)?)
}

macro_rules! image_adapter {
    ($adapter:ty, $provider:expr, $version:expr) => {
        impl ProviderAdapter for $adapter {
            fn provider(&self) -> ProviderId {
                $provider
            }

            fn submit_url(&self) -> String {
                format!("{}/predictions", wire::API_BASE)
            }

            fn build_submit_body(
                &self,
                params: &serde_json::Value,
            ) -> Result<Vec<u8>, AdapterError> {
                build_body($version, params)
            }

            fn parse_submit_response(&self, bytes: &[u8]) -> Result<RemoteJobState, AdapterError> {
                wire::parse_response(bytes, OutputShape::UriList)
            }

            fn parse_poll_response(&self, bytes: &[u8]) -> Result<RemoteJobState, AdapterError> {
                wire::parse_response(bytes, OutputShape::UriList)
            }
        }
    };
}

image_adapter!(SdxlAdapter, ProviderId::Sdxl, SDXL_VERSION);
image_adapter!(FluxAdapter, ProviderId::Flux, FLUX_VERSION);
image_adapter!(PlaygroundAdapter, ProviderId::Playground, PLAYGROUND_VERSION);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_embeds_version_and_input() {
        let params = serde_json::json!({"prompt": "a red fox", "num_outputs": 2});
        let body = SdxlAdapter.build_submit_body(&params).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["version"], SDXL_VERSION);
        assert_eq!(value["input"]["prompt"], "a red fox");
        assert_eq!(value["input"]["num_outputs"], 2);
    }

    #[test]
    fn missing_prompt_is_rejected() {
        let err = FluxAdapter
            .build_submit_body(&serde_json::json!({"steps": 30}))
            .unwrap_err();
        assert!(matches!(err, AdapterError::InvalidParameters(_)));
    }

    #[test]
    fn blank_prompt_is_rejected() {
        let err = PlaygroundAdapter
            .build_submit_body(&serde_json::json!({"prompt": "   "}))
            .unwrap_err();
        assert!(matches!(err, AdapterError::InvalidParameters(_)));
    }

    #[test]
    fn non_object_parameters_are_rejected() {
        let err = SdxlAdapter
            .build_submit_body(&serde_json::json!("just a string"))
            .unwrap_err();
        assert!(matches!(err, AdapterError::InvalidParameters(_)));
    }

    #[test]
    fn each_model_pins_its_own_version() {
        let params = serde_json::json!({"prompt": "p"});
        for (body, version) in [
            (SdxlAdapter.build_submit_body(&params).unwrap(), SDXL_VERSION),
            (FluxAdapter.build_submit_body(&params).unwrap(), FLUX_VERSION),
            (
                PlaygroundAdapter.build_submit_body(&params).unwrap(),
                PLAYGROUND_VERSION,
            ),
        ] {
            let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
            assert_eq!(value["version"], version);
        }
    }
}
