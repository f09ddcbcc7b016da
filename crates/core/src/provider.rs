//! Registered backend providers.

use serde::{Deserialize, Serialize};

/// A hosted model endpoint the orchestrator can submit jobs to.
///
/// Three image-generation models and one chat-completion model, all
/// served behind the same predictions-style REST contract. The wire
/// payload shape differs per provider; the lifecycle does not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderId {
    /// Stable Diffusion XL text-to-image.
    Sdxl,
    /// FLUX text-to-image.
    Flux,
    /// Playground v2.5 text-to-image.
    Playground,
    /// Llama chat completion.
    LlamaChat,
}

impl ProviderId {
    /// All registered providers.
    pub const ALL: [ProviderId; 4] = [
        ProviderId::Sdxl,
        ProviderId::Flux,
        ProviderId::Playground,
        ProviderId::LlamaChat,
    ];

    /// Kebab-case name, matching the serde representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sdxl => "sdxl",
            Self::Flux => "flux",
            Self::Playground => "playground",
            Self::LlamaChat => "llama-chat",
        }
    }

    /// Parse a kebab-case provider name.
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.as_str() == s)
    }

    /// Environment variable holding this provider's API token.
    ///
    /// All four models are hosted on the same service, so they share a
    /// single account token.
    pub fn credential_env(self) -> &'static str {
        "REPLICATE_API_TOKEN"
    }

    /// True for the chat-completion provider, false for image models.
    pub fn is_chat(self) -> bool {
        matches!(self, Self::LlamaChat)
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_round_trips_all_providers() {
        for provider in ProviderId::ALL {
            assert_eq!(ProviderId::parse(provider.as_str()), Some(provider));
        }
    }

    #[test]
    fn parse_rejects_unknown_name() {
        assert_eq!(ProviderId::parse("dall-e"), None);
    }

    #[test]
    fn serde_uses_kebab_case() {
        let json = serde_json::to_string(&ProviderId::LlamaChat).unwrap();
        assert_eq!(json, "\"llama-chat\"");
    }

    #[test]
    fn only_llama_is_chat() {
        assert!(ProviderId::LlamaChat.is_chat());
        assert!(!ProviderId::Sdxl.is_chat());
        assert!(!ProviderId::Flux.is_chat());
        assert!(!ProviderId::Playground.is_chat());
    }
}
