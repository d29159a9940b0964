//! Host preference mapping.
//!
//! The host stores onboarding choices (provider, API key, agent name, owner
//! PIN, ...) in its own preference store. [`HostPreferences::to_config`]
//! turns them into the [`ConfigMap`] handed to the bootstrap, using the
//! variable names the agent reads.

use crate::config::{ConfigMap, ConfigValue, keys};

/// Variable carrying the selected LLM provider.
pub const LLM_PROVIDER: &str = "FAMILIAR_LLM_PROVIDER";
/// Local Ollama endpoint.
pub const OLLAMA_URL: &str = "OLLAMA_URL";
/// Display name of the agent.
pub const AGENT_NAME: &str = "FAMILIAR_AGENT_NAME";
/// Model identifier.
pub const MODEL: &str = "FAMILIAR_MODEL";
/// Persona preset.
pub const PERSONA: &str = "FAMILIAR_PERSONA";
/// Daily briefing toggle.
pub const BRIEFING_ENABLED: &str = "FAMILIAR_BRIEFING_ENABLED";

/// LLM provider chosen during setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    /// Anthropic API
    Anthropic,
    /// OpenAI API
    OpenAi,
    /// Google Gemini API
    Gemini,
    /// Local Ollama server (no API key)
    Ollama,
}

impl Provider {
    /// Parse the identifier stored by the host.
    pub fn from_id(id: &str) -> Option<Self> {
        match id {
            "anthropic" => Some(Self::Anthropic),
            "openai" => Some(Self::OpenAi),
            "gemini" => Some(Self::Gemini),
            "ollama" => Some(Self::Ollama),
            _ => None,
        }
    }

    /// Identifier stored by the host and exported to the agent.
    pub fn id(self) -> &'static str {
        match self {
            Self::Anthropic => "anthropic",
            Self::OpenAi => "openai",
            Self::Gemini => "gemini",
            Self::Ollama => "ollama",
        }
    }

    /// Variable the agent reads the API key from, if the provider takes one.
    pub fn api_key_var(self) -> Option<&'static str> {
        match self {
            Self::Anthropic => Some("ANTHROPIC_API_KEY"),
            Self::OpenAi => Some("OPENAI_API_KEY"),
            Self::Gemini => Some("GEMINI_API_KEY"),
            Self::Ollama => None,
        }
    }
}

/// Preferences as persisted by the host. Unset fields are omitted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostPreferences {
    /// Provider identifier (`anthropic`, `openai`, `gemini`, `ollama`)
    pub provider: Option<String>,
    /// API key for the provider
    pub api_key: Option<String>,
    /// Ollama endpoint
    pub ollama_url: Option<String>,
    /// Agent display name
    pub agent_name: Option<String>,
    /// Model identifier
    pub model_name: Option<String>,
    /// Persona preset
    pub persona: Option<String>,
    /// Owner PIN as typed during setup
    pub owner_pin: Option<String>,
    /// Daily briefing toggle
    pub briefing_enabled: Option<bool>,
}

impl HostPreferences {
    /// Build the bootstrap configuration.
    ///
    /// The API key is exported under the provider-specific name and dropped
    /// when the provider is unknown or takes no key. A blank PIN is not
    /// staged at all.
    pub fn to_config(&self) -> ConfigMap {
        let mut config = ConfigMap::new();
        let mut put = |key: &str, value: ConfigValue| {
            config.insert(key.to_string(), value);
        };

        if let Some(provider) = &self.provider {
            put(LLM_PROVIDER, provider.as_str().into());
        }

        let key_var = self.provider.as_deref().and_then(Provider::from_id).and_then(Provider::api_key_var);
        if let (Some(api_key), Some(var)) = (&self.api_key, key_var) {
            put(var, api_key.as_str().into());
        }

        if let Some(url) = &self.ollama_url {
            put(OLLAMA_URL, url.as_str().into());
        }
        if let Some(name) = &self.agent_name {
            put(AGENT_NAME, name.as_str().into());
        }
        if let Some(model) = &self.model_name {
            put(MODEL, model.as_str().into());
        }
        if let Some(persona) = &self.persona {
            put(PERSONA, persona.as_str().into());
        }
        if let Some(pin) = self.owner_pin.as_deref().filter(|p| !p.trim().is_empty()) {
            put(keys::OWNER_PIN_RAW, pin.into());
        }
        if let Some(enabled) = self.briefing_enabled {
            put(BRIEFING_ENABLED, enabled.into());
        }

        config
    }
}
