//! Registry construction and credential-gating tests

use std::collections::HashMap;

use crate::error::EnsembleError;
use crate::services::ProviderRegistry;
use crate::types::{ProviderConfig, ProviderId};

fn configs_with_keys(keys: &[(ProviderId, &str)]) -> HashMap<ProviderId, ProviderConfig> {
    let mut configs = HashMap::new();
    for provider in ProviderId::ALL {
        let api_key = keys
            .iter()
            .find(|(id, _)| *id == provider)
            .map(|(_, key)| *key)
            .unwrap_or("");
        configs.insert(
            provider,
            ProviderConfig::new(api_key, provider.default_model()),
        );
    }
    configs
}

#[test]
fn test_create_by_name_known_providers() {
    for provider in ProviderId::ALL {
        let adapter =
            ProviderRegistry::create_by_name(provider.as_str(), ProviderConfig::default()).unwrap();
        assert_eq!(adapter.id(), provider);
    }
}

#[test]
fn test_create_by_name_unknown_provider() {
    let err = ProviderRegistry::create_by_name("mistral", ProviderConfig::default()).unwrap_err();
    match err {
        EnsembleError::UnknownProvider { name, available } => {
            assert_eq!(name, "mistral");
            assert_eq!(available, "openai, groq, gemini");
        }
        other => panic!("expected UnknownProvider, got {other:?}"),
    }
}

#[test]
fn test_create_active_skips_missing_credentials() {
    let configs = configs_with_keys(&[(ProviderId::OpenAi, "sk-test"), (ProviderId::Groq, "gsk")]);
    let active = ProviderRegistry::create_active(&ProviderId::ALL, &configs);

    assert_eq!(active.len(), 2);
    assert!(active.contains_key(&ProviderId::OpenAi));
    assert!(active.contains_key(&ProviderId::Groq));
    assert!(!active.contains_key(&ProviderId::Gemini));
}

#[test]
fn test_create_active_with_no_credentials() {
    let configs = configs_with_keys(&[]);
    let active = ProviderRegistry::create_active(&ProviderId::ALL, &configs);
    assert!(active.is_empty());
}

#[test]
fn test_create_active_respects_enabled_subset() {
    let configs = configs_with_keys(&[
        (ProviderId::OpenAi, "sk-test"),
        (ProviderId::Groq, "gsk"),
        (ProviderId::Gemini, "gm"),
    ]);
    let active = ProviderRegistry::create_active(&[ProviderId::Gemini], &configs);

    assert_eq!(active.len(), 1);
    assert!(active.contains_key(&ProviderId::Gemini));
}

#[test]
fn test_create_active_skips_unconfigured_provider() {
    // Enabled but absent from the config map
    let mut configs = configs_with_keys(&[(ProviderId::OpenAi, "sk-test")]);
    configs.remove(&ProviderId::Groq);

    let active = ProviderRegistry::create_active(&ProviderId::ALL, &configs);
    assert_eq!(active.len(), 1);
    assert!(active.contains_key(&ProviderId::OpenAi));
}
