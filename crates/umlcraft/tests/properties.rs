//! Property tests for the pure building blocks

use proptest::prelude::*;
use umlcraft::{
    extract, load, save, MemoryConfigStore, Provider, ProviderConfig, ResponseExtractor,
    TypeRegistry, SETTINGS_KEY,
};

fn provider() -> impl Strategy<Value = Provider> {
    prop_oneof![
        Just(Provider::Mistral),
        Just(Provider::Gemini),
        Just(Provider::Custom),
    ]
}

/// Any record that satisfies the model and temperature invariants
fn valid_config() -> impl Strategy<Value = ProviderConfig> {
    (provider(), "[a-zA-Z0-9]{0,24}", 0.0f64..=1.0, any::<prop::sample::Index>()).prop_map(
        |(provider, key, temperature, index)| {
            let model = index.get(provider.models());
            ProviderConfig::new(provider, key, *model, temperature, None).unwrap()
        },
    )
}

proptest! {
    #[test]
    fn lookup_only_accepts_catalog_ids(id in "[a-z-]{0,16}") {
        let registry = TypeRegistry::new();
        let known = registry.ids().any(|known| known == id);
        prop_assert_eq!(registry.lookup(&id).is_ok(), known);
    }

    #[test]
    fn prompt_starts_with_prefix(index in any::<prop::sample::Index>(), desc in ".{0,64}") {
        let category = index.get(TypeRegistry::new().all());
        let prompt = category.prompt_for(&desc);
        prop_assert!(prompt.starts_with(category.prompt_prefix));
        prop_assert!(prompt.ends_with(&desc));
    }

    #[test]
    fn provider_switch_restores_model_invariant(config in valid_config(), next in provider()) {
        let switched = config.set_provider(next);
        prop_assert_eq!(switched.provider(), next);
        prop_assert_eq!(switched.model(), next.default_model());
        prop_assert!(switched.validate().is_ok());
        prop_assert_eq!(switched.api_key(), config.api_key());
    }

    #[test]
    fn temperature_outside_unit_interval_rejected(value in prop_oneof![-100.0f64..-0.0001, 1.0001f64..100.0]) {
        prop_assert!(ProviderConfig::default().with_temperature(value).is_err());
    }

    #[test]
    fn saved_config_loads_back(config in valid_config()) {
        let store = MemoryConfigStore::new();
        save(&store, &config);
        prop_assert_eq!(load(&store), config);
    }

    #[test]
    fn garbage_settings_load_as_default(raw in ".{0,80}") {
        let store = MemoryConfigStore::with_entry(SETTINGS_KEY, raw);
        prop_assert_eq!(load(&store), ProviderConfig::default());
    }

    #[test]
    fn extraction_returns_block_interior(body in "[a-zA-Z0-9 ;>-]{1,40}", before in "[a-zA-Z ]{0,20}", after in "[a-zA-Z ]{0,20}") {
        let raw = format!("{}\n```mermaid\n{}\n```\n{}", before, body, after);
        prop_assert_eq!(extract(&raw), body.trim());
    }

    #[test]
    fn unfenced_text_is_returned_trimmed(raw in "[a-zA-Z0-9 \n;]{0,60}") {
        prop_assert_eq!(ResponseExtractor::default().extract(&raw), raw.trim());
    }
}
