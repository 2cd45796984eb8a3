use llm_combat::{ConfigError, ConsoleConfig, GenerationConfig, Provider};
use llm_combat::CombatRules;
use std::collections::HashMap;
mod common;

#[ctor::ctor]
fn _init() { common::init(); }

fn from(pairs: &[(&str, &str)]) -> Result<GenerationConfig, ConfigError> {
    let map: HashMap<&str, &str> = pairs.iter().copied().collect();
    GenerationConfig::from_lookup(|k| map.get(k).map(|v| v.to_string()))
}

#[test]
fn missing_credential_is_reported() {
    assert_eq!(from(&[]), Err(ConfigError::MissingCredential { var: "OPENAI_API_KEY" }));
    assert_eq!(
        from(&[("COMBAT_PROVIDER", "gemini"), ("OPENAI_API_KEY", "sk-wrong-one")]),
        Err(ConfigError::MissingCredential { var: "GOOGLE_API_KEY" })
    );
    // 空白だけの値は未設定扱い
    assert_eq!(from(&[("OPENAI_API_KEY", "   ")]), Err(ConfigError::MissingCredential { var: "OPENAI_API_KEY" }));
}

#[test]
fn gemini_settings() {
    let c = from(&[
        ("COMBAT_PROVIDER", "Gemini"),
        ("GOOGLE_API_KEY", "g-key"),
        ("COMBAT_SAFETY_THRESHOLD", "BLOCK_ONLY_HIGH"),
        ("COMBAT_TIMEOUT_SECS", "12"),
    ])
    .unwrap();
    assert_eq!(c.provider, Provider::Gemini);
    assert_eq!(c.api_key, "g-key");
    assert_eq!(c.model, "gemini-1.5-flash-latest");
    assert_eq!(c.timeout_secs, 12);
    assert_eq!(c.safety_threshold.as_deref(), Some("BLOCK_ONLY_HIGH"));
}

#[test]
fn overrides_and_invalid_values() {
    let c = from(&[("OPENAI_API_KEY", "sk"), ("COMBAT_MODEL", "gpt-5"), ("COMBAT_MAX_TOKENS", "512")]).unwrap();
    assert_eq!(c.model, "gpt-5");
    assert_eq!(c.max_tokens, 512);

    assert_eq!(
        from(&[("OPENAI_API_KEY", "sk"), ("COMBAT_MAX_TOKENS", "many")]),
        Err(ConfigError::InvalidNumber { var: "COMBAT_MAX_TOKENS", value: "many".into() })
    );
    assert_eq!(
        from(&[("COMBAT_PROVIDER", "llama"), ("OPENAI_API_KEY", "sk")]),
        Err(ConfigError::UnknownProvider("llama".into()))
    );
}

#[test]
fn error_messages_name_the_variable() {
    let e = ConfigError::MissingCredential { var: "GOOGLE_API_KEY" };
    assert!(e.to_string().contains("GOOGLE_API_KEY"));
}

#[test]
fn defaults() {
    assert_eq!(ConsoleConfig::default().pause_ms, 600);
    let r = CombatRules::default();
    assert_eq!((r.player_max_hp, r.enemy_max_hp, r.enemy_attack_damage), (50, 30, 8));
    assert_eq!(r.enemy_name, "Goblin");
}
