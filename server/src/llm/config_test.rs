use super::*;

#[test]
fn parse_provider_defaults_to_openai() {
    assert_eq!(parse_provider(None).unwrap(), LlmProviderKind::OpenAi);
}

#[test]
fn parse_provider_accepts_both_providers() {
    assert_eq!(parse_provider(Some("openai")).unwrap(), LlmProviderKind::OpenAi);
    assert_eq!(parse_provider(Some("anthropic")).unwrap(), LlmProviderKind::Anthropic);
}

#[test]
fn parse_provider_rejects_unknown() {
    let err = parse_provider(Some("bard")).unwrap_err();
    assert!(matches!(err, LlmError::ConfigParse(_)));
}

#[test]
fn default_models_per_provider() {
    assert_eq!(default_model(LlmProviderKind::OpenAi), "gpt-4o");
    assert!(default_model(LlmProviderKind::Anthropic).starts_with("claude-"));
}

#[test]
fn env_parse_u64_falls_back_on_garbage() {
    // Env var certainly unset in tests.
    assert_eq!(env_parse_u64("ROOFQUOTE_TEST_UNSET_TIMEOUT", 42), 42);
}
