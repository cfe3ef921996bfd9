use std::path::Path;

use turn_duel::{DeliveryPolicy, MemoryConfig, PlayOrder, SessionConfig, SessionError};

#[test]
fn bundled_example_session_loads() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("demos/session.example.json");

    let config = SessionConfig::load(path).unwrap();

    assert_eq!(config.parties.len(), 2);
    assert_eq!(config.parties[0].order, PlayOrder::First);
    assert_eq!(config.delivery, DeliveryPolicy::Broadcast);
    assert_eq!(config.memory, MemoryConfig::Replace);
    assert_eq!(config.service.model, "o3-mini");
    assert!(config.prompts_dir.is_none());
}

#[test]
fn missing_file_is_a_configuration_error() {
    let result = SessionConfig::load("does/not/exist.json");
    assert!(matches!(result, Err(SessionError::Config(_))));
}
