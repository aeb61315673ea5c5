use chat_embed::config::{AppConfig, DEFAULT_ENDPOINT, DEFAULT_MODEL};
use serial_test::serial;
use std::env;
use std::fs;
use std::io::Write;

const BIN: &str = "chat-embed";

// Clear every variable the loader reads so tests start from defaults.
fn clear_env_vars() {
    unsafe {
        for key in [
            "CHAT_SERVER__PORT",
            "CHAT_LLM__MODEL",
            "CHAT_HISTORY__WINDOW",
            "CONFIG_FILE",
            "PORT",
            "GROQ_API_KEY",
            "GROQ_MODEL",
            "GROQ_ENDPOINT",
            "ASSISTANT_NAME",
            "MAX_TOKENS",
            "TEMPERATURE",
            "MAX_CONTINUATIONS",
            "HISTORY_WINDOW",
            "REDIS_URL",
            "CHAT_HISTORY__REDIS_URL",
            "TEST_MODE",
        ] {
            env::remove_var(key);
        }
    }
}

#[test]
#[serial]
fn test_default_config() {
    clear_env_vars();

    let config = AppConfig::load_from_args([BIN]).expect("defaults should load");
    assert_eq!(config.server.port, 5000);
    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.llm.model, DEFAULT_MODEL);
    assert_eq!(config.llm.endpoint, DEFAULT_ENDPOINT);
    assert_eq!(config.llm.max_tokens, 800);
    assert_eq!(config.llm.max_continuations, 1);
    assert_eq!(config.llm.assistant_name, "seu assistente");
    assert!(!config.llm.test_mode);
    assert!(config.llm.api_key().is_none());
    assert_eq!(config.history.window, 20);
    assert_eq!(config.history.ttl_secs, 24 * 60 * 60);
    assert!(config.history.redis_url().is_none());
}

#[test]
#[serial]
fn test_prefixed_env_override() {
    clear_env_vars();
    unsafe {
        env::set_var("CHAT_SERVER__PORT", "9090");
        env::set_var("CHAT_HISTORY__WINDOW", "6");
    }

    let config = AppConfig::load_from_args([BIN]).expect("Failed to load config");
    assert_eq!(config.server.port, 9090);
    assert_eq!(config.history.window, 6);

    clear_env_vars();
}

#[test]
#[serial]
fn test_legacy_env_vars() {
    clear_env_vars();
    unsafe {
        env::set_var("GROQ_API_KEY", "gsk_test");
        env::set_var("GROQ_MODEL", "llama-3.1-8b-instant");
        env::set_var("ASSISTANT_NAME", "Athos");
        env::set_var("MAX_TOKENS", "1200");
        env::set_var("TEMPERATURE", "0.2");
        env::set_var("MAX_CONTINUATIONS", "3");
        env::set_var("HISTORY_WINDOW", "10");
        env::set_var("TEST_MODE", "yes");
        env::set_var("REDIS_URL", "redis://cache:6379/0");
    }

    let config = AppConfig::load_from_args([BIN]).expect("Failed to load config");
    assert_eq!(config.llm.api_key(), Some("gsk_test"));
    assert_eq!(config.llm.model, "llama-3.1-8b-instant");
    assert_eq!(config.llm.assistant_name, "Athos");
    assert_eq!(config.llm.max_tokens, 1200);
    assert!((config.llm.temperature - 0.2).abs() < f32::EPSILON);
    assert_eq!(config.llm.max_continuations, 3);
    assert_eq!(config.history.window, 10);
    assert!(config.llm.test_mode);
    assert_eq!(config.history.redis_url(), Some("redis://cache:6379/0"));

    clear_env_vars();
}

#[test]
#[serial]
fn test_unparseable_legacy_values_are_ignored() {
    clear_env_vars();
    unsafe {
        env::set_var("MAX_TOKENS", "lots");
        env::set_var("TEST_MODE", "nope");
    }

    let config = AppConfig::load_from_args([BIN]).expect("Failed to load config");
    assert_eq!(config.llm.max_tokens, 800);
    assert!(!config.llm.test_mode);

    clear_env_vars();
}

#[test]
#[serial]
fn test_cli_flags_win() {
    clear_env_vars();
    unsafe {
        env::set_var("CHAT_SERVER__PORT", "9090");
    }

    let config = AppConfig::load_from_args([BIN, "--port", "7000", "--host", "127.0.0.1", "--test-mode"])
        .expect("Failed to load config");
    assert_eq!(config.server.port, 7000);
    assert_eq!(config.server.host, "127.0.0.1");
    assert!(config.llm.test_mode);

    clear_env_vars();
}

#[test]
#[serial]
fn test_file_load() {
    clear_env_vars();

    let mut file = tempfile::Builder::new()
        .suffix(".yaml")
        .tempfile()
        .expect("Failed to create temp config");
    writeln!(
        file,
        "server:\n  port: 7070\nllm:\n  model: from-file\n  assistant_name: Athos\n"
    )
    .expect("Failed to write temp config");

    let path = file.path().to_string_lossy().to_string();
    let config = AppConfig::load_from_args([BIN, "--config", path.as_str()])
        .expect("Failed to load config from file");
    assert_eq!(config.server.port, 7070);
    assert_eq!(config.llm.model, "from-file");
    assert_eq!(config.llm.assistant_name, "Athos");
    // Untouched keys keep their defaults.
    assert_eq!(config.llm.max_tokens, 800);
}

#[test]
#[serial]
fn test_missing_explicit_file_fails() {
    clear_env_vars();

    let result = AppConfig::load_from_args([BIN, "--config", "does-not-exist.yaml"]);
    assert!(result.is_err());
}

#[test]
#[serial]
fn test_env_beats_file() {
    clear_env_vars();

    let mut file = tempfile::Builder::new()
        .suffix(".yaml")
        .tempfile()
        .expect("Failed to create temp config");
    writeln!(file, "server:\n  port: 7070\n").expect("Failed to write temp config");
    unsafe {
        env::set_var("CHAT_SERVER__PORT", "8081");
    }

    let path = file.path().to_string_lossy().to_string();
    let config = AppConfig::load_from_args([BIN, "--config", path.as_str()])
        .expect("Failed to load config");
    assert_eq!(config.server.port, 8081);

    clear_env_vars();
}

#[test]
#[serial]
fn test_cwd_config_fallback() {
    clear_env_vars();

    let cwd_path = "config.yaml";
    fs::write(cwd_path, "server:\n  port: 6060\n").expect("Failed to write ./config.yaml");

    let port = AppConfig::load_from_args([BIN])
        .ok()
        .map(|config| config.server.port);

    let result = std::panic::catch_unwind(|| {
        assert_eq!(port, Some(6060));
    });

    fs::remove_file(cwd_path).unwrap();

    if let Err(e) = result {
        std::panic::resume_unwind(e);
    }
}
