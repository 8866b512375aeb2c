use std::io::Write;

use serial_test::serial;

use super::*;

const ENV_KEYS: [&str; 9] = [
    "REAGENT_CONFIG",
    "REAGENT_LLM_BASE_URL",
    "REAGENT_LLM_MODEL",
    "REAGENT_LLM_EMBEDDING_MODEL",
    "REAGENT_TIMEOUT_LLM",
    "REAGENT_TIMEOUT_EMBEDDING",
    "REAGENT_INDEX_TOP_K",
    "REAGENT_AGENT_MAX_ITERATIONS",
    "REAGENT_AGENT_VERBOSE",
];

fn clear_env() {
    for key in ENV_KEYS {
        unsafe { std::env::remove_var(key) };
    }
}

fn write_config(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

const SAMPLE: &str = r#"
[agent]
max_iterations = 5
verbose = false

[llm]
model = "llama3.1"

[index]
top_k = 4

[[collections]]
name = "apple"
persist_dir = "storage/apple"
sources = ["data/APPLE_RAG.pdf"]

[[collections]]
name = "uber"
persist_dir = "storage/uber"
sources = ["data/UBER_RAG.pdf"]
tool_name = "uber_filing"
description = "Uber annual report"
"#;

#[test]
fn defaults_when_file_missing() {
    let config = Config::default();
    assert_eq!(config.llm.base_url, "http://localhost:11434");
    assert_eq!(config.llm.model, "llama3");
    assert_eq!(config.llm.embedding_model, "nomic-embed-text");
    assert_eq!(config.timeouts.llm_seconds, 120);
    assert_eq!(config.timeouts.embedding_seconds, 30);
    assert_eq!(config.index.top_k, 3);
    assert_eq!(config.index.chunk_size, 1000);
    assert_eq!(config.index.chunk_overlap, 200);
    assert!(config.index.sentence_aware);
    assert_eq!(config.agent.max_iterations, 10);
    assert!(config.agent.verbose);
    assert!(config.collections.is_empty());
}

#[test]
#[serial]
fn load_missing_file_uses_defaults() {
    clear_env();
    let config = Config::load(Path::new("/nonexistent/reagent.toml")).unwrap();
    assert_eq!(config.llm.model, "llama3");
    assert!(config.collections.is_empty());
}

#[test]
#[serial]
fn load_parses_sections_and_collections() {
    clear_env();
    let file = write_config(SAMPLE);
    let config = Config::load(file.path()).unwrap();

    assert_eq!(config.agent.max_iterations, 5);
    assert!(!config.agent.verbose);
    assert_eq!(config.llm.model, "llama3.1");
    assert_eq!(config.llm.embedding_model, "nomic-embed-text");
    assert_eq!(config.index.top_k, 4);
    assert_eq!(config.index.chunk_size, 1000);
    assert_eq!(config.collections.len(), 2);

    let apple = &config.collections[0];
    assert_eq!(apple.persist_dir, PathBuf::from("storage/apple"));
    assert_eq!(apple.tool_name(), "apple_8k");
    assert!(apple.description().contains("apple financials for year 2024"));

    let uber = &config.collections[1];
    assert_eq!(uber.tool_name(), "uber_filing");
    assert_eq!(uber.description(), "Uber annual report");
}

#[test]
#[serial]
fn load_rejects_malformed_toml() {
    clear_env();
    let file = write_config("[agent\nmax_iterations = ");
    assert!(Config::load(file.path()).is_err());
}

#[test]
#[serial]
fn env_overrides_apply() {
    clear_env();
    unsafe {
        std::env::set_var("REAGENT_LLM_BASE_URL", "http://gpu-box:11434");
        std::env::set_var("REAGENT_LLM_MODEL", "mistral");
        std::env::set_var("REAGENT_LLM_EMBEDDING_MODEL", "mxbai-embed-large");
        std::env::set_var("REAGENT_TIMEOUT_LLM", "300");
        std::env::set_var("REAGENT_TIMEOUT_EMBEDDING", "10");
        std::env::set_var("REAGENT_INDEX_TOP_K", "5");
        std::env::set_var("REAGENT_AGENT_MAX_ITERATIONS", "3");
        std::env::set_var("REAGENT_AGENT_VERBOSE", "false");
    }
    let config = Config::load(Path::new("/nonexistent/reagent.toml")).unwrap();
    clear_env();

    assert_eq!(config.llm.base_url, "http://gpu-box:11434");
    assert_eq!(config.llm.model, "mistral");
    assert_eq!(config.llm.embedding_model, "mxbai-embed-large");
    assert_eq!(config.timeouts.llm_seconds, 300);
    assert_eq!(config.timeouts.embedding_seconds, 10);
    assert_eq!(config.index.top_k, 5);
    assert_eq!(config.agent.max_iterations, 3);
    assert!(!config.agent.verbose);
}

#[test]
#[serial]
fn invalid_env_values_are_ignored() {
    clear_env();
    unsafe {
        std::env::set_var("REAGENT_INDEX_TOP_K", "many");
        std::env::set_var("REAGENT_AGENT_VERBOSE", "perhaps");
    }
    let config = Config::load(Path::new("/nonexistent/reagent.toml")).unwrap();
    clear_env();

    assert_eq!(config.index.top_k, 3);
    assert!(config.agent.verbose);
}

#[test]
#[serial]
fn env_override_is_validated() {
    clear_env();
    unsafe { std::env::set_var("REAGENT_INDEX_TOP_K", "0") };
    let result = Config::load(Path::new("/nonexistent/reagent.toml"));
    clear_env();
    assert!(result.is_err());
}

#[test]
#[serial]
fn resolve_prefers_cli_then_env_then_default() {
    clear_env();
    assert_eq!(
        resolve_config_path(None),
        PathBuf::from(DEFAULT_CONFIG_PATH)
    );

    unsafe { std::env::set_var("REAGENT_CONFIG", "/etc/reagent.toml") };
    assert_eq!(resolve_config_path(None), PathBuf::from("/etc/reagent.toml"));
    assert_eq!(
        resolve_config_path(Some(Path::new("local.toml"))),
        PathBuf::from("local.toml")
    );
    clear_env();
}

fn collection(name: &str) -> CollectionConfig {
    CollectionConfig {
        name: name.into(),
        persist_dir: PathBuf::from("storage").join(name),
        sources: vec![PathBuf::from(format!("data/{name}.pdf"))],
        tool_name: None,
        description: None,
    }
}

fn expect_invalid(config: &Config, needle: &str) {
    let err = config.validate().unwrap_err().to_string();
    assert!(err.contains(needle), "{err}");
}

#[test]
fn validate_accepts_defaults_and_distinct_collections() {
    let mut config = Config::default();
    config.validate().unwrap();
    config.collections = vec![collection("apple"), collection("uber")];
    config.validate().unwrap();
}

#[test]
fn validate_rejects_bad_index_settings() {
    let mut config = Config::default();
    config.index.top_k = 0;
    expect_invalid(&config, "top_k");

    let mut config = Config::default();
    config.index.chunk_size = 0;
    expect_invalid(&config, "chunk_size");

    let mut config = Config::default();
    config.index.chunk_overlap = config.index.chunk_size;
    expect_invalid(&config, "chunk_overlap");
}

#[test]
fn validate_rejects_zero_iterations() {
    let mut config = Config::default();
    config.agent.max_iterations = 0;
    expect_invalid(&config, "max_iterations");
}

#[test]
fn validate_rejects_bad_collections() {
    let mut config = Config::default();
    config.collections = vec![collection("apple"), collection("apple")];
    expect_invalid(&config, "duplicate collection name");

    let mut config = Config::default();
    config.collections = vec![collection(" ")];
    expect_invalid(&config, "must not be empty");

    let mut empty = collection("apple");
    empty.sources.clear();
    let mut config = Config::default();
    config.collections = vec![empty];
    expect_invalid(&config, "no sources");

    let mut doubled = collection("apple");
    doubled.sources.push(doubled.sources[0].clone());
    let mut config = Config::default();
    config.collections = vec![doubled];
    expect_invalid(&config, "twice");
}

#[test]
fn validate_rejects_duplicate_tool_names() {
    let mut apple = collection("apple");
    apple.tool_name = Some("filings".into());
    let mut uber = collection("uber");
    uber.tool_name = Some("filings".into());

    let mut config = Config::default();
    config.collections = vec![apple, uber];
    expect_invalid(&config, "duplicate tool name");
}

#[test]
fn config_serialize_roundtrip() {
    let mut config = Config::default();
    config.collections = vec![collection("microsoft")];
    let toml_str = toml::to_string_pretty(&config).unwrap();
    let back: Config = toml::from_str(&toml_str).unwrap();
    assert_eq!(back.llm, config.llm);
    assert_eq!(back.index, config.index);
    assert_eq!(back.collections, config.collections);
}
