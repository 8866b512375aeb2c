use std::io::Write;
use std::process::Command;

fn reagent() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_reagent"));
    cmd.env_remove("REAGENT_CONFIG")
        .env_remove("REAGENT_INDEX_TOP_K")
        .env_remove("REAGENT_AGENT_MAX_ITERATIONS")
        .env("RUST_LOG", "warn");
    cmd
}

fn config_file(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

const TWO_COLLECTIONS: &str = r#"
[[collections]]
name = "apple"
persist_dir = "storage/apple"
sources = ["data/APPLE_RAG.pdf"]

[[collections]]
name = "uber"
persist_dir = "storage/uber"
sources = ["data/UBER_RAG.pdf"]
tool_name = "uber_filing"
"#;

#[test]
fn prompts_lists_configured_tools() {
    let config = config_file(TWO_COLLECTIONS);
    let output = reagent()
        .arg("--config")
        .arg(config.path())
        .arg("prompts")
        .output()
        .unwrap();

    assert!(output.status.success(), "{output:?}");
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("=== system_prompt ==="));
    assert!(stdout.contains("> Tool Name: apple_8k"));
    assert!(stdout.contains("> Tool Name: uber_filing"));
    assert!(stdout.contains("Context information is below."));
}

#[test]
fn invalid_config_fails_before_any_work() {
    let config = config_file("[index]\ntop_k = 0\n");
    let output = reagent()
        .arg("--config")
        .arg(config.path())
        .arg("index")
        .output()
        .unwrap();

    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("failed to load config"), "{stderr}");
}

#[test]
fn query_rejects_unknown_collection() {
    let config = config_file(TWO_COLLECTIONS);
    let output = reagent()
        .arg("--config")
        .arg(config.path())
        .args(["query", "lyft", "bookings?"])
        .output()
        .unwrap();

    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("unknown collection: lyft"), "{stderr}");
}
