//! CLI route table driven end to end against fixture sources in a temp workspace.

use std::fs;
use std::path::{Path, PathBuf};

use leadgen::cli::{Commands, OutputFormat, RunContext};
use leadgen::GenerationError;
use serde_json::Value;
use tempfile::TempDir;

const MAPS_FIXTURE: &str = r#"[
  {"name": "Pet Feliz", "phone": "(41) 3333-0001", "website": "https://petfeliz.com.br"},
  {"name": "Pet Feliz", "phone": "(41) 3333-0001"},
  {"name": "Aquario Azul", "email": "contato@aquarioazul.com.br"},
  {"phone": "4133330009"}
]"#;

const SOCIAL_FIXTURE: &str = r#"[
  {"name": "Dog House", "phone": "41 3333 0003", "city": "Curitiba"},
  {"name": "Banho e Tosa Centro", "email": "agenda@banhoetosa.com"},
  {"name": "Racoes Premium", "phone": "4133330006"}
]"#;

fn workspace() -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let fixtures = dir.path().join("fixtures");
    fs::create_dir_all(&fixtures).unwrap();
    fs::write(fixtures.join("maps.json"), MAPS_FIXTURE).unwrap();
    fs::write(fixtures.join("social.json"), SOCIAL_FIXTURE).unwrap();

    let config = dir.path().join("leadgen.toml");
    fs::write(
        &config,
        r#"
[generation]
batch_size = 2

[[sources]]
id = "maps"
fixture = "fixtures/maps.json"

[[sources]]
id = "social"
fixture = "fixtures/social.json"
"#,
    )
    .unwrap();
    (dir, config)
}

fn context(dir: &TempDir, config: &Path) -> RunContext {
    RunContext::new(dir.path().to_path_buf(), Some(config.to_path_buf())).unwrap()
}

fn generate(count: u32, format: OutputFormat, export: bool) -> Commands {
    Commands::Generate {
        niche: "petshop".to_string(),
        city: "Curitiba".to_string(),
        country: None,
        count,
        requester: "cli-test".to_string(),
        format,
        export,
    }
}

fn csv_files(dir: &Path) -> Vec<String> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut names: Vec<String> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|name| name.ends_with(".csv"))
        .collect();
    names.sort();
    names
}

#[test]
fn generate_streams_ndjson_and_exports_csv() {
    let (dir, config) = workspace();
    let ctx = context(&dir, &config);

    let output = ctx.execute(&generate(4, OutputFormat::Json, true)).unwrap();
    let events: Vec<Value> = output
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();

    let last = events.last().unwrap();
    assert_eq!(last["event"]["type"], "completed");
    assert_eq!(last["event"]["total_valid"], 4);
    assert_eq!(events[0]["seq"], 1);
    assert_eq!(events[0]["event"]["current_source"], "maps");

    let batches = events
        .iter()
        .filter(|e| e["event"]["type"] == "batch")
        .count();
    assert_eq!(batches, 2);

    let files = csv_files(&dir.path().join(".leadgen/exports"));
    assert_eq!(
        files
            .iter()
            .filter(|f| f.starts_with("leads_batch_"))
            .count(),
        2
    );
    assert_eq!(
        files
            .iter()
            .filter(|f| f.starts_with("leads_complete_"))
            .count(),
        1
    );
}

#[test]
fn generate_text_summary_reports_counts() {
    let (dir, config) = workspace();
    let ctx = context(&dir, &config);

    let output = ctx.execute(&generate(50, OutputFormat::Text, false)).unwrap();
    assert!(output.contains("completed"), "{output}");
    assert!(output.contains("50"), "{output}");
    assert!(csv_files(&dir.path().join(".leadgen/exports")).is_empty());
}

#[test]
fn generate_rejects_invalid_requests() {
    let (dir, config) = workspace();
    let ctx = context(&dir, &config);

    let result = ctx.execute(&generate(0, OutputFormat::Text, false));
    assert!(matches!(result, Err(GenerationError::InvalidRequest(_))));
}

#[test]
fn sessions_and_events_read_back_the_journal() {
    let (dir, config) = workspace();
    let ctx = context(&dir, &config);
    ctx.execute(&generate(3, OutputFormat::Json, false)).unwrap();

    let sessions: Value = serde_json::from_str(
        &ctx.execute(&Commands::Sessions {
            format: OutputFormat::Json,
        })
        .unwrap(),
    )
    .unwrap();
    let sessions = sessions.as_array().unwrap();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0]["status"], "completed");
    assert_eq!(sessions[0]["valid"], 3);

    let session_id = sessions[0]["session_id"].as_str().unwrap().to_string();
    assert!(session_id.contains("cli-test"));

    let events: Value = serde_json::from_str(
        &ctx.execute(&Commands::Events {
            session: session_id.clone(),
            format: OutputFormat::Json,
        })
        .unwrap(),
    )
    .unwrap();
    let events = events.as_array().unwrap();
    assert_eq!(events.last().unwrap()["event"]["type"], "completed");

    let text = ctx
        .execute(&Commands::Events {
            session: session_id,
            format: OutputFormat::Text,
        })
        .unwrap();
    assert!(text.contains("completed"), "{text}");
}

#[test]
fn events_for_unknown_session_is_not_found() {
    let (dir, config) = workspace();
    let ctx = context(&dir, &config);

    let result = ctx.execute(&Commands::Events {
        session: "session_0_nobody_0".to_string(),
        format: OutputFormat::Json,
    });
    assert!(matches!(result, Err(GenerationError::SessionNotFound(_))));
}

#[test]
fn cleanup_removes_old_exports() {
    let (dir, config) = workspace();
    let ctx = context(&dir, &config);
    ctx.execute(&generate(2, OutputFormat::Json, true)).unwrap();

    let exports = dir.path().join(".leadgen/exports");
    assert!(!csv_files(&exports).is_empty());
    fs::write(exports.join("notes.txt"), "keep me").unwrap();

    let kept = ctx
        .execute(&Commands::Cleanup {
            older_than_hours: None,
        })
        .unwrap();
    assert!(kept.contains("Removed 0"), "{kept}");

    let removed = ctx
        .execute(&Commands::Cleanup {
            older_than_hours: Some(0),
        })
        .unwrap();
    assert!(!removed.contains("Removed 0"), "{removed}");
    assert!(csv_files(&exports).is_empty());
    assert!(exports.join("notes.txt").exists());
}

#[test]
fn sources_lists_configured_sources_in_order() {
    let (dir, config) = workspace();
    let ctx = context(&dir, &config);

    let output = ctx
        .execute(&Commands::Sources {
            format: OutputFormat::Json,
        })
        .unwrap();
    let sources: Value = serde_json::from_str(&output).unwrap();
    let ids: Vec<&str> = sources
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["maps", "social"]);

    let text = ctx
        .execute(&Commands::Sources {
            format: OutputFormat::Text,
        })
        .unwrap();
    assert!(text.contains("maps") && text.contains("social"), "{text}");
}
