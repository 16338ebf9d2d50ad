use std::fs;

use ragkit_cli::{AppConfig, load_files};
use ragkit_core::EmbedderConfig;
use tempfile::TempDir;

#[test]
fn load_reads_file_from_disk() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("ragkit.toml");
    fs::write(
        &path,
        r#"
        [embedder]
        provider = "lexical"
        dimensions = 128

        [generator]
        backend = "mock"
        answer = "fixed"
        "#,
    )
    .unwrap();

    let config = AppConfig::load(&path).unwrap();
    assert!(matches!(config.embedder, EmbedderConfig::Lexical { dimensions: 128, .. }));
}

#[test]
fn missing_file_names_the_path() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("absent.toml");

    let err = AppConfig::load(&path).unwrap_err();
    assert!(format!("{err:#}").contains("absent.toml"));
}

#[test]
fn no_path_means_defaults() {
    assert_eq!(AppConfig::load_or_default(None).unwrap(), AppConfig::default());
}

#[tokio::test]
async fn ask_flow_over_loaded_files() {
    let dir = TempDir::new().unwrap();
    let notes = dir.path().join("notes.txt");
    let records = dir.path().join("records.csv");
    fs::write(&notes, "rust ownership rules").unwrap();
    fs::write(&records, "title,body\ndogs,dogs bark loudly\ncats,cats sleep all day\n").unwrap();

    let config = AppConfig::from_toml(
        "[rag]\ntop_k = 1\n\n[generator]\nbackend = \"mock\"\nanswer = \"borrowck\"\n",
    )
    .unwrap();
    let system = config.build_system().unwrap();

    let loaded = load_files(&system, &[notes, records]).await.unwrap();
    assert_eq!(loaded, 3);

    let answer = system.process_query("what are the ownership rules?", 32).await.unwrap();
    assert_eq!(answer, "borrowck");

    let context = system.retriever().retrieve("rust ownership", 1).await.unwrap();
    assert_eq!(context[0].content, "rust ownership rules");
}

#[tokio::test]
async fn unsupported_file_fails_load() {
    let dir = TempDir::new().unwrap();
    let deck = dir.path().join("deck.pptx");
    fs::write(&deck, "binary").unwrap();

    let system = AppConfig::default().build_system().unwrap();
    let err = load_files(&system, &[deck]).await.unwrap_err();
    assert!(format!("{err:#}").contains("pptx"));
    assert!(system.retriever().store().is_empty().await);
}
