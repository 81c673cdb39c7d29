use std::fs;

use clap::Parser;
use jarvis_cli::commands::{self, ingest};
use jarvis_cli::{Cli, Settings};
use jarvis_rag::{FlatIndex, VectorIndex};

fn cli(args: &[&str]) -> Cli {
    Cli::try_parse_from(args).unwrap()
}

#[tokio::test]
async fn ingest_then_open_with_matching_embedder() {
    let dir = tempfile::tempdir().unwrap();
    let docs = dir.path().join("documents");
    fs::create_dir_all(docs.join("nested")).unwrap();
    fs::write(docs.join("birth.txt"), "Ankit was born in 1995.").unwrap();
    fs::write(docs.join("nested/work.md"), "Ankit works as an engineer.").unwrap();
    fs::write(docs.join("photo.png"), [0u8, 1, 2]).unwrap();
    let index_path = dir.path().join("data/index.json");

    let path = index_path.to_str().unwrap();
    let parsed = cli(&["jarvis", "--index-path", path, "--google-api-key", "test", "chat"]);
    let settings = Settings::from_options(&parsed.options).unwrap();
    ingest::run(&parsed.options, &settings, &docs).await.unwrap();

    let index = FlatIndex::load(&index_path).unwrap();
    assert_eq!(index.len(), 2);
    assert_eq!(index.spec().embedding_model, "hash-384");

    let assistant = commands::build_assistant(&parsed.options, &settings).unwrap();
    assert_eq!(assistant.top_k(), 4);
    assert_eq!(assistant.retriever().index().await.len(), 2);
}

#[tokio::test]
async fn mismatched_embedder_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let docs = dir.path().join("documents");
    fs::create_dir_all(&docs).unwrap();
    fs::write(docs.join("bio.txt"), "Ankit was born in 1995.").unwrap();
    let index_path = dir.path().join("index.json");
    let path = index_path.to_str().unwrap();

    let build = cli(&["jarvis", "--index-path", path, "chat"]);
    let settings = Settings::from_options(&build.options).unwrap();
    ingest::run(&build.options, &settings, &docs).await.unwrap();

    let open = cli(&[
        "jarvis",
        "--index-path",
        path,
        "--embedding-dimensions",
        "128",
        "--google-api-key",
        "k",
        "chat",
    ]);
    let settings = Settings::from_options(&open.options).unwrap();
    assert!(commands::build_assistant(&open.options, &settings).is_err());
}

#[tokio::test]
async fn missing_index_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.json");
    let path = path.to_str().unwrap();
    let parsed = cli(&["jarvis", "--index-path", path, "--google-api-key", "k", "chat"]);
    let settings = Settings::from_options(&parsed.options).unwrap();
    assert!(commands::build_assistant(&parsed.options, &settings).is_err());
}

#[test]
fn ask_joins_trailing_words() {
    let parsed = cli(&["jarvis", "ask", "--json", "When", "was", "Ankit", "born?"]);
    match parsed.command {
        jarvis_cli::Command::Ask { question, json } => {
            assert!(json);
            assert_eq!(question.join(" "), "When was Ankit born?");
        }
        other => panic!("unexpected command {other:?}"),
    }
}
