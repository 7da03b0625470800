//! Dataset loading and preparation flow against a JSONL file on disk

use std::fs;

use lumina::dataset::{
    load_jsonl, split_train_eval, tokenize_rows, DatasetFilter, DatasetSource, TextEncoder,
};
use lumina::Result;

/// One id per whitespace word, enough structure for batching tests
struct WordEncoder;

impl TextEncoder for WordEncoder {
    fn encode_batch_ids(&self, texts: &[String]) -> Result<Vec<Vec<u32>>> {
        Ok(texts
            .iter()
            .map(|t| {
                t.split_whitespace()
                    .map(|w| w.len() as u32 + 1)
                    .collect()
            })
            .collect())
    }
}

fn write_dataset(dir: &std::path::Path) -> std::path::PathBuf {
    // Ten rows, three of which clear both quality thresholds.
    let lines = [
        r#"{"prompt":"p0","response":"r0","avg_rating":4.6,"num_responses":3}"#,
        r#"{"prompt":"p1","response":"r1","avg_rating":3.2,"num_responses":4}"#,
        r#"{"prompt":"p2","response":"r2","avg_rating":4.9,"num_responses":1}"#,
        r#"{"prompt":"p3","response":"r3","avg_rating":2.0,"num_responses":2}"#,
        r#"{"prompt":"p4","response":"r4","avg_rating":4.0,"num_responses":2}"#,
        r#"{"prompt":"p5","response":"r5","avg_rating":3.9,"num_responses":9}"#,
        r#"{"prompt":"p6","response":"r6","avg_rating":1.5,"num_responses":1}"#,
        r#"{"prompt":"p7","response":"r7","avg_rating":5.0,"num_responses":6}"#,
        r#"{"prompt":"p8","response":"r8","avg_rating":3.0,"num_responses":3}"#,
        r#"{"prompt":"p9","response":"r9","avg_rating":2.5,"num_responses":2}"#,
    ];
    let path = dir.join("train.jsonl");
    fs::write(&path, lines.join("\n")).unwrap();
    path
}

#[test]
fn test_filter_keeps_matching_rows_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_dataset(dir.path());

    let rows = load_jsonl(&path).unwrap();
    assert_eq!(rows.len(), 10);

    let kept = DatasetFilter::default().apply(rows);
    let prompts: Vec<&str> = kept.iter().map(|r| r.prompt.as_str()).collect();
    assert_eq!(prompts, vec!["p0", "p4", "p7"]);
}

#[test]
fn test_full_preparation_flow() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_dataset(dir.path());

    let source = DatasetSource::parse(path.to_str().unwrap());
    let resolved = source.fetch().unwrap();
    let rows = load_jsonl(&resolved).unwrap();

    let kept = DatasetFilter::default().apply(rows);
    // ceil(3 * 0.2) = 1 eval row, taken from the tail.
    let (train, eval) = split_train_eval(kept, 0.2);
    assert_eq!(train.len(), 2);
    assert_eq!(eval.len(), 1);
    assert_eq!(eval[0].prompt, "p7");

    let train_tokens = tokenize_rows(&WordEncoder, &train).unwrap();
    let eval_tokens = tokenize_rows(&WordEncoder, &eval).unwrap();
    assert_eq!(train_tokens.len(), 2);
    assert_eq!(eval_tokens.len(), 1);
    assert!(train_tokens.iter().all(|row| !row.ids.is_empty()));
}

#[test]
fn test_malformed_file_fails_with_location() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.jsonl");
    fs::write(
        &path,
        "{\"prompt\":\"ok\",\"avg_rating\":4.5,\"num_responses\":2}\n{broken\n",
    )
    .unwrap();

    let err = load_jsonl(&path).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("broken.jsonl"));
    assert!(message.contains(":2:"));
}
