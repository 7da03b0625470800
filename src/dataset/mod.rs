//! Ranked prompt dataset loading, filtering, and tokenization
//!
//! Rows come from a local JSONL file or a Hugging Face dataset repo.
//! Filtering keeps highly rated prompts in their original order, then
//! truncates to a row budget. The train/eval split is deterministic.

use crate::errors::{LuminaError, Result};
use hf_hub::{api::sync::Api, Repo, RepoType};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tokenizers::Tokenizer;

/// File fetched from a Hub dataset repo
pub const DATASET_FILE: &str = "train.jsonl";

/// One ranked prompt row
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PromptRecord {
    pub prompt: String,
    #[serde(default)]
    pub response: String,
    pub avg_rating: f64,
    pub num_responses: u32,
}

impl PromptRecord {
    /// Text presented to the model for this row
    pub fn training_text(&self) -> String {
        format!(
            "### Prompt:\n{}\n### Response:\n{}",
            self.prompt, self.response
        )
    }
}

/// Quality filter over ranked prompt rows
#[derive(Debug, Clone)]
pub struct DatasetFilter {
    pub min_avg_rating: f64,
    pub min_responses: u32,
    pub max_rows: usize,
}

impl Default for DatasetFilter {
    fn default() -> Self {
        Self {
            min_avg_rating: 4.0,
            min_responses: 2,
            max_rows: 500,
        }
    }
}

impl DatasetFilter {
    /// Keep qualifying rows in input order, truncated to `max_rows`
    pub fn apply(&self, rows: Vec<PromptRecord>) -> Vec<PromptRecord> {
        rows.into_iter()
            .filter(|row| {
                row.avg_rating >= self.min_avg_rating && row.num_responses >= self.min_responses
            })
            .take(self.max_rows)
            .collect()
    }
}

/// Where the dataset comes from
#[derive(Debug, Clone)]
pub enum DatasetSource {
    /// JSONL file on disk
    Local(PathBuf),
    /// Hub dataset repo holding `train.jsonl`
    Hub(String),
}

impl DatasetSource {
    /// A string naming an existing file is a local source, anything else
    /// is treated as a Hub dataset repo id.
    pub fn parse(name: &str) -> Self {
        let path = Path::new(name);
        if path.exists() {
            DatasetSource::Local(path.to_path_buf())
        } else {
            DatasetSource::Hub(name.to_string())
        }
    }

    /// Resolve to a local JSONL path, downloading when needed
    pub fn fetch(&self) -> Result<PathBuf> {
        match self {
            DatasetSource::Local(path) => Ok(path.clone()),
            DatasetSource::Hub(repo_id) => {
                let api = Api::new()?;
                let repo = api.repo(Repo::new(repo_id.clone(), RepoType::Dataset));
                Ok(repo.get(DATASET_FILE)?)
            }
        }
    }
}

/// Load rows from a JSONL file; blank lines are skipped
pub fn load_jsonl(path: &Path) -> Result<Vec<PromptRecord>> {
    let contents = fs::read_to_string(path)?;
    let mut rows = Vec::new();

    for (line_no, line) in contents.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let row: PromptRecord = serde_json::from_str(line).map_err(|e| {
            LuminaError::DatasetError(format!(
                "{}:{}: malformed row: {}",
                path.display(),
                line_no + 1,
                e
            ))
        })?;
        rows.push(row);
    }

    Ok(rows)
}

/// Deterministic order-preserving split: the eval set is the tail
pub fn split_train_eval(
    rows: Vec<PromptRecord>,
    eval_fraction: f64,
) -> (Vec<PromptRecord>, Vec<PromptRecord>) {
    let eval_len = ((rows.len() as f64) * eval_fraction).ceil() as usize;
    let eval_len = eval_len.min(rows.len());
    let train_len = rows.len() - eval_len;

    let mut train = rows;
    let eval = train.split_off(train_len);
    (train, eval)
}

/// Batched text-to-ids encoding; the seam for test encoders
pub trait TextEncoder {
    fn encode_batch_ids(&self, texts: &[String]) -> Result<Vec<Vec<u32>>>;
}

impl TextEncoder for Tokenizer {
    fn encode_batch_ids(&self, texts: &[String]) -> Result<Vec<Vec<u32>>> {
        let encodings = self
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| LuminaError::TokenizerError(e.to_string()))?;

        Ok(encodings
            .iter()
            .map(|encoding| encoding.get_ids().to_vec())
            .collect())
    }
}

/// One tokenized row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenizedRow {
    pub ids: Vec<u32>,
}

/// Tokenize rows in one batched call, preserving order
pub fn tokenize_rows<E: TextEncoder>(encoder: &E, rows: &[PromptRecord]) -> Result<Vec<TokenizedRow>> {
    let texts: Vec<String> = rows.iter().map(|row| row.training_text()).collect();
    let ids = encoder.encode_batch_ids(&texts)?;

    if ids.len() != rows.len() {
        return Err(LuminaError::TokenizerError(format!(
            "encoded {} rows out of {}",
            ids.len(),
            rows.len()
        )));
    }

    Ok(ids.into_iter().map(|ids| TokenizedRow { ids }).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(prompt: &str, avg_rating: f64, num_responses: u32) -> PromptRecord {
        PromptRecord {
            prompt: prompt.to_string(),
            response: "ok".to_string(),
            avg_rating,
            num_responses,
        }
    }

    #[test]
    fn test_filter_keeps_qualifying_rows_in_order() {
        let rows = vec![
            row("a", 4.5, 3),
            row("b", 3.9, 5),
            row("c", 4.0, 2),
            row("d", 5.0, 1),
            row("e", 4.8, 2),
        ];

        let kept = DatasetFilter::default().apply(rows);
        let prompts: Vec<&str> = kept.iter().map(|r| r.prompt.as_str()).collect();
        assert_eq!(prompts, vec!["a", "c", "e"]);
    }

    #[test]
    fn test_filter_boundary_values_inclusive() {
        let kept = DatasetFilter::default().apply(vec![row("edge", 4.0, 2)]);
        assert_eq!(kept.len(), 1);
    }

    #[test]
    fn test_filter_truncates_to_max_rows() {
        let rows: Vec<PromptRecord> = (0..600).map(|i| row(&format!("p{}", i), 4.5, 3)).collect();
        let kept = DatasetFilter::default().apply(rows);
        assert_eq!(kept.len(), 500);
        assert_eq!(kept[0].prompt, "p0");
        assert_eq!(kept[499].prompt, "p499");
    }

    #[test]
    fn test_split_is_deterministic_tail() {
        let rows: Vec<PromptRecord> = (0..10).map(|i| row(&format!("p{}", i), 4.5, 3)).collect();
        let (train, eval) = split_train_eval(rows, 0.2);

        assert_eq!(train.len(), 8);
        assert_eq!(eval.len(), 2);
        assert_eq!(eval[0].prompt, "p8");
        assert_eq!(eval[1].prompt, "p9");
    }

    #[test]
    fn test_split_empty_dataset() {
        let (train, eval) = split_train_eval(Vec::new(), 0.1);
        assert!(train.is_empty());
        assert!(eval.is_empty());
    }

    #[test]
    fn test_training_text_contains_both_fields() {
        let text = row("why is the sky blue", 4.0, 2).training_text();
        assert!(text.contains("why is the sky blue"));
        assert!(text.contains("### Response:"));
    }

    struct WordEncoder;

    impl TextEncoder for WordEncoder {
        fn encode_batch_ids(&self, texts: &[String]) -> Result<Vec<Vec<u32>>> {
            Ok(texts
                .iter()
                .map(|t| t.split_whitespace().map(|w| w.len() as u32).collect())
                .collect())
        }
    }

    #[test]
    fn test_tokenize_rows_preserves_order() {
        let rows = vec![row("one", 4.0, 2), row("two two", 4.0, 2)];
        let tokenized = tokenize_rows(&WordEncoder, &rows).unwrap();

        assert_eq!(tokenized.len(), 2);
        assert!(tokenized[1].ids.len() > tokenized[0].ids.len());
    }

    #[test]
    fn test_load_jsonl_skips_blank_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rows.jsonl");
        fs::write(
            &path,
            "{\"prompt\":\"a\",\"avg_rating\":4.5,\"num_responses\":3}\n\n\
             {\"prompt\":\"b\",\"avg_rating\":2.0,\"num_responses\":1}\n",
        )
        .unwrap();

        let rows = load_jsonl(&path).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].prompt, "a");
        assert_eq!(rows[0].response, "");
    }

    #[test]
    fn test_load_jsonl_reports_line_number() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.jsonl");
        fs::write(
            &path,
            "{\"prompt\":\"a\",\"avg_rating\":4.5,\"num_responses\":3}\nnot json\n",
        )
        .unwrap();

        let err = load_jsonl(&path).unwrap_err();
        assert!(err.to_string().contains(":2:"));
    }

    #[test]
    fn test_source_parse_prefers_existing_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.jsonl");
        fs::write(&path, "").unwrap();

        match DatasetSource::parse(path.to_str().unwrap()) {
            DatasetSource::Local(p) => assert_eq!(p, path),
            DatasetSource::Hub(_) => panic!("expected local source"),
        }

        match DatasetSource::parse("org/some-dataset") {
            DatasetSource::Hub(repo) => assert_eq!(repo, "org/some-dataset"),
            DatasetSource::Local(_) => panic!("expected hub source"),
        }
    }
}
