//! Property tests for the token-budgeted splitter

use quickcheck_macros::quickcheck;

use lumina::chunk::{Chunker, ChunkerConfig, TokenCounter};
use lumina::ingest::Document;

fn doc(words: &[String]) -> Document {
    Document {
        url: "https://example.com".to_string(),
        text: words.join(" "),
    }
}

/// Strip whitespace so every input string is a single word
fn sanitize(words: Vec<String>) -> Vec<String> {
    words
        .into_iter()
        .map(|w| w.chars().filter(|c| !c.is_whitespace()).collect::<String>())
        .filter(|w| !w.is_empty())
        .collect()
}

#[quickcheck]
fn prop_no_words_lost_without_overlap(words: Vec<String>, chunk_size: usize) -> bool {
    let words = sanitize(words);
    let chunk_size = chunk_size % 64 + 1;

    let chunker = Chunker::new(ChunkerConfig {
        chunk_size,
        overlap: 0,
    })
    .unwrap();

    let rebuilt: Vec<String> = chunker
        .split(&doc(&words))
        .iter()
        .flat_map(|c| c.text.split(' ').map(str::to_string))
        .collect();

    rebuilt == words
}

#[quickcheck]
fn prop_multiword_chunks_respect_budget(words: Vec<String>, chunk_size: usize) -> bool {
    let words = sanitize(words);
    let chunk_size = chunk_size % 64 + 1;
    let counter = TokenCounter::new();

    let chunker = Chunker::new(ChunkerConfig {
        chunk_size,
        overlap: 0,
    })
    .unwrap();

    // A single word over budget is allowed to stand alone; every other
    // chunk must fit.
    chunker.split(&doc(&words)).iter().all(|chunk| {
        let word_count = chunk.text.split(' ').count();
        word_count == 1 || chunk.token_estimate <= chunk_size
    }) && words
        .iter()
        .all(|w| counter.estimate(w) > 0)
}

#[quickcheck]
fn prop_multiword_chunks_respect_budget_with_overlap(
    words: Vec<String>,
    chunk_size: usize,
    overlap: usize,
) -> bool {
    let words = sanitize(words);
    let chunk_size = chunk_size % 64 + 1;
    let overlap = overlap % chunk_size;

    let chunker = Chunker::new(ChunkerConfig {
        chunk_size,
        overlap,
    })
    .unwrap();

    chunker.split(&doc(&words)).iter().all(|chunk| {
        chunk.text.split(' ').count() == 1 || chunk.token_estimate <= chunk_size
    })
}

#[quickcheck]
fn prop_chunk_sequence_numbers_are_contiguous(words: Vec<String>) -> bool {
    let words = sanitize(words);
    let chunker = Chunker::new(ChunkerConfig {
        chunk_size: 8,
        overlap: 0,
    })
    .unwrap();

    chunker
        .split(&doc(&words))
        .iter()
        .enumerate()
        .all(|(i, chunk)| chunk.seq == i)
}
