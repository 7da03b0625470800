//! Next-token batch construction
//!
//! Packs tokenized rows into fixed-length (input, target) blocks with
//! the target shifted one position right. Pure code, no tensors.

use crate::dataset::TokenizedRow;

/// One training batch of uniform block-length rows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    /// (rows, block_size) token ids
    pub inputs: Vec<Vec<u32>>,
    /// Same shape, shifted one token ahead
    pub targets: Vec<Vec<u32>>,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.inputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }
}

/// Builds blocks and groups them into batches
#[derive(Debug, Clone)]
pub struct Batcher {
    block_size: usize,
    batch_size: usize,
    pad_id: u32,
}

impl Batcher {
    pub fn new(block_size: usize, batch_size: usize, pad_id: u32) -> Self {
        Self {
            block_size,
            batch_size,
            pad_id,
        }
    }

    /// Cut each row into consecutive (input, target) windows
    ///
    /// Rows shorter than two tokens carry no next-token signal and are
    /// dropped. The final partial window of a row is padded.
    pub fn blocks(&self, rows: &[TokenizedRow]) -> Vec<(Vec<u32>, Vec<u32>)> {
        let mut blocks = Vec::new();

        for row in rows {
            if row.ids.len() < 2 {
                continue;
            }

            let inputs = &row.ids[..row.ids.len() - 1];
            let targets = &row.ids[1..];

            for start in (0..inputs.len()).step_by(self.block_size) {
                let end = (start + self.block_size).min(inputs.len());
                let mut input = inputs[start..end].to_vec();
                let mut target = targets[start..end].to_vec();
                input.resize(self.block_size, self.pad_id);
                target.resize(self.block_size, self.pad_id);
                blocks.push((input, target));
            }
        }

        blocks
    }

    /// Group blocks into batches; the final batch may be smaller
    pub fn batches(&self, blocks: Vec<(Vec<u32>, Vec<u32>)>) -> Vec<Batch> {
        blocks
            .chunks(self.batch_size)
            .map(|group| Batch {
                inputs: group.iter().map(|(i, _)| i.clone()).collect(),
                targets: group.iter().map(|(_, t)| t.clone()).collect(),
            })
            .collect()
    }
}
