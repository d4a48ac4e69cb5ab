use std::{
    collections::VecDeque,
    io::{self, BufRead},
    iter::Enumerate,
    path::Path,
};

use async_trait::async_trait;
use burn::data::dataset::{self, InMemDataset};
use derive_new::new;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// `token###label` corpora for part-of-speech tagging
pub mod tagging;

/// Bracketed sentiment trees (Stanford Sentiment Treebank notation)
pub mod sst;

/// The supervision attached to a record
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Labels {
    /// One label for the whole sequence
    Sequence(String),

    /// One label per token
    Tokens(Vec<String>),
}

/// An ordered sequence of tokens with optional labels
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, new)]
pub struct Record {
    /// The tokens, in order
    pub tokens: Vec<String>,

    /// Sequence or per-token labels; `None` for inference input
    pub labels: Option<Labels>,

    /// The 1-based corpus line this record came from, or 0 for raw input
    pub line: usize,
}

impl Record {
    /// An unlabeled record, tokenized the same way the readers split lines
    pub fn from_sentence(sentence: &str) -> Self {
        Self {
            tokens: sentence.split_whitespace().map(str::to_string).collect(),
            labels: None,
            line: 0,
        }
    }

    /// The number of tokens
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Whether the record has no tokens
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// A corpus notation that turns text lines into records
pub trait Reader {
    /// Parse one non-blank line into zero or more records
    fn parse_line(&self, line: usize, text: &str) -> Result<Vec<Record>>;

    /// Lazily read records from a source of lines
    fn read<R: BufRead>(&self, input: R) -> Records<'_, Self, R>
    where
        Self: Sized,
    {
        Records {
            reader: self,
            lines: input.lines().enumerate(),
            pending: VecDeque::new(),
        }
    }
}

/// A lazy sequence of records read line by line
pub struct Records<'a, P, R> {
    reader: &'a P,
    lines: Enumerate<io::Lines<R>>,
    pending: VecDeque<Record>,
}

impl<'a, P: Reader, R: BufRead> Iterator for Records<'a, P, R> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(record) = self.pending.pop_front() {
                return Some(Ok(record));
            }

            let (index, text) = self.lines.next()?;
            let line = index + 1;

            let text = match text {
                Ok(text) => text,
                Err(e) => {
                    return Some(Err(Error::Parse {
                        line,
                        message: e.to_string(),
                    }))
                }
            };

            if text.trim().is_empty() {
                continue;
            }

            match self.reader.parse_line(line, &text) {
                Ok(records) => self.pending.extend(records),
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

/// A dataset which can be loaded from a corpus file
#[async_trait]
pub trait LoadableDataset<I>: dataset::Dataset<I> {
    /// Load the dataset, parsing each line with the given reader
    async fn load<P: Reader + Sync>(reader: &P, path: &Path) -> Result<Self>
    where
        Self: std::marker::Sized;
}

/// An in-memory corpus of records
pub struct Dataset {
    /// Underlying In-Memory dataset
    dataset: InMemDataset<Record>,
}

impl dataset::Dataset<Record> for Dataset {
    fn get(&self, index: usize) -> Option<Record> {
        self.dataset.get(index)
    }

    fn len(&self) -> usize {
        self.dataset.len()
    }
}

impl Dataset {
    /// Wrap already-read records
    pub fn from_records(records: Vec<Record>) -> Self {
        Self {
            dataset: InMemDataset::new(records),
        }
    }

    /// Read every record from the given source, failing on the first malformed line
    pub fn read<P: Reader, R: BufRead>(reader: &P, input: R) -> Result<Self> {
        let records = reader.read(input).collect::<Result<Vec<_>>>()?;

        Ok(Self::from_records(records))
    }

    /// All records, in corpus order
    pub fn records(&self) -> Vec<Record> {
        dataset::Dataset::iter(self).collect()
    }
}

#[async_trait]
impl LoadableDataset<Record> for Dataset {
    async fn load<P: Reader + Sync>(reader: &P, path: &Path) -> Result<Self> {
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| Error::resource(path, e))?;

        let dataset = Self::read(reader, text.as_bytes())?;

        log::info!(
            "Loaded {} records from {}",
            dataset::Dataset::len(&dataset),
            path.display()
        );

        Ok(dataset)
    }
}
