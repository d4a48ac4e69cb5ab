//! Frozen token and label namespaces.
//!
//! Token ids 0 and 1 are reserved for padding and unknown tokens. The rest of the ids, and all
//! label ids, are assigned in descending frequency order with ties broken by first appearance,
//! so repeated builds over the same input always produce the same mapping.

use std::{collections::HashMap, path::Path};

use derive_new::new;
use serde::{Deserialize, Serialize};

use crate::{
    datasets::{Labels, Record},
    error::{Error, Result},
    utils::classes::invert_map,
};

/// The token used to pad shorter sequences
pub static PADDING_TOKEN: &str = "@@PADDING@@";

/// The token that stands in for anything outside the vocabulary
pub static UNKNOWN_TOKEN: &str = "@@UNKNOWN@@";

/// The id of the padding token
pub const PAD_ID: usize = 0;

/// The id of the unknown token
pub const UNK_ID: usize = 1;

/// Bidirectional id mappings for tokens and labels
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Stored", into = "Stored")]
pub struct Vocabulary {
    id2token: Vec<String>,
    token2id: HashMap<String, usize>,
    id2label: Vec<String>,
    label2id: HashMap<String, usize>,
    lowercase: bool,
}

/// The on-disk form: only the id-ordered lists are stored
#[derive(Serialize, Deserialize)]
struct Stored {
    lowercase: bool,
    tokens: Vec<String>,
    labels: Vec<String>,
}

impl From<Stored> for Vocabulary {
    fn from(stored: Stored) -> Self {
        Self::from_parts(stored.tokens, stored.labels, stored.lowercase)
    }
}

impl From<Vocabulary> for Stored {
    fn from(vocabulary: Vocabulary) -> Self {
        Self {
            lowercase: vocabulary.lowercase,
            tokens: vocabulary.id2token,
            labels: vocabulary.id2label,
        }
    }
}

impl Vocabulary {
    fn from_parts(id2token: Vec<String>, id2label: Vec<String>, lowercase: bool) -> Self {
        let token2id = invert_map(id2token.iter().cloned().enumerate());
        let label2id = invert_map(id2label.iter().cloned().enumerate());

        Self {
            id2token,
            token2id,
            id2label,
            label2id,
            lowercase,
        }
    }

    /// Look up a token, falling back to the unknown id
    pub fn token_id(&self, token: &str) -> usize {
        let found = if self.lowercase {
            self.token2id.get(&token.to_lowercase())
        } else {
            self.token2id.get(token)
        };

        found.copied().unwrap_or(UNK_ID)
    }

    /// Look up a label
    pub fn label_id(&self, label: &str) -> Option<usize> {
        self.label2id.get(label).copied()
    }

    /// The token for an id
    pub fn token(&self, id: usize) -> Option<&str> {
        self.id2token.get(id).map(String::as_str)
    }

    /// The label for an id
    pub fn label(&self, id: usize) -> Option<&str> {
        self.id2label.get(id).map(String::as_str)
    }

    /// Labels in id order
    pub fn labels(&self) -> &[String] {
        &self.id2label
    }

    /// Size of the token namespace, reserved ids included
    pub fn tokens_len(&self) -> usize {
        self.id2token.len()
    }

    /// Size of the label namespace
    pub fn labels_len(&self) -> usize {
        self.id2label.len()
    }

    /// Whether tokens are lowercased before lookup
    pub fn lowercase(&self) -> bool {
        self.lowercase
    }

    /// Write the vocabulary as JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self).map_err(|e| Error::resource(path, e))?;

        std::fs::write(path, json).map_err(|e| Error::resource(path, e))
    }

    /// Read a vocabulary written by [`Vocabulary::save`]
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| Error::resource(path, e))?;

        serde_json::from_str(&json).map_err(|e| Error::resource(path, e))
    }
}

/// Counts tokens and labels across records and freezes them into a [`Vocabulary`]
#[derive(Clone, Debug, new)]
pub struct VocabularyBuilder {
    /// Tokens seen fewer times than this are folded into the unknown token
    pub min_count: usize,

    /// Lowercase tokens before counting and lookup
    pub lowercase: bool,
}

impl Default for VocabularyBuilder {
    fn default() -> Self {
        Self::new(1, false)
    }
}

impl VocabularyBuilder {
    /// Build a frozen vocabulary from the given records
    pub fn build<'a>(&self, records: impl IntoIterator<Item = &'a Record>) -> Vocabulary {
        let mut tokens = Counter::default();
        let mut labels = Counter::default();

        for record in records {
            for token in &record.tokens {
                let token = if self.lowercase {
                    token.to_lowercase()
                } else {
                    token.clone()
                };

                if token != PADDING_TOKEN && token != UNKNOWN_TOKEN {
                    tokens.add(token);
                }
            }

            match &record.labels {
                Some(Labels::Sequence(label)) => labels.add(label.clone()),
                Some(Labels::Tokens(values)) => {
                    for label in values {
                        labels.add(label.clone());
                    }
                }
                None => {}
            }
        }

        let id2token = [PADDING_TOKEN.to_string(), UNKNOWN_TOKEN.to_string()]
            .into_iter()
            .chain(tokens.ranked(self.min_count.max(1)))
            .collect();

        let vocabulary = Vocabulary::from_parts(id2token, labels.ranked(1), self.lowercase);

        log::info!(
            "Built vocabulary with {} tokens and {} labels",
            vocabulary.tokens_len(),
            vocabulary.labels_len()
        );

        vocabulary
    }
}

/// Frequency counts that remember first-seen order
#[derive(Default)]
struct Counter {
    counts: Vec<(String, usize)>,
    index: HashMap<String, usize>,
}

impl Counter {
    fn add(&mut self, value: String) {
        match self.index.get(&value) {
            Some(&i) => self.counts[i].1 += 1,
            None => {
                self.index.insert(value.clone(), self.counts.len());
                self.counts.push((value, 1));
            }
        }
    }

    /// Values meeting the cutoff, most frequent first (stable for ties)
    fn ranked(mut self, min_count: usize) -> Vec<String> {
        self.counts.sort_by(|a, b| b.1.cmp(&a.1));

        self.counts
            .into_iter()
            .filter(|(_, count)| *count >= min_count)
            .map(|(value, _)| value)
            .collect()
    }
}
