use std::{fmt::Display, str::FromStr};

use derive_new::new;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

use super::{Labels, Reader, Record};

/// The name of the Stanford Sentiment Treebank dataset
pub static DATASET: &str = "sst";

/// How many sentiment classes to keep from the 0-4 treebank labels
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Granularity {
    /// Labels are kept exactly as written
    #[default]
    #[serde(rename = "5-class")]
    FiveClass,

    /// Negative (0, 1), neutral (2) and positive (3, 4)
    #[serde(rename = "3-class")]
    ThreeClass,

    /// Negative (0, 1) and positive (3, 4); neutral spans are dropped
    #[serde(rename = "2-class")]
    TwoClass,
}

impl Granularity {
    /// Map a treebank label, returning `None` when the span should be dropped
    fn map(&self, line: usize, label: &str) -> Result<Option<String>> {
        if *self == Granularity::FiveClass {
            return Ok(Some(label.to_string()));
        }

        let value: u8 = label
            .parse()
            .ok()
            .filter(|value| *value <= 4)
            .ok_or_else(|| Error::Parse {
                line,
                message: format!("sentiment label {label:?} is not in 0..=4"),
            })?;

        let mapped = match (self, value) {
            (Granularity::ThreeClass, 0 | 1) => Some("0"),
            (Granularity::ThreeClass, 2) => Some("1"),
            (Granularity::ThreeClass, _) => Some("2"),
            (_, 0 | 1) => Some("0"),
            (_, 2) => None,
            (_, _) => Some("1"),
        };

        Ok(mapped.map(str::to_string))
    }
}

impl FromStr for Granularity {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value {
            "5-class" => Ok(Granularity::FiveClass),
            "3-class" => Ok(Granularity::ThreeClass),
            "2-class" => Ok(Granularity::TwoClass),
            _ => Err(Error::Config(format!("unknown granularity {value}"))),
        }
    }
}

impl Display for Granularity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Granularity::FiveClass => "5-class",
            Granularity::ThreeClass => "3-class",
            Granularity::TwoClass => "2-class",
        };

        write!(f, "{}", name)
    }
}

/// A labeled sentiment tree
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Tree {
    /// A single labeled word
    Leaf {
        /// Sentiment label
        label: String,

        /// The word
        word: String,
    },

    /// A labeled phrase
    Node {
        /// Sentiment label
        label: String,

        /// Sub-phrases, in order
        children: Vec<Tree>,
    },
}

impl Tree {
    /// Parse a bracketed tree, e.g. `(3 (2 it) (4 (4 works) (2 .)))`
    pub fn parse(line: usize, text: &str) -> Result<Self> {
        let tokens = lex(text);
        let mut position = 0;

        let tree = parse_node(line, &tokens, &mut position)?;

        if position != tokens.len() {
            return Err(Error::Parse {
                line,
                message: "unexpected input after the closing bracket".to_string(),
            });
        }

        Ok(tree)
    }

    /// The label of this span
    pub fn label(&self) -> &str {
        match self {
            Tree::Leaf { label, .. } | Tree::Node { label, .. } => label,
        }
    }

    /// The words covered by this span
    pub fn words(&self) -> Vec<String> {
        let mut words = Vec::new();
        self.collect_words(&mut words);
        words
    }

    fn collect_words(&self, words: &mut Vec<String>) {
        match self {
            Tree::Leaf { word, .. } => words.push(word.clone()),
            Tree::Node { children, .. } => {
                for child in children {
                    child.collect_words(words);
                }
            }
        }
    }

    /// Every span in pre-order, starting with this one
    pub fn spans(&self) -> Vec<&Tree> {
        let mut spans = vec![self];

        if let Tree::Node { children, .. } = self {
            for child in children {
                spans.extend(child.spans());
            }
        }

        spans
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Token {
    Open,
    Close,
    Atom(String),
}

fn lex(text: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut atom = String::new();

    for c in text.chars() {
        if c == '(' || c == ')' || c.is_whitespace() {
            if !atom.is_empty() {
                tokens.push(Token::Atom(std::mem::take(&mut atom)));
            }

            match c {
                '(' => tokens.push(Token::Open),
                ')' => tokens.push(Token::Close),
                _ => {}
            }
        } else {
            atom.push(c);
        }
    }

    if !atom.is_empty() {
        tokens.push(Token::Atom(atom));
    }

    tokens
}

fn parse_node(line: usize, tokens: &[Token], position: &mut usize) -> Result<Tree> {
    let error = |message: &str| Error::Parse {
        line,
        message: message.to_string(),
    };

    if tokens.get(*position) != Some(&Token::Open) {
        return Err(error("expected an opening bracket"));
    }
    *position += 1;

    let label = match tokens.get(*position) {
        Some(Token::Atom(label)) => label.clone(),
        _ => return Err(error("expected a label after the opening bracket")),
    };
    *position += 1;

    // A leaf holds exactly one word
    if let Some(Token::Atom(word)) = tokens.get(*position) {
        let word = word.clone();
        *position += 1;

        if tokens.get(*position) != Some(&Token::Close) {
            return Err(error("a leaf must hold exactly one word"));
        }
        *position += 1;

        return Ok(Tree::Leaf { label, word });
    }

    let mut children = Vec::new();

    loop {
        match tokens.get(*position) {
            Some(Token::Open) => children.push(parse_node(line, tokens, position)?),
            Some(Token::Close) => {
                *position += 1;
                break;
            }
            Some(Token::Atom(_)) => return Err(error("words may only appear in leaves")),
            None => return Err(error("unbalanced brackets")),
        }
    }

    if children.is_empty() {
        return Err(error("empty span"));
    }

    Ok(Tree::Node { label, children })
}

/// Reads one bracketed sentiment tree per line
#[derive(Clone, Debug, Default, new)]
pub struct SstReader {
    /// Emit a record for every labeled span, not only the root sentence
    pub use_subtrees: bool,

    /// Label granularity
    pub granularity: Granularity,
}

impl Reader for SstReader {
    fn parse_line(&self, line: usize, text: &str) -> Result<Vec<Record>> {
        let tree = Tree::parse(line, text)?;

        let spans = if self.use_subtrees {
            tree.spans()
        } else {
            vec![&tree]
        };

        let mut records = Vec::with_capacity(spans.len());

        // Identical phrases under different parents are each emitted
        for span in spans {
            if let Some(label) = self.granularity.map(line, span.label())? {
                records.push(Record::new(
                    span.words(),
                    Some(Labels::Sequence(label)),
                    line,
                ));
            }
        }

        Ok(records)
    }
}
