use derive_new::new;

use crate::error::{Error, Result};

use super::{Labels, Reader, Record};

/// The name of the part-of-speech dataset
pub static DATASET: &str = "pos";

/// The default separator between a word and its tag
pub static DEFAULT_DELIMITER: &str = "###";

/// Reads one sentence per line as whitespace separated `word###TAG` pairs
#[derive(Clone, Debug, new)]
pub struct TaggingReader {
    /// Separator between a word and its tag
    pub delimiter: String,
}

impl Default for TaggingReader {
    fn default() -> Self {
        Self::new(DEFAULT_DELIMITER.to_string())
    }
}

impl Reader for TaggingReader {
    fn parse_line(&self, line: usize, text: &str) -> Result<Vec<Record>> {
        let mut tokens = Vec::new();
        let mut tags = Vec::new();

        for pair in text.split_whitespace() {
            // Split on the last delimiter so words may contain it
            let (word, tag) = pair.rsplit_once(self.delimiter.as_str()).ok_or_else(|| {
                Error::Parse {
                    line,
                    message: format!("{pair:?} is missing the {:?} delimiter", self.delimiter),
                }
            })?;

            if word.is_empty() || tag.is_empty() {
                return Err(Error::Parse {
                    line,
                    message: format!("{pair:?} has an empty word or tag"),
                });
            }

            tokens.push(word.to_string());
            tags.push(tag.to_string());
        }

        Ok(vec![Record::new(tokens, Some(Labels::Tokens(tags)), line)])
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn tags(values: &[&str]) -> Option<Labels> {
        Some(Labels::Tokens(values.iter().map(|s| s.to_string()).collect()))
    }

    #[test]
    fn test_reads_word_tag_pairs() {
        let reader = TaggingReader::default();
        let input = "The###DET dog###NN ate###V the###DET apple###NN\n\nEverybody###NN read###V\n";

        let records = reader
            .read(input.as_bytes())
            .collect::<Result<Vec<_>>>()
            .unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].tokens, vec!["The", "dog", "ate", "the", "apple"]);
        assert_eq!(records[0].labels, tags(&["DET", "NN", "V", "DET", "NN"]));
        assert_eq!(records[1].line, 3);
    }

    #[test]
    fn test_splits_on_last_delimiter() {
        let reader = TaggingReader::default();
        let records = reader.parse_line(1, "a###b###X c###Y").unwrap();

        assert_eq!(records[0].tokens, vec!["a###b", "c"]);
        assert_eq!(records[0].labels, tags(&["X", "Y"]));
    }

    #[test]
    fn test_custom_delimiter() {
        let reader = TaggingReader::new("/".to_string());
        let records = reader.parse_line(1, "time/NN flies/VBZ").unwrap();

        assert_eq!(records[0].labels, tags(&["NN", "VBZ"]));
    }

    #[test]
    fn test_malformed_pairs_report_the_line() {
        let reader = TaggingReader::default();
        let input = "a###X\nb###Y c\n";

        let err = reader
            .read(input.as_bytes())
            .collect::<Result<Vec<_>>>()
            .err()
            .unwrap();
        assert!(matches!(err, Error::Parse { line: 2, .. }));

        let err = reader.parse_line(4, "###X").err().unwrap();
        assert!(matches!(err, Error::Parse { line: 4, .. }));

        let err = reader.parse_line(5, "word###").err().unwrap();
        assert!(matches!(err, Error::Parse { line: 5, .. }));
    }
}
