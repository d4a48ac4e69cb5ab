use std::sync::Arc;

use burn::tensor::{backend::Backend, Bool, Int, Tensor};
use derive_new::new;

use crate::{
    datasets::{Labels, Record},
    error::{Error, Result},
    utils::tensors,
    vocabulary::{Vocabulary, PAD_ID},
};

/// An inference batch
#[derive(Debug, Clone, new)]
pub struct Infer<B: Backend> {
    /// Token ids as 2D tensor: [batch_size, max_seq_length]
    pub tokens: Tensor<B, 2, Int>,

    /// `true` at real token positions and `false` at padding: [batch_size, max_seq_length]
    pub mask: Tensor<B, 2, Bool>,

    /// The unpadded length of each row
    pub lengths: Vec<usize>,
}

/// Converts records into padded id tensors with a parallel mask
#[derive(Clone)]
pub struct Batcher<B: Backend> {
    /// The frozen vocabulary used for lookups
    pub vocabulary: Arc<Vocabulary>,

    /// Sequences longer than this are truncated
    pub max_seq_length: Option<usize>,

    /// Device on which to perform computation (e.g., CPU or CUDA device)
    pub device: B::Device,
}

impl<B: Backend> Batcher<B> {
    /// Creates a new batcher
    pub fn new(
        vocabulary: Arc<Vocabulary>,
        max_seq_length: Option<usize>,
        device: B::Device,
    ) -> Self {
        Self {
            vocabulary,
            max_seq_length,
            device,
        }
    }

    fn length(&self, record: &Record) -> usize {
        match self.max_seq_length {
            Some(max) => record.len().min(max),
            None => record.len(),
        }
    }

    /// Pad token ids for the given records
    pub fn infer(&self, records: &[Record]) -> Result<Infer<B>> {
        if records.is_empty() {
            return Err(Error::Shape {
                line: 0,
                message: "cannot assemble an empty batch".to_string(),
            });
        }

        let lengths: Vec<usize> = records.iter().map(|record| self.length(record)).collect();

        let token_ids_list: Vec<Vec<usize>> = records
            .iter()
            .zip(&lengths)
            .map(|(record, &length)| {
                record.tokens[..length]
                    .iter()
                    .map(|token| self.vocabulary.token_id(token))
                    .collect()
            })
            .collect();

        // Rows without tokens still need one padded column
        let seq_length = lengths.iter().copied().max().unwrap_or(0).max(1);

        Ok(Infer {
            tokens: tensors::pad_to::<B>(PAD_ID, &token_ids_list, seq_length, &self.device),
            mask: tensors::mask_to::<B>(&lengths, seq_length, &self.device),
            lengths,
        })
    }

    /// One label id per record: [batch_size]
    pub fn sequence_targets(&self, records: &[Record]) -> Result<Tensor<B, 1, Int>> {
        let class_ids = records
            .iter()
            .map(|record| match &record.labels {
                Some(Labels::Sequence(label)) => self.label_id(record, label),
                _ => Err(Error::Shape {
                    line: record.line,
                    message: "expected a single sequence label".to_string(),
                }),
            })
            .collect::<Result<Vec<_>>>()?;

        let targets = tensors::pad_to::<B>(PAD_ID, &[class_ids], records.len(), &self.device);

        Ok(targets.reshape([records.len()]))
    }

    /// One label id per token, padded to `seq_length`: [batch_size, seq_length]
    pub fn token_targets(&self, records: &[Record], seq_length: usize) -> Result<Tensor<B, 2, Int>> {
        let mut class_ids_list = Vec::with_capacity(records.len());

        for record in records {
            let labels = match &record.labels {
                Some(Labels::Tokens(labels)) => labels,
                _ => {
                    return Err(Error::Shape {
                        line: record.line,
                        message: "expected one label per token".to_string(),
                    })
                }
            };

            if labels.len() != record.len() {
                return Err(Error::Shape {
                    line: record.line,
                    message: format!(
                        "{} tokens but {} labels",
                        record.len(),
                        labels.len()
                    ),
                });
            }

            let class_ids = labels[..self.length(record)]
                .iter()
                .map(|label| self.label_id(record, label))
                .collect::<Result<Vec<_>>>()?;

            class_ids_list.push(class_ids);
        }

        // Padding positions get an arbitrary valid class; the mask excludes them
        Ok(tensors::pad_to::<B>(0, &class_ids_list, seq_length, &self.device))
    }

    fn label_id(&self, record: &Record, label: &str) -> Result<usize> {
        self.vocabulary
            .label_id(label)
            .ok_or_else(|| Error::Schema {
                line: record.line,
                label: label.to_string(),
            })
    }
}

/// Assembles labeled records into a model-specific training batch
pub trait TrainBatcher<B: Backend, O> {
    /// Wrap the common batcher
    fn from_batcher(batcher: Batcher<B>) -> Self;

    /// Collect records into a training batch
    fn batch(&self, records: &[Record]) -> Result<O>;
}

/// Group record indices into batches of at most `batch_size`
///
/// With `sort_by_length`, records of similar length land in the same batch to reduce padding.
pub fn batch_indices(lengths: &[usize], batch_size: usize, sort_by_length: bool) -> Vec<Vec<usize>> {
    let mut indices: Vec<usize> = (0..lengths.len()).collect();

    if sort_by_length {
        indices.sort_by_key(|&i| lengths[i]);
    }

    indices
        .chunks(batch_size.max(1))
        .map(<[usize]>::to_vec)
        .collect()
}

#[cfg(test)]
mod tests {
    use burn::backend::NdArray;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{
        datasets::{tagging::TaggingReader, Reader},
        vocabulary::{VocabularyBuilder, UNK_ID},
    };

    type TestBackend = NdArray;

    fn records(input: &str) -> Vec<Record> {
        TaggingReader::default()
            .read(input.as_bytes())
            .collect::<Result<Vec<_>>>()
            .unwrap()
    }

    fn batcher(records: &[Record], max_seq_length: Option<usize>) -> Batcher<TestBackend> {
        let vocabulary = VocabularyBuilder::default().build(records);

        Batcher::new(Arc::new(vocabulary), max_seq_length, Default::default())
    }

    #[test]
    fn test_padding_and_mask() {
        let records = records("a###X b###Y c###X\nd###Y\nb###X a###X");
        let batcher = batcher(&records, None);

        let infer = batcher.infer(&records).unwrap();

        assert_eq!(infer.tokens.dims(), [3, 3]);
        assert_eq!(infer.mask.dims(), [3, 3]);
        assert_eq!(infer.lengths, vec![3, 1, 2]);
        assert_eq!(
            infer.mask.into_data().value,
            vec![true, true, true, true, false, false, true, true, false]
        );

        let ids = infer.tokens.into_data().convert::<i64>().value;
        assert_eq!(ids[4], PAD_ID as i64);
        assert_eq!(ids[5], PAD_ID as i64);
        assert_eq!(ids[8], PAD_ID as i64);
    }

    #[test]
    fn test_stripping_padding_recovers_the_tokens() {
        let records = records("the###D cat###N sat###V\non###P\nthe###D mat###N\nzebras###N run###V far###A away###A");
        let batcher = batcher(&records, None);

        let infer = batcher.infer(&records).unwrap();
        let [_, seq_length] = infer.tokens.dims();

        let ids = infer.tokens.into_data().convert::<i64>().value;
        let mask = infer.mask.into_data().value;

        for (row, record) in records.iter().enumerate() {
            let recovered: Vec<&str> = (0..seq_length)
                .filter(|column| mask[row * seq_length + column])
                .map(|column| {
                    batcher
                        .vocabulary
                        .token(ids[row * seq_length + column] as usize)
                        .unwrap()
                })
                .collect();

            assert_eq!(recovered, record.tokens);
        }
    }

    #[test]
    fn test_unknown_tokens_map_to_unk() {
        let train = records("a###X");
        let batcher = batcher(&train, None);

        let infer = batcher.infer(&[Record::from_sentence("a zzz")]).unwrap();

        assert_eq!(
            infer.tokens.into_data().convert::<i64>().value,
            vec![batcher.vocabulary.token_id("a") as i64, UNK_ID as i64]
        );
    }

    #[test]
    fn test_token_targets() {
        let records = records("a###X b###Y c###X\nd###Y");
        let batcher = batcher(&records, None);

        let targets = batcher.token_targets(&records, 3).unwrap();

        assert_eq!(
            targets.into_data().convert::<i64>().value,
            vec![0, 1, 0, 1, 0, 0]
        );
    }

    #[test]
    fn test_sequence_targets() {
        let records = vec![
            Record::new(vec!["good".into()], Some(Labels::Sequence("4".into())), 1),
            Record::new(vec!["bad".into()], Some(Labels::Sequence("0".into())), 2),
            Record::new(vec!["fine".into()], Some(Labels::Sequence("4".into())), 3),
        ];
        let batcher = batcher(&records, None);

        let targets = batcher.sequence_targets(&records).unwrap();

        assert_eq!(targets.dims(), [3]);
        assert_eq!(targets.into_data().convert::<i64>().value, vec![0, 1, 0]);
    }

    #[test]
    fn test_truncation() {
        let records = records("a###X b###Y c###X\nd###Y");
        let batcher = batcher(&records, Some(2));

        let infer = batcher.infer(&records).unwrap();
        assert_eq!(infer.tokens.dims(), [2, 2]);
        assert_eq!(infer.lengths, vec![2, 1]);

        let targets = batcher.token_targets(&records, 2).unwrap();
        assert_eq!(targets.dims(), [2, 2]);
    }

    #[test]
    fn test_empty_records_become_padding_rows() {
        let records = vec![Record::new(vec![], None, 0), Record::new(vec![], None, 0)];
        let batcher = batcher(&records, None);

        let infer = batcher.infer(&records).unwrap();

        assert_eq!(infer.tokens.dims(), [2, 1]);
        assert_eq!(infer.mask.into_data().value, vec![false, false]);
    }

    #[test]
    fn test_errors() {
        let train = records("a###X b###Y");
        let batcher = batcher(&train, None);

        let err = batcher.infer(&[]).err().unwrap();
        assert!(matches!(err, Error::Shape { .. }));

        let unseen = records("\n\na###Z");
        let err = batcher.token_targets(&unseen, 1).err().unwrap();
        assert!(matches!(err, Error::Schema { line: 3, ref label } if label == "Z"));

        let mismatched = vec![Record::new(
            vec!["a".into(), "b".into()],
            Some(Labels::Tokens(vec!["X".into()])),
            7,
        )];
        let err = batcher.token_targets(&mismatched, 2).err().unwrap();
        assert!(matches!(err, Error::Shape { line: 7, .. }));

        let err = batcher.sequence_targets(&train).err().unwrap();
        assert!(matches!(err, Error::Shape { line: 1, .. }));
    }

    #[test]
    fn test_batch_indices() {
        let lengths = [5, 1, 3, 2, 4];

        assert_eq!(
            batch_indices(&lengths, 2, false),
            vec![vec![0, 1], vec![2, 3], vec![4]]
        );
        assert_eq!(
            batch_indices(&lengths, 2, true),
            vec![vec![1, 3], vec![2, 4], vec![0]]
        );
        assert!(batch_indices(&[], 4, true).is_empty());
    }
}
