use std::{fmt::Display, path::PathBuf};

use crate::pipelines::{text_classification, token_classification};

use super::datasets::Dataset;

/// Available Pipelines
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum Pipeline {
    /// Sentence classification
    TextClassification,

    /// Per-token classification
    TokenClassification,
}

impl Pipeline {
    /// Get the dataset used when none is given
    pub fn default_dataset(&self) -> Dataset {
        match self {
            Pipeline::TextClassification => Dataset::Sst,
            Pipeline::TokenClassification => Dataset::Pos,
        }
    }

    /// Make sure the dataset carries the kind of labels this pipeline learns
    pub fn check(&self, dataset: Dataset) -> Result<(), PipelineError> {
        if dataset == self.default_dataset() {
            Ok(())
        } else {
            Err(PipelineError::Unsupported {
                pipeline: *self,
                dataset,
            })
        }
    }

    /// Where a pipeline keeps its artifacts under the data directory
    pub fn artifact_dir(&self, data_dir: &str) -> PathBuf {
        PathBuf::from(format!("{}/{}", data_dir, self))
    }
}

impl TryFrom<&str> for Pipeline {
    type Error = PipelineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        if value == text_classification::PIPELINE {
            Ok(Pipeline::TextClassification)
        } else if value == token_classification::PIPELINE {
            Ok(Pipeline::TokenClassification)
        } else {
            Err(PipelineError::Unknown(value.to_string()))
        }
    }
}

impl Display for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Pipeline::TextClassification => text_classification::PIPELINE,
            Pipeline::TokenClassification => token_classification::PIPELINE,
        };

        write!(f, "{}", name)
    }
}

/// Pipeline Error
#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    /// No pipeline found for the given string
    #[error("no pipeline found for {0}")]
    Unknown(String),

    /// The dataset has the wrong kind of labels
    #[error("the {pipeline} pipeline cannot train on the {dataset} dataset")]
    Unsupported {
        /// The requested pipeline
        pipeline: Pipeline,

        /// The requested dataset
        dataset: Dataset,
    },
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_names_round_trip() {
        for pipeline in [Pipeline::TextClassification, Pipeline::TokenClassification] {
            assert_eq!(Pipeline::try_from(pipeline.to_string().as_str()).unwrap(), pipeline);
        }

        assert!(matches!(
            Pipeline::try_from("summarization"),
            Err(PipelineError::Unknown(_))
        ));
    }

    #[test]
    fn test_datasets() {
        let pipeline = Pipeline::TokenClassification;

        assert_eq!(pipeline.default_dataset(), Dataset::Pos);
        assert!(pipeline.check(Dataset::Pos).is_ok());

        let err = pipeline.check(Dataset::Sst).err().unwrap();
        assert_eq!(
            err.to_string(),
            "the token-classification pipeline cannot train on the sst dataset"
        );

        assert_eq!(
            Pipeline::TextClassification.artifact_dir("data"),
            PathBuf::from("data/text-classification")
        );
    }
}
