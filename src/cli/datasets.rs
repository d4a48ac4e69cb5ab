use std::{fmt::Display, path::PathBuf};

use crate::datasets::{sst, tagging};

/// The Dataset enum
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum Dataset {
    /// `token###label` part-of-speech corpus
    Pos,

    /// Bracketed sentiment trees
    Sst,
}

impl Dataset {
    /// The corpus file for a split (e.g., "train" or "valid")
    pub fn path(&self, data_dir: &str, mode: &str) -> PathBuf {
        PathBuf::from(format!("{}/datasets/{}/{}.txt", data_dir, self, mode))
    }
}

impl TryFrom<&str> for Dataset {
    type Error = DatasetError;

    /// Try to convert a string to a Dataset
    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let value = value.to_lowercase();

        if value == tagging::DATASET {
            Ok(Dataset::Pos)
        } else if value == sst::DATASET {
            Ok(Dataset::Sst)
        } else {
            Err(Self::Error::Unknown(value))
        }
    }
}

impl Display for Dataset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Dataset::Pos => tagging::DATASET,
            Dataset::Sst => sst::DATASET,
        };

        write!(f, "{}", name)
    }
}

/// Dataset Error
#[derive(thiserror::Error, Debug)]
pub enum DatasetError {
    /// No dataset found for the given string
    #[error("no dataset found for {0}")]
    Unknown(String),
}
