use crate::format::MetadataFormat;
use camino::Utf8PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("cannot infer metadata format from `{path}` (expected .plist, .json, .yaml, .yml or .toml)")]
    UnknownFormat { path: Utf8PathBuf },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("parse {format} metadata: {message}")]
    Parse {
        format: MetadataFormat,
        message: String,
    },

    #[error("write {format} metadata: {message}")]
    Serialize {
        format: MetadataFormat,
        message: String,
    },

    /// The value has no representation in the target format (plist data, dates, nulls).
    #[error("{format} metadata cannot represent {what}")]
    Unsupported {
        format: MetadataFormat,
        what: &'static str,
    },
}

impl MetadataError {
    pub(crate) fn parse(format: MetadataFormat, err: impl std::fmt::Display) -> Self {
        Self::Parse {
            format,
            message: err.to_string(),
        }
    }

    pub(crate) fn serialize(format: MetadataFormat, err: impl std::fmt::Display) -> Self {
        Self::Serialize {
            format,
            message: err.to_string(),
        }
    }
}

pub type MetadataResult<T> = Result<T, MetadataError>;
