//! Errors produced while decoding a request or assembling a descriptor tree.

use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to decode {what}: {source}")]
    Decode {
        what: String,
        #[source]
        source: prost::DecodeError,
    },

    #[error("descriptor pool has no `{0}` type; is google/protobuf/descriptor.proto loaded?")]
    MissingDescriptorSchema(String),

    #[error("failed to register descriptors: {0}")]
    Registration(#[from] prost_reflect::DescriptorError),

    #[error("extension `{name}` is already registered (declared again in `{file}`)")]
    DuplicateExtension { name: String, file: String },

    #[error("file `{0}` is already registered with different contents")]
    ConflictingFile(String),

    #[error("file `{0}` appears more than once in the batch")]
    DuplicateFile(String),

    #[error("`{file}` depends on `{dependency}`, which is not part of the batch")]
    MissingDependency { file: String, dependency: String },

    #[error("`{file}` lists public dependency index {index}, but only has {len} dependencies")]
    InvalidPublicDependency { file: String, index: i32, len: usize },

    #[error("file to generate `{0}` is not part of the batch")]
    UnknownFileToGenerate(String),

    #[error("plugin I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn decode(what: impl Into<String>, source: prost::DecodeError) -> Self {
        Error::Decode {
            what: what.into(),
            source,
        }
    }

    /// Whether the error means the batch itself is inconsistent, as opposed to
    /// bytes that could not be decoded.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            Error::Decode { .. } | Error::MissingDescriptorSchema(_) | Error::Io(_)
        )
    }
}
