//! protoc plugin harness.
//!
//! protoc writes a `CodeGeneratorRequest` to the plugin's stdin and expects a
//! `CodeGeneratorResponse` on stdout. [`Request`] mirrors the request but keeps
//! each file as raw bytes: `prost_types` drops unknown fields, and custom
//! options are unknown fields until their extensions are registered.

use crate::batch::assemble;
use crate::error::{Error, Result};
use crate::model::DescriptorSet;
use crate::registry::ExtensionRegistry;
use prost::Message;
use prost_types::compiler::{code_generator_response, CodeGeneratorRequest, CodeGeneratorResponse};
use std::fmt;
use std::io::{Read, Write};

/// `CodeGeneratorResponse.Feature.FEATURE_PROTO3_OPTIONAL`
const FEATURE_PROTO3_OPTIONAL: u64 = 1;

/// Wire-compatible `CodeGeneratorRequest` with undecoded files.
#[derive(Clone, PartialEq, Message)]
pub struct Request {
    #[prost(string, repeated, tag = "1")]
    pub file_to_generate: Vec<String>,
    #[prost(string, optional, tag = "2")]
    pub parameter: Option<String>,
    #[prost(bytes = "vec", repeated, tag = "15")]
    pub proto_file: Vec<Vec<u8>>,
    #[prost(message, optional, tag = "3")]
    pub compiler_version: Option<prost_types::compiler::Version>,
}

impl Request {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::decode(bytes).map_err(|e| Error::decode("code generator request", e))
    }

    pub fn read_from(mut reader: impl Read) -> Result<Self> {
        let mut input = Vec::new();
        reader.read_to_end(&mut input)?;
        Self::from_bytes(&input)
    }

    /// Re-encodes a typed request. Extensions that the typed files no longer
    /// carry as unknown fields are lost.
    pub fn from_compiler_request(request: &CodeGeneratorRequest) -> Self {
        Self {
            file_to_generate: request.file_to_generate.clone(),
            parameter: request.parameter.clone(),
            proto_file: request.proto_file.iter().map(Message::encode_to_vec).collect(),
            compiler_version: request.compiler_version.clone(),
        }
    }

    pub fn parameters(&self) -> Parameters {
        Parameters::parse(self.parameter.as_deref().unwrap_or_default())
    }
}

// ============================================================================
// Parameters
// ============================================================================

/// The request's `parameter` string: comma-separated `key=value` pairs or
/// bare flags, e.g. `format=json,include_imports`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Parameters {
    entries: Vec<(String, Option<String>)>,
}

impl Parameters {
    pub fn parse(raw: &str) -> Self {
        let entries = raw
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| match part.split_once('=') {
                Some((key, value)) => (key.trim().to_string(), Some(value.trim().to_string())),
                None => (part.to_string(), None),
            })
            .collect();
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Value of the last `key=value` for `key`. Bare flags have no value.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .and_then(|(_, v)| v.as_deref())
    }

    /// True for a bare `key`, or `key=true` / `key=1`.
    pub fn flag(&self, key: &str) -> bool {
        match self.entries.iter().rev().find(|(k, _)| k == key) {
            Some((_, None)) => true,
            Some((_, Some(v))) => matches!(v.as_str(), "true" | "1" | "yes"),
            None => false,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_deref()))
    }
}

impl fmt::Display for Parameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (key, value)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            match value {
                Some(value) => write!(f, "{key}={value}")?,
                None => f.write_str(key)?,
            }
        }
        Ok(())
    }
}

// ============================================================================
// Generators
// ============================================================================

pub type GeneratedFile = code_generator_response::File;

/// A code generator driven by an assembled tree.
pub trait Generator {
    type Error: fmt::Display;

    fn generate(
        &self,
        set: &DescriptorSet,
        parameters: &Parameters,
    ) -> std::result::Result<Vec<GeneratedFile>, Self::Error>;
}

/// Runs `generator` over `request` and builds the response.
///
/// Generator failures are reported in the response's `error` field, which is
/// how protoc expects plugins to reject their input.
pub fn respond<G: Generator>(
    generator: &G,
    set: &DescriptorSet,
    parameters: &Parameters,
) -> CodeGeneratorResponse {
    let mut response = CodeGeneratorResponse {
        supported_features: Some(FEATURE_PROTO3_OPTIONAL),
        ..Default::default()
    };
    match generator.generate(set, parameters) {
        Ok(files) => response.file = files,
        Err(err) => {
            tracing::warn!(error = %err, "generator rejected the request");
            response.error = Some(err.to_string());
        }
    }
    response
}

/// Reads a request from `reader`, assembles it with a fresh registry, and
/// writes the generator's response to `writer`. Returns the assembled tree.
pub fn run<R: Read, W: Write, G: Generator>(
    reader: R,
    mut writer: W,
    generator: &G,
) -> Result<DescriptorSet> {
    let request = Request::read_from(reader)?;
    let parameters = request.parameters();
    tracing::debug!(
        files = request.proto_file.len(),
        to_generate = request.file_to_generate.len(),
        parameters = %parameters,
        "read code generator request"
    );

    let mut registry = ExtensionRegistry::new();
    let set = assemble(&request, &mut registry)?;

    let response = respond(generator, &set, &parameters);
    writer.write_all(&response.encode_to_vec())?;
    writer.flush()?;
    Ok(set)
}
