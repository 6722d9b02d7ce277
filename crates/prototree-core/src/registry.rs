//! Extension registry.
//!
//! Custom options are extension fields on `google.protobuf.*Options`. They can
//! only be decoded once their declaring files are known, so a batch first
//! registers every file it carries, then re-decodes each file against the
//! registry's pool. The registry is an ordinary value owned by the caller:
//! two batches never share one unless the caller passes the same registry.

use crate::error::{Error, Result};
use prost_reflect::{
    DescriptorPool, DynamicMessage, ExtensionDescriptor, FileDescriptor, MessageDescriptor,
};
use prost_types::FileDescriptorProto;
use std::collections::{BTreeMap, HashMap, HashSet};

const FILE_DESCRIPTOR_PROTO: &str = "google.protobuf.FileDescriptorProto";
const DESCRIPTOR_FILE: &str = "google/protobuf/descriptor.proto";

#[derive(Debug, Clone)]
pub struct ExtensionRegistry {
    pool: DescriptorPool,
    extensions: BTreeMap<String, ExtensionDescriptor>,
    registered: HashMap<String, FileDescriptorProto>,
}

impl Default for ExtensionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ExtensionRegistry {
    /// Registry seeded with the well-known `google.protobuf` files.
    pub fn new() -> Self {
        let mut pool = DescriptorPool::global();
        if pool.get_message_by_name(FILE_DESCRIPTOR_PROTO).is_none() {
            // Referencing descriptor.proto pulls the well-known files into the pool.
            let bootstrap = FileDescriptorProto {
                name: Some("prototree/bootstrap.proto".to_string()),
                dependency: vec![DESCRIPTOR_FILE.to_string()],
                ..Default::default()
            };
            if let Err(err) = pool.add_file_descriptor_proto(bootstrap) {
                tracing::warn!(error = %err, "descriptor.proto is not available");
            }
        }
        Self::with_pool(pool)
    }

    /// Registry over an existing pool. Extensions already in `pool` are not
    /// registered; only files added through [`register_files`] contribute.
    ///
    /// [`register_files`]: ExtensionRegistry::register_files
    pub fn with_pool(pool: DescriptorPool) -> Self {
        Self {
            pool,
            extensions: BTreeMap::new(),
            registered: HashMap::new(),
        }
    }

    pub fn pool(&self) -> &DescriptorPool {
        &self.pool
    }

    /// Adds the files that the pool does not know yet and registers every
    /// extension they declare, nested ones included. Returns the number of
    /// extensions registered.
    ///
    /// A file added by an earlier call is skipped only when it arrives with
    /// the same declarations; a different file under the same name is an
    /// error. Files the seed pool provides, like the well-known
    /// `google/protobuf` ones, are always kept as they are.
    pub fn register_files(&mut self, files: &[FileDescriptorProto]) -> Result<usize> {
        let mut seen = HashSet::new();
        let mut fresh = Vec::new();
        for file in files {
            if let Some(known) = self.registered.get(file.name()) {
                if *known != declarations(file) {
                    return Err(Error::ConflictingFile(file.name().to_string()));
                }
                continue;
            }
            if self.pool.get_file_by_name(file.name()).is_some() {
                continue;
            }
            if seen.insert(file.name().to_string()) {
                fresh.push(file.clone());
            }
        }
        if fresh.is_empty() {
            return Ok(0);
        }

        let names: Vec<String> = fresh.iter().map(|f| f.name().to_string()).collect();
        let kept: Vec<FileDescriptorProto> = fresh.iter().map(declarations).collect();
        self.pool.add_file_descriptor_protos(fresh)?;
        self.registered.extend(names.iter().cloned().zip(kept));

        let mut registered = 0;
        for name in &names {
            let Some(file) = self.pool.get_file_by_name(name) else {
                continue;
            };
            for extension in file_extensions(&file) {
                self.register_extension(extension)?;
                registered += 1;
            }
        }

        tracing::debug!(
            files = names.len(),
            extensions = registered,
            "registered batch descriptors"
        );
        Ok(registered)
    }

    /// Registers one extension. A second registration of the same full name
    /// is rejected.
    pub fn register_extension(&mut self, extension: ExtensionDescriptor) -> Result<()> {
        let name = extension.full_name().to_string();
        if self.extensions.contains_key(&name) {
            return Err(Error::DuplicateExtension {
                name,
                file: extension.parent_file().name().to_string(),
            });
        }
        self.extensions.insert(name, extension);
        Ok(())
    }

    /// Registered extensions in full-name order.
    pub fn extensions(&self) -> impl Iterator<Item = &ExtensionDescriptor> {
        self.extensions.values()
    }

    /// Looks up a registered extension; accepts names with or without the leading dot.
    pub fn extension(&self, full_name: &str) -> Option<&ExtensionDescriptor> {
        self.extensions.get(crate::naming::reflect_name(full_name))
    }

    pub fn file(&self, name: &str) -> Option<FileDescriptor> {
        self.pool.get_file_by_name(name)
    }

    /// Decodes a serialized `FileDescriptorProto` as a dynamic message, so
    /// that option fields carry every registered extension.
    pub fn decode_file(&self, bytes: &[u8]) -> Result<DynamicMessage> {
        let desc = self.file_descriptor_proto_type()?;
        DynamicMessage::decode(desc, bytes).map_err(|e| Error::decode("file descriptor", e))
    }

    fn file_descriptor_proto_type(&self) -> Result<MessageDescriptor> {
        self.pool
            .get_message_by_name(FILE_DESCRIPTOR_PROTO)
            .ok_or_else(|| Error::MissingDescriptorSchema(FILE_DESCRIPTOR_PROTO.to_string()))
    }
}

fn file_extensions(file: &FileDescriptor) -> Vec<ExtensionDescriptor> {
    let mut out: Vec<ExtensionDescriptor> = file.extensions().collect();
    let mut stack: Vec<MessageDescriptor> = file.messages().collect();
    while let Some(message) = stack.pop() {
        out.extend(message.child_extensions());
        stack.extend(message.child_messages());
    }
    out
}

/// The file without source info, which only carries comments and spans.
fn declarations(file: &FileDescriptorProto) -> FileDescriptorProto {
    FileDescriptorProto {
        source_code_info: None,
        ..file.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{message, options_file, top_level_file};
    use prost_reflect::ReflectMessage;

    #[test]
    fn registers_top_level_and_nested_extensions() {
        let mut registry = ExtensionRegistry::new();
        let count = registry
            .register_files(&[options_file()])
            .expect("register");
        assert_eq!(count, 2);
        assert!(registry.extension(".acme.label").is_some());
        assert!(registry.extension("acme.Holder.weight").is_some());
    }

    #[test]
    fn known_files_are_skipped() {
        let mut registry = ExtensionRegistry::new();
        registry.register_files(&[options_file()]).expect("first");
        let again = registry.register_files(&[options_file()]).expect("second");
        assert_eq!(again, 0);
    }

    #[test]
    fn same_name_with_new_contents_is_rejected() {
        let mut registry = ExtensionRegistry::new();
        let first = top_level_file("a.proto", "a", vec![message("M", vec![])]);
        registry.register_files(&[first]).expect("first");

        let second = top_level_file("a.proto", "a", vec![message("Other", vec![])]);
        let err = registry.register_files(&[second]).expect_err("stale file");
        assert!(matches!(err, Error::ConflictingFile(ref name) if name == "a.proto"));
        assert!(err.is_fatal());
        assert!(registry.pool().get_message_by_name("a.M").is_some());
        assert!(registry.pool().get_message_by_name("a.Other").is_none());
    }

    #[test]
    fn comment_only_changes_are_not_conflicts() {
        let mut registry = ExtensionRegistry::new();
        let first = top_level_file("a.proto", "a", vec![message("M", vec![])]);
        registry.register_files(&[first.clone()]).expect("first");

        let commented = FileDescriptorProto {
            source_code_info: Some(prost_types::SourceCodeInfo {
                location: vec![prost_types::source_code_info::Location {
                    path: vec![4, 0],
                    leading_comments: Some(" M.\n".to_string()),
                    ..Default::default()
                }],
            }),
            ..first
        };
        assert_eq!(registry.register_files(&[commented]).expect("second"), 0);
    }

    #[test]
    fn seeded_well_known_files_are_kept() {
        let mut registry = ExtensionRegistry::new();
        let mut newer = crate::testing::descriptor_proto();
        newer.message_type.push(message("FromANewerCompiler", vec![]));
        assert_eq!(registry.register_files(&[newer]).expect("skipped"), 0);
        assert!(registry
            .pool()
            .get_message_by_name("google.protobuf.FromANewerCompiler")
            .is_none());
    }

    #[test]
    fn duplicate_extension_is_rejected() {
        let mut registry = ExtensionRegistry::new();
        registry.register_files(&[options_file()]).expect("register");
        let ext = registry.extension("acme.label").cloned().expect("label");
        let err = registry.register_extension(ext).expect_err("duplicate");
        assert!(matches!(err, Error::DuplicateExtension { ref name, .. } if name == "acme.label"));
        assert!(err.is_fatal());
    }

    #[test]
    fn knows_the_descriptor_schema() {
        let registry = ExtensionRegistry::new();
        assert!(registry.file(DESCRIPTOR_FILE).is_some());
        assert!(registry.pool().get_message_by_name(FILE_DESCRIPTOR_PROTO).is_some());
    }

    #[test]
    fn decodes_files_against_the_pool() {
        let registry = ExtensionRegistry::new();
        let file = FileDescriptorProto {
            name: Some("x.proto".to_string()),
            package: Some("x".to_string()),
            ..Default::default()
        };
        let message = registry
            .decode_file(&prost::Message::encode_to_vec(&file))
            .expect("decode");
        assert_eq!(message.descriptor().full_name(), FILE_DESCRIPTOR_PROTO);
    }
}
