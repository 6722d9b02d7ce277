//! Batch driver.
//!
//! ```text
//! Registering ──► Building ──► Linking ──► Marking ──► Done
//!  extensions      one file     deps,       files to     files in
//!  into the        at a time    methods,    generate     name order
//!  registry                     imports
//! ```
//!
//! Each phase runs once. Any failure aborts the batch; no partially linked
//! tree is ever returned.

use crate::builder::FileBuilder;
use crate::error::{Error, Result};
use crate::imports::resolve_imports;
use crate::model::{DescriptorSet, FileId, MessageId};
use crate::plugin::Request;
use crate::registry::ExtensionRegistry;
use prost::Message as _;
use prost_types::FileDescriptorProto;
use std::collections::{HashMap, HashSet};

/// Assembles every file of `request` against `registry`.
///
/// The raw bytes of each file are decoded twice: once into the prost types
/// that drive the structure, and once, after the batch's extensions are
/// registered, into a dynamic message whose options carry those extensions.
pub fn assemble(request: &Request, registry: &mut ExtensionRegistry) -> Result<DescriptorSet> {
    let mut entries = Vec::with_capacity(request.proto_file.len());
    for (i, bytes) in request.proto_file.iter().enumerate() {
        let proto = FileDescriptorProto::decode(bytes.as_slice())
            .map_err(|e| Error::decode(format!("proto_file[{i}]"), e))?;
        entries.push((proto, bytes.as_slice()));
    }
    assemble_entries(entries, &request.file_to_generate, registry)
}

/// Assembles already-decoded descriptors.
///
/// prost drops unknown fields, so custom options survive only if they were
/// still present when `files` were decoded. Prefer [`assemble`] on raw bytes.
pub fn assemble_files(
    files: &[FileDescriptorProto],
    file_to_generate: &[String],
    registry: &mut ExtensionRegistry,
) -> Result<DescriptorSet> {
    let encoded: Vec<Vec<u8>> = files.iter().map(|f| f.encode_to_vec()).collect();
    let entries = files
        .iter()
        .cloned()
        .zip(encoded.iter().map(Vec::as_slice))
        .collect();
    assemble_entries(entries, file_to_generate, registry)
}

fn assemble_entries(
    mut entries: Vec<(FileDescriptorProto, &[u8])>,
    file_to_generate: &[String],
    registry: &mut ExtensionRegistry,
) -> Result<DescriptorSet> {
    let mut names = HashSet::new();
    for (proto, _) in &entries {
        if !names.insert(proto.name()) {
            return Err(Error::DuplicateFile(proto.name().to_string()));
        }
    }
    entries.sort_by(|(a, _), (b, _)| a.name().cmp(b.name()));
    let protos: Vec<FileDescriptorProto> = entries.iter().map(|(p, _)| p.clone()).collect();

    // Dependencies must resolve before anything reaches the pool.
    let links = link_dependencies(&protos)?;

    // Registering
    registry.register_files(&protos)?;

    // Building
    let mut set = DescriptorSet::default();
    for (proto, bytes) in entries {
        let raw = registry.decode_file(bytes)?;
        FileBuilder::new(&mut set, registry, Some(raw)).build(proto);
    }

    // Linking
    for (file, links) in set.files.iter_mut().zip(links) {
        file.dependencies = links.dependencies;
        file.public_dependencies = links.public_dependencies;
    }
    resolve_methods(&mut set);
    resolve_imports(&mut set);

    // Marking
    for name in file_to_generate {
        let id = set
            .files_by_name
            .get(name)
            .copied()
            .ok_or_else(|| Error::UnknownFileToGenerate(name.clone()))?;
        set.files[id.0].is_file_to_generate = true;
    }

    tracing::info!(
        files = set.files.len(),
        to_generate = file_to_generate.len(),
        messages = set.messages.len(),
        enums = set.enums.len(),
        services = set.services.len(),
        extensions = set.extensions.len(),
        "assembled descriptor batch"
    );
    Ok(set)
}

struct Links {
    dependencies: Vec<FileId>,
    public_dependencies: Vec<FileId>,
}

/// Resolves dependency names against the name-sorted batch. File ids are
/// positions in that order.
fn link_dependencies(protos: &[FileDescriptorProto]) -> Result<Vec<Links>> {
    let ids: HashMap<&str, FileId> = protos
        .iter()
        .enumerate()
        .map(|(i, p)| (p.name(), FileId(i)))
        .collect();

    protos
        .iter()
        .map(|file| {
            let dependencies = file
                .dependency
                .iter()
                .map(|name| {
                    ids.get(name.as_str())
                        .copied()
                        .ok_or_else(|| Error::MissingDependency {
                            file: file.name().to_string(),
                            dependency: name.clone(),
                        })
                })
                .collect::<Result<Vec<_>>>()?;

            let public_dependencies = file
                .public_dependency
                .iter()
                .map(|&index| {
                    usize::try_from(index)
                        .ok()
                        .and_then(|i| dependencies.get(i))
                        .copied()
                        .ok_or_else(|| Error::InvalidPublicDependency {
                            file: file.name().to_string(),
                            index,
                            len: dependencies.len(),
                        })
                })
                .collect::<Result<Vec<_>>>()?;

            Ok(Links {
                dependencies,
                public_dependencies,
            })
        })
        .collect()
}

/// Resolves method input/output types by full name across the whole batch.
///
/// Full names are unique in a well-formed batch, so one batch-wide index
/// covers the declaring file (nested messages included) and its dependencies.
fn resolve_methods(set: &mut DescriptorSet) {
    for i in 0..set.methods.len() {
        let method = &set.methods[i];
        let input = lookup_message(set, method.input_type());
        let output = lookup_message(set, method.output_type());

        for (kind, name, found) in [
            ("input", method.input_type(), input),
            ("output", method.output_type(), output),
        ] {
            if found.is_none() {
                tracing::warn!(
                    method = %method.full_name(),
                    kind,
                    type_name = %name,
                    "method type is not defined in the batch"
                );
            }
        }

        let method = &mut set.methods[i];
        method.input = input;
        method.output = output;
    }
}

fn lookup_message(set: &DescriptorSet, type_name: &str) -> Option<MessageId> {
    if type_name.starts_with('.') {
        set.message_id_by_full_name(type_name)
    } else {
        set.message_id_by_full_name(&format!(".{type_name}"))
    }
}
