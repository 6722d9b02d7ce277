//! Cross-file import flattening.

use crate::model::{DescriptorSet, FileId, Import, MessageId};

/// Entities a file consumes from its direct dependencies, in dependency order.
///
/// Per dependency: every message, nested ones right after their parent and
/// map entries skipped at any depth, then top-level enums, then top-level
/// extensions, each in declaration order.
pub(crate) fn flatten_imports(set: &DescriptorSet, file: FileId) -> Vec<Import> {
    let mut imports = Vec::new();
    for &dependency in &set.files[file.0].dependencies {
        let dep = &set.files[dependency.0];

        for &id in &dep.messages {
            push_messages(set, id, &mut imports);
        }
        imports.extend(dep.enums.iter().map(|&id| Import::Enum(id)));
        imports.extend(dep.extensions.iter().map(|&id| Import::Extension(id)));
    }
    imports
}

fn push_messages(set: &DescriptorSet, id: MessageId, imports: &mut Vec<Import>) {
    let message = &set.messages[id.0];
    if message.is_map_entry() {
        return;
    }
    imports.push(Import::Message(id));
    for &nested in &message.messages {
        push_messages(set, nested, imports);
    }
}

/// Resolves every file's import list once dependencies are linked.
pub(crate) fn resolve_imports(set: &mut DescriptorSet) {
    for i in 0..set.files.len() {
        let imports = flatten_imports(set, FileId(i));
        tracing::debug!(
            file = %set.files[i].name(),
            imports = imports.len(),
            "flattened imports"
        );
        set.files[i].imports = imports;
    }
}
