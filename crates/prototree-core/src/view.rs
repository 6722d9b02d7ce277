//! Borrowed views over a [`DescriptorSet`].
//!
//! A view pairs the arena with one id. It dereferences to the entity's data
//! and adds navigation: children, parents, owning file, lookups by name.
//! Lookups accept the simple name, the long name, or the full name and
//! return `None` when nothing matches.

use crate::comments::Comment;
use crate::model::{
    Common, DescriptorSet, Enum, EnumId, EnumValue, EnumValueId, Extension, ExtensionId, Field,
    FieldId, File, FileId, Import, Message, MessageId, Method, MethodId, Service, ServiceId,
};
use crate::options::OptionExtensions;
use std::fmt;
use std::ops::Deref;

macro_rules! entity_ref {
    ($($(#[$meta:meta])* $view:ident => $data:ident, $id:ident, $arena:ident;)*) => {
        $(
            $(#[$meta])*
            #[derive(Clone, Copy)]
            pub struct $view<'a> {
                set: &'a DescriptorSet,
                id: $id,
            }

            impl<'a> $view<'a> {
                pub fn id(&self) -> $id {
                    self.id
                }

                pub fn set(&self) -> &'a DescriptorSet {
                    self.set
                }

                pub fn data(&self) -> &'a $data {
                    &self.set.$arena[self.id.0]
                }
            }

            impl Deref for $view<'_> {
                type Target = $data;

                fn deref(&self) -> &$data {
                    self.data()
                }
            }

            impl PartialEq for $view<'_> {
                fn eq(&self, other: &Self) -> bool {
                    std::ptr::eq(self.set, other.set) && self.id == other.id
                }
            }

            impl Eq for $view<'_> {}
        )*
    };
}

entity_ref! {
    FileRef => File, FileId, files;
    MessageRef => Message, MessageId, messages;
    EnumRef => Enum, EnumId, enums;
    EnumValueRef => EnumValue, EnumValueId, enum_values;
    ExtensionRef => Extension, ExtensionId, extensions;
    FieldRef => Field, FieldId, fields;
    ServiceRef => Service, ServiceId, services;
    MethodRef => Method, MethodId, methods;
}

macro_rules! in_file {
    ($($view:ident),* $(,)?) => {
        $(
            impl<'a> $view<'a> {
                pub fn file(&self) -> FileRef<'a> {
                    self.set.file(self.data().common.file)
                }

                pub fn is_proto3(&self) -> bool {
                    self.file().is_proto3()
                }

                pub fn common(&self) -> &'a Common {
                    &self.data().common
                }

                pub fn name(&self) -> &'a str {
                    self.data().proto.name()
                }

                pub fn long_name(&self) -> &'a str {
                    self.data().common.long_name()
                }

                pub fn full_name(&self) -> &'a str {
                    self.data().common.full_name()
                }

                pub fn comments(&self) -> &'a Comment {
                    &self.data().comments
                }

                pub fn option_extensions(&self) -> &'a OptionExtensions {
                    self.data().common.option_extensions()
                }
            }

            impl fmt::Debug for $view<'_> {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.debug_struct(stringify!($view))
                        .field("id", &self.id)
                        .field("full_name", &self.full_name())
                        .finish()
                }
            }
        )*
    };
}

in_file!(MessageRef, EnumRef, EnumValueRef, ExtensionRef, FieldRef, ServiceRef, MethodRef);

fn named(common: &Common, local: &str, name: &str) -> bool {
    local == name || common.long_name() == name || common.full_name() == name
}

// ============================================================================
// DescriptorSet
// ============================================================================

impl DescriptorSet {
    /// Files in name order.
    pub fn files(&self) -> impl ExactSizeIterator<Item = FileRef<'_>> + '_ {
        (0..self.files.len()).map(move |i| self.file(FileId(i)))
    }

    pub fn files_to_generate(&self) -> impl Iterator<Item = FileRef<'_>> + '_ {
        self.files().filter(|f| f.is_file_to_generate())
    }

    pub fn file(&self, id: FileId) -> FileRef<'_> {
        FileRef { set: self, id }
    }

    pub fn file_by_name(&self, name: &str) -> Option<FileRef<'_>> {
        self.files_by_name.get(name).map(|&id| self.file(id))
    }

    pub fn message(&self, id: MessageId) -> MessageRef<'_> {
        MessageRef { set: self, id }
    }

    pub fn enum_type(&self, id: EnumId) -> EnumRef<'_> {
        EnumRef { set: self, id }
    }

    pub fn enum_value(&self, id: EnumValueId) -> EnumValueRef<'_> {
        EnumValueRef { set: self, id }
    }

    pub fn extension(&self, id: ExtensionId) -> ExtensionRef<'_> {
        ExtensionRef { set: self, id }
    }

    pub fn field(&self, id: FieldId) -> FieldRef<'_> {
        FieldRef { set: self, id }
    }

    pub fn service(&self, id: ServiceId) -> ServiceRef<'_> {
        ServiceRef { set: self, id }
    }

    pub fn method(&self, id: MethodId) -> MethodRef<'_> {
        MethodRef { set: self, id }
    }

    /// Any message of the batch, by full name (`.pkg.Outer.Inner`).
    pub fn find_message(&self, full_name: &str) -> Option<MessageRef<'_>> {
        self.message_id_by_full_name(full_name)
            .map(|id| self.message(id))
    }
}

// ============================================================================
// Files
// ============================================================================

impl<'a> FileRef<'a> {
    pub fn name(&self) -> &'a str {
        self.data().name()
    }

    pub fn package(&self) -> &'a str {
        self.data().package()
    }

    pub fn enums(&self) -> impl ExactSizeIterator<Item = EnumRef<'a>> + 'a {
        let set = self.set;
        self.data().enums.iter().map(move |&id| set.enum_type(id))
    }

    pub fn extensions(&self) -> impl ExactSizeIterator<Item = ExtensionRef<'a>> + 'a {
        let set = self.set;
        self.data().extensions.iter().map(move |&id| set.extension(id))
    }

    pub fn messages(&self) -> impl ExactSizeIterator<Item = MessageRef<'a>> + 'a {
        let set = self.set;
        self.data().messages.iter().map(move |&id| set.message(id))
    }

    pub fn services(&self) -> impl ExactSizeIterator<Item = ServiceRef<'a>> + 'a {
        let set = self.set;
        self.data().services.iter().map(move |&id| set.service(id))
    }

    pub fn imports(&self) -> impl ExactSizeIterator<Item = ImportRef<'a>> + 'a {
        let set = self.set;
        self.data()
            .imports
            .iter()
            .map(move |&import| ImportRef { set, import })
    }

    pub fn dependencies(&self) -> impl ExactSizeIterator<Item = FileRef<'a>> + 'a {
        let set = self.set;
        self.data().dependencies.iter().map(move |&id| set.file(id))
    }

    pub fn public_dependencies(&self) -> impl ExactSizeIterator<Item = FileRef<'a>> + 'a {
        let set = self.set;
        self.data()
            .public_dependencies
            .iter()
            .map(move |&id| set.file(id))
    }

    pub fn find_enum(&self, name: &str) -> Option<EnumRef<'a>> {
        self.enums().find(|e| named(&e.common, e.name(), name))
    }

    pub fn find_extension(&self, name: &str) -> Option<ExtensionRef<'a>> {
        self.extensions().find(|e| named(&e.common, e.name(), name))
    }

    pub fn find_message(&self, name: &str) -> Option<MessageRef<'a>> {
        self.messages().find(|m| named(&m.common, m.name(), name))
    }

    pub fn find_service(&self, name: &str) -> Option<ServiceRef<'a>> {
        self.services().find(|s| named(&s.common, s.name(), name))
    }
}

impl fmt::Debug for FileRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileRef")
            .field("id", &self.id)
            .field("name", &self.name())
            .finish()
    }
}

// ============================================================================
// Messages, enums, services
// ============================================================================

impl<'a> MessageRef<'a> {
    /// Enclosing message, `None` at the top level.
    pub fn parent(&self) -> Option<MessageRef<'a>> {
        self.data().parent.map(|id| self.set.message(id))
    }

    pub fn enums(&self) -> impl ExactSizeIterator<Item = EnumRef<'a>> + 'a {
        let set = self.set;
        self.data().enums.iter().map(move |&id| set.enum_type(id))
    }

    pub fn extensions(&self) -> impl ExactSizeIterator<Item = ExtensionRef<'a>> + 'a {
        let set = self.set;
        self.data().extensions.iter().map(move |&id| set.extension(id))
    }

    pub fn fields(&self) -> impl ExactSizeIterator<Item = FieldRef<'a>> + 'a {
        let set = self.set;
        self.data().fields.iter().map(move |&id| set.field(id))
    }

    pub fn messages(&self) -> impl ExactSizeIterator<Item = MessageRef<'a>> + 'a {
        let set = self.set;
        self.data().messages.iter().map(move |&id| set.message(id))
    }

    pub fn find_enum(&self, name: &str) -> Option<EnumRef<'a>> {
        self.enums().find(|e| named(&e.common, e.name(), name))
    }

    pub fn find_extension(&self, name: &str) -> Option<ExtensionRef<'a>> {
        self.extensions().find(|e| named(&e.common, e.name(), name))
    }

    pub fn find_field(&self, name: &str) -> Option<FieldRef<'a>> {
        self.fields().find(|f| named(&f.common, f.name(), name))
    }

    pub fn find_message(&self, name: &str) -> Option<MessageRef<'a>> {
        self.messages().find(|m| named(&m.common, m.name(), name))
    }
}

impl<'a> EnumRef<'a> {
    pub fn parent(&self) -> Option<MessageRef<'a>> {
        self.data().parent.map(|id| self.set.message(id))
    }

    pub fn values(&self) -> impl ExactSizeIterator<Item = EnumValueRef<'a>> + 'a {
        let set = self.set;
        self.data().values.iter().map(move |&id| set.enum_value(id))
    }

    pub fn find_value(&self, name: &str) -> Option<EnumValueRef<'a>> {
        self.values().find(|v| named(&v.common, v.name(), name))
    }
}

impl<'a> EnumValueRef<'a> {
    pub fn enum_type(&self) -> EnumRef<'a> {
        self.set.enum_type(self.data().enum_id)
    }
}

impl<'a> ExtensionRef<'a> {
    /// Message the extension is declared in, `None` for file-level extensions.
    pub fn parent(&self) -> Option<MessageRef<'a>> {
        self.data().parent.map(|id| self.set.message(id))
    }
}

impl<'a> FieldRef<'a> {
    pub fn message(&self) -> MessageRef<'a> {
        self.set.message(self.data().message)
    }
}

impl<'a> ServiceRef<'a> {
    pub fn methods(&self) -> impl ExactSizeIterator<Item = MethodRef<'a>> + 'a {
        let set = self.set;
        self.data().methods.iter().map(move |&id| set.method(id))
    }

    pub fn find_method(&self, name: &str) -> Option<MethodRef<'a>> {
        self.methods().find(|m| named(&m.common, m.name(), name))
    }
}

impl<'a> MethodRef<'a> {
    pub fn service(&self) -> ServiceRef<'a> {
        self.set.service(self.data().service)
    }

    /// Request message, when it is defined somewhere in the batch.
    pub fn input(&self) -> Option<MessageRef<'a>> {
        self.data().input.map(|id| self.set.message(id))
    }

    /// Response message, when it is defined somewhere in the batch.
    pub fn output(&self) -> Option<MessageRef<'a>> {
        self.data().output.map(|id| self.set.message(id))
    }
}

// ============================================================================
// Imports
// ============================================================================

/// One entry of a file's import list. Naming and options are those of the
/// imported entity itself.
#[derive(Clone, Copy)]
pub struct ImportRef<'a> {
    set: &'a DescriptorSet,
    import: Import,
}

impl<'a> ImportRef<'a> {
    pub fn import(&self) -> Import {
        self.import
    }

    pub fn common(&self) -> &'a Common {
        match self.import {
            Import::Message(id) => &self.set.messages[id.0].common,
            Import::Enum(id) => &self.set.enums[id.0].common,
            Import::Extension(id) => &self.set.extensions[id.0].common,
        }
    }

    pub fn long_name(&self) -> &'a str {
        self.common().long_name()
    }

    pub fn full_name(&self) -> &'a str {
        self.common().full_name()
    }

    /// File the imported entity is defined in.
    pub fn file(&self) -> FileRef<'a> {
        self.set.file(self.common().file_id())
    }

    pub fn as_message(&self) -> Option<MessageRef<'a>> {
        match self.import {
            Import::Message(id) => Some(self.set.message(id)),
            _ => None,
        }
    }

    pub fn as_enum(&self) -> Option<EnumRef<'a>> {
        match self.import {
            Import::Enum(id) => Some(self.set.enum_type(id)),
            _ => None,
        }
    }

    pub fn as_extension(&self) -> Option<ExtensionRef<'a>> {
        match self.import {
            Import::Extension(id) => Some(self.set.extension(id)),
            _ => None,
        }
    }
}

impl fmt::Debug for ImportRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImportRef")
            .field("import", &self.import)
            .field("full_name", &self.full_name())
            .finish()
    }
}
