//! The assembled descriptor tree.
//!
//! Every entity of a batch lives in one arena, [`DescriptorSet`], grouped by
//! kind. Ownership is strictly tree-shaped through id lists (a message lists
//! its nested messages); back-references (parent message, owning enum,
//! dependency files) are plain ids as well. Navigation goes through the
//! borrowed views in [`crate::view`].
//!
//! Each entity keeps the prost descriptor it was built from, minus the
//! repeated child lists, which have been moved into the tree.

use crate::comments::{Comment, LocationPath};
use crate::naming::make_name;
use crate::options::OptionExtensions;
use prost_types::{
    DescriptorProto, EnumDescriptorProto, EnumValueDescriptorProto, FieldDescriptorProto,
    FileDescriptorProto, MethodDescriptorProto, ServiceDescriptorProto,
};
use std::collections::HashMap;

macro_rules! entity_id {
    ($($(#[$meta:meta])* $name:ident),* $(,)?) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
            pub struct $name(pub(crate) usize);

            impl $name {
                pub fn index(self) -> usize {
                    self.0
                }
            }
        )*
    };
}

entity_id!(
    /// Files are numbered in name order.
    FileId,
    MessageId,
    EnumId,
    EnumValueId,
    ExtensionId,
    FieldId,
    ServiceId,
    MethodId,
);

// ============================================================================
// Common facet
// ============================================================================

/// Naming, location, and custom options shared by every entity.
#[derive(Debug, Clone)]
pub struct Common {
    pub(crate) file: FileId,
    pub(crate) path: LocationPath,
    pub(crate) long_name: String,
    pub(crate) full_name: String,
    pub(crate) options: OptionExtensions,
}

impl Common {
    pub(crate) fn new(file: FileId, package: &str, path: LocationPath, long_name: &str) -> Self {
        let (long_name, full_name) = make_name(package, long_name);
        Self {
            file,
            path,
            long_name,
            full_name,
            options: OptionExtensions::default(),
        }
    }

    pub fn file_id(&self) -> FileId {
        self.file
    }

    /// `SourceCodeInfo` path the entity's comments were looked up with.
    pub fn location_path(&self) -> &LocationPath {
        &self.path
    }

    /// Name qualified by enclosing messages, e.g. `Outer.Inner`.
    pub fn long_name(&self) -> &str {
        &self.long_name
    }

    /// Package-qualified name with a leading dot, e.g. `.pkg.Outer.Inner`.
    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    pub fn option_extensions(&self) -> &OptionExtensions {
        &self.options
    }

    pub(crate) fn add_options(&mut self, found: OptionExtensions) {
        self.options.merge(found);
    }
}

macro_rules! impl_common {
    ($($ty:ident),* $(,)?) => {
        $(
            impl $ty {
                pub fn common(&self) -> &Common {
                    &self.common
                }

                pub fn long_name(&self) -> &str {
                    self.common.long_name()
                }

                pub fn full_name(&self) -> &str {
                    self.common.full_name()
                }

                pub fn option_extensions(&self) -> &OptionExtensions {
                    self.common.option_extensions()
                }

                pub fn comments(&self) -> &Comment {
                    &self.comments
                }

                pub fn name(&self) -> &str {
                    self.proto.name()
                }
            }
        )*
    };
}

impl_common!(Message, Enum, EnumValue, Extension, Field, Service, Method);

// ============================================================================
// Entities
// ============================================================================

#[derive(Debug, Clone)]
pub struct File {
    pub(crate) proto: FileDescriptorProto,
    pub(crate) package_comments: Comment,
    pub(crate) syntax_comments: Comment,
    pub(crate) options: OptionExtensions,
    pub(crate) enums: Vec<EnumId>,
    pub(crate) extensions: Vec<ExtensionId>,
    pub(crate) messages: Vec<MessageId>,
    pub(crate) services: Vec<ServiceId>,
    pub(crate) imports: Vec<Import>,
    pub(crate) dependencies: Vec<FileId>,
    pub(crate) public_dependencies: Vec<FileId>,
    pub(crate) descriptor: Option<prost_reflect::FileDescriptor>,
    pub(crate) is_file_to_generate: bool,
}

impl File {
    pub fn name(&self) -> &str {
        self.proto.name()
    }

    pub fn package(&self) -> &str {
        self.proto.package()
    }

    /// `proto2`, `proto3`, or empty when the file does not declare one.
    pub fn syntax(&self) -> &str {
        self.proto.syntax()
    }

    pub fn is_proto3(&self) -> bool {
        self.syntax() == "proto3"
    }

    pub fn proto(&self) -> &FileDescriptorProto {
        &self.proto
    }

    pub fn package_comments(&self) -> &Comment {
        &self.package_comments
    }

    pub fn syntax_comments(&self) -> &Comment {
        &self.syntax_comments
    }

    pub fn option_extensions(&self) -> &OptionExtensions {
        &self.options
    }

    /// Reflective handle from the registry pool the batch was assembled with.
    pub fn descriptor(&self) -> Option<&prost_reflect::FileDescriptor> {
        self.descriptor.as_ref()
    }

    pub fn is_file_to_generate(&self) -> bool {
        self.is_file_to_generate
    }
}

#[derive(Debug, Clone)]
pub struct Message {
    pub(crate) common: Common,
    pub(crate) proto: DescriptorProto,
    pub(crate) comments: Comment,
    pub(crate) parent: Option<MessageId>,
    pub(crate) enums: Vec<EnumId>,
    pub(crate) extensions: Vec<ExtensionId>,
    pub(crate) fields: Vec<FieldId>,
    pub(crate) messages: Vec<MessageId>,
}

impl Message {
    pub fn proto(&self) -> &DescriptorProto {
        &self.proto
    }

    /// Synthetic `XxxEntry` message generated for a `map<K, V>` field.
    pub fn is_map_entry(&self) -> bool {
        self.proto
            .options
            .as_ref()
            .map_or(false, |options| options.map_entry())
    }
}

#[derive(Debug, Clone)]
pub struct Enum {
    pub(crate) common: Common,
    pub(crate) proto: EnumDescriptorProto,
    pub(crate) comments: Comment,
    pub(crate) parent: Option<MessageId>,
    pub(crate) values: Vec<EnumValueId>,
}

impl Enum {
    pub fn proto(&self) -> &EnumDescriptorProto {
        &self.proto
    }
}

#[derive(Debug, Clone)]
pub struct EnumValue {
    pub(crate) common: Common,
    pub(crate) proto: EnumValueDescriptorProto,
    pub(crate) comments: Comment,
    pub(crate) enum_id: EnumId,
}

impl EnumValue {
    pub fn proto(&self) -> &EnumValueDescriptorProto {
        &self.proto
    }

    pub fn number(&self) -> i32 {
        self.proto.number()
    }
}

#[derive(Debug, Clone)]
pub struct Extension {
    pub(crate) common: Common,
    pub(crate) proto: FieldDescriptorProto,
    pub(crate) comments: Comment,
    pub(crate) parent: Option<MessageId>,
    pub(crate) descriptor: Option<prost_reflect::ExtensionDescriptor>,
}

impl Extension {
    pub fn proto(&self) -> &FieldDescriptorProto {
        &self.proto
    }

    /// Full name of the extended message, as written in the descriptor.
    pub fn extendee(&self) -> &str {
        self.proto.extendee()
    }

    pub fn descriptor(&self) -> Option<&prost_reflect::ExtensionDescriptor> {
        self.descriptor.as_ref()
    }
}

#[derive(Debug, Clone)]
pub struct Field {
    pub(crate) common: Common,
    pub(crate) proto: FieldDescriptorProto,
    pub(crate) comments: Comment,
    pub(crate) message: MessageId,
}

impl Field {
    pub fn proto(&self) -> &FieldDescriptorProto {
        &self.proto
    }

    pub fn number(&self) -> i32 {
        self.proto.number()
    }
}

#[derive(Debug, Clone)]
pub struct Service {
    pub(crate) common: Common,
    pub(crate) proto: ServiceDescriptorProto,
    pub(crate) comments: Comment,
    pub(crate) methods: Vec<MethodId>,
    pub(crate) descriptor: Option<prost_reflect::ServiceDescriptor>,
}

impl Service {
    pub fn proto(&self) -> &ServiceDescriptorProto {
        &self.proto
    }

    pub fn descriptor(&self) -> Option<&prost_reflect::ServiceDescriptor> {
        self.descriptor.as_ref()
    }
}

#[derive(Debug, Clone)]
pub struct Method {
    pub(crate) common: Common,
    pub(crate) proto: MethodDescriptorProto,
    pub(crate) comments: Comment,
    pub(crate) service: ServiceId,
    pub(crate) input: Option<MessageId>,
    pub(crate) output: Option<MessageId>,
    pub(crate) descriptor: Option<prost_reflect::MethodDescriptor>,
}

impl Method {
    pub fn proto(&self) -> &MethodDescriptorProto {
        &self.proto
    }

    pub fn input_type(&self) -> &str {
        self.proto.input_type()
    }

    pub fn output_type(&self) -> &str {
        self.proto.output_type()
    }

    pub fn client_streaming(&self) -> bool {
        self.proto.client_streaming()
    }

    pub fn server_streaming(&self) -> bool {
        self.proto.server_streaming()
    }

    pub fn descriptor(&self) -> Option<&prost_reflect::MethodDescriptor> {
        self.descriptor.as_ref()
    }
}

/// An entity defined in a dependency and consumed by the importing file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Import {
    Message(MessageId),
    Enum(EnumId),
    Extension(ExtensionId),
}

// ============================================================================
// Arena
// ============================================================================

/// Every file of one batch and every entity inside them.
#[derive(Debug, Clone, Default)]
pub struct DescriptorSet {
    pub(crate) files: Vec<File>,
    pub(crate) messages: Vec<Message>,
    pub(crate) enums: Vec<Enum>,
    pub(crate) enum_values: Vec<EnumValue>,
    pub(crate) extensions: Vec<Extension>,
    pub(crate) fields: Vec<Field>,
    pub(crate) services: Vec<Service>,
    pub(crate) methods: Vec<Method>,
    pub(crate) files_by_name: HashMap<String, FileId>,
    pub(crate) messages_by_full_name: HashMap<String, MessageId>,
}

impl DescriptorSet {
    pub(crate) fn push_file(&mut self, file: File) -> FileId {
        let id = FileId(self.files.len());
        self.files_by_name.insert(file.name().to_string(), id);
        self.files.push(file);
        id
    }

    pub(crate) fn push_message(&mut self, message: Message) -> MessageId {
        let id = MessageId(self.messages.len());
        self.messages_by_full_name
            .entry(message.full_name().to_string())
            .or_insert(id);
        self.messages.push(message);
        id
    }

    pub(crate) fn push_enum(&mut self, e: Enum) -> EnumId {
        self.enums.push(e);
        EnumId(self.enums.len() - 1)
    }

    pub(crate) fn push_enum_value(&mut self, value: EnumValue) -> EnumValueId {
        self.enum_values.push(value);
        EnumValueId(self.enum_values.len() - 1)
    }

    pub(crate) fn push_extension(&mut self, extension: Extension) -> ExtensionId {
        self.extensions.push(extension);
        ExtensionId(self.extensions.len() - 1)
    }

    pub(crate) fn push_field(&mut self, field: Field) -> FieldId {
        self.fields.push(field);
        FieldId(self.fields.len() - 1)
    }

    pub(crate) fn push_service(&mut self, service: Service) -> ServiceId {
        self.services.push(service);
        ServiceId(self.services.len() - 1)
    }

    pub(crate) fn push_method(&mut self, method: Method) -> MethodId {
        self.methods.push(method);
        MethodId(self.methods.len() - 1)
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub(crate) fn message_id_by_full_name(&self, full_name: &str) -> Option<MessageId> {
        self.messages_by_full_name.get(full_name).copied()
    }
}
