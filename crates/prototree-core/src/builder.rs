//! Entity builders.
//!
//! One [`FileBuilder`] turns one `FileDescriptorProto` into arena entries.
//! The construction context is explicit: the builder carries the owning file,
//! its package, its comment index, and the extension-aware decoding of the
//! file; each `build_*` call receives the enclosing entity (if any) from
//! which it derives the location-path prefix and the long-name prefix.
//!
//! Location paths follow `SourceCodeInfo`:
//!
//! | entity    | in file | in message |
//! |-----------|---------|------------|
//! | message   | 4       | 3          |
//! | enum      | 5       | 4          |
//! | extension | 7       | 6          |
//! | service   | 6       | -          |
//! | field     | -       | 2          |
//!
//! Enum values and methods sit under tag 2 of their enum / service.

use crate::comments::{CommentIndex, LocationPath};
use crate::model::{
    Common, DescriptorSet, Enum, EnumId, EnumValue, EnumValueId, Extension, ExtensionId, Field,
    FieldId, File, FileId, Message, MessageId, Method, MethodId, Service, ServiceId,
};
use crate::naming::{
    extension_long_name, file_tag, message_tag, nest, reflect_name, ENUM_VALUE_TAG,
    SERVICE_METHOD_TAG,
};
use crate::options::{options_at, scan_options, OptionExtensions};
use crate::registry::ExtensionRegistry;
use prost_reflect::DynamicMessage;
use prost_types::{
    DescriptorProto, EnumDescriptorProto, EnumValueDescriptorProto, FieldDescriptorProto,
    FileDescriptorProto, MethodDescriptorProto, ServiceDescriptorProto,
};

/// Assembles one file. Other files of the batch are not visible here.
pub(crate) struct FileBuilder<'a> {
    set: &'a mut DescriptorSet,
    registry: &'a ExtensionRegistry,
    file: FileId,
    package: String,
    comments: CommentIndex,
    /// Extension-aware decoding of the same file; options are read from it.
    raw: Option<DynamicMessage>,
}

impl<'a> FileBuilder<'a> {
    pub(crate) fn new(
        set: &'a mut DescriptorSet,
        registry: &'a ExtensionRegistry,
        raw: Option<DynamicMessage>,
    ) -> Self {
        Self {
            file: FileId(set.files.len()),
            set,
            registry,
            package: String::new(),
            comments: CommentIndex::default(),
            raw,
        }
    }

    pub(crate) fn build(mut self, mut proto: FileDescriptorProto) -> FileId {
        self.package = proto.package().to_string();
        self.comments = CommentIndex::parse(proto.source_code_info.as_ref());
        proto.source_code_info = None;

        let enums = std::mem::take(&mut proto.enum_type);
        let extensions = std::mem::take(&mut proto.extension);
        let messages = std::mem::take(&mut proto.message_type);
        let services = std::mem::take(&mut proto.service);

        let root = LocationPath::root();
        let package_comments = self.comments.get(&root.field(file_tag::PACKAGE));
        let syntax_comments = self.comments.get(&root.field(file_tag::SYNTAX));
        let options = self.scan(&root);
        let descriptor = self.registry.file(proto.name());
        let file = self.set.push_file(File {
            package_comments,
            syntax_comments,
            options,
            proto,
            enums: Vec::new(),
            extensions: Vec::new(),
            messages: Vec::new(),
            services: Vec::new(),
            imports: Vec::new(),
            dependencies: Vec::new(),
            public_dependencies: Vec::new(),
            descriptor,
            is_file_to_generate: false,
        });
        debug_assert_eq!(file, self.file);

        let enums = self.build_enums(enums, None);
        let extensions = self.build_extensions(extensions, None);
        let messages = self.build_messages(messages, None);
        let services = self.build_services(services);

        let data = &mut self.set.files[file.0];
        data.enums = enums;
        data.extensions = extensions;
        data.messages = messages;
        data.services = services;

        tracing::debug!(
            file = %self.set.files[file.0].name(),
            comments = self.comments.len(),
            "assembled file"
        );
        file
    }

    // ------------------------------------------------------------------------
    // Context helpers
    // ------------------------------------------------------------------------

    /// Location path and long name of the enclosing message, if any.
    fn scope_of(&self, parent: Option<MessageId>) -> (LocationPath, Option<String>) {
        match parent {
            Some(id) => {
                let common = &self.set.messages[id.0].common;
                (common.path.clone(), Some(common.long_name.clone()))
            }
            None => (LocationPath::root(), None),
        }
    }

    fn common(&self, path: LocationPath, long_name: &str) -> Common {
        let mut common = Common::new(self.file, &self.package, path, long_name);
        common.add_options(self.scan(&common.path));
        common
    }

    fn scan(&self, path: &LocationPath) -> OptionExtensions {
        self.raw
            .as_ref()
            .and_then(|raw| options_at(raw, path.segments()))
            .map(|options| scan_options(self.registry, &options))
            .unwrap_or_default()
    }

    // ------------------------------------------------------------------------
    // Enums
    // ------------------------------------------------------------------------

    fn build_enums(
        &mut self,
        protos: Vec<EnumDescriptorProto>,
        parent: Option<MessageId>,
    ) -> Vec<EnumId> {
        let (prefix, parent_long) = self.scope_of(parent);
        let tag = match parent {
            Some(_) => message_tag::ENUM_TYPE,
            None => file_tag::ENUM_TYPE,
        };

        let mut ids = Vec::with_capacity(protos.len());
        for (i, mut proto) in protos.into_iter().enumerate() {
            let path = prefix.child(tag, i);
            let long_name = nest(parent_long.as_deref(), proto.name());
            let values = std::mem::take(&mut proto.value);

            let comments = self.comments.get(&path);
            let common = self.common(path, &long_name);
            let id = self.set.push_enum(Enum {
                comments,
                common,
                proto,
                parent,
                values: Vec::new(),
            });
            let values = self.build_enum_values(values, id);
            self.set.enums[id.0].values = values;
            ids.push(id);
        }
        ids
    }

    fn build_enum_values(
        &mut self,
        protos: Vec<EnumValueDescriptorProto>,
        enum_id: EnumId,
    ) -> Vec<EnumValueId> {
        let owner = &self.set.enums[enum_id.0].common;
        let (prefix, enum_long) = (owner.path.clone(), owner.long_name.clone());

        protos
            .into_iter()
            .enumerate()
            .map(|(i, proto)| {
                let path = prefix.child(ENUM_VALUE_TAG, i);
                let long_name = nest(Some(&enum_long), proto.name());
                let value = EnumValue {
                    comments: self.comments.get(&path),
                    common: self.common(path, &long_name),
                    proto,
                    enum_id,
                };
                self.set.push_enum_value(value)
            })
            .collect()
    }

    // ------------------------------------------------------------------------
    // Extensions
    // ------------------------------------------------------------------------

    fn build_extensions(
        &mut self,
        protos: Vec<FieldDescriptorProto>,
        parent: Option<MessageId>,
    ) -> Vec<ExtensionId> {
        let (prefix, parent_long) = self.scope_of(parent);
        let tag = match parent {
            Some(_) => message_tag::EXTENSION,
            None => file_tag::EXTENSION,
        };

        let mut ids = Vec::with_capacity(protos.len());
        for (i, proto) in protos.into_iter().enumerate() {
            let path = prefix.child(tag, i);
            let long_name = extension_long_name(&self.package, proto.extendee(), proto.name());

            // The extension's own scope, not its long name, decides its registered name.
            let declared = match (&self.package, &parent_long) {
                (pkg, Some(parent)) if !pkg.is_empty() => {
                    format!("{pkg}.{parent}.{}", proto.name())
                }
                (_, Some(parent)) => format!("{parent}.{}", proto.name()),
                (pkg, None) if !pkg.is_empty() => format!("{pkg}.{}", proto.name()),
                (_, None) => proto.name().to_string(),
            };
            let descriptor = self.registry.pool().get_extension_by_name(&declared);

            let comments = self.comments.get(&path);
            let common = self.common(path, &long_name);
            let id = self.set.push_extension(Extension {
                comments,
                common,
                proto,
                parent,
                descriptor,
            });
            ids.push(id);
        }
        ids
    }

    // ------------------------------------------------------------------------
    // Messages and fields
    // ------------------------------------------------------------------------

    fn build_messages(
        &mut self,
        protos: Vec<DescriptorProto>,
        parent: Option<MessageId>,
    ) -> Vec<MessageId> {
        let (prefix, parent_long) = self.scope_of(parent);
        let tag = match parent {
            Some(_) => message_tag::NESTED_TYPE,
            None => file_tag::MESSAGE_TYPE,
        };

        let mut ids = Vec::with_capacity(protos.len());
        for (i, mut proto) in protos.into_iter().enumerate() {
            let path = prefix.child(tag, i);
            let long_name = nest(parent_long.as_deref(), proto.name());

            let enums = std::mem::take(&mut proto.enum_type);
            let extensions = std::mem::take(&mut proto.extension);
            let fields = std::mem::take(&mut proto.field);
            let nested = std::mem::take(&mut proto.nested_type);

            let comments = self.comments.get(&path);
            let common = self.common(path, &long_name);
            let id = self.set.push_message(Message {
                comments,
                common,
                proto,
                parent,
                enums: Vec::new(),
                extensions: Vec::new(),
                fields: Vec::new(),
                messages: Vec::new(),
            });

            let enums = self.build_enums(enums, Some(id));
            let extensions = self.build_extensions(extensions, Some(id));
            let fields = self.build_fields(fields, id);
            let nested = self.build_messages(nested, Some(id));

            let message = &mut self.set.messages[id.0];
            message.enums = enums;
            message.extensions = extensions;
            message.fields = fields;
            message.messages = nested;
            ids.push(id);
        }
        ids
    }

    fn build_fields(
        &mut self,
        protos: Vec<FieldDescriptorProto>,
        message: MessageId,
    ) -> Vec<FieldId> {
        let (prefix, message_long) = self.scope_of(Some(message));

        protos
            .into_iter()
            .enumerate()
            .map(|(i, proto)| {
                let path = prefix.child(message_tag::FIELD, i);
                let long_name = nest(message_long.as_deref(), proto.name());
                let field = Field {
                    comments: self.comments.get(&path),
                    common: self.common(path, &long_name),
                    proto,
                    message,
                };
                self.set.push_field(field)
            })
            .collect()
    }

    // ------------------------------------------------------------------------
    // Services and methods
    // ------------------------------------------------------------------------

    fn build_services(&mut self, protos: Vec<ServiceDescriptorProto>) -> Vec<ServiceId> {
        let mut ids = Vec::with_capacity(protos.len());
        for (i, mut proto) in protos.into_iter().enumerate() {
            let path = LocationPath::root().child(file_tag::SERVICE, i);
            let long_name = proto.name().to_string();
            let methods = std::mem::take(&mut proto.method);

            let comments = self.comments.get(&path);
            let common = self.common(path, &long_name);
            let descriptor = self
                .registry
                .pool()
                .get_service_by_name(reflect_name(common.full_name()));

            let id = self.set.push_service(Service {
                comments,
                common,
                proto,
                methods: Vec::new(),
                descriptor,
            });
            let methods = self.build_methods(methods, id);
            self.set.services[id.0].methods = methods;
            ids.push(id);
        }
        ids
    }

    fn build_methods(
        &mut self,
        protos: Vec<MethodDescriptorProto>,
        service: ServiceId,
    ) -> Vec<MethodId> {
        let owner = &self.set.services[service.0];
        let prefix = owner.common.path.clone();
        let service_long = owner.common.long_name.clone();
        let service_descriptor = owner.descriptor.clone();

        protos
            .into_iter()
            .enumerate()
            .map(|(i, proto)| {
                let path = prefix.child(SERVICE_METHOD_TAG, i);
                let long_name = nest(Some(&service_long), proto.name());
                let descriptor = service_descriptor
                    .as_ref()
                    .and_then(|svc| svc.methods().find(|m| m.name() == proto.name()));
                let method = Method {
                    comments: self.comments.get(&path),
                    common: self.common(path, &long_name),
                    proto,
                    service,
                    input: None,
                    output: None,
                    descriptor,
                };
                self.set.push_method(method)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{enum_proto, field, message, top_level_file};

    fn build(proto: FileDescriptorProto) -> DescriptorSet {
        let registry = ExtensionRegistry::new();
        let mut set = DescriptorSet::default();
        FileBuilder::new(&mut set, &registry, None).build(proto);
        set
    }

    #[test]
    fn nested_names_and_paths() {
        let mut outer = message("M", vec![]);
        let mut inner = message("N", vec![field("f", 1)]);
        inner.enum_type.push(enum_proto("Kind", &["KIND_UNSPECIFIED"]));
        outer.nested_type.push(inner);
        let set = build(top_level_file("a.proto", "a.b", vec![outer]));

        let file = set.file(FileId(0));
        let m = file.find_message("M").expect("M");
        assert_eq!(m.full_name(), ".a.b.M");
        assert_eq!(m.common().location_path().to_string(), "4.0");

        let n = m.find_message("N").expect("N");
        assert_eq!(n.long_name(), "M.N");
        assert_eq!(n.full_name(), ".a.b.M.N");
        assert_eq!(n.common().location_path().to_string(), "4.0.3.0");
        assert_eq!(n.parent(), Some(m));

        let f = n.find_field("f").expect("f");
        assert_eq!(f.long_name(), "M.N.f");
        assert_eq!(f.common().location_path().to_string(), "4.0.3.0.2.0");
        assert_eq!(f.message(), n);

        let kind = n.find_enum("Kind").expect("Kind");
        assert_eq!(kind.long_name(), "M.N.Kind");
        assert_eq!(kind.common().location_path().to_string(), "4.0.3.0.4.0");
        let value = kind.find_value("KIND_UNSPECIFIED").expect("value");
        assert_eq!(value.long_name(), "M.N.Kind.KIND_UNSPECIFIED");
        assert_eq!(value.common().location_path().to_string(), "4.0.3.0.4.0.2.0");
        assert_eq!(value.enum_type(), kind);
    }

    #[test]
    fn children_are_moved_into_the_tree() {
        let mut outer = message("M", vec![field("a", 1), field("b", 2)]);
        outer.nested_type.push(message("N", vec![]));
        let set = build(top_level_file("a.proto", "p", vec![outer]));

        let m = set.file(FileId(0)).find_message("M").expect("M");
        assert!(m.proto().field.is_empty());
        assert!(m.proto().nested_type.is_empty());
        assert_eq!(m.fields().len(), 2);
        assert_eq!(m.messages().len(), 1);
    }

    #[test]
    fn top_level_enum_uses_file_tag() {
        let mut proto = top_level_file("e.proto", "p", vec![]);
        proto.enum_type.push(enum_proto("Color", &["RED", "GREEN"]));
        let set = build(proto);

        let color = set.file(FileId(0)).find_enum(".p.Color").expect("Color");
        assert_eq!(color.common().location_path().to_string(), "5.0");
        assert!(color.parent().is_none());
        let green = color.find_value("GREEN").expect("GREEN");
        assert_eq!(green.common().location_path().to_string(), "5.0.2.1");
        assert_eq!(green.full_name(), ".p.Color.GREEN");
    }
}
