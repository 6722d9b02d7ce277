//! Descriptor fixtures shared by the unit tests.

use crate::registry::ExtensionRegistry;
use prost::Message as _;
use prost_reflect::{DynamicMessage, ExtensionDescriptor, ReflectMessage, Value};
use prost_types::field_descriptor_proto::{Label, Type};
use prost_types::{
    DescriptorProto, EnumDescriptorProto, EnumValueDescriptorProto, FieldDescriptorProto,
    FileDescriptorProto, MessageOptions, MethodDescriptorProto, ServiceDescriptorProto,
};

pub(crate) fn descriptor_proto() -> FileDescriptorProto {
    ExtensionRegistry::new()
        .file("google/protobuf/descriptor.proto")
        .expect("descriptor.proto")
        .file_descriptor_proto()
        .clone()
}

fn extension(name: &str, number: i32, ty: Type, extendee: &str) -> FieldDescriptorProto {
    FieldDescriptorProto {
        name: Some(name.to_string()),
        number: Some(number),
        label: Some(Label::Optional as i32),
        r#type: Some(ty as i32),
        extendee: Some(extendee.to_string()),
        ..Default::default()
    }
}

/// `acme/options.proto`: `acme.label` on messages and `acme.Holder.weight`
/// on fields.
pub(crate) fn options_file() -> FileDescriptorProto {
    let mut holder = message("Holder", vec![]);
    holder.extension.push(extension(
        "weight",
        50002,
        Type::Int32,
        ".google.protobuf.FieldOptions",
    ));

    FileDescriptorProto {
        name: Some("acme/options.proto".to_string()),
        package: Some("acme".to_string()),
        dependency: vec!["google/protobuf/descriptor.proto".to_string()],
        message_type: vec![holder],
        extension: vec![extension(
            "label",
            50001,
            Type::String,
            ".google.protobuf.MessageOptions",
        )],
        ..Default::default()
    }
}

/// `acme/tags.proto`: one string or int option per remaining options type.
pub(crate) fn tags_file() -> FileDescriptorProto {
    FileDescriptorProto {
        name: Some("acme/tags.proto".to_string()),
        package: Some("acme".to_string()),
        dependency: vec!["google/protobuf/descriptor.proto".to_string()],
        extension: vec![
            extension("enum_tag", 50010, Type::String, ".google.protobuf.EnumOptions"),
            extension("value_tag", 50011, Type::String, ".google.protobuf.EnumValueOptions"),
            extension("service_tag", 50012, Type::String, ".google.protobuf.ServiceOptions"),
            extension("method_tag", 50013, Type::String, ".google.protobuf.MethodOptions"),
            extension("field_tag", 50014, Type::Int32, ".google.protobuf.FieldOptions"),
        ],
        ..Default::default()
    }
}

/// `catalog.proto`: `Box { id, enum Kind, extend MessageOptions { stamp } }`,
/// top-level `enum Size { SMALL, LARGE }`, `service Boxes { Open }`.
pub(crate) fn catalog_file() -> FileDescriptorProto {
    let mut boxed = message("Box", vec![field("id", 1)]);
    boxed.enum_type.push(enum_proto("Kind", &["PLAIN"]));
    boxed.extension.push(extension(
        "stamp",
        50020,
        Type::String,
        ".google.protobuf.MessageOptions",
    ));

    FileDescriptorProto {
        name: Some("catalog.proto".to_string()),
        package: Some("catalog".to_string()),
        dependency: vec![
            "google/protobuf/descriptor.proto".to_string(),
            "acme/tags.proto".to_string(),
        ],
        message_type: vec![boxed],
        enum_type: vec![enum_proto("Size", &["SMALL", "LARGE"])],
        service: vec![service("Boxes", vec![method("Open", ".catalog.Box", ".catalog.Box")])],
        ..Default::default()
    }
}

/// `catalog_file()` serialized with `acme/tags.proto` options on `Size`,
/// `LARGE`, `Boxes`, `Boxes.Open` and the nested extension `Box.stamp`.
pub(crate) fn tagged_catalog() -> Vec<u8> {
    let registry = registry_with(&[tags_file()]);
    let tag = |name: &str| registry.extension(name).cloned().expect("tag extension");
    let file_type = registry
        .pool()
        .get_message_by_name("google.protobuf.FileDescriptorProto")
        .expect("FileDescriptorProto");

    let mut file = DynamicMessage::new(file_type);
    file.transcode_from(&catalog_file()).expect("transcode");
    set_option_at(&mut file, &[5, 0], &tag("acme.enum_tag"), Value::String("sizes".into()));
    set_option_at(&mut file, &[5, 0, 2, 1], &tag("acme.value_tag"), Value::String("big".into()));
    set_option_at(&mut file, &[6, 0], &tag("acme.service_tag"), Value::String("boxes".into()));
    set_option_at(&mut file, &[6, 0, 2, 0], &tag("acme.method_tag"), Value::String("open".into()));
    set_option_at(&mut file, &[4, 0, 6, 0], &tag("acme.field_tag"), Value::I32(3));
    file.encode_to_vec()
}

/// Sets `extension` on the options of the element at `path`, creating the
/// options message when absent.
fn set_option_at(
    element: &mut DynamicMessage,
    path: &[i32],
    extension: &ExtensionDescriptor,
    value: Value,
) {
    match path {
        [] => {
            let field = element
                .descriptor()
                .get_field_by_name("options")
                .expect("options field");
            let Value::Message(options) = element.get_field_mut(&field) else {
                panic!("options is a message");
            };
            options.set_extension(extension, value);
        }
        [tag, index, rest @ ..] => {
            let field = element
                .descriptor()
                .get_field(*tag as u32)
                .expect("repeated field");
            let Value::List(items) = element.get_field_mut(&field) else {
                panic!("field {tag} is repeated");
            };
            let Value::Message(child) = &mut items[*index as usize] else {
                panic!("element {index} is a message");
            };
            set_option_at(child, rest, extension, value);
        }
        [_] => panic!("path has an odd length"),
    }
}

pub(crate) fn registry_with(files: &[FileDescriptorProto]) -> ExtensionRegistry {
    let mut registry = ExtensionRegistry::new();
    registry.register_files(files).expect("register fixtures");
    registry
}

/// A `MessageOptions` carrying one extension value.
pub(crate) fn message_options(
    registry: &ExtensionRegistry,
    extension: &str,
    value: Value,
) -> DynamicMessage {
    let desc = registry
        .pool()
        .get_message_by_name("google.protobuf.MessageOptions")
        .expect("MessageOptions");
    let ext = registry.extension(extension).expect("registered extension");
    let mut options = DynamicMessage::new(desc);
    options.set_extension(ext, value);
    options
}

pub(crate) fn field(name: &str, number: i32) -> FieldDescriptorProto {
    FieldDescriptorProto {
        name: Some(name.to_string()),
        number: Some(number),
        label: Some(Label::Optional as i32),
        r#type: Some(Type::String as i32),
        ..Default::default()
    }
}

pub(crate) fn message(name: &str, fields: Vec<FieldDescriptorProto>) -> DescriptorProto {
    DescriptorProto {
        name: Some(name.to_string()),
        field: fields,
        ..Default::default()
    }
}

pub(crate) fn map_entry(name: &str) -> DescriptorProto {
    DescriptorProto {
        options: Some(MessageOptions {
            map_entry: Some(true),
            ..Default::default()
        }),
        ..message(name, vec![field("key", 1), field("value", 2)])
    }
}

pub(crate) fn enum_proto(name: &str, values: &[&str]) -> EnumDescriptorProto {
    EnumDescriptorProto {
        name: Some(name.to_string()),
        value: values
            .iter()
            .enumerate()
            .map(|(i, v)| EnumValueDescriptorProto {
                name: Some(v.to_string()),
                number: Some(i as i32),
                ..Default::default()
            })
            .collect(),
        ..Default::default()
    }
}

pub(crate) fn method(name: &str, input: &str, output: &str) -> MethodDescriptorProto {
    MethodDescriptorProto {
        name: Some(name.to_string()),
        input_type: Some(input.to_string()),
        output_type: Some(output.to_string()),
        ..Default::default()
    }
}

pub(crate) fn service(name: &str, methods: Vec<MethodDescriptorProto>) -> ServiceDescriptorProto {
    ServiceDescriptorProto {
        name: Some(name.to_string()),
        method: methods,
        ..Default::default()
    }
}

pub(crate) fn top_level_file(
    name: &str,
    package: &str,
    messages: Vec<DescriptorProto>,
) -> FileDescriptorProto {
    FileDescriptorProto {
        name: Some(name.to_string()),
        package: Some(package.to_string()),
        message_type: messages,
        ..Default::default()
    }
}
