//! Custom option discovery.
//!
//! An entity's options message (`MessageOptions`, `FieldOptions`, ...) is
//! scanned against every registered extension. Whatever is set ends up in
//! [`OptionExtensions`], keyed by the extension's full name, so generators can
//! ask for `acme.label` without knowing the extension's Rust type.

use crate::registry::ExtensionRegistry;
use prost_reflect::{DynamicMessage, ReflectMessage, Value};
use std::collections::BTreeMap;

/// Decoded custom options keyed by extension full name (no leading dot).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OptionExtensions(BTreeMap<String, Value>);

impl OptionExtensions {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Accepts the name with or without a leading dot.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(crate::naming::reflect_name(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(Value::as_bool)
    }

    pub fn get_i64(&self, name: &str) -> Option<i64> {
        match self.get(name)? {
            Value::I32(v) => Some(i64::from(*v)),
            Value::I64(v) => Some(*v),
            Value::U32(v) => Some(i64::from(*v)),
            Value::U64(v) => i64::try_from(*v).ok(),
            Value::EnumNumber(v) => Some(i64::from(*v)),
            _ => None,
        }
    }

    pub fn get_message(&self, name: &str) -> Option<&DynamicMessage> {
        self.get(name).and_then(Value::as_message)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Adds `other`'s entries; keys already present are overwritten.
    pub fn merge(&mut self, other: OptionExtensions) {
        self.0.extend(other.0);
    }
}

/// Collects every registered extension that targets `options`' type and is set on it.
pub fn scan_options(registry: &ExtensionRegistry, options: &DynamicMessage) -> OptionExtensions {
    let container = options.descriptor();
    let mut found = BTreeMap::new();
    for extension in registry.extensions() {
        if extension.containing_message().full_name() != container.full_name() {
            continue;
        }
        if !options.has_extension(extension) {
            continue;
        }
        found.insert(
            extension.full_name().to_string(),
            options.get_extension(extension).into_owned(),
        );
    }
    OptionExtensions(found)
}

/// The `options` message of the element at `path` inside a dynamically
/// decoded `FileDescriptorProto`, if it is set.
///
/// `path` follows `SourceCodeInfo` conventions: pairs of repeated field tag and
/// index. The empty path designates the file itself.
pub fn options_at(file: &DynamicMessage, path: &[i32]) -> Option<DynamicMessage> {
    match path {
        [] => {
            if !file.has_field_by_name("options") {
                return None;
            }
            file.get_field_by_name("options")?.as_message().cloned()
        }
        [tag, index, rest @ ..] => {
            let field = file.descriptor().get_field(u32::try_from(*tag).ok()?)?;
            if !file.has_field(&field) {
                return None;
            }
            let value = file.get_field(&field);
            let element = value
                .as_list()?
                .get(usize::try_from(*index).ok()?)?
                .as_message()?;
            options_at(element, rest)
        }
        [_] => None,
    }
}
