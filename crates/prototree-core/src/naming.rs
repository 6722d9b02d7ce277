//! Qualified names and the descriptor tag numbers used to build location paths.

/// Tag numbers of the repeated/singular fields in `FileDescriptorProto`.
pub mod file_tag {
    pub const PACKAGE: i32 = 2;
    pub const MESSAGE_TYPE: i32 = 4;
    pub const ENUM_TYPE: i32 = 5;
    pub const SERVICE: i32 = 6;
    pub const EXTENSION: i32 = 7;
    pub const SYNTAX: i32 = 12;
}

/// Tag numbers of the repeated fields in `DescriptorProto`.
pub mod message_tag {
    pub const FIELD: i32 = 2;
    pub const NESTED_TYPE: i32 = 3;
    pub const ENUM_TYPE: i32 = 4;
    pub const EXTENSION: i32 = 6;
}

/// `EnumDescriptorProto.value`
pub const ENUM_VALUE_TAG: i32 = 2;

/// `ServiceDescriptorProto.method`
pub const SERVICE_METHOD_TAG: i32 = 2;

/// Returns `(long_name, full_name)` for an entity of `package`.
///
/// A `long_name` that already starts with `.` is treated as fully qualified
/// and copied into both. Otherwise the full name is the package-qualified
/// long name with a leading dot, even when the package is empty.
pub fn make_name(package: &str, long_name: &str) -> (String, String) {
    if long_name.starts_with('.') {
        return (long_name.to_string(), long_name.to_string());
    }
    let full_name = if package.is_empty() {
        format!(".{long_name}")
    } else {
        format!(".{package}.{long_name}")
    };
    (long_name.to_string(), full_name)
}

/// `parent.name`, or just `name` at the top level.
pub fn nest(parent_long_name: Option<&str>, name: &str) -> String {
    match parent_long_name {
        Some(parent) => format!("{parent}.{name}"),
        None => name.to_string(),
    }
}

/// Long name of an extension: `extendee.name`, collapsed to
/// `ExtendeeSimpleName.name` when the package occurs anywhere in it.
///
/// This is a substring test, not a package-boundary check: package `a.b`
/// also collapses `.xa.bc.Base.ext`. An empty package always collapses.
pub fn extension_long_name(package: &str, extendee: &str, name: &str) -> String {
    let naive = format!("{extendee}.{name}");
    if !naive.contains(package) {
        return naive;
    }
    let last = extendee.rsplit('.').next().unwrap_or(extendee);
    format!("{last}.{name}")
}

/// Full name without the leading dot, as `prost-reflect` spells it.
pub fn reflect_name(full_name: &str) -> &str {
    full_name.strip_prefix('.').unwrap_or(full_name)
}
