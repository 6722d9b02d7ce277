//! Reference generator: writes the assembled tree of each file to generate,
//! as JSON or as an indented text outline.

use anyhow::{anyhow, Result};
use prost_reflect::Value;
use prototree_core::{
    Comment, DescriptorSet, EnumRef, ExtensionRef, FileRef, GeneratedFile, Generator, Import,
    ImportRef, MessageRef, MethodRef, OptionExtensions, Parameters, ServiceRef,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write as _;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Text,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DumpOptions {
    pub format: Format,
    pub suffix: String,
    pub include_imports: bool,
}

impl DumpOptions {
    pub fn from_parameters(parameters: &Parameters) -> Result<Self> {
        let format = match parameters.get("format").unwrap_or("json") {
            "json" => Format::Json,
            "text" | "txt" => Format::Text,
            other => return Err(anyhow!("unknown format `{other}` (expected `json` or `text`)")),
        };
        let suffix = match parameters.get("suffix") {
            Some(suffix) => suffix.to_string(),
            None if format == Format::Json => ".tree.json".to_string(),
            None => ".tree.txt".to_string(),
        };
        Ok(Self {
            format,
            suffix,
            include_imports: parameters.flag("include_imports"),
        })
    }

    fn output_name(&self, proto_name: &str) -> String {
        let stem = proto_name.strip_suffix(".proto").unwrap_or(proto_name);
        format!("{stem}{}", self.suffix)
    }
}

pub struct TreeDump;

impl Generator for TreeDump {
    type Error = anyhow::Error;

    fn generate(&self, set: &DescriptorSet, parameters: &Parameters) -> Result<Vec<GeneratedFile>> {
        let options = DumpOptions::from_parameters(parameters)?;
        set.files_to_generate()
            .map(|file| -> Result<GeneratedFile> {
                let dump = FileDump::new(file, options.include_imports);
                let content = match options.format {
                    Format::Json => serde_json::to_string_pretty(&dump)?,
                    Format::Text => dump.to_text(),
                };
                Ok(GeneratedFile {
                    name: Some(options.output_name(file.data().name())),
                    content: Some(content),
                    ..Default::default()
                })
            })
            .collect()
    }
}

// ============================================================================
// Dump tree
// ============================================================================

type Options = BTreeMap<String, String>;

#[derive(Debug, Serialize)]
pub struct FileDump<'a> {
    name: &'a str,
    package: &'a str,
    syntax: &'a str,
    #[serde(skip_serializing_if = "Comment::is_empty")]
    comments: &'a Comment,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    options: Options,
    enums: Vec<EnumDump<'a>>,
    extensions: Vec<ExtensionDump<'a>>,
    messages: Vec<MessageDump<'a>>,
    services: Vec<ServiceDump<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    imports: Option<Vec<ImportDump<'a>>>,
}

#[derive(Debug, Serialize)]
struct MessageDump<'a> {
    full_name: &'a str,
    long_name: &'a str,
    #[serde(skip_serializing_if = "Comment::is_empty")]
    comments: &'a Comment,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    options: Options,
    fields: Vec<FieldDump<'a>>,
    enums: Vec<EnumDump<'a>>,
    extensions: Vec<ExtensionDump<'a>>,
    messages: Vec<MessageDump<'a>>,
}

#[derive(Debug, Serialize)]
struct FieldDump<'a> {
    name: &'a str,
    number: i32,
    full_name: &'a str,
    #[serde(skip_serializing_if = "Comment::is_empty")]
    comments: &'a Comment,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    options: Options,
}

#[derive(Debug, Serialize)]
struct EnumDump<'a> {
    full_name: &'a str,
    long_name: &'a str,
    #[serde(skip_serializing_if = "Comment::is_empty")]
    comments: &'a Comment,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    options: Options,
    values: Vec<ValueDump<'a>>,
}

#[derive(Debug, Serialize)]
struct ValueDump<'a> {
    name: &'a str,
    number: i32,
    #[serde(skip_serializing_if = "Comment::is_empty")]
    comments: &'a Comment,
}

#[derive(Debug, Serialize)]
struct ExtensionDump<'a> {
    full_name: &'a str,
    long_name: &'a str,
    extendee: &'a str,
    number: i32,
    #[serde(skip_serializing_if = "Comment::is_empty")]
    comments: &'a Comment,
}

#[derive(Debug, Serialize)]
struct ServiceDump<'a> {
    full_name: &'a str,
    #[serde(skip_serializing_if = "Comment::is_empty")]
    comments: &'a Comment,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    options: Options,
    methods: Vec<MethodDump<'a>>,
}

#[derive(Debug, Serialize)]
struct MethodDump<'a> {
    name: &'a str,
    input: &'a str,
    output: &'a str,
    client_streaming: bool,
    server_streaming: bool,
    #[serde(skip_serializing_if = "Comment::is_empty")]
    comments: &'a Comment,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    options: Options,
}

#[derive(Debug, Serialize)]
struct ImportDump<'a> {
    kind: &'static str,
    full_name: &'a str,
    file: &'a str,
}

impl<'a> FileDump<'a> {
    pub fn new(file: FileRef<'a>, include_imports: bool) -> Self {
        let data = file.data();
        Self {
            name: data.name(),
            package: data.package(),
            syntax: data.syntax(),
            comments: data.package_comments(),
            options: render_options(data.option_extensions()),
            enums: file.enums().map(EnumDump::new).collect(),
            extensions: file.extensions().map(ExtensionDump::new).collect(),
            messages: file.messages().map(MessageDump::new).collect(),
            services: file.services().map(ServiceDump::new).collect(),
            imports: include_imports.then(|| file.imports().map(ImportDump::new).collect()),
        }
    }

    pub fn to_text(&self) -> String {
        let mut out = String::new();
        let syntax = if self.syntax.is_empty() { "proto2" } else { self.syntax };
        let _ = writeln!(out, "file {} (package {}, {syntax})", self.name, self.package);
        for e in &self.enums {
            e.write_text(&mut out, 1);
        }
        for ext in &self.extensions {
            ext.write_text(&mut out, 1);
        }
        for m in &self.messages {
            m.write_text(&mut out, 1);
        }
        for s in &self.services {
            s.write_text(&mut out, 1);
        }
        for import in self.imports.iter().flatten() {
            let _ = writeln!(
                out,
                "  import {} {} from {}",
                import.kind, import.full_name, import.file
            );
        }
        out
    }
}

impl<'a> MessageDump<'a> {
    fn new(message: MessageRef<'a>) -> Self {
        let data = message.data();
        Self {
            full_name: data.full_name(),
            long_name: data.long_name(),
            comments: data.comments(),
            options: render_options(data.option_extensions()),
            fields: message
                .fields()
                .map(|f| {
                    let f = f.data();
                    FieldDump {
                        name: f.name(),
                        number: f.number(),
                        full_name: f.full_name(),
                        comments: f.comments(),
                        options: render_options(f.option_extensions()),
                    }
                })
                .collect(),
            enums: message.enums().map(EnumDump::new).collect(),
            extensions: message.extensions().map(ExtensionDump::new).collect(),
            messages: message.messages().map(MessageDump::new).collect(),
        }
    }

    fn write_text(&self, out: &mut String, depth: usize) {
        line(out, depth, &format!("message {}", self.full_name), &self.options, self.comments);
        for f in &self.fields {
            let text = format!("field {} = {}", f.name, f.number);
            line(out, depth + 1, &text, &f.options, f.comments);
        }
        for e in &self.enums {
            e.write_text(out, depth + 1);
        }
        for ext in &self.extensions {
            ext.write_text(out, depth + 1);
        }
        for m in &self.messages {
            m.write_text(out, depth + 1);
        }
    }
}

impl<'a> EnumDump<'a> {
    fn new(e: EnumRef<'a>) -> Self {
        let data = e.data();
        Self {
            full_name: data.full_name(),
            long_name: data.long_name(),
            comments: data.comments(),
            options: render_options(data.option_extensions()),
            values: e
                .values()
                .map(|v| {
                    let v = v.data();
                    ValueDump {
                        name: v.name(),
                        number: v.number(),
                        comments: v.comments(),
                    }
                })
                .collect(),
        }
    }

    fn write_text(&self, out: &mut String, depth: usize) {
        line(out, depth, &format!("enum {}", self.full_name), &self.options, self.comments);
        for v in &self.values {
            let text = format!("{} = {}", v.name, v.number);
            line(out, depth + 1, &text, &Options::new(), v.comments);
        }
    }
}

impl<'a> ExtensionDump<'a> {
    fn new(ext: ExtensionRef<'a>) -> Self {
        let data = ext.data();
        Self {
            full_name: data.full_name(),
            long_name: data.long_name(),
            extendee: data.extendee(),
            number: data.proto().number(),
            comments: data.comments(),
        }
    }

    fn write_text(&self, out: &mut String, depth: usize) {
        let head = format!("extend {} with {} = {}", self.extendee, self.long_name, self.number);
        line(out, depth, &head, &Options::new(), self.comments);
    }
}

impl<'a> ServiceDump<'a> {
    fn new(service: ServiceRef<'a>) -> Self {
        let data = service.data();
        Self {
            full_name: data.full_name(),
            comments: data.comments(),
            options: render_options(data.option_extensions()),
            methods: service.methods().map(MethodDump::new).collect(),
        }
    }

    fn write_text(&self, out: &mut String, depth: usize) {
        line(out, depth, &format!("service {}", self.full_name), &self.options, self.comments);
        for m in &self.methods {
            let stream = |on: bool| if on { "stream " } else { "" };
            let head = format!(
                "rpc {}({}{}) returns ({}{})",
                m.name,
                stream(m.client_streaming),
                m.input,
                stream(m.server_streaming),
                m.output
            );
            line(out, depth + 1, &head, &m.options, m.comments);
        }
    }
}

impl<'a> MethodDump<'a> {
    fn new(method: MethodRef<'a>) -> Self {
        let data = method.data();
        // Prefer the resolved message's name; fall back to the raw type name.
        let resolved =
            |m: Option<MessageRef<'a>>, raw: &'a str| m.map_or(raw, |m| m.data().full_name());
        Self {
            name: data.name(),
            input: resolved(method.input(), data.input_type()),
            output: resolved(method.output(), data.output_type()),
            client_streaming: data.client_streaming(),
            server_streaming: data.server_streaming(),
            comments: data.comments(),
            options: render_options(data.option_extensions()),
        }
    }
}

impl<'a> ImportDump<'a> {
    fn new(import: ImportRef<'a>) -> Self {
        let kind = match import.import() {
            Import::Message(_) => "message",
            Import::Enum(_) => "enum",
            Import::Extension(_) => "extension",
        };
        Self {
            kind,
            full_name: import.full_name(),
            file: import.file().data().name(),
        }
    }
}

fn line(out: &mut String, depth: usize, head: &str, options: &Options, comments: &Comment) {
    let _ = write!(out, "{}{head}", "  ".repeat(depth));
    if !options.is_empty() {
        let rendered: Vec<String> = options.iter().map(|(k, v)| format!("({k}) = {v}")).collect();
        let _ = write!(out, " [{}]", rendered.join(", "));
    }
    if let Some(first) = comments.to_string().lines().next().filter(|l| !l.is_empty()) {
        let _ = write!(out, "  // {first}");
    }
    out.push('\n');
}

fn render_options(options: &OptionExtensions) -> Options {
    options
        .iter()
        .map(|(name, value)| (name.to_string(), render_value(value)))
        .collect()
}

fn render_value(value: &Value) -> String {
    match value {
        Value::Bool(v) => v.to_string(),
        Value::I32(v) => v.to_string(),
        Value::I64(v) => v.to_string(),
        Value::U32(v) => v.to_string(),
        Value::U64(v) => v.to_string(),
        Value::F32(v) => v.to_string(),
        Value::F64(v) => v.to_string(),
        Value::String(v) => format!("{v:?}"),
        Value::EnumNumber(v) => v.to_string(),
        Value::List(items) => {
            let items: Vec<String> = items.iter().map(render_value).collect();
            format!("[{}]", items.join(", "))
        }
        other => format!("{other:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_json() {
        let options = DumpOptions::from_parameters(&Parameters::parse("")).expect("options");
        assert_eq!(options.format, Format::Json);
        assert_eq!(options.output_name("a/b.proto"), "a/b.tree.json");
        assert!(!options.include_imports);
    }

    #[test]
    fn reads_text_format_and_suffix() {
        let params = Parameters::parse("format=text,suffix=.outline,include_imports");
        let options = DumpOptions::from_parameters(&params).expect("options");
        assert_eq!(options.format, Format::Text);
        assert_eq!(options.output_name("x.proto"), "x.outline");
        assert!(options.include_imports);
    }

    #[test]
    fn rejects_unknown_formats() {
        let err = DumpOptions::from_parameters(&Parameters::parse("format=yaml"))
            .expect_err("yaml");
        assert!(err.to_string().contains("yaml"));
    }

    #[test]
    fn renders_scalar_and_list_values() {
        assert_eq!(render_value(&Value::String("hi".into())), "\"hi\"");
        assert_eq!(
            render_value(&Value::List(vec![Value::I32(1), Value::Bool(true)])),
            "[1, true]"
        );
    }
}
