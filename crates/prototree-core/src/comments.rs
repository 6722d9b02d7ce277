//! Documentation recovered from `SourceCodeInfo`.
//!
//! `protoc` stores comments apart from the descriptors they describe. Each
//! `Location` carries a *path*: alternating field tag numbers and repeated
//! indices leading from the `FileDescriptorProto` to the element. For example
//! `[4, 0, 2, 1]` is `message_type[0].field[1]`.
//!
//! We index locations by the dot-joined path (`"4.0.2.1"`) and hand each
//! builder the comment for the path it computes for itself.

use prost_types::SourceCodeInfo;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

/// A positional path into a `FileDescriptorProto`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct LocationPath(Vec<i32>);

impl LocationPath {
    pub fn root() -> Self {
        Self::default()
    }

    /// Path of the `index`-th element of the repeated field `tag` below `self`.
    pub fn child(&self, tag: i32, index: usize) -> Self {
        let mut segments = self.0.clone();
        segments.push(tag);
        segments.push(i32::try_from(index).unwrap_or(i32::MAX));
        Self(segments)
    }

    /// Path of the singular field `tag` below `self`.
    pub fn field(&self, tag: i32) -> Self {
        let mut segments = self.0.clone();
        segments.push(tag);
        Self(segments)
    }

    pub fn segments(&self) -> &[i32] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<i32>> for LocationPath {
    fn from(segments: Vec<i32>) -> Self {
        Self(segments)
    }
}

impl fmt::Display for LocationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

/// Comments attached to one element of a proto file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Comment {
    pub leading: String,
    pub trailing: String,
    pub detached: Vec<String>,
}

impl Comment {
    pub fn is_empty(&self) -> bool {
        self.leading.is_empty() && self.trailing.is_empty() && self.detached.is_empty()
    }
}

/// Leading comment, then trailing comment, trimmed. Detached blocks are left out.
impl fmt::Display for Comment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut text = String::new();
        if !self.leading.is_empty() {
            text.push_str(&self.leading);
            text.push('\n');
        }
        text.push_str(&self.trailing);
        f.write_str(text.trim())
    }
}

/// Comments of a single file keyed by dot-joined location path.
#[derive(Debug, Clone, Default)]
pub struct CommentIndex {
    by_path: HashMap<String, Comment>,
}

impl CommentIndex {
    pub fn parse(info: Option<&SourceCodeInfo>) -> Self {
        let mut by_path = HashMap::new();
        let Some(info) = info else {
            return Self { by_path };
        };

        for loc in &info.location {
            let leading = loc.leading_comments.as_deref().unwrap_or("");
            let trailing = loc.trailing_comments.as_deref().unwrap_or("");
            if leading.is_empty() && trailing.is_empty() && loc.leading_detached_comments.is_empty()
            {
                continue;
            }

            let key = LocationPath::from(loc.path.clone()).to_string();
            by_path.insert(
                key,
                Comment {
                    leading: leading.strip_suffix('\n').unwrap_or(leading).to_string(),
                    trailing: scrub(trailing),
                    detached: loc.leading_detached_comments.clone(),
                },
            );
        }

        Self { by_path }
    }

    /// Comment at `path`, or an empty comment when nothing was authored there.
    pub fn get(&self, path: &LocationPath) -> Comment {
        self.by_path
            .get(&path.to_string())
            .cloned()
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.by_path.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_path.is_empty()
    }
}

fn scrub(text: &str) -> String {
    text.replace("\n ", "\n").trim().to_string()
}
