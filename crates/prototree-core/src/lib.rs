//! # prototree-core
//!
//! Assembles the `FileDescriptorProto`s of a protoc plugin request into one
//! cross-referenced tree that code generators query directly.
//!
//! Every entity of the tree carries:
//!
//! - its **long name** (nested within the file, `Outer.Inner.field`) and its
//!   **full name** (package-qualified with a leading dot, `.pkg.Outer.Inner.field`);
//! - its **comments**, matched through the entity's `SourceCodeInfo` location path;
//! - its **custom options**: every registered extension set on its options message;
//! - a link to its parent (message, enum, service) and its file.
//!
//! Each file additionally lists the top-level entities it imports from its
//! direct dependencies.
//!
//! ## Modules
//!
//! - [`comments`]: location paths and the comment index
//! - [`naming`]: long/full names and descriptor tag numbers
//! - [`registry`]: extension registry backed by a `prost_reflect` pool
//! - [`options`]: custom-option scanning
//! - [`model`] / [`view`]: the arena and its borrowed views
//! - [`batch`]: the batch driver
//! - [`plugin`]: protoc request/response harness

pub mod batch;
mod builder;
pub mod comments;
pub mod error;
mod imports;
pub mod model;
pub mod naming;
pub mod options;
pub mod plugin;
pub mod registry;
pub mod view;

#[cfg(test)]
pub(crate) mod testing;

pub use batch::{assemble, assemble_files};
pub use comments::{Comment, CommentIndex, LocationPath};
pub use error::{Error, Result};
pub use model::{
    Common, DescriptorSet, Enum, EnumId, EnumValue, EnumValueId, Extension, ExtensionId, Field,
    FieldId, File, FileId, Import, Message, MessageId, Method, MethodId, Service, ServiceId,
};
pub use options::OptionExtensions;
pub use plugin::{GeneratedFile, Generator, Parameters, Request};
pub use registry::ExtensionRegistry;
pub use view::{
    EnumRef, EnumValueRef, ExtensionRef, FieldRef, FileRef, ImportRef, MessageRef, MethodRef,
    ServiceRef,
};
