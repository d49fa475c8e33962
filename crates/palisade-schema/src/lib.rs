mod compiler;
mod document;
mod registry;

pub use compiler::compile;
pub use document::{Definition, PermissionRule, SchemaDocument};
pub use registry::{SchemaRegistry, SchemaSnapshot};
