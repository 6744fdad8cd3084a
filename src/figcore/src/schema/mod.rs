pub mod binary_schema;
pub mod compiled;
pub mod document;
pub mod value;
pub mod varint;

pub use binary_schema::{DefKind, Field};
pub use compiled::CompiledSchema;
