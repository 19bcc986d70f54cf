pub mod operations;
pub mod registry;
pub mod schemas;
pub mod types;

pub use operations::*;
pub use registry::SchemaRegistry;
pub use schemas::*;
pub use types::{Diagnostic, DiagnosticKind, IrModule, IrSpec, NormalizedName};
