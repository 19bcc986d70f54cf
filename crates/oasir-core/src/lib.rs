pub mod config;
pub mod error;
pub mod ir;
pub mod parse;
pub mod transform;

/// A generated file with path and content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    pub path: String,
    pub content: String,
}

/// Turns a finalized IR into source files.
///
/// A renderer only ever sees a finished IR: every `$ref` resolves,
/// operation names are unique and schema names are free of reserved words.
pub trait Renderer {
    type Error: std::error::Error;
    fn render(&self, ir: &ir::IrSpec) -> Result<Vec<GeneratedFile>, Self::Error>;
}
