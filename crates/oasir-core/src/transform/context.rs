use crate::error::TransformError;
use crate::ir::{Diagnostic, DiagnosticKind, SchemaRegistry};
use crate::parse::schema::SchemaOrRef;

use super::name_allocator::{ReservedWords, allocate};

/// State owned by exactly one transform run.
///
/// Every stage that reads or writes the schema table gets it through this
/// object; a new run starts from a fresh context.
#[derive(Debug)]
pub struct TransformContext {
    pub(crate) registry: SchemaRegistry,
    pub(crate) reserved: ReservedWords,
    pub(crate) diagnostics: Diagnostics,
}

impl TransformContext {
    pub fn new(extra_reserved: &[String]) -> Self {
        Self {
            registry: SchemaRegistry::new(),
            reserved: ReservedWords::new(extra_reserved),
            diagnostics: Diagnostics::default(),
        }
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics.0
    }

    /// Allocate a free name from `candidates` and register `schema` under it.
    /// Nothing can write to the registry between the two steps.
    pub fn register_synthesized(
        &mut self,
        candidates: &[String],
        schema: SchemaOrRef,
    ) -> Result<String, TransformError> {
        let name = allocate(&self.registry, &self.reserved, candidates)?;
        log::debug!("allocated schema name `{name}`");
        self.registry.insert_synthesized(name.clone(), schema)?;
        Ok(name)
    }

    pub(crate) fn into_parts(self) -> (SchemaRegistry, Vec<Diagnostic>) {
        (self.registry, self.diagnostics.0)
    }
}

/// Recoverable conditions met during a run, in the order they occurred.
#[derive(Debug, Default)]
pub struct Diagnostics(Vec<Diagnostic>);

impl Diagnostics {
    /// Log the condition and keep it for the finalized IR.
    pub fn record(
        &mut self,
        kind: DiagnosticKind,
        operation: Option<&str>,
        message: impl Into<String>,
    ) {
        let diagnostic = Diagnostic {
            kind,
            operation: operation.map(str::to_string),
            message: message.into(),
        };
        log::warn!("{diagnostic}");
        self.0.push(diagnostic);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
