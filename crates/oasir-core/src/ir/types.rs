use std::fmt;

use indexmap::IndexMap;

use super::operations::{PaginationHint, TunedOperation};
use super::registry::SchemaRegistry;
use super::schemas::{MergedShape, VariantSet};
use crate::parse::spec::OpenApiSpec;

/// The finalized intermediate representation handed to renderers.
///
/// Built once per run and read-only afterwards: fields are reachable through
/// accessors only, and the registry exposes no public mutators.
#[derive(Debug, Clone)]
pub struct IrSpec {
    pub(crate) document: OpenApiSpec,
    pub(crate) operations: Vec<TunedOperation>,
    pub(crate) registry: SchemaRegistry,
    pub(crate) variant_sets: IndexMap<String, VariantSet>,
    pub(crate) compositions: IndexMap<String, MergedShape>,
    pub(crate) pagination: IndexMap<String, PaginationHint>,
    pub(crate) modules: Vec<IrModule>,
    pub(crate) diagnostics: Vec<Diagnostic>,
}

impl IrSpec {
    /// The input document, mutated to carry synthesized schemas.
    pub fn document(&self) -> &OpenApiSpec {
        &self.document
    }

    pub fn operations(&self) -> &[TunedOperation] {
        &self.operations
    }

    pub fn operation(&self, canonical_name: &str) -> Option<&TunedOperation> {
        self.operations
            .iter()
            .find(|op| op.canonical_name() == canonical_name)
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    /// Variant sets of registry schemas that are `oneOf` / `anyOf` unions.
    pub fn variant_sets(&self) -> &IndexMap<String, VariantSet> {
        &self.variant_sets
    }

    /// Merged shapes of registry schemas composed with `allOf`.
    pub fn compositions(&self) -> &IndexMap<String, MergedShape> {
        &self.compositions
    }

    /// Pagination hints keyed by canonical operation name.
    pub fn pagination(&self) -> &IndexMap<String, PaginationHint> {
        &self.pagination
    }

    pub fn modules(&self) -> &[IrModule] {
        &self.modules
    }

    /// Recoverable conditions met while building.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }
}

/// A module groups operations by tag.
#[derive(Debug, Clone)]
pub struct IrModule {
    pub name: NormalizedName,
    pub operations: Vec<usize>, // indices into IrSpec.operations
}

/// A recoverable condition. The run continued with a local default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub operation: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// A media type declared no schema; an empty object was substituted.
    EmptyMediaType,
    /// A parameter replaced a body property of the same name.
    ParameterShadowsBodyField,
    /// Two parameters in different locations share a name; the later one
    /// was keyed with its location appended.
    ParameterNameClash,
    /// A security parameter was dropped because a field already used its name.
    SecurityFieldShadowed,
    /// A security scheme type that yields no parameter.
    UnsupportedSecurityScheme,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.operation {
            Some(op) => write!(f, "{op}: {}", self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

/// A name with multiple casing variants pre-computed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NormalizedName {
    pub original: String,
    pub pascal_case: String,
    pub camel_case: String,
    pub snake_case: String,
    pub screaming_snake: String,
}

impl fmt::Display for NormalizedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.original)
    }
}
