use indexmap::IndexMap;

use super::types::NormalizedName;
use crate::parse::parameter::ParameterLocation;
use crate::parse::schema::{SCHEMA_REF_PREFIX, SchemaOrRef};
use crate::parse::security::{ApiKeyLocation, SecuritySchemeType};

pub use crate::parse::operation::HttpMethod;

/// Identity of one method declared at one path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OperationEntry {
    pub method: HttpMethod,
    pub path: String,
    pub tag: String,
}

/// An operation after identity assignment and synthesis.
#[derive(Debug, Clone)]
pub struct TunedOperation {
    pub entry: OperationEntry,
    /// Canonical name; `name.camel_case` is unique across the document.
    pub name: NormalizedName,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub deprecated: bool,
    /// Path-level and operation-level parameters, merged and resolved.
    pub parameters: Vec<IrParameter>,
    /// Parameters composed from security requirements. Never required.
    pub security: Vec<SecurityParameter>,
    /// Content type to synthesized input schema name, in declaration order.
    pub request_schemas: IndexMap<String, String>,
    pub responses: Vec<ResponseItem>,
}

impl TunedOperation {
    pub fn canonical_name(&self) -> &str {
        &self.name.camel_case
    }

    pub fn method(&self) -> HttpMethod {
        self.entry.method
    }

    pub fn path(&self) -> &str {
        &self.entry.path
    }

    pub fn tag(&self) -> &str {
        &self.entry.tag
    }

    /// Pointer to the primary synthesized input schema.
    pub fn request_schema_ref(&self) -> Option<String> {
        self.request_schemas
            .values()
            .next()
            .map(|name| format!("{SCHEMA_REF_PREFIX}{name}"))
    }
}

/// A declared parameter after merging and `$ref` resolution.
#[derive(Debug, Clone)]
pub struct IrParameter {
    pub name: NormalizedName,
    pub original_name: String,
    pub location: ParameterLocation,
    pub schema: Option<SchemaOrRef>,
    pub required: bool,
    pub description: Option<String>,
    pub deprecated: bool,
}

/// A synthetic authentication parameter. In a synthesized input schema its
/// field is tagged `input`; `location` says where it travels on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityParameter {
    pub name: String,
    pub location: ApiKeyLocation,
    pub scheme_name: String,
    pub scheme_type: SecuritySchemeType,
    /// `bearer`, `basic`, ... for http schemes; the renderer applies the prefix.
    pub http_scheme: Option<String>,
    /// Always false.
    pub required: bool,
}

/// One response an operation can produce.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseItem {
    pub status_code: String,
    pub content_type: Option<String>,
    pub headers: Vec<String>,
    pub body_schema: Option<SchemaOrRef>,
    pub description: Option<String>,
}

/// Best-effort pagination classification for one operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationHint {
    pub operation_name: String,
    pub paginated: bool,
    pub cursor_field: Option<String>,
    pub items_field: Option<String>,
}
