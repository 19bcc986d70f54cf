use serde::{Deserialize, Serialize};

use super::schema::{FieldLocation, SchemaOrRef};

/// Where a declared parameter travels on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterLocation {
    Query,
    Header,
    Path,
    Cookie,
}

impl ParameterLocation {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParameterLocation::Query => "query",
            ParameterLocation::Header => "header",
            ParameterLocation::Path => "path",
            ParameterLocation::Cookie => "cookie",
        }
    }
}

impl From<ParameterLocation> for FieldLocation {
    fn from(location: ParameterLocation) -> Self {
        match location {
            ParameterLocation::Query => FieldLocation::Query,
            ParameterLocation::Header => FieldLocation::Header,
            ParameterLocation::Path => FieldLocation::Path,
            ParameterLocation::Cookie => FieldLocation::Cookie,
        }
    }
}

/// An API parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,

    #[serde(rename = "in")]
    pub location: ParameterLocation,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub required: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<SchemaOrRef>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub explode: Option<bool>,
}

impl Parameter {
    /// Identity used when merging path-level and operation-level lists.
    pub fn key(&self) -> (&str, ParameterLocation) {
        (self.name.as_str(), self.location)
    }

    /// Path parameters are required regardless of what the document says.
    pub fn is_required(&self) -> bool {
        self.required || self.location == ParameterLocation::Path
    }
}

/// A reference or inline parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParameterOrRef {
    Ref {
        #[serde(rename = "$ref")]
        ref_path: String,
    },
    Parameter(Parameter),
}
