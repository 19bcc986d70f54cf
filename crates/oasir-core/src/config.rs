use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use serde::Deserialize;

use crate::error::ConfigError;

/// Top-level project configuration loaded from `.oasir.yaml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OasirConfig {
    pub input: String,
    pub naming: NamingConfig,
    pub pagination: PaginationRules,
    /// Name of the response analyzer used for operations with handler sources.
    pub response_analyzer: Option<String>,
}

impl Default for OasirConfig {
    fn default() -> Self {
        Self {
            input: "openapi.yaml".to_string(),
            naming: NamingConfig::default(),
            pagination: PaginationRules::default(),
            response_analyzer: None,
        }
    }
}

/// Operation naming strategy, aliases, and extra reserved schema names.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NamingConfig {
    pub strategy: NamingStrategy,
    /// Map from resolved operation name (operationId or route-derived) to custom alias.
    pub aliases: IndexMap<String, String>,
    /// Names the schema allocator must never hand out, on top of the built-in set.
    pub reserved: Vec<String>,
}

/// How operation names are derived.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NamingStrategy {
    #[default]
    UseOperationId,
    UseRouteBased,
}

/// Heuristic data for pagination inference. Kept as configuration so the
/// rules can be tuned per API without touching the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PaginationRules {
    /// HTTP methods (lowercase) eligible for pagination.
    pub methods: Vec<String>,
    /// Canonical-name prefixes that mark a collection fetch.
    pub name_prefixes: Vec<String>,
    /// Property names (compared in snake_case) that carry a continuation cursor.
    pub cursor_fields: Vec<String>,
    /// Preferred names of the array property holding the page items.
    pub items_fields: Vec<String>,
}

impl Default for PaginationRules {
    fn default() -> Self {
        fn strings(items: &[&str]) -> Vec<String> {
            items.iter().map(|s| s.to_string()).collect()
        }
        Self {
            methods: strings(&["get"]),
            name_prefixes: strings(&["list"]),
            cursor_fields: strings(&[
                "cursor",
                "next_cursor",
                "next",
                "next_token",
                "next_page_token",
                "page_token",
                "continuation_token",
                "after",
                "starting_after",
            ]),
            items_fields: strings(&["data", "items", "results"]),
        }
    }
}

/// Default config file name.
pub const CONFIG_FILE_NAME: &str = ".oasir.yaml";

/// Load config from a YAML file. Returns `None` if the file doesn't exist.
pub fn load_config(path: &Path) -> Result<Option<OasirConfig>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let config: OasirConfig =
        serde_yaml_ng::from_str(&content).map_err(|source| ConfigError::Yaml {
            path: path.display().to_string(),
            source,
        })?;
    Ok(Some(config))
}

/// Generate the default config file content.
pub fn default_config_content() -> &'static str {
    r#"# oasir configuration
input: openapi.yaml

naming:
  strategy: use_operation_id  # use_operation_id | use_route_based
  aliases: {}
    # users.listAll: listUsers     # resolved name -> custom name
  reserved: []                  # extra schema names the allocator must avoid

pagination:
  methods: [get]
  name_prefixes: [list]
  cursor_fields: [cursor, next_cursor, next, next_token, next_page_token, page_token, continuation_token, after, starting_after]
  items_fields: [data, items, results]

# response_analyzer: express   # analyzer used for operations with handler sources
"#
}
