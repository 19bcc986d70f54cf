use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    #[error("failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported OpenAPI version: {0}")]
    UnsupportedVersion(String),
}

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("unresolved reference: {0}")]
    UnresolvedRef(String),

    #[error("circular reference detected: {0}")]
    CircularRef(String),

    #[error("invalid reference format: {0}")]
    InvalidRefFormat(String),
}

#[derive(Debug, Error)]
pub enum TransformError {
    #[error("resolve error: {0}")]
    Resolve(#[from] ResolveError),

    #[error("security scheme `{scheme}` is missing required field `{field}`")]
    MissingSchemeField { scheme: String, field: &'static str },

    #[error("no free schema name for `{0}`; allocator suffixes exhausted")]
    NameCollisionExhaustion(String),

    #[error("schema `{0}` registered twice in one run")]
    RegistryConflict(String),

    #[error("unknown response analyzer: {0}")]
    UnknownAnalyzer(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Yaml {
        path: String,
        #[source]
        source: serde_yaml_ng::Error,
    },
}
