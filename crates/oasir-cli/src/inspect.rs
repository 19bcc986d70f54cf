use clap::ValueEnum;
use serde_json::{Value, json};
use thiserror::Error;

use oasir_core::ir::{IrSpec, TunedOperation};
use oasir_core::{GeneratedFile, Renderer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum InspectFormat {
    Yaml,
    Json,
}

impl InspectFormat {
    fn extension(self) -> &'static str {
        match self {
            InspectFormat::Yaml => "yaml",
            InspectFormat::Json => "json",
        }
    }
}

#[derive(Debug, Error)]
pub enum InspectError {
    #[error("failed to encode IR summary as JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to encode IR summary as YAML: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

/// Renders a one-file summary of the IR: operations, schemas, modules and
/// diagnostics.
pub struct InspectRenderer {
    pub format: InspectFormat,
}

impl Renderer for InspectRenderer {
    type Error = InspectError;

    fn render(&self, ir: &IrSpec) -> Result<Vec<GeneratedFile>, InspectError> {
        let summary = summary(ir);
        let content = match self.format {
            InspectFormat::Yaml => serde_yaml_ng::to_string(&summary)?,
            InspectFormat::Json => format!("{}\n", serde_json::to_string_pretty(&summary)?),
        };
        Ok(vec![GeneratedFile {
            path: format!("ir-summary.{}", self.format.extension()),
            content,
        }])
    }
}

fn summary(ir: &IrSpec) -> Value {
    let info = &ir.document().info;
    let registry = ir.registry();

    let operations: Vec<Value> = ir
        .operations()
        .iter()
        .map(|op| operation_summary(ir, op))
        .collect();

    let schemas: Vec<Value> = registry
        .names()
        .map(|name| {
            let kind = match ir.variant_sets().get(name) {
                Some(set) if set.is_discriminated() => "discriminated_union",
                Some(_) => "union",
                None if ir.compositions().contains_key(name) => "composition",
                None => "schema",
            };
            json!({
                "name": name,
                "kind": kind,
                "synthesized": registry.is_synthesized(name),
            })
        })
        .collect();

    let modules: Vec<Value> = ir
        .modules()
        .iter()
        .map(|m| {
            let operations: Vec<&str> = m
                .operations
                .iter()
                .filter_map(|&i| ir.operations().get(i))
                .map(|op| op.canonical_name())
                .collect();
            json!({ "name": m.name.original, "operations": operations })
        })
        .collect();

    let diagnostics: Vec<String> = ir.diagnostics().iter().map(ToString::to_string).collect();

    json!({
        "info": { "title": info.title, "version": info.version },
        "operations": operations,
        "schemas": schemas,
        "modules": modules,
        "diagnostics": diagnostics,
    })
}

fn operation_summary(ir: &IrSpec, op: &TunedOperation) -> Value {
    let parameters: Vec<String> = op
        .parameters
        .iter()
        .map(|p| format!("{} ({})", p.original_name, p.location.as_str()))
        .collect();
    let security: Vec<&str> = op.security.iter().map(|s| s.name.as_str()).collect();
    let responses: Vec<String> = op
        .responses
        .iter()
        .map(|r| match &r.content_type {
            Some(content_type) => format!("{} {content_type}", r.status_code),
            None => r.status_code.clone(),
        })
        .collect();
    let paginated = ir
        .pagination()
        .get(op.canonical_name())
        .is_some_and(|hint| hint.paginated);

    json!({
        "name": op.canonical_name(),
        "method": op.method().as_str(),
        "path": op.path(),
        "tag": op.tag(),
        "parameters": parameters,
        "security": security,
        "input": op.request_schemas,
        "responses": responses,
        "paginated": paginated,
    })
}
