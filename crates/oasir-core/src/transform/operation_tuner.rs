use std::collections::{BTreeMap, HashSet};

use indexmap::IndexMap;

use crate::config::NamingStrategy;
use crate::error::TransformError;
use crate::ir::{HttpMethod, IrModule, IrParameter, OperationEntry, TunedOperation};
use crate::parse::operation::Operation;
use crate::parse::parameter::{Parameter, ParameterLocation, ParameterOrRef};
use crate::parse::ref_resolve::RefResolver;

use super::name_normalizer::{
    derive_operation_name, first_static_segment, normalize_name, qualified_operation_id,
    sanitize_operation_id,
};

/// Tag for operations with neither a declared tag nor a static path segment.
pub const DEFAULT_TAG: &str = "default";

/// Assigns canonical identities to operations, in document order.
///
/// Holds the names handed out so far, so one tuner serves exactly one run.
pub struct OperationTuner<'o> {
    strategy: NamingStrategy,
    aliases: &'o IndexMap<String, String>,
    taken: HashSet<String>,
}

impl<'o> OperationTuner<'o> {
    pub fn new(strategy: NamingStrategy, aliases: &'o IndexMap<String, String>) -> Self {
        Self {
            strategy,
            aliases,
            taken: HashSet::new(),
        }
    }

    /// Name, tag and merged parameters for one operation. Returns the merged
    /// parameters as document objects too, so the caller can write them back.
    pub fn tune(
        &mut self,
        resolver: &RefResolver<'_>,
        method: HttpMethod,
        path: &str,
        path_parameters: &[ParameterOrRef],
        op: &Operation,
    ) -> Result<(TunedOperation, Vec<Parameter>), TransformError> {
        let name = self.canonical_name(method, path, op);
        let tag = operation_tag(path, op);
        let merged = merge_parameters(resolver, path_parameters, &op.parameters)?;

        log::debug!(
            "{} {path} -> {name} (tag `{tag}`, {} parameters)",
            method.as_str(),
            merged.len()
        );

        let tuned = TunedOperation {
            entry: OperationEntry {
                method,
                path: path.to_string(),
                tag,
            },
            name: normalize_name(&name),
            summary: op.summary.clone(),
            description: op.description.clone(),
            deprecated: op.deprecated.unwrap_or(false),
            parameters: merged.iter().map(ir_parameter).collect(),
            security: Vec::new(),
            request_schemas: IndexMap::new(),
            responses: Vec::new(),
        };
        Ok((tuned, merged))
    }

    /// Pick a name no earlier operation holds.
    ///
    /// Tried in order: the alias or sanitized `operationId` (route-derived
    /// when there is none), the full `operationId`, the route-derived name,
    /// then numeric suffixes on the first.
    pub fn canonical_name(&mut self, method: HttpMethod, path: &str, op: &Operation) -> String {
        let derived = derive_operation_name(method, path);
        let explicit = match self.strategy {
            NamingStrategy::UseOperationId => op.operation_id.as_deref(),
            NamingStrategy::UseRouteBased => None,
        };
        let primary = explicit
            .and_then(sanitize_operation_id)
            .unwrap_or_else(|| derived.clone());
        let aliased = explicit
            .and_then(|id| self.aliases.get(id))
            .or_else(|| self.aliases.get(&primary))
            .cloned();

        let mut candidates = vec![aliased.unwrap_or(primary)];
        candidates.extend(explicit.and_then(qualified_operation_id));
        candidates.push(derived);
        let candidates: Vec<String> = candidates
            .iter()
            .map(|c| normalize_name(c).camel_case)
            .collect();

        if let Some(free) = candidates.iter().find(|c| !self.taken.contains(*c)) {
            self.taken.insert(free.clone());
            return free.clone();
        }

        let base = &candidates[0];
        let mut suffix = 2u32;
        loop {
            let candidate = format!("{base}{suffix}");
            if self.taken.insert(candidate.clone()) {
                log::debug!("operation name `{base}` taken; using `{candidate}`");
                return candidate;
            }
            suffix += 1;
        }
    }
}

/// First declared tag, else the first static path segment, else `default`.
pub fn operation_tag(path: &str, op: &Operation) -> String {
    op.tags
        .iter()
        .map(|t| t.trim())
        .find(|t| !t.is_empty())
        .or_else(|| first_static_segment(path))
        .unwrap_or(DEFAULT_TAG)
        .to_string()
}

/// Merge path-level and operation-level parameters by `(name, location)`.
///
/// Path-level order is kept; an operation-level parameter replaces the
/// path-level one in place, new ones are appended. `$ref`s are resolved and
/// path parameters come out required.
pub fn merge_parameters(
    resolver: &RefResolver<'_>,
    path_level: &[ParameterOrRef],
    op_level: &[ParameterOrRef],
) -> Result<Vec<Parameter>, TransformError> {
    let mut merged: Vec<Parameter> = Vec::new();

    for declared in path_level.iter().chain(op_level) {
        let mut param = resolver.parameter(declared)?.clone();
        if param.location == ParameterLocation::Path {
            param.required = true;
        }
        match merged.iter_mut().find(|m| m.key() == param.key()) {
            Some(existing) => *existing = param,
            None => merged.push(param),
        }
    }

    Ok(merged)
}

fn ir_parameter(param: &Parameter) -> IrParameter {
    IrParameter {
        name: normalize_name(&param.name),
        original_name: param.name.clone(),
        location: param.location,
        schema: param.schema.clone(),
        required: param.is_required(),
        description: param.description.clone(),
        deprecated: param.deprecated.unwrap_or(false),
    }
}

/// One module per tag, sorted by tag name.
pub fn group_into_modules(operations: &[TunedOperation]) -> Vec<IrModule> {
    let mut groups: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (i, op) in operations.iter().enumerate() {
        groups.entry(op.tag()).or_default().push(i);
    }

    groups
        .into_iter()
        .map(|(tag, operations)| IrModule {
            name: normalize_name(tag),
            operations,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::components::Components;

    fn op(id: Option<&str>) -> Operation {
        Operation {
            operation_id: id.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn derives_name_and_tag_without_operation_id() {
        let aliases = IndexMap::new();
        let mut tuner = OperationTuner::new(NamingStrategy::UseOperationId, &aliases);
        let operation = op(None);

        let name = tuner.canonical_name(HttpMethod::Get, "/users/{id}/orders", &operation);
        assert_eq!(name, "getUsersIdOrders");
        assert_eq!(operation_tag("/users/{id}/orders", &operation), "users");
    }

    #[test]
    fn sanitizes_operation_id() {
        let aliases = IndexMap::new();
        let mut tuner = OperationTuner::new(NamingStrategy::UseOperationId, &aliases);
        let name = tuner.canonical_name(HttpMethod::Get, "/users", &op(Some("users.list_all")));
        assert_eq!(name, "listAll");
    }

    #[test]
    fn route_based_strategy_ignores_operation_id() {
        let aliases = IndexMap::new();
        let mut tuner = OperationTuner::new(NamingStrategy::UseRouteBased, &aliases);
        let name = tuner.canonical_name(HttpMethod::Post, "/users", &op(Some("createUser")));
        assert_eq!(name, "postUsers");
    }

    #[test]
    fn applies_aliases_by_raw_or_sanitized_name() {
        let mut aliases = IndexMap::new();
        aliases.insert("users.listAll".to_string(), "listUsers".to_string());
        aliases.insert("getHealth".to_string(), "ping".to_string());
        let mut tuner = OperationTuner::new(NamingStrategy::UseOperationId, &aliases);

        let listed = tuner.canonical_name(HttpMethod::Get, "/users", &op(Some("users.listAll")));
        let health = tuner.canonical_name(HttpMethod::Get, "/health", &op(None));
        assert_eq!(listed, "listUsers");
        assert_eq!(health, "ping");
    }

    #[test]
    fn collisions_fall_back_deterministically() {
        let aliases = IndexMap::new();
        let mut tuner = OperationTuner::new(NamingStrategy::UseOperationId, &aliases);

        let names = vec![
            tuner.canonical_name(HttpMethod::Get, "/users", &op(Some("users.list"))),
            tuner.canonical_name(HttpMethod::Get, "/orders", &op(Some("orders.list"))),
            tuner.canonical_name(HttpMethod::Get, "/orders", &op(Some("orders.list"))),
            tuner.canonical_name(HttpMethod::Get, "/orders", &op(Some("orders.list"))),
        ];
        assert_eq!(names, vec!["list", "ordersList", "getOrders", "list2"]);
    }

    #[test]
    fn explicit_tag_wins_and_root_path_defaults() {
        let tagged = Operation {
            tags: vec!["Pets".to_string(), "Other".to_string()],
            ..Default::default()
        };
        assert_eq!(operation_tag("/users", &tagged), "Pets");
        assert_eq!(operation_tag("/", &op(None)), DEFAULT_TAG);
        assert_eq!(operation_tag("/{tenant}", &op(None)), DEFAULT_TAG);
    }

    #[test]
    fn operation_parameters_override_path_parameters() {
        let yaml = r##"
parameters:
  Limit:
    name: limit
    in: query
    schema: { type: integer }
"##;
        let components: Components = serde_yaml_ng::from_str(yaml).unwrap();
        let schemas = IndexMap::new();
        let resolver = RefResolver::new(Some(&components), &schemas);

        let path_level: Vec<ParameterOrRef> = serde_yaml_ng::from_str(
            r##"
- { name: id, in: path, required: false, description: path-level }
- { name: verbose, in: query }
"##,
        )
        .unwrap();
        let op_level: Vec<ParameterOrRef> = serde_yaml_ng::from_str(
            r##"
- { name: verbose, in: query, required: true }
- { name: verbose, in: header }
- $ref: "#/components/parameters/Limit"
"##,
        )
        .unwrap();

        let merged = merge_parameters(&resolver, &path_level, &op_level).unwrap();
        let summary: Vec<_> = merged
            .iter()
            .map(|p| (p.name.as_str(), p.location.as_str(), p.required))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("id", "path", true),
                ("verbose", "query", true),
                ("verbose", "header", false),
                ("limit", "query", false),
            ]
        );
    }

    #[test]
    fn groups_modules_by_sorted_tag() {
        let aliases = IndexMap::new();
        let mut tuner = OperationTuner::new(NamingStrategy::UseOperationId, &aliases);
        let schemas = IndexMap::new();
        let resolver = RefResolver::new(None, &schemas);

        let mut operations = Vec::new();
        for (method, path) in [
            (HttpMethod::Get, "/users"),
            (HttpMethod::Get, "/accounts"),
            (HttpMethod::Post, "/users"),
        ] {
            let (tuned, _) = tuner.tune(&resolver, method, path, &[], &op(None)).unwrap();
            operations.push(tuned);
        }

        let modules = group_into_modules(&operations);
        let summary: Vec<_> = modules
            .iter()
            .map(|m| (m.name.original.as_str(), m.operations.clone()))
            .collect();
        assert_eq!(summary, vec![("accounts", vec![1]), ("users", vec![0, 2])]);
    }
}
