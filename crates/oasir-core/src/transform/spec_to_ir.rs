use indexmap::IndexMap;

use crate::config::{NamingStrategy, OasirConfig, PaginationRules};
use crate::error::TransformError;
use crate::ir::*;
use crate::parse::components::Components;
use crate::parse::operation::Operation;
use crate::parse::parameter::ParameterOrRef;
use crate::parse::ref_resolve::{RefResolver, check_refs, check_schema_refs};
use crate::parse::security::SecurityRequirement;
use crate::parse::spec::OpenApiSpec;

use super::context::TransformContext;
use super::name_allocator::rename_reserved_schemas;
use super::operation_tuner::{OperationTuner, group_into_modules};
use super::response_analyzer::{AnalyzerRegistry, ResponseAnalyzer, document_responses};
use super::{pagination, request_synthesizer, security_composer, variant_detector};

/// Options controlling one transform run.
#[derive(Debug, Clone, Default)]
pub struct TransformOptions {
    pub naming_strategy: NamingStrategy,
    /// Resolved operation name (raw or sanitized `operationId`, or route-derived) to alias.
    pub aliases: IndexMap<String, String>,
    /// Schema names to avoid on top of the built-in reserved words.
    pub reserved: Vec<String>,
    pub pagination: PaginationRules,
    /// Name of the registered response analyzer to use.
    pub response_analyzer: Option<String>,
    /// Handler source per canonical operation name, fed to the analyzer.
    pub handler_sources: IndexMap<String, String>,
}

impl From<&OasirConfig> for TransformOptions {
    fn from(config: &OasirConfig) -> Self {
        Self {
            naming_strategy: config.naming.strategy,
            aliases: config.naming.aliases.clone(),
            reserved: config.naming.reserved.clone(),
            pagination: config.pagination.clone(),
            response_analyzer: config.response_analyzer.clone(),
            handler_sources: IndexMap::new(),
        }
    }
}

/// Transform a parsed OpenAPI document into the finalized IR.
pub fn transform(doc: OpenApiSpec) -> Result<IrSpec, TransformError> {
    transform_with_options(doc, &TransformOptions::default())
}

/// Transform with explicit options and no response analyzers.
pub fn transform_with_options(
    doc: OpenApiSpec,
    options: &TransformOptions,
) -> Result<IrSpec, TransformError> {
    transform_with_analyzers(doc, options, &AnalyzerRegistry::new())
}

/// Transform with explicit options, choosing the response analyzer from
/// `analyzers`.
///
/// All-or-nothing: any fatal error aborts the run and no IR is returned.
pub fn transform_with_analyzers(
    mut doc: OpenApiSpec,
    options: &TransformOptions,
    analyzers: &AnalyzerRegistry,
) -> Result<IrSpec, TransformError> {
    let analyzer = analyzers.select(options.response_analyzer.as_deref())?;
    let mut ctx = TransformContext::new(&options.reserved);

    // Phase 1: Seed the registry with component schemas
    let mut components = doc.components.take().unwrap_or_default();
    rename_reserved_schemas(&ctx.reserved, &mut doc, &mut components)?;
    for (name, schema) in std::mem::take(&mut components.schemas) {
        ctx.registry.insert_declared(name, schema)?;
    }

    // Phase 2: Tune every operation in document order
    let global_security = doc.default_security().to_vec();
    let mut tuner = OperationTuner::new(options.naming_strategy, &options.aliases);
    let mut operations = Vec::new();

    for (path, item) in doc.paths.iter_mut() {
        let path_parameters = item.parameters.clone();
        for method in HttpMethod::ALL {
            let Some(op) = item.operation_mut(method) else {
                continue;
            };
            let site = OperationSite {
                method,
                path: path.as_str(),
                path_parameters: &path_parameters,
                global_security: &global_security,
            };
            let tuned = build_operation(
                &mut ctx,
                &mut tuner,
                &components,
                site,
                op,
                analyzer.map(|a| (a, &options.handler_sources)),
            )?;
            operations.push(tuned);
        }
    }

    // Phase 3: Classify polymorphic schemas and infer pagination
    let (variant_sets, compositions, pagination) = {
        let resolver = RefResolver::new(Some(&components), ctx.registry.entries());
        let (variant_sets, compositions) = variant_detector::analyze_registry(&resolver, &ctx.registry)?;
        let pagination: IndexMap<String, PaginationHint> = operations
            .iter()
            .map(|op| {
                let hint = pagination::infer(&resolver, &options.pagination, op);
                (op.canonical_name().to_string(), hint)
            })
            .collect();
        (variant_sets, compositions, pagination)
    };

    // Phase 4: Finalize
    let modules = group_into_modules(&operations);
    let (registry, diagnostics) = ctx.into_parts();
    components.schemas = registry.entries().clone();
    doc.components = (components != Components::default()).then_some(components);
    check_refs(&doc)?;

    log::info!(
        "built IR: {} operations, {} schemas ({} synthesized), {} paginated, {} diagnostics",
        operations.len(),
        registry.len(),
        registry.synthesized_names().count(),
        pagination.values().filter(|h| h.paginated).count(),
        diagnostics.len()
    );

    Ok(IrSpec {
        document: doc,
        operations,
        registry,
        variant_sets,
        compositions,
        pagination,
        modules,
        diagnostics,
    })
}

/// Where an operation sits in the document.
struct OperationSite<'a> {
    method: HttpMethod,
    path: &'a str,
    path_parameters: &'a [ParameterOrRef],
    global_security: &'a [SecurityRequirement],
}

fn build_operation(
    ctx: &mut TransformContext,
    tuner: &mut OperationTuner<'_>,
    components: &Components,
    site: OperationSite<'_>,
    op: &mut Operation,
    analyzer: Option<(&dyn ResponseAnalyzer, &IndexMap<String, String>)>,
) -> Result<TunedOperation, TransformError> {
    let (mut tuned, merged) = {
        let resolver = RefResolver::new(Some(components), ctx.registry.entries());
        let (mut tuned, merged) =
            tuner.tune(&resolver, site.method, site.path, site.path_parameters, op)?;

        tuned.security = security_composer::compose(
            &resolver,
            site.global_security,
            op.security.as_deref(),
            tuned.canonical_name(),
            &mut ctx.diagnostics,
        )?;

        let handler_source = analyzer
            .and_then(|(analyzer, sources)| Some((analyzer, sources.get(tuned.canonical_name())?)));
        tuned.responses = match handler_source {
            Some((analyzer, source)) => {
                let responses = analyzer.analyze(source);
                for schema in responses.iter().filter_map(|r| r.body_schema.as_ref()) {
                    check_schema_refs(&resolver, schema)?;
                }
                responses
            }
            None => document_responses(&resolver, &op.responses)?,
        };
        (tuned, merged)
    };

    op.parameters = merged.into_iter().map(ParameterOrRef::Parameter).collect();
    tuned.request_schemas = request_synthesizer::synthesize(ctx, components, &tuned, op)?;
    Ok(tuned)
}
