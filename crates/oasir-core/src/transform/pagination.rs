use heck::ToSnakeCase;
use indexmap::IndexMap;

use crate::config::PaginationRules;
use crate::ir::{PaginationHint, ResponseItem, SchemaKind, TunedOperation};
use crate::parse::ref_resolve::RefResolver;
use crate::parse::schema::SchemaOrRef;

use super::variant_detector::merge_composition;

/// Status codes searched for the success response, in order.
const SUCCESS_STATUSES: [&str; 4] = ["200", "201", "2XX", "default"];

/// Classify one operation. Never fails: anything that cannot be resolved
/// just means "not paginated".
pub fn infer(
    resolver: &RefResolver<'_>,
    rules: &PaginationRules,
    op: &TunedOperation,
) -> PaginationHint {
    let mut hint = PaginationHint {
        operation_name: op.canonical_name().to_string(),
        paginated: false,
        cursor_field: None,
        items_field: None,
    };

    if !rules
        .methods
        .iter()
        .any(|m| m.eq_ignore_ascii_case(op.method().as_lower()))
    {
        return hint;
    }
    if !is_collection_fetch(rules, op.canonical_name(), op.path()) {
        return hint;
    }
    let Some(body) = success_body(&op.responses) else {
        return hint;
    };
    let Some(properties) = object_properties(resolver, body) else {
        return hint;
    };

    let items = items_field(resolver, rules, &properties);
    let cursor = properties
        .keys()
        .find(|name| rules.cursor_fields.contains(&name.to_snake_case()));

    if let (Some(items), Some(cursor)) = (items, cursor) {
        log::debug!(
            "{} looks paginated (items `{items}`, cursor `{cursor}`)",
            op.canonical_name()
        );
        hint.paginated = true;
        hint.items_field = Some(items.clone());
        hint.cursor_field = Some(cursor.clone());
    }
    hint
}

/// A plural resource (or a configured name prefix) with no trailing
/// identifier segment.
pub fn is_collection_fetch(rules: &PaginationRules, name: &str, path: &str) -> bool {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    if segments.last().is_some_and(|s| is_path_param(s)) {
        return false;
    }

    let prefixed = rules.name_prefixes.iter().any(|prefix| {
        name.strip_prefix(prefix.as_str()).is_some_and(|rest| {
            rest.chars()
                .next()
                .is_none_or(|c| c.is_uppercase() || c.is_ascii_digit())
        })
    });
    let plural = segments
        .iter()
        .rev()
        .find(|s| !is_path_param(s))
        .is_some_and(|s| is_plural(s));

    prefixed || plural
}

fn is_path_param(segment: &str) -> bool {
    segment.starts_with('{') && segment.ends_with('}')
}

fn is_plural(word: &str) -> bool {
    let word = word.to_ascii_lowercase();
    word.ends_with('s') && !word.ends_with("ss")
}

/// Body of the first success response, JSON content preferred.
fn success_body(responses: &[ResponseItem]) -> Option<&SchemaOrRef> {
    SUCCESS_STATUSES.iter().find_map(|status| {
        let candidates: Vec<&ResponseItem> = responses
            .iter()
            .filter(|r| r.status_code.eq_ignore_ascii_case(status))
            .filter(|r| r.body_schema.is_some())
            .collect();
        candidates
            .iter()
            .copied()
            .find(|r| r.content_type.as_deref().is_some_and(|ct| ct.contains("json")))
            .or_else(|| candidates.first().copied())
            .and_then(|r| r.body_schema.as_ref())
    })
}

fn object_properties(
    resolver: &RefResolver<'_>,
    body: &SchemaOrRef,
) -> Option<IndexMap<String, SchemaOrRef>> {
    let schema = resolver.deref_schema(body).ok()?;
    match SchemaKind::of_schema(schema) {
        SchemaKind::Object(object) => Some(object.properties.clone()),
        SchemaKind::Composition(_) => merge_composition(resolver, schema)
            .ok()
            .map(|shape| shape.properties),
        _ => None,
    }
}

/// Preferred item field names first, then any array property.
fn items_field<'p>(
    resolver: &RefResolver<'_>,
    rules: &PaginationRules,
    properties: &'p IndexMap<String, SchemaOrRef>,
) -> Option<&'p String> {
    let is_array = |schema: &SchemaOrRef| {
        resolver
            .deref_schema(schema)
            .is_ok_and(|resolved| resolved.is_array())
    };

    rules
        .items_fields
        .iter()
        .find_map(|preferred| {
            properties
                .get_key_value(preferred)
                .filter(|(_, schema)| is_array(*schema))
                .map(|(name, _)| name)
        })
        .or_else(|| {
            properties
                .iter()
                .find(|(_, schema)| is_array(*schema))
                .map(|(name, _)| name)
        })
}
