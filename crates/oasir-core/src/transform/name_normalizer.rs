use heck::{ToLowerCamelCase, ToPascalCase, ToShoutySnakeCase, ToSnakeCase};

use crate::ir::{HttpMethod, NormalizedName};

/// Delimiters that separate a namespace prefix from an operation identifier,
/// as in `users.list`, `billing:createInvoice` or `admin/deleteUser`.
const NAMESPACE_DELIMITERS: &[char] = &['.', ':', '/'];

/// Create a `NormalizedName` from an arbitrary string, computing all casing variants.
pub fn normalize_name(name: &str) -> NormalizedName {
    let sanitized = sanitize_identifier(name);

    NormalizedName {
        original: name.to_string(),
        pascal_case: sanitized.to_pascal_case(),
        camel_case: sanitized.to_lower_camel_case(),
        snake_case: sanitized.to_snake_case(),
        screaming_snake: sanitized.to_shouty_snake_case(),
    }
}

/// Derive a camelCase operation name from HTTP method + path.
///
/// Braces are stripped and every segment (parameters included) is kept, so
/// the name is a pure function of its inputs:
/// - `GET /users` → `getUsers`
/// - `GET /users/{id}/orders` → `getUsersIdOrders`
/// - `DELETE /users/{user_id}` → `deleteUsersUserId`
pub fn derive_operation_name(method: HttpMethod, path: &str) -> String {
    let words: Vec<&str> = path
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();
    if words.is_empty() {
        return method.as_lower().to_string();
    }
    format!("{} {}", method.as_lower(), words.join(" ")).to_lower_camel_case()
}

/// Sanitize an explicit `operationId`: drop any namespace prefix, then
/// lower-camel-case what is left. Returns `None` when nothing usable remains.
pub fn sanitize_operation_id(operation_id: &str) -> Option<String> {
    let trimmed = operation_id.trim();
    let local = trimmed
        .rsplit(NAMESPACE_DELIMITERS)
        .find(|segment| segment.chars().any(char::is_alphanumeric))?;
    let name = local.to_lower_camel_case();
    (!name.is_empty()).then_some(name)
}

/// The whole `operationId`, namespace included, lower-camel-cased.
pub fn qualified_operation_id(operation_id: &str) -> Option<String> {
    let name = operation_id.trim().to_lower_camel_case();
    (!name.is_empty()).then_some(name)
}

/// First static (non-parameter) segment of a path.
/// e.g. "/pets/{petId}" → "pets", "/{tenant}/store" → "store"
pub fn first_static_segment(path: &str) -> Option<&str> {
    path.split('/')
        .find(|s| !s.is_empty() && !(s.starts_with('{') && s.ends_with('}')))
}

/// Sanitize a string to be a valid identifier.
fn sanitize_identifier(name: &str) -> String {
    let mut result = String::with_capacity(name.len());
    let mut prev_was_separator = false;

    for ch in name.chars() {
        if ch.is_alphanumeric() {
            if prev_was_separator && !result.is_empty() {
                result.push('_');
            }
            result.push(ch);
            prev_was_separator = false;
        } else {
            prev_was_separator = true;
        }
    }

    if result.is_empty() {
        return "unnamed".to_string();
    }

    result
}
