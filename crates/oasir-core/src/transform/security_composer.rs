use crate::error::TransformError;
use crate::ir::{DiagnosticKind, SecurityParameter};
use crate::parse::ref_resolve::RefResolver;
use crate::parse::security::{
    ApiKeyLocation, SecurityRequirement, SecurityScheme, SecuritySchemeType,
};

use super::context::Diagnostics;

/// Header carrying credentials for `http`, `oauth2` and `openIdConnect` schemes.
pub const AUTHORIZATION_HEADER: &str = "authorization";

/// Compose the security parameters of one operation.
///
/// Global requirements come first; operation-level requirements are merged
/// onto them, replacing a global parameter that occupies the same slot
/// (location and name). Only the first scheme of each requirement object is
/// honored, so `{a: [], b: []}` contributes `a` alone.
pub fn compose(
    resolver: &RefResolver<'_>,
    global: &[SecurityRequirement],
    operation: Option<&[SecurityRequirement]>,
    operation_name: &str,
    diagnostics: &mut Diagnostics,
) -> Result<Vec<SecurityParameter>, TransformError> {
    let mut params = compose_level(resolver, global, operation_name, diagnostics)?;

    if let Some(requirements) = operation {
        for param in compose_level(resolver, requirements, operation_name, diagnostics)? {
            match params.iter_mut().find(|p| same_slot(p, &param)) {
                Some(existing) => *existing = param,
                None => params.push(param),
            }
        }
    }

    Ok(params)
}

fn compose_level(
    resolver: &RefResolver<'_>,
    requirements: &[SecurityRequirement],
    operation_name: &str,
    diagnostics: &mut Diagnostics,
) -> Result<Vec<SecurityParameter>, TransformError> {
    let mut params: Vec<SecurityParameter> = Vec::new();

    for requirement in requirements {
        // `{}` is the anonymous requirement.
        let Some(scheme_name) = requirement.keys().next() else {
            continue;
        };
        let scheme = resolver.security_scheme(scheme_name)?;

        match scheme_parameter(scheme_name, scheme)? {
            Some(param) => {
                if !params.iter().any(|p| same_slot(p, &param)) {
                    params.push(param);
                }
            }
            None => diagnostics.record(
                DiagnosticKind::UnsupportedSecurityScheme,
                Some(operation_name),
                format!("security scheme `{scheme_name}` is mutualTLS and yields no parameter"),
            ),
        }
    }

    Ok(params)
}

/// The parameter one scheme contributes, or `None` for schemes that travel
/// outside the request (mutual TLS).
pub fn scheme_parameter(
    scheme_name: &str,
    scheme: &SecurityScheme,
) -> Result<Option<SecurityParameter>, TransformError> {
    let param = match scheme.scheme_type {
        SecuritySchemeType::Http => SecurityParameter {
            name: AUTHORIZATION_HEADER.to_string(),
            location: ApiKeyLocation::Header,
            scheme_name: scheme_name.to_string(),
            scheme_type: scheme.scheme_type,
            http_scheme: scheme.scheme.as_deref().map(str::to_ascii_lowercase),
            required: false,
        },
        SecuritySchemeType::OAuth2 | SecuritySchemeType::OpenIdConnect => SecurityParameter {
            name: AUTHORIZATION_HEADER.to_string(),
            location: ApiKeyLocation::Header,
            scheme_name: scheme_name.to_string(),
            scheme_type: scheme.scheme_type,
            http_scheme: Some("bearer".to_string()),
            required: false,
        },
        SecuritySchemeType::ApiKey => {
            let location = scheme.location.ok_or_else(|| TransformError::MissingSchemeField {
                scheme: scheme_name.to_string(),
                field: "in",
            })?;
            let name = scheme
                .name
                .as_deref()
                .filter(|n| !n.trim().is_empty())
                .ok_or_else(|| TransformError::MissingSchemeField {
                    scheme: scheme_name.to_string(),
                    field: "name",
                })?;
            SecurityParameter {
                name: name.to_string(),
                location,
                scheme_name: scheme_name.to_string(),
                scheme_type: scheme.scheme_type,
                http_scheme: None,
                required: false,
            }
        }
        SecuritySchemeType::MutualTls => return Ok(None),
    };
    Ok(Some(param))
}

/// Header names compare case-insensitively, query and cookie names exactly.
fn same_slot(a: &SecurityParameter, b: &SecurityParameter) -> bool {
    a.location == b.location
        && match a.location {
            ApiKeyLocation::Header => a.name.eq_ignore_ascii_case(&b.name),
            ApiKeyLocation::Query | ApiKeyLocation::Cookie => a.name == b.name,
        }
}
