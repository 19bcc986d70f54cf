use std::borrow::Cow;

use indexmap::IndexMap;

use super::components::Components;
use super::operation::{RequestBody, RequestBodyOrRef, Response, ResponseOrRef};
use super::parameter::{Parameter, ParameterOrRef};
use super::schema::{Schema, SchemaOrRef};
use super::security::SecurityScheme;
use super::spec::OpenApiSpec;
use super::visit::{self, PointerKind};
use crate::error::ResolveError;

/// The component section a pointer addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefKind {
    Schemas,
    Parameters,
    SecuritySchemes,
    RequestBodies,
    Responses,
}

impl RefKind {
    fn from_section(section: &str) -> Option<Self> {
        match section {
            "schemas" => Some(RefKind::Schemas),
            "parameters" => Some(RefKind::Parameters),
            "securitySchemes" => Some(RefKind::SecuritySchemes),
            "requestBodies" => Some(RefKind::RequestBodies),
            "responses" => Some(RefKind::Responses),
            _ => None,
        }
    }
}

/// A concrete object a pointer resolved to. Borrowed, never copied, so
/// self-referential schemas cost nothing to resolve.
#[derive(Debug, Clone, Copy)]
pub enum Resolved<'a> {
    Schema(&'a Schema),
    Parameter(&'a Parameter),
    SecurityScheme(&'a SecurityScheme),
    RequestBody(&'a RequestBody),
    Response(&'a Response),
}

/// Resolves document-relative `#/components/<kind>/<name>` pointers on
/// demand. Schemas come from the run's schema table, everything else from
/// the document's components. Never performs I/O.
pub struct RefResolver<'a> {
    components: Option<&'a Components>,
    schemas: &'a IndexMap<String, SchemaOrRef>,
}

impl<'a> RefResolver<'a> {
    pub fn new(
        components: Option<&'a Components>,
        schemas: &'a IndexMap<String, SchemaOrRef>,
    ) -> Self {
        Self {
            components,
            schemas,
        }
    }

    fn check_pointer(&self, kind: PointerKind, pointer: &str) -> Result<(), ResolveError> {
        match kind {
            PointerKind::Mapping if !pointer.starts_with('#') => {
                if self.schemas.contains_key(pointer) {
                    Ok(())
                } else {
                    Err(ResolveError::UnresolvedRef(pointer.to_string()))
                }
            }
            _ if !pointer.starts_with('#') => Err(ResolveError::UnresolvedRef(pointer.to_string())),
            _ => self.resolve(pointer).map(|_| ()),
        }
    }

    /// Resolve a pointer to its concrete target, following transitive refs.
    pub fn resolve(&self, ref_path: &str) -> Result<Resolved<'a>, ResolveError> {
        let (kind, _) = parse_ref(ref_path)?;
        match kind {
            RefKind::Schemas => self.schema(ref_path).map(Resolved::Schema),
            RefKind::Parameters => self.parameter_at(ref_path).map(Resolved::Parameter),
            RefKind::SecuritySchemes => self.security_scheme_at(ref_path).map(Resolved::SecurityScheme),
            RefKind::RequestBodies => self.request_body_at(ref_path).map(Resolved::RequestBody),
            RefKind::Responses => self.response_at(ref_path).map(Resolved::Response),
        }
    }

    /// Resolve a schema pointer, following `$ref` chains between entries.
    pub fn schema(&self, ref_path: &str) -> Result<&'a Schema, ResolveError> {
        let mut current = Cow::Borrowed(ref_path);
        let mut visited: Vec<String> = Vec::new();
        loop {
            if visited.iter().any(|v| v == current.as_ref()) {
                return Err(ResolveError::CircularRef(ref_path.to_string()));
            }
            let name = expect_section(&current, RefKind::Schemas)?;
            let entry = self
                .schemas
                .get(name.as_ref())
                .ok_or_else(|| ResolveError::UnresolvedRef(current.to_string()))?;
            match entry {
                SchemaOrRef::Schema(schema) => return Ok(&**schema),
                SchemaOrRef::Ref { ref_path: next } => {
                    visited.push(current.into_owned());
                    current = Cow::Owned(next.clone());
                }
            }
        }
    }

    /// Inline schemas pass through; refs are resolved.
    pub fn deref_schema<'b>(&self, schema: &'b SchemaOrRef) -> Result<&'b Schema, ResolveError>
    where
        'a: 'b,
    {
        match schema {
            SchemaOrRef::Schema(s) => Ok(&**s),
            SchemaOrRef::Ref { ref_path } => self.schema(ref_path),
        }
    }

    pub fn parameter<'b>(&self, param: &'b ParameterOrRef) -> Result<&'b Parameter, ResolveError>
    where
        'a: 'b,
    {
        match param {
            ParameterOrRef::Parameter(p) => Ok(p),
            ParameterOrRef::Ref { ref_path } => self.parameter_at(ref_path),
        }
    }

    pub fn request_body<'b>(
        &self,
        body: &'b RequestBodyOrRef,
    ) -> Result<&'b RequestBody, ResolveError>
    where
        'a: 'b,
    {
        match body {
            RequestBodyOrRef::RequestBody(rb) => Ok(rb),
            RequestBodyOrRef::Ref { ref_path } => self.request_body_at(ref_path),
        }
    }

    pub fn response<'b>(&self, resp: &'b ResponseOrRef) -> Result<&'b Response, ResolveError>
    where
        'a: 'b,
    {
        match resp {
            ResponseOrRef::Response(r) => Ok(r),
            ResponseOrRef::Ref { ref_path } => self.response_at(ref_path),
        }
    }

    /// Look up a security scheme by the bare name used in requirement objects.
    pub fn security_scheme(&self, name: &str) -> Result<&'a SecurityScheme, ResolveError> {
        self.components
            .and_then(|c| c.security_schemes.get(name))
            .ok_or_else(|| ResolveError::UnresolvedRef(format!("#/components/securitySchemes/{name}")))
    }

    fn security_scheme_at(&self, ref_path: &str) -> Result<&'a SecurityScheme, ResolveError> {
        let name = expect_section(ref_path, RefKind::SecuritySchemes)?;
        self.security_scheme(&name)
    }

    fn parameter_at(&self, ref_path: &str) -> Result<&'a Parameter, ResolveError> {
        let components = self.components;
        follow(ref_path, RefKind::Parameters, |name| {
            components.and_then(|c| c.parameters.get(name)).map(|p| match p {
                ParameterOrRef::Parameter(param) => Ok(param),
                ParameterOrRef::Ref { ref_path } => Err(ref_path.as_str()),
            })
        })
    }

    fn request_body_at(&self, ref_path: &str) -> Result<&'a RequestBody, ResolveError> {
        let components = self.components;
        follow(ref_path, RefKind::RequestBodies, |name| {
            components
                .and_then(|c| c.request_bodies.get(name))
                .map(|b| match b {
                    RequestBodyOrRef::RequestBody(rb) => Ok(rb),
                    RequestBodyOrRef::Ref { ref_path } => Err(ref_path.as_str()),
                })
        })
    }

    fn response_at(&self, ref_path: &str) -> Result<&'a Response, ResolveError> {
        let components = self.components;
        follow(ref_path, RefKind::Responses, |name| {
            components.and_then(|c| c.responses.get(name)).map(|r| match r {
                ResponseOrRef::Response(resp) => Ok(resp),
                ResponseOrRef::Ref { ref_path } => Err(ref_path.as_str()),
            })
        })
    }
}

/// Follow a chain of non-schema component refs. `lookup` yields the entry
/// for a name: `Ok(target)` when concrete, `Err(next_pointer)` when the
/// entry is itself a `$ref`.
fn follow<'a, T>(
    ref_path: &str,
    kind: RefKind,
    lookup: impl Fn(&str) -> Option<Result<&'a T, &'a str>>,
) -> Result<&'a T, ResolveError> {
    let mut current = ref_path.to_string();
    let mut visited: Vec<String> = Vec::new();
    loop {
        if visited.contains(&current) {
            return Err(ResolveError::CircularRef(ref_path.to_string()));
        }
        let name = expect_section(&current, kind)?;
        match lookup(name.as_ref()) {
            None => return Err(ResolveError::UnresolvedRef(current)),
            Some(Ok(target)) => return Ok(target),
            Some(Err(next)) => {
                let next = next.to_string();
                visited.push(std::mem::replace(&mut current, next));
            }
        }
    }
}

/// Split `#/components/<kind>/<name>` into its kind and unescaped name.
pub fn parse_ref(ref_path: &str) -> Result<(RefKind, Cow<'_, str>), ResolveError> {
    let stripped = ref_path
        .strip_prefix("#/components/")
        .ok_or_else(|| ResolveError::InvalidRefFormat(ref_path.to_string()))?;
    let (section, name) = stripped
        .split_once('/')
        .ok_or_else(|| ResolveError::InvalidRefFormat(ref_path.to_string()))?;
    let kind = RefKind::from_section(section)
        .ok_or_else(|| ResolveError::InvalidRefFormat(ref_path.to_string()))?;
    if name.is_empty() {
        return Err(ResolveError::InvalidRefFormat(ref_path.to_string()));
    }
    let name = if name.contains('~') {
        Cow::Owned(name.replace("~1", "/").replace("~0", "~"))
    } else {
        Cow::Borrowed(name)
    };
    Ok((kind, name))
}

fn expect_section(ref_path: &str, expected: RefKind) -> Result<Cow<'_, str>, ResolveError> {
    let (kind, name) = parse_ref(ref_path)?;
    if kind != expected {
        return Err(ResolveError::InvalidRefFormat(format!(
            "expected {expected:?} pointer, got {ref_path}"
        )));
    }
    Ok(name)
}

/// Verify that every pointer in the document resolves against its own
/// components. Discriminator mapping values may be bare schema names.
pub fn check_refs(doc: &OpenApiSpec) -> Result<(), ResolveError> {
    let empty = IndexMap::new();
    let components = doc.components.as_ref();
    let schemas = components.map(|c| &c.schemas).unwrap_or(&empty);
    let resolver = RefResolver::new(components, schemas);

    let mut failure = None;
    visit::shared::document(doc, &mut |kind: PointerKind, pointer: &String| {
        if failure.is_none() {
            failure = resolver.check_pointer(kind, pointer).err();
        }
    });

    match failure {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

/// Like [`check_refs`], for a schema that lives outside the document.
pub fn check_schema_refs(
    resolver: &RefResolver<'_>,
    schema: &SchemaOrRef,
) -> Result<(), ResolveError> {
    let mut failure = None;
    visit::shared::schema_or_ref(schema, &mut |kind: PointerKind, pointer: &String| {
        if failure.is_none() {
            failure = resolver.check_pointer(kind, pointer).err();
        }
    });

    match failure {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
