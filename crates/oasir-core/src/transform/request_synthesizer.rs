//! One named input schema per operation and content type.
//!
//! The synthesized schema gathers body properties, declared parameters and
//! security parameters into a single object. Each property's origin is
//! written to `x-field-locations`, and the operation's request body is
//! rewritten to point at the new schema.

use indexmap::IndexMap;

use crate::error::{ResolveError, TransformError};
use crate::ir::{DiagnosticKind, NormalizedName, SchemaKind, TunedOperation};
use crate::parse::components::Components;
use crate::parse::operation::{MediaType, Operation, RequestBody, RequestBodyOrRef};
use crate::parse::ref_resolve::RefResolver;
use crate::parse::schema::{FieldLocation, Schema, SchemaOrRef, SchemaType, TypeSet};

use super::context::{Diagnostics, TransformContext};
use super::variant_detector::merge_composition;

/// Content type recorded for operations that declare no request body.
pub const EMPTY_BODY_CONTENT_TYPE: &str = "application/x-oasir-empty";

/// Property holding a request body that is not an object.
pub const WRAPPED_BODY_FIELD: &str = "body";

const NAME_SUFFIXES: [&str; 3] = ["Input", "Payload", "Request"];

/// Allocator candidates for an operation's input schema.
pub fn candidates(operation: &NormalizedName) -> Vec<String> {
    NAME_SUFFIXES
        .iter()
        .map(|suffix| format!("{}{suffix}", operation.pascal_case))
        .collect()
}

/// Properties a request body contributes for one content type.
#[derive(Debug, Default)]
struct BodyFields {
    properties: IndexMap<String, SchemaOrRef>,
    required: Vec<String>,
}

/// Synthesize the input schemas of `tuned` and rewrite `op.requestBody`.
/// Returns content type to schema name, in declaration order.
pub fn synthesize(
    ctx: &mut TransformContext,
    components: &Components,
    tuned: &TunedOperation,
    op: &mut Operation,
) -> Result<IndexMap<String, String>, TransformError> {
    let operation_name = tuned.canonical_name();
    let body = {
        let resolver = RefResolver::new(Some(components), ctx.registry.entries());
        match &op.request_body {
            Some(body) => Some(resolver.request_body(body)?.clone()),
            None => None,
        }
    };

    let mut request_schemas = IndexMap::new();

    let mut body = match body {
        Some(body) if !body.content.is_empty() => body,
        declared => {
            let schema = input_schema(BodyFields::default(), tuned, &mut ctx.diagnostics);
            let name = ctx.register_synthesized(&candidates(&tuned.name), SchemaOrRef::inline(schema))?;
            let media = MediaType {
                schema: Some(SchemaOrRef::reference(&name)),
                ..Default::default()
            };
            op.request_body = Some(RequestBodyOrRef::RequestBody(RequestBody {
                description: declared.and_then(|b| b.description),
                content: [(EMPTY_BODY_CONTENT_TYPE.to_string(), media)].into_iter().collect(),
                required: false,
            }));
            request_schemas.insert(EMPTY_BODY_CONTENT_TYPE.to_string(), name);
            return Ok(request_schemas);
        }
    };

    let body_required = body.required;
    for (content_type, media) in body.content.iter_mut() {
        let fields = match &media.schema {
            Some(schema) => {
                let resolver = RefResolver::new(Some(components), ctx.registry.entries());
                body_fields(&resolver, schema, body_required)?
            }
            None => {
                ctx.diagnostics.record(
                    DiagnosticKind::EmptyMediaType,
                    Some(operation_name),
                    format!("request body `{content_type}` declares no schema; using an empty object"),
                );
                BodyFields::default()
            }
        };

        let schema = input_schema(fields, tuned, &mut ctx.diagnostics);
        let name = ctx.register_synthesized(&candidates(&tuned.name), SchemaOrRef::inline(schema))?;
        media.schema = Some(SchemaOrRef::reference(&name));
        request_schemas.insert(content_type.clone(), name);
    }

    op.request_body = Some(RequestBodyOrRef::RequestBody(body));
    Ok(request_schemas)
}

/// Object bodies contribute their properties, `allOf` bodies their merged
/// shape. Anything else is wrapped as a single `body` property.
fn body_fields(
    resolver: &RefResolver<'_>,
    schema: &SchemaOrRef,
    body_required: bool,
) -> Result<BodyFields, ResolveError> {
    let resolved = resolver.deref_schema(schema)?;
    let fields = match SchemaKind::of_schema(resolved) {
        SchemaKind::Composition(_) => {
            let shape = merge_composition(resolver, resolved)?;
            BodyFields {
                properties: shape.properties,
                required: shape.required,
            }
        }
        SchemaKind::Object(object)
            if !object.properties.is_empty() || object.additional_properties.is_none() =>
        {
            BodyFields {
                properties: object.properties.clone(),
                required: object
                    .required
                    .iter()
                    .filter(|name| object.properties.contains_key(*name))
                    .cloned()
                    .collect(),
            }
        }
        _ => BodyFields {
            properties: [(WRAPPED_BODY_FIELD.to_string(), schema.clone())]
                .into_iter()
                .collect(),
            required: if body_required {
                vec![WRAPPED_BODY_FIELD.to_string()]
            } else {
                Vec::new()
            },
        },
    };
    Ok(fields)
}

/// Body properties, then parameters, then security parameters.
///
/// A parameter replaces a body property of the same name. A parameter whose
/// name another parameter already holds is keyed `<name>_<location>`. A
/// security parameter never replaces anything and is never required.
fn input_schema(fields: BodyFields, tuned: &TunedOperation, diagnostics: &mut Diagnostics) -> Schema {
    let operation_name = tuned.canonical_name();
    let mut properties = IndexMap::new();
    let mut locations = IndexMap::new();
    let mut required = fields.required;

    for (name, schema) in fields.properties {
        locations.insert(name.clone(), FieldLocation::Body);
        properties.insert(name, schema);
    }

    for param in &tuned.parameters {
        let location = param.location.as_str();
        let name = match locations.get(&param.original_name) {
            Some(FieldLocation::Body) => {
                diagnostics.record(
                    DiagnosticKind::ParameterShadowsBodyField,
                    Some(operation_name),
                    format!(
                        "{location} parameter `{}` replaces the body property of the same name",
                        param.original_name
                    ),
                );
                param.original_name.clone()
            }
            Some(held) => {
                let qualified = format!("{}_{location}", param.original_name);
                diagnostics.record(
                    DiagnosticKind::ParameterNameClash,
                    Some(operation_name),
                    format!(
                        "{location} parameter `{}` shares its name with a {} parameter; keyed as `{qualified}`",
                        param.original_name,
                        held.as_str()
                    ),
                );
                qualified
            }
            None => param.original_name.clone(),
        };
        let schema = param
            .schema
            .clone()
            .unwrap_or_else(|| SchemaOrRef::inline(Schema::default()));
        properties.insert(name.clone(), schema);
        locations.insert(name.clone(), param.location.into());
        if param.required && !required.contains(&name) {
            required.push(name);
        }
    }

    for security in &tuned.security {
        if properties.contains_key(&security.name) {
            diagnostics.record(
                DiagnosticKind::SecurityFieldShadowed,
                Some(operation_name),
                format!(
                    "security parameter `{}` from `{}` clashes with an existing field and was dropped",
                    security.name, security.scheme_name
                ),
            );
            continue;
        }
        properties.insert(
            security.name.clone(),
            SchemaOrRef::inline(Schema {
                schema_type: Some(TypeSet::Single(SchemaType::String)),
                ..Default::default()
            }),
        );
        locations.insert(security.name.clone(), FieldLocation::Input);
    }

    required.retain(|name| locations.get(name) != Some(&FieldLocation::Input));

    Schema {
        properties,
        required,
        field_locations: locations,
        ..Schema::empty_object()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::DiagnosticKind;
    use crate::parse::from_yaml;
    use crate::parse::schema::SCHEMA_REF_PREFIX;
    use crate::transform::transform;

    fn input<'a>(ir: &'a crate::ir::IrSpec, name: &str) -> &'a Schema {
        match ir.registry().get(name) {
            Some(SchemaOrRef::Schema(s)) => s,
            other => panic!("{name}: {other:?}"),
        }
    }

    #[test]
    fn required_set_excludes_security_fields() {
        let doc = from_yaml(
            r##"
openapi: "3.1.0"
info: { title: T, version: "1" }
paths:
  /things:
    post:
      operationId: createThing
      security:
        - keyAuth: []
      parameters:
        - { name: b, in: query, required: true, schema: { type: string } }
      requestBody:
        required: true
        content:
          application/json:
            schema:
              type: object
              required: [a]
              properties:
                a: { type: string }
                z: { type: string }
      responses:
        "201": { description: created }
components:
  securitySchemes:
    keyAuth: { type: apiKey, in: header, name: c }
"##,
        )
        .unwrap();
        let ir = transform(doc).unwrap();

        let op = ir.operation("createThing").unwrap();
        assert_eq!(op.request_schemas["application/json"], "CreateThingInput");
        let schema = input(&ir, "CreateThingInput");
        assert_eq!(schema.required, vec!["a", "b"]);
        assert_eq!(
            schema.properties.keys().collect::<Vec<_>>(),
            vec!["a", "z", "b", "c"]
        );
        assert_eq!(schema.field_locations["a"], FieldLocation::Body);
        assert_eq!(schema.field_locations["b"], FieldLocation::Query);
        assert_eq!(schema.field_locations["c"], FieldLocation::Input);

        let body = match ir.document().paths["/things"].post.as_ref().unwrap().request_body.as_ref() {
            Some(RequestBodyOrRef::RequestBody(b)) => b,
            other => panic!("{other:?}"),
        };
        assert_eq!(
            body.content["application/json"].schema,
            Some(SchemaOrRef::Ref {
                ref_path: format!("{SCHEMA_REF_PREFIX}CreateThingInput")
            })
        );
    }

    #[test]
    fn operation_without_body_gets_sentinel_content() {
        let doc = from_yaml(
            r##"
openapi: "3.0.3"
info: { title: T, version: "1" }
paths:
  /pets/{petId}:
    parameters:
      - { name: petId, in: path, schema: { type: string } }
    get:
      operationId: getPet
      responses:
        "200": { description: ok }
"##,
        )
        .unwrap();
        let ir = transform(doc).unwrap();

        let op = ir.operation("getPet").unwrap();
        let name = &op.request_schemas[EMPTY_BODY_CONTENT_TYPE];
        assert_eq!(name, "GetPetInput");
        let schema = input(&ir, name);
        assert_eq!(schema.required, vec!["petId"]);
        assert_eq!(schema.field_locations["petId"], FieldLocation::Path);
        let body = match &ir.document().paths["/pets/{petId}"].get.as_ref().unwrap().request_body {
            Some(RequestBodyOrRef::RequestBody(b)) => b,
            other => panic!("{other:?}"),
        };
        assert!(!body.required);
        assert!(body.content.contains_key(EMPTY_BODY_CONTENT_TYPE));
    }

    #[test]
    fn every_content_type_gets_its_own_schema() {
        let doc = from_yaml(
            r##"
openapi: "3.1.0"
info: { title: T, version: "1" }
paths:
  /upload:
    post:
      operationId: upload
      requestBody:
        content:
          application/json:
            schema: { type: object, properties: { name: { type: string } } }
          multipart/form-data:
            schema: { type: object, properties: { file: { type: string, format: binary } } }
          application/xml: {}
      responses:
        "204": { description: done }
components:
  schemas:
    UploadInput: { type: object }
"##,
        )
        .unwrap();
        let ir = transform(doc).unwrap();

        let op = ir.operation("upload").unwrap();
        assert_eq!(
            op.request_schemas.values().collect::<Vec<_>>(),
            vec!["UploadPayload", "UploadRequest", "UploadInput2"]
        );
        let diagnostics: Vec<_> = ir.diagnostics().iter().map(|d| d.kind).collect();
        assert_eq!(diagnostics, vec![DiagnosticKind::EmptyMediaType]);
        assert!(input(&ir, "UploadInput2").properties.is_empty());
    }

    #[test]
    fn non_object_body_is_wrapped() {
        let doc = from_yaml(
            r##"
openapi: "3.1.0"
info: { title: T, version: "1" }
paths:
  /tags:
    put:
      operationId: replaceTags
      requestBody:
        required: true
        content:
          application/json:
            schema:
              type: array
              items: { type: string }
      responses:
        "204": { description: done }
"##,
        )
        .unwrap();
        let ir = transform(doc).unwrap();

        let schema = input(&ir, "ReplaceTagsInput");
        assert_eq!(schema.properties.keys().collect::<Vec<_>>(), vec![WRAPPED_BODY_FIELD]);
        assert_eq!(schema.required, vec![WRAPPED_BODY_FIELD]);
        assert_eq!(schema.field_locations[WRAPPED_BODY_FIELD], FieldLocation::Body);
    }

    #[test]
    fn shared_request_body_and_all_of_are_resolved() {
        let doc = from_yaml(
            r##"
openapi: "3.1.0"
info: { title: T, version: "1" }
paths:
  /pets:
    post:
      operationId: createPet
      parameters:
        - { name: name, in: query, schema: { type: string } }
      requestBody:
        $ref: "#/components/requestBodies/NewPet"
      responses:
        "201": { description: created }
components:
  requestBodies:
    NewPet:
      required: true
      content:
        application/json:
          schema:
            allOf:
              - $ref: "#/components/schemas/Named"
              - type: object
                required: [age]
                properties:
                  age: { type: integer }
  schemas:
    Named:
      type: object
      required: [name]
      properties:
        name: { type: string }
"##,
        )
        .unwrap();
        let ir = transform(doc).unwrap();

        let schema = input(&ir, "CreatePetInput");
        assert_eq!(schema.properties.keys().collect::<Vec<_>>(), vec!["name", "age"]);
        assert_eq!(schema.field_locations["name"], FieldLocation::Query);
        // Body-required names stay required even when a parameter replaces them.
        assert_eq!(schema.required, vec!["name", "age"]);
        assert_eq!(
            ir.diagnostics()[0].kind,
            DiagnosticKind::ParameterShadowsBodyField
        );

        // The shared component itself is untouched.
        let components = ir.document().components.as_ref().unwrap();
        match &components.request_bodies["NewPet"] {
            RequestBodyOrRef::RequestBody(b) => {
                assert!(b.content["application/json"].schema.as_ref().unwrap().ref_name().is_none())
            }
            other => panic!("{other:?}"),
        }
    }

    #[test]
    fn security_clash_is_skipped_and_recorded() {
        let doc = from_yaml(
            r##"
openapi: "3.1.0"
info: { title: T, version: "1" }
security:
  - bearer: []
paths:
  /me:
    get:
      operationId: whoAmI
      parameters:
        - { name: authorization, in: header, required: true, schema: { type: string } }
      responses:
        "200": { description: ok }
components:
  securitySchemes:
    bearer: { type: http, scheme: bearer }
"##,
        )
        .unwrap();
        let ir = transform(doc).unwrap();

        let schema = input(&ir, "WhoAmIInput");
        assert_eq!(schema.field_locations["authorization"], FieldLocation::Header);
        assert_eq!(schema.required, vec!["authorization"]);
        assert_eq!(ir.diagnostics()[0].kind, DiagnosticKind::SecurityFieldShadowed);
    }

    #[test]
    fn same_name_in_two_locations_keeps_both() {
        let doc = from_yaml(
            r##"
openapi: "3.1.0"
info: { title: T, version: "1" }
paths:
  /things:
    get:
      operationId: listThings
      parameters:
        - { name: version, in: query, schema: { type: string } }
        - { name: version, in: header, schema: { type: integer } }
      responses:
        "200": { description: ok }
"##,
        )
        .unwrap();
        let ir = transform(doc).unwrap();

        let schema = input(&ir, "ListThingsInput");
        assert_eq!(
            schema.properties.keys().collect::<Vec<_>>(),
            vec!["version", "version_header"]
        );
        assert_eq!(schema.field_locations["version"], FieldLocation::Query);
        assert_eq!(schema.field_locations["version_header"], FieldLocation::Header);
        assert!(schema.required.is_empty());
        assert_eq!(ir.diagnostics().len(), 1);
        assert_eq!(ir.diagnostics()[0].kind, DiagnosticKind::ParameterNameClash);
    }
}
