//! Classification of polymorphic schemas.
//!
//! `oneOf` / `anyOf` become [`VariantSet`]s; `allOf` compositions are
//! flattened into a [`MergedShape`]. Referenced schemas are resolved by
//! name and never copied into each other, so cyclic documents terminate.

use indexmap::IndexMap;

use crate::error::ResolveError;
use crate::ir::{MergedShape, SchemaKind, SchemaRegistry, UnionKind, Variant, VariantSet};
use crate::parse::ref_resolve::RefResolver;
use crate::parse::schema::{Discriminator, Schema, SchemaOrRef};

/// Variant set of a union schema; `None` for any other kind.
pub fn detect_variants(
    resolver: &RefResolver<'_>,
    schema: &Schema,
) -> Result<Option<VariantSet>, ResolveError> {
    match SchemaKind::of_schema(schema) {
        SchemaKind::Union(kind, branches) => {
            variant_set(resolver, kind, branches, schema.discriminator.as_ref()).map(Some)
        }
        SchemaKind::Ref(_)
        | SchemaKind::Composition(_)
        | SchemaKind::Enum(_)
        | SchemaKind::Object(_)
        | SchemaKind::Array(_)
        | SchemaKind::Primitive(_)
        | SchemaKind::Any => Ok(None),
    }
}

fn variant_set(
    resolver: &RefResolver<'_>,
    kind: UnionKind,
    branches: &[SchemaOrRef],
    discriminator: Option<&Discriminator>,
) -> Result<VariantSet, ResolveError> {
    let variants = branches
        .iter()
        .map(|branch| {
            let tag = match discriminator {
                Some(d) => branch_tag(resolver, branch, d)?,
                None => None,
            };
            Ok(Variant {
                tag,
                schema: branch.clone(),
            })
        })
        .collect::<Result<Vec<_>, ResolveError>>()?;

    Ok(VariantSet {
        kind,
        discriminant_property: discriminator.map(|d| d.property_name.clone()),
        variants,
    })
}

/// Mapping key, else the branch's title, else the name it references.
fn branch_tag(
    resolver: &RefResolver<'_>,
    branch: &SchemaOrRef,
    discriminator: &Discriminator,
) -> Result<Option<String>, ResolveError> {
    if let SchemaOrRef::Ref { ref_path } = branch {
        let bare = branch.ref_name();
        let mapped = discriminator.mapping.iter().find(|(_, target)| {
            *target == ref_path || (!target.starts_with('#') && Some(target.as_str()) == bare)
        });
        if let Some((tag, _)) = mapped {
            return Ok(Some(tag.clone()));
        }
    }

    let title = resolver.deref_schema(branch)?.title.clone();
    Ok(title.or_else(|| branch.ref_name().map(str::to_string)))
}

/// Flatten an `allOf` schema.
///
/// Branches merge in document order and a later branch overwrites an
/// earlier property of the same name. The schema's own properties merge
/// last. Required names are unioned. Unions met along the way are kept as
/// nested variant sets.
///
/// A schema reached through several branches merges each time it is
/// reached; only a ref already on the current descent is skipped.
pub fn merge_composition(
    resolver: &RefResolver<'_>,
    schema: &Schema,
) -> Result<MergedShape, ResolveError> {
    let mut shape = MergedShape::default();
    let mut path = Vec::new();
    merge_into(resolver, schema, &mut shape, &mut path)?;
    shape.required.retain(|name| shape.properties.contains_key(name));
    Ok(shape)
}

fn merge_into(
    resolver: &RefResolver<'_>,
    schema: &Schema,
    shape: &mut MergedShape,
    path: &mut Vec<String>,
) -> Result<(), ResolveError> {
    for branch in &schema.all_of {
        match branch {
            SchemaOrRef::Ref { ref_path } => {
                if path.contains(ref_path) {
                    continue;
                }
                let target = resolver.schema(ref_path)?;
                path.push(ref_path.clone());
                let merged = merge_into(resolver, target, shape, path);
                path.pop();
                merged?;
            }
            SchemaOrRef::Schema(inline) => merge_into(resolver, inline, shape, path)?,
        }
    }

    if let Some(set) = detect_variants(resolver, schema)? {
        if !shape.variants.contains(&set) {
            shape.variants.push(set);
        }
    }

    for (name, property) in &schema.properties {
        shape.properties.insert(name.clone(), property.clone());
    }
    for name in &schema.required {
        if !shape.required.contains(name) {
            shape.required.push(name.clone());
        }
    }
    Ok(())
}

/// Variant sets and merged shapes for every registry schema of those kinds.
pub fn analyze_registry(
    resolver: &RefResolver<'_>,
    registry: &SchemaRegistry,
) -> Result<(IndexMap<String, VariantSet>, IndexMap<String, MergedShape>), ResolveError> {
    let mut variant_sets = IndexMap::new();
    let mut compositions = IndexMap::new();

    for (name, entry) in registry.entries() {
        let SchemaOrRef::Schema(schema) = entry else {
            continue;
        };
        match SchemaKind::of_schema(schema) {
            SchemaKind::Union(kind, branches) => {
                let set = variant_set(resolver, kind, branches, schema.discriminator.as_ref())?;
                log::debug!(
                    "schema `{name}`: {} variants{}",
                    set.variants.len(),
                    if set.is_discriminated() { ", discriminated" } else { "" }
                );
                variant_sets.insert(name.clone(), set);
            }
            SchemaKind::Composition(_) => {
                compositions.insert(name.clone(), merge_composition(resolver, schema)?);
            }
            _ => {}
        }
    }

    Ok((variant_sets, compositions))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::components::Components;

    fn components(yaml: &str) -> Components {
        serde_yaml_ng::from_str(yaml).unwrap()
    }

    fn schema<'a>(components: &'a Components, name: &str) -> &'a Schema {
        match &components.schemas[name] {
            SchemaOrRef::Schema(s) => s,
            other => panic!("{name} is {other:?}"),
        }
    }

    const PETS: &str = r##"
schemas:
  Pet:
    oneOf:
      - $ref: "#/components/schemas/Cat"
      - $ref: "#/components/schemas/Dog"
      - $ref: "#/components/schemas/Lizard"
    discriminator:
      propertyName: type
      mapping:
        cat: "#/components/schemas/Cat"
  Cat:
    type: object
    properties:
      type: { type: string }
  Dog:
    title: dog
    type: object
    properties:
      type: { type: string }
  Lizard:
    type: object
"##;

    #[test]
    fn tags_come_from_mapping_then_title_then_ref_name() {
        let components = components(PETS);
        let resolver = RefResolver::new(Some(&components), &components.schemas);

        let set = detect_variants(&resolver, schema(&components, "Pet"))
            .unwrap()
            .unwrap();
        assert_eq!(set.kind, UnionKind::OneOf);
        assert_eq!(set.discriminant_property.as_deref(), Some("type"));
        let tags: Vec<_> = set.variants.iter().map(|v| v.tag.as_deref()).collect();
        assert_eq!(tags, vec![Some("cat"), Some("dog"), Some("Lizard")]);
        assert_eq!(set.variant("cat").unwrap().schema.ref_name(), Some("Cat"));
    }

    #[test]
    fn bare_mapping_names_match_branches() {
        let components = components(
            r##"
schemas:
  Shape:
    anyOf:
      - $ref: "#/components/schemas/Circle"
    discriminator:
      propertyName: kind
      mapping:
        round: Circle
  Circle: { type: object }
"##,
        );
        let resolver = RefResolver::new(Some(&components), &components.schemas);
        let set = detect_variants(&resolver, schema(&components, "Shape"))
            .unwrap()
            .unwrap();
        assert_eq!(set.kind, UnionKind::AnyOf);
        assert_eq!(set.variants[0].tag.as_deref(), Some("round"));
    }

    #[test]
    fn union_without_discriminator_is_untagged() {
        let components = components(
            r##"
schemas:
  IdOrName:
    oneOf:
      - type: integer
        title: Id
      - type: string
"##,
        );
        let resolver = RefResolver::new(Some(&components), &components.schemas);
        let set = detect_variants(&resolver, schema(&components, "IdOrName"))
            .unwrap()
            .unwrap();
        assert!(!set.is_discriminated());
        assert!(set.variants.iter().all(|v| v.tag.is_none()));
    }

    #[test]
    fn non_union_has_no_variants() {
        let components = components(PETS);
        let resolver = RefResolver::new(Some(&components), &components.schemas);
        assert!(
            detect_variants(&resolver, schema(&components, "Cat"))
                .unwrap()
                .is_none()
        );
    }

    const COMPOSED: &str = r##"
schemas:
  Base:
    type: object
    required: [id]
    properties:
      id: { type: string }
      label: { type: string }
  Timestamps:
    allOf:
      - $ref: "#/components/schemas/Base"
      - type: object
        properties:
          created_at: { type: string, format: date-time }
  Article:
    allOf:
      - $ref: "#/components/schemas/Timestamps"
      - type: object
        required: [title]
        properties:
          label: { type: integer }
          title: { type: string }
      - oneOf:
          - $ref: "#/components/schemas/Base"
          - type: object
    properties:
      body: { type: string }
"##;

    #[test]
    fn merges_all_of_recursively_last_branch_wins() {
        let components = components(COMPOSED);
        let resolver = RefResolver::new(Some(&components), &components.schemas);

        let shape = merge_composition(&resolver, schema(&components, "Article")).unwrap();
        assert_eq!(
            shape.properties.keys().collect::<Vec<_>>(),
            vec!["id", "label", "created_at", "title", "body"]
        );
        let SchemaOrRef::Schema(label) = &shape.properties["label"] else {
            panic!("label should be inline");
        };
        assert_eq!(
            label.schema_type,
            Some(crate::parse::schema::TypeSet::Single(
                crate::parse::schema::SchemaType::Integer
            ))
        );
        assert_eq!(shape.required, vec!["id", "title"]);
        assert_eq!(shape.variants.len(), 1);
        assert_eq!(shape.variants[0].variants.len(), 2);
    }

    #[test]
    fn cyclic_all_of_terminates() {
        let components = components(
            r##"
schemas:
  A:
    allOf:
      - $ref: "#/components/schemas/B"
    properties:
      a: { type: string }
  B:
    allOf:
      - $ref: "#/components/schemas/A"
    properties:
      b: { type: string }
"##,
        );
        let resolver = RefResolver::new(Some(&components), &components.schemas);
        let shape = merge_composition(&resolver, schema(&components, "A")).unwrap();
        assert!(shape.properties.contains_key("a"));
        assert!(shape.properties.contains_key("b"));
    }

    #[test]
    fn diamond_all_of_merges_shared_base_each_time() {
        let components = components(
            r##"
schemas:
  Base:
    type: object
    properties:
      label: { type: string }
  Override:
    type: object
    properties:
      label: { type: integer }
  WithBase:
    allOf:
      - $ref: "#/components/schemas/Base"
  X:
    allOf:
      - $ref: "#/components/schemas/Base"
      - $ref: "#/components/schemas/Override"
      - $ref: "#/components/schemas/WithBase"
"##,
        );
        let resolver = RefResolver::new(Some(&components), &components.schemas);
        let shape = merge_composition(&resolver, schema(&components, "X")).unwrap();

        let SchemaOrRef::Schema(label) = &shape.properties["label"] else {
            panic!("label should be inline");
        };
        assert_eq!(
            label.schema_type,
            Some(crate::parse::schema::TypeSet::Single(
                crate::parse::schema::SchemaType::String
            ))
        );
    }

    #[test]
    fn dangling_all_of_branch_is_an_error() {
        let components = components(
            r##"
schemas:
  Broken:
    allOf:
      - $ref: "#/components/schemas/Gone"
"##,
        );
        let resolver = RefResolver::new(Some(&components), &components.schemas);
        let err = merge_composition(&resolver, schema(&components, "Broken")).unwrap_err();
        assert!(matches!(err, ResolveError::UnresolvedRef(_)));
    }

    #[test]
    fn analyzes_every_registry_schema() {
        let combined = format!(
            "{}{}",
            PETS,
            COMPOSED.trim_start_matches("\nschemas:\n")
        );
        let components = components(&combined);
        let mut registry = SchemaRegistry::new();
        for (name, schema) in &components.schemas {
            registry.insert_declared(name.clone(), schema.clone()).unwrap();
        }
        let resolver = RefResolver::new(Some(&components), registry.entries());

        let (variant_sets, compositions) = analyze_registry(&resolver, &registry).unwrap();
        assert_eq!(variant_sets.keys().collect::<Vec<_>>(), vec!["Pet"]);
        assert_eq!(
            compositions.keys().collect::<Vec<_>>(),
            vec!["Timestamps", "Article"]
        );
    }
}
