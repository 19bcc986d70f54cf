use indexmap::IndexMap;

use crate::parse::schema::{Schema, SchemaOrRef, SchemaType, TypeSet};

/// Which union keyword produced a variant set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnionKind {
    OneOf,
    AnyOf,
}

/// Closed classification of a schema node. Every pipeline stage that cares
/// about shape matches on this instead of probing keywords ad hoc.
#[derive(Debug, Clone, Copy)]
pub enum SchemaKind<'a> {
    /// A pointer to a named schema.
    Ref(&'a str),
    Union(UnionKind, &'a [SchemaOrRef]),
    Composition(&'a [SchemaOrRef]),
    Enum(&'a [serde_json::Value]),
    Object(&'a Schema),
    Array(&'a Schema),
    Primitive(&'a SchemaType),
    Any,
}

impl<'a> SchemaKind<'a> {
    pub fn of(schema: &'a SchemaOrRef) -> Self {
        match schema {
            SchemaOrRef::Ref { ref_path } => SchemaKind::Ref(ref_path),
            SchemaOrRef::Schema(s) => SchemaKind::of_schema(s),
        }
    }

    /// Union keywords take precedence over `allOf`, which takes precedence
    /// over `enum` and `type`.
    pub fn of_schema(schema: &'a Schema) -> Self {
        if !schema.one_of.is_empty() {
            return SchemaKind::Union(UnionKind::OneOf, &schema.one_of);
        }
        if !schema.any_of.is_empty() {
            return SchemaKind::Union(UnionKind::AnyOf, &schema.any_of);
        }
        if !schema.all_of.is_empty() {
            return SchemaKind::Composition(&schema.all_of);
        }
        if !schema.enum_values.is_empty() {
            return SchemaKind::Enum(&schema.enum_values);
        }
        if schema.is_array() {
            return SchemaKind::Array(schema);
        }
        if schema.is_object_like() {
            return SchemaKind::Object(schema);
        }
        match &schema.schema_type {
            Some(TypeSet::Single(t)) => SchemaKind::Primitive(t),
            Some(TypeSet::Multiple(ts)) => ts
                .iter()
                .find(|t| **t != SchemaType::Null)
                .map(SchemaKind::Primitive)
                .unwrap_or(SchemaKind::Any),
            None => SchemaKind::Any,
        }
    }
}

/// Variants of a `oneOf` / `anyOf` schema.
#[derive(Debug, Clone, PartialEq)]
pub struct VariantSet {
    pub kind: UnionKind,
    /// Discriminator property name; `None` for a structural union.
    pub discriminant_property: Option<String>,
    pub variants: Vec<Variant>,
}

impl VariantSet {
    pub fn is_discriminated(&self) -> bool {
        self.discriminant_property.is_some()
    }

    pub fn variant(&self, tag: &str) -> Option<&Variant> {
        self.variants.iter().find(|v| v.tag.as_deref() == Some(tag))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Variant {
    /// Discriminator value selecting this variant, when known.
    pub tag: Option<String>,
    pub schema: SchemaOrRef,
}

/// The flattened shape of an `allOf` composition.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MergedShape {
    pub properties: IndexMap<String, SchemaOrRef>,
    pub required: Vec<String>,
    /// Unions found inside `allOf` branches, kept as nested variant sets.
    pub variants: Vec<VariantSet>,
}
