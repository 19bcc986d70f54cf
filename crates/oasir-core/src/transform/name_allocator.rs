use std::collections::HashSet;

use heck::ToPascalCase;
use indexmap::IndexMap;

use crate::error::TransformError;
use crate::ir::SchemaRegistry;
use crate::parse::components::Components;
use crate::parse::schema::SCHEMA_REF_PREFIX;
use crate::parse::spec::OpenApiSpec;
use crate::parse::visit::{self, PointerKind};

/// Names no schema may take: keywords of the common SDK target languages
/// and built-in type names that generated code cannot shadow.
pub const RESERVED_WORDS: &[&str] = &[
    // TypeScript / JavaScript
    "abstract", "any", "as", "async", "await", "boolean", "break", "case", "catch", "class",
    "const", "constructor", "continue", "debugger", "declare", "default", "delete", "do", "else",
    "enum", "export", "extends", "false", "finally", "for", "from", "function", "get", "if",
    "implements", "import", "in", "instanceof", "interface", "is", "keyof", "let", "module",
    "namespace", "never", "new", "null", "number", "object", "of", "package", "private",
    "protected", "public", "readonly", "require", "return", "set", "static", "string", "super",
    "switch", "symbol", "this", "throw", "true", "try", "type", "typeof", "undefined", "unique",
    "unknown", "var", "void", "while", "with", "yield",
    // Python
    "and", "assert", "def", "del", "elif", "except", "global", "lambda", "nonlocal", "not", "or",
    "pass", "raise", "None", "True", "False",
    // Built-in types
    "Array", "Boolean", "Date", "Function", "Map", "Number", "Object", "Omit", "Partial", "Pick",
    "Promise", "Readonly", "Record", "Required", "Set", "String", "Symbol",
];

/// Highest numeric suffix tried before allocation gives up.
pub const MAX_NAME_SUFFIX: u32 = 10_000;

/// The reserved-name set of one run: the built-in list plus configured extras.
#[derive(Debug, Clone)]
pub struct ReservedWords(HashSet<String>);

impl ReservedWords {
    pub fn new(extra: &[String]) -> Self {
        let mut words: HashSet<String> = RESERVED_WORDS.iter().map(|w| w.to_string()).collect();
        words.extend(extra.iter().cloned());
        Self(words)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains(name)
    }
}

impl Default for ReservedWords {
    fn default() -> Self {
        Self::new(&[])
    }
}

/// Pick a schema name from `candidates` (PascalCased, in order) that is
/// neither registered nor reserved. When all are taken, suffix the first
/// candidate with `2`, `3`, ... until a free name turns up.
///
/// Reads the registry without changing it; the caller registers the result
/// before anything else may allocate.
pub fn allocate(
    registry: &SchemaRegistry,
    reserved: &ReservedWords,
    candidates: &[String],
) -> Result<String, TransformError> {
    allocate_with(|name| registry.contains(name), reserved, candidates)
}

fn allocate_with(
    is_taken: impl Fn(&str) -> bool,
    reserved: &ReservedWords,
    candidates: &[String],
) -> Result<String, TransformError> {
    let is_free = |name: &str| !is_taken(name) && !reserved.contains(name);

    let pascal: Vec<String> = candidates
        .iter()
        .map(|c| c.to_pascal_case())
        .filter(|c| !c.is_empty())
        .collect();

    if let Some(free) = pascal.iter().find(|c| is_free(c)) {
        return Ok(free.clone());
    }

    let base = pascal.first().map(String::as_str).unwrap_or("Schema");
    (2..=MAX_NAME_SUFFIX)
        .map(|i| format!("{base}{i}"))
        .find(|c| is_free(c))
        .ok_or_else(|| TransformError::NameCollisionExhaustion(base.to_string()))
}

/// Give every component schema whose own name is reserved a free name and
/// rewrite each pointer to it, in the document and in `components`.
///
/// Runs before the registry is seeded. Returns old name to new name.
pub(crate) fn rename_reserved_schemas(
    reserved: &ReservedWords,
    doc: &mut OpenApiSpec,
    components: &mut Components,
) -> Result<IndexMap<String, String>, TransformError> {
    let mut taken: HashSet<String> = components
        .schemas
        .keys()
        .filter(|name| !reserved.contains(name))
        .cloned()
        .collect();

    let mut renames = IndexMap::new();
    for name in components.schemas.keys().filter(|name| reserved.contains(name)) {
        let renamed = allocate_with(|n| taken.contains(n), reserved, std::slice::from_ref(name))?;
        log::warn!("component schema `{name}` uses a reserved name; renamed to `{renamed}`");
        taken.insert(renamed.clone());
        renames.insert(name.clone(), renamed);
    }
    if renames.is_empty() {
        return Ok(renames);
    }

    components.schemas = std::mem::take(&mut components.schemas)
        .into_iter()
        .map(|(name, schema)| match renames.get(&name) {
            Some(renamed) => (renamed.clone(), schema),
            None => (name, schema),
        })
        .collect();

    let mut rewrite = |kind: PointerKind, pointer: &mut String| {
        let replacement = match pointer.strip_prefix(SCHEMA_REF_PREFIX) {
            Some(name) => renames
                .get(name)
                .map(|renamed| format!("{SCHEMA_REF_PREFIX}{renamed}")),
            None if kind == PointerKind::Mapping => renames.get(pointer.as_str()).cloned(),
            None => None,
        };
        if let Some(replacement) = replacement {
            *pointer = replacement;
        }
    };
    visit::exclusive::document(doc, &mut rewrite);
    visit::exclusive::components(components, &mut rewrite);

    Ok(renames)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::schema::{Schema, SchemaOrRef};

    fn registry_with(names: &[&str]) -> SchemaRegistry {
        let mut registry = SchemaRegistry::new();
        for name in names {
            registry
                .insert_declared(name.to_string(), SchemaOrRef::inline(Schema::default()))
                .unwrap();
        }
        registry
    }

    fn candidates(op: &str) -> Vec<String> {
        ["Input", "Payload", "Request"]
            .iter()
            .map(|s| format!("{op}{s}"))
            .collect()
    }

    #[test]
    fn picks_first_free_candidate() {
        let registry = registry_with(&["Pet"]);
        let name = allocate(&registry, &ReservedWords::default(), &candidates("CreatePet")).unwrap();
        assert_eq!(name, "CreatePetInput");
    }

    #[test]
    fn falls_through_taken_candidates_in_order() {
        let registry = registry_with(&["CreatePetInput"]);
        let name = allocate(&registry, &ReservedWords::default(), &candidates("CreatePet")).unwrap();
        assert_eq!(name, "CreatePetPayload");

        let registry = registry_with(&["CreatePetInput", "CreatePetPayload"]);
        let name = allocate(&registry, &ReservedWords::default(), &candidates("CreatePet")).unwrap();
        assert_eq!(name, "CreatePetRequest");
    }

    #[test]
    fn suffixes_first_candidate_when_all_taken() {
        let registry = registry_with(&[
            "CreatePetInput",
            "CreatePetPayload",
            "CreatePetRequest",
            "CreatePetInput2",
        ]);
        let name = allocate(&registry, &ReservedWords::default(), &candidates("CreatePet")).unwrap();
        assert_eq!(name, "CreatePetInput3");
    }

    #[test]
    fn skips_reserved_words() {
        let registry = SchemaRegistry::new();
        let name = allocate(
            &registry,
            &ReservedWords::default(),
            &["object".to_string()],
        )
        .unwrap();
        assert_eq!(name, "Object2");
    }

    #[test]
    fn honors_configured_reserved_words() {
        let registry = SchemaRegistry::new();
        let reserved = ReservedWords::new(&["ClientInput".to_string()]);
        let name = allocate(&registry, &reserved, &candidates("Client")).unwrap();
        assert_eq!(name, "ClientPayload");
    }

    #[test]
    fn does_not_mutate_registry() {
        let registry = registry_with(&["Pet"]);
        let before = registry.clone();
        let first = allocate(&registry, &ReservedWords::default(), &candidates("ListPets")).unwrap();
        let second = allocate(&registry, &ReservedWords::default(), &candidates("ListPets")).unwrap();
        assert_eq!(first, second);
        assert_eq!(registry, before);
    }

    #[test]
    fn exhaustion_is_an_error() {
        let mut names = vec!["X".to_string()];
        names.extend((2..=MAX_NAME_SUFFIX).map(|i| format!("X{i}")));
        let mut registry = SchemaRegistry::new();
        for name in names {
            registry
                .insert_declared(name, SchemaOrRef::inline(Schema::default()))
                .unwrap();
        }
        let err = allocate(&registry, &ReservedWords::default(), &["X".to_string()]).unwrap_err();
        assert!(matches!(err, TransformError::NameCollisionExhaustion(b) if b == "X"));
    }

    #[test]
    fn renames_reserved_component_schemas_and_their_pointers() {
        let yaml = r##"
openapi: "3.1.0"
info: { title: T, version: "1" }
paths:
  /things:
    get:
      responses:
        "200":
          description: ok
          content:
            application/json:
              schema:
                $ref: "#/components/schemas/Object"
components:
  schemas:
    Object:
      type: object
    Object2:
      type: string
    Holder:
      oneOf:
        - $ref: "#/components/schemas/Object"
      discriminator:
        propertyName: kind
        mapping:
          obj: Object
"##;
        let mut doc = crate::parse::from_yaml(yaml).unwrap();
        let mut components = doc.components.take().unwrap();

        let renames =
            rename_reserved_schemas(&ReservedWords::default(), &mut doc, &mut components).unwrap();

        assert_eq!(renames["Object"], "Object3");
        assert_eq!(
            components.schemas.keys().collect::<Vec<_>>(),
            vec!["Object3", "Object2", "Holder"]
        );
        let response = match &doc.paths["/things"].get.as_ref().unwrap().responses["200"] {
            crate::parse::operation::ResponseOrRef::Response(r) => r,
            other => panic!("unexpected {other:?}"),
        };
        assert_eq!(
            response.content["application/json"].schema.as_ref().unwrap().ref_name(),
            Some("Object3")
        );
        let SchemaOrRef::Schema(holder) = &components.schemas["Holder"] else {
            panic!("Holder should be inline");
        };
        assert_eq!(holder.one_of[0].ref_name(), Some("Object3"));
        assert_eq!(holder.discriminator.as_ref().unwrap().mapping["obj"], "Object3");
    }

    #[test]
    fn leaves_documents_without_reserved_names_alone() {
        let mut doc = crate::parse::from_yaml(
            "openapi: '3.0.3'\ninfo: { title: T, version: '1' }\npaths: {}\ncomponents:\n  schemas:\n    Pet: { type: object }\n",
        )
        .unwrap();
        let mut components = doc.components.take().unwrap();
        let before = components.clone();

        let renames =
            rename_reserved_schemas(&ReservedWords::default(), &mut doc, &mut components).unwrap();
        assert!(renames.is_empty());
        assert_eq!(components, before);
    }
}
