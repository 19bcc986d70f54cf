use indexmap::{IndexMap, IndexSet};

use crate::error::TransformError;
use crate::parse::schema::SchemaOrRef;

/// Named schemas of one run: every component schema plus every schema the
/// pipeline synthesizes.
///
/// Append-only. An entry is never removed or renamed once inserted, and the
/// insertion API is crate-private, so a finalized registry handed to a
/// renderer cannot change.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaRegistry {
    entries: IndexMap<String, SchemaOrRef>,
    synthesized: IndexSet<String>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&SchemaOrRef> {
        self.entries.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn entries(&self) -> &IndexMap<String, SchemaOrRef> {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether the pipeline created this entry (as opposed to the document).
    pub fn is_synthesized(&self, name: &str) -> bool {
        self.synthesized.contains(name)
    }

    pub fn synthesized_names(&self) -> impl Iterator<Item = &str> {
        self.synthesized.iter().map(String::as_str)
    }

    /// Add a schema declared by the document.
    pub(crate) fn insert_declared(
        &mut self,
        name: String,
        schema: SchemaOrRef,
    ) -> Result<(), TransformError> {
        if self.entries.contains_key(&name) {
            return Err(TransformError::RegistryConflict(name));
        }
        self.entries.insert(name, schema);
        Ok(())
    }

    /// Add a schema under a name obtained from the allocator.
    pub(crate) fn insert_synthesized(
        &mut self,
        name: String,
        schema: SchemaOrRef,
    ) -> Result<(), TransformError> {
        self.insert_declared(name.clone(), schema)?;
        self.synthesized.insert(name);
        Ok(())
    }
}
