use std::fmt;

use indexmap::IndexMap;

use crate::error::{ResolveError, TransformError};
use crate::ir::ResponseItem;
use crate::parse::operation::ResponseOrRef;
use crate::parse::ref_resolve::RefResolver;

/// Derives an operation's responses from the source of its server handler.
///
/// One implementation per server framework; the transform picks one by the
/// name it was registered under.
pub trait ResponseAnalyzer {
    fn analyze(&self, source: &str) -> Vec<ResponseItem>;
}

impl<F> ResponseAnalyzer for F
where
    F: Fn(&str) -> Vec<ResponseItem>,
{
    fn analyze(&self, source: &str) -> Vec<ResponseItem> {
        self(source)
    }
}

/// Response analyzers keyed by name.
#[derive(Default)]
pub struct AnalyzerRegistry {
    analyzers: IndexMap<String, Box<dyn ResponseAnalyzer>>,
}

impl AnalyzerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `analyzer` under `name`, replacing any previous one.
    pub fn register(&mut self, name: impl Into<String>, analyzer: impl ResponseAnalyzer + 'static) {
        self.analyzers.insert(name.into(), Box::new(analyzer));
    }

    pub fn get(&self, name: &str) -> Option<&dyn ResponseAnalyzer> {
        self.analyzers.get(name).map(|a| a.as_ref())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.analyzers.keys().map(String::as_str)
    }

    /// The analyzer configured by name, if any. A name that was never
    /// registered is an error rather than a silent fallback.
    pub fn select(&self, name: Option<&str>) -> Result<Option<&dyn ResponseAnalyzer>, TransformError> {
        match name {
            None => Ok(None),
            Some(name) => self
                .get(name)
                .map(Some)
                .ok_or_else(|| TransformError::UnknownAnalyzer(name.to_string())),
        }
    }
}

impl fmt::Debug for AnalyzerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.analyzers.keys()).finish()
    }
}

/// Responses as the document declares them: one item per status and
/// content type, or one bodiless item for a response without content.
pub fn document_responses(
    resolver: &RefResolver<'_>,
    responses: &IndexMap<String, ResponseOrRef>,
) -> Result<Vec<ResponseItem>, ResolveError> {
    let mut items = Vec::new();
    for (status, response) in responses {
        let response = resolver.response(response)?;
        let headers: Vec<String> = response.headers.keys().cloned().collect();
        let description = Some(response.description.clone()).filter(|d| !d.is_empty());

        if response.content.is_empty() {
            items.push(ResponseItem {
                status_code: status.clone(),
                content_type: None,
                headers,
                body_schema: None,
                description,
            });
            continue;
        }
        for (content_type, media) in &response.content {
            items.push(ResponseItem {
                status_code: status.clone(),
                content_type: Some(content_type.clone()),
                headers: headers.clone(),
                body_schema: media.schema.clone(),
                description: description.clone(),
            });
        }
    }
    Ok(items)
}
