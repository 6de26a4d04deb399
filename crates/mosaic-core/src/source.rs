//! Plugin sources feeding [`WidgetRegistry::discover`](crate::registry::WidgetRegistry::discover).

#![allow(missing_docs)]

use std::fmt;

use smol_str::SmolStr;
use thiserror::Error;

use crate::registry::{WidgetFactory, WidgetMetadata};
use crate::schema::PropertySchema;

/// One candidate widget kind supplied by a source.
pub struct PluginCandidate {
    /// Where the candidate came from (file path, crate name, ...).
    pub origin: SmolStr,
    pub metadata: WidgetMetadata,
    pub schema: PropertySchema,
    pub factory: WidgetFactory,
}

impl fmt::Debug for PluginCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginCandidate")
            .field("origin", &self.origin)
            .field("metadata", &self.metadata)
            .field("schema", &self.schema.len())
            .finish_non_exhaustive()
    }
}

/// A candidate that could not be loaded at all.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{origin}: {reason}")]
pub struct PluginLoadError {
    pub origin: SmolStr,
    pub reason: SmolStr,
}

impl PluginLoadError {
    pub fn new(origin: impl Into<SmolStr>, reason: impl fmt::Display) -> Self {
        Self {
            origin: origin.into(),
            reason: SmolStr::new(reason.to_string()),
        }
    }
}

/// Supplier of candidate plugins.
pub trait PluginSource {
    /// Human-readable name for logs.
    fn describe(&self) -> SmolStr;

    /// Every candidate, each loaded independently of the others.
    fn candidates(&mut self) -> Vec<Result<PluginCandidate, PluginLoadError>>;
}

/// In-process source over a fixed list of candidates.
#[derive(Debug, Default)]
pub struct StaticPluginSource {
    name: SmolStr,
    candidates: Vec<PluginCandidate>,
}

impl StaticPluginSource {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: SmolStr::new(name),
            candidates: Vec::new(),
        }
    }

    #[must_use]
    pub fn with(mut self, metadata: WidgetMetadata, schema: PropertySchema, factory: WidgetFactory) -> Self {
        self.candidates.push(PluginCandidate {
            origin: self.name.clone(),
            metadata,
            schema,
            factory,
        });
        self
    }
}

impl PluginSource for StaticPluginSource {
    fn describe(&self) -> SmolStr {
        self.name.clone()
    }

    fn candidates(&mut self) -> Vec<Result<PluginCandidate, PluginLoadError>> {
        std::mem::take(&mut self.candidates).into_iter().map(Ok).collect()
    }
}

/// Outcome of one discovery pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscoveryReport {
    pub registered: Vec<SmolStr>,
    pub warnings: Vec<String>,
}

impl DiscoveryReport {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}
