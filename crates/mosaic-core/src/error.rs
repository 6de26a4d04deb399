//! Engine errors.

#![allow(missing_docs)]

use smol_str::SmolStr;
use thiserror::Error;

use crate::registry::PluginVersion;
use crate::schema::{Violation, ViolationKind};

/// Errors raised by direct API calls on the registry, layouts and documents.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MosaicError {
    /// A kind is already registered with an equal or higher version.
    #[error("widget kind '{kind}' already registered at {existing} (incoming {incoming})")]
    DuplicateKind {
        kind: SmolStr,
        existing: PluginVersion,
        incoming: PluginVersion,
    },

    /// A schema whose declared defaults fail their own constraints.
    #[error("invalid schema for '{kind}': {}", join_violations(.violations))]
    InvalidSchema {
        kind: SmolStr,
        violations: Vec<Violation>,
    },

    /// Reference to a kind that is not registered.
    #[error("unknown widget kind '{0}'")]
    UnknownKind(SmolStr),

    /// A property value rejected by the kind's schema.
    #[error("invalid property '{property}' for '{kind}': {violation}")]
    InvalidProperty {
        kind: SmolStr,
        property: SmolStr,
        violation: ViolationKind,
    },

    /// Screen size outside the supported set.
    #[error("unsupported screen size {0} (expected 16, 32 or 64)")]
    InvalidScreenSize(u32),

    /// Unknown layout widget id.
    #[error("no widget with id {0}")]
    UnknownWidget(u64),

    /// Malformed layout document.
    #[error("invalid layout document: {0}")]
    InvalidDocument(SmolStr),

    /// Invalid engine configuration.
    #[error("invalid config: {0}")]
    InvalidConfig(SmolStr),

    /// Filesystem failure.
    #[error("io error: {0}")]
    Io(SmolStr),

    /// Frame runner thread could not be spawned or joined.
    #[error("runner thread: {0}")]
    Thread(SmolStr),
}

impl MosaicError {
    /// Property name for [`MosaicError::InvalidProperty`].
    #[must_use]
    pub fn property(&self) -> Option<&str> {
        match self {
            Self::InvalidProperty { property, .. } => Some(property.as_str()),
            _ => None,
        }
    }

    /// True for the registration family (duplicate kind, invalid schema).
    #[must_use]
    pub fn is_registration_error(&self) -> bool {
        matches!(self, Self::DuplicateKind { .. } | Self::InvalidSchema { .. })
    }

    pub(crate) fn from_violation(kind: &str, violation: Violation) -> Self {
        Self::InvalidProperty {
            kind: SmolStr::new(kind),
            property: violation.property,
            violation: violation.kind,
        }
    }
}

fn join_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Internal widget computation failure, substituted by the render sentinel.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("render failed: {0}")]
pub struct RenderFailure(pub SmolStr);

impl RenderFailure {
    pub fn new(message: impl Into<SmolStr>) -> Self {
        Self(message.into())
    }
}
