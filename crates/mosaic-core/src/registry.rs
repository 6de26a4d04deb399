//! Widget kind registry.
//!
//! Maps a kind name to its metadata, property schema and factory. The
//! registry is a plain value: build one at startup, pass it by reference to
//! whatever needs to create widgets, drop it at exit.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

use smol_str::SmolStr;
use tracing::{debug, warn};

use crate::error::MosaicError;
use crate::schema::PropertySchema;
use crate::source::{DiscoveryReport, PluginSource};
use crate::value::PropertyMap;
use crate::widget::{ScreenSize, Widget, WidgetBehavior};

/// Builds a fresh behaviour object for one widget instance.
pub type WidgetFactory = Arc<dyn Fn() -> Box<dyn WidgetBehavior> + Send + Sync>;

/// `major.minor.patch` plugin version; missing parts read as 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct PluginVersion {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl PluginVersion {
    #[must_use]
    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Parse `1`, `1.2` or `1.2.3`; a leading `v` is accepted.
    pub fn parse(text: &str) -> Result<Self, MosaicError> {
        let invalid = || MosaicError::InvalidDocument(format!("invalid version '{text}'").into());
        let trimmed = text.trim();
        let trimmed = trimmed.strip_prefix('v').unwrap_or(trimmed);
        let mut parts = [0u64; 3];
        let mut count = 0;
        for part in trimmed.split('.') {
            let slot = parts.get_mut(count).ok_or_else(invalid)?;
            *slot = part.parse().map_err(|_| invalid())?;
            count += 1;
        }
        Ok(Self::new(parts[0], parts[1], parts[2]))
    }
}

impl fmt::Display for PluginVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Descriptive, immutable facts about a widget kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetMetadata {
    /// Stable kind identifier, e.g. `Clock`.
    pub kind: SmolStr,
    pub description: SmolStr,
    pub version: PluginVersion,
    pub author: SmolStr,
    pub category: SmolStr,
    /// External capabilities the kind reads from, e.g. `weather`.
    pub dependencies: BTreeSet<SmolStr>,
    /// Refresh cadence for new instances, in seconds.
    pub update_interval: u32,
}

impl WidgetMetadata {
    #[must_use]
    pub fn new(kind: &str, version: PluginVersion) -> Self {
        Self {
            kind: SmolStr::new(kind),
            description: SmolStr::default(),
            version,
            author: SmolStr::default(),
            category: SmolStr::new("general"),
            dependencies: BTreeSet::new(),
            update_interval: 60,
        }
    }

    #[must_use]
    pub fn description(mut self, text: &str) -> Self {
        self.description = SmolStr::new(text);
        self
    }

    #[must_use]
    pub fn author(mut self, text: &str) -> Self {
        self.author = SmolStr::new(text);
        self
    }

    #[must_use]
    pub fn category(mut self, text: &str) -> Self {
        self.category = SmolStr::new(text);
        self
    }

    #[must_use]
    pub fn depends_on(mut self, capability: &str) -> Self {
        self.dependencies.insert(SmolStr::new(capability));
        self
    }

    #[must_use]
    pub fn update_interval(mut self, seconds: u32) -> Self {
        self.update_interval = seconds;
        self
    }
}

/// What a successful registration did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registered {
    New,
    Upgraded { previous: PluginVersion },
    Forced { previous: PluginVersion },
}

#[derive(Clone)]
struct RegistryEntry {
    metadata: WidgetMetadata,
    schema: Arc<PropertySchema>,
    factory: WidgetFactory,
}

#[derive(Default)]
pub struct WidgetRegistry {
    entries: HashMap<SmolStr, RegistryEntry>,
    aliases: HashMap<SmolStr, SmolStr>,
}

impl WidgetRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a kind.
    ///
    /// An existing registration is replaced only by a strictly higher
    /// version; otherwise this returns [`MosaicError::DuplicateKind`] and the
    /// registry is left as it was. Defaults that fail their own schema are
    /// rejected with [`MosaicError::InvalidSchema`].
    pub fn register(
        &mut self,
        metadata: WidgetMetadata,
        schema: PropertySchema,
        factory: WidgetFactory,
    ) -> Result<Registered, MosaicError> {
        self.insert(metadata, schema, factory, false)
    }

    /// Register a kind, replacing any existing version.
    pub fn force_register(
        &mut self,
        metadata: WidgetMetadata,
        schema: PropertySchema,
        factory: WidgetFactory,
    ) -> Result<Registered, MosaicError> {
        self.insert(metadata, schema, factory, true)
    }

    fn insert(
        &mut self,
        metadata: WidgetMetadata,
        schema: PropertySchema,
        factory: WidgetFactory,
        force: bool,
    ) -> Result<Registered, MosaicError> {
        let kind = metadata.kind.clone();
        let violations = schema.validate_defaults();
        if !violations.is_empty() {
            return Err(MosaicError::InvalidSchema { kind, violations });
        }
        let outcome = match self.entries.get(&kind) {
            None => Registered::New,
            Some(existing) if force => Registered::Forced {
                previous: existing.metadata.version,
            },
            Some(existing) if metadata.version > existing.metadata.version => {
                Registered::Upgraded {
                    previous: existing.metadata.version,
                }
            }
            Some(existing) => {
                return Err(MosaicError::DuplicateKind {
                    kind,
                    existing: existing.metadata.version,
                    incoming: metadata.version,
                });
            }
        };
        debug!(kind = %kind, version = %metadata.version, ?outcome, "registered widget kind");
        self.aliases.remove(&kind);
        self.entries.insert(
            kind,
            RegistryEntry {
                metadata,
                schema: Arc::new(schema),
                factory,
            },
        );
        Ok(outcome)
    }

    /// Make `alias` resolve to an already registered `kind`.
    pub fn register_alias(&mut self, alias: &str, kind: &str) -> Result<(), MosaicError> {
        if !self.entries.contains_key(kind) {
            return Err(MosaicError::UnknownKind(SmolStr::new(kind)));
        }
        if self.entries.contains_key(alias) {
            warn!(alias, kind, "alias shadows a registered kind; ignored");
            return Ok(());
        }
        self.aliases.insert(SmolStr::new(alias), SmolStr::new(kind));
        Ok(())
    }

    /// Remove a kind and any aliases pointing at it.
    pub fn unregister(&mut self, kind: &str) -> Option<WidgetMetadata> {
        let entry = self.entries.remove(kind)?;
        self.aliases.retain(|_, target| target != kind);
        Some(entry.metadata)
    }

    /// Canonical kind for a name or alias.
    #[must_use]
    pub fn resolve(&self, name: &str) -> Option<&str> {
        if let Some((kind, _)) = self.entries.get_key_value(name) {
            return Some(kind.as_str());
        }
        self.aliases.get(name).map(SmolStr::as_str)
    }

    fn entry(&self, name: &str) -> Result<&RegistryEntry, MosaicError> {
        self.resolve(name)
            .and_then(|kind| self.entries.get(kind))
            .ok_or_else(|| MosaicError::UnknownKind(SmolStr::new(name)))
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.resolve(name).is_some()
    }

    #[must_use]
    pub fn metadata(&self, name: &str) -> Option<&WidgetMetadata> {
        self.entry(name).ok().map(|entry| &entry.metadata)
    }

    #[must_use]
    pub fn schema(&self, name: &str) -> Option<&PropertySchema> {
        self.entry(name).ok().map(|entry| entry.schema.as_ref())
    }

    /// Metadata for every kind, sorted by kind.
    #[must_use]
    pub fn list(&self) -> Vec<&WidgetMetadata> {
        let mut all: Vec<&WidgetMetadata> =
            self.entries.values().map(|entry| &entry.metadata).collect();
        all.sort_by(|a, b| a.kind.cmp(&b.kind));
        all
    }

    /// Kinds in a category, sorted by kind.
    #[must_use]
    pub fn by_category(&self, category: &str) -> Vec<&WidgetMetadata> {
        self.list()
            .into_iter()
            .filter(|metadata| metadata.category.eq_ignore_ascii_case(category))
            .collect()
    }

    /// Distinct categories, sorted.
    #[must_use]
    pub fn categories(&self) -> Vec<SmolStr> {
        let names: BTreeSet<SmolStr> = self
            .entries
            .values()
            .map(|entry| entry.metadata.category.clone())
            .collect();
        names.into_iter().collect()
    }

    /// Declared capabilities of `kind` missing from `available`.
    pub fn missing_dependencies(
        &self,
        kind: &str,
        available: &BTreeSet<SmolStr>,
    ) -> Result<Vec<SmolStr>, MosaicError> {
        let entry = self.entry(kind)?;
        Ok(entry
            .metadata
            .dependencies
            .difference(available)
            .cloned()
            .collect())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Create an instance sized for the largest screen.
    pub fn create(&self, kind: &str, overrides: PropertyMap) -> Result<Widget, MosaicError> {
        self.create_for(kind, overrides, ScreenSize::S64)
    }

    /// Create an instance: schema defaults merged under `overrides`, size
    /// seeded from the kind's hint for `screen`.
    pub fn create_for(
        &self,
        kind: &str,
        overrides: PropertyMap,
        screen: ScreenSize,
    ) -> Result<Widget, MosaicError> {
        let entry = self.entry(kind)?;
        let canonical = entry.metadata.kind.clone();
        let mut properties = entry.schema.defaults();
        for (name, value) in overrides {
            entry
                .schema
                .check(&name, &value)
                .map_err(|violation| MosaicError::from_violation(&canonical, violation))?;
            properties.insert(name, value);
        }
        let behavior = (entry.factory)();
        Ok(Widget::new(
            canonical,
            entry.schema.clone(),
            behavior,
            properties,
            entry.metadata.update_interval,
            screen,
        ))
    }

    /// Register every candidate a source yields.
    ///
    /// Candidates from a source are untrusted: a failed read, an invalid
    /// schema or a stale version is logged and recorded in the report, and
    /// discovery moves on to the next candidate.
    pub fn discover(&mut self, source: &mut dyn PluginSource) -> DiscoveryReport {
        let mut report = DiscoveryReport::default();
        let origin = source.describe();
        for candidate in source.candidates() {
            let candidate = match candidate {
                Ok(candidate) => candidate,
                Err(failure) => {
                    warn!(source = %origin, "skipping plugin: {failure}");
                    report.warnings.push(failure.to_string());
                    continue;
                }
            };
            let kind = candidate.metadata.kind.clone();
            match self.register(candidate.metadata, candidate.schema, candidate.factory) {
                Ok(_) => report.registered.push(kind),
                Err(err) => {
                    warn!(source = %origin, kind = %kind, "skipping plugin: {err}");
                    report.warnings.push(format!("{}: {err}", candidate.origin));
                }
            }
        }
        report
    }
}

impl fmt::Debug for WidgetRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<&SmolStr> = self.entries.keys().collect();
        kinds.sort();
        f.debug_struct("WidgetRegistry")
            .field("kinds", &kinds)
            .field("aliases", &self.aliases.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RenderFailure;
    use crate::render::RenderData;
    use crate::schema::{PropertySpec, ViolationKind};
    use crate::widget::{RenderContext, Size};

    struct Blank;

    impl WidgetBehavior for Blank {
        fn default_size(&self, screen: ScreenSize, _properties: &PropertyMap) -> Size {
            screen.scaled(30, 10)
        }

        fn render(
            &self,
            _properties: &PropertyMap,
            _ctx: &RenderContext,
        ) -> Result<RenderData, RenderFailure> {
            Ok(RenderData::text(""))
        }
    }

    fn factory() -> WidgetFactory {
        Arc::new(|| Box::new(Blank) as Box<dyn WidgetBehavior>)
    }

    fn schema() -> PropertySchema {
        PropertySchema::new()
            .with(PropertySpec::integer("font_size", 12, Some(8), Some(32)))
            .with(PropertySpec::select("unit", "C", &["C", "F"]))
    }

    fn meta(kind: &str, version: &str) -> WidgetMetadata {
        WidgetMetadata::new(kind, PluginVersion::parse(version).unwrap())
    }

    #[test]
    fn versions_parse_and_order() {
        assert_eq!(PluginVersion::parse("v1.2").unwrap(), PluginVersion::new(1, 2, 0));
        assert!(PluginVersion::parse("1.10.0").unwrap() > PluginVersion::parse("1.9.9").unwrap());
        assert!(PluginVersion::parse("1.2.3.4").is_err());
        assert!(PluginVersion::parse("one").is_err());
    }

    #[test]
    fn lower_or_equal_version_is_rejected_and_kept() {
        let mut registry = WidgetRegistry::new();
        registry
            .register(meta("Text", "1.1.0").description("first"), schema(), factory())
            .unwrap();
        for version in ["1.0.0", "1.1.0"] {
            let err = registry
                .register(meta("Text", version).description("stale"), schema(), factory())
                .unwrap_err();
            assert!(err.is_registration_error());
        }
        assert_eq!(registry.metadata("Text").unwrap().description, "first");
    }

    #[test]
    fn higher_version_replaces_and_force_overrides() {
        let mut registry = WidgetRegistry::new();
        registry.register(meta("Text", "1.0.0"), schema(), factory()).unwrap();
        let outcome = registry.register(meta("Text", "2.0.0"), schema(), factory()).unwrap();
        assert_eq!(
            outcome,
            Registered::Upgraded {
                previous: PluginVersion::new(1, 0, 0)
            }
        );
        let outcome = registry
            .force_register(meta("Text", "0.1.0"), schema(), factory())
            .unwrap();
        assert!(matches!(outcome, Registered::Forced { .. }));
        assert_eq!(registry.metadata("Text").unwrap().version, PluginVersion::new(0, 1, 0));
    }

    #[test]
    fn invalid_default_fails_registration() {
        let mut registry = WidgetRegistry::new();
        let bad = PropertySchema::new().with(PropertySpec::select("unit", "K", &["C", "F"]));
        let err = registry.register(meta("Bad", "1.0.0"), bad, factory()).unwrap_err();
        assert!(matches!(err, MosaicError::InvalidSchema { ref kind, .. } if kind == "Bad"));
        assert!(!registry.contains("Bad"));
    }

    #[test]
    fn create_merges_overrides_over_defaults() {
        let mut registry = WidgetRegistry::new();
        registry.register(meta("Text", "1.0.0"), schema(), factory()).unwrap();
        let mut overrides = PropertyMap::new();
        overrides.insert("unit".into(), "F".into());
        let widget = registry.create("Text", overrides).unwrap();
        assert_eq!(widget.property("unit"), Some(&"F".into()));
        assert_eq!(widget.property("font_size"), Some(&12.into()));
        assert_eq!(widget.size(), Size::new(30, 15));
    }

    #[test]
    fn create_rejects_unknown_kind_and_bad_override() {
        let mut registry = WidgetRegistry::new();
        registry.register(meta("Text", "1.0.0"), schema(), factory()).unwrap();
        assert_eq!(
            registry.create("Nope", PropertyMap::new()).unwrap_err(),
            MosaicError::UnknownKind("Nope".into())
        );
        let mut overrides = PropertyMap::new();
        overrides.insert("unit".into(), "K".into());
        let err = registry.create("Text", overrides).unwrap_err();
        assert_eq!(err.property(), Some("unit"));
        assert!(matches!(
            err,
            MosaicError::InvalidProperty {
                violation: ViolationKind::InvalidOption { .. },
                ..
            }
        ));
    }

    #[test]
    fn aliases_resolve_to_canonical_kind() {
        let mut registry = WidgetRegistry::new();
        registry.register(meta("Text", "1.0.0"), schema(), factory()).unwrap();
        registry.register_alias("TextWidget", "Text").unwrap();
        let widget = registry.create("TextWidget", PropertyMap::new()).unwrap();
        assert_eq!(widget.kind(), "Text");
        assert!(registry.register_alias("Other", "Missing").is_err());
        registry.unregister("Text");
        assert!(!registry.contains("TextWidget"));
    }

    #[test]
    fn listing_is_sorted_and_filterable() {
        let mut registry = WidgetRegistry::new();
        registry
            .register(meta("Weather", "1.0.0").category("data"), schema(), factory())
            .unwrap();
        registry
            .register(meta("Clock", "1.0.0").category("time"), schema(), factory())
            .unwrap();
        registry
            .register(meta("Date", "1.0.0").category("time"), schema(), factory())
            .unwrap();
        let kinds: Vec<&str> = registry.list().iter().map(|m| m.kind.as_str()).collect();
        assert_eq!(kinds, vec!["Clock", "Date", "Weather"]);
        assert_eq!(registry.by_category("TIME").len(), 2);
        assert_eq!(registry.categories(), vec![SmolStr::new("data"), SmolStr::new("time")]);
    }

    #[test]
    fn missing_dependencies_reports_undeclared_capabilities() {
        let mut registry = WidgetRegistry::new();
        registry
            .register(meta("Weather", "1.0.0").depends_on("weather"), schema(), factory())
            .unwrap();
        let none = BTreeSet::new();
        assert_eq!(
            registry.missing_dependencies("Weather", &none).unwrap(),
            vec![SmolStr::new("weather")]
        );
        let all: BTreeSet<SmolStr> = [SmolStr::new("weather")].into_iter().collect();
        assert!(registry.missing_dependencies("Weather", &all).unwrap().is_empty());
    }
}
