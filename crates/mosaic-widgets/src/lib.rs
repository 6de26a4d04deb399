//! `mosaic-widgets` - built-in widget kinds, data providers and file-based
//! plugin descriptors for `mosaic-core`.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![allow(clippy::module_name_repetitions)]

/// Declarative plugin descriptors and directory discovery.
pub mod descriptor;
/// Built-in widget kinds.
pub mod kinds;
/// Non-blocking data providers.
pub mod providers;

use std::path::PathBuf;

use mosaic_core::source::DiscoveryReport;
use mosaic_core::{MosaicError, WidgetRegistry};
use tracing::{debug, warn};

pub use descriptor::DirectoryPluginSource;
pub use kinds::BuiltinKind;
pub use providers::Providers;

/// Register every built-in kind plus its legacy `<Kind>Widget` alias.
pub fn register_builtins(
    registry: &mut WidgetRegistry,
    providers: &Providers,
) -> Result<(), MosaicError> {
    for kind in BuiltinKind::ALL {
        registry.register(kind.metadata(), kind.schema(), kind.factory(providers))?;
        registry.register_alias(&kind.legacy_alias(), kind.name())?;
    }
    let available = providers.capabilities();
    for kind in BuiltinKind::ALL {
        let missing = registry.missing_dependencies(kind.name(), &available)?;
        if !missing.is_empty() {
            debug!(kind = kind.name(), ?missing, "no provider; widget will show placeholders");
        }
    }
    Ok(())
}

/// A registry holding only the built-in kinds.
pub fn builtin_registry(providers: &Providers) -> Result<WidgetRegistry, MosaicError> {
    let mut registry = WidgetRegistry::new();
    register_builtins(&mut registry, providers)?;
    Ok(registry)
}

/// Run descriptor discovery over each directory in turn and merge the
/// reports. A missing directory is a warning, not an error.
pub fn discover_dirs(registry: &mut WidgetRegistry, dirs: &[PathBuf]) -> DiscoveryReport {
    let mut merged = DiscoveryReport::default();
    for dir in dirs {
        if !dir.is_dir() {
            warn!(dir = %dir.display(), "plugin directory not found");
            merged
                .warnings
                .push(format!("{}: plugin directory not found", dir.display()));
            continue;
        }
        let report = registry.discover(&mut DirectoryPluginSource::new(dir.clone()));
        merged.registered.extend(report.registered);
        merged.warnings.extend(report.warnings);
    }
    merged
}
