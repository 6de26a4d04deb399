//! `mosaic-core` - widget registry, layout model and frame scheduler for
//! low-resolution pixel displays.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![allow(clippy::module_name_repetitions)]

/// Engine configuration.
pub mod config;
/// Frame push interface and sinks.
pub mod device;
/// Layout document persistence.
pub mod document;
/// Engine errors.
pub mod error;
/// Layouts and composition order.
pub mod layout;
/// Widget kind registry.
pub mod registry;
/// Render data handed to the rasterizer.
pub mod render;
/// Frame loop thread.
pub mod runner;
/// Refresh scheduling and clocks.
pub mod scheduler;
/// Property schemas and validation.
pub mod schema;
/// Plugin sources for discovery.
pub mod source;
/// Property values and colours.
pub mod value;
/// Widget instances and behaviours.
pub mod widget;

pub use error::{MosaicError, RenderFailure};
pub use layout::{Layout, WidgetId};
pub use registry::{PluginVersion, WidgetFactory, WidgetMetadata, WidgetRegistry};
pub use render::{PropertyAccess, RenderData};
pub use scheduler::{Clock, Frame, ManualClock, Scheduler, StdClock, DEFAULT_BRIGHTNESS};
pub use schema::{PropertySchema, PropertySpec, PropertyType, Violation, ViolationKind};
pub use value::{PropertyMap, PropertyValue, Rgb};
pub use widget::{RenderContext, ScreenSize, Size, Widget, WidgetBehavior};
