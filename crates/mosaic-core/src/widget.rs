//! Widget instances and the per-kind behaviour interface.

use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::sync::Arc;
use tracing::warn;

use crate::error::{MosaicError, RenderFailure};
use crate::render::RenderData;
use crate::schema::PropertySchema;
use crate::value::{PropertyMap, PropertyValue};

/// Supported square display sizes, in pixels per side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum ScreenSize {
    S16,
    S32,
    S64,
}

impl ScreenSize {
    /// All sizes, smallest first.
    pub const ALL: [ScreenSize; 3] = [ScreenSize::S16, ScreenSize::S32, ScreenSize::S64];

    #[must_use]
    pub fn pixels(self) -> u32 {
        match self {
            Self::S16 => 16,
            Self::S32 => 32,
            Self::S64 => 64,
        }
    }

    pub fn from_pixels(pixels: u32) -> Result<Self, MosaicError> {
        match pixels {
            16 => Ok(Self::S16),
            32 => Ok(Self::S32),
            64 => Ok(Self::S64),
            other => Err(MosaicError::InvalidScreenSize(other)),
        }
    }

    /// Ratio to the largest supported screen.
    #[must_use]
    pub fn scale(self) -> f64 {
        f64::from(self.pixels()) / 64.0
    }

    /// Smallest size any widget may default to on this screen.
    #[must_use]
    pub fn min_widget_size(self) -> Size {
        match self {
            Self::S16 => Size::new(10, 8),
            Self::S32 => Size::new(20, 12),
            Self::S64 => Size::new(30, 15),
        }
    }

    /// Scale a size hint expressed for a 64 px screen, honouring the
    /// per-screen minimum and the screen edge.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn scaled(self, width_at_64: u32, height_at_64: u32) -> Size {
        let floor = self.min_widget_size();
        let scale = |value: u32| (f64::from(value) * self.scale()).round() as u32;
        let edge = self.pixels();
        Size::new(
            scale(width_at_64).max(floor.width).min(edge),
            scale(height_at_64).max(floor.height).min(edge),
        )
    }
}

impl Default for ScreenSize {
    fn default() -> Self {
        Self::S64
    }
}

impl TryFrom<u32> for ScreenSize {
    type Error = MosaicError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::from_pixels(value)
    }
}

impl From<ScreenSize> for u32 {
    fn from(value: ScreenSize) -> Self {
        value.pixels()
    }
}

impl fmt::Display for ScreenSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{0}x{0}", self.pixels())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Axis-aligned box in screen pixels; the origin may be negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    #[must_use]
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    fn right(&self) -> i64 {
        i64::from(self.x) + i64::from(self.width)
    }

    fn bottom(&self) -> i64 {
        i64::from(self.y) + i64::from(self.height)
    }

    #[must_use]
    pub fn contains_point(&self, x: i32, y: i32) -> bool {
        x >= self.x && y >= self.y && i64::from(x) < self.right() && i64::from(y) < self.bottom()
    }

    #[must_use]
    pub fn intersects(&self, other: &Rect) -> bool {
        i64::from(self.x) < other.right()
            && i64::from(other.x) < self.right()
            && i64::from(self.y) < other.bottom()
            && i64::from(other.y) < self.bottom()
    }

    /// True when the whole box lies inside `[0, screen)` on both axes.
    #[must_use]
    pub fn within(&self, screen: ScreenSize) -> bool {
        let edge = i64::from(screen.pixels());
        self.x >= 0 && self.y >= 0 && self.right() <= edge && self.bottom() <= edge
    }

    /// Shift (and if needed shrink) the box so it lies on the screen.
    #[must_use]
    pub fn clamped(&self, screen: ScreenSize) -> Rect {
        let edge = screen.pixels();
        let width = self.width.clamp(1, edge);
        let height = self.height.clamp(1, edge);
        let max_x = i32::try_from(edge - width).unwrap_or(0);
        let max_y = i32::try_from(edge - height).unwrap_or(0);
        Rect::new(self.x.clamp(0, max_x), self.y.clamp(0, max_y), width, height)
    }
}

/// Inputs available to a widget while it renders.
#[derive(Debug, Clone, Copy)]
pub struct RenderContext {
    /// Local wall-clock time of the tick.
    pub now: NaiveDateTime,
    pub screen: ScreenSize,
    /// On-screen box after clamping.
    pub bounds: Rect,
}

/// Per-kind capabilities: a size hint and a render function.
///
/// Implementations must not block. Data with latency comes from a provider
/// that answers from its own cache.
pub trait WidgetBehavior: Send + Sync {
    /// Size hint for a fresh instance. Must not shrink as the screen grows.
    fn default_size(&self, screen: ScreenSize, properties: &PropertyMap) -> Size;

    /// Compute render data from validated properties.
    fn render(
        &self,
        properties: &PropertyMap,
        ctx: &RenderContext,
    ) -> Result<RenderData, RenderFailure>;
}

/// One positioned, configured widget owned by a layout.
pub struct Widget {
    kind: SmolStr,
    x: i32,
    y: i32,
    width: u32,
    height: u32,
    z_index: i32,
    visible: bool,
    update_interval: u32,
    properties: PropertyMap,
    schema: Arc<PropertySchema>,
    behavior: Box<dyn WidgetBehavior>,
    revision: u64,
}

impl Widget {
    /// Assemble an instance; callers normally go through the registry.
    pub(crate) fn new(
        kind: SmolStr,
        schema: Arc<PropertySchema>,
        behavior: Box<dyn WidgetBehavior>,
        properties: PropertyMap,
        update_interval: u32,
        screen: ScreenSize,
    ) -> Self {
        let size = behavior.default_size(screen, &properties);
        Self {
            kind,
            x: 0,
            y: 0,
            width: size.width.max(1),
            height: size.height.max(1),
            z_index: 0,
            visible: true,
            update_interval,
            properties,
            schema,
            behavior,
            revision: 0,
        }
    }

    #[must_use]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    #[must_use]
    pub fn position(&self) -> (i32, i32) {
        (self.x, self.y)
    }

    #[must_use]
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    #[must_use]
    pub fn bounds(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    #[must_use]
    pub fn contains_point(&self, x: i32, y: i32) -> bool {
        self.bounds().contains_point(x, y)
    }

    #[must_use]
    pub fn z_index(&self) -> i32 {
        self.z_index
    }

    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Seconds between refreshes; 0 renders once.
    #[must_use]
    pub fn update_interval(&self) -> u32 {
        self.update_interval
    }

    #[must_use]
    pub fn properties(&self) -> &PropertyMap {
        &self.properties
    }

    #[must_use]
    pub fn property(&self, name: &str) -> Option<&PropertyValue> {
        self.properties.get(name)
    }

    #[must_use]
    pub fn schema(&self) -> &PropertySchema {
        &self.schema
    }

    /// Bumped on every mutation; the scheduler re-renders on change.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Size hint of this widget's kind for `screen`.
    #[must_use]
    pub fn default_size(&self, screen: ScreenSize) -> Size {
        self.behavior.default_size(screen, &self.properties)
    }

    fn touch(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }

    pub fn set_position(&mut self, x: i32, y: i32) {
        self.x = x;
        self.y = y;
        self.touch();
    }

    /// Width and height are raised to at least 1.
    pub fn set_size(&mut self, width: u32, height: u32) {
        self.width = width.max(1);
        self.height = height.max(1);
        self.touch();
    }

    pub fn set_z_index(&mut self, z_index: i32) {
        self.z_index = z_index;
        self.touch();
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
        self.touch();
    }

    pub fn set_update_interval(&mut self, seconds: u32) {
        self.update_interval = seconds;
        self.touch();
    }

    /// Replace one property after checking it against the schema.
    pub fn set_property(
        &mut self,
        name: &str,
        value: impl Into<PropertyValue>,
    ) -> Result<(), MosaicError> {
        let value = value.into();
        self.schema
            .check(name, &value)
            .map_err(|violation| MosaicError::from_violation(&self.kind, violation))?;
        self.properties.insert(SmolStr::new(name), value);
        self.touch();
        Ok(())
    }

    /// Restore one property to its schema default.
    pub fn reset_property(&mut self, name: &str) -> Result<(), MosaicError> {
        let spec = self.schema.get(name).ok_or_else(|| MosaicError::InvalidProperty {
            kind: self.kind.clone(),
            property: SmolStr::new(name),
            violation: crate::schema::ViolationKind::UnknownProperty,
        })?;
        self.properties.insert(spec.name.clone(), spec.default.clone());
        self.touch();
        Ok(())
    }

    /// Render data for this widget. Never fails: an internal error is logged
    /// and replaced by [`RenderData::error_sentinel`].
    #[must_use]
    pub fn render_data(&self, now: NaiveDateTime, screen: ScreenSize) -> RenderData {
        let ctx = RenderContext {
            now,
            screen,
            bounds: self.bounds().clamped(screen),
        };
        match self.behavior.render(&self.properties, &ctx) {
            Ok(data) => data,
            Err(err) => {
                warn!(kind = %self.kind, "{err}; drawing error sentinel");
                RenderData::error_sentinel()
            }
        }
    }

    pub(crate) fn set_geometry(&mut self, bounds: Rect, z_index: i32, visible: bool) {
        self.x = bounds.x;
        self.y = bounds.y;
        self.width = bounds.width.max(1);
        self.height = bounds.height.max(1);
        self.z_index = z_index;
        self.visible = visible;
    }

    pub(crate) fn replace_properties(&mut self, properties: PropertyMap) {
        self.properties = properties;
    }
}

impl PartialEq for Widget {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.bounds() == other.bounds()
            && self.z_index == other.z_index
            && self.visible == other.visible
            && self.update_interval == other.update_interval
            && self.properties == other.properties
    }
}

impl fmt::Debug for Widget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Widget")
            .field("kind", &self.kind)
            .field("bounds", &self.bounds())
            .field("z_index", &self.z_index)
            .field("visible", &self.visible)
            .field("update_interval", &self.update_interval)
            .field("properties", &self.properties)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn screen_sizes_parse_only_supported_values() {
        assert_eq!(ScreenSize::from_pixels(32).unwrap(), ScreenSize::S32);
        assert_eq!(
            ScreenSize::from_pixels(48),
            Err(MosaicError::InvalidScreenSize(48))
        );
    }

    #[test]
    fn scaled_size_respects_minimums_and_grows_with_screen() {
        let mut previous = Size::new(0, 0);
        for screen in ScreenSize::ALL {
            let size = screen.scaled(8, 4);
            let floor = screen.min_widget_size();
            assert!(size.width >= floor.width && size.height >= floor.height);
            assert!(size.width >= previous.width && size.height >= previous.height);
            previous = size;
        }
        assert_eq!(ScreenSize::S16.scaled(8, 4), Size::new(10, 8));
        assert_eq!(ScreenSize::S64.scaled(8, 4), Size::new(30, 15));
    }

    #[test]
    fn scaled_size_never_exceeds_screen() {
        assert_eq!(ScreenSize::S16.scaled(200, 200), Size::new(16, 16));
    }

    #[test]
    fn rect_clamping_pulls_negative_origins_on_screen() {
        let rect = Rect::new(-5, 60, 10, 10).clamped(ScreenSize::S64);
        assert_eq!(rect, Rect::new(0, 54, 10, 10));
        let oversized = Rect::new(3, 3, 100, 4).clamped(ScreenSize::S32);
        assert_eq!(oversized, Rect::new(0, 3, 32, 4));
    }

    #[test]
    fn rect_bounds_checks() {
        let rect = Rect::new(2, 2, 10, 4);
        assert!(rect.contains_point(2, 2));
        assert!(rect.contains_point(11, 5));
        assert!(!rect.contains_point(12, 5));
        assert!(rect.within(ScreenSize::S16));
        assert!(!Rect::new(10, 0, 10, 4).within(ScreenSize::S16));
        assert!(rect.intersects(&Rect::new(11, 5, 3, 3)));
        assert!(!rect.intersects(&Rect::new(12, 0, 3, 3)));
    }
}
