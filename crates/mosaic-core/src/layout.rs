//! Layouts: the widgets of one screen and their composition order.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::NaiveDateTime;
use serde::Serialize;
use smol_str::SmolStr;

use crate::error::MosaicError;
use crate::registry::WidgetRegistry;
use crate::render::RenderData;
use crate::schema::Violation;
use crate::value::{PropertyMap, Rgb};
use crate::widget::{Rect, ScreenSize, Widget};

/// Layout-assigned widget handle; also the insertion sequence number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct WidgetId(u64);

impl WidgetId {
    #[must_use]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for WidgetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A problem found by [`Layout::validate`].
#[derive(Debug, Clone, PartialEq)]
pub enum LayoutViolation {
    OutOfBounds {
        id: WidgetId,
        kind: SmolStr,
        bounds: Rect,
        screen: ScreenSize,
    },
    Property {
        id: WidgetId,
        kind: SmolStr,
        violation: Violation,
    },
    UnregisteredKind {
        id: WidgetId,
        kind: SmolStr,
    },
}

impl LayoutViolation {
    #[must_use]
    pub fn widget(&self) -> WidgetId {
        match self {
            Self::OutOfBounds { id, .. }
            | Self::Property { id, .. }
            | Self::UnregisteredKind { id, .. } => *id,
        }
    }
}

impl fmt::Display for LayoutViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfBounds {
                id,
                kind,
                bounds,
                screen,
            } => write!(
                f,
                "{kind} {id} at ({}, {}) size {}x{} leaves the {screen} screen",
                bounds.x, bounds.y, bounds.width, bounds.height
            ),
            Self::Property {
                id,
                kind,
                violation,
            } => write!(f, "{kind} {id}: {violation}"),
            Self::UnregisteredKind { id, kind } => {
                write!(f, "{kind} {id}: kind is not registered")
            }
        }
    }
}

/// One composed widget, ready for the rasterizer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderEntry {
    pub id: WidgetId,
    pub kind: SmolStr,
    pub z_index: i32,
    /// Widget box clamped to the screen.
    pub bounds: Rect,
    pub data: RenderData,
}

#[derive(Debug)]
struct Slot {
    id: WidgetId,
    widget: Widget,
}

/// Widgets for one screen size. The layout exclusively owns its widgets.
#[derive(Debug)]
pub struct Layout {
    screen: ScreenSize,
    background: Rgb,
    slots: Vec<Slot>,
    next_id: u64,
    /// Process-unique; widget ids are only unique within one layout.
    instance: u64,
}

static NEXT_INSTANCE: AtomicU64 = AtomicU64::new(0);

impl Layout {
    #[must_use]
    pub fn new(screen: ScreenSize) -> Self {
        Self {
            screen,
            background: Rgb::BLACK,
            slots: Vec::new(),
            next_id: 0,
            instance: NEXT_INSTANCE.fetch_add(1, Ordering::Relaxed),
        }
    }

    pub(crate) fn instance(&self) -> u64 {
        self.instance
    }

    #[must_use]
    pub fn screen_size(&self) -> ScreenSize {
        self.screen
    }

    /// Change the target screen; widgets keep their geometry.
    pub fn set_screen_size(&mut self, screen: ScreenSize) {
        self.screen = screen;
    }

    #[must_use]
    pub fn background_color(&self) -> Rgb {
        self.background
    }

    pub fn set_background_color(&mut self, color: Rgb) {
        self.background = color;
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    fn max_z(&self) -> Option<i32> {
        self.slots.iter().map(|slot| slot.widget.z_index()).max()
    }

    fn min_z(&self) -> Option<i32> {
        self.slots.iter().map(|slot| slot.widget.z_index()).min()
    }

    /// Append on top of everything: z-index becomes current max + 1
    /// (0 for an empty layout).
    pub fn add(&mut self, mut widget: Widget) -> WidgetId {
        let z = self.max_z().map_or(0, |max| max.saturating_add(1));
        widget.set_z_index(z);
        self.push(widget)
    }

    /// Append keeping the z-index set on the widget.
    pub fn add_with_z(&mut self, mut widget: Widget, z_index: i32) -> WidgetId {
        widget.set_z_index(z_index);
        self.push(widget)
    }

    pub(crate) fn push(&mut self, widget: Widget) -> WidgetId {
        let id = WidgetId(self.next_id);
        self.next_id += 1;
        self.slots.push(Slot { id, widget });
        id
    }

    /// Create a widget sized for this layout's screen and add it on top.
    pub fn spawn(
        &mut self,
        registry: &WidgetRegistry,
        kind: &str,
        overrides: PropertyMap,
    ) -> Result<WidgetId, MosaicError> {
        let widget = registry.create_for(kind, overrides, self.screen)?;
        Ok(self.add(widget))
    }

    pub fn remove(&mut self, id: WidgetId) -> Option<Widget> {
        let index = self.slots.iter().position(|slot| slot.id == id)?;
        Some(self.slots.remove(index).widget)
    }

    pub fn clear(&mut self) {
        self.slots.clear();
    }

    #[must_use]
    pub fn get(&self, id: WidgetId) -> Option<&Widget> {
        self.slots
            .iter()
            .find(|slot| slot.id == id)
            .map(|slot| &slot.widget)
    }

    pub fn get_mut(&mut self, id: WidgetId) -> Option<&mut Widget> {
        self.slots
            .iter_mut()
            .find(|slot| slot.id == id)
            .map(|slot| &mut slot.widget)
    }

    /// Widgets in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (WidgetId, &Widget)> {
        self.slots.iter().map(|slot| (slot.id, &slot.widget))
    }

    /// Every widget id in composition order: z-index, then insertion.
    #[must_use]
    pub fn composition_order(&self) -> Vec<WidgetId> {
        let mut order: Vec<(i32, WidgetId)> = self
            .slots
            .iter()
            .map(|slot| (slot.widget.z_index(), slot.id))
            .collect();
        order.sort_unstable();
        order.into_iter().map(|(_, id)| id).collect()
    }

    /// Visible widgets in composition order.
    pub fn visible_in_order(&self) -> impl Iterator<Item = (WidgetId, &Widget)> {
        self.composition_order()
            .into_iter()
            .filter_map(move |id| self.get(id).map(|widget| (id, widget)))
            .filter(|(_, widget)| widget.is_visible())
    }

    /// Top-most visible widget under a point.
    #[must_use]
    pub fn widget_at(&self, x: i32, y: i32) -> Option<WidgetId> {
        let visible: Vec<(WidgetId, &Widget)> = self.visible_in_order().collect();
        visible
            .into_iter()
            .rev()
            .find(|(_, widget)| widget.contains_point(x, y))
            .map(|(id, _)| id)
    }

    /// Visible widgets overlapping `area`, in composition order.
    #[must_use]
    pub fn widgets_in_area(&self, area: Rect) -> Vec<WidgetId> {
        self.visible_in_order()
            .filter(|(_, widget)| widget.bounds().intersects(&area))
            .map(|(id, _)| id)
            .collect()
    }

    pub fn bring_to_front(&mut self, id: WidgetId) -> Result<(), MosaicError> {
        let z = self.max_z().unwrap_or(0).saturating_add(1);
        self.set_z(id, z)
    }

    pub fn send_to_back(&mut self, id: WidgetId) -> Result<(), MosaicError> {
        let z = self.min_z().unwrap_or(0).saturating_sub(1);
        self.set_z(id, z)
    }

    fn set_z(&mut self, id: WidgetId, z: i32) -> Result<(), MosaicError> {
        let widget = self.get_mut(id).ok_or(MosaicError::UnknownWidget(id.get()))?;
        widget.set_z_index(z);
        Ok(())
    }

    /// Collect every bounds and property problem. Nothing here is fatal;
    /// callers decide whether to persist or push anyway.
    #[must_use]
    pub fn validate(&self, registry: &WidgetRegistry) -> Vec<LayoutViolation> {
        let mut violations = Vec::new();
        for slot in &self.slots {
            let widget = &slot.widget;
            let kind = SmolStr::new(widget.kind());
            let bounds = widget.bounds();
            if !bounds.within(self.screen) {
                violations.push(LayoutViolation::OutOfBounds {
                    id: slot.id,
                    kind: kind.clone(),
                    bounds,
                    screen: self.screen,
                });
            }
            let Some(schema) = registry.schema(widget.kind()) else {
                violations.push(LayoutViolation::UnregisteredKind { id: slot.id, kind });
                continue;
            };
            for violation in schema.validate(widget.properties()) {
                violations.push(LayoutViolation::Property {
                    id: slot.id,
                    kind: kind.clone(),
                    violation,
                });
            }
        }
        violations
    }

    /// Render every visible widget in composition order; later entries paint
    /// over earlier ones.
    #[must_use]
    pub fn render_sequence(&self, now: NaiveDateTime) -> Vec<RenderEntry> {
        self.visible_in_order()
            .map(|(id, widget)| RenderEntry {
                id,
                kind: SmolStr::new(widget.kind()),
                z_index: widget.z_index(),
                bounds: widget.bounds().clamped(self.screen),
                data: widget.render_data(now, self.screen),
            })
            .collect()
    }
}

impl Default for Layout {
    fn default() -> Self {
        Self::new(ScreenSize::default())
    }
}
