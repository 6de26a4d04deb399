use mosaic_core::{
    PropertyAccess, PropertyMap, PropertySchema, PropertySpec, RenderContext, RenderData,
    RenderFailure, Rgb, ScreenSize, Size, WidgetBehavior, WidgetMetadata,
};

pub const KIND: &str = "SimpleText";

/// Approximate glyph advance at 64 px, used for the size hint.
const CHAR_WIDTH: u32 = 6;

pub fn metadata() -> WidgetMetadata {
    super::metadata(
        KIND,
        "Custom text with configurable colours and font size.",
        "Display",
        0,
    )
}

pub fn schema() -> PropertySchema {
    PropertySchema::new()
        .with(PropertySpec::string("text", "Hello").max_len(64).label("Text"))
        .with(PropertySpec::color("color", Rgb::WHITE).label("Text Color"))
        .with(PropertySpec::integer("font_size", 12, Some(8), Some(32)).label("Font Size"))
        .with(PropertySpec::color("background_color", Rgb::BLACK).label("Background Color"))
        .with(PropertySpec::boolean("transparent_background", true).label("Transparent Background"))
}

pub struct SimpleText;

impl WidgetBehavior for SimpleText {
    fn default_size(&self, screen: ScreenSize, properties: &PropertyMap) -> Size {
        let chars = properties
            .text("text")
            .map(|text| text.chars().count())
            .unwrap_or(5);
        let chars = u32::try_from(chars).unwrap_or(u32::MAX / CHAR_WIDTH);
        let font = properties
            .integer("font_size")
            .ok()
            .and_then(|size| u32::try_from(size).ok())
            .unwrap_or(12);
        screen.scaled(chars.saturating_mul(CHAR_WIDTH), font)
    }

    fn render(
        &self,
        properties: &PropertyMap,
        _ctx: &RenderContext,
    ) -> Result<RenderData, RenderFailure> {
        let mut data = RenderData::text(properties.text("text")?)
            .with("color", properties.color("color")?)
            .with("font_size", properties.integer("font_size")?);
        if !properties.boolean("transparent_background")? {
            data.set("background_color", properties.color("background_color")?);
        }
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;
    use mosaic_core::widget::Rect;

    #[test]
    fn background_only_when_opaque() {
        let ctx = RenderContext {
            now: NaiveDateTime::default(),
            screen: ScreenSize::S16,
            bounds: Rect::new(0, 0, 16, 8),
        };
        let mut props = schema().defaults();
        let data = SimpleText.render(&props, &ctx).unwrap();
        assert_eq!(data.text_value(), Some("Hello"));
        assert!(data.get("background_color").is_none());

        props.insert("transparent_background".into(), false.into());
        let data = SimpleText.render(&props, &ctx).unwrap();
        assert_eq!(data.color_value("background_color"), Some(Rgb::BLACK));
    }

    #[test]
    fn longer_text_gets_a_wider_hint() {
        let mut props = schema().defaults();
        let short = SimpleText.default_size(ScreenSize::S64, &props);
        props.insert("text".into(), "Hello, world".into());
        let long = SimpleText.default_size(ScreenSize::S64, &props);
        assert!(long.width > short.width);
    }
}
