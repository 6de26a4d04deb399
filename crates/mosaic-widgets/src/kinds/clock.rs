use mosaic_core::{
    PropertyAccess, PropertyMap, PropertySchema, PropertySpec, RenderContext, RenderData,
    RenderFailure, Rgb, ScreenSize, Size, WidgetBehavior, WidgetMetadata,
};

pub const KIND: &str = "Clock";

pub fn metadata() -> WidgetMetadata {
    super::metadata(KIND, "Displays the current time.", "Time", 60)
}

pub fn schema() -> PropertySchema {
    PropertySchema::new()
        .with(PropertySpec::select("time_format", "24", &["24", "12"]).label("Time Format"))
        .with(PropertySpec::boolean("show_seconds", false).label("Show Seconds"))
        .with(PropertySpec::integer("font_size", 4, Some(2), Some(8)).label("Font Size"))
        .with(PropertySpec::color("color", Rgb::WHITE).label("Text Color"))
}

fn pattern(twelve_hour: bool, seconds: bool) -> &'static str {
    match (twelve_hour, seconds) {
        (true, true) => "%I:%M:%S %p",
        (true, false) => "%I:%M %p",
        (false, true) => "%H:%M:%S",
        (false, false) => "%H:%M",
    }
}

pub struct Clock;

impl WidgetBehavior for Clock {
    fn default_size(&self, screen: ScreenSize, properties: &PropertyMap) -> Size {
        let twelve_hour = properties.text("time_format").is_ok_and(|format| format == "12");
        let seconds = properties.boolean("show_seconds").unwrap_or(false);
        let font = properties
            .integer("font_size")
            .ok()
            .and_then(|size| u32::try_from(size).ok())
            .unwrap_or(4);
        let chars = u32::try_from(pattern(twelve_hour, seconds).len()).unwrap_or(8);
        screen.scaled(chars * font, font + 2)
    }

    fn render(
        &self,
        properties: &PropertyMap,
        ctx: &RenderContext,
    ) -> Result<RenderData, RenderFailure> {
        let twelve_hour = properties.text("time_format")? == "12";
        let seconds = properties.boolean("show_seconds")?;
        let text = super::format_time(ctx.now, pattern(twelve_hour, seconds))?;
        Ok(RenderData::text(text)
            .with("color", properties.color("color")?)
            .with("font_size", properties.integer("font_size")?))
    }
}
