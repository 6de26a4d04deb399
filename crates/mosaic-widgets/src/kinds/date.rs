use mosaic_core::{
    PropertyAccess, PropertyMap, PropertySchema, PropertySpec, RenderContext, RenderData,
    RenderFailure, Rgb, ScreenSize, Size, WidgetBehavior, WidgetMetadata,
};

pub const KIND: &str = "Date";

pub fn metadata() -> WidgetMetadata {
    super::metadata(
        KIND,
        "Displays the current date in a configurable format.",
        "Time",
        60,
    )
}

pub fn schema() -> PropertySchema {
    PropertySchema::new()
        .with(
            PropertySpec::string("format", "%m/%d/%y")
                .max_len(32)
                .label("Date Format")
                .help("strftime codes, e.g. %Y-%m-%d"),
        )
        .with(PropertySpec::boolean("show_day_of_week", true).label("Show Day of Week"))
        .with(PropertySpec::color("color", Rgb::WHITE).label("Text Color"))
}

pub struct Date;

impl WidgetBehavior for Date {
    fn default_size(&self, screen: ScreenSize, _properties: &PropertyMap) -> Size {
        screen.scaled(48, 12)
    }

    fn render(
        &self,
        properties: &PropertyMap,
        ctx: &RenderContext,
    ) -> Result<RenderData, RenderFailure> {
        let date = super::format_time(ctx.now, properties.text("format")?)?;
        let text = if properties.boolean("show_day_of_week")? {
            format!("{} {date}", ctx.now.format("%A"))
        } else {
            date
        };
        Ok(RenderData::text(text).with("color", properties.color("color")?))
    }
}
