use mosaic_core::{
    PropertyAccess, PropertyMap, PropertySchema, PropertySpec, RenderContext, RenderData,
    RenderFailure, Rgb, ScreenSize, Size, WidgetBehavior, WidgetMetadata,
};

pub const KIND: &str = "ProgressBar";

pub fn metadata() -> WidgetMetadata {
    super::metadata(
        KIND,
        "Horizontal progress bar with optional percentage.",
        "Display",
        0,
    )
}

pub fn schema() -> PropertySchema {
    PropertySchema::new()
        .with(
            PropertySpec::float("progress", 0.5, Some(0.0), Some(1.0))
                .label("Progress")
                .help("Fraction complete, 0.0 to 1.0"),
        )
        .with(PropertySpec::color("foreground_color", Rgb::new(0, 255, 0)).label("Progress Color"))
        .with(PropertySpec::color("background_color", Rgb::new(64, 64, 64)).label("Background Color"))
        .with(PropertySpec::color("border_color", Rgb::new(128, 128, 128)).label("Border Color"))
        .with(PropertySpec::boolean("show_percentage", false).label("Show Percentage"))
}

pub struct ProgressBar;

impl WidgetBehavior for ProgressBar {
    fn default_size(&self, screen: ScreenSize, _properties: &PropertyMap) -> Size {
        screen.scaled(80, 8)
    }

    fn render(
        &self,
        properties: &PropertyMap,
        _ctx: &RenderContext,
    ) -> Result<RenderData, RenderFailure> {
        let progress = properties.float("progress")?.clamp(0.0, 1.0);
        let mut data = RenderData::new("progress_bar")
            .with("progress", progress)
            .with("foreground_color", properties.color("foreground_color")?)
            .with("background_color", properties.color("background_color")?)
            .with("border_color", properties.color("border_color")?);
        if properties.boolean("show_percentage")? {
            data.set("text", format!("{:.0}%", progress * 100.0));
        }
        Ok(data)
    }
}
