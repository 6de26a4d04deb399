use chrono::NaiveDateTime;
use mosaic_core::{
    PropertyAccess, PropertyMap, PropertySchema, PropertySpec, RenderContext, RenderData,
    RenderFailure, Rgb, ScreenSize, Size, WidgetBehavior, WidgetMetadata,
};

pub const KIND: &str = "Countdown";

/// Accepted layout of `target_date`.
pub const TARGET_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn metadata() -> WidgetMetadata {
    super::metadata(
        KIND,
        "Counts down to a specific date and time.",
        "Time",
        1,
    )
}

pub fn schema() -> PropertySchema {
    PropertySchema::new()
        .with(
            PropertySpec::string("target_date", "2030-01-01 00:00:00")
                .label("Target Date")
                .help("YYYY-MM-DD HH:MM:SS"),
        )
        .with(PropertySpec::string("label", "Countdown").max_len(32).label("Label"))
        .with(PropertySpec::color("color", Rgb::WHITE).label("Text Color"))
}

/// `DD:HH:MM:SS` until `target`, or all zeros once it has passed.
fn remaining(now: NaiveDateTime, target: NaiveDateTime) -> String {
    if now >= target {
        return "00:00:00:00".to_string();
    }
    let delta = target - now;
    let days = delta.num_days();
    let rest = delta.num_seconds() - days * 86_400;
    format!("{days:02}:{}", super::hms(rest))
}

pub struct Countdown;

impl WidgetBehavior for Countdown {
    fn default_size(&self, screen: ScreenSize, _properties: &PropertyMap) -> Size {
        screen.scaled(50, 20)
    }

    fn render(
        &self,
        properties: &PropertyMap,
        ctx: &RenderContext,
    ) -> Result<RenderData, RenderFailure> {
        let raw = properties.text("target_date")?;
        let target = NaiveDateTime::parse_from_str(raw.trim(), TARGET_FORMAT)
            .map_err(|err| RenderFailure::new(format!("target_date '{raw}': {err}")))?;
        let text = format!("{}\n{}", properties.text("label")?, remaining(ctx.now, target));
        Ok(RenderData::text(text).with("color", properties.color("color")?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use mosaic_core::widget::Rect;

    fn at(day: u32, hour: u32) -> RenderContext {
        RenderContext {
            now: NaiveDate::from_ymd_opt(2029, 12, day)
                .unwrap()
                .and_hms_opt(hour, 0, 0)
                .unwrap(),
            screen: ScreenSize::S64,
            bounds: Rect::new(0, 0, 50, 20),
        }
    }

    #[test]
    fn counts_down_to_target() {
        let data = Countdown.render(&schema().defaults(), &at(30, 22)).unwrap();
        assert_eq!(data.text_value(), Some("Countdown\n01:02:00:00"));
    }

    #[test]
    fn past_targets_show_zero() {
        let mut props = schema().defaults();
        props.insert("target_date".into(), "2029-12-01 00:00:00".into());
        let data = Countdown.render(&props, &at(30, 22)).unwrap();
        assert_eq!(data.text_value(), Some("Countdown\n00:00:00:00"));
    }

    #[test]
    fn unparsable_target_fails() {
        let mut props = schema().defaults();
        props.insert("target_date".into(), "next tuesday".into());
        assert!(Countdown.render(&props, &at(30, 22)).is_err());
    }
}
