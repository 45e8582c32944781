use serde_json::Value;

use super::{FontWeight, HexColor, StyleSpecification, StyledText, TextAlignment};
use crate::error::{ValidationError, ValidationErrorKind};

/// Untyped style options as received from a form or JSON body.
pub type StyleBag = serde_json::Map<String, Value>;

/// Largest accepted `shadow_blur`; blur cost grows with the radius.
pub const MAX_SHADOW_BLUR: i64 = 100;

/// Coerces `bag` into a [`StyleSpecification`]. Absent (or `null`) keys take
/// their defaults; present keys must parse and be in range.
pub fn normalize(text: &str, bag: &StyleBag) -> Result<StyledText, ValidationError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ValidationError::new(
            ValidationErrorKind::MissingText,
            "text",
            "text is empty",
        ));
    }

    let defaults = StyleSpecification::default();
    let reader = BagReader { bag };

    let font_size = reader.int("font_size")?.unwrap_or(defaults.font_size as i64);
    if font_size <= 0 || font_size > u32::MAX as i64 {
        return Err(out_of_range("font_size", "font size must be a positive number"));
    }

    let text_rotate = reader.int("text_rotate")?.unwrap_or(0);
    if !(-180..=180).contains(&text_rotate) {
        return Err(out_of_range(
            "text_rotate",
            "text rotation must be between -180 and 180 degrees",
        ));
    }

    let text_opacity = reader.int("text_opacity")?.unwrap_or(100);
    if !(0..=100).contains(&text_opacity) {
        return Err(out_of_range(
            "text_opacity",
            "text opacity must be between 0 and 100",
        ));
    }

    let shadow_blur = reader.int("shadow_blur")?.unwrap_or(defaults.shadow_blur as i64);
    if !(0..=MAX_SHADOW_BLUR).contains(&shadow_blur) {
        return Err(out_of_range(
            "shadow_blur",
            &format!("shadow blur must be between 0 and {} pixels", MAX_SHADOW_BLUR),
        ));
    }

    let line_height = reader.float("line_height")?.unwrap_or(defaults.line_height);
    if line_height < 0.0 {
        return Err(out_of_range("line_height", "line height must not be negative"));
    }
    if !(font_size as f32 * line_height).is_finite() {
        return Err(out_of_range("line_height", "text box height is too large"));
    }

    let font_weight = match reader.string("font_weight") {
        None => defaults.font_weight,
        Some(raw) => {
            let value = raw.trim().parse::<u16>().map_err(|_| {
                ValidationError::new(
                    ValidationErrorKind::InvalidChoice,
                    "font_weight",
                    format!("'{}' is not a font weight", raw),
                )
            })?;
            FontWeight::new(value).ok_or_else(|| {
                ValidationError::new(
                    ValidationErrorKind::InvalidChoice,
                    "font_weight",
                    format!("font weight must be one of 100..900, got {}", value),
                )
            })?
        }
    };

    let text_alignment = match reader.string("text_alignment") {
        None => defaults.text_alignment,
        Some(raw) => TextAlignment::parse(&raw).ok_or_else(|| {
            ValidationError::new(
                ValidationErrorKind::InvalidChoice,
                "text_alignment",
                format!("'{}' is not one of left, center, right", raw),
            )
        })?,
    };

    let font_family = reader
        .string("font_family")
        .map(|family| family.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|family| !family.is_empty())
        .unwrap_or(defaults.font_family);

    let style = StyleSpecification {
        font_family,
        font_weight,
        font_size: font_size as u32,
        font_color: reader.color("font_color")?.unwrap_or(defaults.font_color),
        x_position: reader.i32("x_position")?.unwrap_or(defaults.x_position),
        y_position: reader.i32("y_position")?.unwrap_or(defaults.y_position),
        text_alignment,
        text_rotate: text_rotate as i32,
        text_opacity: text_opacity as u8,
        letter_spacing: reader
            .float("letter_spacing")?
            .unwrap_or(defaults.letter_spacing),
        line_height,
        enable_shadow: reader.checkbox("enable_shadow"),
        shadow_x: reader.i32("shadow_x")?.unwrap_or(defaults.shadow_x),
        shadow_y: reader.i32("shadow_y")?.unwrap_or(defaults.shadow_y),
        shadow_blur: shadow_blur as u32,
        shadow_color: reader.color("shadow_color")?.unwrap_or(defaults.shadow_color),
        enable_background: reader.checkbox("enable_background"),
        text_background: reader
            .color("text_background")?
            .unwrap_or(defaults.text_background),
    };

    Ok(StyledText {
        text: text.to_string(),
        style,
    })
}

struct BagReader<'a> {
    bag: &'a StyleBag,
}

impl BagReader<'_> {
    fn get(&self, field: &str) -> Option<&Value> {
        self.bag.get(field).filter(|value| !value.is_null())
    }

    fn string(&self, field: &str) -> Option<String> {
        self.get(field).map(|value| match value {
            Value::String(raw) => raw.clone(),
            other => other.to_string(),
        })
    }

    fn int(&self, field: &'static str) -> Result<Option<i64>, ValidationError> {
        let Some(value) = self.get(field) else {
            return Ok(None);
        };
        let parsed = match value {
            Value::Number(number) => number.as_i64().or_else(|| {
                number
                    .as_f64()
                    .filter(|value| value.fract() == 0.0 && value.abs() < i64::MAX as f64)
                    .map(|value| value as i64)
            }),
            Value::String(raw) => raw.trim().parse::<i64>().ok(),
            _ => None,
        };
        parsed
            .map(Some)
            .ok_or_else(|| invalid_number(field, value))
    }

    fn i32(&self, field: &'static str) -> Result<Option<i32>, ValidationError> {
        match self.int(field)? {
            None => Ok(None),
            Some(value) => i32::try_from(value)
                .map(Some)
                .map_err(|_| out_of_range(field, "value does not fit in 32 bits")),
        }
    }

    fn float(&self, field: &'static str) -> Result<Option<f32>, ValidationError> {
        let Some(value) = self.get(field) else {
            return Ok(None);
        };
        let parsed = match value {
            Value::Number(number) => number.as_f64(),
            Value::String(raw) => raw.trim().parse::<f64>().ok(),
            _ => None,
        };
        parsed
            .map(|value| value as f32)
            .filter(|value| value.is_finite())
            .map(Some)
            .ok_or_else(|| invalid_number(field, value))
    }

    fn color(&self, field: &'static str) -> Result<Option<HexColor>, ValidationError> {
        match self.get(field) {
            None => Ok(None),
            Some(Value::String(raw)) => HexColor::parse(raw, field).map(Some),
            Some(other) => Err(ValidationError::new(
                ValidationErrorKind::InvalidColor,
                field,
                format!("expected a hex color string, got {}", other),
            )),
        }
    }

    /// HTML checkbox convention: only the literal `on` (or JSON `true`) is set.
    fn checkbox(&self, field: &str) -> bool {
        match self.get(field) {
            Some(Value::String(raw)) => raw == "on",
            Some(Value::Bool(flag)) => *flag,
            _ => false,
        }
    }
}

fn invalid_number(field: &'static str, value: &Value) -> ValidationError {
    ValidationError::new(
        ValidationErrorKind::InvalidNumber,
        field,
        format!("invalid numeric value {}", value),
    )
}

fn out_of_range(field: &'static str, message: &str) -> ValidationError {
    ValidationError::new(ValidationErrorKind::OutOfRange, field, message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn bag(value: Value) -> StyleBag {
        match value {
            Value::Object(map) => map,
            _ => panic!("bag must be an object"),
        }
    }

    #[test]
    fn empty_bag_yields_defaults() {
        let styled = normalize("  Sale  ", &StyleBag::new()).expect("defaults");
        assert_eq!(styled.text, "Sale");
        assert_eq!(styled.style, StyleSpecification::default());
    }

    #[test]
    fn form_strings_are_coerced() {
        let styled = normalize(
            "Sale",
            &bag(json!({
                "font_size": "36",
                "x_position": "-20",
                "y_position": " 10 ",
                "font_weight": "700",
                "text_alignment": "right",
                "text_rotate": "-45",
                "text_opacity": "50",
                "letter_spacing": "1.5",
                "line_height": "2",
                "enable_shadow": "on",
                "shadow_x": "4",
                "shadow_blur": "0",
                "shadow_color": "#112233",
                "enable_background": "on",
                "text_background": "#FFFFFF80",
                "font_color": "#FF0000",
                "font_family": "Open   Sans"
            })),
        )
        .expect("valid style");
        let style = styled.style;
        assert_eq!(style.font_size, 36);
        assert_eq!(style.x_position, -20);
        assert_eq!(style.y_position, 10);
        assert_eq!(style.font_weight.value(), 700);
        assert_eq!(style.text_alignment, TextAlignment::Right);
        assert_eq!(style.text_rotate, -45);
        assert_eq!(style.text_opacity, 50);
        assert_eq!(style.letter_spacing, 1.5);
        assert_eq!(style.line_height, 2.0);
        assert!(style.enable_shadow);
        assert_eq!(style.shadow_x, 4);
        assert_eq!(style.shadow_y, 2);
        assert_eq!(style.shadow_blur, 0);
        assert!(style.enable_background);
        assert_eq!(style.font_family, "Open Sans");
        assert_eq!(style.text_rgba().a, 128);
        assert_eq!(style.background_rgba().a, 0x80);
    }

    #[test]
    fn json_numbers_and_bools_are_accepted() {
        let styled = normalize(
            "Sale",
            &bag(json!({
                "font_size": 48.0,
                "text_opacity": 100,
                "letter_spacing": 2,
                "enable_background": true,
                "font_weight": 400
            })),
        )
        .expect("valid style");
        assert_eq!(styled.style.font_size, 48);
        assert_eq!(styled.style.letter_spacing, 2.0);
        assert!(styled.style.enable_background);
        assert_eq!(styled.style.font_weight, FontWeight::REGULAR);
    }

    #[test]
    fn only_on_enables_checkboxes() {
        for value in [json!("true"), json!("yes"), json!("ON"), json!(""), json!(1)] {
            let styled = normalize("Sale", &bag(json!({ "enable_shadow": value.clone() })))
                .expect("valid style");
            assert!(!styled.style.enable_shadow, "{:?}", value);
        }
    }

    #[test]
    fn rotation_outside_half_turn_is_rejected() {
        let err = normalize("Sale", &bag(json!({ "text_rotate": "190" }))).expect_err("190");
        assert_eq!(err.kind, ValidationErrorKind::OutOfRange);
        assert_eq!(err.field, "text_rotate");
        assert!(normalize("Sale", &bag(json!({ "text_rotate": "-180" }))).is_ok());
        assert!(normalize("Sale", &bag(json!({ "text_rotate": 180 }))).is_ok());
    }

    #[test]
    fn opacity_outside_percent_range_is_rejected() {
        for value in ["-1", "101"] {
            let err = normalize("Sale", &bag(json!({ "text_opacity": value }))).expect_err(value);
            assert_eq!(err.kind, ValidationErrorKind::OutOfRange);
            assert_eq!(err.field, "text_opacity");
        }
    }

    #[test]
    fn malformed_numbers_name_their_field() {
        let cases = [
            ("font_size", json!("48px")),
            ("x_position", json!("12.5")),
            ("shadow_y", json!("")),
            ("letter_spacing", json!("wide")),
            ("line_height", json!("inf")),
            ("text_rotate", json!([1])),
        ];
        for (field, value) in cases {
            let mut map = StyleBag::new();
            map.insert(field.to_string(), value);
            let err = normalize("Sale", &map).expect_err(field);
            assert_eq!(err.kind, ValidationErrorKind::InvalidNumber, "{}", field);
            assert_eq!(err.field, field);
        }
    }

    #[test]
    fn blank_text_is_missing() {
        let err = normalize(" \n\t ", &StyleBag::new()).expect_err("blank");
        assert_eq!(err.kind, ValidationErrorKind::MissingText);
    }

    #[test]
    fn enumerations_reject_unknown_values() {
        let err = normalize("Sale", &bag(json!({ "text_alignment": "justify" })))
            .expect_err("justify");
        assert_eq!(err.kind, ValidationErrorKind::InvalidChoice);
        let err = normalize("Sale", &bag(json!({ "font_weight": "650" }))).expect_err("650");
        assert_eq!(err.kind, ValidationErrorKind::InvalidChoice);
        let err = normalize("Sale", &bag(json!({ "font_weight": "bold" }))).expect_err("bold");
        assert_eq!(err.field, "font_weight");
    }

    #[test]
    fn non_positive_font_size_and_negative_blur_are_out_of_range() {
        let err = normalize("Sale", &bag(json!({ "font_size": 0 }))).expect_err("zero");
        assert_eq!(err.kind, ValidationErrorKind::OutOfRange);
        let err = normalize("Sale", &bag(json!({ "shadow_blur": -3 }))).expect_err("negative");
        assert_eq!(err.field, "shadow_blur");
    }

    #[test]
    fn shadow_blur_is_capped() {
        let styled = normalize("Sale", &bag(json!({ "shadow_blur": MAX_SHADOW_BLUR })))
            .expect("largest blur");
        assert_eq!(styled.style.shadow_blur, 100);
        for value in [json!(101), json!("2000"), json!(20000)] {
            let err = normalize("Sale", &bag(json!({ "shadow_blur": value.clone() })))
                .expect_err("too much blur");
            assert_eq!(err.kind, ValidationErrorKind::OutOfRange, "{:?}", value);
            assert_eq!(err.field, "shadow_blur");
        }
    }

    #[test]
    fn overflowing_box_height_is_out_of_range() {
        let err = normalize(
            "Sale",
            &bag(json!({ "font_size": u32::MAX, "line_height": "1e35" })),
        )
        .expect_err("infinite height");
        assert_eq!(err.kind, ValidationErrorKind::OutOfRange);
        assert_eq!(err.field, "line_height");
    }

    #[test]
    fn colors_must_be_hex_strings() {
        let err = normalize("Sale", &bag(json!({ "font_color": "#FFF" }))).expect_err("short");
        assert_eq!(err.kind, ValidationErrorKind::InvalidColor);
        let err = normalize("Sale", &bag(json!({ "shadow_color": 0 }))).expect_err("number");
        assert_eq!(err.field, "shadow_color");
    }

    #[test]
    fn null_values_fall_back_to_defaults() {
        let styled = normalize("Sale", &bag(json!({ "font_size": null, "font_color": null })))
            .expect("valid style");
        assert_eq!(styled.style.font_size, 48);
    }
}
