//! Control binding: toolbar controls ⇄ element properties.
//!
//! Each control name (`data-control` in the editor shell) maps to one
//! property path and a value domain. The table is static and built once;
//! [`apply_control`] turns a raw control value into an [`ElementPatch`] and
//! [`reflect_control`] reads the value back for display.

use std::collections::HashMap;
use std::sync::OnceLock;

use serde_json::Value;

use crate::element::{limits, Element, ElementPatch, NumericDomain};
use crate::{DesignError, DesignResult};

/// Value domain of a control.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlDomain {
    /// Number clamped into a range.
    Number(NumericDomain),
    /// Boolean mapped onto an enabled/disabled literal pair.
    Toggle {
        /// Literal when enabled.
        on: &'static str,
        /// Literal when disabled.
        off: &'static str,
    },
    /// Plain boolean.
    Flag,
    /// Exactly one of a fixed option set.
    Choice(&'static [&'static str]),
    /// `#rgb` / `#rrggbb` colour, normalised to lowercase `#rrggbb`.
    Color,
    /// Free text.
    Text,
}

/// One entry of the control table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlSpec {
    /// Control name.
    pub name: &'static str,
    /// Element property path (dotted for grouped properties).
    pub property: &'static str,
    /// Accepted values.
    pub domain: ControlDomain,
}

const fn spec(name: &'static str, property: &'static str, domain: ControlDomain) -> ControlSpec {
    ControlSpec {
        name,
        property,
        domain,
    }
}

const CONTROLS: &[ControlSpec] = &[
    spec("opacity", "opacity", ControlDomain::Number(limits::OPACITY)),
    spec("angle", "angle", ControlDomain::Number(limits::ANGLE.integral())),
    spec("scaleX", "scaleX", ControlDomain::Number(limits::SCALE)),
    spec("scaleY", "scaleY", ControlDomain::Number(limits::SCALE)),
    spec("lockUniScaling", "lockUniScaling", ControlDomain::Flag),
    spec("fontSize", "fontSize", ControlDomain::Number(limits::FONT_SIZE.integral())),
    spec("lineHeight", "lineHeight", ControlDomain::Number(limits::LINE_HEIGHT)),
    spec(
        "letterSpacing",
        "letterSpacing",
        ControlDomain::Number(limits::LETTER_SPACING.integral()),
    ),
    spec("strokeWidth", "stroke.width", ControlDomain::Number(limits::STROKE_WIDTH.integral())),
    spec("strokeColor", "stroke.color", ControlDomain::Color),
    spec("shadowBlur", "shadow.blur", ControlDomain::Number(limits::SHADOW_BLUR.integral())),
    spec(
        "shadowOffsetX",
        "shadow.offsetX",
        ControlDomain::Number(limits::SHADOW_OFFSET.integral()),
    ),
    spec(
        "shadowOffsetY",
        "shadow.offsetY",
        ControlDomain::Number(limits::SHADOW_OFFSET.integral()),
    ),
    spec("shadowColor", "shadow.color", ControlDomain::Color),
    spec("curveRadius", "curve.radius", ControlDomain::Number(limits::CURVE_RADIUS.integral())),
    spec(
        "curveMode",
        "curve.mode",
        ControlDomain::Choice(&["normal", "curved", "curveReverse"]),
    ),
    spec(
        "fontWeight",
        "fontWeight",
        ControlDomain::Toggle {
            on: "bold",
            off: "normal",
        },
    ),
    spec(
        "fontStyle",
        "fontStyle",
        ControlDomain::Toggle {
            on: "italic",
            off: "normal",
        },
    ),
    spec(
        "textDecoration",
        "textDecoration",
        ControlDomain::Toggle {
            on: "underline",
            off: "normal",
        },
    ),
    spec(
        "textTransform",
        "textTransform",
        ControlDomain::Choice(&["none", "uppercase", "lowercase"]),
    ),
    spec(
        "textAlign",
        "textAlign",
        ControlDomain::Choice(&["left", "center", "right", "justify"]),
    ),
    spec("fill", "fill", ControlDomain::Color),
    spec("fontFamily", "fontFamily", ControlDomain::Text),
    spec("text", "text", ControlDomain::Text),
];

fn table() -> &'static HashMap<&'static str, ControlSpec> {
    static TABLE: OnceLock<HashMap<&'static str, ControlSpec>> = OnceLock::new();
    TABLE.get_or_init(|| CONTROLS.iter().map(|c| (c.name, *c)).collect())
}

/// Look up a control by name.
#[must_use]
pub fn control(name: &str) -> Option<&'static ControlSpec> {
    table().get(name)
}

/// All registered controls, in table order.
#[must_use]
pub fn controls() -> &'static [ControlSpec] {
    CONTROLS
}

fn require(name: &str) -> DesignResult<&'static ControlSpec> {
    control(name).ok_or_else(|| DesignError::UnknownControl(name.to_string()))
}

/// Translate a raw control value into a patch for `element`.
///
/// Numbers (or numeric strings) are clamped into the control's range.
/// With `lockUniScaling` set, `scaleX`/`scaleY` patch both axes.
///
/// # Errors
///
/// - [`DesignError::UnknownControl`] for an unregistered name.
/// - [`DesignError::UnknownOption`] when a choice or toggle value is not
///   one of its declared options.
/// - [`DesignError::Validation`] for unparsable numbers, bad colours, or a
///   colour control on a non-colourable element.
pub fn apply_control(element: &Element, name: &str, raw: &Value) -> DesignResult<ElementPatch> {
    let spec = require(name)?;
    let value = match spec.domain {
        ControlDomain::Number(domain) => {
            let v = domain.clamp(parse_number(name, raw)?);
            if domain.integral {
                // Whole numbers from integral domains fit i64.
                #[allow(clippy::cast_possible_truncation)]
                Value::from(v as i64)
            } else {
                Value::from(v)
            }
        }
        ControlDomain::Toggle { on, off } => Value::from(parse_toggle(name, raw, on, off)?),
        ControlDomain::Flag => Value::from(parse_flag(name, raw)?),
        ControlDomain::Choice(options) => {
            let choice = raw
                .as_str()
                .filter(|s| options.contains(s))
                .ok_or_else(|| unknown_option(name, raw))?;
            Value::from(choice)
        }
        ControlDomain::Color => {
            if !element.base.colorable {
                return Err(DesignError::Validation(format!(
                    "element {} is not colorable",
                    element.id()
                )));
            }
            Value::from(normalize_color(name, raw)?)
        }
        ControlDomain::Text => match raw {
            Value::String(s) => Value::from(s.as_str()),
            other => {
                return Err(DesignError::Validation(format!(
                    "{name}: expected text, got {other}"
                )))
            }
        },
    };

    let mut patch = ElementPatch::new().with(target_property(element, spec), value.clone());
    if element.base.lock_uni_scaling {
        match spec.name {
            "scaleX" => patch.set("scaleY", value),
            "scaleY" => patch.set("scaleX", value),
            _ => {}
        }
    }
    Ok(patch)
}

/// Current value of a control for `element`, for populating the control
/// when the selection changes. Toggles reflect as booleans. Returns `None`
/// when the control does not apply to the element's variant.
///
/// # Errors
///
/// Returns [`DesignError::UnknownControl`] for an unregistered name.
pub fn reflect_control(element: &Element, name: &str) -> DesignResult<Option<Value>> {
    let spec = require(name)?;
    let props = element.properties()?;
    let mut parts = target_property(element, spec).split('.');
    let mut current = parts.next().and_then(|head| props.get(head));
    for part in parts {
        current = current.and_then(|v| v.get(part));
    }
    let Some(value) = current.filter(|v| !v.is_null()) else {
        return Ok(None);
    };
    Ok(Some(match spec.domain {
        ControlDomain::Toggle { on, .. } => Value::Bool(value.as_str() == Some(on)),
        _ => value.clone(),
    }))
}

/// Property a control edits on this element. Colour controls on images
/// target the vector overrides.
fn target_property(element: &Element, spec: &ControlSpec) -> &'static str {
    if element.as_image().is_none() {
        return spec.property;
    }
    match spec.property {
        "fill" => "svgFill",
        "stroke.color" => "svgStroke.color",
        "stroke.width" => "svgStroke.width",
        other => other,
    }
}

fn unknown_option(name: &str, raw: &Value) -> DesignError {
    DesignError::UnknownOption {
        control: name.to_string(),
        value: raw.as_str().map_or_else(|| raw.to_string(), str::to_string),
    }
}

fn parse_number(name: &str, raw: &Value) -> DesignResult<f64> {
    let parsed = match raw {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        _ => None,
    };
    parsed.ok_or_else(|| DesignError::Validation(format!("{name}: expected a number, got {raw}")))
}

fn parse_flag(name: &str, raw: &Value) -> DesignResult<bool> {
    match raw {
        Value::Bool(b) => Ok(*b),
        Value::String(s) if s == "true" => Ok(true),
        Value::String(s) if s == "false" => Ok(false),
        other => Err(DesignError::Validation(format!(
            "{name}: expected a boolean, got {other}"
        ))),
    }
}

fn parse_toggle(name: &str, raw: &Value, on: &'static str, off: &'static str) -> DesignResult<&'static str> {
    match raw {
        Value::Bool(true) => Ok(on),
        Value::Bool(false) => Ok(off),
        Value::String(s) if s == on || s == "true" => Ok(on),
        Value::String(s) if s == off || s == "false" => Ok(off),
        other => Err(unknown_option(name, other)),
    }
}

/// Normalise `#rgb` / `#rrggbb` (any case) to lowercase `#rrggbb`.
fn normalize_color(name: &str, raw: &Value) -> DesignResult<String> {
    let invalid = || DesignError::Validation(format!("{name}: invalid colour {raw}"));
    let hex = raw
        .as_str()
        .map(str::trim)
        .and_then(|s| s.strip_prefix('#'))
        .filter(|h| h.chars().all(|c| c.is_ascii_hexdigit()))
        .ok_or_else(invalid)?;
    match hex.len() {
        6 => Ok(format!("#{}", hex.to_ascii_lowercase())),
        3 => Ok(hex
            .chars()
            .fold(String::from("#"), |mut acc, c| {
                let c = c.to_ascii_lowercase();
                acc.push(c);
                acc.push(c);
                acc
            })),
        _ => Err(invalid()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{create_element, ElementVariant};
    use serde_json::json;

    fn text() -> Element {
        create_element(
            ElementVariant::Text,
            &ElementPatch::new().with("text", "Hi").with("fontSize", 12),
        )
        .expect("text")
    }

    #[test]
    fn test_out_of_range_is_clamped() {
        let el = text();
        let patch = apply_control(&el, "opacity", &json!(1.5)).expect("opacity");
        assert_eq!(patch.get("opacity"), Some(&json!(1.0)));
        let patch = apply_control(&el, "shadowOffsetX", &json!(-250)).expect("offset");
        assert_eq!(patch.get("shadow.offsetX"), Some(&json!(-100)));
    }

    #[test]
    fn test_numeric_strings_are_parsed_and_rounded() {
        let el = text();
        let patch = apply_control(&el, "fontSize", &json!(" 40.4 ")).expect("font size");
        assert_eq!(patch.get("fontSize"), Some(&json!(40)));
        assert!(matches!(
            apply_control(&el, "fontSize", &json!("large")),
            Err(DesignError::Validation(_))
        ));
    }

    #[test]
    fn test_toggle_maps_to_literal_pair() {
        let el = text();
        let patch = apply_control(&el, "fontWeight", &json!(true)).expect("bold");
        assert_eq!(patch.get("fontWeight"), Some(&json!("bold")));
        let patch = apply_control(&el, "fontStyle", &json!(false)).expect("upright");
        assert_eq!(patch.get("fontStyle"), Some(&json!("normal")));
    }

    #[test]
    fn test_choice_rejects_unknown_option() {
        let el = text();
        let err = apply_control(&el, "textAlign", &json!("middle")).unwrap_err();
        assert!(matches!(err, DesignError::UnknownOption { ref value, .. } if value == "middle"));
        let patch = apply_control(&el, "textTransform", &json!("uppercase")).expect("transform");
        assert_eq!(patch.get("textTransform"), Some(&json!("uppercase")));
    }

    #[test]
    fn test_unknown_control() {
        let el = text();
        assert!(matches!(
            apply_control(&el, "sparkle", &json!(1)),
            Err(DesignError::UnknownControl(_))
        ));
        assert!(matches!(
            reflect_control(&el, "sparkle"),
            Err(DesignError::UnknownControl(_))
        ));
    }

    #[test]
    fn test_uniform_scaling_patches_both_axes() {
        let mut el = text();
        let patch = apply_control(&el, "scaleX", &json!(2.5)).expect("scale");
        assert_eq!(patch.get("scaleY"), Some(&json!(2.5)));

        el.base.lock_uni_scaling = false;
        let patch = apply_control(&el, "scaleX", &json!(2.5)).expect("scale");
        assert!(!patch.contains("scaleY"));
    }

    #[test]
    fn test_colors_are_normalized() {
        let el = text();
        let patch = apply_control(&el, "fill", &json!("#AbC")).expect("fill");
        assert_eq!(patch.get("fill"), Some(&json!("#aabbcc")));
        assert!(apply_control(&el, "strokeColor", &json!("red")).is_err());

        let mut locked = text();
        locked.base.colorable = false;
        assert!(apply_control(&locked, "fill", &json!("#000000")).is_err());
    }

    #[test]
    fn test_reflect_round_trips_with_apply() {
        let mut el = text();
        let patch = apply_control(&el, "textDecoration", &json!(true)).expect("underline");
        el.apply_patch(&patch).expect("apply");
        assert_eq!(
            reflect_control(&el, "textDecoration").expect("reflect"),
            Some(json!(true))
        );
        assert_eq!(reflect_control(&el, "fontSize").expect("reflect"), Some(json!(12.0)));
        assert_eq!(
            reflect_control(&el, "curveRadius").expect("reflect"),
            Some(json!(80.0))
        );
    }

    #[test]
    fn test_reflect_not_applicable_is_none() {
        let shape = create_element(ElementVariant::Shape, &ElementPatch::new()).expect("shape");
        assert_eq!(reflect_control(&shape, "fontSize").expect("reflect"), None);
        assert!(reflect_control(&shape, "strokeWidth").expect("reflect").is_some());
    }

    #[test]
    fn test_image_colors_target_svg_overrides() {
        let mut image = create_element(
            ElementVariant::Image,
            &ElementPatch::new().with("source", "logo.svg"),
        )
        .expect("image");
        assert_eq!(reflect_control(&image, "fill").expect("reflect"), None);

        let patch = apply_control(&image, "fill", &json!("#F00")).expect("fill");
        assert_eq!(patch.get("svgFill"), Some(&json!("#ff0000")));
        assert!(!patch.contains("fill"));
        image.apply_patch(&patch).expect("apply");

        let patch = apply_control(&image, "strokeWidth", &json!(3)).expect("stroke");
        assert_eq!(patch.get("svgStroke.width"), Some(&json!(3)));
        image.apply_patch(&patch).expect("apply");

        let props = image.as_image().expect("image");
        assert_eq!(props.svg_fill.as_deref(), Some("#ff0000"));
        assert!(props.svg_stroke.as_ref().is_some_and(|s| (s.width - 3.0).abs() < f64::EPSILON));
        assert_eq!(reflect_control(&image, "fill").expect("reflect"), Some(json!("#ff0000")));
        assert_eq!(reflect_control(&image, "strokeWidth").expect("reflect"), Some(json!(3.0)));
    }

    #[test]
    fn test_every_control_is_registered_once() {
        assert_eq!(table().len(), controls().len());
    }
}
