//! Design elements - the placeable building blocks of a view.
//!
//! An [`Element`] is a shared [`ElementBase`] plus a variant payload
//! ([`ElementKind`]). Elements are created and edited through
//! [`ElementPatch`]es: JSON objects keyed by camelCase property names.
//! Numeric properties are clamped into their [`limits`] on every write.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::geometry::{
    layout_line, line_width, Affine, GlyphMeasure, GlyphPlacement, Point, Rect, TextArc,
};
use crate::{DesignError, DesignResult};

/// Unique identifier for an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ElementId(Uuid);

impl ElementId {
    /// Create a new unique element ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create from an existing UUID.
    #[must_use]
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Parse the hyphenated string form.
    ///
    /// # Errors
    ///
    /// Returns [`DesignError::Validation`] if `s` is not a UUID.
    pub fn parse(s: &str) -> DesignResult<Self> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| DesignError::Validation(format!("invalid element id {s:?}: {e}")))
    }
}

impl Default for ElementId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ElementId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Closed numeric range a property is clamped into.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NumericDomain {
    /// Lower bound.
    pub min: f64,
    /// Upper bound.
    pub max: f64,
    /// Values are rounded to whole numbers.
    pub integral: bool,
}

impl NumericDomain {
    /// Real-valued domain.
    #[must_use]
    pub const fn new(min: f64, max: f64) -> Self {
        Self {
            min,
            max,
            integral: false,
        }
    }

    /// Same bounds, whole numbers only.
    #[must_use]
    pub const fn integral(self) -> Self {
        Self {
            integral: true,
            ..self
        }
    }

    /// Clamp (and round, for integral domains) a value into the domain.
    #[must_use]
    pub fn clamp(&self, value: f64) -> f64 {
        let v = if self.integral { value.round() } else { value };
        v.clamp(self.min, self.max)
    }
}

/// Value domains of the numeric element properties.
pub mod limits {
    use super::NumericDomain;

    /// Element opacity.
    pub const OPACITY: NumericDomain = NumericDomain::new(0.0, 1.0);
    /// Element rotation in degrees.
    pub const ANGLE: NumericDomain = NumericDomain::new(0.0, 359.0);
    /// Horizontal and vertical scale factors.
    pub const SCALE: NumericDomain = NumericDomain::new(0.0, 5.0);
    /// Text font size.
    pub const FONT_SIZE: NumericDomain = NumericDomain::new(1.0, 200.0);
    /// Text line height multiplier.
    pub const LINE_HEIGHT: NumericDomain = NumericDomain::new(-2.0, 3.0);
    /// Extra advance between glyphs.
    pub const LETTER_SPACING: NumericDomain = NumericDomain::new(-30.0, 30.0);
    /// Curved text arc radius.
    pub const CURVE_RADIUS: NumericDomain = NumericDomain::new(0.0, 400.0);
    /// Stroke width.
    pub const STROKE_WIDTH: NumericDomain = NumericDomain::new(0.0, 20.0);
    /// Shadow blur.
    pub const SHADOW_BLUR: NumericDomain = NumericDomain::new(0.0, 200.0);
    /// Shadow offset on either axis.
    pub const SHADOW_OFFSET: NumericDomain = NumericDomain::new(-100.0, 100.0);
    /// Image filter intensity.
    pub const FILTER_INTENSITY: NumericDomain = NumericDomain::new(0.0, 1.0);
    /// Width/height of images, shapes and views.
    pub const DIMENSION: NumericDomain = NumericDomain::new(0.0, 100_000.0);
}

/// Element variant tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementVariant {
    /// Text element.
    Text,
    /// Raster or vector image.
    Image,
    /// Vector shape.
    Shape,
}

impl ElementVariant {
    /// Tag as it appears in documents.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Image => "image",
            Self::Shape => "shape",
        }
    }
}

/// Font weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontWeight {
    /// Regular weight.
    #[default]
    Normal,
    /// Bold.
    Bold,
}

/// Font style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontStyle {
    /// Upright.
    #[default]
    Normal,
    /// Italic.
    Italic,
}

/// Text decoration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextDecoration {
    /// No decoration.
    #[default]
    Normal,
    /// Underlined.
    Underline,
}

/// Case transform applied when displaying text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextTransform {
    /// Text as typed.
    #[default]
    None,
    /// Upper case.
    Uppercase,
    /// Lower case.
    Lowercase,
}

impl TextTransform {
    /// Apply the transform to a string.
    #[must_use]
    pub fn apply(self, text: &str) -> String {
        match self {
            Self::None => text.to_string(),
            Self::Uppercase => text.to_uppercase(),
            Self::Lowercase => text.to_lowercase(),
        }
    }
}

/// Horizontal text alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    /// Left aligned.
    Left,
    /// Centered.
    #[default]
    Center,
    /// Right aligned.
    Right,
    /// Justified.
    Justify,
}

/// How text follows its baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CurveMode {
    /// Straight baseline.
    #[default]
    Normal,
    /// Text sits on top of a circular arc.
    Curved,
    /// Text hangs below a circular arc.
    CurveReverse,
}

/// Curved text settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Curve {
    /// Curve mode.
    pub mode: CurveMode,
    /// Arc radius.
    pub radius: f64,
}

impl Default for Curve {
    fn default() -> Self {
        Self {
            mode: CurveMode::Normal,
            radius: 80.0,
        }
    }
}

impl Curve {
    /// Arc used for layout, `None` in normal mode.
    #[must_use]
    pub fn arc(&self) -> Option<TextArc> {
        match self.mode {
            CurveMode::Normal => None,
            CurveMode::Curved => Some(TextArc {
                radius: self.radius,
                reverse: false,
            }),
            CurveMode::CurveReverse => Some(TextArc {
                radius: self.radius,
                reverse: true,
            }),
        }
    }
}

/// Outline settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stroke {
    /// Stroke colour.
    pub color: String,
    /// Stroke width; zero disables the stroke.
    pub width: f64,
}

impl Default for Stroke {
    fn default() -> Self {
        Self {
            color: "#000000".to_string(),
            width: 0.0,
        }
    }
}

/// Drop shadow settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shadow {
    /// Shadow colour.
    pub color: String,
    /// Blur radius.
    pub blur: f64,
    /// Horizontal offset.
    pub offset_x: f64,
    /// Vertical offset.
    pub offset_y: f64,
}

impl Default for Shadow {
    fn default() -> Self {
        Self {
            color: "#000000".to_string(),
            blur: 0.0,
            offset_x: 0.0,
            offset_y: 0.0,
        }
    }
}

/// One entry of an image's filter chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageFilter {
    /// Filter name, e.g. `grayscale` or `sepia`.
    pub name: String,
    /// Strength in `[0, 1]`.
    pub intensity: f64,
}

/// Text payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextProps {
    /// Text content. May contain newlines.
    pub text: String,
    /// Font family name.
    pub font_family: String,
    /// Font size.
    pub font_size: f64,
    /// Line height multiplier.
    pub line_height: f64,
    /// Extra advance between glyphs.
    pub letter_spacing: f64,
    /// Weight.
    pub font_weight: FontWeight,
    /// Style.
    pub font_style: FontStyle,
    /// Decoration.
    pub text_decoration: TextDecoration,
    /// Case transform.
    pub text_transform: TextTransform,
    /// Alignment.
    pub text_align: TextAlign,
    /// Fill colour.
    pub fill: String,
    /// Curved text settings.
    pub curve: Curve,
    /// Outline.
    pub stroke: Stroke,
    /// Drop shadow.
    pub shadow: Shadow,
}

impl Default for TextProps {
    fn default() -> Self {
        Self {
            text: String::new(),
            font_family: "Arial".to_string(),
            font_size: 18.0,
            line_height: 1.0,
            letter_spacing: 0.0,
            font_weight: FontWeight::Normal,
            font_style: FontStyle::Normal,
            text_decoration: TextDecoration::Normal,
            text_transform: TextTransform::None,
            text_align: TextAlign::Center,
            fill: "#000000".to_string(),
            curve: Curve::default(),
            stroke: Stroke::default(),
            shadow: Shadow::default(),
        }
    }
}

impl TextProps {
    /// Text as displayed, after the case transform.
    #[must_use]
    pub fn display_text(&self) -> String {
        self.text_transform.apply(&self.text)
    }

    /// Whether the text is laid out along an arc.
    #[must_use]
    pub fn is_curved(&self) -> bool {
        self.curve.mode != CurveMode::Normal
    }

    /// Glyph placements along the curve. Curved text is a single line, so
    /// newlines are laid out as spaces.
    #[must_use]
    pub fn curved_glyphs(&self, measure: &dyn GlyphMeasure) -> Vec<GlyphPlacement> {
        let line = self.display_text().replace('\n', " ");
        layout_line(
            &line,
            self.font_size,
            self.letter_spacing,
            measure,
            self.curve.arc(),
        )
    }

    /// Unscaled size of the text block.
    #[must_use]
    pub fn size(&self, measure: &dyn GlyphMeasure) -> (f64, f64) {
        if self.is_curved() {
            let glyphs = self.curved_glyphs(measure);
            let half = self.font_size / 2.0;
            let points = glyphs.iter().flat_map(|g| {
                [
                    Point::new(g.x - half, g.y - half),
                    Point::new(g.x + half, g.y + half),
                ]
            });
            return Rect::enclosing(points).map_or((0.0, 0.0), |r| (r.width, r.height));
        }
        let display = self.display_text();
        let mut width = 0.0_f64;
        let mut lines = 0_u32;
        for line in display.split('\n') {
            width = width.max(line_width(
                line,
                self.font_size,
                self.letter_spacing,
                measure,
            ));
            lines += 1;
        }
        let extra_lines = f64::from(lines.saturating_sub(1));
        let height = (self.font_size * (1.0 + extra_lines * self.line_height)).max(self.font_size);
        (width, height)
    }
}

/// Image payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageProps {
    /// Image URI or data reference.
    pub source: String,
    /// Natural width, known once the image has decoded.
    pub width: f64,
    /// Natural height, known once the image has decoded.
    pub height: f64,
    /// Filter chain, applied in order.
    pub filters: Vec<ImageFilter>,
    /// Optional clipping shape reference.
    pub crop_mask: Option<String>,
    /// Fill override for vector sources.
    pub svg_fill: Option<String>,
    /// Stroke override for vector sources.
    pub svg_stroke: Option<Stroke>,
}

/// Shape outline type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeType {
    /// Rectangle.
    #[default]
    Rect,
    /// Ellipse inscribed in the shape box.
    Ellipse,
    /// Arbitrary path data scaled into the shape box.
    Path,
}

/// Shape payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapeProps {
    /// Outline type.
    pub shape: ShapeType,
    /// Box width.
    pub width: f64,
    /// Box height.
    pub height: f64,
    /// SVG path data for [`ShapeType::Path`].
    pub path: Option<String>,
    /// Fill colour.
    pub fill: String,
    /// Outline.
    pub stroke: Stroke,
}

impl Default for ShapeProps {
    fn default() -> Self {
        Self {
            shape: ShapeType::Rect,
            width: 100.0,
            height: 100.0,
            path: None,
            fill: "#000000".to_string(),
            stroke: Stroke::default(),
        }
    }
}

/// Variant payload of an element.
#[derive(Debug, Clone, PartialEq)]
pub enum ElementKind {
    /// Text.
    Text(TextProps),
    /// Image.
    Image(ImageProps),
    /// Shape.
    Shape(ShapeProps),
}

impl ElementKind {
    /// Default payload for a variant.
    #[must_use]
    pub fn defaults(variant: ElementVariant) -> Self {
        match variant {
            ElementVariant::Text => Self::Text(TextProps::default()),
            ElementVariant::Image => Self::Image(ImageProps {
                source: String::new(),
                width: 0.0,
                height: 0.0,
                filters: Vec::new(),
                crop_mask: None,
                svg_fill: None,
                svg_stroke: None,
            }),
            ElementVariant::Shape => Self::Shape(ShapeProps::default()),
        }
    }

    /// Variant tag.
    #[must_use]
    pub const fn variant(&self) -> ElementVariant {
        match self {
            Self::Text(_) => ElementVariant::Text,
            Self::Image(_) => ElementVariant::Image,
            Self::Shape(_) => ElementVariant::Shape,
        }
    }
}

/// Properties shared by every element variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementBase {
    /// Display title in layer lists.
    pub title: String,
    /// Center x.
    pub x: f64,
    /// Center y.
    pub y: f64,
    /// Horizontal scale.
    pub scale_x: f64,
    /// Vertical scale.
    pub scale_y: f64,
    /// Rotation in degrees.
    pub angle: f64,
    /// Opacity.
    pub opacity: f64,
    /// Locked elements cannot be moved or edited from the canvas.
    pub locked: bool,
    /// Whether the user may delete the element.
    pub removable: bool,
    /// Whether colour controls apply.
    pub colorable: bool,
    /// Keep `scale_x == scale_y` when scaling.
    pub lock_uni_scaling: bool,
}

impl Default for ElementBase {
    fn default() -> Self {
        Self {
            title: String::new(),
            x: 0.0,
            y: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            angle: 0.0,
            opacity: 1.0,
            locked: false,
            removable: true,
            colorable: true,
            lock_uni_scaling: true,
        }
    }
}

/// A design element.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    id: ElementId,
    /// Shared properties.
    pub base: ElementBase,
    /// Variant payload.
    pub kind: ElementKind,
}

impl Element {
    /// Immutable identifier.
    #[must_use]
    pub const fn id(&self) -> ElementId {
        self.id
    }

    /// Variant tag.
    #[must_use]
    pub const fn variant(&self) -> ElementVariant {
        self.kind.variant()
    }

    /// Text payload, if this is a text element.
    #[must_use]
    pub fn as_text(&self) -> Option<&TextProps> {
        match &self.kind {
            ElementKind::Text(t) => Some(t),
            _ => None,
        }
    }

    /// Image payload, if this is an image element.
    #[must_use]
    pub fn as_image(&self) -> Option<&ImageProps> {
        match &self.kind {
            ElementKind::Image(i) => Some(i),
            _ => None,
        }
    }

    /// Shape payload, if this is a shape element.
    #[must_use]
    pub fn as_shape(&self) -> Option<&ShapeProps> {
        match &self.kind {
            ElementKind::Shape(s) => Some(s),
            _ => None,
        }
    }

    /// Unscaled, unrotated size.
    #[must_use]
    pub fn local_size(&self, measure: &dyn GlyphMeasure) -> (f64, f64) {
        match &self.kind {
            ElementKind::Text(t) => t.size(measure),
            ElementKind::Image(i) => (i.width, i.height),
            ElementKind::Shape(s) => (s.width, s.height),
        }
    }

    /// Transform from element-local coordinates (origin at the center) to
    /// view coordinates.
    #[must_use]
    pub fn transform(&self) -> Affine {
        let b = &self.base;
        Affine::placement(b.x, b.y, b.scale_x, b.scale_y, b.angle)
    }

    /// Axis-aligned bounding box in view coordinates.
    #[must_use]
    pub fn bounds(&self, measure: &dyn GlyphMeasure) -> Rect {
        let (w, h) = self.local_size(measure);
        self.transform().bounds_of(&Rect::centered(w, h))
    }

    /// Whether a view-space point lies on the element's (rotated) box.
    #[must_use]
    pub fn contains_point(&self, p: Point, measure: &dyn GlyphMeasure) -> bool {
        let (w, h) = self.local_size(measure);
        self.transform()
            .invert()
            .is_some_and(|inv| Rect::centered(w, h).contains(inv.apply(p)))
    }

    /// Apply a patch in place. Atomic: on error the element is unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`DesignError::Validation`] if a known key carries a value of
    /// the wrong type.
    pub fn apply_patch(&mut self, patch: &ElementPatch) -> DesignResult<()> {
        let mut next = self.clone();
        for (key, value) in patch.iter() {
            apply_key(&mut next, key, value)?;
        }
        *self = next;
        Ok(())
    }

    /// Every property except `id` and `type`, as a nested JSON object.
    ///
    /// # Errors
    ///
    /// Returns [`DesignError::Serialization`] if encoding fails.
    pub fn properties(&self) -> DesignResult<Map<String, Value>> {
        let mut map = into_object(serde_json::to_value(&self.base)?);
        let payload = match &self.kind {
            ElementKind::Text(t) => serde_json::to_value(t)?,
            ElementKind::Image(i) => serde_json::to_value(i)?,
            ElementKind::Shape(s) => serde_json::to_value(s)?,
        };
        map.extend(into_object(payload));
        Ok(map)
    }

    fn default_title(&self) -> String {
        match &self.kind {
            ElementKind::Text(t) => t.text.lines().next().unwrap_or_default().to_string(),
            ElementKind::Image(_) => "Image".to_string(),
            ElementKind::Shape(s) => match s.shape {
                ShapeType::Rect => "Rectangle".to_string(),
                ShapeType::Ellipse => "Ellipse".to_string(),
                ShapeType::Path => "Shape".to_string(),
            },
        }
    }
}

fn into_object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

/// A partial set of property changes.
///
/// Keys are camelCase property names. Grouped properties may be nested
/// (`{"stroke": {"width": 2}}`) or dotted (`"stroke.width"`). Unknown keys
/// are ignored when the patch is applied.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementPatch(Map<String, Value>);

impl ElementPatch {
    /// Empty patch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`ElementPatch::set`].
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    /// Set one property.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    /// Value for a top-level key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Whether a top-level key is present.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Merge another patch over this one.
    pub fn extend(&mut self, other: Self) {
        self.0.extend(other.0);
    }

    /// Iterate over entries.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Number of top-level entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the patch is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Consume into the underlying JSON object.
    #[must_use]
    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for ElementPatch {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl TryFrom<Value> for ElementPatch {
    type Error = DesignError;

    fn try_from(value: Value) -> DesignResult<Self> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(DesignError::Validation(format!(
                "patch must be an object, got {other}"
            ))),
        }
    }
}

/// Create an element from caller-supplied properties merged over the
/// variant defaults, with a fresh id.
///
/// # Errors
///
/// Returns [`DesignError::Validation`] if a required field is missing
/// (`text` for text, `source` for images) or a value has the wrong type.
pub fn create_element(variant: ElementVariant, initial: &ElementPatch) -> DesignResult<Element> {
    let mut element = build_element(variant, ElementId::new(), initial)?;
    if element.base.title.is_empty() {
        element.base.title = element.default_title();
    }
    Ok(element)
}

/// [`create_element`] with a caller-chosen id, used when loading documents.
///
/// A persisted title is kept as written, even when empty. The default title
/// is only filled in when the record has no `title` key at all.
///
/// # Errors
///
/// Same as [`create_element`].
pub fn create_element_with_id(
    variant: ElementVariant,
    id: ElementId,
    initial: &ElementPatch,
) -> DesignResult<Element> {
    let mut element = build_element(variant, id, initial)?;
    if initial.get("title").is_none() {
        element.base.title = element.default_title();
    }
    Ok(element)
}

fn build_element(variant: ElementVariant, id: ElementId, initial: &ElementPatch) -> DesignResult<Element> {
    let required = match variant {
        ElementVariant::Text => Some("text"),
        ElementVariant::Image => Some("source"),
        ElementVariant::Shape => None,
    };
    if let Some(key) = required {
        match initial.get(key) {
            Some(Value::String(s)) if variant != ElementVariant::Image || !s.is_empty() => {}
            Some(Value::String(_)) => {
                return Err(DesignError::Validation(format!(
                    "{} element requires a non-empty {key}",
                    variant.as_str()
                )))
            }
            _ => {
                return Err(DesignError::Validation(format!(
                    "{} element requires {key}",
                    variant.as_str()
                )))
            }
        }
    }
    let mut element = Element {
        id,
        base: ElementBase::default(),
        kind: ElementKind::defaults(variant),
    };
    element.apply_patch(initial)?;
    Ok(element)
}

/// Return a copy of `element` with `patch` applied.
///
/// # Errors
///
/// See [`Element::apply_patch`].
pub fn update_element(element: &Element, patch: &ElementPatch) -> DesignResult<Element> {
    let mut next = element.clone();
    next.apply_patch(patch)?;
    Ok(next)
}

/// Deep copy with a fresh id.
#[must_use]
pub fn clone_element(element: &Element) -> Element {
    Element {
        id: ElementId::new(),
        ..element.clone()
    }
}

fn type_error(key: &str, expected: &str, value: &Value) -> DesignError {
    DesignError::Validation(format!("{key}: expected {expected}, got {value}"))
}

fn number(key: &str, value: &Value) -> DesignResult<f64> {
    value.as_f64().ok_or_else(|| type_error(key, "a number", value))
}

fn clamped(key: &str, value: &Value, domain: NumericDomain) -> DesignResult<f64> {
    number(key, value).map(|v| domain.clamp(v))
}

fn boolean(key: &str, value: &Value) -> DesignResult<bool> {
    value.as_bool().ok_or_else(|| type_error(key, "a boolean", value))
}

fn string(key: &str, value: &Value) -> DesignResult<String> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| type_error(key, "a string", value))
}

fn optional_string(key: &str, value: &Value) -> DesignResult<Option<String>> {
    if value.is_null() {
        Ok(None)
    } else {
        string(key, value).map(Some)
    }
}

fn choice<T: serde::de::DeserializeOwned>(key: &str, value: &Value) -> DesignResult<T> {
    serde_json::from_value(value.clone()).map_err(|_| type_error(key, "a known option", value))
}

fn filters(key: &str, value: &Value) -> DesignResult<Vec<ImageFilter>> {
    let mut list: Vec<ImageFilter> = serde_json::from_value(value.clone())
        .map_err(|_| type_error(key, "a list of {name, intensity}", value))?;
    for filter in &mut list {
        filter.intensity = limits::FILTER_INTENSITY.clamp(filter.intensity);
    }
    Ok(list)
}

fn apply_key(element: &mut Element, key: &str, value: &Value) -> DesignResult<()> {
    if let (Some(group), Value::Object(fields)) = (group_key(key), value) {
        for (field, v) in fields {
            apply_key(element, &format!("{group}.{field}"), v)?;
        }
        return Ok(());
    }
    let base = &mut element.base;
    match key {
        "title" => base.title = string(key, value)?,
        "x" => base.x = number(key, value)?,
        "y" => base.y = number(key, value)?,
        "scaleX" => base.scale_x = clamped(key, value, limits::SCALE)?,
        "scaleY" => base.scale_y = clamped(key, value, limits::SCALE)?,
        "angle" => base.angle = clamped(key, value, limits::ANGLE)?,
        "opacity" => base.opacity = clamped(key, value, limits::OPACITY)?,
        "locked" => base.locked = boolean(key, value)?,
        "removable" => base.removable = boolean(key, value)?,
        "colorable" => base.colorable = boolean(key, value)?,
        "lockUniScaling" => base.lock_uni_scaling = boolean(key, value)?,
        _ => match &mut element.kind {
            ElementKind::Text(t) => apply_text_key(t, key, value)?,
            ElementKind::Image(i) => apply_image_key(i, key, value)?,
            ElementKind::Shape(s) => apply_shape_key(s, key, value)?,
        },
    }
    Ok(())
}

fn group_key(key: &str) -> Option<&str> {
    matches!(key, "curve" | "stroke" | "shadow" | "svgStroke").then_some(key)
}

fn apply_stroke_key(stroke: &mut Stroke, key: &str, field: &str, value: &Value) -> DesignResult<()> {
    match field {
        "color" => stroke.color = string(key, value)?,
        "width" => stroke.width = clamped(key, value, limits::STROKE_WIDTH)?,
        _ => {}
    }
    Ok(())
}

fn apply_text_key(t: &mut TextProps, key: &str, value: &Value) -> DesignResult<()> {
    match key {
        "text" => t.text = string(key, value)?,
        "fontFamily" => t.font_family = string(key, value)?,
        "fontSize" => t.font_size = clamped(key, value, limits::FONT_SIZE)?,
        "lineHeight" => t.line_height = clamped(key, value, limits::LINE_HEIGHT)?,
        "letterSpacing" => t.letter_spacing = clamped(key, value, limits::LETTER_SPACING)?,
        "fontWeight" => t.font_weight = choice(key, value)?,
        "fontStyle" => t.font_style = choice(key, value)?,
        "textDecoration" => t.text_decoration = choice(key, value)?,
        "textTransform" => t.text_transform = choice(key, value)?,
        "textAlign" => t.text_align = choice(key, value)?,
        "fill" => t.fill = string(key, value)?,
        "curve.mode" => t.curve.mode = choice(key, value)?,
        "curve.radius" => t.curve.radius = clamped(key, value, limits::CURVE_RADIUS)?,
        "shadow.color" => t.shadow.color = string(key, value)?,
        "shadow.blur" => t.shadow.blur = clamped(key, value, limits::SHADOW_BLUR)?,
        "shadow.offsetX" => t.shadow.offset_x = clamped(key, value, limits::SHADOW_OFFSET)?,
        "shadow.offsetY" => t.shadow.offset_y = clamped(key, value, limits::SHADOW_OFFSET)?,
        _ => {
            if let Some(field) = key.strip_prefix("stroke.") {
                apply_stroke_key(&mut t.stroke, key, field, value)?;
            }
        }
    }
    Ok(())
}

fn apply_image_key(i: &mut ImageProps, key: &str, value: &Value) -> DesignResult<()> {
    match key {
        "source" => {
            let source = string(key, value)?;
            if source.is_empty() {
                return Err(DesignError::Validation(
                    "image element requires a non-empty source".to_string(),
                ));
            }
            i.source = source;
        }
        "width" => i.width = clamped(key, value, limits::DIMENSION)?,
        "height" => i.height = clamped(key, value, limits::DIMENSION)?,
        "filters" => i.filters = filters(key, value)?,
        "cropMask" => i.crop_mask = optional_string(key, value)?,
        "svgFill" => i.svg_fill = optional_string(key, value)?,
        "svgStroke" if value.is_null() => i.svg_stroke = None,
        _ => {
            if let Some(field) = key.strip_prefix("svgStroke.") {
                let stroke = i.svg_stroke.get_or_insert_with(Stroke::default);
                apply_stroke_key(stroke, key, field, value)?;
            }
        }
    }
    Ok(())
}

fn apply_shape_key(s: &mut ShapeProps, key: &str, value: &Value) -> DesignResult<()> {
    match key {
        "shape" => s.shape = choice(key, value)?,
        "width" => s.width = clamped(key, value, limits::DIMENSION)?,
        "height" => s.height = clamped(key, value, limits::DIMENSION)?,
        "path" => s.path = optional_string(key, value)?,
        "fill" => s.fill = string(key, value)?,
        _ => {
            if let Some(field) = key.strip_prefix("stroke.") {
                apply_stroke_key(&mut s.stroke, key, field, value)?;
            }
        }
    }
    Ok(())
}
