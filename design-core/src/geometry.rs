//! Geometry utilities: points, boxes, affine transforms and text layout.
//!
//! Everything here is pure math. Coordinates are y-down design units and
//! angles are degrees, clockwise, matching what the editor shell shows.

use serde::{Deserialize, Serialize};

/// A point in design units.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal position.
    pub x: f64,
    /// Vertical position (grows downward).
    pub y: f64,
}

impl Point {
    /// Create a point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Axis-aligned rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    /// Width (never negative).
    pub width: f64,
    /// Height (never negative).
    pub height: f64,
}

impl Rect {
    /// Create a rectangle from its top-left corner and size.
    #[must_use]
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width: width.max(0.0),
            height: height.max(0.0),
        }
    }

    /// Rectangle of the given size centered on the origin.
    #[must_use]
    pub fn centered(width: f64, height: f64) -> Self {
        Self::new(-width / 2.0, -height / 2.0, width, height)
    }

    /// Right edge.
    #[must_use]
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// Bottom edge.
    #[must_use]
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Center point.
    #[must_use]
    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// The four corners, clockwise from top-left.
    #[must_use]
    pub fn corners(&self) -> [Point; 4] {
        [
            Point::new(self.x, self.y),
            Point::new(self.right(), self.y),
            Point::new(self.right(), self.bottom()),
            Point::new(self.x, self.bottom()),
        ]
    }

    /// Whether the point lies inside or on the edge.
    #[must_use]
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.right() && p.y >= self.y && p.y <= self.bottom()
    }

    /// Smallest rectangle containing all points. `None` for an empty input.
    #[must_use]
    pub fn enclosing(points: impl IntoIterator<Item = Point>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
        for p in iter {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        Some(Self::new(min_x, min_y, max_x - min_x, max_y - min_y))
    }

    /// Smallest rectangle containing both rectangles.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        Self::new(
            x,
            y,
            self.right().max(other.right()) - x,
            self.bottom().max(other.bottom()) - y,
        )
    }
}

/// 2D affine transform `[a c e; b d f; 0 0 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Affine {
    a: f64,
    b: f64,
    c: f64,
    d: f64,
    e: f64,
    f: f64,
}

impl Default for Affine {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Affine {
    /// The identity transform.
    pub const IDENTITY: Self = Self {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    /// Translation.
    #[must_use]
    pub const fn translate(dx: f64, dy: f64) -> Self {
        Self {
            e: dx,
            f: dy,
            ..Self::IDENTITY
        }
    }

    /// Non-uniform scale about the origin.
    #[must_use]
    pub const fn scale(sx: f64, sy: f64) -> Self {
        Self {
            a: sx,
            d: sy,
            ..Self::IDENTITY
        }
    }

    /// Clockwise rotation (y-down) about the origin, in degrees.
    #[must_use]
    pub fn rotate(degrees: f64) -> Self {
        let (sin, cos) = degrees.to_radians().sin_cos();
        Self {
            a: cos,
            b: sin,
            c: -sin,
            d: cos,
            e: 0.0,
            f: 0.0,
        }
    }

    /// Placement transform of an object: scale, then rotate, then move its
    /// origin to `(x, y)`.
    #[must_use]
    pub fn placement(x: f64, y: f64, scale_x: f64, scale_y: f64, angle: f64) -> Self {
        Self::translate(x, y)
            .then_after(&Self::rotate(angle))
            .then_after(&Self::scale(scale_x, scale_y))
    }

    /// Composition `self ∘ inner`: apply `inner` first, then `self`.
    #[must_use]
    pub fn then_after(&self, inner: &Self) -> Self {
        Self {
            a: self.a * inner.a + self.c * inner.b,
            b: self.b * inner.a + self.d * inner.b,
            c: self.a * inner.c + self.c * inner.d,
            d: self.b * inner.c + self.d * inner.d,
            e: self.a * inner.e + self.c * inner.f + self.e,
            f: self.b * inner.e + self.d * inner.f + self.f,
        }
    }

    /// Transform a point.
    #[must_use]
    pub fn apply(&self, p: Point) -> Point {
        Point::new(
            self.a * p.x + self.c * p.y + self.e,
            self.b * p.x + self.d * p.y + self.f,
        )
    }

    /// Inverse transform, `None` when the transform is degenerate (zero scale).
    #[must_use]
    pub fn invert(&self) -> Option<Self> {
        let det = self.a * self.d - self.b * self.c;
        if det.abs() < f64::EPSILON {
            return None;
        }
        let inv = 1.0 / det;
        Some(Self {
            a: self.d * inv,
            b: -self.b * inv,
            c: -self.c * inv,
            d: self.a * inv,
            e: (self.c * self.f - self.d * self.e) * inv,
            f: (self.b * self.e - self.a * self.f) * inv,
        })
    }

    /// Axis-aligned bounds of a local rectangle after transformation.
    #[must_use]
    pub fn bounds_of(&self, local: &Rect) -> Rect {
        Rect::enclosing(local.corners().map(|p| self.apply(p))).unwrap_or_default()
    }
}

/// Supplies glyph advances for text layout.
///
/// The rendering backend usually knows real font metrics; the engine falls
/// back to [`ApproxMeasure`] when running headless.
pub trait GlyphMeasure {
    /// Horizontal advance of `ch` at `font_size`, excluding letter spacing.
    fn advance(&self, ch: char, font_size: f64) -> f64;
}

/// Proportional approximation of a sans-serif font.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApproxMeasure;

impl GlyphMeasure for ApproxMeasure {
    fn advance(&self, ch: char, font_size: f64) -> f64 {
        let em = match ch {
            ' ' | 'i' | 'l' | 'j' | 't' | 'f' | '.' | ',' | '!' | '\'' | '|' | ':' | ';' => 0.3,
            'm' | 'w' | 'M' | 'W' | '@' => 0.85,
            c if c.is_uppercase() => 0.68,
            c if c.is_ascii_digit() => 0.56,
            _ => 0.55,
        };
        em * font_size
    }
}

/// Position of one glyph after layout. `x`/`y` is the glyph's baseline
/// midpoint relative to the text origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GlyphPlacement {
    /// The glyph.
    pub ch: char,
    /// Horizontal midpoint.
    pub x: f64,
    /// Baseline vertical position.
    pub y: f64,
    /// Rotation in degrees, clockwise.
    pub rotation: f64,
}

/// Circular arc the text is bent along.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextArc {
    /// Arc radius in design units. Zero lays out flat.
    pub radius: f64,
    /// Text hangs below the arc instead of sitting on top of it.
    pub reverse: bool,
}

/// Total advance of a line: glyph advances plus spacing between glyphs.
#[must_use]
pub fn line_width(
    text: &str,
    font_size: f64,
    letter_spacing: f64,
    measure: &dyn GlyphMeasure,
) -> f64 {
    let mut width = 0.0;
    let mut count = 0_u32;
    for ch in text.chars() {
        width += measure.advance(ch, font_size);
        count += 1;
    }
    if count > 1 {
        width += letter_spacing * f64::from(count - 1);
    }
    width
}

/// Lay out a single line of text centered on the origin, optionally along a
/// circular arc.
///
/// Glyph advances are measured along the arc, so the arc length equals the
/// flat line width for any radius. Each glyph is rotated by the angle its
/// midpoint subtends at the arc center. As the radius grows the layout
/// converges to the flat one.
#[must_use]
pub fn layout_line(
    text: &str,
    font_size: f64,
    letter_spacing: f64,
    measure: &dyn GlyphMeasure,
    arc: Option<TextArc>,
) -> Vec<GlyphPlacement> {
    let total = line_width(text, font_size, letter_spacing, measure);
    let mut cursor = -total / 2.0;
    let mut glyphs = Vec::with_capacity(text.len());
    for ch in text.chars() {
        let advance = measure.advance(ch, font_size);
        let s = cursor + advance / 2.0;
        cursor += advance + letter_spacing;
        glyphs.push(place_on_arc(ch, s, arc));
    }
    glyphs
}

/// Map arc-length position `s` (signed, from the arc's apex) onto the arc.
fn place_on_arc(ch: char, s: f64, arc: Option<TextArc>) -> GlyphPlacement {
    let flat = GlyphPlacement {
        ch,
        x: s,
        y: 0.0,
        rotation: 0.0,
    };
    let Some(arc) = arc else {
        return flat;
    };
    if arc.radius <= f64::EPSILON {
        return flat;
    }
    let theta = s / arc.radius;
    let (sin, cos) = theta.sin_cos();
    let drop = arc.radius * (1.0 - cos);
    if arc.reverse {
        GlyphPlacement {
            ch,
            x: arc.radius * sin,
            y: -drop,
            rotation: -theta.to_degrees(),
        }
    } else {
        GlyphPlacement {
            ch,
            x: arc.radius * sin,
            y: drop,
            rotation: theta.to_degrees(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_rect_contains_edges() {
        let r = Rect::new(10.0, 10.0, 20.0, 10.0);
        assert!(r.contains(Point::new(10.0, 10.0)));
        assert!(r.contains(Point::new(30.0, 20.0)));
        assert!(!r.contains(Point::new(30.1, 20.0)));
    }

    #[test]
    fn test_placement_rotates_about_origin() {
        let t = Affine::placement(100.0, 50.0, 2.0, 2.0, 90.0);
        let p = t.apply(Point::new(10.0, 0.0));
        assert!((p.x - 100.0).abs() < EPS);
        assert!((p.y - 70.0).abs() < EPS);
    }

    #[test]
    fn test_invert_round_trips() {
        let t = Affine::placement(12.0, -4.0, 1.5, 0.5, 33.0);
        let inv = t.invert().expect("invertible");
        let p = Point::new(7.0, 3.0);
        let back = inv.apply(t.apply(p));
        assert!(back.distance(p) < 1e-9);
    }

    #[test]
    fn test_zero_scale_is_not_invertible() {
        assert!(Affine::scale(0.0, 1.0).invert().is_none());
    }

    #[test]
    fn test_bounds_of_rotated_square() {
        let t = Affine::rotate(45.0);
        let b = t.bounds_of(&Rect::centered(2.0, 2.0));
        let half_diag = 2.0_f64.sqrt();
        assert!((b.width - 2.0 * half_diag).abs() < EPS);
        assert!((b.x + half_diag).abs() < EPS);
    }

    #[test]
    fn test_flat_layout_is_centered() {
        let glyphs = layout_line("abc", 20.0, 2.0, &ApproxMeasure, None);
        assert_eq!(glyphs.len(), 3);
        let first = glyphs[0].x;
        let last = glyphs[2].x;
        assert!((first + last).abs() < EPS, "symmetric glyph widths stay centered");
        assert!(glyphs.iter().all(|g| g.y.abs() < EPS && g.rotation.abs() < EPS));
    }

    #[test]
    fn test_arc_preserves_advance_along_circumference() {
        let radius = 120.0;
        let arc = Some(TextArc {
            radius,
            reverse: false,
        });
        let flat = layout_line("HELLO", 30.0, 0.0, &ApproxMeasure, None);
        let curved = layout_line("HELLO", 30.0, 0.0, &ApproxMeasure, arc);
        for (f, c) in flat.iter().zip(&curved) {
            let arc_pos = c.rotation.to_radians() * radius;
            assert!((arc_pos - f.x).abs() < 1e-9);
        }
    }

    #[test]
    fn test_reverse_mirrors_vertically() {
        let up = layout_line(
            "curve",
            24.0,
            1.0,
            &ApproxMeasure,
            Some(TextArc {
                radius: 80.0,
                reverse: false,
            }),
        );
        let down = layout_line(
            "curve",
            24.0,
            1.0,
            &ApproxMeasure,
            Some(TextArc {
                radius: 80.0,
                reverse: true,
            }),
        );
        for (u, d) in up.iter().zip(&down) {
            assert!((u.x - d.x).abs() < EPS);
            assert!((u.y + d.y).abs() < EPS);
            assert!((u.rotation + d.rotation).abs() < EPS);
        }
    }

    #[test]
    fn test_large_radius_converges_to_flat() {
        let flat = layout_line("Continuity", 40.0, 3.0, &ApproxMeasure, None);
        let curved = layout_line(
            "Continuity",
            40.0,
            3.0,
            &ApproxMeasure,
            Some(TextArc {
                radius: 1.0e8,
                reverse: false,
            }),
        );
        for (f, c) in flat.iter().zip(&curved) {
            assert!((f.x - c.x).abs() < 1e-3);
            assert!((f.y - c.y).abs() < 1e-3);
            assert!(c.rotation.abs() < 1e-3);
        }
    }

    #[test]
    fn test_zero_radius_lays_out_flat() {
        let flat = layout_line("ab", 12.0, 0.0, &ApproxMeasure, None);
        let zero = layout_line(
            "ab",
            12.0,
            0.0,
            &ApproxMeasure,
            Some(TextArc {
                radius: 0.0,
                reverse: true,
            }),
        );
        assert_eq!(flat, zero);
    }
}
