//! Selection context passed explicitly to control and alignment operations.

use serde::{Deserialize, Serialize};

use crate::element::ElementId;
use crate::geometry::Rect;
use crate::view::View;

/// The elements a control edit targets. The most recently selected element
/// is the active one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    ids: Vec<ElementId>,
}

impl Selection {
    /// Empty selection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Selection of a single element.
    #[must_use]
    pub fn single(id: ElementId) -> Self {
        Self { ids: vec![id] }
    }

    /// Replace the selection with one element.
    pub fn select(&mut self, id: ElementId) {
        self.ids.clear();
        self.ids.push(id);
    }

    /// Add an element to a multi-selection; it becomes the active one.
    pub fn add(&mut self, id: ElementId) {
        self.ids.retain(|&e| e != id);
        self.ids.push(id);
    }

    /// Drop an element from the selection.
    pub fn remove(&mut self, id: ElementId) {
        self.ids.retain(|&e| e != id);
    }

    /// Clear the selection.
    pub fn clear(&mut self) {
        self.ids.clear();
    }

    /// The active element.
    #[must_use]
    pub fn active(&self) -> Option<ElementId> {
        self.ids.last().copied()
    }

    /// Selected ids in selection order.
    #[must_use]
    pub fn ids(&self) -> &[ElementId] {
        &self.ids
    }

    /// Whether an element is selected.
    #[must_use]
    pub fn contains(&self, id: ElementId) -> bool {
        self.ids.contains(&id)
    }

    /// Whether nothing is selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Forget ids that no longer exist in `view`.
    pub fn retain_in(&mut self, view: &View) {
        self.ids.retain(|&id| view.contains(id));
    }
}

/// Alignment of selected elements relative to the view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Alignment {
    /// Left edges on the view's left edge.
    Left,
    /// Horizontally centered.
    CenterH,
    /// Right edges on the view's right edge.
    Right,
    /// Top edges on the view's top edge.
    Top,
    /// Vertically centered.
    CenterV,
    /// Bottom edges on the view's bottom edge.
    Bottom,
}

impl Alignment {
    /// Translation moving `bounds` into alignment inside `target`.
    #[must_use]
    pub fn offset(self, bounds: &Rect, target: &Rect) -> (f64, f64) {
        match self {
            Self::Left => (target.x - bounds.x, 0.0),
            Self::CenterH => (target.center().x - bounds.center().x, 0.0),
            Self::Right => (target.right() - bounds.right(), 0.0),
            Self::Top => (0.0, target.y - bounds.y),
            Self::CenterV => (0.0, target.center().y - bounds.center().y),
            Self::Bottom => (0.0, target.bottom() - bounds.bottom()),
        }
    }
}
