//! Views - printable surfaces holding an ordered stack of elements.
//!
//! The element vector *is* the z-order: index 0 paints first (bottom-most).

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::element::{limits, Element, ElementId};
use crate::geometry::{GlyphMeasure, Point, Rect};
use crate::{DesignError, DesignResult};

/// Identifier of a view, unique within its product.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ViewId(String);

impl ViewId {
    /// Wrap an existing identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Random identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// String form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ViewId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Direction for single-step layer moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerDirection {
    /// Towards the top of the stack.
    Up,
    /// Towards the bottom of the stack.
    Down,
}

/// One printable surface of the product.
#[derive(Debug, Clone, PartialEq)]
pub struct View {
    id: ViewId,
    /// Display title, e.g. "Front".
    pub title: String,
    width: f64,
    height: f64,
    /// Background colour.
    pub background_color: String,
    /// When set, [`View::resize`] is rejected.
    pub locked_dimensions: bool,
    elements: Vec<Element>,
    halted: bool,
}

impl View {
    /// Create an empty view.
    #[must_use]
    pub fn new(id: ViewId, title: impl Into<String>, width: f64, height: f64) -> Self {
        Self {
            id,
            title: title.into(),
            width: limits::DIMENSION.clamp(width),
            height: limits::DIMENSION.clamp(height),
            background_color: "#ffffff".to_string(),
            locked_dimensions: false,
            elements: Vec::new(),
            halted: false,
        }
    }

    /// Set the background colour.
    #[must_use]
    pub fn with_background(mut self, color: impl Into<String>) -> Self {
        self.background_color = color.into();
        self
    }

    /// Set whether dimensions are locked.
    #[must_use]
    pub fn with_locked_dimensions(mut self, locked: bool) -> Self {
        self.locked_dimensions = locked;
        self
    }

    /// View identifier.
    #[must_use]
    pub fn id(&self) -> &ViewId {
        &self.id
    }

    /// Width in design units.
    #[must_use]
    pub fn width(&self) -> f64 {
        self.width
    }

    /// Height in design units.
    #[must_use]
    pub fn height(&self) -> f64 {
        self.height
    }

    /// The printable area.
    #[must_use]
    pub fn bounds(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width, self.height)
    }

    /// Elements in z-order, bottom first.
    #[must_use]
    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    /// Element ids in z-order, bottom first.
    #[must_use]
    pub fn element_ids(&self) -> Vec<ElementId> {
        self.elements.iter().map(Element::id).collect()
    }

    /// Number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Whether the view has no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Whether the view was halted by an invariant violation.
    #[must_use]
    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// Get an element by id.
    #[must_use]
    pub fn get(&self, id: ElementId) -> Option<&Element> {
        self.elements.iter().find(|e| e.id() == id)
    }

    /// Z-order index of an element.
    #[must_use]
    pub fn index_of(&self, id: ElementId) -> Option<usize> {
        self.elements.iter().position(|e| e.id() == id)
    }

    /// Whether the view holds an element with this id.
    #[must_use]
    pub fn contains(&self, id: ElementId) -> bool {
        self.index_of(id).is_some()
    }

    fn ensure_writable(&self) -> DesignResult<()> {
        if self.halted {
            Err(DesignError::ViewHalted(self.id.to_string()))
        } else {
            Ok(())
        }
    }

    fn require_index(&self, id: ElementId) -> DesignResult<usize> {
        self.index_of(id)
            .ok_or_else(|| DesignError::NotFound(format!("element {id} in view {}", self.id)))
    }

    /// Append an element at the top of the z-order. Returns its index.
    ///
    /// # Errors
    ///
    /// Returns [`DesignError::Validation`] if the id is already present, or
    /// [`DesignError::ViewHalted`] if the view is halted.
    pub fn add_element(&mut self, element: Element) -> DesignResult<usize> {
        let index = self.elements.len();
        self.insert_element(index, element)
    }

    /// Insert an element at a z-order index (clamped to the stack size).
    ///
    /// # Errors
    ///
    /// Same as [`View::add_element`].
    pub fn insert_element(&mut self, index: usize, element: Element) -> DesignResult<usize> {
        self.ensure_writable()?;
        if self.contains(element.id()) {
            return Err(DesignError::Validation(format!(
                "element {} already exists in view {}",
                element.id(),
                self.id
            )));
        }
        let index = index.min(self.elements.len());
        tracing::debug!(view = %self.id, element = %element.id(), index, "insert element");
        self.elements.insert(index, element);
        Ok(index)
    }

    /// Remove an element; the stack stays contiguous.
    ///
    /// # Errors
    ///
    /// Returns [`DesignError::NotFound`] if absent (the view is unchanged).
    pub fn remove_element(&mut self, id: ElementId) -> DesignResult<Element> {
        self.ensure_writable()?;
        let index = self.require_index(id)?;
        tracing::debug!(view = %self.id, element = %id, index, "remove element");
        Ok(self.elements.remove(index))
    }

    /// Mutate an element in place through a closure.
    ///
    /// # Errors
    ///
    /// Returns [`DesignError::NotFound`] if absent, or whatever the closure
    /// returns. The closure must not change the element id.
    pub fn update_element<F, T>(&mut self, id: ElementId, f: F) -> DesignResult<T>
    where
        F: FnOnce(&mut Element) -> DesignResult<T>,
    {
        self.ensure_writable()?;
        let index = self.require_index(id)?;
        f(&mut self.elements[index])
    }

    /// Swap an element with its neighbour. Returns `false` (no-op) at the
    /// top or bottom of the stack.
    ///
    /// # Errors
    ///
    /// Returns [`DesignError::NotFound`] if absent.
    pub fn move_layer(&mut self, id: ElementId, direction: LayerDirection) -> DesignResult<bool> {
        self.ensure_writable()?;
        let index = self.require_index(id)?;
        let target = match direction {
            LayerDirection::Up if index + 1 < self.elements.len() => index + 1,
            LayerDirection::Down if index > 0 => index - 1,
            _ => return Ok(false),
        };
        self.elements.swap(index, target);
        Ok(true)
    }

    /// Move an element to the top of the stack. Returns whether it moved.
    ///
    /// # Errors
    ///
    /// Returns [`DesignError::NotFound`] if absent.
    pub fn bring_to_front(&mut self, id: ElementId) -> DesignResult<bool> {
        self.ensure_writable()?;
        let index = self.require_index(id)?;
        if index + 1 == self.elements.len() {
            return Ok(false);
        }
        let element = self.elements.remove(index);
        self.elements.push(element);
        Ok(true)
    }

    /// Move an element to the bottom of the stack. Returns whether it moved.
    ///
    /// # Errors
    ///
    /// Returns [`DesignError::NotFound`] if absent.
    pub fn send_to_back(&mut self, id: ElementId) -> DesignResult<bool> {
        self.ensure_writable()?;
        let index = self.require_index(id)?;
        if index == 0 {
            return Ok(false);
        }
        let element = self.elements.remove(index);
        self.elements.insert(0, element);
        Ok(true)
    }

    /// Reorder the stack to match `order` (bottom first).
    ///
    /// # Errors
    ///
    /// Returns [`DesignError::InvalidOrder`] unless `order` is a permutation
    /// of the current ids; the view is unchanged on error.
    pub fn reorder_elements(&mut self, order: &[ElementId]) -> DesignResult<()> {
        self.ensure_writable()?;
        if order.len() != self.elements.len() {
            return Err(DesignError::InvalidOrder(format!(
                "expected {} ids, got {}",
                self.elements.len(),
                order.len()
            )));
        }
        let mut slots: Vec<Option<Element>> = self.elements.iter().cloned().map(Some).collect();
        let mut reordered = Vec::with_capacity(order.len());
        for id in order {
            let taken = self
                .index_of(*id)
                .and_then(|i| slots[i].take())
                .ok_or_else(|| DesignError::InvalidOrder(format!("unexpected or repeated id {id}")))?;
            reordered.push(taken);
        }
        self.elements = reordered;
        Ok(())
    }

    /// Change the view size.
    ///
    /// # Errors
    ///
    /// Returns [`DesignError::LockedDimensions`] when dimensions are locked.
    pub fn resize(&mut self, width: f64, height: f64) -> DesignResult<()> {
        self.ensure_writable()?;
        if self.locked_dimensions {
            return Err(DesignError::LockedDimensions(self.id.to_string()));
        }
        self.width = limits::DIMENSION.clamp(width);
        self.height = limits::DIMENSION.clamp(height);
        Ok(())
    }

    /// Topmost element whose box contains the point.
    #[must_use]
    pub fn element_at(&self, p: Point, measure: &dyn GlyphMeasure) -> Option<ElementId> {
        self.elements
            .iter()
            .rev()
            .find(|e| e.contains_point(p, measure))
            .map(Element::id)
    }

    /// Check the z-order invariants. On violation the view is halted and
    /// rejects all further mutation.
    ///
    /// # Errors
    ///
    /// Returns [`DesignError::Invariant`] describing the violation.
    pub fn verify_integrity(&mut self) -> DesignResult<()> {
        let mut seen = HashSet::with_capacity(self.elements.len());
        if let Some(dup) = self.elements.iter().find(|e| !seen.insert(e.id())) {
            let detail = format!("duplicate element id {} in z-order", dup.id());
            tracing::error!(view = %self.id, %detail, "halting view");
            self.halted = true;
            return Err(DesignError::Invariant {
                view: self.id.to_string(),
                detail,
            });
        }
        Ok(())
    }

    /// Replace the element stack without per-element checks. Used by the
    /// loader; callers must run [`View::verify_integrity`] afterwards.
    pub(crate) fn set_elements(&mut self, elements: Vec<Element>) {
        self.elements = elements;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{create_element, ElementPatch, ElementVariant};

    fn shape(title: &str) -> Element {
        create_element(ElementVariant::Shape, &ElementPatch::new().with("title", title))
            .expect("shape")
    }

    fn view_with(n: usize) -> (View, Vec<ElementId>) {
        let mut view = View::new(ViewId::new("front"), "Front", 800.0, 600.0);
        let ids = (0..n)
            .map(|i| {
                let el = shape(&format!("s{i}"));
                let id = el.id();
                view.add_element(el).expect("add");
                id
            })
            .collect();
        (view, ids)
    }

    #[test]
    fn test_add_appends_on_top() {
        let (mut view, ids) = view_with(2);
        let idx = view.add_element(shape("top")).expect("add");
        assert_eq!(idx, 2);
        assert_eq!(&view.element_ids()[..2], &ids[..]);
    }

    #[test]
    fn test_add_rejects_duplicate_id() {
        let (mut view, _) = view_with(1);
        let dup = view.elements()[0].clone();
        assert!(matches!(view.add_element(dup), Err(DesignError::Validation(_))));
        assert_eq!(view.len(), 1);
    }

    #[test]
    fn test_remove_compacts_and_missing_is_not_found() {
        let (mut view, ids) = view_with(3);
        view.remove_element(ids[1]).expect("remove");
        assert_eq!(view.element_ids(), vec![ids[0], ids[2]]);

        let before = view.clone();
        let err = view.remove_element(ElementId::new()).unwrap_err();
        assert!(matches!(err, DesignError::NotFound(_)));
        assert_eq!(view, before);
    }

    #[test]
    fn test_move_layer_up_then_down_restores_order() {
        let (mut view, ids) = view_with(4);
        assert!(view.move_layer(ids[1], LayerDirection::Up).expect("up"));
        assert_eq!(view.element_ids(), vec![ids[0], ids[2], ids[1], ids[3]]);
        assert!(view.move_layer(ids[1], LayerDirection::Down).expect("down"));
        assert_eq!(view.element_ids(), ids);
    }

    #[test]
    fn test_move_layer_noop_at_bounds() {
        let (mut view, ids) = view_with(3);
        assert!(!view.move_layer(ids[2], LayerDirection::Up).expect("top"));
        assert!(!view.move_layer(ids[0], LayerDirection::Down).expect("bottom"));
        assert_eq!(view.element_ids(), ids);
    }

    #[test]
    fn test_front_and_back() {
        let (mut view, ids) = view_with(3);
        assert!(view.bring_to_front(ids[0]).expect("front"));
        assert_eq!(view.element_ids(), vec![ids[1], ids[2], ids[0]]);
        assert!(view.send_to_back(ids[0]).expect("back"));
        assert_eq!(view.element_ids(), ids);
        assert!(!view.send_to_back(ids[0]).expect("already back"));
    }

    #[test]
    fn test_reorder_accepts_permutation() {
        let (mut view, ids) = view_with(3);
        let order = vec![ids[2], ids[0], ids[1]];
        view.reorder_elements(&order).expect("reorder");
        assert_eq!(view.element_ids(), order);
    }

    #[test]
    fn test_reorder_rejects_non_permutation() {
        let (mut view, ids) = view_with(3);
        let before = view.clone();
        for bad in [
            vec![ids[0], ids[1]],
            vec![ids[0], ids[0], ids[1]],
            vec![ids[0], ids[1], ElementId::new()],
        ] {
            let err = view.reorder_elements(&bad).unwrap_err();
            assert!(matches!(err, DesignError::InvalidOrder(_)));
            assert_eq!(view, before);
        }
    }

    #[test]
    fn test_resize_locked() {
        let mut view = View::new(ViewId::new("v"), "V", 100.0, 100.0).with_locked_dimensions(true);
        assert!(matches!(view.resize(10.0, 10.0), Err(DesignError::LockedDimensions(_))));
        view.locked_dimensions = false;
        view.resize(10.0, 20.0).expect("resize");
        assert!((view.height() - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_integrity_violation_halts_view() {
        let (mut view, _) = view_with(1);
        let dup = view.elements()[0].clone();
        let mut stack = view.elements().to_vec();
        stack.push(dup);
        view.set_elements(stack);

        let err = view.verify_integrity().unwrap_err();
        assert!(err.is_fatal());
        assert!(view.is_halted());
        assert!(matches!(
            view.add_element(shape("late")),
            Err(DesignError::ViewHalted(_))
        ));
    }
}
