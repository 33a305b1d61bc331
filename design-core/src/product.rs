//! The product: an ordered set of views and the root of serialization.

use crate::element::{Element, ElementId};
use crate::view::{View, ViewId};
use crate::{DesignError, DesignResult};

/// A customizable product. View order is page order.
///
/// Always holds at least one view, and view ids are unique.
#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    /// Product title.
    pub title: String,
    views: Vec<View>,
}

impl Product {
    /// Create a product with its first view.
    #[must_use]
    pub fn new(title: impl Into<String>, first: View) -> Self {
        Self {
            title: title.into(),
            views: vec![first],
        }
    }

    /// Build from a list of views.
    ///
    /// # Errors
    ///
    /// Returns [`DesignError::Validation`] if `views` is empty or has
    /// duplicate ids.
    pub fn from_views(title: impl Into<String>, views: Vec<View>) -> DesignResult<Self> {
        let mut product = Self {
            title: title.into(),
            views: Vec::with_capacity(views.len()),
        };
        for view in views {
            product.add_view(view)?;
        }
        if product.views.is_empty() {
            return Err(DesignError::Validation(
                "a product needs at least one view".to_string(),
            ));
        }
        Ok(product)
    }

    /// Views in page order.
    #[must_use]
    pub fn views(&self) -> &[View] {
        &self.views
    }

    /// View ids in page order.
    #[must_use]
    pub fn view_ids(&self) -> Vec<ViewId> {
        self.views.iter().map(|v| v.id().clone()).collect()
    }

    /// The first view.
    #[must_use]
    pub fn first_view(&self) -> &View {
        // Invariant: never empty.
        &self.views[0]
    }

    /// Get a view by id.
    #[must_use]
    pub fn view(&self, id: &ViewId) -> Option<&View> {
        self.views.iter().find(|v| v.id() == id)
    }

    /// Get a mutable view by id.
    pub fn view_mut(&mut self, id: &ViewId) -> Option<&mut View> {
        self.views.iter_mut().find(|v| v.id() == id)
    }

    /// Get a mutable view by id or fail.
    ///
    /// # Errors
    ///
    /// Returns [`DesignError::NotFound`] if the view does not exist.
    pub fn require_view_mut(&mut self, id: &ViewId) -> DesignResult<&mut View> {
        self.view_mut(id)
            .ok_or_else(|| DesignError::NotFound(format!("view {id}")))
    }

    /// Locate an element in any view.
    #[must_use]
    pub fn find_element(&self, id: ElementId) -> Option<(&View, &Element)> {
        self.views
            .iter()
            .find_map(|v| v.get(id).map(|e| (v, e)))
    }

    /// Total number of elements across all views.
    #[must_use]
    pub fn element_count(&self) -> usize {
        self.views.iter().map(View::len).sum()
    }

    /// Append a view as the last page.
    ///
    /// # Errors
    ///
    /// Returns [`DesignError::Validation`] on a duplicate view id.
    pub fn add_view(&mut self, view: View) -> DesignResult<usize> {
        if self.view(view.id()).is_some() {
            return Err(DesignError::Validation(format!(
                "view {} already exists",
                view.id()
            )));
        }
        self.views.push(view);
        Ok(self.views.len() - 1)
    }

    /// Remove a view.
    ///
    /// # Errors
    ///
    /// Returns [`DesignError::NotFound`] if absent, or
    /// [`DesignError::Validation`] when it is the only view.
    pub fn remove_view(&mut self, id: &ViewId) -> DesignResult<View> {
        let index = self
            .views
            .iter()
            .position(|v| v.id() == id)
            .ok_or_else(|| DesignError::NotFound(format!("view {id}")))?;
        if self.views.len() == 1 {
            return Err(DesignError::Validation(
                "cannot remove the last view".to_string(),
            ));
        }
        Ok(self.views.remove(index))
    }

    /// Reorder pages.
    ///
    /// # Errors
    ///
    /// Returns [`DesignError::InvalidOrder`] unless `order` is a permutation
    /// of the current view ids.
    pub fn reorder_views(&mut self, order: &[ViewId]) -> DesignResult<()> {
        if order.len() != self.views.len() {
            return Err(DesignError::InvalidOrder(format!(
                "expected {} view ids, got {}",
                self.views.len(),
                order.len()
            )));
        }
        let mut slots: Vec<Option<View>> = self.views.iter().cloned().map(Some).collect();
        let mut reordered = Vec::with_capacity(order.len());
        for id in order {
            let taken = self
                .views
                .iter()
                .position(|v| v.id() == id)
                .and_then(|i| slots[i].take())
                .ok_or_else(|| {
                    DesignError::InvalidOrder(format!("unexpected or repeated view id {id}"))
                })?;
            reordered.push(taken);
        }
        self.views = reordered;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(id: &str) -> View {
        View::new(ViewId::new(id), id, 500.0, 500.0)
    }

    #[test]
    fn test_from_views_requires_one() {
        assert!(Product::from_views("Shirt", Vec::new()).is_err());
        let p = Product::from_views("Shirt", vec![view("front"), view("back")]).expect("product");
        assert_eq!(p.view_ids(), vec![ViewId::new("front"), ViewId::new("back")]);
    }

    #[test]
    fn test_duplicate_view_rejected() {
        let mut p = Product::new("Shirt", view("front"));
        assert!(matches!(p.add_view(view("front")), Err(DesignError::Validation(_))));
    }

    #[test]
    fn test_cannot_remove_last_view() {
        let mut p = Product::new("Shirt", view("front"));
        assert!(p.remove_view(&ViewId::new("front")).is_err());
        p.add_view(view("back")).expect("add");
        p.remove_view(&ViewId::new("front")).expect("remove");
        assert_eq!(p.first_view().id(), &ViewId::new("back"));
        assert!(matches!(
            p.remove_view(&ViewId::new("nope")),
            Err(DesignError::NotFound(_))
        ));
    }

    #[test]
    fn test_reorder_views() {
        let mut p = Product::from_views("Mug", vec![view("a"), view("b"), view("c")]).expect("p");
        let order = vec![ViewId::new("c"), ViewId::new("a"), ViewId::new("b")];
        p.reorder_views(&order).expect("reorder");
        assert_eq!(p.view_ids(), order);
        let before = p.clone();
        let bad = vec![ViewId::new("c"), ViewId::new("c"), ViewId::new("b")];
        assert!(matches!(p.reorder_views(&bad), Err(DesignError::InvalidOrder(_))));
        assert_eq!(p, before);
    }
}
