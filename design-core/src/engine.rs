//! The design state engine.
//!
//! [`DesignEngine`] owns the product graph, the undo history and the render
//! binder. Every public mutation follows the same path: change the model,
//! check the view's invariants, push the change to the backend through the
//! binder, then record a checkpoint. Errors other than invariant violations
//! leave the model untouched.

use std::time::Instant;

use serde_json::Value;

use crate::config::EngineConfig;
use crate::control;
use crate::element::{clone_element, create_element, Element, ElementId, ElementPatch, ElementVariant};
use crate::geometry::{GlyphMeasure, Point};
use crate::history::{CoalesceKey, History};
use crate::product::Product;
use crate::render::{RenderBackend, RenderBinder};
use crate::schema::{self, DesignDocument};
use crate::selection::{Alignment, Selection};
use crate::store::DesignStore;
use crate::view::{LayerDirection, View, ViewId};
use crate::{DesignError, DesignResult};

/// Handle for an element add whose asset is still loading.
///
/// The completion is dropped if, after the token was issued, the editor
/// switched or removed a view, loaded another document or moved through
/// history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AsyncToken {
    seq: u64,
    view: ViewId,
    generation: u64,
}

impl AsyncToken {
    /// View the element will be added to.
    #[must_use]
    pub fn view(&self) -> &ViewId {
        &self.view
    }
}

/// Editor core: model, history and render binding.
pub struct DesignEngine<B: RenderBackend> {
    config: EngineConfig,
    product: Product,
    history: History,
    binder: RenderBinder<B>,
    active: ViewId,
    generation: u64,
    next_token: u64,
}

impl<B: RenderBackend> DesignEngine<B> {
    /// Start with a fresh product holding one empty view from `config`.
    ///
    /// # Errors
    ///
    /// Propagates backend failures from the initial render.
    pub fn new(backend: B, config: EngineConfig) -> DesignResult<Self> {
        let view = View::new(
            ViewId::new(config.default_view_id.clone()),
            config.default_view_title.clone(),
            config.default_view_width,
            config.default_view_height,
        );
        let product = Product::new(config.product_title.clone(), view);
        Self::with_binder(RenderBinder::new(backend), config, product)
    }

    /// Start from an existing product and a prepared binder.
    ///
    /// # Errors
    ///
    /// Propagates backend failures from the initial render.
    pub fn with_binder(binder: RenderBinder<B>, config: EngineConfig, product: Product) -> DesignResult<Self> {
        let history = History::new(&product, config.history_depth, config.coalesce_window());
        let active = product.first_view().id().clone();
        let mut engine = Self {
            config,
            product,
            history,
            binder,
            active,
            generation: 0,
            next_token: 0,
        };
        engine.binder.rebuild_view(engine.product.first_view())?;
        Ok(engine)
    }

    /// Engine configuration.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The product.
    #[must_use]
    pub fn product(&self) -> &Product {
        &self.product
    }

    /// Undo history.
    #[must_use]
    pub fn history(&self) -> &History {
        &self.history
    }

    /// The render binder.
    #[must_use]
    pub fn binder(&self) -> &RenderBinder<B> {
        &self.binder
    }

    /// The rendering backend.
    #[must_use]
    pub fn backend(&self) -> &B {
        self.binder.backend()
    }

    /// Glyph metrics used for text layout and hit testing.
    #[must_use]
    pub fn measure(&self) -> &dyn GlyphMeasure {
        self.binder.measure()
    }

    /// Id of the view being edited.
    #[must_use]
    pub fn active_view_id(&self) -> &ViewId {
        &self.active
    }

    /// The view being edited.
    #[must_use]
    pub fn active_view(&self) -> &View {
        self.product
            .view(&self.active)
            .unwrap_or_else(|| self.product.first_view())
    }

    /// Look up an element in a view.
    ///
    /// # Errors
    ///
    /// Returns [`DesignError::NotFound`] if the view or element is absent.
    pub fn element(&self, view: &ViewId, id: ElementId) -> DesignResult<&Element> {
        self.view(view)?
            .get(id)
            .ok_or_else(|| DesignError::NotFound(format!("element {id} in view {view}")))
    }

    fn view(&self, id: &ViewId) -> DesignResult<&View> {
        self.product
            .view(id)
            .ok_or_else(|| DesignError::NotFound(format!("view {id}")))
    }

    /// Validate the view, push touched elements to the backend if the view
    /// is live, then checkpoint.
    fn commit(&mut self, view: &ViewId, touched: &[ElementId], label: &str) -> DesignResult<()> {
        self.sync(view, touched)?;
        self.history.checkpoint(&self.product, label);
        Ok(())
    }

    fn sync(&mut self, view: &ViewId, touched: &[ElementId]) -> DesignResult<()> {
        self.product.require_view_mut(view)?.verify_integrity()?;
        if self.binder.bound_view() != Some(view) {
            return Ok(());
        }
        let target = self
            .product
            .view(view)
            .ok_or_else(|| DesignError::NotFound(format!("view {view}")))?;
        for id in touched {
            match target.get(*id) {
                Some(element) => {
                    self.binder.sync(element)?;
                }
                None => {
                    self.binder.remove(*id)?;
                }
            }
        }
        self.binder.sync_order(target)
    }

    /// Create an element from `props` merged over the variant defaults and
    /// place it on top of `view`.
    ///
    /// # Errors
    ///
    /// - [`DesignError::Validation`] on malformed props (nothing is created).
    /// - [`DesignError::NotFound`] if the view does not exist.
    pub fn add_element(&mut self, view: &ViewId, variant: ElementVariant, props: &ElementPatch) -> DesignResult<ElementId> {
        let element = create_element(variant, props)?;
        let id = element.id();
        self.product.require_view_mut(view)?.add_element(element)?;
        tracing::debug!(%view, element = %id, variant = variant.as_str(), "element added");
        self.commit(view, &[id], &format!("add {}", variant.as_str()))?;
        Ok(id)
    }

    /// Apply a property patch to one element.
    ///
    /// # Errors
    ///
    /// [`DesignError::NotFound`] for a missing view or element,
    /// [`DesignError::Validation`] for a mistyped value (nothing changes).
    pub fn update_element(&mut self, view: &ViewId, id: ElementId, patch: &ElementPatch) -> DesignResult<()> {
        self.product
            .require_view_mut(view)?
            .update_element(id, |el| el.apply_patch(patch))?;
        self.commit(view, &[id], "update element")
    }

    /// Remove an element and dispose its live object.
    ///
    /// # Errors
    ///
    /// [`DesignError::NotFound`] if absent (the view is unchanged),
    /// [`DesignError::Validation`] if the element is not removable.
    pub fn remove_element(&mut self, view: &ViewId, id: ElementId) -> DesignResult<Element> {
        if !self.element(view, id)?.base.removable {
            return Err(DesignError::Validation(format!("element {id} is not removable")));
        }
        let removed = self.product.require_view_mut(view)?.remove_element(id)?;
        self.commit(view, &[id], "remove element")?;
        Ok(removed)
    }

    /// Copy an element with a fresh id, offset by the configured distance
    /// and placed directly above the source.
    ///
    /// # Errors
    ///
    /// [`DesignError::NotFound`] if the source is absent.
    pub fn duplicate_element(&mut self, view: &ViewId, id: ElementId) -> DesignResult<ElementId> {
        let offset = self.config.duplicate_offset;
        let target = self.product.require_view_mut(view)?;
        let index = target
            .index_of(id)
            .ok_or_else(|| DesignError::NotFound(format!("element {id} in view {view}")))?;
        let mut copy = target.get(id).map(clone_element).ok_or_else(|| DesignError::NotFound(format!("element {id}")))?;
        copy.base.x += offset;
        copy.base.y += offset;
        let copy_id = copy.id();
        target.insert_element(index + 1, copy)?;
        self.commit(view, &[copy_id], "duplicate element")?;
        Ok(copy_id)
    }

    /// Swap an element with its neighbour. A move past either end is a
    /// no-op and records nothing; returns whether the order changed.
    ///
    /// # Errors
    ///
    /// [`DesignError::NotFound`] if the element is absent.
    pub fn move_layer(&mut self, view: &ViewId, id: ElementId, direction: LayerDirection) -> DesignResult<bool> {
        let moved = self.product.require_view_mut(view)?.move_layer(id, direction)?;
        if moved {
            self.commit(view, &[], "move layer")?;
        }
        Ok(moved)
    }

    /// Move an element to the top of the stack.
    ///
    /// # Errors
    ///
    /// [`DesignError::NotFound`] if the element is absent.
    pub fn bring_to_front(&mut self, view: &ViewId, id: ElementId) -> DesignResult<bool> {
        let moved = self.product.require_view_mut(view)?.bring_to_front(id)?;
        if moved {
            self.commit(view, &[], "bring to front")?;
        }
        Ok(moved)
    }

    /// Move an element to the bottom of the stack.
    ///
    /// # Errors
    ///
    /// [`DesignError::NotFound`] if the element is absent.
    pub fn send_to_back(&mut self, view: &ViewId, id: ElementId) -> DesignResult<bool> {
        let moved = self.product.require_view_mut(view)?.send_to_back(id)?;
        if moved {
            self.commit(view, &[], "send to back")?;
        }
        Ok(moved)
    }

    /// Replace a view's z-order (bottom first).
    ///
    /// # Errors
    ///
    /// [`DesignError::InvalidOrder`] unless `order` is a permutation of the
    /// view's element ids.
    pub fn reorder_elements(&mut self, view: &ViewId, order: &[ElementId]) -> DesignResult<()> {
        self.product.require_view_mut(view)?.reorder_elements(order)?;
        self.commit(view, &[], "reorder elements")
    }

    /// Resize a view.
    ///
    /// # Errors
    ///
    /// [`DesignError::LockedDimensions`] if the view's size is locked.
    pub fn resize_view(&mut self, view: &ViewId, width: f64, height: f64) -> DesignResult<()> {
        self.product.require_view_mut(view)?.resize(width, height)?;
        self.commit(view, &[], "resize view")
    }

    /// Append a view as the last page.
    ///
    /// # Errors
    ///
    /// [`DesignError::Validation`] on a duplicate view id.
    pub fn add_view(&mut self, view: View) -> DesignResult<ViewId> {
        let id = view.id().clone();
        self.product.add_view(view)?;
        tracing::info!(view = %id, "view added");
        self.commit(&id, &[], "add view")?;
        Ok(id)
    }

    /// Remove a view. If it was active, the first remaining view becomes
    /// active. Outstanding async adds are superseded.
    ///
    /// # Errors
    ///
    /// [`DesignError::NotFound`] if absent, [`DesignError::Validation`] for
    /// the last view.
    pub fn remove_view(&mut self, id: &ViewId) -> DesignResult<View> {
        let removed = self.product.remove_view(id)?;
        tracing::info!(view = %id, "view removed");
        if *id == self.active {
            let first = self.product.first_view().id().clone();
            self.activate(first)?;
        } else {
            // A view re-added under the same id must not receive old adds.
            self.generation += 1;
        }
        self.history.checkpoint(&self.product, "remove view");
        Ok(removed)
    }

    /// Reorder pages.
    ///
    /// # Errors
    ///
    /// [`DesignError::InvalidOrder`] unless `order` is a permutation of the
    /// view ids.
    pub fn reorder_views(&mut self, order: &[ViewId]) -> DesignResult<()> {
        self.product.reorder_views(order)?;
        self.history.checkpoint(&self.product, "reorder views");
        Ok(())
    }

    /// Switch the edited view; its elements become the live objects.
    /// Outstanding async adds are superseded.
    ///
    /// # Errors
    ///
    /// [`DesignError::NotFound`] if the view does not exist.
    pub fn set_active_view(&mut self, id: &ViewId) -> DesignResult<()> {
        self.view(id)?;
        if *id == self.active && self.binder.bound_view() == Some(id) {
            return Ok(());
        }
        self.activate(id.clone())
    }

    fn activate(&mut self, id: ViewId) -> DesignResult<()> {
        self.generation += 1;
        self.active = id;
        tracing::info!(view = %self.active, "active view changed");
        let view = self
            .product
            .view(&self.active)
            .ok_or_else(|| DesignError::NotFound(format!("view {}", self.active)))?;
        self.binder.rebuild_view(view)
    }

    /// Apply a control value to every selected element of the active view.
    /// Patches for all targets are computed before any is applied, so a bad
    /// value changes nothing. Repeated edits of the same control coalesce
    /// into one checkpoint. Returns the elements changed.
    ///
    /// # Errors
    ///
    /// See [`control::apply_control`].
    pub fn apply_control(&mut self, selection: &Selection, name: &str, raw: &Value) -> DesignResult<Vec<ElementId>> {
        let view = self.active_view();
        let mut updates = Vec::new();
        for id in selection.ids() {
            let Some(element) = view.get(*id) else {
                continue;
            };
            let patch = control::apply_control(element, name, raw)?;
            updates.push(crate::element::update_element(element, &patch)?);
        }
        if updates.is_empty() {
            // Still reject unknown controls with an empty selection.
            control::control(name).ok_or_else(|| DesignError::UnknownControl(name.to_string()))?;
            return Ok(Vec::new());
        }

        let active = self.active.clone();
        let target = self.product.require_view_mut(&active)?;
        let mut changed = Vec::with_capacity(updates.len());
        for next in updates {
            let id = next.id();
            target.update_element(id, |el| {
                *el = next;
                Ok(())
            })?;
            changed.push(id);
        }
        self.sync(&active, &changed)?;

        let key_element = selection.active().filter(|id| changed.contains(id)).unwrap_or(changed[0]);
        self.history.checkpoint_coalesced(
            &self.product,
            &format!("set {name}"),
            CoalesceKey::new(key_element, name),
            Instant::now(),
        );
        tracing::debug!(control = name, elements = changed.len(), "control applied");
        Ok(changed)
    }

    /// Current value of a control for the active selected element.
    ///
    /// # Errors
    ///
    /// [`DesignError::UnknownControl`] for an unregistered name.
    pub fn reflect_control(&self, selection: &Selection, name: &str) -> DesignResult<Option<Value>> {
        let Some(element) = selection.active().and_then(|id| self.active_view().get(id)) else {
            control::control(name).ok_or_else(|| DesignError::UnknownControl(name.to_string()))?;
            return Ok(None);
        };
        control::reflect_control(element, name)
    }

    /// Align the selected elements of the active view to its bounds.
    /// Returns the elements that moved.
    ///
    /// # Errors
    ///
    /// Propagates backend failures.
    pub fn align_selection(&mut self, selection: &Selection, alignment: Alignment) -> DesignResult<Vec<ElementId>> {
        let view = self.active_view();
        let target_bounds = view.bounds();
        let moves: Vec<(ElementId, f64, f64)> = selection
            .ids()
            .iter()
            .filter_map(|id| view.get(*id))
            .map(|el| {
                let (dx, dy) = alignment.offset(&el.bounds(self.measure()), &target_bounds);
                (el.id(), dx, dy)
            })
            .filter(|(_, dx, dy)| dx.abs() > f64::EPSILON || dy.abs() > f64::EPSILON)
            .collect();
        if moves.is_empty() {
            return Ok(Vec::new());
        }
        let active = self.active.clone();
        let target = self.product.require_view_mut(&active)?;
        for (id, dx, dy) in &moves {
            target.update_element(*id, |el| {
                el.base.x += dx;
                el.base.y += dy;
                Ok(())
            })?;
        }
        let moved: Vec<ElementId> = moves.into_iter().map(|(id, _, _)| id).collect();
        self.commit(&active, &moved, "align")?;
        Ok(moved)
    }

    /// Topmost element of the active view under a point.
    #[must_use]
    pub fn element_at(&self, point: Point) -> Option<ElementId> {
        self.active_view().element_at(point, self.measure())
    }

    /// Start an interactive edit (a slider drag, a canvas transform).
    /// Intermediate changes are not checkpointed until it ends.
    ///
    /// # Errors
    ///
    /// [`DesignError::InvalidState`] if one is already in progress.
    pub fn begin_interaction(&mut self, label: &str) -> DesignResult<()> {
        self.history.begin_recording(label)
    }

    /// Finish an interactive edit with one checkpoint.
    ///
    /// # Errors
    ///
    /// [`DesignError::InvalidState`] if none is in progress.
    pub fn end_interaction(&mut self) -> DesignResult<()> {
        self.history.end_recording(&self.product).map(|_| ())
    }

    /// Step back one checkpoint. Returns whether anything changed.
    ///
    /// # Errors
    ///
    /// Propagates backend failures while re-rendering.
    pub fn undo(&mut self) -> DesignResult<bool> {
        match self.history.undo() {
            Some(snapshot) => self.restore(snapshot).map(|()| true),
            None => Ok(false),
        }
    }

    /// Step forward one checkpoint. Returns whether anything changed.
    ///
    /// # Errors
    ///
    /// Propagates backend failures while re-rendering.
    pub fn redo(&mut self) -> DesignResult<bool> {
        match self.history.redo() {
            Some(snapshot) => self.restore(snapshot).map(|()| true),
            None => Ok(false),
        }
    }

    fn restore(&mut self, snapshot: Product) -> DesignResult<()> {
        self.product = snapshot;
        self.generation += 1;
        if self.product.view(&self.active).is_none() {
            self.active = self.product.first_view().id().clone();
        }
        let view = self
            .product
            .view(&self.active)
            .ok_or_else(|| DesignError::NotFound(format!("view {}", self.active)))?;
        self.binder.sync_view(view)
    }

    /// Issue a token for an element whose asset is still loading.
    ///
    /// # Errors
    ///
    /// [`DesignError::NotFound`] if the view does not exist.
    pub fn begin_async_add(&mut self, view: &ViewId) -> DesignResult<AsyncToken> {
        self.view(view)?;
        let token = AsyncToken {
            seq: self.next_token,
            view: view.clone(),
            generation: self.generation,
        };
        self.next_token += 1;
        tracing::debug!(%view, seq = token.seq, "async add started");
        Ok(token)
    }

    /// Complete an async add. Returns `None` (and changes nothing) if the
    /// token was superseded or its view is gone.
    ///
    /// # Errors
    ///
    /// See [`DesignEngine::add_element`].
    pub fn complete_async_add(
        &mut self,
        token: &AsyncToken,
        variant: ElementVariant,
        props: &ElementPatch,
    ) -> DesignResult<Option<ElementId>> {
        if token.generation != self.generation {
            tracing::warn!(seq = token.seq, view = %token.view, "dropping superseded async add");
            return Ok(None);
        }
        if self.product.view(&token.view).is_none() {
            tracing::warn!(seq = token.seq, view = %token.view, "dropping async add for removed view");
            return Ok(None);
        }
        self.add_element(&token.view, variant, props).map(Some)
    }

    /// Apply a patch from a slow source (e.g. an image finishing decode).
    /// Dropped, returning `false`, if the element no longer exists.
    ///
    /// # Errors
    ///
    /// [`DesignError::Validation`] for a mistyped value.
    pub fn apply_async_patch(&mut self, id: ElementId, patch: &ElementPatch) -> DesignResult<bool> {
        let Some((view, _)) = self.product.find_element(id) else {
            tracing::warn!(element = %id, "dropping late patch for removed element");
            return Ok(false);
        };
        let view = view.id().clone();
        self.update_element(&view, id, patch)?;
        Ok(true)
    }

    /// Serialize the whole product.
    ///
    /// # Errors
    ///
    /// [`DesignError::Serialization`] if encoding fails.
    pub fn save_document(&self) -> DesignResult<DesignDocument> {
        schema::serialize(&self.product)
    }

    /// Replace the design with a loaded document. History restarts from the
    /// loaded state and the first view becomes active. On error the current
    /// design and its history are left intact.
    ///
    /// # Errors
    ///
    /// [`DesignError::Schema`] if the document is invalid,
    /// [`DesignError::Render`] if the backend cannot render it.
    pub fn load_document(&mut self, document: DesignDocument) -> DesignResult<()> {
        let product = schema::deserialize(document)?;
        // Render the incoming design before touching the current one.
        if let Err(err) = self.binder.rebuild_view(product.first_view()) {
            tracing::error!(error = %err, "rendering loaded document failed; keeping current design");
            if let Some(view) = self.product.view(&self.active) {
                if let Err(restore) = self.binder.rebuild_view(view) {
                    tracing::error!(error = %restore, view = %self.active, "re-rendering current design failed");
                }
            }
            return Err(err);
        }
        self.active = product.first_view().id().clone();
        self.product = product;
        self.history.reset(&self.product);
        self.generation += 1;
        tracing::info!(
            title = %self.product.title,
            views = self.product.views().len(),
            elements = self.product.element_count(),
            view = %self.active,
            "document loaded"
        );
        Ok(())
    }

    /// Serialize to JSON text.
    ///
    /// # Errors
    ///
    /// [`DesignError::Serialization`] if encoding fails.
    pub fn to_json(&self) -> DesignResult<String> {
        schema::to_json(&self.product)
    }

    /// Load from JSON text.
    ///
    /// # Errors
    ///
    /// [`DesignError::Schema`] if the text is not a valid document.
    pub fn load_json(&mut self, json: &str) -> DesignResult<()> {
        self.load_document(schema::parse_document(json)?)
    }

    /// Save to a persistence collaborator.
    ///
    /// # Errors
    ///
    /// [`DesignError::Store`] if the store rejects the write.
    pub async fn save_to(&self, store: &dyn DesignStore, key: &str) -> DesignResult<()> {
        let json = self.to_json()?;
        store.save(key, &json).await?;
        tracing::info!(key, bytes = json.len(), "design saved");
        Ok(())
    }

    /// Load from a persistence collaborator.
    ///
    /// # Errors
    ///
    /// [`DesignError::Store`] if nothing is stored under `key`,
    /// [`DesignError::Schema`] if the stored text is invalid.
    pub async fn load_from(&mut self, store: &dyn DesignStore, key: &str) -> DesignResult<()> {
        let json = store.load(key).await?;
        self.load_json(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::RecordingBackend;

    fn engine() -> DesignEngine<RecordingBackend> {
        DesignEngine::new(RecordingBackend::new(), EngineConfig::default()).expect("engine")
    }

    fn front() -> ViewId {
        ViewId::new("front")
    }

    fn add_text(engine: &mut DesignEngine<RecordingBackend>, text: &str) -> ElementId {
        engine
            .add_element(&front(), ElementVariant::Text, &ElementPatch::new().with("text", text))
            .expect("add text")
    }

    #[test]
    fn test_add_creates_live_object() {
        let mut engine = engine();
        let id = add_text(&mut engine, "Hi");
        assert!(engine.backend().object(id).is_some());
        assert_eq!(engine.backend().z_order(), &[id]);
        assert!(engine.history().can_undo());
    }

    #[test]
    fn test_failed_add_changes_nothing() {
        let mut engine = engine();
        let err = engine
            .add_element(&front(), ElementVariant::Text, &ElementPatch::new())
            .unwrap_err();
        assert!(matches!(err, DesignError::Validation(_)));
        assert!(engine.active_view().is_empty());
        assert!(!engine.history().can_undo());
    }

    #[test]
    fn test_duplicate_sits_above_source_with_offset() {
        let mut engine = engine();
        let a = add_text(&mut engine, "a");
        let b = add_text(&mut engine, "b");
        let copy = engine.duplicate_element(&front(), a).expect("duplicate");
        assert_eq!(engine.active_view().element_ids(), vec![a, copy, b]);
        let el = engine.element(&front(), copy).expect("copy");
        assert!((el.base.x - 10.0).abs() < f64::EPSILON);
        assert_eq!(engine.backend().z_order(), &[a, copy, b]);
    }

    #[test]
    fn test_layer_noop_records_nothing() {
        let mut engine = engine();
        let a = add_text(&mut engine, "a");
        let entries = engine.history().entries().len();
        assert!(!engine.move_layer(&front(), a, LayerDirection::Up).expect("move"));
        assert_eq!(engine.history().entries().len(), entries);
    }

    #[test]
    fn test_not_removable_element_is_kept() {
        let mut engine = engine();
        let id = engine
            .add_element(
                &front(),
                ElementVariant::Shape,
                &ElementPatch::new().with("removable", false),
            )
            .expect("add");
        assert!(matches!(
            engine.remove_element(&front(), id),
            Err(DesignError::Validation(_))
        ));
        assert!(engine.active_view().contains(id));
    }

    #[test]
    fn test_control_coalesces_rapid_edits() {
        let mut engine = engine();
        let id = add_text(&mut engine, "Hi");
        let sel = Selection::single(id);
        let before = engine.history().entries().len();
        for size in [20, 22, 24, 26] {
            engine
                .apply_control(&sel, "fontSize", &Value::from(size))
                .expect("control");
        }
        assert_eq!(engine.history().entries().len(), before + 1);
        assert_eq!(
            engine.reflect_control(&sel, "fontSize").expect("reflect"),
            Some(Value::from(26.0))
        );
    }

    #[test]
    fn test_control_on_empty_selection_is_noop() {
        let mut engine = engine();
        let changed = engine
            .apply_control(&Selection::new(), "opacity", &Value::from(0.5))
            .expect("noop");
        assert!(changed.is_empty());
        assert!(matches!(
            engine.apply_control(&Selection::new(), "sparkle", &Value::from(1)),
            Err(DesignError::UnknownControl(_))
        ));
    }

    #[test]
    fn test_view_switch_rebuilds_live_objects() {
        let mut engine = engine();
        let a = add_text(&mut engine, "front text");
        let back = engine
            .add_view(View::new(ViewId::new("back"), "Back", 800.0, 600.0))
            .expect("add view");
        engine.set_active_view(&back).expect("switch");
        assert!(engine.backend().object(a).is_none());
        assert_eq!(engine.binder().bound_view(), Some(&back));

        engine.remove_view(&back).expect("remove view");
        assert_eq!(engine.active_view_id(), &front());
        assert!(engine.backend().object(a).is_some());
    }

    #[test]
    fn test_interaction_records_single_checkpoint() {
        let mut engine = engine();
        let id = add_text(&mut engine, "drag me");
        let before = engine.history().entries().len();
        engine.begin_interaction("move").expect("begin");
        for x in 1..=5 {
            engine
                .update_element(&front(), id, &ElementPatch::new().with("x", f64::from(x)))
                .expect("move");
        }
        engine.end_interaction().expect("end");
        assert_eq!(engine.history().entries().len(), before + 1);
        engine.undo().expect("undo");
        assert!(engine.element(&front(), id).expect("el").base.x.abs() < f64::EPSILON);
    }
}
