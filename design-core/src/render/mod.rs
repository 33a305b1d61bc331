//! Render binding: keeps the rendering backend's live objects in step with
//! the model.
//!
//! The backend is an external 2D scene graph reached only through
//! [`RenderBackend`]. [`RenderBinder`] is the sole owner of that capability;
//! every element and view mutation reaches the backend through it, so the
//! set of live objects is always a subset of the bound view's elements.

pub mod recording;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::element::{Element, ElementId, ElementKind};
use crate::geometry::{ApproxMeasure, GlyphMeasure};
use crate::view::{View, ViewId};
use crate::DesignResult;

pub use recording::{BackendCall, RecordingBackend};

/// Result type for backend operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// Errors reported by a rendering backend.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The backend has no live object for this element.
    #[error("No live object for element {0}")]
    MissingObject(String),

    /// A live object with this id already exists.
    #[error("Live object already exists for element {0}")]
    DuplicateObject(String),

    /// The backend rejected a call.
    #[error("Backend rejected {operation}: {reason}")]
    Backend {
        /// Capability that failed.
        operation: &'static str,
        /// Backend-supplied reason.
        reason: String,
    },
}

/// Kind of live object the backend creates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ObjectKind {
    /// Straight text.
    Text,
    /// Text laid out glyph by glyph along an arc.
    CurvedText,
    /// Image.
    Image,
    /// Vector shape.
    Shape,
}

/// Flat property bag sent to the backend.
pub type RenderProps = Map<String, Value>;

/// Capability the external rendering library exposes.
pub trait RenderBackend {
    /// Create a live object for an element.
    ///
    /// # Errors
    ///
    /// Returns an error if the object cannot be created.
    fn create_object(&mut self, id: ElementId, kind: ObjectKind, props: &RenderProps) -> RenderResult<()>;

    /// Push changed properties to a live object.
    ///
    /// # Errors
    ///
    /// Returns an error if the object does not exist or rejects the patch.
    fn update_object(&mut self, id: ElementId, patch: &RenderProps) -> RenderResult<()>;

    /// Dispose a live object.
    ///
    /// # Errors
    ///
    /// Returns an error if the object does not exist.
    fn remove_object(&mut self, id: ElementId) -> RenderResult<()>;

    /// Set paint order, bottom first.
    ///
    /// # Errors
    ///
    /// Returns an error if an id is unknown to the backend.
    fn set_z_order(&mut self, ids: &[ElementId]) -> RenderResult<()>;
}

/// Project an element onto backend properties.
///
/// Text gains `displayText` (after the case transform); curved text gains
/// per-glyph `glyphs` placements.
///
/// # Errors
///
/// Returns [`crate::DesignError::Serialization`] if encoding fails.
pub fn render_props(element: &Element, measure: &dyn GlyphMeasure) -> DesignResult<(ObjectKind, RenderProps)> {
    let mut props = element.properties()?;
    let kind = match &element.kind {
        ElementKind::Text(t) => {
            props.insert("displayText".to_string(), Value::from(t.display_text()));
            if t.is_curved() {
                let glyphs = serde_json::to_value(t.curved_glyphs(measure))?;
                props.insert("glyphs".to_string(), glyphs);
                ObjectKind::CurvedText
            } else {
                ObjectKind::Text
            }
        }
        ElementKind::Image(_) => ObjectKind::Image,
        ElementKind::Shape(_) => ObjectKind::Shape,
    };
    Ok((kind, props))
}

#[derive(Debug)]
struct LiveObject {
    kind: ObjectKind,
    props: RenderProps,
}

/// Synchronizes model state to a [`RenderBackend`], keyed by element id.
pub struct RenderBinder<B> {
    backend: B,
    measure: Box<dyn GlyphMeasure>,
    live: HashMap<ElementId, LiveObject>,
    order: Vec<ElementId>,
    view: Option<ViewId>,
}

impl<B: RenderBackend> RenderBinder<B> {
    /// Bind a backend, measuring text with [`ApproxMeasure`].
    #[must_use]
    pub fn new(backend: B) -> Self {
        Self::with_measure(backend, ApproxMeasure)
    }

    /// Bind a backend with real glyph metrics.
    #[must_use]
    pub fn with_measure(backend: B, measure: impl GlyphMeasure + 'static) -> Self {
        Self {
            backend,
            measure: Box::new(measure),
            live: HashMap::new(),
            order: Vec::new(),
            view: None,
        }
    }

    /// The backend.
    #[must_use]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Glyph metrics used for layout.
    #[must_use]
    pub fn measure(&self) -> &dyn GlyphMeasure {
        self.measure.as_ref()
    }

    /// The view whose elements are currently live.
    #[must_use]
    pub fn bound_view(&self) -> Option<&ViewId> {
        self.view.as_ref()
    }

    /// Live element ids in the paint order last sent to the backend.
    #[must_use]
    pub fn live_ids(&self) -> &[ElementId] {
        &self.order
    }

    /// Whether an element has a live object.
    #[must_use]
    pub fn is_live(&self, id: ElementId) -> bool {
        self.live.contains_key(&id)
    }

    /// Push an element's changed properties, creating the live object if
    /// absent. A change of object kind (e.g. entering curved mode) recreates
    /// the object. Returns whether the backend was called.
    ///
    /// # Errors
    ///
    /// Propagates backend failures.
    pub fn sync(&mut self, element: &Element) -> DesignResult<bool> {
        let id = element.id();
        let (kind, props) = render_props(element, self.measure.as_ref())?;
        match self.live.get_mut(&id) {
            Some(live) if live.kind == kind => {
                let mut patch: RenderProps = props
                    .iter()
                    .filter(|(k, v)| live.props.get(*k) != Some(*v))
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect();
                // Keys that disappeared are cleared explicitly.
                for key in live.props.keys().filter(|k| !props.contains_key(*k)) {
                    patch.insert(key.clone(), Value::Null);
                }
                if patch.is_empty() {
                    return Ok(false);
                }
                tracing::debug!(element = %id, keys = patch.len(), "update live object");
                self.backend.update_object(id, &patch)?;
                live.props = props;
            }
            Some(_) => {
                tracing::debug!(element = %id, ?kind, "recreate live object");
                self.backend.remove_object(id)?;
                self.live.remove(&id);
                self.order.retain(|&e| e != id);
                self.backend.create_object(id, kind, &props)?;
                self.live.insert(id, LiveObject { kind, props });
                self.order.push(id);
            }
            None => {
                tracing::debug!(element = %id, ?kind, "create live object");
                self.backend.create_object(id, kind, &props)?;
                self.live.insert(id, LiveObject { kind, props });
                self.order.push(id);
            }
        }
        Ok(true)
    }

    /// Dispose an element's live object. Returns whether one existed.
    ///
    /// # Errors
    ///
    /// Propagates backend failures.
    pub fn remove(&mut self, id: ElementId) -> DesignResult<bool> {
        if !self.live.contains_key(&id) {
            return Ok(false);
        }
        tracing::debug!(element = %id, "remove live object");
        self.backend.remove_object(id)?;
        self.live.remove(&id);
        self.order.retain(|&e| e != id);
        Ok(true)
    }

    /// Send the view's z-order if it differs from the last one sent.
    ///
    /// # Errors
    ///
    /// Propagates backend failures.
    pub fn sync_order(&mut self, view: &View) -> DesignResult<()> {
        let ids: Vec<ElementId> = view
            .elements()
            .iter()
            .map(Element::id)
            .filter(|id| self.live.contains_key(id))
            .collect();
        if ids != self.order {
            self.backend.set_z_order(&ids)?;
            self.order = ids;
        }
        Ok(())
    }

    /// Tear down every live object and recreate the view's elements in
    /// ascending z-order.
    ///
    /// # Errors
    ///
    /// Propagates backend failures.
    pub fn rebuild_view(&mut self, view: &View) -> DesignResult<()> {
        self.clear()?;
        tracing::info!(view = %view.id(), elements = view.len(), "rebuild view");
        for element in view.elements() {
            self.sync(element)?;
        }
        self.view = Some(view.id().clone());
        self.backend.set_z_order(&self.order)?;
        Ok(())
    }

    /// Reconcile live objects with `view` without tearing everything down:
    /// orphans are removed, the rest synced, then z-order is sent.
    ///
    /// # Errors
    ///
    /// Propagates backend failures.
    pub fn sync_view(&mut self, view: &View) -> DesignResult<()> {
        if self.view.as_ref() != Some(view.id()) {
            return self.rebuild_view(view);
        }
        let orphans: Vec<ElementId> = self
            .order
            .iter()
            .copied()
            .filter(|id| !view.contains(*id))
            .collect();
        for id in orphans {
            self.remove(id)?;
        }
        for element in view.elements() {
            self.sync(element)?;
        }
        self.sync_order(view)
    }

    /// Dispose every live object.
    ///
    /// # Errors
    ///
    /// Propagates backend failures.
    pub fn clear(&mut self) -> DesignResult<()> {
        self.view = None;
        // Entries leave the books only once the backend has dropped them.
        while let Some(&id) = self.order.first() {
            self.backend.remove_object(id)?;
            self.order.remove(0);
            self.live.remove(&id);
        }
        self.live.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{create_element, ElementPatch, ElementVariant};
    use crate::view::ViewId;
    use std::cell::Cell;
    use std::rc::Rc;

    fn text(s: &str) -> Element {
        create_element(ElementVariant::Text, &ElementPatch::new().with("text", s)).expect("text")
    }

    fn binder() -> RenderBinder<RecordingBackend> {
        RenderBinder::new(RecordingBackend::new())
    }

    #[test]
    fn test_sync_creates_then_updates_changed_keys() {
        let mut b = binder();
        let mut el = text("Hi");
        assert!(b.sync(&el).expect("create"));
        assert!(!b.sync(&el).expect("unchanged"));

        el.apply_patch(&ElementPatch::new().with("opacity", 0.5)).expect("patch");
        b.sync(&el).expect("update");
        match b.backend().calls().last() {
            Some(BackendCall::Update { keys, .. }) => assert_eq!(keys, &vec!["opacity".to_string()]),
            other => panic!("expected update, got {other:?}"),
        }
    }

    #[test]
    fn test_curve_mode_recreates_object() {
        let mut b = binder();
        let mut el = text("Curvy");
        b.sync(&el).expect("create");
        el.apply_patch(&ElementPatch::new().with("curve.mode", "curved"))
            .expect("patch");
        b.sync(&el).expect("recreate");
        let obj = b.backend().object(el.id()).expect("live");
        assert_eq!(obj.0, ObjectKind::CurvedText);
        assert!(obj.1.contains_key("glyphs"));
    }

    /// Delegates to a recording backend, failing on demand.
    struct FlakyBackend {
        inner: RecordingBackend,
        fail_create: Rc<Cell<bool>>,
        fail_remove: Rc<Cell<bool>>,
    }

    impl RenderBackend for FlakyBackend {
        fn create_object(&mut self, id: ElementId, kind: ObjectKind, props: &RenderProps) -> RenderResult<()> {
            if self.fail_create.get() {
                return Err(RenderError::Backend {
                    operation: "create",
                    reason: "out of memory".to_string(),
                });
            }
            self.inner.create_object(id, kind, props)
        }

        fn update_object(&mut self, id: ElementId, patch: &RenderProps) -> RenderResult<()> {
            self.inner.update_object(id, patch)
        }

        fn remove_object(&mut self, id: ElementId) -> RenderResult<()> {
            if self.fail_remove.get() {
                return Err(RenderError::Backend {
                    operation: "remove",
                    reason: "busy".to_string(),
                });
            }
            self.inner.remove_object(id)
        }

        fn set_z_order(&mut self, ids: &[ElementId]) -> RenderResult<()> {
            self.inner.set_z_order(ids)
        }
    }

    fn flaky() -> (RenderBinder<FlakyBackend>, Rc<Cell<bool>>, Rc<Cell<bool>>) {
        let fail_create = Rc::new(Cell::new(false));
        let fail_remove = Rc::new(Cell::new(false));
        let backend = FlakyBackend {
            inner: RecordingBackend::new(),
            fail_create: Rc::clone(&fail_create),
            fail_remove: Rc::clone(&fail_remove),
        };
        (RenderBinder::new(backend), fail_create, fail_remove)
    }

    #[test]
    fn test_failed_recreate_can_be_retried() {
        let (mut b, fail_create, _) = flaky();
        let mut el = text("Curvy");
        b.sync(&el).expect("create");
        el.apply_patch(&ElementPatch::new().with("curve.mode", "curved"))
            .expect("patch");

        fail_create.set(true);
        assert!(b.sync(&el).is_err());
        assert!(!b.is_live(el.id()));
        assert!(b.live_ids().is_empty());

        fail_create.set(false);
        assert!(b.sync(&el).expect("retry"));
        let obj = b.backend().inner.object(el.id()).expect("live");
        assert_eq!(obj.0, ObjectKind::CurvedText);
        assert_eq!(b.live_ids(), &[el.id()]);
    }

    #[test]
    fn test_failed_remove_keeps_tracking_object() {
        let (mut b, _, fail_remove) = flaky();
        let el = text("stay");
        b.sync(&el).expect("create");

        fail_remove.set(true);
        assert!(b.remove(el.id()).is_err());
        assert!(b.is_live(el.id()));

        fail_remove.set(false);
        assert!(b.remove(el.id()).expect("remove"));
        assert_eq!(b.backend().inner.object_count(), 0);
    }

    #[test]
    fn test_failed_clear_unbinds_and_can_finish() {
        let mut view = View::new(ViewId::new("front"), "Front", 800.0, 600.0);
        view.add_element(text("a")).expect("add");
        view.add_element(text("b")).expect("add");
        let (mut b, _, fail_remove) = flaky();
        b.rebuild_view(&view).expect("rebuild");

        fail_remove.set(true);
        assert!(b.clear().is_err());
        assert_eq!(b.bound_view(), None);
        assert_eq!(b.live_ids().len(), 2);

        fail_remove.set(false);
        b.clear().expect("clear");
        assert!(b.live_ids().is_empty());
        assert_eq!(b.backend().inner.object_count(), 0);
    }

    #[test]
    fn test_rebuild_paints_in_model_order() {
        let mut view = View::new(ViewId::new("front"), "Front", 800.0, 600.0);
        let ids: Vec<_> = (0..3)
            .map(|i| {
                let el = text(&format!("t{i}"));
                let id = el.id();
                view.add_element(el).expect("add");
                id
            })
            .collect();
        let mut b = binder();
        b.rebuild_view(&view).expect("rebuild");
        assert_eq!(b.backend().z_order(), ids.as_slice());
        assert_eq!(b.live_ids(), ids.as_slice());
        assert_eq!(b.bound_view(), Some(&ViewId::new("front")));
    }

    #[test]
    fn test_sync_view_removes_orphans() {
        let mut view = View::new(ViewId::new("front"), "Front", 800.0, 600.0);
        let keep = text("keep");
        let drop = text("drop");
        let (keep_id, drop_id) = (keep.id(), drop.id());
        view.add_element(keep).expect("add");
        view.add_element(drop).expect("add");
        let mut b = binder();
        b.rebuild_view(&view).expect("rebuild");

        view.remove_element(drop_id).expect("remove");
        b.sync_view(&view).expect("sync view");
        assert!(!b.is_live(drop_id));
        assert!(b.backend().object(drop_id).is_none());
        assert_eq!(b.live_ids(), &[keep_id]);
    }
}
