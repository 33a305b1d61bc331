//! In-memory backend that records every call.
//!
//! Used headless (the CLI, tests) where no real scene graph exists. It
//! enforces the same contract a real backend would: no duplicate creates,
//! no updates or removals of unknown objects, and z-order only over live
//! objects.

use std::collections::HashMap;

use super::{ObjectKind, RenderBackend, RenderError, RenderProps, RenderResult};
use crate::element::ElementId;

/// A call received by [`RecordingBackend`].
#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    /// `create_object`.
    Create {
        /// Element id.
        id: ElementId,
        /// Object kind.
        kind: ObjectKind,
    },
    /// `update_object`, with the patched keys in sorted order.
    Update {
        /// Element id.
        id: ElementId,
        /// Patched keys.
        keys: Vec<String>,
    },
    /// `remove_object`.
    Remove {
        /// Element id.
        id: ElementId,
    },
    /// `set_z_order`.
    SetZOrder(Vec<ElementId>),
}

/// Backend keeping live objects in a map.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    objects: HashMap<ElementId, (ObjectKind, RenderProps)>,
    z_order: Vec<ElementId>,
    calls: Vec<BackendCall>,
}

impl RecordingBackend {
    /// Empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A live object's kind and current properties.
    #[must_use]
    pub fn object(&self, id: ElementId) -> Option<&(ObjectKind, RenderProps)> {
        self.objects.get(&id)
    }

    /// Number of live objects.
    #[must_use]
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Last z-order received.
    #[must_use]
    pub fn z_order(&self) -> &[ElementId] {
        &self.z_order
    }

    /// Calls received so far.
    #[must_use]
    pub fn calls(&self) -> &[BackendCall] {
        &self.calls
    }

    /// Drain the call log.
    pub fn take_calls(&mut self) -> Vec<BackendCall> {
        std::mem::take(&mut self.calls)
    }
}

impl RenderBackend for RecordingBackend {
    fn create_object(&mut self, id: ElementId, kind: ObjectKind, props: &RenderProps) -> RenderResult<()> {
        if self.objects.contains_key(&id) {
            return Err(RenderError::DuplicateObject(id.to_string()));
        }
        self.objects.insert(id, (kind, props.clone()));
        self.z_order.push(id);
        self.calls.push(BackendCall::Create { id, kind });
        Ok(())
    }

    fn update_object(&mut self, id: ElementId, patch: &RenderProps) -> RenderResult<()> {
        let (_, props) = self
            .objects
            .get_mut(&id)
            .ok_or_else(|| RenderError::MissingObject(id.to_string()))?;
        for (key, value) in patch {
            if value.is_null() {
                props.remove(key);
            } else {
                props.insert(key.clone(), value.clone());
            }
        }
        let mut keys: Vec<String> = patch.keys().cloned().collect();
        keys.sort();
        self.calls.push(BackendCall::Update { id, keys });
        Ok(())
    }

    fn remove_object(&mut self, id: ElementId) -> RenderResult<()> {
        if self.objects.remove(&id).is_none() {
            return Err(RenderError::MissingObject(id.to_string()));
        }
        self.z_order.retain(|&e| e != id);
        self.calls.push(BackendCall::Remove { id });
        Ok(())
    }

    fn set_z_order(&mut self, ids: &[ElementId]) -> RenderResult<()> {
        if let Some(unknown) = ids.iter().find(|id| !self.objects.contains_key(id)) {
            return Err(RenderError::Backend {
                operation: "set_z_order",
                reason: format!("unknown object {unknown}"),
            });
        }
        self.z_order = ids.to_vec();
        self.calls.push(BackendCall::SetZOrder(ids.to_vec()));
        Ok(())
    }
}
