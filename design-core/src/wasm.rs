//! WebAssembly bindings for design-core.
//!
//! The browser shell constructs a [`WasmDesigner`] with four callbacks that
//! implement the rendering capability against its canvas library. All
//! structured values cross the boundary as JSON strings.

use std::collections::HashMap;

use js_sys::Function;
use serde::de::DeserializeOwned;
use serde_json::Value;
use wasm_bindgen::prelude::*;

use crate::element::{ElementId, ElementPatch, ElementVariant};
use crate::engine::{AsyncToken, DesignEngine};
use crate::geometry::Point;
use crate::render::{ObjectKind, RenderBackend, RenderError, RenderProps, RenderResult};
use crate::selection::{Alignment, Selection};
use crate::view::{LayerDirection, View, ViewId};
use crate::EngineConfig;

/// Initialize the design WASM module.
#[wasm_bindgen(start)]
pub fn init() {
    // Set up panic hook for better error messages
    console_error_panic_hook::set_once();
}

/// Rendering backend forwarding to JavaScript callbacks.
///
/// Callback signatures: `create(id, kind, propsJson)`,
/// `update(id, patchJson)`, `remove(id)`, `setZOrder(idsJson)`.
pub struct JsBackend {
    create: Function,
    update: Function,
    remove: Function,
    set_z_order: Function,
}

impl JsBackend {
    fn call(operation: &'static str, f: &Function, args: &[JsValue]) -> RenderResult<()> {
        let this = JsValue::NULL;
        let result = match args {
            [a] => f.call1(&this, a),
            [a, b] => f.call2(&this, a, b),
            [a, b, c] => f.call3(&this, a, b, c),
            _ => f.call0(&this),
        };
        result.map(|_| ()).map_err(|e| RenderError::Backend {
            operation,
            reason: e.as_string().unwrap_or_else(|| format!("{e:?}")),
        })
    }

    fn encode(operation: &'static str, value: &impl serde::Serialize) -> RenderResult<JsValue> {
        serde_json::to_string(value)
            .map(|s| JsValue::from_str(&s))
            .map_err(|e| RenderError::Backend {
                operation,
                reason: e.to_string(),
            })
    }
}

const fn kind_name(kind: ObjectKind) -> &'static str {
    match kind {
        ObjectKind::Text => "text",
        ObjectKind::CurvedText => "curvedText",
        ObjectKind::Image => "image",
        ObjectKind::Shape => "shape",
    }
}

impl RenderBackend for JsBackend {
    fn create_object(&mut self, id: ElementId, kind: ObjectKind, props: &RenderProps) -> RenderResult<()> {
        let props = Self::encode("create_object", props)?;
        Self::call(
            "create_object",
            &self.create,
            &[JsValue::from_str(&id.to_string()), JsValue::from_str(kind_name(kind)), props],
        )
    }

    fn update_object(&mut self, id: ElementId, patch: &RenderProps) -> RenderResult<()> {
        let patch = Self::encode("update_object", patch)?;
        Self::call(
            "update_object",
            &self.update,
            &[JsValue::from_str(&id.to_string()), patch],
        )
    }

    fn remove_object(&mut self, id: ElementId) -> RenderResult<()> {
        Self::call("remove_object", &self.remove, &[JsValue::from_str(&id.to_string())])
    }

    fn set_z_order(&mut self, ids: &[ElementId]) -> RenderResult<()> {
        let ids: Vec<String> = ids.iter().map(ToString::to_string).collect();
        let ids = Self::encode("set_z_order", &ids)?;
        Self::call("set_z_order", &self.set_z_order, &[ids])
    }
}

fn parse_tag<T: DeserializeOwned>(what: &str, tag: &str) -> Result<T, String> {
    serde_json::from_value(Value::from(tag)).map_err(|_| format!("unknown {what}: {tag}"))
}

fn parse_patch(json: &str) -> Result<ElementPatch, String> {
    let value: Value = serde_json::from_str(json).map_err(|e| e.to_string())?;
    ElementPatch::try_from(value).map_err(|e| e.to_string())
}

fn parse_id(id: &str) -> Result<ElementId, String> {
    ElementId::parse(id).map_err(|e| e.to_string())
}

/// Editor instance for WASM.
#[wasm_bindgen]
pub struct WasmDesigner {
    engine: DesignEngine<JsBackend>,
    selection: Selection,
    pending: HashMap<u32, AsyncToken>,
    next_pending: u32,
}

#[wasm_bindgen]
impl WasmDesigner {
    /// Create an editor bound to the shell's rendering callbacks.
    ///
    /// # Errors
    ///
    /// Returns an error string if the config is malformed or the initial
    /// render fails.
    #[wasm_bindgen(constructor)]
    pub fn new(
        create: Function,
        update: Function,
        remove: Function,
        set_z_order: Function,
        config_json: Option<String>,
    ) -> Result<WasmDesigner, String> {
        let config = match config_json {
            Some(json) => EngineConfig::from_json(&json).map_err(|e| e.to_string())?,
            None => EngineConfig::default(),
        };
        let backend = JsBackend {
            create,
            update,
            remove,
            set_z_order,
        };
        let engine = DesignEngine::new(backend, config).map_err(|e| e.to_string())?;
        Ok(Self {
            engine,
            selection: Selection::new(),
            pending: HashMap::new(),
            next_pending: 0,
        })
    }

    /// Id of the active view.
    #[wasm_bindgen(js_name = activeView)]
    #[must_use]
    pub fn active_view(&self) -> String {
        self.engine.active_view_id().to_string()
    }

    /// Switch the active view.
    ///
    /// # Errors
    ///
    /// Returns an error string if the view does not exist.
    #[wasm_bindgen(js_name = setActiveView)]
    pub fn set_active_view(&mut self, view: &str) -> Result<(), String> {
        self.selection.clear();
        self.engine
            .set_active_view(&ViewId::new(view))
            .map_err(|e| e.to_string())
    }

    /// Append a view.
    ///
    /// # Errors
    ///
    /// Returns an error string on a duplicate id.
    #[wasm_bindgen(js_name = addView)]
    pub fn add_view(&mut self, id: &str, title: &str, width: f64, height: f64) -> Result<(), String> {
        self.engine
            .add_view(View::new(ViewId::new(id), title, width, height))
            .map(|_| ())
            .map_err(|e| e.to_string())
    }

    /// Remove a view.
    ///
    /// # Errors
    ///
    /// Returns an error string if absent or the last view.
    #[wasm_bindgen(js_name = removeView)]
    pub fn remove_view(&mut self, id: &str) -> Result<(), String> {
        self.engine
            .remove_view(&ViewId::new(id))
            .map(|_| ())
            .map_err(|e| e.to_string())
    }

    /// Add an element; returns its id.
    ///
    /// # Errors
    ///
    /// Returns an error string on invalid props.
    #[wasm_bindgen(js_name = addElement)]
    pub fn add_element(&mut self, view: &str, variant: &str, props_json: &str) -> Result<String, String> {
        let variant: ElementVariant = parse_tag("element type", variant)?;
        let props = parse_patch(props_json)?;
        self.engine
            .add_element(&ViewId::new(view), variant, &props)
            .map(|id| id.to_string())
            .map_err(|e| e.to_string())
    }

    /// Patch an element.
    ///
    /// # Errors
    ///
    /// Returns an error string if the element is absent or a value is
    /// mistyped.
    #[wasm_bindgen(js_name = updateElement)]
    pub fn update_element(&mut self, view: &str, id: &str, patch_json: &str) -> Result<(), String> {
        let patch = parse_patch(patch_json)?;
        self.engine
            .update_element(&ViewId::new(view), parse_id(id)?, &patch)
            .map_err(|e| e.to_string())
    }

    /// Remove an element.
    ///
    /// # Errors
    ///
    /// Returns an error string if the element is absent.
    #[wasm_bindgen(js_name = removeElement)]
    pub fn remove_element(&mut self, view: &str, id: &str) -> Result<(), String> {
        let id = parse_id(id)?;
        self.engine
            .remove_element(&ViewId::new(view), id)
            .map_err(|e| e.to_string())?;
        self.selection.remove(id);
        Ok(())
    }

    /// Duplicate an element; returns the copy's id.
    ///
    /// # Errors
    ///
    /// Returns an error string if the element is absent.
    #[wasm_bindgen(js_name = duplicateElement)]
    pub fn duplicate_element(&mut self, view: &str, id: &str) -> Result<String, String> {
        self.engine
            .duplicate_element(&ViewId::new(view), parse_id(id)?)
            .map(|id| id.to_string())
            .map_err(|e| e.to_string())
    }

    /// Move an element one step `"up"` or `"down"`.
    ///
    /// # Errors
    ///
    /// Returns an error string if the element is absent.
    #[wasm_bindgen(js_name = moveLayer)]
    pub fn move_layer(&mut self, view: &str, id: &str, direction: &str) -> Result<bool, String> {
        let direction: LayerDirection = parse_tag("direction", direction)?;
        self.engine
            .move_layer(&ViewId::new(view), parse_id(id)?, direction)
            .map_err(|e| e.to_string())
    }

    /// Move an element to the top.
    ///
    /// # Errors
    ///
    /// Returns an error string if the element is absent.
    #[wasm_bindgen(js_name = bringToFront)]
    pub fn bring_to_front(&mut self, view: &str, id: &str) -> Result<bool, String> {
        self.engine
            .bring_to_front(&ViewId::new(view), parse_id(id)?)
            .map_err(|e| e.to_string())
    }

    /// Move an element to the bottom.
    ///
    /// # Errors
    ///
    /// Returns an error string if the element is absent.
    #[wasm_bindgen(js_name = sendToBack)]
    pub fn send_to_back(&mut self, view: &str, id: &str) -> Result<bool, String> {
        self.engine
            .send_to_back(&ViewId::new(view), parse_id(id)?)
            .map_err(|e| e.to_string())
    }

    /// Replace the selection with a JSON array of element ids.
    ///
    /// # Errors
    ///
    /// Returns an error string if the array or an id is malformed.
    pub fn select(&mut self, ids_json: &str) -> Result<(), String> {
        let ids: Vec<String> = serde_json::from_str(ids_json).map_err(|e| e.to_string())?;
        let mut selection = Selection::new();
        for id in ids {
            selection.add(parse_id(&id)?);
        }
        self.selection = selection;
        Ok(())
    }

    /// Element under a point in the active view.
    #[wasm_bindgen(js_name = elementAt)]
    #[must_use]
    pub fn element_at(&self, x: f64, y: f64) -> Option<String> {
        self.engine.element_at(Point::new(x, y)).map(|id| id.to_string())
    }

    /// Apply a control value (JSON) to the selection.
    ///
    /// # Errors
    ///
    /// Returns an error string for unknown controls or invalid values.
    #[wasm_bindgen(js_name = applyControl)]
    pub fn apply_control(&mut self, name: &str, value_json: &str) -> Result<(), String> {
        let raw: Value = serde_json::from_str(value_json).map_err(|e| e.to_string())?;
        self.engine
            .apply_control(&self.selection, name, &raw)
            .map(|_| ())
            .map_err(|e| e.to_string())
    }

    /// Current value of a control for the active element, as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error string for unknown controls.
    #[wasm_bindgen(js_name = reflectControl)]
    pub fn reflect_control(&self, name: &str) -> Result<Option<String>, String> {
        self.engine
            .reflect_control(&self.selection, name)
            .map(|v| v.map(|v| v.to_string()))
            .map_err(|e| e.to_string())
    }

    /// Align the selection (`left`, `centerH`, `right`, `top`, `centerV`,
    /// `bottom`).
    ///
    /// # Errors
    ///
    /// Returns an error string for an unknown alignment.
    pub fn align(&mut self, alignment: &str) -> Result<(), String> {
        let alignment: Alignment = parse_tag("alignment", alignment)?;
        self.engine
            .align_selection(&self.selection, alignment)
            .map(|_| ())
            .map_err(|e| e.to_string())
    }

    /// Start an interactive edit.
    ///
    /// # Errors
    ///
    /// Returns an error string if one is already in progress.
    #[wasm_bindgen(js_name = beginInteraction)]
    pub fn begin_interaction(&mut self, label: &str) -> Result<(), String> {
        self.engine.begin_interaction(label).map_err(|e| e.to_string())
    }

    /// Finish an interactive edit.
    ///
    /// # Errors
    ///
    /// Returns an error string if none is in progress.
    #[wasm_bindgen(js_name = endInteraction)]
    pub fn end_interaction(&mut self) -> Result<(), String> {
        self.engine.end_interaction().map_err(|e| e.to_string())
    }

    /// Undo one step.
    ///
    /// # Errors
    ///
    /// Returns an error string if re-rendering fails.
    pub fn undo(&mut self) -> Result<bool, String> {
        self.engine.undo().map_err(|e| e.to_string())
    }

    /// Redo one step.
    ///
    /// # Errors
    ///
    /// Returns an error string if re-rendering fails.
    pub fn redo(&mut self) -> Result<bool, String> {
        self.engine.redo().map_err(|e| e.to_string())
    }

    /// Whether undo is available.
    #[wasm_bindgen(js_name = canUndo)]
    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.engine.history().can_undo()
    }

    /// Whether redo is available.
    #[wasm_bindgen(js_name = canRedo)]
    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.engine.history().can_redo()
    }

    /// Reserve a slot for an element whose asset is loading; returns a
    /// handle for [`WasmDesigner::complete_async_add`].
    ///
    /// # Errors
    ///
    /// Returns an error string if the view does not exist.
    #[wasm_bindgen(js_name = beginAsyncAdd)]
    pub fn begin_async_add(&mut self, view: &str) -> Result<u32, String> {
        let token = self
            .engine
            .begin_async_add(&ViewId::new(view))
            .map_err(|e| e.to_string())?;
        let handle = self.next_pending;
        self.next_pending = self.next_pending.wrapping_add(1);
        self.pending.insert(handle, token);
        Ok(handle)
    }

    /// Finish an async add; returns the new id, or `undefined` if the add
    /// was superseded.
    ///
    /// # Errors
    ///
    /// Returns an error string for an unknown handle or invalid props.
    #[wasm_bindgen(js_name = completeAsyncAdd)]
    pub fn complete_async_add(&mut self, handle: u32, variant: &str, props_json: &str) -> Result<Option<String>, String> {
        let token = self
            .pending
            .remove(&handle)
            .ok_or_else(|| format!("unknown async handle {handle}"))?;
        let variant: ElementVariant = parse_tag("element type", variant)?;
        let props = parse_patch(props_json)?;
        self.engine
            .complete_async_add(&token, variant, &props)
            .map(|id| id.map(|id| id.to_string()))
            .map_err(|e| e.to_string())
    }

    /// Apply a late patch; returns `false` if the element is gone.
    ///
    /// # Errors
    ///
    /// Returns an error string for a mistyped value.
    #[wasm_bindgen(js_name = applyAsyncPatch)]
    pub fn apply_async_patch(&mut self, id: &str, patch_json: &str) -> Result<bool, String> {
        let patch = parse_patch(patch_json)?;
        self.engine
            .apply_async_patch(parse_id(id)?, &patch)
            .map_err(|e| e.to_string())
    }

    /// Serialize the design.
    ///
    /// # Errors
    ///
    /// Returns an error string if encoding fails.
    #[wasm_bindgen(js_name = toJson)]
    pub fn to_json(&self) -> Result<String, String> {
        self.engine.to_json().map_err(|e| e.to_string())
    }

    /// Replace the design with a saved document. The current design is
    /// kept if loading fails.
    ///
    /// # Errors
    ///
    /// Returns an error string if the document is invalid.
    #[wasm_bindgen(js_name = loadJson)]
    pub fn load_json(&mut self, json: &str) -> Result<(), String> {
        self.engine.load_json(json).map_err(|e| e.to_string())?;
        self.selection.clear();
        self.pending.clear();
        Ok(())
    }
}
