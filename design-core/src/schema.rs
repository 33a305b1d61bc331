//! Persisted document format.
//!
//! A [`DesignDocument`] is a value-only projection of a [`Product`]: every
//! element is fully expanded and carries no reference to live rendering
//! objects. Loading runs each element through the same defaulting and
//! clamping as [`create_element`](crate::element::create_element), so older
//! documents lacking newer optional fields load cleanly.
//!
//! ```json
//! {
//!   "version": 1,
//!   "title": "T-Shirt",
//!   "views": [{
//!     "id": "front", "title": "Front", "width": 800, "height": 600,
//!     "backgroundColor": "#ffffff",
//!     "elements": [{ "id": "…", "type": "text", "text": "Hi", "fontSize": 12 }]
//!   }]
//! }
//! ```

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::element::{create_element_with_id, ElementId, ElementPatch, ElementVariant};
use crate::product::Product;
use crate::view::{View, ViewId};
use crate::{DesignError, DesignResult};

/// Current document version. Documents with any other version are rejected.
pub const DOCUMENT_VERSION: u32 = 1;

/// Serialized product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DesignDocument {
    /// Format version.
    pub version: u32,
    /// Product title.
    #[serde(default)]
    pub title: String,
    /// Views in page order.
    pub views: Vec<ViewRecord>,
}

/// Serialized view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewRecord {
    /// View id.
    pub id: String,
    /// Display title.
    #[serde(default)]
    pub title: String,
    /// Width.
    pub width: f64,
    /// Height.
    pub height: f64,
    /// Background colour.
    #[serde(default = "ViewRecord::default_background")]
    pub background_color: String,
    /// Whether resizing is rejected.
    #[serde(default)]
    pub locked_dimensions: bool,
    /// Elements, bottom first.
    #[serde(default)]
    pub elements: Vec<ElementRecord>,
}

impl ViewRecord {
    fn default_background() -> String {
        "#ffffff".to_string()
    }
}

/// Serialized element: id, variant tag and every other property inline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementRecord {
    /// Element id (UUID).
    pub id: String,
    /// Variant tag.
    #[serde(rename = "type")]
    pub variant: ElementVariant,
    /// Remaining properties, camelCase.
    #[serde(flatten)]
    pub properties: Map<String, Value>,
}

/// Project a product onto its persisted form.
///
/// # Errors
///
/// Returns [`DesignError::Serialization`] if an element cannot be encoded.
pub fn serialize(product: &Product) -> DesignResult<DesignDocument> {
    let views = product
        .views()
        .iter()
        .map(|view| {
            let elements = view
                .elements()
                .iter()
                .map(|element| {
                    Ok(ElementRecord {
                        id: element.id().to_string(),
                        variant: element.variant(),
                        properties: element.properties()?,
                    })
                })
                .collect::<DesignResult<Vec<_>>>()?;
            Ok(ViewRecord {
                id: view.id().to_string(),
                title: view.title.clone(),
                width: view.width(),
                height: view.height(),
                background_color: view.background_color.clone(),
                locked_dimensions: view.locked_dimensions,
                elements,
            })
        })
        .collect::<DesignResult<Vec<_>>>()?;
    Ok(DesignDocument {
        version: DOCUMENT_VERSION,
        title: product.title.clone(),
        views,
    })
}

/// Rebuild a product from its persisted form.
///
/// # Errors
///
/// Returns [`DesignError::Schema`] on an unknown version, a document with no
/// views, malformed or duplicate ids, or an element missing a required field.
pub fn deserialize(document: DesignDocument) -> DesignResult<Product> {
    if document.version != DOCUMENT_VERSION {
        return Err(DesignError::Schema(format!(
            "unsupported document version {} (expected {DOCUMENT_VERSION})",
            document.version
        )));
    }
    if document.views.is_empty() {
        return Err(DesignError::Schema("document has no views".to_string()));
    }

    let mut seen = HashSet::new();
    let mut views = Vec::with_capacity(document.views.len());
    for record in document.views {
        if record.id.is_empty() {
            return Err(DesignError::Schema("view with empty id".to_string()));
        }
        let mut view = View::new(ViewId::new(record.id), record.title, record.width, record.height)
            .with_background(record.background_color)
            .with_locked_dimensions(record.locked_dimensions);

        let mut elements = Vec::with_capacity(record.elements.len());
        for element in record.elements {
            let id = ElementId::parse(&element.id)
                .map_err(|e| schema_error(&format!("view {}", view.id()), &e))?;
            if !seen.insert(id) {
                return Err(DesignError::Schema(format!("duplicate element id {id}")));
            }
            let patch = ElementPatch::from(element.properties);
            let element = create_element_with_id(element.variant, id, &patch)
                .map_err(|e| schema_error(&format!("element {id}"), &e))?;
            elements.push(element);
        }
        view.set_elements(elements);
        view.verify_integrity()
            .map_err(|e| schema_error(&format!("view {}", view.id()), &e))?;
        views.push(view);
    }

    Product::from_views(document.title, views).map_err(|e| schema_error("product", &e))
}

/// Serialize to pretty-printed JSON.
///
/// # Errors
///
/// Returns [`DesignError::Serialization`] if encoding fails.
pub fn to_json(product: &Product) -> DesignResult<String> {
    Ok(serde_json::to_string_pretty(&serialize(product)?)?)
}

/// Parse JSON into a document without building a product.
///
/// # Errors
///
/// Returns [`DesignError::Schema`] if the text is not a well-formed
/// document.
pub fn parse_document(json: &str) -> DesignResult<DesignDocument> {
    serde_json::from_str(json).map_err(|e| DesignError::Schema(e.to_string()))
}

/// Parse JSON and rebuild the product.
///
/// # Errors
///
/// See [`parse_document`] and [`deserialize`].
pub fn from_json(json: &str) -> DesignResult<Product> {
    deserialize(parse_document(json)?)
}

fn schema_error(context: &str, err: &DesignError) -> DesignError {
    DesignError::Schema(format!("{context}: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::create_element;
    use serde_json::json;

    fn sample() -> Product {
        let mut front = View::new(ViewId::new("front"), "Front", 800.0, 600.0);
        front
            .add_element(
                create_element(
                    ElementVariant::Text,
                    &ElementPatch::new()
                        .with("text", "Hi")
                        .with("fontSize", 12)
                        .with("curve", json!({"mode": "curved", "radius": 120})),
                )
                .expect("text"),
            )
            .expect("add");
        front
            .add_element(
                create_element(
                    ElementVariant::Image,
                    &ElementPatch::new()
                        .with("source", "https://cdn.example/logo.svg")
                        .with("svgStroke", json!({"color": "#112233", "width": 2})),
                )
                .expect("image"),
            )
            .expect("add");
        let back = View::new(ViewId::new("back"), "Back", 800.0, 600.0).with_locked_dimensions(true);
        Product::from_views("Shirt", vec![front, back]).expect("product")
    }

    #[test]
    fn test_round_trip_preserves_product() {
        let product = sample();
        let restored = deserialize(serialize(&product).expect("serialize")).expect("deserialize");
        assert_eq!(restored, product);
    }

    #[test]
    fn test_json_round_trip_preserves_product() {
        let product = sample();
        let json = to_json(&product).expect("json");
        assert_eq!(from_json(&json).expect("parse"), product);
    }

    #[test]
    fn test_unknown_version_is_schema_error() {
        let mut doc = serialize(&sample()).expect("serialize");
        doc.version = 99;
        assert!(matches!(deserialize(doc), Err(DesignError::Schema(_))));
    }

    #[test]
    fn test_missing_required_field_is_schema_error() {
        let json = r#"{"version":1,"views":[{"id":"front","width":10,"height":10,
            "elements":[{"id":"6f1c0e2a-8a55-4c52-b1de-5a1c0a6b3f10","type":"text"}]}]}"#;
        assert!(matches!(from_json(json), Err(DesignError::Schema(_))));

        let json = r#"{"views":[]}"#;
        assert!(matches!(from_json(json), Err(DesignError::Schema(_))));
    }

    #[test]
    fn test_load_clamps_and_defaults() {
        let json = r#"{"version":1,"title":"Old","views":[{"id":"front","width":10,"height":10,
            "elements":[{"id":"6f1c0e2a-8a55-4c52-b1de-5a1c0a6b3f10","type":"text",
                         "text":"Legacy","opacity":4,"fontSize":0}]}]}"#;
        let product = from_json(json).expect("load");
        let view = product.first_view();
        assert_eq!(view.background_color, "#ffffff");
        let el = &view.elements()[0];
        assert!((el.base.opacity - 1.0).abs() < f64::EPSILON);
        let text = el.as_text().expect("text");
        assert!((text.font_size - 1.0).abs() < f64::EPSILON);
        assert_eq!(text.font_family, "Arial");
    }

    #[test]
    fn test_duplicate_ids_are_rejected() {
        let json = r#"{"version":1,"views":[
            {"id":"a","width":10,"height":10,"elements":[
                {"id":"6f1c0e2a-8a55-4c52-b1de-5a1c0a6b3f10","type":"shape"}]},
            {"id":"b","width":10,"height":10,"elements":[
                {"id":"6f1c0e2a-8a55-4c52-b1de-5a1c0a6b3f10","type":"shape"}]}]}"#;
        assert!(matches!(from_json(json), Err(DesignError::Schema(_))));

        let json = r#"{"version":1,"views":[
            {"id":"a","width":10,"height":10},{"id":"a","width":10,"height":10}]}"#;
        assert!(matches!(from_json(json), Err(DesignError::Schema(_))));
    }

    #[test]
    fn test_document_never_exposes_live_objects() {
        let doc = serialize(&sample()).expect("serialize");
        let value = serde_json::to_value(&doc).expect("value");
        let el = &value["views"][0]["elements"][0];
        assert_eq!(el["type"], json!("text"));
        assert!(el.get("glyphs").is_none());
        assert!(el.get("displayText").is_none());
    }
}
