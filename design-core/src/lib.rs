//! # Design Core
//!
//! Design state engine for in-browser product customization editors.
//! Compiles to WASM for the browser shell; runs headless everywhere else.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                 DesignEngine                │
//! ├─────────────────────────────────────────────┤
//! │  Product Model   │  Control Binder          │
//! │  - Views         │  - Static control table  │
//! │  - Elements      │  - Clamp / normalise     │
//! │  - Z-order       │  - Reflect to toolbar    │
//! ├─────────────────────────────────────────────┤
//! │  History         │  Render Binder           │
//! │  - Snapshots     │  - Live object cache     │
//! │  - Coalescing    │  - Curved text layout    │
//! ├─────────────────────────────────────────────┤
//! │  Serializer      │  DesignStore             │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Quick start
//!
//! ```
//! use design_core::{
//!     DesignEngine, ElementPatch, ElementVariant, EngineConfig, RecordingBackend, Selection,
//! };
//!
//! let mut engine = DesignEngine::new(RecordingBackend::new(), EngineConfig::default())?;
//! let view = engine.active_view_id().clone();
//! let id = engine.add_element(
//!     &view,
//!     ElementVariant::Text,
//!     &ElementPatch::new().with("text", "Hi").with("fontSize", 12),
//! )?;
//! engine.apply_control(&Selection::single(id), "fontSize", &serde_json::json!(40))?;
//! let json = engine.to_json()?;
//! engine.load_json(&json)?;
//! # Ok::<(), design_core::DesignError>(())
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod control;
pub mod element;
pub mod engine;
pub mod error;
pub mod geometry;
pub mod history;
pub mod product;
pub mod render;
pub mod schema;
pub mod selection;
pub mod store;
pub mod view;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use config::EngineConfig;
pub use control::{apply_control, controls, reflect_control, ControlDomain, ControlSpec};
pub use element::{
    clone_element, create_element, update_element, CurveMode, Element, ElementBase, ElementId,
    ElementKind, ElementPatch, ElementVariant,
};
pub use engine::{AsyncToken, DesignEngine};
pub use error::{DesignError, DesignResult};
pub use geometry::{ApproxMeasure, GlyphMeasure, GlyphPlacement, Point, Rect};
pub use history::{History, HistoryState};
pub use product::Product;
pub use render::{ObjectKind, RecordingBackend, RenderBackend, RenderBinder, RenderError};
pub use schema::{deserialize, serialize, DesignDocument, DOCUMENT_VERSION};
pub use selection::{Alignment, Selection};
#[cfg(feature = "fs")]
pub use store::DirectoryStore;
pub use store::{DesignStore, MemoryStore, StoreError};
pub use view::{LayerDirection, View, ViewId};

/// Design core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
