//! Property tests for the design model.

use design_core::element::limits;
use design_core::geometry::{layout_line, ApproxMeasure, TextArc};
use design_core::{
    apply_control, create_element, deserialize, serialize, ElementPatch, ElementVariant,
    LayerDirection, Product, View, ViewId,
};
use proptest::prelude::*;
use serde_json::{json, Value};

fn arb_title() -> impl Strategy<Value = Option<String>> {
    prop::option::of("[A-Za-z ]{0,8}")
}

fn arb_text_patch() -> impl Strategy<Value = ElementPatch> {
    (
        (
            "[A-Za-z0-9 ]{1,16}",
            -500.0f64..500.0,
            -500.0f64..500.0,
            -10.0f64..300.0,
            -1.0f64..2.0,
            -30.0f64..400.0,
            prop_oneof![Just("normal"), Just("curved"), Just("curveReverse")],
            -10.0f64..500.0,
        ),
        (-5.0f64..30.0, -5.0f64..250.0, -150.0f64..150.0),
    )
        .prop_map(|((text, x, y, font_size, opacity, angle, mode, radius), (stroke, blur, offset))| {
            ElementPatch::new()
                .with("text", text)
                .with("x", x)
                .with("y", y)
                .with("fontSize", font_size)
                .with("opacity", opacity)
                .with("angle", angle)
                .with("curve", json!({"mode": mode, "radius": radius}))
                .with("stroke", json!({"color": "#102030", "width": stroke}))
                .with(
                    "shadow",
                    json!({"color": "#000000", "blur": blur, "offsetX": offset, "offsetY": -offset}),
                )
        })
}

fn arb_image_patch() -> impl Strategy<Value = ElementPatch> {
    (
        "[a-z]{1,8}\\.(png|svg)",
        0.0f64..2000.0,
        0.0f64..2000.0,
        prop::collection::vec(
            (prop_oneof![Just("grayscale"), Just("sepia"), Just("blur")], -0.5f64..1.5),
            0..3,
        ),
        prop::option::of("[a-z]{1,6}"),
        prop::option::of(Just("#336699")),
        prop::option::of(0.0f64..30.0),
    )
        .prop_map(|(source, width, height, filters, crop, fill, stroke)| {
            let filters: Vec<Value> = filters
                .into_iter()
                .map(|(name, intensity)| json!({"name": name, "intensity": intensity}))
                .collect();
            let mut patch = ElementPatch::new()
                .with("source", source)
                .with("width", width)
                .with("height", height)
                .with("filters", filters)
                .with("cropMask", crop)
                .with("svgFill", fill);
            if let Some(width) = stroke {
                patch = patch.with("svgStroke", json!({"color": "#ffffff", "width": width}));
            }
            patch
        })
}

fn arb_shape_patch() -> impl Strategy<Value = ElementPatch> {
    (
        prop_oneof![Just("rect"), Just("ellipse")],
        0.0f64..1000.0,
        0.0f64..1000.0,
        0.0f64..5.0,
        any::<bool>(),
    )
        .prop_map(|(shape, width, height, scale, lock)| {
            ElementPatch::new()
                .with("shape", shape)
                .with("width", width)
                .with("height", height)
                .with("scaleX", scale)
                .with("lockUniScaling", lock)
        })
}

fn arb_product() -> impl Strategy<Value = Product> {
    let element = prop_oneof![
        arb_text_patch().prop_map(|p| (ElementVariant::Text, p)),
        arb_image_patch().prop_map(|p| (ElementVariant::Image, p)),
        arb_shape_patch().prop_map(|p| (ElementVariant::Shape, p)),
    ];
    // Titles are edited after creation so blank ones are kept as-is.
    let element = (element, arb_title());
    prop::collection::vec(prop::collection::vec(element, 0..6), 1..4).prop_map(|views| {
        let views = views
            .into_iter()
            .enumerate()
            .map(|(i, elements)| {
                let mut view = View::new(ViewId::new(format!("view-{i}")), format!("View {i}"), 800.0, 600.0);
                for ((variant, patch), title) in elements {
                    let mut element = create_element(variant, &patch).expect("element");
                    if let Some(title) = title {
                        element
                            .apply_patch(&ElementPatch::new().with("title", title))
                            .expect("title");
                    }
                    view.add_element(element).expect("add");
                }
                view
            })
            .collect();
        Product::from_views("Generated", views).expect("product")
    })
}

fn as_f64(value: Option<&Value>) -> f64 {
    value.and_then(Value::as_f64).expect("numeric patch value")
}

proptest! {
    #[test]
    fn prop_serialize_round_trip(product in arb_product()) {
        let restored = deserialize(serialize(&product).expect("serialize")).expect("deserialize");
        prop_assert_eq!(&restored, &product);

        let json = design_core::schema::to_json(&product).expect("json");
        let reparsed = design_core::schema::from_json(&json).expect("parse");
        prop_assert_eq!(reparsed, product);
    }

    #[test]
    fn prop_numeric_controls_clamp(value in -1.0e6f64..1.0e6) {
        let element = create_element(ElementVariant::Text, &ElementPatch::new().with("text", "x"))
            .expect("element");

        let opacity = as_f64(apply_control(&element, "opacity", &json!(value)).expect("opacity").get("opacity"));
        prop_assert!((opacity - limits::OPACITY.clamp(value)).abs() < 1e-12);

        let patch = apply_control(&element, "fontSize", &json!(value)).expect("fontSize");
        let size = as_f64(patch.get("fontSize"));
        prop_assert!((1.0..=200.0).contains(&size));
        prop_assert_eq!(size.fract(), 0.0);

        let patch = apply_control(&element, "shadowOffsetX", &json!(value)).expect("offset");
        let offset = as_f64(patch.get("shadow.offsetX"));
        prop_assert!((-100.0..=100.0).contains(&offset));
    }

    #[test]
    fn prop_curve_converges_to_flat(text in "[A-Za-z ]{1,24}", font_size in 8.0f64..72.0) {
        let flat = layout_line(&text, font_size, 0.0, &ApproxMeasure, None);
        let curved = layout_line(
            &text,
            font_size,
            0.0,
            &ApproxMeasure,
            Some(TextArc { radius: 1.0e9, reverse: false }),
        );
        prop_assert_eq!(flat.len(), curved.len());
        for (f, c) in flat.iter().zip(&curved) {
            prop_assert!((f.x - c.x).abs() < 1e-3);
            prop_assert!((f.y - c.y).abs() < 1e-3);
            prop_assert!(c.rotation.abs() < 1e-2);
        }
    }

    #[test]
    fn prop_move_layer_up_down_is_identity(len in 3usize..8, pick in 0usize..8) {
        let mut view = View::new(ViewId::new("v"), "V", 100.0, 100.0);
        for _ in 0..len {
            view.add_element(create_element(ElementVariant::Shape, &ElementPatch::new()).expect("shape"))
                .expect("add");
        }
        // Non-boundary elements only.
        let index = 1 + pick % (len - 2);
        let id = view.elements()[index].id();
        let before = view.element_ids();
        prop_assert!(view.move_layer(id, LayerDirection::Up).expect("up"));
        prop_assert!(view.move_layer(id, LayerDirection::Down).expect("down"));
        prop_assert_eq!(view.element_ids(), before);
    }
}
