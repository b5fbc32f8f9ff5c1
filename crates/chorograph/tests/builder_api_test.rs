//! Integration tests for the MapBuilder API
//!
//! These tests verify that the public API works end to end, from JSON text
//! to SVG output.

use chorograph::{ChorographError, MapBuilder, config::AppConfig, geometry::Size};

const TOPOLOGY: &str = r#"{
    "type": "Topology",
    "transform": {"scale": [0.5, 0.5], "translate": [100, 40]},
    "objects": {
        "regions": {"type": "GeometryCollection", "geometries": [
            {"type": "Polygon", "arcs": [[0, 1]], "id": "north", "properties": {"code": "N"}},
            {"type": "Polygon", "arcs": [[2, -1]], "id": "south", "properties": {"code": "S"}}
        ]}
    },
    "arcs": [
        [[0, 10], [20, 0]],
        [[20, 10], [0, 10], [-20, 0], [0, -10]],
        [[0, 10], [0, -10], [20, 0], [0, 10]]
    ]
}"#;

const CONFIG: &str = r##"
[data]
key_field = "code"
geo_key_field = "code"

[style]
background_color = "#fafafa"

[[layers]]
name = "regions"
type = "feature"

[[layers]]
name = "borders"
object = "regions"
type = "mesh"
filter = "interior"
"##;

fn config() -> AppConfig {
    toml::from_str(CONFIG).expect("valid config")
}

#[test]
fn test_builder_api_exists() {
    let _builder = MapBuilder::default();
}

#[test]
fn test_render_with_default_layers() {
    let builder = MapBuilder::default();
    let topology = builder.parse_topology(TOPOLOGY).expect("Failed to parse topology");
    let data = builder.parse_data("[]").expect("Failed to parse data");

    let map = builder
        .build(topology, data, Size::new(400.0, 400.0))
        .expect("Failed to build map");
    assert_eq!(map.props().layers.len(), 1);

    let svg = builder.render_svg(&map).expect("Failed to render map");
    assert!(svg.contains("<svg"), "Output should contain SVG tag");
    assert!(svg.contains("</svg>"), "Output should be complete SVG");
    assert_eq!(svg.matches("<path").count(), 2);
}

#[test]
fn test_render_with_config() {
    let builder = MapBuilder::new(config());
    let topology = builder.parse_topology(TOPOLOGY).expect("Failed to parse topology");
    let data = builder
        .parse_data(r#"[{"code": "N", "value": 3}, {"code": "S", "value": 8}]"#)
        .expect("Failed to parse data");

    let map = builder
        .build(topology, data, Size::new(400.0, 200.0))
        .expect("Failed to build map");
    assert_eq!(map.render_state().keyed_data().len(), 2);

    let svg = builder.render_svg(&map).expect("Failed to render map");
    assert!(svg.contains(r#"data-layer="borders""#));
    assert!(svg.contains(r#"data-key="N""#));
    assert!(svg.contains("<rect"));
}

#[test]
fn test_export_to_file() {
    let dir = std::env::temp_dir().join(format!("chorograph-builder-{}", std::process::id()));
    std::fs::create_dir_all(&dir).expect("Failed to create output directory");
    let path = dir.join("map.svg");

    let builder = MapBuilder::new(config());
    let topology = builder.parse_topology(TOPOLOGY).expect("Failed to parse topology");
    let map = builder
        .build(topology, builder.parse_data("[]").unwrap(), Size::new(100.0, 100.0))
        .expect("Failed to build map");

    builder.export_svg(&map, &path).expect("Failed to export map");
    let written = std::fs::read_to_string(&path).expect("Failed to read output");
    assert!(written.starts_with("<svg"));

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_parse_errors() {
    let builder = MapBuilder::default();

    assert!(matches!(
        builder.parse_topology("{\"type\": \"FeatureCollection\"}"),
        Err(ChorographError::Topology(_))
    ));
    assert!(matches!(
        builder.parse_topology("not json"),
        Err(ChorographError::Topology(_))
    ));
    assert!(matches!(
        builder.parse_data("{\"id\": 1}"),
        Err(ChorographError::InvalidArgument(_))
    ));

    let err = builder.parse_data("[{\"id\": 1,").unwrap_err();
    assert!(matches!(err, ChorographError::Data(_)));
    assert!(std::error::Error::source(&err).is_some());
}

#[test]
fn test_unknown_layer_object() {
    let config: AppConfig = toml::from_str(
        r#"
        [[layers]]
        name = "lakes"
        type = "feature"
        "#,
    )
    .expect("valid config");

    let builder = MapBuilder::new(config);
    let topology = builder.parse_topology(TOPOLOGY).unwrap();
    let result = builder.build(topology, builder.parse_data("[]").unwrap(), Size::new(10.0, 10.0));
    assert!(matches!(result, Err(ChorographError::Topology(_))));
}
