//! Integration tests for conduit-config.
//!
//! These tests go through the filesystem: save, load, build and compile.

use conduit_config::{ConfigError, GraphDescription, IoOp, NodeDescription, ValidationError};
use tempfile::TempDir;

fn send_bus() -> GraphDescription {
    GraphDescription::new("send bus")
        .with_root("master")
        .with_node(NodeDescription::new("guitar").with_output("out"))
        .with_node(
            NodeDescription::new("amp")
                .with_delay(64)
                .with_input("in")
                .with_output("out"),
        )
        .with_node(
            NodeDescription::new("reverb")
                .with_delay(256)
                .with_input("in")
                .with_output("wet"),
        )
        .with_node(
            NodeDescription::new("master")
                .with_input("dry")
                .with_input("wet")
                .with_output("out"),
        )
        .with_connection("guitar.out", "amp.in")
        .with_connection("amp.out", "reverb.in")
        .with_connection("amp.out", "master.dry")
        .with_connection("reverb.wet", "master.wet")
}

#[test]
fn save_load_build_compile() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("send_bus.toml");

    send_bus().save(&path).unwrap();
    assert!(path.exists());

    let loaded = GraphDescription::load(&path).unwrap();
    assert_eq!(loaded, send_bus());

    let built = loaded.build().unwrap();
    let schedule = built.compile().unwrap();
    assert_eq!(schedule.len(), 4);
    assert_eq!(schedule.total_latency(), 320);
    assert_eq!(schedule.compensation_count(), 1);
}

#[test]
fn load_missing_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("absent.toml");
    match GraphDescription::load(&path) {
        Err(ConfigError::Io { op: IoOp::Read, path: p, .. }) => assert_eq!(p, path),
        other => panic!("expected a read error, got {other:?}"),
    }
}

#[test]
fn load_malformed_toml() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.toml");
    std::fs::write(&path, "[[nodes]\nname = ").unwrap();
    assert!(matches!(
        GraphDescription::load(&path),
        Err(ConfigError::TomlParse(_))
    ));
}

#[test]
fn hand_written_file_with_mistakes() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("typos.toml");
    std::fs::write(
        &path,
        r#"
name = "typos"
root = "mastr"

[[nodes]]
name = "osc"
outputs = ["out"]

[[nodes]]
name = "filter"
inputs = ["in"]
outputs = ["out"]

[[connections]]
from = "osc.output"
to = "filter.in"
"#,
    )
    .unwrap();

    let desc = GraphDescription::load(&path).unwrap();
    assert_eq!(
        desc.issues(),
        vec![
            ValidationError::UnknownOutput {
                node: "osc".into(),
                port: "output".into()
            },
            ValidationError::UnknownRoot("mastr".into()),
        ]
    );
    let err = desc.build().unwrap_err();
    assert!(err.to_string().contains("root node 'mastr' does not exist"));
}

#[test]
fn root_override_selects_subgraph() {
    let mut desc = send_bus();
    desc.root = Some("amp".into());
    let built = desc.build().unwrap();
    let schedule = built.compile().unwrap();
    let names: Vec<_> = schedule
        .order()
        .filter_map(|id| built.node_name(id))
        .collect();
    assert_eq!(names, vec!["guitar", "amp"]);
}
