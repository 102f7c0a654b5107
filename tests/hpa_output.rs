//! Project document layout.

use primexport::export::{DocumentModel, NodeBase, NodeMetadata, NodeRecord};
use primexport::host::{LocalFs, OutputFs};
use primexport::hpa::{build_document, read_snapshot, render_document, snapshot_bytes, DocumentHeader, XmlElement};
use primexport::scene::{FlexibleParams, LightParams, SceneObject, SculptParams, PCODE_TREE_NEW};
use primexport::util::{BBox3f, Vec3};
use uuid::Uuid;

fn header() -> DocumentHeader {
    DocumentHeader {
        name: "yard".into(),
        date: "2026-10-17 12:00:00".into(),
        software: "primexport test".into(),
        platform: "Second Life".into(),
        grid: "Test & Grid".into(),
        bounds: BBox3f::new(Vec3::new(-1.0, -1.0, 0.0), Vec3::new(3.0, 1.0, 2.0)),
    }
}

fn names(el: &XmlElement) -> Vec<&str> {
    el.elements().map(|c| c.name.as_str()).collect()
}

fn document(objects: &[SceneObject]) -> DocumentModel {
    let mut doc = DocumentModel::new();
    let ls = doc.begin_linkset(objects[0].id);
    for obj in objects {
        doc.push_node(ls, NodeRecord::new(NodeBase::capture(obj)));
    }
    doc
}

#[test]
fn test_project_header_order() {
    let doc = document(&[SceneObject::volume(Uuid::from_u128(1), 1)]);
    let project = build_document(&header(), &doc, "tga");
    assert_eq!(
        names(&project),
        vec!["schema", "name", "date", "software", "platform", "grid", "group"]
    );
    let group = project.child("group").unwrap();
    assert_eq!(names(group), vec!["max", "min", "center", "linkset"]);
    assert_eq!(group.child("center").unwrap().attribute("x"), Some("1.00000"));
    assert_eq!(group.child("min").unwrap().attribute("y"), Some("-1.00000"));

    let text = render_document(&header(), &doc, "tga");
    assert!(text.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<project>"));
    assert!(text.contains("<grid>Test &amp; Grid</grid>"));
}

#[test]
fn test_prim_child_order() {
    let mut obj = SceneObject::volume(Uuid::from_u128(1), 1);
    obj.flags.physical = true;
    obj.flexible = Some(FlexibleParams::default());
    obj.light = Some(LightParams::default());

    let mut doc = document(&[obj]);
    doc.set_metadata(
        &Uuid::from_u128(1),
        NodeMetadata { name: "Crate".into(), description: "wooden]]>crate".into(), ..Default::default() },
    );

    let project = build_document(&header(), &doc, "tga");
    let prim = project.child("group").unwrap().child("linkset").unwrap().child("box").unwrap();
    assert_eq!(
        names(prim),
        vec![
            "name", "description", "position", "size", "rotation", "physical", "top_shear", "taper",
            "path_cut", "twist", "flexible", "light", "texture", "inventory",
        ]
    );
    assert_eq!(prim.child("description").unwrap().text(), "wooden]]>crate");
    assert_eq!(prim.child("light").unwrap().child("color").unwrap().attribute("r"), Some("255"));
    assert_eq!(prim.child("flexible").unwrap().child("softness").unwrap().attribute("val"), Some("2.00000"));

    let text = render_document(&header(), &doc, "tga");
    assert!(text.contains("<![CDATA[wooden]]]]><![CDATA[>crate]]>"));
}

#[test]
fn test_sculpt_keeps_shape_block() {
    let map = Uuid::from_u128(77);
    let mut obj = SceneObject::volume(Uuid::from_u128(1), 1);
    obj.sculpt = Some(SculptParams { texture: map, sculpt_type: 1 });

    let doc = document(&[obj]);
    let project = build_document(&header(), &doc, "png");
    let prim = project.child("group").unwrap().child("linkset").unwrap().child("sculpt").unwrap();
    assert!(prim.child("path_cut").is_some());
    assert_eq!(prim.child("topology").unwrap().attribute("val"), Some("1"));
    assert_eq!(prim.child("sculptmap_file").unwrap().text(), format!("{}.png", map));
    assert_eq!(prim.child("sculptmap_uuid").unwrap().text(), map.to_string());
}

#[test]
fn test_tree_has_type_and_linear_shape_block() {
    let mut obj = SceneObject::volume(Uuid::from_u128(1), 1);
    obj.pcode = PCODE_TREE_NEW;
    obj.state = 3;

    let doc = document(&[obj]);
    let project = build_document(&header(), &doc, "tga");
    let prim = project.child("group").unwrap().child("linkset").unwrap().child("tree").unwrap();
    assert_eq!(names(prim)[0], "type");
    assert_eq!(prim.child("type").unwrap().attribute("val"), Some("3"));
    assert!(prim.child("name").is_none());
    assert_eq!(
        names(prim),
        vec!["type", "position", "size", "rotation", "top_shear", "path_cut", "twist", "texture", "inventory"]
    );
}

#[test]
fn test_linksets_keep_submission_order() {
    let mut doc = DocumentModel::new();
    for root in [5u128, 2] {
        let ls = doc.begin_linkset(Uuid::from_u128(root));
        let mut obj = SceneObject::volume(Uuid::from_u128(root), root as u32);
        obj.position = Vec3::splat(root as f32);
        doc.push_node(ls, NodeRecord::new(NodeBase::capture(&obj)));
    }
    let project = build_document(&header(), &doc, "tga");
    let xs: Vec<_> = project
        .child("group")
        .unwrap()
        .children_named("linkset")
        .map(|ls| ls.child("box").unwrap().child("position").unwrap().attribute("x").unwrap().to_string())
        .collect();
    assert_eq!(xs, vec!["5.00000", "2.00000"]);
}

#[test]
fn test_plain_snapshot_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("yard.json");
    let mut doc = document(&[SceneObject::volume(Uuid::from_u128(1), 1)]);
    doc.set_metadata(&Uuid::from_u128(1), NodeMetadata { name: "Bench".into(), ..Default::default() });

    let bytes = snapshot_bytes(&header(), &doc, false).unwrap();
    LocalFs.write_file(&path, &bytes).unwrap();

    let snapshot = read_snapshot(&std::fs::read(&path).unwrap()).unwrap();
    assert_eq!(snapshot.name, "yard");
    assert_eq!(snapshot.software, "primexport test");
    let node = snapshot.document.get(&Uuid::from_u128(1)).unwrap();
    assert_eq!(node.metadata.as_ref().unwrap().name, "Bench");
}
