//! Maps a [`DocumentModel`] to the project document.
//!
//! Every real number is written with five decimals. Values live in
//! attributes of small child elements (`<position x=".." y=".." z=".." />`,
//! `<phantom val="true" />`), names and descriptions in CDATA.

use crate::export::{DocumentModel, InventoryEntry, NodeRecord};
use crate::scene::{FlexibleParams, LightParams, SculptParams, TextureEntry};
use crate::shape::{classify, PrimShape, ShapeBlock, ShapeInput};
use crate::util::{channel_u8, fixed5, BBox3f, Quat, Vec3};

use super::xml::{render, XmlElement};

/// Document format version.
pub const SCHEMA_VERSION: &str = "1.0";

/// Header fields of the project element.
#[derive(Clone, Debug, PartialEq)]
pub struct DocumentHeader {
    pub name: String,
    pub date: String,
    pub software: String,
    pub platform: String,
    pub grid: String,
    pub bounds: BBox3f,
}

/// Build the whole document tree.
pub fn build_document(header: &DocumentHeader, doc: &DocumentModel, image_ext: &str) -> XmlElement {
    let mut project = XmlElement::new("project");
    project.push(XmlElement::text_element("schema", SCHEMA_VERSION));
    project.push(XmlElement::text_element("name", header.name.as_str()));
    project.push(XmlElement::text_element("date", header.date.as_str()));
    project.push(XmlElement::text_element("software", header.software.as_str()));
    project.push(XmlElement::text_element("platform", header.platform.as_str()));
    project.push(XmlElement::text_element("grid", header.grid.as_str()));

    let mut group = XmlElement::new("group");
    let bounds = header.bounds;
    let (min, max) = if bounds.is_empty() { (Vec3::ZERO, Vec3::ZERO) } else { (bounds.min, bounds.max) };
    group.push(xyz("max", max));
    group.push(xyz("min", min));
    group.push(xyz("center", bounds.center()));

    for linkset in doc.linksets() {
        let mut ls = XmlElement::new("linkset");
        for node in &linkset.nodes {
            ls.push(prim_element(node, image_ext));
        }
        group.push(ls);
    }
    project.push(group);
    project
}

/// Render the document to text.
pub fn render_document(header: &DocumentHeader, doc: &DocumentModel, image_ext: &str) -> String {
    render(&build_document(header, doc, image_ext))
}

/// One prim element.
pub fn prim_element(node: &NodeRecord, image_ext: &str) -> XmlElement {
    let base = &node.base;
    let mut prim = XmlElement::new(base.shape.tag());

    match base.shape {
        PrimShape::Tree { species } | PrimShape::Grass { species } => {
            prim.push(val("type", species.to_string()));
        }
        PrimShape::Volume(_) | PrimShape::Sculpt => {}
    }

    if let Some(md) = &node.metadata {
        prim.push(XmlElement::cdata_element("name", md.name.as_str()));
        prim.push(XmlElement::cdata_element("description", md.description.as_str()));
    }

    prim.push(xyz("position", base.position));
    prim.push(xyz("size", base.scale));
    prim.push(quat("rotation", base.rotation));

    if base.flags.phantom {
        prim.push(val("phantom", "true"));
    }
    if base.flags.physical {
        prim.push(val("physical", "true"));
    }

    // Sculpts keep the block of the shape their parameters describe.
    let block = match base.shape {
        PrimShape::Volume(kind) => ShapeBlock::derive(kind, &base.volume),
        PrimShape::Sculpt => ShapeBlock::derive(classify(&ShapeInput::from_volume(&base.volume)), &base.volume),
        PrimShape::Tree { .. } | PrimShape::Grass { .. } => ShapeBlock::foliage(&base.volume),
    };
    push_shape_block(&mut prim, &block);

    if let Some(flex) = &base.flexible {
        prim.push(flexible_element(flex));
    }
    if let Some(light) = &base.light {
        prim.push(light_element(light));
    }
    if let Some(sculpt) = &base.sculpt {
        push_sculpt(&mut prim, sculpt, image_ext);
    }

    let mut texture = XmlElement::new("texture");
    for (i, te) in base.textures.iter().enumerate() {
        texture.push(face_element(i, te, image_ext));
    }
    prim.push(texture);

    let mut inventory = XmlElement::new("inventory");
    for item in node.inventory.iter().flatten() {
        inventory.push(item_element(item));
    }
    prim.push(inventory);

    prim
}

fn push_shape_block(prim: &mut XmlElement, block: &ShapeBlock) {
    if let Some(shear) = block.top_shear {
        prim.push(XmlElement::new("top_shear").attr("x", fixed5(shear.x)).attr("y", fixed5(shear.y)));
    }
    if let Some(dimple) = block.dimple {
        prim.push(range("dimple", dimple));
    }
    if let Some(taper) = block.taper {
        prim.push(XmlElement::new("taper").attr("x", fixed5(taper.x)).attr("y", fixed5(taper.y)));
    }
    if let Some(c) = &block.circular {
        prim.push(XmlElement::new("hole_size").attr("x", fixed5(c.hole_size.x)).attr("y", fixed5(c.hole_size.y)));
        prim.push(range("profile_cut", c.profile_cut));
        prim.push(val("skew", fixed5(c.skew)));
        prim.push(val("radius_offset", fixed5(c.radius_offset)));
        prim.push(val("revolutions", fixed5(c.revolutions)));
    }
    prim.push(range("path_cut", block.path_cut));
    prim.push(range("twist", block.twist));
    if let Some(hollow) = block.hollow {
        prim.push(
            XmlElement::new("hollow")
                .attr("amount", fixed5(hollow.amount))
                .attr("shape", hollow.shape.code().to_string()),
        );
    }
}

fn flexible_element(flex: &FlexibleParams) -> XmlElement {
    XmlElement::new("flexible")
        .with(val("softness", fixed5(flex.softness as f32)))
        .with(val("gravity", fixed5(flex.gravity)))
        .with(val("drag", fixed5(flex.drag)))
        .with(val("wind", fixed5(flex.wind)))
        .with(val("tension", fixed5(flex.tension)))
        .with(xyz("force", flex.force))
}

fn light_element(light: &LightParams) -> XmlElement {
    let c = light.color;
    XmlElement::new("light")
        .with(
            XmlElement::new("color")
                .attr("r", channel_u8(c.x).to_string())
                .attr("g", channel_u8(c.y).to_string())
                .attr("b", channel_u8(c.z).to_string()),
        )
        .with(val("intensity", fixed5(c.w)))
        .with(val("radius", fixed5(light.radius)))
        .with(val("falloff", fixed5(light.falloff)))
}

fn push_sculpt(prim: &mut XmlElement, sculpt: &SculptParams, image_ext: &str) {
    let id = sculpt.texture.to_string();
    prim.push(val("topology", sculpt.sculpt_type.to_string()));
    prim.push(XmlElement::text_element("sculptmap_file", format!("{}.{}", id, image_ext)));
    prim.push(XmlElement::text_element("sculptmap_uuid", id));
}

fn face_element(index: usize, te: &TextureEntry, image_ext: &str) -> XmlElement {
    let id = te.image.to_string();
    let c = te.color;
    let transparency = ((1.0 - c.w) * 100.0).clamp(0.0, 100.0) as u32;

    let mut face = XmlElement::new("face")
        .attr("id", index.to_string())
        .with(XmlElement::new("tile").attr("u", fixed5(te.scale_s)).attr("v", fixed5(te.scale_t)))
        .with(XmlElement::new("offset").attr("u", fixed5(te.offset_s)).attr("v", fixed5(te.offset_t)))
        .with(val_named("rotation", "w", fixed5(te.rotation.to_degrees())))
        .with(XmlElement::cdata_element("image_file", format!("{}.{}", id, image_ext)))
        .with(XmlElement::text_element("image_uuid", id))
        .with(
            XmlElement::new("color")
                .attr("r", channel_u8(c.x).to_string())
                .attr("g", channel_u8(c.y).to_string())
                .attr("b", channel_u8(c.z).to_string()),
        )
        .with(val("transparency", transparency.to_string()))
        .with(val("glow", fixed5(te.glow)));

    // Importers expect all three once any is set.
    if te.has_material_flags() {
        face.push(val("fullbright", if te.fullbright { "true" } else { "false" }));
        face.push(val("shine", te.shiny.to_string()));
        face.push(val("bump", te.bump.to_string()));
    }
    face
}

fn item_element(item: &InventoryEntry) -> XmlElement {
    XmlElement::new("item")
        .with(XmlElement::text_element("description", item.description.as_str()))
        .with(XmlElement::text_element("item_id", item.item_id.to_string()))
        .with(XmlElement::text_element("name", item.name.as_str()))
        .with(XmlElement::text_element("type", item.asset_type.lookup()))
}

fn xyz(name: &str, v: Vec3) -> XmlElement {
    XmlElement::new(name).attr("x", fixed5(v.x)).attr("y", fixed5(v.y)).attr("z", fixed5(v.z))
}

fn quat(name: &str, q: Quat) -> XmlElement {
    XmlElement::new(name)
        .attr("x", fixed5(q.x))
        .attr("y", fixed5(q.y))
        .attr("z", fixed5(q.z))
        .attr("w", fixed5(q.w))
}

fn range(name: &str, (begin, end): (f32, f32)) -> XmlElement {
    XmlElement::new(name).attr("begin", fixed5(begin)).attr("end", fixed5(end))
}

fn val(name: &str, value: impl Into<String>) -> XmlElement {
    val_named(name, "val", value)
}

fn val_named(name: &str, key: &str, value: impl Into<String>) -> XmlElement {
    XmlElement::new(name).attr(key, value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::{NodeBase, NodeMetadata};
    use crate::scene::volume::*;
    use crate::scene::{AssetType, SceneObject, PCODE_LEGACY_GRASS};
    use crate::util::Vec4;
    use uuid::Uuid;

    fn header() -> DocumentHeader {
        DocumentHeader {
            name: "house".into(),
            date: "2026-10-17".into(),
            software: "primexport test".into(),
            platform: "Second Life".into(),
            grid: "Test Grid".into(),
            bounds: BBox3f::new(Vec3::ZERO, Vec3::new(2.0, 2.0, 2.0)),
        }
    }

    fn node(object: &SceneObject) -> NodeRecord {
        NodeRecord::new(NodeBase::capture(object))
    }

    #[test]
    fn test_header_and_group() {
        let doc = DocumentModel::new();
        let root = build_document(&header(), &doc, "tga");
        assert_eq!(root.name, "project");
        assert_eq!(root.child("schema").unwrap().text(), "1.0");
        assert_eq!(root.child("grid").unwrap().text(), "Test Grid");
        let group = root.child("group").unwrap();
        assert_eq!(group.child("center").unwrap().attribute("x"), Some("1.00000"));
        assert_eq!(group.child("max").unwrap().attribute("z"), Some("2.00000"));
    }

    #[test]
    fn test_box_prim_fields() {
        let mut obj = SceneObject::volume(Uuid::from_u128(1), 1);
        obj.position = Vec3::new(1.0, 2.0, 3.0);
        obj.flags.phantom = true;
        obj.volume.profile.hollow = 0.25;
        obj.volume.profile.curve = PROFILE_SQUARE | HOLE_CIRCLE;
        obj.textures[0].color = Vec4::new(1.0, 0.5, 0.0, 0.75);
        let mut rec = node(&obj);
        rec.metadata = Some(NodeMetadata { name: "Door".into(), ..Default::default() });

        let prim = prim_element(&rec, "tga");
        assert_eq!(prim.name, "box");
        assert_eq!(prim.child("name").unwrap().text(), "Door");
        assert_eq!(prim.child("position").unwrap().attribute("y"), Some("2.00000"));
        assert_eq!(prim.child("phantom").unwrap().attribute("val"), Some("true"));
        assert!(prim.child("physical").is_none());
        assert!(prim.child("top_shear").is_some());
        assert!(prim.child("dimple").is_none());
        assert_eq!(prim.child("taper").unwrap().attribute("x"), Some("0.00000"));
        let hollow = prim.child("hollow").unwrap();
        assert_eq!(hollow.attribute("amount"), Some("25.00000"));
        assert_eq!(hollow.attribute("shape"), Some("3"));

        let face = prim.child("texture").unwrap().child("face").unwrap();
        assert_eq!(face.attribute("id"), Some("0"));
        assert_eq!(face.child("color").unwrap().attribute("g"), Some("127"));
        assert_eq!(face.child("transparency").unwrap().attribute("val"), Some("25"));
        assert!(face.child("fullbright").is_none());
        assert_eq!(face.child("image_file").unwrap().text(), format!("{}.tga", Uuid::nil()));
        assert!(prim.child("inventory").unwrap().children.is_empty());
    }

    #[test]
    fn test_material_flags_emit_all_three() {
        let mut obj = SceneObject::volume(Uuid::from_u128(1), 1);
        obj.textures[0].shiny = 2;
        let prim = prim_element(&node(&obj), "png");
        let face = prim.child("texture").unwrap().child("face").unwrap();
        assert_eq!(face.child("fullbright").unwrap().attribute("val"), Some("false"));
        assert_eq!(face.child("shine").unwrap().attribute("val"), Some("2"));
        assert_eq!(face.child("bump").unwrap().attribute("val"), Some("0"));
    }

    #[test]
    fn test_torus_block_and_sphere_dimple() {
        let mut obj = SceneObject::volume(Uuid::from_u128(1), 1);
        obj.volume = VolumeParams::with_curves(PROFILE_CIRCLE, PATH_CIRCLE);
        obj.volume.path.scale.y = 0.25;
        let prim = prim_element(&node(&obj), "tga");
        assert_eq!(prim.name, "torus");
        assert_eq!(prim.child("hole_size").unwrap().attribute("y"), Some("0.25000"));
        assert!(prim.child("revolutions").is_some());

        obj.volume.path.scale.y = 1.0;
        let prim = prim_element(&node(&obj), "tga");
        assert_eq!(prim.name, "sphere");
        assert!(prim.child("dimple").is_some());
        assert!(prim.child("top_shear").is_none());
        assert!(prim.child("taper").is_none());
    }

    #[test]
    fn test_grass_and_inventory() {
        let mut obj = SceneObject::volume(Uuid::from_u128(1), 1);
        obj.pcode = PCODE_LEGACY_GRASS;
        obj.state = 4;
        let mut rec = node(&obj);
        rec.inventory = Some(vec![InventoryEntry {
            item_id: Uuid::from_u128(5),
            name: "Readme".into(),
            description: "a & b".into(),
            asset_type: AssetType::Notecard,
            file: None,
        }]);
        let prim = prim_element(&rec, "tga");
        assert_eq!(prim.name, "grass");
        assert_eq!(prim.child("type").unwrap().attribute("val"), Some("4"));
        assert!(prim.child("path_cut").is_some());
        assert!(prim.child("taper").is_none());
        let item = prim.child("inventory").unwrap().child("item").unwrap();
        assert_eq!(item.child("type").unwrap().text(), "notecard");

        let xml = render(&prim);
        assert!(xml.contains("<description>a &amp; b</description>"));
    }
}
