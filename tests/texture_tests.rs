//! Texture slot resolution through the public load entry: material
//! references, overlay keys and on-disk naming conventions.

mod common;

use assimport::meta::ModelMeta;
use assimport::scene::SceneMaterial;
use assimport::AssParser;
use common::{node, scene, MockVfs};

#[test]
fn unit_texture_convention_fills_the_slots() {
    let graph = scene(node("base"));
    let vfs = MockVfs::new(&["unittextures/tank.dds", "unittextures/tank2.dds"]);

    let model =
        AssParser::load_from_scene("objects3d/tank.gltf", graph, &ModelMeta::default(), &vfs);

    assert_eq!(model.tex1, "unittextures/tank.dds");
    assert_eq!(model.tex2, "unittextures/tank2.dds");
}

#[test]
fn non_empty_overlay_tex1_wins_over_material_and_disk() {
    let mut graph = scene(node("base"));
    graph.materials.push(SceneMaterial {
        diffuse_texture: "material.png".to_string(),
        ..Default::default()
    });
    let vfs = MockVfs::new(&["unittextures/tank.dds", "unittextures/override.dds"]);

    let meta = ModelMeta::from_json_str(r#"{ "tex1": "override.dds" }"#).unwrap();
    let model = AssParser::load_from_scene("objects3d/tank.gltf", graph, &meta, &vfs);

    assert_eq!(model.tex1, "unittextures/override.dds");
}

#[test]
fn material_reference_beats_the_naming_convention() {
    let mut graph = scene(node("base"));
    graph.materials.push(SceneMaterial {
        diffuse_texture: "skin.png".to_string(),
        ..Default::default()
    });
    let vfs = MockVfs::new(&["objects3d/skin.png", "unittextures/tank.dds"]);

    let model =
        AssParser::load_from_scene("objects3d/tank.gltf", graph, &ModelMeta::default(), &vfs);

    // resolved against the model's own directory
    assert_eq!(model.tex1, "objects3d/skin.png");
    // slot 2 still comes from the convention search
    assert_eq!(model.tex2, "");
}

#[test]
fn unresolved_slots_stay_empty() {
    let graph = scene(node("base"));
    let vfs = MockVfs::default();

    let model =
        AssParser::load_from_scene("objects3d/tank.gltf", graph, &ModelMeta::default(), &vfs);

    assert_eq!(model.tex1, "");
    assert_eq!(model.tex2, "");
    assert!(model.flip_tex_y);
    assert!(model.invert_tex_alpha);
}

#[test]
fn overlay_flags_reach_the_model() {
    let graph = scene(node("base"));
    let meta =
        ModelMeta::from_json_str(r#"{ "fliptextures": false, "invertteamcolor": false }"#).unwrap();

    let model = AssParser::load_from_scene("objects3d/tank.gltf", graph, &meta, &MockVfs::default());

    assert!(!model.flip_tex_y);
    assert!(!model.invert_tex_alpha);
}
