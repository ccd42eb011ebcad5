//! Recursive piece construction: one piece per scene node, with metadata
//! overrides resolved, transforms baked, sentinel nodes intercepted and
//! geometry extracted. Pieces land in a flat arena with their declared
//! parent recorded by name; linking happens in a later pass.

use std::collections::{HashMap, HashSet};

use cgmath::Vector3;
use log::{debug, error, info, warn};

use crate::math;
use crate::meta::{ModelMeta, PieceMeta};
use crate::model::{AxisMappingType, MeshMinMax, ModelVertex, Piece, PieceIndex};
use crate::scene::{SceneGraph, SceneNode};

/// Reserved node names that configure model-wide scalars instead of
/// becoming pieces. Sentinel nodes are assumed to be childless leaves.
const SENTINEL_HEIGHT: &str = "SpringHeight";
const SENTINEL_RADIUS: &str = "SpringRadius";

/// Hierarchy levels accepted before a subtree is dropped; guards the native
/// call stack against adversarial nesting.
pub(crate) const MAX_PIECE_DEPTH: usize = 64;

/// Result of the build pass: the piece arena, the name index, and any
/// model-wide scalars claimed by sentinel nodes.
pub(crate) struct BuiltPieces {
    pub pieces: Vec<Piece>,
    pub piece_map: HashMap<String, PieceIndex>,
    pub height_from_node: Option<f32>,
    pub radius_from_node: Option<f32>,
    pub mid_pos_from_node: Option<Vector3<f32>>,
}

pub(crate) fn build_pieces(
    scene: &SceneGraph,
    mesh_minmax: &[MeshMinMax],
    meta: &ModelMeta,
) -> BuiltPieces {
    let mut builder = PieceTreeBuilder {
        scene,
        mesh_minmax,
        meta,
        pieces: Vec::new(),
        piece_map: HashMap::new(),
        taken_names: HashSet::new(),
        height_from_node: None,
        radius_from_node: None,
        mid_pos_from_node: None,
    };

    builder.load_piece(&scene.root, None, 0);

    BuiltPieces {
        pieces: builder.pieces,
        piece_map: builder.piece_map,
        height_from_node: builder.height_from_node,
        radius_from_node: builder.radius_from_node,
        mid_pos_from_node: builder.mid_pos_from_node,
    }
}

/// Naming context handed down during recursion: the import-supplied name of
/// the node being descended from, and whether that node is the scene root
/// (whose piece is renamed).
struct ParentCtx<'a> {
    name: &'a str,
    is_scene_root: bool,
}

struct PieceTreeBuilder<'a> {
    scene: &'a SceneGraph,
    mesh_minmax: &'a [MeshMinMax],
    meta: &'a ModelMeta,
    pieces: Vec<Piece>,
    piece_map: HashMap<String, PieceIndex>,
    /// Names claimed so far, including names of pieces not yet inserted
    /// (descendants are inserted before their ancestors) and of discarded
    /// sentinel pieces. Keeps disambiguation collision-free.
    taken_names: HashSet<String>,
    height_from_node: Option<f32>,
    radius_from_node: Option<f32>,
    mid_pos_from_node: Option<Vector3<f32>>,
}

impl PieceTreeBuilder<'_> {
    fn load_piece(
        &mut self,
        node: &SceneNode,
        parent: Option<&ParentCtx>,
        depth: usize,
    ) -> Option<PieceIndex> {
        if depth >= MAX_PIECE_DEPTH {
            error!(
                "node '{}' exceeds the maximum hierarchy depth of {}, dropping subtree",
                node.name, MAX_PIECE_DEPTH
            );
            return None;
        }

        let mut piece = Piece::new(self.claim_name(node, parent.is_none()));

        info!(
            "converting node '{}' to piece '{}' ({} meshes)",
            node.name,
            piece.name,
            node.mesh_indices.len()
        );

        let piece_table = self.meta.piece(&piece.name);
        if self.meta.pieces.contains_key(&piece.name) {
            info!("found metadata for piece '{}'", piece.name);
        }

        self.load_piece_transforms(&mut piece, node, &piece_table);

        // union the precomputed per-mesh extents
        for &mesh_index in &node.mesh_indices {
            if let Some(minmax) = self.mesh_minmax.get(mesh_index) {
                piece.mins = math::vec_min(piece.mins, minmax.mins);
                piece.maxs = math::vec_max(piece.maxs, minmax.maxs);
            }
        }

        // sentinel nodes configure model-wide scalars and are discarded
        // instead of being pushed into the arena; their children (none, by
        // convention) are not visited
        if node.name == SENTINEL_HEIGHT {
            if self.meta.height.is_none() {
                self.height_from_node = Some(piece.offset.z);
                info!(
                    "model height of {} set by special node '{SENTINEL_HEIGHT}'",
                    piece.offset.z
                );
            }
            return None;
        }

        if node.name == SENTINEL_RADIUS {
            if self.meta.midpos.is_none() {
                let mid_pos = math::apply_transform(&piece.scale_rot_matrix, piece.offset);
                info!(
                    "model midpos of ({:.3},{:.3},{:.3}) set by special node '{SENTINEL_RADIUS}'",
                    mid_pos.x, mid_pos.y, mid_pos.z
                );
                self.mid_pos_from_node = Some(mid_pos);
            }
            if self.meta.radius.is_none() {
                let radius = if piece.maxs.x <= 0.00001 {
                    // some exporters only set the node scale
                    math::decompose_row_major(node.transform).0.x
                } else {
                    // use the transformed mesh extents
                    piece.maxs.x
                };
                info!("model radius of {radius} set by special node '{SENTINEL_RADIUS}'");
                self.radius_from_node = Some(radius);
            }
            return None;
        }

        self.load_piece_geometry(&mut piece, node);
        piece.is_empty = piece.vertices.is_empty();

        // declared parent: overlay wins, else derived from the scene tree
        if let Some(meta_parent) = piece_table.parent.as_ref() {
            piece.parent_name = meta_parent.clone();
        } else if let Some(parent) = parent {
            piece.parent_name = if parent.is_scene_root {
                // the scene root's piece gets renamed
                "root".to_string()
            } else {
                parent.name.to_string()
            };
        }

        debug!("piece '{}': parent '{}'", piece.name, piece.parent_name);

        // descendants are fully constructed and inserted before this piece
        let ctx = ParentCtx {
            name: &node.name,
            is_scene_root: parent.is_none(),
        };
        for child in &node.children {
            self.load_piece(child, Some(&ctx), depth + 1);
        }

        let index = self.pieces.len();
        self.piece_map.insert(piece.name.clone(), index);
        self.pieces.push(piece);
        Some(index)
    }

    /// Final name for a node's piece: the scene root is always "root",
    /// nameless nodes become "piece", and collisions get a two-digit
    /// zero-padded counter appended until the name is free.
    fn claim_name(&mut self, node: &SceneNode, is_scene_root: bool) -> String {
        let base = if is_scene_root {
            "root".to_string()
        } else if node.name.is_empty() {
            "piece".to_string()
        } else {
            node.name.clone()
        };

        let mut name = base.clone();
        let mut counter = 0u32;
        while self.taken_names.contains(&name) {
            name = format!("{base}{counter:02}");
            counter += 1;
        }
        self.taken_names.insert(name.clone());
        name
    }

    fn load_piece_transforms(&self, piece: &mut Piece, node: &SceneNode, table: &PieceMeta) {
        let (ai_scale, ai_rotate, ai_trans) = math::decompose_row_major(node.transform);

        debug!(
            "({}:{}) imported offset ({:.3},{:.3},{:.3}), rotate ({:.3},{:.3},{:.3},{:.3}), scale ({:.3},{:.3},{:.3})",
            self.pieces.len(), piece.name,
            ai_trans.x, ai_trans.y, ai_trans.z,
            ai_rotate.s, ai_rotate.v.x, ai_rotate.v.y, ai_rotate.v.z,
            ai_scale.x, ai_scale.y, ai_scale.z
        );

        let mut scale = table.resolved_scale(ai_scale);
        if scale.x != scale.y || scale.y != scale.z {
            // the engine does not support non-uniform scaling
            scale.y = scale.x;
            scale.z = scale.x;
        }

        let rotate = table.resolved_rotate() * math::DEG_TO_RAD;
        let offset = table.resolved_offset(ai_trans);

        // bake rotation and scale; translation stays in `offset` so the
        // per-piece transform is offset + scaleRot * p, not one fused matrix
        let rot_matrix = math::scene_matrix_to_engine(math::quat_rotation_rows(ai_rotate));
        piece.scale_rot_matrix = math::scale_columns(rot_matrix, scale);
        piece.offset = offset;

        piece.axis_map_type = match table.axis_map_type {
            None => AxisMappingType::default(),
            Some(index) => AxisMappingType::from_index(index).unwrap_or_else(|| {
                warn!(
                    "piece '{}': invalid axisMapType {index}, using default",
                    piece.name
                );
                AxisMappingType::default()
            }),
        };
        piece.rot_signs = table
            .axis_rot_signs
            .map(Vector3::from)
            .unwrap_or(Vector3::new(-1.0, -1.0, 1.0));

        let unit_scale = scale == Vector3::new(1.0, 1.0, 1.0);
        let composed = math::euler_rotation_matrix(rotate) * piece.scale_rot_matrix;
        piece.is_identity = unit_scale && math::is_identity(&composed);
    }

    fn load_piece_geometry(&self, piece: &mut Piece, node: &SceneNode) {
        for &mesh_index in &node.mesh_indices {
            let Some(mesh) = self.scene.meshes.get(mesh_index) else {
                error!(
                    "piece '{}': mesh index {mesh_index} out of range, skipping",
                    piece.name
                );
                continue;
            };

            debug!(
                "piece '{}': mesh {mesh_index} with {} vertices, {} faces",
                piece.name,
                mesh.positions.len(),
                mesh.faces.len()
            );

            piece.vertices.reserve(mesh.positions.len());
            piece.vertex_draw_indices.reserve(mesh.faces.len() * 3);

            // remaps mesh-local vertex indices to piece-global ones
            let mut mesh_vertex_mapping = Vec::with_capacity(mesh.positions.len());

            for (vertex_index, position) in mesh.positions.iter().enumerate() {
                let mut vertex = ModelVertex {
                    pos: (*position).into(),
                    ..Default::default()
                };

                if mesh.has_normals() {
                    // non-finite components stay at their zero default
                    let normal = mesh.normals[vertex_index];
                    if normal.x.is_finite() {
                        vertex.normal[0] = normal.x;
                    }
                    if normal.y.is_finite() {
                        vertex.normal[1] = normal.y;
                    }
                    if normal.z.is_finite() {
                        vertex.normal[2] = normal.z;
                    }
                }

                if mesh.has_tangents() {
                    vertex.s_tangent = mesh.tangents[vertex_index].into();
                    vertex.t_tangent = mesh.bitangents[vertex_index].into();
                }

                if mesh.has_tex_coords(0) {
                    vertex.tex_coord = mesh.tex_coords[0][vertex_index].into();
                }
                if mesh.has_tex_coords(1) {
                    piece.has_tex_coord2 = true;
                    vertex.tex_coord2 = mesh.tex_coords[1][vertex_index].into();
                }

                mesh_vertex_mapping.push(piece.vertices.len() as u32);
                piece.vertices.push(vertex);
            }

            for face in &mesh.faces {
                // the import pipeline is expected to have triangulated and
                // split mixed primitives already; lines and anything else
                // that slipped through cannot be drawn
                if face.indices.len() != 3 {
                    continue;
                }
                for &face_index in &face.indices {
                    let Some(&draw_index) = mesh_vertex_mapping.get(face_index as usize) else {
                        continue;
                    };
                    piece.vertex_draw_indices.push(draw_index);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::calculate_per_mesh_minmax;
    use crate::scene::{SceneFace, SceneMesh};

    fn scene_with_nodes(root: SceneNode) -> SceneGraph {
        SceneGraph {
            root,
            meshes: vec![],
            materials: vec![],
        }
    }

    fn build(scene: &SceneGraph, meta: &ModelMeta) -> BuiltPieces {
        let minmax = calculate_per_mesh_minmax(scene);
        build_pieces(scene, &minmax, meta)
    }

    #[test]
    fn scene_root_is_renamed_to_root() {
        let scene = scene_with_nodes(SceneNode::new("Armature"));
        let built = build(&scene, &ModelMeta::default());

        assert_eq!(built.pieces.len(), 1);
        assert_eq!(built.pieces[0].name, "root");
        assert!(built.pieces[0].parent_name.is_empty());
    }

    #[test]
    fn nameless_nodes_become_piece() {
        let mut root = SceneNode::new("whatever");
        root.children.push(SceneNode::new(""));
        let scene = scene_with_nodes(root);

        let built = build(&scene, &ModelMeta::default());
        assert!(built.piece_map.contains_key("piece"));
    }

    #[test]
    fn sibling_name_collisions_get_zero_padded_counters() {
        let mut root = SceneNode::new("top");
        root.children.push(SceneNode::new("X"));
        root.children.push(SceneNode::new("X"));
        let scene = scene_with_nodes(root);

        let built = build(&scene, &ModelMeta::default());
        assert!(built.piece_map.contains_key("X"));
        assert!(built.piece_map.contains_key("X00"));
        assert_eq!(built.pieces.len(), 3);
    }

    #[test]
    fn descendant_named_root_does_not_steal_the_root_name() {
        let mut root = SceneNode::new("top");
        root.children.push(SceneNode::new("root"));
        let scene = scene_with_nodes(root);

        let built = build(&scene, &ModelMeta::default());
        // the entry node owns "root"; the impostor gets disambiguated
        assert_eq!(built.pieces[built.piece_map["root"]].parent_name, "");
        assert!(built.piece_map.contains_key("root00"));
    }

    #[test]
    fn children_of_inner_nodes_declare_the_import_name_as_parent() {
        let mut hull = SceneNode::new("hull");
        hull.children.push(SceneNode::new("turret"));
        let mut root = SceneNode::new("base");
        root.children.push(hull);
        let scene = scene_with_nodes(root);

        let built = build(&scene, &ModelMeta::default());
        assert_eq!(built.pieces[built.piece_map["hull"]].parent_name, "root");
        assert_eq!(built.pieces[built.piece_map["turret"]].parent_name, "hull");
    }

    #[test]
    fn overlay_parent_key_wins_verbatim() {
        let mut root = SceneNode::new("base");
        root.children.push(SceneNode::new("blade"));
        let scene = scene_with_nodes(root);

        let meta = ModelMeta::from_json_str(
            r#"{ "pieces": { "blade": { "parent": "somewhere_else" } } }"#,
        )
        .unwrap();
        let built = build(&scene, &meta);
        assert_eq!(
            built.pieces[built.piece_map["blade"]].parent_name,
            "somewhere_else"
        );
    }

    #[test]
    fn non_uniform_scale_is_coerced_to_uniform() {
        let mut node = SceneNode::new("stretched");
        node.transform = [
            [2.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ];
        let mut root = SceneNode::new("base");
        root.children.push(node);
        let scene = scene_with_nodes(root);

        let built = build(&scene, &ModelMeta::default());
        let piece = &built.pieces[built.piece_map["stretched"]];
        // Y and Z forced to X: every basis column carries scale 2
        assert!((piece.scale_rot_matrix.x.x - 2.0).abs() < 1e-5);
        assert!((piece.scale_rot_matrix.y.y - 2.0).abs() < 1e-5);
        assert!((piece.scale_rot_matrix.z.z - 2.0).abs() < 1e-5);
        assert!(!piece.is_identity);
    }

    #[test]
    fn untransformed_pieces_carry_the_identity_flag() {
        let scene = scene_with_nodes(SceneNode::new("base"));
        let built = build(&scene, &ModelMeta::default());
        assert!(built.pieces[0].is_identity);
    }

    #[test]
    fn spring_height_sets_model_height_and_leaves_no_piece() {
        let mut sentinel = SceneNode::new(SENTINEL_HEIGHT);
        sentinel.transform = [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 5.0],
            [0.0, 0.0, 0.0, 1.0],
        ];
        let mut root = SceneNode::new("base");
        root.children.push(sentinel);
        let scene = scene_with_nodes(root);

        let built = build(&scene, &ModelMeta::default());
        assert_eq!(built.pieces.len(), 1);
        assert_eq!(built.height_from_node, Some(5.0));
    }

    #[test]
    fn spring_height_defers_to_an_explicit_overlay_height() {
        let mut sentinel = SceneNode::new(SENTINEL_HEIGHT);
        sentinel.transform[2][3] = 5.0;
        let mut root = SceneNode::new("base");
        root.children.push(sentinel);
        let scene = scene_with_nodes(root);

        let meta = ModelMeta::from_json_str(r#"{ "height": 40.0 }"#).unwrap();
        let built = build(&scene, &meta);
        assert_eq!(built.height_from_node, None);
    }

    #[test]
    fn spring_radius_falls_back_to_the_node_scale() {
        let mut sentinel = SceneNode::new(SENTINEL_RADIUS);
        sentinel.transform = [
            [3.0, 0.0, 0.0, 0.0],
            [0.0, 3.0, 0.0, 0.0],
            [0.0, 0.0, 3.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ];
        let mut root = SceneNode::new("base");
        root.children.push(sentinel);
        let scene = scene_with_nodes(root);

        let built = build(&scene, &ModelMeta::default());
        let radius = built.radius_from_node.unwrap();
        assert!((radius - 3.0).abs() < 1e-5);
    }

    #[test]
    fn line_faces_are_excluded_from_the_index_list() {
        let mesh = SceneMesh {
            name: "mixed".to_string(),
            positions: vec![
                cgmath::Vector3::new(0.0, 0.0, 0.0),
                cgmath::Vector3::new(1.0, 0.0, 0.0),
                cgmath::Vector3::new(0.0, 1.0, 0.0),
            ],
            faces: vec![
                SceneFace {
                    indices: vec![0, 1, 2],
                },
                SceneFace {
                    indices: vec![0, 1],
                },
                SceneFace {
                    indices: vec![2, 1, 0],
                },
            ],
            ..Default::default()
        };
        let mut root = SceneNode::new("base");
        root.mesh_indices.push(0);
        let scene = SceneGraph {
            root,
            meshes: vec![mesh],
            materials: vec![],
        };

        let built = build(&scene, &ModelMeta::default());
        let piece = &built.pieces[0];
        assert_eq!(piece.vertices.len(), 3);
        // two triangle faces survive, the line face does not
        assert_eq!(piece.vertex_draw_indices.len(), 2 * 3);
        assert!(!piece.is_empty);
    }

    #[test]
    fn nan_normal_components_stay_zeroed() {
        let mesh = SceneMesh {
            name: "broken-normals".to_string(),
            positions: vec![
                cgmath::Vector3::new(0.0, 0.0, 0.0),
                cgmath::Vector3::new(1.0, 0.0, 0.0),
                cgmath::Vector3::new(0.0, 1.0, 0.0),
            ],
            normals: vec![cgmath::Vector3::new(f32::NAN, 1.0, f32::NAN); 3],
            faces: vec![SceneFace {
                indices: vec![0, 1, 2],
            }],
            ..Default::default()
        };
        let mut root = SceneNode::new("base");
        root.mesh_indices.push(0);
        let scene = SceneGraph {
            root,
            meshes: vec![mesh],
            materials: vec![],
        };

        let built = build(&scene, &ModelMeta::default());
        for vertex in &built.pieces[0].vertices {
            assert_eq!(vertex.normal, [0.0, 1.0, 0.0]);
        }
    }

    #[test]
    fn runaway_nesting_is_cut_off() {
        let mut node = SceneNode::new("deep");
        for i in 0..(MAX_PIECE_DEPTH + 16) {
            let mut wrapper = SceneNode::new(format!("level{i}"));
            wrapper.children.push(node);
            node = wrapper;
        }
        let scene = scene_with_nodes(node);

        let built = build(&scene, &ModelMeta::default());
        assert_eq!(built.pieces.len(), MAX_PIECE_DEPTH);
    }
}
