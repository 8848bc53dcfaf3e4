//! glTF scene-graph importer.
//!
//! The document is walked depth-first (pre-order) from the scene roots. Every
//! triangle-list primitive of a node's mesh becomes one [`MeshData`]; the source is
//! already indexed, so vertices are copied through without deduplication. Diffuse
//! (base color) textures referenced by primitive materials are collected by file name.

use std::{collections::HashSet, path::Path};

use gltf::{Document, Gltf, Material, Node, Primitive, buffer, image::Source, mesh::Mode};

use crate::{
    error::{AssetError, AssetResult},
    mesh::{DEFAULT_NORMAL, DEFAULT_UV, MeshData, MeshVertex},
};

/// Everything extracted from one scene file.
#[derive(Clone, Debug, Default)]
pub struct SceneImport {
    /// One entry per triangle-list primitive, in traversal order.
    pub meshes: Vec<MeshData>,
    /// Diffuse texture file names in the order they were met.
    pub texture_file_names: Vec<String>,
}

/// Import every mesh reachable from the scene roots of a `.gltf`/`.glb` file.
pub fn import_gltf(path: impl AsRef<Path>) -> AssetResult<SceneImport> {
    let path = path.as_ref();

    let Gltf { document, blob } = Gltf::open(path).map_err(|e| AssetError::import(path, e))?;
    let buffers = gltf::import_buffers(&document, path.parent(), blob)
        .map_err(|e| AssetError::import(path, e))?;

    let mut walker = SceneWalker {
        path,
        buffers: &buffers,
        visited: HashSet::new(),
        out: SceneImport::default(),
    };
    for root in scene_roots(&document) {
        walker.visit(&root)?;
    }

    let out = walker.out;
    log::info!(
        "Imported glTF {}: {} meshes, {} texture references",
        path.display(),
        out.meshes.len(),
        out.texture_file_names.len()
    );
    Ok(out)
}

/// Default scene, else the first scene, else every node that has no parent.
fn scene_roots(document: &Document) -> Vec<Node<'_>> {
    if let Some(scene) = document.default_scene().or_else(|| document.scenes().next()) {
        return scene.nodes().collect();
    }

    let children: HashSet<usize> = document
        .nodes()
        .flat_map(|n| n.children().map(|c| c.index()))
        .collect();
    document
        .nodes()
        .filter(|n| !children.contains(&n.index()))
        .collect()
}

struct SceneWalker<'a> {
    path: &'a Path,
    buffers: &'a [buffer::Data],
    visited: HashSet<usize>,
    out: SceneImport,
}

impl SceneWalker<'_> {
    fn visit(&mut self, node: &Node<'_>) -> AssetResult<()> {
        if !self.visited.insert(node.index()) {
            log::warn!("glTF node {} reached twice; skipping", node.index());
            return Ok(());
        }

        if let Some(mesh) = node.mesh() {
            let name = mesh.name().or_else(|| node.name());
            for primitive in mesh.primitives() {
                self.collect_textures(&primitive.material());
                if primitive.mode() != Mode::Triangles {
                    log::warn!(
                        "Skipping {:?} primitive {} of mesh {}",
                        primitive.mode(),
                        primitive.index(),
                        mesh.index()
                    );
                    continue;
                }
                let mut data = self.read_primitive(&primitive)?;
                data.name = name.map(str::to_owned);
                self.out.meshes.push(data);
            }
        }

        for child in node.children() {
            self.visit(&child)?;
        }
        Ok(())
    }

    fn read_primitive(&self, primitive: &Primitive<'_>) -> AssetResult<MeshData> {
        let buffers = self.buffers;
        let reader =
            primitive.reader(|buffer| buffers.get(buffer.index()).map(|d| d.0.as_slice()));

        let positions: Vec<[f32; 3]> = reader
            .read_positions()
            .ok_or_else(|| AssetError::import(self.path, "primitive contains no vertex positions"))?
            .collect();
        let normals: Vec<[f32; 3]> = reader
            .read_normals()
            .map(|iter| iter.collect())
            .unwrap_or_default();
        let uvs: Vec<[f32; 2]> = reader
            .read_tex_coords(0)
            .map(|iter| iter.into_f32().collect())
            .unwrap_or_default();

        let vertices: Vec<MeshVertex> = positions
            .iter()
            .enumerate()
            .map(|(i, &p)| {
                MeshVertex::new(
                    p,
                    normals.get(i).copied().unwrap_or(DEFAULT_NORMAL),
                    uvs.get(i).copied().unwrap_or(DEFAULT_UV),
                )
            })
            .collect();

        let count = u32::try_from(vertices.len())
            .map_err(|_| AssetError::import(self.path, "too many vertices in primitive"))?;
        let indices: Vec<u32> = match reader.read_indices() {
            Some(indices) => indices.into_u32().collect(),
            None => (0..count).collect(),
        };

        if indices.len() % 3 != 0 {
            return Err(AssetError::import(
                self.path,
                format!("index count {} is not a multiple of 3", indices.len()),
            ));
        }
        if let Some(&bad) = indices.iter().find(|&&i| i >= count) {
            return Err(AssetError::import(
                self.path,
                format!("index {bad} out of bounds (vertices={count})"),
            ));
        }

        Ok(MeshData::new(vertices, indices))
    }

    /// Base-color texture file name. Embedded images (buffer views and `data:`
    /// URIs) have no file; their name is used when they carry one.
    fn collect_textures(&mut self, material: &Material<'_>) {
        let Some(info) = material.pbr_metallic_roughness().base_color_texture() else {
            return;
        };
        let image = info.texture().source();
        let file_name = match image.source() {
            Source::Uri { uri, .. } if !uri.starts_with("data:") => Some(uri.to_owned()),
            Source::Uri { .. } | Source::View { .. } => image.name().map(str::to_owned),
        };
        match file_name {
            Some(name) => self.out.texture_file_names.push(name),
            None => log::debug!("Diffuse texture {} is embedded and unnamed", image.index()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{fs, path::PathBuf};

    /// Node 1 carries the indexed triangle, node 3 the `$LEAF` primitive.
    const GLTF_BODY: &str = r#"
        "nodes": [
            { "name": "root", "children": [1, 2] },
            { "name": "body", "mesh": 0 },
            { "name": "empty", "children": [3] },
            { "name": "leaf", "mesh": 1 }
        ],
        "meshes": [
            { "name": "tri", "primitives": [
                { "attributes": { "POSITION": 0, "NORMAL": 1, "TEXCOORD_0": 2 },
                  "indices": 3, "material": 0 }
            ] },
            { "primitives": [ $LEAF ] }
        ],
        "materials": [
            { "pbrMetallicRoughness": { "baseColorTexture": { "index": 0 } } },
            { "pbrMetallicRoughness": { "baseColorTexture": { "index": 1 } } }
        ],
        "textures": [ { "source": 0 }, { "source": 1 } ],
        "images": $IMAGES,
        "buffers": [ { "uri": "mesh.bin", "byteLength": 102 } ],
        "bufferViews": [
            { "buffer": 0, "byteOffset": 0, "byteLength": 36 },
            { "buffer": 0, "byteOffset": 36, "byteLength": 36 },
            { "buffer": 0, "byteOffset": 72, "byteLength": 24 },
            { "buffer": 0, "byteOffset": 96, "byteLength": 6 }
        ],
        "accessors": [
            { "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
              "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0] },
            { "bufferView": 1, "componentType": 5126, "count": 3, "type": "VEC3" },
            { "bufferView": 2, "componentType": 5126, "count": 3, "type": "VEC2" },
            { "bufferView": 3, "componentType": 5123, "count": $INDEX_COUNT, "type": "SCALAR" }
        ]
    "#;

    const PLAIN_LEAF: &str = r#"{ "attributes": { "POSITION": 0 } }"#;
    const FILE_IMAGES: &str = r#"[ { "uri": "crate_diffuse.png" }, { "uri": "wire.png" } ]"#;

    struct Fixture {
        with_scene: bool,
        leaf: &'static str,
        images: &'static str,
        index_count: usize,
        indices: [u16; 3],
    }

    impl Default for Fixture {
        fn default() -> Self {
            Self {
                with_scene: true,
                leaf: PLAIN_LEAF,
                images: FILE_IMAGES,
                index_count: 3,
                indices: [0, 1, 2],
            }
        }
    }

    impl Fixture {
        fn mesh_bin(&self) -> Vec<u8> {
            let mut bytes = Vec::new();
            let floats: [f32; 24] = [
                0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0, // positions
                0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, // normals
                0.0, 0.0, 1.0, 0.0, 0.0, 1.0, // uvs
            ];
            for f in floats {
                bytes.extend_from_slice(&f.to_le_bytes());
            }
            for i in self.indices {
                bytes.extend_from_slice(&i.to_le_bytes());
            }
            assert_eq!(bytes.len(), 102);
            bytes
        }

        fn write(&self, dir: &Path) -> PathBuf {
            let header = if self.with_scene {
                r#""scene": 0, "scenes": [ { "nodes": [0] } ],"#
            } else {
                ""
            };
            let body = GLTF_BODY
                .replace("$LEAF", self.leaf)
                .replace("$IMAGES", self.images)
                .replace("$INDEX_COUNT", &self.index_count.to_string());
            let json = format!(r#"{{ "asset": {{ "version": "2.0" }}, {header} {body} }}"#);
            let path = dir.join("crate.gltf");
            fs::write(&path, json).unwrap();
            fs::write(dir.join("mesh.bin"), self.mesh_bin()).unwrap();
            path
        }

        fn import(&self) -> AssetResult<SceneImport> {
            let dir = tempfile::tempdir().unwrap();
            import_gltf(self.write(dir.path()))
        }
    }

    #[test]
    fn imports_meshes_in_preorder() {
        let scene = Fixture::default().import().unwrap();

        assert_eq!(scene.meshes.len(), 2);
        let tri = &scene.meshes[0];
        assert_eq!(tri.name.as_deref(), Some("tri"));
        assert_eq!(tri.indices, vec![0, 1, 2]);
        assert_eq!(tri.vertices[1].position, [1.0, 0.0, 0.0]);
        assert_eq!(tri.vertices[2].uv, [0.0, 1.0]);
        assert_eq!(tri.vertices[0].normal, [0.0, 0.0, 1.0]);

        // Unnamed mesh takes the node name; no normals/uvs, no index accessor.
        let leaf = &scene.meshes[1];
        assert_eq!(leaf.name.as_deref(), Some("leaf"));
        assert_eq!(leaf.indices, vec![0, 1, 2]);
        assert!(leaf.vertices.iter().all(|v| v.normal == DEFAULT_NORMAL));
        assert!(scene.meshes.iter().all(MeshData::is_valid));

        assert_eq!(scene.texture_file_names, vec!["crate_diffuse.png".to_string()]);
    }

    #[test]
    fn parentless_nodes_are_roots_without_scenes() {
        let scene = Fixture {
            with_scene: false,
            ..Fixture::default()
        }
        .import()
        .unwrap();
        assert_eq!(scene.meshes.len(), 2);
        assert_eq!(scene.meshes[0].name.as_deref(), Some("tri"));
    }

    #[test]
    fn line_primitive_is_skipped_but_keeps_its_texture() {
        let scene = Fixture {
            leaf: r#"{ "attributes": { "POSITION": 0 }, "mode": 1, "material": 1 }"#,
            ..Fixture::default()
        }
        .import()
        .unwrap();
        assert_eq!(scene.meshes.len(), 1);
        assert_eq!(scene.meshes[0].name.as_deref(), Some("tri"));
        assert_eq!(
            scene.texture_file_names,
            vec!["crate_diffuse.png".to_string(), "wire.png".to_string()]
        );
    }

    #[test]
    fn buffer_view_image_contributes_its_name() {
        let scene = Fixture {
            leaf: r#"{ "attributes": { "POSITION": 0 }, "material": 1 }"#,
            images: r#"[
                { "bufferView": 3, "mimeType": "image/png", "name": "baked_albedo" },
                { "bufferView": 3, "mimeType": "image/png" }
            ]"#,
            ..Fixture::default()
        }
        .import()
        .unwrap();
        assert_eq!(scene.meshes.len(), 2);
        assert_eq!(scene.texture_file_names, vec!["baked_albedo".to_string()]);
    }

    #[test]
    fn data_uri_image_is_not_a_file_name() {
        let scene = Fixture {
            leaf: r#"{ "attributes": { "POSITION": 0 }, "material": 1 }"#,
            images: r#"[
                { "uri": "data:image/png;base64,iVBORw0KGgo=", "name": "inline_albedo" },
                { "uri": "data:image/png;base64,iVBORw0KGgo=" }
            ]"#,
            ..Fixture::default()
        }
        .import()
        .unwrap();
        assert_eq!(scene.texture_file_names, vec!["inline_albedo".to_string()]);
        assert!(scene.texture_file_names.iter().all(|n| !n.starts_with("data:")));
    }

    #[test]
    fn out_of_range_index_is_import_error() {
        let res = Fixture {
            indices: [0, 1, 7],
            ..Fixture::default()
        }
        .import();
        match res {
            Err(AssetError::Import { message, .. }) => {
                assert!(message.contains("out of bounds"), "{message}")
            }
            other => panic!("expected import error, got {other:?}"),
        }
    }

    #[test]
    fn partial_triangle_is_import_error() {
        let res = Fixture {
            index_count: 2,
            ..Fixture::default()
        }
        .import();
        match res {
            Err(AssetError::Import { message, .. }) => {
                assert!(message.contains("multiple of 3"), "{message}")
            }
            other => panic!("expected import error, got {other:?}"),
        }
    }

    #[test]
    fn missing_file_is_import_error() {
        let dir = tempfile::tempdir().unwrap();
        let res = import_gltf(dir.path().join("missing.gltf"));
        assert!(matches!(res, Err(AssetError::Import { .. })));
    }

    #[test]
    fn garbage_document_is_import_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.gltf");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(import_gltf(&path), Err(AssetError::Import { .. })));
    }

    #[test]
    fn missing_buffer_is_import_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = Fixture::default().write(dir.path());
        fs::remove_file(dir.path().join("mesh.bin")).unwrap();
        assert!(matches!(import_gltf(&path), Err(AssetError::Import { .. })));
    }
}
