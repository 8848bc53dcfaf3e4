//! 3D model resource: one or more canonical meshes decoded from OBJ or glTF.

use std::path::Path;

use asset::{MeshData, ObjOptions, SceneImport, import_gltf, obj::load_obj_from_path};

use crate::resource::{
    Construct, Resource, ResourceError, ResourceId, ResourceInfo, ResourceResult, ResourceType,
};

/// Source format and the parser settings that go with it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModelFormat {
    Obj(ObjOptions),
    Gltf,
}

impl ModelFormat {
    /// Pick the format from the file extension (`obj`, `gltf`, `glb`).
    pub fn from_path(path: impl AsRef<Path>) -> Option<Self> {
        let ext = path.as_ref().extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "obj" => Some(Self::Obj(ObjOptions::default())),
            "gltf" | "glb" => Some(Self::Gltf),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub struct Model {
    info: ResourceInfo,
    format: ModelFormat,
    meshes: Vec<MeshData>,
    texture_file_names: Vec<String>,
}

impl Model {
    pub fn new(name: &str, id: ResourceId, format: ModelFormat) -> Self {
        Self {
            info: ResourceInfo::new(name, ResourceType::Model3D, id),
            format,
            meshes: Vec::new(),
            texture_file_names: Vec::new(),
        }
    }

    pub fn format(&self) -> ModelFormat {
        self.format
    }

    pub fn meshes(&self) -> &[MeshData] {
        &self.meshes
    }

    /// Diffuse textures referenced by the source scene (glTF only).
    pub fn texture_file_names(&self) -> &[String] {
        &self.texture_file_names
    }

    fn decode(&self, path: &Path) -> Result<SceneImport, asset::AssetError> {
        match self.format {
            ModelFormat::Obj(options) => Ok(SceneImport {
                meshes: vec![load_obj_from_path(path, &options)?],
                texture_file_names: Vec::new(),
            }),
            ModelFormat::Gltf => import_gltf(path),
        }
    }
}

impl Resource for Model {
    fn info(&self) -> &ResourceInfo {
        &self.info
    }

    fn load(&mut self, path: &Path) -> ResourceResult<()> {
        self.info.begin_load(path)?;
        match self.decode(path) {
            Ok(scene) => {
                self.meshes = scene.meshes;
                self.texture_file_names = scene.texture_file_names;
                self.info.mark_loaded()
            }
            Err(e) => {
                self.info.mark_failed();
                Err(e.into())
            }
        }
    }

    /// Requires at least one mesh, and every mesh must form a valid index buffer.
    fn init(&mut self) -> ResourceResult<()> {
        let reason = if self.meshes.is_empty() {
            Some("model contains no meshes".to_string())
        } else {
            self.meshes
                .iter()
                .position(|m| !m.is_valid())
                .map(|i| format!("mesh {i} has no triangles or an out-of-range index"))
        };

        match reason {
            None => Ok(()),
            Some(reason) => {
                self.info.mark_failed();
                Err(ResourceError::Init {
                    name: self.info.name().to_string(),
                    reason,
                })
            }
        }
    }

    fn unload(&mut self) {
        self.meshes = Vec::new();
        self.texture_file_names = Vec::new();
        self.info.reset();
    }

    fn size_in_bytes(&self) -> usize {
        self.meshes.iter().map(MeshData::size_in_bytes).sum()
    }
}

impl Construct for Model {
    type Args = ModelFormat;

    fn construct(name: &str, id: ResourceId, format: ModelFormat) -> Self {
        Self::new(name, id, format)
    }
}
