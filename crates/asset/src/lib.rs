//! Asset loading/parsers (meshes, textures).
//! OBJ files are canonicalized into a deduplicated indexed mesh, glTF scenes are
//! walked node by node into the same mesh shape, textures decode to RGBA8.

pub mod error;
pub mod mesh;
pub mod obj;
pub mod scene;
pub mod texture;

pub use error::{AssetError, AssetResult};
pub use mesh::{MeshData, MeshVertex};
pub use obj::{MissingAttributes, ObjOptions};
pub use scene::{SceneImport, import_gltf};
pub use texture::TextureData;
