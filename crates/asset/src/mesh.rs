//! CPU-side mesh representation used by loaders.

use bytemuck::{Pod, Zeroable};
use corelib::bounds::Aabb;

/// Texcoord used when a vertex has none.
pub const DEFAULT_UV: [f32; 2] = [0.0, 0.0];
/// Normal used when a vertex has none.
pub const DEFAULT_NORMAL: [f32; 3] = [0.0, 1.0, 0.0];

/// Vertex with position/normal/uv. Values are in object space.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl MeshVertex {
    pub fn new(position: [f32; 3], normal: [f32; 3], uv: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            uv,
        }
    }
}

/// Indexed triangle list with tightly-packed vertices.
///
/// Every index addresses `vertices` and the index count is a multiple of 3 for
/// anything a loader hands out; [`MeshData::is_valid`] checks both.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshData {
    pub name: Option<String>,
    pub vertices: Vec<MeshVertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn new(vertices: Vec<MeshVertex>, indices: Vec<u32>) -> Self {
        Self {
            name: None,
            vertices,
            indices,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    #[inline]
    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Non-empty, whole triangles only, no index past the vertex buffer.
    pub fn is_valid(&self) -> bool {
        let len = self.vertices.len();
        !self.vertices.is_empty()
            && !self.indices.is_empty()
            && self.indices.len() % 3 == 0
            && self.indices.iter().all(|&i| (i as usize) < len)
    }

    /// Object-space bounds of the vertex positions.
    pub fn bounds(&self) -> Option<Aabb> {
        Aabb::from_points(self.vertices.iter().map(|v| v.position)).ok()
    }

    /// Raw vertex buffer contents for upload.
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// Raw index buffer contents (`u32` little/native endian) for upload.
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }

    pub fn size_in_bytes(&self) -> usize {
        self.vertex_bytes().len() + self.index_bytes().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> MeshData {
        MeshData::new(
            vec![
                MeshVertex::new([0.0, 0.0, 0.0], DEFAULT_NORMAL, DEFAULT_UV),
                MeshVertex::new([1.0, 0.0, 0.0], DEFAULT_NORMAL, DEFAULT_UV),
                MeshVertex::new([0.0, 1.0, 0.0], DEFAULT_NORMAL, DEFAULT_UV),
            ],
            vec![0, 1, 2],
        )
    }

    #[test]
    fn mesh_data_validity() {
        let data = triangle();
        assert!(data.is_valid());
        assert_eq!(data.vertex_count(), 3);
        assert_eq!(data.index_count(), 3);
        assert_eq!(data.triangle_count(), 1);
    }

    #[test]
    fn out_of_range_index_is_invalid() {
        let mut data = triangle();
        data.indices[2] = 3;
        assert!(!data.is_valid());
    }

    #[test]
    fn partial_triangle_is_invalid() {
        let mut data = triangle();
        data.indices.push(0);
        assert!(!data.is_valid());
        assert!(!MeshData::default().is_valid());
    }

    #[test]
    fn byte_views_match_layout() {
        let data = triangle();
        assert_eq!(std::mem::size_of::<MeshVertex>(), 32);
        assert_eq!(data.vertex_bytes().len(), 3 * 32);
        assert_eq!(data.index_bytes().len(), 3 * 4);
        assert_eq!(data.size_in_bytes(), 108);
    }

    #[test]
    fn bounds_cover_positions() {
        let b = triangle().bounds().unwrap();
        assert_eq!(b.min.to_array(), [0.0, 0.0, 0.0]);
        assert_eq!(b.max.to_array(), [1.0, 1.0, 0.0]);
        assert!(MeshData::default().bounds().is_none());
    }
}
