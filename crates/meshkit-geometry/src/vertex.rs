//! Indexed triangle lists produced by triangulation and extrusion.

/// Output from tessellation: vertices and indices.
#[derive(Debug, Clone, PartialEq)]
pub struct TessellatedMesh<V> {
    pub vertices: Vec<V>,
    /// Index data (triangles)
    pub indices: Vec<u32>,
}

impl<V> Default for TessellatedMesh<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> TessellatedMesh<V> {
    pub fn new() -> Self {
        Self {
            vertices: Vec::new(),
            indices: Vec::new(),
        }
    }

    pub fn from_data(vertices: Vec<V>, indices: Vec<u32>) -> Self {
        Self { vertices, indices }
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() || self.indices.is_empty()
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Append another mesh, rebasing its indices.
    pub fn append(&mut self, other: TessellatedMesh<V>) {
        let base = self.vertices.len() as u32;
        self.vertices.extend(other.vertices);
        self.indices.extend(other.indices.into_iter().map(|i| i + base));
    }

    pub fn clear(&mut self) {
        self.vertices.clear();
        self.indices.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_mesh() {
        let mesh: TessellatedMesh<[f32; 2]> = TessellatedMesh::new();
        assert!(mesh.is_empty());
        assert_eq!(mesh.vertex_count(), 0);
        assert_eq!(mesh.triangle_count(), 0);
    }

    #[test]
    fn test_append_rebases_indices() {
        let mut a = TessellatedMesh::from_data(vec![0u8; 3], vec![0, 1, 2]);
        a.append(TessellatedMesh::from_data(vec![1u8; 3], vec![0, 1, 2]));
        assert_eq!(a.indices, vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(a.triangle_count(), 2);
    }
}
