/// Vertex color used for ordinary rings.
pub const COLOR_NEUTRAL: [f32; 4] = [0.0, 0.0, 0.0, 1.0];
/// Vertex color marking rings that overlap their neighbours.
pub const COLOR_OVERLAP: [f32; 4] = [1.0, 0.0, 0.0, 1.0];
/// Vertex color used for end-cap rings.
pub const COLOR_CAP: [f32; 4] = [0.0, 1.0, 0.0, 1.0];

/// Buffers produced by one extrusion. Always built wholesale; never patched.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MeshBuildResult {
    pub positions: Vec<[f64; 3]>,
    pub normals: Vec<[f64; 3]>,
    pub uvs: Vec<[f64; 2]>,
    /// Per-vertex debug colors (overlap and cap highlighting).
    pub colors: Vec<[f32; 4]>,
    pub indices: Vec<u32>,
}

impl MeshBuildResult {
    /// Allocates zeroed buffers for `vertex_count` vertices and an empty index
    /// list with room for `index_count` entries.
    #[must_use]
    pub fn with_vertex_count(vertex_count: usize, index_count: usize) -> Self {
        Self {
            positions: vec![[0.0; 3]; vertex_count],
            normals: vec![[0.0; 3]; vertex_count],
            uvs: vec![[0.0; 2]; vertex_count],
            colors: vec![COLOR_NEUTRAL; vertex_count],
            indices: Vec::with_capacity(index_count),
        }
    }

    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Returns true if any vertex position contains NaN or Inf values.
    #[must_use]
    pub fn has_invalid_vertices(&self) -> bool {
        self.positions
            .iter()
            .any(|p| !p[0].is_finite() || !p[1].is_finite() || !p[2].is_finite())
    }

    #[must_use]
    pub fn has_valid_indices(&self) -> bool {
        let n = self.positions.len();
        self.indices.iter().all(|&i| (i as usize) < n)
    }

    #[must_use]
    pub fn has_triangle_indices(&self) -> bool {
        self.indices.len() % 3 == 0
    }

    /// Returns true if every attribute buffer matches `positions.len()`.
    #[must_use]
    pub fn has_valid_attribute_lengths(&self) -> bool {
        let n = self.positions.len();
        self.normals.len() == n && self.uvs.len() == n && self.colors.len() == n
    }

    pub fn validate(&self) -> Result<(), String> {
        if !self.has_triangle_indices() {
            return Err("mesh indices are not a triangle list (len % 3 != 0)".to_string());
        }
        if self.has_invalid_vertices() {
            return Err("mesh has invalid vertex coordinates (NaN/Inf)".to_string());
        }
        if !self.has_valid_indices() {
            return Err("mesh has out-of-bounds vertex indices".to_string());
        }
        if !self.has_valid_attribute_lengths() {
            return Err("mesh attribute buffers do not match vertex count".to_string());
        }
        Ok(())
    }

    /// Position buffer as `[x0, y0, z0, x1, ...]`, for hosts that want packed
    /// numeric arrays.
    #[must_use]
    pub fn positions_flat(&self) -> &[f64] {
        self.positions.as_flattened()
    }

    #[must_use]
    pub fn normals_flat(&self) -> &[f64] {
        self.normals.as_flattened()
    }

    #[must_use]
    pub fn uvs_flat(&self) -> &[f64] {
        self.uvs.as_flattened()
    }

    #[must_use]
    pub fn colors_flat(&self) -> &[f32] {
        self.colors.as_flattened()
    }
}
