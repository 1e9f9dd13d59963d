//! 2D cross-section swept along a curve.
//!
//! A profile is a list of vertices (position, normal and a `u` texture
//! coordinate) plus edge index pairs. Each pair becomes one quad strip when
//! the profile is extruded; the profile does not have to be closed.

use super::core::{Rect2, Vec2};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProfileError {
    #[error("edge list has odd length")]
    OddEdgeList,
    #[error("edge index {index} out of range (vertex count {len})")]
    EdgeIndexOutOfRange { index: usize, len: usize },
    #[error("vertex {0} has non-finite data")]
    NonFiniteVertex(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ProfileVertex {
    pub position: Vec2,
    pub normal: Vec2,
    pub u: f64,
}

impl ProfileVertex {
    #[must_use]
    pub const fn new(position: Vec2, normal: Vec2, u: f64) -> Self {
        Self { position, normal, u }
    }
}

/// Immutable once built; construct through [`ProfileShape::new`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProfileShape {
    vertices: Vec<ProfileVertex>,
    edges: Vec<u32>,
}

impl ProfileShape {
    pub fn new(vertices: Vec<ProfileVertex>, edges: Vec<u32>) -> Result<Self, ProfileError> {
        if edges.len() % 2 != 0 {
            return Err(ProfileError::OddEdgeList);
        }
        let len = vertices.len();
        if let Some(&index) = edges.iter().find(|&&i| i as usize >= len) {
            return Err(ProfileError::EdgeIndexOutOfRange {
                index: index as usize,
                len,
            });
        }
        if let Some(bad) = vertices
            .iter()
            .position(|v| !v.position.is_finite() || !v.normal.is_finite() || !v.u.is_finite())
        {
            return Err(ProfileError::NonFiniteVertex(bad));
        }
        Ok(Self { vertices, edges })
    }

    /// Regular polygon of `sides` edges with radius `radius`, closed, normals
    /// pointing outwards and `u` running from 0 to 1 around the perimeter.
    /// The first vertex is repeated at the end so the texture seam has its own
    /// pair of vertices.
    pub fn circle(sides: usize, radius: f64) -> Result<Self, ProfileError> {
        let sides = sides.max(3);
        let mut vertices = Vec::with_capacity(sides + 1);
        for i in 0..=sides {
            let angle = std::f64::consts::TAU * i as f64 / sides as f64;
            let (sin, cos) = angle.sin_cos();
            let normal = Vec2::new(cos, sin);
            vertices.push(ProfileVertex::new(normal * radius, normal, i as f64 / sides as f64));
        }
        let edges = (0..sides as u32).flat_map(|i| [i, i + 1]).collect();
        Self::new(vertices, edges)
    }

    /// Flat ribbon of width `width` lying on the local X axis, facing up.
    pub fn ribbon(width: f64) -> Result<Self, ProfileError> {
        let half = width * 0.5;
        Self::new(
            vec![
                ProfileVertex::new(Vec2::new(half, 0.0), Vec2::new(0.0, 1.0), 0.0),
                ProfileVertex::new(Vec2::new(-half, 0.0), Vec2::new(0.0, 1.0), 1.0),
            ],
            vec![0, 1],
        )
    }

    #[must_use]
    pub fn vertices(&self) -> &[ProfileVertex] {
        &self.vertices
    }

    /// Flat edge index list, two entries per edge.
    #[must_use]
    pub fn edges(&self) -> &[u32] {
        &self.edges
    }

    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len() / 2
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn edge_pairs(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.edges.chunks_exact(2).map(|pair| (pair[0], pair[1]))
    }

    /// Axis-aligned bounds of the vertex positions; an empty profile has empty
    /// bounds at the origin.
    #[must_use]
    pub fn bounds(&self) -> Rect2 {
        Rect2::from_points(self.vertices.iter().map(|v| v.position)).unwrap_or_default()
    }

    /// Total length of all edges, used to scale the `v` texture coordinate.
    #[must_use]
    pub fn u_span(&self) -> f64 {
        self.edge_pairs()
            .map(|(a, b)| {
                self.vertices[a as usize]
                    .position
                    .distance_to(self.vertices[b as usize].position)
            })
            .sum()
    }
}
