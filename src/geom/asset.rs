//! JSON persistence for curves, profiles and extrusion options.
//!
//! A saved curve stores its arc-length table so loading does not have to
//! re-integrate it. A table that does not match the stored sample count or
//! segment count is treated as stale and rebuilt.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::arc_length::ArcLengthTable;
use super::constraint::ContinuityMode;
use super::core::{Point3, Vec2};
use super::extrude::ExtrudeOptions;
use super::frame::OrientedFrame;
use super::profile::{ProfileError, ProfileShape, ProfileVertex};
use super::spline::{Curve, CurveError, DEFAULT_LENGTH_SAMPLES};

#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid curve: {0}")]
    Curve(#[from] CurveError),
    #[error("invalid profile: {0}")]
    Profile(#[from] ProfileError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Serialized form of a [`Curve`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CurveState {
    pub control_points: Vec<OrientedFrame>,
    pub tangents: Vec<Point3>,
    pub modes: Vec<ContinuityMode>,
    pub looped: bool,
    pub length_samples: usize,
    pub placement: OrientedFrame,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arc_lengths: Option<ArcLengthTable>,
}

impl Default for CurveState {
    fn default() -> Self {
        Self {
            control_points: Vec::new(),
            tangents: Vec::new(),
            modes: Vec::new(),
            looped: false,
            length_samples: DEFAULT_LENGTH_SAMPLES,
            placement: OrientedFrame::IDENTITY,
            arc_lengths: None,
        }
    }
}

impl Curve {
    /// Restores a curve, reusing the stored arc-length table when it is still
    /// valid for the curve's shape.
    pub fn from_state(state: CurveState) -> Result<Self, CurveError> {
        let mut curve = Self::from_points(
            state.control_points,
            state.tangents,
            state.modes,
            state.looped,
        )?;
        curve.set_length_samples_silently(state.length_samples);

        match state.arc_lengths {
            Some(table) if table.is_valid_for(curve.segment_count(), curve.length_samples()) => {
                curve.set_arc_lengths(table);
            }
            Some(_) => {
                log::debug!("stored arc-length table is stale, regenerating");
                curve.regenerate_arc_lengths();
            }
            None => curve.regenerate_arc_lengths(),
        }

        curve.set_placement(state.placement);
        Ok(curve)
    }

    #[must_use]
    pub fn to_state(&self) -> CurveState {
        CurveState {
            control_points: self.control_points().to_vec(),
            tangents: self.tangent_handles().to_vec(),
            modes: self.modes().to_vec(),
            looped: self.is_looped(),
            length_samples: self.length_samples(),
            placement: self.placement(),
            arc_lengths: Some(self.arc_lengths().clone()),
        }
    }
}

/// Serialized profile vertex.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileVertexState {
    pub position: Vec2,
    pub normal: Vec2,
    pub u: f64,
}

/// Serialized form of a [`ProfileShape`]. `lines` holds two vertex indices per
/// edge.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileAsset {
    pub vertices: Vec<ProfileVertexState>,
    pub lines: Vec<u32>,
}

impl TryFrom<ProfileAsset> for ProfileShape {
    type Error = ProfileError;

    fn try_from(asset: ProfileAsset) -> Result<Self, Self::Error> {
        let vertices = asset
            .vertices
            .into_iter()
            .map(|v| ProfileVertex::new(v.position, v.normal, v.u))
            .collect();
        ProfileShape::new(vertices, asset.lines)
    }
}

impl From<&ProfileShape> for ProfileAsset {
    fn from(shape: &ProfileShape) -> Self {
        Self {
            vertices: shape
                .vertices()
                .iter()
                .map(|v| ProfileVertexState {
                    position: v.position,
                    normal: v.normal,
                    u: v.u,
                })
                .collect(),
            lines: shape.edges().to_vec(),
        }
    }
}

pub fn curve_from_json(json: &str) -> Result<Curve, AssetError> {
    let state: CurveState = serde_json::from_str(json)?;
    Ok(Curve::from_state(state)?)
}

pub fn curve_to_json(curve: &Curve) -> Result<String, AssetError> {
    Ok(serde_json::to_string_pretty(&curve.to_state())?)
}

pub fn profile_from_json(json: &str) -> Result<ProfileShape, AssetError> {
    let asset: ProfileAsset = serde_json::from_str(json)?;
    Ok(ProfileShape::try_from(asset)?)
}

pub fn profile_to_json(profile: &ProfileShape) -> Result<String, AssetError> {
    Ok(serde_json::to_string_pretty(&ProfileAsset::from(profile))?)
}

/// Missing fields take their defaults.
pub fn options_from_json(json: &str) -> Result<ExtrudeOptions, AssetError> {
    Ok(serde_json::from_str(json)?)
}

pub fn load_curve_json(path: impl AsRef<Path>) -> Result<Curve, AssetError> {
    curve_from_json(&fs::read_to_string(path)?)
}

pub fn save_curve_json(curve: &Curve, path: impl AsRef<Path>) -> Result<(), AssetError> {
    fs::write(path, curve_to_json(curve)?)?;
    Ok(())
}

pub fn load_profile_json(path: impl AsRef<Path>) -> Result<ProfileShape, AssetError> {
    profile_from_json(&fs::read_to_string(path)?)
}

pub fn save_profile_json(profile: &ProfileShape, path: impl AsRef<Path>) -> Result<(), AssetError> {
    fs::write(path, profile_to_json(profile)?)?;
    Ok(())
}

pub fn load_options_json(path: impl AsRef<Path>) -> Result<ExtrudeOptions, AssetError> {
    options_from_json(&fs::read_to_string(path)?)
}
