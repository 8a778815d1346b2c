//! Per-submesh classification and depth proxy selection

use glam::Vec3;

use crate::config::PartitionConfig;
use crate::geometry::ModelVertex;
use crate::material::{BlendMode, RenderFlagEntry};
use crate::skin::SkinView;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RadiusBracket {
    Small,
    Medium,
    Large,
}

impl RadiusBracket {
    pub fn of(radius: f32, config: &PartitionConfig) -> Self {
        if radius < config.small_radius {
            Self::Small
        } else if radius >= config.large_radius {
            Self::Large
        } else {
            Self::Medium
        }
    }
}

/// Which depth extreme stands in for the whole submesh
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortAnchor {
    Far,
    Near,
    Midpoint,
}

/// Depth proxy selection. Rows are checked top to bottom:
///
/// | renderOrder | mode | radius | anchor   |
/// |-------------|------|--------|----------|
/// | 2           | any  | small  | midpoint |
/// | 2           | any  | large  | far      |
/// | any         | 1    | any    | far      |
/// | any         | 2    | medium | near     |
/// | otherwise   |      |        | midpoint |
pub fn choose_anchor(mode: u16, bracket: RadiusBracket, render_order: i16) -> SortAnchor {
    match (render_order, mode, bracket) {
        (2, _, RadiusBracket::Small) => SortAnchor::Midpoint,
        (2, _, RadiusBracket::Large) => SortAnchor::Far,
        (_, 1, _) => SortAnchor::Far,
        (_, 2, RadiusBracket::Medium) => SortAnchor::Near,
        _ => SortAnchor::Midpoint,
    }
}

/// Everything the partitioner and material setup need to know about one submesh
#[derive(Debug, Clone, PartialEq)]
pub struct SubmeshClass {
    /// Opaque or alpha-tested
    pub solid: bool,
    pub animated_texture: bool,
    pub blend_mode: BlendMode,
    pub mode: u16,
    pub render_order: i16,
    pub grouping: u8,
    pub radius: f32,
    pub bracket: RadiusBracket,
    pub anchor: SortAnchor,
    pub min: Vec3,
    pub max: Vec3,
    pub centroid: Vec3,
    /// Depth proxy; larger is farther
    pub sort_point: f32,
}

pub(crate) fn classify(
    view: &SkinView,
    render_flags: &[RenderFlagEntry],
    vertices: &[ModelVertex],
    config: &PartitionConfig,
) -> Vec<SubmeshClass> {
    view.submeshes
        .iter()
        .enumerate()
        .map(|(i, submesh)| {
            let unit = view.units_for(i).next();
            let blend_mode = unit
                .and_then(|u| render_flags.get(usize::from(u.render_flags_index)))
                .map(|f| f.blend_mode)
                .unwrap_or_default();

            let window = submesh.vertex_range();
            let window = window.start.min(vertices.len())..window.end.min(vertices.len());
            let (min, max) = vertices[window]
                .iter()
                .map(|v| v.position)
                .fold(None, |acc: Option<(Vec3, Vec3)>, p| match acc {
                    None => Some((p, p)),
                    Some((lo, hi)) => Some((lo.min(p), hi.max(p))),
                })
                .unwrap_or((submesh.center_of_mass, submesh.center_of_mass));

            let radius = if submesh.radius > 0.0 {
                submesh.radius
            } else {
                (max - min).length() * 0.5
            };

            let mode = unit.map_or(0, |u| u.mode);
            let render_order = unit.map_or(0, |u| u.render_order);
            let bracket = RadiusBracket::of(radius, config);
            let anchor = choose_anchor(mode, bracket, render_order);
            let sort_point = match anchor {
                SortAnchor::Far => max.z,
                SortAnchor::Near => min.z,
                SortAnchor::Midpoint => (min.z + max.z) * 0.5,
            };

            SubmeshClass {
                solid: blend_mode.is_solid(),
                animated_texture: unit.is_some_and(|u| u.has_animated_texture()),
                blend_mode,
                mode,
                render_order,
                grouping: unit.map_or(0, |u| u.grouping()),
                radius,
                bracket,
                anchor,
                min,
                max,
                centroid: (min + max) * 0.5,
                sort_point,
            }
        })
        .collect()
}
