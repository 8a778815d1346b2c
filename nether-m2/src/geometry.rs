//! Vertex buffer and per-submesh index lists

use std::ops::Range;

use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};

use crate::chunk::ChunkReader;
use crate::coords::remap_vec3;
use crate::error::{M2Error, Result};
use crate::header::ModelHeader;
use crate::skin::SkinView;

/// On-disk vertex record width
pub const VERTEX_SIZE: usize = 48;

/// Decoded vertex, laid out for direct GPU upload
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct ModelVertex {
    pub position: Vec3,
    pub bone_weights: [u8; 4],
    pub bone_indices: [u8; 4],
    pub normal: Vec3,
    pub uv: Vec2,
}

impl ModelVertex {
    pub(crate) fn read_all(primary: &ChunkReader<'_>, header: &ModelHeader) -> Result<Vec<Self>> {
        primary.records(header.vertices, VERTEX_SIZE, |r| {
            let position = remap_vec3(r.read_vec3()?);
            let mut bone_weights = [0u8; 4];
            bone_weights.copy_from_slice(r.read_bytes(4)?);
            let mut bone_indices = [0u8; 4];
            bone_indices.copy_from_slice(r.read_bytes(4)?);
            let normal = remap_vec3(r.read_vec3()?);
            let uv = r.read_vec2()?;
            Ok(Self {
                position,
                bone_weights,
                bone_indices,
                normal,
                uv,
            })
        })
    }
}

/// Triangle list for one submesh, local to its vertex window
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmeshGeometry {
    /// Slice of the model vertex buffer this submesh draws from
    pub vertices: Range<usize>,
    /// Indices relative to `vertices.start`
    pub indices: Vec<u16>,
}

/// Build local index lists for every submesh in `view`.
///
/// Triangles are emitted as `(a, c, b)` so they wind the same way as the
/// remapped normals. Indices that fall outside a submesh's vertex window
/// are kept as-is (wrapping) and logged. Triangle entries outside the view buffers are
/// fatal.
pub fn build_submesh_geometry(view: &SkinView, vertex_count: usize) -> Result<Vec<SubmeshGeometry>> {
    view.submeshes
        .iter()
        .enumerate()
        .map(|(i, submesh)| -> Result<SubmeshGeometry> {
            let window = submesh.vertex_range();
            let vertices = if window.end > vertex_count {
                tracing::warn!(
                    "Submesh {} vertex window {:?} exceeds {} vertices",
                    i,
                    window,
                    vertex_count
                );
                window.start.min(vertex_count)..vertex_count
            } else {
                window.clone()
            };

            let triangles = view
                .triangles
                .get(submesh.triangle_range())
                .ok_or_else(|| M2Error::CorruptView {
                    submesh: i,
                    reason: format!(
                        "triangle window {:?} exceeds {} entries",
                        submesh.triangle_range(),
                        view.triangles.len()
                    ),
                })?;

            let mut outside = 0usize;
            let mut indices = triangles
                .iter()
                .map(|&t| -> Result<u16> {
                    let index = *view.indices.get(usize::from(t)).ok_or_else(|| {
                        M2Error::CorruptView {
                            submesh: i,
                            reason: format!(
                                "triangle entry {} exceeds {} indices",
                                t,
                                view.indices.len()
                            ),
                        }
                    })?;
                    if !window.contains(&usize::from(index)) {
                        outside += 1;
                    }
                    Ok(index.wrapping_sub(submesh.vertex_offset))
                })
                .collect::<Result<Vec<u16>>>()?;
            // The axis remap mirrors the model, so restore front faces
            for triangle in indices.chunks_exact_mut(3) {
                triangle.swap(1, 2);
            }

            if outside > 0 {
                tracing::error!(
                    "Submesh {}: {} indices fall outside vertex window {:?}",
                    i,
                    outside,
                    window
                );
            }

            Ok(SubmeshGeometry { vertices, indices })
        })
        .collect()
}
