//! Model lights

use glam::Vec3;

use crate::chunk::ChunkReader;
use crate::coords::remap_vec3;
use crate::error::Result;
use crate::header::ModelHeader;
use crate::track::{AnimatedTrack, TrackContext, ValueEncoding, read_track};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightKind {
    Directional,
    Point,
    Other(u16),
}

impl LightKind {
    pub fn from_raw(raw: u16) -> Self {
        match raw {
            0 => Self::Directional,
            1 => Self::Point,
            other => Self::Other(other),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Light {
    pub kind: LightKind,
    /// Attachment bone, -1 for none
    pub bone: i16,
    pub position: Vec3,
    pub ambient_color: AnimatedTrack<Vec3>,
    pub ambient_intensity: AnimatedTrack<f32>,
    pub diffuse_color: AnimatedTrack<Vec3>,
    pub diffuse_intensity: AnimatedTrack<f32>,
    pub attenuation_start: AnimatedTrack<f32>,
    pub attenuation_end: AnimatedTrack<f32>,
    /// Nonzero while the light is on
    pub visibility: AnimatedTrack<f32>,
}

impl Light {
    pub fn record_size(header: &ModelHeader) -> usize {
        16 + 7 * header.layout().track_header_size()
    }

    pub(crate) fn read_all(header: &ModelHeader, ctx: &TrackContext<'_>) -> Result<Vec<Self>> {
        let primary = ChunkReader::new(ctx.primary);
        primary.records(header.lights, Self::record_size(header), |r| {
            let kind = LightKind::from_raw(r.read_u16()?);
            let bone = r.read_i16()?;
            let position = remap_vec3(r.read_vec3()?);
            Ok(Self {
                kind,
                bone,
                position,
                ambient_color: read_track(r, ctx, ValueEncoding::Float32)?,
                ambient_intensity: read_track(r, ctx, ValueEncoding::Float32)?,
                diffuse_color: read_track(r, ctx, ValueEncoding::Float32)?,
                diffuse_intensity: read_track(r, ctx, ValueEncoding::Float32)?,
                attenuation_start: read_track(r, ctx, ValueEncoding::Float32)?,
                attenuation_end: read_track(r, ctx, ValueEncoding::Float32)?,
                visibility: read_track(r, ctx, ValueEncoding::Int32AsFloat)?,
            })
        })
    }
}
