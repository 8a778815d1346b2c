//! Material-side tables: render flags, texture definitions, vertex colors

use glam::Vec3;

use crate::chunk::ChunkReader;
use crate::error::Result;
use crate::header::ModelHeader;
use crate::track::{AnimatedTrack, TrackContext, ValueEncoding, read_track};

/// Render flag entry width
pub const RENDER_FLAG_SIZE: usize = 4;

/// Texture definition width
pub const TEXTURE_DEFINITION_SIZE: usize = 16;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum BlendMode {
    #[default]
    Opaque,
    AlphaRef,
    AlphaBlend,
    Additive,
    AdditiveAlpha,
    Modulate,
    Modulate2x,
}

impl BlendMode {
    pub fn from_raw(raw: u16) -> Option<Self> {
        Some(match raw {
            0 => Self::Opaque,
            1 => Self::AlphaRef,
            2 => Self::AlphaBlend,
            3 => Self::Additive,
            4 => Self::AdditiveAlpha,
            5 => Self::Modulate,
            6 => Self::Modulate2x,
            _ => return None,
        })
    }

    /// Writes depth and needs no back-to-front ordering
    pub fn is_solid(self) -> bool {
        matches!(self, Self::Opaque | Self::AlphaRef)
    }
}

/// Render flag bits
pub struct RenderFlags;

impl RenderFlags {
    pub const UNLIT: u16 = 0x01;
    pub const UNFOGGED: u16 = 0x02;
    pub const TWO_SIDED: u16 = 0x04;
    pub const BILLBOARD: u16 = 0x08;
    /// Disables both depth test and depth write
    pub const NO_DEPTH: u16 = 0x10;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderFlagEntry {
    pub flags: u16,
    pub blend_mode: BlendMode,
}

impl RenderFlagEntry {
    pub fn lit(&self) -> bool {
        self.flags & RenderFlags::UNLIT == 0
    }

    pub fn fogged(&self) -> bool {
        self.flags & RenderFlags::UNFOGGED == 0
    }

    pub fn backface_culling(&self) -> bool {
        self.flags & RenderFlags::TWO_SIDED == 0
    }

    pub fn depth_test(&self) -> bool {
        self.flags & RenderFlags::NO_DEPTH == 0
    }

    pub fn depth_write(&self) -> bool {
        self.depth_test()
    }

    pub(crate) fn read_all(primary: &ChunkReader<'_>, header: &ModelHeader) -> Result<Vec<Self>> {
        let mut index = 0usize;
        primary.records(header.render_flags, RENDER_FLAG_SIZE, |r| {
            let flags = r.read_u16()?;
            let raw = r.read_u16()?;
            let blend_mode = BlendMode::from_raw(raw).unwrap_or_else(|| {
                tracing::warn!("Render flag {} has unknown blend mode {}", index, raw);
                BlendMode::Opaque
            });
            index += 1;
            Ok(Self { flags, blend_mode })
        })
    }
}

/// Texture kinds; anything but `File` is resolved by the host at runtime
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureKind {
    File,
    Skin,
    ObjectSkin,
    WeaponBlade,
    WeaponHandle,
    Environment,
    Hair,
    FacialHair,
    SkinExtra,
    UiSkin,
    TaurenMane,
    Monster1,
    Monster2,
    Monster3,
    ItemIcon,
    Other(u32),
}

impl TextureKind {
    pub fn from_raw(raw: u32) -> Self {
        match raw {
            0 => Self::File,
            1 => Self::Skin,
            2 => Self::ObjectSkin,
            3 => Self::WeaponBlade,
            4 => Self::WeaponHandle,
            5 => Self::Environment,
            6 => Self::Hair,
            7 => Self::FacialHair,
            8 => Self::SkinExtra,
            9 => Self::UiSkin,
            10 => Self::TaurenMane,
            11 => Self::Monster1,
            12 => Self::Monster2,
            13 => Self::Monster3,
            14 => Self::ItemIcon,
            other => Self::Other(other),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureDefinition {
    pub kind: TextureKind,
    /// Wrap-X (0x1) and wrap-Y (0x2)
    pub flags: u32,
    /// Empty unless `kind` is `File`
    pub filename: String,
}

impl TextureDefinition {
    pub fn wrap_x(&self) -> bool {
        self.flags & 0x1 != 0
    }

    pub fn wrap_y(&self) -> bool {
        self.flags & 0x2 != 0
    }

    pub(crate) fn read_all(primary: &ChunkReader<'_>, header: &ModelHeader) -> Result<Vec<Self>> {
        primary.records(header.textures, TEXTURE_DEFINITION_SIZE, |r| {
            let kind = TextureKind::from_raw(r.read_u32()?);
            let flags = r.read_u32()?;
            let name = r.read_chunk_ref()?;
            Ok(Self {
                kind,
                flags,
                filename: primary.read_string(name)?,
            })
        })
    }
}

/// Animated RGB color plus alpha, referenced by texture units
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColorAnimation {
    pub color: AnimatedTrack<Vec3>,
    pub alpha: AnimatedTrack<f32>,
}

impl ColorAnimation {
    pub(crate) fn read_all(header: &ModelHeader, ctx: &TrackContext<'_>) -> Result<Vec<Self>> {
        let primary = ChunkReader::new(ctx.primary);
        let record_size = 2 * header.layout().track_header_size();
        primary.records(header.colors, record_size, |r| {
            Ok(Self {
                color: read_track(r, ctx, ValueEncoding::Float32)?,
                alpha: read_track(r, ctx, ValueEncoding::Fixed16)?,
            })
        })
    }
}
