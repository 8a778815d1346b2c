//! View (skin) data: index buffers, submeshes and texture units
//!
//! Legacy models embed their LOD 0 view in the primary stream. Modern
//! models keep it in a `<stem>00.skin` companion that starts with a
//! 4-byte `SKIN` magic.

use glam::Vec3;

use crate::chunk::{ChunkReader, ChunkRef};
use crate::companion::{CompanionProvider, skin_file_name};
use crate::coords::remap_vec3;
use crate::error::{M2Error, Result};
use crate::header::{FormatLayout, ModelHeader};

/// View header width
pub const VIEW_HEADER_SIZE: usize = 44;

/// Submesh record width
pub const SUBMESH_SIZE: usize = 48;

/// Submesh record width on 0x100, which lacks the bounding center and radius
pub const CLASSIC_SUBMESH_SIZE: usize = 32;

/// Texture unit record width
pub const TEXTURE_UNIT_SIZE: usize = 24;

const SKIN_MAGIC_SIZE: usize = 4;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SubmeshDescriptor {
    pub id: u32,
    pub vertex_offset: u16,
    pub vertex_count: u16,
    /// Offset into the triangle buffer, in entries
    pub triangle_offset: u16,
    /// Triangle buffer entries (three per triangle)
    pub triangle_count: u16,
    pub bone_count: u16,
    pub bone_offset: u16,
    pub bone_influences: u16,
    pub root_bone: u16,
    pub center_of_mass: Vec3,
    pub bounding_center: Vec3,
    /// 0 on 0x100 models
    pub radius: f32,
}

impl SubmeshDescriptor {
    pub fn vertex_range(&self) -> std::ops::Range<usize> {
        let start = usize::from(self.vertex_offset);
        start..start + usize::from(self.vertex_count)
    }

    pub fn triangle_range(&self) -> std::ops::Range<usize> {
        let start = usize::from(self.triangle_offset);
        start..start + usize::from(self.triangle_count)
    }
}

/// Links a submesh to its material state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TextureUnit {
    pub flags: u16,
    pub render_order: i16,
    pub submesh_index: u16,
    pub submesh_index2: u16,
    /// -1 when the unit has no animated color
    pub color_index: i16,
    pub render_flags_index: u16,
    pub texture_unit_number: u16,
    pub mode: u16,
    /// Index into the texture lookup table
    pub texture_index: u16,
    pub texture_unit_number2: u16,
    pub transparency_index: u16,
    pub texture_animation_index: u16,
}

impl TextureUnit {
    /// Low flag byte is zero for animated textures.
    pub fn has_animated_texture(&self) -> bool {
        self.flags & 0x00FF == 0
    }

    /// High flag byte: grouping value, higher draws nearer
    pub fn grouping(&self) -> u8 {
        (self.flags >> 8) as u8
    }

    pub fn color(&self) -> Option<usize> {
        usize::try_from(self.color_index).ok()
    }
}

/// One level of detail
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SkinView {
    pub indices: Vec<u16>,
    /// Entries index into `indices`
    pub triangles: Vec<u16>,
    pub submeshes: Vec<SubmeshDescriptor>,
    pub texture_units: Vec<TextureUnit>,
    /// Maximum bones per draw call
    pub bone_limit: u32,
}

#[derive(Debug, Clone, Copy)]
struct ViewHeader {
    indices: ChunkRef,
    triangles: ChunkRef,
    submeshes: ChunkRef,
    texture_units: ChunkRef,
    bone_limit: u32,
}

impl ViewHeader {
    fn read(r: &mut ChunkReader<'_>) -> Result<Self> {
        let indices = r.read_chunk_ref()?;
        let triangles = r.read_chunk_ref()?;
        let _properties = r.read_chunk_ref()?;
        let submeshes = r.read_chunk_ref()?;
        let texture_units = r.read_chunk_ref()?;
        Ok(Self {
            indices,
            triangles,
            submeshes,
            texture_units,
            bone_limit: r.read_u32()?,
        })
    }
}

impl SkinView {
    /// Load LOD 0 from wherever this layout keeps it.
    pub(crate) fn load(
        primary: &ChunkReader<'_>,
        header: &ModelHeader,
        primary_name: &str,
        companions: &dyn CompanionProvider,
    ) -> Result<Self> {
        match header.layout() {
            FormatLayout::Legacy => Self::read_embedded(primary, header),
            FormatLayout::Modern => {
                let name = skin_file_name(primary_name);
                let bytes = companions
                    .open(&name)
                    .map_err(|source| M2Error::MissingSkin {
                        name: name.clone(),
                        source,
                    })?;
                tracing::debug!("Opened {} ({} bytes)", name, bytes.len());
                // The skin buffer is released as soon as the view is decoded
                Self::read_companion(&bytes, header.is_classic())
            }
        }
    }

    fn read_embedded(primary: &ChunkReader<'_>, header: &ModelHeader) -> Result<Self> {
        if header.views.is_empty() {
            tracing::warn!("Model has no views");
            return Ok(Self::default());
        }
        let lod0 = ChunkRef::new(1, header.views.offset);
        let mut r = primary.resolve(lod0, VIEW_HEADER_SIZE)?;
        let view = ViewHeader::read(&mut r)?;
        Self::read_chunks(primary, &view, header.is_classic())
    }

    fn read_companion(bytes: &[u8], classic: bool) -> Result<Self> {
        let stream = ChunkReader::new(bytes);
        let mut r = stream.resolve(
            ChunkRef::new(1, SKIN_MAGIC_SIZE as u32),
            VIEW_HEADER_SIZE,
        )?;
        let view = ViewHeader::read(&mut r)?;
        Self::read_chunks(&stream, &view, classic)
    }

    fn read_chunks(stream: &ChunkReader<'_>, view: &ViewHeader, classic: bool) -> Result<Self> {
        let indices = stream.read_u16_array(view.indices)?;
        let triangles = stream.read_u16_array(view.triangles)?;

        let submesh_size = if classic {
            CLASSIC_SUBMESH_SIZE
        } else {
            SUBMESH_SIZE
        };
        let submeshes = stream.records(view.submeshes, submesh_size, |r| {
            read_submesh(r, classic)
        })?;
        let texture_units = stream.records(view.texture_units, TEXTURE_UNIT_SIZE, read_texture_unit)?;

        tracing::debug!(
            "View: {} indices, {} triangle entries, {} submeshes, {} texture units",
            indices.len(),
            triangles.len(),
            submeshes.len(),
            texture_units.len()
        );

        Ok(Self {
            indices,
            triangles,
            submeshes,
            texture_units,
            bone_limit: view.bone_limit,
        })
    }

    /// Texture units attached to `submesh`, in file order.
    pub fn units_for(&self, submesh: usize) -> impl Iterator<Item = &TextureUnit> + '_ {
        self.texture_units
            .iter()
            .filter(move |u| usize::from(u.submesh_index) == submesh)
    }
}

fn read_submesh(r: &mut ChunkReader<'_>, classic: bool) -> Result<SubmeshDescriptor> {
    let mut submesh = SubmeshDescriptor {
        id: r.read_u32()?,
        vertex_offset: r.read_u16()?,
        vertex_count: r.read_u16()?,
        triangle_offset: r.read_u16()?,
        triangle_count: r.read_u16()?,
        bone_count: r.read_u16()?,
        bone_offset: r.read_u16()?,
        bone_influences: r.read_u16()?,
        root_bone: r.read_u16()?,
        center_of_mass: remap_vec3(r.read_vec3()?),
        ..SubmeshDescriptor::default()
    };
    if !classic {
        submesh.bounding_center = remap_vec3(r.read_vec3()?);
        submesh.radius = r.read_f32()?;
    } else {
        submesh.bounding_center = submesh.center_of_mass;
    }
    Ok(submesh)
}

fn read_texture_unit(r: &mut ChunkReader<'_>) -> Result<TextureUnit> {
    Ok(TextureUnit {
        flags: r.read_u16()?,
        render_order: r.read_i16()?,
        submesh_index: r.read_u16()?,
        submesh_index2: r.read_u16()?,
        color_index: r.read_i16()?,
        render_flags_index: r.read_u16()?,
        texture_unit_number: r.read_u16()?,
        mode: r.read_u16()?,
        texture_index: r.read_u16()?,
        texture_unit_number2: r.read_u16()?,
        transparency_index: r.read_u16()?,
        texture_animation_index: r.read_u16()?,
    })
}
