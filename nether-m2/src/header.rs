//! Versioned header decoding
//!
//! Legacy files (0x100, 0x104..=0x107) store one contiguous 324-byte header.
//! Modern files (0x108) dropped four fields, so the same data sits in four
//! shorter byte ranges. Both are normalized into one legacy-shaped image
//! before any field is read, which keeps the field decoder layout-agnostic.

use glam::Vec3;

use crate::chunk::{ChunkReader, ChunkRef};
use crate::error::{M2Error, Result};
use crate::{M2_MAGIC, VERSION_CLASSIC, VERSION_MODERN};

/// Size of the normalized (legacy) header image
pub const HEADER_SIZE: usize = 0x144;

/// Size of the modern on-disk header
pub const MODERN_HEADER_SIZE: usize = 0x130;

/// Bytes shared verbatim by both layouts: magic, version, name, flags
const PREFIX_SIZE: usize = 0x14;

/// `(file offset, normalized offset, length)` for each modern header range.
///
/// The gaps in the normalized image are the playable-animation lookup
/// (0x2C), the view offset (0x50) and the texture flipbooks (0x6C).
const MODERN_RANGES: [(usize, usize, usize); 4] = [
    (0x14, 0x14, 0x18),
    (0x2C, 0x34, 0x1C),
    (0x48, 0x54, 0x18),
    (0x60, 0x74, 0xD0),
];

/// Physical layout family of an M2 stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatLayout {
    /// Contiguous header, embedded view, per-track interpolation ranges
    Legacy,
    /// Four-range header, companion skin file, per-sequence track tables
    Modern,
}

impl FormatLayout {
    pub fn from_version(version: u32) -> Result<Self> {
        match version {
            VERSION_CLASSIC | 0x104..=0x107 => Ok(Self::Legacy),
            VERSION_MODERN => Ok(Self::Modern),
            other => Err(M2Error::UnsupportedVersion(other)),
        }
    }

    /// On-disk width of one animated track header
    pub const fn track_header_size(self) -> usize {
        match self {
            Self::Legacy => 28,
            Self::Modern => 20,
        }
    }

    const fn header_size(self) -> usize {
        match self {
            Self::Legacy => HEADER_SIZE,
            Self::Modern => MODERN_HEADER_SIZE,
        }
    }
}

/// Axis-aligned box plus enclosing sphere radius
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Bounds {
    pub min: Vec3,
    pub max: Vec3,
    pub radius: f32,
}

/// Decoded header: every chunk reference the loader may follow
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelHeader {
    pub version: u32,
    pub name: ChunkRef,
    pub flags: u32,

    pub global_sequences: ChunkRef,
    pub animations: ChunkRef,
    pub animation_lookup: ChunkRef,
    /// Legacy only
    pub playable_animation_lookup: ChunkRef,
    pub bones: ChunkRef,
    pub key_bone_lookup: ChunkRef,
    pub vertices: ChunkRef,
    /// On the modern layout only `count` is set; views live in skin files
    pub views: ChunkRef,
    pub colors: ChunkRef,
    pub textures: ChunkRef,
    pub transparency: ChunkRef,
    /// Legacy only
    pub texture_flipbooks: ChunkRef,
    pub texture_animations: ChunkRef,
    pub texture_replace: ChunkRef,
    pub render_flags: ChunkRef,
    pub bone_lookup: ChunkRef,
    pub texture_lookup: ChunkRef,
    pub texture_unit_lookup: ChunkRef,
    pub transparency_lookup: ChunkRef,
    pub texture_animation_lookup: ChunkRef,

    /// Raw file-space bounds (not axis-remapped)
    pub vertex_bounds: Bounds,
    pub bounding_bounds: Bounds,

    pub bounding_triangles: ChunkRef,
    pub bounding_vertices: ChunkRef,
    pub bounding_normals: ChunkRef,
    pub attachments: ChunkRef,
    pub attachment_lookup: ChunkRef,
    pub events: ChunkRef,
    pub lights: ChunkRef,
    pub cameras: ChunkRef,
    pub camera_lookup: ChunkRef,
    pub ribbon_emitters: ChunkRef,
    pub particle_emitters: ChunkRef,
}

impl ModelHeader {
    /// Validate magic and version, then decode the header for that layout.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let image = normalize(data)?;
        Self::from_image(&image)
    }

    pub fn layout(&self) -> FormatLayout {
        // Only validated versions reach a constructed header
        if self.version == VERSION_MODERN {
            FormatLayout::Modern
        } else {
            FormatLayout::Legacy
        }
    }

    /// The oldest layout: shorter bone prefix and submesh records
    pub fn is_classic(&self) -> bool {
        self.version == VERSION_CLASSIC
    }

    fn from_image(image: &[u8; HEADER_SIZE]) -> Result<Self> {
        let mut r = ChunkReader::new(image);
        r.seek(4)?;
        let version = r.read_u32()?;
        let name = r.read_chunk_ref()?;
        let flags = r.read_u32()?;

        let mut header = Self {
            version,
            name,
            flags,
            global_sequences: r.read_chunk_ref()?,
            animations: r.read_chunk_ref()?,
            animation_lookup: r.read_chunk_ref()?,
            playable_animation_lookup: r.read_chunk_ref()?,
            bones: r.read_chunk_ref()?,
            key_bone_lookup: r.read_chunk_ref()?,
            vertices: r.read_chunk_ref()?,
            views: r.read_chunk_ref()?,
            colors: r.read_chunk_ref()?,
            textures: r.read_chunk_ref()?,
            transparency: r.read_chunk_ref()?,
            texture_flipbooks: r.read_chunk_ref()?,
            texture_animations: r.read_chunk_ref()?,
            texture_replace: r.read_chunk_ref()?,
            render_flags: r.read_chunk_ref()?,
            bone_lookup: r.read_chunk_ref()?,
            texture_lookup: r.read_chunk_ref()?,
            texture_unit_lookup: r.read_chunk_ref()?,
            transparency_lookup: r.read_chunk_ref()?,
            texture_animation_lookup: r.read_chunk_ref()?,
            ..Self::default()
        };

        header.vertex_bounds = read_bounds(&mut r)?;
        header.bounding_bounds = read_bounds(&mut r)?;

        header.bounding_triangles = r.read_chunk_ref()?;
        header.bounding_vertices = r.read_chunk_ref()?;
        header.bounding_normals = r.read_chunk_ref()?;
        header.attachments = r.read_chunk_ref()?;
        header.attachment_lookup = r.read_chunk_ref()?;
        header.events = r.read_chunk_ref()?;
        header.lights = r.read_chunk_ref()?;
        header.cameras = r.read_chunk_ref()?;
        header.camera_lookup = r.read_chunk_ref()?;
        header.ribbon_emitters = r.read_chunk_ref()?;
        header.particle_emitters = r.read_chunk_ref()?;

        debug_assert_eq!(r.position(), HEADER_SIZE);
        Ok(header)
    }
}

fn read_bounds(r: &mut ChunkReader<'_>) -> Result<Bounds> {
    Ok(Bounds {
        min: r.read_vec3()?,
        max: r.read_vec3()?,
        radius: r.read_f32()?,
    })
}

/// Read magic and version without consuming them.
pub fn peek_version(data: &[u8]) -> Result<u32> {
    if data.len() < 8 {
        return Err(M2Error::TooSmall(data.len()));
    }
    let mut r = ChunkReader::new(data);
    r.scoped(|r| {
        let mut magic = [0u8; 4];
        magic.copy_from_slice(r.read_bytes(4)?);
        if &magic != M2_MAGIC {
            return Err(M2Error::InvalidMagic(magic));
        }
        r.read_u32()
    })
}

/// Copy the on-disk header into the legacy-shaped image.
fn normalize(data: &[u8]) -> Result<[u8; HEADER_SIZE]> {
    let layout = FormatLayout::from_version(peek_version(data)?)?;
    if data.len() < layout.header_size() {
        return Err(M2Error::TooSmall(data.len()));
    }

    let mut image = [0u8; HEADER_SIZE];
    match layout {
        FormatLayout::Legacy => image.copy_from_slice(&data[..HEADER_SIZE]),
        FormatLayout::Modern => {
            image[..PREFIX_SIZE].copy_from_slice(&data[..PREFIX_SIZE]);
            for (file_ofs, image_ofs, len) in MODERN_RANGES {
                image[image_ofs..image_ofs + len].copy_from_slice(&data[file_ofs..file_ofs + len]);
            }
        }
    }
    Ok(image)
}
