//! Bone records and the parent-indexed bone forest

use glam::{Quat, Vec3};

use crate::chunk::ChunkReader;
use crate::coords::{remap_quat, remap_vec3};
use crate::error::Result;
use crate::header::{FormatLayout, ModelHeader};
use crate::track::{AnimatedTrack, TrackContext, ValueEncoding, read_track};

/// Bone flag bits
pub struct BoneFlags;

impl BoneFlags {
    pub const SPHERICAL_BILLBOARD: u32 = 0x8;
    pub const CYLINDRICAL_BILLBOARD_X: u32 = 0x10;
    pub const CYLINDRICAL_BILLBOARD_Y: u32 = 0x20;
    pub const CYLINDRICAL_BILLBOARD_Z: u32 = 0x40;
    pub const TRANSFORMED: u32 = 0x200;
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bone {
    /// Key bone id, -1 when the bone has no well-known role
    pub key_bone_id: i32,
    pub flags: u32,
    /// -1 for roots
    pub parent: i16,
    pub pivot: Vec3,
    pub translation: AnimatedTrack<Vec3>,
    pub rotation: AnimatedTrack<Quat>,
    pub scaling: AnimatedTrack<Vec3>,
}

impl Bone {
    pub fn parent_index(&self) -> Option<usize> {
        usize::try_from(self.parent).ok()
    }

    pub fn is_animated(&self) -> bool {
        !(self.translation.is_empty() && self.rotation.is_empty() && self.scaling.is_empty())
    }
}

/// Bones in definition order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Skeleton {
    pub bones: Vec<Bone>,
}

impl Skeleton {
    /// Bone record width for a given header
    pub fn record_size(header: &ModelHeader) -> usize {
        let prefix = match header.layout() {
            FormatLayout::Modern => 16,
            FormatLayout::Legacy if header.is_classic() => 12,
            FormatLayout::Legacy => 16,
        };
        prefix + 3 * header.layout().track_header_size() + 12
    }

    pub(crate) fn read(header: &ModelHeader, ctx: &TrackContext<'_>) -> Result<Self> {
        let primary = ChunkReader::new(ctx.primary);
        let classic = header.is_classic();
        // Quaternions were stored uncompressed before 0x104
        let rotation_encoding = if header.version >= 0x104 {
            ValueEncoding::Int16Normalized
        } else {
            ValueEncoding::Float32
        };

        let bones = primary.records(header.bones, Self::record_size(header), |r| {
            let key_bone_id = r.read_i32()?;
            let flags = r.read_u32()?;
            let parent = r.read_i16()?;
            r.skip(2)?; // submesh id
            if !classic {
                r.skip(4)?; // bone name crc
            }

            let translation = read_track::<Vec3>(r, ctx, ValueEncoding::Float32)?.map(remap_vec3);
            let rotation = read_track::<Quat>(r, ctx, rotation_encoding)?.map(remap_quat);
            let scaling = read_track::<Vec3>(r, ctx, ValueEncoding::Float32)?;
            let pivot = remap_vec3(r.read_vec3()?);

            Ok(Bone {
                key_bone_id,
                flags,
                parent,
                pivot,
                translation,
                rotation,
                scaling,
            })
        })?;

        let skeleton = Self { bones };
        skeleton.report_bad_parents();
        Ok(skeleton)
    }

    /// Log every bone whose parent is not an earlier bone. Returns how many
    /// were logged.
    fn report_bad_parents(&self) -> usize {
        let mut reported = 0;
        for (i, bone) in self.bones.iter().enumerate() {
            match bone.parent_index() {
                Some(p) if p >= self.bones.len() => {
                    tracing::warn!("Bone {} has out-of-range parent {}", i, p);
                }
                Some(p) if p == i => tracing::warn!("Bone {} is its own parent", i),
                Some(p) if p > i => {
                    tracing::warn!("Bone {} references later bone {} as parent", i, p);
                }
                _ => continue,
            }
            reported += 1;
        }
        reported
    }

    pub fn len(&self) -> usize {
        self.bones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }

    pub fn roots(&self) -> impl Iterator<Item = usize> + '_ {
        self.bones
            .iter()
            .enumerate()
            .filter(|(_, b)| b.parent < 0)
            .map(|(i, _)| i)
    }

    pub fn children(&self, index: usize) -> impl Iterator<Item = usize> + '_ {
        self.bones
            .iter()
            .enumerate()
            .filter(move |(_, b)| b.parent_index() == Some(index))
            .map(|(i, _)| i)
    }

    /// Parent chain of `index`, nearest first.
    ///
    /// Stops after `len()` steps so malformed cycles cannot loop forever.
    pub fn ancestors(&self, index: usize) -> impl Iterator<Item = usize> + '_ {
        let mut current = self.bones.get(index).and_then(Bone::parent_index);
        let mut remaining = self.bones.len();
        std::iter::from_fn(move || {
            if remaining == 0 {
                return None;
            }
            remaining -= 1;
            let here = current.filter(|&p| p < self.bones.len())?;
            current = self.bones[here].parent_index();
            Some(here)
        })
    }

    /// Every bone is a root or points at an earlier-or-equal-index, in-range
    /// parent, and every parent chain reaches a root.
    pub fn is_forest(&self) -> bool {
        self.bones.iter().enumerate().all(|(i, bone)| match bone.parent_index() {
            None => true,
            Some(p) if p > i || p >= self.bones.len() => false,
            Some(_) => {
                let mut steps = 0;
                let mut current = Some(i);
                while let Some(c) = current {
                    if steps > self.bones.len() {
                        return false;
                    }
                    current = self.bones[c].parent_index();
                    steps += 1;
                }
                true
            }
        })
    }
}
