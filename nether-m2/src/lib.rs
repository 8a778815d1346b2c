//! Nether-M2: M2 model decoder and static draw-order partitioner for Nethercore
//!
//! Decodes the versioned M2 binary model format into an [`M2Document`]:
//! skeleton and keyframe tracks, vertex buffer, LOD 0 view geometry,
//! material tables, vertex colors and lights. It then computes a one-off
//! back-to-front draw order for translucent submeshes.
//!
//! # Supported Layouts
//!
//! - **Legacy** (0x100, 0x104..=0x107): one contiguous header, view embedded
//!   in the primary file, keyframes on one shared timeline
//! - **Modern** (0x108): four-range header, view in `<name>00.skin`,
//!   per-sequence keyframe tables, optional `<name><id>-<sub>.anim`
//!   companions
//!
//! Modern per-sequence timelines are flattened into one timeline by laying
//! sequences end to end [`SEQUENCE_GAP`] ticks apart.
//!
//! # Usage
//!
//! ```ignore
//! use nether_m2::load_m2;
//!
//! let model = load_m2("Creature/Wolf/Wolf.m2")?;
//! println!("{} bones, {} sequences", model.skeleton.len(), model.sequences.len());
//! for submesh in model.submesh_draw_order() {
//!     let geometry = &model.submesh_geometry[submesh];
//!     // upload geometry.indices against model.vertices[geometry.vertices.clone()]
//! }
//! ```
//!
//! Companion files can come from anywhere that implements
//! [`CompanionProvider`]; [`FsCompanions`] reads them from disk.

mod animation;
mod chunk;
mod companion;
mod config;
mod coords;
mod document;
mod error;
mod geometry;
mod header;
mod light;
mod loader;
mod material;
mod partition;
mod skeleton;
mod skin;
mod track;

#[cfg(test)]
mod test_util;

pub use animation::{AnimationSequence, SequenceData, SequenceFlags, SequenceStorage, SequenceTable};
pub use chunk::{ChunkReader, ChunkRef};
pub use companion::{CompanionProvider, FsCompanions, anim_file_name, companion_name, skin_file_name};
pub use config::{LoaderConfig, PartitionConfig};
pub use coords::{remap_quat, remap_vec3};
pub use document::M2Document;
pub use error::{M2Error, Result};
pub use geometry::{ModelVertex, SubmeshGeometry, build_submesh_geometry};
pub use header::{Bounds, FormatLayout, ModelHeader, peek_version};
pub use light::{Light, LightKind};
pub use loader::{M2Loader, load_m2, load_m2_with_config};
pub use material::{
    BlendMode, ColorAnimation, RenderFlagEntry, RenderFlags, TextureDefinition, TextureKind,
};
pub use partition::{
    DrawOrder, RadiusBracket, SortAnchor, SubmeshClass, choose_anchor, compute_draw_order,
};
pub use skeleton::{Bone, BoneFlags, Skeleton};
pub use skin::{SkinView, SubmeshDescriptor, TextureUnit};
pub use track::{
    AnimatedTrack, Interpolation, TrackValue, ValueEncoding, decode_fixed16,
    decode_int16_normalized,
};

/// Magic bytes at the start of every M2 stream
pub const M2_MAGIC: &[u8; 4] = b"MD20";

/// Oldest legacy version; shorter bone and submesh records
pub const VERSION_CLASSIC: u32 = 0x100;

/// The single modern (four-range header) version
pub const VERSION_MODERN: u32 = 0x108;

/// Ticks between consecutive modern sequences on the unified timeline
pub const SEQUENCE_GAP: u32 = 1000;
