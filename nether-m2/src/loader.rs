//! Load orchestration
//!
//! Order matters: the sequence table (and its companion streams) must exist
//! before any track is decoded, and its streams are dropped as soon as the
//! last track has been read.

use std::path::Path;

use crate::animation::SequenceTable;
use crate::chunk::ChunkReader;
use crate::companion::{CompanionProvider, FsCompanions};
use crate::config::LoaderConfig;
use crate::coords::remap_vec3;
use crate::document::M2Document;
use crate::error::Result;
use crate::geometry::{ModelVertex, build_submesh_geometry};
use crate::header::{Bounds, ModelHeader};
use crate::light::Light;
use crate::material::{ColorAnimation, RenderFlagEntry, TextureDefinition};
use crate::partition::compute_draw_order;
use crate::skeleton::Skeleton;
use crate::skin::SkinView;
use crate::track::TrackContext;

/// Decodes M2 streams, pulling companion files from `P`
#[derive(Debug, Clone, Default)]
pub struct M2Loader<P = FsCompanions> {
    companions: P,
    config: LoaderConfig,
}

impl<P: CompanionProvider> M2Loader<P> {
    pub fn new(companions: P) -> Self {
        Self {
            companions,
            config: LoaderConfig::default(),
        }
    }

    pub fn with_config(mut self, config: LoaderConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Read and decode a model file.
    pub fn load_path(&self, path: &Path) -> Result<M2Document> {
        let data = std::fs::read(path)?;
        self.load(&path.to_string_lossy(), &data)
    }

    /// Decode a primary stream. `name` is the primary file name that
    /// companion names are derived from.
    pub fn load(&self, name: &str, data: &[u8]) -> Result<M2Document> {
        let header = ModelHeader::parse(data)?;
        let layout = header.layout();
        let primary = ChunkReader::new(data);
        tracing::debug!("Loading {} (version 0x{:X}, {:?})", name, header.version, layout);

        let sequences = SequenceTable::read(&primary, &header, name, &self.companions)?;
        let (skeleton, colors, lights) = {
            let ctx = TrackContext {
                layout,
                primary: data,
                sequences: &sequences,
            };
            (
                Skeleton::read(&header, &ctx)?,
                ColorAnimation::read_all(&header, &ctx)?,
                Light::read_all(&header, &ctx)?,
            )
        };
        // Releases every opened .anim stream
        let sequences = sequences.into_sequences();

        let vertices = ModelVertex::read_all(&primary, &header)?;
        let view = SkinView::load(&primary, &header, name, &self.companions)?;
        let submesh_geometry = build_submesh_geometry(&view, vertices.len())?;
        let render_flags = RenderFlagEntry::read_all(&primary, &header)?;

        let draw_order = self.config.compute_draw_order.then(|| {
            compute_draw_order(&view, &render_flags, &vertices, &self.config.partition)
        });

        let document = M2Document {
            name: primary.read_string(header.name)?,
            version: header.version,
            flags: header.flags,
            global_sequences: primary.read_u32_array(header.global_sequences)?,
            sequences,
            skeleton,
            bone_lookup: primary.read_u16_array(header.bone_lookup)?,
            vertices,
            view,
            submesh_geometry,
            textures: TextureDefinition::read_all(&primary, &header)?,
            texture_lookup: primary.read_u16_array(header.texture_lookup)?,
            render_flags,
            colors,
            lights,
            vertex_bounds: remap_bounds(header.vertex_bounds),
            bounding_bounds: remap_bounds(header.bounding_bounds),
            draw_order,
        };

        tracing::debug!(
            "Loaded {}: {} vertices, {} bones, {} sequences, {} submeshes",
            document.name,
            document.vertices.len(),
            document.skeleton.len(),
            document.sequences.len(),
            document.submesh_count()
        );
        Ok(document)
    }
}

fn remap_bounds(bounds: Bounds) -> Bounds {
    Bounds {
        min: remap_vec3(bounds.min),
        max: remap_vec3(bounds.max),
        radius: bounds.radius,
    }
}

/// Load a model from disk, looking up companions next to it.
pub fn load_m2(path: impl AsRef<Path>) -> Result<M2Document> {
    M2Loader::new(FsCompanions::new()).load_path(path.as_ref())
}

pub fn load_m2_with_config(path: impl AsRef<Path>, config: &LoaderConfig) -> Result<M2Document> {
    M2Loader::new(FsCompanions::new())
        .with_config(config.clone())
        .load_path(path.as_ref())
}
