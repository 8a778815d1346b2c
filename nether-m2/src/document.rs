//! Decoded model document

use crate::animation::AnimationSequence;
use crate::geometry::{ModelVertex, SubmeshGeometry};
use crate::header::Bounds;
use crate::light::Light;
use crate::material::{ColorAnimation, RenderFlagEntry, TextureDefinition};
use crate::partition::DrawOrder;
use crate::skeleton::Skeleton;
use crate::skin::{SkinView, TextureUnit};

/// Everything decoded from one model load.
///
/// All positions, normals, pivots, rotations and bounds are already in the
/// Y-up convention.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct M2Document {
    pub name: String,
    pub version: u32,
    pub flags: u32,

    /// Loop lengths for tracks that run independently of sequences
    pub global_sequences: Vec<u32>,
    pub sequences: Vec<AnimationSequence>,
    pub skeleton: Skeleton,
    /// Maps submesh-local bone slots to skeleton indices
    pub bone_lookup: Vec<u16>,

    pub vertices: Vec<ModelVertex>,
    /// Level of detail 0
    pub view: SkinView,
    /// Parallel to `view.submeshes`
    pub submesh_geometry: Vec<SubmeshGeometry>,

    pub textures: Vec<TextureDefinition>,
    pub texture_lookup: Vec<u16>,
    pub render_flags: Vec<RenderFlagEntry>,
    pub colors: Vec<ColorAnimation>,
    pub lights: Vec<Light>,

    pub vertex_bounds: Bounds,
    pub bounding_bounds: Bounds,

    /// `None` when the loader was configured to skip partitioning
    pub draw_order: Option<DrawOrder>,
}

impl M2Document {
    /// Animated models need streaming vertex buffers; static ones can be
    /// uploaded once.
    pub fn is_animated(&self) -> bool {
        !self.sequences.is_empty() || !self.global_sequences.is_empty()
    }

    pub fn submesh_count(&self) -> usize {
        self.view.submeshes.len()
    }

    /// Texture bound to a texture unit, through the lookup table
    pub fn texture_for(&self, unit: &TextureUnit) -> Option<&TextureDefinition> {
        let slot = *self.texture_lookup.get(usize::from(unit.texture_index))?;
        self.textures.get(usize::from(slot))
    }

    pub fn render_flags_for(&self, unit: &TextureUnit) -> Option<&RenderFlagEntry> {
        self.render_flags.get(usize::from(unit.render_flags_index))
    }

    pub fn color_for(&self, unit: &TextureUnit) -> Option<&ColorAnimation> {
        self.colors.get(unit.color()?)
    }

    /// Submesh indices in draw order; file order when no draw order was computed.
    pub fn submesh_draw_order(&self) -> Vec<usize> {
        match &self.draw_order {
            Some(order) => order.order.clone(),
            None => (0..self.submesh_count()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::{BlendMode, TextureKind};

    fn document() -> M2Document {
        M2Document {
            textures: vec![
                TextureDefinition {
                    kind: TextureKind::File,
                    flags: 0,
                    filename: "a.blp".to_string(),
                },
                TextureDefinition {
                    kind: TextureKind::Skin,
                    flags: 0,
                    filename: String::new(),
                },
            ],
            texture_lookup: vec![1, 0],
            render_flags: vec![RenderFlagEntry {
                flags: 0,
                blend_mode: BlendMode::Additive,
            }],
            ..M2Document::default()
        }
    }

    #[test]
    fn test_unit_lookups() {
        let doc = document();
        let unit = TextureUnit {
            texture_index: 1,
            color_index: -1,
            ..TextureUnit::default()
        };
        assert_eq!(doc.texture_for(&unit).unwrap().filename, "a.blp");
        assert_eq!(doc.render_flags_for(&unit).unwrap().blend_mode, BlendMode::Additive);
        assert!(doc.color_for(&unit).is_none());

        let dangling = TextureUnit {
            texture_index: 7,
            render_flags_index: 3,
            ..TextureUnit::default()
        };
        assert!(doc.texture_for(&dangling).is_none());
        assert!(doc.render_flags_for(&dangling).is_none());
    }

    #[test]
    fn test_static_model() {
        let mut doc = document();
        assert!(!doc.is_animated());
        doc.global_sequences.push(1000);
        assert!(doc.is_animated());
    }
}
