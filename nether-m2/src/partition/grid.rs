//! Cubic bucketing grid over the model's bounding sphere

use std::cmp::Reverse;
use std::collections::BTreeMap;

use glam::Vec3;

use super::classify::SubmeshClass;
use crate::config::PartitionConfig;

/// Grid bucket, alive only while the draw order is computed
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PartitionCell {
    pub z: usize,
    pub y: usize,
    pub x: usize,
    pub members: Vec<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Grid {
    pub origin: Vec3,
    pub edge: f32,
    /// Cells per axis
    pub cells: usize,
    pub center: Vec3,
}

impl Grid {
    pub fn covering(classes: &[SubmeshClass], config: &PartitionConfig) -> Self {
        let (lo, hi) = classes
            .iter()
            .fold((Vec3::splat(f32::MAX), Vec3::splat(f32::MIN)), |(lo, hi), c| {
                (lo.min(c.min), hi.max(c.max))
            });
        let (center, radius) = if classes.is_empty() {
            (Vec3::ZERO, 0.0)
        } else {
            ((lo + hi) * 0.5, (hi - lo).length() * 0.5)
        };

        let mut edge = if config.cell_size > 0.0 && config.cell_size.is_finite() {
            config.cell_size
        } else {
            PartitionConfig::default().cell_size
        };
        let max_cells = config.max_cells_per_axis.max(1) as usize;
        let wanted = ((2.0 * radius) / edge).ceil();
        let cells = if wanted.is_finite() && wanted >= 1.0 {
            (wanted as usize).min(max_cells)
        } else {
            1
        };
        if cells == max_cells && radius > 0.0 {
            edge = edge.max(2.0 * radius / cells as f32);
        }

        let half_span = edge * cells as f32 * 0.5;
        Self {
            origin: center - Vec3::splat(half_span),
            edge,
            cells,
            center,
        }
    }

    /// Slab index along one axis, clamped so every point lands somewhere.
    pub fn slab(&self, value: f32, origin: f32) -> usize {
        let raw = ((value - origin) / self.edge).floor();
        // NaN casts to 0
        (raw.max(0.0) as usize).min(self.cells - 1)
    }

    pub fn slab_center(&self, index: usize, origin: f32) -> f32 {
        origin + (index as f32 + 0.5) * self.edge
    }

    /// Assign every submesh to exactly one cell, testing Z, then Y, then X.
    pub fn bucket(&self, classes: &[SubmeshClass]) -> Vec<PartitionCell> {
        let mut cells: BTreeMap<(usize, usize, usize), Vec<usize>> = BTreeMap::new();
        for (index, class) in classes.iter().enumerate() {
            let c = class.centroid;
            let z = self.slab(c.z, self.origin.z);
            let y = self.slab(c.y, self.origin.y);
            let x = self.slab(c.x, self.origin.x);
            cells.entry((z, y, x)).or_default().push(index);
        }

        cells
            .into_iter()
            .map(|((z, y, x), mut members)| {
                members.sort_by(|&a, &b| {
                    classes[a]
                        .centroid
                        .x
                        .total_cmp(&classes[b].centroid.x)
                        .then(a.cmp(&b))
                });
                PartitionCell { z, y, x, members }
            })
            .collect()
    }

    /// Sort cells far Z first, then Y slabs farthest from `eye_y` first,
    /// then X left to right.
    pub fn order_cells(&self, cells: &mut [PartitionCell], eye_y: f32) {
        let y_rank: Vec<usize> = {
            let mut slabs: Vec<usize> = (0..self.cells).collect();
            slabs.sort_by(|&a, &b| {
                let da = (self.slab_center(a, self.origin.y) - eye_y).abs();
                let db = (self.slab_center(b, self.origin.y) - eye_y).abs();
                db.total_cmp(&da).then(a.cmp(&b))
            });
            let mut rank = vec![0; self.cells];
            for (position, slab) in slabs.into_iter().enumerate() {
                rank[slab] = position;
            }
            rank
        };

        cells.sort_by_key(|cell| (Reverse(cell.z), y_rank[cell.y], cell.x));
    }
}
