//! Static draw order for submeshes
//!
//! Translucent submeshes must be drawn back to front, but sorting them every
//! frame is too expensive for the models this targets. Instead the model is
//! bucketed once into a coarse grid, cells are emitted far to near, and each
//! submesh inside a cell is ordered by a single depth proxy picked from its
//! material. This is a heuristic: it approximates correct compositing from
//! the default viewpoint and makes no guarantee for arbitrary cameras.
//!
//! Depth runs along +Z (larger is farther).

mod classify;
mod grid;

pub use classify::{RadiusBracket, SortAnchor, SubmeshClass, choose_anchor};

use crate::config::PartitionConfig;
use crate::geometry::ModelVertex;
use crate::material::RenderFlagEntry;
use crate::skin::SkinView;

use grid::Grid;

/// Submesh draw order plus the per-submesh classification behind it
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DrawOrder {
    /// Submesh indices into the view, first drawn first
    pub order: Vec<usize>,
    /// Indexed by submesh
    pub classes: Vec<SubmeshClass>,
}

impl DrawOrder {
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Submeshes that write depth, in draw order
    pub fn solid(&self) -> impl Iterator<Item = usize> + '_ {
        self.order.iter().copied().filter(|&i| self.classes[i].solid)
    }

    /// Submeshes that need blending, in draw order
    pub fn translucent(&self) -> impl Iterator<Item = usize> + '_ {
        self.order.iter().copied().filter(|&i| !self.classes[i].solid)
    }
}

/// Compute the static draw order for every submesh in `view`.
pub fn compute_draw_order(
    view: &SkinView,
    render_flags: &[RenderFlagEntry],
    vertices: &[ModelVertex],
    config: &PartitionConfig,
) -> DrawOrder {
    let classes = classify::classify(view, render_flags, vertices, config);
    if classes.is_empty() {
        return DrawOrder::default();
    }

    let grid = Grid::covering(&classes, config);
    let mut cells = grid.bucket(&classes);
    let eye_y = config.eye_height.unwrap_or(grid.center.y);
    grid.order_cells(&mut cells, eye_y);

    let mut order = Vec::with_capacity(classes.len());
    for cell in cells {
        let mut members = cell.members;
        // Stable: equal keys keep the centroid-X layout order
        members.sort_by(|&a, &b| {
            let (ca, cb) = (&classes[a], &classes[b]);
            cb.sort_point
                .total_cmp(&ca.sort_point)
                .then(ca.grouping.cmp(&cb.grouping))
        });
        order.extend(members);
    }

    tracing::debug!(
        "Draw order: {} submeshes over {}^3 cells of edge {}",
        order.len(),
        grid.cells,
        grid.edge
    );

    DrawOrder { order, classes }
}
