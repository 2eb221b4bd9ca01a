use std::f64::consts::PI;

use nalgebra::{Isometry2, Point2, Similarity2, Vector2};

use crate::{Fragment, NodeId};

/// Preferred child directions in radians, indexed by child position plus the
/// parent's theta offset. Positions past the end of the palette point along 0.
pub const THETA_PALETTE: [f64; 5] = [-PI / 3.0, PI / 3.0, 0.0, -2.0 * PI / 3.0, 2.0 * PI / 3.0];

/// Direction used for the `index`-th placement slot.
pub fn placement_angle(index: usize) -> f64 {
    THETA_PALETTE.get(index).copied().unwrap_or(0.0)
}

impl Fragment {
    /// Assign every node a schematic position: the root sits at the origin and
    /// each child is one bond length away from its parent, with the whole
    /// child subtree rotated into the child's slot direction.
    pub fn generate_coordinates(&mut self) -> &mut Self {
        self.lay_out(self.root());
        self
    }

    fn lay_out(&mut self, id: NodeId) {
        self.node_mut(id).suggested_position = Point2::origin();
        let theta_offset = self.node(id).theta_offset;
        let children = self.children(id).to_vec();
        for (i, child) in children.into_iter().enumerate() {
            self.lay_out(child);
            let theta = placement_angle(i + theta_offset);
            // Rotate after stepping one unit along x.
            let step = Isometry2::new(Vector2::new(theta.cos(), theta.sin()), theta);
            self.transform_subtree(child, &Similarity2::from_isometry(step, 1.0));
        }
    }

    /// Apply `transform` to every node position, e.g. to move the schematic
    /// layout into image coordinates at an attachment point.
    pub fn apply_transform(&mut self, transform: &Similarity2<f64>) -> &mut Self {
        self.transform_subtree(self.root(), transform);
        self
    }

    fn transform_subtree(&mut self, id: NodeId, transform: &Similarity2<f64>) {
        let ids: Vec<NodeId> = self.subtree(id);
        for id in ids {
            let node = self.node_mut(id);
            node.suggested_position = transform.transform_point(&node.suggested_position);
        }
    }
}
