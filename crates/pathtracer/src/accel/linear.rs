use crate::geometry::Vec3;

use super::bvh::{BvhNode, BvhTriangle};

/// Fixed-size node of the flattened hierarchy. Internal nodes find their
/// first child at the very next array slot and their second through
/// `second_child_offset` (0 means a single child, since the root occupies
/// slot 0 and can never be a second child). Leaves address a contiguous run
/// of the shared triangle array.
#[derive(Clone, Copy, Debug, Default)]
pub struct LinearBvhNode {
    pub min_bounds: Vec3,
    pub max_bounds: Vec3,

    pub is_leaf: bool,

    pub triangle_offset: u32,
    pub triangle_count: u32,

    pub second_child_offset: u32,
}

/// The traversal-time form of the hierarchy: one contiguous, relocatable
/// array of nodes plus the flat triangle array, no pointers. Built once by a
/// single depth-first pass and treated as immutable afterward, which is what
/// lets every worker thread share it without locking.
#[derive(Debug, Default)]
pub struct LinearBvh {
    pub nodes: Vec<LinearBvhNode>,
    pub triangles: Vec<BvhTriangle>,
}

impl LinearBvh {
    pub fn from_tree(root: &BvhNode) -> LinearBvh {
        let mut linear = LinearBvh::default();
        linear.flatten(root);
        linear
    }

    fn flatten(&mut self, node: &BvhNode) {
        let bounds = node.bounds();
        let mut record = LinearBvhNode {
            min_bounds: bounds.minimum,
            max_bounds: bounds.maximum,
            ..LinearBvhNode::default()
        };

        if let BvhNode::Leaf { triangles, .. } = node {
            record.is_leaf = true;
            record.triangle_offset = self.triangles.len() as u32;
            record.triangle_count = triangles.len() as u32;
            self.triangles.extend(triangles.iter().cloned());
        }

        let slot = self.nodes.len();
        self.nodes.push(record);

        if let BvhNode::Internal { children, .. } = node {
            self.flatten(&children[0]);
            if children.len() == 2 {
                self.nodes[slot].second_child_offset = self.nodes.len() as u32;
                self.flatten(&children[1]);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accel::bvh::BuildParams;
    use crate::geometry::AABB;

    fn grid_soup(n: usize) -> Vec<BvhTriangle> {
        (0..n)
            .map(|i| {
                let base = Vec3((i % 10) as f32 * 2.0, (i / 10) as f32 * 2.0, 0.0);
                BvhTriangle::new(
                    base,
                    base + Vec3(1.0, 0.0, 0.0),
                    base + Vec3(0.0, 1.0, 0.0),
                    i as u32,
                )
            })
            .collect()
    }

    #[test]
    fn flatten_preserves_every_triangle_once() {
        let root = BvhNode::build_from_triangles(grid_soup(50), &BuildParams::default());
        let linear = LinearBvh::from_tree(&root);

        let mut seen: Vec<u32> = linear.triangles.iter().map(|t| t.index).collect();
        seen.sort_unstable();
        let expected: Vec<u32> = (0..50).collect();
        assert_eq!(seen, expected);

        let counted: u32 = linear
            .nodes
            .iter()
            .filter(|n| n.is_leaf)
            .map(|n| n.triangle_count)
            .sum();
        assert_eq!(counted as usize, linear.triangles.len());
    }

    #[test]
    fn children_always_follow_their_parent() {
        let root = BvhNode::build_from_triangles(grid_soup(50), &BuildParams::default());
        let linear = LinearBvh::from_tree(&root);

        for (i, node) in linear.nodes.iter().enumerate() {
            if node.is_leaf {
                continue;
            }
            // implicit first child
            assert!(i + 1 < linear.nodes.len());
            if node.second_child_offset != 0 {
                assert!(node.second_child_offset as usize > i + 1);
                assert!((node.second_child_offset as usize) < linear.nodes.len());
            }
        }
    }

    #[test]
    fn root_is_slot_zero_with_tree_bounds() {
        let root = BvhNode::build_from_triangles(grid_soup(50), &BuildParams::default());
        let bounds = root.bounds();
        let linear = LinearBvh::from_tree(&root);

        assert_eq!(linear.nodes[0].min_bounds, bounds.minimum);
        assert_eq!(linear.nodes[0].max_bounds, bounds.maximum);
    }

    #[test]
    fn leaf_nodes_bound_their_triangle_runs() {
        let root = BvhNode::build_from_triangles(grid_soup(50), &BuildParams::default());
        let linear = LinearBvh::from_tree(&root);

        for node in linear.nodes.iter().filter(|n| n.is_leaf) {
            let bounds = AABB::new(node.min_bounds, node.max_bounds);
            let start = node.triangle_offset as usize;
            let end = start + node.triangle_count as usize;
            for tri in &linear.triangles[start..end] {
                assert!(bounds.contains(&tri.bounds));
            }
        }
    }
}
