use std::fmt;

use tracing::debug;

use crate::geometry::{GeometryStore, Vec3, AABB};

/// Fixed cost charged for descending one level, in the same units as
/// `triangle count * box area`. Splits must beat the parent under this model.
const TRAVERSAL_COST: f32 = 0.125;

/// Candidate split positions evaluated per axis, evenly spanning the node
/// extent. The build runs once per scene, off the hot path.
const SPLIT_CANDIDATES: usize = 128;

/// A triangle as the builder and traversal see it: world-space vertices, the
/// centroid the partitioning compares, precomputed bounds, and the index of
/// the triangle in the geometry store's flat arrays.
#[derive(Clone, Debug)]
pub struct BvhTriangle {
    pub a: Vec3,
    pub b: Vec3,
    pub c: Vec3,
    pub centroid: Vec3,
    pub bounds: AABB,
    pub index: u32,
}

impl BvhTriangle {
    pub fn new(a: Vec3, b: Vec3, c: Vec3, index: u32) -> BvhTriangle {
        BvhTriangle {
            a,
            b,
            c,
            centroid: (a + b + c) / 3.0,
            bounds: AABB::from_points(a, b, c),
            index,
        }
    }
}

/// Build-time tree. Nodes exclusively own their children and triangle
/// lists; the tree is built once and never mutated afterward.
#[derive(Debug)]
pub enum BvhNode {
    Internal { bounds: AABB, children: Vec<BvhNode> },
    Leaf { bounds: AABB, triangles: Vec<BvhTriangle> },
}

#[derive(Clone, Copy, Debug)]
pub struct BuildParams {
    /// A node with this many triangles or fewer becomes a leaf.
    pub leaf_threshold: usize,
    /// Recursion depth budget, bounding tree height for clustered geometry.
    pub max_depth: u32,
}

impl Default for BuildParams {
    fn default() -> Self {
        BuildParams {
            leaf_threshold: 4,
            max_depth: 42,
        }
    }
}

impl BvhNode {
    /// Builds the hierarchy over every triangle in the store.
    pub fn build(store: &GeometryStore, params: &BuildParams) -> BvhNode {
        let triangles: Vec<BvhTriangle> = (0..store.triangle_count())
            .map(|i| {
                let (a, b, c) = store.triangle_vertices(i as u32);
                BvhTriangle::new(a, b, c, i as u32)
            })
            .collect();

        BvhNode::build_from_triangles(triangles, params)
    }

    pub fn build_from_triangles(triangles: Vec<BvhTriangle>, params: &BuildParams) -> BvhNode {
        let mut bounds = AABB::empty();
        for tri in &triangles {
            bounds.grow(&tri.bounds);
        }

        let root = build_recursive(
            triangles,
            bounds,
            params.leaf_threshold,
            params.max_depth,
            f32::INFINITY,
        );
        debug!("built bvh: {}", root.stats());
        root
    }

    pub fn bounds(&self) -> AABB {
        match self {
            BvhNode::Internal { bounds, .. } => *bounds,
            BvhNode::Leaf { bounds, .. } => *bounds,
        }
    }

    pub fn stats(&self) -> BvhStats {
        let mut stats = BvhStats::default();
        collect_stats(self, 1, &mut stats);
        stats
    }
}

fn leaf_from(triangles: Vec<BvhTriangle>) -> BvhNode {
    let mut bounds = AABB::empty();
    for tri in &triangles {
        bounds.grow(&tri.bounds);
    }
    BvhNode::Leaf { bounds, triangles }
}

/// One candidate evaluation: partition by centroid against `split` on `axis`,
/// growing a box around each side.
fn partition(
    triangles: &[BvhTriangle],
    axis: usize,
    split: f32,
) -> (Vec<BvhTriangle>, AABB, Vec<BvhTriangle>, AABB) {
    let mut left = Vec::new();
    let mut left_bounds = AABB::empty();
    let mut right = Vec::new();
    let mut right_bounds = AABB::empty();

    for tri in triangles {
        if tri.centroid.axis(axis) < split {
            left_bounds.grow(&tri.bounds);
            left.push(tri.clone());
        } else {
            right_bounds.grow(&tri.bounds);
            right.push(tri.clone());
        }
    }

    (left, left_bounds, right, right_bounds)
}

fn build_recursive(
    triangles: Vec<BvhTriangle>,
    region: AABB,
    leaf_threshold: usize,
    depth: u32,
    parent_cost: f32,
) -> BvhNode {
    if triangles.len() <= leaf_threshold || depth == 0 {
        return leaf_from(triangles);
    }

    let mut best_cost = f32::INFINITY;
    let mut best_axis = 0;
    let mut best_split = 0.0;

    for axis in 0..3 {
        let lo = region.minimum.axis(axis);
        let hi = region.maximum.axis(axis);

        for i in 0..=SPLIT_CANDIDATES {
            let split = lo + (hi - lo) * i as f32 / SPLIT_CANDIDATES as f32;

            let mut left_bounds = AABB::empty();
            let mut left_count = 0usize;
            let mut right_bounds = AABB::empty();
            let mut right_count = 0usize;

            for tri in &triangles {
                if tri.centroid.axis(axis) < split {
                    left_bounds.grow(&tri.bounds);
                    left_count += 1;
                } else {
                    right_bounds.grow(&tri.bounds);
                    right_count += 1;
                }
            }

            let cost = TRAVERSAL_COST
                + left_count as f32 * left_bounds.area()
                + right_count as f32 * right_bounds.area();
            if cost < best_cost {
                best_cost = cost;
                best_axis = axis;
                best_split = split;
            }
        }
    }

    // splitting has to beat the parent's cost, or the tree stops growing here
    if best_cost >= parent_cost {
        return leaf_from(triangles);
    }

    let (left, left_bounds, right, right_bounds) = partition(&triangles, best_axis, best_split);
    let children = vec![
        build_recursive(left, left_bounds, leaf_threshold, depth - 1, best_cost),
        build_recursive(right, right_bounds, leaf_threshold, depth - 1, best_cost),
    ];

    let bounds = AABB::surrounding_box(children[0].bounds(), children[1].bounds());
    BvhNode::Internal { bounds, children }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct BvhStats {
    pub max_depth: u32,
    pub min_tris: u32,
    pub max_tris: u32,
    pub total_leaves: u32,
    pub total_nodes: u32,
    pub total_triangles: u32,
}

fn collect_stats(node: &BvhNode, depth: u32, stats: &mut BvhStats) {
    stats.total_nodes += 1;
    stats.max_depth = u32::max(stats.max_depth, depth);
    match node {
        BvhNode::Leaf { triangles, .. } => {
            let count = triangles.len() as u32;
            if stats.total_leaves == 0 {
                stats.min_tris = count;
                stats.max_tris = count;
            } else {
                stats.min_tris = u32::min(stats.min_tris, count);
                stats.max_tris = u32::max(stats.max_tris, count);
            }
            stats.total_leaves += 1;
            stats.total_triangles += count;
        }
        BvhNode::Internal { children, .. } => {
            for child in children {
                collect_stats(child, depth + 1, stats);
            }
        }
    }
}

impl fmt::Display for BvhStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "depth={} leaves={} nodes={} tris={} tris/leaf={}..{}",
            self.max_depth,
            self.total_leaves,
            self.total_nodes,
            self.total_triangles,
            self.min_tris,
            self.max_tris,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn check_containment(node: &BvhNode) {
        match node {
            BvhNode::Leaf { bounds, triangles } => {
                for tri in triangles {
                    assert!(
                        bounds.contains(&tri.bounds),
                        "leaf bounds {:?} missing triangle {:?}",
                        bounds,
                        tri.bounds
                    );
                }
            }
            BvhNode::Internal { bounds, children } => {
                assert!(!children.is_empty() && children.len() <= 2);
                for child in children {
                    assert!(bounds.contains(&child.bounds()));
                    check_containment(child);
                }
            }
        }
    }

    fn count_triangles(node: &BvhNode) -> usize {
        match node {
            BvhNode::Leaf { triangles, .. } => triangles.len(),
            BvhNode::Internal { children, .. } => children.iter().map(count_triangles).sum(),
        }
    }

    fn soup_strategy(max: usize) -> impl Strategy<Value = Vec<BvhTriangle>> {
        prop::collection::vec(prop::array::uniform9(-10.0f32..10.0), 1..max).prop_map(|raw| {
            raw.into_iter()
                .enumerate()
                .map(|(i, v)| {
                    BvhTriangle::new(
                        Vec3(v[0], v[1], v[2]),
                        Vec3(v[3], v[4], v[5]),
                        Vec3(v[6], v[7], v[8]),
                        i as u32,
                    )
                })
                .collect()
        })
    }

    proptest! {
        #[test]
        fn every_node_bounds_its_triangles(soup in soup_strategy(64)) {
            let count = soup.len();
            let root = BvhNode::build_from_triangles(soup, &BuildParams::default());
            check_containment(&root);
            prop_assert_eq!(count_triangles(&root), count);
        }
    }

    #[test]
    fn small_input_becomes_single_leaf() {
        let triangles = vec![BvhTriangle::new(
            Vec3::zero(),
            Vec3(1.0, 0.0, 0.0),
            Vec3(0.0, 1.0, 0.0),
            0,
        )];
        let root = BvhNode::build_from_triangles(triangles, &BuildParams::default());
        assert!(matches!(root, BvhNode::Leaf { .. }));
    }

    #[test]
    fn separated_clusters_get_split() {
        // two groups of triangles far apart on x; any sane cost model splits them
        let mut triangles = Vec::new();
        for i in 0..8 {
            let offset = if i < 4 { -100.0 } else { 100.0 };
            let base = Vec3(offset + i as f32 * 0.1, 0.0, 0.0);
            triangles.push(BvhTriangle::new(
                base,
                base + Vec3(1.0, 0.0, 0.0),
                base + Vec3(0.0, 1.0, 0.0),
                i as u32,
            ));
        }
        let root = BvhNode::build_from_triangles(triangles, &BuildParams::default());
        let BvhNode::Internal { children, .. } = &root else {
            panic!("expected a split at the root");
        };
        assert_eq!(children.len(), 2);
        assert_eq!(count_triangles(&root), 8);
    }

    #[test]
    fn depth_budget_forces_leaf() {
        let mut triangles = Vec::new();
        for i in 0..32 {
            let base = Vec3(i as f32, 0.0, 0.0);
            triangles.push(BvhTriangle::new(
                base,
                base + Vec3(0.5, 0.0, 0.0),
                base + Vec3(0.0, 0.5, 0.0),
                i as u32,
            ));
        }
        let params = BuildParams {
            leaf_threshold: 4,
            max_depth: 0,
        };
        let root = BvhNode::build_from_triangles(triangles, &params);
        assert!(matches!(root, BvhNode::Leaf { .. }));
        assert_eq!(root.stats().total_triangles, 32);
    }
}
