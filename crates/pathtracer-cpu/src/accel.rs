use pathtracer::accel::{LinearBvh, LinearBvhNode};

use crate::geometry::{intersect_aabb, intersect_segment_triangle};
use crate::ray::Ray;

/// Deep enough for any tree the builder's depth budget can produce.
const STACK_DEPTH: usize = 64;

#[derive(Clone, Copy, Debug)]
pub(crate) struct Hit {
    pub(crate) t: f32,
    /// Index into the linearized BVH's triangle array.
    pub(crate) tri: u32,
}

fn node_entry_distance(node: &LinearBvhNode, ray: Ray, limit: f32) -> f32 {
    intersect_aabb(node.min_bounds, node.max_bounds, ray, limit)
}

/// Finds the closest triangle intersection within `t_max`, or with
/// `early_exit` returns on the first valid intersection found — the shadow
/// query, where only occlusion matters.
///
/// Iterative traversal over an explicit stack of node indices; the near
/// child is pushed last so it pops first, and the far child is pushed only
/// while its box entry could still beat the running best. That ordering is
/// an optimization, not a correctness requirement.
pub(crate) fn traverse_bvh(bvh: &LinearBvh, ray: Ray, t_max: f32, early_exit: bool) -> Option<Hit> {
    if bvh.nodes.is_empty() {
        return None;
    }

    let mut stack = [0u32; STACK_DEPTH];
    let mut stack_len = 1usize;

    let mut best_t = t_max;
    let mut best_tri: Option<u32> = None;

    while stack_len > 0 {
        stack_len -= 1;
        let node = &bvh.nodes[stack[stack_len] as usize];
        let node_index = stack[stack_len];

        if node.is_leaf {
            for i in 0..node.triangle_count {
                let tri_index = node.triangle_offset + i;
                let tri = &bvh.triangles[tri_index as usize];
                let Some(t) =
                    intersect_segment_triangle(ray.origin, ray.direction, best_t, tri.a, tri.b, tri.c)
                else {
                    continue;
                };
                if t < best_t {
                    best_t = t;
                    best_tri = Some(tri_index);
                    if early_exit {
                        return Some(Hit { t: best_t, tri: tri_index });
                    }
                }
            }
        } else {
            let first_child = node_index + 1;
            let first_distance = node_entry_distance(&bvh.nodes[first_child as usize], ray, best_t);

            if node.second_child_offset == 0 {
                if first_distance < best_t {
                    debug_assert!(stack_len < STACK_DEPTH);
                    stack[stack_len] = first_child;
                    stack_len += 1;
                }
            } else {
                let second_child = node.second_child_offset;
                let second_distance =
                    node_entry_distance(&bvh.nodes[second_child as usize], ray, best_t);

                let (near, near_distance, far, far_distance) = if first_distance <= second_distance
                {
                    (first_child, first_distance, second_child, second_distance)
                } else {
                    (second_child, second_distance, first_child, first_distance)
                };

                if near_distance == f32::INFINITY {
                    continue;
                }

                debug_assert!(stack_len + 2 <= STACK_DEPTH);
                if far_distance < best_t {
                    stack[stack_len] = far;
                    stack_len += 1;
                }
                stack[stack_len] = near;
                stack_len += 1;
            }
        }
    }

    best_tri.map(|tri| Hit { t: best_t, tri })
}
