use super::vec3::Vec3;

/// Axis-aligned bounding box defined by its two corner points.
#[derive(Clone, Copy, Debug)]
pub struct AABB {
    pub minimum: Vec3,
    pub maximum: Vec3,
}

impl AABB {
    pub fn new(minimum: Vec3, maximum: Vec3) -> AABB {
        AABB { minimum, maximum }
    }

    /// An inverted box that grows to fit the first thing added to it.
    pub fn empty() -> AABB {
        AABB {
            minimum: Vec3(f32::INFINITY, f32::INFINITY, f32::INFINITY),
            maximum: Vec3(f32::NEG_INFINITY, f32::NEG_INFINITY, f32::NEG_INFINITY),
        }
    }

    pub fn from_points(a: Vec3, b: Vec3, c: Vec3) -> AABB {
        AABB {
            minimum: Vec3::elementwise_min(a, Vec3::elementwise_min(b, c)),
            maximum: Vec3::elementwise_max(a, Vec3::elementwise_max(b, c)),
        }
    }

    /// Returns a box which surrounds both a and b.
    pub fn surrounding_box(a: AABB, b: AABB) -> AABB {
        AABB {
            minimum: Vec3::elementwise_min(a.minimum, b.minimum),
            maximum: Vec3::elementwise_max(a.maximum, b.maximum),
        }
    }

    pub fn grow(&mut self, other: &AABB) {
        *self = AABB::surrounding_box(*self, *other);
    }

    pub fn is_empty(&self) -> bool {
        self.maximum.0 < self.minimum.0
            || self.maximum.1 < self.minimum.1
            || self.maximum.2 < self.minimum.2
    }

    /// Surface area, the quantity the split cost model weighs child boxes by.
    pub fn area(&self) -> f32 {
        if self.is_empty() {
            return 0.0;
        }
        let d = self.maximum - self.minimum;
        2.0 * (d.0 * d.1 + d.1 * d.2 + d.0 * d.2)
    }

    pub fn contains_point(&self, p: Vec3) -> bool {
        p.0 >= self.minimum.0
            && p.0 <= self.maximum.0
            && p.1 >= self.minimum.1
            && p.1 <= self.maximum.1
            && p.2 >= self.minimum.2
            && p.2 <= self.maximum.2
    }

    pub fn contains(&self, other: &AABB) -> bool {
        if other.is_empty() {
            return true;
        }
        self.contains_point(other.minimum) && self.contains_point(other.maximum)
    }
}

impl Default for AABB {
    fn default() -> Self {
        AABB::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_box_has_zero_area() {
        assert_eq!(AABB::empty().area(), 0.0);
    }

    #[test]
    fn grow_from_empty_adopts_bounds() {
        let mut grown = AABB::empty();
        let tri = AABB::from_points(
            Vec3(0.0, 0.0, 0.0),
            Vec3(1.0, 2.0, 0.0),
            Vec3(-1.0, 0.5, 3.0),
        );
        grown.grow(&tri);
        assert_eq!(grown.minimum, Vec3(-1.0, 0.0, 0.0));
        assert_eq!(grown.maximum, Vec3(1.0, 2.0, 3.0));
    }

    #[test]
    fn unit_cube_area() {
        let cube = AABB::new(Vec3::zero(), Vec3::one());
        assert_eq!(cube.area(), 6.0);
    }

    #[test]
    fn containment_is_inclusive() {
        let outer = AABB::new(Vec3::zero(), Vec3(2.0, 2.0, 2.0));
        let inner = AABB::new(Vec3(0.5, 0.0, 0.5), Vec3(2.0, 1.0, 1.0));
        assert!(outer.contains(&inner));
        assert!(!inner.contains(&outer));
        assert!(outer.contains(&AABB::empty()));
    }
}
