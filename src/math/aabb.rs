// Copyright 2020 @TwoCookingMice

use super::constants::{ Float, Vector3f };
use super::ray::{ Ray3f };

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct AABB {
    pub p_min: Vector3f,
    pub p_max: Vector3f
}

impl AABB {
    pub fn new(p_min: Vector3f, p_max: Vector3f) -> Self {
        let mut min = Vector3f::zeros();
        let mut max = Vector3f::zeros();
        for idx in 0..3 {
            min[idx] = p_min[idx].min(p_max[idx]);
            max[idx] = p_max[idx].max(p_min[idx]);
        }
        Self { p_min: min, p_max: max }
    }

    pub fn center(&self) -> Vector3f {
        0.5 * self.p_min + 0.5 * self.p_max
    }

    pub fn diagonal(&self) -> Vector3f {
        self.p_max - self.p_min
    }

    pub fn volume(&self) -> Float {
        let d = self.diagonal();
        d.x * d.y * d.z
    }

    // Half-open containment: the max faces belong to the neighbour.
    pub fn contains(&self, p: &Vector3f) -> bool {
        (0..3).all(|idx| p[idx] >= self.p_min[idx] && p[idx] < self.p_max[idx])
    }

    pub fn contains_closed(&self, p: &Vector3f) -> bool {
        (0..3).all(|idx| p[idx] >= self.p_min[idx] && p[idx] <= self.p_max[idx])
    }

    pub fn ray_intersect_range(&self, ray: &Ray3f) -> Option<(Float, Float)> {
        if !self.is_valid() {
            return None;
        }

        let o = ray.origin();
        let d = ray.dir();
        let mut t_min = ray.min_t;
        let mut t_max = ray.max_t;

        for idx in 0..3 {
            let dir = d[idx];
            if dir.abs() < 1e-12 {
                if o[idx] < self.p_min[idx] || o[idx] > self.p_max[idx] {
                    return None;
                }
                continue;
            }

            let inv = 1.0 / dir;
            let mut t0 = (self.p_min[idx] - o[idx]) * inv;
            let mut t1 = (self.p_max[idx] - o[idx]) * inv;
            if t0 > t1 {
                std::mem::swap(&mut t0, &mut t1);
            }

            t_min = t_min.max(t0);
            t_max = t_max.min(t1);
            if t_max < t_min {
                return None;
            }
        }

        Some((t_min, t_max))
    }

    pub fn exit_distance(&self, p: &Vector3f, d: &Vector3f) -> Float {
        let mut t = Float::INFINITY;
        for idx in 0..3 {
            if d[idx] > 0.0 {
                t = t.min((self.p_max[idx] - p[idx]) / d[idx]);
            } else if d[idx] < 0.0 {
                t = t.min((self.p_min[idx] - p[idx]) / d[idx]);
            }
        }
        t.max(0.0)
    }

    pub fn is_valid(&self) -> bool {
        (0..3).all(|idx| self.p_min[idx] <= self.p_max[idx])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aabb_geometry() {
        let bbox = AABB::new(Vector3f::new(1.0, 7.0, 3.0), Vector3f::new(4.0, 4.0, 4.0));
        assert_eq!(bbox.center(), Vector3f::new(2.5, 5.5, 3.5));
        assert!((bbox.volume() - 9.0).abs() < 1e-12);
        assert!(bbox.contains(&Vector3f::new(1.0, 4.0, 3.0)));
        assert!(!bbox.contains(&Vector3f::new(4.0, 5.0, 3.5)));
        assert!(bbox.contains_closed(&Vector3f::new(4.0, 5.0, 3.5)));
    }

    #[test]
    fn aabb_intersect_range() {
        let bbox = AABB::new(Vector3f::new(-1.0, -1.0, -1.0), Vector3f::new(1.0, 1.0, 1.0));

        let ray = Ray3f::new(Vector3f::new(-3.0, 0.0, 0.0), Vector3f::new(1.0, 0.0, 0.0), None, None);
        let (t0, t1) = bbox.ray_intersect_range(&ray).unwrap();
        assert!((t0 - 2.0).abs() < 1e-12);
        assert!((t1 - 4.0).abs() < 1e-12);

        let short = Ray3f::new(Vector3f::new(-3.0, 0.0, 0.0), Vector3f::new(1.0, 0.0, 0.0), None, Some(1.0));
        assert!(bbox.ray_intersect_range(&short).is_none());

        let away = Ray3f::new(Vector3f::new(-1.1, 0.0, 0.0), Vector3f::new(-0.1, 10.0, 10.0), None, None);
        assert!(bbox.ray_intersect_range(&away).is_none());
    }

    #[test]
    fn aabb_exit_distance() {
        let bbox = AABB::new(Vector3f::new(0.0, 0.0, 0.0), Vector3f::new(2.0, 2.0, 2.0));
        let p = Vector3f::new(0.5, 1.0, 1.0);
        assert!((bbox.exit_distance(&p, &Vector3f::new(1.0, 0.0, 0.0)) - 1.5).abs() < 1e-12);
        assert!((bbox.exit_distance(&p, &Vector3f::new(-1.0, 0.0, 0.0)) - 0.5).abs() < 1e-12);
        let diag = Vector3f::new(1.0, 1.0, 0.0).normalize();
        assert!((bbox.exit_distance(&p, &diag) - 2.0f64.sqrt()).abs() < 1e-12);
    }
}
