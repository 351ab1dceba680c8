// Copyright @yucwang 2023

use crate::math::constants::{ Float, Vector3f };

#[derive(Debug, Copy, Clone)]
pub struct Frame {
    x: Vector3f,
    y: Vector3f,
    z: Vector3f
}

impl Frame {
    pub fn from_z(n: &Vector3f) -> Frame {
        let up = if n.z.abs() < 0.999 {
            Vector3f::new(0.0, 0.0, 1.0)
        } else {
            Vector3f::new(1.0, 0.0, 0.0)
        };
        let x = n.cross(&up).normalize();
        let y = n.cross(&x).normalize();
        Frame { x, y, z: *n }
    }

    pub fn from_local(&self, v: &Vector3f) -> Vector3f {
        v.x * self.x + v.y * self.y + v.z * self.z
    }
}

// Rotates the unit vector `dir` by polar angle `acos(cos_theta)` and
// azimuth `phi` about itself. The result is renormalized.
pub fn rotate_direction(dir: &Vector3f, cos_theta: Float, phi: Float) -> Vector3f {
    let cos_theta = cos_theta.clamp(-1.0, 1.0);
    let sin_theta = (1.0 - cos_theta * cos_theta).max(0.0).sqrt();
    let (sin_phi, cos_phi) = phi.sin_cos();
    let local = Vector3f::new(sin_theta * cos_phi, sin_theta * sin_phi, cos_theta);
    Frame::from_z(dir).from_local(&local).normalize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::constants::PI;

    #[test]
    fn frame_is_orthonormal() {
        let n = Vector3f::new(0.3, -0.4, 0.5).normalize();
        let frame = Frame::from_z(&n);
        assert!((frame.from_local(&Vector3f::new(0.0, 0.0, 1.0)) - n).norm() < 1e-12);
        let x = frame.from_local(&Vector3f::new(1.0, 0.0, 0.0));
        let y = frame.from_local(&Vector3f::new(0.0, 1.0, 0.0));
        assert!(x.dot(&y).abs() < 1e-12);
        assert!(x.dot(&n).abs() < 1e-12);
        assert!((x.norm() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn rotate_direction_keeps_polar_angle() {
        let dir = Vector3f::new(0.0, 0.0, 1.0);
        let out = rotate_direction(&dir, 0.25, 1.3);
        assert!((out.dot(&dir) - 0.25).abs() < 1e-12);
        assert!((out.norm() - 1.0).abs() < 1e-12);

        let back = rotate_direction(&dir, -1.0, 0.0);
        assert!((back + dir).norm() < 1e-12);

        let tilted = Vector3f::new(1.0, 1.0, 1.0).normalize();
        let out = rotate_direction(&tilted, 0.0, PI / 3.0);
        assert!(out.dot(&tilted).abs() < 1e-12);
    }
}
