// Copyright @yucwang 2026

use crate::math::constants::{Float, Vector3f};

// Amanatides-Woo walk over a regular lattice of cells. Distances are
// measured from the start point along the (unit) direction.
#[derive(Debug, Clone)]
pub struct GridTraversal {
    cell: [isize; 3],
    step: [isize; 3],
    t_max: [Float; 3],
    t_delta: [Float; 3],
    dims: [usize; 3],
}

impl GridTraversal {
    // Starts in the cell holding `p`; points on or just outside the lattice
    // are clamped into the nearest boundary cell.
    pub fn new(origin: &Vector3f, cell_size: &Vector3f, dims: [usize; 3], p: &Vector3f, d: &Vector3f) -> Self {
        let mut cell = [0isize; 3];
        let mut step = [0isize; 3];
        let mut t_max = [Float::INFINITY; 3];
        let mut t_delta = [Float::INFINITY; 3];
        for a in 0..3 {
            let local = (p[a] - origin[a]) / cell_size[a];
            let c = (local.floor() as isize).clamp(0, dims[a] as isize - 1);
            cell[a] = c;
            if d[a] > 0.0 {
                step[a] = 1;
                let boundary = origin[a] + (c + 1) as Float * cell_size[a];
                t_max[a] = ((boundary - p[a]) / d[a]).max(0.0);
                t_delta[a] = cell_size[a] / d[a];
            } else if d[a] < 0.0 {
                step[a] = -1;
                let boundary = origin[a] + c as Float * cell_size[a];
                t_max[a] = ((boundary - p[a]) / d[a]).max(0.0);
                t_delta[a] = -cell_size[a] / d[a];
            }
        }
        Self { cell, step, t_max, t_delta, dims }
    }

    pub fn current(&self) -> Option<[usize; 3]> {
        let mut out = [0usize; 3];
        for a in 0..3 {
            if self.cell[a] < 0 || self.cell[a] >= self.dims[a] as isize {
                return None;
            }
            out[a] = self.cell[a] as usize;
        }
        Some(out)
    }

    pub fn exit_t(&self) -> Float {
        self.t_max[0].min(self.t_max[1]).min(self.t_max[2])
    }

    pub fn advance(&mut self) {
        let mut axis = 0;
        for a in 1..3 {
            if self.t_max[a] < self.t_max[axis] {
                axis = a;
            }
        }
        self.cell[axis] += self.step[axis];
        self.t_max[axis] += self.t_delta[axis];
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn walks_cells_along_axis() {
        let origin = Vector3f::zeros();
        let size = Vector3f::new(1.0, 1.0, 1.0);
        let mut walk = GridTraversal::new(&origin, &size, [4, 1, 1], &Vector3f::new(0.5, 0.5, 0.5), &Vector3f::new(1.0, 0.0, 0.0));
        let mut visited = Vec::new();
        while let Some(cell) = walk.current() {
            visited.push((cell[0], walk.exit_t()));
            walk.advance();
        }
        assert_eq!(visited.len(), 4);
        for (i, (cell, t)) in visited.iter().enumerate() {
            assert_eq!(*cell, i);
            assert!((t - (i as Float + 0.5)).abs() < 1e-12);
        }
    }

    #[test]
    fn diagonal_walk_leaves_through_negative_side() {
        let origin = Vector3f::new(-1.0, -1.0, -1.0);
        let size = Vector3f::new(0.5, 0.5, 0.5);
        let d = Vector3f::new(-1.0, -1.0, 0.0).normalize();
        let mut walk = GridTraversal::new(&origin, &size, [4, 4, 4], &Vector3f::new(0.9, 0.6, 0.1), &d);
        assert_eq!(walk.current(), Some([3, 3, 2]));
        let mut count = 0;
        let mut last_t = 0.0;
        while walk.current().is_some() {
            assert!(walk.exit_t() >= last_t);
            last_t = walk.exit_t();
            walk.advance();
            count += 1;
        }
        assert!(count >= 4);
        // leaves at y = -1
        assert!((last_t - 1.6 * 2f64.sqrt()).abs() < 1e-9);
    }
}
