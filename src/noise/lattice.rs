// noise/lattice.rs — value, gradient, gradient-value and white noise
//
// Lattice noise hashes the 2^D corners of the unit hypercube around the
// query point and blends them axis by axis: X innermost, then Y, Z, …
// exactly one lerp per axis level. The recursion below writes that once
// for every dimensionality instead of once per overload.

use super::hash::{fast_floor, hash_lattice, hash_point};
use super::interp::{lerp, InterpKind};
use super::lut::tables;

/// Pseudo-random corner value in [-1, 1] for one lattice point.
#[inline]
pub(crate) fn corner_value<const N: usize>(lattice: [i32; N], seed: i32) -> f64 {
    hash_lattice(lattice, seed) as f64 / 255.0 * 2.0 - 1.0
}

/// Gradient contribution of one corner: dot of the hashed table gradient
/// with the offset from the corner to the query point.
#[inline]
fn corner_gradient<const N: usize>(
    p: &[f64; N],
    lattice: &[i32; N],
    seed: i32,
    table: &'static [[f64; N]; 256],
) -> f64 {
    let g = &table[hash_lattice(*lattice, seed) as usize];
    let mut dot = 0.0;
    for i in 0..N {
        dot += (p[i] - lattice[i] as f64) * g[i];
    }
    dot
}

/// Blend corner contributions along axes [0..=axis]. The caller starts at
/// the last axis, so the outermost lerp runs along the final coordinate.
fn blend_axis<const N: usize, W>(
    p: &[f64; N],
    cell: &[i32; N],
    weights: &[f64; N],
    corner: &mut [i32; N],
    axis: usize,
    seed: i32,
    worker: &W,
) -> f64
where
    W: Fn(&[f64; N], &[i32; N], i32) -> f64,
{
    let v1;
    let v2;
    if axis == 0 {
        corner[0] = cell[0];
        v1 = worker(p, corner, seed);
        corner[0] = cell[0] + 1;
        v2 = worker(p, corner, seed);
    } else {
        corner[axis] = cell[axis];
        v1 = blend_axis(p, cell, weights, corner, axis - 1, seed, worker);
        corner[axis] = cell[axis] + 1;
        v2 = blend_axis(p, cell, weights, corner, axis - 1, seed, worker);
    }
    lerp(weights[axis], v1, v2)
}

fn lattice_noise<const N: usize, W>(p: [f64; N], seed: i32, interp: InterpKind, worker: W) -> f64
where
    W: Fn(&[f64; N], &[i32; N], i32) -> f64,
{
    let mut cell = [0i32; N];
    let mut weights = [0.0; N];
    for i in 0..N {
        cell[i] = fast_floor(p[i]);
        weights[i] = interp.apply(p[i] - cell[i] as f64);
    }
    let mut corner = cell;
    blend_axis(&p, &cell, &weights, &mut corner, N - 1, seed, &worker)
}

/// Value noise over N lattice corners, roughly in [-1, 1].
pub fn value_noise<const N: usize>(p: [f64; N], seed: i32, interp: InterpKind) -> f64 {
    lattice_noise(p, seed, interp, |_, l, s| corner_value(*l, s))
}

pub fn gradient_noise_2(p: [f64; 2], seed: i32, interp: InterpKind) -> f64 {
    lattice_noise(p, seed, interp, |p, l, s| {
        corner_gradient(p, l, s, &tables().gradient2)
    })
}

pub fn gradient_noise_3(p: [f64; 3], seed: i32, interp: InterpKind) -> f64 {
    lattice_noise(p, seed, interp, |p, l, s| {
        corner_gradient(p, l, s, &tables().gradient3)
    })
}

pub fn gradient_noise_4(p: [f64; 4], seed: i32, interp: InterpKind) -> f64 {
    lattice_noise(p, seed, interp, |p, l, s| {
        corner_gradient(p, l, s, &tables().gradient4)
    })
}

pub fn gradient_noise_6(p: [f64; 6], seed: i32, interp: InterpKind) -> f64 {
    lattice_noise(p, seed, interp, |p, l, s| {
        corner_gradient(p, l, s, &tables().gradient6)
    })
}

// Gradient-value noise is the plain sum of the two kinds above. Wider
// range than either; downstream auto-correction deals with it.

pub fn gradient_value_noise_2(p: [f64; 2], seed: i32, interp: InterpKind) -> f64 {
    value_noise(p, seed, interp) + gradient_noise_2(p, seed, interp)
}

pub fn gradient_value_noise_3(p: [f64; 3], seed: i32, interp: InterpKind) -> f64 {
    value_noise(p, seed, interp) + gradient_noise_3(p, seed, interp)
}

pub fn gradient_value_noise_4(p: [f64; 4], seed: i32, interp: InterpKind) -> f64 {
    value_noise(p, seed, interp) + gradient_noise_4(p, seed, interp)
}

pub fn gradient_value_noise_6(p: [f64; 6], seed: i32, interp: InterpKind) -> f64 {
    value_noise(p, seed, interp) + gradient_noise_6(p, seed, interp)
}

/// White noise: hash the raw point straight into the value table. No
/// coherence, no interpolation.
pub fn white_noise<const N: usize>(p: [f64; N], seed: i32) -> f64 {
    tables().white[hash_point(p, seed) as usize]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_noise_deterministic() {
        let a = value_noise([1.3, -2.7], 42, InterpKind::Quintic);
        let b = value_noise([1.3, -2.7], 42, InterpKind::Quintic);
        assert_eq!(a.to_bits(), b.to_bits());
    }

    #[test]
    fn value_noise_in_range() {
        for i in 0..200 {
            let p = [i as f64 * 0.37 - 30.0, i as f64 * 0.91 + 4.0];
            let v = value_noise(p, 7, InterpKind::Quintic);
            assert!((-1.0..=1.0).contains(&v), "value_noise({p:?}) = {v}");
        }
    }

    #[test]
    fn value_noise_hits_corner_values_at_lattice_points() {
        // At an (offset) lattice point all blend weights are zero, so the
        // result is the corner hash itself.
        let v = value_noise([3.0, 5.0], 11, InterpKind::Quintic);
        let c = corner_value([super::fast_floor(3.0), super::fast_floor(5.0)], 11);
        assert_eq!(v.to_bits(), c.to_bits());
    }

    #[test]
    fn gradient_noise_bounded_all_dims() {
        for i in 0..100 {
            let t = i as f64 * 0.61 - 20.0;
            let g2 = gradient_noise_2([t, t * 0.7], 3, InterpKind::Quintic);
            let g3 = gradient_noise_3([t, t * 0.7, t * 1.3], 3, InterpKind::Quintic);
            let g4 = gradient_noise_4([t, t * 0.7, t * 1.3, t * 0.2], 3, InterpKind::Quintic);
            let g6 = gradient_noise_6(
                [t, t * 0.7, t * 1.3, t * 0.2, t * 2.1, t * 0.4],
                3,
                InterpKind::Quintic,
            );
            // Unit gradients over a unit cell bound the dot products.
            for g in [g2, g3, g4, g6] {
                assert!(g.abs() < 3.0, "gradient noise unbounded: {g}");
            }
        }
    }

    #[test]
    fn gradient_value_is_sum_of_parts() {
        let p = [0.4, 1.9, -3.3];
        let sum = value_noise(p, 5, InterpKind::Hermite) + gradient_noise_3(p, 5, InterpKind::Hermite);
        let gv = gradient_value_noise_3(p, 5, InterpKind::Hermite);
        assert_eq!(sum.to_bits(), gv.to_bits());
    }

    #[test]
    fn white_noise_is_incoherent() {
        // Adjacent samples should not be correlated the way lattice noise
        // is; check they are not all equal.
        let a = white_noise([0.5, 0.5], 1);
        let b = white_noise([0.5000001, 0.5], 1);
        let c = white_noise([0.5, 0.5000001], 1);
        assert!(a != b || a != c);
    }

    #[test]
    fn interp_none_returns_cell_corner() {
        // With the zero kernel every lerp picks its first operand: the
        // corner at the cell origin.
        let v = value_noise([4.4, 9.9], 23, InterpKind::None);
        let c = corner_value([4, 9], 23);
        assert_eq!(v.to_bits(), c.to_bits());
    }

    #[test]
    fn different_seeds_decorrelate() {
        let mut same = 0;
        for i in 0..50 {
            let p = [i as f64 * 0.77, i as f64 * 0.33];
            if value_noise(p, 1, InterpKind::Quintic) == value_noise(p, 2, InterpKind::Quintic) {
                same += 1;
            }
        }
        assert!(same < 5);
    }
}
