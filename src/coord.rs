// coord.rs — fixed-arity coordinate vectors
//
// Module evaluation is generic over the query arity. Each supported
// dimensionality implements `Coord` once, wiring in its primitive noise
// functions; the graph evaluator is written a single time against the
// trait instead of four near-identical overload sets.

use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::noise::cellular::{cellular_2, cellular_3, cellular_4, cellular_6, CellSample};
use crate::noise::interp::InterpKind;
use crate::noise::lattice;
use crate::noise::simplex;

/// A query point in one of the supported dimensionalities (2, 3, 4, 6).
///
/// Equality is bit-exact component equality; the per-node memo slots rely
/// on that, so `Coord` deliberately does not round or normalize.
pub trait Coord: Copy + PartialEq + Send + Sync + 'static {
    /// Number of axes.
    const DIM: usize;
    /// Dense index for per-dimensionality tables (2→0, 3→1, 4→2, 6→3).
    const DIM_INDEX: usize;

    fn axis(&self, i: usize) -> f64;
    fn set_axis(&mut self, i: usize, value: f64);

    fn value_noise(self, seed: i32, interp: InterpKind) -> f64;
    fn gradient_noise(self, seed: i32, interp: InterpKind) -> f64;
    fn white_noise(self, seed: i32) -> f64;
    fn simplex_noise(self, seed: i32) -> f64;
    fn cellular(self, seed: i32) -> CellSample;

    /// Uniform point in [-2, 2] per axis, for auto-correct calibration.
    fn random_probe(rng: &mut ChaCha8Rng) -> Self;

    fn gradient_value_noise(self, seed: i32, interp: InterpKind) -> f64 {
        self.value_noise(seed, interp) + self.gradient_noise(seed, interp)
    }
}

macro_rules! coord_common {
    ($n:literal, $dim_index:literal) => {
        const DIM: usize = $n;
        const DIM_INDEX: usize = $dim_index;

        #[inline]
        fn axis(&self, i: usize) -> f64 {
            self[i]
        }

        #[inline]
        fn set_axis(&mut self, i: usize, value: f64) {
            self[i] = value;
        }

        #[inline]
        fn value_noise(self, seed: i32, interp: InterpKind) -> f64 {
            lattice::value_noise(self, seed, interp)
        }

        #[inline]
        fn white_noise(self, seed: i32) -> f64 {
            lattice::white_noise(self, seed)
        }

        fn random_probe(rng: &mut ChaCha8Rng) -> Self {
            std::array::from_fn(|_| rng.gen_range(-2.0..2.0))
        }
    };
}

impl Coord for [f64; 2] {
    coord_common!(2, 0);

    #[inline]
    fn gradient_noise(self, seed: i32, interp: InterpKind) -> f64 {
        lattice::gradient_noise_2(self, seed, interp)
    }

    #[inline]
    fn simplex_noise(self, seed: i32) -> f64 {
        simplex::simplex_2(self, seed)
    }

    #[inline]
    fn cellular(self, seed: i32) -> CellSample {
        cellular_2(self, seed)
    }
}

impl Coord for [f64; 3] {
    coord_common!(3, 1);

    #[inline]
    fn gradient_noise(self, seed: i32, interp: InterpKind) -> f64 {
        lattice::gradient_noise_3(self, seed, interp)
    }

    #[inline]
    fn simplex_noise(self, seed: i32) -> f64 {
        simplex::simplex_3(self, seed)
    }

    #[inline]
    fn cellular(self, seed: i32) -> CellSample {
        cellular_3(self, seed)
    }
}

impl Coord for [f64; 4] {
    coord_common!(4, 2);

    #[inline]
    fn gradient_noise(self, seed: i32, interp: InterpKind) -> f64 {
        lattice::gradient_noise_4(self, seed, interp)
    }

    #[inline]
    fn simplex_noise(self, seed: i32) -> f64 {
        simplex::simplex_4(self, seed)
    }

    #[inline]
    fn cellular(self, seed: i32) -> CellSample {
        cellular_4(self, seed)
    }
}

impl Coord for [f64; 6] {
    coord_common!(6, 3);

    #[inline]
    fn gradient_noise(self, seed: i32, interp: InterpKind) -> f64 {
        lattice::gradient_noise_6(self, seed, interp)
    }

    #[inline]
    fn simplex_noise(self, seed: i32) -> f64 {
        simplex::simplex_6(self, seed)
    }

    #[inline]
    fn cellular(self, seed: i32) -> CellSample {
        cellular_6(self, seed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand_chacha::rand_core::SeedableRng;

    #[test]
    fn dim_indices_are_dense() {
        assert_eq!(<[f64; 2]>::DIM_INDEX, 0);
        assert_eq!(<[f64; 3]>::DIM_INDEX, 1);
        assert_eq!(<[f64; 4]>::DIM_INDEX, 2);
        assert_eq!(<[f64; 6]>::DIM_INDEX, 3);
    }

    #[test]
    fn axis_roundtrip() {
        let mut p = [1.0, 2.0, 3.0];
        p.set_axis(1, 9.0);
        assert_eq!(p.axis(1), 9.0);
        assert_eq!(p, [1.0, 9.0, 3.0]);
    }

    #[test]
    fn probe_stays_in_window() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        for _ in 0..100 {
            let p = <[f64; 6]>::random_probe(&mut rng);
            for i in 0..6 {
                assert!((-2.0..2.0).contains(&p.axis(i)));
            }
        }
    }

    #[test]
    fn trait_dispatch_matches_free_functions() {
        let p2 = [0.4, 0.8];
        assert_eq!(
            p2.simplex_noise(5).to_bits(),
            crate::noise::simplex::simplex_2(p2, 5).to_bits()
        );
        let p4 = [0.4, 0.8, 1.2, 1.6];
        assert_eq!(
            p4.value_noise(5, InterpKind::Quintic).to_bits(),
            crate::noise::lattice::value_noise(p4, 5, InterpKind::Quintic).to_bits()
        );
    }
}
