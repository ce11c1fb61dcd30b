// noise/lut.rs — gradient and white-noise lookup tables
//
// 256 pseudo-random unit vectors per dimensionality, plus 256 uniform
// values in [-1, 1] for white noise. The 8-bit coordinate hash indexes
// straight into these. Tables are built once, from a fixed seed, so every
// process sees the same field for the same module seeds.

use std::sync::OnceLock;

use rand::Rng;
use rand_chacha::rand_core::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Stream seed for table construction. Changing this changes the visual
/// character of every gradient basis; it is not exposed.
const TABLE_SEED: u64 = 0x4e6f_6973_6547_7261; // "NoiseGra"

pub struct NoiseTables {
    pub gradient2: [[f64; 2]; 256],
    pub gradient3: [[f64; 3]; 256],
    pub gradient4: [[f64; 4]; 256],
    pub gradient6: [[f64; 6]; 256],
    pub white: [f64; 256],
}

/// Draw a random unit vector by rejection sampling inside the unit ball.
fn unit_vector<const N: usize>(rng: &mut ChaCha8Rng) -> [f64; N] {
    loop {
        let mut v = [0.0; N];
        let mut len_sq: f64 = 0.0;
        for c in v.iter_mut() {
            *c = rng.gen_range(-1.0..1.0);
            len_sq += *c * *c;
        }
        if len_sq > 1e-4 && len_sq <= 1.0 {
            let inv = 1.0 / len_sq.sqrt();
            for c in v.iter_mut() {
                *c *= inv;
            }
            return v;
        }
    }
}

fn build_tables() -> NoiseTables {
    let mut rng = ChaCha8Rng::seed_from_u64(TABLE_SEED);

    let mut gradient2 = [[0.0; 2]; 256];
    for g in gradient2.iter_mut() {
        *g = unit_vector(&mut rng);
    }
    let mut gradient3 = [[0.0; 3]; 256];
    for g in gradient3.iter_mut() {
        *g = unit_vector(&mut rng);
    }
    let mut gradient4 = [[0.0; 4]; 256];
    for g in gradient4.iter_mut() {
        *g = unit_vector(&mut rng);
    }
    let mut gradient6 = [[0.0; 6]; 256];
    for g in gradient6.iter_mut() {
        *g = unit_vector(&mut rng);
    }
    let mut white = [0.0; 256];
    for w in white.iter_mut() {
        *w = rng.gen_range(-1.0..1.0);
    }

    NoiseTables {
        gradient2,
        gradient3,
        gradient4,
        gradient6,
        white,
    }
}

/// Shared table instance, built on first use.
pub fn tables() -> &'static NoiseTables {
    static TABLES: OnceLock<NoiseTables> = OnceLock::new();
    TABLES.get_or_init(build_tables)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_unit(v: &[f64]) {
        let len_sq: f64 = v.iter().map(|c| c * c).sum();
        assert!(
            (len_sq - 1.0).abs() < 1e-12,
            "gradient not unit length: |v|² = {len_sq}"
        );
    }

    #[test]
    fn gradients_are_unit_length() {
        let t = tables();
        for g in &t.gradient2 {
            assert_unit(g);
        }
        for g in &t.gradient3 {
            assert_unit(g);
        }
        for g in &t.gradient4 {
            assert_unit(g);
        }
        for g in &t.gradient6 {
            assert_unit(g);
        }
    }

    #[test]
    fn white_values_in_range() {
        for &w in &tables().white {
            assert!((-1.0..1.0).contains(&w));
        }
    }

    #[test]
    fn tables_are_stable_across_calls() {
        let a = tables();
        let b = tables();
        assert!(std::ptr::eq(a, b));
    }

    #[test]
    fn gradients_are_not_axis_aligned_duplicates() {
        // Sanity: the table should contain a spread of directions, not a
        // degenerate repeat of one vector.
        let t = tables();
        let first = t.gradient2[0];
        let repeats = t
            .gradient2
            .iter()
            .filter(|g| (g[0] - first[0]).abs() < 1e-9 && (g[1] - first[1]).abs() < 1e-9)
            .count();
        assert!(repeats < 4);
    }
}
