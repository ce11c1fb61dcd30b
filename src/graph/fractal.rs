// graph/fractal.rs — fractal octave tables
//
// A fractal node owns up to MAX_OCTAVES per-octave sources plus two
// precomputed tables: the exponent (amplitude) per octave and a
// (scale, bias) pair per octave count that remaps the analytically
// estimated cumulative min/max into [-1, 1]. The tables are recomputed
// eagerly on every parameter change; evaluation never sees a stale table.

use smallvec::SmallVec;

use super::node::FractalKind;
use super::ModuleId;

/// Fixed per-fractal source limit. Octave counts beyond this are rejected
/// at configuration time.
pub const MAX_OCTAVES: usize = 20;

#[derive(Clone, Debug)]
pub struct FractalNode {
    pub kind: FractalKind,
    pub octaves: usize,
    pub frequency: f64,
    pub lacunarity: f64,
    pub gain: f64,
    pub offset: f64,
    pub h: f64,
    pub seed: i32,
    /// Active octave sources. Slot i defaults to `basis_sources[i]` and
    /// may be overridden with any module.
    pub sources: SmallVec<[ModuleId; MAX_OCTAVES]>,
    /// The fractal's own basis functions, kept for override resets.
    pub basis_sources: SmallVec<[ModuleId; MAX_OCTAVES]>,
    pub exponents: [f64; MAX_OCTAVES],
    /// (scale, bias) per octave count, indexed by `octaves - 1`.
    pub correct: [(f64, f64); MAX_OCTAVES],
}

impl FractalNode {
    /// Per-algorithm spectral defaults, applied when the kind changes.
    pub fn apply_kind_defaults(&mut self) {
        let (h, gain, offset) = match self.kind {
            FractalKind::Fbm | FractalKind::Billow | FractalKind::Multi => (1.0, 0.0, 0.0),
            FractalKind::RidgedMulti => (0.9, 2.0, 1.0),
            FractalKind::HybridMulti => (0.25, 1.0, 0.7),
        };
        self.h = h;
        self.gain = gain;
        self.offset = offset;
    }

    /// Rebuild the exponent and correction tables from the current
    /// parameters.
    pub fn recalculate(&mut self) {
        for (i, e) in self.exponents.iter_mut().enumerate() {
            *e = self.lacunarity.powf(-(i as f64) * self.h);
        }
        match self.kind {
            FractalKind::Fbm | FractalKind::Billow => self.additive_weights(-1.0, 1.0),
            FractalKind::RidgedMulti => self.additive_weights(
                (self.offset - 1.0) * (self.offset - 1.0),
                self.offset * self.offset,
            ),
            FractalKind::Multi => self.multiplicative_weights(),
            FractalKind::HybridMulti => self.hybrid_weights(),
        }
        log::trace!(
            "fractal tables rebuilt: kind={:?} octaves={} lacunarity={} h={}",
            self.kind,
            self.octaves,
            self.lacunarity,
            self.h
        );
    }

    /// Additive accumulation: after i octaves the reachable extremes are
    /// the running sums of `per_octave_{min,max} · exponent[i]`.
    fn additive_weights(&mut self, per_octave_min: f64, per_octave_max: f64) {
        let mut min_value = 0.0;
        let mut max_value = 0.0;
        for i in 0..MAX_OCTAVES {
            min_value += per_octave_min * self.exponents[i];
            max_value += per_octave_max * self.exponents[i];
            self.correct[i] = affine_into_unit(min_value, max_value);
        }
    }

    fn multiplicative_weights(&mut self) {
        let mut min_value = 1.0;
        let mut max_value = 1.0;
        for i in 0..MAX_OCTAVES {
            min_value *= -self.exponents[i] + 1.0;
            max_value *= self.exponents[i] + 1.0;
            self.correct[i] = affine_into_unit(min_value, max_value);
        }
    }

    /// Hybrid accumulation damps each octave by a running weight that is
    /// itself driven by the signal, so the extreme estimate has to carry
    /// a min- and max-side weight forward in lockstep.
    fn hybrid_weights(&mut self) {
        let mut min_value = self.offset - 1.0;
        let mut max_value = self.offset + 1.0;
        let mut weight_min = self.gain * min_value;
        let mut weight_max = self.gain * max_value;

        self.correct[0] = affine_into_unit(min_value, max_value);

        for i in 1..MAX_OCTAVES {
            weight_min = weight_min.min(1.0);
            weight_max = weight_max.min(1.0);

            let signal = (self.offset - 1.0) * self.exponents[i];
            min_value += signal * weight_min;
            weight_min *= self.gain * signal;

            let signal = (self.offset + 1.0) * self.exponents[i];
            max_value += signal * weight_max;
            weight_max *= self.gain * signal;

            self.correct[i] = affine_into_unit(min_value, max_value);
        }
    }
}

/// Solve `scale·v + bias` mapping [min, max] onto [-1, 1].
fn affine_into_unit(min_value: f64, max_value: f64) -> (f64, f64) {
    let scale = 2.0 / (max_value - min_value);
    let bias = -1.0 - min_value * scale;
    (scale, bias)
}

#[cfg(test)]
mod tests {
    use super::*;
    use smallvec::smallvec;

    fn node(kind: FractalKind, octaves: usize, lacunarity: f64) -> FractalNode {
        let mut f = FractalNode {
            kind,
            octaves,
            frequency: 1.0,
            lacunarity,
            gain: 0.0,
            offset: 0.0,
            h: 1.0,
            seed: 0,
            sources: smallvec![],
            basis_sources: smallvec![],
            exponents: [0.0; MAX_OCTAVES],
            correct: [(0.0, 0.0); MAX_OCTAVES],
        };
        f.apply_kind_defaults();
        f.recalculate();
        f
    }

    #[test]
    fn exponents_decay_geometrically() {
        let f = node(FractalKind::Fbm, 8, 2.0);
        assert_eq!(f.exponents[0], 1.0);
        assert!((f.exponents[1] - 0.5).abs() < 1e-12);
        assert!((f.exponents[2] - 0.25).abs() < 1e-12);
    }

    #[test]
    fn fbm_correction_maps_extremes_to_unit() {
        let f = node(FractalKind::Fbm, 8, 2.0);
        for i in 0..MAX_OCTAVES {
            // Reachable sum after i+1 octaves, mapped through the table.
            let reach: f64 = f.exponents[..=i].iter().sum();
            let (scale, bias) = f.correct[i];
            assert!((reach * scale + bias - 1.0).abs() < 1e-9);
            assert!((-reach * scale + bias + 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn ridged_defaults_applied() {
        let f = node(FractalKind::RidgedMulti, 6, 2.0);
        assert_eq!(f.h, 0.9);
        assert_eq!(f.gain, 2.0);
        assert_eq!(f.offset, 1.0);
    }

    #[test]
    fn ridged_correction_spans_offset_square() {
        let f = node(FractalKind::RidgedMulti, 6, 2.0);
        // With offset 1 the per-octave range is [0, 1]; after one octave
        // the correction maps [0, 1] to [-1, 1].
        let (scale, bias) = f.correct[0];
        assert!((bias - (-1.0)).abs() < 1e-12);
        assert!((scale - 2.0).abs() < 1e-12);
    }

    #[test]
    fn multi_correction_is_finite_for_deep_fractals() {
        let f = node(FractalKind::Multi, MAX_OCTAVES, 2.0);
        for (scale, bias) in f.correct {
            assert!(scale.is_finite() && bias.is_finite());
        }
    }

    #[test]
    fn hybrid_tables_finite() {
        let f = node(FractalKind::HybridMulti, 12, 2.0);
        for (scale, bias) in f.correct.iter().take(12) {
            assert!(scale.is_finite() && bias.is_finite());
        }
    }

    #[test]
    fn recalculate_tracks_lacunarity_change() {
        let mut f = node(FractalKind::Fbm, 8, 2.0);
        let before = f.correct[7];
        f.lacunarity = 3.0;
        f.recalculate();
        assert_ne!(before, f.correct[7]);
        assert!((f.exponents[1] - 1.0 / 3.0).abs() < 1e-12);
    }
}
