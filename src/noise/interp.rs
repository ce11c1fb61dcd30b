// noise/interp.rs — blending kernels for lattice noise
//
// All lattice primitives blend corner contributions with one of these
// kernels. Quintic is the default: zero first and second derivative at
// both interval endpoints, which keeps octave sums seam-free.

use serde::{Deserialize, Serialize};

/// Which blending curve a basis function applies between lattice points.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InterpKind {
    /// Always 0 — requests raw lattice hashing with no blend.
    None,
    /// `t`
    Linear,
    /// `t²(3 − 2t)`
    Hermite,
    /// `t³(t(6t − 15) + 10)`
    #[default]
    Quintic,
}

impl InterpKind {
    #[inline]
    pub fn apply(self, t: f64) -> f64 {
        match self {
            InterpKind::None => 0.0,
            InterpKind::Linear => t,
            InterpKind::Hermite => t * t * (3.0 - 2.0 * t),
            InterpKind::Quintic => quintic_blend(t),
        }
    }
}

#[inline]
pub fn lerp(t: f64, a: f64, b: f64) -> f64 {
    a + t * (b - a)
}

/// The quintic curve on its own; select and tier nodes use it directly.
#[inline]
pub fn quintic_blend(t: f64) -> f64 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}
