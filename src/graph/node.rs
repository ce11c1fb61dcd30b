// graph/node.rs — module node kinds and parameters
//
// Every node is one variant of `NodeKind`, stored in the graph arena and
// addressed by `ModuleId`. Scalar knobs are `Param`s: either a literal or
// a nested module, so any parameter can vary spatially.

use rand::Rng;
use rand_chacha::rand_core::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::fractal::FractalNode;
use super::{CellularId, ModuleId};

/// A scalar parameter: a plain number or a module evaluated at the same
/// query point. Builder methods take `impl Into<Param>`, so numeric
/// literals wrap themselves.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Param {
    Value(f64),
    Module(ModuleId),
}

impl From<f64> for Param {
    fn from(value: f64) -> Self {
        Param::Value(value)
    }
}

impl From<ModuleId> for Param {
    fn from(id: ModuleId) -> Self {
        Param::Module(id)
    }
}

impl Param {
    pub(crate) fn module(&self) -> Option<ModuleId> {
        match self {
            Param::Module(id) => Some(*id),
            Param::Value(_) => None,
        }
    }
}

/// Which raw primitive a basis function samples.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BasisKind {
    Value,
    #[default]
    Gradient,
    GradientValue,
    White,
    Simplex,
}

/// Octave blending algorithm of a fractal node.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FractalKind {
    #[default]
    Fbm,
    RidgedMulti,
    Billow,
    Multi,
    HybridMulti,
}

/// Reduction applied by a combiner over its source set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CombinerKind {
    Add,
    Multiply,
    Min,
    Max,
    Average,
}

/// Elementwise single-source math.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOp {
    Ceiling,
    Floor,
    Sin,
    Cos,
    Tan,
    Log,
    Invert,
}

impl UnaryOp {
    #[inline]
    pub(crate) fn apply(self, v: f64) -> f64 {
        match self {
            UnaryOp::Ceiling => v.ceil(),
            UnaryOp::Floor => v.floor(),
            UnaryOp::Sin => v.sin(),
            UnaryOp::Cos => v.cos(),
            UnaryOp::Tan => v.tan(),
            // ln of zero/negative sources propagates -inf/NaN untouched.
            UnaryOp::Log => v.ln(),
            UnaryOp::Invert => -v,
        }
    }
}

/// Per-seed random rotation applied by a basis function before sampling,
/// decorrelating octaves built from sequential seeds. 2D rotates by a
/// random angle; 3D+ rotates x/y/z by a random axis-angle frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BasisRotation {
    pub cos2d: f64,
    pub sin2d: f64,
    pub mat: [[f64; 3]; 3],
}

impl BasisRotation {
    pub fn from_seed(seed: i32) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed as u32 as u64);

        let ax: f64 = rng.gen::<f64>();
        let ay: f64 = rng.gen::<f64>();
        let az: f64 = rng.gen::<f64>();
        let len = (ax * ax + ay * ay + az * az).sqrt();
        let (ax, ay, az) = (ax / len, ay / len, az / len);
        let angle = rng.gen::<f64>() * std::f64::consts::TAU;
        let mat = axis_angle_matrix(ax, ay, az, angle);

        let angle2d = rng.gen::<f64>() * std::f64::consts::TAU;
        BasisRotation {
            cos2d: angle2d.cos(),
            sin2d: angle2d.sin(),
            mat,
        }
    }
}

/// Axis-angle rotation matrix, laid out for the row-vector multiply the
/// evaluator performs (`nx = m[0][0]x + m[1][0]y + m[2][0]z`, …).
pub(crate) fn axis_angle_matrix(x: f64, y: f64, z: f64, angle: f64) -> [[f64; 3]; 3] {
    let cos = angle.cos();
    let sin = angle.sin();
    let omc = 1.0 - cos;
    [
        [
            1.0 + omc * (x * x - 1.0),
            z * sin + omc * x * y,
            -y * sin + omc * x * z,
        ],
        [
            -z * sin + omc * x * y,
            1.0 + omc * (y * y - 1.0),
            x * sin + omc * y * z,
        ],
        [
            y * sin + omc * x * z,
            -x * sin + omc * y * z,
            1.0 + omc * (z * z - 1.0),
        ],
    ]
}

/// Basis function: one raw primitive plus its fixed per-seed rotation.
#[derive(Clone, Debug)]
pub struct BasisNode {
    pub basis: BasisKind,
    pub interp: crate::noise::InterpKind,
    pub seed: i32,
    pub rotation: BasisRotation,
}

impl BasisNode {
    pub fn new(basis: BasisKind, interp: crate::noise::InterpKind, seed: i32) -> Self {
        BasisNode {
            basis,
            interp,
            seed,
            rotation: BasisRotation::from_seed(seed),
        }
    }

    pub fn reseed(&mut self, seed: i32) {
        self.seed = seed;
        self.rotation = BasisRotation::from_seed(seed);
    }
}

/// Normalized projection onto the segment between two endpoints. The
/// deltas and squared lengths are fixed at construction; a degenerate
/// zero-length segment divides by zero and yields NaN, as documented.
#[derive(Clone, Debug)]
pub struct GradientNode {
    pub origin: [f64; 6],
    pub delta: [f64; 6],
    /// Squared segment length per dimensionality (2/3/4/6 components).
    pub len_sq: [f64; 4],
}

impl GradientNode {
    pub fn new(from: [f64; 6], to: [f64; 6]) -> Self {
        let delta: [f64; 6] = std::array::from_fn(|i| to[i] - from[i]);
        let partial = |n: usize| delta[..n].iter().map(|d| d * d).sum::<f64>();
        GradientNode {
            origin: from,
            delta,
            len_sq: [partial(2), partial(3), partial(4), partial(6)],
        }
    }
}

/// Monte-Carlo range correction; scale/bias are calibrated per
/// dimensionality when the node is built or re-targeted.
#[derive(Clone, Debug)]
pub struct AutoCorrectNode {
    pub source: ModuleId,
    pub low: f64,
    pub high: f64,
    pub scale: [f64; 4],
    pub bias: [f64; 4],
}

pub(crate) type SourceList = SmallVec<[ModuleId; 4]>;

#[derive(Clone, Debug)]
pub(crate) enum NodeKind {
    Constant {
        value: f64,
    },
    Basis(BasisNode),
    Gradient(GradientNode),
    Sphere {
        center: [Param; 6],
        radius: Param,
    },
    ScaleOffset {
        source: ModuleId,
        scale: Param,
        offset: Param,
    },
    ScaleDomain {
        source: ModuleId,
        scale: [Param; 6],
    },
    TranslateDomain {
        source: ModuleId,
        offset: [Param; 6],
    },
    RotateDomain {
        source: ModuleId,
        axis: [Param; 3],
        angle: Param,
    },
    Clamp {
        source: ModuleId,
        low: Param,
        high: Param,
    },
    Bias {
        source: ModuleId,
        bias: Param,
    },
    Gain {
        source: ModuleId,
        gain: Param,
    },
    Unary {
        op: UnaryOp,
        source: ModuleId,
    },
    Pow {
        source: ModuleId,
        power: Param,
    },
    BrightContrast {
        source: ModuleId,
        brightness: Param,
        threshold: Param,
        factor: Param,
    },
    Tiers {
        source: ModuleId,
        tiers: i32,
        smooth: bool,
    },
    Cache {
        source: ModuleId,
    },
    /// Diagnostic pass-through that counts evaluations. The counter does
    /// not affect the returned value.
    Probe {
        source: ModuleId,
        hits: std::sync::Arc<std::sync::atomic::AtomicU64>,
    },
    Blend {
        control: ModuleId,
        low: ModuleId,
        high: ModuleId,
    },
    Select {
        control: ModuleId,
        low: ModuleId,
        high: ModuleId,
        threshold: Param,
        falloff: Param,
    },
    Combiner {
        kind: CombinerKind,
        sources: SourceList,
    },
    Cellular {
        generator: CellularId,
        coefficients: [Param; 4],
    },
    Fractal(FractalNode),
    AutoCorrect(AutoCorrectNode),
}

impl NodeKind {
    /// Every module this node evaluates: sources, sub-modules and module
    /// parameters alike. Cycle detection walks this.
    pub(crate) fn children(&self) -> SmallVec<[ModuleId; 8]> {
        let mut out = SmallVec::new();
        let push_param = |p: &Param, out: &mut SmallVec<[ModuleId; 8]>| {
            if let Some(id) = p.module() {
                out.push(id);
            }
        };
        match self {
            NodeKind::Constant { .. } | NodeKind::Basis(_) | NodeKind::Gradient(_) => {}
            NodeKind::Sphere { center, radius } => {
                for p in center {
                    push_param(p, &mut out);
                }
                push_param(radius, &mut out);
            }
            NodeKind::ScaleOffset {
                source,
                scale,
                offset,
            } => {
                out.push(*source);
                push_param(scale, &mut out);
                push_param(offset, &mut out);
            }
            NodeKind::ScaleDomain { source, scale } => {
                out.push(*source);
                for p in scale {
                    push_param(p, &mut out);
                }
            }
            NodeKind::TranslateDomain { source, offset } => {
                out.push(*source);
                for p in offset {
                    push_param(p, &mut out);
                }
            }
            NodeKind::RotateDomain {
                source,
                axis,
                angle,
            } => {
                out.push(*source);
                for p in axis {
                    push_param(p, &mut out);
                }
                push_param(angle, &mut out);
            }
            NodeKind::Clamp { source, low, high } => {
                out.push(*source);
                push_param(low, &mut out);
                push_param(high, &mut out);
            }
            NodeKind::Bias { source, bias } => {
                out.push(*source);
                push_param(bias, &mut out);
            }
            NodeKind::Gain { source, gain } => {
                out.push(*source);
                push_param(gain, &mut out);
            }
            NodeKind::Unary { source, .. }
            | NodeKind::Cache { source }
            | NodeKind::Probe { source, .. } => out.push(*source),
            NodeKind::Pow { source, power } => {
                out.push(*source);
                push_param(power, &mut out);
            }
            NodeKind::BrightContrast {
                source,
                brightness,
                threshold,
                factor,
            } => {
                out.push(*source);
                push_param(brightness, &mut out);
                push_param(threshold, &mut out);
                push_param(factor, &mut out);
            }
            NodeKind::Tiers { source, .. } => out.push(*source),
            NodeKind::Blend { control, low, high } => {
                out.push(*control);
                out.push(*low);
                out.push(*high);
            }
            NodeKind::Select {
                control,
                low,
                high,
                threshold,
                falloff,
            } => {
                out.push(*control);
                out.push(*low);
                out.push(*high);
                push_param(threshold, &mut out);
                push_param(falloff, &mut out);
            }
            NodeKind::Combiner { sources, .. } => out.extend(sources.iter().copied()),
            NodeKind::Cellular { coefficients, .. } => {
                for p in coefficients {
                    push_param(p, &mut out);
                }
            }
            NodeKind::Fractal(f) => out.extend(f.sources.iter().copied()),
            NodeKind::AutoCorrect(a) => out.push(a.source),
        }
        out
    }
}
