// graph/eval.rs — depth-first graph evaluation
//
// One generic evaluator covers all four dimensionalities. The graph is
// read-only during evaluation; every piece of mutable evaluation state
// (per-node memo slots, per-generator cellular caches) lives in an
// `EvalState` owned by the calling thread. Parallel sampling hands each
// worker its own state, so a frozen graph evaluates concurrently without
// locks.

use crate::coord::Coord;
use crate::noise::cellular::CellSample;
use crate::noise::interp::{lerp, quintic_blend};

use super::node::{BasisKind, CombinerKind, NodeKind};
use super::{fractal::FractalNode, ModuleGraph, ModuleId};

// ── Evaluation state ────────────────────────────────────────────────

/// Single-slot memo for one node in one dimensionality: valid only while
/// the incoming coordinates compare bit-exact-equal to the stored ones.
#[derive(Clone, Copy, Default)]
pub(crate) struct MemoSlot<C> {
    at: C,
    value: f64,
    valid: bool,
}

/// Cached neighbor scan of one cellular generator.
#[derive(Clone, Copy, Default)]
pub(crate) struct CellSlot<C> {
    at: C,
    sample: CellSample,
    valid: bool,
}

/// Per-thread evaluation scratch: memo slots for every node and cellular
/// cache slots for every generator, one set per dimensionality. Slots of
/// different dimensionalities are fully independent.
///
/// A state is tied to the graph revision it last saw; any graph mutation
/// bumps the revision and the next evaluate through this state drops all
/// cached values.
pub struct EvalState {
    revision: u64,
    memo2: Vec<MemoSlot<[f64; 2]>>,
    memo3: Vec<MemoSlot<[f64; 3]>>,
    memo4: Vec<MemoSlot<[f64; 4]>>,
    memo6: Vec<MemoSlot<[f64; 6]>>,
    cell2: Vec<CellSlot<[f64; 2]>>,
    cell3: Vec<CellSlot<[f64; 3]>>,
    cell4: Vec<CellSlot<[f64; 4]>>,
    cell6: Vec<CellSlot<[f64; 6]>>,
}

impl EvalState {
    pub fn new(graph: &ModuleGraph) -> Self {
        let nodes = graph.node_count();
        let generators = graph.generator_count();
        EvalState {
            revision: graph.revision(),
            memo2: vec![MemoSlot::default(); nodes],
            memo3: vec![MemoSlot::default(); nodes],
            memo4: vec![MemoSlot::default(); nodes],
            memo6: vec![MemoSlot::default(); nodes],
            cell2: vec![CellSlot::default(); generators],
            cell3: vec![CellSlot::default(); generators],
            cell4: vec![CellSlot::default(); generators],
            cell6: vec![CellSlot::default(); generators],
        }
    }

    /// Drop every cached value if the graph changed since this state last
    /// evaluated through it.
    pub(crate) fn sync(&mut self, graph: &ModuleGraph) {
        if self.revision == graph.revision()
            && self.memo2.len() == graph.node_count()
            && self.cell2.len() == graph.generator_count()
        {
            return;
        }
        *self = EvalState::new(graph);
    }
}

/// Internal hook giving the generic evaluator the dimensionality-matched
/// slot vectors out of an `EvalState`.
pub(crate) trait SlotAccess: Coord + Default {
    fn memo(state: &mut EvalState) -> &mut Vec<MemoSlot<Self>>;
    fn cells(state: &mut EvalState) -> &mut Vec<CellSlot<Self>>;
}

macro_rules! slot_access {
    ($coord:ty, $memo:ident, $cells:ident) => {
        impl SlotAccess for $coord {
            fn memo(state: &mut EvalState) -> &mut Vec<MemoSlot<Self>> {
                &mut state.$memo
            }
            fn cells(state: &mut EvalState) -> &mut Vec<CellSlot<Self>> {
                &mut state.$cells
            }
        }
    };
}

slot_access!([f64; 2], memo2, cell2);
slot_access!([f64; 3], memo3, cell3);
slot_access!([f64; 4], memo4, cell4);
slot_access!([f64; 6], memo6, cell6);

// ── Small math helpers ──────────────────────────────────────────────

/// Range clamp that lets NaN fall through instead of snapping it to a
/// bound, and tolerates an inverted range without panicking.
#[inline]
fn clamp_to(v: f64, low: f64, high: f64) -> f64 {
    if v < low {
        low
    } else if v > high {
        high
    } else {
        v
    }
}

#[inline]
fn bias_curve(bias: f64, t: f64) -> f64 {
    t.powf(bias.ln() / 0.5_f64.ln())
}

#[inline]
fn gain_curve(gain: f64, t: f64) -> f64 {
    if t < 0.5 {
        bias_curve(1.0 - gain, 2.0 * t) / 2.0
    } else {
        1.0 - bias_curve(1.0 - gain, 2.0 - 2.0 * t) / 2.0
    }
}

#[inline]
fn scaled<C: Coord>(mut at: C, factor: f64) -> C {
    for i in 0..C::DIM {
        at.set_axis(i, at.axis(i) * factor);
    }
    at
}

/// Rotate x/y/z through a precomputed frame, passing trailing axes
/// through. 2D uses the frame's scalar angle instead.
fn rotate_frame<C: Coord>(at: C, cos2d: f64, sin2d: f64, mat: &[[f64; 3]; 3]) -> C {
    let mut out = at;
    if C::DIM == 2 {
        let (x, y) = (at.axis(0), at.axis(1));
        out.set_axis(0, x * cos2d - y * sin2d);
        out.set_axis(1, y * cos2d + x * sin2d);
    } else {
        let (x, y, z) = (at.axis(0), at.axis(1), at.axis(2));
        out.set_axis(0, mat[0][0] * x + mat[1][0] * y + mat[2][0] * z);
        out.set_axis(1, mat[0][1] * x + mat[1][1] * y + mat[2][1] * z);
        out.set_axis(2, mat[0][2] * x + mat[1][2] * y + mat[2][2] * z);
    }
    out
}

// ── Dispatch ────────────────────────────────────────────────────────

#[inline]
fn param<C: SlotAccess>(
    graph: &ModuleGraph,
    state: &mut EvalState,
    p: super::node::Param,
    at: C,
) -> f64 {
    match p {
        super::node::Param::Value(v) => v,
        super::node::Param::Module(id) => evaluate(graph, state, id, at),
    }
}

/// Evaluate `id` at `at`. Pure given the current graph: identical
/// coordinates against an unchanged graph return bit-identical results.
pub(crate) fn evaluate<C: SlotAccess>(
    graph: &ModuleGraph,
    state: &mut EvalState,
    id: ModuleId,
    at: C,
) -> f64 {
    match graph.kind(id) {
        NodeKind::Constant { value } => *value,

        NodeKind::Basis(b) => {
            let p = rotate_frame(at, b.rotation.cos2d, b.rotation.sin2d, &b.rotation.mat);
            match b.basis {
                BasisKind::Value => p.value_noise(b.seed, b.interp),
                BasisKind::Gradient => p.gradient_noise(b.seed, b.interp),
                BasisKind::GradientValue => p.gradient_value_noise(b.seed, b.interp),
                BasisKind::White => p.white_noise(b.seed),
                BasisKind::Simplex => p.simplex_noise(b.seed),
            }
        }

        NodeKind::Gradient(g) => {
            let mut dp = 0.0;
            for i in 0..C::DIM {
                dp += (at.axis(i) - g.origin[i]) * g.delta[i];
            }
            dp / g.len_sq[C::DIM_INDEX]
        }

        NodeKind::Sphere { center, radius } => {
            let mut dist_sq = 0.0;
            for i in 0..C::DIM {
                let d = at.axis(i) - param(graph, state, center[i], at);
                dist_sq += d * d;
            }
            let rad = param(graph, state, *radius, at);
            // Zero radius divides 0/0; the NaN flows through.
            clamp_to((rad - dist_sq.sqrt()) / rad, 0.0, 1.0)
        }

        NodeKind::ScaleOffset {
            source,
            scale,
            offset,
        } => {
            let v = evaluate(graph, state, *source, at);
            v * param(graph, state, *scale, at) + param(graph, state, *offset, at)
        }

        NodeKind::ScaleDomain { source, scale } => {
            let mut q = at;
            for i in 0..C::DIM {
                q.set_axis(i, at.axis(i) * param(graph, state, scale[i], at));
            }
            evaluate(graph, state, *source, q)
        }

        NodeKind::TranslateDomain { source, offset } => {
            let mut q = at;
            for i in 0..C::DIM {
                q.set_axis(i, at.axis(i) + param(graph, state, offset[i], at));
            }
            evaluate(graph, state, *source, q)
        }

        NodeKind::RotateDomain {
            source,
            axis,
            angle,
        } => {
            let turns = param(graph, state, *angle, at);
            let q = if C::DIM == 2 {
                // Truncated pi, not f64::consts::PI. Existing fields were
                // generated with this constant; changing it shifts them.
                let radians = turns * 360.0 * 3.141_592_65 / 180.0;
                let (sin, cos) = radians.sin_cos();
                rotate_frame(at, cos, sin, &[[0.0; 3]; 3])
            } else {
                let radians = turns * 360.0 * std::f64::consts::PI / 180.0;
                let ax = param(graph, state, axis[0], at);
                let ay = param(graph, state, axis[1], at);
                let az = param(graph, state, axis[2], at);
                let mat = super::node::axis_angle_matrix(ax, ay, az, radians);
                rotate_frame(at, 0.0, 0.0, &mat)
            };
            evaluate(graph, state, *source, q)
        }

        NodeKind::Clamp { source, low, high } => {
            let v = evaluate(graph, state, *source, at);
            let low = param(graph, state, *low, at);
            let high = param(graph, state, *high, at);
            clamp_to(v, low, high)
        }

        NodeKind::Bias { source, bias } => {
            let b = param(graph, state, *bias, at);
            bias_curve(b, evaluate(graph, state, *source, at))
        }

        NodeKind::Gain { source, gain } => {
            let g = param(graph, state, *gain, at);
            gain_curve(g, evaluate(graph, state, *source, at))
        }

        NodeKind::Unary { op, source } => op.apply(evaluate(graph, state, *source, at)),

        NodeKind::Pow { source, power } => {
            let v = evaluate(graph, state, *source, at);
            v.powf(param(graph, state, *power, at))
        }

        NodeKind::BrightContrast {
            source,
            brightness,
            threshold,
            factor,
        } => {
            let mut v = evaluate(graph, state, *source, at);
            v += param(graph, state, *brightness, at);
            let threshold = param(graph, state, *threshold, at);
            (v - threshold) * param(graph, state, *factor, at) + threshold
        }

        NodeKind::Tiers {
            source,
            tiers,
            smooth,
        } => {
            let steps = f64::from(*tiers - i32::from(*smooth));
            let v = evaluate(graph, state, *source, at);
            let band_low = (v * steps).floor();
            let band_high = band_low + 1.0;
            let t = v * steps - band_low;
            let blend = if *smooth { quintic_blend(t) } else { 0.0 };
            lerp(blend, band_low / steps, band_high / steps)
        }

        NodeKind::Cache { source } => {
            let slot = C::memo(state)[id.index()];
            if slot.valid && slot.at == at {
                return slot.value;
            }
            let value = evaluate(graph, state, *source, at);
            C::memo(state)[id.index()] = MemoSlot {
                at,
                value,
                valid: true,
            };
            value
        }

        NodeKind::Probe { source, hits } => {
            hits.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
            evaluate(graph, state, *source, at)
        }

        NodeKind::Blend { control, low, high } => {
            let v1 = evaluate(graph, state, *low, at);
            let v2 = evaluate(graph, state, *high, at);
            let mut t = evaluate(graph, state, *control, at);
            if C::DIM == 2 {
                // Inherited asymmetry: only the 2D path remaps the control
                // from [-1, 1] into [0, 1].
                t = (t + 1.0) * 0.5;
            }
            lerp(t, v1, v2)
        }

        NodeKind::Select {
            control,
            low,
            high,
            threshold,
            falloff,
        } => {
            let value = evaluate(graph, state, *control, at);
            let falloff = param(graph, state, *falloff, at);
            let threshold = param(graph, state, *threshold, at);
            if falloff > 0.0 {
                if value < threshold - falloff {
                    evaluate(graph, state, *low, at)
                } else if value > threshold + falloff {
                    evaluate(graph, state, *high, at)
                } else {
                    let lower = threshold - falloff;
                    let upper = threshold + falloff;
                    let blend = quintic_blend((value - lower) / (upper - lower));
                    let v1 = evaluate(graph, state, *low, at);
                    let v2 = evaluate(graph, state, *high, at);
                    lerp(blend, v1, v2)
                }
            } else if value < threshold {
                evaluate(graph, state, *low, at)
            } else {
                evaluate(graph, state, *high, at)
            }
        }

        NodeKind::Combiner { kind, sources } => {
            if sources.is_empty() {
                // Reduction identity; Min/Max of nothing settles on zero.
                return match kind {
                    CombinerKind::Multiply => 1.0,
                    _ => 0.0,
                };
            }
            match kind {
                CombinerKind::Add => sources
                    .iter()
                    .map(|&s| evaluate(graph, state, s, at))
                    .sum(),
                CombinerKind::Multiply => sources
                    .iter()
                    .fold(1.0, |acc, &s| acc * evaluate(graph, state, s, at)),
                CombinerKind::Min => sources
                    .iter()
                    .map(|&s| evaluate(graph, state, s, at))
                    .fold(f64::INFINITY, f64::min),
                CombinerKind::Max => sources
                    .iter()
                    .map(|&s| evaluate(graph, state, s, at))
                    .fold(f64::NEG_INFINITY, f64::max),
                CombinerKind::Average => {
                    let sum: f64 = sources
                        .iter()
                        .map(|&s| evaluate(graph, state, s, at))
                        .sum();
                    sum / sources.len() as f64
                }
            }
        }

        NodeKind::Cellular {
            generator,
            coefficients,
        } => {
            let seed = graph.generator_seed(*generator);
            let gi = generator.index();
            let slot = C::cells(state)[gi];
            let sample = if slot.valid && slot.at == at {
                slot.sample
            } else {
                let sample = at.cellular(seed);
                C::cells(state)[gi] = CellSlot {
                    at,
                    sample,
                    valid: true,
                };
                sample
            };
            let mut v = 0.0;
            for i in 0..4 {
                v += sample.f[i] * param(graph, state, coefficients[i], at);
            }
            v
        }

        NodeKind::Fractal(f) => {
            let v = eval_fractal(graph, state, f, at);
            clamp_to(v, -1.0, 1.0)
        }

        NodeKind::AutoCorrect(a) => {
            let v = evaluate(graph, state, a.source, at);
            let di = C::DIM_INDEX;
            clamp_to(v * a.scale[di] + a.bias[di], a.low, a.high)
        }
    }
}

// ── Fractal accumulation ────────────────────────────────────────────

fn eval_fractal<C: SlotAccess>(
    graph: &ModuleGraph,
    state: &mut EvalState,
    f: &FractalNode,
    at: C,
) -> f64 {
    use crate::graph::node::FractalKind;

    let correct = f.correct[f.octaves - 1];
    let mut p = scaled(at, f.frequency);

    match f.kind {
        FractalKind::Fbm => {
            let mut value = 0.0;
            for i in 0..f.octaves {
                value += evaluate(graph, state, f.sources[i], p) * f.exponents[i];
                p = scaled(p, f.lacunarity);
            }
            value * correct.0 + correct.1
        }
        FractalKind::RidgedMulti => {
            let mut value = 0.0;
            for i in 0..f.octaves {
                let mut signal = f.offset - evaluate(graph, state, f.sources[i], p).abs();
                signal *= signal;
                value += signal * f.exponents[i];
                p = scaled(p, f.lacunarity);
            }
            value * correct.0 + correct.1
        }
        FractalKind::Billow => {
            let mut value = 0.0;
            for i in 0..f.octaves {
                let signal = 2.0 * evaluate(graph, state, f.sources[i], p).abs() - 1.0;
                value += signal * f.exponents[i];
                p = scaled(p, f.lacunarity);
            }
            value += 0.5;
            value * correct.0 + correct.1
        }
        FractalKind::Multi => {
            let mut value = 1.0;
            for i in 0..f.octaves {
                value *= evaluate(graph, state, f.sources[i], p) * f.exponents[i] + 1.0;
                p = scaled(p, f.lacunarity);
            }
            value * correct.0 + correct.1
        }
        FractalKind::HybridMulti => {
            let mut value = evaluate(graph, state, f.sources[0], p) + f.offset;
            let mut weight = f.gain * value;
            p = scaled(p, f.lacunarity);
            for i in 1..f.octaves {
                weight = weight.min(1.0);
                let signal = (evaluate(graph, state, f.sources[i], p) + f.offset) * f.exponents[i];
                value += weight * signal;
                weight *= f.gain * signal;
                p = scaled(p, f.lacunarity);
            }
            value * correct.0 + correct.1
        }
    }
}
