// graph/mod.rs — the module graph arena
//
// Nodes live in a flat arena and reference each other through dense
// `ModuleId` handles; sharing a handle between several parents forms the
// DAG, and handle equality is the identity the combiner dedups on.
// Builder methods append nodes (which cannot create a cycle); setters can
// re-wire existing nodes, so they check reachability and fail fast
// instead of letting evaluation recurse forever.
//
// Any mutation bumps `revision`, which invalidates the memo slots of
// every outstanding `EvalState` and is the cache key ingredient for
// sampled-grid results.

pub mod eval;
pub mod fractal;
pub mod node;

use rand_chacha::rand_core::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::error::{NoiseError, Result};
use crate::noise::InterpKind;

use eval::{evaluate, EvalState, SlotAccess};
use fractal::{FractalNode, MAX_OCTAVES};
use node::{
    AutoCorrectNode, BasisKind, BasisNode, CombinerKind, FractalKind, GradientNode, NodeKind,
    Param, UnaryOp,
};

/// Seed spacing between consecutive fractal octaves.
const OCTAVE_SEED_STEP: i32 = 300;

/// Fixed stream for auto-correct calibration sampling.
const CALIBRATION_SEED: u64 = 0x6175_746f_636f_7272; // "autocorr"

/// Stable handle to a node in one `ModuleGraph`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ModuleId(pub(crate) u32);

impl ModuleId {
    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// Handle to a shared cellular generator owned by the graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CellularId(pub(crate) u32);

impl CellularId {
    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// Arena of evaluator nodes plus the shared cellular generators.
#[derive(Default)]
pub struct ModuleGraph {
    nodes: Vec<NodeKind>,
    generator_seeds: Vec<i32>,
    names: FxHashMap<String, ModuleId>,
    revision: u64,
}

impl ModuleGraph {
    pub fn new() -> Self {
        ModuleGraph::default()
    }

    #[inline]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub(crate) fn generator_count(&self) -> usize {
        self.generator_seeds.len()
    }

    #[inline]
    pub(crate) fn revision(&self) -> u64 {
        self.revision
    }

    #[inline]
    pub(crate) fn kind(&self, id: ModuleId) -> &NodeKind {
        &self.nodes[id.index()]
    }

    #[inline]
    pub(crate) fn generator_seed(&self, id: CellularId) -> i32 {
        self.generator_seeds[id.index()]
    }

    fn push(&mut self, kind: NodeKind) -> ModuleId {
        let id = ModuleId(self.nodes.len() as u32);
        self.nodes.push(kind);
        self.revision += 1;
        id
    }

    fn touch(&mut self) {
        self.revision += 1;
    }

    fn get_mut(&mut self, id: ModuleId) -> Result<&mut NodeKind> {
        self.nodes
            .get_mut(id.index())
            .ok_or(NoiseError::UnknownModule(id))
    }

    fn check(&self, id: ModuleId) -> Result<()> {
        if id.index() < self.nodes.len() {
            Ok(())
        } else {
            Err(NoiseError::UnknownModule(id))
        }
    }

    // ── Naming ──────────────────────────────────────────────────────

    /// Attach a debug-friendly name to a node; later `find` calls resolve
    /// it. Re-using a name moves it.
    pub fn set_name(&mut self, id: ModuleId, name: impl Into<String>) {
        self.names.insert(name.into(), id);
    }

    pub fn find(&self, name: &str) -> Option<ModuleId> {
        self.names.get(name).copied()
    }

    // ── Leaf constructors ───────────────────────────────────────────

    pub fn constant(&mut self, value: f64) -> ModuleId {
        self.push(NodeKind::Constant { value })
    }

    /// One raw noise primitive with a per-seed random rotation.
    pub fn basis(&mut self, basis: BasisKind, interp: InterpKind, seed: i32) -> ModuleId {
        self.push(NodeKind::Basis(BasisNode::new(basis, interp, seed)))
    }

    /// Normalized projection of the query point onto the segment
    /// `from → to`.
    pub fn gradient(&mut self, from: [f64; 6], to: [f64; 6]) -> ModuleId {
        self.push(NodeKind::Gradient(GradientNode::new(from, to)))
    }

    /// `clamp01((radius − |p − center|) / radius)`.
    pub fn sphere(&mut self, center: [Param; 6], radius: impl Into<Param>) -> ModuleId {
        self.push(NodeKind::Sphere {
            center,
            radius: radius.into(),
        })
    }

    // ── Unary transforms ────────────────────────────────────────────

    pub fn scale_offset(
        &mut self,
        source: ModuleId,
        scale: impl Into<Param>,
        offset: impl Into<Param>,
    ) -> ModuleId {
        self.push(NodeKind::ScaleOffset {
            source,
            scale: scale.into(),
            offset: offset.into(),
        })
    }

    pub fn scale_domain(&mut self, source: ModuleId, scale: [Param; 6]) -> ModuleId {
        self.push(NodeKind::ScaleDomain { source, scale })
    }

    pub fn translate_domain(&mut self, source: ModuleId, offset: [Param; 6]) -> ModuleId {
        self.push(NodeKind::TranslateDomain { source, offset })
    }

    /// Rotate the query domain. `angle` is in turns; 2D ignores the axis.
    pub fn rotate_domain(
        &mut self,
        source: ModuleId,
        axis: [Param; 3],
        angle: impl Into<Param>,
    ) -> ModuleId {
        self.push(NodeKind::RotateDomain {
            source,
            axis,
            angle: angle.into(),
        })
    }

    pub fn clamp(
        &mut self,
        source: ModuleId,
        low: impl Into<Param>,
        high: impl Into<Param>,
    ) -> ModuleId {
        self.push(NodeKind::Clamp {
            source,
            low: low.into(),
            high: high.into(),
        })
    }

    pub fn bias(&mut self, source: ModuleId, bias: impl Into<Param>) -> ModuleId {
        self.push(NodeKind::Bias {
            source,
            bias: bias.into(),
        })
    }

    pub fn gain(&mut self, source: ModuleId, gain: impl Into<Param>) -> ModuleId {
        self.push(NodeKind::Gain {
            source,
            gain: gain.into(),
        })
    }

    /// Elementwise math: ceiling, floor, sin, cos, tan, log, invert.
    pub fn unary(&mut self, op: UnaryOp, source: ModuleId) -> ModuleId {
        self.push(NodeKind::Unary { op, source })
    }

    pub fn pow(&mut self, source: ModuleId, power: impl Into<Param>) -> ModuleId {
        self.push(NodeKind::Pow {
            source,
            power: power.into(),
        })
    }

    pub fn bright_contrast(
        &mut self,
        source: ModuleId,
        brightness: impl Into<Param>,
        threshold: impl Into<Param>,
        factor: impl Into<Param>,
    ) -> ModuleId {
        self.push(NodeKind::BrightContrast {
            source,
            brightness: brightness.into(),
            threshold: threshold.into(),
            factor: factor.into(),
        })
    }

    /// Quantize into `tiers` equal bands; `smooth` blends band edges with
    /// the quintic kernel (and consumes one band doing so).
    pub fn tiers(&mut self, source: ModuleId, tiers: i32, smooth: bool) -> ModuleId {
        self.push(NodeKind::Tiers {
            source,
            tiers,
            smooth,
        })
    }

    /// Single-slot memo over `source`, one slot per dimensionality. Wrap
    /// an expensive subgraph consumed by several parents.
    pub fn cache(&mut self, source: ModuleId) -> ModuleId {
        self.push(NodeKind::Cache { source })
    }

    /// Diagnostic pass-through: returns `source` unchanged and counts how
    /// often it is evaluated. Useful for checking memoization behavior.
    pub fn probe(
        &mut self,
        source: ModuleId,
    ) -> (ModuleId, std::sync::Arc<std::sync::atomic::AtomicU64>) {
        let hits = std::sync::Arc::new(std::sync::atomic::AtomicU64::new(0));
        let id = self.push(NodeKind::Probe {
            source,
            hits: hits.clone(),
        });
        (id, hits)
    }

    // ── Combinators ─────────────────────────────────────────────────

    /// Lerp between `low` and `high` driven by `control`.
    pub fn blend(&mut self, control: ModuleId, low: ModuleId, high: ModuleId) -> ModuleId {
        self.push(NodeKind::Blend { control, low, high })
    }

    /// Hard (or quintic-falloff) threshold switch between `low` and
    /// `high` driven by `control`.
    pub fn select(
        &mut self,
        control: ModuleId,
        low: ModuleId,
        high: ModuleId,
        threshold: impl Into<Param>,
        falloff: impl Into<Param>,
    ) -> ModuleId {
        self.push(NodeKind::Select {
            control,
            low,
            high,
            threshold: threshold.into(),
            falloff: falloff.into(),
        })
    }

    /// Reduction over an unordered source set; sources dedup by handle.
    pub fn combiner(&mut self, kind: CombinerKind) -> ModuleId {
        self.push(NodeKind::Combiner {
            kind,
            sources: SmallVec::new(),
        })
    }

    pub fn add_combiner_source(&mut self, combiner: ModuleId, source: ModuleId) -> Result<()> {
        self.check(source)?;
        if self.reaches(source, combiner) {
            return Err(NoiseError::CycleDetected {
                src: source,
                target: combiner,
            });
        }
        match self.get_mut(combiner)? {
            NodeKind::Combiner { sources, .. } => {
                if !sources.contains(&source) {
                    sources.push(source);
                }
            }
            _ => {
                return Err(NoiseError::WrongNodeKind {
                    id: combiner,
                    expected: "combiner",
                })
            }
        }
        self.touch();
        Ok(())
    }

    pub fn remove_combiner_source(&mut self, combiner: ModuleId, source: ModuleId) -> Result<()> {
        match self.get_mut(combiner)? {
            NodeKind::Combiner { sources, .. } => {
                sources.retain(|s| *s != source);
            }
            _ => {
                return Err(NoiseError::WrongNodeKind {
                    id: combiner,
                    expected: "combiner",
                })
            }
        }
        self.touch();
        Ok(())
    }

    pub fn clear_combiner_sources(&mut self, combiner: ModuleId) -> Result<()> {
        match self.get_mut(combiner)? {
            NodeKind::Combiner { sources, .. } => sources.clear(),
            _ => {
                return Err(NoiseError::WrongNodeKind {
                    id: combiner,
                    expected: "combiner",
                })
            }
        }
        self.touch();
        Ok(())
    }

    // ── Cellular ────────────────────────────────────────────────────

    /// A shared, seed-keyed Worley generator. Several cellular nodes can
    /// point at the same generator and share its neighbor scans.
    pub fn cellular_generator(&mut self, seed: i32) -> CellularId {
        let id = CellularId(self.generator_seeds.len() as u32);
        self.generator_seeds.push(seed);
        self.revision += 1;
        id
    }

    pub fn set_generator_seed(&mut self, id: CellularId, seed: i32) {
        if self.generator_seeds[id.index()] != seed {
            self.generator_seeds[id.index()] = seed;
            self.touch();
        }
    }

    /// Dot product of the generator's four ordered nearest distances with
    /// the caller's coefficients (`[1,0,0,0]` = F1, `[-1,1,0,0]` = F2−F1).
    pub fn cellular(&mut self, generator: CellularId, coefficients: [Param; 4]) -> ModuleId {
        self.push(NodeKind::Cellular {
            generator,
            coefficients,
        })
    }

    // ── Fractal ─────────────────────────────────────────────────────

    /// A fractal synthesizer over `octaves` independently-seeded basis
    /// octaves (octave i gets `seed + 300·i`). Frequency defaults to 1
    /// and lacunarity to 2; see the `set_fractal_*` setters.
    pub fn fractal(
        &mut self,
        kind: FractalKind,
        basis: BasisKind,
        interp: InterpKind,
        octaves: usize,
        seed: i32,
    ) -> Result<ModuleId> {
        if octaves == 0 || octaves > MAX_OCTAVES {
            return Err(NoiseError::OctavesOutOfRange {
                got: octaves,
                max: MAX_OCTAVES,
            });
        }

        let basis_sources: SmallVec<[ModuleId; MAX_OCTAVES]> = (0..MAX_OCTAVES)
            .map(|i| self.basis(basis, interp, seed + OCTAVE_SEED_STEP * i as i32))
            .collect();

        let mut node = FractalNode {
            kind,
            octaves,
            frequency: 1.0,
            lacunarity: 2.0,
            gain: 0.0,
            offset: 0.0,
            h: 1.0,
            seed,
            sources: basis_sources.clone(),
            basis_sources,
            exponents: [0.0; MAX_OCTAVES],
            correct: [(0.0, 0.0); MAX_OCTAVES],
        };
        node.apply_kind_defaults();
        node.recalculate();
        Ok(self.push(NodeKind::Fractal(node)))
    }

    fn fractal_mut(&mut self, id: ModuleId) -> Result<&mut FractalNode> {
        match self.get_mut(id)? {
            NodeKind::Fractal(f) => Ok(f),
            _ => Err(NoiseError::WrongNodeKind {
                id,
                expected: "fractal",
            }),
        }
    }

    pub fn set_fractal_kind(&mut self, id: ModuleId, kind: FractalKind) -> Result<()> {
        let f = self.fractal_mut(id)?;
        f.kind = kind;
        f.apply_kind_defaults();
        f.recalculate();
        self.touch();
        Ok(())
    }

    pub fn set_fractal_octaves(&mut self, id: ModuleId, octaves: usize) -> Result<()> {
        if octaves == 0 || octaves > MAX_OCTAVES {
            return Err(NoiseError::OctavesOutOfRange {
                got: octaves,
                max: MAX_OCTAVES,
            });
        }
        let f = self.fractal_mut(id)?;
        f.octaves = octaves;
        f.recalculate();
        self.touch();
        Ok(())
    }

    pub fn set_fractal_frequency(&mut self, id: ModuleId, frequency: f64) -> Result<()> {
        let f = self.fractal_mut(id)?;
        f.frequency = frequency;
        f.recalculate();
        self.touch();
        Ok(())
    }

    pub fn set_fractal_lacunarity(&mut self, id: ModuleId, lacunarity: f64) -> Result<()> {
        let f = self.fractal_mut(id)?;
        f.lacunarity = lacunarity;
        f.recalculate();
        self.touch();
        Ok(())
    }

    pub fn set_fractal_gain(&mut self, id: ModuleId, gain: f64) -> Result<()> {
        let f = self.fractal_mut(id)?;
        f.gain = gain;
        f.recalculate();
        self.touch();
        Ok(())
    }

    pub fn set_fractal_offset(&mut self, id: ModuleId, offset: f64) -> Result<()> {
        let f = self.fractal_mut(id)?;
        f.offset = offset;
        f.recalculate();
        self.touch();
        Ok(())
    }

    /// Reseed the fractal and its basis octaves (octave i gets
    /// `seed + 300·i`). Overridden slots keep their override.
    pub fn set_fractal_seed(&mut self, id: ModuleId, seed: i32) -> Result<()> {
        let basis_sources = self.fractal_mut(id)?.basis_sources.clone();
        for (i, &b) in basis_sources.iter().enumerate() {
            let octave_seed = seed + OCTAVE_SEED_STEP * i as i32;
            if let NodeKind::Basis(basis) = &mut self.nodes[b.index()] {
                basis.reseed(octave_seed);
            }
        }
        self.fractal_mut(id)?.seed = seed;
        self.touch();
        Ok(())
    }

    /// Replace octave slot `which` with an arbitrary module.
    pub fn set_fractal_source(
        &mut self,
        id: ModuleId,
        which: usize,
        source: ModuleId,
    ) -> Result<()> {
        if which >= MAX_OCTAVES {
            return Err(NoiseError::SourceSlotOutOfRange {
                got: which,
                max: MAX_OCTAVES,
            });
        }
        self.check(source)?;
        if self.reaches(source, id) {
            return Err(NoiseError::CycleDetected { src: source, target: id });
        }
        self.fractal_mut(id)?.sources[which] = source;
        self.touch();
        Ok(())
    }

    /// Restore octave slot `which` to the fractal's own basis function.
    pub fn reset_fractal_source(&mut self, id: ModuleId, which: usize) -> Result<()> {
        if which >= MAX_OCTAVES {
            return Err(NoiseError::SourceSlotOutOfRange {
                got: which,
                max: MAX_OCTAVES,
            });
        }
        let f = self.fractal_mut(id)?;
        f.sources[which] = f.basis_sources[which];
        self.touch();
        Ok(())
    }

    // ── Auto-correction ─────────────────────────────────────────────

    /// Wrap `source` in a statistical range correction targeting
    /// `[low, high]`; calibrates immediately for all dimensionalities.
    pub fn auto_correct(&mut self, source: ModuleId, low: f64, high: f64) -> ModuleId {
        let (scale, bias) = self.calibrate(source, low, high);
        self.push(NodeKind::AutoCorrect(AutoCorrectNode {
            source,
            low,
            high,
            scale,
            bias,
        }))
    }

    pub fn set_auto_correct_range(&mut self, id: ModuleId, low: f64, high: f64) -> Result<()> {
        let source = match self.get_mut(id)? {
            NodeKind::AutoCorrect(a) => a.source,
            _ => {
                return Err(NoiseError::WrongNodeKind {
                    id,
                    expected: "auto_correct",
                })
            }
        };
        let (scale, bias) = self.calibrate(source, low, high);
        if let NodeKind::AutoCorrect(a) = &mut self.nodes[id.index()] {
            a.low = low;
            a.high = high;
            a.scale = scale;
            a.bias = bias;
        }
        self.touch();
        Ok(())
    }

    /// Monte-Carlo range estimate: 10,000 probes per dimensionality,
    /// uniform in [-2, 2] per axis, solved into a (scale, bias) pair.
    fn calibrate(&self, source: ModuleId, low: f64, high: f64) -> ([f64; 4], [f64; 4]) {
        let mut rng = ChaCha8Rng::seed_from_u64(CALIBRATION_SEED);
        let mut state = EvalState::new(self);
        let mut scale = [0.0; 4];
        let mut bias = [0.0; 4];

        self.calibrate_dim::<[f64; 2]>(source, low, high, &mut rng, &mut state, &mut scale, &mut bias);
        self.calibrate_dim::<[f64; 3]>(source, low, high, &mut rng, &mut state, &mut scale, &mut bias);
        self.calibrate_dim::<[f64; 4]>(source, low, high, &mut rng, &mut state, &mut scale, &mut bias);
        self.calibrate_dim::<[f64; 6]>(source, low, high, &mut rng, &mut state, &mut scale, &mut bias);

        log::debug!(
            "auto-correct calibrated {source:?} into [{low}, {high}]: scale={scale:?} bias={bias:?}"
        );
        (scale, bias)
    }

    fn calibrate_dim<C: SlotAccess>(
        &self,
        source: ModuleId,
        low: f64,
        high: f64,
        rng: &mut ChaCha8Rng,
        state: &mut EvalState,
        scale: &mut [f64; 4],
        bias: &mut [f64; 4],
    ) {
        let mut min_value = 10000.0_f64;
        let mut max_value = -10000.0_f64;
        for _ in 0..10_000 {
            let value = evaluate(self, state, source, C::random_probe(rng));
            min_value = min_value.min(value);
            max_value = max_value.max(value);
        }
        scale[C::DIM_INDEX] = (high - low) / (max_value - min_value);
        bias[C::DIM_INDEX] = low - min_value * scale[C::DIM_INDEX];
    }

    // ── Generic setters ─────────────────────────────────────────────

    /// Re-wire the primary source of any single-source node. Fails fast
    /// if the new source can already reach this node (a true cycle).
    /// Auto-correct nodes recalibrate against the new source.
    pub fn set_source(&mut self, id: ModuleId, new_source: ModuleId) -> Result<()> {
        self.check(new_source)?;
        self.check(id)?;
        if self.reaches(new_source, id) {
            return Err(NoiseError::CycleDetected {
                src: new_source,
                target: id,
            });
        }
        if let NodeKind::AutoCorrect(a) = &self.nodes[id.index()] {
            let (low, high) = (a.low, a.high);
            let (scale, bias) = self.calibrate(new_source, low, high);
            if let NodeKind::AutoCorrect(a) = &mut self.nodes[id.index()] {
                a.source = new_source;
                a.scale = scale;
                a.bias = bias;
            }
            self.touch();
            return Ok(());
        }
        match self.get_mut(id)? {
            NodeKind::ScaleOffset { source, .. }
            | NodeKind::ScaleDomain { source, .. }
            | NodeKind::TranslateDomain { source, .. }
            | NodeKind::RotateDomain { source, .. }
            | NodeKind::Clamp { source, .. }
            | NodeKind::Bias { source, .. }
            | NodeKind::Gain { source, .. }
            | NodeKind::Unary { source, .. }
            | NodeKind::Pow { source, .. }
            | NodeKind::BrightContrast { source, .. }
            | NodeKind::Tiers { source, .. }
            | NodeKind::Cache { source } => *source = new_source,
            _ => {
                return Err(NoiseError::WrongNodeKind {
                    id,
                    expected: "single-source",
                })
            }
        }
        self.touch();
        Ok(())
    }

    pub fn set_constant_value(&mut self, id: ModuleId, value: f64) -> Result<()> {
        match self.get_mut(id)? {
            NodeKind::Constant { value: v } => *v = value,
            _ => {
                return Err(NoiseError::WrongNodeKind {
                    id,
                    expected: "constant",
                })
            }
        }
        self.touch();
        Ok(())
    }

    pub fn set_basis_seed(&mut self, id: ModuleId, seed: i32) -> Result<()> {
        match self.get_mut(id)? {
            NodeKind::Basis(b) => b.reseed(seed),
            _ => {
                return Err(NoiseError::WrongNodeKind {
                    id,
                    expected: "basis",
                })
            }
        }
        self.touch();
        Ok(())
    }

    pub fn set_basis_type(
        &mut self,
        id: ModuleId,
        basis: BasisKind,
        interp: InterpKind,
    ) -> Result<()> {
        match self.get_mut(id)? {
            NodeKind::Basis(b) => {
                b.basis = basis;
                b.interp = interp;
            }
            _ => {
                return Err(NoiseError::WrongNodeKind {
                    id,
                    expected: "basis",
                })
            }
        }
        self.touch();
        Ok(())
    }

    /// True if `target` is reachable from `from` through sources and
    /// module parameters.
    fn reaches(&self, from: ModuleId, target: ModuleId) -> bool {
        if from == target {
            return true;
        }
        let mut stack: SmallVec<[ModuleId; 16]> = SmallVec::new();
        let mut seen = vec![false; self.nodes.len()];
        stack.push(from);
        while let Some(current) = stack.pop() {
            if current == target {
                return true;
            }
            if std::mem::replace(&mut seen[current.index()], true) {
                continue;
            }
            stack.extend(self.nodes[current.index()].children());
        }
        false
    }

    // ── Evaluation entry points ─────────────────────────────────────
    //
    // Handles must come from this graph; a handle from another graph is
    // a caller bug (same contract as indexing with a foreign index).

    pub fn evaluate_2d(&self, state: &mut EvalState, module: ModuleId, x: f64, y: f64) -> f64 {
        state.sync(self);
        evaluate(self, state, module, [x, y])
    }

    pub fn evaluate_3d(
        &self,
        state: &mut EvalState,
        module: ModuleId,
        x: f64,
        y: f64,
        z: f64,
    ) -> f64 {
        state.sync(self);
        evaluate(self, state, module, [x, y, z])
    }

    #[allow(clippy::too_many_arguments)]
    pub fn evaluate_4d(
        &self,
        state: &mut EvalState,
        module: ModuleId,
        x: f64,
        y: f64,
        z: f64,
        w: f64,
    ) -> f64 {
        state.sync(self);
        evaluate(self, state, module, [x, y, z, w])
    }

    #[allow(clippy::too_many_arguments)]
    pub fn evaluate_6d(
        &self,
        state: &mut EvalState,
        module: ModuleId,
        x: f64,
        y: f64,
        z: f64,
        w: f64,
        u: f64,
        v: f64,
    ) -> f64 {
        state.sync(self);
        evaluate(self, state, module, [x, y, z, w, u, v])
    }
}

/// Wrap an array of literals as parameters, for the nodes that take one
/// parameter per axis.
pub fn params<const N: usize>(values: [f64; N]) -> [Param; N] {
    values.map(Param::Value)
}
