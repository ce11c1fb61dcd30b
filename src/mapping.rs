// mapping.rs — grid sampling with seamless wrap modes
//
// Fills a 2D or 3D array by sampling a module once per cell. Non-seamless
// axes map the fractional grid position linearly into the configured
// window. Each seamless axis is instead wrapped onto a circle whose
// circumference equals the loop span, consuming one extra input
// dimension; position 0 and position 1 land on the same embedded point,
// which is what makes the slice tile. Wrapping all three axes of a 3D
// grid is why modules must evaluate up to 6D.
//
// Rows are sampled in parallel; every rayon worker gets its own
// `EvalState`, so per-node memo slots never cross threads.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{NoiseError, Result};
use crate::graph::eval::{evaluate, EvalState};
use crate::graph::{ModuleGraph, ModuleId};

const PI2: f64 = std::f64::consts::TAU;

/// The rectangular sampling window and, for seamless axes, the wrap
/// period per axis.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MappingRanges {
    pub map_x0: f64,
    pub map_x1: f64,
    pub map_y0: f64,
    pub map_y1: f64,
    pub map_z0: f64,
    pub map_z1: f64,
    pub loop_x0: f64,
    pub loop_x1: f64,
    pub loop_y0: f64,
    pub loop_y1: f64,
    pub loop_z0: f64,
    pub loop_z1: f64,
}

impl Default for MappingRanges {
    /// The unit window: [-1, 1] on every map and loop axis.
    fn default() -> Self {
        MappingRanges {
            map_x0: -1.0,
            map_x1: 1.0,
            map_y0: -1.0,
            map_y1: 1.0,
            map_z0: -1.0,
            map_z1: 1.0,
            loop_x0: -1.0,
            loop_x1: 1.0,
            loop_y0: -1.0,
            loop_y1: 1.0,
            loop_z0: -1.0,
            loop_z1: 1.0,
        }
    }
}

/// Which axes wrap seamlessly.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SeamlessMode {
    None,
    X,
    Y,
    Z,
    Xy,
    Xz,
    Yz,
    Xyz,
}

/// A sampled 2D field, row-major, with its observed value range.
#[derive(Debug, Clone, Serialize)]
pub struct MapResult2 {
    pub values: Vec<f64>,
    pub width: usize,
    pub height: usize,
    pub min_value: f64,
    pub max_value: f64,
}

impl MapResult2 {
    #[inline]
    pub fn at(&self, x: usize, y: usize) -> f64 {
        self.values[y * self.width + x]
    }
}

/// A sampled 3D field, slice-major (z, then y, then x).
#[derive(Debug, Clone, Serialize)]
pub struct MapResult3 {
    pub values: Vec<f64>,
    pub width: usize,
    pub height: usize,
    pub depth: usize,
    pub min_value: f64,
    pub max_value: f64,
}

impl MapResult3 {
    #[inline]
    pub fn at(&self, x: usize, y: usize, z: usize) -> f64 {
        self.values[(z * self.height + y) * self.width + x]
    }
}

// ── Circle embedding helpers ────────────────────────────────────────

/// Fractional position along a wrapped axis: the map window rescaled by
/// the loop period.
#[inline]
fn loop_frac(map0: f64, map1: f64, loop0: f64, loop1: f64, t: f64) -> f64 {
    t * (map1 - map0) / (loop1 - loop0)
}

/// Embed a fractional position onto the loop circle. Returns the two
/// coordinates this axis expands into.
#[inline]
fn loop_embed(loop0: f64, loop1: f64, frac: f64) -> (f64, f64) {
    let span = loop1 - loop0;
    let angle = frac * PI2;
    (
        loop0 + angle.cos() * span / PI2,
        loop0 + angle.sin() * span / PI2,
    )
}

// ── 2D mapping (fixed z) ────────────────────────────────────────────

/// Sample one output cell of a 2D grid taken at a fixed `z`, promoting
/// into 3/4/6 dimensions as the mode demands.
fn sample_2d(
    graph: &ModuleGraph,
    state: &mut EvalState,
    module: ModuleId,
    mode: SeamlessMode,
    r: &MappingRanges,
    p: f64,
    q: f64,
    z: f64,
) -> f64 {
    match mode {
        SeamlessMode::None => {
            let nx = r.map_x0 + p * (r.map_x1 - r.map_x0);
            let ny = r.map_y0 + q * (r.map_y1 - r.map_y0);
            evaluate(graph, state, module, [nx, ny, z])
        }
        SeamlessMode::X => {
            let frac = loop_frac(r.map_x0, r.map_x1, r.loop_x0, r.loop_x1, p);
            let (nx, ny) = loop_embed(r.loop_x0, r.loop_x1, frac);
            let nz = r.map_y0 + q * (r.map_y1 - r.map_y0);
            evaluate(graph, state, module, [nx, ny, nz, z])
        }
        SeamlessMode::Y => {
            let frac = loop_frac(r.map_y0, r.map_y1, r.loop_y0, r.loop_y1, q);
            let nx = r.map_x0 + p * (r.map_x1 - r.map_x0);
            let (ny, nz) = loop_embed(r.loop_y0, r.loop_y1, frac);
            evaluate(graph, state, module, [nx, ny, nz, z])
        }
        SeamlessMode::Z => {
            let nx = r.map_x0 + p * (r.map_x1 - r.map_x0);
            let ny = r.map_y0 + q * (r.map_y1 - r.map_y0);
            let zfrac = (z - r.map_z0) / (r.map_z1 - r.map_z0);
            let frac = loop_frac(r.map_z0, r.map_z1, r.loop_z0, r.loop_z1, zfrac);
            let (nz, nw) = loop_embed(r.loop_z0, r.loop_z1, frac);
            evaluate(graph, state, module, [nx, ny, nz, nw])
        }
        SeamlessMode::Xy => {
            let pf = loop_frac(r.map_x0, r.map_x1, r.loop_x0, r.loop_x1, p);
            let qf = loop_frac(r.map_y0, r.map_y1, r.loop_y0, r.loop_y1, q);
            let (nx, ny) = loop_embed(r.loop_x0, r.loop_x1, pf);
            let (nz, nw) = loop_embed(r.loop_y0, r.loop_y1, qf);
            evaluate(graph, state, module, [nx, ny, nz, nw, z, 0.0])
        }
        SeamlessMode::Xz => {
            let pf = loop_frac(r.map_x0, r.map_x1, r.loop_x0, r.loop_x1, p);
            let zfrac = (z - r.map_z0) / (r.map_z1 - r.map_z0);
            let zf = loop_frac(r.map_z0, r.map_z1, r.loop_z0, r.loop_z1, zfrac);
            let (nx, ny) = loop_embed(r.loop_x0, r.loop_x1, pf);
            let nz = r.map_y0 + q * (r.map_y1 - r.map_y0);
            let (nw, nu) = loop_embed(r.loop_z0, r.loop_z1, zf);
            evaluate(graph, state, module, [nx, ny, nz, nw, nu, 0.0])
        }
        SeamlessMode::Yz => {
            let qf = loop_frac(r.map_y0, r.map_y1, r.loop_y0, r.loop_y1, q);
            let zfrac = (z - r.map_z0) / (r.map_z1 - r.map_z0);
            let zf = loop_frac(r.map_z0, r.map_z1, r.loop_z0, r.loop_z1, zfrac);
            let nx = r.map_x0 + p * (r.map_x1 - r.map_x0);
            let (ny, nz) = loop_embed(r.loop_y0, r.loop_y1, qf);
            let (nw, nu) = loop_embed(r.loop_z0, r.loop_z1, zf);
            evaluate(graph, state, module, [nx, ny, nz, nw, nu, 0.0])
        }
        SeamlessMode::Xyz => {
            let pf = loop_frac(r.map_x0, r.map_x1, r.loop_x0, r.loop_x1, p);
            let qf = loop_frac(r.map_y0, r.map_y1, r.loop_y0, r.loop_y1, q);
            let zfrac = (z - r.map_z0) / (r.map_z1 - r.map_z0);
            let zf = loop_frac(r.map_z0, r.map_z1, r.loop_z0, r.loop_z1, zfrac);
            let (nx, ny) = loop_embed(r.loop_x0, r.loop_x1, pf);
            let (nz, nw) = loop_embed(r.loop_y0, r.loop_y1, qf);
            let (nu, nv) = loop_embed(r.loop_z0, r.loop_z1, zf);
            evaluate(graph, state, module, [nx, ny, nz, nw, nu, nv])
        }
    }
}

/// Sample a `width × height` grid of the module at a fixed `z` slice.
pub fn map_2d(
    graph: &ModuleGraph,
    module: ModuleId,
    width: usize,
    height: usize,
    mode: SeamlessMode,
    ranges: &MappingRanges,
    z: f64,
) -> Result<MapResult2> {
    if width == 0 || height == 0 {
        return Err(NoiseError::EmptyGrid {
            width,
            height,
            depth: 1,
        });
    }

    let rows: Vec<(Vec<f64>, f64, f64)> = (0..height)
        .into_par_iter()
        .map(|y| {
            let mut state = EvalState::new(graph);
            let q = y as f64 / height as f64;
            let mut row = Vec::with_capacity(width);
            let mut row_min = f64::MAX;
            let mut row_max = f64::MIN;
            for x in 0..width {
                let p = x as f64 / width as f64;
                let v = sample_2d(graph, &mut state, module, mode, ranges, p, q, z);
                row_min = row_min.min(v);
                row_max = row_max.max(v);
                row.push(v);
            }
            (row, row_min, row_max)
        })
        .collect();

    Ok(collect_2d(rows, width, height))
}

/// Sample a flat 2D window with no z slice: the module is evaluated in
/// its native 2D (or 3D/4D for wrapped axes). Modes that wrap z need
/// `map_2d` instead.
pub fn map_2d_flat(
    graph: &ModuleGraph,
    module: ModuleId,
    width: usize,
    height: usize,
    mode: SeamlessMode,
    ranges: &MappingRanges,
) -> Result<MapResult2> {
    if width == 0 || height == 0 {
        return Err(NoiseError::EmptyGrid {
            width,
            height,
            depth: 1,
        });
    }
    match mode {
        SeamlessMode::None | SeamlessMode::X | SeamlessMode::Y | SeamlessMode::Xy => {}
        other => return Err(NoiseError::UnsupportedSeamlessMode(other)),
    }

    let r = ranges;
    let rows: Vec<(Vec<f64>, f64, f64)> = (0..height)
        .into_par_iter()
        .map(|y| {
            let mut state = EvalState::new(graph);
            let q = y as f64 / height as f64;
            let mut row = Vec::with_capacity(width);
            let mut row_min = f64::MAX;
            let mut row_max = f64::MIN;
            for x in 0..width {
                let p = x as f64 / width as f64;
                let v = match mode {
                    SeamlessMode::None => {
                        let nx = r.map_x0 + p * (r.map_x1 - r.map_x0);
                        let ny = r.map_y0 + q * (r.map_y1 - r.map_y0);
                        evaluate(graph, &mut state, module, [nx, ny])
                    }
                    SeamlessMode::X => {
                        let frac = loop_frac(r.map_x0, r.map_x1, r.loop_x0, r.loop_x1, p);
                        let (nx, ny) = loop_embed(r.loop_x0, r.loop_x1, frac);
                        let nz = r.map_y0 + q * (r.map_y1 - r.map_y0);
                        evaluate(graph, &mut state, module, [nx, ny, nz])
                    }
                    SeamlessMode::Y => {
                        let frac = loop_frac(r.map_y0, r.map_y1, r.loop_y0, r.loop_y1, q);
                        let nx = r.map_x0 + p * (r.map_x1 - r.map_x0);
                        let (ny, nz) = loop_embed(r.loop_y0, r.loop_y1, frac);
                        evaluate(graph, &mut state, module, [nx, ny, nz])
                    }
                    SeamlessMode::Xy => {
                        let pf = loop_frac(r.map_x0, r.map_x1, r.loop_x0, r.loop_x1, p);
                        let qf = loop_frac(r.map_y0, r.map_y1, r.loop_y0, r.loop_y1, q);
                        let (nx, ny) = loop_embed(r.loop_x0, r.loop_x1, pf);
                        let (nz, nw) = loop_embed(r.loop_y0, r.loop_y1, qf);
                        evaluate(graph, &mut state, module, [nx, ny, nz, nw])
                    }
                    _ => unreachable!("rejected above"),
                };
                row_min = row_min.min(v);
                row_max = row_max.max(v);
                row.push(v);
            }
            (row, row_min, row_max)
        })
        .collect();

    Ok(collect_2d(rows, width, height))
}

fn collect_2d(rows: Vec<(Vec<f64>, f64, f64)>, width: usize, height: usize) -> MapResult2 {
    let mut values = Vec::with_capacity(width * height);
    let mut min_value = f64::MAX;
    let mut max_value = f64::MIN;
    for (row, row_min, row_max) in rows {
        min_value = min_value.min(row_min);
        max_value = max_value.max(row_max);
        values.extend(row);
    }
    MapResult2 {
        values,
        width,
        height,
        min_value,
        max_value,
    }
}

// ── 3D mapping ──────────────────────────────────────────────────────

fn sample_3d(
    graph: &ModuleGraph,
    state: &mut EvalState,
    module: ModuleId,
    mode: SeamlessMode,
    r: &MappingRanges,
    p: f64,
    q: f64,
    s: f64,
) -> f64 {
    match mode {
        SeamlessMode::None => {
            let nx = r.map_x0 + p * (r.map_x1 - r.map_x0);
            let ny = r.map_y0 + q * (r.map_y1 - r.map_y0);
            let nz = r.map_z0 + s * (r.map_z1 - r.map_z0);
            evaluate(graph, state, module, [nx, ny, nz])
        }
        SeamlessMode::X => {
            let pf = loop_frac(r.map_x0, r.map_x1, r.loop_x0, r.loop_x1, p);
            let (nx, ny) = loop_embed(r.loop_x0, r.loop_x1, pf);
            let nz = r.map_y0 + q * (r.map_y1 - r.map_y0);
            let nw = r.map_z0 + s * (r.map_z1 - r.map_z0);
            evaluate(graph, state, module, [nx, ny, nz, nw])
        }
        SeamlessMode::Y => {
            let qf = loop_frac(r.map_y0, r.map_y1, r.loop_y0, r.loop_y1, q);
            let nx = r.map_x0 + p * (r.map_x1 - r.map_x0);
            let (ny, nz) = loop_embed(r.loop_y0, r.loop_y1, qf);
            let nw = r.map_z0 + s * (r.map_z1 - r.map_z0);
            evaluate(graph, state, module, [nx, ny, nz, nw])
        }
        SeamlessMode::Z => {
            let sf = loop_frac(r.map_z0, r.map_z1, r.loop_z0, r.loop_z1, s);
            let nx = r.map_x0 + p * (r.map_x1 - r.map_x0);
            let ny = r.map_y0 + q * (r.map_y1 - r.map_y0);
            let (nz, nw) = loop_embed(r.loop_z0, r.loop_z1, sf);
            evaluate(graph, state, module, [nx, ny, nz, nw])
        }
        SeamlessMode::Xy => {
            let pf = loop_frac(r.map_x0, r.map_x1, r.loop_x0, r.loop_x1, p);
            let qf = loop_frac(r.map_y0, r.map_y1, r.loop_y0, r.loop_y1, q);
            let (nx, ny) = loop_embed(r.loop_x0, r.loop_x1, pf);
            let (nz, nw) = loop_embed(r.loop_y0, r.loop_y1, qf);
            let nu = r.map_z0 + s * (r.map_z1 - r.map_z0);
            evaluate(graph, state, module, [nx, ny, nz, nw, nu, 0.0])
        }
        SeamlessMode::Xz => {
            let pf = loop_frac(r.map_x0, r.map_x1, r.loop_x0, r.loop_x1, p);
            let sf = loop_frac(r.map_z0, r.map_z1, r.loop_z0, r.loop_z1, s);
            let (nx, ny) = loop_embed(r.loop_x0, r.loop_x1, pf);
            let nz = r.map_y0 + q * (r.map_y1 - r.map_y0);
            let (nw, nu) = loop_embed(r.loop_z0, r.loop_z1, sf);
            evaluate(graph, state, module, [nx, ny, nz, nw, nu, 0.0])
        }
        SeamlessMode::Yz => {
            let qf = loop_frac(r.map_y0, r.map_y1, r.loop_y0, r.loop_y1, q);
            let sf = loop_frac(r.map_z0, r.map_z1, r.loop_z0, r.loop_z1, s);
            let nx = r.map_x0 + p * (r.map_x1 - r.map_x0);
            let (ny, nz) = loop_embed(r.loop_y0, r.loop_y1, qf);
            let (nw, nu) = loop_embed(r.loop_z0, r.loop_z1, sf);
            evaluate(graph, state, module, [nx, ny, nz, nw, nu, 0.0])
        }
        SeamlessMode::Xyz => {
            let pf = loop_frac(r.map_x0, r.map_x1, r.loop_x0, r.loop_x1, p);
            let qf = loop_frac(r.map_y0, r.map_y1, r.loop_y0, r.loop_y1, q);
            let sf = loop_frac(r.map_z0, r.map_z1, r.loop_z0, r.loop_z1, s);
            let (nx, ny) = loop_embed(r.loop_x0, r.loop_x1, pf);
            let (nz, nw) = loop_embed(r.loop_y0, r.loop_y1, qf);
            let (nu, nv) = loop_embed(r.loop_z0, r.loop_z1, sf);
            evaluate(graph, state, module, [nx, ny, nz, nw, nu, nv])
        }
    }
}

/// Sample a `width × height × depth` volume. Z-slices run in parallel.
pub fn map_3d(
    graph: &ModuleGraph,
    module: ModuleId,
    width: usize,
    height: usize,
    depth: usize,
    mode: SeamlessMode,
    ranges: &MappingRanges,
) -> Result<MapResult3> {
    if width == 0 || height == 0 || depth == 0 {
        return Err(NoiseError::EmptyGrid {
            width,
            height,
            depth,
        });
    }

    let slices: Vec<(Vec<f64>, f64, f64)> = (0..depth)
        .into_par_iter()
        .map(|z| {
            let mut state = EvalState::new(graph);
            let s = z as f64 / depth as f64;
            let mut slice = Vec::with_capacity(width * height);
            let mut slice_min = f64::MAX;
            let mut slice_max = f64::MIN;
            for y in 0..height {
                let q = y as f64 / height as f64;
                for x in 0..width {
                    let p = x as f64 / width as f64;
                    let v = sample_3d(graph, &mut state, module, mode, ranges, p, q, s);
                    slice_min = slice_min.min(v);
                    slice_max = slice_max.max(v);
                    slice.push(v);
                }
            }
            (slice, slice_min, slice_max)
        })
        .collect();

    let mut values = Vec::with_capacity(width * height * depth);
    let mut min_value = f64::MAX;
    let mut max_value = f64::MIN;
    for (slice, s_min, s_max) in slices {
        min_value = min_value.min(s_min);
        max_value = max_value.max(s_max);
        values.extend(slice);
    }

    Ok(MapResult3 {
        values,
        width,
        height,
        depth,
        min_value,
        max_value,
    })
}
