//! Composable implicit-noise module graphs.
//!
//! A `ModuleGraph` holds a DAG of evaluator nodes — noise basis
//! functions, fractal synthesizers, domain transforms, combiners — each
//! exposing the same contract: evaluate at a 2/3/4/6-dimensional point,
//! get back one `f64`. Grid sampling (`mapping`) drives the root node
//! across a lattice, optionally wrapping axes onto circles so opposite
//! edges tile seamlessly.
//!
//! ```
//! use noisegraph::graph::node::{BasisKind, FractalKind};
//! use noisegraph::graph::{eval::EvalState, ModuleGraph};
//! use noisegraph::noise::InterpKind;
//!
//! let mut graph = ModuleGraph::new();
//! let terrain = graph
//!     .fractal(FractalKind::Fbm, BasisKind::Gradient, InterpKind::Quintic, 6, 1234)
//!     .unwrap();
//! let shaped = graph.auto_correct(terrain, 0.0, 1.0);
//!
//! let mut state = EvalState::new(&graph);
//! let height = graph.evaluate_2d(&mut state, shaped, 0.25, -3.5);
//! assert!((0.0..=1.0).contains(&height));
//! ```

pub mod cache;
pub mod coord;
pub mod error;
pub mod graph;
pub mod mapping;
pub mod noise;

pub use cache::MapCache;
pub use coord::Coord;
pub use error::{NoiseError, Result};
pub use graph::eval::EvalState;
pub use graph::node::{BasisKind, CombinerKind, FractalKind, Param, UnaryOp};
pub use graph::{params, CellularId, ModuleGraph, ModuleId};
pub use mapping::{MapResult2, MapResult3, MappingRanges, SeamlessMode};
pub use noise::InterpKind;
