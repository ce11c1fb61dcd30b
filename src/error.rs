// error.rs — configuration and graph-integrity errors
//
// Evaluation itself never fails: numerical edge cases (log of a negative
// source, zero sphere radius, zero tier count) propagate IEEE-754
// NaN/infinity to the caller. Everything that CAN be rejected is rejected
// at construction or mutation time, before the first evaluate.

use thiserror::Error;

use crate::graph::ModuleId;
use crate::mapping::SeamlessMode;

/// Errors raised while building or mutating a module graph, or while
/// configuring a grid sampling request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NoiseError {
    /// Fractal octave count outside 1..=MAX_OCTAVES.
    #[error("octave count {got} outside supported range 1..={max}")]
    OctavesOutOfRange {
        /// Requested octave count.
        got: usize,
        /// The fixed per-fractal source limit.
        max: usize,
    },

    /// A sampling request with a zero-sized output array.
    #[error("sampling grid has zero size ({width}x{height}x{depth})")]
    EmptyGrid {
        width: usize,
        height: usize,
        depth: usize,
    },

    /// Wiring `source` into `target` would make `target` reachable from
    /// itself. Shared DAG references are fine; true cycles are not.
    #[error("wiring {src:?} into {target:?} would create a cycle")]
    CycleDetected { src: ModuleId, target: ModuleId },

    /// A setter was applied to a node of the wrong kind.
    #[error("module {id:?} is not a {expected} node")]
    WrongNodeKind {
        id: ModuleId,
        expected: &'static str,
    },

    /// A handle that does not belong to this graph.
    #[error("unknown module handle {0:?}")]
    UnknownModule(ModuleId),

    /// Fractal source-slot index outside the octave range.
    #[error("fractal source slot {got} outside 0..{max}")]
    SourceSlotOutOfRange { got: usize, max: usize },

    /// A flat 2D mapping was asked for a mode that needs the z-promotion
    /// sampling path.
    #[error("seamless mode {0:?} requires a z coordinate; use map_2d")]
    UnsupportedSeamlessMode(SeamlessMode),
}

pub type Result<T> = std::result::Result<T, NoiseError>;
