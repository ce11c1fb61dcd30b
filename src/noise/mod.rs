// noise/mod.rs — raw noise primitives
//
// Everything below this module is a pure function of (coordinates, seed):
// no graph state, no caching. The module graph layers composition,
// memoization and range correction on top.

pub mod cellular;
pub mod hash;
pub mod interp;
pub mod lattice;
pub mod lut;
pub mod simplex;

pub use cellular::CellSample;
pub use interp::InterpKind;
