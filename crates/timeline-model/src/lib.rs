//! otmlt Timeline Model
//!
//! Defines the source object graph consumed by the MLT compiler:
//! - **Time:** Rational time values and ranges
//! - **Items:** Timelines, stacks, tracks, clips, gaps, and transitions
//! - **Media:** References to external files, generators, and image sequences
//! - **Effects:** Linear time warps, freeze frames, and opaque effects
//!
//! The graph is plain data. It is built in memory (or deserialized from
//! JSON by a collaborator) and never mutated by the compiler.

pub mod effect;
pub mod item;
pub mod media;
pub mod time;

pub use effect::*;
pub use item::*;
pub use media::*;
pub use time::*;
