//! Block and sky light propagation across chunk borders.
//!
//! A [`LightArea`] borrows a square of chunks around a focus chunk. [`fill`]
//! computes the focus chunk's own light, and [`spread`] moves light across its
//! borders into and out of the neighbours. [`relight`] and [`light_all`] run
//! both passes over chunks held by a [`ChunkManager`](lumen_chunk::ChunkManager).

mod area;
mod engine;
mod node;
mod relight;

pub use area::{LightArea, LightAreaError};
pub use engine::{LightStats, fill, spread};
pub use node::{LightNode, LightType, VoxelPos};
pub use relight::{light_all, relight};
