//! Resource management
//!
//! Procedural meshes and flat-color materials.

mod mesh;
mod material;

pub use mesh::*;
pub use material::*;
