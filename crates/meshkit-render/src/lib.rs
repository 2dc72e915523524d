//! meshkit render - from meshes to draw calls
//!
//! This crate provides:
//! - [`BatchCompressor`], which merges consecutive compatible meshes into
//!   [`Batches`] stored in a reusable [`ScratchPool`]
//! - [`MeshCloud`] for instanced drawing
//! - [`Renderer`], a facade driving any [`RenderBackend`]
//!
//! The crate does not talk to a GPU; a backend receives vertex slices,
//! uniforms and a [`ShaderVariant`] and issues the actual draws.

// Batching
mod batch;
mod compress;
mod scratch;

// Instancing
mod cloud;

// Facade
mod renderer;

pub use batch::*;
pub use compress::*;
pub use scratch::*;

pub use cloud::*;

pub use renderer::*;
