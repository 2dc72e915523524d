//! meshkit geometry - figures to triangle meshes
//!
//! This crate provides:
//! - Figures built from path commands, flattened into cached contours
//! - Stroke extrusion with joins, caps and dashing
//! - Fill triangulation behind the [`Triangulator`] seam
//! - Gradients, color-matrix filters and texture placement
//! - [`Mesh`], which assembles all of the above into vertex buffers
//!
//! # Example
//!
//! ```
//! use glam::Vec2;
//! use meshkit_core::Color;
//! use meshkit_geometry::*;
//!
//! let mut figure = Figure::new();
//! figure
//!     .move_to(Vec2::new(0.0, 0.0))
//!     .line_to(Vec2::new(100.0, 0.0))
//!     .quad_to(Vec2::new(150.0, 50.0), Vec2::new(100.0, 100.0))
//!     .close();
//!
//! let mut mesh = Mesh::new(figure);
//! mesh.set_fill(FillStyle::solid(Color::RED));
//! mesh.set_stroke(StrokeStyle::solid(Color::BLACK, 2.0).with_join(LineJoin::Round))
//!     .unwrap();
//! mesh.translate(Vec2::new(10.0, 10.0));
//!
//! let data = mesh.mesh_data();
//! assert!(data.vertex_count() > data.fill_vertex_count);
//! ```

// Contour model
mod contour;
mod curve;
mod path;
mod transform;

// Styling
mod fill;
mod filter;
mod paint;
mod stroke;
mod texture;

// Tessellation
mod extrude;
mod tessellator;
mod vertex;

// Assembly
mod dirty;
mod mesh;
mod uniforms;

pub use contour::*;
pub use curve::*;
pub use path::*;
pub use transform::*;

pub use fill::*;
pub use filter::*;
pub use paint::*;
pub use stroke::*;
pub use texture::*;

pub use extrude::*;
pub use tessellator::*;
pub use vertex::*;

pub use dirty::*;
pub use mesh::*;
pub use uniforms::*;
