//! Polygon triangulation of flattened contours.
//!
//! The mesh assembler only depends on the [`Triangulator`] trait; the default
//! [`LyonTriangulator`] runs lyon's fill tessellator over the contours.

use glam::Vec2;
use lyon::lyon_tessellation::{
    BuffersBuilder, FillOptions, FillTessellator, FillVertex as LyonFillVertex, TessellationError,
    VertexBuffers,
};
use lyon::math::Point;
use lyon::path::Path as LyonPath;
use meshkit_core::profiling::profile_function;
use parking_lot::Mutex;

use crate::FillRule;
use crate::contour::Contour;
use crate::vertex::TessellatedMesh;

/// Output of a triangulation: positions and triangle indices.
pub type Triangulation = TessellatedMesh<Vec2>;

/// Why a triangulation produced nothing.
#[derive(Debug, Clone, PartialEq)]
pub struct TriangulationError(pub String);

impl std::fmt::Display for TriangulationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "triangulation failed: {}", self.0)
    }
}

impl std::error::Error for TriangulationError {}

impl From<TessellationError> for TriangulationError {
    fn from(err: TessellationError) -> Self {
        Self(format!("{err:?}"))
    }
}

/// Constrained polygon triangulation.
///
/// Callers drop contours with fewer than three points before calling.
pub trait Triangulator: Send + Sync {
    fn triangulate(
        &self,
        contours: &[Contour],
        rule: FillRule,
    ) -> Result<Triangulation, TriangulationError>;
}

/// [`Triangulator`] backed by lyon's sweep-line fill tessellator.
pub struct LyonTriangulator {
    tessellator: Mutex<FillTessellator>,
    /// Tolerance handed to lyon. Contours are already flat, so it only matters
    /// for lyon's internal snapping.
    pub tolerance: f32,
}

impl Default for LyonTriangulator {
    fn default() -> Self {
        Self::new()
    }
}

impl LyonTriangulator {
    pub fn new() -> Self {
        Self {
            tessellator: Mutex::new(FillTessellator::new()),
            tolerance: 0.05,
        }
    }

    pub fn with_tolerance(tolerance: f32) -> Self {
        Self {
            tessellator: Mutex::new(FillTessellator::new()),
            tolerance,
        }
    }
}

impl Triangulator for LyonTriangulator {
    fn triangulate(
        &self,
        contours: &[Contour],
        rule: FillRule,
    ) -> Result<Triangulation, TriangulationError> {
        profile_function!();
        let mut builder = LyonPath::builder();
        for contour in contours {
            let mut points = contour.points.as_slice();
            if contour.closed && points.len() > 1 && points.first() == points.last() {
                points = &points[..points.len() - 1];
            }
            let Some((first, rest)) = points.split_first() else {
                continue;
            };
            builder.begin(Point::new(first.x, first.y));
            for p in rest {
                builder.line_to(Point::new(p.x, p.y));
            }
            builder.end(true);
        }
        let path = builder.build();

        let options = FillOptions::default()
            .with_tolerance(self.tolerance)
            .with_fill_rule(convert_fill_rule(rule));

        let mut buffers: VertexBuffers<Vec2, u32> = VertexBuffers::new();
        self.tessellator.lock().tessellate_path(
            &path,
            &options,
            &mut BuffersBuilder::new(&mut buffers, |vertex: LyonFillVertex| {
                Vec2::new(vertex.position().x, vertex.position().y)
            }),
        )?;

        Ok(TessellatedMesh::from_data(buffers.vertices, buffers.indices))
    }
}

fn convert_fill_rule(rule: FillRule) -> lyon::lyon_tessellation::FillRule {
    match rule {
        FillRule::NonZero => lyon::lyon_tessellation::FillRule::NonZero,
        FillRule::EvenOdd => lyon::lyon_tessellation::FillRule::EvenOdd,
    }
}
