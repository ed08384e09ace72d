use rand::Rng;

use crate::error::GenerationError;
use crate::world::cell::Point;

/// Half-edge value marking a boundary edge with no opposite.
pub const NO_HALFEDGE: usize = delaunator::EMPTY;

/// Generate `width * height` lattice points, each displaced by up to `jitter`
/// along both axes. Points are emitted column by column (x outer, y inner).
pub fn jittered_grid(width: u32, height: u32, jitter: f64, rng: &mut impl Rng) -> Vec<Point> {
    let mut points = Vec::with_capacity((width * height) as usize);
    for x in 0..width {
        for y in 0..height {
            let dx = jitter * (rng.r#gen::<f64>() - rng.r#gen::<f64>());
            let dy = jitter * (rng.r#gen::<f64>() - rng.r#gen::<f64>());
            points.push(Point::new(x as f64 + dx, y as f64 + dy));
        }
    }
    points
}

/// Delaunay triangulation in half-edge form plus the per-triangle centroids
/// used as cell boundary vertices.
///
/// Half-edge `e` belongs to triangle `e / 3`, starts at point `triangles[e]`
/// and its opposite is `halfedges[e]` (or [`NO_HALFEDGE`] on the hull).
#[derive(Debug, Clone)]
pub struct Triangulation {
    pub triangles: Vec<usize>,
    pub halfedges: Vec<usize>,
    pub centers: Vec<Point>,
}

impl Triangulation {
    /// Triangulate a point set.
    pub fn new(points: &[Point]) -> Result<Self, GenerationError> {
        let input: Vec<delaunator::Point> = points
            .iter()
            .map(|p| delaunator::Point { x: p.x, y: p.y })
            .collect();
        let result = delaunator::triangulate(&input);
        if result.triangles.is_empty() {
            return Err(GenerationError::DegenerateTriangulation {
                points: points.len(),
            });
        }
        Ok(Self::from_parts(result.triangles, result.halfedges, points))
    }

    /// Assemble a triangulation from raw arrays.
    ///
    /// # Panics
    /// Panics if the arrays differ in length or are not a multiple of 3.
    pub fn from_parts(triangles: Vec<usize>, halfedges: Vec<usize>, points: &[Point]) -> Self {
        assert_eq!(
            triangles.len(),
            halfedges.len(),
            "triangles and halfedges must have the same length"
        );
        assert!(
            triangles.len() % 3 == 0,
            "triangle array length must be a multiple of 3"
        );
        let centers = triangles
            .chunks(3)
            .map(|t| {
                let (a, b, c) = (points[t[0]], points[t[1]], points[t[2]]);
                Point::new((a.x + b.x + c.x) / 3.0, (a.y + b.y + c.y) / 3.0)
            })
            .collect();
        Self {
            triangles,
            halfedges,
            centers,
        }
    }

    pub fn halfedge_count(&self) -> usize {
        self.halfedges.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len() / 3
    }

    /// Point that half-edge `e` points to.
    pub fn end_point(&self, e: usize) -> usize {
        self.triangles[next_halfedge(e)]
    }

    /// Incoming half-edges around the point that `start` ends at.
    ///
    /// For interior points the walk closes back on `start`. For hull points
    /// it stops on the first boundary half-edge, so the ring is open and may
    /// only cover one side of the point.
    pub fn edges_around_point(&self, start: usize) -> Vec<usize> {
        let mut ring = Vec::new();
        let mut incoming = start;
        loop {
            ring.push(incoming);
            let outgoing = next_halfedge(incoming);
            incoming = self.halfedges[outgoing];
            if incoming == NO_HALFEDGE || incoming == start {
                break;
            }
        }
        ring
    }
}

pub fn next_halfedge(e: usize) -> usize {
    if e % 3 == 2 { e - 2 } else { e + 1 }
}

pub fn triangle_of_edge(e: usize) -> usize {
    e / 3
}
