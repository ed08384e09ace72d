use std::fmt;

/// Errors that can abort world generation.
///
/// Expected non-events (a dropped cell, a river that cannot flow, a pair of
/// settlements without a path) are not errors and never show up here.
#[derive(Debug)]
pub enum GenerationError {
    InvalidParams(String),
    DegenerateTriangulation { points: usize },
    EmptyGraph,
}

impl fmt::Display for GenerationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerationError::InvalidParams(e) => write!(f, "Invalid generation parameters: {}", e),
            GenerationError::DegenerateTriangulation { points } => write!(
                f,
                "Cannot triangulate {} points (need at least 3 non-collinear points)",
                points
            ),
            GenerationError::EmptyGraph => {
                write!(f, "Cell graph is empty after removing degenerate cells")
            }
        }
    }
}

impl std::error::Error for GenerationError {}

impl From<String> for GenerationError {
    fn from(e: String) -> Self {
        GenerationError::InvalidParams(e)
    }
}
