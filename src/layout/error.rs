//! Error types for the layout engine

use thiserror::Error;

use super::solver::SolverError;
use super::types::ItemId;

/// Errors that can occur during layout computation
#[derive(Debug, Clone, Error)]
pub enum LayoutError {
    /// The id does not belong to the container
    #[error("unknown item {0}")]
    UnknownItem(ItemId),

    /// Constraint solver error; the allocation pass was abandoned
    #[error("constraint solver error: {0}")]
    Solver(#[from] SolverError),
}

impl LayoutError {
    /// True when required constraints conflict
    pub fn is_unsatisfiable(&self) -> bool {
        matches!(self, Self::Solver(SolverError::Unsatisfiable { .. }))
    }
}
