//! Constraint-based layout of canvas items
//!
//! Items are registered with a [`ConstraintContainer`], which solves a set of
//! linear constraints for their geometry, or with a [`BoxPacker`], which
//! derives those constraints from a packing list.

pub mod config;
pub mod constrained;
pub mod container;
pub mod error;
pub mod item;
pub mod packer;
pub mod solver;
pub mod types;

pub use config::LayoutConfig;
pub use constrained::{
    AxisVariables, BoxConstrainedItem, ConstrainedItem, Orientation, PackOptions, Packing,
};
pub use container::{Applied, ConstraintContainer, Entry};
pub use error::LayoutError;
pub use item::{LayoutItem, SimpleItem};
pub use packer::{BoxPacker, Sides};
pub use solver::{
    Constraint, Expression, LinearSolver, Relation, SolverError, Strength, Term, Variable,
};
pub use types::{Cached, ItemId, Point, Rect, Requisition, Size};
