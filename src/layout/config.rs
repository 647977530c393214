//! Configuration for containers and their spatial index

/// Configuration options given to every container at construction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutConfig {
    /// Target number of items per grid cell when a container builds its
    /// optimizing lookup table
    pub items_per_cell: usize,

    /// Containers with fewer children than this use a linear scan instead of a grid
    pub dumb_lookup_threshold: usize,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            items_per_cell: 64,
            dumb_lookup_threshold: 16,
        }
    }
}

impl LayoutConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the grid density; values below 1 are treated as 1
    pub fn with_items_per_cell(mut self, items_per_cell: usize) -> Self {
        self.items_per_cell = items_per_cell.max(1);
        self
    }

    /// Set the child count from which the grid index is used
    pub fn with_dumb_lookup_threshold(mut self, threshold: usize) -> Self {
        self.dumb_lookup_threshold = threshold;
        self
    }
}
