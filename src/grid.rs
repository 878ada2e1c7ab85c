use bioheat_common::{BoundaryCondition, ConfigError};

/// Square computational domain: `size × size` cells over `length_m` metres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Grid {
    size: usize,
    dx: f64,
}

impl Grid {
    pub fn new(size: usize, length_m: f64) -> Result<Self, ConfigError> {
        if size == 0 {
            return Err(ConfigError::EmptyGrid);
        }
        if !length_m.is_finite() {
            return Err(ConfigError::NonFinite { field: "grid.length_m" });
        }
        if length_m <= 0.0 {
            return Err(ConfigError::NonPositive { field: "grid.length_m", value: length_m });
        }
        Ok(Grid { size, dx: length_m / size as f64 })
    }

    #[inline(always)]
    pub fn size(&self) -> usize {
        self.size
    }

    #[inline(always)]
    pub fn dx(&self) -> f64 {
        self.dx
    }

    pub fn num_cells(&self) -> usize {
        self.size * self.size
    }

    #[inline(always)]
    pub fn idx(&self, i: usize, j: usize) -> usize {
        i * self.size + j
    }

    /// Indices of the previous and next cell along one axis.
    ///
    /// Periodic edges wrap; insulated edges return the cell itself, which
    /// makes the flux across the edge zero.
    #[inline(always)]
    pub fn neighbors(&self, k: usize, boundary: BoundaryCondition) -> (usize, usize) {
        let n = self.size;
        match boundary {
            BoundaryCondition::Periodic => ((k + n - 1) % n, (k + 1) % n),
            BoundaryCondition::Insulated => (k.saturating_sub(1), (k + 1).min(n - 1)),
        }
    }

    /// Mirror of cell `(i, j)` through the grid center.
    pub fn point_reflection(&self, i: usize, j: usize) -> (usize, usize) {
        (self.size - 1 - i, self.size - 1 - j)
    }
}
