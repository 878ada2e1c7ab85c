//! Explicit Pennes bioheat step on the 5-point stencil.
//!
//! ```text
//! lap(T)  = ((T[i-1,j] + T[i+1,j]) + (T[i,j-1] + T[i,j+1]) - 4 T[i,j]) / dx²
//! dT      = (k lap(T) + w ρ c_b (Tb - T) + q) dt / (ρ c)
//! ```
//!
//! The scheme is only conditionally stable (`dt <= dx² ρc / 4k`); callers
//! choose `dt`, see [`bioheat_common::StabilityPolicy`].

use crate::grid::Grid;
use bioheat_common::constants::{BLOOD_SPECIFIC_HEAT, BODY_TEMPERATURE_C};
use bioheat_common::{BoundaryCondition, TissueProperties};
use rayon::prelude::*;

/// Advances `current` by `dt` seconds and writes the result into `next`.
///
/// Rows of `next` are computed in parallel; every cell reads only `current`,
/// so the output does not depend on scheduling. Neighbour pairs are summed
/// per axis first, which keeps the update exactly symmetric under reflection.
pub fn pennes_step(
    grid: &Grid,
    boundary: BoundaryCondition,
    tissue: &TissueProperties,
    source: &[f64],
    current: &[f64],
    next: &mut [f64],
    dt: f64,
) {
    let n = grid.size();
    debug_assert_eq!(current.len(), grid.num_cells());
    debug_assert_eq!(next.len(), grid.num_cells());
    debug_assert_eq!(source.len(), grid.num_cells());

    let dx2 = grid.dx() * grid.dx();
    let heat_capacity = tissue.heat_capacity();
    let perfusion = tissue.perfusion * tissue.density * BLOOD_SPECIFIC_HEAT;
    let k = tissue.conductivity;

    next.par_chunks_mut(n).enumerate().for_each(|(i, row_out)| {
        let (up, down) = grid.neighbors(i, boundary);
        let row = i * n;
        for (j, out) in row_out.iter_mut().enumerate() {
            let (left, right) = grid.neighbors(j, boundary);
            let t = current[row + j];
            let vertical = current[up * n + j] + current[down * n + j];
            let horizontal = current[row + left] + current[row + right];
            let laplacian = (vertical + horizontal - 4.0 * t) / dx2;
            let d_t = (k * laplacian + perfusion * (BODY_TEMPERATURE_C - t) + source[row + j]) * dt
                / heat_capacity;
            *out = t + d_t;
        }
    });
}
