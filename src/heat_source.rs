use crate::grid::Grid;
use log::debug;
use std::ops::Range;

/// Row/column range covered by a centered square source of `heat_size`
/// cells: `[n/2 - s, n/2 + s)` with `s = heat_size / 2`, clipped to the grid.
pub fn source_span(grid_size: usize, heat_size: usize) -> Range<usize> {
    let center = grid_size / 2;
    let half = heat_size / 2;
    let start = center.saturating_sub(half);
    let end = center.saturating_add(half).min(grid_size);
    start..end
}

/// Builds the constant volumetric power field (W/m³): `heat_power` inside
/// the source square, zero elsewhere.
pub fn build_heat_source(grid: &Grid, heat_size: usize, heat_power: f64) -> Vec<f64> {
    let n = grid.size();
    let mut source = vec![0.0; grid.num_cells()];
    if heat_size > n {
        debug!("Heat source size {} exceeds grid size {}; clipping to the grid.", heat_size, n);
    }
    let span = source_span(n, heat_size);
    for i in span.clone() {
        source[grid.idx(i, span.start)..grid.idx(i, span.end)].fill(heat_power);
    }
    source
}
