use serde::{Deserialize, Serialize};

/// A square `size × size` grid of f64 values stored row-major.
///
/// `(i, j)` addresses row `i`, column `j`. This is the value type handed to
/// exporters and renderers; the solver's working buffers are plain slices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalarField {
    size: usize,
    values: Vec<f64>,
}

/// Summary statistics over a field. `non_finite` counts NaN and ±∞ cells,
/// which are excluded from min/max/mean.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldStats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub non_finite: usize,
}

impl ScalarField {
    /// Creates a field with every cell set to `value`.
    pub fn filled(size: usize, value: f64) -> Self {
        Self { size, values: vec![value; size * size] }
    }

    /// Wraps an existing row-major buffer. Returns `None` if the length is
    /// not `size * size`.
    pub fn from_vec(size: usize, values: Vec<f64>) -> Option<Self> {
        (values.len() == size * size).then_some(Self { size, values })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn values_mut(&mut self) -> &mut [f64] {
        &mut self.values
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[i * self.size + j]
    }

    #[inline]
    pub fn set(&mut self, i: usize, j: usize, value: f64) {
        self.values[i * self.size + j] = value;
    }

    /// Iterates rows from top (`i = 0`) to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        // chunks(0) panics, and an empty field has no rows anyway
        self.values.chunks(self.size.max(1))
    }

    pub fn stats(&self) -> FieldStats {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut sum = 0.0;
        let mut finite = 0usize;
        for &v in &self.values {
            if v.is_finite() {
                min = min.min(v);
                max = max.max(v);
                sum += v;
                finite += 1;
            }
        }
        let mean = if finite > 0 { sum / finite as f64 } else { f64::NAN };
        FieldStats {
            min,
            max,
            mean,
            non_finite: self.values.len() - finite,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indexing_is_row_major() {
        let field = ScalarField::from_vec(2, vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        assert_eq!(field.get(0, 1), 2.0);
        assert_eq!(field.get(1, 0), 3.0);
        let rows: Vec<&[f64]> = field.rows().collect();
        assert_eq!(rows, vec![&[1.0, 2.0][..], &[3.0, 4.0][..]]);
    }

    #[test]
    fn from_vec_rejects_wrong_length() {
        assert!(ScalarField::from_vec(3, vec![0.0; 8]).is_none());
    }

    #[test]
    fn stats_skip_non_finite_cells() {
        let field = ScalarField::from_vec(2, vec![1.0, f64::NAN, 3.0, f64::INFINITY]).unwrap();
        let stats = field.stats();
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.max, 3.0);
        assert_eq!(stats.mean, 2.0);
        assert_eq!(stats.non_finite, 2);
    }
}
