use ndarray::{Array2, ArrayView1, Axis, Zip};
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;
use rand::Rng;

/// Upper bound of the raw initial draws. Only relative magnitudes matter
/// since every column is normalized right after drawing.
const INIT_SCALE: f64 = 10.0;

/// Random column-stochastic matrix
///
/// Draws every entry uniformly from `[0, 10)` and normalizes each column to sum to 1.
/// The caller owns the random source, so a seeded generator gives reproducible output.
///
/// # Arguments
/// * `rows` - number of rows (the distribution's support)
/// * `cols` - number of columns (one distribution each)
/// * `rng` - random source
pub fn random_stochastic<R: Rng + ?Sized>(rows: usize, cols: usize, rng: &mut R) -> Array2<f64> {
    let mut matrix = Array2::random_using((rows, cols), Uniform::new(0.0, INIT_SCALE), rng);
    normalize_columns(&mut matrix);
    matrix
}

/// Normalize each column in place.
/// A column whose total is exactly zero is set to all zeros.
pub fn normalize_columns(matrix: &mut Array2<f64>) {
    let totals = matrix.sum_axis(Axis(0));
    divide_columns(matrix, totals.view());
}

/// Divide column `j` by `totals[j]`, zero-fallback when the total is zero
pub fn divide_columns(matrix: &mut Array2<f64>, totals: ArrayView1<'_, f64>) {
    Zip::from(matrix.columns_mut())
        .and(totals)
        .par_for_each(|mut column, &total| {
            if total != 0.0 {
                column.mapv_inplace(|v| v / total);
            } else {
                column.fill(0.0);
            }
        });
}

/// True if every entry is non-negative and each column either sums to 1
/// within `tol` or is entirely zero
pub fn is_column_stochastic(matrix: &Array2<f64>, tol: f64) -> bool {
    matrix.columns().into_iter().all(|column| {
        if column.iter().any(|v| !(*v >= 0.0)) {
            return false;
        }
        let total = column.sum();
        (total - 1.0).abs() <= tol || column.iter().all(|v| *v == 0.0)
    })
}
