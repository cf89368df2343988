/// Mean and population standard deviation of one set of values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    pub mean: f64,
    pub std_dev: f64,
}

impl Summary {
    pub fn of(vals: &[f64]) -> Self {
        Self {
            mean: compute_mean(vals),
            std_dev: compute_var(vals).sqrt(),
        }
    }
}

/// Reduce every row of a matrix to its [`Summary`].
///
/// Returns the row means and row standard deviations as two columns.
pub fn reduce_rows(mat: &[Vec<f64>]) -> (Vec<f64>, Vec<f64>) {
    mat.iter()
        .map(|row| Summary::of(row))
        .map(|summary| (summary.mean, summary.std_dev))
        .unzip()
}

fn compute_mean(vals: &[f64]) -> f64 {
    if vals.is_empty() {
        return f64::NAN;
    }
    vals.iter().sum::<f64>() / vals.len() as f64
}

/// Population variance (divisor `n`), so a single seed has zero spread.
fn compute_var(vals: &[f64]) -> f64 {
    let n_vals = vals.len();
    if n_vals == 0 {
        return f64::NAN;
    }
    let mean = compute_mean(vals);
    vals.iter().map(|&val| (val - mean).powi(2)).sum::<f64>() / n_vals as f64
}
