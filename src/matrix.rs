//! Dense matrix helpers shared by the data model and every trainer.
//!
//! All functions are pure: they borrow their inputs and return new matrices.

use crate::error::{ensure_non_empty, Error, Result};
use crate::{Matrix, Vector};
use ndarray::{s, Axis};
use rand::Rng;

const JACOBI_MAX_SWEEPS: usize = 100;

pub fn ones(rows: usize, cols: usize) -> Matrix {
    Matrix::ones((rows, cols))
}

/// Column sums as a `1 × n` matrix (`1ᵗ · M`).
pub fn sum_cols(matrix: &Matrix) -> Matrix {
    ones(1, matrix.nrows()).dot(matrix)
}

/// Per-column minimum as a `1 × n` matrix.
pub fn col_min(data: &Matrix) -> Result<Matrix> {
    ensure_non_empty(data.nrows(), "matrix rows")?;
    let mins = data.fold_axis(Axis(0), f64::INFINITY, |&acc, &x| acc.min(x));
    Ok(mins.insert_axis(Axis(0)))
}

/// Per-column maximum as a `1 × n` matrix.
pub fn col_max(data: &Matrix) -> Result<Matrix> {
    ensure_non_empty(data.nrows(), "matrix rows")?;
    let maxs = data.fold_axis(Axis(0), f64::NEG_INFINITY, |&acc, &x| acc.max(x));
    Ok(maxs.insert_axis(Axis(0)))
}

/// Indicator matrix: `1.0` where the element equals `value`, else `0.0`.
pub fn filter_equals(matrix: &Matrix, value: f64) -> Matrix {
    matrix.mapv(|x| if x == value { 1.0 } else { 0.0 })
}

/// Copy of `matrix` with every entry of `column` set to `value`.
pub fn set_column(matrix: &Matrix, column: usize, value: f64) -> Result<Matrix> {
    if column >= matrix.ncols() {
        return Err(Error::Shape(format!(
            "column {} out of range for matrix with {} columns",
            column,
            matrix.ncols()
        )));
    }
    let mut result = matrix.clone();
    result.column_mut(column).fill(value);
    Ok(result)
}

/// Identity scaled by `value`, except entry `[0, 0]` which is zero.
pub fn short_diagonal(width: usize, value: f64) -> Matrix {
    let mut diagonal = Matrix::eye(width) * value;
    if width > 0 {
        diagonal[(0, 0)] = 0.0;
    }
    diagonal
}

/// Prepends a column of ones.
pub fn add_bias_column(data: &Matrix) -> Matrix {
    let mut result = ones(data.nrows(), data.ncols() + 1);
    result.slice_mut(s![.., 1..]).assign(data);
    result
}

/// Prepends a row of ones.
pub fn add_bias_row(data: &Matrix) -> Matrix {
    let mut result = ones(data.nrows() + 1, data.ncols());
    result.slice_mut(s![1.., ..]).assign(data);
    result
}

pub fn concat_columns(left: &Matrix, right: &Matrix) -> Result<Matrix> {
    ndarray::concatenate(Axis(1), &[left.view(), right.view()])
        .map_err(|e| Error::Shape(format!("cannot concatenate columns: {}", e)))
}

/// A uniformly random permutation of `0..size` (backward Fisher–Yates).
pub fn shuffled_indices<R: Rng + ?Sized>(size: usize, rng: &mut R) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..size).collect();
    for i in (0..size).rev() {
        let swap_index = rng.gen_range(0..=i);
        indices.swap(i, swap_index);
    }
    indices
}

pub fn shuffle_rows<R: Rng + ?Sized>(matrix: &Matrix, rng: &mut R) -> Matrix {
    let order = shuffled_indices(matrix.nrows(), rng);
    matrix.select(Axis(0), &order)
}

/// Moore–Penrose pseudo-inverse.
///
/// Symmetric input is inverted through its eigen-decomposition, dropping
/// eigenvalues below `n · ε · max|λ|`. Any other matrix `M` goes through
/// `(MᵀM)⁺ Mᵀ`.
pub fn pseudo_inverse(matrix: &Matrix) -> Matrix {
    if is_symmetric(matrix) {
        symmetric_pseudo_inverse(matrix)
    } else {
        let transpose = matrix.t();
        symmetric_pseudo_inverse(&transpose.dot(matrix)).dot(&transpose)
    }
}

fn is_symmetric(matrix: &Matrix) -> bool {
    if !matrix.is_square() {
        return false;
    }
    let scale = matrix.iter().fold(1.0_f64, |acc, &x| acc.max(x.abs()));
    let n = matrix.nrows();
    (0..n).all(|i| (i + 1..n).all(|j| (matrix[(i, j)] - matrix[(j, i)]).abs() <= 1e-12 * scale))
}

fn symmetric_pseudo_inverse(matrix: &Matrix) -> Matrix {
    let n = matrix.nrows();
    if n == 0 {
        return Matrix::zeros((0, 0));
    }

    let (eigenvalues, eigenvectors) = jacobi_eigen(matrix);
    let largest = eigenvalues.iter().fold(0.0_f64, |acc, &v| acc.max(v.abs()));
    let tolerance = n as f64 * f64::EPSILON * largest;
    let inverted = eigenvalues.mapv(|v| if v.abs() > tolerance { 1.0 / v } else { 0.0 });

    let scaled = &eigenvectors * &inverted.view().insert_axis(Axis(0));
    scaled.dot(&eigenvectors.t())
}

/// Cyclic Jacobi eigen-decomposition of a symmetric matrix.
///
/// Returns the eigenvalues and a matrix whose columns are the matching
/// orthonormal eigenvectors.
fn jacobi_eigen(matrix: &Matrix) -> (Vector, Matrix) {
    let n = matrix.nrows();
    let mut a = matrix.clone();
    let mut v = Matrix::eye(n);

    for _ in 0..JACOBI_MAX_SWEEPS {
        let total = a.iter().map(|x| x * x).sum::<f64>();
        let mut off_diagonal = 0.0;
        for p in 0..n {
            for q in (p + 1)..n {
                off_diagonal += 2.0 * a[(p, q)] * a[(p, q)];
            }
        }
        if off_diagonal <= f64::EPSILON * f64::EPSILON * total {
            break;
        }

        for p in 0..n {
            for q in (p + 1)..n {
                let apq = a[(p, q)];
                if apq == 0.0 {
                    continue;
                }

                let theta = (a[(q, q)] - a[(p, p)]) / (2.0 * apq);
                let t = theta.signum() / (theta.abs() + (theta * theta + 1.0).sqrt());
                let c = 1.0 / (t * t + 1.0).sqrt();
                let s = t * c;

                for k in 0..n {
                    let akp = a[(k, p)];
                    let akq = a[(k, q)];
                    a[(k, p)] = c * akp - s * akq;
                    a[(k, q)] = s * akp + c * akq;
                }
                for k in 0..n {
                    let apk = a[(p, k)];
                    let aqk = a[(q, k)];
                    a[(p, k)] = c * apk - s * aqk;
                    a[(q, k)] = s * apk + c * aqk;
                }
                for k in 0..n {
                    let vkp = v[(k, p)];
                    let vkq = v[(k, q)];
                    v[(k, p)] = c * vkp - s * vkq;
                    v[(k, q)] = s * vkp + c * vkq;
                }
            }
        }
    }

    (a.diag().to_owned(), v)
}
