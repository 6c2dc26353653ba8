//! Forward pass, cost and gradients over a bare list of layer weights.
//!
//! Activations are stored transposed: one column per example, with the bias
//! unit as row 0 of every layer except the output layer.

use crate::error::Result;
use crate::linear_model::logistic_regression::{cross_entropy, sigmoid};
use crate::{matrix, Matrix};
use ndarray::s;

pub(crate) fn forward(thetas: &[Matrix], x: &Matrix) -> Vec<Matrix> {
    let last = thetas.len() - 1;
    let mut activations = Vec::with_capacity(thetas.len() + 1);
    activations.push(matrix::add_bias_column(x).reversed_axes());
    for (i, theta) in thetas.iter().enumerate() {
        let output = theta.dot(&activations[i]).mapv(sigmoid);
        activations.push(if i == last {
            output
        } else {
            matrix::add_bias_row(&output)
        });
    }
    activations
}

/// Output activations as an `m × outputs` matrix.
pub(crate) fn output(thetas: &[Matrix], x: &Matrix) -> Matrix {
    let mut activations = forward(thetas, x);
    match activations.pop() {
        Some(last) => last.reversed_axes(),
        None => Matrix::zeros((x.nrows(), 0)),
    }
}

/// Cross-entropy over every output neuron plus `λ/2` times the squared
/// non-bias weights, divided by `m`.
pub(crate) fn cost(thetas: &[Matrix], x: &Matrix, y: &Matrix, lambda: f64) -> f64 {
    let m = x.nrows() as f64;
    let h = output(thetas, x);
    let error = cross_entropy(h.iter().zip(y.iter()));
    let regularization = if lambda > 0.0 {
        let squares: f64 = thetas
            .iter()
            .map(|theta| theta.slice(s![.., 1..]).iter().map(|w| w * w).sum::<f64>())
            .sum();
        lambda / 2.0 * squares
    } else {
        0.0
    };
    (error + regularization) / m
}

/// Backpropagation, vectorized over all examples at once.
pub(crate) fn gradients(thetas: &[Matrix], x: &Matrix, y: &Matrix, lambda: f64) -> Result<Vec<Matrix>> {
    let m = x.nrows() as f64;
    let layers = thetas.len();
    let activations = forward(thetas, x);

    let mut grads = Vec::with_capacity(layers);
    let mut delta = &activations[layers] - &y.t();
    for j in (0..layers).rev() {
        let mut grad = delta.dot(&activations[j].t());
        if lambda > 0.0 {
            grad.scaled_add(lambda, &matrix::set_column(&thetas[j], 0, 0.0)?);
        }
        grad /= m;
        grads.push(grad);

        if j > 0 {
            let a = &activations[j];
            let propagated = thetas[j].t().dot(&delta) * &a.mapv(|v| v * (1.0 - v));
            delta = propagated.slice(s![1.., ..]).to_owned();
        }
    }
    grads.reverse();
    Ok(grads)
}

/// Central-difference estimate of the cost gradient for every weight.
pub(crate) fn numerical_gradients(
    thetas: &[Matrix],
    x: &Matrix,
    y: &Matrix,
    lambda: f64,
    epsilon: f64,
) -> Vec<Matrix> {
    let mut perturbed = thetas.to_vec();
    let mut grads = Vec::with_capacity(thetas.len());
    for layer in 0..thetas.len() {
        let (rows, cols) = thetas[layer].dim();
        let mut grad = Matrix::zeros((rows, cols));
        for r in 0..rows {
            for c in 0..cols {
                let original = perturbed[layer][(r, c)];
                perturbed[layer][(r, c)] = original - epsilon;
                let lower = cost(&perturbed, x, y, lambda);
                perturbed[layer][(r, c)] = original + epsilon;
                let upper = cost(&perturbed, x, y, lambda);
                perturbed[layer][(r, c)] = original;
                grad[(r, c)] = (upper - lower) / (2.0 * epsilon);
            }
        }
        grads.push(grad);
    }
    grads
}
