//! Linear models fitted by regularized gradient descent.
//!
//! Both families share one update rule. Each iteration first decays every
//! non-bias weight by `1 - αλ/m`, then subtracts `(α/m)·Xᵀ(h(θ) - y)` where
//! the hypothesis uses the weights from before the decay.
//!
//! # Examples
//!
//! ```rust
//! use gradfit::linear_model::linear_regression;
//! use gradfit::{DataSet, DataSetTarget, FeatureParameters, GradientDescent};
//! use ndarray::array;
//!
//! let x = DataSet::new(array![[1.0], [2.0], [3.0]]);
//! let y = DataSetTarget::new(array![2.0, 4.0, 6.0]);
//!
//! let gd = GradientDescent::new(0.1, 0.0, 5000);
//! let theta = linear_regression::gradient_descent(&x, &y, &FeatureParameters::zeros(1), &gd).unwrap();
//! let predictions = linear_regression::predict(&theta, &x).unwrap();
//! assert!((predictions[2] - 6.0).abs() < 1e-3);
//! ```

pub mod linear_regression;
pub mod logistic_regression;

use crate::config::GradientDescent;
use crate::dataset::{DataSet, DataSetTarget, FeatureParameters};
use crate::error::{ensure_non_empty, ensure_shape, Result};
use crate::{Matrix, Vector};
use ndarray::ArrayView1;

/// Shared preconditions: at least one example and one target row per example.
pub(crate) fn check_examples(data: &DataSet, target: &DataSetTarget) -> Result<()> {
    ensure_non_empty(data.num_examples(), "training examples")?;
    ensure_shape(
        target.num_examples(),
        data.num_examples(),
        "number of target rows",
    )
}

/// Regularized batch gradient descent over a bias-augmented design matrix.
pub(crate) fn descend<H>(
    x: &Matrix,
    y: ArrayView1<'_, f64>,
    initial: &FeatureParameters,
    gd: &GradientDescent,
    hypothesis: H,
) -> Vector
where
    H: Fn(&Matrix, &Vector) -> Vector,
{
    let m = x.nrows() as f64;
    let step = gd.learning_rate() / m;
    let lambda = gd.regularization();
    let decay = 1.0 - step * lambda;

    let mut theta = initial.vector().clone();
    for _ in 0..gd.num_iterations() {
        let gradient = x.t().dot(&(hypothesis(x, &theta) - &y));
        if lambda != 0.0 {
            let bias = theta[0];
            theta *= decay;
            theta[0] = bias;
        }
        theta.scaled_add(-step, &gradient);
    }
    theta
}
