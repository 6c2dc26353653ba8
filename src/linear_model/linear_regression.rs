use super::{check_examples, descend};
use crate::config::{check_lambda, GradientDescent};
use crate::dataset::{DataSet, DataSetTarget, FeatureParameters};
use crate::error::{ensure_shape, Result};
use crate::matrix;
use crate::training::{CostEvaluator, Trainer};
use crate::{Matrix, Vector};
use tracing::debug;

/// `X · θ` for a design matrix that already carries the bias column.
pub fn hypothesis(theta: &FeatureParameters, x: &Matrix) -> Result<Vector> {
    ensure_shape(theta.len(), x.ncols(), "parameter count vs design matrix columns")?;
    Ok(x.dot(theta.vector()))
}

/// Predicted values for raw features.
pub fn predict(theta: &FeatureParameters, data: &DataSet) -> Result<Vector> {
    theta.check_features(data.num_features())?;
    hypothesis(theta, &data.with_bias())
}

/// `(Σ(Xθ - y)² + λ·Σ_{i≥1} θᵢ²) / 2m`.
pub fn cost(
    theta: &FeatureParameters,
    data: &DataSet,
    target: &DataSetTarget,
    lambda: f64,
) -> Result<f64> {
    check_lambda(lambda);
    check_examples(data, target)?;
    theta.check_features(data.num_features())?;
    let y = target.column()?;

    let m = data.num_examples() as f64;
    let errors = hypothesis(theta, &data.with_bias())? - &y;
    let squared_error = errors.dot(&errors);
    let regularization = if lambda == 0.0 {
        0.0
    } else {
        let weights = theta.vector().slice(ndarray::s![1..]);
        lambda * weights.dot(&weights)
    };
    Ok((squared_error + regularization) / (2.0 * m))
}

pub fn gradient_descent(
    data: &DataSet,
    target: &DataSetTarget,
    initial: &FeatureParameters,
    gd: &GradientDescent,
) -> Result<FeatureParameters> {
    check_examples(data, target)?;
    initial.check_features(data.num_features())?;
    let y = target.column()?;

    debug!(
        alpha = gd.learning_rate(),
        lambda = gd.regularization(),
        iterations = gd.num_iterations(),
        examples = data.num_examples(),
        features = data.num_features(),
        "linear regression gradient descent"
    );

    let theta = descend(&data.with_bias(), y, initial, gd, |x, theta| x.dot(theta));
    Ok(FeatureParameters::new(theta))
}

/// Closed-form fit: `pinv(XᵀX + λ·D) · Xᵀy`, where `D` is the identity with
/// the bias entry zeroed.
pub fn normal_equation(data: &DataSet, target: &DataSetTarget, lambda: f64) -> Result<FeatureParameters> {
    check_lambda(lambda);
    check_examples(data, target)?;
    let y = target.column()?;

    let x = data.with_bias();
    let xt = x.t();
    let mut gram = xt.dot(&x);
    if lambda > 0.0 {
        gram += &matrix::short_diagonal(x.ncols(), lambda);
    }
    let theta = matrix::pseudo_inverse(&gram).dot(&xt).dot(&y);
    Ok(FeatureParameters::new(theta))
}

/// Gradient descent from all-zero parameters.
pub fn trainer(gd: GradientDescent) -> impl Trainer<FeatureParameters> {
    move |data: &DataSet, target: &DataSetTarget| {
        gradient_descent(data, target, &FeatureParameters::zeros(data.num_features()), &gd)
    }
}

pub fn normal_equation_trainer(lambda: f64) -> impl Trainer<FeatureParameters> {
    check_lambda(lambda);
    move |data: &DataSet, target: &DataSetTarget| normal_equation(data, target, lambda)
}

pub fn cost_evaluator(lambda: f64) -> impl CostEvaluator<FeatureParameters> {
    check_lambda(lambda);
    move |theta: &FeatureParameters, data: &DataSet, target: &DataSetTarget| {
        cost(theta, data, target, lambda)
    }
}
