use super::{check_examples, descend};
use crate::config::{check_lambda, GradientDescent};
use crate::dataset::{DataSet, DataSetTarget, FeatureParameters, LabeledDataSetTarget};
use crate::error::{ensure_non_empty, ensure_shape, Result};
use crate::matrix;
use crate::training::{CostEvaluator, Predictor, Trainer};
use crate::{Matrix, Vector};
use ndarray::{s, ArrayView1};
use tracing::debug;

/// Largest double below `1.0`.
const PROBABILITY_SCALE: f64 = 1.0 - f64::EPSILON / 2.0;
/// Smallest positive subnormal double.
const PROBABILITY_OFFSET: f64 = 4.9e-324;

pub fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

/// Moves a probability strictly inside `(0, 1)` so both logarithms of the
/// cross-entropy stay finite.
pub(crate) fn clamp_probability(h: f64) -> f64 {
    h * PROBABILITY_SCALE + PROBABILITY_OFFSET
}

/// Cross-entropy summed over every element of `hypothesis` and `target`.
pub(crate) fn cross_entropy<'a, I>(pairs: I) -> f64
where
    I: IntoIterator<Item = (&'a f64, &'a f64)>,
{
    pairs
        .into_iter()
        .map(|(&h, &y)| {
            let h = clamp_probability(h);
            -y * h.ln() - (1.0 - y) * (1.0 - h).ln()
        })
        .sum()
}

/// `sigmoid(X · θ)` for a design matrix that already carries the bias column.
pub fn hypothesis(theta: &FeatureParameters, x: &Matrix) -> Result<Vector> {
    ensure_shape(theta.len(), x.ncols(), "parameter count vs design matrix columns")?;
    Ok(x.dot(theta.vector()).mapv(sigmoid))
}

/// Probability of the positive class for each example.
pub fn probabilities(theta: &FeatureParameters, data: &DataSet) -> Result<Vector> {
    theta.check_features(data.num_features())?;
    hypothesis(theta, &data.with_bias())
}

fn binary_cost(theta: &Vector, x: &Matrix, y: ArrayView1<'_, f64>, lambda: f64) -> f64 {
    let m = x.nrows() as f64;
    let h = x.dot(theta).mapv(sigmoid);
    let error = cross_entropy(h.iter().zip(y.iter()));
    let regularization = if lambda == 0.0 {
        0.0
    } else {
        let weights = theta.slice(s![1..]);
        lambda / 2.0 * weights.dot(&weights)
    };
    (error + regularization) / m
}

/// Regularized cross-entropy of a binary classifier. Targets must be 0 or 1.
pub fn cost(
    theta: &FeatureParameters,
    data: &DataSet,
    target: &DataSetTarget,
    lambda: f64,
) -> Result<f64> {
    check_lambda(lambda);
    check_examples(data, target)?;
    theta.check_features(data.num_features())?;
    target.check_labels(2)?;

    Ok(binary_cost(theta.vector(), &data.with_bias(), target.column()?, lambda))
}

/// Mean of the per-label binary costs of a one-vs-all classifier.
pub fn cost_multi(
    thetas: &[FeatureParameters],
    data: &DataSet,
    target: &DataSetTarget,
    lambda: f64,
) -> Result<f64> {
    check_lambda(lambda);
    check_examples(data, target)?;
    check_classifiers(thetas, data)?;
    target.check_labels(thetas.len())?;

    let x = data.with_bias();
    let mut total = 0.0;
    for (label, theta) in thetas.iter().enumerate() {
        let indicator = matrix::filter_equals(target.matrix(), label as f64);
        total += binary_cost(theta.vector(), &x, indicator.column(0), lambda);
    }
    Ok(total / thetas.len() as f64)
}

fn check_classifiers(thetas: &[FeatureParameters], data: &DataSet) -> Result<()> {
    ensure_non_empty(thetas.len(), "one-vs-all classifiers")?;
    for theta in thetas {
        theta.check_features(data.num_features())?;
    }
    Ok(())
}

pub fn gradient_descent(
    data: &DataSet,
    target: &DataSetTarget,
    initial: &FeatureParameters,
    gd: &GradientDescent,
) -> Result<FeatureParameters> {
    check_examples(data, target)?;
    initial.check_features(data.num_features())?;
    target.check_labels(2)?;

    debug!(
        alpha = gd.learning_rate(),
        lambda = gd.regularization(),
        iterations = gd.num_iterations(),
        examples = data.num_examples(),
        features = data.num_features(),
        "logistic regression gradient descent"
    );

    let theta = descend(&data.with_bias(), target.column()?, initial, gd, sigmoid_hypothesis);
    Ok(FeatureParameters::new(theta))
}

fn sigmoid_hypothesis(x: &Matrix, theta: &Vector) -> Vector {
    x.dot(theta).mapv(sigmoid)
}

/// One-vs-all: one binary classifier per label, each trained from `initial`
/// against the indicator target of its label.
pub fn gradient_descent_multi(
    data: &DataSet,
    target: &DataSetTarget,
    initial: &FeatureParameters,
    gd: &GradientDescent,
) -> Result<Vec<FeatureParameters>> {
    check_examples(data, target)?;
    initial.check_features(data.num_features())?;
    let labels = target.num_labels();
    target.check_labels(labels)?;

    debug!(
        alpha = gd.learning_rate(),
        lambda = gd.regularization(),
        iterations = gd.num_iterations(),
        examples = data.num_examples(),
        features = data.num_features(),
        labels,
        "one-vs-all logistic regression gradient descent"
    );

    let x = data.with_bias();
    let thetas = (0..labels)
        .map(|label| {
            let indicator = matrix::filter_equals(target.matrix(), label as f64);
            let theta = descend(&x, indicator.column(0), initial, gd, sigmoid_hypothesis);
            FeatureParameters::new(theta)
        })
        .collect();
    Ok(thetas)
}

/// Classifies `sigmoid(X·θ) ≥ 0.5` as 1.
pub fn predict(theta: &FeatureParameters, data: &DataSet) -> Result<LabeledDataSetTarget> {
    predict_with_threshold(theta, data, 0.5)
}

/// Classifies `sigmoid(X·θ) ≥ threshold` as 1.
pub fn predict_with_threshold(
    theta: &FeatureParameters,
    data: &DataSet,
    threshold: f64,
) -> Result<LabeledDataSetTarget> {
    if !(0.0..=1.0).contains(&threshold) {
        panic!("threshold must be in [0, 1], got {}", threshold);
    }
    let labels = probabilities(theta, data)?.mapv(|p| if p >= threshold { 1.0 } else { 0.0 });
    Ok(LabeledDataSetTarget::from_predictions(labels, 2))
}

/// Picks the label whose classifier scores highest. Scores are compared
/// before the sigmoid; ties go to the lowest label.
pub fn predict_multi(thetas: &[FeatureParameters], data: &DataSet) -> Result<LabeledDataSetTarget> {
    check_classifiers(thetas, data)?;
    let x = data.with_bias();
    let scores: Vec<Vector> = thetas.iter().map(|theta| x.dot(theta.vector())).collect();

    let labels = (0..data.num_examples())
        .map(|i| {
            let mut best_label = 0;
            let mut best_score = scores[0][i];
            for (label, label_scores) in scores.iter().enumerate().skip(1) {
                if label_scores[i] > best_score {
                    best_label = label;
                    best_score = label_scores[i];
                }
            }
            best_label as f64
        })
        .collect();
    Ok(LabeledDataSetTarget::from_predictions(labels, thetas.len()))
}

/// Binary gradient descent from all-zero parameters.
pub fn trainer(gd: GradientDescent) -> impl Trainer<FeatureParameters> {
    move |data: &DataSet, target: &DataSetTarget| {
        gradient_descent(data, target, &FeatureParameters::zeros(data.num_features()), &gd)
    }
}

/// One-vs-all gradient descent from all-zero parameters.
pub fn multi_trainer(gd: GradientDescent) -> impl Trainer<Vec<FeatureParameters>> {
    move |data: &DataSet, target: &DataSetTarget| {
        gradient_descent_multi(data, target, &FeatureParameters::zeros(data.num_features()), &gd)
    }
}

pub fn cost_evaluator(lambda: f64) -> impl CostEvaluator<FeatureParameters> {
    check_lambda(lambda);
    move |theta: &FeatureParameters, data: &DataSet, target: &DataSetTarget| {
        cost(theta, data, target, lambda)
    }
}

pub fn multi_cost_evaluator(lambda: f64) -> impl CostEvaluator<Vec<FeatureParameters>> {
    check_lambda(lambda);
    move |thetas: &Vec<FeatureParameters>, data: &DataSet, target: &DataSetTarget| {
        cost_multi(thetas, data, target, lambda)
    }
}

pub fn predictor(theta: FeatureParameters) -> impl Predictor {
    move |data: &DataSet| predict(&theta, data)
}

pub fn multi_predictor(thetas: Vec<FeatureParameters>) -> impl Predictor {
    move |data: &DataSet| predict_multi(&thetas, data)
}
