use crate::dataset::{DataSetTarget, LabeledDataSetTarget};
use crate::error::{ensure_non_empty, ensure_shape, Result};
use crate::Vector;
use ndarray::ArrayView1;

/// Fraction of examples whose predicted label equals the actual target.
pub fn accuracy(predicted: &LabeledDataSetTarget, actual: &DataSetTarget) -> Result<f64> {
    let (predicted, actual) = paired_columns(predicted, actual)?;
    let correct = predicted
        .iter()
        .zip(actual.iter())
        .filter(|(p, a)| p == a)
        .count();
    Ok(correct as f64 / actual.len() as f64)
}

/// Binary F1 score. Label 0 is the negative class, any other label positive.
/// Returns 0.0 when there are no true positives.
pub fn f1_score(predicted: &LabeledDataSetTarget, actual: &DataSetTarget) -> Result<f64> {
    let (predicted, actual) = paired_columns(predicted, actual)?;

    let (mut tp, mut fp, mut fn_) = (0usize, 0usize, 0usize);
    for (&p, &a) in predicted.iter().zip(actual.iter()) {
        match (p != 0.0, a != 0.0) {
            (true, true) => tp += 1,
            (true, false) => fp += 1,
            (false, true) => fn_ += 1,
            (false, false) => {}
        }
    }
    if tp == 0 {
        return Ok(0.0);
    }

    let precision = tp as f64 / (tp + fp) as f64;
    let recall = tp as f64 / (tp + fn_) as f64;
    Ok(2.0 * precision * recall / (precision + recall))
}

fn paired_columns<'a>(
    predicted: &'a LabeledDataSetTarget,
    actual: &'a DataSetTarget,
) -> Result<(ArrayView1<'a, f64>, ArrayView1<'a, f64>)> {
    let actual = actual.column()?;
    let predicted = predicted.column()?;
    ensure_non_empty(actual.len(), "target")?;
    ensure_shape(predicted.len(), actual.len(), "predicted examples")?;
    Ok((predicted, actual))
}

pub fn mean_squared_error(y_true: &Vector, y_pred: &Vector) -> Result<f64> {
    ensure_non_empty(y_true.len(), "y_true")?;
    ensure_shape(y_pred.len(), y_true.len(), "y_pred length")?;

    let diff = y_true - y_pred;
    Ok(diff.mapv(|x| x * x).sum() / y_true.len() as f64)
}

/// Coefficient of determination. A constant `y_true` scores 1.0 when it is
/// predicted exactly and 0.0 otherwise.
pub fn r2_score(y_true: &Vector, y_pred: &Vector) -> Result<f64> {
    ensure_non_empty(y_true.len(), "y_true")?;
    ensure_shape(y_pred.len(), y_true.len(), "y_pred length")?;

    let y_mean = y_true.sum() / y_true.len() as f64;
    let ss_res = (y_true - y_pred).mapv(|x| x * x).sum();
    let ss_tot = y_true.mapv(|x| (x - y_mean) * (x - y_mean)).sum();

    if ss_tot == 0.0 {
        return Ok(if ss_res == 0.0 { 1.0 } else { 0.0 });
    }

    Ok(1.0 - ss_res / ss_tot)
}
