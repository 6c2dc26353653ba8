use std::ops::Deref;

use crate::error::{Error, Result};
use crate::matrix;
use crate::{Matrix, Vector};
use ndarray::{ArrayView1, Axis};

/// Target values for a [`DataSet`](super::DataSet).
///
/// A single column holds either regression values or one class label per
/// example. A target with several columns is an already one-vs-all encoded
/// multi-output target and its label count is its column count.
#[derive(Clone, Debug, PartialEq)]
pub struct DataSetTarget {
    values: Matrix,
    labels: usize,
}

impl DataSetTarget {
    /// Single-column target; the label count is inferred as `max(label) + 1`.
    pub fn new(values: Vector) -> Self {
        let labels = infer_labels(&values);
        Self {
            values: values.insert_axis(Axis(1)),
            labels,
        }
    }

    /// Single-column target with an explicit label count.
    pub fn with_labels(values: Vector, labels: usize) -> Self {
        Self {
            values: values.insert_axis(Axis(1)),
            labels,
        }
    }

    pub fn from_matrix(values: Matrix) -> Self {
        let labels = if values.ncols() == 1 {
            infer_labels(&values.column(0).to_owned())
        } else {
            values.ncols()
        };
        Self { values, labels }
    }

    pub(crate) fn from_parts(values: Matrix, labels: usize) -> Self {
        Self { values, labels }
    }

    pub fn matrix(&self) -> &Matrix {
        &self.values
    }

    /// The first (for single-column targets, the only) column.
    pub fn values(&self) -> ArrayView1<'_, f64> {
        self.values.column(0)
    }

    pub fn get(&self, example: usize) -> f64 {
        self.values[(example, 0)]
    }

    pub fn label(&self, example: usize) -> usize {
        self.get(example) as usize
    }

    pub fn num_examples(&self) -> usize {
        self.values.nrows()
    }

    pub fn num_outputs(&self) -> usize {
        self.values.ncols()
    }

    pub fn num_labels(&self) -> usize {
        self.labels
    }

    /// One-vs-all encoding: an `m × L` matrix whose column `k` is `1.0`
    /// where the label equals `k`.
    pub fn to_binary_matrix(&self) -> Matrix {
        if self.values.ncols() != 1 {
            return self.values.clone();
        }

        let mut binary = Matrix::zeros((self.num_examples(), self.labels));
        for label in 0..self.labels {
            let indicator = matrix::filter_equals(&self.values, label as f64);
            binary.column_mut(label).assign(&indicator.column(0));
        }
        binary
    }

    /// The single target column, or an error for multi-output targets.
    pub(crate) fn column(&self) -> Result<ArrayView1<'_, f64>> {
        if self.values.ncols() != 1 {
            return Err(Error::Shape(format!(
                "expected a single-column target, got {} columns",
                self.values.ncols()
            )));
        }
        Ok(self.values.column(0))
    }

    /// Fails unless every value is an integer in `[0, labels)`.
    pub(crate) fn check_labels(&self, labels: usize) -> Result<()> {
        let column = self.column()?;
        for (i, &value) in column.iter().enumerate() {
            if !(value.fract() == 0.0 && value >= 0.0 && value < labels as f64) {
                return Err(Error::InvalidTarget(format!(
                    "example {} has target {}, expected an integer in [0, {})",
                    i, value, labels
                )));
            }
        }
        Ok(())
    }
}

/// One more than the largest value that could be a label. Values that are
/// negative, fractional or non-finite do not count.
fn infer_labels(values: &Vector) -> usize {
    values
        .iter()
        .filter(|v| v.is_finite() && **v >= 0.0 && v.fract() == 0.0)
        .fold(0usize, |acc, &v| acc.max(v as usize))
        .saturating_add(1)
}

/// A classification target whose values are all valid labels.
#[derive(Clone, Debug, PartialEq)]
pub struct LabeledDataSetTarget {
    target: DataSetTarget,
}

impl LabeledDataSetTarget {
    /// Labels with the label count inferred as `max(label) + 1`.
    pub fn new(labels: &[usize]) -> Self {
        let values: Vector = labels.iter().map(|&l| l as f64).collect();
        Self {
            target: DataSetTarget::new(values),
        }
    }

    pub fn with_labels(values: Vector, labels: usize) -> Result<Self> {
        Self::from_target(DataSetTarget::with_labels(values, labels))
    }

    pub fn from_target(target: DataSetTarget) -> Result<Self> {
        target.check_labels(target.num_labels())?;
        Ok(Self { target })
    }

    pub(crate) fn from_predictions(values: Vector, labels: usize) -> Self {
        Self {
            target: DataSetTarget::with_labels(values, labels),
        }
    }

    pub fn labels(&self) -> Vec<usize> {
        (0..self.num_examples()).map(|i| self.label(i)).collect()
    }

    pub fn into_target(self) -> DataSetTarget {
        self.target
    }
}

impl Deref for LabeledDataSetTarget {
    type Target = DataSetTarget;

    fn deref(&self) -> &DataSetTarget {
        &self.target
    }
}

impl From<LabeledDataSetTarget> for DataSetTarget {
    fn from(labeled: LabeledDataSetTarget) -> Self {
        labeled.target
    }
}
