//! Feature matrices, targets and parameter vectors.

mod full;
mod target;

pub use full::{FullDataSet, FullDataSetBuilder, TrainCvTestSplit};
pub use target::{DataSetTarget, LabeledDataSetTarget};

use crate::error::{Error, Result};
use crate::matrix;
use crate::{Matrix, Vector};
use ndarray::s;

/// An `m × n` feature matrix: one row per example, no bias column.
#[derive(Clone, Debug, PartialEq)]
pub struct DataSet {
    features: Matrix,
}

impl DataSet {
    pub fn new(features: Matrix) -> Self {
        Self { features }
    }

    /// Builds a data set from per-example rows. Every row must have the same
    /// number of features.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self> {
        let n_features = rows.first().map_or(0, Vec::len);
        let mut flat = Vec::with_capacity(rows.len() * n_features);
        for (i, row) in rows.iter().enumerate() {
            if row.len() != n_features {
                return Err(Error::Shape(format!(
                    "row {} has {} features, expected {}",
                    i,
                    row.len(),
                    n_features
                )));
            }
            flat.extend_from_slice(row);
        }

        let features = Matrix::from_shape_vec((rows.len(), n_features), flat)
            .map_err(|e| Error::Shape(e.to_string()))?;
        Ok(Self { features })
    }

    /// A one-example data set.
    pub fn single(example: &[f64]) -> Self {
        let features = Vector::from(example.to_vec()).insert_axis(ndarray::Axis(0));
        Self { features }
    }

    /// Appends `x^p` of every original column for each power `p`, in order.
    pub fn add_power_terms(&self, powers: &[f64]) -> Self {
        let n = self.num_features();
        let mut features = Matrix::zeros((self.num_examples(), n * (powers.len() + 1)));
        features.slice_mut(s![.., ..n]).assign(&self.features);
        for (i, &power) in powers.iter().enumerate() {
            let start = n * (i + 1);
            features
                .slice_mut(s![.., start..start + n])
                .assign(&self.features.mapv(|x| x.powf(power)));
        }
        Self { features }
    }

    /// The feature matrix with a leading column of ones.
    pub fn with_bias(&self) -> Matrix {
        matrix::add_bias_column(&self.features)
    }

    pub fn matrix(&self) -> &Matrix {
        &self.features
    }

    pub fn into_matrix(self) -> Matrix {
        self.features
    }

    pub fn num_examples(&self) -> usize {
        self.features.nrows()
    }

    pub fn num_features(&self) -> usize {
        self.features.ncols()
    }
}

impl From<Matrix> for DataSet {
    fn from(features: Matrix) -> Self {
        Self::new(features)
    }
}

/// Model weights: index 0 is the bias weight, `1..=n` the per-feature
/// weights.
#[derive(Clone, Debug, PartialEq)]
pub struct FeatureParameters {
    theta: Vector,
}

impl FeatureParameters {
    pub fn new(theta: Vector) -> Self {
        Self { theta }
    }

    /// All-zero parameters for a model over `num_features` features.
    pub fn zeros(num_features: usize) -> Self {
        Self {
            theta: Vector::zeros(num_features + 1),
        }
    }

    pub fn get(&self, index: usize) -> f64 {
        self.theta[index]
    }

    pub fn bias(&self) -> f64 {
        self.theta[0]
    }

    pub fn vector(&self) -> &Vector {
        &self.theta
    }

    pub fn into_vector(self) -> Vector {
        self.theta
    }

    /// Number of weights, bias included.
    pub fn len(&self) -> usize {
        self.theta.len()
    }

    pub fn is_empty(&self) -> bool {
        self.theta.is_empty()
    }

    /// Fails unless these parameters fit a model over `num_features` features.
    pub(crate) fn check_features(&self, num_features: usize) -> Result<()> {
        crate::error::ensure_shape(self.len(), num_features + 1, "parameter count (features + bias)")
    }
}

impl From<Vector> for FeatureParameters {
    fn from(theta: Vector) -> Self {
        Self::new(theta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_dataset_creation() {
        let rows = vec![vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]];
        let data = DataSet::from_rows(&rows).unwrap();
        assert_eq!(data.num_examples(), 3);
        assert_eq!(data.num_features(), 2);
        assert_eq!(data.matrix(), &array![[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]]);
    }

    #[test]
    fn test_ragged_rows_rejected() {
        let rows = vec![vec![1.0, 2.0], vec![3.0]];
        assert!(DataSet::from_rows(&rows).is_err());
    }

    #[test]
    fn test_single_example() {
        let data = DataSet::single(&[7.0, 8.0, 9.0]);
        assert_eq!(data.num_examples(), 1);
        assert_eq!(data.num_features(), 3);
    }

    #[test]
    fn test_add_power_terms() {
        let data = DataSet::new(array![[2.0, 3.0], [-1.0, 0.5]]);
        let expanded = data.add_power_terms(&[2.0, 3.0]);
        assert_eq!(
            expanded.matrix(),
            &array![
                [2.0, 3.0, 4.0, 9.0, 8.0, 27.0],
                [-1.0, 0.5, 1.0, 0.25, -1.0, 0.125]
            ]
        );
        assert_eq!(data.add_power_terms(&[]), data);
    }

    #[test]
    fn test_with_bias() {
        let data = DataSet::new(array![[2.0], [3.0]]);
        assert_eq!(data.with_bias(), array![[1.0, 2.0], [1.0, 3.0]]);
    }

    #[test]
    fn test_feature_parameters() {
        let theta = FeatureParameters::zeros(3);
        assert_eq!(theta.len(), 4);
        assert!(theta.check_features(3).is_ok());
        assert!(theta.check_features(4).is_err());

        let theta = FeatureParameters::new(array![0.5, 1.5]);
        assert_eq!(theta.bias(), 0.5);
        assert_eq!(theta.get(1), 1.5);
    }
}
