//! Per-column affine feature scaling: `(x - center) / scale`.

use crate::dataset::DataSet;
use crate::error::{ensure_non_empty, ensure_shape, Error, Result};
use crate::{matrix, Matrix, Vector};
use ndarray::Axis;
use tracing::warn;

/// A fitted normalization that can be replayed on new examples.
pub trait FeatureScaler {
    /// The data set the scaler was fitted on, already transformed.
    fn normalized_data_set(&self) -> &DataSet;

    /// Applies the fitted transform to `data`, which may hold one or many rows.
    fn normalize(&self, data: &DataSet) -> Result<DataSet>;
}

#[derive(Clone, Debug)]
struct AffineTransform {
    center: Vector,
    scale: Vector,
}

impl AffineTransform {
    fn new(center: Vector, mut scale: Vector, scale_name: &str) -> Self {
        for (column, s) in scale.iter_mut().enumerate() {
            if *s == 0.0 {
                warn!(column, scale = scale_name, "constant feature column, leaving unscaled");
                *s = 1.0;
            }
        }
        Self { center, scale }
    }

    fn apply(&self, data: &DataSet) -> Result<DataSet> {
        ensure_shape(data.num_features(), self.center.len(), "number of features to scale")?;
        let mut result: Matrix = data.matrix().clone();
        for mut row in result.axis_iter_mut(Axis(0)) {
            row -= &self.center;
            row /= &self.scale;
        }
        Ok(DataSet::new(result))
    }
}

fn column_means(data: &DataSet) -> Result<Vector> {
    data.matrix()
        .mean_axis(Axis(0))
        .ok_or_else(|| Error::Empty("data set to scale must not be empty".to_string()))
}

fn column_bounds(data: &DataSet) -> Result<(Vector, Vector)> {
    let min = matrix::col_min(data.matrix())?.row(0).to_owned();
    let max = matrix::col_max(data.matrix())?.row(0).to_owned();
    Ok((min, max))
}

/// Centers on the column mean and divides by the column range.
#[derive(Clone, Debug)]
pub struct MeanNormalizer {
    transform: AffineTransform,
    normalized: DataSet,
}

impl MeanNormalizer {
    pub fn fit(data: &DataSet) -> Result<Self> {
        ensure_non_empty(data.num_examples(), "data set to scale")?;
        let mean = column_means(data)?;
        let (min, max) = column_bounds(data)?;
        let transform = AffineTransform::new(mean, max - min, "range");
        let normalized = transform.apply(data)?;
        Ok(Self {
            transform,
            normalized,
        })
    }

    pub fn mean(&self) -> &Vector {
        &self.transform.center
    }

    pub fn range(&self) -> &Vector {
        &self.transform.scale
    }
}

impl FeatureScaler for MeanNormalizer {
    fn normalized_data_set(&self) -> &DataSet {
        &self.normalized
    }

    fn normalize(&self, data: &DataSet) -> Result<DataSet> {
        self.transform.apply(data)
    }
}

/// Maps every column onto `[0, 1]` using its minimum and range.
#[derive(Clone, Debug)]
pub struct Rescaler {
    transform: AffineTransform,
    normalized: DataSet,
}

impl Rescaler {
    pub fn fit(data: &DataSet) -> Result<Self> {
        ensure_non_empty(data.num_examples(), "data set to scale")?;
        let (min, max) = column_bounds(data)?;
        let range = &max - &min;
        let transform = AffineTransform::new(min, range, "range");
        let normalized = transform.apply(data)?;
        Ok(Self {
            transform,
            normalized,
        })
    }

    pub fn min(&self) -> &Vector {
        &self.transform.center
    }

    pub fn range(&self) -> &Vector {
        &self.transform.scale
    }
}

impl FeatureScaler for Rescaler {
    fn normalized_data_set(&self) -> &DataSet {
        &self.normalized
    }

    fn normalize(&self, data: &DataSet) -> Result<DataSet> {
        self.transform.apply(data)
    }
}

/// Zero mean and unit (population) standard deviation per column.
#[derive(Clone, Debug)]
pub struct Standardizer {
    transform: AffineTransform,
    normalized: DataSet,
}

impl Standardizer {
    pub fn fit(data: &DataSet) -> Result<Self> {
        ensure_non_empty(data.num_examples(), "data set to scale")?;
        let mean = column_means(data)?;
        let std = data.matrix().std_axis(Axis(0), 0.0);
        let transform = AffineTransform::new(mean, std, "standard deviation");
        let normalized = transform.apply(data)?;
        Ok(Self {
            transform,
            normalized,
        })
    }

    pub fn mean(&self) -> &Vector {
        &self.transform.center
    }

    pub fn std_dev(&self) -> &Vector {
        &self.transform.scale
    }
}

impl FeatureScaler for Standardizer {
    fn normalized_data_set(&self) -> &DataSet {
        &self.normalized
    }

    fn normalize(&self, data: &DataSet) -> Result<DataSet> {
        self.transform.apply(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn sample() -> DataSet {
        DataSet::new(array![[1.0, 2.0], [3.0, 4.0], [5.0, 12.0]])
    }

    fn assert_close(a: &Matrix, b: &Matrix) {
        let diff = (a - b).iter().fold(0.0_f64, |acc, &x| acc.max(x.abs()));
        assert!(diff < 1e-12, "expected {:?}, got {:?}", b, a);
    }

    #[test]
    fn test_standardizer() {
        let scaler = Standardizer::fit(&sample()).unwrap();
        let scaled = scaler.normalized_data_set().matrix();

        let mean = scaled.mean_axis(Axis(0)).unwrap();
        let std = scaled.std_axis(Axis(0), 0.0);
        for j in 0..2 {
            assert!(mean[j].abs() < 1e-12);
            assert!((std[j] - 1.0).abs() < 1e-12);
        }
        assert_eq!(scaler.mean(), &array![3.0, 6.0]);
    }

    #[test]
    fn test_rescaler() {
        let scaler = Rescaler::fit(&sample()).unwrap();
        assert_close(
            scaler.normalized_data_set().matrix(),
            &array![[0.0, 0.0], [0.5, 0.2], [1.0, 1.0]],
        );
    }

    #[test]
    fn test_mean_normalizer() {
        let scaler = MeanNormalizer::fit(&sample()).unwrap();
        assert_eq!(scaler.range(), &array![4.0, 10.0]);
        assert_close(
            scaler.normalized_data_set().matrix(),
            &array![[-0.5, -0.4], [0.0, -0.2], [0.5, 0.6]],
        );
    }

    #[test]
    fn test_normalize_new_example_matches_fit() {
        let data = sample();
        let scaler = Standardizer::fit(&data).unwrap();
        let single = scaler.normalize(&DataSet::single(&[3.0, 4.0])).unwrap();
        assert_close(
            single.matrix(),
            &scaler.normalized_data_set().matrix().slice(ndarray::s![1..2, ..]).to_owned(),
        );
    }

    #[test]
    fn test_constant_column_maps_to_zero() {
        let data = DataSet::new(array![[7.0, 1.0], [7.0, 2.0]]);
        let scaler = Standardizer::fit(&data).unwrap();
        let scaled = scaler.normalized_data_set().matrix();
        assert!(scaled.iter().all(|x| x.is_finite()));
        assert_eq!(scaled.column(0).to_vec(), vec![0.0, 0.0]);
    }

    #[test]
    fn test_feature_count_mismatch() {
        let scaler = Rescaler::fit(&sample()).unwrap();
        assert!(scaler.normalize(&DataSet::single(&[1.0])).is_err());
    }

    #[test]
    fn test_empty_data_set() {
        let empty = DataSet::new(Matrix::zeros((0, 2)));
        assert!(matches!(Standardizer::fit(&empty), Err(Error::Empty(_))));
    }
}
