use super::{DataSet, DataSetTarget};
use crate::error::{ensure_shape, Error, Result};
use crate::matrix;
use crate::preprocessing::{FeatureScaler, Standardizer};
use crate::{Matrix, Vector};
use ndarray::{s, Axis};
use rand::Rng;

/// Features paired with their targets, row for row.
#[derive(Clone, Debug, PartialEq)]
pub struct FullDataSet {
    data_set: DataSet,
    target: DataSetTarget,
}

impl FullDataSet {
    pub fn new(data_set: DataSet, target: DataSetTarget) -> Result<Self> {
        ensure_shape(
            target.num_examples(),
            data_set.num_examples(),
            "number of target rows",
        )?;
        Ok(Self { data_set, target })
    }

    pub fn num_examples(&self) -> usize {
        self.data_set.num_examples()
    }

    pub fn data_set(&self) -> &DataSet {
        &self.data_set
    }

    pub fn target(&self) -> &DataSetTarget {
        &self.target
    }

    pub fn into_parts(self) -> (DataSet, DataSetTarget) {
        (self.data_set, self.target)
    }

    /// A copy with rows permuted; features and targets move together.
    pub fn shuffle<R: Rng + ?Sized>(&self, rng: &mut R) -> Self {
        let order = matrix::shuffled_indices(self.num_examples(), rng);
        Self {
            data_set: DataSet::new(self.data_set.matrix().select(Axis(0), &order)),
            target: DataSetTarget::from_parts(
                self.target.matrix().select(Axis(0), &order),
                self.target.num_labels(),
            ),
        }
    }

    /// The first `size` examples.
    pub fn subset(&self, size: usize) -> Result<Self> {
        if size > self.num_examples() {
            return Err(Error::Shape(format!(
                "subset of {} examples requested from {}",
                size,
                self.num_examples()
            )));
        }
        Ok(self.rows(0, size))
    }

    /// Examples `start..end`; callers guarantee the range is in bounds.
    pub(crate) fn rows(&self, start: usize, end: usize) -> Self {
        Self {
            data_set: DataSet::new(self.data_set.matrix().slice(s![start..end, ..]).to_owned()),
            target: DataSetTarget::from_parts(
                self.target.matrix().slice(s![start..end, ..]).to_owned(),
                self.target.num_labels(),
            ),
        }
    }
}

/// Accumulates flat rows of `features ++ targets`.
#[derive(Clone, Debug)]
pub struct FullDataSetBuilder {
    outputs: usize,
    rows: Vec<Vec<f64>>,
    power_terms: Vec<f64>,
}

impl FullDataSetBuilder {
    pub fn new() -> Self {
        Self::with_outputs(1)
    }

    /// Each added row ends with `outputs` target values.
    pub fn with_outputs(outputs: usize) -> Self {
        if outputs == 0 {
            panic!("outputs must be > 0");
        }
        Self {
            outputs,
            rows: Vec::new(),
            power_terms: Vec::new(),
        }
    }

    pub fn add(mut self, row: &[f64]) -> Self {
        self.rows.push(row.to_vec());
        self
    }

    pub fn add_power_terms(mut self, powers: &[f64]) -> Self {
        self.power_terms.extend_from_slice(powers);
        self
    }

    pub fn build(self) -> Result<FullDataSet> {
        let (data_set, target) = self.split()?;
        FullDataSet::new(data_set, target)
    }

    /// Builds and standardizes the features. The returned scaler applies the
    /// same transform to new examples.
    pub fn build_and_normalize(self) -> Result<(FullDataSet, Standardizer)> {
        let (data_set, target) = self.split()?;
        let scaler = Standardizer::fit(&data_set)?;
        let full = FullDataSet::new(scaler.normalized_data_set().clone(), target)?;
        Ok((full, scaler))
    }

    fn split(self) -> Result<(DataSet, DataSetTarget)> {
        let mut features = Vec::with_capacity(self.rows.len());
        let mut targets = Vec::with_capacity(self.rows.len() * self.outputs);
        for (i, row) in self.rows.iter().enumerate() {
            if row.len() <= self.outputs {
                return Err(Error::Shape(format!(
                    "row {} has {} values, expected more than {} outputs",
                    i,
                    row.len(),
                    self.outputs
                )));
            }
            let split = row.len() - self.outputs;
            features.push(row[..split].to_vec());
            targets.extend_from_slice(&row[split..]);
        }

        let data_set = DataSet::from_rows(&features)?.add_power_terms(&self.power_terms);
        let target = if self.outputs == 1 {
            DataSetTarget::new(Vector::from(targets))
        } else {
            let values = Matrix::from_shape_vec((self.rows.len(), self.outputs), targets)
                .map_err(|e| Error::Shape(e.to_string()))?;
            DataSetTarget::from_matrix(values)
        };
        Ok((data_set, target))
    }
}

impl Default for FullDataSetBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Training, cross-validation and test partitions of one data set.
#[derive(Clone, Debug)]
pub struct TrainCvTestSplit {
    training: FullDataSet,
    cross_validation: FullDataSet,
    test: FullDataSet,
}

impl TrainCvTestSplit {
    pub fn new(training: FullDataSet, cross_validation: FullDataSet, test: FullDataSet) -> Self {
        Self {
            training,
            cross_validation,
            test,
        }
    }

    /// Shuffles and splits 60/20/20.
    pub fn standard<R: Rng + ?Sized>(full: &FullDataSet, rng: &mut R) -> Self {
        Self::from_full(full, rng, 0.6, 0.2, 0.2)
    }

    /// Shuffles, then slices by the normalized proportions. The test and
    /// cross-validation sizes are rounded down; training takes the rest.
    pub fn from_full<R: Rng + ?Sized>(
        full: &FullDataSet,
        rng: &mut R,
        train: f64,
        cv: f64,
        test: f64,
    ) -> Self {
        let total = train + cv + test;
        if [train, cv, test].iter().any(|p| !(p.is_finite() && *p >= 0.0)) || total <= 0.0 {
            panic!(
                "split proportions must be finite, non-negative and not all zero, got {}/{}/{}",
                train, cv, test
            );
        }

        let shuffled = full.shuffle(rng);
        let m = shuffled.num_examples();
        let test_size = (test / total * m as f64) as usize;
        let cv_size = (cv / total * m as f64) as usize;
        let train_size = m - cv_size - test_size;

        Self {
            training: shuffled.rows(0, train_size),
            cross_validation: shuffled.rows(train_size, train_size + cv_size),
            test: shuffled.rows(train_size + cv_size, m),
        }
    }

    pub fn training(&self) -> &FullDataSet {
        &self.training
    }

    pub fn cross_validation(&self) -> &FullDataSet {
        &self.cross_validation
    }

    pub fn test(&self) -> &FullDataSet {
        &self.test
    }
}
