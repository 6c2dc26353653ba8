//! Gradient-based trainers for linear regression, logistic regression and
//! feed-forward neural networks over a shared dense-matrix data model.
//!
//! Features are held in a [`DataSet`] without a bias column; every trainer
//! prepends the bias itself. Parameters are returned as [`FeatureParameters`]
//! (bias weight first) or as a trained [`NeuralNetwork`].

pub use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

pub mod config;
pub mod dataset;
pub mod error;
pub mod linear_model;
pub mod matrix;
pub mod metrics;
pub mod neural_network;
pub mod preprocessing;
pub mod training;

pub use config::GradientDescent;
pub use dataset::{
    DataSet, DataSetTarget, FeatureParameters, FullDataSet, FullDataSetBuilder,
    LabeledDataSetTarget, TrainCvTestSplit,
};
pub use error::{Error, Result};
pub use neural_network::{JsonDirectoryStore, LayerStore, NeuralNetwork};
pub use preprocessing::{FeatureScaler, MeanNormalizer, Rescaler, Standardizer};
pub use training::{CostEvaluator, Predictor, Trainer};

pub type Vector = Array1<f64>;
pub type Matrix = Array2<f64>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_exports_fit_and_score() {
        let full = FullDataSetBuilder::new()
            .add(&[0.0, 1.0])
            .add(&[1.0, 3.0])
            .add(&[2.0, 5.0])
            .build()
            .unwrap();
        let theta: FeatureParameters = linear_model::linear_regression::normal_equation_trainer(0.0)
            .fit(full.data_set(), full.target())
            .unwrap();
        assert_eq!(theta.len(), 2);

        let cost = linear_model::linear_regression::cost_evaluator(0.0)
            .cost(&theta, full.data_set(), full.target())
            .unwrap();
        assert!(cost < 1e-12);

        let predicted: Vector = linear_model::linear_regression::predict(&theta, &DataSet::single(&[3.0])).unwrap();
        assert!((predicted[0] - 7.0).abs() < 1e-9);
    }
}
