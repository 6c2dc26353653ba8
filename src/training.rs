//! Model-agnostic training contracts and hyperparameter search.
//!
//! Every model family exposes the same two call shapes: a [`Trainer`] that
//! fits parameters to a data set and a [`CostEvaluator`] that scores fitted
//! parameters. Plain closures implement both, so harnesses can be written
//! once for all models.

use crate::dataset::{DataSet, DataSetTarget, FullDataSet, LabeledDataSetTarget, TrainCvTestSplit};
use crate::error::Result;
use crate::metrics;
use tracing::debug;

/// Fits model parameters of type `P` to features and targets.
pub trait Trainer<P> {
    fn fit(&self, data: &DataSet, target: &DataSetTarget) -> Result<P>;
}

impl<P, F> Trainer<P> for F
where
    F: Fn(&DataSet, &DataSetTarget) -> Result<P>,
{
    fn fit(&self, data: &DataSet, target: &DataSetTarget) -> Result<P> {
        self(data, target)
    }
}

/// Scores fitted parameters against a data set; lower is better.
pub trait CostEvaluator<P> {
    fn cost(&self, params: &P, data: &DataSet, target: &DataSetTarget) -> Result<f64>;
}

impl<P, F> CostEvaluator<P> for F
where
    F: Fn(&P, &DataSet, &DataSetTarget) -> Result<f64>,
{
    fn cost(&self, params: &P, data: &DataSet, target: &DataSetTarget) -> Result<f64> {
        self(params, data, target)
    }
}

/// A fitted classifier.
pub trait Predictor {
    fn predict(&self, data: &DataSet) -> Result<LabeledDataSetTarget>;

    fn accuracy(&self, full: &FullDataSet) -> Result<f64> {
        let predicted = self.predict(full.data_set())?;
        metrics::accuracy(&predicted, full.target())
    }

    fn f1_score(&self, full: &FullDataSet) -> Result<f64> {
        let predicted = self.predict(full.data_set())?;
        metrics::f1_score(&predicted, full.target())
    }
}

impl<F> Predictor for F
where
    F: Fn(&DataSet) -> Result<LabeledDataSetTarget>,
{
    fn predict(&self, data: &DataSet) -> Result<LabeledDataSetTarget> {
        self(data)
    }
}

/// Returns the candidate whose parameters, fitted on the training set, have
/// the lowest cross-validation cost. Ties keep the earliest candidate.
pub fn find_optimal_params<C, P, T, E>(
    candidates: impl IntoIterator<Item = C>,
    trainer_for: impl Fn(&C) -> T,
    cost_for: impl Fn(&C) -> E,
    split: &TrainCvTestSplit,
) -> Result<Option<C>>
where
    T: Trainer<P>,
    E: CostEvaluator<P>,
{
    find_optimal_params_with(
        candidates,
        trainer_for,
        cost_for,
        |_| split.training().clone(),
        split.cross_validation(),
    )
}

/// Like [`find_optimal_params`], but the training set may depend on the
/// candidate, e.g. when searching over training-set sizes.
pub fn find_optimal_params_with<C, P, T, E>(
    candidates: impl IntoIterator<Item = C>,
    trainer_for: impl Fn(&C) -> T,
    cost_for: impl Fn(&C) -> E,
    training_set_for: impl Fn(&C) -> FullDataSet,
    cv_set: &FullDataSet,
) -> Result<Option<C>>
where
    T: Trainer<P>,
    E: CostEvaluator<P>,
{
    let mut best: Option<(C, f64)> = None;
    for (index, candidate) in candidates.into_iter().enumerate() {
        let training = training_set_for(&candidate);
        let params = trainer_for(&candidate).fit(training.data_set(), training.target())?;
        let cost = cost_for(&candidate).cost(&params, cv_set.data_set(), cv_set.target())?;
        debug!(candidate = index, cost, "cross-validation cost");

        let improves = match &best {
            Some((_, best_cost)) => cost < *best_cost,
            None => true,
        };
        if improves {
            best = Some((candidate, cost));
        }
    }
    Ok(best.map(|(candidate, _)| candidate))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{FeatureParameters, FullDataSetBuilder};
    use crate::error::Error;
    use crate::linear_model::linear_regression;

    fn line(points: &[(f64, f64)]) -> FullDataSet {
        let mut builder = FullDataSetBuilder::new();
        for &(x, y) in points {
            builder = builder.add(&[x, y]);
        }
        builder.build().unwrap()
    }

    #[test]
    fn test_closures_satisfy_contracts() {
        let trainer = |data: &DataSet, _target: &DataSetTarget| -> Result<usize> {
            Ok(data.num_examples())
        };
        let cost = |params: &usize, _data: &DataSet, _target: &DataSetTarget| -> Result<f64> {
            Ok(*params as f64)
        };

        let full = line(&[(0.0, 1.0), (1.0, 2.0)]);
        let params = trainer.fit(full.data_set(), full.target()).unwrap();
        assert_eq!(params, 2);
        assert_eq!(cost.cost(&params, full.data_set(), full.target()).unwrap(), 2.0);
    }

    #[test]
    fn test_predictor_scores() {
        let always_one = |data: &DataSet| -> Result<LabeledDataSetTarget> {
            Ok(LabeledDataSetTarget::new(&vec![1; data.num_examples()]))
        };
        let full = line(&[(0.0, 1.0), (1.0, 1.0), (2.0, 0.0), (3.0, 1.0)]);
        assert_eq!(always_one.accuracy(&full).unwrap(), 0.75);
        assert!((always_one.f1_score(&full).unwrap() - 6.0 / 7.0).abs() < 1e-12);
    }

    #[test]
    fn test_find_optimal_lambda() {
        let train = line(&[(0.0, 1.0), (1.0, 3.0), (2.0, 5.0), (3.0, 7.0)]);
        let cv = line(&[(4.0, 9.0), (5.0, 11.0)]);
        let split = TrainCvTestSplit::new(train, cv.clone(), cv);

        let best = find_optimal_params(
            [100.0, 0.0, 10.0],
            |&lambda: &f64| {
                move |data: &DataSet, target: &DataSetTarget| {
                    linear_regression::normal_equation(data, target, lambda)
                }
            },
            |_| linear_regression::cost_evaluator(0.0),
            &split,
        )
        .unwrap();
        assert_eq!(best, Some(0.0));
    }

    #[test]
    fn test_find_optimal_over_training_sizes() {
        let full = line(&[(0.0, 1.0), (1.0, 3.0), (2.0, 5.0), (3.0, 7.0)]);
        let cv = line(&[(4.0, 9.0)]);
        let best = find_optimal_params_with(
            [1usize, 2, 4],
            |_| {
                |data: &DataSet, target: &DataSetTarget| {
                    linear_regression::normal_equation(data, target, 0.0)
                }
            },
            |_| linear_regression::cost_evaluator(0.0),
            |&size| full.subset(size).unwrap(),
            &cv,
        )
        .unwrap();
        assert!(best.is_some());
        assert_ne!(best, Some(1));
    }

    #[test]
    fn test_no_candidates() {
        let full = line(&[(0.0, 1.0)]);
        let split = TrainCvTestSplit::new(full.clone(), full.clone(), full);
        let best = find_optimal_params(
            Vec::<f64>::new(),
            |_| linear_regression::trainer(crate::GradientDescent::default()),
            |_| linear_regression::cost_evaluator(0.0),
            &split,
        )
        .unwrap();
        assert_eq!(best, None);
    }

    #[test]
    fn test_trainer_errors_propagate() {
        let full = line(&[(0.0, 1.0)]);
        let split = TrainCvTestSplit::new(full.clone(), full.clone(), full);
        let failing = |_: &DataSet, _: &DataSetTarget| -> Result<FeatureParameters> {
            Err(Error::Empty("nothing to fit".to_string()))
        };
        let result = find_optimal_params(
            [1.0],
            |_| failing,
            |_| |_: &FeatureParameters, _: &DataSet, _: &DataSetTarget| -> Result<f64> { Ok(0.0) },
            &split,
        );
        assert!(result.is_err());
    }
}
