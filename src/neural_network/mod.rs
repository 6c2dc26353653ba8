//! Fully-connected feed-forward networks with sigmoid activations.
//!
//! Layer `i`'s weights form a `(neurons in layer i+1) × (neurons in layer i + 1)`
//! matrix whose first column multiplies the bias unit.

mod backprop;
pub mod persist;
mod train;

use crate::config::{check_lambda, GradientDescent};
use crate::dataset::{DataSet, DataSetTarget, LabeledDataSetTarget};
use crate::error::{ensure_non_empty, ensure_shape, Error, Result};
use crate::training::{CostEvaluator, Predictor, Trainer};
use crate::{Matrix, Vector};
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;
use rand::Rng;

pub use persist::{JsonDirectoryStore, LayerStore};

const DEFAULT_GRADIENT_EPSILON: f64 = 1.0e-4;

#[derive(Clone, Debug, PartialEq)]
pub struct NeuralNetwork {
    thetas: Vec<Matrix>,
}

impl NeuralNetwork {
    /// Wraps layer weights, checking that each layer's column count is the
    /// previous layer's row count plus the bias column.
    pub fn new(thetas: Vec<Matrix>) -> Result<Self> {
        ensure_non_empty(thetas.len(), "network layers")?;
        for (i, theta) in thetas.iter().enumerate() {
            if theta.nrows() == 0 || theta.ncols() == 0 {
                return Err(Error::Shape(format!(
                    "layer {} weights have shape {:?}",
                    i,
                    theta.dim()
                )));
            }
        }
        for (i, pair) in thetas.windows(2).enumerate() {
            ensure_shape(
                pair[1].ncols(),
                pair[0].nrows() + 1,
                &format!("columns of layer {} weights", i + 1),
            )?;
        }
        Ok(Self { thetas })
    }

    /// All-zero weights for the given neuron counts, input layer first.
    pub fn empty(neurons: &[usize]) -> Result<Self> {
        if neurons.len() < 2 {
            return Err(Error::Shape(format!(
                "a network needs at least an input and an output layer, got {} layers",
                neurons.len()
            )));
        }
        let thetas = neurons
            .windows(2)
            .map(|pair| Matrix::zeros((pair[1], pair[0] + 1)))
            .collect();
        Self::new(thetas)
    }

    /// Draws every weight uniformly from `[-ε, ε]` with
    /// `ε = sqrt(6 / (rows + cols))` chosen per layer.
    pub fn randomly_initialize<R: Rng + ?Sized>(mut self, rng: &mut R) -> Self {
        for theta in &mut self.thetas {
            let (rows, cols) = theta.dim();
            let epsilon = (6.0 / (rows + cols) as f64).sqrt();
            *theta = Matrix::random_using((rows, cols), Uniform::new_inclusive(-epsilon, epsilon), rng);
        }
        self
    }

    /// Draws every weight uniformly from `[-epsilon, epsilon]`.
    pub fn randomly_initialize_with<R: Rng + ?Sized>(mut self, epsilon: f64, rng: &mut R) -> Self {
        if !(epsilon.is_finite() && epsilon > 0.0) {
            panic!("epsilon must be finite and > 0, got {}", epsilon);
        }
        for theta in &mut self.thetas {
            *theta = Matrix::random_using(theta.dim(), Uniform::new_inclusive(-epsilon, epsilon), rng);
        }
        self
    }

    pub fn thetas(&self) -> &[Matrix] {
        &self.thetas
    }

    pub fn into_thetas(self) -> Vec<Matrix> {
        self.thetas
    }

    pub fn num_layers(&self) -> usize {
        self.thetas.len() + 1
    }

    pub fn num_inputs(&self) -> usize {
        self.num_neurons(0)
    }

    pub fn num_outputs(&self) -> usize {
        self.num_neurons(self.num_layers() - 1)
    }

    /// Neurons in `layer`, bias unit excluded. Panics if `layer` is out of range.
    pub fn num_neurons(&self, layer: usize) -> usize {
        if layer == 0 {
            self.thetas[0].ncols() - 1
        } else {
            self.thetas[layer - 1].nrows()
        }
    }

    /// Activations of every layer, one column per example. Hidden layers
    /// carry the bias unit in row 0.
    pub fn feed_forward(&self, data: &DataSet) -> Result<Vec<Matrix>> {
        self.check_inputs(data)?;
        Ok(backprop::forward(&self.thetas, data.matrix()))
    }

    /// Output activations, `m × outputs`.
    pub fn compute(&self, data: &DataSet) -> Result<Matrix> {
        self.check_inputs(data)?;
        Ok(backprop::output(&self.thetas, data.matrix()))
    }

    pub fn cost(&self, data: &DataSet, target: &DataSetTarget, lambda: f64) -> Result<f64> {
        check_lambda(lambda);
        let y = self.prepare(data, target)?;
        Ok(backprop::cost(&self.thetas, data.matrix(), &y, lambda))
    }

    /// Analytic cost gradient for every layer's weights.
    pub fn back_propagation(&self, data: &DataSet, target: &DataSetTarget, lambda: f64) -> Result<Vec<Matrix>> {
        check_lambda(lambda);
        let y = self.prepare(data, target)?;
        backprop::gradients(&self.thetas, data.matrix(), &y, lambda)
    }

    pub fn numerical_gradient(&self, data: &DataSet, target: &DataSetTarget, lambda: f64) -> Result<Vec<Matrix>> {
        self.numerical_gradient_with(data, target, lambda, DEFAULT_GRADIENT_EPSILON)
    }

    /// Central-difference gradient with perturbation `epsilon`. Slow; meant for
    /// checking [`back_propagation`](Self::back_propagation).
    pub fn numerical_gradient_with(
        &self,
        data: &DataSet,
        target: &DataSetTarget,
        lambda: f64,
        epsilon: f64,
    ) -> Result<Vec<Matrix>> {
        check_lambda(lambda);
        if !(epsilon.is_finite() && epsilon > 0.0) {
            panic!("epsilon must be finite and > 0, got {}", epsilon);
        }
        let y = self.prepare(data, target)?;
        Ok(backprop::numerical_gradients(&self.thetas, data.matrix(), &y, lambda, epsilon))
    }

    /// Thresholds a single output at 0.5; otherwise picks the strongest output.
    pub fn predict(&self, data: &DataSet) -> Result<LabeledDataSetTarget> {
        if self.num_outputs() == 1 {
            self.predict_with_threshold(data, 0.5)
        } else {
            self.predict_multi(data)
        }
    }

    /// Label 1 where the first output neuron is at least `threshold`.
    pub fn predict_with_threshold(&self, data: &DataSet, threshold: f64) -> Result<LabeledDataSetTarget> {
        if !(0.0..=1.0).contains(&threshold) {
            panic!("threshold must be in [0, 1], got {}", threshold);
        }
        let output = self.compute(data)?;
        let labels = output
            .column(0)
            .mapv(|h| if h >= threshold { 1.0 } else { 0.0 });
        Ok(LabeledDataSetTarget::from_predictions(labels, 2))
    }

    /// Index of the strongest output neuron per example; ties go to the lowest.
    pub fn predict_multi(&self, data: &DataSet) -> Result<LabeledDataSetTarget> {
        let output = self.compute(data)?;
        let labels: Vector = output
            .rows()
            .into_iter()
            .map(|row| {
                let mut best = 0;
                for (j, &value) in row.iter().enumerate().skip(1) {
                    if value > row[best] {
                        best = j;
                    }
                }
                best as f64
            })
            .collect();
        Ok(LabeledDataSetTarget::from_predictions(labels, self.num_outputs()))
    }

    pub fn save_to<S: LayerStore + ?Sized>(&self, store: &S) -> Result<()> {
        store.save(&self.thetas)
    }

    pub fn load_from<S: LayerStore + ?Sized>(store: &S) -> Result<Self> {
        Self::new(store.load()?)
    }

    fn check_inputs(&self, data: &DataSet) -> Result<()> {
        ensure_shape(data.num_features(), self.num_inputs(), "number of input features")
    }

    /// Validates a labelled batch and returns the target in output-layer
    /// form: the raw column for one output, one-vs-all columns otherwise.
    fn prepare(&self, data: &DataSet, target: &DataSetTarget) -> Result<Matrix> {
        self.check_inputs(data)?;
        ensure_non_empty(data.num_examples(), "training examples")?;
        ensure_shape(target.num_examples(), data.num_examples(), "number of target rows")?;

        let outputs = self.num_outputs();
        if target.num_outputs() == outputs {
            return Ok(target.matrix().clone());
        }
        target.check_labels(outputs)?;
        Ok(DataSetTarget::from_parts(target.matrix().clone(), outputs).to_binary_matrix())
    }
}

impl Predictor for NeuralNetwork {
    fn predict(&self, data: &DataSet) -> Result<LabeledDataSetTarget> {
        NeuralNetwork::predict(self, data)
    }
}

/// Builds a fresh network from `network_for` and trains it by batch gradient
/// descent.
pub fn trainer<G>(network_for: G, gd: GradientDescent) -> impl Trainer<NeuralNetwork>
where
    G: Fn() -> NeuralNetwork,
{
    move |data: &DataSet, target: &DataSetTarget| {
        let mut network = network_for();
        network.train(data, target, &gd)?;
        Ok(network)
    }
}

pub fn mini_batch_trainer<G>(
    network_for: G,
    gd: GradientDescent,
    batch_size: usize,
) -> impl Trainer<NeuralNetwork>
where
    G: Fn() -> NeuralNetwork,
{
    move |data: &DataSet, target: &DataSetTarget| {
        let mut network = network_for();
        network.train_mini_batch(data, target, &gd, batch_size)?;
        Ok(network)
    }
}

pub fn cost_evaluator(lambda: f64) -> impl CostEvaluator<NeuralNetwork> {
    check_lambda(lambda);
    move |network: &NeuralNetwork, data: &DataSet, target: &DataSetTarget| {
        network.cost(data, target, lambda)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::FullDataSetBuilder;
    use ndarray::array;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn relative_difference(analytic: &[Matrix], numerical: &[Matrix]) -> f64 {
        let mut diff = 0.0;
        let mut sum = 0.0;
        for (a, n) in analytic.iter().zip(numerical) {
            diff += (a - n).iter().map(|x| x * x).sum::<f64>();
            sum += (a + n).iter().map(|x| x * x).sum::<f64>();
        }
        diff.sqrt() / sum.sqrt()
    }

    fn xor() -> (DataSet, DataSetTarget) {
        let data = DataSet::new(array![[1.0, 1.0], [1.0, 0.0], [0.0, 1.0], [0.0, 0.0]]);
        let target = DataSetTarget::new(array![0.0, 1.0, 1.0, 0.0]);
        (data, target)
    }

    #[test]
    fn test_layer_chain_validation() {
        assert!(NeuralNetwork::new(vec![Matrix::zeros((3, 3)), Matrix::zeros((1, 4))]).is_ok());
        assert!(NeuralNetwork::new(vec![Matrix::zeros((3, 3)), Matrix::zeros((1, 3))]).is_err());
        assert!(NeuralNetwork::new(vec![]).is_err());
        assert!(NeuralNetwork::empty(&[3]).is_err());
    }

    #[test]
    fn test_layer_sizes() {
        let network = NeuralNetwork::empty(&[4, 6, 5, 3]).unwrap();
        assert_eq!(network.num_layers(), 4);
        assert_eq!(network.num_inputs(), 4);
        assert_eq!(network.num_outputs(), 3);
        assert_eq!(network.num_neurons(1), 6);
        assert_eq!(network.num_neurons(2), 5);
        assert_eq!(network.thetas()[1].shape(), &[5, 7]);
    }

    #[test]
    fn test_random_initialization_bounds() {
        let mut rng = StdRng::seed_from_u64(9);
        let network = NeuralNetwork::empty(&[2, 4, 1]).unwrap().randomly_initialize(&mut rng);
        let bound = (6.0_f64 / (4 + 3) as f64).sqrt();
        assert!(network.thetas()[0].iter().all(|w| w.abs() <= bound));
        assert!(network.thetas()[0].iter().any(|&w| w != 0.0));

        let network = network.randomly_initialize_with(0.01, &mut rng);
        assert!(network.thetas().iter().flat_map(|t| t.iter()).all(|w| w.abs() <= 0.01));
    }

    #[test]
    fn test_initialization_is_reproducible() {
        let a = NeuralNetwork::empty(&[3, 2]).unwrap().randomly_initialize(&mut StdRng::seed_from_u64(4));
        let b = NeuralNetwork::empty(&[3, 2]).unwrap().randomly_initialize(&mut StdRng::seed_from_u64(4));
        assert_eq!(a, b);
    }

    #[test]
    fn test_invalid_epsilon_panics() {
        std::panic::catch_unwind(|| {
            NeuralNetwork::empty(&[1, 1])
                .unwrap()
                .randomly_initialize_with(0.0, &mut StdRng::seed_from_u64(0));
        })
        .expect_err("Should panic on zero epsilon");
    }

    #[test]
    fn test_compute_shape_and_input_check() {
        let network = NeuralNetwork::empty(&[2, 3, 2]).unwrap();
        let (data, _) = xor();
        assert_eq!(network.compute(&data).unwrap().shape(), &[4, 2]);
        assert_eq!(network.feed_forward(&data).unwrap().len(), 3);
        assert!(network.compute(&DataSet::single(&[1.0, 2.0, 3.0])).is_err());
    }

    #[test]
    fn test_target_checks() {
        let network = NeuralNetwork::empty(&[2, 2, 3]).unwrap();
        let (data, _) = xor();
        let out_of_range = DataSetTarget::new(array![0.0, 1.0, 3.0, 0.0]);
        assert!(matches!(
            network.cost(&data, &out_of_range, 0.0),
            Err(Error::InvalidTarget(_))
        ));
        let short = DataSetTarget::new(array![0.0, 1.0]);
        assert!(network.cost(&data, &short, 0.0).is_err());
    }

    #[test]
    fn test_backpropagation_matches_numerical_gradient() {
        let mut rng = StdRng::seed_from_u64(17);
        let network = NeuralNetwork::empty(&[3, 5, 3]).unwrap().randomly_initialize(&mut rng);
        let data = DataSet::new(array![
            [0.2, -0.5, 1.0],
            [1.5, 0.3, -0.7],
            [-0.9, 0.8, 0.1],
            [0.4, 0.4, -1.2],
            [-1.1, -0.6, 0.9],
        ]);
        let target = DataSetTarget::new(array![0.0, 1.0, 2.0, 0.0, 1.0]);

        for lambda in [0.0, 1.5] {
            let analytic = network.back_propagation(&data, &target, lambda).unwrap();
            let numerical = network.numerical_gradient(&data, &target, lambda).unwrap();
            assert!(relative_difference(&analytic, &numerical) < 1e-6);
        }
    }

    #[test]
    fn test_backpropagation_deep_single_output() {
        let mut rng = StdRng::seed_from_u64(23);
        let network = NeuralNetwork::empty(&[2, 4, 3, 1]).unwrap().randomly_initialize(&mut rng);
        let (data, target) = xor();
        let analytic = network.back_propagation(&data, &target, 0.5).unwrap();
        let numerical = network.numerical_gradient(&data, &target, 0.5).unwrap();
        assert!(relative_difference(&analytic, &numerical) < 1e-6);
    }

    #[test]
    fn test_xor() {
        let (data, target) = xor();
        let gd = GradientDescent::new(1.0, 0.0, 50_000);

        let mut network = NeuralNetwork::new(vec![
            array![[-0.5, 0.8, -0.6], [0.3, -0.7, 0.9]],
            array![[0.1, 0.5, -0.4]],
        ])
        .unwrap();

        let before = network.cost(&data, &target, 0.0).unwrap();
        network.train(&data, &target, &gd).unwrap();
        let after = network.cost(&data, &target, 0.0).unwrap();
        assert!(after < before);
        assert!(after < 0.01);
        assert_eq!(network.predict(&data).unwrap().labels(), vec![0, 1, 1, 0]);
    }

    #[test]
    fn test_multi_output_predictions() {
        // output neuron k fires for input feature k
        let theta = array![[-5.0, 10.0, 0.0, 0.0], [-5.0, 0.0, 10.0, 0.0], [-5.0, 0.0, 0.0, 10.0]];
        let network = NeuralNetwork::new(vec![theta]).unwrap();
        let data = DataSet::new(array![[1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]]);
        let predicted = network.predict(&data).unwrap();
        assert_eq!(predicted.labels(), vec![0, 2, 1]);
        assert_eq!(predicted.num_labels(), 3);
    }

    #[test]
    fn test_factories() {
        let full = FullDataSetBuilder::new()
            .add(&[0.0, 0.0])
            .add(&[1.0, 1.0])
            .add(&[0.1, 0.0])
            .add(&[0.9, 1.0])
            .build()
            .unwrap();
        let network_for = || {
            NeuralNetwork::empty(&[1, 2, 1])
                .unwrap()
                .randomly_initialize(&mut StdRng::seed_from_u64(3))
        };
        let gd = GradientDescent::new(2.0, 0.0, 2000);
        let evaluator = cost_evaluator(0.0);
        let untrained = evaluator.cost(&network_for(), full.data_set(), full.target()).unwrap();

        let batch = trainer(network_for, gd).fit(full.data_set(), full.target()).unwrap();
        assert!(evaluator.cost(&batch, full.data_set(), full.target()).unwrap() < untrained);
        assert_eq!(batch.accuracy(&full).unwrap(), 1.0);

        let mini = mini_batch_trainer(network_for, gd, 2)
            .fit(full.data_set(), full.target())
            .unwrap();
        assert!(evaluator.cost(&mini, full.data_set(), full.target()).unwrap() < untrained);
    }
}
